//! GraphQL API definitions.

pub mod client;
mod mutation;
pub mod payment;
mod query;
pub mod scalar;
pub mod service;
pub mod service_status;

use juniper::EmptySubscription;

use crate::Context;

pub use self::{
    client::Client, mutation::Mutation, payment::Payment, query::Query,
    service::Service, service_status::ServiceStatus,
};

/// GraphQL schema.
pub type Schema =
    juniper::RootNode<'static, Query, Mutation, EmptySubscription<Context>>;
