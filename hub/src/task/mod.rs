//! Background [`Task`]s definitions.

pub mod background;
pub mod expire_services;
pub mod reconcile_services;

pub use common::Handler as Task;

pub use self::{
    background::Background, expire_services::ExpireServices,
    reconcile_services::ReconcileServices,
};
