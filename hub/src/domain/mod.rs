//! Domain definitions.

pub mod client;
pub mod payment;
pub mod service;

pub use self::{client::Client, payment::Payment, service::Service};
