//! Read models definitions.

pub mod client;
pub mod service;
pub mod service_status;

pub use self::service_status::{ServiceStatus, Statuses};
