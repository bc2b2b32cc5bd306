//! [`Command`] definition.

pub mod activate_service;
pub mod apply_service_action;
pub mod create_client;
pub mod reconcile_services;
pub mod record_payment;
pub mod register_service;
pub mod renew_service;
pub mod suspend_service;

/// [`Command`] of the [`Hub`].
///
/// [`Hub`]: crate::Hub
pub use common::Handler as Command;

pub use self::{
    activate_service::ActivateService,
    apply_service_action::ApplyServiceAction, create_client::CreateClient,
    reconcile_services::ReconcileServices, record_payment::RecordPayment,
    register_service::RegisterService, renew_service::RenewService,
    suspend_service::SuspendService,
};
