//! [`ServiceStatus`]-related definitions.

use common::DateTime;
use derive_more::{From, Into};
use hub::{
    command::apply_service_action::{BulkResult, Outcome},
    domain, read,
};
use juniper::{graphql_object, GraphQLEnum};

use crate::{api, AsError as _, Context};

/// Status of a `Service` derived from its latest `Payment`.
#[derive(Clone, Copy, Debug, From, Into)]
pub struct ServiceStatus(read::ServiceStatus);

/// Status of a `Service` derived from its latest `Payment`.
#[graphql_object(context = Context)]
impl ServiceStatus {
    /// `Service` this status is derived for.
    #[must_use]
    pub fn service(&self) -> api::Service {
        #[expect(
            unsafe_code,
            reason = "`ServiceStatus` is always derived for an existing \
                      `Service`"
        )]
        unsafe {
            api::Service::new_unchecked(self.0.service_id)
        }
    }

    /// Lifecycle status of the `Service`.
    #[must_use]
    pub fn lifecycle(&self) -> api::service::Status {
        self.0.lifecycle.into()
    }

    /// Status of the latest `Payment` of the `Service`.
    ///
    /// `UNPAID` if no `Payment` has been recorded yet.
    #[must_use]
    pub fn effective_payment_status(&self) -> api::payment::Status {
        self.0.effective_payment_status.into()
    }

    /// Indicator whether the `Service` is paid enough to be activated.
    #[must_use]
    pub fn can_activate(&self) -> bool {
        self.0.can_activate
    }

    /// `DateTime` of the latest `Payment` of the `Service`, if any.
    #[must_use]
    pub fn last_payment_date(&self) -> Option<DateTime> {
        self.0.last_payment_date.map(|d| d.coerce())
    }

    /// Number of days the `Service` is overdue, as of its latest `Payment`.
    #[must_use]
    pub fn days_overdue(&self) -> Option<i32> {
        self.0.days_overdue.map(Into::into)
    }
}

/// Change of a `Service` lifecycle status.
#[derive(Clone, Copy, Debug, From, Into)]
pub struct Transition(read::service_status::Transition);

/// Change of a `Service` lifecycle status.
#[graphql_object(name = "ServiceTransition", context = Context)]
impl Transition {
    /// ID of the transitioned `Service`.
    #[must_use]
    pub fn service_id(&self) -> api::service::Id {
        self.0.service_id.into()
    }

    /// Lifecycle status before the transition.
    #[graphql(name = "from")]
    #[must_use]
    pub fn from_status(&self) -> api::service::Status {
        self.0.from.into()
    }

    /// Lifecycle status after the transition.
    #[graphql(name = "to")]
    #[must_use]
    pub fn to_status(&self) -> api::service::Status {
        self.0.to.into()
    }

    /// Indicator whether the `Service` already had the target status, so
    /// nothing was written.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.0.is_noop()
    }
}

/// Refusal to activate a `Service`.
#[derive(Clone, Copy, Debug, From, Into)]
pub struct ActivationDenial(read::service_status::ActivationDenied);

/// Refusal to activate a `Service`.
#[graphql_object(context = Context)]
impl ActivationDenial {
    /// ID of the `Service` refused to be activated.
    #[must_use]
    pub fn service_id(&self) -> api::service::Id {
        self.0.service_id.into()
    }

    /// Reason of the refusal.
    #[must_use]
    pub fn reason(&self) -> DenialReason {
        self.0.reason.into()
    }

    /// Effective payment status of the `Service`, if the refusal is caused
    /// by it.
    #[must_use]
    pub fn payment_status(&self) -> Option<api::payment::Status> {
        use read::service_status::DenialReason as R;

        match self.0.reason {
            R::NotPaid(status) => Some(status.into()),
            R::Expired => None,
        }
    }

    /// Human-readable description of the refusal.
    #[must_use]
    pub fn message(&self) -> String {
        self.0.to_string()
    }
}

/// Reason of an `ActivationDenial`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "ActivationDenialReason")]
pub enum DenialReason {
    /// The latest `Payment` is not `PAID`.
    NotPaid,

    /// The `Service` is `EXPIRED` and must be renewed first.
    Expired,
}

impl From<read::service_status::DenialReason> for DenialReason {
    fn from(reason: read::service_status::DenialReason) -> Self {
        use read::service_status::DenialReason as R;
        match reason {
            R::NotPaid(_) => Self::NotPaid,
            R::Expired => Self::Expired,
        }
    }
}

/// Result of an action applied to a single `Service`.
#[derive(Debug)]
pub struct ActionResult {
    /// ID of the `Service` the action was applied to.
    service_id: domain::service::Id,

    /// [`Outcome`] of the action.
    outcome: Outcome,
}

impl From<(domain::service::Id, Outcome)> for ActionResult {
    fn from((service_id, outcome): (domain::service::Id, Outcome)) -> Self {
        Self {
            service_id,
            outcome,
        }
    }
}

impl ActionResult {
    /// Converts the provided [`BulkResult`] into a list of [`ActionResult`]s.
    #[must_use]
    pub fn list(result: BulkResult) -> Vec<Self> {
        result.into_iter().map(Into::into).collect()
    }
}

/// Result of an action applied to a single `Service`.
#[graphql_object(name = "ServiceActionResult", context = Context)]
impl ActionResult {
    /// ID of the `Service` the action was applied to.
    #[must_use]
    pub fn service_id(&self) -> api::service::Id {
        self.service_id.into()
    }

    /// Kind of the outcome.
    #[must_use]
    pub fn outcome(&self) -> OutcomeKind {
        match self.outcome {
            Outcome::Applied(_) => OutcomeKind::Applied,
            Outcome::Denied(_) => OutcomeKind::Denied,
            Outcome::Failed(_) => OutcomeKind::Failed,
        }
    }

    /// Performed transition, if the action was `APPLIED`.
    #[must_use]
    pub fn transition(&self) -> Option<Transition> {
        self.outcome.transition().copied().map(Into::into)
    }

    /// Refusal, if the activation was `DENIED`.
    #[must_use]
    pub fn denial(&self) -> Option<ActivationDenial> {
        match &self.outcome {
            Outcome::Denied(d) => Some((*d).into()),
            Outcome::Applied(_) | Outcome::Failed(_) => None,
        }
    }

    /// Error code, if the action has `FAILED`.
    #[must_use]
    pub fn error_code(&self) -> Option<String> {
        match &self.outcome {
            Outcome::Failed(e) => Some(e.as_error().code.to_owned()),
            Outcome::Applied(_) | Outcome::Denied(_) => None,
        }
    }

    /// Error message, if the action has `FAILED`.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        match &self.outcome {
            Outcome::Failed(e) => Some(e.as_error().message),
            Outcome::Applied(_) | Outcome::Denied(_) => None,
        }
    }
}

/// Kind of a `ServiceActionResult` outcome.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "ServiceActionOutcome")]
pub enum OutcomeKind {
    /// The action has been applied, or the `Service` already had the target
    /// status.
    Applied,

    /// The activation has been refused.
    Denied,

    /// The action has failed.
    Failed,
}
