//! GraphQL [`Mutation`]s definitions.

use common::{DateTime, Money};
use hub::{
    command::{
        self,
        activate_service::Activation,
        apply_service_action::{Failure, Outcome},
        reconcile_services::Automation,
    },
    Command as _,
};
use juniper::graphql_object;

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Creates a new `Client` with the provided contact info.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request has no API token;
    /// - `INVALID_TOKEN` - the provided API token is invalid.
    #[tracing::instrument(
        skip_all,
        fields(
            email = ?email.as_ref().map(ToString::to_string),
            gql.name = "createClient",
            name = %name,
            otel.name = Self::SPAN_NAME,
            phone = ?phone.as_ref().map(ToString::to_string),
        ),
    )]
    pub async fn create_client(
        name: api::client::Name,
        email: Option<api::client::Email>,
        phone: Option<api::client::Phone>,
        ctx: &Context,
    ) -> Result<api::Client, Error> {
        ctx.authorize().await?;

        ctx.hub()
            .execute(command::CreateClient {
                name: name.into(),
                email: email.map(Into::into),
                phone: phone.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Registers a new `PENDING` `Service` for the specified `Client`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `CLIENT_NOT_EXISTS` - the `Client` with the specified ID does not
    ///                         exist;
    /// - `AUTHORIZATION_REQUIRED` - the request has no API token;
    /// - `INVALID_TOKEN` - the provided API token is invalid.
    #[tracing::instrument(
        skip_all,
        fields(
            client_id = %client_id,
            expires_at = %expires_at.to_rfc3339(),
            gql.name = "registerService",
            kind = ?kind,
            name = %name,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn register_service(
        kind: api::service::Kind,
        name: api::service::Name,
        client_id: api::client::Id,
        expires_at: DateTime,
        ctx: &Context,
    ) -> Result<api::Service, Error> {
        ctx.authorize().await?;

        ctx.hub()
            .execute(command::RegisterService {
                kind: kind.into(),
                name: name.into(),
                client_id: client_id.into(),
                expires_at: expires_at.coerce(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Renews the specified `Service` until the provided `DateTime`.
    ///
    /// An `EXPIRED` `Service` becomes `PENDING` again.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `SERVICE_NOT_EXISTS` - the `Service` with the specified ID does not
    ///                          exist;
    /// - `EXPIRATION_NOT_IN_FUTURE` - the provided `DateTime` is not in the
    ///                                future;
    /// - `AUTHORIZATION_REQUIRED` - the request has no API token;
    /// - `INVALID_TOKEN` - the provided API token is invalid.
    #[tracing::instrument(
        skip_all,
        fields(
            expires_at = %expires_at.to_rfc3339(),
            gql.name = "renewService",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn renew_service(
        id: api::service::Id,
        expires_at: DateTime,
        ctx: &Context,
    ) -> Result<api::Service, Error> {
        ctx.authorize().await?;

        ctx.hub()
            .execute(command::RenewService {
                service_id: id.into(),
                expires_at: expires_at.coerce(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Records a new `Payment` for the specified `Service`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `SERVICE_NOT_EXISTS` - the `Service` with the specified ID does not
    ///                          exist;
    /// - `SERVICE_KIND_MISMATCH` - the `Service` is of another kind;
    /// - `NEGATIVE_AMOUNT` - the provided amount is negative;
    /// - `INVALID_DAYS_OVERDUE` - the provided `daysOverdue` is out of range;
    /// - `AUTHORIZATION_REQUIRED` - the request has no API token;
    /// - `INVALID_TOKEN` - the provided API token is invalid.
    #[tracing::instrument(
        skip_all,
        fields(
            amount = %amount,
            days_overdue = ?days_overdue,
            gql.name = "recordPayment",
            method = ?method,
            otel.name = Self::SPAN_NAME,
            paid_at = %paid_at.to_rfc3339(),
            service_id = %service_id,
            service_kind = ?service_kind,
            status = ?status,
        ),
    )]
    #[expect(clippy::too_many_arguments, reason = "GraphQL arguments")]
    pub async fn record_payment(
        service_id: api::service::Id,
        service_kind: api::service::Kind,
        status: api::payment::Status,
        amount: Money,
        method: api::payment::Method,
        paid_at: DateTime,
        days_overdue: Option<i32>,
        ctx: &Context,
    ) -> Result<api::Payment, Error> {
        ctx.authorize().await?;

        let days_overdue = days_overdue
            .map(u16::try_from)
            .transpose()
            .map_err(|_| PaymentError::InvalidDaysOverdue.into())
            .map_err(ctx.error())?;

        ctx.hub()
            .execute(command::RecordPayment {
                service_id: service_id.into(),
                service_kind: service_kind.into(),
                status: status.into(),
                amount,
                method: method.into(),
                paid_at: paid_at.coerce(),
                days_overdue,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Activates the specified `Service`, if its latest `Payment` is `PAID`.
    ///
    /// A refused activation is reported as a `DENIED` outcome, not as an
    /// error.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `SERVICE_NOT_EXISTS` - the `Service` with the specified ID does not
    ///                          exist;
    /// - `AUTHORIZATION_REQUIRED` - the request has no API token;
    /// - `INVALID_TOKEN` - the provided API token is invalid.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "activateService",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn activate_service(
        id: api::service::Id,
        ctx: &Context,
    ) -> Result<api::service_status::ActionResult, Error> {
        ctx.authorize().await?;

        let service_id = id.into();
        let outcome = match ctx
            .hub()
            .execute(command::ActivateService { service_id })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
        {
            Activation::Applied(t) => Outcome::Applied(t),
            Activation::Denied(d) => Outcome::Denied(d),
        };
        Ok((service_id, outcome).into())
    }

    /// Suspends the specified `Service`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `SERVICE_NOT_EXISTS` - the `Service` with the specified ID does not
    ///                          exist;
    /// - `SERVICE_EXPIRED` - the `Service` is `EXPIRED` and must be renewed
    ///                       first;
    /// - `AUTHORIZATION_REQUIRED` - the request has no API token;
    /// - `INVALID_TOKEN` - the provided API token is invalid.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "suspendService",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn suspend_service(
        id: api::service::Id,
        ctx: &Context,
    ) -> Result<api::service_status::Transition, Error> {
        ctx.authorize().await?;

        ctx.hub()
            .execute(command::SuspendService {
                service_id: id.into(),
                overdue_for: None,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Applies the provided action to each of the specified `Service`s
    /// independently, in the order they are specified.
    ///
    /// Duplicated IDs are processed once. Failure for one `Service` doesn't
    /// affect the others and is reported in its `ServiceActionResult`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request has no API token;
    /// - `INVALID_TOKEN` - the provided API token is invalid.
    #[tracing::instrument(
        skip_all,
        fields(
            action = ?action,
            gql.name = "applyServiceAction",
            ids = ?ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn apply_service_action(
        ids: Vec<api::service::Id>,
        action: api::service::Action,
        ctx: &Context,
    ) -> Result<Vec<api::service_status::ActionResult>, Error> {
        ctx.authorize().await?;

        ctx.hub()
            .execute(command::ApplyServiceAction {
                service_ids: ids.into_iter().map(Into::into).collect(),
                action: action.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(api::service_status::ActionResult::list)
    }

    /// Applies the provided automation rules to all the `Service`s once.
    ///
    /// - `activateOnPayment` activates every paid `PENDING` or `SUSPENDED`
    ///   `Service`;
    /// - `suspendOverdueAfterDays` suspends every unpaid `ACTIVE` `Service`
    ///   overdue for at least that many days.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_DAYS_OVERDUE` - the provided `suspendOverdueAfterDays` is
    ///                            out of range;
    /// - `AUTHORIZATION_REQUIRED` - the request has no API token;
    /// - `INVALID_TOKEN` - the provided API token is invalid.
    #[tracing::instrument(
        skip_all,
        fields(
            activate_on_payment = activate_on_payment,
            gql.name = "reconcileServices",
            otel.name = Self::SPAN_NAME,
            suspend_overdue_after_days = ?suspend_overdue_after_days,
        ),
    )]
    pub async fn reconcile_services(
        activate_on_payment: bool,
        suspend_overdue_after_days: Option<i32>,
        ctx: &Context,
    ) -> Result<Vec<api::service_status::ActionResult>, Error> {
        ctx.authorize().await?;

        let suspend_overdue_after = suspend_overdue_after_days
            .map(u16::try_from)
            .transpose()
            .map_err(|_| PaymentError::InvalidDaysOverdue.into())
            .map_err(ctx.error())?;

        ctx.hub()
            .execute(command::ReconcileServices {
                automation: Automation {
                    activate_on_payment,
                    suspend_overdue_after,
                },
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(api::service_status::ActionResult::list)
    }
}

define_error! {
    enum PaymentError {
        #[code = "INVALID_DAYS_OVERDUE"]
        #[status = BAD_REQUEST]
        #[message = "Number of overdue days must be in `0..=65535` range"]
        InvalidDaysOverdue,
    }
}

impl AsError for command::create_client::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::register_service::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::ClientNotExists(_) => {
                api::query::ClientError::NotExists.into()
            }
            Self::Db(e) => return e.try_as_error(),
        })
    }
}

impl AsError for command::renew_service::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "EXPIRATION_NOT_IN_FUTURE"]
                #[status = BAD_REQUEST]
                #[message = "New expiration `DateTime` must be in the future"]
                ExpirationNotInFuture,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::ExpirationNotInFuture => Error::ExpirationNotInFuture.into(),
            Self::ServiceNotExists(_) => {
                api::query::ServiceError::NotExists.into()
            }
        })
    }
}

impl AsError for command::record_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "SERVICE_KIND_MISMATCH"]
                #[status = CONFLICT]
                #[message = "`Payment` kind doesn't match the `Service` kind"]
                KindMismatch,

                #[code = "NEGATIVE_AMOUNT"]
                #[status = BAD_REQUEST]
                #[message = "Paid amount cannot be negative"]
                NegativeAmount,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::KindMismatch { .. } => Error::KindMismatch.into(),
            Self::NegativeAmount(_) => Error::NegativeAmount.into(),
            Self::ServiceNotExists(_) => {
                api::query::ServiceError::NotExists.into()
            }
        })
    }
}

impl AsError for command::activate_service::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::ServiceNotExists(_) => {
                api::query::ServiceError::NotExists.into()
            }
        })
    }
}

impl AsError for command::suspend_service::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "SERVICE_EXPIRED"]
                #[status = CONFLICT]
                #[message = "`Service` with the provided ID is expired and \
                             must be renewed first"]
                ServiceExpired,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::ServiceExpired(_) => Error::ServiceExpired.into(),
            Self::ServiceNotExists(_) => {
                api::query::ServiceError::NotExists.into()
            }
        })
    }
}

impl AsError for command::reconcile_services::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
        }
    }
}

impl AsError for Failure {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Activate(e) => e.try_as_error(),
            Self::Suspend(e) => e.try_as_error(),
        }
    }
}
