//! [`Service`]-related definitions.

use std::future;

use common::DateTime;
use derive_more::{AsRef, Display, From, Into};
use futures::TryFutureExt as _;
use hub::{domain, query, Query as _};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{api, api::scalar, AsError, Context, Error};

/// A domain name or a hosting package provided to a `Client`.
#[derive(Clone, Debug, From)]
pub struct Service {
    /// ID of this [`Service`].
    id: Id,

    /// Underlying [`domain::Service`].
    service: OnceCell<domain::Service>,
}

impl From<domain::Service> for Service {
    fn from(service: domain::Service) -> Self {
        Self {
            id: service.id.into(),
            service: OnceCell::new_with(Some(service)),
        }
    }
}

impl Service {
    /// Creates a new [`Service`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Service`] with the provided ID exists,
    /// otherwise accessing this [`Service`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            service: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Service`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Service`] doesn't exist.
    async fn service(&self, ctx: &Context) -> Result<&domain::Service, Error> {
        let id = self.id.into();
        self.service
            .get_or_try_init(|| {
                ctx.hub()
                    .execute(query::service::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|s| {
                        future::ready(s.ok_or_else(|| {
                            api::query::ServiceError::NotExists.into()
                        }))
                    })
            })
            .await
    }
}

/// A domain name or a hosting package provided to a `Client`.
#[graphql_object(context = Context)]
impl Service {
    /// Unique identifier of this `Service`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Service.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Kind of this `Service`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Service.kind",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn kind(&self, ctx: &Context) -> Result<Kind, Error> {
        Ok(self.service(ctx).await?.kind.into())
    }

    /// Name of this `Service`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Service.name",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn name(&self, ctx: &Context) -> Result<Name, Error> {
        Ok(self.service(ctx).await?.name.clone().into())
    }

    /// `Client` owning this `Service`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Service.client",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn client(&self, ctx: &Context) -> Result<api::Client, Error> {
        let id = self.service(ctx).await?.client_id;
        #[expect(
            unsafe_code,
            reason = "`Service` always references an existing `Client`"
        )]
        let client = unsafe { api::Client::new_unchecked(id) };
        Ok(client)
    }

    /// Name of the `Client` owning this `Service`.
    ///
    /// Always reflects the current name of the `Client`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Service.clientName",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn client_name(
        &self,
        ctx: &Context,
    ) -> Result<api::client::Name, Error> {
        let id = self.service(ctx).await?.client_id;
        ctx.hub()
            .execute(query::client::ById::by(id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .map(|c| c.name.into())
            .ok_or_else(|| api::query::ClientError::NotExists.into())
            .map_err(ctx.error())
    }

    /// Lifecycle status of this `Service`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Service.status",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn status(&self, ctx: &Context) -> Result<Status, Error> {
        Ok(self.service(ctx).await?.status.into())
    }

    /// Payment-derived status of this `Service`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Service.paymentStatus",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn payment_status(
        &self,
        ctx: &Context,
    ) -> Result<api::ServiceStatus, Error> {
        ctx.hub()
            .execute(query::service_status::ByServiceId(self.id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| api::query::ServiceError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// `Payment`s recorded for this `Service`, in the order they were
    /// recorded.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Service.payments",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn payments(
        &self,
        ctx: &Context,
    ) -> Result<Vec<api::Payment>, Error> {
        ctx.hub()
            .execute(query::payments::OfService::by(self.id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|p| p.into_iter().map(Into::into).collect())
    }

    /// `DateTime` when this `Service` expires.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Service.expiresAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn expires_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.service(ctx).await?.expires_at.coerce())
    }

    /// Number of whole days left until this `Service` expires.
    ///
    /// Negative once this `Service` is past its expiration date.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Service.daysUntilExpiration",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn days_until_expiration(
        &self,
        ctx: &Context,
    ) -> Result<i32, Error> {
        let days = self
            .service(ctx)
            .await?
            .expires_at
            .whole_days_since(DateTime::now());
        Ok(i32::try_from(days).unwrap_or(if days < 0 {
            i32::MIN
        } else {
            i32::MAX
        }))
    }

    /// `DateTime` when this `Service` was registered.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Service.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.service(ctx).await?.created_at.coerce())
    }
}

/// Unique identifier of a `Service`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::service::Id)]
#[into(domain::service::Id)]
#[graphql(name = "ServiceId", transparent)]
pub struct Id(Uuid);

/// Name of a `Service`: a domain name or a hosting package label.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(name = "ServiceName", with = scalar::Via::<domain::service::Name>)]
pub struct Name(domain::service::Name);

/// Kind of a `Service`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "ServiceKind")]
pub enum Kind {
    /// Domain name registration.
    Domain,

    /// Hosting package.
    Hosting,
}

impl From<domain::service::Kind> for Kind {
    fn from(kind: domain::service::Kind) -> Self {
        use domain::service::Kind as K;
        match kind {
            K::Domain => Self::Domain,
            K::Hosting => Self::Hosting,
        }
    }
}

impl From<Kind> for domain::service::Kind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Domain => Self::Domain,
            Kind::Hosting => Self::Hosting,
        }
    }
}

/// Lifecycle status of a `Service`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "ServiceLifecycle")]
pub enum Status {
    /// Registered, never activated yet.
    Pending,

    /// Provisioned and running.
    Active,

    /// Switched off by an operator or by automation.
    Suspended,

    /// Past its expiration date, until renewed.
    Expired,
}

impl From<domain::service::Status> for Status {
    fn from(status: domain::service::Status) -> Self {
        use domain::service::Status as S;
        match status {
            S::Pending => Self::Pending,
            S::Active => Self::Active,
            S::Suspended => Self::Suspended,
            S::Expired => Self::Expired,
        }
    }
}

impl From<Status> for domain::service::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Pending => Self::Pending,
            Status::Active => Self::Active,
            Status::Suspended => Self::Suspended,
            Status::Expired => Self::Expired,
        }
    }
}

/// Action applicable to a `Service`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "ServiceAction")]
pub enum Action {
    /// Move the `Service` to `ACTIVE`, if it's paid.
    Activate,

    /// Move the `Service` to `SUSPENDED`.
    Suspend,
}

impl From<Action> for hub::command::apply_service_action::Action {
    fn from(action: Action) -> Self {
        match action {
            Action::Activate => Self::Activate,
            Action::Suspend => Self::Suspend,
        }
    }
}
