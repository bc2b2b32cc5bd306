//! GraphQL [`Query`]s definitions.

use hub::{query, read, Query as _};
use juniper::graphql_object;

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the `Client` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `CLIENT_NOT_EXISTS` - the `Client` with the specified ID does not
    ///                         exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "client",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn client(
        id: api::client::Id,
        ctx: &Context,
    ) -> Result<api::Client, Error> {
        ctx.hub()
            .execute(query::client::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| ClientError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Client`s, in the order they were created.
    ///
    /// If `name` is provided, only the `Client`s whose names contain any of
    /// its words (case-insensitively) are returned.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "clients",
            name = ?name,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn clients(
        name: Option<String>,
        ctx: &Context,
    ) -> Result<Vec<api::Client>, Error> {
        ctx.hub()
            .execute(query::clients::List::by(read::client::list::Filter {
                name,
            }))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|c| c.into_iter().map(Into::into).collect())
    }

    /// Returns the `Service` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `SERVICE_NOT_EXISTS` - the `Service` with the specified ID does not
    ///                          exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "service",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn service(
        id: api::service::Id,
        ctx: &Context,
    ) -> Result<api::Service, Error> {
        ctx.hub()
            .execute(query::service::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| ServiceError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Service`s matching all the provided filters, in the
    /// order they were registered.
    #[tracing::instrument(
        skip_all,
        fields(
            client_id = ?client_id.map(|id| id.to_string()),
            gql.name = "services",
            kind = ?kind,
            otel.name = Self::SPAN_NAME,
            status = ?status,
        ),
    )]
    pub async fn services(
        client_id: Option<api::client::Id>,
        kind: Option<api::service::Kind>,
        status: Option<api::service::Status>,
        ctx: &Context,
    ) -> Result<Vec<api::Service>, Error> {
        ctx.hub()
            .execute(query::services::List::by(services_filter(
                client_id, kind, status,
            )))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|s| s.into_iter().map(Into::into).collect())
    }

    /// Returns the `Payment`s, in the order they were recorded.
    ///
    /// If `serviceId` is provided, only the `Payment`s of that `Service` are
    /// returned.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "payments",
            otel.name = Self::SPAN_NAME,
            service_id = ?service_id.map(|id| id.to_string()),
        ),
    )]
    pub async fn payments(
        service_id: Option<api::service::Id>,
        ctx: &Context,
    ) -> Result<Vec<api::Payment>, Error> {
        let payments = if let Some(id) = service_id {
            ctx.hub()
                .execute(query::payments::OfService::by(id.into()))
                .await
        } else {
            ctx.hub().execute(query::payments::All::by(())).await
        };
        payments
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|p| p.into_iter().map(Into::into).collect())
    }

    /// Returns the payment-derived status of the `Service` with the
    /// specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `SERVICE_NOT_EXISTS` - the `Service` with the specified ID does not
    ///                          exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "serviceStatus",
            otel.name = Self::SPAN_NAME,
            service_id = %service_id,
        ),
    )]
    pub async fn service_status(
        service_id: api::service::Id,
        ctx: &Context,
    ) -> Result<api::ServiceStatus, Error> {
        ctx.hub()
            .execute(query::service_status::ByServiceId(service_id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| ServiceError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the payment-derived statuses of the `Service`s matching all
    /// the provided filters, in the order the `Service`s were registered.
    #[tracing::instrument(
        skip_all,
        fields(
            client_id = ?client_id.map(|id| id.to_string()),
            gql.name = "serviceStatuses",
            kind = ?kind,
            otel.name = Self::SPAN_NAME,
            status = ?status,
        ),
    )]
    pub async fn service_statuses(
        client_id: Option<api::client::Id>,
        kind: Option<api::service::Kind>,
        status: Option<api::service::Status>,
        ctx: &Context,
    ) -> Result<Vec<api::ServiceStatus>, Error> {
        ctx.hub()
            .execute(query::service_statuses::ServiceStatuses {
                filter: services_filter(client_id, kind, status),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|s| s.into_iter().map(Into::into).collect())
    }
}

/// Builds a [`read::service::list::Filter`] out of the provided GraphQL
/// arguments.
fn services_filter(
    client_id: Option<api::client::Id>,
    kind: Option<api::service::Kind>,
    status: Option<api::service::Status>,
) -> read::service::list::Filter {
    read::service::list::Filter {
        client_id: client_id.map(Into::into),
        kind: kind.map(Into::into),
        status: status.map(Into::into),
    }
}

define_error! {
    enum ClientError {
        #[code = "CLIENT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Client` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum ServiceError {
        #[code = "SERVICE_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Service` with the specified ID does not exist"]
        NotExists,
    }
}
