//! [`Command`] for renewing a [`Service`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{service, Service},
    infra::{database, Database},
    Hub,
};

use super::Command;

/// [`Command`] for renewing a [`Service`] until the provided
/// [`service::ExpirationDateTime`].
///
/// A [`service::Status::Expired`] [`Service`] goes back to
/// [`service::Status::Pending`], so it may be activated again once paid.
#[derive(Clone, Copy, Debug)]
pub struct RenewService {
    /// ID of the [`Service`] to be renewed.
    pub service_id: service::Id,

    /// New [`service::ExpirationDateTime`] of the [`Service`].
    pub expires_at: service::ExpirationDateTime,
}

impl<Db> Command<RenewService> for Hub<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Service, service::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Service>, service::Id>>,
            Ok = Option<Service>,
            Err = Traced<database::Error>,
        > + Database<Update<Service>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Service;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: RenewService) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RenewService {
            service_id,
            expires_at,
        } = cmd;

        if expires_at <= service::ExpirationDateTime::now() {
            return Err(tracerr::new!(E::ExpirationNotInFuture));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent status changes of the same `Service`.
        tx.execute(Lock(By::new(service_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut service = tx
            .execute(Select(By::<Option<Service>, _>::new(service_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ServiceNotExists(service_id))
            .map_err(tracerr::wrap!())?;

        service.expires_at = expires_at;
        if service.status == service::Status::Expired {
            service.status = service::Status::Pending;
        }

        tx.execute(Update(service.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`Service(id: {service_id})` renewed until {}",
            service.expires_at.to_rfc3339(),
        );

        Ok(service)
    }
}

/// Error of [`RenewService`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// New [`service::ExpirationDateTime`] is not in the future.
    #[display("New expiration date must be in the future")]
    ExpirationNotInFuture,

    /// [`Service`] with the provided ID does not exist.
    #[display("`Service(id: {_0})` does not exist")]
    ServiceNotExists(#[error(not(source))] service::Id),
}

#[cfg(test)]
mod spec {
    use common::operations::Insert;

    use crate::{domain::service, fixture, infra::Database as _, Command as _};

    use super::{ExecutionError, RenewService};

    #[tokio::test]
    async fn brings_expired_service_back_to_pending() {
        let hub = fixture::hub();
        let mut service =
            fixture::service(service::Kind::Domain, service::Status::Expired);
        service.expires_at = fixture::at("2020-01-01").coerce();
        hub.database().execute(Insert(service.clone())).await.unwrap();

        let renewed = hub
            .execute(RenewService {
                service_id: service.id,
                expires_at: fixture::at("2999-06-01").coerce(),
            })
            .await
            .unwrap();

        assert_eq!(renewed.status, service::Status::Pending);
        let stored = fixture::stored(hub.database(), service.id).await;
        assert_eq!(stored.status, service::Status::Pending);
        assert_eq!(stored.expires_at, fixture::at("2999-06-01").coerce());
    }

    #[tokio::test]
    async fn keeps_status_of_running_service() {
        let hub = fixture::hub();
        let service =
            fixture::service(service::Kind::Hosting, service::Status::Active);
        hub.database().execute(Insert(service.clone())).await.unwrap();

        let renewed = hub
            .execute(RenewService {
                service_id: service.id,
                expires_at: fixture::at("2999-06-01").coerce(),
            })
            .await
            .unwrap();

        assert_eq!(renewed.status, service::Status::Active);
    }

    #[tokio::test]
    async fn rejects_past_expiration() {
        let hub = fixture::hub();
        let service =
            fixture::service(service::Kind::Hosting, service::Status::Expired);
        hub.database().execute(Insert(service.clone())).await.unwrap();

        let err = hub
            .execute(RenewService {
                service_id: service.id,
                expires_at: fixture::at("2001-01-01").coerce(),
            })
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::ExpirationNotInFuture),
            "{err}",
        );
    }
}
