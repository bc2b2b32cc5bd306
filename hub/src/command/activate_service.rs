//! [`Command`] for activating a [`Service`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{service, Payment, Service},
    infra::{database, Database},
    read::service_status::{ActivationDenied, ServiceStatus, Transition},
    Hub,
};

use super::Command;

/// [`Command`] for activating a [`Service`], if its latest [`Payment`] allows
/// so.
#[derive(Clone, Copy, Debug)]
pub struct ActivateService {
    /// ID of the [`Service`] to be activated.
    pub service_id: service::Id,
}

/// Outcome of an [`ActivateService`] [`Command`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Activation {
    /// [`Service`] is [`service::Status::Active`] now.
    ///
    /// The [`Transition`] is a no-op if it was active already.
    Applied(Transition),

    /// [`Service`] is not allowed to be activated, so nothing was written.
    Denied(ActivationDenied),
}

impl<Db> Command<ActivateService> for Hub<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Service, service::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Service>, service::Id>>,
            Ok = Option<Service>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Payment>, service::Id>>,
            Ok = Vec<Payment>,
            Err = Traced<database::Error>,
        > + Database<Update<Service>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Activation;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ActivateService,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ActivateService { service_id } = cmd;

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

        let payments = tx
            .execute(Select(By::<Vec<Payment>, _>::new(service_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let transition =
            match ServiceStatus::of(&service, &payments).activation() {
                Ok(t) => t,
                Err(denied) => {
                    log::debug!("{denied}");
                    return Ok(Activation::Denied(denied));
                }
            };
        if transition.is_noop() {
            return Ok(Activation::Applied(transition));
        }

        service.status = transition.to;
        tx.execute(Update(service))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`Service(id: {service_id})` activated: {} -> {}",
            transition.from,
            transition.to,
        );

        Ok(Activation::Applied(transition))
    }
}

/// Error of [`ActivateService`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Service`] with the provided ID does not exist.
    #[display("`Service(id: {_0})` does not exist")]
    ServiceNotExists(#[error(not(source))] service::Id),
}

#[cfg(test)]
mod spec {
    use common::operations::Insert;

    use crate::{
        domain::{payment, service},
        fixture,
        infra::Database as _,
        read::service_status::DenialReason,
        Command as _,
    };

    use super::{ActivateService, Activation, ExecutionError};

    #[tokio::test]
    async fn activates_paid_service() {
        let hub = fixture::hub();
        let service =
            fixture::service(service::Kind::Domain, service::Status::Pending);
        hub.database().execute(Insert(service.clone())).await.unwrap();
        hub.database()
            .execute(Insert(fixture::payment(
                &service,
                payment::Status::Paid,
                "2024-01-01",
            )))
            .await
            .unwrap();

        let res = hub
            .execute(ActivateService {
                service_id: service.id,
            })
            .await
            .unwrap();

        let Activation::Applied(t) = res else {
            panic!("expected `Activation::Applied`, got: {res:?}");
        };
        assert_eq!(t.from, service::Status::Pending);
        assert_eq!(t.to, service::Status::Active);
        assert_eq!(
            fixture::stored(hub.database(), service.id).await.status,
            service::Status::Active,
        );
    }

    #[tokio::test]
    async fn activates_once_latest_payment_is_paid() {
        let hub = fixture::hub();
        let service =
            fixture::service(service::Kind::Hosting, service::Status::Pending);
        hub.database().execute(Insert(service.clone())).await.unwrap();
        for (status, date) in [
            (payment::Status::Unpaid, "2024-01-01"),
            (payment::Status::Paid, "2024-02-01"),
        ] {
            hub.database()
                .execute(Insert(fixture::payment(&service, status, date)))
                .await
                .unwrap();
        }

        let res = hub
            .execute(ActivateService {
                service_id: service.id,
            })
            .await
            .unwrap();

        assert!(
            matches!(
                res,
                Activation::Applied(t) if t.to == service::Status::Active,
            ),
            "{res:?}",
        );
        assert_eq!(
            fixture::stored(hub.database(), service.id).await.status,
            service::Status::Active,
        );
    }

    #[tokio::test]
    async fn denies_unpaid_service_without_write() {
        let hub = fixture::hub();
        let service = fixture::service(
            service::Kind::Hosting,
            service::Status::Suspended,
        );
        hub.database().execute(Insert(service.clone())).await.unwrap();
        for (status, date) in [
            (payment::Status::Paid, "2024-01-01"),
            (payment::Status::PartiallyPaid, "2024-02-01"),
        ] {
            hub.database()
                .execute(Insert(fixture::payment(&service, status, date)))
                .await
                .unwrap();
        }
        let writes = hub.database().service_writes();

        let res = hub
            .execute(ActivateService {
                service_id: service.id,
            })
            .await
            .unwrap();

        let Activation::Denied(denied) = res else {
            panic!("expected `Activation::Denied`, got: {res:?}");
        };
        assert_eq!(
            denied.reason,
            DenialReason::NotPaid(payment::Status::PartiallyPaid),
        );
        assert_eq!(hub.database().service_writes(), writes);
        assert_eq!(
            fixture::stored(hub.database(), service.id).await.status,
            service::Status::Suspended,
        );
    }

    #[tokio::test]
    async fn denies_service_without_payments() {
        let hub = fixture::hub();
        let service =
            fixture::service(service::Kind::Domain, service::Status::Pending);
        hub.database().execute(Insert(service.clone())).await.unwrap();

        let res = hub
            .execute(ActivateService {
                service_id: service.id,
            })
            .await
            .unwrap();

        assert!(
            matches!(
                res,
                Activation::Denied(d) if d.reason
                    == DenialReason::NotPaid(payment::Status::Unpaid)
            ),
            "{res:?}",
        );
    }

    #[tokio::test]
    async fn denies_expired_service() {
        let hub = fixture::hub();
        let service =
            fixture::service(service::Kind::Domain, service::Status::Expired);
        hub.database().execute(Insert(service.clone())).await.unwrap();
        hub.database()
            .execute(Insert(fixture::payment(
                &service,
                payment::Status::Paid,
                "2024-01-01",
            )))
            .await
            .unwrap();

        let res = hub
            .execute(ActivateService {
                service_id: service.id,
            })
            .await
            .unwrap();

        assert!(
            matches!(
                res,
                Activation::Denied(d) if d.reason == DenialReason::Expired
            ),
            "{res:?}",
        );
    }

    #[tokio::test]
    async fn is_idempotent_for_active_service() {
        let hub = fixture::hub();
        let service =
            fixture::service(service::Kind::Domain, service::Status::Active);
        hub.database().execute(Insert(service.clone())).await.unwrap();
        hub.database()
            .execute(Insert(fixture::payment(
                &service,
                payment::Status::Paid,
                "2024-01-01",
            )))
            .await
            .unwrap();
        let writes = hub.database().service_writes();

        let res = hub
            .execute(ActivateService {
                service_id: service.id,
            })
            .await
            .unwrap();

        assert!(
            matches!(res, Activation::Applied(t) if t.is_noop()),
            "{res:?}",
        );
        assert_eq!(hub.database().service_writes(), writes);
    }

    #[tokio::test]
    async fn fails_on_unknown_service() {
        let hub = fixture::hub();
        let id = service::Id::new();

        let err = hub
            .execute(ActivateService { service_id: id })
            .await
            .unwrap_err();

        assert!(
            matches!(
                err.as_ref(),
                ExecutionError::ServiceNotExists(i) if *i == id,
            ),
            "{err}",
        );
    }

    #[tokio::test]
    async fn propagates_write_failure() {
        let hub = fixture::hub();
        let service =
            fixture::service(service::Kind::Domain, service::Status::Pending);
        hub.database().execute(Insert(service.clone())).await.unwrap();
        hub.database()
            .execute(Insert(fixture::payment(
                &service,
                payment::Status::Paid,
                "2024-01-01",
            )))
            .await
            .unwrap();
        hub.database().reject_writes_of(service.id);

        let err = hub
            .execute(ActivateService {
                service_id: service.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::Db(_)), "{err}");
    }
}
