//! [`Command`] for suspending a [`Service`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{payment, service, Payment, Service},
    infra::{database, Database},
    read::service_status::{ServiceStatus, Transition},
    Hub,
};

use super::Command;

/// [`Command`] for suspending a [`Service`].
///
/// Payments are not consulted unless `overdue_for` is specified.
#[derive(Clone, Copy, Debug)]
pub struct SuspendService {
    /// ID of the [`Service`] to be suspended.
    pub service_id: service::Id,

    /// Number of overdue days the [`Service`] must still be unpaid for at the
    /// moment of suspension.
    ///
    /// If the [`Service`]'s [`Payment`]s don't satisfy it anymore, nothing is
    /// written and a no-op [`Transition`] is returned.
    pub overdue_for: Option<payment::DaysOverdue>,
}

impl<Db> Command<SuspendService> for Hub<Db>
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
    type Ok = Transition;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: SuspendService,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SuspendService {
            service_id,
            overdue_for,
        } = cmd;

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

        if !service.status.is_suspendable() {
            return Err(tracerr::new!(E::ServiceExpired(service_id)));
        }

        if let Some(days) = overdue_for {
            let payments = tx
                .execute(Select(By::<Vec<Payment>, _>::new(service_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if !ServiceStatus::of(&service, &payments).is_overdue_for(days) {
                log::debug!(
                    "`Service(id: {service_id})` is not overdue for {days} \
                     days anymore, skipping suspension",
                );
                return Ok(Transition {
                    service_id,
                    from: service.status,
                    to: service.status,
                });
            }
        }

        let transition = Transition {
            service_id,
            from: service.status,
            to: service::Status::Suspended,
        };
        if transition.is_noop() {
            return Ok(transition);
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
            "`Service(id: {service_id})` suspended: {} -> {}",
            transition.from,
            transition.to,
        );

        Ok(transition)
    }
}

/// Error of [`SuspendService`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Service`] is [`service::Status::Expired`] and must be renewed first.
    #[display("`Service(id: {_0})` is expired")]
    ServiceExpired(#[error(not(source))] service::Id),

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
        Command as _,
    };

    use super::{ExecutionError, SuspendService};

    #[tokio::test]
    async fn suspends_regardless_of_payments() {
        for status in [service::Status::Active, service::Status::Pending] {
            let hub = fixture::hub();
            let service = fixture::service(service::Kind::Hosting, status);
            hub.database().execute(Insert(service.clone())).await.unwrap();
            hub.database()
                .execute(Insert(fixture::payment(
                    &service,
                    payment::Status::Paid,
                    "2024-01-01",
                )))
                .await
                .unwrap();

            let t = hub
                .execute(SuspendService {
                    service_id: service.id,
                    overdue_for: None,
                })
                .await
                .unwrap();

            assert_eq!(t.from, status);
            assert_eq!(t.to, service::Status::Suspended);
            assert_eq!(
                fixture::stored(hub.database(), service.id).await.status,
                service::Status::Suspended,
            );
        }
    }

    #[tokio::test]
    async fn is_idempotent_for_suspended_service() {
        let hub = fixture::hub();
        let service =
            fixture::service(service::Kind::Domain, service::Status::Suspended);
        hub.database().execute(Insert(service.clone())).await.unwrap();
        let writes = hub.database().service_writes();

        let t = hub
            .execute(SuspendService {
                service_id: service.id,
                overdue_for: None,
            })
            .await
            .unwrap();

        assert!(t.is_noop());
        assert_eq!(hub.database().service_writes(), writes);
    }

    #[tokio::test]
    async fn fails_on_expired_service() {
        let hub = fixture::hub();
        let service =
            fixture::service(service::Kind::Domain, service::Status::Expired);
        hub.database().execute(Insert(service.clone())).await.unwrap();

        let err = hub
            .execute(SuspendService {
                service_id: service.id,
                overdue_for: None,
            })
            .await
            .unwrap_err();

        assert!(
            matches!(
                err.as_ref(),
                ExecutionError::ServiceExpired(id) if *id == service.id,
            ),
            "{err}",
        );
        assert_eq!(
            fixture::stored(hub.database(), service.id).await.status,
            service::Status::Expired,
        );
    }

    #[tokio::test]
    async fn fails_on_unknown_service() {
        let hub = fixture::hub();

        let err = hub
            .execute(SuspendService {
                service_id: service::Id::new(),
                overdue_for: None,
            })
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::ServiceNotExists(_)),
            "{err}",
        );
    }

    #[tokio::test]
    async fn suspends_while_still_overdue() {
        let hub = fixture::hub();
        let service =
            fixture::service(service::Kind::Hosting, service::Status::Active);
        hub.database().execute(Insert(service.clone())).await.unwrap();
        let mut unpaid =
            fixture::payment(&service, payment::Status::Unpaid, "2024-01-01");
        unpaid.days_overdue = Some(45);
        hub.database().execute(Insert(unpaid)).await.unwrap();

        let t = hub
            .execute(SuspendService {
                service_id: service.id,
                overdue_for: Some(30),
            })
            .await
            .unwrap();

        assert_eq!(t.to, service::Status::Suspended);
        assert_eq!(
            fixture::stored(hub.database(), service.id).await.status,
            service::Status::Suspended,
        );
    }

    #[tokio::test]
    async fn skips_service_paid_before_lock() {
        let hub = fixture::hub();
        let service =
            fixture::service(service::Kind::Hosting, service::Status::Active);
        hub.database().execute(Insert(service.clone())).await.unwrap();
        let mut unpaid =
            fixture::payment(&service, payment::Status::Unpaid, "2024-01-01");
        unpaid.days_overdue = Some(45);
        hub.database().execute(Insert(unpaid)).await.unwrap();
        hub.database().record_on_lock(fixture::payment(
            &service,
            payment::Status::Paid,
            "2024-02-01",
        ));
        let writes = hub.database().service_writes();

        let t = hub
            .execute(SuspendService {
                service_id: service.id,
                overdue_for: Some(30),
            })
            .await
            .unwrap();

        assert!(t.is_noop(), "{t:?}");
        assert_eq!(hub.database().service_writes(), writes);
        assert_eq!(
            fixture::stored(hub.database(), service.id).await.status,
            service::Status::Active,
        );
    }
}
