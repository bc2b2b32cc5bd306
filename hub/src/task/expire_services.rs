//! [`ExpireServices`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::operations::{
    By, Commit, Lock, Perform, Select, Start, Transact, Transacted, Update,
};
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{service, Service},
    infra::{database, Database},
    Hub,
};

use super::Task;

/// Configuration for [`ExpireServices`] [`Task`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Interval between [`Service`] expiration checks.
    pub interval: time::Duration,
}

/// [`Task`] for moving [`Service`]s past their expiration date into
/// [`service::Status::Expired`].
#[derive(Clone, Copy, Debug)]
pub struct ExpireServices<H> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Hub`] instance.
    hub: H,
}

impl<Db> Task<Start<By<ExpireServices<Self>, Config>>> for Hub<Db>
where
    ExpireServices<Hub<Db>>:
        Task<Perform<()>, Ok = usize, Err: Error> + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<ExpireServices<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = ExpireServices {
            config,
            hub: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            match task.execute(Perform(())).await {
                Ok(0) => {}
                Ok(n) => {
                    log::info!("`task::ExpireServices` expired {n} `Service`s");
                }
                Err(e) => log::error!("`task::ExpireServices` failed: {e}"),
            }
        }
    }
}

impl<Db> Task<Perform<()>> for ExpireServices<Hub<Db>>
where
    Db: Database<
            Select<By<Vec<Service>, service::ExpirationDateTime>>,
            Ok = Vec<Service>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
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
    type Ok = usize;
    type Err = ExecutionError;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        let now = service::ExpirationDateTime::now();
        let due = self
            .hub
            .database()
            .execute(Select(By::<Vec<Service>, _>::new(now)))
            .await
            .map_err(tracerr::wrap!())?;

        let mut expired = 0;
        for service in due {
            match self.expire(service.id, now).await {
                Ok(true) => expired += 1,
                Ok(false) => {}
                Err(e) => log::error!(
                    "`task::ExpireServices` failed to expire \
                     `Service(id: {})`: {e}",
                    service.id,
                ),
            }
        }
        Ok(expired)
    }
}

impl<Db> ExpireServices<Hub<Db>>
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
    /// Moves the [`Service`] with the provided ID into
    /// [`service::Status::Expired`] in its own transaction, if it's still due.
    ///
    /// Returns whether the [`Service`] has been expired.
    async fn expire(
        &self,
        id: service::Id,
        now: service::ExpirationDateTime,
    ) -> Result<bool, ExecutionError> {
        let tx = self
            .hub
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::wrap!())?;

        tx.execute(Lock(By::new(id)))
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let Some(mut service) = tx
            .execute(Select(By::<Option<Service>, _>::new(id)))
            .await
            .map_err(tracerr::wrap!())?
            .filter(|s| {
                s.status != service::Status::Expired && s.is_expired_at(now)
            })
        else {
            return Ok(false);
        };

        service.status = service::Status::Expired;
        tx.execute(Update(service))
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;

        Ok(true)
    }
}

/// Error of [`ExpireServices`] execution.
pub type ExecutionError = Traced<database::Error>;

#[cfg(test)]
mod spec {
    use common::operations::{Insert, Perform};

    use crate::{domain::service, fixture, infra::Database as _, Task as _};

    use super::ExpireServices;

    #[tokio::test]
    async fn expires_only_due_services() {
        let hub = fixture::hub();
        let mut due =
            fixture::service(service::Kind::Domain, service::Status::Active);
        due.expires_at = fixture::at("2020-01-01").coerce();
        let mut suspended = fixture::service(
            service::Kind::Hosting,
            service::Status::Suspended,
        );
        suspended.expires_at = fixture::at("2021-06-01").coerce();
        let running =
            fixture::service(service::Kind::Domain, service::Status::Active);
        for s in [&due, &suspended, &running] {
            hub.database().execute(Insert(s.clone())).await.unwrap();
        }
        let task = ExpireServices {
            config: hub.config().expire_services,
            hub: hub.clone(),
        };

        assert_eq!(task.execute(Perform(())).await.unwrap(), 2);
        // Nothing is left to expire.
        assert_eq!(task.execute(Perform(())).await.unwrap(), 0);

        for (id, status) in [
            (due.id, service::Status::Expired),
            (suspended.id, service::Status::Expired),
            (running.id, service::Status::Active),
        ] {
            assert_eq!(
                fixture::stored(hub.database(), id).await.status,
                status,
            );
        }
    }

    #[tokio::test]
    async fn keeps_going_on_failure() {
        let hub = fixture::hub();
        let mut broken =
            fixture::service(service::Kind::Domain, service::Status::Active);
        broken.expires_at = fixture::at("2020-01-01").coerce();
        let mut due =
            fixture::service(service::Kind::Domain, service::Status::Pending);
        due.expires_at = fixture::at("2020-01-01").coerce();
        for s in [&broken, &due] {
            hub.database().execute(Insert(s.clone())).await.unwrap();
        }
        hub.database().reject_writes_of(broken.id);
        let task = ExpireServices {
            config: hub.config().expire_services,
            hub: hub.clone(),
        };

        assert_eq!(task.execute(Perform(())).await.unwrap(), 1);
        assert_eq!(
            fixture::stored(hub.database(), due.id).await.status,
            service::Status::Expired,
        );
    }
}
