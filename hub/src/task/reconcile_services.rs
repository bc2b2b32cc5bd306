//! [`ReconcileServices`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::operations::{By, Perform, Start};
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

use crate::{
    command::{
        self, apply_service_action::Outcome, reconcile_services::Automation,
        Command,
    },
    Hub,
};

use super::Task;

/// Configuration for [`ReconcileServices`] [`Task`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Interval between reconciliations.
    pub interval: time::Duration,

    /// [`Automation`] rules to apply on each reconciliation.
    pub automation: Automation,
}

/// [`Task`] for periodically applying [`Automation`] rules to all the
/// [`Service`]s.
///
/// [`Service`]: crate::domain::Service
#[derive(Clone, Copy, Debug)]
pub struct ReconcileServices<H> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Hub`] instance.
    hub: H,
}

impl<Db> Task<Start<By<ReconcileServices<Self>, Config>>> for Hub<Db>
where
    ReconcileServices<Hub<Db>>:
        Task<Perform<()>, Ok = (), Err: Error> + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<ReconcileServices<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        if !config.automation.is_enabled() {
            log::info!("`task::ReconcileServices` has nothing to automate");
        }
        let task = ReconcileServices {
            config,
            hub: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            _ = task.execute(Perform(())).await.map_err(|e| {
                log::error!("`task::ReconcileServices` failed: {e}");
            });
        }
    }
}

impl<Db> Task<Perform<()>> for ReconcileServices<Hub<Db>>
where
    Hub<Db>: Command<
        command::ReconcileServices,
        Ok = command::apply_service_action::BulkResult,
        Err = Traced<command::reconcile_services::ExecutionError>,
    >,
{
    type Ok = ();
    type Err = ExecutionError;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        let result = self
            .hub
            .execute(command::ReconcileServices {
                automation: self.config.automation,
            })
            .await
            .map_err(tracerr::wrap!())?;
        if result.is_empty() {
            return Ok(());
        }

        let (mut applied, mut denied, mut failed) = (0, 0, 0);
        for (_, outcome) in result.iter() {
            match outcome {
                Outcome::Applied(_) => applied += 1,
                Outcome::Denied(_) => denied += 1,
                Outcome::Failed(_) => failed += 1,
            }
        }
        log::info!(
            "`task::ReconcileServices` processed {} `Service`s: \
             {applied} applied, {denied} denied, {failed} failed",
            result.len(),
        );
        Ok(())
    }
}

/// Error of [`ReconcileServices`] execution.
pub type ExecutionError = Traced<command::reconcile_services::ExecutionError>;

#[cfg(test)]
mod spec {
    use common::operations::{Insert, Perform};

    use crate::{
        command::reconcile_services::Automation,
        domain::{payment, service},
        fixture,
        infra::Database as _,
        Task as _,
    };

    use super::{Config, ReconcileServices};

    #[tokio::test]
    async fn applies_configured_automation() {
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
        let task = ReconcileServices {
            config: Config {
                automation: Automation {
                    activate_on_payment: true,
                    suspend_overdue_after: None,
                },
                ..hub.config().reconcile_services
            },
            hub: hub.clone(),
        };

        task.execute(Perform(())).await.unwrap();

        assert_eq!(
            fixture::stored(hub.database(), service.id).await.status,
            service::Status::Active,
        );
    }
}
