//! [`Command`] for reconciling [`Service`] statuses with their [`Payment`]s.

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{payment, service, Payment, Service},
    infra::{database, Database},
    read::{
        self,
        service_status::{Statuses, Transition},
    },
    Hub,
};

use super::{
    activate_service::{self, Activation},
    apply_service_action::{Action, BulkResult, Outcome},
    suspend_service, ActivateService, Command, SuspendService,
};

/// Automation rules applied by [`ReconcileServices`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Automation {
    /// Indicator whether [`service::Status::Pending`] and
    /// [`service::Status::Suspended`] [`Service`]s are activated once paid.
    pub activate_on_payment: bool,

    /// Number of overdue days after which an unpaid
    /// [`service::Status::Active`] [`Service`] is suspended.
    ///
    /// [`None`] disables suspension.
    pub suspend_overdue_after: Option<payment::DaysOverdue>,
}

impl Automation {
    /// Indicates whether any of the rules is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.activate_on_payment || self.suspend_overdue_after.is_some()
    }

    /// Returns the [`Action`] this [`Automation`] requires for a [`Service`]
    /// with the provided [`ServiceStatus`], if any.
    ///
    /// [`ServiceStatus`]: read::ServiceStatus
    #[must_use]
    pub fn action_for(&self, status: &read::ServiceStatus) -> Option<Action> {
        use service::Status as S;

        match status.lifecycle {
            S::Pending | S::Suspended
                if self.activate_on_payment && status.can_activate =>
            {
                Some(Action::Activate)
            }
            S::Active
                if self
                    .suspend_overdue_after
                    .is_some_and(|days| status.is_overdue_for(days)) =>
            {
                Some(Action::Suspend)
            }
            S::Pending | S::Suspended | S::Active | S::Expired => None,
        }
    }
}

/// [`Command`] for applying the provided [`Automation`] rules to all the
/// [`Service`]s.
#[derive(Clone, Copy, Debug)]
pub struct ReconcileServices {
    /// [`Automation`] rules to apply.
    pub automation: Automation,
}

impl<Db> Command<ReconcileServices> for Hub<Db>
where
    Db: Database<
            Select<By<Vec<Service>, read::service::list::Filter>>,
            Ok = Vec<Service>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Payment>, ()>>,
            Ok = Vec<Payment>,
            Err = Traced<database::Error>,
        >,
    Self: Command<
            ActivateService,
            Ok = Activation,
            Err = Traced<activate_service::ExecutionError>,
        > + Command<
            SuspendService,
            Ok = Transition,
            Err = Traced<suspend_service::ExecutionError>,
        >,
{
    type Ok = BulkResult;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ReconcileServices,
    ) -> Result<Self::Ok, Self::Err> {
        let ReconcileServices { automation } = cmd;

        let mut result = BulkResult::default();
        if !automation.is_enabled() {
            return Ok(result);
        }

        let services = self
            .database()
            .execute(Select(By::<Vec<Service>, _>::new(
                read::service::list::Filter::default(),
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!())?;
        let payments = self
            .database()
            .execute(Select(By::<Vec<Payment>, _>::new(())))
            .await
            .map_err(tracerr::map_from_and_wrap!())?;

        for status in Statuses::compute(&services, &payments) {
            let Some(action) = automation.action_for(&status) else {
                continue;
            };
            let service_id = status.service_id;
            let outcome = match action {
                Action::Activate => {
                    Outcome::of_activation(self, ActivateService { service_id })
                        .await
                }
                // Overdue rule is checked again under the `Service` lock.
                Action::Suspend => {
                    Outcome::of_suspension(
                        self,
                        SuspendService {
                            service_id,
                            overdue_for: automation.suspend_overdue_after,
                        },
                    )
                    .await
                }
            };
            if outcome.transition().is_some_and(Transition::is_noop) {
                log::debug!(
                    "`Service(id: {service_id})` needs no {action} anymore",
                );
                continue;
            }
            result.push(service_id, outcome);
        }
        Ok(result)
    }
}

/// Error of [`ReconcileServices`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),
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

    use super::{Automation, Outcome, ReconcileServices};

    #[tokio::test]
    async fn performs_no_writes_when_disabled() {
        let hub = fixture::hub();
        let paid =
            fixture::service(service::Kind::Domain, service::Status::Pending);
        let active =
            fixture::service(service::Kind::Hosting, service::Status::Active);
        let mut overdue =
            fixture::payment(&active, payment::Status::Unpaid, "2024-01-01");
        overdue.days_overdue = Some(90);
        hub.database().execute(Insert(paid.clone())).await.unwrap();
        hub.database().execute(Insert(active.clone())).await.unwrap();
        hub.database()
            .execute(Insert(fixture::payment(
                &paid,
                payment::Status::Paid,
                "2024-01-01",
            )))
            .await
            .unwrap();
        hub.database().execute(Insert(overdue)).await.unwrap();
        let writes = hub.database().service_writes();

        let res = hub
            .execute(ReconcileServices {
                automation: Automation::default(),
            })
            .await
            .unwrap();

        assert!(res.is_empty());
        assert_eq!(hub.database().service_writes(), writes);
    }

    #[tokio::test]
    async fn activates_paid_services() {
        let hub = fixture::hub();
        let pending =
            fixture::service(service::Kind::Domain, service::Status::Pending);
        let suspended = fixture::service(
            service::Kind::Hosting,
            service::Status::Suspended,
        );
        let unpaid =
            fixture::service(service::Kind::Domain, service::Status::Pending);
        let expired =
            fixture::service(service::Kind::Domain, service::Status::Expired);
        for s in [&pending, &suspended, &unpaid, &expired] {
            hub.database().execute(Insert(s.clone())).await.unwrap();
        }
        for (s, status) in [
            (&pending, payment::Status::Paid),
            (&suspended, payment::Status::Paid),
            (&unpaid, payment::Status::PartiallyPaid),
            (&expired, payment::Status::Paid),
        ] {
            hub.database()
                .execute(Insert(fixture::payment(s, status, "2024-01-01")))
                .await
                .unwrap();
        }

        let res = hub
            .execute(ReconcileServices {
                automation: Automation {
                    activate_on_payment: true,
                    suspend_overdue_after: None,
                },
            })
            .await
            .unwrap();

        let ids = res.iter().map(|(id, _)| *id).collect::<Vec<_>>();
        assert_eq!(ids, [pending.id, suspended.id]);
        for (id, status) in [
            (pending.id, service::Status::Active),
            (suspended.id, service::Status::Active),
            (unpaid.id, service::Status::Pending),
            (expired.id, service::Status::Expired),
        ] {
            assert_eq!(
                fixture::stored(hub.database(), id).await.status,
                status,
            );
        }
    }

    #[tokio::test]
    async fn suspends_overdue_services() {
        let hub = fixture::hub();
        let overdue =
            fixture::service(service::Kind::Hosting, service::Status::Active);
        let fresh =
            fixture::service(service::Kind::Hosting, service::Status::Active);
        let paid =
            fixture::service(service::Kind::Domain, service::Status::Active);
        for s in [&overdue, &fresh, &paid] {
            hub.database().execute(Insert(s.clone())).await.unwrap();
        }
        for (s, status, days) in [
            (&overdue, payment::Status::Unpaid, 45),
            (&fresh, payment::Status::PartiallyPaid, 5),
            (&paid, payment::Status::Paid, 60),
        ] {
            let mut p = fixture::payment(s, status, "2024-01-01");
            p.days_overdue = Some(days);
            hub.database().execute(Insert(p)).await.unwrap();
        }

        let res = hub
            .execute(ReconcileServices {
                automation: Automation {
                    activate_on_payment: true,
                    suspend_overdue_after: Some(30),
                },
            })
            .await
            .unwrap();

        assert_eq!(res.len(), 1);
        assert!(matches!(
            res.get(overdue.id),
            Some(Outcome::Applied(t)) if t.to == service::Status::Suspended,
        ));
        assert_eq!(
            fixture::stored(hub.database(), fresh.id).await.status,
            service::Status::Active,
        );
        assert_eq!(
            fixture::stored(hub.database(), paid.id).await.status,
            service::Status::Active,
        );
    }

    #[tokio::test]
    async fn keeps_service_paid_after_snapshot() {
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

        let res = hub
            .execute(ReconcileServices {
                automation: Automation {
                    activate_on_payment: false,
                    suspend_overdue_after: Some(30),
                },
            })
            .await
            .unwrap();

        assert!(res.get(service.id).is_none(), "{res:?}");
        assert_eq!(
            fixture::stored(hub.database(), service.id).await.status,
            service::Status::Active,
        );
    }
}
