//! [`Command`] for applying an [`Action`] to multiple [`Service`]s.

use std::{
    collections::{HashMap, HashSet},
    convert::Infallible,
};

use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::service,
    read::service_status::{ActivationDenied, Transition},
    Hub,
};
#[cfg(doc)]
use crate::domain::Service;

use super::{
    activate_service::{self, Activation},
    suspend_service, ActivateService, Command, SuspendService,
};

/// [`Command`] for applying an [`Action`] to multiple [`Service`]s one by one.
///
/// Every [`Service`] gets its own independent [`Outcome`]: a failure of one of
/// them never prevents the others from being processed.
#[derive(Clone, Debug)]
pub struct ApplyServiceAction {
    /// IDs of the [`Service`]s to apply the [`Action`] to.
    ///
    /// Duplicates are processed once.
    pub service_ids: Vec<service::Id>,

    /// [`Action`] to apply.
    pub action: Action,
}

/// Action applicable to a [`Service`].
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Action {
    /// [`ActivateService`].
    #[display("activation")]
    Activate,

    /// [`SuspendService`].
    #[display("suspension")]
    Suspend,
}

/// Outcome of an [`Action`] applied to a single [`Service`].
#[derive(Debug)]
pub enum Outcome {
    /// [`Action`] has been applied.
    Applied(Transition),

    /// Activation has been denied.
    Denied(ActivationDenied),

    /// [`Action`] has failed.
    Failed(Traced<Failure>),
}

impl Outcome {
    /// Applies the provided [`Action`] to the [`Service`] with the provided
    /// ID via the provided `hub`.
    pub(crate) async fn of<H>(
        hub: &H,
        action: Action,
        service_id: service::Id,
    ) -> Self
    where
        H: Command<
                ActivateService,
                Ok = Activation,
                Err = Traced<activate_service::ExecutionError>,
            > + Command<
                SuspendService,
                Ok = Transition,
                Err = Traced<suspend_service::ExecutionError>,
            >,
    {
        match action {
            Action::Activate => {
                Self::of_activation(hub, ActivateService { service_id }).await
            }
            Action::Suspend => {
                Self::of_suspension(
                    hub,
                    SuspendService {
                        service_id,
                        overdue_for: None,
                    },
                )
                .await
            }
        }
    }

    /// Executes the provided [`ActivateService`] [`Command`] via the provided
    /// `hub`.
    pub(crate) async fn of_activation<H>(hub: &H, cmd: ActivateService) -> Self
    where
        H: Command<
            ActivateService,
            Ok = Activation,
            Err = Traced<activate_service::ExecutionError>,
        >,
    {
        hub.execute(cmd)
            .await
            .map(|a| match a {
                Activation::Applied(t) => Self::Applied(t),
                Activation::Denied(d) => Self::Denied(d),
            })
            .map_err(tracerr::map_from_and_wrap!(=> Failure))
            .unwrap_or_else(|e| {
                Self::failed(Action::Activate, cmd.service_id, e)
            })
    }

    /// Executes the provided [`SuspendService`] [`Command`] via the provided
    /// `hub`.
    pub(crate) async fn of_suspension<H>(hub: &H, cmd: SuspendService) -> Self
    where
        H: Command<
            SuspendService,
            Ok = Transition,
            Err = Traced<suspend_service::ExecutionError>,
        >,
    {
        hub.execute(cmd)
            .await
            .map(Self::Applied)
            .map_err(tracerr::map_from_and_wrap!(=> Failure))
            .unwrap_or_else(|e| {
                Self::failed(Action::Suspend, cmd.service_id, e)
            })
    }

    /// Logs the provided [`Failure`] and wraps it into an [`Outcome`].
    fn failed(
        action: Action,
        service_id: service::Id,
        err: Traced<Failure>,
    ) -> Self {
        log::warn!("{action} of `Service(id: {service_id})` failed: {err}");
        Self::Failed(err)
    }

    /// Returns the applied [`Transition`], if any.
    #[must_use]
    pub fn transition(&self) -> Option<&Transition> {
        match self {
            Self::Applied(t) => Some(t),
            Self::Denied(_) | Self::Failed(_) => None,
        }
    }
}

/// Failure of an [`Action`] applied to a single [`Service`].
#[derive(Debug, Display, Error, From)]
pub enum Failure {
    /// [`ActivateService`] failed.
    #[display("activation failed: {_0}")]
    Activate(activate_service::ExecutionError),

    /// [`SuspendService`] failed.
    #[display("suspension failed: {_0}")]
    Suspend(suspend_service::ExecutionError),
}

/// [`Outcome`]s of an [`Action`] applied to multiple [`Service`]s, in the
/// order the [`Service`]s were first requested.
#[derive(Debug, Default)]
pub struct BulkResult {
    /// [`Outcome`]s along with their [`Service`] IDs.
    outcomes: Vec<(service::Id, Outcome)>,

    /// Positions in the `outcomes` by [`Service`] IDs.
    index: HashMap<service::Id, usize>,
}

impl BulkResult {
    /// Returns the [`Outcome`] for the [`Service`] with the provided ID, if
    /// it was processed.
    #[must_use]
    pub fn get(&self, id: service::Id) -> Option<&Outcome> {
        self.index
            .get(&id)
            .and_then(|&i| self.outcomes.get(i))
            .map(|(_, o)| o)
    }

    /// Iterates over these [`Outcome`]s along with their [`Service`] IDs.
    pub fn iter(&self) -> impl Iterator<Item = &(service::Id, Outcome)> {
        self.outcomes.iter()
    }

    /// Returns the number of processed [`Service`]s.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Indicates whether no [`Service`]s were processed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Appends the provided [`Outcome`] of the [`Service`] with the provided
    /// ID.
    pub(crate) fn push(&mut self, id: service::Id, outcome: Outcome) {
        _ = self.index.entry(id).or_insert(self.outcomes.len());
        self.outcomes.push((id, outcome));
    }
}

impl IntoIterator for BulkResult {
    type Item = (service::Id, Outcome);
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}

impl<Db> Command<ApplyServiceAction> for Hub<Db>
where
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
    type Err = Infallible;

    async fn execute(
        &self,
        cmd: ApplyServiceAction,
    ) -> Result<Self::Ok, Self::Err> {
        let ApplyServiceAction {
            service_ids,
            action,
        } = cmd;

        let mut seen = HashSet::with_capacity(service_ids.len());
        let mut result = BulkResult::default();
        for id in service_ids {
            if !seen.insert(id) {
                continue;
            }
            result.push(id, Outcome::of(self, action, id).await);
        }
        Ok(result)
    }
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

    use super::{Action, ApplyServiceAction, Failure, Outcome};

    #[tokio::test]
    async fn processes_each_service_independently() {
        let hub = fixture::hub();
        let paid =
            fixture::service(service::Kind::Domain, service::Status::Pending);
        let unpaid =
            fixture::service(service::Kind::Domain, service::Status::Pending);
        let broken =
            fixture::service(service::Kind::Hosting, service::Status::Pending);
        let also_paid = fixture::service(
            service::Kind::Hosting,
            service::Status::Suspended,
        );
        for s in [&paid, &unpaid, &broken, &also_paid] {
            hub.database().execute(Insert(s.clone())).await.unwrap();
        }
        for (s, status) in [
            (&paid, payment::Status::Paid),
            (&unpaid, payment::Status::Unpaid),
            (&broken, payment::Status::Paid),
            (&also_paid, payment::Status::Paid),
        ] {
            hub.database()
                .execute(Insert(fixture::payment(s, status, "2024-01-01")))
                .await
                .unwrap();
        }
        hub.database().reject_writes_of(broken.id);

        let res = hub
            .execute(ApplyServiceAction {
                service_ids: vec![paid.id, unpaid.id, broken.id, also_paid.id],
                action: Action::Activate,
            })
            .await
            .unwrap();

        assert_eq!(res.len(), 4);
        assert!(matches!(res.get(paid.id), Some(Outcome::Applied(_))));
        assert!(matches!(res.get(unpaid.id), Some(Outcome::Denied(_))));
        assert!(matches!(
            res.get(broken.id),
            Some(Outcome::Failed(e))
                if matches!(e.as_ref(), Failure::Activate(_)),
        ));
        assert!(matches!(res.get(also_paid.id), Some(Outcome::Applied(_))));

        for (id, status) in [
            (paid.id, service::Status::Active),
            (unpaid.id, service::Status::Pending),
            (broken.id, service::Status::Pending),
            (also_paid.id, service::Status::Active),
        ] {
            assert_eq!(
                fixture::stored(hub.database(), id).await.status,
                status,
            );
        }
    }

    #[tokio::test]
    async fn dedupes_preserving_first_occurrence() {
        let hub = fixture::hub();
        let a = fixture::service(
            service::Kind::Domain,
            service::Status::Active,
        );
        let b = fixture::service(
            service::Kind::Domain,
            service::Status::Active,
        );
        for s in [&a, &b] {
            hub.database().execute(Insert(s.clone())).await.unwrap();
        }
        let missing = service::Id::new();

        let res = hub
            .execute(ApplyServiceAction {
                service_ids: vec![b.id, a.id, b.id, missing, a.id],
                action: Action::Suspend,
            })
            .await
            .unwrap();

        let ids = res.iter().map(|(id, _)| *id).collect::<Vec<_>>();
        assert_eq!(ids, [b.id, a.id, missing]);
        assert!(res.get(a.id).unwrap().transition().is_some());
        assert!(res.get(b.id).unwrap().transition().is_some());
        assert!(matches!(res.get(missing), Some(Outcome::Failed(_))));
        assert_eq!(hub.database().service_writes(), 4);
    }

    #[tokio::test]
    async fn handles_empty_input() {
        let hub = fixture::hub();

        let res = hub
            .execute(ApplyServiceAction {
                service_ids: vec![],
                action: Action::Activate,
            })
            .await
            .unwrap();

        assert!(res.is_empty());
    }
}
