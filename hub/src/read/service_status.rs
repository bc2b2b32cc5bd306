//! [`ServiceStatus`] read model: payment-gated activation eligibility of
//! [`Service`]s.

use std::collections::{hash_map::Entry, HashMap};

use derive_more::{Display, Error};

use crate::domain::{payment, service, Payment, Service};

/// Payment-derived status of a [`Service`].
///
/// Never stored: recomputed from the [`Service`] and its [`Payment`]s every
/// time it's needed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ServiceStatus {
    /// ID of the [`Service`] this [`ServiceStatus`] is about.
    pub service_id: service::Id,

    /// Current lifecycle [`service::Status`] of the [`Service`].
    pub lifecycle: service::Status,

    /// [`payment::Status`] of the latest [`Payment`] of the [`Service`], or
    /// [`payment::Status::Unpaid`] if there are none.
    pub effective_payment_status: payment::Status,

    /// Indicator whether the [`Service`] is eligible for activation.
    ///
    /// Only the effective payment status is consulted here, the lifecycle
    /// gate is applied by [`ServiceStatus::activation()`].
    pub can_activate: bool,

    /// [`payment::PaymentDateTime`] of the latest [`Payment`], if any.
    pub last_payment_date: Option<payment::PaymentDateTime>,

    /// Days overdue as recorded by the latest [`Payment`], if any.
    pub days_overdue: Option<payment::DaysOverdue>,
}

impl ServiceStatus {
    /// Derives the [`ServiceStatus`] of the provided [`Service`] from its
    /// `latest` [`Payment`].
    #[must_use]
    pub fn new(service: &Service, latest: Option<&Payment>) -> Self {
        let effective_payment_status =
            latest.map_or(payment::Status::Unpaid, |p| p.status);
        Self {
            service_id: service.id,
            lifecycle: service.status,
            effective_payment_status,
            can_activate: effective_payment_status.is_paid(),
            last_payment_date: latest.map(|p| p.paid_at),
            days_overdue: latest.and_then(|p| p.days_overdue),
        }
    }

    /// Derives the [`ServiceStatus`] of the provided [`Service`] out of the
    /// provided `payments`, the same way [`Statuses::compute()`] does.
    #[must_use]
    pub fn of<'p>(
        service: &Service,
        payments: impl IntoIterator<Item = &'p Payment>,
    ) -> Self {
        Self::new(
            service,
            latest_payments(payments)
                .get(&(service.id, service.kind))
                .copied(),
        )
    }

    /// Indicates whether the [`Service`] is unpaid for at least `days`.
    #[must_use]
    pub fn is_overdue_for(&self, days: payment::DaysOverdue) -> bool {
        !self.effective_payment_status.is_paid()
            && self.days_overdue.is_some_and(|d| d >= days)
    }

    /// Checks whether the [`Service`] may be activated, returning the
    /// [`Transition`] to perform.
    ///
    /// # Errors
    ///
    /// With [`ActivationDenied`] if the [`Service`] is not paid, or is
    /// [`service::Status::Expired`].
    pub fn activation(&self) -> Result<Transition, ActivationDenied> {
        let denied = |reason| ActivationDenied {
            service_id: self.service_id,
            reason,
        };

        if !self.lifecycle.is_activatable() {
            return Err(denied(DenialReason::Expired));
        }
        if !self.can_activate {
            return Err(denied(DenialReason::NotPaid(
                self.effective_payment_status,
            )));
        }
        Ok(Transition {
            service_id: self.service_id,
            from: self.lifecycle,
            to: service::Status::Active,
        })
    }
}

/// [`ServiceStatus`]es of multiple [`Service`]s, in the order of the
/// [`Service`]s they were computed for.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Statuses {
    /// [`ServiceStatus`]es in the order of their [`Service`]s.
    list: Vec<ServiceStatus>,

    /// Positions in the `list` by [`Service`] IDs.
    index: HashMap<service::Id, usize>,
}

impl Statuses {
    /// Computes [`ServiceStatus`]es of the provided `services` out of the
    /// provided `payments`.
    ///
    /// [`Payment`]s are grouped by their [`Service`] ID and
    /// [`service::Kind`], and the one with the latest `created_at` decides the
    /// [`ServiceStatus`]. When several [`Payment`]s of the same group share
    /// the latest `created_at`, the one coming last in `payments` wins.
    ///
    /// [`Payment`]s not matching any of the `services` are ignored.
    pub fn compute<'s, 'p>(
        services: impl IntoIterator<Item = &'s Service>,
        payments: impl IntoIterator<Item = &'p Payment>,
    ) -> Self {
        let latest = latest_payments(payments);
        let list = services
            .into_iter()
            .map(|s| {
                ServiceStatus::new(s, latest.get(&(s.id, s.kind)).copied())
            })
            .collect::<Vec<_>>();
        let mut index = HashMap::with_capacity(list.len());
        for (i, s) in list.iter().enumerate() {
            _ = index.entry(s.service_id).or_insert(i);
        }
        Self { list, index }
    }

    /// Returns the [`ServiceStatus`] of the [`Service`] with the provided ID,
    /// if it was computed.
    #[must_use]
    pub fn get(&self, id: service::Id) -> Option<&ServiceStatus> {
        self.index.get(&id).and_then(|&i| self.list.get(i))
    }

    /// Checks whether the [`Service`] with the provided ID may be activated.
    ///
    /// [`None`] is returned if no [`ServiceStatus`] was computed for it.
    #[must_use]
    pub fn activation(
        &self,
        id: service::Id,
    ) -> Option<Result<Transition, ActivationDenied>> {
        self.get(id).map(ServiceStatus::activation)
    }

    /// Iterates over these [`ServiceStatus`]es.
    pub fn iter(&self) -> impl Iterator<Item = &ServiceStatus> {
        self.list.iter()
    }

    /// Returns the number of [`ServiceStatus`]es.
    #[must_use]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Indicates whether there are no [`ServiceStatus`]es.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

impl IntoIterator for Statuses {
    type Item = ServiceStatus;
    type IntoIter = std::vec::IntoIter<ServiceStatus>;

    fn into_iter(self) -> Self::IntoIter {
        self.list.into_iter()
    }
}

/// Picks the latest [`Payment`] of every [`Service`] ID and [`service::Kind`]
/// pair.
///
/// On equal `created_at` the [`Payment`] coming last wins.
fn latest_payments<'p>(
    payments: impl IntoIterator<Item = &'p Payment>,
) -> HashMap<(service::Id, service::Kind), &'p Payment> {
    payments
        .into_iter()
        .fold(HashMap::new(), |mut latest, p| {
            match latest.entry((p.service_id, p.service_kind)) {
                Entry::Vacant(e) => {
                    _ = e.insert(p);
                }
                Entry::Occupied(mut e) => {
                    if p.created_at >= e.get().created_at {
                        _ = e.insert(p);
                    }
                }
            }
            latest
        })
}

/// Change of a [`Service`]'s [`service::Status`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Transition {
    /// ID of the [`Service`].
    pub service_id: service::Id,

    /// [`service::Status`] before the change.
    pub from: service::Status,

    /// [`service::Status`] after the change.
    pub to: service::Status,
}

impl Transition {
    /// Indicates whether this [`Transition`] changes nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

/// Refusal to activate a [`Service`].
///
/// An expected business outcome, rather than a failure.
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
#[display("`Service(id: {service_id})` cannot be activated: {reason}")]
pub struct ActivationDenied {
    /// ID of the [`Service`] refused to be activated.
    pub service_id: service::Id,

    /// [`DenialReason`] of the refusal.
    pub reason: DenialReason,
}

/// Reason of an [`ActivationDenied`].
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum DenialReason {
    /// The latest [`Payment`] is not [`payment::Status::Paid`].
    #[display("effective payment status is {_0}")]
    NotPaid(payment::Status),

    /// The [`Service`] is [`service::Status::Expired`] and must be renewed
    /// first.
    #[display("service is expired")]
    Expired,
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{payment, service, Payment},
        fixture,
    };

    use super::{DenialReason, ServiceStatus, Statuses};

    #[test]
    fn unpaid_without_payments() {
        let services = [
            fixture::service(service::Kind::Domain, service::Status::Pending),
            fixture::service(service::Kind::Hosting, service::Status::Active),
        ];

        let statuses = Statuses::compute(&services, &Vec::<Payment>::new());

        assert_eq!(statuses.len(), 2);
        for status in statuses.iter() {
            assert_eq!(
                status.effective_payment_status,
                payment::Status::Unpaid,
            );
            assert!(!status.can_activate);
            assert_eq!(status.last_payment_date, None);
            assert_eq!(status.days_overdue, None);
        }
    }

    #[test]
    fn latest_payment_decides() {
        let services = [
            fixture::service(service::Kind::Domain, service::Status::Pending),
            fixture::service(service::Kind::Domain, service::Status::Pending),
            fixture::service(service::Kind::Hosting, service::Status::Active),
        ];
        let payments = [
            fixture::payment(
                &services[0],
                payment::Status::Unpaid,
                "2024-03-01",
            ),
            fixture::payment(&services[0], payment::Status::Paid, "2024-01-01"),
            fixture::payment(&services[1], payment::Status::Paid, "2024-01-01"),
            fixture::payment(
                &services[1],
                payment::Status::PartiallyPaid,
                "2024-02-01",
            ),
            fixture::payment(
                &services[2],
                payment::Status::Unpaid,
                "2024-01-01",
            ),
            fixture::payment(&services[2], payment::Status::Paid, "2024-02-01"),
        ];

        let statuses = Statuses::compute(&services, &payments);

        let expected = [
            (payment::Status::Unpaid, false),
            (payment::Status::PartiallyPaid, false),
            (payment::Status::Paid, true),
        ];
        for (service, (effective, can_activate)) in
            services.iter().zip(expected)
        {
            let status = statuses.get(service.id).unwrap();
            assert_eq!(status.effective_payment_status, effective);
            assert_eq!(status.can_activate, can_activate);
        }
    }

    #[test]
    fn preserves_service_order() {
        let services = [
            fixture::service(service::Kind::Hosting, service::Status::Active),
            fixture::service(service::Kind::Domain, service::Status::Pending),
            fixture::service(service::Kind::Domain, service::Status::Suspended),
        ];
        let payments = [
            fixture::payment(&services[2], payment::Status::Paid, "2024-01-01"),
            fixture::payment(&services[0], payment::Status::Paid, "2024-01-01"),
        ];

        let ids = Statuses::compute(&services, &payments)
            .into_iter()
            .map(|s| s.service_id)
            .collect::<Vec<_>>();

        assert_eq!(ids, services.iter().map(|s| s.id).collect::<Vec<_>>());
    }

    #[test]
    fn last_in_input_order_wins_on_equal_creation() {
        let services =
            [fixture::service(service::Kind::Domain, service::Status::Pending)];
        let paid =
            fixture::payment(&services[0], payment::Status::Paid, "2024-01-01");
        let unpaid =
            fixture::payment(
                &services[0],
                payment::Status::Unpaid,
                "2024-01-01",
            );

        let paid_last = Statuses::compute(&services, [&unpaid, &paid]);
        let unpaid_last = Statuses::compute(&services, [&paid, &unpaid]);

        assert!(paid_last.get(services[0].id).unwrap().can_activate);
        assert!(!unpaid_last.get(services[0].id).unwrap().can_activate);
    }

    #[test]
    fn ignores_foreign_payments() {
        let services =
            [fixture::service(service::Kind::Domain, service::Status::Pending)];
        let unknown =
            fixture::service(service::Kind::Domain, service::Status::Pending);
        let mut mismatched =
            fixture::payment(&services[0], payment::Status::Paid, "2024-05-01");
        mismatched.service_kind = service::Kind::Hosting;
        let payments = [
            fixture::payment(
                &services[0],
                payment::Status::Unpaid,
                "2024-01-01",
            ),
            fixture::payment(&unknown, payment::Status::Paid, "2024-06-01"),
            mismatched,
        ];

        let statuses = Statuses::compute(&services, &payments);

        assert_eq!(statuses.len(), 1);
        let status = statuses.get(services[0].id).unwrap();
        assert_eq!(status.effective_payment_status, payment::Status::Unpaid);
        assert!(statuses.get(unknown.id).is_none());
    }

    #[test]
    fn is_idempotent() {
        let services = [
            fixture::service(service::Kind::Domain, service::Status::Pending),
            fixture::service(service::Kind::Hosting, service::Status::Active),
        ];
        let payments = [
            fixture::payment(&services[0], payment::Status::Paid, "2024-01-01"),
            fixture::payment(
                &services[1],
                payment::Status::Unpaid,
                "2024-01-01",
            ),
            fixture::payment(
                &services[1],
                payment::Status::Unpaid,
                "2024-01-01",
            ),
        ];

        assert_eq!(
            Statuses::compute(&services, &payments),
            Statuses::compute(&services, &payments),
        );
    }

    #[test]
    fn carries_latest_payment_details() {
        let services =
            [fixture::service(service::Kind::Hosting, service::Status::Active)];
        let mut older =
            fixture::payment(&services[0], payment::Status::Paid, "2024-01-01");
        older.days_overdue = Some(3);
        let mut latest =
            fixture::payment(
                &services[0],
                payment::Status::Unpaid,
                "2024-02-01",
            );
        latest.days_overdue = Some(12);

        let statuses = Statuses::compute(&services, [&older, &latest]);
        let status = statuses.get(services[0].id).unwrap();

        assert_eq!(status.last_payment_date, Some(latest.paid_at));
        assert_eq!(status.days_overdue, Some(12));
        assert!(status.is_overdue_for(10));
        assert!(status.is_overdue_for(12));
        assert!(!status.is_overdue_for(13));
    }

    #[test]
    fn single_status_matches_bulk() {
        let service = fixture::service(
            service::Kind::Hosting,
            service::Status::Suspended,
        );
        let payments = [
            fixture::payment(&service, payment::Status::Paid, "2024-01-01"),
            fixture::payment(&service, payment::Status::Unpaid, "2023-12-01"),
        ];

        let single = ServiceStatus::of(&service, &payments);

        assert_eq!(
            Some(&single),
            Statuses::compute([&service], &payments).get(service.id),
        );
        assert!(single.can_activate);
    }

    #[test]
    fn activation_gate() {
        let services = [
            fixture::service(service::Kind::Domain, service::Status::Pending),
            fixture::service(service::Kind::Domain, service::Status::Suspended),
            fixture::service(service::Kind::Domain, service::Status::Expired),
        ];
        let payments = [
            fixture::payment(&services[0], payment::Status::Paid, "2024-01-01"),
            fixture::payment(
                &services[1],
                payment::Status::PartiallyPaid,
                "2024-01-01",
            ),
            fixture::payment(&services[2], payment::Status::Paid, "2024-01-01"),
        ];
        let statuses = Statuses::compute(&services, &payments);

        let transition = statuses.activation(services[0].id).unwrap().unwrap();
        assert_eq!(transition.from, service::Status::Pending);
        assert_eq!(transition.to, service::Status::Active);

        let denied = statuses.activation(services[1].id).unwrap().unwrap_err();
        assert_eq!(
            denied.reason,
            DenialReason::NotPaid(payment::Status::PartiallyPaid),
        );

        // Paid, but the lifecycle has no way back from `Expired`.
        assert!(statuses.get(services[2].id).unwrap().can_activate);
        let denied = statuses.activation(services[2].id).unwrap().unwrap_err();
        assert_eq!(denied.reason, DenialReason::Expired);

        assert!(statuses.activation(service::Id::new()).is_none());
    }
}
