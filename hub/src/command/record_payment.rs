//! [`Command`] for recording a new [`Payment`] of a [`Service`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{payment, service, Payment, Service},
    infra::{database, Database},
    Hub,
};

use super::Command;

/// [`Command`] for recording a new [`Payment`] of a [`Service`].
///
/// [`Payment`]s are never changed once recorded: a correction is a newer
/// [`Payment`].
#[derive(Clone, Copy, Debug)]
pub struct RecordPayment {
    /// ID of the [`Service`] the [`Payment`] is made for.
    pub service_id: service::Id,

    /// [`service::Kind`] of the [`Service`] the [`Payment`] is made for.
    pub service_kind: service::Kind,

    /// [`payment::Status`] of a new [`Payment`].
    pub status: payment::Status,

    /// Paid [`Money`].
    pub amount: Money,

    /// [`payment::Method`] of a new [`Payment`].
    pub method: payment::Method,

    /// [`payment::PaymentDateTime`] of a new [`Payment`].
    pub paid_at: payment::PaymentDateTime,

    /// Number of days the [`Service`] is overdue, if known.
    pub days_overdue: Option<payment::DaysOverdue>,
}

impl<Db> Command<RecordPayment> for Hub<Db>
where
    Db: Database<
            Select<By<Option<Service>, service::Id>>,
            Ok = Option<Service>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Payment>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Payment;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: RecordPayment) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RecordPayment {
            service_id,
            service_kind,
            status,
            amount,
            method,
            paid_at,
            days_overdue,
        } = cmd;

        if amount.is_negative() {
            return Err(tracerr::new!(E::NegativeAmount(amount)));
        }

        let service = self
            .database()
            .execute(Select(By::<Option<Service>, _>::new(service_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ServiceNotExists(service_id))
            .map_err(tracerr::wrap!())?;
        if service.kind != service_kind {
            return Err(tracerr::new!(E::KindMismatch {
                service_id,
                expected: service.kind,
                actual: service_kind,
            }));
        }

        let payment = Payment {
            id: payment::Id::new(),
            service_id,
            service_kind,
            status,
            amount,
            method,
            paid_at,
            days_overdue,
            created_at: DateTime::now().coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(payment.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(payment)
    }
}

/// Error of [`RecordPayment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Payment`] is made for another [`service::Kind`] than the
    /// [`Service`] has.
    #[display(
        "`Service(id: {service_id})` is of `{expected}` kind, not `{actual}`"
    )]
    KindMismatch {
        /// ID of the [`Service`].
        service_id: service::Id,

        /// Actual [`service::Kind`] of the [`Service`].
        expected: service::Kind,

        /// [`service::Kind`] the [`Payment`] was recorded for.
        actual: service::Kind,
    },

    /// Paid amount is negative.
    #[display("Paid amount cannot be negative: {_0}")]
    NegativeAmount(#[error(not(source))] Money),

    /// [`Service`] with the provided ID does not exist.
    #[display("`Service(id: {_0})` does not exist")]
    ServiceNotExists(#[error(not(source))] service::Id),
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::{
        operations::{By, Insert, Select},
        Money,
    };

    use crate::{
        domain::{payment, service, Payment},
        fixture,
        infra::Database as _,
        Command as _,
    };

    use super::{ExecutionError, RecordPayment};

    fn record(service: &service::Id, kind: service::Kind) -> RecordPayment {
        RecordPayment {
            service_id: *service,
            service_kind: kind,
            status: payment::Status::Paid,
            amount: Money::from_str("1200.50BDT").unwrap(),
            method: payment::Method::MobileBanking,
            paid_at: fixture::at("2024-03-01").coerce(),
            days_overdue: None,
        }
    }

    #[tokio::test]
    async fn records_payment() {
        let hub = fixture::hub();
        let service =
            fixture::service(service::Kind::Hosting, service::Status::Pending);
        hub.database().execute(Insert(service.clone())).await.unwrap();

        let payment = hub
            .execute(record(&service.id, service::Kind::Hosting))
            .await
            .unwrap();

        let stored = hub
            .database()
            .execute(Select(By::<Vec<Payment>, _>::new(service.id)))
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, payment.id);
        assert_eq!(stored[0].status, payment::Status::Paid);
    }

    #[tokio::test]
    async fn rejects_kind_mismatch() {
        let hub = fixture::hub();
        let service =
            fixture::service(service::Kind::Hosting, service::Status::Pending);
        hub.database().execute(Insert(service.clone())).await.unwrap();

        let err = hub
            .execute(record(&service.id, service::Kind::Domain))
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::KindMismatch { .. }),
            "{err}",
        );
    }

    #[tokio::test]
    async fn rejects_unknown_service() {
        let hub = fixture::hub();

        let err = hub
            .execute(record(&service::Id::new(), service::Kind::Domain))
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::ServiceNotExists(_)),
            "{err}",
        );
    }

    #[tokio::test]
    async fn rejects_negative_amount() {
        let hub = fixture::hub();
        let service =
            fixture::service(service::Kind::Domain, service::Status::Pending);
        hub.database().execute(Insert(service.clone())).await.unwrap();
        let mut cmd = record(&service.id, service::Kind::Domain);
        cmd.amount = Money::from_str("-1BDT").unwrap();

        let err = hub.execute(cmd).await.unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::NegativeAmount(_)),
            "{err}",
        );
    }
}
