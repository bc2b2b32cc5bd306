//! [`Payment`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Select},
    Money,
};
use rust_decimal::Decimal;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{payment, service, Payment},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Reads a [`Payment`] out of the provided [`Row`].
fn from_row(row: &Row) -> Payment {
    Payment {
        id: row.get("id"),
        service_id: row.get("service_id"),
        service_kind: row.get("service_kind"),
        status: row.get("status"),
        amount: Money {
            amount: row.get::<_, Decimal>("amount"),
            currency: row.get("currency"),
        },
        method: row.get("method"),
        paid_at: row.get("paid_at"),
        // Range is guarded by a `CHECK` constraint.
        days_overdue: row.get::<_, Option<i32>>("days_overdue").map(|d| {
            payment::DaysOverdue::try_from(d)
                .unwrap_or(payment::DaysOverdue::MAX)
        }),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Vec<Payment>, service::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Payment>, service::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let service_id = by.into_inner();

        const SQL: &str = "\
            SELECT id, service_id, service_kind, status, \
                   amount, currency, method, \
                   paid_at, days_overdue, created_at \
            FROM payments \
            WHERE service_id = $1::UUID \
            ORDER BY seq";
        Ok(self
            .query(SQL, &[&service_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Select<By<Vec<Payment>, ()>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Payment>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT id, service_id, service_kind, status, \
                   amount, currency, method, \
                   paid_at, days_overdue, created_at \
            FROM payments \
            ORDER BY seq";
        Ok(self
            .query(SQL, &[])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Payment>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(payment): Insert<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        let Payment {
            id,
            service_id,
            service_kind,
            status,
            amount: Money { amount, currency },
            method,
            paid_at,
            days_overdue,
            created_at,
        } = payment;
        let days_overdue = days_overdue.map(i32::from);

        const SQL: &str = "\
            INSERT INTO payments (\
                id, service_id, service_kind, status, \
                amount, currency, method, \
                paid_at, days_overdue, created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::INT2, $4::INT2, \
                $5::NUMERIC, $6::INT2, $7::INT2, \
                $8::TIMESTAMPTZ, $9::INT4, $10::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[
                &id,
                &service_id,
                &service_kind,
                &status,
                &amount,
                &currency,
                &method,
                &paid_at,
                &days_overdue,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
