//! [`Service`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select, Update};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{service, Service},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Reads a [`Service`] out of the provided [`Row`].
fn from_row(row: &Row) -> Service {
    Service {
        id: row.get("id"),
        kind: row.get("kind"),
        name: row.get("name"),
        client_id: row.get("client_id"),
        status: row.get("status"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Service>, service::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Service>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Service>, service::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, kind, name, client_id, \
                   status, expires_at, created_at \
            FROM services \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Service>, read::service::list::Filter>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Service>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Service>, read::service::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::service::list::Filter {
            client_id,
            kind,
            status,
        } = by.into_inner();

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];
        let mut conditions = vec![];

        if let Some(id) = &client_id {
            ps.push(id);
            conditions.push(format!("client_id = ${}::UUID", ps.len()));
        }
        if let Some(k) = &kind {
            ps.push(k);
            conditions.push(format!("kind = ${}::INT2", ps.len()));
        }
        if let Some(s) = &status {
            ps.push(s);
            conditions.push(format!("status = ${}::INT2", ps.len()));
        }

        let sql = format!(
            "SELECT id, kind, name, client_id, \
                    status, expires_at, created_at \
             FROM services \
             WHERE TRUE \
                   {filtering} \
             ORDER BY created_at, id",
            filtering = conditions
                .iter()
                .format_with("", |c, f| f(&format_args!("AND {c} "))),
        );
        Ok(self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Select<By<Vec<Service>, service::ExpirationDateTime>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Service>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Service>, service::ExpirationDateTime>>,
    ) -> Result<Self::Ok, Self::Err> {
        let deadline = by.into_inner();
        let expired = service::Status::Expired;

        const SQL: &str = "\
            SELECT id, kind, name, client_id, \
                   status, expires_at, created_at \
            FROM services \
            WHERE expires_at <= $1::TIMESTAMPTZ \
              AND status <> $2::INT2 \
            ORDER BY expires_at, id";
        Ok(self
            .query(SQL, &[&deadline, &expired])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Service>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Service>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(service): Insert<Service>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(service)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Service>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(service): Update<Service>,
    ) -> Result<Self::Ok, Self::Err> {
        let Service {
            id,
            kind,
            name,
            client_id,
            status,
            expires_at,
            created_at,
        } = service;

        const SQL: &str = "\
            INSERT INTO services (\
                id, kind, name, client_id, \
                status, expires_at, created_at\
            ) \
            VALUES (\
                $1::UUID, $2::INT2, $3::VARCHAR, $4::UUID, \
                $5::INT2, $6::TIMESTAMPTZ, $7::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET kind = EXCLUDED.kind, \
                name = EXCLUDED.name, \
                client_id = EXCLUDED.client_id, \
                status = EXCLUDED.status, \
                expires_at = EXCLUDED.expires_at, \
                created_at = EXCLUDED.created_at";
        self.exec(
            SQL,
            &[
                &id,
                &kind,
                &name,
                &client_id,
                &status,
                &expires_at,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Service, service::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Service, service::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: service::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM services \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
