//! [`Client`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{client, Client},
    infra::{
        database::{
            self,
            postgres::{Connection, FuzzPattern},
            Postgres,
        },
        Database,
    },
    read,
};

/// Reads a [`Client`] out of the provided [`Row`].
fn from_row(row: &Row) -> Client {
    Client {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Client>, client::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Client>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Client>, client::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, name, email, phone, created_at \
            FROM clients \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Client>, read::client::list::Filter>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Client>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Client>, read::client::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::client::list::Filter { name } = by.into_inner();

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];

        let name_pattern = name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .map(FuzzPattern::new);
        let name_pattern_idx = name_pattern.as_ref().map(|n| {
            ps.push(n);
            ps.len()
        });

        let sql = format!(
            "SELECT id, name, email, phone, created_at \
             FROM clients \
             WHERE TRUE \
                   {name_filtering} \
             ORDER BY created_at, id",
            name_filtering =
                name_pattern_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!(
                        "AND LOWER(name) SIMILAR TO LOWER(${idx}::VARCHAR)"
                    ))
                }),
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

impl<C> Database<Insert<Client>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(client): Insert<Client>,
    ) -> Result<Self::Ok, Self::Err> {
        let Client {
            id,
            name,
            email,
            phone,
            created_at,
        } = client;

        const SQL: &str = "\
            INSERT INTO clients (id, name, email, phone, created_at) \
            VALUES (\
                $1::UUID, \
                $2::VARCHAR, \
                $3::VARCHAR, $4::VARCHAR, \
                $5::TIMESTAMPTZ\
            )";
        self.exec(SQL, &[&id, &name, &email, &phone, &created_at])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
