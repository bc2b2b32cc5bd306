//! [`Command`] for creating a new [`Client`].

use common::{
    operations::{Commit, Insert, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::client::{Email, Name, Phone};
use crate::{
    domain::{client, Client},
    infra::{database, Database},
    Hub,
};

use super::Command;

/// [`Command`] for creating a new [`Client`].
#[derive(Clone, Debug)]
pub struct CreateClient {
    /// [`Name`] of a new [`Client`].
    pub name: client::Name,

    /// [`Email`] of a new [`Client`].
    pub email: Option<client::Email>,

    /// [`Phone`] of a new [`Client`].
    pub phone: Option<client::Phone>,
}

impl<Db> Command<CreateClient> for Hub<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Client>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Client;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateClient) -> Result<Self::Ok, Self::Err> {
        let CreateClient { name, email, phone } = cmd;

        let client = Client {
            id: client::Id::new(),
            name,
            email,
            phone,
            created_at: DateTime::now().coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!())?;
        tx.execute(Insert(client.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!())
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!())
            .map(drop)?;

        Ok(client)
    }
}

/// Error of [`CreateClient`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};

    use crate::{
        domain::{client, Client},
        fixture,
        infra::Database as _,
        Command as _,
    };

    use super::CreateClient;

    #[tokio::test]
    async fn stores_client() {
        let hub = fixture::hub();

        let client = hub
            .execute(CreateClient {
                name: client::Name::new("Rahim Traders").unwrap(),
                email: None,
                phone: client::Phone::new("+8801712345678"),
            })
            .await
            .unwrap();

        let stored = hub
            .database()
            .execute(Select(By::<Option<Client>, _>::new(client.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.name, client.name);
        assert_eq!(stored.phone, client.phone);
    }
}
