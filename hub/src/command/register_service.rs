//! [`Command`] for registering a new [`Service`] of a [`Client`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{client, service, Client, Service},
    infra::{database, Database},
    Hub,
};

use super::Command;

/// [`Command`] for registering a new [`Service`] of a [`Client`].
///
/// The new [`Service`] starts as [`service::Status::Pending`].
#[derive(Clone, Debug)]
pub struct RegisterService {
    /// [`service::Kind`] of a new [`Service`].
    pub kind: service::Kind,

    /// [`service::Name`] of a new [`Service`].
    pub name: service::Name,

    /// ID of the [`Client`] owning a new [`Service`].
    pub client_id: client::Id,

    /// [`service::ExpirationDateTime`] of a new [`Service`].
    pub expires_at: service::ExpirationDateTime,
}

impl<Db> Command<RegisterService> for Hub<Db>
where
    Db: Database<
            Select<By<Option<Client>, client::Id>>,
            Ok = Option<Client>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Service>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Service;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RegisterService,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RegisterService {
            kind,
            name,
            client_id,
            expires_at,
        } = cmd;

        self.database()
            .execute(Select(By::<Option<Client>, _>::new(client_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ClientNotExists(client_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let service = Service {
            id: service::Id::new(),
            kind,
            name,
            client_id,
            status: service::Status::Pending,
            expires_at,
            created_at: DateTime::now().coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(service.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(service)
    }
}

/// Error of [`RegisterService`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Client`] with the provided ID does not exist.
    #[display("`Client(id: {_0})` does not exist")]
    ClientNotExists(#[error(not(source))] client::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),
}

#[cfg(test)]
mod spec {
    use common::operations::Insert;

    use crate::{
        domain::{client, service},
        fixture,
        infra::Database as _,
        Command as _,
    };

    use super::{ExecutionError, RegisterService};

    #[tokio::test]
    async fn registers_pending_service() {
        let hub = fixture::hub();
        let client = fixture::client();
        hub.database().execute(Insert(client.clone())).await.unwrap();

        let service = hub
            .execute(RegisterService {
                kind: service::Kind::Domain,
                name: service::Name::new("acme.test").unwrap(),
                client_id: client.id,
                expires_at: fixture::at("2030-01-01").coerce(),
            })
            .await
            .unwrap();

        assert_eq!(service.status, service::Status::Pending);
        let stored = fixture::stored(hub.database(), service.id).await;
        assert_eq!(stored.client_id, client.id);
        assert_eq!(stored.name, service.name);
    }

    #[tokio::test]
    async fn requires_existing_client() {
        let hub = fixture::hub();
        let client_id = client::Id::new();

        let err = hub
            .execute(RegisterService {
                kind: service::Kind::Hosting,
                name: service::Name::new("Starter 5GB").unwrap(),
                client_id,
                expires_at: fixture::at("2030-01-01").coerce(),
            })
            .await
            .unwrap_err();

        assert!(
            matches!(
                err.as_ref(),
                ExecutionError::ClientNotExists(id) if *id == client_id,
            ),
            "{err}",
        );
    }
}
