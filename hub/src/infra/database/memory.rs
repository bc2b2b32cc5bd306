//! In-memory [`Database`] implementation.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Update,
};
use derive_more::{Display, Error as StdError};
use tracerr::Traced;

use crate::{
    domain::{client, service, Client, Payment, Service},
    infra::{database, Database},
    read,
};

/// In-memory [`Database`] keeping everything in insertion order.
///
/// Writes are applied immediately, so [`Commit`] does nothing and [`Lock`]s
/// provide no isolation beyond a single operation.
#[derive(Clone, Debug, Default)]
pub struct Memory(Arc<Mutex<State>>);

/// State of a [`Memory`] database.
#[derive(Debug, Default)]
struct State {
    /// Stored [`Client`]s.
    clients: Vec<Client>,

    /// Stored [`Service`]s.
    services: Vec<Service>,

    /// Stored [`Payment`]s.
    payments: Vec<Payment>,

    /// IDs of the [`Service`]s whose writes are rejected.
    rejected: HashSet<service::Id>,

    /// Number of successful [`Service`] writes.
    service_writes: usize,

    /// [`Payment`]s to be recorded once their [`Service`] gets locked.
    on_lock: Vec<Payment>,
}

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following write of the [`Service`] with the provided ID
    /// fail with an [`Error::WriteRejected`].
    pub fn reject_writes_of(&self, id: service::Id) {
        _ = self.state().rejected.insert(id);
    }

    /// Records the provided [`Payment`] right after its [`Service`] gets
    /// locked, as if it was recorded concurrently.
    pub fn record_on_lock(&self, payment: Payment) {
        self.state().on_lock.push(payment);
    }

    /// Returns the number of successful [`Service`] writes performed so far.
    #[must_use]
    pub fn service_writes(&self) -> usize {
        self.state().service_writes
    }

    /// Locks the [`State`] of this [`Memory`] database.
    fn state(&self) -> MutexGuard<'_, State> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl State {
    /// Writes the provided [`Service`], replacing the existing one with the
    /// same ID, if any.
    fn write_service(
        &mut self,
        service: Service,
    ) -> Result<(), Traced<database::Error>> {
        if self.rejected.contains(&service.id) {
            return Err(tracerr::new!(database::Error::from(
                Error::WriteRejected(service.id)
            )));
        }

        if let Some(s) = self.services.iter_mut().find(|s| s.id == service.id)
        {
            *s = service;
        } else {
            self.services.push(service);
        }
        self.service_writes += 1;
        Ok(())
    }
}

/// [`Memory`] database error.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// Write of a [`Service`] was rejected.
    #[display("writes of `Service(id: {_0})` are rejected")]
    WriteRejected(#[error(not(source))] service::Id),
}

impl Database<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Database<Select<By<Option<Client>, client::Id>>> for Memory {
    type Ok = Option<Client>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Client>, client::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.state().clients.iter().find(|c| c.id == id).cloned())
    }
}

impl Database<Select<By<Vec<Client>, read::client::list::Filter>>> for Memory {
    type Ok = Vec<Client>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Client>, read::client::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();
        Ok(self
            .state()
            .clients
            .iter()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect())
    }
}

impl Database<Insert<Client>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(client): Insert<Client>,
    ) -> Result<Self::Ok, Self::Err> {
        self.state().clients.push(client);
        Ok(())
    }
}

impl Database<Select<By<Option<Service>, service::Id>>> for Memory {
    type Ok = Option<Service>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Service>, service::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.state().services.iter().find(|s| s.id == id).cloned())
    }
}

impl Database<Select<By<Vec<Service>, read::service::list::Filter>>>
    for Memory
{
    type Ok = Vec<Service>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Service>, read::service::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();
        Ok(self
            .state()
            .services
            .iter()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect())
    }
}

impl Database<Select<By<Vec<Service>, service::ExpirationDateTime>>>
    for Memory
{
    type Ok = Vec<Service>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Service>, service::ExpirationDateTime>>,
    ) -> Result<Self::Ok, Self::Err> {
        let deadline = by.into_inner();
        Ok(self
            .state()
            .services
            .iter()
            .filter(|s| {
                s.status != service::Status::Expired
                    && s.is_expired_at(deadline)
            })
            .cloned()
            .collect())
    }
}

impl Database<Insert<Service>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(service): Insert<Service>,
    ) -> Result<Self::Ok, Self::Err> {
        self.state().write_service(service)
    }
}

impl Database<Update<Service>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(service): Update<Service>,
    ) -> Result<Self::Ok, Self::Err> {
        self.state().write_service(service)
    }
}

impl Database<Lock<By<Service, service::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Service, service::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        let mut state = self.state();
        let (recorded, pending) = state
            .on_lock
            .drain(..)
            .partition::<Vec<_>, _>(|p| p.service_id == id);
        state.on_lock = pending;
        state.payments.extend(recorded);
        Ok(())
    }
}

impl Database<Select<By<Vec<Payment>, service::Id>>> for Memory {
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Payment>, service::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .state()
            .payments
            .iter()
            .filter(|p| p.service_id == id)
            .cloned()
            .collect())
    }
}

impl Database<Select<By<Vec<Payment>, ()>>> for Memory {
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Payment>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().payments.clone())
    }
}

impl Database<Insert<Payment>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(payment): Insert<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        self.state().payments.push(payment);
        Ok(())
    }
}
