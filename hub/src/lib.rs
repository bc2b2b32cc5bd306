//! Hub contains the business logic of client services management: payment-gated
//! activation of domain and hosting [`Service`]s.
//!
//! [`Service`]: domain::Service
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
#[cfg(test)]
mod fixture;
pub mod infra;
pub mod query;
pub mod read;
pub mod task;

use std::error::Error;

use common::operations::{By, Start};

#[cfg(doc)]
use infra::Database;

pub use self::{command::Command, query::Query, task::Task};

/// [`Hub`] configuration.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// [`task::ReconcileServices`] configuration.
    pub reconcile_services: task::reconcile_services::Config,

    /// [`task::ExpireServices`] configuration.
    pub expire_services: task::expire_services::Config,
}

/// Domain hub of [`Client`]s, their [`Service`]s and [`Payment`]s.
///
/// [`Client`]: domain::Client
/// [`Payment`]: domain::Payment
/// [`Service`]: domain::Service
#[derive(Clone, Debug)]
pub struct Hub<Db> {
    /// Configuration of this [`Hub`].
    config: Config,

    /// [`Database`] of this [`Hub`].
    database: Db,
}

impl<Db> Hub<Db> {
    /// Creates a new [`Hub`] with the provided parameters, along with its
    /// [`task::Background`] to be awaited.
    pub fn new(config: Config, database: Db) -> (Self, task::Background)
    where
        Self: Task<
                Start<
                    By<
                        task::ReconcileServices<Self>,
                        task::reconcile_services::Config,
                    >,
                >,
                Ok = (),
                Err: Error,
            > + Task<
                Start<
                    By<
                        task::ExpireServices<Self>,
                        task::expire_services::Config,
                    >,
                >,
                Ok = (),
                Err: Error,
            > + Clone
            + 'static,
    {
        let this = Self::without_tasks(config, database);

        let mut bg = task::Background::default();
        let hub = this.clone();
        bg.spawn("reconcile_services", async move {
            hub.execute(Start(By::<task::ReconcileServices<_>, _>::new(
                hub.config().reconcile_services,
            )))
            .await
        });
        let hub = this.clone();
        bg.spawn("expire_services", async move {
            hub.execute(Start(By::<task::ExpireServices<_>, _>::new(
                hub.config().expire_services,
            )))
            .await
        });

        (this, bg)
    }

    /// Creates a new [`Hub`] with the provided parameters, without spawning
    /// any of its background [`Task`]s.
    #[must_use]
    pub fn without_tasks(config: Config, database: Db) -> Self {
        Self { config, database }
    }

    /// Returns [`Config`] of this [`Hub`].
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Hub`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }
}
