//! [`Query`] collection related to a single [`Service`].

use common::operations::By;

use crate::domain::{service, Service};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Service`] by its [`service::Id`].
pub type ById = DatabaseQuery<By<Option<Service>, service::Id>>;
