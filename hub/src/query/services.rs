//! [`Query`] collection related to the multiple [`Service`]s.

use common::operations::By;

use crate::{domain::Service, read};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a list of [`Service`]s matching a [`read::service::list::Filter`].
pub type List = DatabaseQuery<By<Vec<Service>, read::service::list::Filter>>;
