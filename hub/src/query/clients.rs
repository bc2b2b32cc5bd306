//! [`Query`] collection related to the multiple [`Client`]s.

use common::operations::By;

use crate::{domain::Client, read};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a list of [`Client`]s matching a [`read::client::list::Filter`].
pub type List = DatabaseQuery<By<Vec<Client>, read::client::list::Filter>>;
