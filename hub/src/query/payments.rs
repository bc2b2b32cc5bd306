//! [`Query`] collection related to the multiple [`Payment`]s.

use common::operations::By;

use crate::domain::{service, Payment};
#[cfg(doc)]
use crate::{domain::Service, Query};

use super::DatabaseQuery;

/// Queries all the [`Payment`]s of a [`Service`], in the order they were
/// recorded.
pub type OfService = DatabaseQuery<By<Vec<Payment>, service::Id>>;

/// Queries all the [`Payment`]s, in the order they were recorded.
pub type All = DatabaseQuery<By<Vec<Payment>, ()>>;
