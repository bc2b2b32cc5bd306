//! [`Service`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::client;
#[cfg(doc)]
use crate::domain::Client;

/// Domain registration or hosting package owned by a [`Client`].
#[derive(Clone, Debug)]
pub struct Service {
    /// ID of this [`Service`].
    pub id: Id,

    /// [`Kind`] of this [`Service`].
    pub kind: Kind,

    /// [`Name`] of this [`Service`].
    pub name: Name,

    /// ID of the [`Client`] owning this [`Service`].
    pub client_id: client::Id,

    /// Current [`Status`] of this [`Service`].
    pub status: Status,

    /// [`DateTime`] when this [`Service`] expires.
    pub expires_at: ExpirationDateTime,

    /// [`DateTime`] when this [`Service`] was created.
    pub created_at: CreationDateTime,
}

impl Service {
    /// Indicates whether this [`Service`] is past its expiration date at the
    /// provided moment.
    #[must_use]
    pub fn is_expired_at(&self, now: ExpirationDateTime) -> bool {
        self.expires_at <= now
    }
}

/// ID of a [`Service`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Name of a [`Service`]: the domain name itself, or the hosting package
/// label.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 253
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

define_kind! {
    #[doc = "Kind of a [`Service`]."]
    enum Kind {
        #[doc = "Domain name registration."]
        Domain = 1,

        #[doc = "Hosting package."]
        Hosting = 2,
    }
}

define_kind! {
    #[doc = "Lifecycle status of a [`Service`]."]
    enum Status {
        #[doc = "Registered, never activated yet."]
        Pending = 1,

        #[doc = "Provisioned and running."]
        Active = 2,

        #[doc = "Switched off by an operator or by automation."]
        Suspended = 3,

        #[doc = "Past its expiration date, until renewed."]
        Expired = 4,
    }
}

impl Status {
    /// Indicates whether a [`Service`] in this [`Status`] may be moved to
    /// [`Status::Active`] (once paid).
    #[must_use]
    pub const fn is_activatable(self) -> bool {
        matches!(self, Self::Pending | Self::Suspended | Self::Active)
    }

    /// Indicates whether a [`Service`] in this [`Status`] may be moved to
    /// [`Status::Suspended`].
    #[must_use]
    pub const fn is_suspendable(self) -> bool {
        matches!(self, Self::Pending | Self::Active | Self::Suspended)
    }
}

/// [`DateTime`] when a [`Service`] was created.
pub type CreationDateTime = DateTimeOf<(Service, unit::Creation)>;

/// [`DateTime`] when a [`Service`] expires.
pub type ExpirationDateTime = DateTimeOf<(Service, unit::Expiration)>;

#[cfg(test)]
mod spec {
    use super::{Name, Status};

    #[test]
    fn only_expired_is_terminal() {
        for status in Status::ALL {
            let terminal = matches!(status, Status::Expired);
            assert_eq!(status.is_activatable(), !terminal, "{status}");
            assert_eq!(status.is_suspendable(), !terminal, "{status}");
        }
    }

    #[test]
    fn validates_name() {
        assert!(Name::new("example.com").is_some());
        assert!(Name::new("Business Pro 10GB").is_some());
        assert!(Name::new("").is_none());
        assert!(Name::new("example.com ").is_none());
    }
}
