//! [`Payment`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::service;
#[cfg(doc)]
use crate::domain::Service;

/// Payment record of a [`Service`].
///
/// Records are never modified once created: a changed payment state is
/// expressed by recording a new [`Payment`].
#[derive(Clone, Debug)]
pub struct Payment {
    /// ID of this [`Payment`].
    pub id: Id,

    /// ID of the [`Service`] this [`Payment`] is made for.
    pub service_id: service::Id,

    /// [`service::Kind`] of the [`Service`] this [`Payment`] is made for.
    pub service_kind: service::Kind,

    /// [`Status`] of this [`Payment`].
    pub status: Status,

    /// Amount of this [`Payment`].
    pub amount: Money,

    /// [`Method`] this [`Payment`] was made with.
    pub method: Method,

    /// [`DateTime`] when this [`Payment`] was made.
    pub paid_at: PaymentDateTime,

    /// Number of days the [`Service`] was overdue when this [`Payment`] was
    /// recorded, if it was.
    pub days_overdue: Option<DaysOverdue>,

    /// [`DateTime`] when this [`Payment`] was recorded.
    pub created_at: CreationDateTime,
}

/// ID of a [`Payment`].
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

/// Number of days a [`Service`] payment is overdue.
pub type DaysOverdue = u16;

define_kind! {
    #[doc = "Settlement status of a [`Payment`]."]
    enum Status {
        #[doc = "Paid in full."]
        Paid = 1,

        #[doc = "Nothing paid yet."]
        Unpaid = 2,

        #[doc = "Paid only partially."]
        PartiallyPaid = 3,
    }
}

impl Status {
    /// Indicates whether this [`Status`] allows a [`Service`] to be
    /// activated.
    #[must_use]
    pub const fn is_paid(self) -> bool {
        matches!(self, Self::Paid)
    }
}

define_kind! {
    #[doc = "Method a [`Payment`] is made with."]
    enum Method {
        #[doc = "Cash in hand."]
        Cash = 1,

        #[doc = "Bank transfer."]
        BankTransfer = 2,

        #[doc = "Credit or debit card."]
        Card = 3,

        #[doc = "Mobile banking wallet."]
        MobileBanking = 4,
    }
}

/// [`DateTime`] when a [`Payment`] was recorded.
pub type CreationDateTime = DateTimeOf<(Payment, unit::Creation)>;

/// [`DateTime`] when a [`Payment`] was made.
pub type PaymentDateTime = DateTimeOf<(Payment, unit::Payment)>;
