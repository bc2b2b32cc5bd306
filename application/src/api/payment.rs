//! [`Payment`]-related definitions.

use common::{DateTime, Money};
use derive_more::{Display, From, Into};
use hub::domain;
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use uuid::Uuid;

use crate::{api, Context};

/// A payment recorded for a `Service`.
#[derive(Clone, Debug, From, Into)]
pub struct Payment(domain::Payment);

/// A payment recorded for a `Service`.
#[graphql_object(context = Context)]
impl Payment {
    /// Unique identifier of this `Payment`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// `Service` this `Payment` is recorded for.
    #[must_use]
    pub fn service(&self) -> api::Service {
        #[expect(
            unsafe_code,
            reason = "`Payment` always references an existing `Service`"
        )]
        unsafe {
            api::Service::new_unchecked(self.0.service_id)
        }
    }

    /// Kind of the `Service` this `Payment` is recorded for.
    #[must_use]
    pub fn service_kind(&self) -> api::service::Kind {
        self.0.service_kind.into()
    }

    /// Settlement status of this `Payment`.
    #[must_use]
    pub fn status(&self) -> Status {
        self.0.status.into()
    }

    /// Paid amount.
    #[must_use]
    pub fn amount(&self) -> Money {
        self.0.amount
    }

    /// Method this `Payment` is made with.
    #[must_use]
    pub fn method(&self) -> Method {
        self.0.method.into()
    }

    /// `DateTime` when this `Payment` was made.
    #[must_use]
    pub fn paid_at(&self) -> DateTime {
        self.0.paid_at.coerce()
    }

    /// Number of days the `Service` is overdue at the moment of this
    /// `Payment`, if known.
    #[must_use]
    pub fn days_overdue(&self) -> Option<i32> {
        self.0.days_overdue.map(Into::into)
    }

    /// `DateTime` when this `Payment` was recorded.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }
}

/// Unique identifier of a `Payment`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::payment::Id)]
#[into(domain::payment::Id)]
#[graphql(name = "PaymentId", transparent)]
pub struct Id(Uuid);

/// Settlement status of a `Payment`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "PaymentStatus")]
pub enum Status {
    /// Paid in full.
    Paid,

    /// Nothing paid yet.
    Unpaid,

    /// Paid only partially.
    PartiallyPaid,
}

impl From<domain::payment::Status> for Status {
    fn from(status: domain::payment::Status) -> Self {
        use domain::payment::Status as S;
        match status {
            S::Paid => Self::Paid,
            S::Unpaid => Self::Unpaid,
            S::PartiallyPaid => Self::PartiallyPaid,
        }
    }
}

impl From<Status> for domain::payment::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Paid => Self::Paid,
            Status::Unpaid => Self::Unpaid,
            Status::PartiallyPaid => Self::PartiallyPaid,
        }
    }
}

/// Method a `Payment` is made with.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "PaymentMethod")]
pub enum Method {
    /// Cash in hand.
    Cash,

    /// Bank transfer.
    BankTransfer,

    /// Credit or debit card.
    Card,

    /// Mobile banking wallet.
    MobileBanking,
}

impl From<domain::payment::Method> for Method {
    fn from(method: domain::payment::Method) -> Self {
        use domain::payment::Method as M;
        match method {
            M::Cash => Self::Cash,
            M::BankTransfer => Self::BankTransfer,
            M::Card => Self::Card,
            M::MobileBanking => Self::MobileBanking,
        }
    }
}

impl From<Method> for domain::payment::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Cash => Self::Cash,
            Method::BankTransfer => Self::BankTransfer,
            Method::Card => Self::Card,
            Method::MobileBanking => Self::MobileBanking,
        }
    }
}
