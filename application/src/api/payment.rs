//! [`Payment`]-related definitions.

use common::{Date, DateTime, Money};
use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::domain;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    Context,
};

/// An entry of a `Project` ledger.
#[derive(Clone, Debug, From, Into)]
pub struct Payment(domain::Payment);

/// An entry of a `Project` ledger.
#[graphql_object(context = Context)]
impl Payment {
    /// Unique identifier of this `Payment`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// ID of the `Project` this `Payment` belongs to.
    #[must_use]
    pub fn project_id(&self) -> api::project::Id {
        self.0.project_id.into()
    }

    /// Amount of this `Payment`.
    #[must_use]
    pub fn amount(&self) -> Money {
        self.0.amount
    }

    /// Description of this `Payment`, if any.
    #[must_use]
    pub fn description(&self) -> Option<Description> {
        self.0.description.clone().map(Into::into)
    }

    /// Status of this `Payment`.
    #[must_use]
    pub fn status(&self) -> Status {
        self.0.status.into()
    }

    /// `Date` this `Payment` was paid at.
    ///
    /// Absent unless this `Payment` is `PAID`.
    #[must_use]
    pub fn date_paid(&self) -> Option<Date> {
        self.0.date_paid
    }

    /// Kind of this `Payment`.
    #[must_use]
    pub fn kind(&self) -> Kind {
        self.0.kind.into()
    }

    /// Part of this `Payment` allocated to the deposit, if any.
    #[must_use]
    pub fn deposit_allocation(&self) -> Option<scalar::Decimal> {
        self.0.deposit_allocation.map(Into::into)
    }

    /// Indicator whether this `Payment` is maintained by the system and
    /// cannot be edited or deleted by hand.
    #[must_use]
    pub fn is_system_managed(&self) -> bool {
        self.0.is_system_managed()
    }

    /// `DateTime` when this `Payment` was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }

    /// `DateTime` when this `Payment` was last modified.
    #[must_use]
    pub fn updated_at(&self) -> DateTime {
        self.0.updated_at.coerce()
    }
}

/// Unique identifier of a `Payment`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::payment::Id)]
#[into(domain::payment::Id)]
#[graphql(name = "PaymentId", transparent)]
pub struct Id(Uuid);

/// Description of a `Payment`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "PaymentDescription",
    with = scalar::Via::<domain::payment::Description>,
)]
pub struct Description(domain::payment::Description);

/// Status of a `Payment`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "PaymentStatus")]
pub enum Status {
    /// Money was received.
    Paid,

    /// Money is still owed.
    Due,
}

impl From<domain::payment::Status> for Status {
    fn from(status: domain::payment::Status) -> Self {
        use domain::payment::Status as S;
        match status {
            S::Paid => Self::Paid,
            S::Due => Self::Due,
        }
    }
}

impl From<Status> for domain::payment::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Paid => Self::Paid,
            Status::Due => Self::Due,
        }
    }
}

/// Kind of a `Payment`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "PaymentKind")]
pub enum Kind {
    /// Entry recorded by hand.
    Manual,

    /// Entry for the base price of a `Project`.
    BasePrice,

    /// Scheduled deposit, maintained by the system.
    DepositDue,

    /// Payment recorded toward the deposit.
    DepositPayment,
}

impl From<domain::payment::Kind> for Kind {
    fn from(kind: domain::payment::Kind) -> Self {
        use domain::payment::Kind as K;
        match kind {
            K::Manual => Self::Manual,
            K::BasePrice => Self::BasePrice,
            K::DepositDue => Self::DepositDue,
            K::DepositPayment => Self::DepositPayment,
        }
    }
}
