//! Deposit-related definitions.

use common::DateTime;
use derive_more::{AsRef, Display, From, Into};
use juniper::{
    graphql_object, GraphQLEnum, GraphQLInputObject, GraphQLObject,
    GraphQLScalar,
};
use service::domain;

use crate::{
    api::{self, scalar},
    Context,
};

/// Deposit policy of a `Project`.
#[derive(Clone, Debug, From, Into)]
pub struct Config(domain::deposit::Config);

/// Deposit policy of a `Project`.
#[graphql_object(name = "DepositConfig", context = Context)]
impl Config {
    /// Mode of computing the deposit amount.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.0.mode.into()
    }

    /// Fixed amount or percentage, depending on the `mode`.
    #[must_use]
    pub fn value(&self) -> Option<scalar::Decimal> {
        self.0.value.map(Into::into)
    }

    /// Display name of the scheduled deposit entry.
    #[must_use]
    pub fn due_label(&self) -> DueLabel {
        self.0.due_label.clone().into()
    }

    /// Description of the scheduled deposit entry, if any.
    #[must_use]
    pub fn description(&self) -> Option<api::payment::Description> {
        self.0.description.clone().map(Into::into)
    }

    /// Amounts in force when this `DepositConfig` was saved.
    #[must_use]
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.0.snapshot.map(Into::into)
    }
}

/// Deposit policy to be saved for a `Project`.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "DepositConfigInput")]
pub struct ConfigInput {
    /// Mode of computing the deposit amount.
    pub mode: Mode,

    /// Fixed amount or percentage, required unless the `mode` is `NONE`.
    pub value: Option<scalar::Decimal>,

    /// Display name of the scheduled deposit entry.
    ///
    /// Defaults to `Deposit`.
    pub due_label: Option<DueLabel>,

    /// Description of the scheduled deposit entry.
    pub description: Option<api::payment::Description>,
}

impl From<ConfigInput> for domain::deposit::Config {
    fn from(input: ConfigInput) -> Self {
        let ConfigInput {
            mode,
            value,
            due_label,
            description,
        } = input;
        Self {
            mode: mode.into(),
            value: value.map(Into::into),
            due_label: due_label.map(Into::into).unwrap_or_default(),
            description: description.map(Into::into),
            snapshot: None,
        }
    }
}

/// Amounts in force when a `DepositConfig` was saved.
#[derive(Clone, Copy, Debug, GraphQLObject)]
#[graphql(name = "DepositSnapshot", context = Context)]
pub struct Snapshot {
    /// Deposit amount computed on save.
    pub amount: scalar::Decimal,

    /// Contract total on save.
    pub contract_total: scalar::Decimal,

    /// `DateTime` of the save.
    pub locked_at: DateTime,

    /// Deposit amount acknowledged on save.
    pub acknowledged_amount: scalar::Decimal,
}

impl From<domain::deposit::Snapshot> for Snapshot {
    fn from(snapshot: domain::deposit::Snapshot) -> Self {
        Self {
            amount: snapshot.amount.into(),
            contract_total: snapshot.contract_total.into(),
            locked_at: snapshot.locked_at.coerce(),
            acknowledged_amount: snapshot.acknowledged_amount.into(),
        }
    }
}

/// Display name of a scheduled deposit entry.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "DepositDueLabel",
    with = scalar::Via::<domain::deposit::DueLabel>,
)]
pub struct DueLabel(domain::deposit::DueLabel);

/// Mode of computing a deposit amount.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "DepositMode")]
pub enum Mode {
    /// No deposit is required.
    None,

    /// Fixed currency amount.
    Fixed,

    /// Percentage of the base price.
    PercentBase,

    /// Percentage of the contract total.
    PercentTotal,
}

impl From<domain::deposit::Mode> for Mode {
    fn from(mode: domain::deposit::Mode) -> Self {
        use domain::deposit::Mode as M;
        match mode {
            M::None => Self::None,
            M::Fixed => Self::Fixed,
            M::PercentBase => Self::PercentBase,
            M::PercentTotal => Self::PercentTotal,
        }
    }
}

impl From<Mode> for domain::deposit::Mode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::None => Self::None,
            Mode::Fixed => Self::Fixed,
            Mode::PercentBase => Self::PercentBase,
            Mode::PercentTotal => Self::PercentTotal,
        }
    }
}

/// Collection status of a deposit.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "DepositStatus")]
pub enum Status {
    /// No deposit is required.
    None,

    /// Nothing was paid toward the deposit yet.
    Due,

    /// The deposit was paid in part.
    Partial,

    /// The deposit was paid in full.
    Paid,
}

impl From<domain::deposit::Status> for Status {
    fn from(status: domain::deposit::Status) -> Self {
        use domain::deposit::Status as S;
        match status {
            S::None => Self::None,
            S::Due => Self::Due,
            S::Partial => Self::Partial,
            S::Paid => Self::Paid,
        }
    }
}
