//! [`FinancialSummary`]-related definitions.

use common::{Date, Money};
use juniper::GraphQLObject;
use service::{domain::pricing, read};

use crate::{
    api::{deposit, scalar},
    Context,
};

/// Financial state of a `Project`.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(context = Context)]
pub struct FinancialSummary {
    /// Totals of the services covered by the base price.
    pub included_totals: Totals,

    /// Totals of the services billed on top of the base price.
    pub extra_totals: Totals,

    /// Base price plus the gross of the extra services.
    pub contract_total: Money,

    /// Deposit amount required by the `DepositConfig`.
    pub deposit_amount: Money,

    /// Amount paid toward the deposit.
    pub deposit_paid: Money,

    /// Deposit amount still to be paid.
    pub deposit_remaining: Money,

    /// Collection status of the deposit.
    pub deposit_status: deposit::Status,

    /// Latest `Date` a deposit payment was made at.
    pub deposit_last_payment_date: Option<Date>,

    /// Amount of all the paid ledger entries.
    pub total_paid: Money,

    /// Amount of the contract total still to be paid.
    pub remaining: Money,

    /// Amount of all the ledger entries still due.
    pub total_outstanding: Money,
}

impl From<read::FinancialSummary> for FinancialSummary {
    fn from(summary: read::FinancialSummary) -> Self {
        let read::FinancialSummary {
            included_totals,
            extra_totals,
            contract_total,
            deposit_amount,
            deposit_paid,
            deposit_remaining,
            deposit_status,
            deposit_last_payment_date,
            total_paid,
            remaining,
            total_outstanding,
        } = summary;
        Self {
            included_totals: included_totals.into(),
            extra_totals: extra_totals.into(),
            contract_total,
            deposit_amount,
            deposit_paid,
            deposit_remaining,
            deposit_status: deposit_status.into(),
            deposit_last_payment_date,
            total_paid,
            remaining,
            total_outstanding,
        }
    }
}

/// Net, VAT and gross totals of priced services.
#[derive(Clone, Copy, Debug, GraphQLObject)]
#[graphql(name = "ServiceTotals", context = Context)]
pub struct Totals {
    /// Amount excluding VAT.
    pub net: scalar::Decimal,

    /// VAT amount.
    pub vat: scalar::Decimal,

    /// Amount including VAT.
    pub gross: scalar::Decimal,
}

impl From<pricing::Totals> for Totals {
    fn from(totals: pricing::Totals) -> Self {
        Self {
            net: totals.net.into(),
            vat: totals.vat.into(),
            gross: totals.gross.into(),
        }
    }
}
