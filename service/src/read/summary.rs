//! [`FinancialSummary`] definitions.

use common::{Date, Money};

use crate::domain::{
    deposit,
    pricing::{self, Billing, Totals},
    Ledger, Payment, Project,
};

/// Financial state of a [`Project`], derived from its ledger, its deposit
/// policy and its selected services.
///
/// Never persisted: always built from fresh reads.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FinancialSummary {
    /// [`Totals`] of the services covered by the base price.
    pub included_totals: Totals,

    /// [`Totals`] of the services billed on top of the base price.
    pub extra_totals: Totals,

    /// Base price plus the gross of the extra services.
    pub contract_total: Money,

    /// Deposit amount required by the [`deposit::Config`].
    pub deposit_amount: Money,

    /// Amount paid toward the deposit.
    pub deposit_paid: Money,

    /// Deposit amount still to be paid.
    pub deposit_remaining: Money,

    /// [`deposit::Status`] of the deposit.
    pub deposit_status: deposit::Status,

    /// Latest [`Date`] a deposit payment was made at.
    pub deposit_last_payment_date: Option<Date>,

    /// Amount of all the paid ledger entries.
    pub total_paid: Money,

    /// Amount of the contract total still to be paid.
    pub remaining: Money,

    /// Amount of all the ledger entries still due.
    pub total_outstanding: Money,
}

impl FinancialSummary {
    /// Builds a [`FinancialSummary`] of the provided [`Project`] out of its
    /// `payments` and its service `selections`.
    #[must_use]
    pub fn build(
        project: &Project,
        payments: &[Payment],
        selections: &[pricing::Selection],
    ) -> Self {
        let base_price = project.base_price;
        let money = |amount| base_price.with_amount(amount);

        let included_totals =
            Totals::of(selections, Billing::Included, project.vat_exempt);
        let extra_totals =
            Totals::of(selections, Billing::Extra, project.vat_exempt);
        let contract_total = base_price.amount + extra_totals.gross;

        let deposit_amount =
            project.deposit_config().amount(&deposit::Context {
                base_price: base_price.amount,
                extras_total: extra_totals.gross,
                contract_total,
            });

        let ledger = Ledger(payments);
        let deposit_paid = ledger.deposit_paid();
        let total_paid = ledger.total_paid();

        Self {
            included_totals: included_totals.round(),
            extra_totals: extra_totals.round(),
            contract_total: money(contract_total).round(),
            deposit_amount: money(deposit_amount),
            deposit_paid: money(deposit_paid),
            deposit_remaining: money(deposit_amount - deposit_paid)
                .clamp_non_negative(),
            deposit_status: deposit::Status::of(deposit_amount, deposit_paid),
            deposit_last_payment_date: ledger.latest_deposit_payment_date(),
            total_paid: money(total_paid),
            remaining: money(contract_total - total_paid)
                .clamp_non_negative()
                .round(),
            total_outstanding: money(ledger.total_due()),
        }
    }
}

#[cfg(test)]
mod spec {
    use common::{Currency, Date, Money};
    use rust_decimal::Decimal;

    use crate::domain::{
        deposit,
        payment::{self, Kind, Status},
        pricing::{Billing, Catalog, Overrides, Selection},
        project, Payment, Project,
    };

    use super::FinancialSummary;

    fn money(amount: i64) -> Money {
        Money {
            amount: amount.into(),
            currency: Currency::Try,
        }
    }

    fn project(config: Option<deposit::Config>) -> Project {
        Project {
            id: project::Id::new(),
            name: project::Name::new("Wedding").unwrap(),
            base_price: money(1000),
            deposit_config: config,
            vat_exempt: false,
            created_at: project::CreationDateTime::now(),
        }
    }

    fn extra(project_id: project::Id, gross: i64) -> Selection {
        Selection {
            project_id,
            billing: Billing::Extra,
            quantity: Decimal::ONE,
            catalog: Catalog {
                price: Some(gross.into()),
                ..Catalog::default()
            },
            overrides: Overrides::default(),
        }
    }

    fn fixed(value: i64) -> deposit::Config {
        deposit::Config {
            mode: deposit::Mode::Fixed,
            value: Some(value.into()),
            ..deposit::Config::default()
        }
    }

    fn entry(project: &Project, kind: Kind, status: Status, amount: i64) -> Payment {
        let mut p = Payment::manual(
            project.id,
            money(amount),
            None,
            status,
            Date::from_ymd(2024, 6, 1),
        );
        p.kind = kind;
        p
    }

    #[test]
    fn reports_no_deposit_by_default() {
        let project = project(None);
        let summary = FinancialSummary::build(&project, &[], &[]);

        assert_eq!(summary.contract_total, money(1000));
        assert_eq!(summary.deposit_amount, money(0));
        assert_eq!(summary.deposit_status, deposit::Status::None);
        assert_eq!(summary.remaining, money(1000));
    }

    #[test]
    fn adds_extras_to_contract_total() {
        let project = project(Some(fixed(150)));
        let selections = [extra(project.id, 200)];
        let summary = FinancialSummary::build(&project, &[], &selections);

        assert_eq!(summary.contract_total, money(1200));
        assert_eq!(summary.extra_totals.gross, 200.into());
        assert_eq!(summary.deposit_amount, money(150));
        assert_eq!(summary.deposit_remaining, money(150));
        assert_eq!(summary.deposit_status, deposit::Status::Due);
    }

    #[test]
    fn counts_every_paid_entry() {
        let project = project(Some(fixed(150)));
        let payments = [
            entry(&project, Kind::BasePrice, Status::Paid, 300),
            entry(&project, Kind::DepositPayment, Status::Paid, 50),
            entry(&project, Kind::DepositDue, Status::Due, 150),
            entry(&project, Kind::Manual, Status::Due, 70),
        ];
        let summary = FinancialSummary::build(&project, &payments, &[]);

        assert_eq!(summary.total_paid, money(350));
        assert_eq!(summary.remaining, money(650));
        assert_eq!(summary.total_outstanding, money(220));
        assert_eq!(summary.deposit_paid, money(50));
        assert_eq!(summary.deposit_remaining, money(100));
        assert_eq!(summary.deposit_status, deposit::Status::Partial);
        assert_eq!(
            summary.deposit_last_payment_date,
            Date::from_ymd(2024, 6, 1),
        );
    }

    #[test]
    fn remaining_never_goes_negative() {
        let project = project(Some(fixed(150)));
        let payments = [
            entry(&project, Kind::Manual, Status::Paid, 1100),
            entry(&project, Kind::DepositPayment, Status::Paid, 200),
        ];
        let summary = FinancialSummary::build(&project, &payments, &[]);

        assert_eq!(summary.remaining, money(0));
        assert_eq!(summary.deposit_remaining, money(0));
        assert_eq!(summary.deposit_status, deposit::Status::Paid);
    }

    #[test]
    fn unpaid_deposit_payment_is_not_collected() {
        let project = project(Some(fixed(150)));
        let mut pending = entry(&project, Kind::DepositPayment, Status::Due, 50);
        pending.date_paid = None;
        let summary = FinancialSummary::build(&project, &[pending], &[]);

        assert_eq!(summary.deposit_paid, money(0));
        assert_eq!(summary.deposit_status, deposit::Status::Due);
        assert_eq!(payment::Status::Due.date_paid(None), None);
    }
}
