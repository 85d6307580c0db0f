//! [`Ledger`] definitions.

use common::Date;
use rust_decimal::Decimal;

use super::{payment, Payment};

/// View over the [`Payment`]s of a single project.
#[derive(Clone, Copy, Debug)]
pub struct Ledger<'a>(pub &'a [Payment]);

impl<'a> Ledger<'a> {
    /// Sums the paid [`payment::Kind::DepositPayment`] entries.
    #[must_use]
    pub fn deposit_paid(&self) -> Decimal {
        self.deposit_payments()
            .filter(|p| p.is_paid())
            .map(|p| p.amount.amount)
            .sum()
    }

    /// Returns the latest [`Payment::effective_date()`] among the
    /// [`payment::Kind::DepositPayment`] entries.
    #[must_use]
    pub fn latest_deposit_payment_date(&self) -> Option<Date> {
        self.deposit_payments().map(Payment::effective_date).max()
    }

    /// Returns the latest paid [`Date`] among the paid
    /// [`payment::Kind::DepositPayment`] entries.
    #[must_use]
    pub fn latest_paid_deposit_date(&self) -> Option<Date> {
        self.deposit_payments()
            .filter(|p| p.is_paid())
            .filter_map(|p| p.date_paid)
            .max()
    }

    /// Sums all the paid entries, regardless of their [`payment::Kind`].
    #[must_use]
    pub fn total_paid(&self) -> Decimal {
        self.0
            .iter()
            .filter(|p| p.is_paid())
            .map(|p| p.amount.amount)
            .sum()
    }

    /// Sums all the entries still due, regardless of their
    /// [`payment::Kind`].
    #[must_use]
    pub fn total_due(&self) -> Decimal {
        self.0
            .iter()
            .filter(|p| p.status == payment::Status::Due)
            .map(|p| p.amount.amount)
            .sum()
    }

    /// Returns the [`payment::Kind::DepositDue`] entries, the earliest
    /// created first.
    ///
    /// There is normally at most one of them.
    #[must_use]
    pub fn scheduled_deposits(&self) -> Vec<&'a Payment> {
        let mut scheduled = self
            .0
            .iter()
            .filter(|p| p.kind == payment::Kind::DepositDue)
            .collect::<Vec<_>>();
        scheduled.sort_by_key(|p| p.created_at);
        scheduled
    }

    /// Iterates over the [`payment::Kind::DepositPayment`] entries.
    fn deposit_payments(&self) -> impl Iterator<Item = &'a Payment> {
        self.0
            .iter()
            .filter(|p| p.kind == payment::Kind::DepositPayment)
    }
}

#[cfg(test)]
mod spec {
    use common::{Currency, Date, Money};

    use crate::domain::{payment, project, Payment};

    use super::Ledger;

    fn entry(
        kind: payment::Kind,
        status: payment::Status,
        amount: i64,
    ) -> Payment {
        let mut p = Payment::manual(
            project::Id::new(),
            Money {
                amount: amount.into(),
                currency: Currency::Try,
            },
            None,
            status,
            Date::from_ymd(2024, 1, 10),
        );
        p.kind = kind;
        p
    }

    #[test]
    fn total_paid_counts_every_kind() {
        use payment::{Kind as K, Status as S};

        let entries = [
            entry(K::BasePrice, S::Paid, 500),
            entry(K::Manual, S::Paid, 100),
            entry(K::DepositPayment, S::Paid, 150),
            entry(K::DepositDue, S::Due, 150),
            entry(K::Manual, S::Due, 40),
        ];
        let ledger = Ledger(&entries);

        assert_eq!(ledger.total_paid(), 750.into());
        assert_eq!(ledger.total_due(), 190.into());
        assert_eq!(ledger.deposit_paid(), 150.into());
    }

    #[test]
    fn latest_deposit_date_ignores_other_kinds() {
        use payment::{Kind as K, Status as S};

        let mut early = entry(K::DepositPayment, S::Paid, 50);
        early.date_paid = Date::from_ymd(2024, 1, 5);
        let mut late = entry(K::DepositPayment, S::Paid, 50);
        late.date_paid = Date::from_ymd(2024, 2, 5);
        let mut other = entry(K::Manual, S::Paid, 50);
        other.date_paid = Date::from_ymd(2024, 3, 5);

        let entries = [early, late, other];
        assert_eq!(
            Ledger(&entries).latest_deposit_payment_date(),
            Date::from_ymd(2024, 2, 5),
        );
        assert_eq!(Ledger(&[]).latest_deposit_payment_date(), None);
    }

    #[test]
    fn latest_paid_deposit_date_skips_due_entries() {
        use payment::{Kind as K, Status as S};

        let mut paid = entry(K::DepositPayment, S::Paid, 150);
        paid.date_paid = Date::from_ymd(2024, 3, 15);
        let mut due = entry(K::DepositPayment, S::Due, 10);
        due.date_paid = None;

        let entries = [paid, due];
        let ledger = Ledger(&entries);
        assert_eq!(
            ledger.latest_paid_deposit_date(),
            Date::from_ymd(2024, 3, 15),
        );
        assert!(
            ledger.latest_deposit_payment_date()
                > Date::from_ymd(2024, 3, 15),
        );
        assert_eq!(Ledger(&entries[1..]).latest_paid_deposit_date(), None);
    }
}
