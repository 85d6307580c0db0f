//! Planning of the scheduled deposit entry reconciliation.
//!
//! A project ledger holds at most one [`payment::Kind::DepositDue`] entry,
//! mirroring the deposit policy and the deposit payments recorded so far.
//! [`plan()`] compares that entry against the [`Target`] state and decides
//! the single write bringing them in line.

use common::{Date, Money};
use rust_decimal::Decimal;

use crate::domain::{payment, project, Ledger, Payment};

/// State the scheduled deposit entry should be brought to.
#[derive(Clone, Debug)]
pub struct Target {
    /// Required deposit amount.
    pub amount: Money,

    /// Amount already paid toward the deposit.
    pub deposit_paid: Decimal,

    /// Latest [`Date`] a paid deposit payment was made at.
    pub latest_payment_date: Option<Date>,

    /// [`payment::Description`] of the entry.
    pub description: payment::Description,
}

impl Target {
    /// Returns the [`payment::Status`] of the entry.
    #[must_use]
    pub fn status(&self) -> payment::Status {
        if self.deposit_paid >= self.amount.amount {
            payment::Status::Paid
        } else {
            payment::Status::Due
        }
    }

    /// Returns the paid [`Date`] of the entry.
    #[must_use]
    pub fn date_paid(&self) -> Option<Date> {
        match self.status() {
            payment::Status::Paid => self.latest_payment_date,
            payment::Status::Due => None,
        }
    }

    /// Indicates whether the provided `entry` already matches this
    /// [`Target`].
    fn is_matched_by(&self, entry: &Payment) -> bool {
        entry.amount == self.amount
            && entry.description.as_ref() == Some(&self.description)
            && entry.status == self.status()
            && entry.date_paid == self.date_paid()
    }

    /// Applies this [`Target`] to the provided `entry`.
    fn apply_to(&self, mut entry: Payment) -> Payment {
        entry.amount = self.amount;
        entry.description = Some(self.description.clone());
        entry.status = self.status();
        entry.date_paid = self.date_paid();
        entry.kind = payment::Kind::DepositDue;
        entry.updated_at = payment::ModificationDateTime::now();
        entry
    }
}

/// Scope of a reconciliation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Scope {
    /// Entry may be inserted, updated or deleted.
    Full,

    /// Only an existing entry may be updated or deleted.
    ///
    /// Used after recording a deposit payment: a missing entry is left to
    /// the next policy-driven reconciliation.
    ExistingOnly,
}

/// Write bringing the scheduled deposit entry in line with its [`Target`].
#[derive(Clone, Debug)]
pub enum Action {
    /// Insert the new entry.
    Insert(Payment),

    /// Replace the existing entry.
    Update(Payment),

    /// Delete the existing entry.
    Delete(payment::Id),

    /// Existing entry is up to date.
    Keep(Payment),

    /// There is neither an entry nor a deposit to schedule.
    Nothing,
}

/// Outcome of [`plan()`].
#[derive(Clone, Debug)]
pub struct Plan {
    /// [`Action`] upon the scheduled deposit entry.
    pub action: Action,

    /// Duplicated scheduled deposit entries to be deleted.
    pub stale: Vec<payment::Id>,
}

impl Plan {
    /// Indicates whether executing this [`Plan`] requires no writes.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        matches!(self.action, Action::Keep(_) | Action::Nothing)
            && self.stale.is_empty()
    }

    /// Returns the scheduled deposit entry as it will be once this [`Plan`]
    /// is executed.
    #[must_use]
    pub fn entry(&self) -> Option<&Payment> {
        match &self.action {
            Action::Insert(p) | Action::Update(p) | Action::Keep(p) => Some(p),
            Action::Delete(_) | Action::Nothing => None,
        }
    }
}

/// Plans the reconciliation of the scheduled deposit entry of the
/// `project_id` [`Ledger`] with the provided [`Target`].
///
/// Of several scheduled entries the earliest created one is reconciled and
/// the rest are planned for deletion.
#[must_use]
pub fn plan(
    project_id: project::Id,
    target: &Target,
    ledger: Ledger<'_>,
    scope: Scope,
) -> Plan {
    let mut scheduled = ledger.scheduled_deposits().into_iter();
    let existing = scheduled.next();
    let stale = scheduled.map(|p| p.id).collect();

    let required = target.amount.is_positive();
    let action = match existing {
        Some(entry) if !required => Action::Delete(entry.id),
        Some(entry) if target.is_matched_by(entry) => {
            Action::Keep(entry.clone())
        }
        Some(entry) => Action::Update(target.apply_to(entry.clone())),
        None if required && scope == Scope::Full => {
            let now = payment::CreationDateTime::now();
            Action::Insert(target.apply_to(Payment {
                id: payment::Id::new(),
                project_id,
                amount: target.amount,
                description: None,
                status: payment::Status::Due,
                date_paid: None,
                kind: payment::Kind::DepositDue,
                deposit_allocation: None,
                created_at: now,
                updated_at: now.coerce(),
            }))
        }
        None => Action::Nothing,
    };

    Plan { action, stale }
}

#[cfg(test)]
mod spec {
    use common::{Currency, Date, Money};
    use rust_decimal::Decimal;

    use crate::domain::{payment, project, Ledger, Payment};

    use super::{plan, Action, Scope, Target};

    fn money(amount: i64) -> Money {
        Money {
            amount: amount.into(),
            currency: Currency::Try,
        }
    }

    fn target(amount: i64, paid: i64) -> Target {
        Target {
            amount: money(amount),
            deposit_paid: paid.into(),
            latest_payment_date: (paid > 0)
                .then(|| Date::from_ymd(2024, 4, 2))
                .flatten(),
            description: payment::Description::new("Deposit").unwrap(),
        }
    }

    fn apply(ledger: &mut Vec<Payment>, action: &Action, stale: &[payment::Id]) {
        ledger.retain(|p| !stale.contains(&p.id));
        match action {
            Action::Insert(p) => ledger.push(p.clone()),
            Action::Update(p) => {
                for e in ledger.iter_mut().filter(|e| e.id == p.id) {
                    *e = p.clone();
                }
            }
            Action::Delete(id) => ledger.retain(|p| p.id != *id),
            Action::Keep(_) | Action::Nothing => {}
        }
    }

    #[test]
    fn inserts_missing_entry() {
        let id = project::Id::new();
        let plan = plan(id, &target(150, 0), Ledger(&[]), Scope::Full);

        let Action::Insert(entry) = plan.action else {
            panic!("expected insert, got {:?}", plan.action);
        };
        assert_eq!(entry.project_id, id);
        assert_eq!(entry.amount, money(150));
        assert_eq!(entry.kind, payment::Kind::DepositDue);
        assert_eq!(entry.status, payment::Status::Due);
        assert_eq!(entry.date_paid, None);
        assert_eq!(entry.description.unwrap().to_string(), "Deposit");
    }

    #[test]
    fn skips_insert_outside_full_scope() {
        let plan = plan(
            project::Id::new(),
            &target(150, 0),
            Ledger(&[]),
            Scope::ExistingOnly,
        );
        assert!(matches!(plan.action, Action::Nothing));
    }

    #[test]
    fn does_nothing_without_deposit() {
        let plan =
            plan(project::Id::new(), &target(0, 0), Ledger(&[]), Scope::Full);
        assert!(plan.is_noop());
        assert!(plan.entry().is_none());
    }

    #[test]
    fn updates_and_marks_paid() {
        let id = project::Id::new();
        let mut ledger = vec![];
        let first = plan(id, &target(150, 0), Ledger(&ledger), Scope::Full);
        apply(&mut ledger, &first.action, &first.stale);

        let second =
            plan(id, &target(150, 150), Ledger(&ledger), Scope::ExistingOnly);
        let Action::Update(entry) = &second.action else {
            panic!("expected update, got {:?}", second.action);
        };
        assert_eq!(entry.id, ledger[0].id);
        assert_eq!(entry.status, payment::Status::Paid);
        assert_eq!(entry.date_paid, Date::from_ymd(2024, 4, 2));
    }

    #[test]
    fn deletes_entry_once_not_required() {
        let id = project::Id::new();
        let mut ledger = vec![];
        let first = plan(id, &target(120, 0), Ledger(&ledger), Scope::Full);
        apply(&mut ledger, &first.action, &first.stale);

        let second = plan(id, &target(0, 0), Ledger(&ledger), Scope::Full);
        assert!(
            matches!(second.action, Action::Delete(del) if del == ledger[0].id),
        );
    }

    #[test]
    fn rerun_with_same_inputs_is_noop() {
        let id = project::Id::new();
        let mut ledger = vec![];
        for (amount, paid) in [(150, 0), (150, 50), (120, 150), (0, 150)] {
            let first =
                plan(id, &target(amount, paid), Ledger(&ledger), Scope::Full);
            apply(&mut ledger, &first.action, &first.stale);

            let second =
                plan(id, &target(amount, paid), Ledger(&ledger), Scope::Full);
            assert!(second.is_noop(), "not idempotent for {amount}/{paid}");
        }
    }

    #[test]
    fn keeps_earliest_of_duplicates() {
        let id = project::Id::new();
        let mut ledger = vec![];
        let first = plan(id, &target(150, 0), Ledger(&ledger), Scope::Full);
        apply(&mut ledger, &first.action, &first.stale);
        let mut duplicate = ledger[0].clone();
        duplicate.id = payment::Id::new();
        duplicate.created_at = payment::CreationDateTime::now();
        duplicate.amount = money(999);
        ledger.push(duplicate.clone());

        let plan = plan(id, &target(150, 0), Ledger(&ledger), Scope::Full);
        assert!(matches!(plan.action, Action::Keep(ref p) if p.id == ledger[0].id));
        assert_eq!(plan.stale, vec![duplicate.id]);
        assert!(!plan.is_noop());
    }

    #[test]
    fn over_collection_is_paid() {
        let t = target(120, 150);
        assert_eq!(t.status(), payment::Status::Paid);
        assert!(t.deposit_paid > Decimal::from(120));
    }
}
