//! [`Payment`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, Date, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{deposit, project};

/// Entry of a [`project::Project`] ledger.
#[derive(Clone, Debug)]
pub struct Payment {
    /// ID of this [`Payment`].
    pub id: Id,

    /// ID of the [`project::Project`] this [`Payment`] belongs to.
    pub project_id: project::Id,

    /// Non-negative amount of this [`Payment`].
    pub amount: Money,

    /// [`Description`] of this [`Payment`], if any.
    pub description: Option<Description>,

    /// [`Status`] of this [`Payment`].
    pub status: Status,

    /// [`Date`] this [`Payment`] was paid at.
    ///
    /// Present only when the [`Status`] is [`Status::Paid`].
    pub date_paid: Option<Date>,

    /// [`Kind`] of this [`Payment`].
    pub kind: Kind,

    /// Portion of this [`Payment`] applied toward the deposit.
    ///
    /// Set only on [`Kind::DepositPayment`] entries.
    pub deposit_allocation: Option<Decimal>,

    /// [`DateTime`] when this [`Payment`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Payment`] was last modified.
    pub updated_at: ModificationDateTime,
}

impl Payment {
    /// Creates a new [`Kind::Manual`] [`Payment`].
    ///
    /// `date_paid` is kept only for a [`Status::Paid`] entry, defaulting to
    /// today.
    #[must_use]
    pub fn manual(
        project_id: project::Id,
        amount: Money,
        description: Option<Description>,
        status: Status,
        date_paid: Option<Date>,
    ) -> Self {
        let now = CreationDateTime::now();
        Self {
            id: Id::new(),
            project_id,
            amount,
            description,
            status,
            date_paid: status.date_paid(date_paid),
            kind: Kind::Manual,
            deposit_allocation: None,
            created_at: now,
            updated_at: now.coerce(),
        }
    }

    /// Creates a new paid [`Kind::DepositPayment`] [`Payment`], fully
    /// allocated toward the deposit.
    #[must_use]
    pub fn deposit(
        project_id: project::Id,
        amount: Money,
        description: Option<Description>,
        date_paid: Date,
    ) -> Self {
        let now = CreationDateTime::now();
        Self {
            id: Id::new(),
            project_id,
            amount,
            description,
            status: Status::Paid,
            date_paid: Some(date_paid),
            kind: Kind::DepositPayment,
            deposit_allocation: Some(amount.amount),
            created_at: now,
            updated_at: now.coerce(),
        }
    }

    /// Indicates whether this [`Payment`] was paid.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.status == Status::Paid
    }

    /// Indicates whether this [`Payment`] is maintained by the deposit
    /// reconciliation only, and so cannot be edited by hand.
    #[must_use]
    pub fn is_system_managed(&self) -> bool {
        self.kind == Kind::DepositDue
    }

    /// Returns the [`Date`] this [`Payment`] is accounted at: the paid
    /// [`Date`], or the creation one if there is none.
    #[must_use]
    pub fn effective_date(&self) -> Date {
        self.date_paid.unwrap_or_else(|| self.created_at.date())
    }
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

/// Free-form description of a [`Payment`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct Description(String);

impl Description {
    /// Creates a new [`Description`] out of the provided `text`, trimming it.
    ///
    /// [`None`] is returned if nothing but whitespace was provided.
    #[must_use]
    pub fn new(text: impl AsRef<str>) -> Option<Self> {
        let text = text.as_ref().trim();
        (!text.is_empty() && text.len() <= 1024).then(|| Self(text.to_owned()))
    }
}

impl FromStr for Description {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Description`")
    }
}

impl From<deposit::DueLabel> for Description {
    /// Cuts the `label` to the [`deposit::DueLabel::MAX_LEN`] characters.
    fn from(label: deposit::DueLabel) -> Self {
        let text = AsRef::<str>::as_ref(&label)
            .chars()
            .take(deposit::DueLabel::MAX_LEN)
            .collect::<String>();
        Self(text.trim_end().to_owned())
    }
}

define_kind! {
    #[doc = "Status of a [`Payment`]."]
    enum Status {
        #[doc = "Money was received."]
        Paid = 1,

        #[doc = "Money is still owed."]
        Due = 2,
    }
}

impl Status {
    /// Normalizes the provided `date_paid` for this [`Status`].
    ///
    /// Only a [`Status::Paid`] entry has a paid [`Date`], which is today
    /// unless provided.
    #[must_use]
    pub fn date_paid(self, date_paid: Option<Date>) -> Option<Date> {
        match self {
            Self::Paid => Some(date_paid.unwrap_or_else(Date::today)),
            Self::Due => None,
        }
    }
}

define_kind! {
    #[doc = "Kind of a [`Payment`]."]
    enum Kind {
        #[doc = "Entry recorded by hand."]
        Manual = 1,

        #[doc = "Entry for the base price of a [`project::Project`]."]
        BasePrice = 2,

        #[doc = "Scheduled deposit maintained by the reconciliation."]
        DepositDue = 3,

        #[doc = "Payment recorded toward the deposit."]
        DepositPayment = 4,
    }
}

/// [`DateTime`] when a [`Payment`] was created.
pub type CreationDateTime = DateTimeOf<(Payment, unit::Creation)>;

/// [`DateTime`] when a [`Payment`] was last modified.
pub type ModificationDateTime = DateTimeOf<(Payment, unit::Modification)>;

#[cfg(test)]
mod spec {
    use common::{Currency, Date, Money};

    use crate::domain::project;

    use super::{Description, Kind, Payment, Status};

    fn money(amount: i64) -> Money {
        Money {
            amount: amount.into(),
            currency: Currency::Try,
        }
    }

    #[test]
    fn due_manual_entry_has_no_paid_date() {
        let date = Date::from_ymd(2024, 5, 1).unwrap();
        let p = Payment::manual(
            project::Id::new(),
            money(10),
            None,
            Status::Due,
            Some(date),
        );

        assert_eq!(p.kind, Kind::Manual);
        assert_eq!(p.date_paid, None);
        assert_eq!(p.effective_date(), p.created_at.date());
    }

    #[test]
    fn paid_manual_entry_defaults_to_today() {
        let p = Payment::manual(
            project::Id::new(),
            money(10),
            None,
            Status::Paid,
            None,
        );

        assert_eq!(p.date_paid, Some(Date::today()));
    }

    #[test]
    fn deposit_payment_is_fully_allocated() {
        let date = Date::from_ymd(2024, 5, 1).unwrap();
        let p = Payment::deposit(project::Id::new(), money(150), None, date);

        assert!(p.is_paid());
        assert_eq!(p.kind, Kind::DepositPayment);
        assert_eq!(p.deposit_allocation, Some(150.into()));
        assert_eq!(p.effective_date(), date);
        assert!(!p.is_system_managed());
    }

    #[test]
    fn description_is_trimmed() {
        assert_eq!(
            Description::new("  first installment ").unwrap().to_string(),
            "first installment",
        );
        assert!(Description::new("   ").is_none());
    }
}
