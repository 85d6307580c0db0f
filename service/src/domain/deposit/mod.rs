//! Deposit policy definitions.

pub mod reconciliation;

use std::str::FromStr;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf};
use derive_more::{AsRef, Display, Error};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::{Decimal, RoundingStrategy};

#[cfg(doc)]
use super::Project;
use super::payment;

/// Deposit policy of a [`Project`].
///
/// Saved wholesale: every save replaces the previous one.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Config {
    /// [`Mode`] of computing the deposit amount.
    pub mode: Mode,

    /// Value the deposit amount is computed from.
    ///
    /// A currency amount for [`Mode::Fixed`], a percentage otherwise.
    pub value: Option<Decimal>,

    /// [`DueLabel`] of the scheduled deposit entry.
    pub due_label: DueLabel,

    /// Description of the scheduled deposit entry, preferred over the
    /// [`DueLabel`].
    pub description: Option<payment::Description>,

    /// [`Snapshot`] of the amounts in force when this [`Config`] was saved.
    pub snapshot: Option<Snapshot>,
}

impl Config {
    /// Computes the deposit amount required by this [`Config`] in the
    /// provided [`Context`].
    ///
    /// The result is rounded to cents, half away from zero. A missing value
    /// computes as zero.
    #[must_use]
    pub fn amount(&self, ctx: &Context) -> Decimal {
        let value = self.value.unwrap_or_default();
        let amount = match self.mode {
            Mode::None => Decimal::ZERO,
            Mode::Fixed => value.max(Decimal::ZERO),
            Mode::PercentBase => ctx.base_price * value / Decimal::ONE_HUNDRED,
            Mode::PercentTotal => {
                ctx.contract_total * value / Decimal::ONE_HUNDRED
            }
        };
        amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Validates this [`Config`] before it's saved.
    ///
    /// # Errors
    ///
    /// - If a [`Mode`] other than [`Mode::None`] has no value.
    /// - If the value is negative.
    /// - If a percentage value is greater than `100`.
    /// - If the [`DueLabel`] is longer than the [`DueLabel::MAX_LEN`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        use ValidationError as E;

        if !self.due_label.is_valid() {
            return Err(E::DueLabelTooLong(self.due_label.char_count()));
        }
        if self.mode == Mode::None {
            return Ok(());
        }
        let value = self.value.ok_or(E::ValueRequired(self.mode))?;
        if value < Decimal::ZERO {
            return Err(E::NegativeValue(value));
        }
        if self.mode.is_percent() && value > Decimal::ONE_HUNDRED {
            return Err(E::PercentOutOfRange(value));
        }
        Ok(())
    }

    /// Returns the [`payment::Description`] of the scheduled deposit entry.
    #[must_use]
    pub fn entry_description(&self) -> payment::Description {
        self.description
            .clone()
            .unwrap_or_else(|| self.due_label.clone().into())
    }
}

/// Amounts a deposit is computed against.
#[derive(Clone, Copy, Debug, Default)]
pub struct Context {
    /// Base price of the [`Project`].
    pub base_price: Decimal,

    /// Gross total of the extra services.
    pub extras_total: Decimal,

    /// Contract total: base price plus the extras.
    pub contract_total: Decimal,
}

define_kind! {
    #[doc = "Mode of computing a deposit amount."]
    enum Mode {
        #[doc = "No deposit is required."]
        None = 1,

        #[doc = "Fixed currency amount."]
        Fixed = 2,

        #[doc = "Percentage of the base price."]
        PercentBase = 3,

        #[doc = "Percentage of the contract total."]
        PercentTotal = 4,
    }
}

impl Default for Mode {
    fn default() -> Self {
        Self::None
    }
}

impl Mode {
    /// Indicates whether this [`Mode`] takes a percentage value.
    #[must_use]
    pub const fn is_percent(self) -> bool {
        matches!(self, Self::PercentBase | Self::PercentTotal)
    }
}

/// Display name of a scheduled deposit entry.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct DueLabel(String);

impl DueLabel {
    /// [`DueLabel`] used when none is provided.
    pub const DEFAULT: &'static str = "Deposit";

    /// Maximum number of characters a valid [`DueLabel`] may have.
    pub const MAX_LEN: usize = 256;

    /// Creates a new [`DueLabel`] out of the provided `label`, trimming it.
    ///
    /// Falls back to the [`DueLabel::DEFAULT`] if the `label` is blank.
    /// Length is checked by [`Config::validate()`] instead.
    #[must_use]
    pub fn new(label: impl AsRef<str>) -> Self {
        let label = label.as_ref().trim();
        if label.is_empty() {
            Self::default()
        } else {
            Self(label.to_owned())
        }
    }
}

impl DueLabel {
    /// Returns the number of characters in this [`DueLabel`].
    #[must_use]
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }

    /// Indicates whether this [`DueLabel`] fits the [`DueLabel::MAX_LEN`].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.char_count() <= Self::MAX_LEN
    }
}

impl Default for DueLabel {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl FromStr for DueLabel {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

/// Amounts in force when a deposit [`Config`] was saved.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Snapshot {
    /// Deposit amount computed on save.
    pub amount: Decimal,

    /// Contract total on save.
    pub contract_total: Decimal,

    /// [`DateTime`] of the save.
    pub locked_at: LockDateTime,

    /// Deposit amount acknowledged by the user on save.
    pub acknowledged_amount: Decimal,
}

impl Snapshot {
    /// Takes a new [`Snapshot`] of the provided `amount` and `contract_total`.
    ///
    /// [`None`] is returned if no deposit is required.
    #[must_use]
    pub fn take(amount: Decimal, contract_total: Decimal) -> Option<Self> {
        (amount > Decimal::ZERO).then(|| Self {
            amount,
            contract_total,
            locked_at: LockDateTime::now(),
            acknowledged_amount: amount,
        })
    }
}

define_kind! {
    #[doc = "Collection status of a deposit."]
    enum Status {
        #[doc = "No deposit is required."]
        None = 1,

        #[doc = "Nothing was paid toward the deposit yet."]
        Due = 2,

        #[doc = "The deposit was paid in part."]
        Partial = 3,

        #[doc = "The deposit was paid in full."]
        Paid = 4,
    }
}

impl Status {
    /// Derives the [`Status`] of a deposit of the provided `amount` with
    /// `paid` collected toward it.
    #[must_use]
    pub fn of(amount: Decimal, paid: Decimal) -> Self {
        if amount <= Decimal::ZERO {
            Self::None
        } else if amount - paid <= Decimal::ZERO {
            Self::Paid
        } else if paid > Decimal::ZERO {
            Self::Partial
        } else {
            Self::Due
        }
    }
}

/// Error of validating a deposit [`Config`].
#[derive(Clone, Copy, Debug, Display, Error)]
pub enum ValidationError {
    /// [`Mode`] requires a value, but none was provided.
    #[display("`{_0}` deposit requires a value")]
    ValueRequired(#[error(not(source))] Mode),

    /// Value is negative.
    #[display("deposit value cannot be negative: {_0}")]
    NegativeValue(#[error(not(source))] Decimal),

    /// Percentage is greater than `100`.
    #[display("deposit percentage must be within `0..=100`: {_0}")]
    PercentOutOfRange(#[error(not(source))] Decimal),

    /// [`DueLabel`] has more characters than the [`DueLabel::MAX_LEN`].
    #[display(
        "deposit due label cannot exceed {} characters, got {_0}",
        DueLabel::MAX_LEN,
    )]
    DueLabelTooLong(#[error(not(source))] usize),
}

/// [`DateTime`] when a deposit [`Config`] was saved.
pub type LockDateTime = DateTimeOf<(Config, unit::Modification)>;

#[cfg(test)]
mod spec {
    use rust_decimal::Decimal;

    use super::{Config, Context, DueLabel, Mode, Status, ValidationError};

    fn config(mode: Mode, value: Option<i64>) -> Config {
        Config {
            mode,
            value: value.map(Decimal::from),
            ..Config::default()
        }
    }

    fn ctx(base: i64, extras: i64) -> Context {
        Context {
            base_price: base.into(),
            extras_total: extras.into(),
            contract_total: (base + extras).into(),
        }
    }

    #[test]
    fn computes_amount_per_mode() {
        let ctx = ctx(1000, 200);

        assert_eq!(config(Mode::None, Some(50)).amount(&ctx), Decimal::ZERO);
        assert_eq!(config(Mode::Fixed, Some(150)).amount(&ctx), 150.into());
        assert_eq!(
            config(Mode::PercentBase, Some(10)).amount(&ctx),
            100.into(),
        );
        assert_eq!(
            config(Mode::PercentTotal, Some(10)).amount(&ctx),
            120.into(),
        );
    }

    #[test]
    fn missing_or_negative_value_computes_as_zero() {
        let ctx = ctx(1000, 0);

        assert_eq!(config(Mode::Fixed, None).amount(&ctx), Decimal::ZERO);
        assert_eq!(config(Mode::Fixed, Some(-5)).amount(&ctx), Decimal::ZERO);
        assert_eq!(
            config(Mode::PercentBase, None).amount(&ctx),
            Decimal::ZERO,
        );
    }

    #[test]
    fn rounds_amount_to_cents() {
        let config = Config {
            mode: Mode::PercentBase,
            value: Some("12.5".parse().unwrap()),
            ..Config::default()
        };

        assert_eq!(
            config.amount(&ctx(1001, 0)),
            "125.13".parse::<Decimal>().unwrap(),
        );
        assert_eq!(
            config.amount(&ctx(333, 0)),
            "41.63".parse::<Decimal>().unwrap(),
        );
    }

    #[test]
    fn derives_status() {
        let s = |amount: i64, paid: i64| Status::of(amount.into(), paid.into());

        assert_eq!(s(0, 0), Status::None);
        assert_eq!(s(0, 50), Status::None);
        assert_eq!(s(150, 0), Status::Due);
        assert_eq!(s(150, 50), Status::Partial);
        assert_eq!(s(150, 150), Status::Paid);
        assert_eq!(s(120, 150), Status::Paid);
    }

    #[test]
    fn validates_value() {
        assert!(config(Mode::None, None).validate().is_ok());
        assert!(config(Mode::Fixed, Some(0)).validate().is_ok());
        assert!(config(Mode::PercentTotal, Some(100)).validate().is_ok());

        assert!(matches!(
            config(Mode::Fixed, None).validate(),
            Err(ValidationError::ValueRequired(Mode::Fixed)),
        ));
        assert!(matches!(
            config(Mode::Fixed, Some(-1)).validate(),
            Err(ValidationError::NegativeValue(_)),
        ));
        assert!(matches!(
            config(Mode::PercentBase, Some(101)).validate(),
            Err(ValidationError::PercentOutOfRange(_)),
        ));
        assert!(config(Mode::Fixed, Some(5000)).validate().is_ok());
    }

    #[test]
    fn blank_label_falls_back_to_default() {
        assert_eq!(DueLabel::new("  ").to_string(), DueLabel::DEFAULT);
        assert_eq!(DueLabel::new(" Advance ").to_string(), "Advance");

        let config = Config::default();
        assert_eq!(config.entry_description().to_string(), DueLabel::DEFAULT);
    }

    #[test]
    fn validates_label_length() {
        let label = |len: usize| Config {
            due_label: DueLabel::new("ş".repeat(len)),
            ..config(Mode::None, None)
        };

        assert!(label(DueLabel::MAX_LEN).validate().is_ok());
        assert!(matches!(
            label(DueLabel::MAX_LEN + 1).validate(),
            Err(ValidationError::DueLabelTooLong(257)),
        ));
    }

    #[test]
    fn overlong_label_still_describes_entry() {
        let config = Config {
            due_label: DueLabel::new(format!("{} tail", "x".repeat(2000))),
            ..Config::default()
        };

        let description = config.entry_description().to_string();
        assert_eq!(description, "x".repeat(DueLabel::MAX_LEN));
    }
}
