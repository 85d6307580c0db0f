//! [`Money`]-related definitions.

use std::{fmt, ops, str::FromStr};

use rust_decimal::{prelude::ToPrimitive as _, Decimal, RoundingStrategy};

use crate::define_kind;

/// Amount of money in some [`Currency`].
///
/// Arithmetic between two [`Money`] values assumes the same [`Currency`]:
/// a ledger is always kept in a single one.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Money {
    /// Amount of this [`Money`].
    pub amount: Decimal,

    /// [`Currency`] of this amount.
    pub currency: Currency,
}

impl Money {
    /// Number of fractional digits kept by [`Money::round()`].
    pub const MINOR_UNITS: u32 = 2;

    /// Greatest amount a single ledger entry may carry: `10^15`.
    ///
    /// Keeps sums over any realistic ledger far from the [`Decimal::MAX`].
    pub const MAX_AMOUNT: Decimal =
        Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

    /// Creates a zero [`Money`] amount in the provided [`Currency`].
    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Creates a new [`Money`] with the provided `amount` in the same
    /// [`Currency`] as this one.
    #[must_use]
    pub const fn with_amount(self, amount: Decimal) -> Self {
        Self {
            amount,
            currency: self.currency,
        }
    }

    /// Indicates whether this amount is strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Indicates whether this amount exceeds the [`Money::MAX_AMOUNT`].
    #[must_use]
    pub fn is_excessive(&self) -> bool {
        self.amount > Self::MAX_AMOUNT
    }

    /// Clamps this amount to be non-negative.
    #[must_use]
    pub fn clamp_non_negative(self) -> Self {
        self.with_amount(self.amount.max(Decimal::ZERO))
    }

    /// Rounds this amount to the [`Currency`] minor units, half away from
    /// zero.
    #[must_use]
    pub fn round(self) -> Self {
        self.with_amount(self.amount.round_dp_with_strategy(
            Self::MINOR_UNITS,
            RoundingStrategy::MidpointAwayFromZero,
        ))
    }
}

impl ops::Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        debug_assert_eq!(self.currency, rhs.currency, "currency mismatch");
        self.with_amount(self.amount + rhs.amount)
    }
}

impl ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl ops::Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        debug_assert_eq!(self.currency, rhs.currency, "currency mismatch");
        self.with_amount(self.amount - rhs.amount)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { amount, currency } = self;
        if let Some(int) = amount.is_integer().then(|| amount.to_i128()).flatten()
        {
            write!(f, "{int}{currency}")
        } else {
            write!(f, "{}{currency}", amount.normalize())
        }
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < 4 || !s.is_char_boundary(s.len() - 3) {
            return Err("too short");
        }

        let (amount, currency) = s.split_at(s.len() - 3);
        let amount = Decimal::from_str(amount).map_err(|_| "invalid amount")?;
        let currency =
            Currency::from_str(currency).map_err(|_| "invalid currency")?;

        Ok(Self { amount, currency })
    }
}

define_kind! {
    #[doc = "Currency of a [`Money`] amount."]
    enum Currency {
        #[doc = "Turkish Lira."]
        Try = 1,

        #[doc = "US Dollar."]
        Usd = 2,

        #[doc = "Euro."]
        Eur = 3,
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Money in `{major}.{minor}{currency}` format, where:
    /// - `major` is an integer;
    /// - `minor` is an optional integer;
    /// - `currency` is a three-letter currency code.
    #[graphql_scalar(with = Self, parse_token(String))]
    type Money = super::Money;

    impl Money {
        fn to_output<S: ScalarValue>(m: &Money) -> Value<S> {
            Value::scalar(m.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Money` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Money` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::{Currency, Money};

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn bounds_entry_amount() {
        assert_eq!(
            Money::MAX_AMOUNT,
            Decimal::from(1_000_000_000_000_000_i64),
        );
        assert!(!try_("1000000000000000").is_excessive());
        assert!(try_("1000000000000000.01").is_excessive());
    }

    fn try_(s: &str) -> Money {
        Money {
            amount: decimal(s),
            currency: Currency::Try,
        }
    }

    #[test]
    fn from_str() {
        assert_eq!(Money::from_str("123.45TRY").unwrap(), try_("123.45"));
        assert_eq!(
            Money::from_str("99EUR").unwrap(),
            Money {
                amount: decimal("99"),
                currency: Currency::Eur,
            },
        );

        assert!(Money::from_str("123.45").is_err());
        assert!(Money::from_str("123.45Tr").is_err());
        assert!(Money::from_str("123.45Turkish").is_err());
        assert!(Money::from_str("abcTRY").is_err());
    }

    #[test]
    fn to_string() {
        assert_eq!(try_("123.45").to_string(), "123.45TRY");
        assert_eq!(try_("123.00").to_string(), "123TRY");
        assert_eq!(try_("123.50").to_string(), "123.5TRY");
        assert_eq!(try_("0").to_string(), "0TRY");
    }

    #[test]
    fn arithmetic() {
        assert_eq!(try_("100") + try_("20.5"), try_("120.5"));
        assert_eq!(try_("100") - try_("150"), try_("-50"));
        assert_eq!((try_("100") - try_("150")).clamp_non_negative(), try_("0"));

        let mut sum = Money::zero(Currency::Try);
        sum += try_("0.1");
        sum += try_("0.2");
        assert_eq!(sum, try_("0.3"));
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(try_("33.335").round(), try_("33.34"));
        assert_eq!(try_("33.334").round(), try_("33.33"));
        assert!(try_("0.01").is_positive());
        assert!(!try_("0").is_positive());
    }
}
