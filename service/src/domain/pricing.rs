//! Pricing of the services selected for a project.

use std::{iter::Sum, ops};

use common::{define_kind, Percent};
use rust_decimal::{Decimal, RoundingStrategy};

use super::project;

/// Service priced as a line item of a [`project::Project`].
#[derive(Clone, Debug)]
pub struct Selection {
    /// ID of the [`project::Project`] this service is selected for.
    pub project_id: project::Id,

    /// [`Billing`] classification of this [`Selection`].
    pub billing: Billing,

    /// Quantity of the selected service.
    pub quantity: Decimal,

    /// [`Catalog`] values of the selected service.
    pub catalog: Catalog,

    /// Per-project [`Overrides`] of the [`Catalog`] values.
    pub overrides: Overrides,
}

/// Catalog values of a service.
#[derive(Clone, Copy, Debug, Default)]
pub struct Catalog {
    /// Price the service is sold at, preferred over the list `price`.
    pub selling_price: Option<Decimal>,

    /// List price of the service.
    pub price: Option<Decimal>,

    /// VAT rate of the service.
    pub vat_rate: Option<Percent>,

    /// Indicator whether the catalog prices include VAT.
    ///
    /// Only an explicit `false` makes them VAT exclusive.
    pub price_includes_vat: Option<bool>,
}

/// Per-project overrides of [`Catalog`] values.
#[derive(Clone, Copy, Debug, Default)]
pub struct Overrides {
    /// Overridden unit price.
    pub unit_price: Option<Decimal>,

    /// Overridden VAT rate.
    pub vat_rate: Option<Percent>,

    /// Overridden [`VatMode`].
    pub vat_mode: Option<VatMode>,
}

impl Selection {
    /// Resolves the unit price of this [`Selection`].
    #[must_use]
    pub fn unit_price(&self) -> Option<Decimal> {
        self.overrides
            .unit_price
            .or(self.catalog.selling_price)
            .or(self.catalog.price)
    }

    /// Resolves the VAT rate of this [`Selection`].
    #[must_use]
    pub fn vat_rate(&self) -> Option<Percent> {
        self.overrides.vat_rate.or(self.catalog.vat_rate)
    }

    /// Resolves the [`VatMode`] of this [`Selection`].
    #[must_use]
    pub fn vat_mode(&self) -> VatMode {
        self.overrides.vat_mode.unwrap_or(
            if self.catalog.price_includes_vat == Some(false) {
                VatMode::Exclusive
            } else {
                VatMode::Inclusive
            },
        )
    }

    /// Computes the [`Totals`] of this [`Selection`].
    ///
    /// A `vat_exempt` project prices every line as inclusive with no rate.
    #[must_use]
    pub fn totals(&self, vat_exempt: bool) -> Totals {
        let line = self.unit_price().unwrap_or_default() * self.quantity;
        if vat_exempt {
            return Totals::inclusive(line, Decimal::ZERO);
        }

        let rate = self.vat_rate().map(Percent::value).unwrap_or_default();
        match self.vat_mode() {
            VatMode::Inclusive => Totals::inclusive(line, rate),
            VatMode::Exclusive => Totals::exclusive(line, rate),
        }
    }
}

/// Net, VAT and gross totals of priced services.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Totals {
    /// Amount excluding VAT.
    pub net: Decimal,

    /// VAT amount.
    pub vat: Decimal,

    /// Amount including VAT.
    pub gross: Decimal,
}

impl Totals {
    /// Computes the [`Totals`] of the provided `selections` having the
    /// specified [`Billing`] classification.
    #[must_use]
    pub fn of<'a>(
        selections: impl IntoIterator<Item = &'a Selection>,
        billing: Billing,
        vat_exempt: bool,
    ) -> Self {
        selections
            .into_iter()
            .filter(|s| s.billing == billing)
            .map(|s| s.totals(vat_exempt))
            .sum()
    }

    /// Splits a VAT inclusive `gross` amount with the provided `rate` (in
    /// percents).
    fn inclusive(gross: Decimal, rate: Decimal) -> Self {
        let net = gross / (Decimal::ONE + rate / Decimal::ONE_HUNDRED);
        Self {
            net,
            vat: gross - net,
            gross,
        }
    }

    /// Applies the provided `rate` (in percents) to a VAT exclusive `net`
    /// amount.
    fn exclusive(net: Decimal, rate: Decimal) -> Self {
        let vat = net * rate / Decimal::ONE_HUNDRED;
        Self {
            net,
            vat,
            gross: net + vat,
        }
    }

    /// Rounds these [`Totals`] to cents, half away from zero.
    #[must_use]
    pub fn round(self) -> Self {
        let round = |d: Decimal| {
            d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        };
        Self {
            net: round(self.net),
            vat: round(self.vat),
            gross: round(self.gross),
        }
    }
}

impl ops::Add for Totals {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            net: self.net + rhs.net,
            vat: self.vat + rhs.vat,
            gross: self.gross + rhs.gross,
        }
    }
}

impl Sum for Totals {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), ops::Add::add)
    }
}

define_kind! {
    #[doc = "Whether a price includes VAT."]
    enum VatMode {
        #[doc = "Price includes VAT."]
        Inclusive = 1,

        #[doc = "VAT is added on top of the price."]
        Exclusive = 2,
    }
}

define_kind! {
    #[doc = "Billing classification of a [`Selection`]."]
    enum Billing {
        #[doc = "Service is covered by the base price."]
        Included = 1,

        #[doc = "Service is billed on top of the base price."]
        Extra = 2,
    }
}

#[cfg(test)]
mod spec {
    use common::Percent;
    use rust_decimal::Decimal;

    use crate::domain::project;

    use super::{Billing, Catalog, Overrides, Selection, Totals, VatMode};

    fn selection(
        billing: Billing,
        price: i64,
        quantity: i64,
        rate: Option<i64>,
        includes_vat: Option<bool>,
    ) -> Selection {
        Selection {
            project_id: project::Id::new(),
            billing,
            quantity: quantity.into(),
            catalog: Catalog {
                selling_price: None,
                price: Some(price.into()),
                vat_rate: rate.and_then(|r| Percent::new(r.into())),
                price_includes_vat: includes_vat,
            },
            overrides: Overrides::default(),
        }
    }

    fn totals(net: i64, vat: i64, gross: i64) -> Totals {
        Totals {
            net: net.into(),
            vat: vat.into(),
            gross: gross.into(),
        }
    }

    #[test]
    fn splits_inclusive_price() {
        let s = selection(Billing::Extra, 59, 2, Some(18), None);
        assert_eq!(s.vat_mode(), VatMode::Inclusive);
        assert_eq!(s.totals(false), totals(100, 18, 118));
    }

    #[test]
    fn adds_vat_to_exclusive_price() {
        let s = selection(Billing::Extra, 100, 1, Some(18), Some(false));
        assert_eq!(s.vat_mode(), VatMode::Exclusive);
        assert_eq!(s.totals(false), totals(100, 18, 118));
    }

    #[test]
    fn missing_price_or_rate_counts_as_zero() {
        let mut s = selection(Billing::Extra, 100, 3, None, Some(false));
        assert_eq!(s.totals(false), totals(300, 0, 300));

        s.catalog.price = None;
        assert_eq!(s.totals(false), Totals::default());
    }

    #[test]
    fn overrides_take_precedence() {
        let mut s = selection(Billing::Extra, 100, 1, Some(18), Some(false));
        s.catalog.selling_price = Some(90.into());
        assert_eq!(s.unit_price(), Some(90.into()));

        s.overrides = Overrides {
            unit_price: Some(200.into()),
            vat_rate: Percent::new(10.into()),
            vat_mode: Some(VatMode::Exclusive),
        };
        assert_eq!(s.totals(false), totals(200, 20, 220));
    }

    #[test]
    fn vat_exempt_ignores_rate() {
        let s = selection(Billing::Extra, 100, 2, Some(18), Some(false));
        assert_eq!(s.totals(true), totals(200, 0, 200));
    }

    #[test]
    fn splits_totals_by_billing() {
        let selections = [
            selection(Billing::Included, 500, 1, None, None),
            selection(Billing::Extra, 100, 1, Some(20), Some(false)),
            selection(Billing::Extra, 80, 1, None, None),
        ];

        assert_eq!(
            Totals::of(&selections, Billing::Included, false),
            totals(500, 0, 500),
        );
        assert_eq!(
            Totals::of(&selections, Billing::Extra, false),
            totals(180, 20, 200),
        );
    }

    #[test]
    fn rounds_to_cents() {
        let s = selection(Billing::Extra, 100, 1, Some(18), None);
        let t = s.totals(false).round();

        assert_eq!(t.gross, 100.into());
        assert_eq!(t.net, "84.75".parse::<Decimal>().unwrap());
        assert_eq!(t.vat, "15.25".parse::<Decimal>().unwrap());
    }
}
