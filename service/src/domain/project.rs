//! [`Project`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::deposit;

/// Client engagement whose finances are tracked by the ledger.
#[derive(Clone, Debug)]
pub struct Project {
    /// ID of this [`Project`].
    pub id: Id,

    /// [`Name`] of this [`Project`].
    pub name: Name,

    /// Base price of this [`Project`], excluding add-on services.
    pub base_price: Money,

    /// [`deposit::Config`] of this [`Project`], if it was ever saved.
    pub deposit_config: Option<deposit::Config>,

    /// Indicator whether this [`Project`] is billed without VAT.
    ///
    /// Every service selection of a VAT exempt [`Project`] is priced as
    /// inclusive with no rate.
    pub vat_exempt: bool,

    /// [`DateTime`] when this [`Project`] was created.
    pub created_at: CreationDateTime,
}

impl Project {
    /// Returns the effective [`deposit::Config`] of this [`Project`].
    ///
    /// A [`Project`] which never had its deposit configured requires no
    /// deposit.
    #[must_use]
    pub fn deposit_config(&self) -> deposit::Config {
        self.deposit_config.clone().unwrap_or_default()
    }
}

/// ID of a [`Project`].
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
    Ord,
    PartialEq,
    PartialOrd,
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

/// Name of a [`Project`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 256
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

/// [`DateTime`] when a [`Project`] was created.
pub type CreationDateTime = DateTimeOf<(Project, unit::Creation)>;
