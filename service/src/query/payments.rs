//! [`Query`] collection related to multiple [`Payment`]s.

use common::operations::By;

use crate::domain::{project, Payment};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries the ledger of a [`Project`], newest [`Payment`]s first.
///
/// [`Project`]: crate::domain::Project
pub type ByProject = DatabaseQuery<By<Vec<Payment>, project::Id>>;
