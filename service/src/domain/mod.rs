//! Domain definitions.

pub mod deposit;
pub mod ledger;
pub mod payment;
pub mod pricing;
pub mod project;

pub use self::{ledger::Ledger, payment::Payment, project::Project};
