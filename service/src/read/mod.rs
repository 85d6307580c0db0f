//! Read entities definitions.

pub mod summary;

pub use self::summary::FinancialSummary;
