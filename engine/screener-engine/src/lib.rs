//! Filter predicate and sort engines for the market screener
//!
//! Pure, side-effect-free evaluation of user criteria against live ticker
//! records, plus the deterministic comparator that orders the result.

pub mod criteria;
pub mod filter;
pub mod sort;

pub use criteria::FilterCriteria;
pub use filter::FilterPredicateEngine;
pub use sort::{SortDirection, SortEngine, SortField, SortState};
