//! Order total calculations.
//!
//! Everything in here is pure: no storage, no clock, no logging beyond
//! `debug!` traces of intermediate values.

pub mod common;
pub mod totals;

pub use totals::{OrderTotalCalculator, OrderTotals, TotalsConfig, TotalsError, compute_totals};
