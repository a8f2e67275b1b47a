//! Reconciliation module - compares calculated holdings with snapshots and
//! proposes how to close the gaps.

mod interpolation;
mod reconciliation_config;
mod reconciliation_engine;
mod reconciliation_model;
mod ticker_change;

pub use interpolation::*;
pub use reconciliation_config::ReconciliationConfig;
pub use reconciliation_engine::*;
pub use reconciliation_model::*;
pub use ticker_change::*;


#[cfg(test)]
mod interpolation_tests;
