//! Lotwise Core - tax-lot accounting and portfolio reconciliation.
//!
//! This crate replays transaction histories into aggregate holdings and tax
//! lots, matches disposals against lots, and reconciles the results with
//! externally supplied position snapshots. It is storage-agnostic: lots and
//! settings are reached through the repository traits in [`lots`] and
//! [`settings`].

pub mod constants;
pub mod corporate_actions;
pub mod errors;
pub mod holdings;
pub mod lots;
pub mod reconciliation;
pub mod settings;
pub mod transactions;
pub mod utils;

// Re-export the types most callers start from
pub use holdings::{HoldingsCalculationResult, HoldingsCalculator, SymbolHoldings};
pub use lots::{LotLedger, LotService, LotTrackingMethod};
pub use reconciliation::{ReconciliationConfig, ReconciliationEngine, ReconciliationResult};
pub use transactions::Transaction;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
