use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::reconciliation::CalculatedHoldings;
use crate::transactions::Transaction;

/// Aggregate position of one symbol at a point in time. Carries no lot detail.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SymbolHoldings {
    pub symbol: String,
    pub as_of: NaiveDate,
    pub quantity: Decimal,
    pub total_cost_basis: Decimal,
    /// Zero whenever quantity is zero or negative.
    pub average_cost_per_share: Decimal,
    pub earliest_acquisition_date: Option<DateTime<Utc>>,
}

impl SymbolHoldings {
    pub fn empty(symbol: impl Into<String>, as_of: NaiveDate) -> Self {
        SymbolHoldings {
            symbol: symbol.into(),
            as_of,
            quantity: Decimal::ZERO,
            total_cost_basis: Decimal::ZERO,
            average_cost_per_share: Decimal::ZERO,
            earliest_acquisition_date: None,
        }
    }

    pub fn to_calculated(&self) -> CalculatedHoldings {
        CalculatedHoldings {
            quantity: self.quantity,
            total_cost_basis: self.total_cost_basis,
            average_cost_per_share: self.average_cost_per_share,
        }
    }
}

/// A transaction that was skipped or only partly understood during a replay.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HoldingsCalculationWarning {
    pub transaction_id: String,
    pub symbol: String,
    pub date: Option<NaiveDate>,
    pub message: String,
}

impl std::fmt::Display for HoldingsCalculationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.date {
            Some(date) => write!(
                f,
                "Transaction {} (symbol: {}, date: {}): {}",
                self.transaction_id, self.symbol, date, self.message
            ),
            None => write!(
                f,
                "Transaction {} (symbol: {}, no date): {}",
                self.transaction_id, self.symbol, self.message
            ),
        }
    }
}

/// Result of a holdings replay: the holdings, the transactions that shaped
/// them (in replay order) and warnings for everything left out.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HoldingsCalculationResult {
    pub holdings: SymbolHoldings,
    pub applied_transactions: Vec<Transaction>,
    pub warnings: Vec<HoldingsCalculationWarning>,
}

impl HoldingsCalculationResult {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
