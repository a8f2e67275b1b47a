use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ValidationError;
use crate::utils::{is_quantity_significant, safe_divide};

/// Lifecycle state of a lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LotStatus {
    #[default]
    Open,
    Closed,
}

/// Rule for choosing which open lots absorb a disposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LotTrackingMethod {
    #[default]
    #[serde(rename = "FIFO")]
    Fifo,
    #[serde(rename = "LIFO")]
    Lifo,
    #[serde(rename = "SPECIFIC_ID")]
    SpecificId,
}

impl LotTrackingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            LotTrackingMethod::Fifo => "FIFO",
            LotTrackingMethod::Lifo => "LIFO",
            LotTrackingMethod::SpecificId => "SPECIFIC_ID",
        }
    }
}

impl fmt::Display for LotTrackingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LotTrackingMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace([' ', '-'], "_").as_str() {
            "FIFO" => Ok(LotTrackingMethod::Fifo),
            "LIFO" => Ok(LotTrackingMethod::Lifo),
            "SPECIFIC_ID" | "SPECIFIC_IDENTIFICATION" => Ok(LotTrackingMethod::SpecificId),
            _ => Err(ValidationError::UnknownTrackingMethod(s.to_string())),
        }
    }
}

/// A discrete acquisition of shares, tracked separately for cost-basis purposes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lot {
    pub id: String,
    pub symbol: String,
    pub account_id: String,
    pub acquisition_date: DateTime<Utc>,
    pub original_quantity: Decimal,
    pub remaining_quantity: Decimal,
    /// Total amount paid for the whole lot at acquisition. Never rescaled.
    pub cost_basis: Decimal,
    #[serde(default)]
    pub status: LotStatus,
    pub is_transaction_derived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_transaction_id: Option<String>,
}

impl Lot {
    pub fn is_open(&self) -> bool {
        self.status == LotStatus::Open
    }

    /// Cost basis attributable to the shares still held.
    pub fn allocated_cost(&self) -> Decimal {
        safe_divide(self.remaining_quantity, self.original_quantity)
            .map(|fraction| self.cost_basis * fraction)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn cost_per_share(&self) -> Decimal {
        safe_divide(self.cost_basis, self.original_quantity).unwrap_or(Decimal::ZERO)
    }

    pub fn market_value(&self, current_price: Decimal) -> Decimal {
        self.remaining_quantity * current_price
    }

    pub fn unrealized_gain_loss(&self, current_price: Decimal) -> Decimal {
        self.market_value(current_price) - self.allocated_cost()
    }

    /// Takes up to `quantity` shares out of the lot and returns
    /// `(quantity_taken, cost_basis_relieved)`. Closes the lot once the
    /// remainder is insignificant.
    pub(crate) fn consume(&mut self, quantity: Decimal) -> (Decimal, Decimal) {
        if !self.is_open() || quantity <= Decimal::ZERO {
            return (Decimal::ZERO, Decimal::ZERO);
        }
        let taken = quantity.min(self.remaining_quantity);
        let relieved = safe_divide(taken, self.original_quantity)
            .map(|fraction| self.cost_basis * fraction)
            .unwrap_or(Decimal::ZERO);

        self.remaining_quantity -= taken;
        if !is_quantity_significant(&self.remaining_quantity) {
            self.remaining_quantity = Decimal::ZERO;
            self.status = LotStatus::Closed;
        }
        (taken, relieved)
    }
}

/// A manually entered lot, not backed by any transaction.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewLot {
    pub symbol: String,
    pub acquisition_date: DateTime<Utc>,
    pub quantity: Decimal,
    pub cost_basis: Decimal,
}

/// Everything the ledger needs to match one disposal.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DisposalRequest {
    pub quantity: Decimal,
    pub method: LotTrackingMethod,
    /// Lots to consume, in order. Required for `SPECIFIC_ID`, ignored otherwise.
    #[serde(default)]
    pub lot_ids: Vec<String>,
}

impl DisposalRequest {
    pub fn new(quantity: Decimal, method: LotTrackingMethod) -> Self {
        DisposalRequest {
            quantity,
            method,
            lot_ids: Vec::new(),
        }
    }

    pub fn specific(quantity: Decimal, lot_ids: Vec<String>) -> Self {
        DisposalRequest {
            quantity,
            method: LotTrackingMethod::SpecificId,
            lot_ids,
        }
    }
}

/// Portion of a disposal absorbed by one lot.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LotMatch {
    pub lot_id: String,
    pub quantity: Decimal,
    pub cost_basis_relieved: Decimal,
    pub lot_closed: bool,
}

/// Result of matching a disposal against open lots. A non-zero `shortfall`
/// is the "insufficient lots" condition; the caller decides whether to accept it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DisposalOutcome {
    pub symbol: String,
    pub method: LotTrackingMethod,
    pub requested_quantity: Decimal,
    pub matched_quantity: Decimal,
    pub shortfall: Decimal,
    pub cost_basis_relieved: Decimal,
    pub matches: Vec<LotMatch>,
}

impl DisposalOutcome {
    pub fn has_shortfall(&self) -> bool {
        is_quantity_significant(&self.shortfall)
    }

    /// Realized gain for the matched shares at the given sale price.
    pub fn realized_gain_loss(&self, sale_price: Decimal) -> Decimal {
        self.matched_quantity * sale_price - self.cost_basis_relieved
    }
}

/// A transaction the ledger could not apply during a replay.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerWarning {
    pub transaction_id: String,
    pub symbol: String,
    pub date: Option<NaiveDate>,
    pub message: String,
}

impl fmt::Display for LedgerWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.date {
            Some(date) => write!(
                f,
                "Transaction {} ({}, date: {}): {}",
                self.transaction_id, self.symbol, date, self.message
            ),
            None => write!(
                f,
                "Transaction {} ({}, undated): {}",
                self.transaction_id, self.symbol, self.message
            ),
        }
    }
}

/// Outcome of rebuilding a lot set from a transaction history.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerReplayResult {
    pub lots: Vec<Lot>,
    pub disposals: Vec<DisposalOutcome>,
    pub splits_applied: usize,
    pub warnings: Vec<LedgerWarning>,
}

impl LedgerReplayResult {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Key under which the lot store keeps an account+symbol lot set.
pub fn lot_store_key(account_id: &str, symbol: &str) -> String {
    format!("{}_{}", account_id, symbol)
}
