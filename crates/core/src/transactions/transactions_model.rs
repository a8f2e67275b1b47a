//! Transaction domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::ValidationError;
use crate::transactions::transactions_constants::*;

/// Ways shares enter a holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AcquisitionAction {
    Buy,
    Reinvestment,
    TransferIn,
}

/// Ways shares leave a holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispositionAction {
    Sell,
    TransferOut,
}

/// Share-count events with no cash movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CorporateActionKind {
    StockSplit,
    ReverseSplit,
}

/// Closed classification of a transaction. The action is a sub-variant of its
/// category, so a "Stock Split" can only ever be a corporate action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(
    tag = "category",
    content = "action",
    rename_all = "SCREAMING_SNAKE_CASE"
)]
pub enum TransactionCategory {
    Acquisition(AcquisitionAction),
    Disposition(DispositionAction),
    CorporateAction(CorporateActionKind),
}

impl TransactionCategory {
    /// Canonical action label, e.g. "Stock Split".
    pub fn label(&self) -> &'static str {
        match self {
            TransactionCategory::Acquisition(AcquisitionAction::Buy) => ACTION_LABEL_BUY,
            TransactionCategory::Acquisition(AcquisitionAction::Reinvestment) => {
                ACTION_LABEL_REINVESTMENT
            }
            TransactionCategory::Acquisition(AcquisitionAction::TransferIn) => {
                ACTION_LABEL_TRANSFER_IN
            }
            TransactionCategory::Disposition(DispositionAction::Sell) => ACTION_LABEL_SELL,
            TransactionCategory::Disposition(DispositionAction::TransferOut) => {
                ACTION_LABEL_TRANSFER_OUT
            }
            TransactionCategory::CorporateAction(CorporateActionKind::StockSplit) => {
                ACTION_LABEL_STOCK_SPLIT
            }
            TransactionCategory::CorporateAction(CorporateActionKind::ReverseSplit) => {
                ACTION_LABEL_REVERSE_SPLIT
            }
        }
    }

    pub fn is_acquisition(&self) -> bool {
        matches!(self, TransactionCategory::Acquisition(_))
    }

    pub fn is_disposition(&self) -> bool {
        matches!(self, TransactionCategory::Disposition(_))
    }

    pub fn is_corporate_action(&self) -> bool {
        matches!(self, TransactionCategory::CorporateAction(_))
    }
}

impl fmt::Display for TransactionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for TransactionCategory {
    type Err = ValidationError;

    /// Parses a free-text action label from imported data.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = normalize_action_label(s);
        let label = label.as_str();

        if BUY_ALIASES.contains(&label) {
            Ok(TransactionCategory::Acquisition(AcquisitionAction::Buy))
        } else if REINVESTMENT_ALIASES.contains(&label) {
            Ok(TransactionCategory::Acquisition(
                AcquisitionAction::Reinvestment,
            ))
        } else if TRANSFER_IN_ALIASES.contains(&label) {
            Ok(TransactionCategory::Acquisition(AcquisitionAction::TransferIn))
        } else if SELL_ALIASES.contains(&label) {
            Ok(TransactionCategory::Disposition(DispositionAction::Sell))
        } else if TRANSFER_OUT_ALIASES.contains(&label) {
            Ok(TransactionCategory::Disposition(
                DispositionAction::TransferOut,
            ))
        } else if STOCK_SPLIT_ALIASES.contains(&label) {
            Ok(TransactionCategory::CorporateAction(
                CorporateActionKind::StockSplit,
            ))
        } else if REVERSE_SPLIT_ALIASES.contains(&label) {
            Ok(TransactionCategory::CorporateAction(
                CorporateActionKind::ReverseSplit,
            ))
        } else {
            Err(ValidationError::UnknownActionLabel(s.to_string()))
        }
    }
}

/// A single observed transaction. Treated as immutable once observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Source rows without an id get a generated one.
    #[serde(default = "generate_transaction_id")]
    pub id: String,
    /// Missing dates are tolerated on input; such rows are skipped by every replay.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub symbol: String,
    #[serde(flatten)]
    pub category: TransactionCategory,
    /// For corporate actions this is the post-event total share count.
    pub quantity: Decimal,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub amount: Decimal,
    /// Lots named for a specific-identification disposal.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lot_ids: Vec<String>,
}

impl Transaction {
    pub fn new(
        id: impl Into<String>,
        date: DateTime<Utc>,
        symbol: impl Into<String>,
        category: TransactionCategory,
        quantity: Decimal,
        price: Decimal,
        amount: Decimal,
    ) -> Self {
        Transaction {
            id: id.into(),
            date: Some(date),
            symbol: symbol.into(),
            category,
            quantity,
            price,
            amount,
            lot_ids: Vec::new(),
        }
    }

    /// Attaches a specific-identification lot selection.
    pub fn with_lot_ids(mut self, lot_ids: Vec<String>) -> Self {
        self.lot_ids = lot_ids;
        self
    }

    /// Calendar date of the transaction, if it has one.
    pub fn effective_date(&self) -> Option<NaiveDate> {
        self.date.map(|d| d.date_naive())
    }

    pub fn has_symbol(&self) -> bool {
        !self.symbol.trim().is_empty()
    }

    /// Checks the fields every replay depends on. Rows failing this are skipped.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.date.is_none() {
            return Err(ValidationError::MissingField("date".to_string()));
        }
        if !self.has_symbol() {
            return Err(ValidationError::MissingField("symbol".to_string()));
        }
        Ok(())
    }

    pub fn matches_symbol(&self, symbol: &str) -> bool {
        self.symbol.trim().eq_ignore_ascii_case(symbol.trim())
    }
}

fn generate_transaction_id() -> String {
    Uuid::new_v4().to_string()
}

/// Returns a new vector of the transactions sorted ascending by date.
/// Undated rows sort last; ties keep their input order.
pub fn sort_by_date(transactions: &[Transaction]) -> Vec<Transaction> {
    let mut sorted = transactions.to_vec();
    sorted.sort_by(|a, b| match (a.date, b.date) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    sorted
}
