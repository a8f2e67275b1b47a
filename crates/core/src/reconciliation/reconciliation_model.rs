//! Reconciliation domain models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate holdings derived from transactions or from open lots.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedHoldings {
    pub quantity: Decimal,
    pub total_cost_basis: Decimal,
    pub average_cost_per_share: Decimal,
}

/// Externally supplied position from a broker statement or import.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotPosition {
    pub symbol: String,
    pub quantity: Decimal,
    pub market_value: Decimal,
    pub price: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscrepancyType {
    QuantityMismatch,
    MissingTransaction,
    MathematicalError,
    CorporateActionNeeded,
}

impl DiscrepancyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscrepancyType::QuantityMismatch => "QUANTITY_MISMATCH",
            DiscrepancyType::MissingTransaction => "MISSING_TRANSACTION",
            DiscrepancyType::MathematicalError => "MATHEMATICAL_ERROR",
            DiscrepancyType::CorporateActionNeeded => "CORPORATE_ACTION_NEEDED",
        }
    }
}

impl fmt::Display for DiscrepancyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity levels for discrepancies, ordered Low < Medium < High < Critical.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A detected mismatch between transaction-derived holdings and a snapshot.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Discrepancy {
    #[serde(rename = "type")]
    pub discrepancy_type: DiscrepancyType,
    pub severity: Severity,
    pub calculated: Decimal,
    pub actual: Decimal,
    /// `actual - calculated`
    pub difference: Decimal,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionAction {
    AddMissingTransactions,
    ReviewRecordedSales,
    VerifyMarketValue,
    ImportTransactionHistory,
    RecordCorporateAction,
}

impl ResolutionAction {
    /// Button-style label shown in the confirmation workflow.
    pub fn label(&self) -> &'static str {
        match self {
            ResolutionAction::AddMissingTransactions => "Add missing transactions",
            ResolutionAction::ReviewRecordedSales => "Review recorded sales",
            ResolutionAction::VerifyMarketValue => "Verify market value / pricing",
            ResolutionAction::ImportTransactionHistory => "Import transaction history",
            ResolutionAction::RecordCorporateAction => "Record corporate action",
        }
    }
}

impl fmt::Display for ResolutionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionSuggestion {
    #[serde(rename = "type")]
    pub suggestion_type: DiscrepancyType,
    pub action: ResolutionAction,
    pub description: String,
    pub priority: Severity,
}

/// Per-symbol reconciliation outcome.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResult {
    pub symbol: String,
    pub has_discrepancies: bool,
    pub discrepancies: Vec<Discrepancy>,
    pub resolution_suggestions: Vec<ResolutionSuggestion>,
}

impl ReconciliationResult {
    pub fn highest_severity(&self) -> Option<Severity> {
        self.discrepancies.iter().map(|d| d.severity).max()
    }

    pub fn find(&self, discrepancy_type: DiscrepancyType) -> Option<&Discrepancy> {
        self.discrepancies
            .iter()
            .find(|d| d.discrepancy_type == discrepancy_type)
    }
}
