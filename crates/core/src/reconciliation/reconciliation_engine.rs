use log::{debug, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::constants::DISPLAY_DECIMAL_PRECISION;
use crate::errors::{ReconciliationError, Result};
use crate::reconciliation::reconciliation_config::ReconciliationConfig;
use crate::reconciliation::reconciliation_model::{
    CalculatedHoldings, Discrepancy, DiscrepancyType, ReconciliationResult, ResolutionAction,
    ResolutionSuggestion, Severity, SnapshotPosition,
};
use crate::reconciliation::ticker_change::{SnapshotTransition, TickerChangeDetector};
use crate::utils::safe_divide;

/// Ranks a standalone quantity difference by its size relative to the actual
/// quantity: CRITICAL above 50%, HIGH above 20%, MEDIUM above 5%, else LOW.
pub fn classify_quantity_severity(calculated: Decimal, actual: Decimal) -> Severity {
    let difference = (actual - calculated).abs();
    let ratio = match safe_divide(difference, actual.abs()) {
        Some(ratio) => ratio,
        None if difference.is_zero() => return Severity::Low,
        None => return Severity::Critical,
    };

    if ratio > dec!(0.50) {
        Severity::Critical
    } else if ratio > dec!(0.20) {
        Severity::High
    } else if ratio > dec!(0.05) {
        Severity::Medium
    } else {
        Severity::Low
    }
}

fn percent(part: Decimal, whole: Decimal) -> String {
    safe_divide(part * dec!(100), whole.abs())
        .map(|p| format!("{}%", p.round_dp(DISPLAY_DECIMAL_PRECISION)))
        .unwrap_or_else(|| "n/a".to_string())
}

/// Compares calculated holdings against snapshot positions, one symbol at a
/// time. Numeric mismatches always become discrepancy records; the engine
/// keeps no state between calls.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationEngine {
    config: ReconciliationConfig,
}

impl ReconciliationEngine {
    pub fn new(config: ReconciliationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReconciliationConfig {
        &self.config
    }

    /// Ticker-change detection using this engine's match tolerance.
    pub fn detect_ticker_changes(
        &self,
        previous: &[SnapshotPosition],
        current: &[SnapshotPosition],
    ) -> SnapshotTransition {
        TickerChangeDetector::new(self.config.ticker_match_tolerance).detect(previous, current)
    }

    /// Reconciles one symbol. Fails only when one side is missing entirely.
    pub fn reconcile(
        &self,
        symbol: &str,
        calculated: Option<&CalculatedHoldings>,
        actual: Option<&SnapshotPosition>,
    ) -> Result<ReconciliationResult> {
        let calculated =
            calculated.ok_or_else(|| ReconciliationError::MissingCalculated(symbol.to_string()))?;
        let actual = actual.ok_or_else(|| ReconciliationError::MissingSnapshot(symbol.to_string()))?;
        Ok(self.compare(symbol, calculated, actual))
    }

    pub fn compare(
        &self,
        symbol: &str,
        calculated: &CalculatedHoldings,
        actual: &SnapshotPosition,
    ) -> ReconciliationResult {
        let mut discrepancies = Vec::new();
        let mut suggestions = Vec::new();

        self.check_quantity_mismatch(symbol, calculated, actual, &mut discrepancies, &mut suggestions);
        self.check_missing_history(symbol, calculated, actual, &mut discrepancies, &mut suggestions);
        self.check_unrecorded_split(symbol, calculated, actual, &mut discrepancies, &mut suggestions);
        self.check_market_value(symbol, calculated, actual, &mut discrepancies, &mut suggestions);

        for discrepancy in &discrepancies {
            debug!(
                "{} {} ({}): {}",
                symbol, discrepancy.discrepancy_type, discrepancy.severity, discrepancy.description
            );
        }
        if !discrepancies.is_empty() {
            warn!(
                "Reconciliation of {} found {} discrepancies",
                symbol,
                discrepancies.len()
            );
        }

        ReconciliationResult {
            symbol: symbol.to_string(),
            has_discrepancies: !discrepancies.is_empty(),
            discrepancies,
            resolution_suggestions: suggestions,
        }
    }

    fn check_quantity_mismatch(
        &self,
        symbol: &str,
        calculated: &CalculatedHoldings,
        actual: &SnapshotPosition,
        discrepancies: &mut Vec<Discrepancy>,
        suggestions: &mut Vec<ResolutionSuggestion>,
    ) {
        let difference = actual.quantity - calculated.quantity;
        if difference.abs() <= self.config.quantity_epsilon {
            return;
        }

        let severity =
            if difference.abs() > actual.quantity.abs() * self.config.quantity_high_threshold {
                Severity::High
            } else {
                Severity::Medium
            };

        discrepancies.push(Discrepancy {
            discrepancy_type: DiscrepancyType::QuantityMismatch,
            severity,
            calculated: calculated.quantity,
            actual: actual.quantity,
            difference,
            description: format!(
                "Transactions account for {} {} but the snapshot reports {} ({} off)",
                calculated.quantity,
                symbol,
                actual.quantity,
                percent(difference.abs(), actual.quantity)
            ),
        });

        if difference > Decimal::ZERO {
            suggestions.push(ResolutionSuggestion {
                suggestion_type: DiscrepancyType::QuantityMismatch,
                action: ResolutionAction::AddMissingTransactions,
                description: format!(
                    "Record the acquisition of the {} missing {} shares",
                    difference, symbol
                ),
                priority: severity,
            });
        } else {
            suggestions.push(ResolutionSuggestion {
                suggestion_type: DiscrepancyType::QuantityMismatch,
                action: ResolutionAction::ReviewRecordedSales,
                description: format!(
                    "The snapshot holds {} fewer {} shares; look for an unrecorded sale or a duplicated purchase",
                    difference.abs(),
                    symbol
                ),
                priority: severity,
            });
        }
    }

    fn check_missing_history(
        &self,
        symbol: &str,
        calculated: &CalculatedHoldings,
        actual: &SnapshotPosition,
        discrepancies: &mut Vec<Discrepancy>,
        suggestions: &mut Vec<ResolutionSuggestion>,
    ) {
        if calculated.quantity.abs() > self.config.quantity_epsilon
            || actual.quantity <= self.config.quantity_epsilon
        {
            return;
        }

        discrepancies.push(Discrepancy {
            discrepancy_type: DiscrepancyType::MissingTransaction,
            severity: Severity::High,
            calculated: calculated.quantity,
            actual: actual.quantity,
            difference: actual.quantity - calculated.quantity,
            description: format!(
                "The snapshot holds {} {} but no transaction opens the position",
                actual.quantity, symbol
            ),
        });
        suggestions.push(ResolutionSuggestion {
            suggestion_type: DiscrepancyType::MissingTransaction,
            action: ResolutionAction::ImportTransactionHistory,
            description: format!("Import the transaction history for {}", symbol),
            priority: Severity::High,
        });
    }

    /// Flags a quantity ratio that is a whole multiple (or fraction) such as
    /// 2x, 3x or 1/4, the signature of a split nobody recorded.
    fn check_unrecorded_split(
        &self,
        symbol: &str,
        calculated: &CalculatedHoldings,
        actual: &SnapshotPosition,
        discrepancies: &mut Vec<Discrepancy>,
        suggestions: &mut Vec<ResolutionSuggestion>,
    ) {
        if calculated.quantity <= self.config.quantity_epsilon
            || actual.quantity <= self.config.quantity_epsilon
        {
            return;
        }

        let (ratio, is_reverse) = if actual.quantity >= calculated.quantity {
            (safe_divide(actual.quantity, calculated.quantity), false)
        } else {
            (safe_divide(calculated.quantity, actual.quantity), true)
        };
        let Some(ratio) = ratio else {
            return;
        };

        let whole = ratio.round();
        if whole < dec!(2) {
            return;
        }
        let drift = safe_divide((ratio - whole).abs(), whole).unwrap_or(Decimal::ONE);
        if drift > self.config.split_detection_tolerance {
            return;
        }

        let (kind, label) = if is_reverse {
            ("reverse split", format!("1-for-{}", whole))
        } else {
            ("split", format!("{}-for-1", whole))
        };
        discrepancies.push(Discrepancy {
            discrepancy_type: DiscrepancyType::CorporateActionNeeded,
            severity: Severity::Medium,
            calculated: calculated.quantity,
            actual: actual.quantity,
            difference: actual.quantity - calculated.quantity,
            description: format!(
                "The snapshot quantity of {} matches an unrecorded {} {}",
                symbol, label, kind
            ),
        });
        suggestions.push(ResolutionSuggestion {
            suggestion_type: DiscrepancyType::CorporateActionNeeded,
            action: ResolutionAction::RecordCorporateAction,
            description: format!("Record a {} {} for {}", label, kind, symbol),
            priority: Severity::Medium,
        });
    }

    fn check_market_value(
        &self,
        symbol: &str,
        calculated: &CalculatedHoldings,
        actual: &SnapshotPosition,
        discrepancies: &mut Vec<Discrepancy>,
        suggestions: &mut Vec<ResolutionSuggestion>,
    ) {
        let computed_value = calculated.quantity * actual.price;
        let gap = actual.market_value - computed_value;
        if gap.abs() <= self.config.market_value_tolerance {
            return;
        }

        let severity = if gap.abs()
            > actual.market_value.abs() * self.config.market_value_high_threshold
        {
            Severity::High
        } else {
            Severity::Low
        };

        discrepancies.push(Discrepancy {
            discrepancy_type: DiscrepancyType::MathematicalError,
            severity,
            calculated: computed_value,
            actual: actual.market_value,
            difference: gap,
            description: format!(
                "{} x {} = {} but the snapshot reports a market value of {}",
                calculated.quantity, actual.price, computed_value, actual.market_value
            ),
        });
        suggestions.push(ResolutionSuggestion {
            suggestion_type: DiscrepancyType::MathematicalError,
            action: ResolutionAction::VerifyMarketValue,
            description: format!(
                "Verify the reported price and market value of {}",
                symbol
            ),
            priority: severity,
        });
    }

    /// Standalone quantity check ranked by the fine-grained classifier.
    pub fn check_quantity(
        &self,
        symbol: &str,
        calculated: Decimal,
        actual: Decimal,
    ) -> Option<Discrepancy> {
        let difference = actual - calculated;
        if difference.abs() <= self.config.quantity_epsilon {
            return None;
        }
        Some(Discrepancy {
            discrepancy_type: DiscrepancyType::QuantityMismatch,
            severity: classify_quantity_severity(calculated, actual),
            calculated,
            actual,
            difference,
            description: format!(
                "{} quantity {} differs from expected {} ({} off)",
                symbol,
                calculated,
                actual,
                percent(difference.abs(), actual)
            ),
        })
    }

    /// Verifies that the open lots agree with the aggregate replay. The lot
    /// ledger is authoritative, so it is the `actual` side of the record.
    pub fn check_lot_consistency(
        &self,
        symbol: &str,
        lots: &CalculatedHoldings,
        aggregate: &CalculatedHoldings,
    ) -> Option<Discrepancy> {
        let difference = lots.quantity - aggregate.quantity;
        if difference.abs() <= self.config.quantity_epsilon {
            return None;
        }
        warn!(
            "Open lots for {} hold {} shares but the aggregate replay yields {}",
            symbol, lots.quantity, aggregate.quantity
        );
        Some(Discrepancy {
            discrepancy_type: DiscrepancyType::MathematicalError,
            severity: classify_quantity_severity(aggregate.quantity, lots.quantity),
            calculated: aggregate.quantity,
            actual: lots.quantity,
            difference,
            description: format!(
                "Open lots hold {} {} but the aggregate replay yields {}",
                lots.quantity, symbol, aggregate.quantity
            ),
        })
    }
}
