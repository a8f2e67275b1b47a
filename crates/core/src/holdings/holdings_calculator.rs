use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;

use crate::corporate_actions::detect_split_ratio;
use crate::holdings::holdings_model::{
    HoldingsCalculationResult, HoldingsCalculationWarning, SymbolHoldings,
};
use crate::transactions::{sort_by_date, Transaction, TransactionCategory};
use crate::utils::{is_quantity_significant, safe_divide};

/// Replays one symbol's transactions into aggregate quantity and cost basis.
///
/// Sales relieve cost basis proportionally to the shares sold, so the result
/// approximates what the lot ledger reports. The ledger is the authority for
/// lot-level cost; this view exists to compare against snapshots.
#[derive(Debug, Clone, Default)]
pub struct HoldingsCalculator;

impl HoldingsCalculator {
    pub fn new() -> Self {
        HoldingsCalculator
    }

    /// Calculates holdings of `symbol` as of the end of `target_date`.
    ///
    /// Transactions dated after the target are left out silently; undated or
    /// symbol-less rows are left out with a warning. Rows for other symbols
    /// are ignored. Input order does not matter.
    pub fn calculate(
        &self,
        symbol: &str,
        transactions: &[Transaction],
        target_date: NaiveDate,
    ) -> HoldingsCalculationResult {
        debug!("Calculating holdings for {} as of {}", symbol, target_date);

        let mut holdings = SymbolHoldings::empty(symbol, target_date);
        let mut applied_transactions = Vec::new();
        let mut warnings = Vec::new();

        for transaction in sort_by_date(transactions) {
            if transaction.has_symbol() && !transaction.matches_symbol(symbol) {
                continue;
            }
            if let Err(e) = transaction.validate() {
                push_warning(&mut warnings, &transaction, symbol, format!("Skipped: {}", e));
                continue;
            }
            match transaction.effective_date() {
                Some(date) if date <= target_date => {}
                _ => {
                    debug!(
                        "Transaction {} is after {} and is not applied",
                        transaction.id, target_date
                    );
                    continue;
                }
            }

            let applied = match transaction.category {
                TransactionCategory::Acquisition(_) => {
                    self.handle_acquisition(&transaction, &mut holdings, &mut warnings)
                }
                TransactionCategory::Disposition(_) => {
                    self.handle_disposition(&transaction, &mut holdings, &mut warnings)
                }
                TransactionCategory::CorporateAction(_) => {
                    self.handle_corporate_action(&transaction, &mut holdings, &mut warnings)
                }
            };
            if applied {
                applied_transactions.push(transaction);
            }
        }

        holdings.average_cost_per_share =
            if holdings.quantity > Decimal::ZERO && is_quantity_significant(&holdings.quantity) {
                safe_divide(holdings.total_cost_basis, holdings.quantity).unwrap_or(Decimal::ZERO)
            } else {
                Decimal::ZERO
            };

        HoldingsCalculationResult {
            holdings,
            applied_transactions,
            warnings,
        }
    }

    // --- Category handlers ---

    fn handle_acquisition(
        &self,
        transaction: &Transaction,
        holdings: &mut SymbolHoldings,
        warnings: &mut Vec<HoldingsCalculationWarning>,
    ) -> bool {
        if transaction.quantity <= Decimal::ZERO {
            push_warning(
                warnings,
                transaction,
                &holdings.symbol,
                format!(
                    "Acquisition with non-positive quantity {} skipped",
                    transaction.quantity
                ),
            );
            return false;
        }

        holdings.quantity += transaction.quantity;
        holdings.total_cost_basis += transaction.amount.abs();

        if let Some(date) = transaction.date {
            holdings.earliest_acquisition_date = Some(match holdings.earliest_acquisition_date {
                Some(existing) => existing.min(date),
                None => date,
            });
        }
        true
    }

    fn handle_disposition(
        &self,
        transaction: &Transaction,
        holdings: &mut SymbolHoldings,
        warnings: &mut Vec<HoldingsCalculationWarning>,
    ) -> bool {
        if transaction.quantity <= Decimal::ZERO {
            push_warning(
                warnings,
                transaction,
                &holdings.symbol,
                format!(
                    "Disposition with non-positive quantity {} skipped",
                    transaction.quantity
                ),
            );
            return false;
        }

        let shares_before = holdings.quantity;
        holdings.quantity -= transaction.quantity;

        if holdings.quantity >= Decimal::ZERO {
            // Zero shares before the sale leaves cost basis untouched.
            if let Some(fraction_sold) = safe_divide(transaction.quantity, shares_before) {
                holdings.total_cost_basis -= holdings.total_cost_basis * fraction_sold;
            }
        } else {
            push_warning(
                warnings,
                transaction,
                &holdings.symbol,
                format!(
                    "Sold {} with only {} held; position is short and cost basis was not reduced",
                    transaction.quantity, shares_before
                ),
            );
        }
        true
    }

    fn handle_corporate_action(
        &self,
        transaction: &Transaction,
        holdings: &mut SymbolHoldings,
        warnings: &mut Vec<HoldingsCalculationWarning>,
    ) -> bool {
        match detect_split_ratio(transaction, holdings.quantity) {
            Ok(ratio) => {
                holdings.quantity = ratio.apply(holdings.quantity);
                true
            }
            Err(e) => {
                push_warning(warnings, transaction, &holdings.symbol, format!("Skipped: {}", e));
                false
            }
        }
    }
}

fn push_warning(
    warnings: &mut Vec<HoldingsCalculationWarning>,
    transaction: &Transaction,
    symbol: &str,
    message: String,
) {
    let warning = HoldingsCalculationWarning {
        transaction_id: transaction.id.clone(),
        symbol: symbol.to_string(),
        date: transaction.effective_date(),
        message,
    };
    warn!("{}", warning);
    warnings.push(warning);
}
