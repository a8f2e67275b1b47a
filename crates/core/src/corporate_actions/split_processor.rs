use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::CalculatorError;
use crate::lots::{Lot, LotStatus};
use crate::transactions::{CorporateActionKind, Transaction, TransactionCategory};
use crate::utils::{is_quantity_significant, safe_divide};

/// Rescaling factor for a split. Forward splits multiply share counts by
/// `factor`; reverse splits divide by it. `factor` is always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitRatio {
    pub kind: CorporateActionKind,
    pub factor: Decimal,
}

impl SplitRatio {
    /// Derives the ratio from the share count before the event and the
    /// post-event total carried on the corporate action. Returns `None` when
    /// either side is non-positive.
    pub fn detect(
        kind: CorporateActionKind,
        pre_quantity: Decimal,
        post_quantity: Decimal,
    ) -> Option<SplitRatio> {
        if pre_quantity <= Decimal::ZERO || post_quantity <= Decimal::ZERO {
            return None;
        }
        let factor = match kind {
            CorporateActionKind::StockSplit => safe_divide(post_quantity, pre_quantity)?,
            CorporateActionKind::ReverseSplit => safe_divide(pre_quantity, post_quantity)?,
        };
        if factor < Decimal::ONE {
            warn!(
                "{:?} from {} to {} shares has an inverted ratio {}; the share count still moves to the post-event total",
                kind, pre_quantity, post_quantity, factor
            );
        }
        Some(SplitRatio { kind, factor })
    }

    /// A forward split of `factor`-for-1.
    pub fn forward(factor: Decimal) -> Option<SplitRatio> {
        (factor > Decimal::ZERO).then_some(SplitRatio {
            kind: CorporateActionKind::StockSplit,
            factor,
        })
    }

    /// A 1-for-`factor` reverse split.
    pub fn reverse(factor: Decimal) -> Option<SplitRatio> {
        (factor > Decimal::ZERO).then_some(SplitRatio {
            kind: CorporateActionKind::ReverseSplit,
            factor,
        })
    }

    pub fn apply(&self, quantity: Decimal) -> Decimal {
        match self.kind {
            CorporateActionKind::StockSplit => quantity * self.factor,
            CorporateActionKind::ReverseSplit => {
                safe_divide(quantity, self.factor).unwrap_or(quantity)
            }
        }
    }
}

/// Detects the split ratio of a corporate-action transaction given the running
/// share count just before it.
pub fn detect_split_ratio(
    transaction: &Transaction,
    pre_quantity: Decimal,
) -> Result<SplitRatio, CalculatorError> {
    let kind = match transaction.category {
        TransactionCategory::CorporateAction(kind) => kind,
        other => {
            return Err(CalculatorError::InvalidTransaction(format!(
                "Transaction {} is a {} and carries no split ratio",
                transaction.id, other
            )))
        }
    };

    SplitRatio::detect(kind, pre_quantity, transaction.quantity).ok_or_else(|| {
        CalculatorError::UndefinedSplitRatio {
            transaction_id: transaction.id.clone(),
            pre_quantity,
            post_quantity: transaction.quantity,
        }
    })
}

/// Rescales the share counts of every open lot. Cost basis is left untouched,
/// so cost per share moves inversely to the ratio. A lot whose remainder
/// rescales to below the quantity threshold is closed. Returns the number of
/// lots rescaled.
pub fn rescale_open_lots(lots: &mut [Lot], ratio: &SplitRatio) -> usize {
    let mut rescaled = 0;
    for lot in lots.iter_mut().filter(|lot| lot.status == LotStatus::Open) {
        lot.original_quantity = ratio.apply(lot.original_quantity);
        lot.remaining_quantity = ratio.apply(lot.remaining_quantity);
        if !is_quantity_significant(&lot.remaining_quantity) {
            lot.remaining_quantity = Decimal::ZERO;
            lot.status = LotStatus::Closed;
        }
        rescaled += 1;
    }
    debug!(
        "Applied {:?} factor {} to {} open lots",
        ratio.kind, ratio.factor, rescaled
    );
    rescaled
}
