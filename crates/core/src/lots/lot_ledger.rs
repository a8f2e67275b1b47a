use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::corporate_actions::{detect_split_ratio, rescale_open_lots, SplitRatio};
use crate::errors::{LotError, Result, ValidationError};
use crate::lots::lots_model::{
    DisposalOutcome, DisposalRequest, LedgerReplayResult, LedgerWarning, Lot, LotMatch,
    LotStatus, LotTrackingMethod, NewLot,
};
use crate::reconciliation::CalculatedHoldings;
use crate::transactions::{sort_by_date, Transaction, TransactionCategory};
use crate::utils::{is_quantity_significant, quantity_threshold, safe_divide};

/// The open and closed lots of one account+symbol pair.
///
/// Lots are kept in insertion order; each disposal derives its own ordering
/// from the method it is given, so changing methods between disposals never
/// reorders or rewrites earlier matches. The ledger does no locking: callers
/// must serialize mutations of the same lot set.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LotLedger {
    pub account_id: String,
    pub symbol: String,
    lots: Vec<Lot>,
}

impl LotLedger {
    pub fn new(account_id: impl Into<String>, symbol: impl Into<String>) -> Self {
        LotLedger {
            account_id: account_id.into(),
            symbol: symbol.into(),
            lots: Vec::new(),
        }
    }

    /// Wraps a lot set loaded from the lot store.
    pub fn from_lots(
        account_id: impl Into<String>,
        symbol: impl Into<String>,
        lots: Vec<Lot>,
    ) -> Self {
        let ledger = LotLedger {
            account_id: account_id.into(),
            symbol: symbol.into(),
            lots,
        };
        for lot in ledger.lots.iter().filter(|l| l.symbol != ledger.symbol) {
            warn!(
                "Lot {} belongs to {} but was loaded into the {} ledger",
                lot.id, lot.symbol, ledger.symbol
            );
        }
        ledger
    }

    pub fn lots(&self) -> &[Lot] {
        &self.lots
    }

    pub fn into_lots(self) -> Vec<Lot> {
        self.lots
    }

    pub fn open_lots(&self) -> impl Iterator<Item = &Lot> {
        self.lots.iter().filter(|lot| lot.is_open())
    }

    pub fn find_lot(&self, lot_id: &str) -> Option<&Lot> {
        self.lots.iter().find(|lot| lot.id == lot_id)
    }

    // --- Lot creation ---

    /// Opens a lot for an acquisition transaction. The lot id is derived from
    /// the transaction id and its cost basis is the absolute transaction amount.
    pub fn open_lot_from_transaction(&mut self, transaction: &Transaction) -> Result<&Lot> {
        if !transaction.category.is_acquisition() {
            return Err(LotError::InvalidLot(format!(
                "Transaction {} is a {} and cannot open a lot",
                transaction.id, transaction.category
            ))
            .into());
        }
        transaction.validate()?;
        let acquisition_date = transaction
            .date
            .ok_or_else(|| ValidationError::MissingField("date".to_string()))?;
        if !transaction.matches_symbol(&self.symbol) {
            return Err(LotError::InvalidLot(format!(
                "Transaction {} is for {} but this ledger tracks {}",
                transaction.id, transaction.symbol, self.symbol
            ))
            .into());
        }
        if transaction.quantity <= Decimal::ZERO {
            return Err(LotError::InvalidLot(format!(
                "Transaction {} has non-positive quantity {}",
                transaction.id, transaction.quantity
            ))
            .into());
        }

        let lot_id = self.next_lot_id(&transaction.id);
        let lot = Lot {
            id: lot_id,
            symbol: self.symbol.clone(),
            account_id: self.account_id.clone(),
            acquisition_date,
            original_quantity: transaction.quantity,
            remaining_quantity: transaction.quantity,
            cost_basis: transaction.amount.abs(),
            status: LotStatus::Open,
            is_transaction_derived: true,
            source_transaction_id: Some(transaction.id.clone()),
        };
        debug!(
            "Opened lot {} for {} {} at cost {}",
            lot.id, lot.original_quantity, lot.symbol, lot.cost_basis
        );
        Ok(self.push_lot(lot))
    }

    /// Adds a manually entered lot.
    pub fn add_manual_lot(&mut self, new_lot: NewLot) -> Result<&Lot> {
        if !new_lot.symbol.trim().eq_ignore_ascii_case(self.symbol.trim()) {
            return Err(LotError::InvalidLot(format!(
                "Manual lot for {} cannot be added to the {} ledger",
                new_lot.symbol, self.symbol
            ))
            .into());
        }
        if new_lot.quantity <= Decimal::ZERO {
            return Err(LotError::InvalidLot(format!(
                "Manual lot quantity must be positive, got {}",
                new_lot.quantity
            ))
            .into());
        }
        if new_lot.cost_basis < Decimal::ZERO {
            return Err(LotError::InvalidLot(format!(
                "Manual lot cost basis must not be negative, got {}",
                new_lot.cost_basis
            ))
            .into());
        }

        let lot = Lot {
            id: Uuid::new_v4().to_string(),
            symbol: self.symbol.clone(),
            account_id: self.account_id.clone(),
            acquisition_date: new_lot.acquisition_date,
            original_quantity: new_lot.quantity,
            remaining_quantity: new_lot.quantity,
            cost_basis: new_lot.cost_basis,
            status: LotStatus::Open,
            is_transaction_derived: false,
            source_transaction_id: None,
        };
        Ok(self.push_lot(lot))
    }

    /// `LOT-{txId}`, suffixed `-2`, `-3`, ... when acquisitions share an id.
    fn next_lot_id(&self, transaction_id: &str) -> String {
        let base = format!("LOT-{}", transaction_id);
        if self.find_lot(&base).is_none() {
            return base;
        }
        let mut suffix = 2;
        loop {
            let candidate = format!("{}-{}", base, suffix);
            if self.find_lot(&candidate).is_none() {
                warn!(
                    "Transaction id {} is not unique in {}; opening lot {}",
                    transaction_id, self.symbol, candidate
                );
                return candidate;
            }
            suffix += 1;
        }
    }

    fn push_lot(&mut self, lot: Lot) -> &Lot {
        self.lots.push(lot);
        let index = self.lots.len() - 1;
        &self.lots[index]
    }

    // --- Disposal matching ---

    /// Matches a disposal against open lots.
    ///
    /// FIFO and LIFO consume as much as is open and report the remainder as a
    /// shortfall. Specific identification fails without touching any lot when
    /// no lot is named, a named lot is unknown or closed, or the named lots
    /// cannot cover the request.
    pub fn dispose(&mut self, request: &DisposalRequest) -> Result<DisposalOutcome> {
        if request.quantity <= Decimal::ZERO {
            return Err(ValidationError::InvalidInput(format!(
                "Disposal quantity must be positive, got {}",
                request.quantity
            ))
            .into());
        }

        let order = match request.method {
            LotTrackingMethod::Fifo => self.open_indices_by_date(false),
            LotTrackingMethod::Lifo => self.open_indices_by_date(true),
            LotTrackingMethod::SpecificId => self.selected_indices(request)?,
        };

        let mut to_match = request.quantity;
        let mut matches = Vec::new();
        let mut matched_quantity = Decimal::ZERO;
        let mut cost_basis_relieved = Decimal::ZERO;

        for index in order {
            if to_match <= Decimal::ZERO {
                break;
            }
            let lot = &mut self.lots[index];
            let (taken, relieved) = lot.consume(to_match);
            if taken.is_zero() {
                continue;
            }
            to_match -= taken;
            matched_quantity += taken;
            cost_basis_relieved += relieved;
            matches.push(LotMatch {
                lot_id: lot.id.clone(),
                quantity: taken,
                cost_basis_relieved: relieved,
                lot_closed: lot.status == LotStatus::Closed,
            });
        }

        let shortfall = (request.quantity - matched_quantity).max(Decimal::ZERO);
        let outcome = DisposalOutcome {
            symbol: self.symbol.clone(),
            method: request.method,
            requested_quantity: request.quantity,
            matched_quantity,
            shortfall,
            cost_basis_relieved,
            matches,
        };

        if outcome.has_shortfall() {
            warn!(
                "Insufficient lots for {} in account {}: matched {} of {} ({} short)",
                self.symbol, self.account_id, matched_quantity, request.quantity, shortfall
            );
        }
        Ok(outcome)
    }

    /// Indices of open lots ordered by acquisition date, oldest first unless
    /// `newest_first`. Equal dates keep insertion order (reversed for LIFO).
    fn open_indices_by_date(&self, newest_first: bool) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .lots
            .iter()
            .enumerate()
            .filter(|(_, lot)| lot.is_open())
            .map(|(index, _)| index)
            .collect();
        indices.sort_by_key(|&index| self.lots[index].acquisition_date);
        if newest_first {
            indices.reverse();
        }
        indices
    }

    fn selected_indices(&self, request: &DisposalRequest) -> Result<Vec<usize>> {
        if request.lot_ids.is_empty() {
            return Err(LotError::MissingLotSelection {
                symbol: self.symbol.clone(),
                quantity: request.quantity,
            }
            .into());
        }

        let mut indices: Vec<usize> = Vec::with_capacity(request.lot_ids.len());
        for lot_id in &request.lot_ids {
            let index = self
                .lots
                .iter()
                .position(|lot| &lot.id == lot_id)
                .ok_or_else(|| LotError::LotNotFound {
                    lot_id: lot_id.clone(),
                })?;
            if !self.lots[index].is_open() {
                return Err(LotError::LotClosed {
                    lot_id: lot_id.clone(),
                }
                .into());
            }
            if !indices.contains(&index) {
                indices.push(index);
            }
        }

        let available: Decimal = indices
            .iter()
            .map(|&index| self.lots[index].remaining_quantity)
            .sum();
        if request.quantity - available >= quantity_threshold() {
            return Err(LotError::InsufficientSelectedQuantity {
                symbol: self.symbol.clone(),
                requested: request.quantity,
                available,
            }
            .into());
        }
        Ok(indices)
    }

    // --- Corporate actions ---

    /// Rescales every open lot by the ratio. Returns how many lots changed.
    pub fn apply_split(&mut self, ratio: &SplitRatio) -> usize {
        rescale_open_lots(&mut self.lots, ratio)
    }

    /// Detects the ratio of a corporate action against the current open
    /// quantity and applies it.
    pub fn apply_corporate_action(&mut self, transaction: &Transaction) -> Result<SplitRatio> {
        let ratio = detect_split_ratio(transaction, self.total_open_quantity())?;
        self.apply_split(&ratio);
        Ok(ratio)
    }

    // --- Replay ---

    /// Builds the lot set for one account+symbol from a full transaction
    /// history. Rows that cannot be applied become warnings; the replay never
    /// stops early.
    pub fn replay(
        account_id: impl Into<String>,
        symbol: impl Into<String>,
        transactions: &[Transaction],
        method: LotTrackingMethod,
    ) -> LedgerReplayResult {
        let mut ledger = LotLedger::new(account_id, symbol);
        let mut disposals = Vec::new();
        let mut splits_applied = 0;
        let mut warnings = Vec::new();

        for transaction in sort_by_date(transactions) {
            if transaction.has_symbol() && !transaction.matches_symbol(&ledger.symbol) {
                continue;
            }
            if let Err(e) = transaction.validate() {
                ledger.push_warning(&mut warnings, &transaction, format!("Skipped: {}", e));
                continue;
            }

            match transaction.category {
                TransactionCategory::Acquisition(_) => {
                    if let Err(e) = ledger.open_lot_from_transaction(&transaction).map(|_| ()) {
                        ledger.push_warning(&mut warnings, &transaction, e.to_string());
                    }
                }
                TransactionCategory::Disposition(_) => {
                    let request = DisposalRequest {
                        quantity: transaction.quantity,
                        method,
                        lot_ids: transaction.lot_ids.clone(),
                    };
                    match ledger.dispose(&request) {
                        Ok(outcome) => {
                            if outcome.has_shortfall() {
                                ledger.push_warning(
                                    &mut warnings,
                                    &transaction,
                                    format!(
                                        "Insufficient lots: {} of {} could not be matched",
                                        outcome.shortfall, outcome.requested_quantity
                                    ),
                                );
                            }
                            disposals.push(outcome);
                        }
                        Err(e) => ledger.push_warning(&mut warnings, &transaction, e.to_string()),
                    }
                }
                TransactionCategory::CorporateAction(_) => {
                    match ledger.apply_corporate_action(&transaction) {
                        Ok(_) => splits_applied += 1,
                        Err(e) => ledger.push_warning(&mut warnings, &transaction, e.to_string()),
                    }
                }
            }
        }

        LedgerReplayResult {
            lots: ledger.into_lots(),
            disposals,
            splits_applied,
            warnings,
        }
    }

    fn push_warning(
        &self,
        warnings: &mut Vec<LedgerWarning>,
        transaction: &Transaction,
        message: String,
    ) {
        let warning = LedgerWarning {
            transaction_id: transaction.id.clone(),
            symbol: self.symbol.clone(),
            date: transaction.effective_date(),
            message,
        };
        warn!("{}", warning);
        warnings.push(warning);
    }

    // --- Aggregates ---

    pub fn total_open_quantity(&self) -> Decimal {
        self.open_lots().map(|lot| lot.remaining_quantity).sum()
    }

    pub fn total_allocated_cost(&self) -> Decimal {
        self.open_lots().map(|lot| lot.allocated_cost()).sum()
    }

    /// `Σ costBasis / Σ originalQuantity` over open lots; zero when nothing is open.
    pub fn weighted_average_cost(&self) -> Decimal {
        let cost: Decimal = self.open_lots().map(|lot| lot.cost_basis).sum();
        let quantity: Decimal = self.open_lots().map(|lot| lot.original_quantity).sum();
        safe_divide(cost, quantity).unwrap_or(Decimal::ZERO)
    }

    pub fn unrealized_gain_loss(&self, current_price: Decimal) -> Decimal {
        self.open_lots()
            .map(|lot| lot.unrealized_gain_loss(current_price))
            .sum()
    }

    /// Aggregate view of the open lots, comparable with a snapshot position.
    pub fn to_calculated(&self) -> CalculatedHoldings {
        let quantity = self.total_open_quantity();
        let total_cost_basis = self.total_allocated_cost();
        let average_cost_per_share = if quantity > Decimal::ZERO && is_quantity_significant(&quantity)
        {
            safe_divide(total_cost_basis, quantity).unwrap_or(Decimal::ZERO)
        } else {
            Decimal::ZERO
        };
        CalculatedHoldings {
            quantity,
            total_cost_basis,
            average_cost_per_share,
        }
    }
}
