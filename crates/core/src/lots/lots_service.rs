use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::corporate_actions::SplitRatio;
use crate::errors::{LotError, Result};
use crate::lots::lot_ledger::LotLedger;
use crate::lots::lots_model::{
    DisposalOutcome, DisposalRequest, LedgerReplayResult, Lot, LotTrackingMethod, NewLot,
};
use crate::lots::lots_traits::{LotRepositoryTrait, LotServiceTrait};
use crate::reconciliation::{
    InterpolatedTransaction, ReconciliationEngine, ReconciliationResult, SnapshotPosition,
};
use crate::settings::SettingsServiceTrait;
use crate::transactions::{Transaction, TransactionCategory};

/// What a confirmed interpolation turned into: the real transaction plus the
/// lot it opened or the disposal it matched.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedInterpolation {
    pub transaction: Transaction,
    pub lot: Option<Lot>,
    pub disposal: Option<DisposalOutcome>,
}

pub struct LotService {
    lot_repository: Arc<dyn LotRepositoryTrait>,
    settings_service: Arc<dyn SettingsServiceTrait>,
    engine: ReconciliationEngine,
}

impl LotService {
    pub fn new(
        lot_repository: Arc<dyn LotRepositoryTrait>,
        settings_service: Arc<dyn SettingsServiceTrait>,
        engine: ReconciliationEngine,
    ) -> Self {
        LotService {
            lot_repository,
            settings_service,
            engine,
        }
    }

    fn load_ledger(&self, account_id: &str, symbol: &str) -> Result<LotLedger> {
        let lots = self.lot_repository.get_lots(account_id, symbol)?;
        Ok(LotLedger::from_lots(account_id, symbol, lots))
    }

    async fn save_ledger(&self, ledger: LotLedger) -> Result<Vec<Lot>> {
        let account_id = ledger.account_id.clone();
        let symbol = ledger.symbol.clone();
        let lots = ledger.into_lots();
        self.lot_repository
            .save_lots(&account_id, &symbol, lots.clone())
            .await?;
        Ok(lots)
    }

    /// Runs one disposal against a loaded ledger and rejects a shortfall
    /// unless the caller accepts a short position. The ledger is only mutated
    /// in memory; nothing is saved on rejection.
    fn match_disposal(
        &self,
        ledger: &mut LotLedger,
        request: &DisposalRequest,
        allow_short: bool,
    ) -> Result<DisposalOutcome> {
        let outcome = ledger.dispose(request)?;
        if outcome.has_shortfall() && !allow_short {
            return Err(LotError::ShortfallRejected {
                account_id: ledger.account_id.clone(),
                symbol: ledger.symbol.clone(),
                requested: outcome.requested_quantity,
                shortfall: outcome.shortfall,
            }
            .into());
        }
        Ok(outcome)
    }
}

#[async_trait]
impl LotServiceTrait for LotService {
    fn get_tracking_method(&self) -> Result<LotTrackingMethod> {
        self.settings_service.get_tracking_method()
    }

    fn get_lots(&self, account_id: &str, symbol: &str) -> Result<Vec<Lot>> {
        self.lot_repository.get_lots(account_id, symbol)
    }

    fn get_ledger(&self, account_id: &str, symbol: &str) -> Result<LotLedger> {
        self.load_ledger(account_id, symbol)
    }

    async fn dispose(
        &self,
        account_id: &str,
        symbol: &str,
        quantity: Decimal,
        lot_ids: Vec<String>,
        allow_short: bool,
    ) -> Result<DisposalOutcome> {
        let method = self.get_tracking_method()?;
        let mut ledger = self.load_ledger(account_id, symbol)?;
        let request = DisposalRequest {
            quantity,
            method,
            lot_ids,
        };

        let outcome = self.match_disposal(&mut ledger, &request, allow_short)?;
        self.save_ledger(ledger).await?;
        debug!(
            "Disposed {} {} in account {} via {} across {} lots",
            outcome.matched_quantity,
            symbol,
            account_id,
            method,
            outcome.matches.len()
        );
        Ok(outcome)
    }

    async fn rebuild_from_transactions(
        &self,
        account_id: &str,
        symbol: &str,
        transactions: &[Transaction],
    ) -> Result<LedgerReplayResult> {
        let method = self.get_tracking_method()?;
        let result = LotLedger::replay(account_id, symbol, transactions, method);
        if result.has_warnings() {
            warn!(
                "Rebuilt lots for {} in account {} with {} warnings",
                symbol,
                account_id,
                result.warnings.len()
            );
        }
        self.lot_repository
            .save_lots(account_id, symbol, result.lots.clone())
            .await?;
        Ok(result)
    }

    async fn add_manual_lot(&self, account_id: &str, new_lot: NewLot) -> Result<Lot> {
        let symbol = new_lot.symbol.trim().to_string();
        let mut ledger = self.load_ledger(account_id, &symbol)?;
        let lot = ledger.add_manual_lot(new_lot)?.clone();
        self.save_ledger(ledger).await?;
        Ok(lot)
    }

    async fn apply_split(
        &self,
        account_id: &str,
        symbol: &str,
        ratio: SplitRatio,
    ) -> Result<Vec<Lot>> {
        let mut ledger = self.load_ledger(account_id, symbol)?;
        let rescaled = ledger.apply_split(&ratio);
        debug!(
            "Split {:?} x{} rescaled {} lots of {} in account {}",
            ratio.kind, ratio.factor, rescaled, symbol, account_id
        );
        self.save_ledger(ledger).await
    }

    async fn confirm_interpolated(
        &self,
        account_id: &str,
        proposal: InterpolatedTransaction,
    ) -> Result<ConfirmedInterpolation> {
        let transaction = proposal.confirm();
        let mut ledger = self.load_ledger(account_id, &transaction.symbol)?;

        let (lot, disposal) = match transaction.category {
            TransactionCategory::Acquisition(_) => {
                let lot = ledger.open_lot_from_transaction(&transaction)?.clone();
                (Some(lot), None)
            }
            TransactionCategory::Disposition(_) => {
                let request = DisposalRequest {
                    quantity: transaction.quantity,
                    method: self.get_tracking_method()?,
                    lot_ids: transaction.lot_ids.clone(),
                };
                let outcome = self.match_disposal(&mut ledger, &request, false)?;
                (None, Some(outcome))
            }
            TransactionCategory::CorporateAction(_) => {
                ledger.apply_corporate_action(&transaction)?;
                (None, None)
            }
        };

        self.save_ledger(ledger).await?;
        debug!(
            "Confirmed interpolated {} of {} {} as transaction {}",
            transaction.category, transaction.quantity, transaction.symbol, transaction.id
        );
        Ok(ConfirmedInterpolation {
            transaction,
            lot,
            disposal,
        })
    }

    fn reconcile_lots(
        &self,
        account_id: &str,
        symbol: &str,
        snapshot: Option<&SnapshotPosition>,
    ) -> Result<ReconciliationResult> {
        let ledger = self.load_ledger(account_id, symbol)?;
        let calculated = ledger.to_calculated();
        self.engine.reconcile(symbol, Some(&calculated), snapshot)
    }
}
