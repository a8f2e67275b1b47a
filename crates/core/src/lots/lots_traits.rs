use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::corporate_actions::SplitRatio;
use crate::errors::Result;
use crate::lots::lot_ledger::LotLedger;
use crate::lots::lots_model::{
    DisposalOutcome, LedgerReplayResult, Lot, LotTrackingMethod, NewLot,
};
use crate::lots::lots_service::ConfirmedInterpolation;
use crate::reconciliation::{InterpolatedTransaction, ReconciliationResult, SnapshotPosition};
use crate::transactions::Transaction;

/// Lot store keyed by `{account}_{symbol}`. Persistence lives outside this crate.
#[async_trait]
pub trait LotRepositoryTrait: Send + Sync {
    /// Returns the stored lots, or an empty vector when nothing is stored.
    fn get_lots(&self, account_id: &str, symbol: &str) -> Result<Vec<Lot>>;

    /// Replaces the stored lot set.
    async fn save_lots(&self, account_id: &str, symbol: &str, lots: Vec<Lot>) -> Result<()>;
}

/// Trait for lot service operations
#[async_trait]
pub trait LotServiceTrait: Send + Sync {
    fn get_tracking_method(&self) -> Result<LotTrackingMethod>;
    fn get_lots(&self, account_id: &str, symbol: &str) -> Result<Vec<Lot>>;
    fn get_ledger(&self, account_id: &str, symbol: &str) -> Result<LotLedger>;
    async fn dispose(
        &self,
        account_id: &str,
        symbol: &str,
        quantity: Decimal,
        lot_ids: Vec<String>,
        allow_short: bool,
    ) -> Result<DisposalOutcome>;
    async fn rebuild_from_transactions(
        &self,
        account_id: &str,
        symbol: &str,
        transactions: &[Transaction],
    ) -> Result<LedgerReplayResult>;
    async fn add_manual_lot(&self, account_id: &str, new_lot: NewLot) -> Result<Lot>;
    async fn apply_split(
        &self,
        account_id: &str,
        symbol: &str,
        ratio: SplitRatio,
    ) -> Result<Vec<Lot>>;
    async fn confirm_interpolated(
        &self,
        account_id: &str,
        proposal: InterpolatedTransaction,
    ) -> Result<ConfirmedInterpolation>;
    fn reconcile_lots(
        &self,
        account_id: &str,
        symbol: &str,
        snapshot: Option<&SnapshotPosition>,
    ) -> Result<ReconciliationResult>;
}
