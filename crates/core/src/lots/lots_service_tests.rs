//! Unit tests for the lot service.

use super::*;
use crate::constants::LOT_TRACKING_METHOD_SETTING_KEY;
use crate::corporate_actions::SplitRatio;
use crate::errors::{Error, LotError, ReconciliationError, Result, ValidationError};
use crate::reconciliation::{
    CalculatedHoldings, DiscrepancyType, GapEstimate, InterpolationContext,
    InterpolationSynthesizer, ReconciliationEngine, SnapshotPosition,
};
use crate::settings::{SettingsRepositoryTrait, SettingsService};
use crate::transactions::{
    AcquisitionAction, DispositionAction, Transaction, TransactionCategory,
};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

// ============================================================================
// Mock Implementations
// ============================================================================

#[derive(Default)]
struct MockLotRepository {
    lots: RwLock<HashMap<String, Vec<Lot>>>,
    saves: RwLock<usize>,
}

impl MockLotRepository {
    fn save_count(&self) -> usize {
        *self.saves.read().unwrap()
    }
}

#[async_trait]
impl LotRepositoryTrait for MockLotRepository {
    fn get_lots(&self, account_id: &str, symbol: &str) -> Result<Vec<Lot>> {
        Ok(self
            .lots
            .read()
            .unwrap()
            .get(&lot_store_key(account_id, symbol))
            .cloned()
            .unwrap_or_default())
    }

    async fn save_lots(&self, account_id: &str, symbol: &str, lots: Vec<Lot>) -> Result<()> {
        self.lots
            .write()
            .unwrap()
            .insert(lot_store_key(account_id, symbol), lots);
        *self.saves.write().unwrap() += 1;
        Ok(())
    }
}

#[derive(Default)]
struct MockSettingsRepository {
    values: RwLock<HashMap<String, String>>,
}

#[async_trait]
impl SettingsRepositoryTrait for MockSettingsRepository {
    fn get_setting(&self, setting_key: &str) -> Result<Option<String>> {
        Ok(self.values.read().unwrap().get(setting_key).cloned())
    }

    async fn update_setting(&self, setting_key: &str, setting_value: &str) -> Result<()> {
        self.values
            .write()
            .unwrap()
            .insert(setting_key.to_string(), setting_value.to_string());
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn setup(method: Option<&str>) -> (LotService, Arc<MockLotRepository>) {
    let settings_repository = Arc::new(MockSettingsRepository::default());
    if let Some(method) = method {
        settings_repository
            .values
            .write()
            .unwrap()
            .insert(LOT_TRACKING_METHOD_SETTING_KEY.to_string(), method.to_string());
    }
    let lot_repository = Arc::new(MockLotRepository::default());
    let service = LotService::new(
        lot_repository.clone(),
        Arc::new(SettingsService::new(settings_repository)),
        ReconciliationEngine::default(),
    );
    (service, lot_repository)
}

fn history() -> Vec<Transaction> {
    vec![
        Transaction::new(
            "b1",
            date(2024, 1, 1),
            "AAPL",
            TransactionCategory::Acquisition(AcquisitionAction::Buy),
            dec!(10),
            dec!(10),
            dec!(100),
        ),
        Transaction::new(
            "b2",
            date(2024, 2, 1),
            "AAPL",
            TransactionCategory::Acquisition(AcquisitionAction::Reinvestment),
            dec!(10),
            dec!(20),
            dec!(200),
        ),
    ]
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_rebuild_saves_replayed_lots() {
    let (service, repository) = setup(None);
    let result = service
        .rebuild_from_transactions("acc-1", "AAPL", &history())
        .await
        .unwrap();

    assert_eq!(result.lots.len(), 2);
    assert_eq!(repository.save_count(), 1);
    assert_eq!(service.get_lots("acc-1", "AAPL").unwrap(), result.lots);
    assert!(service.get_lots("acc-2", "AAPL").unwrap().is_empty());
}

#[tokio::test]
async fn test_dispose_uses_persisted_method() {
    let (service, _) = setup(Some("LIFO"));
    service
        .rebuild_from_transactions("acc-1", "AAPL", &history())
        .await
        .unwrap();

    let outcome = service
        .dispose("acc-1", "AAPL", dec!(4), vec![], false)
        .await
        .unwrap();
    assert_eq!(outcome.method, LotTrackingMethod::Lifo);
    assert_eq!(outcome.matches[0].lot_id, "LOT-b2");

    let ledger = service.get_ledger("acc-1", "AAPL").unwrap();
    assert_eq!(ledger.find_lot("LOT-b2").unwrap().remaining_quantity, dec!(6));
}

#[tokio::test]
async fn test_dispose_rejects_shortfall_unless_allowed() {
    let (service, repository) = setup(None);
    service
        .rebuild_from_transactions("acc-1", "AAPL", &history())
        .await
        .unwrap();

    let err = service
        .dispose("acc-1", "AAPL", dec!(25), vec![], false)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Lot(LotError::ShortfallRejected { shortfall, .. }) if shortfall == dec!(5)
    ));
    assert_eq!(repository.save_count(), 1);
    assert_eq!(
        service.get_ledger("acc-1", "AAPL").unwrap().total_open_quantity(),
        dec!(20)
    );

    let outcome = service
        .dispose("acc-1", "AAPL", dec!(25), vec![], true)
        .await
        .unwrap();
    assert_eq!(outcome.shortfall, dec!(5));
    assert!(service.get_ledger("acc-1", "AAPL").unwrap().open_lots().next().is_none());
}

#[tokio::test]
async fn test_specific_id_dispose_requires_lot_ids() {
    let (service, _) = setup(Some("SPECIFIC_ID"));
    service
        .rebuild_from_transactions("acc-1", "AAPL", &history())
        .await
        .unwrap();

    let err = service
        .dispose("acc-1", "AAPL", dec!(2), vec![], false)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Lot(LotError::MissingLotSelection { .. })));

    let outcome = service
        .dispose("acc-1", "AAPL", dec!(2), vec!["LOT-b1".to_string()], false)
        .await
        .unwrap();
    assert_eq!(outcome.cost_basis_relieved, dec!(20));
}

#[tokio::test]
async fn test_unreadable_tracking_method_fails_dispose() {
    let (service, _) = setup(Some("HIFO"));
    let err = service
        .dispose("acc-1", "AAPL", dec!(1), vec![], true)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::UnknownTrackingMethod(_))
    ));
}

#[tokio::test]
async fn test_manual_lot_and_split_are_persisted() {
    let (service, _) = setup(None);
    let lot = service
        .add_manual_lot(
            "acc-1",
            NewLot {
                symbol: "AAPL".to_string(),
                acquisition_date: date(2019, 3, 1),
                quantity: dec!(10),
                cost_basis: dec!(1000),
            },
        )
        .await
        .unwrap();
    assert!(!lot.is_transaction_derived);

    let lots = service
        .apply_split("acc-1", "AAPL", SplitRatio::forward(dec!(2)).unwrap())
        .await
        .unwrap();
    assert_eq!(lots[0].remaining_quantity, dec!(20));
    assert_eq!(lots[0].cost_basis, dec!(1000));
    assert_eq!(lots[0].cost_per_share(), dec!(50));
    assert_eq!(service.get_lots("acc-1", "AAPL").unwrap(), lots);
}

#[tokio::test]
async fn test_confirmed_buy_opens_lot() {
    let (service, _) = setup(None);
    service
        .rebuild_from_transactions("acc-1", "AAPL", &history())
        .await
        .unwrap();

    let context = InterpolationContext {
        symbol: "AAPL".to_string(),
        calculated: service.get_ledger("acc-1", "AAPL").unwrap().to_calculated(),
        actual: SnapshotPosition {
            symbol: "AAPL".to_string(),
            quantity: dec!(25),
            market_value: dec!(750),
            price: dec!(30),
        },
    };
    let gap = GapEstimate {
        estimated_date: Some(date(2024, 3, 1)),
        confidence: None,
    };
    let proposal = InterpolationSynthesizer::new()
        .synthesize(&gap, &context)
        .unwrap();
    assert_eq!(service.get_lots("acc-1", "AAPL").unwrap().len(), 2);

    let confirmed = service.confirm_interpolated("acc-1", proposal).await.unwrap();
    let lot = confirmed.lot.expect("lot opened");
    assert_eq!(lot.original_quantity, dec!(5));
    assert_eq!(lot.cost_basis, dec!(150));
    assert_eq!(
        confirmed.transaction.category,
        TransactionCategory::Acquisition(AcquisitionAction::Buy)
    );
    assert!(confirmed.disposal.is_none());

    let result = service
        .reconcile_lots("acc-1", "AAPL", Some(&context.actual))
        .unwrap();
    assert!(result.find(DiscrepancyType::QuantityMismatch).is_none());
}

#[tokio::test]
async fn test_confirmed_sell_disposes() {
    let (service, _) = setup(None);
    service
        .rebuild_from_transactions("acc-1", "AAPL", &history())
        .await
        .unwrap();

    let context = InterpolationContext {
        symbol: "AAPL".to_string(),
        calculated: CalculatedHoldings {
            quantity: dec!(20),
            ..CalculatedHoldings::default()
        },
        actual: SnapshotPosition {
            symbol: "AAPL".to_string(),
            quantity: dec!(16),
            market_value: dec!(320),
            price: dec!(20),
        },
    };
    let proposal = InterpolationSynthesizer::new()
        .synthesize(&GapEstimate::default(), &context)
        .unwrap();

    let confirmed = service.confirm_interpolated("acc-1", proposal).await.unwrap();
    assert_eq!(
        confirmed.transaction.category,
        TransactionCategory::Disposition(DispositionAction::Sell)
    );
    let disposal = confirmed.disposal.expect("disposal matched");
    assert_eq!(disposal.matched_quantity, dec!(4));
    assert_eq!(disposal.matches[0].lot_id, "LOT-b1");
    assert!(confirmed.lot.is_none());
    assert_eq!(
        service.get_ledger("acc-1", "AAPL").unwrap().total_open_quantity(),
        dec!(16)
    );
}

#[tokio::test]
async fn test_reconcile_lots_against_snapshot() {
    let (service, _) = setup(None);
    service
        .rebuild_from_transactions("acc-1", "AAPL", &history())
        .await
        .unwrap();

    let snapshot = SnapshotPosition {
        symbol: "AAPL".to_string(),
        quantity: dec!(21),
        market_value: dec!(420),
        price: dec!(20),
    };
    let result = service
        .reconcile_lots("acc-1", "AAPL", Some(&snapshot))
        .unwrap();
    let mismatch = result.find(DiscrepancyType::QuantityMismatch).unwrap();
    assert_eq!(mismatch.calculated, dec!(20));
    assert_eq!(mismatch.difference, dec!(1));

    let err = service.reconcile_lots("acc-1", "AAPL", None).unwrap_err();
    assert!(matches!(
        err,
        Error::Reconciliation(ReconciliationError::MissingSnapshot(_))
    ));
    assert_eq!(service.get_tracking_method().unwrap(), LotTrackingMethod::Fifo);
}
