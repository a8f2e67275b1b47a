//! Advisory placeholder transactions for closing a reconciliation gap.
//!
//! A proposal is never a real transaction: it carries `is_interpolated` and
//! `persisted = false`, and only [`InterpolatedTransaction::confirm`] turns it
//! into a [`Transaction`]. Nothing in this module stores anything.

use chrono::{DateTime, Utc};
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::reconciliation::reconciliation_model::{CalculatedHoldings, SnapshotPosition};
use crate::transactions::{AcquisitionAction, DispositionAction, Transaction, TransactionCategory};
use crate::utils::quantity_epsilon;

/// How much the user should trust a proposed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterpolationConfidence {
    #[default]
    Low,
    Medium,
    High,
}

/// What is known about when and how reliably a gap opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GapEstimate {
    #[serde(default)]
    pub estimated_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub confidence: Option<InterpolationConfidence>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpolationContext {
    pub symbol: String,
    pub calculated: CalculatedHoldings,
    pub actual: SnapshotPosition,
}

/// An unconfirmed transaction proposed to explain a discrepancy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpolatedTransaction {
    pub id: String,
    pub date: DateTime<Utc>,
    pub symbol: String,
    #[serde(flatten)]
    pub category: TransactionCategory,
    pub quantity: Decimal,
    pub price: Decimal,
    pub amount: Decimal,
    pub confidence: InterpolationConfidence,
    pub is_interpolated: bool,
    pub persisted: bool,
}

impl InterpolatedTransaction {
    /// The explicit confirmation step: the proposal becomes a real transaction
    /// with the same economics. Persisting it is up to the caller.
    pub fn confirm(self) -> Transaction {
        Transaction::new(
            self.id,
            self.date,
            self.symbol,
            self.category,
            self.quantity,
            self.price,
            self.amount,
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct InterpolationSynthesizer;

impl InterpolationSynthesizer {
    pub fn new() -> Self {
        InterpolationSynthesizer
    }

    /// Proposes a Buy (snapshot holds more) or Sell (snapshot holds less) for
    /// the quantity gap, priced at the snapshot price. Returns `None` when the
    /// two sides already agree.
    pub fn synthesize(
        &self,
        gap: &GapEstimate,
        context: &InterpolationContext,
    ) -> Option<InterpolatedTransaction> {
        self.synthesize_at(gap, context, Utc::now())
    }

    /// Same as [`synthesize`](Self::synthesize) with `now` used when the gap has no estimated date.
    pub fn synthesize_at(
        &self,
        gap: &GapEstimate,
        context: &InterpolationContext,
        now: DateTime<Utc>,
    ) -> Option<InterpolatedTransaction> {
        let quantity_diff = context.actual.quantity - context.calculated.quantity;
        if quantity_diff.abs() <= quantity_epsilon() {
            return None;
        }

        let category = if quantity_diff > Decimal::ZERO {
            TransactionCategory::Acquisition(AcquisitionAction::Buy)
        } else {
            TransactionCategory::Disposition(DispositionAction::Sell)
        };
        let quantity = quantity_diff.abs();
        let price = context.actual.price;

        let proposal = InterpolatedTransaction {
            id: format!("INTERP-{}", Uuid::new_v4()),
            date: gap.estimated_date.unwrap_or(now),
            symbol: context.symbol.clone(),
            category,
            quantity,
            price,
            amount: quantity * price,
            confidence: gap.confidence.unwrap_or_default(),
            is_interpolated: true,
            persisted: false,
        };
        debug!(
            "Proposed {} of {} {} at {} ({:?} confidence)",
            proposal.category, proposal.quantity, proposal.symbol, proposal.price, proposal.confidence
        );
        Some(proposal)
    }
}
