use std::collections::HashSet;

use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::reconciliation::reconciliation_model::SnapshotPosition;
use crate::utils::{is_quantity_significant, safe_divide};

/// A symbol that vanished alongside one that appeared with nearly the same quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerChangeCandidate {
    pub from_symbol: String,
    pub to_symbol: String,
    pub from_quantity: Decimal,
    pub to_quantity: Decimal,
    /// `|to - from| / from`
    pub relative_difference: Decimal,
}

/// Symbols entering and leaving the portfolio between two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotTransition {
    pub acquired: Vec<SnapshotPosition>,
    pub disposed: Vec<SnapshotPosition>,
    pub ticker_change_candidates: Vec<TickerChangeCandidate>,
}

/// Suggests renames instead of a sell/buy pair. Candidates are advisory and
/// never merge lot history on their own.
#[derive(Debug, Clone)]
pub struct TickerChangeDetector {
    tolerance: Decimal,
}

impl TickerChangeDetector {
    pub fn new(tolerance: Decimal) -> Self {
        Self { tolerance }
    }

    /// Diffs `previous` against `current`. Positions with a zero quantity count
    /// as absent. Each symbol joins at most one candidate pair, closest
    /// quantities first.
    pub fn detect(
        &self,
        previous: &[SnapshotPosition],
        current: &[SnapshotPosition],
    ) -> SnapshotTransition {
        let held = |positions: &[SnapshotPosition]| -> HashSet<String> {
            positions
                .iter()
                .filter(|p| is_quantity_significant(&p.quantity))
                .map(|p| p.symbol.to_uppercase())
                .collect()
        };
        let before = held(previous);
        let after = held(current);

        let acquired: Vec<SnapshotPosition> = current
            .iter()
            .filter(|p| is_quantity_significant(&p.quantity))
            .filter(|p| !before.contains(&p.symbol.to_uppercase()))
            .cloned()
            .collect();
        let disposed: Vec<SnapshotPosition> = previous
            .iter()
            .filter(|p| is_quantity_significant(&p.quantity))
            .filter(|p| !after.contains(&p.symbol.to_uppercase()))
            .cloned()
            .collect();

        let ticker_change_candidates = self.pair_candidates(&disposed, &acquired);

        SnapshotTransition {
            acquired,
            disposed,
            ticker_change_candidates,
        }
    }

    fn pair_candidates(
        &self,
        disposed: &[SnapshotPosition],
        acquired: &[SnapshotPosition],
    ) -> Vec<TickerChangeCandidate> {
        let mut scored: Vec<(usize, usize, Decimal)> = Vec::new();
        for (from_index, from) in disposed.iter().enumerate() {
            for (to_index, to) in acquired.iter().enumerate() {
                let Some(relative) =
                    safe_divide((to.quantity - from.quantity).abs(), from.quantity.abs())
                else {
                    continue;
                };
                if relative <= self.tolerance {
                    scored.push((from_index, to_index, relative));
                }
            }
        }
        scored.sort_by(|a, b| a.2.cmp(&b.2).then(a.0.cmp(&b.0)).then(a.1.cmp(&b.1)));

        let mut used_from = HashSet::new();
        let mut used_to = HashSet::new();
        let mut candidates = Vec::new();
        for (from_index, to_index, relative) in scored {
            if used_from.contains(&from_index) || used_to.contains(&to_index) {
                continue;
            }
            used_from.insert(from_index);
            used_to.insert(to_index);

            let from = &disposed[from_index];
            let to = &acquired[to_index];
            debug!(
                "Possible ticker change {} -> {} ({} vs {} shares)",
                from.symbol, to.symbol, from.quantity, to.quantity
            );
            candidates.push(TickerChangeCandidate {
                from_symbol: from.symbol.clone(),
                to_symbol: to.symbol.clone(),
                from_quantity: from.quantity,
                to_quantity: to.quantity,
                relative_difference: relative,
            });
        }
        candidates
    }
}

impl Default for TickerChangeDetector {
    fn default() -> Self {
        Self::new(crate::reconciliation::ReconciliationConfig::default().ticker_match_tolerance)
    }
}
