//! Lots module - tax lots, disposal matching and the service that persists them.

mod lot_ledger;
mod lots_model;
mod lots_service;
mod lots_traits;

pub use lot_ledger::LotLedger;
pub use lots_model::*;
pub use lots_service::{ConfirmedInterpolation, LotService};
pub use lots_traits::{LotRepositoryTrait, LotServiceTrait};


#[cfg(test)]
mod lots_service_tests;
