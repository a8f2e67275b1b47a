//! Transactions module - the observed history every replay starts from.

pub mod transactions_constants;
mod transactions_model;

pub use transactions_constants::*;
pub use transactions_model::*;
