//! Core error types for the lot accounting engine.
//!
//! Numeric mismatches are never errors here: they surface as warnings on
//! calculation results or as discrepancy records. Only structurally invalid
//! input and explicit lot-selection failures are reported through [`Error`].

use rust_decimal::Decimal;
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Holdings calculation failed: {0}")]
    Calculation(#[from] CalculatorError),

    #[error("Lot operation failed: {0}")]
    Lot(#[from] LotError),

    #[error("Reconciliation failed: {0}")]
    Reconciliation(#[from] ReconciliationError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Errors raised while replaying transactions into holdings.
#[derive(Error, Debug)]
pub enum CalculatorError {
    #[error("Invalid transaction data: {0}")]
    InvalidTransaction(String),

    #[error("Split ratio is undefined for transaction {transaction_id}: pre-event quantity {pre_quantity}, post-event quantity {post_quantity}")]
    UndefinedSplitRatio {
        transaction_id: String,
        pre_quantity: Decimal,
        post_quantity: Decimal,
    },
}

/// Errors raised by the lot ledger during disposal matching and lot maintenance.
#[derive(Error, Debug, PartialEq)]
pub enum LotError {
    #[error("Specific identification disposal of {quantity} {symbol} requires at least one lot id")]
    MissingLotSelection { symbol: String, quantity: Decimal },

    #[error("Lot not found: Lot ID {lot_id}")]
    LotNotFound { lot_id: String },

    #[error("Lot {lot_id} is closed and cannot absorb a disposal")]
    LotClosed { lot_id: String },

    #[error("Selected lots hold {available} {symbol} but {requested} were requested")]
    InsufficientSelectedQuantity {
        symbol: String,
        requested: Decimal,
        available: Decimal,
    },

    #[error("Insufficient lots for {symbol} in account {account_id}: {shortfall} of {requested} could not be matched")]
    ShortfallRejected {
        account_id: String,
        symbol: String,
        requested: Decimal,
        shortfall: Decimal,
    },

    #[error("Invalid lot: {0}")]
    InvalidLot(String),
}

/// Structural errors of the reconciliation engine.
#[derive(Error, Debug, PartialEq)]
pub enum ReconciliationError {
    #[error("No calculated holdings supplied for {0}")]
    MissingCalculated(String),

    #[error("No snapshot position supplied for {0}")]
    MissingSnapshot(String),
}

/// Validation errors for user input and data parsing.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Unknown transaction action label: '{0}'")]
    UnknownActionLabel(String),

    #[error("Unknown lot tracking method: '{0}'")]
    UnknownTrackingMethod(String),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),
}

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
