use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Thresholds used when comparing calculated holdings with snapshots.
///
/// Missing fields fall back to their defaults when deserialized, so a host
/// only needs to persist the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconciliationConfig {
    /// Absolute share difference tolerated before a quantity mismatch (default: 0.001)
    pub quantity_epsilon: Decimal,

    /// Fraction of the snapshot quantity above which a mismatch is HIGH (default: 0.10)
    pub quantity_high_threshold: Decimal,

    /// Currency units tolerated between computed and reported market value (default: 1)
    pub market_value_tolerance: Decimal,

    /// Fraction of reported market value above which a pricing gap is HIGH (default: 0.01)
    pub market_value_high_threshold: Decimal,

    /// Relative quantity difference under which two symbols count as a rename (default: 0.01)
    pub ticker_match_tolerance: Decimal,

    /// How close a quantity ratio must be to a whole number to suggest a split (default: 0.001)
    pub split_detection_tolerance: Decimal,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            quantity_epsilon: dec!(0.001),
            quantity_high_threshold: dec!(0.10),
            market_value_tolerance: dec!(1),
            market_value_high_threshold: dec!(0.01),
            ticker_match_tolerance: dec!(0.01),
            split_detection_tolerance: dec!(0.001),
        }
    }
}

impl ReconciliationConfig {
    /// Parses a JSON document and validates the result.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ReconciliationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("quantityEpsilon", self.quantity_epsilon),
            ("marketValueTolerance", self.market_value_tolerance),
            ("tickerMatchTolerance", self.ticker_match_tolerance),
            ("splitDetectionTolerance", self.split_detection_tolerance),
        ];
        for (name, value) in non_negative {
            if value < Decimal::ZERO {
                return Err(Error::InvalidConfigValue(format!(
                    "{} must not be negative, got {}",
                    name, value
                )));
            }
        }

        let fractions = [
            ("quantityHighThreshold", self.quantity_high_threshold),
            ("marketValueHighThreshold", self.market_value_high_threshold),
        ];
        for (name, value) in fractions {
            if value <= Decimal::ZERO || value > Decimal::ONE {
                return Err(Error::InvalidConfigValue(format!(
                    "{} must be in (0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}
