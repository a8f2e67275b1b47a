/// Quantity below which a lot is considered fully consumed
pub const QUANTITY_THRESHOLD: &str = "0.00000001";

/// Tolerance used when comparing share counts across models and snapshots
pub const QUANTITY_EPSILON: &str = "0.001";

/// Decimal precision for percentages reported in descriptions
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Settings key holding the persisted lot tracking method
pub const LOT_TRACKING_METHOD_SETTING_KEY: &str = "lot_tracking_method";
