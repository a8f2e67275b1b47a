use rust_decimal::Decimal;

use crate::constants::{QUANTITY_EPSILON, QUANTITY_THRESHOLD};

/// Threshold under which a remaining lot quantity counts as zero.
pub fn quantity_threshold() -> Decimal {
    Decimal::from_str_radix(QUANTITY_THRESHOLD, 10).unwrap_or_else(|_| Decimal::new(1, 8))
}

/// Tolerance for comparing share counts produced by different models.
pub fn quantity_epsilon() -> Decimal {
    Decimal::from_str_radix(QUANTITY_EPSILON, 10).unwrap_or_else(|_| Decimal::new(1, 3))
}

pub fn is_quantity_significant(quantity: &Decimal) -> bool {
    quantity.abs() >= quantity_threshold()
}

/// True when two quantities agree within [`quantity_epsilon`].
pub fn quantities_match(left: Decimal, right: Decimal) -> bool {
    (left - right).abs() <= quantity_epsilon()
}

/// Division that yields `None` instead of panicking on a zero divisor or overflow.
pub fn safe_divide(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    if denominator.is_zero() {
        return None;
    }
    numerator.checked_div(denominator)
}
