//! Derived money fields. Every total shown or stored goes through here.

use crate::models::{Amount, LineItem};

/// `quantity × unit_price`. Inputs are already coerced to finite,
/// non-negative values by [`Amount`], so the result is never NaN.
pub fn line_total(quantity: Amount, unit_price: Amount) -> Amount {
    quantity * unit_price
}

/// Sum of the line totals.
pub fn invoice_total(items: &[LineItem]) -> Amount {
    items.iter().map(LineItem::total).sum()
}
