//! Line item model for invoicing-service.

use serde::{Deserialize, Serialize};

use super::Amount;
use crate::totals::line_total;

/// One billable row on an invoice.
///
/// `total` is derived from quantity and unit price and is only ever written
/// through [`LineItem::recompute`]; whatever a client sends for it is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_quantity")]
    pub quantity: Amount,
    #[serde(default, alias = "price")]
    pub unit_price: Amount,
    #[serde(default)]
    total: Amount,
}

fn default_quantity() -> Amount {
    Amount::from(1)
}

impl Default for LineItem {
    fn default() -> Self {
        Self::new(String::new(), default_quantity(), Amount::ZERO)
    }
}

impl LineItem {
    pub fn new(description: String, quantity: Amount, unit_price: Amount) -> Self {
        let mut item = Self {
            description,
            quantity,
            unit_price,
            total: Amount::ZERO,
        };
        item.recompute();
        item
    }

    pub fn total(&self) -> Amount {
        self.total
    }

    /// Returns true when the stored total disagreed with quantity × price.
    pub fn recompute(&mut self) -> bool {
        let expected = line_total(self.quantity, self.unit_price);
        let drifted = expected != self.total;
        self.total = expected;
        drifted
    }
}

/// Partial edit of a line item; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemPatch {
    pub description: Option<String>,
    pub quantity: Option<Amount>,
    #[serde(alias = "price")]
    pub unit_price: Option<Amount>,
}

impl LineItemPatch {
    pub(crate) fn apply(self, item: &mut LineItem) {
        if let Some(description) = self.description {
            item.description = description;
        }
        if let Some(quantity) = self.quantity {
            item.quantity = quantity;
        }
        if let Some(unit_price) = self.unit_price {
            item.unit_price = unit_price;
        }
        item.recompute();
    }
}
