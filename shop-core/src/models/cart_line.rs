use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One product in the cart together with how many units are wanted.
///
/// A line with a quantity of zero is never kept; see
/// [`crate::storefront::Cart::update_quantity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: i64,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl CartLine {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        unit_price: Decimal,
        quantity: u32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            unit_price,
            quantity,
        }
    }

    /// `unit_price × quantity`, unrounded.
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}
