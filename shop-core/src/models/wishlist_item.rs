use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CartLine;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistItem {
    pub id: i64,
    pub name: String,
    pub unit_price: Decimal,
}

impl WishlistItem {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        unit_price: Decimal,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            unit_price,
        }
    }
}

impl From<&CartLine> for WishlistItem {
    fn from(line: &CartLine) -> Self {
        Self::new(line.id, line.name.clone(), line.unit_price)
    }
}
