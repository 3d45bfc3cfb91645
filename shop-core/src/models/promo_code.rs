use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A discount code that has already been accepted by a promo validator.
///
/// The wire shape matches the validation endpoint's response
/// (`{"code": "SAVE10", "discountPercentage": 10}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoCode {
    pub code: String,
    /// Percentage in `[0, 100]`.
    pub discount_percentage: Decimal,
}

impl PromoCode {
    pub fn new(
        code: impl Into<String>,
        discount_percentage: Decimal,
    ) -> Self {
        Self {
            code: code.into(),
            discount_percentage,
        }
    }
}

/// Normalizes user-typed promo input: surrounding whitespace is dropped and
/// the code is upper-cased.
///
/// ```
/// use shop_core::normalize_code;
///
/// assert_eq!(normalize_code("  save10 "), "SAVE10");
/// assert_eq!(normalize_code("   "), "");
/// ```
pub fn normalize_code(input: &str) -> String {
    input.trim().to_uppercase()
}
