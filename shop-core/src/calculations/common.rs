//! Common money helpers shared by the total calculations.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a decimal value to a whole currency unit using half-up rounding.
///
/// Values at exactly `.5` move away from zero, so for the non-negative
/// amounts a cart produces this is plain round-half-up.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use shop_core::calculations::common::round_to_currency_unit;
///
/// assert_eq!(round_to_currency_unit(dec!(404.49)), dec!(404));
/// assert_eq!(round_to_currency_unit(dec!(4.5)), dec!(5));
/// assert_eq!(round_to_currency_unit(dec!(22.5)), dec!(23));
/// ```
pub fn round_to_currency_unit(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns `percentage`% of `amount`, unrounded.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use shop_core::calculations::common::percentage_of;
///
/// assert_eq!(percentage_of(dec!(2500), dec!(10)), dec!(250));
/// assert_eq!(percentage_of(dec!(999), dec!(12.5)), dec!(124.875));
/// ```
pub fn percentage_of(
    amount: Decimal,
    percentage: Decimal,
) -> Decimal {
    amount * percentage / Decimal::ONE_HUNDRED
}
