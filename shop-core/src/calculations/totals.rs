//! Order total calculation for the cart and checkout views.
//!
//! # Breakdown
//!
//! | Step | Value           | Rule |
//! |------|-----------------|------|
//! | 1    | subtotal        | Σ unit price × quantity |
//! | 2    | discount amount | subtotal × promo percentage / 100 (0 without a promo) |
//! | 3    | taxable amount  | subtotal − discount amount |
//! | 4    | shipping        | 0 when subtotal > threshold, otherwise the flat fee |
//! | 5    | tax             | taxable amount × tax rate, rounded half-up to a whole unit |
//! | 6    | grand total     | taxable amount + shipping + tax |
//!
//! Shipping is judged on the subtotal before discount; tax is charged on the
//! amount after discount. An empty cart ships nothing, so its grand total
//! is zero.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use shop_core::{CartLine, PromoCode, compute_totals};
//!
//! let lines = vec![
//!     CartLine::new(1, "Chronograph", dec!(1000), 2),
//!     CartLine::new(2, "Leather strap", dec!(500), 1),
//! ];
//!
//! let totals = compute_totals(&lines, None);
//! assert_eq!(totals.subtotal, dec!(2500));
//! assert_eq!(totals.shipping, dec!(200));
//! assert_eq!(totals.tax, dec!(450));
//! assert_eq!(totals.grand_total, dec!(3150));
//!
//! let promo = PromoCode::new("SAVE10", dec!(10));
//! let totals = compute_totals(&lines, Some(&promo));
//! assert_eq!(totals.discount_amount, dec!(250));
//! assert_eq!(totals.tax, dec!(405));
//! assert_eq!(totals.grand_total, dec!(2855));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::calculations::common::{percentage_of, round_to_currency_unit};
use crate::models::{CartLine, PromoCode};

/// Errors raised by [`TotalsConfig::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TotalsError {
    #[error("free shipping threshold must be non-negative, got {0}")]
    NegativeFreeShippingThreshold(Decimal),

    #[error("shipping fee must be non-negative, got {0}")]
    NegativeShippingFee(Decimal),

    #[error("tax rate must be between 0 and 1, got {0}")]
    InvalidTaxRate(Decimal),
}

/// Pricing constants used by [`OrderTotalCalculator`].
///
/// The defaults are the storefront's published rules: free shipping above
/// 5000, a flat 200 fee otherwise, and 18% GST.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalsConfig {
    /// Shipping is free once the subtotal is strictly greater than this.
    pub free_shipping_threshold: Decimal,

    /// Flat fee charged when the subtotal is at or below the threshold.
    pub shipping_fee: Decimal,

    /// Tax rate as a fraction (`0.18` for 18%).
    pub tax_rate: Decimal,
}

impl Default for TotalsConfig {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Decimal::new(5000, 0),
            shipping_fee: Decimal::new(200, 0),
            tax_rate: Decimal::new(18, 2),
        }
    }
}

impl TotalsConfig {
    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`TotalsError`] if:
    /// - `free_shipping_threshold` is negative
    /// - `shipping_fee` is negative
    /// - `tax_rate` is not in [0, 1]
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use shop_core::{TotalsConfig, TotalsError};
    ///
    /// let config = TotalsConfig {
    ///     tax_rate: dec!(18),
    ///     ..TotalsConfig::default()
    /// };
    ///
    /// assert_eq!(config.validate(), Err(TotalsError::InvalidTaxRate(dec!(18))));
    /// ```
    pub fn validate(&self) -> Result<(), TotalsError> {
        if self.free_shipping_threshold < Decimal::ZERO {
            return Err(TotalsError::NegativeFreeShippingThreshold(
                self.free_shipping_threshold,
            ));
        }
        if self.shipping_fee < Decimal::ZERO {
            return Err(TotalsError::NegativeShippingFee(self.shipping_fee));
        }
        if self.tax_rate < Decimal::ZERO || self.tax_rate > Decimal::ONE {
            return Err(TotalsError::InvalidTaxRate(self.tax_rate));
        }
        Ok(())
    }
}

/// Breakdown of what the customer pays. Derived fresh on every change to
/// the cart or promo code and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    /// Sum of line totals, unrounded.
    pub subtotal: Decimal,

    /// Promo discount taken off the subtotal, unrounded.
    pub discount_amount: Decimal,

    pub shipping: Decimal,

    /// Tax on the discounted amount, rounded to a whole currency unit.
    pub tax: Decimal,

    pub grand_total: Decimal,
}

impl OrderTotals {
    /// Amount the tax is charged on (subtotal minus discount).
    pub fn taxable_amount(&self) -> Decimal {
        self.subtotal - self.discount_amount
    }

    pub fn has_free_shipping(&self) -> bool {
        self.shipping.is_zero()
    }

    /// How much more the customer has to add before the cart view stops
    /// nudging them towards free shipping.
    ///
    /// Returns `None` when shipping is already free or the subtotal has
    /// reached the threshold. At exactly the threshold shipping is still
    /// charged but no nudge is shown.
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use shop_core::{CartLine, TotalsConfig, compute_totals};
    ///
    /// let lines = vec![CartLine::new(1, "Diver", dec!(3200), 1)];
    /// let totals = compute_totals(&lines, None);
    ///
    /// assert_eq!(
    ///     totals.free_shipping_shortfall(&TotalsConfig::default()),
    ///     Some(dec!(1800))
    /// );
    /// ```
    pub fn free_shipping_shortfall(
        &self,
        config: &TotalsConfig,
    ) -> Option<Decimal> {
        if self.has_free_shipping() || self.subtotal >= config.free_shipping_threshold {
            return None;
        }
        Some(config.free_shipping_threshold - self.subtotal)
    }
}

/// Stateless calculator turning cart lines and an optional promo code into
/// [`OrderTotals`].
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use shop_core::{CartLine, OrderTotalCalculator, TotalsConfig};
///
/// let calculator = OrderTotalCalculator::try_new(TotalsConfig {
///     free_shipping_threshold: dec!(10000),
///     ..TotalsConfig::default()
/// })
/// .unwrap();
///
/// let lines = vec![CartLine::new(7, "Pilot", dec!(6000), 1)];
/// let totals = calculator.calculate(&lines, None);
///
/// // 6000 is below the raised threshold, so the flat fee applies.
/// assert_eq!(totals.shipping, dec!(200));
/// ```
#[derive(Debug, Clone, Default)]
pub struct OrderTotalCalculator {
    config: TotalsConfig,
}

impl OrderTotalCalculator {
    /// Creates a calculator without validating `config`.
    pub fn new(config: TotalsConfig) -> Self {
        Self { config }
    }

    /// Creates a calculator after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`TotalsError`] if the configuration is invalid.
    pub fn try_new(config: TotalsConfig) -> Result<Self, TotalsError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &TotalsConfig {
        &self.config
    }

    /// Computes the full breakdown. Line order does not affect the result.
    ///
    /// Inputs are trusted: negative prices or out-of-range promo
    /// percentages are the caller's responsibility.
    pub fn calculate(
        &self,
        lines: &[CartLine],
        promo: Option<&PromoCode>,
    ) -> OrderTotals {
        // Step 1
        let subtotal = self.subtotal(lines);

        // Steps 2 and 3
        let discount_amount = self.discount_amount(subtotal, promo);
        let taxable_amount = subtotal - discount_amount;

        // Step 4: judged on the pre-discount subtotal
        let shipping = self.shipping(lines, subtotal);

        // Step 5: judged on the post-discount amount
        let tax = self.tax(taxable_amount);

        // Step 6
        let grand_total = taxable_amount + shipping + tax;

        debug!(
            lines = lines.len(),
            promo = promo.map(|p| p.code.as_str()),
            %subtotal,
            %discount_amount,
            %shipping,
            %tax,
            %grand_total,
            "order totals computed"
        );

        OrderTotals {
            subtotal,
            discount_amount,
            shipping,
            tax,
            grand_total,
        }
    }

    fn subtotal(
        &self,
        lines: &[CartLine],
    ) -> Decimal {
        lines.iter().map(CartLine::line_total).sum()
    }

    fn discount_amount(
        &self,
        subtotal: Decimal,
        promo: Option<&PromoCode>,
    ) -> Decimal {
        promo.map_or(Decimal::ZERO, |p| {
            percentage_of(subtotal, p.discount_percentage)
        })
    }

    fn shipping(
        &self,
        lines: &[CartLine],
        subtotal: Decimal,
    ) -> Decimal {
        if lines.is_empty() || subtotal > self.config.free_shipping_threshold {
            Decimal::ZERO
        } else {
            self.config.shipping_fee
        }
    }

    fn tax(
        &self,
        taxable_amount: Decimal,
    ) -> Decimal {
        round_to_currency_unit(taxable_amount * self.config.tax_rate)
    }
}

/// Computes totals with the default [`TotalsConfig`].
pub fn compute_totals(
    lines: &[CartLine],
    promo: Option<&PromoCode>,
) -> OrderTotals {
    OrderTotalCalculator::default().calculate(lines, promo)
}
