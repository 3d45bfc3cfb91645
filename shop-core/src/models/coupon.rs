use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{PromoCode, normalize_code};

static CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9][A-Z0-9_-]{1,31}$").expect("valid coupon pattern"));

/// Errors raised when a coupon definition is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CouponError {
    #[error("invalid coupon code '{0}': expected 2-32 characters of A-Z, 0-9, '-' or '_'")]
    InvalidCode(String),

    #[error("discount percentage must be between 0 and 100, got {0}")]
    InvalidDiscountPercentage(Decimal),

    #[error("invalid expiry date '{0}': expected YYYY-MM-DD or RFC 3339")]
    InvalidExpiry(String),
}

/// Parses a coupon expiry given either as RFC 3339 or as a plain
/// `YYYY-MM-DD` date (midnight UTC).
pub fn parse_expiry(s: &str) -> Result<DateTime<Utc>, CouponError> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| CouponError::InvalidExpiry(s.to_string()))
}

/// A stored promo code as the back-office sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: i64,
    pub code: String,
    pub discount_percentage: Decimal,
    pub active: bool,
    pub expiry_date: Option<DateTime<Utc>>,
}

impl Coupon {
    /// A coupon without an expiry date never expires.
    pub fn is_expired_at(
        &self,
        now: DateTime<Utc>,
    ) -> bool {
        self.expiry_date.is_some_and(|expiry| expiry <= now)
    }

    pub fn to_promo_code(&self) -> PromoCode {
        PromoCode::new(self.code.clone(), self.discount_percentage)
    }
}

/// For creating new coupons (no id; new coupons start active).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCoupon {
    pub code: String,
    pub discount_percentage: Decimal,
    pub expiry_date: Option<DateTime<Utc>>,
}

impl NewCoupon {
    /// Normalizes `code` and validates the result.
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use shop_core::NewCoupon;
    ///
    /// let coupon = NewCoupon::new(" save10 ", dec!(10), None).unwrap();
    /// assert_eq!(coupon.code, "SAVE10");
    ///
    /// assert!(NewCoupon::new("SAVE10", dec!(120), None).is_err());
    /// ```
    pub fn new(
        code: &str,
        discount_percentage: Decimal,
        expiry_date: Option<DateTime<Utc>>,
    ) -> Result<Self, CouponError> {
        let coupon = Self {
            code: normalize_code(code),
            discount_percentage,
            expiry_date,
        };
        coupon.validate()?;
        Ok(coupon)
    }

    pub fn validate(&self) -> Result<(), CouponError> {
        if !CODE_PATTERN.is_match(&self.code) {
            return Err(CouponError::InvalidCode(self.code.clone()));
        }
        if self.discount_percentage < Decimal::ZERO
            || self.discount_percentage > Decimal::ONE_HUNDRED
        {
            return Err(CouponError::InvalidDiscountPercentage(
                self.discount_percentage,
            ));
        }
        Ok(())
    }
}
