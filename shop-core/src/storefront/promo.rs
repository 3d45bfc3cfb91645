//! Promo code validation.
//!
//! The total calculator only ever sees an already-validated [`PromoCode`].
//! Turning user input into one is the job of a [`PromoValidator`]; the
//! bundled [`CouponPromoValidator`] checks the code against the coupon
//! store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};

use crate::db::repository::{CouponRepository, RepositoryError};
use crate::models::{PromoCode, normalize_code};

/// Reasons a promo code is not accepted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromoError {
    #[error("promo code is empty")]
    Empty,

    #[error("invalid promo code '{0}'")]
    Unknown(String),

    #[error("promo code '{0}' is no longer active")]
    Inactive(String),

    #[error("promo code '{code}' expired on {expired_at}")]
    Expired {
        code: String,
        expired_at: DateTime<Utc>,
    },

    #[error("promo lookup failed: {0}")]
    Repository(#[from] RepositoryError),
}

/// Turns raw user input into a [`PromoCode`] or explains why it cannot.
#[async_trait]
pub trait PromoValidator: Send + Sync {
    async fn validate(&self, code: &str) -> Result<PromoCode, PromoError>;
}

/// Validates codes against a [`CouponRepository`].
///
/// Input is trimmed and upper-cased before lookup. A coupon is accepted
/// when it exists, is active, and has no expiry date or one that lies in
/// the future.
pub struct CouponPromoValidator<'a, R: ?Sized> {
    coupons: &'a R,
}

impl<'a, R> CouponPromoValidator<'a, R>
where
    R: CouponRepository + ?Sized,
{
    pub fn new(coupons: &'a R) -> Self {
        Self { coupons }
    }

    /// Same as [`PromoValidator::validate`] with an explicit clock.
    pub async fn validate_at(
        &self,
        input: &str,
        now: DateTime<Utc>,
    ) -> Result<PromoCode, PromoError> {
        let code = normalize_code(input);
        if code.is_empty() {
            return Err(PromoError::Empty);
        }

        let coupon = match self.coupons.get_coupon_by_code(&code).await {
            Ok(coupon) => coupon,
            Err(RepositoryError::NotFound) => {
                warn!(%code, "unknown promo code");
                return Err(PromoError::Unknown(code));
            }
            Err(err) => return Err(err.into()),
        };

        if !coupon.active {
            warn!(%code, "inactive promo code");
            return Err(PromoError::Inactive(code));
        }

        if let Some(expired_at) = coupon.expiry_date.filter(|_| coupon.is_expired_at(now)) {
            warn!(%code, %expired_at, "expired promo code");
            return Err(PromoError::Expired { code, expired_at });
        }

        info!(
            %code,
            discount_percentage = %coupon.discount_percentage,
            "promo code accepted"
        );
        Ok(coupon.to_promo_code())
    }
}

#[async_trait]
impl<R> PromoValidator for CouponPromoValidator<'_, R>
where
    R: CouponRepository + ?Sized,
{
    async fn validate(&self, code: &str) -> Result<PromoCode, PromoError> {
        self.validate_at(code, Utc::now()).await
    }
}
