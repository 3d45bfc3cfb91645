use async_trait::async_trait;
use thiserror::Error;

use crate::models::{CartLine, Coupon, NewCoupon, WishlistItem};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Persistent home of the cart and the buy-now selection.
///
/// The cart is always read and written as a whole; `set_cart` replaces
/// whatever was stored before and keeps the given order.
#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn get_cart(&self) -> Result<Vec<CartLine>, RepositoryError>;
    async fn set_cart(&self, lines: &[CartLine]) -> Result<(), RepositoryError>;

    // Buy-now selection (a single product that bypasses the cart)
    async fn get_buy_now(&self) -> Result<Option<CartLine>, RepositoryError>;
    async fn set_buy_now(&self, line: &CartLine) -> Result<(), RepositoryError>;
    async fn clear_buy_now(&self) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait WishlistRepository: Send + Sync {
    async fn get_wishlist(&self) -> Result<Vec<WishlistItem>, RepositoryError>;
    async fn set_wishlist(&self, items: &[WishlistItem]) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait CouponRepository: Send + Sync {
    async fn list_coupons(&self) -> Result<Vec<Coupon>, RepositoryError>;

    /// Exact match on the stored (upper-case) code.
    async fn get_coupon_by_code(&self, code: &str) -> Result<Coupon, RepositoryError>;

    /// Fails with [`RepositoryError::Conflict`] when the code already exists.
    async fn create_coupon(&self, coupon: NewCoupon) -> Result<Coupon, RepositoryError>;

    async fn set_coupon_active(&self, id: i64, active: bool) -> Result<(), RepositoryError>;
    async fn delete_coupon(&self, id: i64) -> Result<(), RepositoryError>;
}

/// Everything a storage backend provides. Backend factories hand out
/// `Box<dyn StorefrontRepository>`.
pub trait StorefrontRepository: CartRepository + WishlistRepository + CouponRepository {}

impl<T> StorefrontRepository for T where T: CartRepository + WishlistRepository + CouponRepository {}
