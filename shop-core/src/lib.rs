pub mod calculations;
pub mod db;
pub mod models;
pub mod storefront;

pub use calculations::{OrderTotalCalculator, OrderTotals, TotalsConfig, TotalsError, compute_totals};
pub use db::repository::{
    CartRepository, CouponRepository, RepositoryError, StorefrontRepository, WishlistRepository,
};
pub use models::*;
