mod loader;

pub use loader::{CouponLoader, CouponLoaderError, CouponRecord};
