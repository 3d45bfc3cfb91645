mod cart_line;
mod coupon;
mod order_request;
mod promo_code;
mod wishlist_item;

pub use cart_line::CartLine;
pub use coupon::{Coupon, CouponError, NewCoupon, parse_expiry};
pub use order_request::{OrderItemRequest, PlaceOrderRequest};
pub use promo_code::{PromoCode, normalize_code};
pub use wishlist_item::WishlistItem;
