//! Customer-facing flows layered over the storage traits: cart and
//! wishlist editing, promo validation and checkout.

pub mod cart;
pub mod checkout;
pub mod promo;

pub use cart::{Cart, Wishlist, move_to_cart, move_to_wishlist};
pub use checkout::{CheckoutError, CheckoutSession, CheckoutSource};
pub use promo::{CouponPromoValidator, PromoError, PromoValidator};
