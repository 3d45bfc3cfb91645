//! Command handlers for the `watchshop` binary.
//!
//! Each handler works against any [`StorefrontRepository`] and returns the
//! text to print, leaving stdout to `main`.

use std::fmt::Write as _;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shop_core::db::{DbConfig, RepositoryRegistry};
use shop_core::storefront::{
    Cart, CheckoutSession, CheckoutSource, CouponPromoValidator, PromoError, Wishlist,
    move_to_cart, move_to_wishlist,
};
use shop_core::{
    CartLine, Coupon, NewCoupon, OrderTotalCalculator, OrderTotals, PromoCode, RepositoryError,
    StorefrontRepository, TotalsConfig, WishlistItem,
};
use shop_db_sqlite::SqliteRepositoryFactory;
use tracing::{debug, info};

use crate::utils::format_money;

/// Registry with every storage backend this binary ships with.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

pub async fn open_repository(config: &DbConfig) -> Result<Box<dyn StorefrontRepository>> {
    debug!(backend = %config.backend, "opening repository");
    build_registry()
        .create(config)
        .await
        .with_context(|| format!("Failed to open {} store '{}'", config.backend, config.connection_string))
}

// ─── rendering ───────────────────────────────────────────────────────────────

fn render_lines(lines: &[CartLine]) -> String {
    let mut out = String::new();
    for line in lines {
        let _ = writeln!(
            out,
            "  #{:<6} {:<28} {:>12} x {:<3} {:>12}",
            line.id,
            line.name,
            format_money(line.unit_price),
            line.quantity,
            format_money(line.line_total())
        );
    }
    out
}

fn percent(rate: Decimal) -> String {
    format!("{}%", (rate * Decimal::ONE_HUNDRED).normalize())
}

/// The totals breakdown shown on the cart and checkout screens, followed by
/// a hint when a little more spending would unlock free shipping.
pub fn render_totals(
    totals: &OrderTotals,
    config: &TotalsConfig,
    promo: Option<&PromoCode>,
) -> String {
    let mut out = String::new();
    let row = |out: &mut String, label: &str, value: String| {
        let _ = writeln!(out, "  {:<28} {:>14}", label, value);
    };

    row(&mut out, "Subtotal", format_money(totals.subtotal));
    if let Some(promo) = promo {
        row(
            &mut out,
            &format!("Discount ({} {}%)", promo.code, promo.discount_percentage.normalize()),
            format!("-{}", format_money(totals.discount_amount)),
        );
    }
    let shipping = if totals.has_free_shipping() && !totals.subtotal.is_zero() {
        "FREE".to_string()
    } else {
        format_money(totals.shipping)
    };
    row(&mut out, "Shipping", shipping);
    row(&mut out, &format!("Tax ({})", percent(config.tax_rate)), format_money(totals.tax));
    row(&mut out, "Grand total", format_money(totals.grand_total));

    if let Some(shortfall) = totals.free_shipping_shortfall(config) {
        let _ = writeln!(
            out,
            "  Add {} more to get free shipping.",
            format_money(shortfall)
        );
    }
    out
}

// ─── cart ────────────────────────────────────────────────────────────────────

pub async fn show_cart(
    repo: &dyn StorefrontRepository,
    calculator: &OrderTotalCalculator,
) -> Result<String> {
    let lines = repo.get_cart().await.context("Failed to read cart")?;
    if lines.is_empty() {
        return Ok("Your cart is empty.\n".to_string());
    }

    let cart = Cart::from_lines(lines);
    let totals = calculator.calculate(cart.lines(), None);

    let mut out = format!("Cart ({} items):\n", cart.item_count());
    out.push_str(&render_lines(cart.lines()));
    out.push('\n');
    out.push_str(&render_totals(&totals, calculator.config(), None));
    Ok(out)
}

pub async fn add_to_cart(
    repo: &dyn StorefrontRepository,
    line: CartLine,
) -> Result<String> {
    if line.quantity == 0 {
        bail!("quantity must be at least 1");
    }

    let mut cart = Cart::from_lines(repo.get_cart().await.context("Failed to read cart")?);
    let message = format!("Added {} x {} to the cart.\n", line.quantity, line.name);
    cart.add_line(line);
    repo.set_cart(cart.lines()).await.context("Failed to save cart")?;
    Ok(message)
}

/// Changes a line by `delta` units; a line that drops to zero is removed.
pub async fn update_cart_quantity(
    repo: &dyn StorefrontRepository,
    id: i64,
    delta: i64,
) -> Result<String> {
    let mut cart = Cart::from_lines(repo.get_cart().await.context("Failed to read cart")?);
    if !cart.contains(id) {
        bail!("product #{} is not in the cart", id);
    }

    let remaining = cart.update_quantity(id, delta);
    repo.set_cart(cart.lines()).await.context("Failed to save cart")?;

    Ok(if remaining == 0 {
        format!("Removed product #{} from the cart.\n", id)
    } else {
        format!("Product #{} quantity is now {}.\n", id, remaining)
    })
}

pub async fn remove_from_cart(
    repo: &dyn StorefrontRepository,
    id: i64,
) -> Result<String> {
    let mut cart = Cart::from_lines(repo.get_cart().await.context("Failed to read cart")?);
    let Some(line) = cart.remove_item(id) else {
        bail!("product #{} is not in the cart", id);
    };
    repo.set_cart(cart.lines()).await.context("Failed to save cart")?;
    Ok(format!("Removed {} from the cart.\n", line.name))
}

pub async fn clear_cart(repo: &dyn StorefrontRepository) -> Result<String> {
    repo.set_cart(&[]).await.context("Failed to clear cart")?;
    info!("cart cleared");
    Ok("Cart cleared.\n".to_string())
}

/// The wishlist is saved before the cart, so a failed second write leaves
/// the product in both lists rather than in neither.
pub async fn move_cart_line_to_wishlist(
    repo: &dyn StorefrontRepository,
    id: i64,
) -> Result<String> {
    let mut cart = Cart::from_lines(repo.get_cart().await.context("Failed to read cart")?);
    let mut wishlist =
        Wishlist::from_items(repo.get_wishlist().await.context("Failed to read wishlist")?);

    if !move_to_wishlist(&mut cart, &mut wishlist, id) {
        bail!("product #{} is not in the cart", id);
    }

    repo.set_wishlist(wishlist.items()).await.context("Failed to save wishlist")?;
    repo.set_cart(cart.lines()).await.context("Failed to save cart")?;
    Ok(format!("Moved product #{} to the wishlist.\n", id))
}

// ─── wishlist ────────────────────────────────────────────────────────────────

pub async fn show_wishlist(repo: &dyn StorefrontRepository) -> Result<String> {
    let items = repo.get_wishlist().await.context("Failed to read wishlist")?;
    if items.is_empty() {
        return Ok("Your wishlist is empty.\n".to_string());
    }

    let mut out = format!("Wishlist ({} items):\n", items.len());
    for item in &items {
        let _ = writeln!(
            out,
            "  #{:<6} {:<28} {:>12}",
            item.id,
            item.name,
            format_money(item.unit_price)
        );
    }
    Ok(out)
}

pub async fn add_to_wishlist(
    repo: &dyn StorefrontRepository,
    item: WishlistItem,
) -> Result<String> {
    let mut wishlist =
        Wishlist::from_items(repo.get_wishlist().await.context("Failed to read wishlist")?);
    let name = item.name.clone();
    if !wishlist.add(item) {
        return Ok(format!("{} is already on the wishlist.\n", name));
    }
    repo.set_wishlist(wishlist.items()).await.context("Failed to save wishlist")?;
    Ok(format!("Saved {} to the wishlist.\n", name))
}

pub async fn remove_from_wishlist(
    repo: &dyn StorefrontRepository,
    id: i64,
) -> Result<String> {
    let mut wishlist =
        Wishlist::from_items(repo.get_wishlist().await.context("Failed to read wishlist")?);
    let Some(item) = wishlist.remove(id) else {
        bail!("product #{} is not on the wishlist", id);
    };
    repo.set_wishlist(wishlist.items()).await.context("Failed to save wishlist")?;
    Ok(format!("Removed {} from the wishlist.\n", item.name))
}

/// The cart is saved before the wishlist; see [`move_cart_line_to_wishlist`].
pub async fn move_wishlist_item_to_cart(
    repo: &dyn StorefrontRepository,
    id: i64,
) -> Result<String> {
    let mut wishlist =
        Wishlist::from_items(repo.get_wishlist().await.context("Failed to read wishlist")?);
    let mut cart = Cart::from_lines(repo.get_cart().await.context("Failed to read cart")?);

    if !move_to_cart(&mut wishlist, &mut cart, id) {
        bail!("product #{} is not on the wishlist", id);
    }

    repo.set_cart(cart.lines()).await.context("Failed to save cart")?;
    repo.set_wishlist(wishlist.items()).await.context("Failed to save wishlist")?;
    Ok(format!("Moved product #{} to the cart.\n", id))
}

// ─── buy now ─────────────────────────────────────────────────────────────────

pub async fn set_buy_now(
    repo: &dyn StorefrontRepository,
    line: CartLine,
) -> Result<String> {
    repo.set_buy_now(&line).await.context("Failed to save buy-now selection")?;
    info!(id = line.id, "buy-now product selected");
    Ok(format!(
        "{} will be checked out on its own; the cart is untouched.\n",
        line.name
    ))
}

pub async fn clear_buy_now(repo: &dyn StorefrontRepository) -> Result<String> {
    repo.clear_buy_now().await.context("Failed to clear buy-now selection")?;
    Ok("Buy-now selection cleared; checkout uses the cart again.\n".to_string())
}

// ─── coupons ─────────────────────────────────────────────────────────────────

fn coupon_status(
    coupon: &Coupon,
    now: DateTime<Utc>,
) -> &'static str {
    if !coupon.active {
        "inactive"
    } else if coupon.is_expired_at(now) {
        "expired"
    } else {
        "active"
    }
}

pub async fn list_coupons(
    repo: &dyn StorefrontRepository,
    now: DateTime<Utc>,
) -> Result<String> {
    let coupons = repo.list_coupons().await.context("Failed to list coupons")?;
    if coupons.is_empty() {
        return Ok("No coupons.\n".to_string());
    }

    let mut out = String::new();
    let _ = writeln!(out, "  {:<16} {:>8} {:<10} Expires", "Code", "Off", "Status");
    for coupon in &coupons {
        let expires = coupon
            .expiry_date
            .map(|d| d.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "never".to_string());
        let _ = writeln!(
            out,
            "  {:<16} {:>8} {:<10} {}",
            coupon.code,
            format!("{}%", coupon.discount_percentage.normalize()),
            coupon_status(coupon, now),
            expires
        );
    }
    Ok(out)
}

pub async fn add_coupon(
    repo: &dyn StorefrontRepository,
    code: &str,
    discount_percentage: Decimal,
    expiry_date: Option<DateTime<Utc>>,
) -> Result<String> {
    let coupon = NewCoupon::new(code, discount_percentage, expiry_date)?;
    let created = repo.create_coupon(coupon).await.map_err(|e| match e {
        RepositoryError::Conflict(msg) => anyhow::anyhow!(msg),
        other => anyhow::Error::new(other).context("Failed to create coupon"),
    })?;
    info!(code = %created.code, "coupon created");
    Ok(format!(
        "Coupon {} created ({}% off).\n",
        created.code,
        created.discount_percentage.normalize()
    ))
}

async fn find_coupon(
    repo: &dyn StorefrontRepository,
    code: &str,
) -> Result<Coupon> {
    let code = shop_core::normalize_code(code);
    match repo.get_coupon_by_code(&code).await {
        Ok(coupon) => Ok(coupon),
        Err(RepositoryError::NotFound) => bail!("no coupon named '{}'", code),
        Err(e) => Err(e).context("Failed to look up coupon"),
    }
}

pub async fn delete_coupon(
    repo: &dyn StorefrontRepository,
    code: &str,
) -> Result<String> {
    let coupon = find_coupon(repo, code).await?;
    repo.delete_coupon(coupon.id).await.context("Failed to delete coupon")?;
    info!(code = %coupon.code, "coupon deleted");
    Ok(format!("Coupon {} deleted.\n", coupon.code))
}

pub async fn set_coupon_active(
    repo: &dyn StorefrontRepository,
    code: &str,
    active: bool,
) -> Result<String> {
    let coupon = find_coupon(repo, code).await?;
    repo.set_coupon_active(coupon.id, active)
        .await
        .context("Failed to update coupon")?;
    let state = if active { "enabled" } else { "disabled" };
    info!(code = %coupon.code, state, "coupon updated");
    Ok(format!("Coupon {} {}.\n", coupon.code, state))
}

// ─── checkout ────────────────────────────────────────────────────────────────

/// Shows what checking out would cost and, with `confirm`, places the order.
///
/// A rejected promo code is reported and the totals are shown without it.
pub async fn checkout(
    repo: &dyn StorefrontRepository,
    calculator: &OrderTotalCalculator,
    promo: Option<&str>,
    confirm: bool,
) -> Result<String> {
    let mut session = CheckoutSession::load(repo)
        .await
        .context("Failed to load checkout")?;
    if session.is_empty() {
        return Ok("Nothing to check out.\n".to_string());
    }

    let mut out = match session.source() {
        CheckoutSource::BuyNow(line) => format!("Buying now: {}\n", line.name),
        CheckoutSource::Cart(lines) => format!("Checking out {} cart lines:\n", lines.len()),
    };
    out.push_str(&render_lines(session.lines()));
    out.push('\n');

    if let Some(input) = promo {
        let validator = CouponPromoValidator::new(repo);
        match session.apply_promo(&validator, input).await {
            Ok(true) => {}
            Ok(false) => out.push_str("No promo code entered.\n"),
            Err(PromoError::Repository(e)) => {
                return Err(e).context("Failed to validate promo code");
            }
            Err(e) => {
                let _ = writeln!(out, "Promo code rejected: {}", e);
            }
        }
    }

    let totals = session.totals(calculator);
    out.push_str(&render_totals(&totals, calculator.config(), session.applied_promo()));

    if !confirm {
        out.push_str("\nRun again with --confirm to place the order.\n");
        return Ok(out);
    }

    let request = session.order_request(calculator)?;
    let payload = toml::to_string_pretty(&request).context("Failed to encode order request")?;
    let _ = write!(out, "\nOrder request:\n{}", payload);

    session.complete(repo).await.context("Failed to clear cart after checkout")?;
    out.push_str("Order placed.\n");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use shop_core::{CartRepository, CouponRepository, WishlistRepository};
    use shop_db_sqlite::SqliteRepository;

    use super::*;

    async fn setup_repo() -> SqliteRepository {
        let repo = SqliteRepository::new(":memory:")
            .await
            .expect("Failed to create in-memory database");
        repo.run_migrations()
            .await
            .expect("Failed to run migrations");
        repo
    }

    async fn fill_cart(repo: &dyn StorefrontRepository) {
        add_to_cart(repo, CartLine::new(1, "Chronograph", dec!(1000), 2))
            .await
            .unwrap();
        add_to_cart(repo, CartLine::new(2, "Leather strap", dec!(500), 1))
            .await
            .unwrap();
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    #[test]
    fn render_totals_shows_shortfall_hint() {
        let lines = vec![CartLine::new(1, "Chronograph", dec!(1000), 2)];
        let totals = shop_core::compute_totals(&lines, None);

        let text = render_totals(&totals, &TotalsConfig::default(), None);

        assert!(text.contains("Add ₹3,000 more to get free shipping."), "{text}");
        assert!(text.contains("Tax (18%)"), "{text}");
    }

    #[test]
    fn render_totals_marks_free_shipping() {
        let lines = vec![CartLine::new(1, "Skeleton", dec!(8000), 1)];
        let totals = shop_core::compute_totals(&lines, None);

        let text = render_totals(&totals, &TotalsConfig::default(), None);

        assert!(text.contains("FREE"), "{text}");
        assert!(!text.contains("more to get free shipping"), "{text}");
    }

    #[test]
    fn render_totals_lists_discount_with_promo() {
        let lines = vec![CartLine::new(1, "Chronograph", dec!(1000), 2)];
        let promo = PromoCode::new("SAVE10", dec!(10));
        let totals = shop_core::compute_totals(&lines, Some(&promo));

        let text = render_totals(&totals, &TotalsConfig::default(), Some(&promo));

        assert!(text.contains("Discount (SAVE10 10%)"), "{text}");
        assert!(text.contains("-₹200"), "{text}");
    }

    // ========================================================================
    // Cart and wishlist
    // ========================================================================

    #[tokio::test]
    async fn show_cart_prints_breakdown() {
        let repo = setup_repo().await;
        fill_cart(&repo).await;

        let text = show_cart(&repo, &OrderTotalCalculator::default()).await.unwrap();

        assert!(text.starts_with("Cart (3 items):"), "{text}");
        assert!(text.contains("₹3,150"), "{text}");
    }

    #[tokio::test]
    async fn show_empty_cart() {
        let repo = setup_repo().await;

        let text = show_cart(&repo, &OrderTotalCalculator::default()).await.unwrap();

        assert_eq!(text, "Your cart is empty.\n");
    }

    #[tokio::test]
    async fn adding_same_product_merges_quantity() {
        let repo = setup_repo().await;
        fill_cart(&repo).await;

        add_to_cart(&repo, CartLine::new(1, "Chronograph", dec!(1000), 1))
            .await
            .unwrap();

        let cart = repo.get_cart().await.unwrap();
        assert_eq!(cart.len(), 2);
        assert_eq!(cart[0].quantity, 3);
    }

    #[tokio::test]
    async fn update_to_zero_removes_line() {
        let repo = setup_repo().await;
        fill_cart(&repo).await;

        let text = update_cart_quantity(&repo, 2, -5).await.unwrap();

        assert_eq!(text, "Removed product #2 from the cart.\n");
        assert_eq!(repo.get_cart().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_unknown_product_fails() {
        let repo = setup_repo().await;

        assert!(update_cart_quantity(&repo, 99, 1).await.is_err());
    }

    #[tokio::test]
    async fn move_between_cart_and_wishlist() {
        let repo = setup_repo().await;
        fill_cart(&repo).await;

        move_cart_line_to_wishlist(&repo, 1).await.unwrap();
        assert_eq!(repo.get_cart().await.unwrap().len(), 1);
        assert_eq!(
            repo.get_wishlist().await.unwrap(),
            vec![WishlistItem::new(1, "Chronograph", dec!(1000))]
        );

        move_wishlist_item_to_cart(&repo, 1).await.unwrap();
        assert!(repo.get_wishlist().await.unwrap().is_empty());
        let cart = repo.get_cart().await.unwrap();
        assert_eq!(cart.last(), Some(&CartLine::new(1, "Chronograph", dec!(1000), 1)));
    }

    /// Delegates to SQLite but refuses every cart write.
    struct CartWritesFail(SqliteRepository);

    #[async_trait]
    impl CartRepository for CartWritesFail {
        async fn get_cart(&self) -> Result<Vec<CartLine>, RepositoryError> {
            self.0.get_cart().await
        }
        async fn set_cart(&self, _lines: &[CartLine]) -> Result<(), RepositoryError> {
            Err(RepositoryError::Database("disk full".to_string()))
        }
        async fn get_buy_now(&self) -> Result<Option<CartLine>, RepositoryError> {
            self.0.get_buy_now().await
        }
        async fn set_buy_now(&self, line: &CartLine) -> Result<(), RepositoryError> {
            self.0.set_buy_now(line).await
        }
        async fn clear_buy_now(&self) -> Result<(), RepositoryError> {
            self.0.clear_buy_now().await
        }
    }

    #[async_trait]
    impl WishlistRepository for CartWritesFail {
        async fn get_wishlist(&self) -> Result<Vec<WishlistItem>, RepositoryError> {
            self.0.get_wishlist().await
        }
        async fn set_wishlist(&self, items: &[WishlistItem]) -> Result<(), RepositoryError> {
            self.0.set_wishlist(items).await
        }
    }

    #[async_trait]
    impl CouponRepository for CartWritesFail {
        async fn list_coupons(&self) -> Result<Vec<Coupon>, RepositoryError> {
            self.0.list_coupons().await
        }
        async fn get_coupon_by_code(&self, code: &str) -> Result<Coupon, RepositoryError> {
            self.0.get_coupon_by_code(code).await
        }
        async fn create_coupon(&self, coupon: NewCoupon) -> Result<Coupon, RepositoryError> {
            self.0.create_coupon(coupon).await
        }
        async fn set_coupon_active(&self, id: i64, active: bool) -> Result<(), RepositoryError> {
            self.0.set_coupon_active(id, active).await
        }
        async fn delete_coupon(&self, id: i64) -> Result<(), RepositoryError> {
            self.0.delete_coupon(id).await
        }
    }

    #[tokio::test]
    async fn failed_cart_write_never_loses_moved_product() {
        let inner = setup_repo().await;
        fill_cart(&inner).await;
        let repo = CartWritesFail(inner);

        assert!(move_cart_line_to_wishlist(&repo, 1).await.is_err());

        let cart = repo.get_cart().await.unwrap();
        assert!(cart.iter().any(|l| l.id == 1));
        assert_eq!(
            repo.get_wishlist().await.unwrap(),
            vec![WishlistItem::new(1, "Chronograph", dec!(1000))]
        );
    }

    #[tokio::test]
    async fn adding_wishlist_duplicate_is_reported() {
        let repo = setup_repo().await;
        let item = WishlistItem::new(5, "Moonphase", dec!(15000));
        add_to_wishlist(&repo, item.clone()).await.unwrap();

        let text = add_to_wishlist(&repo, item).await.unwrap();

        assert_eq!(text, "Moonphase is already on the wishlist.\n");
        assert_eq!(repo.get_wishlist().await.unwrap().len(), 1);
    }

    // ========================================================================
    // Coupons
    // ========================================================================

    #[tokio::test]
    async fn coupon_lifecycle() {
        let repo = setup_repo().await;

        add_coupon(&repo, "save10", dec!(10), None).await.unwrap();
        set_coupon_active(&repo, "SAVE10", false).await.unwrap();

        let listing = list_coupons(&repo, now()).await.unwrap();
        assert!(listing.contains("SAVE10"), "{listing}");
        assert!(listing.contains("inactive"), "{listing}");

        delete_coupon(&repo, "save10").await.unwrap();
        assert_eq!(list_coupons(&repo, now()).await.unwrap(), "No coupons.\n");
    }

    #[tokio::test]
    async fn duplicate_coupon_is_an_error() {
        let repo = setup_repo().await;
        add_coupon(&repo, "SAVE10", dec!(10), None).await.unwrap();

        let err = add_coupon(&repo, "SAVE10", dec!(10), None).await.unwrap_err();

        assert!(err.to_string().contains("already exists"), "{err}");
    }

    #[tokio::test]
    async fn expired_coupon_is_listed_as_expired() {
        let repo = setup_repo().await;
        let expiry = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        add_coupon(&repo, "WINTER", dec!(15), Some(expiry)).await.unwrap();

        let listing = list_coupons(&repo, now()).await.unwrap();

        assert!(listing.contains("expired"), "{listing}");
        assert!(listing.contains("2026-02-01 00:00 UTC"), "{listing}");
    }

    // ========================================================================
    // Checkout
    // ========================================================================

    #[tokio::test]
    async fn checkout_preview_with_promo() {
        let repo = setup_repo().await;
        fill_cart(&repo).await;
        add_coupon(&repo, "SAVE10", dec!(10), None).await.unwrap();

        let text = checkout(&repo, &OrderTotalCalculator::default(), Some(" save10 "), false)
            .await
            .unwrap();

        assert!(text.contains("-₹250"), "{text}");
        assert!(text.contains("₹2,855"), "{text}");
        assert!(text.contains("--confirm"), "{text}");
        assert_eq!(repo.get_cart().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn checkout_with_rejected_promo_uses_full_price() {
        let repo = setup_repo().await;
        fill_cart(&repo).await;

        let text = checkout(&repo, &OrderTotalCalculator::default(), Some("BOGUS"), false)
            .await
            .unwrap();

        assert!(text.contains("Promo code rejected: invalid promo code 'BOGUS'"), "{text}");
        assert!(text.contains("₹3,150"), "{text}");
    }

    #[tokio::test]
    async fn confirmed_checkout_clears_cart() {
        let repo = setup_repo().await;
        fill_cart(&repo).await;
        add_coupon(&repo, "SAVE10", dec!(10), None).await.unwrap();

        let text = checkout(&repo, &OrderTotalCalculator::default(), Some("SAVE10"), true)
            .await
            .unwrap();

        assert!(text.contains("promoCode = \"SAVE10\""), "{text}");
        assert!(text.contains("productId = 1"), "{text}");
        assert!(text.ends_with("Order placed.\n"), "{text}");
        assert!(repo.get_cart().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn buy_now_is_checked_out_instead_of_cart() {
        let repo = setup_repo().await;
        fill_cart(&repo).await;
        set_buy_now(&repo, CartLine::new(9, "Skeleton", dec!(8000), 1))
            .await
            .unwrap();

        let text = checkout(&repo, &OrderTotalCalculator::default(), None, true)
            .await
            .unwrap();

        assert!(text.starts_with("Buying now: Skeleton"), "{text}");
        // 8000 ships free; 8000 + 1440 tax
        assert!(text.contains("₹9,440"), "{text}");
        assert_eq!(repo.get_buy_now().await.unwrap(), None);
        assert!(repo.get_cart().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn checkout_with_nothing_to_buy() {
        let repo = setup_repo().await;

        let text = checkout(&repo, &OrderTotalCalculator::default(), None, true)
            .await
            .unwrap();

        assert_eq!(text, "Nothing to check out.\n");
    }
}
