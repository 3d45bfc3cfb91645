use rust_decimal::Decimal;
use tracing::debug;

use crate::models::{CartLine, WishlistItem};

/// In-memory cart that keeps the line invariants: one line per product id
/// and no line with a quantity of zero.
///
/// ```
/// use rust_decimal_macros::dec;
/// use shop_core::storefront::Cart;
///
/// let mut cart = Cart::default();
/// cart.add_item(1, "Diver", dec!(3200));
/// cart.add_item(1, "Diver", dec!(3200));
/// assert_eq!(cart.item_count(), 2);
///
/// cart.update_quantity(1, -5);
/// assert!(cart.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Builds a cart from stored lines, merging duplicate ids and dropping
    /// zero-quantity lines.
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let mut cart = Self::default();
        for line in lines {
            cart.add_line(line);
        }
        cart
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.lines.iter().any(|l| l.id == id)
    }

    /// Total number of units across all lines.
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Adds one unit of a product, creating the line if needed.
    pub fn add_item(
        &mut self,
        id: i64,
        name: impl Into<String>,
        unit_price: Decimal,
    ) {
        self.add_line(CartLine::new(id, name, unit_price, 1));
    }

    /// Adds a whole line; an existing line with the same id absorbs the
    /// quantity and keeps its own name and price.
    pub fn add_line(&mut self, line: CartLine) {
        if line.quantity == 0 {
            return;
        }
        match self.lines.iter_mut().find(|l| l.id == line.id) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(line.quantity);
                debug!(id = line.id, quantity = existing.quantity, "cart line merged");
            }
            None => {
                debug!(id = line.id, quantity = line.quantity, "cart line added");
                self.lines.push(line);
            }
        }
    }

    /// Changes a line's quantity by `delta`, clamping at zero. A line that
    /// reaches zero is removed. Unknown ids are ignored.
    ///
    /// Returns the quantity left for `id` (0 if removed or absent).
    pub fn update_quantity(
        &mut self,
        id: i64,
        delta: i64,
    ) -> u32 {
        let Some(index) = self.lines.iter().position(|l| l.id == id) else {
            return 0;
        };

        let current = i64::from(self.lines[index].quantity);
        let updated = current.saturating_add(delta).clamp(0, i64::from(u32::MAX)) as u32;

        if updated == 0 {
            self.lines.remove(index);
            debug!(id, "cart line removed at zero quantity");
        } else {
            self.lines[index].quantity = updated;
        }
        updated
    }

    /// Removes the line for `id`, returning it if it was present.
    pub fn remove_item(&mut self, id: i64) -> Option<CartLine> {
        let index = self.lines.iter().position(|l| l.id == id)?;
        Some(self.lines.remove(index))
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

/// Saved-for-later products, at most one entry per product id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wishlist {
    items: Vec<WishlistItem>,
}

impl Wishlist {
    pub fn from_items(items: Vec<WishlistItem>) -> Self {
        let mut wishlist = Self::default();
        for item in items {
            wishlist.add(item);
        }
        wishlist
    }

    pub fn items(&self) -> &[WishlistItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<WishlistItem> {
        self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.items.iter().any(|i| i.id == id)
    }

    /// Returns `false` (and changes nothing) if the product is already saved.
    pub fn add(&mut self, item: WishlistItem) -> bool {
        if self.contains(item.id) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn remove(&mut self, id: i64) -> Option<WishlistItem> {
        let index = self.items.iter().position(|i| i.id == id)?;
        Some(self.items.remove(index))
    }
}

/// Moves a cart line to the wishlist. The whole line leaves the cart
/// regardless of its quantity.
///
/// Returns `false` when `id` is not in the cart.
pub fn move_to_wishlist(
    cart: &mut Cart,
    wishlist: &mut Wishlist,
    id: i64,
) -> bool {
    let Some(line) = cart.remove_item(id) else {
        return false;
    };
    wishlist.add(WishlistItem::from(&line));
    true
}

/// Moves a wishlist item into the cart as one more unit.
///
/// Returns `false` when `id` is not on the wishlist.
pub fn move_to_cart(
    wishlist: &mut Wishlist,
    cart: &mut Cart,
    id: i64,
) -> bool {
    let Some(item) = wishlist.remove(id) else {
        return false;
    };
    cart.add_item(item.id, item.name, item.unit_price);
    true
}
