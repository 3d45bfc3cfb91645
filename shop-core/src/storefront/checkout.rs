use thiserror::Error;
use tracing::info;

use crate::calculations::{OrderTotalCalculator, OrderTotals};
use crate::db::repository::{CartRepository, RepositoryError};
use crate::models::{CartLine, OrderItemRequest, PlaceOrderRequest, PromoCode};
use crate::storefront::promo::{PromoError, PromoValidator};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("nothing to check out")]
    EmptyCart,

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// What is being bought.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutSource {
    Cart(Vec<CartLine>),
    /// A single product picked with "buy now"; the cart is left untouched.
    BuyNow(CartLine),
}

/// State of one checkout: the lines being bought plus the promo code the
/// customer has applied so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    source: CheckoutSource,
    applied_promo: Option<PromoCode>,
}

impl CheckoutSession {
    pub fn new(source: CheckoutSource) -> Self {
        Self {
            source,
            applied_promo: None,
        }
    }

    /// Starts a checkout from storage. A stored buy-now product takes
    /// precedence over the cart.
    pub async fn load<R>(repo: &R) -> Result<Self, RepositoryError>
    where
        R: CartRepository + ?Sized,
    {
        let source = match repo.get_buy_now().await? {
            Some(mut line) => {
                line.quantity = line.quantity.max(1);
                CheckoutSource::BuyNow(line)
            }
            None => CheckoutSource::Cart(repo.get_cart().await?),
        };
        Ok(Self::new(source))
    }

    pub fn source(&self) -> &CheckoutSource {
        &self.source
    }

    pub fn lines(&self) -> &[CartLine] {
        match &self.source {
            CheckoutSource::Cart(lines) => lines,
            CheckoutSource::BuyNow(line) => std::slice::from_ref(line),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines().is_empty()
    }

    pub fn applied_promo(&self) -> Option<&PromoCode> {
        self.applied_promo.as_ref()
    }

    /// Validates `input` and applies it.
    ///
    /// Blank input changes nothing and returns `Ok(false)`. A rejected code
    /// also drops any promo applied earlier.
    pub async fn apply_promo<V>(
        &mut self,
        validator: &V,
        input: &str,
    ) -> Result<bool, PromoError>
    where
        V: PromoValidator + ?Sized,
    {
        if input.trim().is_empty() {
            return Ok(false);
        }

        match validator.validate(input).await {
            Ok(promo) => {
                self.applied_promo = Some(promo);
                Ok(true)
            }
            Err(err) => {
                self.applied_promo = None;
                Err(err)
            }
        }
    }

    pub fn remove_promo(&mut self) -> Option<PromoCode> {
        self.applied_promo.take()
    }

    pub fn totals(
        &self,
        calculator: &OrderTotalCalculator,
    ) -> OrderTotals {
        calculator.calculate(self.lines(), self.applied_promo())
    }

    /// Builds the body for the external place-order call.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::EmptyCart`] when there is nothing to buy.
    pub fn order_request(
        &self,
        calculator: &OrderTotalCalculator,
    ) -> Result<PlaceOrderRequest, CheckoutError> {
        if self.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let items = self
            .lines()
            .iter()
            .map(|line| OrderItemRequest {
                product_id: line.id,
                quantity: line.quantity,
            })
            .collect();

        Ok(PlaceOrderRequest {
            items,
            discount_amount: self.totals(calculator).discount_amount,
            promo_code: self.applied_promo.as_ref().map(|p| p.code.clone()),
        })
    }

    /// Call once the order has been accepted: the stored cart and buy-now
    /// selection are cleared.
    pub async fn complete<R>(
        self,
        repo: &R,
    ) -> Result<(), RepositoryError>
    where
        R: CartRepository + ?Sized,
    {
        repo.set_cart(&[]).await?;
        repo.clear_buy_now().await?;
        info!(lines = self.lines().len(), "checkout completed; cart cleared");
        Ok(())
    }
}
