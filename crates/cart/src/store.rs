//! The cart store: line items plus derived pricing.
//!
//! Every public operation runs inside one critical section, so a reader never
//! observes a half-applied mutation and the derived totals are always
//! consistent with each other. Mutations are validated against a copy of the
//! items before being swapped in, which means a poisoned lock can never hold
//! partial state and is simply recovered.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bitebox_core::{CartState, CurrencyCode, Money, MoneyError, ProductId};
use chrono::Utc;
use tracing::{debug, error};

use crate::checkout::CheckoutError;
use crate::error::CartError;
use crate::line_item::LineItem;
use crate::pricing::PricingPolicy;
use crate::snapshot::{CartSnapshot, CartTotals};

/// A customer's cart for one session.
///
/// This struct is cheaply cloneable via `Arc`; clones share the same
/// contents. Construct one per session and hand it to the screens that need
/// it instead of reaching for a global.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    currency: CurrencyCode,
    policy: Box<dyn PricingPolicy>,
    contents: Mutex<Contents>,
}

#[derive(Default)]
struct Contents {
    items: Vec<LineItem>,
    checkout_pending: bool,
}

impl fmt::Debug for CartStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let contents = self.lock();
        f.debug_struct("CartStore")
            .field("currency", &self.inner.currency)
            .field("items", &contents.items)
            .field("checkout_pending", &contents.checkout_pending)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Create an empty cart priced in `currency` using `policy`.
    #[must_use]
    pub fn new(currency: CurrencyCode, policy: impl PricingPolicy + 'static) -> Self {
        Self {
            inner: Arc::new(CartStoreInner {
                currency,
                policy: Box::new(policy),
                contents: Mutex::new(Contents::default()),
            }),
        }
    }

    /// Currency every item and total in this cart is expressed in.
    #[must_use]
    pub fn currency(&self) -> CurrencyCode {
        self.inner.currency
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `quantity` units of a product.
    ///
    /// If the product is already in the cart its quantity is incremented; the
    /// stored price and name are kept. Returns the resulting line.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidArgument`] for a negative price, a zero quantity,
    ///   a price in another currency, or an overflowing quantity or amount
    /// - [`CartError::Pricing`] if the policy cannot price the resulting cart
    /// - [`CartError::CheckoutInProgress`] while a checkout is pending
    pub fn add_item(
        &self,
        product_id: impl Into<ProductId>,
        name: impl Into<String>,
        unit_price: Money,
        quantity: u32,
    ) -> Result<LineItem, CartError> {
        let candidate = LineItem::new(product_id, name, unit_price, quantity)?;
        self.ensure_currency(&candidate)?;

        let mut contents = self.lock_for_update()?;
        let mut items = contents.items.clone();
        let line = match items
            .iter_mut()
            .find(|item| item.product_id() == candidate.product_id())
        {
            Some(existing) => {
                let merged = existing.incremented_quantity(quantity)?;
                existing.set_quantity(merged);
                existing.clone()
            }
            None => {
                items.push(candidate.clone());
                candidate
            }
        };
        self.price(&items)?;
        contents.items = items;
        drop(contents);

        debug!(
            product_id = %line.product_id(),
            added = quantity,
            quantity = line.quantity(),
            "Added item to cart"
        );
        Ok(line)
    }

    /// Remove a product from the cart.
    ///
    /// Removing a product that is not in the cart is a no-op. Returns the
    /// removed line, if any.
    ///
    /// # Errors
    ///
    /// - [`CartError::Pricing`] if the policy cannot price the remaining items
    /// - [`CartError::CheckoutInProgress`] while a checkout is pending
    pub fn remove_item(&self, product_id: impl AsRef<str>) -> Result<Option<LineItem>, CartError> {
        let product_id = product_id.as_ref();
        let mut contents = self.lock_for_update()?;
        let Some(idx) = position_of(&contents.items, product_id) else {
            return Ok(None);
        };

        let mut items = contents.items.clone();
        let removed = items.remove(idx);
        self.price_remaining(&items)?;
        contents.items = items;
        drop(contents);

        debug!(product_id, "Removed item from cart");
        Ok(Some(removed))
    }

    /// Replace the quantity of a product already in the cart.
    ///
    /// A quantity of zero removes the line and returns `None`.
    ///
    /// # Errors
    ///
    /// - [`CartError::NotFound`] if the product is not in the cart
    /// - [`CartError::InvalidArgument`] if the new line total overflows
    /// - [`CartError::Pricing`] if the policy cannot price the resulting cart
    /// - [`CartError::CheckoutInProgress`] while a checkout is pending
    pub fn set_quantity(
        &self,
        product_id: impl AsRef<str>,
        quantity: u32,
    ) -> Result<Option<LineItem>, CartError> {
        let product_id = product_id.as_ref();
        let mut contents = self.lock_for_update()?;
        let idx = position_of(&contents.items, product_id)
            .ok_or_else(|| CartError::NotFound(ProductId::new(product_id)))?;

        if quantity == 0 {
            let mut items = contents.items.clone();
            items.remove(idx);
            self.price_remaining(&items)?;
            contents.items = items;
            drop(contents);
            debug!(product_id, "Removed item from cart (quantity set to 0)");
            return Ok(None);
        }

        let mut items = contents.items.clone();
        let line = items.get_mut(idx).map(|item| {
            item.set_quantity(quantity);
            item.clone()
        });
        self.price(&items)?;
        contents.items = items;
        drop(contents);

        debug!(product_id, quantity, "Updated cart quantity");
        Ok(line)
    }

    /// Empty the cart. Calling it on an empty cart is fine.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::CheckoutInProgress`] while a checkout is pending.
    pub fn clear(&self) -> Result<(), CartError> {
        let mut contents = self.lock_for_update()?;
        let cleared = contents.items.len();
        contents.items.clear();
        drop(contents);

        debug!(lines = cleared, "Cleared cart");
        Ok(())
    }

    /// Replace the contents with a previously persisted collection.
    ///
    /// Every item is validated as in [`Self::add_item`] and duplicate
    /// products are merged. Nothing changes if any item is invalid.
    ///
    /// # Errors
    ///
    /// Same as [`Self::add_item`].
    pub fn restore(&self, items: Vec<LineItem>) -> Result<(), CartError> {
        let mut merged: Vec<LineItem> = Vec::with_capacity(items.len());
        for item in items {
            item.validate()?;
            self.ensure_currency(&item)?;
            match merged
                .iter_mut()
                .find(|existing| existing.product_id() == item.product_id())
            {
                Some(existing) => {
                    let quantity = existing.incremented_quantity(item.quantity())?;
                    existing.set_quantity(quantity);
                }
                None => merged.push(item),
            }
        }
        self.price(&merged)?;

        let mut contents = self.lock_for_update()?;
        contents.items = merged;
        let lines = contents.items.len();
        drop(contents);

        debug!(lines, "Restored cart contents");
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Returns `true` iff the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    #[must_use]
    pub fn state(&self) -> CartState {
        CartState::from_line_count(self.lock().items.len())
    }

    /// Number of distinct products.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lock().items.len()
    }

    /// Sum of quantities, as shown on the cart badge.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        item_count(&self.lock().items)
    }

    /// Copy of the lines in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<LineItem> {
        self.lock().items.clone()
    }

    /// Copy of a single line.
    #[must_use]
    pub fn item(&self, product_id: impl AsRef<str>) -> Option<LineItem> {
        let contents = self.lock();
        position_of(&contents.items, product_id.as_ref())
            .and_then(|idx| contents.items.get(idx).cloned())
    }

    /// Whether a checkout submission is currently pending.
    #[must_use]
    pub fn is_checkout_pending(&self) -> bool {
        self.lock().checkout_pending
    }

    /// All derived amounts, computed together.
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        let contents = self.lock();
        self.current_totals(&contents.items)
    }

    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.totals().subtotal
    }

    #[must_use]
    pub fn delivery_fee(&self) -> Money {
        self.totals().delivery_fee
    }

    #[must_use]
    pub fn tax(&self) -> Money {
        self.totals().tax
    }

    #[must_use]
    pub fn total(&self) -> Money {
        self.totals().total
    }

    /// Atomic copy of items and totals.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        let contents = self.lock();
        self.snapshot_of(&contents.items)
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Lock the cart for checkout and take the snapshot to submit.
    ///
    /// Until the returned guard is dropped, mutations fail with
    /// [`CartError::CheckoutInProgress`]. Call [`CheckoutGuard::complete`]
    /// once the order is accepted; dropping the guard without completing
    /// leaves the cart exactly as it was.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::EmptyCart`] if there is nothing to order
    /// - [`CheckoutError::InProgress`] if another checkout holds the cart
    /// - [`CheckoutError::Pricing`] if the policy cannot price the items
    pub fn begin_checkout(&self) -> Result<CheckoutGuard<'_>, CheckoutError> {
        let mut contents = self.lock();
        if contents.checkout_pending {
            return Err(CheckoutError::InProgress);
        }
        if !CartState::from_line_count(contents.items.len()).can_checkout() {
            return Err(CheckoutError::EmptyCart);
        }
        let totals = self.price(&contents.items).map_err(CheckoutError::Pricing)?;
        contents.checkout_pending = true;
        let snapshot = CartSnapshot {
            currency: self.inner.currency,
            items: contents.items.clone(),
            totals,
            taken_at: Utc::now(),
        };
        drop(contents);

        Ok(CheckoutGuard {
            cart: self,
            snapshot,
        })
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn lock(&self) -> MutexGuard<'_, Contents> {
        self.inner
            .contents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_for_update(&self) -> Result<MutexGuard<'_, Contents>, CartError> {
        let contents = self.lock();
        if contents.checkout_pending {
            return Err(CartError::CheckoutInProgress);
        }
        Ok(contents)
    }

    fn ensure_currency(&self, item: &LineItem) -> Result<(), CartError> {
        let found = item.unit_price().currency_code;
        if found == self.inner.currency {
            Ok(())
        } else {
            Err(CartError::invalid(format!(
                "{} is priced in {found} but the cart uses {}",
                item.product_id(),
                self.inner.currency
            )))
        }
    }

    /// Price `items` with checked arithmetic.
    ///
    /// Mutations run this on their candidate state before applying it, so a
    /// non-empty cart can always be priced by a deterministic policy.
    fn price(&self, items: &[LineItem]) -> Result<CartTotals, CartError> {
        let currency = self.inner.currency;
        let mut subtotal = Money::zero(currency);
        for item in items {
            subtotal = subtotal
                .checked_add(item.line_total()?)
                .map_err(|e| CartError::invalid(format!("cart subtotal: {e}")))?;
        }

        let delivery_fee = self.policy_amount("delivery fee", self.inner.policy.delivery_fee(subtotal))?;
        let tax = self.policy_amount("tax", self.inner.policy.tax(subtotal))?;
        let total = subtotal
            .checked_add(delivery_fee)
            .and_then(|sum| sum.checked_add(tax))
            .map_err(|e| CartError::Pricing(format!("cart total: {e}")))?;

        Ok(CartTotals {
            subtotal,
            delivery_fee,
            tax,
            total,
            item_count: item_count(items),
        })
    }

    fn policy_amount(
        &self,
        label: &str,
        amount: Result<Money, MoneyError>,
    ) -> Result<Money, CartError> {
        let amount = amount.map_err(|e| CartError::Pricing(format!("{label}: {e}")))?;
        if amount.currency_code != self.inner.currency {
            return Err(CartError::Pricing(format!(
                "{label} is in {} but the cart uses {}",
                amount.currency_code, self.inner.currency
            )));
        }
        if amount.is_negative() {
            return Err(CartError::Pricing(format!(
                "{label} cannot be negative (got {amount})"
            )));
        }
        Ok(amount)
    }

    /// Price what remains after a removal. Emptying the cart always succeeds.
    fn price_remaining(&self, items: &[LineItem]) -> Result<(), CartError> {
        if !items.is_empty() {
            self.price(items)?;
        }
        Ok(())
    }

    fn current_totals(&self, items: &[LineItem]) -> CartTotals {
        // Every non-empty state was priced before it was applied, so this
        // only fails for an empty cart or a non-deterministic policy.
        self.price(items).unwrap_or_else(|e| {
            error!(error = %e, "Cart totals unavailable");
            CartTotals::zero(self.inner.currency)
        })
    }

    fn snapshot_of(&self, items: &[LineItem]) -> CartSnapshot {
        CartSnapshot {
            currency: self.inner.currency,
            items: items.to_vec(),
            totals: self.current_totals(items),
            taken_at: Utc::now(),
        }
    }
}

fn position_of(items: &[LineItem], product_id: &str) -> Option<usize> {
    items
        .iter()
        .position(|item| item.product_id().as_str() == product_id)
}

fn item_count(items: &[LineItem]) -> u64 {
    items
        .iter()
        .fold(0u64, |acc, item| acc.saturating_add(u64::from(item.quantity())))
}

/// Exclusive hold on a cart during checkout.
///
/// Returned by [`CartStore::begin_checkout`].
#[must_use = "dropping the guard releases the cart without clearing it"]
pub struct CheckoutGuard<'a> {
    cart: &'a CartStore,
    snapshot: CartSnapshot,
}

impl CheckoutGuard<'_> {
    /// The snapshot taken when checkout began.
    #[must_use]
    pub const fn snapshot(&self) -> &CartSnapshot {
        &self.snapshot
    }

    /// Mark the order as submitted: empties the cart and releases the lock.
    pub fn complete(self) {
        self.cart.lock().items.clear();
    }
}

impl Drop for CheckoutGuard<'_> {
    fn drop(&mut self) {
        self.cart.lock().checkout_pending = false;
    }
}
