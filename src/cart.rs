//! Shopping cart persisted in the client state.
//!
//! The cart lives only in storage under the cart key as a JSON array. Each
//! operation reads it, applies the change and writes the whole array back, so
//! a session teardown that drops the key empties the cart everywhere.
use crate::errors::CartError;
use crate::notify::Notifier;
use crate::storage::ClientState;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub name: String,
    pub price: f64,
    #[serde(default = "one")]
    pub quantity: u32,
    /// Cover image URL.
    #[serde(default, alias = "url", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

fn one() -> u32 {
    1
}

impl CartItem {
    pub fn new(product_id: impl Into<String>, name: impl Into<String>, price: f64) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            price,
            quantity: 1,
            image: None,
        }
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(url.into());
        self
    }

    pub fn subtotal(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

pub struct Cart {
    state: ClientState,
    notifier: Notifier,
    // Serializes read-modify-write cycles of this handle.
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for Cart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cart").field("state", &self.state).finish_non_exhaustive()
    }
}

impl Cart {
    pub fn new(state: ClientState, notifier: Notifier) -> Self {
        Self {
            state,
            notifier,
            write_lock: Mutex::new(()),
        }
    }

    /// Reads the persisted cart. A missing key is an empty cart.
    pub fn load(&self) -> Result<Vec<CartItem>, CartError> {
        match self.state.cart_json() {
            Some(json) if !json.trim().is_empty() => Ok(serde_json::from_str(&json)?),
            _ => Ok(vec![]),
        }
    }

    /// Like [`load`](Self::load), but a cart that cannot be decoded reads as
    /// empty.
    pub fn items(&self) -> Vec<CartItem> {
        self.load().unwrap_or_else(|e| {
            log::warn!("discarding unreadable cart: {e}");
            vec![]
        })
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    pub fn total(&self) -> f64 {
        self.items().iter().map(CartItem::subtotal).sum()
    }

    /// Adds `quantity` of `item`. An item already in the cart (same product
    /// id) has its quantity increased instead.
    pub fn add(&self, mut item: CartItem, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }

        let name = item.name.clone();
        self.modify(|items| {
            match items.iter_mut().find(|i| i.product_id == item.product_id) {
                Some(existing) => existing.quantity = existing.quantity.saturating_add(quantity),
                None => {
                    item.quantity = quantity;
                    items.push(item);
                }
            }
            Ok(())
        })?;

        self.notifier.success(format!("Added {name} to the cart"));
        Ok(())
    }

    /// Sets the quantity of the item with `product_id`.
    pub fn update(&self, product_id: &str, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }

        self.modify(|items| {
            let item = items
                .iter_mut()
                .find(|i| i.product_id == product_id)
                .ok_or_else(|| CartError::NotFound(product_id.to_string()))?;
            item.quantity = quantity;
            Ok(())
        })
    }

    pub fn remove(&self, product_id: &str) -> Result<CartItem, CartError> {
        self.modify(|items| {
            let idx = items
                .iter()
                .position(|i| i.product_id == product_id)
                .ok_or_else(|| CartError::NotFound(product_id.to_string()))?;
            Ok(items.remove(idx))
        })
    }

    pub fn clear(&self) -> Result<(), CartError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.state.clear_cart()?;
        Ok(())
    }

    fn modify<T>(&self, f: impl FnOnce(&mut Vec<CartItem>) -> Result<T, CartError>) -> Result<T, CartError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut items = self.load()?;
        let out = f(&mut items)?;
        let json = serde_json::to_string(&items)?;
        self.state.save_cart_json(&json)?;
        log::debug!("cart now holds {} item(s)", items.len());
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryArea, StorageArea};
    use std::sync::Arc;

    fn cart() -> (Arc<InMemoryArea>, Cart) {
        let area = Arc::new(InMemoryArea::new());
        let cart = Cart::new(ClientState::new(area.clone()), Notifier::default());
        (area, cart)
    }

    #[test]
    fn empty_without_stored_cart() {
        let (_, cart) = cart();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), 0.0);
    }

    #[test]
    fn add_merges_by_product_id() {
        let (_, cart) = cart();
        cart.add(CartItem::new("p1", "Dune", 10.0), 1).unwrap();
        cart.add(CartItem::new("p2", "Emma", 4.5), 2).unwrap();
        cart.add(CartItem::new("p1", "Dune", 10.0), 3).unwrap();

        let items = cart.items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].quantity, 4);
        assert_eq!(cart.total(), 49.0);
    }

    #[test]
    fn add_notifies() {
        let (_, cart) = cart();
        cart.add(CartItem::new("p1", "Dune", 10.0), 1).unwrap();
        assert_eq!(cart.notifier.last().unwrap().detail, "Added Dune to the cart");
    }

    #[test]
    fn every_mutation_is_persisted() {
        let (area, cart) = cart();
        cart.add(CartItem::new("p1", "Dune", 10.0).with_image("/img/dune.jpg"), 1).unwrap();
        cart.update("p1", 5).unwrap();

        let stored: Vec<CartItem> = serde_json::from_str(&area.get_item("carts").unwrap()).unwrap();
        assert_eq!(stored[0].quantity, 5);
        assert_eq!(stored[0].image.as_deref(), Some("/img/dune.jpg"));

        let removed = cart.remove("p1").unwrap();
        assert_eq!(removed.product_id, "p1");
        assert_eq!(area.get_item("carts").as_deref(), Some("[]"));
    }

    #[test]
    fn unknown_items_and_zero_quantities_are_rejected() {
        let (_, cart) = cart();
        assert!(matches!(cart.update("nope", 1), Err(CartError::NotFound(_))));
        assert!(matches!(cart.remove("nope"), Err(CartError::NotFound(_))));
        assert!(matches!(cart.add(CartItem::new("p1", "Dune", 1.0), 0), Err(CartError::ZeroQuantity)));
        cart.add(CartItem::new("p1", "Dune", 1.0), 1).unwrap();
        assert!(matches!(cart.update("p1", 0), Err(CartError::ZeroQuantity)));
    }

    #[test]
    fn reads_cart_written_elsewhere() {
        let area = Arc::new(InMemoryArea::with_items([(
            "carts",
            r#"[{"product_id":"p9","name":"Ulysses","price":"oops"}]"#,
        )]));
        let cart = Cart::new(ClientState::new(area.clone()), Notifier::default());
        assert!(cart.load().is_err());
        assert!(cart.items().is_empty());

        area.set_item("carts", r#"[{"product_id":"p9","name":"Ulysses","price":12,"url":"/u.jpg"}]"#)
            .unwrap();
        let items = cart.load().unwrap();
        assert_eq!(items[0].quantity, 1);
        assert_eq!(items[0].image.as_deref(), Some("/u.jpg"));
    }

    #[test]
    fn teardown_empties_the_cart() {
        let (area, cart) = cart();
        cart.add(CartItem::new("p1", "Dune", 10.0), 1).unwrap();
        ClientState::new(area.clone()).clear_session_data().unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn clear_removes_the_key() {
        let (area, cart) = cart();
        cart.add(CartItem::new("p1", "Dune", 10.0), 1).unwrap();
        cart.clear().unwrap();
        assert!(area.get_item("carts").is_none());
    }
}
