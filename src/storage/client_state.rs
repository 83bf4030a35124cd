use super::area::StorageArea;
use anyhow::Result;
use std::sync::Arc;

pub const DEFAULT_TOKEN_KEY: &str = "token";
pub const DEFAULT_CART_KEY: &str = "carts";

/// Typed view over the persisted client state: the bearer token and the
/// serialized cart.
///
/// Nothing is cached. Each accessor reads the backing area at call time, and
/// each write replaces the whole value under its key.
#[derive(Clone)]
pub struct ClientState {
    area: Arc<dyn StorageArea>,
    token_key: String,
    cart_key: String,
}

impl std::fmt::Debug for ClientState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientState")
            .field("token_key", &self.token_key)
            .field("cart_key", &self.cart_key)
            .field("has_token", &self.has_token())
            .finish()
    }
}

impl ClientState {
    pub fn new(area: Arc<dyn StorageArea>) -> Self {
        Self::with_keys(area, DEFAULT_TOKEN_KEY, DEFAULT_CART_KEY)
    }

    pub fn with_keys(area: Arc<dyn StorageArea>, token_key: &str, cart_key: &str) -> Self {
        Self {
            area,
            token_key: token_key.to_string(),
            cart_key: cart_key.to_string(),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.area.get_item(&self.token_key).filter(|t| !t.is_empty())
    }

    pub fn has_token(&self) -> bool {
        self.token().is_some()
    }

    /// Stores `token`, replacing any previous one.
    pub fn replace_token(&self, token: &str) -> Result<()> {
        self.area.set_item(&self.token_key, token)
    }

    pub fn clear_token(&self) -> Result<()> {
        self.area.remove_item(&self.token_key)
    }

    pub fn cart_json(&self) -> Option<String> {
        self.area.get_item(&self.cart_key)
    }

    pub fn save_cart_json(&self, json: &str) -> Result<()> {
        self.area.set_item(&self.cart_key, json)
    }

    pub fn clear_cart(&self) -> Result<()> {
        self.area.remove_item(&self.cart_key)
    }

    /// Drops everything tied to the signed-in user.
    pub fn clear_session_data(&self) -> Result<()> {
        self.clear_token()?;
        self.clear_cart()
    }

    pub fn area(&self) -> &Arc<dyn StorageArea> {
        &self.area
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryArea;

    #[test]
    fn token_is_replaced_not_appended() {
        let state = ClientState::new(Arc::new(InMemoryArea::new()));
        assert!(state.token().is_none());

        state.replace_token("first").unwrap();
        state.replace_token("second").unwrap();

        assert_eq!(state.token().as_deref(), Some("second"));
        assert_eq!(state.area().keys(), vec!["token".to_string()]);
    }

    #[test]
    fn empty_token_counts_as_absent() {
        let state = ClientState::new(Arc::new(InMemoryArea::with_items([("token", "")])));
        assert!(!state.has_token());
    }

    #[test]
    fn reads_are_fresh() {
        let area: Arc<dyn StorageArea> = Arc::new(InMemoryArea::new());
        let a = ClientState::new(area.clone());
        let b = ClientState::new(area.clone());

        a.replace_token("abc").unwrap();
        assert_eq!(b.token().as_deref(), Some("abc"));

        area.remove_item("token").unwrap();
        assert!(a.token().is_none());
    }

    #[test]
    fn clear_session_data_keeps_unrelated_keys() {
        let area: Arc<dyn StorageArea> = Arc::new(InMemoryArea::with_items([
            ("token", "abc"),
            ("carts", "[]"),
            ("theme", "dark"),
        ]));
        let state = ClientState::new(area.clone());

        state.clear_session_data().unwrap();

        assert_eq!(area.keys(), vec!["theme".to_string()]);
    }

    #[test]
    fn custom_keys() {
        let area: Arc<dyn StorageArea> = Arc::new(InMemoryArea::new());
        let state = ClientState::with_keys(area.clone(), "auth", "basket");
        state.replace_token("t").unwrap();
        state.save_cart_json("[]").unwrap();
        assert_eq!(area.keys(), vec!["auth".to_string(), "basket".to_string()]);
    }
}
