//! Persisted client state.
//!
//! This module provides the browser's durable per-origin key/value store
//! (**LocalStorage**) that holds the bearer token and the cart between runs.
//!
//! # Concepts
//!
//! All stores implement the [`StorageArea`] trait, which provides the
//! basic API for `get_item`, `set_item`, `remove_item`, and `clear`.
//!
//! - [`InMemoryArea`] — ephemeral, for tests and private sessions.
//! - [`SqliteStore`] — SQLite-backed durable store handing out one area per origin.
//! - [`StorageService`] — wraps an area and broadcasts a [`StorageEvent`] on
//!   every change.
//! - [`ClientState`] — typed access to the fixed `token` / `carts` keys.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use storefront_engine::storage::{ClientState, SqliteStore, StorageService};
//!
//! let origin = url::Url::parse("https://shop.example").unwrap().origin();
//! let store = SqliteStore::new("local.db").unwrap();
//! let service = StorageService::new(store.area(&origin), &origin);
//!
//! let state = ClientState::new(service.area());
//! state.replace_token("abc").unwrap();
//! ```

/// Storage area module, defining the key/value storage interface.
pub mod area;
/// Typed access to the token and cart keys.
pub mod client_state;
/// Storage change events.
pub mod event;
/// Change-notifying storage service.
pub mod service;

/// Storage backends.
pub mod local {
    /// In-memory storage implementation.
    pub mod in_memory;
    /// SQLite-backed storage implementation.
    #[cfg(feature = "sqlite_store")]
    pub mod sqlite_store;
}

pub use area::StorageArea;
pub use client_state::{ClientState, DEFAULT_CART_KEY, DEFAULT_TOKEN_KEY};
pub use event::StorageEvent;
pub use local::in_memory::InMemoryArea;
#[cfg(feature = "sqlite_store")]
pub use local::sqlite_store::SqliteStore;
pub use service::{StorageService, Subscription};
