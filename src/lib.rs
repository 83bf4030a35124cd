//! Client-side core of a storefront with an admin back-office.
//!
//! A uniform fetch wrapper ([`net`]), a session state machine with a route
//! guard ([`session`], [`router`]), generic admin stores ([`resources`]) and a
//! persisted cart ([`cart`]), wired together by an [`AppContext`].

pub mod cart;
pub mod config;
pub mod context;
pub mod errors;
pub mod logging;
pub mod net;
pub mod notify;
pub mod resources;
pub mod router;
pub mod session;
pub mod storage;

/// Capacity of the broadcast channels (notifications, navigation, storage).
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

pub use cart::{Cart, CartItem};
pub use config::{ClientConfig, ConfigError, Endpoints, LogLevel};
pub use context::{AppContext, AppContextBuilder};
pub use errors::{CartError, ContextError, ExportError, FetchError};
pub use net::{AcceptKind, Fetcher, HeaderSet, RequestResult};
pub use notify::{Notification, Notifier, Severity};
pub use resources::{ExportedFile, Resource, ResourceStore, StoreOutcome};
pub use router::{Location, Navigator};
pub use session::{AuthOutcome, Credentials, Role, SessionManager, SessionState};
