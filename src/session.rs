//! Session and authorization.
//!
//! A session is Anonymous until a login succeeds, then Authenticated with or
//! without the admin flag. [`SessionManager`] drives the transitions against
//! the server and persists the bearer token through
//! [`ClientState`](crate::storage::ClientState).

pub mod credentials;
pub mod field_errors;
pub mod manager;
pub mod state;

pub use credentials::Credentials;
pub use field_errors::FieldErrors;
pub use manager::{AuthOutcome, SessionManager};
pub use state::{Identity, Role, SessionState};
