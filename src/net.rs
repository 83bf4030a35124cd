//! Transport layer.
//!
//! Issues HTTP requests and reduces every response to a uniform
//! [`RequestResult`]. Callers branch on the status, read the payload, and can
//! rely on transport failures never surfacing as errors.
//!
//! - [`HeaderSet`] — per-call request headers (content negotiation + bearer).
//! - [`HttpBackend`] — the network seam; [`ReqwestBackend`] and [`ScriptedBackend`].
//! - [`Fetcher`] — `get`, `post_or_patch`, `delete`, `post_file`.

pub mod backend;
pub mod fetch;
pub mod headers;
pub mod response;
pub mod scripted;

pub use backend::{FormPart, HttpBackend, MultipartForm, ReqwestBackend, Request, RequestBody};
pub use fetch::{normalize, Fetcher, DEFAULT_FAILURE_STATUS};
pub use headers::{AcceptKind, HeaderSet};
pub use response::{Payload, RequestResult, Response};
pub use scripted::{Canned, ScriptedBackend};
