//! HTTP response models.
//!
//! [`Response`] is the **fully buffered** response handed back by an
//! [`HttpBackend`](crate::net::HttpBackend): final URL, status code + reason,
//! headers and the raw body bytes, exactly as received.
//!
//! [`RequestResult`] is what callers of the fetch wrapper see: the status, a
//! payload whose shape follows the negotiated content type, and the
//! suggested filename of a download.
//!
//! ## Notes
//! - `headers` is an `http::HeaderMap`, which is **case-insensitive** for
//!   header names.
//! - A `RequestResult` is created per call and owned by the caller. Nothing
//!   about it is shared between calls.
use crate::session::FieldErrors;
use http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use http::HeaderMap;
use serde_json::Value;

/// Simple structure for HTTP responses.
///
/// All fields reflect the **received** response as-is; no additional parsing
/// or transformation is performed by this type.
#[derive(Debug, Clone)]
pub struct Response {
    /// Final URL of the response (after redirects, if any).
    pub url: url::Url,

    /// Numeric HTTP status code (e.g., `200`, `404`).
    pub status: u16,

    /// Human-readable reason phrase (e.g., `"OK"`, `"Not Found"`).
    ///
    /// May be `"Unknown"` for non-standard codes.
    pub status_text: String,

    /// Response headers as a case-insensitive map.
    pub headers: HeaderMap,

    /// Raw response body bytes.
    pub body: Vec<u8>,
}

impl Response {
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// Filename suggested by `Content-Disposition: attachment; filename=...`.
    pub fn attachment_filename(&self) -> Option<String> {
        let disposition = self.headers.get(CONTENT_DISPOSITION)?.to_str().ok()?;
        parse_attachment_filename(disposition)
    }
}

fn parse_attachment_filename(disposition: &str) -> Option<String> {
    if !disposition.to_ascii_lowercase().contains("attachment") {
        return None;
    }

    let start = disposition.find("filename=")? + "filename=".len();
    let raw = disposition[start..].split(';').next()?.trim();
    let name = raw.trim_matches('"').trim();

    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Body of a [`RequestResult`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    /// Parsed JSON document (`Accept: application/json`).
    Json(Value),
    /// Raw file contents (`Accept: text/csv`).
    Binary(Vec<u8>),
    /// No body: a no-content status, or a call that failed in transport.
    #[default]
    Empty,
}

/// Normalized outcome of one HTTP call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestResult {
    pub status: u16,
    pub payload: Payload,
    pub filename: Option<String>,
}

impl RequestResult {
    pub fn new(status: u16, payload: Payload) -> Self {
        Self {
            status,
            payload,
            filename: None,
        }
    }

    /// Default result for a call that never produced a usable response.
    pub fn failure(sentinel: u16) -> Self {
        Self::new(sentinel, Payload::Empty)
    }

    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    pub fn is_unprocessable(&self) -> bool {
        self.status == 422
    }

    pub fn json(&self) -> Option<&Value> {
        match &self.payload {
            Payload::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.payload {
            Payload::Binary(b) => Some(b),
            _ => None,
        }
    }

    /// The server's `message` field, if any.
    pub fn message(&self) -> Option<&str> {
        self.json()?.get("message")?.as_str()
    }

    /// The `data` envelope of a JSON payload.
    pub fn data(&self) -> Option<&Value> {
        self.json()?.get("data")
    }

    /// Field-level validation errors from the `errors` field.
    pub fn field_errors(&self) -> Option<FieldErrors> {
        let errors = self.json()?.get("errors")?;
        serde_json::from_value(errors.clone()).ok()
    }
}
