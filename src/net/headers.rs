//! Request header construction.
//!
//! Every call builds a fresh [`HeaderSet`]: the content negotiation fields
//! (`Accept` and, for JSON bodies, `Content-Type`) plus an optional bearer
//! `Authorization` field. The transport reads it but never mutates it.
use http::header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use http::HeaderMap;

pub const APPLICATION_JSON: &str = "application/json";
pub const TEXT_CSV: &str = "text/csv";

/// Response representation negotiated by the `Accept` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptKind {
    /// JSON document, parsed into a [`serde_json::Value`].
    Json,
    /// File download, kept as raw bytes with a suggested filename.
    Csv,
}

impl AcceptKind {
    pub fn mime(&self) -> &'static str {
        match self {
            AcceptKind::Json => APPLICATION_JSON,
            AcceptKind::Csv => TEXT_CSV,
        }
    }

    /// Classifies an `Accept` value. CSV wins when both are listed, since a
    /// download endpoint answers errors as JSON but its payload is the file.
    pub fn from_accept(value: &str) -> Option<Self> {
        let value = value.to_ascii_lowercase();
        if value.contains(TEXT_CSV) {
            Some(AcceptKind::Csv)
        } else if value.contains(APPLICATION_JSON) {
            Some(AcceptKind::Json)
        } else {
            None
        }
    }
}

/// Headers for one request.
#[derive(Debug, Clone, Default)]
pub struct HeaderSet {
    map: HeaderMap,
}

impl HeaderSet {
    /// No headers at all. Requests sent with this set are not negotiable and
    /// resolve to a failure result.
    pub fn empty() -> Self {
        Self::default()
    }

    /// `Accept` and `Content-Type` set to `application/json`.
    pub fn json() -> Self {
        let mut map = HeaderMap::new();
        map.insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));
        map.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        Self { map }
    }

    /// `Accept: text/csv` for export endpoints.
    pub fn csv() -> Self {
        let mut map = HeaderMap::new();
        map.insert(ACCEPT, HeaderValue::from_static(TEXT_CSV));
        Self { map }
    }

    /// `Accept: application/json` without a `Content-Type`; the multipart
    /// boundary is chosen by the backend.
    pub fn multipart() -> Self {
        let mut map = HeaderMap::new();
        map.insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));
        Self { map }
    }

    pub fn for_accept(kind: AcceptKind) -> Self {
        match kind {
            AcceptKind::Json => Self::json(),
            AcceptKind::Csv => Self::csv(),
        }
    }

    /// Adds `Authorization: Bearer <token>`. A token that is not a valid
    /// header value is dropped, which the server answers with a 401.
    pub fn with_bearer(mut self, token: &str) -> Self {
        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                self.map.insert(AUTHORIZATION, value);
            }
            Err(_) => log::warn!("Bearer token contains invalid header characters; not attached"),
        }
        self
    }

    pub fn accept(&self) -> Option<AcceptKind> {
        self.accept_raw().and_then(AcceptKind::from_accept)
    }

    pub fn accept_raw(&self) -> Option<&str> {
        self.map.get(ACCEPT).and_then(|v| v.to_str().ok())
    }

    pub fn has_bearer(&self) -> bool {
        self.map.contains_key(AUTHORIZATION)
    }

    pub fn as_map(&self) -> &HeaderMap {
        &self.map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_headers_negotiate_json() {
        let h = HeaderSet::json();
        assert_eq!(h.accept(), Some(AcceptKind::Json));
        assert_eq!(h.as_map().get(CONTENT_TYPE).unwrap(), APPLICATION_JSON);
        assert!(!h.has_bearer());
    }

    #[test]
    fn multipart_headers_leave_content_type_to_backend() {
        let h = HeaderSet::multipart();
        assert_eq!(h.accept(), Some(AcceptKind::Json));
        assert!(h.as_map().get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn bearer_is_attached_and_sensitive() {
        let h = HeaderSet::json().with_bearer("abc");
        let value = h.as_map().get(AUTHORIZATION).unwrap();
        assert_eq!(value, "Bearer abc");
        assert!(value.is_sensitive());
    }

    #[test]
    fn bearer_with_newline_is_dropped() {
        let h = HeaderSet::json().with_bearer("abc\ndef");
        assert!(!h.has_bearer());
    }

    #[test]
    fn csv_takes_precedence_in_mixed_accept() {
        assert_eq!(AcceptKind::from_accept("application/json, text/csv"), Some(AcceptKind::Csv));
        assert_eq!(AcceptKind::from_accept("Application/JSON"), Some(AcceptKind::Json));
        assert_eq!(AcceptKind::from_accept("text/html"), None);
    }

    #[test]
    fn empty_set_is_not_negotiable() {
        assert_eq!(HeaderSet::empty().accept(), None);
    }
}
