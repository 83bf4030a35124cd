//! Scripted backend that does not perform any network I/O.
//!
//! Responses are registered per `(method, path)` and replayed in order. When
//! a route has a single response left it is replayed indefinitely. Every
//! request is recorded so callers can assert on what was sent.
use crate::errors::FetchError;
use crate::net::backend::{HttpBackend, Request};
use crate::net::headers::{APPLICATION_JSON, TEXT_CSV};
use crate::net::Response;
use async_trait::async_trait;
use http::header::{HeaderValue, CONTENT_DISPOSITION, CONTENT_TYPE};
use http::{HeaderMap, Method, StatusCode};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// A canned response.
#[derive(Debug, Clone)]
pub struct Canned {
    status: u16,
    headers: HeaderMap,
    body: Vec<u8>,
    network_error: Option<String>,
}

impl Canned {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: vec![],
            network_error: None,
        }
    }

    /// JSON body with `Content-Type: application/json`.
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self::new(status)
            .header(CONTENT_TYPE.as_str(), APPLICATION_JSON)
            .body(body.to_string().into_bytes())
    }

    /// CSV attachment with the given filename.
    pub fn csv(status: u16, filename: &str, body: &[u8]) -> Self {
        Self::new(status)
            .header(CONTENT_TYPE.as_str(), &format!("{TEXT_CSV}; charset=UTF-8"))
            .header(CONTENT_DISPOSITION.as_str(), &format!("attachment; filename={filename}"))
            .body(body.to_vec())
    }

    /// The request fails before any response arrives.
    pub fn network_error(message: &str) -> Self {
        let mut canned = Self::new(0);
        canned.network_error = Some(message.to_string());
        canned
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (
            http::header::HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(n), Ok(v)) => {
                self.headers.insert(n, v);
            }
            _ => log::warn!("Ignoring invalid scripted header {name}: {value}"),
        }
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }
}

/// Backend replaying [`Canned`] responses.
#[derive(Default)]
pub struct ScriptedBackend {
    routes: Mutex<HashMap<(Method, String), VecDeque<Canned>>>,
    requests: Mutex<Vec<Request>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `canned` for `method path`. The path is matched without the
    /// query string.
    pub fn on(&self, method: Method, path: &str, canned: Canned) -> &Self {
        let mut routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
        routes
            .entry((method, path.to_string()))
            .or_default()
            .push_back(canned);
        self
    }

    /// All requests received so far, in order.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn last_request(&self) -> Option<Request> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).last().cloned()
    }

    fn next_for(&self, method: &Method, path: &str) -> Option<Canned> {
        let mut routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
        let queue = routes.get_mut(&(method.clone(), path.to_string()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl HttpBackend for ScriptedBackend {
    async fn send(&self, request: Request) -> Result<Response, FetchError> {
        let method = request.method.clone();
        let path = request.url.path().to_string();
        let url = request.url.clone();

        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        let canned = self
            .next_for(&method, &path)
            .ok_or(FetchError::Unscripted { method, path })?;

        if let Some(message) = canned.network_error {
            return Err(FetchError::Network(message));
        }

        let status_text = StatusCode::from_u16(canned.status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown")
            .to_string();

        Ok(Response {
            url,
            status: canned.status,
            status_text,
            headers: canned.headers,
            body: canned.body,
        })
    }
}
