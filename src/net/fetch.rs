use crate::errors::FetchError;
use crate::net::backend::{HttpBackend, MultipartForm, Request, RequestBody};
use crate::net::headers::{AcceptKind, HeaderSet};
use crate::net::{Payload, RequestResult, Response};
use http::Method;
use serde::Serialize;
use std::sync::Arc;
use url::Url;

/// Status used for calls that never produced a usable response.
pub const DEFAULT_FAILURE_STATUS: u16 = 400;

/// The fetch wrapper.
///
/// Performs one round trip per call and reduces it to a [`RequestResult`].
/// Transport failures (network errors, content type mismatches, undecodable
/// bodies) are logged and turned into [`RequestResult::failure`]; they never
/// reach the caller as errors. Non-2xx responses are returned as data.
///
/// A `Fetcher` holds no per-call state, so concurrent calls never observe each
/// other's results.
#[derive(Clone)]
pub struct Fetcher {
    backend: Arc<dyn HttpBackend>,
    base_url: Url,
    failure_status: u16,
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("base_url", &self.base_url.as_str())
            .field("failure_status", &self.failure_status)
            .finish_non_exhaustive()
    }
}

impl Fetcher {
    pub fn new(backend: Arc<dyn HttpBackend>, base_url: Url) -> Self {
        Self {
            backend,
            base_url,
            failure_status: DEFAULT_FAILURE_STATUS,
        }
    }

    pub fn with_failure_status(mut self, status: u16) -> Self {
        self.failure_status = status;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn failure_status(&self) -> u16 {
        self.failure_status
    }

    /// GET `uri`. JSON or file-download semantics follow `headers`' Accept.
    pub async fn get(&self, uri: &str, headers: &HeaderSet) -> RequestResult {
        let result = self.exchange(Method::GET, uri, RequestBody::Empty, headers).await;
        self.absorb(Method::GET, uri, result)
    }

    /// Serializes `body` to JSON and sends it with `method` (POST or PATCH).
    pub async fn post_or_patch<T: Serialize + ?Sized>(
        &self,
        method: Method,
        uri: &str,
        body: &T,
        headers: &HeaderSet,
    ) -> RequestResult {
        let result = match encode_json(&method, body) {
            Ok(body) => self.exchange(method.clone(), uri, body, headers).await,
            Err(e) => Err(e),
        };
        self.absorb(method, uri, result)
    }

    pub async fn delete(&self, uri: &str, headers: &HeaderSet) -> RequestResult {
        let result = self.exchange(Method::DELETE, uri, RequestBody::Empty, headers).await;
        self.absorb(Method::DELETE, uri, result)
    }

    /// POSTs a multipart body. The response is normalized like any other call.
    pub async fn post_file(&self, uri: &str, form: MultipartForm, headers: &HeaderSet) -> RequestResult {
        let result = self
            .exchange(Method::POST, uri, RequestBody::Multipart(form), headers)
            .await;
        self.absorb(Method::POST, uri, result)
    }

    pub fn resolve(&self, uri: &str) -> Result<Url, FetchError> {
        self.base_url.join(uri).map_err(|e| FetchError::InvalidUri {
            uri: uri.to_string(),
            reason: e.to_string(),
        })
    }

    async fn exchange(
        &self,
        method: Method,
        uri: &str,
        body: RequestBody,
        headers: &HeaderSet,
    ) -> Result<RequestResult, FetchError> {
        let accept = headers
            .accept()
            .ok_or_else(|| FetchError::NotNegotiable(headers.accept_raw().map(str::to_string)))?;

        let request = Request {
            method,
            url: self.resolve(uri)?,
            headers: headers.as_map().clone(),
            body,
        };

        let response = self.backend.send(request).await?;
        normalize(accept, response)
    }

    fn absorb(&self, method: Method, uri: &str, result: Result<RequestResult, FetchError>) -> RequestResult {
        match result {
            Ok(r) => {
                log::debug!("{method} {uri} -> {}", r.status);
                r
            }
            Err(e) => {
                log::error!("{method} {uri} failed: {e}");
                RequestResult::failure(self.failure_status)
            }
        }
    }
}

fn encode_json<T: Serialize + ?Sized>(method: &Method, body: &T) -> Result<RequestBody, FetchError> {
    if *method != Method::POST && *method != Method::PATCH {
        return Err(FetchError::UnsupportedMethod(method.clone()));
    }

    serde_json::to_vec(body)
        .map(RequestBody::Json)
        .map_err(|e| FetchError::Encode(e.to_string()))
}

/// Reduces a raw response to a [`RequestResult`] according to the
/// negotiated representation.
///
/// The payload shape is decided by `accept` and the response's declared
/// content type only, never by sniffing the body.
pub fn normalize(accept: AcceptKind, response: Response) -> Result<RequestResult, FetchError> {
    // 204 / 205 carry no body and usually no content type.
    if response.status == 204 || response.status == 205 {
        return Ok(RequestResult::new(response.status, Payload::Empty));
    }

    let content_type = response.content_type().map(str::to_ascii_lowercase);
    let matches = content_type
        .as_deref()
        .is_some_and(|ct| ct.contains(accept.mime()));
    if !matches {
        return Err(FetchError::ContentTypeMismatch {
            expected: accept.mime(),
            actual: content_type,
        });
    }

    match accept {
        AcceptKind::Json => {
            let value = serde_json::from_slice(&response.body).map_err(|e| FetchError::Decode(e.to_string()))?;
            Ok(RequestResult::new(response.status, Payload::Json(value)))
        }
        AcceptKind::Csv => {
            let filename = response.attachment_filename();
            Ok(RequestResult {
                status: response.status,
                payload: Payload::Binary(response.body),
                filename,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{Canned, ScriptedBackend};
    use http::header::{AUTHORIZATION, CONTENT_TYPE};
    use serde_json::json;

    fn fetcher(backend: Arc<ScriptedBackend>) -> Fetcher {
        Fetcher::new(backend, Url::parse("http://shop.test/").unwrap())
    }

    #[tokio::test]
    async fn get_json_returns_status_and_data() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.on(
            Method::GET,
            "/api/categories",
            Canned::json(200, json!({"data": [{"id": "c1", "name": "Novels"}]})),
        );

        let r = fetcher(backend.clone()).get("/api/categories", &HeaderSet::json()).await;

        assert_eq!(r.status, 200);
        assert_eq!(r.data().unwrap()[0]["name"], "Novels");
        assert!(r.filename.is_none());
    }

    #[tokio::test]
    async fn content_type_mismatch_yields_failure_result() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.on(
            Method::GET,
            "/api/categories",
            Canned::new(200).header("content-type", "text/html").body(b"<html>".to_vec()),
        );

        let r = fetcher(backend).get("/api/categories", &HeaderSet::json()).await;

        assert_eq!(r, RequestResult::failure(DEFAULT_FAILURE_STATUS));
    }

    #[tokio::test]
    async fn csv_accept_rejects_json_response() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.on(
            Method::GET,
            "/api/admin/orders/export",
            Canned::json(200, json!({"message": "not a file"})),
        );

        let r = fetcher(backend)
            .with_failure_status(499)
            .get("/api/admin/orders/export", &HeaderSet::csv())
            .await;

        assert_eq!(r.status, 499);
        assert_eq!(r.payload, Payload::Empty);
    }

    #[tokio::test]
    async fn csv_download_keeps_bytes_and_filename() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.on(
            Method::GET,
            "/api/admin/categories/export",
            Canned::csv(200, "categories.csv", b"id,name\nc1,Novels\n"),
        );

        let r = fetcher(backend)
            .get("/api/admin/categories/export", &HeaderSet::csv())
            .await;

        assert_eq!(r.status, 200);
        assert_eq!(r.bytes(), Some(&b"id,name\nc1,Novels\n"[..]));
        assert_eq!(r.filename.as_deref(), Some("categories.csv"));
    }

    #[tokio::test]
    async fn network_failure_yields_failure_result() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.on(Method::GET, "/api/products", Canned::network_error("connection reset"));

        let r = fetcher(backend).get("/api/products", &HeaderSet::json()).await;

        assert_eq!(r, RequestResult::failure(400));
    }

    #[tokio::test]
    async fn undecodable_json_yields_failure_result() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.on(
            Method::GET,
            "/api/products",
            Canned::new(200)
                .header("content-type", "application/json")
                .body(b"{not json".to_vec()),
        );

        let r = fetcher(backend).get("/api/products", &HeaderSet::json()).await;

        assert_eq!(r, RequestResult::failure(400));
    }

    #[tokio::test]
    async fn non_success_status_is_returned_as_data() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.on(
            Method::POST,
            "/api/admin/categories",
            Canned::json(422, json!({"message": "Invalid", "errors": {"name": ["required"]}})),
        );

        let r = fetcher(backend)
            .post_or_patch(Method::POST, "/api/admin/categories", &json!({"name": ""}), &HeaderSet::json())
            .await;

        assert_eq!(r.status, 422);
        assert_eq!(r.message(), Some("Invalid"));
        assert_eq!(r.field_errors().unwrap().get("name"), Some(&["required".to_string()][..]));
    }

    #[tokio::test]
    async fn post_serializes_body_and_forwards_headers() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.on(
            Method::PATCH,
            "/api/admin/suppliers/s1",
            Canned::json(200, json!({"message": "Updated"})),
        );

        let headers = HeaderSet::json().with_bearer("tok");
        let r = fetcher(backend.clone())
            .post_or_patch(Method::PATCH, "/api/admin/suppliers/s1", &json!({"supplier_name": "ACME"}), &headers)
            .await;
        assert!(r.is_success());

        let sent = backend.last_request().unwrap();
        assert_eq!(sent.method, Method::PATCH);
        assert_eq!(sent.headers.get(AUTHORIZATION).unwrap(), "Bearer tok");
        assert_eq!(sent.headers.get(CONTENT_TYPE).unwrap(), "application/json");
        match sent.body {
            RequestBody::Json(bytes) => {
                let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
                assert_eq!(v, json!({"supplier_name": "ACME"}));
            }
            other => panic!("expected JSON body, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unsupported_method_never_hits_the_network() {
        let backend = Arc::new(ScriptedBackend::new());

        let r = fetcher(backend.clone())
            .post_or_patch(Method::PUT, "/api/admin/users/u1", &json!({}), &HeaderSet::json())
            .await;

        assert_eq!(r, RequestResult::failure(400));
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn missing_accept_is_not_negotiable() {
        let backend = Arc::new(ScriptedBackend::new());

        let r = fetcher(backend.clone()).get("/api/products", &HeaderSet::empty()).await;

        assert_eq!(r, RequestResult::failure(400));
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn delete_with_no_content_is_empty_success() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.on(Method::DELETE, "/api/admin/orders/o1", Canned::new(204));

        let r = fetcher(backend).delete("/api/admin/orders/o1", &HeaderSet::json()).await;

        assert_eq!(r.status, 204);
        assert!(r.is_success());
        assert_eq!(r.payload, Payload::Empty);
    }

    #[tokio::test]
    async fn post_file_sends_multipart() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.on(
            Method::POST,
            "/api/admin/products/import",
            Canned::json(200, json!({"message": "Imported 3 rows"})),
        );

        let form = MultipartForm::new().file("file", "products.csv", "text/csv", b"a,b\n".to_vec());
        let r = fetcher(backend.clone())
            .post_file("/api/admin/products/import", form.clone(), &HeaderSet::multipart())
            .await;

        assert_eq!(r.message(), Some("Imported 3 rows"));
        assert_eq!(backend.last_request().unwrap().body, RequestBody::Multipart(form));
    }

    #[tokio::test]
    async fn relative_uris_resolve_against_base() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.on(Method::GET, "/api/user-name", Canned::json(200, json!({})));

        fetcher(backend.clone()).get("api/user-name?x=1", &HeaderSet::json()).await;

        let url = backend.last_request().unwrap().url;
        assert_eq!(url.as_str(), "http://shop.test/api/user-name?x=1");
    }
}
