use super::{ExportedFile, Resource, StoreOutcome};
use crate::net::{AcceptKind, HeaderSet, MultipartForm, RequestResult};
use crate::router::names;
use crate::session::{FieldErrors, SessionManager};
use http::Method;
use serde_json::Value;
use std::sync::{Arc, RwLock};

/// CRUD operations against one admin collection.
///
/// Every call reads the token fresh. Without one the store navigates to
/// `login` and returns [`StoreOutcome::LoginRequired`] without touching the
/// network; a 401 tears the session down and does the same.
pub struct ResourceStore<R: Resource> {
    session: Arc<SessionManager>,
    admin_base: String,
    default_export_filename: String,
    results: RwLock<Option<Vec<R>>>,
    errors: RwLock<FieldErrors>,
}

impl<R: Resource> std::fmt::Debug for ResourceStore<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceStore")
            .field("collection", &R::COLLECTION)
            .field("admin_base", &self.admin_base)
            .finish_non_exhaustive()
    }
}

impl<R: Resource> ResourceStore<R> {
    pub fn new(session: Arc<SessionManager>, admin_base: &str, default_export_filename: &str) -> Self {
        Self {
            session,
            admin_base: admin_base.trim_end_matches('/').to_string(),
            default_export_filename: default_export_filename.to_string(),
            results: RwLock::new(None),
            errors: RwLock::new(FieldErrors::new()),
        }
    }

    /// `<admin base>/<collection>`, e.g. `/api/admin/categories`.
    pub fn collection_uri(&self) -> String {
        format!("{}/{}", self.admin_base, R::COLLECTION)
    }

    /// `<collection uri>/<id>`.
    pub fn item_uri(&self, id: &str) -> String {
        format!("{}/{}", self.collection_uri(), id)
    }

    /// Records of the last successful [`fetch_all`](Self::fetch_all).
    pub fn results(&self) -> Option<Vec<R>> {
        self.results.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn field_errors(&self) -> FieldErrors {
        self.errors.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn reset_errors(&self) {
        self.errors.write().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Loads a listing. `uri` may carry paging or filter parameters.
    pub async fn fetch_all(&self, uri: &str) -> StoreOutcome<Vec<R>> {
        let Some(headers) = self.headers(HeaderSet::json()).await else {
            self.set_results(None);
            return StoreOutcome::LoginRequired;
        };

        let result = self.session.fetcher().get(uri, &headers).await;
        if self.rejected(&result).await {
            self.set_results(None);
            return StoreOutcome::LoginRequired;
        }
        if !result.is_success() {
            self.set_results(None);
            return StoreOutcome::Failed {
                status: result.status,
                message: result.message().map(str::to_string),
            };
        }

        match result.data().map(decode_listing::<R>) {
            Some(Ok(records)) => {
                self.set_results(Some(records.clone()));
                StoreOutcome::Done(records)
            }
            Some(Err(e)) => {
                log::error!("{}: cannot decode listing: {e}", R::COLLECTION);
                self.set_results(None);
                StoreOutcome::Failed {
                    status: result.status,
                    message: Some(e.to_string()),
                }
            }
            None => {
                log::warn!("{}: listing response has no data", R::COLLECTION);
                self.set_results(None);
                StoreOutcome::Failed {
                    status: result.status,
                    message: None,
                }
            }
        }
    }

    /// Creates (`POST`) or updates (`PATCH`) a record. A 422 fills this
    /// store's field errors.
    pub async fn save(&self, method: Method, uri: &str, record: &R) -> StoreOutcome {
        self.reset_errors();
        let Some(headers) = self.headers(HeaderSet::json()).await else {
            return StoreOutcome::LoginRequired;
        };

        let result = self
            .session
            .fetcher()
            .post_or_patch(method, uri, record, &headers)
            .await;
        self.settle(result, true).await
    }

    /// Soft-deletes the record at `uri`.
    pub async fn delete(&self, uri: &str) -> StoreOutcome {
        let Some(headers) = self.headers(HeaderSet::json()).await else {
            return StoreOutcome::LoginRequired;
        };

        let result = self.session.fetcher().delete(uri, &headers).await;
        self.settle(result, false).await
    }

    /// Restores a soft-deleted record (`PATCH` with an empty body).
    pub async fn restore(&self, uri: &str) -> StoreOutcome {
        let Some(headers) = self.headers(HeaderSet::json()).await else {
            return StoreOutcome::LoginRequired;
        };

        let result = self
            .session
            .fetcher()
            .post_or_patch(Method::PATCH, uri, &Value::Object(Default::default()), &headers)
            .await;
        self.settle(result, false).await
    }

    /// Multipart POST to `uri`, e.g. a record with images. A 422 fills this
    /// store's field errors.
    pub async fn upload(&self, uri: &str, form: MultipartForm) -> StoreOutcome {
        self.reset_errors();
        let Some(headers) = self.headers(HeaderSet::multipart()).await else {
            return StoreOutcome::LoginRequired;
        };

        let result = self.session.fetcher().post_file(uri, form, &headers).await;
        self.settle(result, true).await
    }

    /// Bulk import to `<collection uri>/import`. Validation errors of an
    /// import describe rows, not form fields, so they are only reported.
    pub async fn import_file(&self, form: MultipartForm) -> StoreOutcome {
        let Some(headers) = self.headers(HeaderSet::multipart()).await else {
            return StoreOutcome::LoginRequired;
        };

        let uri = format!("{}/import", self.collection_uri());
        let result = self.session.fetcher().post_file(&uri, form, &headers).await;
        self.settle(result, false).await
    }

    /// Downloads the collection as CSV from `<collection uri>/export`.
    pub async fn export(&self) -> StoreOutcome<ExportedFile> {
        let Some(headers) = self.headers(HeaderSet::for_accept(AcceptKind::Csv)).await else {
            return StoreOutcome::LoginRequired;
        };

        let uri = format!("{}/export", self.collection_uri());
        let result = self.session.fetcher().get(&uri, &headers).await;
        if self.rejected(&result).await {
            return StoreOutcome::LoginRequired;
        }

        let notifier = self.session.notifier();
        match (result.is_success(), result.bytes()) {
            (true, Some(bytes)) => {
                let filename = result
                    .filename
                    .clone()
                    .unwrap_or_else(|| self.default_export_filename.clone());
                log::info!("{}: exported {} bytes as {filename}", R::COLLECTION, bytes.len());
                notifier.success(format!("Exported {filename}"));
                StoreOutcome::Done(ExportedFile {
                    filename,
                    bytes: bytes.to_vec(),
                })
            }
            _ => {
                notifier.error("Export failed");
                StoreOutcome::Failed {
                    status: result.status,
                    message: result.message().map(str::to_string),
                }
            }
        }
    }

    /// Authorizes `headers`, or sends the user to `login` when no token is held.
    async fn headers(&self, headers: HeaderSet) -> Option<HeaderSet> {
        let authorized = self.session.authorize(headers);
        if authorized.is_none() {
            log::debug!("{}: no token, login required", R::COLLECTION);
            self.session.navigate(names::LOGIN).await;
        }
        authorized
    }

    /// True when the server rejected the token; the session is gone and the
    /// user has been sent to `login`.
    async fn rejected(&self, result: &RequestResult) -> bool {
        if self.session.observe(result) {
            self.session.navigate(names::LOGIN).await;
            return true;
        }
        false
    }

    /// Applies the shared mutation policy: notify the server's message either
    /// way, keep 422 field errors when `collect_field_errors`.
    async fn settle(&self, result: RequestResult, collect_field_errors: bool) -> StoreOutcome {
        if self.rejected(&result).await {
            return StoreOutcome::LoginRequired;
        }

        let notifier = self.session.notifier();
        let message = result.message().map(str::to_string);
        if result.is_success() {
            notifier.success(message.unwrap_or_else(|| "Saved".to_string()));
            return StoreOutcome::Done(());
        }

        notifier.error(message.clone().unwrap_or_else(|| "Request failed".to_string()));
        if result.is_unprocessable() && collect_field_errors {
            let errors = result.field_errors().unwrap_or_default();
            *self.errors.write().unwrap_or_else(|e| e.into_inner()) = errors.clone();
            return StoreOutcome::Invalid(errors);
        }
        if result.is_unprocessable() {
            log::warn!("{}: rejected: {}", R::COLLECTION, message.as_deref().unwrap_or("no message"));
        }
        StoreOutcome::Failed {
            status: result.status,
            message,
        }
    }

    fn set_results(&self, records: Option<Vec<R>>) {
        *self.results.write().unwrap_or_else(|e| e.into_inner()) = records;
    }
}

/// A listing is either a plain array or a paginator object with the records
/// under its own `data` key.
fn decode_listing<R: Resource>(data: &Value) -> Result<Vec<R>, serde_json::Error> {
    let records = match data.get("data") {
        Some(inner) if inner.is_array() => inner,
        _ => data,
    };
    serde_json::from_value(records.clone())
}
