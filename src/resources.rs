//! Admin back-office collections.
//!
//! Every collection (categories, products, suppliers, users, orders) shares
//! the same REST shape under `<admin base>/<collection>`, so one generic
//! [`ResourceStore`] serves all of them. A model opts in by implementing
//! [`Resource`].

pub mod models;
pub mod store;

use crate::errors::ExportError;
use crate::session::FieldErrors;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub use models::{Category, Order, Product, Supplier, User};
pub use store::ResourceStore;

/// A record type served by an admin collection.
pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Path segment of the collection, e.g. `categories`.
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
}

/// What a store operation came to.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOutcome<T = ()> {
    Done(T),
    /// 422 with field-level errors for the form.
    Invalid(FieldErrors),
    Failed { status: u16, message: Option<String> },
    /// No token, or the server rejected it. The user was sent to `login`.
    LoginRequired,
}

impl<T> StoreOutcome<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, StoreOutcome::Done(_))
    }

    pub fn done(self) -> Option<T> {
        match self {
            StoreOutcome::Done(v) => Some(v),
            _ => None,
        }
    }
}

/// A downloaded CSV export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ExportedFile {
    /// Writes the export into `dir` under its own filename, replacing any
    /// existing file. The filename must not name another directory.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf, ExportError> {
        let plain = Path::new(&self.filename)
            .file_name()
            .is_some_and(|name| name == self.filename.as_str());
        if !plain || self.filename.contains(['/', '\\']) {
            return Err(ExportError::InvalidFileName(self.filename.clone()));
        }

        let path = dir.as_ref().join(&self.filename);
        std::fs::write(&path, &self.bytes)?;
        log::debug!("export written to {}", path.display());
        Ok(path)
    }
}
