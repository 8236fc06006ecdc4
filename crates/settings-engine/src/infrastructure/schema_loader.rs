//! Asynchronous, cached schema loading.
//!
//! The schema is read once per process.  The first [`SchemaLoader::load`]
//! reads and parses the document; later calls return the same
//! `Arc<Schema>` without touching the file system again.  Concurrent first
//! calls are coalesced by `tokio::sync::OnceCell`, so the file is read at most
//! once even when several tasks ask at the same time.
//!
//! A failed load is not cached: the next call tries again.

use std::path::PathBuf;
use std::sync::Arc;

use settings_core::{Schema, SchemaError};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// The watchlist schema compiled into the binary.
pub const EMBEDDED_SCHEMA: &str = include_str!("../../assets/schema.json");

/// Fatal error: without a schema there is no settings session.
#[derive(Debug, Error)]
pub enum SchemaLoadError {
    #[error("schema document not found at {path}")]
    NotFound { path: PathBuf },

    #[error("I/O error reading schema at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document was read but is not a usable schema.
    #[error("invalid schema from {origin}: {source}")]
    Invalid {
        origin: String,
        #[source]
        source: SchemaError,
    },
}

/// Where the schema document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    /// [`EMBEDDED_SCHEMA`].
    Embedded,
    File(PathBuf),
}

impl SchemaSource {
    fn describe(&self) -> String {
        match self {
            SchemaSource::Embedded => "embedded schema".to_string(),
            SchemaSource::File(path) => path.display().to_string(),
        }
    }
}

/// Loads the schema at most once.
#[derive(Debug)]
pub struct SchemaLoader {
    source: SchemaSource,
    cache: OnceCell<Arc<Schema>>,
}

impl SchemaLoader {
    pub fn new(source: SchemaSource) -> Self {
        Self {
            source,
            cache: OnceCell::new(),
        }
    }

    /// A loader for a file path, or the embedded schema when `path` is `None`.
    pub fn from_optional_path(path: Option<PathBuf>) -> Self {
        Self::new(path.map_or(SchemaSource::Embedded, SchemaSource::File))
    }

    pub fn source(&self) -> &SchemaSource {
        &self.source
    }

    /// Returns `true` once a schema has been loaded successfully.
    pub fn is_loaded(&self) -> bool {
        self.cache.initialized()
    }

    /// Returns the schema, reading and parsing it on the first call.
    ///
    /// # Errors
    ///
    /// - [`SchemaLoadError::NotFound`] if the file does not exist.
    /// - [`SchemaLoadError::Io`] for other read failures.
    /// - [`SchemaLoadError::Invalid`] if the document is malformed, lacks a
    ///   `settings` collection, or holds an inconsistent descriptor.
    pub async fn load(&self) -> Result<Arc<Schema>, SchemaLoadError> {
        let schema = self
            .cache
            .get_or_try_init(|| async {
                let text = self.read_document().await?;
                let schema =
                    Schema::from_json(&text).map_err(|source| SchemaLoadError::Invalid {
                        origin: self.source.describe(),
                        source,
                    })?;
                info!(
                    "loaded {} setting descriptor(s) from {}",
                    schema.len(),
                    self.source.describe()
                );
                Ok::<_, SchemaLoadError>(Arc::new(schema))
            })
            .await?;
        debug!("schema served from cache");
        Ok(Arc::clone(schema))
    }

    async fn read_document(&self) -> Result<String, SchemaLoadError> {
        match &self.source {
            SchemaSource::Embedded => Ok(EMBEDDED_SCHEMA.to_string()),
            SchemaSource::File(path) => match tokio::fs::read_to_string(path).await {
                Ok(text) => Ok(text),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    Err(SchemaLoadError::NotFound { path: path.clone() })
                }
                Err(source) => Err(SchemaLoadError::Io {
                    path: path.clone(),
                    source,
                }),
            },
        }
    }
}
