//! Retrieval of documents named by remote `$ref` pointers.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::LoadError;
use crate::loader::{is_url, load_schema, HTTP_TIMEOUT};

/// Fetches the document behind the base (pre-`#`) part of a remote ref.
///
/// Implementations return the whole parsed document; the dereferencer
/// picks its definition table out of it.
#[async_trait]
pub trait DefinitionFetcher: Send + Sync {
    async fn fetch(&self, base: &str) -> Result<Value, LoadError>;
}

/// Where relative ref bases resolve from.
#[derive(Debug, Clone)]
enum Origin {
    /// Schema read from disk; non-URL bases are file paths.
    Dir(PathBuf),
    /// Schema served over HTTP; every base is joined to this URL and
    /// must stay `http`/`https`.
    #[cfg(feature = "remote")]
    Url(reqwest::Url),
}

/// Fetches URLs over HTTP and, for schemas read from disk, files.
///
/// A fetcher built with [`SourceFetcher::new`] joins relative file paths to
/// `base_dir`, normally the directory of the schema being dereferenced. One
/// built with [`SourceFetcher::for_url`] resolves bases as URL references
/// against the schema's URL and never touches the filesystem.
#[derive(Debug, Clone)]
pub struct SourceFetcher {
    origin: Origin,
    timeout: Duration,
}

impl SourceFetcher {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            origin: Origin::Dir(base_dir.into()),
            timeout: HTTP_TIMEOUT,
        }
    }

    /// Fetcher for a schema served from `document_url`.
    #[cfg(feature = "remote")]
    pub fn for_url(document_url: reqwest::Url) -> Self {
        Self {
            origin: Origin::Url(document_url),
            timeout: HTTP_TIMEOUT,
        }
    }

    /// Fetcher for a schema loaded from `source`, a URL or a file path.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::InvalidUrl` if `source` looks like a URL but
    /// doesn't parse, or `LoadError::Offline` without the `remote` feature.
    pub fn for_source(source: &str) -> Result<Self, LoadError> {
        if !is_url(source) {
            let dir = Path::new(source).parent().unwrap_or(Path::new("."));
            return Ok(Self::new(dir));
        }

        #[cfg(feature = "remote")]
        {
            reqwest::Url::parse(source)
                .map(Self::for_url)
                .map_err(|e| LoadError::InvalidUrl {
                    url: source.to_string(),
                    message: e.to_string(),
                })
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(LoadError::Offline {
                url: source.to_string(),
            })
        }
    }

    /// Set the HTTP request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn local_path(base_dir: &Path, base: &str) -> PathBuf {
        let path = Path::new(base.strip_prefix("file://").unwrap_or(base));
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Resolve `base` against the document URL, keeping to http(s).
    #[cfg(feature = "remote")]
    fn join_url(document_url: &reqwest::Url, base: &str) -> Result<reqwest::Url, LoadError> {
        let url = document_url
            .join(base)
            .map_err(|e| LoadError::InvalidUrl {
                url: base.to_string(),
                message: e.to_string(),
            })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            _ => Err(LoadError::DisallowedSource {
                base: base.to_string(),
                origin: document_url.to_string(),
            }),
        }
    }
}

impl Default for SourceFetcher {
    fn default() -> Self {
        Self::new(".")
    }
}

#[async_trait]
impl DefinitionFetcher for SourceFetcher {
    async fn fetch(&self, base: &str) -> Result<Value, LoadError> {
        match &self.origin {
            Origin::Dir(base_dir) => {
                if !is_url(base) {
                    return load_schema(&Self::local_path(base_dir, base));
                }

                #[cfg(feature = "remote")]
                {
                    crate::loader::load_schema_url(base, self.timeout).await
                }
                #[cfg(not(feature = "remote"))]
                {
                    Err(LoadError::Offline {
                        url: base.to_string(),
                    })
                }
            }
            #[cfg(feature = "remote")]
            Origin::Url(document_url) => {
                let url = Self::join_url(document_url, base)?;
                crate::loader::load_schema_url(url.as_str(), self.timeout).await
            }
        }
    }
}

/// Never fetches; every remote ref stays unresolved.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineFetcher;

#[async_trait]
impl DefinitionFetcher for OfflineFetcher {
    async fn fetch(&self, base: &str) -> Result<Value, LoadError> {
        Err(LoadError::Offline {
            url: base.to_string(),
        })
    }
}
