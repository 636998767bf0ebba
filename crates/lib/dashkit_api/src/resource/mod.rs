//! Resource endpoint backing: named, seekable byte sources.
//!
//! The host application decides what a resource path maps to by supplying a
//! [`ResourceProvider`]. [`DirectoryResources`] maps paths under a base
//! directory and refuses anything that resolves outside of it;
//! [`PatternResources`] routes path templates to handlers.

pub mod pattern;
pub mod range;
pub mod serve;

use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncSeek};
use tracing::warn;

pub use pattern::{PathHandler, PathPattern, PatternError, PatternResources};

/// Byte source of a resource.
pub trait ResourceReader: AsyncRead + AsyncSeek + Send + Unpin {}

impl<T: AsyncRead + AsyncSeek + Send + Unpin> ResourceReader for T {}

/// An opened resource ready to be streamed.
pub struct Resource {
    /// Name used to guess the content type.
    pub name: String,
    pub size: u64,
    pub reader: Box<dyn ResourceReader>,
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl Resource {
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            reader: Box::new(Cursor::new(bytes)),
        }
    }

    /// Open a file on disk; its size is taken from the file metadata.
    pub async fn open_file(path: &Path) -> io::Result<Self> {
        let file = File::open(path).await?;
        let size = file.metadata().await?.len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            name,
            size,
            reader: Box::new(file),
        })
    }
}

/// Maps a requested resource path to a byte source.
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// `Ok(None)` when no resource exists under `path`.
    async fn open(&self, path: &str) -> io::Result<Option<Resource>>;
}

/// Serves regular files below a base directory.
#[derive(Debug, Clone)]
pub struct DirectoryResources {
    base: PathBuf,
}

impl DirectoryResources {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Canonical path of `path` under the base directory, if it names a
    /// regular file that stays inside the base after resolving links and `..`.
    pub async fn resolve(&self, path: &str) -> io::Result<Option<PathBuf>> {
        let base = tokio::fs::canonicalize(&self.base).await?;
        let joined = base.join(path.trim_start_matches('/'));

        let target = match tokio::fs::canonicalize(&joined).await {
            Ok(target) => target,
            // A component under a regular file or an embedded NUL names no file either.
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::NotFound
                        | io::ErrorKind::NotADirectory
                        | io::ErrorKind::InvalidInput
                ) =>
            {
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        if !target.starts_with(&base) {
            warn!(path = %path, "resource path escapes base directory");
            return Ok(None);
        }

        if !tokio::fs::metadata(&target).await?.is_file() {
            return Ok(None);
        }

        Ok(Some(target))
    }
}

#[async_trait]
impl ResourceProvider for DirectoryResources {
    async fn open(&self, path: &str) -> io::Result<Option<Resource>> {
        match self.resolve(path).await? {
            Some(target) => Resource::open_file(&target).await.map(Some),
            None => Ok(None),
        }
    }
}
