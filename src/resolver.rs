//! Content resolution for documents picked by the user

use crate::error::{Error, Result};
use crate::storage::ByteStream;
use crate::types::DocumentHandle;
use async_trait::async_trait;
use std::path::PathBuf;

/// Access to documents behind [`DocumentHandle`]s
///
/// This is the platform's document framework as seen by the gateway: it can
/// look up a document's display name and open its content.
#[async_trait]
pub trait ContentResolver: Send + Sync {
    /// Look up the display name of a document
    ///
    /// Returns `Ok(None)` when the metadata query produced no row.
    async fn query_display_name(&self, handle: &DocumentHandle) -> Result<Option<String>>;

    /// Open the document's content for reading
    async fn open_stream(&self, handle: &DocumentHandle) -> Result<ByteStream>;
}

/// Resolver for `file://` handles pointing at the local filesystem
///
/// The display name is the last path component. A handle whose file does not
/// exist resolves to no metadata row.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsContentResolver;

impl FsContentResolver {
    fn path_of(handle: &DocumentHandle) -> Result<PathBuf> {
        let url = url::Url::parse(handle.as_str())
            .map_err(|e| Error::InvalidHandle(format!("{}: {}", handle, e)))?;
        if url.scheme() != "file" {
            return Err(Error::InvalidHandle(format!(
                "{}: unsupported scheme '{}'",
                handle,
                url.scheme()
            )));
        }
        url.to_file_path()
            .map_err(|_| Error::InvalidHandle(format!("{}: not a local file path", handle)))
    }
}

#[async_trait]
impl ContentResolver for FsContentResolver {
    async fn query_display_name(&self, handle: &DocumentHandle) -> Result<Option<String>> {
        let path = Self::path_of(handle)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn open_stream(&self, handle: &DocumentHandle) -> Result<ByteStream> {
        let path = Self::path_of(handle)?;
        let file = tokio::fs::File::open(&path).await?;
        Ok(Box::new(file))
    }
}
