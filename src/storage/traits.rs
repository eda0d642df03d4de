//! Trait for the remote storage collaborator

use crate::types::{FileId, FileList, RemoteFile};
use async_trait::async_trait;
use tokio::io::AsyncRead;

/// Readable byte stream passed to and returned by storage collaborators
pub type ByteStream = Box<dyn AsyncRead + Send + Sync + Unpin>;

/// Remote file storage reachable over an already-authenticated session
///
/// The gateway calls every method from its single worker, one call at a time,
/// so implementations need no internal locking to stay consistent. They must
/// still be `Send + Sync` to be shared with the worker thread.
///
/// # Examples
///
/// ```no_run
/// use drive_gateway::storage::{DriveClient, RemoteStorage};
/// use drive_gateway::config::DriveConfig;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = DriveClient::new(&DriveConfig::default(), "ya29.access-token")?;
///
/// let listing = client.list_files("drive").await?;
/// for file in listing.iter() {
///     println!("{} ({:?})", file.name, file.id);
/// }
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait RemoteStorage: Send + Sync {
    /// Create a file from `metadata`, uploading `content` as its body
    ///
    /// # Returns
    ///
    /// The stored file's metadata, or `None` when the service acknowledged the
    /// request without describing a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the content stream fails or the service rejects the request.
    async fn create_file(
        &self,
        metadata: &RemoteFile,
        content: ByteStream,
    ) -> crate::Result<Option<RemoteFile>>;

    /// List every file visible to this application in `spaces`
    ///
    /// The listing is complete or the call fails; partial listings are never returned.
    async fn list_files(&self, spaces: &str) -> crate::Result<FileList>;

    /// Fetch the metadata of a single file
    async fn get_file(&self, id: &FileId) -> crate::Result<RemoteFile>;

    /// Open the content of a single file
    async fn download(&self, id: &FileId) -> crate::Result<ByteStream>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
