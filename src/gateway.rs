//! The asynchronous operation gateway
//!
//! [`DriveGateway`] accepts a small set of named operations, runs each one on
//! its single [`Worker`], and hands back a [`PendingOperation`] right away.
//! The caller's thread never blocks on storage or document I/O.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::picker::PickerRequest;
use crate::resolver::ContentResolver;
use crate::storage::{DriveClient, RemoteStorage};
use crate::text::accumulate_lines;
use crate::types::{DocumentHandle, FileId, FileList, RemoteFile, SelectedDocument};
use crate::worker::{PendingOperation, Worker};
use std::path::Path;
use std::sync::Arc;

/// Gateway for Drive files and user-picked documents
///
/// Constructed once and passed explicitly to whoever needs it. All storage
/// and document operations funnel through one worker, so the storage
/// collaborator is never used by two operations at once.
pub struct DriveGateway {
    config: Arc<Config>,
    storage: Arc<dyn RemoteStorage>,
    worker: Worker,
}

impl DriveGateway {
    /// Create a gateway over any storage collaborator
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an invalid configuration, or an I/O error
    /// if the worker thread cannot be started.
    pub fn new(config: Config, storage: Arc<dyn RemoteStorage>) -> Result<Self> {
        config.validate()?;
        let worker = Worker::spawn(&config.worker)?;

        tracing::info!(
            storage = storage.name(),
            queue_capacity = worker.capacity(),
            "drive gateway started"
        );

        Ok(Self {
            config: Arc::new(config),
            storage,
            worker,
        })
    }

    /// Create a gateway talking to the Drive REST API with `access_token`
    pub fn connect(config: Config, access_token: impl Into<String>) -> Result<Self> {
        let client = DriveClient::new(&config.drive, access_token)?;
        Self::new(config, Arc::new(client))
    }

    /// The configuration this gateway runs with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Create a plain-text file in the root folder from a local file
    ///
    /// The remote file takes the local file's name. Its bytes are streamed
    /// as the upload body.
    ///
    /// Resolves to the new file's identifier. Fails with an I/O error when the
    /// local file cannot be opened or read, or when the storage service
    /// answers without a file id.
    pub fn create_file_from(&self, path: impl AsRef<Path>) -> PendingOperation<FileId> {
        let path = path.as_ref().to_path_buf();
        let storage = Arc::clone(&self.storage);
        tracing::debug!(path = %path.display(), "queueing remote file creation");

        self.worker.submit(async move {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    Error::Io(std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("{} has no file name", path.display()),
                    ))
                })?;
            let metadata = RemoteFile::text_file_in_root(name);
            let file = tokio::fs::File::open(&path).await?;

            let created = storage.create_file(&metadata, Box::new(file)).await?;
            let id = created
                .and_then(|file| file.id)
                .filter(|id| !id.is_empty())
                .ok_or_else(|| {
                    tracing::warn!(name = %metadata.name, "storage returned no file for creation");
                    Error::null_create_result()
                })?;

            tracing::info!(file_id = %id, name = %metadata.name, "created remote file");
            Ok(id)
        })
    }

    /// List every remote file visible to this application
    ///
    /// Without broader authorization that is the files this application created.
    pub fn query_files(&self) -> PendingOperation<FileList> {
        let storage = Arc::clone(&self.storage);
        let spaces = self.config.drive.spaces.clone();
        tracing::debug!(spaces = %spaces, "queueing remote file listing");

        self.worker.submit(async move {
            let listing = storage.list_files(&spaces).await?;
            tracing::info!(files = listing.len(), "listed remote files");
            Ok(listing)
        })
    }

    /// Build the request for a document chooser showing openable plain-text files
    pub fn create_file_picker_request(&self) -> PickerRequest {
        PickerRequest::open_text_document()
    }

    /// Read the name and text of a document the user picked
    ///
    /// Resolves to `None` when no document was picked. Otherwise the
    /// document's display name is looked up first; a missing metadata row
    /// fails with an I/O error before any content is opened. Content lines
    /// are joined according to the configured line policy.
    pub fn open_document(
        &self,
        resolver: Arc<dyn ContentResolver>,
        handle: Option<DocumentHandle>,
    ) -> PendingOperation<Option<SelectedDocument>> {
        let policy = self.config.content.line_policy;

        self.worker.submit(async move {
            let Some(handle) = handle else {
                tracing::debug!("no document selected");
                return Ok(None);
            };

            let name = resolver
                .query_display_name(&handle)
                .await?
                .ok_or_else(|| {
                    tracing::warn!(handle = %handle, "document metadata query returned no row");
                    Error::empty_cursor()
                })?;
            let stream = resolver.open_stream(&handle).await?;
            let content = accumulate_lines(stream, policy).await?;

            tracing::info!(name = %name, chars = content.chars().count(), "read selected document");
            Ok(Some(SelectedDocument { name, content }))
        })
    }

    /// Read the name and text of a remote file
    pub fn read_file(&self, id: FileId) -> PendingOperation<SelectedDocument> {
        let storage = Arc::clone(&self.storage);
        let policy = self.config.content.line_policy;
        tracing::debug!(file_id = %id, "queueing remote file read");

        self.worker.submit(async move {
            let metadata = storage.get_file(&id).await?;
            let stream = storage.download(&id).await?;
            let content = accumulate_lines(stream, policy).await?;

            tracing::info!(file_id = %id, name = %metadata.name, "read remote file");
            Ok(SelectedDocument {
                name: metadata.name,
                content,
            })
        })
    }

    /// Finish all queued operations and stop the worker
    ///
    /// Blocks the calling thread until the queue has drained.
    pub fn shutdown(self) -> Result<()> {
        tracing::info!("shutting down drive gateway");
        self.worker.shutdown()
    }
}
