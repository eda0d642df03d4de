//! In-memory remote storage for tests and offline hosts

use super::traits::{ByteStream, RemoteStorage};
use crate::error::{Error, Result};
use crate::types::{FileId, FileList, RemoteFile};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::io::AsyncReadExt;

/// Remote storage that keeps files in process memory
///
/// Files get sequential ids (`mem-1`, `mem-2`, ...) and are listed in creation
/// order. [`MemoryStorage::answer_create_with_nothing`] makes later creations
/// succeed without describing a file, the way a misbehaving service might.
///
/// # Examples
///
/// ```
/// use drive_gateway::storage::{MemoryStorage, RemoteStorage};
/// use drive_gateway::types::RemoteFile;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let storage = MemoryStorage::new();
/// let created = storage
///     .create_file(&RemoteFile::text_file_in_root("a.txt"), Box::new(&b"hi"[..]))
///     .await?;
/// assert!(created.is_some());
/// assert_eq!(storage.list_files("drive").await?.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct MemoryStorage {
    files: Mutex<Vec<(RemoteFile, Vec<u8>)>>,
    next_id: AtomicU64,
    answer_nothing: AtomicBool,
}

impl MemoryStorage {
    /// Create an empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `create_file` store nothing and answer `Ok(None)`
    pub fn answer_create_with_nothing(&self) {
        self.answer_nothing.store(true, Ordering::SeqCst);
    }

    /// Stored content of a file, if present
    pub fn content_of(&self, id: &FileId) -> Option<Vec<u8>> {
        self.lock()
            .ok()?
            .iter()
            .find(|(file, _)| file.id.as_ref() == Some(id))
            .map(|(_, content)| content.clone())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<(RemoteFile, Vec<u8>)>>> {
        self.files
            .lock()
            .map_err(|_| Error::Io(std::io::Error::other("memory storage lock poisoned")))
    }

    fn not_found(id: &FileId) -> Error {
        Error::Api {
            status: 404,
            message: format!("File not found: {}.", id),
        }
    }
}

#[async_trait]
impl RemoteStorage for MemoryStorage {
    async fn create_file(
        &self,
        metadata: &RemoteFile,
        mut content: ByteStream,
    ) -> Result<Option<RemoteFile>> {
        let mut bytes = Vec::new();
        content.read_to_end(&mut bytes).await?;

        if self.answer_nothing.load(Ordering::SeqCst) {
            return Ok(None);
        }

        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let stored = RemoteFile {
            id: Some(FileId::new(format!("mem-{n}"))),
            size: Some(bytes.len() as u64),
            created_time: Some(chrono::Utc::now()),
            ..metadata.clone()
        };
        self.lock()?.push((stored.clone(), bytes));
        Ok(Some(stored))
    }

    async fn list_files(&self, _spaces: &str) -> Result<FileList> {
        let files = self.lock()?.iter().map(|(file, _)| file.clone()).collect();
        Ok(FileList { files })
    }

    async fn get_file(&self, id: &FileId) -> Result<RemoteFile> {
        self.lock()?
            .iter()
            .find(|(file, _)| file.id.as_ref() == Some(id))
            .map(|(file, _)| file.clone())
            .ok_or_else(|| Self::not_found(id))
    }

    async fn download(&self, id: &FileId) -> Result<ByteStream> {
        let content = self.content_of(id).ok_or_else(|| Self::not_found(id))?;
        Ok(Box::new(std::io::Cursor::new(content)))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
