//! # drive-gateway
//!
//! Serialized asynchronous gateway for cloud drive files and user-picked documents.
//!
//! ## Design Philosophy
//!
//! drive-gateway is designed to be:
//! - **Non-blocking for the caller** - Every I/O operation returns a handle immediately
//! - **Serialized** - One dedicated worker runs operations one at a time, in order
//! - **Collaborator-agnostic** - Storage and document access sit behind traits
//! - **Library-first** - No CLI or UI; the host presents pickers and results
//!
//! ## Quick Start
//!
//! ```no_run
//! use drive_gateway::{Config, DocumentHandle, DriveGateway, FsContentResolver};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = DriveGateway::connect(Config::default(), "ya29.access-token")?;
//!
//!     // Upload a local file and list what this app can see
//!     let id = gateway.create_file_from("notes.txt").await?;
//!     println!("created {id}");
//!
//!     for file in gateway.query_files().await?.iter() {
//!         println!("{} {:?}", file.name, file.id);
//!     }
//!
//!     // Read a document the user picked
//!     let picked = Some(DocumentHandle::new("file:///tmp/picked.txt"));
//!     if let Some(doc) = gateway.open_document(Arc::new(FsContentResolver), picked).await? {
//!         println!("{}: {}", doc.name, doc.content);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Operation gateway
pub mod gateway;
/// Document chooser requests
pub mod picker;
/// Content resolution for picked documents
pub mod resolver;
/// Remote storage collaborators
pub mod storage;
/// Line-oriented text reconstruction
pub mod text;
/// Core types
pub mod types;
/// Background worker and pending operations
pub mod worker;

// Re-export commonly used types
pub use config::{Config, LinePolicy};
pub use error::{Error, Result};
pub use gateway::DriveGateway;
pub use picker::PickerRequest;
pub use resolver::{ContentResolver, FsContentResolver};
pub use storage::{ByteStream, DriveClient, MemoryStorage, RemoteStorage};
pub use types::{DocumentHandle, FileId, FileList, RemoteFile, SelectedDocument};
pub use worker::PendingOperation;
