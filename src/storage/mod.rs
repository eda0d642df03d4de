//! Remote storage collaborators
//!
//! The gateway never talks to a storage service directly. It goes through the
//! [`RemoteStorage`] trait, which has two implementations:
//!
//! - [`DriveClient`]: the Drive v3 REST API over `reqwest`
//! - [`MemoryStorage`]: files kept in process memory, for tests and offline hosts
//!
//! ## Usage
//!
//! ```no_run
//! use drive_gateway::config::DriveConfig;
//! use drive_gateway::storage::{DriveClient, RemoteStorage};
//! use drive_gateway::types::RemoteFile;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = DriveClient::new(&DriveConfig::default(), "ya29.access-token")?;
//!
//!     let file = tokio::fs::File::open("notes.txt").await?;
//!     let created = client
//!         .create_file(&RemoteFile::text_file_in_root("notes.txt"), Box::new(file))
//!         .await?;
//!     println!("created: {:?}", created.and_then(|f| f.id));
//!
//!     Ok(())
//! }
//! ```

mod drive;
mod memory;
mod traits;

pub use drive::DriveClient;
pub use memory::MemoryStorage;
pub use traits::{ByteStream, RemoteStorage};
