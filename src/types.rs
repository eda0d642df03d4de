//! Core types for drive-gateway

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Folder alias for the root of the user's My Drive
pub const ROOT_FOLDER: &str = "root";

/// MIME type used for every file the gateway creates or picks
pub const TEXT_PLAIN: &str = "text/plain";

/// Opaque identifier of a file held by the remote storage service
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub String);

impl FileId {
    /// Create a new FileId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is empty (never a valid remote id)
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<String> for FileId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for FileId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<FileId> for String {
    fn from(id: FileId) -> Self {
        id.0
    }
}

impl PartialEq<&str> for FileId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata record for a file known to the remote storage service
///
/// Field names follow the Drive v3 JSON representation. The same type is
/// used as the creation request (no `id` yet) and as the service's answer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    /// Identifier assigned by the service (absent on creation requests)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FileId>,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// MIME type of the content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    /// Parent folder references
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,

    /// Creation time reported by the service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,

    /// Last modification time reported by the service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<DateTime<Utc>>,

    /// Content size in bytes (the service encodes it as a decimal string)
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "optional_u64_string"
    )]
    pub size: Option<u64>,
}

impl RemoteFile {
    /// Descriptor for a new plain-text file placed in the root folder
    pub fn text_file_in_root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime_type: Some(TEXT_PLAIN.to_string()),
            parents: vec![ROOT_FOLDER.to_string()],
            ..Self::default()
        }
    }
}

/// Ordered listing of remote files, built fresh for every query
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FileList {
    /// Files in the order the service returned them
    pub files: Vec<RemoteFile>,
}

impl FileList {
    /// Number of files in the listing
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the listing is empty
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate over the files in order
    pub fn iter(&self) -> std::slice::Iter<'_, RemoteFile> {
        self.files.iter()
    }
}

impl IntoIterator for FileList {
    type Item = RemoteFile;
    type IntoIter = std::vec::IntoIter<RemoteFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_iter()
    }
}

/// Opaque reference to a document the user picked through the platform chooser
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentHandle(String);

impl DocumentHandle {
    /// Wrap a URI returned by the document chooser
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// The URI this handle refers to
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name and full text of a document read through the gateway
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedDocument {
    /// Display name of the document
    pub name: String,
    /// Text content, joined according to the configured line policy
    pub content: String,
}

// Drive encodes int64 fields as JSON strings
mod optional_u64_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_some(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Raw::Number(n)) => Ok(Some(n)),
            Some(Raw::Text(s)) => s.parse().map(Some).map_err(serde::de::Error::custom),
        }
    }
}
