//! Document chooser request handed to the host UI layer

use crate::types::TEXT_PLAIN;
use serde::{Deserialize, Serialize};

/// Chooser action that lets the user open an existing document
pub const ACTION_OPEN_DOCUMENT: &str = "android.intent.action.OPEN_DOCUMENT";

/// Category restricting the chooser to documents that can be opened as a stream
pub const CATEGORY_OPENABLE: &str = "android.intent.category.OPENABLE";

/// Description of the document chooser the host should present
///
/// The gateway only builds the request. Presenting it is up to the host,
/// which feeds the chosen document back through
/// [`DriveGateway::open_document`](crate::DriveGateway::open_document).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickerRequest {
    /// Chooser action
    pub action: String,
    /// Categories the picked document must belong to
    pub categories: Vec<String>,
    /// MIME type filter (may use `*` wildcards)
    pub mime_type: String,
}

impl PickerRequest {
    /// Request for a single openable plain-text document
    pub fn open_text_document() -> Self {
        Self {
            action: ACTION_OPEN_DOCUMENT.to_string(),
            categories: vec![CATEGORY_OPENABLE.to_string()],
            mime_type: TEXT_PLAIN.to_string(),
        }
    }

    /// Whether a document of type `mime` passes this request's filter
    pub fn accepts(&self, mime: &str) -> bool {
        let Some((want_type, want_sub)) = split_mime(&self.mime_type) else {
            return false;
        };
        let Some((have_type, have_sub)) = split_mime(mime) else {
            return false;
        };

        (want_type == "*" || want_type.eq_ignore_ascii_case(have_type))
            && (want_sub == "*" || want_sub.eq_ignore_ascii_case(have_sub))
    }
}

fn split_mime(mime: &str) -> Option<(&str, &str)> {
    // Parameters such as "; charset=utf-8" do not take part in matching
    let essence = mime.split(';').next().unwrap_or_default().trim();
    let (kind, sub) = essence.split_once('/')?;
    if kind.is_empty() || sub.is_empty() {
        return None;
    }
    Some((kind, sub))
}
