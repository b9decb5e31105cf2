//! Selection and normalization of text parts.

use serde::{Deserialize, Serialize};

/// One leaf (or container) of a message, already transfer-decoded by the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePart {
    /// MIME type, e.g. `text/html`
    pub content_type: String,
    /// Attachment filename, if any
    #[serde(default)]
    pub filename: Option<String>,
    /// Decoded payload
    #[serde(default)]
    pub payload: String,
}

impl MessagePart {
    /// Creates a part without a filename.
    pub fn new(content_type: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            filename: None,
            payload: payload.into(),
        }
    }

    /// Sets the attachment filename.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    fn content_type_lower(&self) -> String {
        self.content_type.trim().to_lowercase()
    }

    fn filename_lower(&self) -> String {
        self.filename.as_deref().unwrap_or_default().to_lowercase()
    }
}

/// Returns the text contents worth scanning for URLs.
///
/// - `multipart/*` containers are skipped, except `multipart/alternative`
///   whose payload is taken as-is
/// - `text/*` parts and `.txt`/`.htm`/`.html` attachments are kept
/// - HTML has CR and LF removed so URLs wrapped across lines are rejoined
pub fn decoded_text_parts(parts: &[MessagePart]) -> Vec<String> {
    let mut texts = Vec::new();

    for part in parts {
        let content_type = part.content_type_lower();
        let filename = part.filename_lower();

        if content_type.starts_with("multipart/") {
            if content_type == "multipart/alternative" && !part.payload.is_empty() {
                texts.push(part.payload.clone());
            }
            continue;
        }

        let is_text = content_type.starts_with("text/")
            || filename.ends_with(".txt")
            || filename.ends_with(".html")
            || filename.ends_with(".htm");
        if !is_text {
            continue;
        }

        if content_type.contains("html") || filename.contains(".htm") {
            texts.push(part.payload.replace(['\n', '\r'], ""));
        } else {
            texts.push(part.payload.clone());
        }
    }

    texts
}
