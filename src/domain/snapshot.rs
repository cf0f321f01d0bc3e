use crate::detect::{content_hash, normalize_html};

/// One observed state of a target: normalized/original HTML plus the
/// content hash of the normalized form.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub normalized_html: String,
    pub original_html: String,
    pub hash: String,
}

impl Snapshot {
    /// Normalize raw HTML and fingerprint it.
    pub fn capture(html: &str) -> Self {
        let normalized_html = normalize_html(html);
        let hash = content_hash(&normalized_html);
        Self {
            normalized_html,
            original_html: html.to_string(),
            hash,
        }
    }
}
