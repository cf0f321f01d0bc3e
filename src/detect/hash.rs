use sha2::{Digest, Sha256};

/// SHA-256 hex digest of normalized page content. Used for the cheap
/// "did anything change at all" comparison before any detector runs.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}
