//! Content hashing for embedding caches

use sha2::{Digest, Sha256};

/// Hash an ordered text list together with the model that embeds it.
///
/// Every text is length-prefixed so `["ab", "c"]` and `["a", "bc"]` hash
/// differently.
pub fn texts_hash(model_id: &str, texts: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update((model_id.len() as u64).to_le_bytes());
    hasher.update(model_id.as_bytes());
    for text in texts {
        hasher.update((text.len() as u64).to_le_bytes());
        hasher.update(text.as_bytes());
    }
    hex::encode(hasher.finalize())
}
