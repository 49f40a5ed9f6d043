use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};

/// Length of generated names in hex characters.
pub const NAME_LEN: usize = 16;

/// Generator for store-assigned image names.
///
/// Each name is a truncated SHA-256 over the wall clock, a per-generator
/// sequence number, the process id and the group. Names are unpredictable
/// but not guaranteed unique; stores must still check for collisions.
#[derive(Debug, Default)]
pub struct NameGenerator {
    sequence: AtomicU64,
}

impl NameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_name(&self, group: &str) -> String {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);

        let mut hasher = Sha256::new();
        hasher.update(nanos.to_le_bytes());
        hasher.update(sequence.to_le_bytes());
        hasher.update(std::process::id().to_le_bytes());
        hasher.update(group.as_bytes());
        let digest = hasher.finalize();

        hex::encode(&digest[..NAME_LEN / 2])
    }
}
