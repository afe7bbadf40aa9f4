//! Output-path derivation.
//!
//! Filenames are `heartmula_<timestamp>_<fingerprint>.mp3`: the local
//! wall clock at second granularity plus the first 6 hex characters of
//! SHA-1 over the UTF-8 bytes of lyrics concatenated directly with tags.
//! Identical content within the same wall-clock second derives the same
//! name — the scheme accepts that collision, and a retry with identical
//! input overwrites the earlier file.

use chrono::{DateTime, Local};
use sha1::{Digest, Sha1};

/// Directory generated audio is written to, relative to the working dir.
pub const OUTPUT_DIR: &str = "outputs";

/// Filename prefix for every generated artifact.
pub const FILE_PREFIX: &str = "heartmula";

/// Filename extension. The pipeline controls the actual encoding.
pub const FILE_EXTENSION: &str = "mp3";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// First 6 hex characters of SHA-1 over `lyrics` + `tags`.
///
/// No separator between the two — ("abc", "def") and ("ab", "cdef")
/// fingerprint identically. Truncation to 24 bits keeps names short at a
/// collision probability of roughly 1 in 16.7 million per distinct pair.
pub fn fingerprint(lyrics: &str, tags: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(lyrics.as_bytes());
    hasher.update(tags.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..3])
}

/// Derive the artifact filename for the given content at the given instant.
pub fn file_name(lyrics: &str, tags: &str, at: DateTime<Local>) -> String {
    format!(
        "{FILE_PREFIX}_{}_{}.{FILE_EXTENSION}",
        at.format(TIMESTAMP_FORMAT),
        fingerprint(lyrics, tags),
    )
}
