//! Object key generation.
//!
//! Format: `[{folder}/]{unix_millis}-{random}-{sanitized_filename}`. The
//! timestamp comes first so keys in one folder sort by upload time.

use chrono::Utc;
use rand::Rng;

const SUFFIX_LEN: usize = 13;
const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a fresh object key for `filename`, optionally under `folder`.
///
/// Leading and trailing `/` are trimmed from `folder` so `"docs/"` and
/// `"/docs"` both yield `docs/...` rather than an empty path segment. A
/// folder that is empty after trimming is ignored.
#[must_use]
pub fn generate_key(filename: &str, folder: Option<&str>) -> String {
    let timestamp = Utc::now().timestamp_millis();
    let key = format!(
        "{timestamp}-{}-{}",
        random_suffix(),
        sanitize_filename(filename)
    );

    match folder.map(|f| f.trim_matches('/')).filter(|f| !f.is_empty()) {
        Some(folder) => format!("{folder}/{key}"),
        None => key,
    }
}

/// Sanitize filename for storage key.
///
/// Every character outside `[A-Za-z0-9.-]` becomes `_`.
#[must_use]
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn random_suffix() -> String {
    let mut rng = rand::rng();
    (0..SUFFIX_LEN)
        .map(|_| char::from(SUFFIX_CHARSET[rng.random_range(0..SUFFIX_CHARSET.len())]))
        .collect()
}
