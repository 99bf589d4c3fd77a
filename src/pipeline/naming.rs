//! Archive names for stored media

use crate::media::DownloadedMedia;
use crate::types::MediaKind;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Hex characters of the content hash kept in the name
const HASH_PREFIX_LEN: usize = 12;

/// Build `{handle}/{kind}_{YYYYmmddTHHMMSS}_{hash}.{ext}`
///
/// The hash covers the downloaded bytes, so identical content from two references ends
/// up under the same name within one second and the sink can treat it as already stored.
pub fn suggested_name(
    handle: &str,
    kind: MediaKind,
    at: DateTime<Utc>,
    media: &DownloadedMedia,
) -> String {
    let digest = format!("{:x}", Sha256::digest(&media.bytes));
    format!(
        "{}/{}_{}_{}.{}",
        path_segment(handle),
        kind,
        at.format("%Y%m%dT%H%M%S"),
        &digest[..HASH_PREFIX_LEN],
        media.extension()
    )
}

/// Make a handle safe to use as a single directory name
fn path_segment(handle: &str) -> String {
    let cleaned: String = handle
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    // "." and ".." are not usable as directory names
    if cleaned.chars().all(|c| c == '.') {
        cleaned.replace('.', "_")
    } else {
        cleaned
    }
}
