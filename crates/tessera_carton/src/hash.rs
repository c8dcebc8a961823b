//! Content identifiers.
//!
//! A content id is the MD5 digest of a resource path in lowercase hex. The
//! same path always maps to the same 32-character id, which templates use as
//! a stable DOM or cache key.

use md5::{Digest, Md5};

/// Length of a content id in characters.
pub const CONTENT_ID_LEN: usize = 32;

/// Derive the content identifier for a resource path.
#[inline]
pub fn content_hash(path: &str) -> String {
    hex::encode(Md5::digest(path.as_bytes()))
}
