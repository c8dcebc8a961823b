//! Key path parsing.
//!
//! Model keys are addressed with dotted or slashed paths: `page.title`,
//! `lists/GoT/Starks`. A path splits into its *ancestors* (every segment but
//! the last) and its *target key* (the last segment).

use std::fmt;

use tessera_carton::{smallvec, CompactString, SmallVec};

/// Characters that separate path segments.
pub const PATH_DELIMITERS: &[char] = &['.', '/'];

/// Segment storage, inline for typical path depths.
pub type Segments = SmallVec<[CompactString; 4]>;

/// A parsed key path. Always holds at least one segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath {
    segments: Segments,
}

impl KeyPath {
    /// Parse a path on `.` and `/`, dropping empty segments.
    ///
    /// Input without delimiters is kept whole. Input made only of delimiters
    /// (or the empty string) becomes a single segment equal to the raw input.
    pub fn parse(path: &str) -> Self {
        if !path.contains(PATH_DELIMITERS) {
            return Self::single(path);
        }

        let segments: Segments = path
            .split(PATH_DELIMITERS)
            .filter(|segment| !segment.is_empty())
            .map(CompactString::new)
            .collect();

        if segments.is_empty() {
            return Self::single(path);
        }
        Self { segments }
    }

    #[inline]
    fn single(path: &str) -> Self {
        Self {
            segments: smallvec![CompactString::new(path)],
        }
    }

    #[inline]
    pub fn segments(&self) -> &[CompactString] {
        &self.segments
    }

    #[inline]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// All segments but the last.
    #[inline]
    pub fn ancestors(&self) -> &[CompactString] {
        &self.segments[..self.segments.len() - 1]
    }

    /// The last segment.
    #[inline]
    pub fn target_key(&self) -> &CompactString {
        &self.segments[self.segments.len() - 1]
    }
}

impl From<&str> for KeyPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}
