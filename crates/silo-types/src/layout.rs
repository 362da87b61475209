use serde::{Deserialize, Serialize};

/// Directory fan-out configuration for addressable storage layouts.
///
/// A flat namespace of hex-named files scales badly on most filesystems, so
/// stored objects are spread across nested subdirectories derived from their
/// key: `width` bytes (2·width hex characters) per segment, `depth` nested
/// segments, then the full key as the filename plus an optional `suffix`.
///
/// `depth = 0` disables subdirectories entirely.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryLayout {
    /// Bytes encoded per directory segment.
    pub width: usize,
    /// Number of nested segments.
    pub depth: usize,
    /// Optional filename extension, including any leading dot.
    pub suffix: Option<String>,
}

impl Default for DirectoryLayout {
    fn default() -> Self {
        Self {
            width: 2,
            depth: 2,
            suffix: None,
        }
    }
}

impl DirectoryLayout {
    /// A layout with the given fan-out and no suffix.
    pub fn new(width: usize, depth: usize) -> Self {
        Self {
            width,
            depth,
            suffix: None,
        }
    }

    /// A flat layout: no subdirectories.
    pub fn flat() -> Self {
        Self::new(0, 0)
    }

    /// Set the filename suffix.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    /// Hex characters consumed by the directory segments of this layout.
    pub fn segment_chars(&self) -> usize {
        2 * self.width * self.depth
    }
}
