use silo_types::{DigestAlgorithm, DirectoryLayout};

use crate::error::{LayoutError, LayoutResult};

/// Split a hex key into nested directory segments per the layout.
///
/// For level `i` in `[0, depth)`, segment `i` is
/// `key[2·width·i .. 2·width·(i+1)]`; the final path is
/// `seg_0/…/seg_{depth-1}/key + suffix`. With `depth = 0` the namespace is
/// flat: just `key + suffix`. Segments are always taken from the front of
/// the key, so the full key remains the filename and a path is re-derivable
/// from the key alone.
pub fn fan_out(key: &str, layout: &DirectoryLayout) -> LayoutResult<String> {
    if layout.depth > 0 && layout.width == 0 {
        return Err(LayoutError::InvalidLayout(
            "width must be at least 1 when depth > 0".to_string(),
        ));
    }
    let needed = layout.segment_chars();
    if key.len() < needed {
        return Err(LayoutError::KeyTooShort {
            needed,
            actual: key.len(),
        });
    }

    let segment = 2 * layout.width;
    let suffix_len = layout.suffix.as_deref().map_or(0, str::len);
    let mut path = String::with_capacity(key.len() + needed + layout.depth + suffix_len);
    for level in 0..layout.depth {
        path.push_str(&key[level * segment..(level + 1) * segment]);
        path.push('/');
    }
    path.push_str(key);
    if let Some(suffix) = &layout.suffix {
        path.push_str(suffix);
    }
    Ok(path)
}

/// Validate a layout against an algorithm at construction time.
///
/// Every key a path algorithm derives is the hex of one of `algorithm`'s
/// digests, so the fan-out must fit within that hex length. Catching this
/// here keeps `KeyTooShort` out of the streaming path entirely.
pub fn validate(layout: &DirectoryLayout, algorithm: DigestAlgorithm) -> LayoutResult<()> {
    if layout.depth > 0 && layout.width == 0 {
        return Err(LayoutError::InvalidLayout(
            "width must be at least 1 when depth > 0".to_string(),
        ));
    }
    if layout.segment_chars() > algorithm.hex_len() {
        return Err(LayoutError::InvalidLayout(format!(
            "fan-out consumes {} hex characters but {} digests provide only {}",
            layout.segment_chars(),
            algorithm.name(),
            algorithm.hex_len()
        )));
    }
    Ok(())
}
