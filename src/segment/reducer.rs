//! Body reducer for containers
//!
//! Removes every callable unit's `[start_offset, end_offset)` span from a
//! cleaned container, leaving only the declarative skeleton: package
//! variables, type declarations, constants, exceptions, and the container
//! header/footer. Parsing the reduced skeleton instead of the full container
//! is what keeps declaration extraction cheap.

use crate::segment::segments::ContainerSegments;

/// Deletes all unit spans from the container source.
///
/// Spans are deleted in descending `start_offset` order so earlier deletions
/// never invalidate later offsets. Declaration content and order are
/// preserved; a container with no units is returned unchanged.
pub fn reduce_container(cleaned_source: &str, segments: &ContainerSegments) -> String {
    if segments.is_empty() {
        return cleaned_source.to_string();
    }

    let mut reduced = cleaned_source.to_string();
    for segment in segments.iter().rev() {
        reduced.replace_range(segment.start_offset..segment.end_offset, "");
    }
    reduced
}

/// Estimated size of the reduced container, without performing the reduction.
pub fn estimate_reduced_len(source_len: usize, segments: &ContainerSegments) -> usize {
    let removed: usize = segments.iter().map(|s| s.len()).sum();
    source_len.saturating_sub(removed)
}

/// Percentage reduction achieved by removing unit bodies (0-100).
pub fn reduction_percentage(original_len: usize, reduced_len: usize) -> f64 {
    if original_len == 0 {
        return 0.0;
    }
    100.0 * (1.0 - reduced_len as f64 / original_len as f64)
}
