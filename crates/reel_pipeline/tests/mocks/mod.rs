pub mod assembler;
pub mod image;
pub mod planner;
pub mod talking_head;
pub mod video;
pub mod voice;

use std::path::Path;

/// Pulls the segment index out of an `img_{i}_{uuid}` / `clip_{i}_{uuid}`
/// artifact name, letting the doubles tag their calls by segment.
pub fn index_from_artifact(path: &Path) -> usize {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.split('_').nth(1))
        .and_then(|i| i.parse().ok())
        .unwrap_or_else(|| panic!("artifact path without segment index: {}", path.display()))
}
