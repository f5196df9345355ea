//! Archive packaging-convention detection
//!
//! Pure predicates over a flat list of archive-relative paths. Paths use
//! `/` separators; directory entries may carry a trailing separator. The
//! listing is taken as given: unsorted, possibly with duplicates.

use crate::game::{DATA_FOLDER, GAME_ID, MANIFEST_NAME};

/// Directory name used to nest every path one level deeper before matching.
/// This makes detection independent of whether the archive's payload sits at
/// the top level or inside one wrapping folder: either way the data-folder
/// segment ends up preceded by a separator.
const NEST_DIR: &str = "_nested";

/// The given path, nested one directory deeper
pub(crate) fn nested(path: &str) -> String {
    format!("{}/{}", NEST_DIR, path)
}

/// Position of the root-marker segment's leading separator within the
/// nested form of `path`, if the path passes through the game's data folder.
/// Matches both interior segments (`a/UnderMine_Data/b.dll`) and trailing
/// directory entries (`a/UnderMine_Data/`).
pub(crate) fn marker_position(path: &str) -> Option<usize> {
    let n = nested(path);
    let marker = format!("/{}", DATA_FOLDER);

    if let Some(pos) = n.find(&format!("{}/", marker)) {
        return Some(pos);
    }
    let trimmed = n.trim_end_matches('/');
    if trimmed.ends_with(&marker) {
        return Some(trimmed.len() - marker.len());
    }
    None
}

pub(crate) fn has_root_marker(path: &str) -> bool {
    marker_position(path).is_some()
}

/// Last path segment, ignoring a trailing separator
pub(crate) fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

pub(crate) fn is_manifest_file(path: &str) -> bool {
    base_name(path).eq_ignore_ascii_case(MANIFEST_NAME)
}

// ============================================================================
// Predicates
// ============================================================================

/// Does the listing hold one or more manifest-based mods? Requires at least
/// one manifest entry and refuses any archive that also carries the game's
/// data folder - those belong to the root-folder convention.
pub fn is_manifest_package(files: &[String], game_id: &str) -> bool {
    game_id == GAME_ID
        && files.iter().any(|f| is_manifest_file(f))
        && !files.iter().any(|f| has_root_marker(f))
}

/// Does the listing ship a replacement of the game's own data directory
/// (optionally alongside a mods folder)?
pub fn is_root_package(files: &[String], game_id: &str) -> bool {
    game_id == GAME_ID && files.iter().any(|f| has_root_marker(f))
}
