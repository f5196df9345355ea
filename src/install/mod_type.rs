//! Deployment-type resolution
//!
//! After instructions exist, the host asks each registered mod type whether
//! the set belongs to it. The root mod type deploys straight into the game
//! directory instead of the generic staging area; it matches full
//! data-folder replacements, alone or bundled with manifest-based mods.

use std::path::{Path, PathBuf};

use super::classifier::base_name;
use super::Instruction;
use crate::game::{DATA_FOLDER, GAME_ID, MANIFEST_NAME, MODS_FOLDER};

/// Identifier for the root-deployment mod type
pub const ROOT_MOD_TYPE_ID: &str = "undermine-root-mod";

/// Whether the root mod type exists for the given game at all
pub fn is_root_mod_type(game_id: &str) -> bool {
    game_id == GAME_ID
}

/// Root deployments land directly in the game directory
pub fn root_deploy_path(game_path: &Path) -> PathBuf {
    game_path.to_path_buf()
}

/// Is the destination inside the given top-level folder?
fn rooted_at(destination: &str, folder: &str) -> bool {
    destination
        .strip_prefix(folder)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Does this instruction set qualify for root deployment?
///
/// Three shapes resolve here. A pure data-folder replacement (no
/// manifest-destined copies) qualifies whenever a data-folder destination
/// exists. A bundle that also carries manifest-based mods qualifies only
/// when both the data folder and the mods folder are present at the top
/// level. Everything else stages normally.
pub fn classify_deployment(instructions: &[Instruction]) -> bool {
    let has_data = instructions
        .iter()
        .any(|i| rooted_at(i.destination(), DATA_FOLDER));

    let has_manifest = instructions
        .iter()
        .any(|i| base_name(i.destination()).eq_ignore_ascii_case(MANIFEST_NAME));

    if has_manifest {
        has_data
            && instructions
                .iter()
                .any(|i| rooted_at(i.destination(), MODS_FOLDER))
    } else {
        has_data
    }
}
