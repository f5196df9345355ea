//! Archive install planning
//!
//! Turns an archive's flat file listing into copy instructions the host
//! executes against the mod-staging directory. Two packaging conventions are
//! recognized: manifest-based (one `mod.json` per logical mod) and
//! root-folder (a full replacement of the game's data directory). The
//! classifiers are mutually exclusive, so any one archive is handled by
//! exactly one builder. Everything here is a pure computation over the
//! listing; the only I/O is reading an already-extracted manifest file.

mod builder;
mod classifier;
mod manifest;
mod mod_type;

pub use builder::{build_manifest_instructions, build_root_instructions};
pub use classifier::{is_manifest_package, is_root_package};
pub use manifest::{fallback_mod_name, read_mod_name, sanitize_mod_name, ManifestError};
pub use mod_type::{classify_deployment, is_root_mod_type, root_deploy_path, ROOT_MOD_TYPE_ID};

use std::error::Error;
use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::logging::log_install;

// ============================================================================
// Shared Types
// ============================================================================

/// A single file operation for the host to perform. Sources are
/// archive-relative, destinations are relative to the staging directory
/// (or the game directory, for root-deployed mods).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Instruction {
    Copy { source: String, destination: String },
}

impl Instruction {
    pub fn source(&self) -> &str {
        match self {
            Instruction::Copy { source, .. } => source,
        }
    }

    pub fn destination(&self) -> &str {
        match self {
            Instruction::Copy { destination, .. } => destination,
        }
    }
}

/// What an installer hands back to the host
#[derive(Debug, Default, Serialize)]
pub struct InstallOutcome {
    pub instructions: Vec<Instruction>,
}

/// Error type for instruction planning
#[derive(Debug)]
pub enum InstallError {
    /// The listing matches neither packaging convention; the host should
    /// never get here because it tests before installing
    Unsupported,
}

impl fmt::Display for InstallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallError::Unsupported => {
                write!(f, "archive matches no supported packaging convention")
            }
        }
    }
}

impl Error for InstallError {}

// ============================================================================
// Host Entry Points
// ============================================================================

/// Plan an install for a manifest-based archive
pub fn install_manifest_package(
    files: &[String],
    destination: &Path,
    game_id: &str,
    progress: &dyn Fn(f32),
) -> Result<InstallOutcome, InstallError> {
    if !is_manifest_package(files, game_id) {
        return Err(InstallError::Unsupported);
    }
    progress(0.0);
    let instructions = build_manifest_instructions(files, destination);
    progress(1.0);
    log_install(&format!(
        "Planned {} copies from {} entries (manifest layout)",
        instructions.len(),
        files.len()
    ));
    Ok(InstallOutcome { instructions })
}

/// Plan an install for a root-folder archive
pub fn install_root_package(
    files: &[String],
    _destination: &Path,
    game_id: &str,
    progress: &dyn Fn(f32),
) -> Result<InstallOutcome, InstallError> {
    if !is_root_package(files, game_id) {
        return Err(InstallError::Unsupported);
    }
    progress(0.0);
    let instructions = build_root_instructions(files);
    progress(1.0);
    log_install(&format!(
        "Planned {} copies from {} entries (root-folder layout)",
        instructions.len(),
        files.len()
    ));
    Ok(InstallOutcome { instructions })
}
