//! Host application interface
//!
//! Everything the host provides to this plugin, and everything the plugin
//! hands the host to wire the game in. Host state comes in as an explicit
//! read-only context passed to the adapter's methods, and dialog outcomes
//! are enumerated decisions returned from blocking calls.

use std::path::{Path, PathBuf};

use crate::install::{InstallError, InstallOutcome, Instruction};

// ============================================================================
// Host-Provided Services
// ============================================================================

/// User decision for the one-time binary patch prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchConsent {
    Accept,
    Decline,
}

/// User decision for the companion mod-loader offer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderOffer {
    /// Open the loader's download page now
    Install,
    /// Ask again on the next activation
    Later,
    /// Stop asking for good
    Never,
}

/// Read-only services the host makes available to the plugin.
///
/// The prompt methods block until the user picks an option; a dismissed
/// dialog simply never returns, which leaves the surrounding operation
/// pending. That matches the host's product behavior and is not handled
/// here with timeouts.
pub trait HostContext {
    /// Resolve a platform store app id to an install directory, if installed
    fn find_game_install_path(&self, app_id: &str) -> Option<PathBuf>;

    /// Ask the user to approve the irreversible patch step
    fn request_patch_consent(&self, game_path: &Path) -> PatchConsent;

    /// Offer to fetch the companion mod loader
    fn offer_companion_loader(&self) -> LoaderOffer;

    /// Open a URL in the user's browser
    fn open_url(&self, url: &str);
}

// ============================================================================
// Registration Surface
// ============================================================================

/// Applicability test for one packaging convention
pub type TestFn = fn(files: &[String], game_id: &str) -> bool;

/// Instruction planning for one packaging convention. The progress callback
/// receives values in `0.0..=1.0`.
pub type InstallFn = fn(
    files: &[String],
    destination: &Path,
    game_id: &str,
    progress: &dyn Fn(f32),
) -> Result<InstallOutcome, InstallError>;

/// One archive-packaging convention the host can try
pub struct InstallerSpec {
    pub id: &'static str,
    pub priority: u32,
    pub test: TestFn,
    pub install: InstallFn,
}

/// A deployment mode the host can resolve built instructions against
pub struct ModTypeSpec {
    pub id: &'static str,
    pub priority: u32,
    /// Does this mod type exist for the given game at all?
    pub is_applicable: fn(game_id: &str) -> bool,
    /// Where files land when the mod type matches (the game directory)
    pub deploy_path: fn(game_path: &Path) -> PathBuf,
    /// Does this instruction set belong to the mod type?
    pub classify: fn(instructions: &[Instruction]) -> bool,
}

/// The full registration bundle for one game
pub struct GameRegistration {
    pub game_id: &'static str,
    /// Tried in order; the host stops at the first installer whose test
    /// claims support
    pub installers: [InstallerSpec; 2],
    pub mod_type: ModTypeSpec,
}
