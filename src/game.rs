//! UnderMine game descriptor
//!
//! Fixed facts about the game, the adapter surface the host binds to
//! (install-path discovery, executable, default mod directory, setup hook),
//! and the registration bundle wiring the installers and the root mod type.

use std::path::{Path, PathBuf};

use crate::host::{GameRegistration, HostContext, InstallerSpec, ModTypeSpec};
use crate::install::{
    classify_deployment, install_manifest_package, install_root_package, is_manifest_package,
    is_root_mod_type, is_root_package, root_deploy_path, ROOT_MOD_TYPE_ID,
};
use crate::logging::log_warning;
use crate::setup::SetupError;

/// Identifier the host uses for this game
pub const GAME_ID: &str = "undermine";

/// Steam App ID for UnderMine
pub const STEAM_APP_ID: &str = "656350";

/// Game executable name
pub const EXECUTABLE: &str = "UnderMine.exe";

/// The game's own data directory. Archives shipping a folder of this name
/// are full data-directory replacements, not ordinary staged mods.
pub const DATA_FOLDER: &str = "UnderMine_Data";

/// Default mod-staging subfolder inside the game directory
pub const MODS_FOLDER: &str = "Mods";

/// Per-mod metadata file name
pub const MANIFEST_NAME: &str = "mod.json";

/// Suffix the host appends to a staging folder while an install is running
pub const INSTALLING_SUFFIX: &str = ".installing";

// ============================================================================
// Adapter Surface
// ============================================================================

/// The game adapter the host drives
pub struct GameSupport;

impl GameSupport {
    /// Locate the game through the host's store lookup. A candidate
    /// directory only counts if the game executable is actually there.
    pub fn query_path(ctx: &dyn HostContext) -> Option<PathBuf> {
        let path = ctx.find_game_install_path(STEAM_APP_ID)?;
        if !is_game_dir(&path) {
            log_warning(&format!(
                "Store reported {} but {} is missing there",
                path.display(),
                EXECUTABLE
            ));
            return None;
        }
        Some(path)
    }

    pub fn executable() -> &'static str {
        EXECUTABLE
    }

    /// Default mod-staging subfolder, relative to the game directory
    pub fn query_mod_path() -> &'static str {
        MODS_FOLDER
    }

    /// Activation-time hook: one-time patch plus consent flow.
    /// Fails with `SetupError::Canceled` if the user declines the patch.
    pub fn setup(game_path: &Path, ctx: &dyn HostContext) -> Result<(), SetupError> {
        crate::setup::run(game_path, ctx)
    }
}

/// A directory is the game's iff it holds the executable
pub fn is_game_dir(path: &Path) -> bool {
    path.join(EXECUTABLE).is_file()
}

// ============================================================================
// Host Registration
// ============================================================================

/// Everything the host needs to wire this game in. Installers are listed in
/// the order the host should try them: manifest-based first, root-folder as
/// the fallback.
pub fn registration() -> GameRegistration {
    GameRegistration {
        game_id: GAME_ID,
        installers: [
            InstallerSpec {
                id: "undermine-manifest-mod",
                priority: 25,
                test: is_manifest_package,
                install: install_manifest_package,
            },
            InstallerSpec {
                id: "undermine-root-folder-mod",
                priority: 25,
                test: is_root_package,
                install: install_root_package,
            },
        ],
        mod_type: ModTypeSpec {
            id: ROOT_MOD_TYPE_ID,
            priority: 25,
            is_applicable: is_root_mod_type,
            deploy_path: root_deploy_path,
            classify: classify_deployment,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_installer_is_tried_before_the_root_installer() {
        let registration = registration();
        assert_eq!(registration.installers[0].id, "undermine-manifest-mod");
        assert_eq!(registration.installers[1].id, "undermine-root-folder-mod");
    }

    #[test]
    fn an_archive_is_claimed_by_exactly_one_installer() {
        let registration = registration();
        let listings = [
            vec!["ModX/mod.json".to_string(), "ModX/data.bin".to_string()],
            vec!["Wrap/UnderMine_Data/x.dll".to_string()],
            vec!["Wrap/UnderMine_Data/x.dll".to_string(), "Wrap/Mods/M/mod.json".to_string()],
        ];
        for files in &listings {
            let claims = registration
                .installers
                .iter()
                .filter(|spec| (spec.test)(files, GAME_ID))
                .count();
            assert_eq!(claims, 1, "listing {:?} should have one owner", files);
        }
    }

    #[test]
    fn root_mod_type_only_applies_to_this_game() {
        let registration = registration();
        assert!((registration.mod_type.is_applicable)(GAME_ID));
        assert!(!(registration.mod_type.is_applicable)("stardewvalley"));
    }
}
