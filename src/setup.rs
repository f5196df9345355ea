//! One-time game preparation
//!
//! UnderMine loads third-party code only after its main assembly has been
//! rewritten by the external patcher, and that change is irreversible enough
//! to warrant explicit consent. Activation therefore walks a small state
//! machine: consent, patch, companion-loader offer, done. The backup the
//! patcher leaves behind doubles as the "already patched" sentinel, which is
//! what makes re-running setup on every activation a cheap no-op.

use std::error::Error;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use walkdir::WalkDir;

use crate::game::{DATA_FOLDER, MODS_FOLDER};
use crate::host::{HostContext, LoaderOffer, PatchConsent};
use crate::logging::log_setup;

/// Backup the patcher writes next to the assembly it rewrites, relative to
/// the data folder. Its presence means the game is already patched.
const PATCH_BACKUP: &str = "Managed/Assembly-CSharp.dll.bak";

/// Patcher executable expected in the game directory
const PATCHER_EXE: &str = "UnderModPatcher.exe";

/// Marker recording that the user declined the companion loader for good
const LOADER_OPTOUT: &str = ".undermod-optout";

/// File-name prefix identifying the companion loader's assemblies
const LOADER_PREFIX: &str = "UnderMod";

/// Download page offered when the loader is missing
const LOADER_URL: &str = "https://www.nexusmods.com/undermine/mods/1";

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum SetupError {
    /// User declined the patch; game activation must stop
    Canceled,
    /// Patcher executable is missing from the game directory
    PatcherMissing { path: PathBuf },
    /// Patcher ran but exited with a failure
    PatcherFailed { code: Option<i32> },
    /// Patcher reported success but left no backup behind
    BackupMissing { path: PathBuf },
    /// Filesystem or process-spawn failure
    Io {
        context: String,
        source: std::io::Error,
    },
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::Canceled => write!(f, "setup canceled by user"),
            SetupError::PatcherMissing { path } => {
                write!(f, "patcher not found at {}", path.display())
            }
            SetupError::PatcherFailed { code } => {
                write!(f, "patcher exited with code {:?}", code)
            }
            SetupError::BackupMissing { path } => {
                write!(
                    f,
                    "patcher reported success but no backup at {}",
                    path.display()
                )
            }
            SetupError::Io { context, source } => write!(f, "{}: {}", context, source),
        }
    }
}

impl Error for SetupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SetupError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ============================================================================
// Setup Flow
// ============================================================================

/// Setup progresses through these states; Done and Canceled are terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetupState {
    AwaitingConsent,
    Patching,
    CheckingCompanionMod,
    Done,
    Canceled,
}

/// Run the activation-time setup flow. Idempotent: an existing patch backup
/// skips consent and patching entirely, and the loader offer is suppressed
/// once declined for good or once the loader is present.
pub fn run(game_path: &Path, ctx: &dyn HostContext) -> Result<(), SetupError> {
    let mut state = if is_patched(game_path) {
        SetupState::CheckingCompanionMod
    } else {
        SetupState::AwaitingConsent
    };

    loop {
        state = match state {
            SetupState::AwaitingConsent => match ctx.request_patch_consent(game_path) {
                PatchConsent::Accept => SetupState::Patching,
                PatchConsent::Decline => SetupState::Canceled,
            },
            SetupState::Patching => {
                run_patcher(game_path)?;
                SetupState::CheckingCompanionMod
            }
            SetupState::CheckingCompanionMod => {
                offer_companion_loader(game_path, ctx)?;
                SetupState::Done
            }
            SetupState::Done => return Ok(()),
            SetupState::Canceled => {
                log_setup("Patch declined; game activation stops here");
                return Err(SetupError::Canceled);
            }
        };
    }
}

/// Has the patcher already run against this install?
pub fn is_patched(game_path: &Path) -> bool {
    patch_backup_path(game_path).is_file()
}

fn patch_backup_path(game_path: &Path) -> PathBuf {
    game_path.join(DATA_FOLDER).join(PATCH_BACKUP)
}

fn run_patcher(game_path: &Path) -> Result<(), SetupError> {
    let patcher = game_path.join(PATCHER_EXE);
    if !patcher.is_file() {
        return Err(SetupError::PatcherMissing { path: patcher });
    }

    log_setup(&format!("Running patcher: {}", patcher.display()));
    let status = Command::new(&patcher)
        .current_dir(game_path)
        .status()
        .map_err(|e| SetupError::Io {
            context: format!("launching {}", patcher.display()),
            source: e,
        })?;
    if !status.success() {
        return Err(SetupError::PatcherFailed {
            code: status.code(),
        });
    }

    let backup = patch_backup_path(game_path);
    if !backup.is_file() {
        return Err(SetupError::BackupMissing { path: backup });
    }
    log_setup("Patch applied");
    Ok(())
}

// ============================================================================
// Companion Loader Offer
// ============================================================================

fn offer_companion_loader(game_path: &Path, ctx: &dyn HostContext) -> Result<(), SetupError> {
    if loader_declined(game_path) || loader_installed(game_path) {
        return Ok(());
    }

    match ctx.offer_companion_loader() {
        LoaderOffer::Install => {
            log_setup("Opening companion loader download page");
            ctx.open_url(LOADER_URL);
        }
        LoaderOffer::Later => {}
        LoaderOffer::Never => write_optout(game_path)?,
    }
    Ok(())
}

fn loader_declined(game_path: &Path) -> bool {
    game_path.join(LOADER_OPTOUT).exists()
}

/// The loader ships as UnderMod*.dll somewhere under the mods folder
pub fn loader_installed(game_path: &Path) -> bool {
    WalkDir::new(game_path.join(MODS_FOLDER))
        .max_depth(2)
        .into_iter()
        .filter_map(Result::ok)
        .any(|entry| {
            entry.file_type().is_file()
                && entry.file_name().to_str().is_some_and(|name| {
                    name.starts_with(LOADER_PREFIX) && name.to_ascii_lowercase().ends_with(".dll")
                })
        })
}

fn write_optout(game_path: &Path) -> Result<(), SetupError> {
    let marker = game_path.join(LOADER_OPTOUT);
    fs::write(&marker, "UnderMod install prompt disabled by user.\n").map_err(|e| {
        SetupError::Io {
            context: format!("writing {}", marker.display()),
            source: e,
        }
    })?;
    log_setup("Companion loader offer declined for good");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FakeHost {
        consent: PatchConsent,
        offer: LoaderOffer,
        consent_asked: Cell<bool>,
        offer_asked: Cell<bool>,
        url_opened: Cell<bool>,
    }

    impl FakeHost {
        fn new(consent: PatchConsent, offer: LoaderOffer) -> Self {
            Self {
                consent,
                offer,
                consent_asked: Cell::new(false),
                offer_asked: Cell::new(false),
                url_opened: Cell::new(false),
            }
        }
    }

    impl HostContext for FakeHost {
        fn find_game_install_path(&self, _app_id: &str) -> Option<PathBuf> {
            None
        }

        fn request_patch_consent(&self, _game_path: &Path) -> PatchConsent {
            self.consent_asked.set(true);
            self.consent
        }

        fn offer_companion_loader(&self) -> LoaderOffer {
            self.offer_asked.set(true);
            self.offer
        }

        fn open_url(&self, _url: &str) {
            self.url_opened.set(true);
        }
    }

    fn temp_game_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "undermine-setup-test-{}-{}",
            tag,
            std::process::id()
        ));
        fs::create_dir_all(dir.join(DATA_FOLDER).join("Managed"))
            .expect("temp game dir should be creatable");
        dir
    }

    fn mark_patched(game: &Path) {
        fs::write(patch_backup_path(game), b"backup").unwrap();
    }

    #[test]
    fn declined_consent_cancels_setup() {
        let game = temp_game_dir("decline");
        let host = FakeHost::new(PatchConsent::Decline, LoaderOffer::Later);

        let err = run(&game, &host).expect_err("declining must cancel");
        assert!(matches!(err, SetupError::Canceled));
        assert!(host.consent_asked.get());
        assert!(!host.offer_asked.get());
        let _ = fs::remove_dir_all(&game);
    }

    #[test]
    fn patched_install_skips_the_consent_prompt() {
        let game = temp_game_dir("patched");
        mark_patched(&game);
        let host = FakeHost::new(PatchConsent::Decline, LoaderOffer::Later);

        run(&game, &host).expect("already-patched setup is a no-op");
        assert!(!host.consent_asked.get());
        assert!(host.offer_asked.get());
        let _ = fs::remove_dir_all(&game);
    }

    #[test]
    fn declining_the_loader_for_good_writes_the_optout_marker() {
        let game = temp_game_dir("optout");
        mark_patched(&game);
        let host = FakeHost::new(PatchConsent::Accept, LoaderOffer::Never);

        run(&game, &host).expect("setup should complete");
        assert!(loader_declined(&game));

        // A second activation must not ask again
        let again = FakeHost::new(PatchConsent::Accept, LoaderOffer::Never);
        run(&game, &again).expect("setup should complete");
        assert!(!again.offer_asked.get());
        let _ = fs::remove_dir_all(&game);
    }

    #[test]
    fn accepting_the_offer_opens_the_download_page() {
        let game = temp_game_dir("install");
        mark_patched(&game);
        let host = FakeHost::new(PatchConsent::Accept, LoaderOffer::Install);

        run(&game, &host).expect("setup should complete");
        assert!(host.url_opened.get());
        assert!(!loader_declined(&game));
        let _ = fs::remove_dir_all(&game);
    }

    #[test]
    fn present_loader_suppresses_the_offer() {
        let game = temp_game_dir("loader");
        mark_patched(&game);
        fs::create_dir_all(game.join(MODS_FOLDER)).unwrap();
        fs::write(game.join(MODS_FOLDER).join("UnderModLib.dll"), b"").unwrap();

        let host = FakeHost::new(PatchConsent::Accept, LoaderOffer::Install);
        run(&game, &host).expect("setup should complete");
        assert!(!host.offer_asked.get());
        let _ = fs::remove_dir_all(&game);
    }

    #[test]
    fn missing_patcher_is_reported() {
        let game = temp_game_dir("nopatcher");
        let host = FakeHost::new(PatchConsent::Accept, LoaderOffer::Later);

        let err = run(&game, &host).expect_err("no patcher in the temp dir");
        assert!(matches!(err, SetupError::PatcherMissing { .. }));
        let _ = fs::remove_dir_all(&game);
    }
}
