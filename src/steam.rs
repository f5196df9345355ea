//! Steam install-path lookup
//!
//! Default discovery building block for hosts that have no store lookup of
//! their own: scans every known Steam installation, follows its library
//! folders, and reads the game's appmanifest. Only the handful of VDF
//! fields we need are extracted, so the parsing is a flat key/value scan
//! rather than a full document parser.

use std::fs;
use std::path::{Path, PathBuf};

use crate::logging::log_info;

/// All Steam installation paths to check, relative to the home directory
const STEAM_PATHS: &[&str] = &[
    ".local/share/Steam",
    ".steam/debian-installation",
    ".steam/steam",
    ".var/app/com.valvesoftware.Steam/data/Steam",
    ".var/app/com.valvesoftware.Steam/.local/share/Steam",
    "snap/steam/common/.local/share/Steam",
];

/// StateFlags value for a fully installed app
const STATE_INSTALLED: u32 = 4;

// ============================================================================
// VDF Scanning
// ============================================================================

/// Extract every `"key" "value"` pair from a VDF document, in order,
/// ignoring nesting. Sufficient for the two files read here: the fields
/// wanted from appmanifest_*.acf are unique, and in libraryfolders.vdf
/// every "path" value is a library root.
fn vdf_pairs(content: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.starts_with("//") {
            continue;
        }

        let mut fields: Vec<&str> = Vec::new();
        let mut rest = line;
        while let Some(start) = rest.find('"') {
            let Some(len) = rest[start + 1..].find('"') else {
                break;
            };
            fields.push(&rest[start + 1..start + 1 + len]);
            rest = &rest[start + 1 + len + 1..];
        }

        if let [key, value] = fields[..] {
            pairs.push((key.to_string(), value.to_string()));
        }
    }

    pairs
}

fn vdf_value(pairs: &[(String, String)], key: &str) -> Option<String> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
}

/// The appmanifest fields install-path lookup needs
struct AppManifest {
    install_dir: String,
    state_flags: u32,
}

impl AppManifest {
    fn parse(content: &str) -> Option<Self> {
        let pairs = vdf_pairs(content);
        Some(Self {
            install_dir: vdf_value(&pairs, "installdir")?,
            state_flags: vdf_value(&pairs, "StateFlags")?.parse().unwrap_or(0),
        })
    }

    fn is_installed(&self) -> bool {
        self.state_flags == STATE_INSTALLED
    }
}

// ============================================================================
// Library Discovery
// ============================================================================

/// Steam installations present on this machine
fn steam_roots() -> Vec<PathBuf> {
    let Some(home) = dirs::home_dir() else {
        return Vec::new();
    };

    let mut roots: Vec<PathBuf> = Vec::new();
    for relative in STEAM_PATHS {
        let candidate = home.join(relative);
        if !candidate.join("steamapps").exists() {
            continue;
        }
        // Symlinked layouts can surface one installation twice
        let canonical = candidate.canonicalize().unwrap_or(candidate.clone());
        if !roots
            .iter()
            .any(|r| r.canonicalize().unwrap_or(r.clone()) == canonical)
        {
            roots.push(candidate);
        }
    }
    roots
}

/// All library folders of a Steam installation, the installation itself
/// included
fn library_folders(steam_path: &Path) -> Vec<PathBuf> {
    let mut folders = vec![steam_path.to_path_buf()];

    for vdf in [
        steam_path.join("steamapps/libraryfolders.vdf"),
        steam_path.join("config/libraryfolders.vdf"),
    ] {
        let Ok(content) = fs::read_to_string(&vdf) else {
            continue;
        };
        for (key, value) in vdf_pairs(&content) {
            if key != "path" {
                continue;
            }
            let path = PathBuf::from(&value);
            if path.exists() && !folders.contains(&path) {
                folders.push(path);
            }
        }
    }

    folders
}

// ============================================================================
// Public API
// ============================================================================

/// Find the install directory for a Steam app across every installation
/// and library folder, or `None` when the app is absent or incomplete
pub fn find_app_install_path(app_id: &str) -> Option<PathBuf> {
    for root in steam_roots() {
        for library in library_folders(&root) {
            let manifest_path = library
                .join("steamapps")
                .join(format!("appmanifest_{}.acf", app_id));
            let Ok(content) = fs::read_to_string(&manifest_path) else {
                continue;
            };
            let Some(manifest) = AppManifest::parse(&content) else {
                continue;
            };
            if !manifest.is_installed() {
                continue;
            }

            let install_path = library.join("steamapps/common").join(&manifest.install_dir);
            if install_path.exists() {
                log_info(&format!(
                    "Steam app {} found at {}",
                    app_id,
                    install_path.display()
                ));
                return Some(install_path);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appmanifest_fields_are_extracted() {
        let content = r#"
"AppState"
{
    "appid"         "656350"
    "name"          "UnderMine"
    "StateFlags"    "4"
    "installdir"    "UnderMine"
}
"#;
        let manifest = AppManifest::parse(content).expect("manifest should parse");
        assert_eq!(manifest.install_dir, "UnderMine");
        assert!(manifest.is_installed());
    }

    #[test]
    fn partially_installed_app_is_rejected() {
        let content = "\"installdir\" \"UnderMine\"\n\"StateFlags\" \"1026\"\n";
        let manifest = AppManifest::parse(content).expect("manifest should parse");
        assert!(!manifest.is_installed());
    }

    #[test]
    fn library_paths_are_all_path_values() {
        let content = r#"
"libraryfolders"
{
    "0"
    {
        "path"      "/home/user/.local/share/Steam"
        "label"     ""
    }
    "1"
    {
        "path"      "/mnt/games/SteamLibrary"
    }
}
"#;
        let pairs = vdf_pairs(content);
        let paths: Vec<&String> = pairs
            .iter()
            .filter(|(k, _)| k == "path")
            .map(|(_, v)| v)
            .collect();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0], "/home/user/.local/share/Steam");
        assert_eq!(paths[1], "/mnt/games/SteamLibrary");
    }

    #[test]
    fn single_quoted_tokens_are_not_pairs() {
        let pairs = vdf_pairs("\"libraryfolders\"\n{\n}\n");
        assert!(pairs.is_empty());
    }
}
