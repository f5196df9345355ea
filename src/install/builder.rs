//! Copy-instruction derivation
//!
//! Given a listing that one of the classifiers has already claimed, compute
//! the destination-relative path for every file worth deploying. Manifest
//! archives re-root each logical mod under a directory named after it, so
//! several bundled mods land as siblings; root-folder archives re-root at
//! the folder wrapping the game's data directory, so any extra wrapping the
//! archive author added simply disappears.

use std::path::Path;

use super::classifier::{base_name, is_manifest_file, marker_position, nested};
use super::manifest::{fallback_mod_name, read_mod_name};
use super::Instruction;
use crate::logging::log_warning;

/// Entries without an extension are directory placeholders, not files
fn has_extension(path: &str) -> bool {
    !path.ends_with('/') && Path::new(path).extension().is_some()
}

fn is_text_file(path: &str) -> bool {
    Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
}

/// Directory component of an archive path, `.` for top-level entries
fn parent_dir(path: &str) -> &str {
    match path.trim_end_matches('/').rfind('/') {
        Some(pos) => &path[..pos],
        None => ".",
    }
}

// ============================================================================
// Manifest-Based Archives
// ============================================================================

/// Plan copies for a manifest-based archive. Every manifest entry defines
/// one logical mod; its files keep their structure relative to the
/// manifest's folder but land under a directory named after the mod.
///
/// The mod name is the manifest's folder name when there is one. For
/// top-level manifests the name comes from the manifest's `Name` field,
/// and a manifest that cannot be read or parsed degrades to a name derived
/// from the staging directory instead of failing the install.
pub fn build_manifest_instructions(files: &[String], destination: &Path) -> Vec<Instruction> {
    let mut instructions = Vec::new();

    for manifest in files.iter().filter(|f| is_manifest_file(f)) {
        let root_folder = parent_dir(manifest);
        let mod_name = if root_folder != "." {
            base_name(root_folder).to_string()
        } else {
            match read_mod_name(destination, manifest) {
                Ok(name) => name,
                Err(err) => {
                    let fallback = fallback_mod_name(destination);
                    log_warning(&format!(
                        "{}: {}; falling back to mod name '{}'",
                        manifest, err, fallback
                    ));
                    fallback
                }
            }
        };

        for file in files {
            if file == manifest || !has_extension(file) {
                continue;
            }
            let Some(at) = file.find(root_folder) else {
                continue;
            };
            let rel = if root_folder == "." {
                file.as_str()
            } else {
                match file.get(at + root_folder.len()..) {
                    Some(rest) => rest.trim_start_matches('/'),
                    None => continue,
                }
            };
            if rel.is_empty() {
                continue;
            }
            instructions.push(Instruction::Copy {
                source: file.clone(),
                destination: format!("{}/{}", mod_name, rel),
            });
        }
    }

    instructions
}

// ============================================================================
// Root-Folder Archives
// ============================================================================

/// Plan copies for a root-folder archive: everything re-roots at the folder
/// that directly wraps the game's data directory, so the data folder (and a
/// sibling mods folder, if shipped) lands correctly no matter how deeply the
/// archive wraps it. Plain text files are not deployed.
pub fn build_root_instructions(files: &[String]) -> Vec<Instruction> {
    let Some((marker_file, pos)) = files
        .iter()
        .find_map(|f| marker_position(f).map(|p| (f, p)))
    else {
        return Vec::new();
    };

    // Index just past the marker's leading separator, in nested coordinates.
    // The folder right before it is what the archive is replacing; keep its
    // casing exactly as shipped.
    let idx = pos + 1;
    let marker_entry = nested(marker_file);
    let root_dir = base_name(&marker_entry[..pos]).to_string();

    let mut instructions = Vec::new();
    for file in files {
        let entry = nested(file);
        if !has_extension(&entry) || is_text_file(&entry) || !entry.contains(&root_dir) {
            continue;
        }
        let Some(dest) = entry.get(idx..) else {
            continue;
        };
        if dest.is_empty() {
            continue;
        }
        instructions.push(Instruction::Copy {
            source: file.clone(),
            destination: dest.to_string(),
        });
    }

    instructions
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn listing(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    fn copies(instructions: &[Instruction]) -> Vec<(String, String)> {
        instructions
            .iter()
            .map(|i| (i.source().to_string(), i.destination().to_string()))
            .collect()
    }

    #[test]
    fn foldered_manifest_names_mod_after_its_folder() {
        // Name resolves from the folder; the manifest is never read, so a
        // bogus destination must not matter
        let files = listing(&["ModX/mod.json", "ModX/data.bin"]);
        let instructions =
            build_manifest_instructions(&files, &PathBuf::from("/nonexistent/stage"));
        assert_eq!(
            copies(&instructions),
            vec![("ModX/data.bin".to_string(), "ModX/data.bin".to_string())]
        );
    }

    #[test]
    fn manifest_file_itself_is_not_copied() {
        let files = listing(&["ModX/mod.json", "ModX/sub/thing.dat"]);
        let instructions = build_manifest_instructions(&files, &PathBuf::from("/x"));
        assert_eq!(instructions.len(), 1);
        assert_eq!(instructions[0].destination(), "ModX/sub/thing.dat");
    }

    #[test]
    fn directory_entries_are_skipped() {
        let files = listing(&["ModX/mod.json", "ModX/sub/", "ModX/sub/a.dll"]);
        let instructions = build_manifest_instructions(&files, &PathBuf::from("/x"));
        assert_eq!(
            copies(&instructions),
            vec![("ModX/sub/a.dll".to_string(), "ModX/sub/a.dll".to_string())]
        );
    }

    #[test]
    fn bundled_mods_land_in_sibling_directories() {
        let files = listing(&[
            "ModA/mod.json",
            "ModA/a.dll",
            "ModB/mod.json",
            "ModB/b.dll",
        ]);
        let instructions = build_manifest_instructions(&files, &PathBuf::from("/x"));
        assert_eq!(
            copies(&instructions),
            vec![
                ("ModA/a.dll".to_string(), "ModA/a.dll".to_string()),
                ("ModB/b.dll".to_string(), "ModB/b.dll".to_string()),
            ]
        );
    }

    fn temp_stage(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "undermine-builder-{}-{}",
            std::process::id(),
            tag
        ));
        std::fs::create_dir_all(&dir).expect("temp stage dir should be creatable");
        dir
    }

    #[test]
    fn top_level_manifest_takes_its_name_from_the_manifest() {
        let stage = temp_stage("named.installing");
        std::fs::write(stage.join("mod.json"), "{\"Name\": \"Cool Mod!\"}").unwrap();

        let files = listing(&["mod.json", "data.bin"]);
        let instructions = build_manifest_instructions(&files, &stage);
        assert_eq!(
            copies(&instructions),
            vec![("data.bin".to_string(), "CoolMod/data.bin".to_string())]
        );
        let _ = std::fs::remove_dir_all(&stage);
    }

    #[test]
    fn malformed_manifest_degrades_to_the_staging_folder_name() {
        let stage = temp_stage("Broken.installing");
        std::fs::write(stage.join("mod.json"), "definitely {{ not json").unwrap();

        let files = listing(&["mod.json", "data.bin"]);
        let instructions = build_manifest_instructions(&files, &stage);
        assert_eq!(instructions.len(), 1);
        assert!(
            instructions[0].destination().ends_with("/data.bin"),
            "file should still be re-rooted under the fallback name"
        );
        assert!(
            !instructions[0].destination().contains(".installing"),
            "fallback name should come from the staging folder, suffix stripped"
        );
        let _ = std::fs::remove_dir_all(&stage);
    }

    #[test]
    fn wrapped_data_folder_re_roots_at_the_wrapper() {
        let files = listing(&[
            "SomeMod/UnderMine_Data/x.dll",
            "SomeMod/Mods/y.dll",
            "SomeMod/Readme.txt",
        ]);
        let instructions = build_root_instructions(&files);
        assert_eq!(
            copies(&instructions),
            vec![
                (
                    "SomeMod/UnderMine_Data/x.dll".to_string(),
                    "UnderMine_Data/x.dll".to_string()
                ),
                ("SomeMod/Mods/y.dll".to_string(), "Mods/y.dll".to_string()),
            ]
        );
    }

    #[test]
    fn top_level_data_folder_keeps_its_paths() {
        let files = listing(&["UnderMine_Data/Managed/core.dll", "Mods/loader.dll"]);
        let instructions = build_root_instructions(&files);
        assert_eq!(
            copies(&instructions),
            vec![
                (
                    "UnderMine_Data/Managed/core.dll".to_string(),
                    "UnderMine_Data/Managed/core.dll".to_string()
                ),
                ("Mods/loader.dll".to_string(), "Mods/loader.dll".to_string()),
            ]
        );
    }

    #[test]
    fn text_files_are_excluded_from_root_deployment() {
        let files = listing(&["Wrap/UnderMine_Data/a.dll", "Wrap/UnderMine_Data/notes.TXT"]);
        let instructions = build_root_instructions(&files);
        assert_eq!(instructions.len(), 1);
        assert_eq!(instructions[0].destination(), "UnderMine_Data/a.dll");
    }

    #[test]
    fn no_marker_plans_nothing() {
        let files = listing(&["whatever/readme.md"]);
        assert!(build_root_instructions(&files).is_empty());
    }
}
