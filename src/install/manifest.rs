//! Per-mod metadata (`mod.json`) reading
//!
//! Mod authors hand-edit these files, so they arrive with byte-order marks,
//! `//` comments, and trailing commas. A small tolerance pass rewrites the
//! text into strict JSON before serde decodes it; the sanitization and
//! fallback-naming rules that consume the result live here too.

use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::game::INSTALLING_SUFFIX;

/// Fields recognized in `mod.json`
#[derive(Debug, Deserialize)]
struct ModManifest {
    #[serde(rename = "Name")]
    name: Option<String>,
}

/// Why a manifest could not produce a mod name
#[derive(Debug)]
pub enum ManifestError {
    /// File could not be read
    Io(std::io::Error),
    /// Content is not valid JSON, even after the tolerance pass
    Parse(serde_json::Error),
    /// Valid JSON, but no usable `Name` field
    MissingName,
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestError::Io(err) => write!(f, "failed to read manifest: {}", err),
            ManifestError::Parse(err) => write!(f, "failed to parse manifest: {}", err),
            ManifestError::MissingName => write!(f, "manifest has no usable Name field"),
        }
    }
}

impl Error for ManifestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ManifestError::Io(err) => Some(err),
            ManifestError::Parse(err) => Some(err),
            ManifestError::MissingName => None,
        }
    }
}

// ============================================================================
// Name Resolution
// ============================================================================

/// Read the mod name from an extracted manifest. `manifest` is the
/// archive-relative manifest path under the staging directory.
pub fn read_mod_name(destination: &Path, manifest: &str) -> Result<String, ManifestError> {
    let raw = fs::read_to_string(destination.join(manifest)).map_err(ManifestError::Io)?;
    let strict = to_strict_json(strip_bom(&raw));
    let parsed: ModManifest = serde_json::from_str(&strict).map_err(ManifestError::Parse)?;

    let name = parsed
        .name
        .as_deref()
        .map(sanitize_mod_name)
        .unwrap_or_default();
    if name.is_empty() {
        return Err(ManifestError::MissingName);
    }
    Ok(name)
}

/// Keep ASCII letters and digits only; everything else is unsafe in a
/// staging directory name
pub fn sanitize_mod_name(name: &str) -> String {
    name.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// Name to fall back on when the manifest cannot be used: the staging
/// directory's own name, minus the host's in-progress suffix
pub fn fallback_mod_name(destination: &Path) -> String {
    let base = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match base.strip_suffix(INSTALLING_SUFFIX) {
        Some(stripped) => stripped.to_string(),
        None => base,
    }
}

// ============================================================================
// Relaxed JSON Tolerance Pass
// ============================================================================

fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}

/// Rewrite tolerated-but-nonstandard JSON into strict JSON: drops `//` and
/// `/* */` comments and trailing commas, leaving string contents untouched.
fn to_strict_json(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                while chars.peek().is_some_and(|next| *next != '\n') {
                    chars.next();
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                loop {
                    match chars.next() {
                        None => break,
                        Some('*') if chars.peek() == Some(&'/') => {
                            chars.next();
                            break;
                        }
                        Some(_) => {}
                    }
                }
            }
            ',' => {
                // Hold the comma until the next significant character rules
                // out a trailing position
                let mut whitespace = String::new();
                while let Some(&next) = chars.peek() {
                    if !next.is_whitespace() {
                        break;
                    }
                    whitespace.push(next);
                    chars.next();
                }
                if !matches!(chars.peek(), Some('}') | Some(']') | None) {
                    out.push(',');
                }
                out.push_str(&whitespace);
            }
            _ => out.push(c),
        }
    }

    out
}
