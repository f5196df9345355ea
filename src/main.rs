//! Dry-run command line for the UnderMine support plugin
//!
//! Exercises discovery and archive classification without a host:
//! `detect` prints the Steam install path, `test` classifies a file listing,
//! `plan` prints the copy instructions an install would produce.

use std::error::Error;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use undermine_support::game::{self, GAME_ID};
use undermine_support::install::{
    classify_deployment, install_manifest_package, install_root_package, is_manifest_package,
    is_root_package, InstallOutcome,
};
use undermine_support::logging::init_logger;
use undermine_support::steam;

#[derive(Parser)]
#[command(
    name = "undermine-support",
    version,
    about = "UnderMine mod-support dry-run tool"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Locate the installed game via Steam
    Detect,
    /// Classify an archive file listing (one path per line, `-` for stdin)
    Test { listing: PathBuf },
    /// Print the copy instructions an install of the listing would produce
    Plan {
        listing: PathBuf,
        /// Staging directory used for manifest reads and fallback naming
        #[arg(long, default_value = ".")]
        destination: PathBuf,
        /// Emit instructions as JSON instead of one copy per line
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Detect => detect(),
        Commands::Test { listing } => test(&listing),
        Commands::Plan {
            listing,
            destination,
            json,
        } => plan(&listing, &destination, json),
    }
}

fn read_listing(path: &Path) -> Result<Vec<String>, Box<dyn Error>> {
    let content = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(path)?
    };

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

fn detect() -> Result<(), Box<dyn Error>> {
    match steam::find_app_install_path(game::STEAM_APP_ID) {
        Some(path) if game::is_game_dir(&path) => {
            println!("{}", path.display());
            Ok(())
        }
        Some(path) => Err(format!(
            "Steam reports {} but {} is missing there",
            path.display(),
            game::EXECUTABLE
        )
        .into()),
        None => Err("UnderMine not found in any Steam library".into()),
    }
}

fn test(listing: &Path) -> Result<(), Box<dyn Error>> {
    let files = read_listing(listing)?;
    if is_manifest_package(&files, GAME_ID) {
        println!("manifest-based package");
    } else if is_root_package(&files, GAME_ID) {
        println!("root-folder package");
    } else {
        println!("unsupported");
    }
    Ok(())
}

fn plan(listing: &Path, destination: &Path, json: bool) -> Result<(), Box<dyn Error>> {
    let files = read_listing(listing)?;

    let outcome: InstallOutcome = if is_manifest_package(&files, GAME_ID) {
        install_manifest_package(&files, destination, GAME_ID, &|_| {})?
    } else if is_root_package(&files, GAME_ID) {
        install_root_package(&files, destination, GAME_ID, &|_| {})?
    } else {
        return Err("listing matches neither packaging convention".into());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        for instruction in &outcome.instructions {
            println!("{} -> {}", instruction.source(), instruction.destination());
        }
        let mode = if classify_deployment(&outcome.instructions) {
            "game directory (root deployment)"
        } else {
            "mod staging directory"
        };
        println!("deploys to: {}", mode);
    }
    Ok(())
}
