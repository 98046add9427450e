/*
cargo image_gen \
    data/level3.json \
    data/level4.json \
    data/level5.json \
    data/level6.json \
    -o image_gen.json
*/

use std::{
    fs::{self, File},
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use log::{info, warn, LevelFilter};
use serde::{Deserialize, Deserializer, Serialize};
use simplelog::{Config, WriteLogger};

/// Collect every scene that needs a background asset into one manifest.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Level scene files (JSON arrays); the level name is the file stem
    #[arg(required = true)]
    levels: Vec<PathBuf>,

    /// Manifest to create (overwritten if it exists)
    #[arg(short, long, value_name = "PATH", default_value = "image_gen.json")]
    output: PathBuf,

    /// Directory for a run log (no log file is written when omitted)
    #[arg(long, value_name = "PATH")]
    log_dir: Option<PathBuf>,
}

// Only the fields the manifest needs; choices, outcomes etc. are ignored
#[derive(Debug, Deserialize)]
struct Scene {
    id: Option<String>,
    #[serde(rename = "type")]
    scene_type: Option<String>,
    title: Option<String>,
    // outer None: key absent, Some(None): key present but null
    #[serde(default, deserialize_with = "present")]
    description: Option<Option<String>>,
    background: Option<String>,
}

fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageEntry {
    level: String,
    scene_id: String,
    scene_type: String,
    background: String,
    description: String,
    title: String, // "" when the scene has none
}

fn main() -> Result<()> {
    // ----- parse CLI --------------------------------------------------------
    let cli = Cli::parse();

    // ----- initialise logging ----------------------------------------------
    let log_path = init_logging(cli.log_dir.as_deref(), &cli.output)?;
    info!("Started - {} level file(s), output: {:?}", cli.levels.len(), cli.output);

    // ----- collect scenes per level ----------------------------------------
    let mut all_entries: Vec<ImageEntry> = Vec::new();
    for path in &cli.levels {
        let level = level_name(path)?;
        let scenes = load_scenes(path)?;
        let entries = collect_entries(scenes, &level);

        info!("{level}: {} scene(s) with backgrounds", entries.len());
        println!("Processed {} scenes with backgrounds from {level}", entries.len());
        all_entries.extend(entries);
    }

    // ----- write manifest ---------------------------------------------------
    let pretty = serde_json::to_string_pretty(&all_entries)?;
    fs::write(&cli.output, pretty)
        .with_context(|| format!("writing {}", cli.output.display()))?;
    info!("Finished - {} entries written", all_entries.len());

    let out_name = cli
        .output
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| cli.output.display().to_string());
    println!("Generated {out_name} with {} image entries", all_entries.len());
    if let Some(path) = log_path {
        println!("Run log written to {}", path.display());
    }
    Ok(())
}

// Returns the log file path, or None when logging was not requested
fn init_logging(log_dir: Option<&Path>, output: &Path) -> Result<Option<PathBuf>> {
    let Some(log_dir) = log_dir else {
        return Ok(None);
    };
    fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    let out_name = output
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image_gen".to_string());
    let log_path = log_dir.join(format!("{timestamp}+{out_name}.log"));

    let log_file = File::create(&log_path)
        .with_context(|| format!("failed to create log file {}", log_path.display()))?;
    WriteLogger::init(LevelFilter::Info, Config::default(), log_file)
        .context("failed to initialise file logger")?;
    Ok(Some(log_path))
}

/// `data/level3.json` -> `level3`
fn level_name(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_owned)
        .with_context(|| format!("cannot derive a level name from {}", path.display()))
}

fn load_scenes(path: &Path) -> Result<Vec<Scene>> {
    let file = File::open(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))
}

fn collect_entries(scenes: Vec<Scene>, level: &str) -> Vec<ImageEntry> {
    let mut entries = Vec::new();

    for scene in scenes {
        // scenes without artwork are not part of the manifest
        let Some(background) = scene.background.filter(|b| !b.is_empty()) else {
            continue;
        };
        let Some(description) = scene.description else {
            continue;
        };

        match (scene.id, scene.scene_type, description) {
            (Some(scene_id), Some(scene_type), Some(description))
                if !scene_id.is_empty() && !scene_type.is_empty() && !description.is_empty() =>
            {
                entries.push(ImageEntry {
                    level: level.to_string(),
                    scene_id,
                    scene_type,
                    background,
                    description,
                    title: scene.title.unwrap_or_default(),
                });
            }
            (scene_id, _, _) => warn!(
                "Skipping scene {:?} in {level} due to missing fields",
                scene_id.unwrap_or_default()
            ),
        }
    }

    entries
}
