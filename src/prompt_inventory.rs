/*
cargo prompt_inventory

cargo prompt_inventory \
    -i prompt_gen.json \
    -o prompt_inventory.xlsx
*/

use std::{
    fs::{self, File},
    io::BufReader,
    path::{is_separator, Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use log::{info, warn, LevelFilter};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_xlsxwriter::Workbook;
use serde::Deserialize;
use simplelog::{Config, WriteLogger};

const SHEET_NAME: &str = "Prompts";
const HEADERS: [&str; 4] = ["Number", "Level", "Background Name", "Prompt"];
const UNKNOWN_LEVEL: &str = "Unknown";

// case-sensitive, first match wins
static LEVEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"level(\d+)").expect("level pattern must compile"));

/// Summarise prompt records into a one-sheet Excel inventory.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// JSON array of {background, prompt} records
    #[arg(short, long, value_name = "PATH", default_value = "prompt_gen.json")]
    input: PathBuf,

    /// Workbook to create (overwritten if it exists)
    #[arg(short, long, value_name = "PATH", default_value = "prompt_inventory.xlsx")]
    output: PathBuf,

    /// Directory for a run log (no log file is written when omitted)
    #[arg(long, value_name = "PATH")]
    log_dir: Option<PathBuf>,
}

// One input record; any other keys in the object are ignored
#[derive(Debug, Deserialize)]
struct PromptRecord {
    background: String,
    prompt: String,
}

// One spreadsheet row, columns in HEADERS order
#[derive(Debug, Clone, PartialEq)]
struct InventoryRow {
    number: usize, // 1-based
    level: String,
    background_name: String,
    prompt: String,
}

fn main() -> Result<()> {
    // ----- parse CLI --------------------------------------------------------
    let cli = Cli::parse();

    // ----- initialise logging ----------------------------------------------
    let log_path = init_logging(cli.log_dir.as_deref(), &cli.output)?;
    info!("Started - input: {:?}, output: {:?}", cli.input, cli.output);

    // ----- load + transform ------------------------------------------------
    let records = load_records(&cli.input)?;
    info!("Loaded {} prompt records", records.len());

    let rows = build_rows(records);
    let unknown = rows.iter().filter(|r| r.level == UNKNOWN_LEVEL).count();
    if unknown > 0 {
        warn!("{unknown} record(s) have no level token in their background");
    }

    // ----- write workbook ---------------------------------------------------
    write_inventory(&rows, &cli.output)?;
    info!("Wrote {} rows to {:?}", rows.len(), cli.output);

    println!("Excel file created successfully at {}", cli.output.display());
    if let Some(path) = log_path {
        println!("Run log written to {}", path.display());
    }
    Ok(())
}

/// `<log_dir>/<timestamp>+<output file name>.log`
fn log_file_path(log_dir: &Path, output: &Path) -> PathBuf {
    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    let out_name = output
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "prompt_inventory".to_string());
    log_dir.join(format!("{timestamp}+{out_name}.log"))
}

// Returns the log file path, or None when logging was not requested
fn init_logging(log_dir: Option<&Path>, output: &Path) -> Result<Option<PathBuf>> {
    let Some(log_dir) = log_dir else {
        return Ok(None);
    };
    fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let log_path = log_file_path(log_dir, output);
    let log_file = File::create(&log_path)
        .with_context(|| format!("failed to create log file {}", log_path.display()))?;
    WriteLogger::init(LevelFilter::Info, Config::default(), log_file)
        .context("failed to initialise file logger")?;
    Ok(Some(log_path))
}

fn load_records(path: &Path) -> Result<Vec<PromptRecord>> {
    let file = File::open(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))
}

/// "Level N" from the first `level<digits>` token, else "Unknown".
fn level_label(background: &str) -> String {
    match LEVEL_RE.captures(background) {
        Some(caps) => format!("Level {}", &caps[1]),
        None => UNKNOWN_LEVEL.to_string(),
    }
}

/// Text after the last path separator; "" when the path ends with one.
fn background_name(background: &str) -> &str {
    background.rsplit(is_separator).next().unwrap_or(background)
}

fn build_rows(records: Vec<PromptRecord>) -> Vec<InventoryRow> {
    records
        .into_iter()
        .enumerate()
        .map(|(i, rec)| InventoryRow {
            number: i + 1,
            level: level_label(&rec.background),
            background_name: background_name(&rec.background).to_string(),
            prompt: rec.prompt,
        })
        .collect()
}

fn write_inventory(rows: &[InventoryRow], path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, header) in (0u16..).zip(HEADERS) {
        sheet.write_string(0, col, header)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = u32::try_from(i + 1).context("too many rows for one worksheet")?;
        sheet.write_number(r, 0, row.number as f64)?;
        sheet.write_string(r, 1, &row.level)?;
        sheet.write_string(r, 2, &row.background_name)?;
        sheet
            .write_string(r, 3, &row.prompt)
            .with_context(|| format!("writing prompt of row {}", row.number))?;
    }

    workbook
        .save(path)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
