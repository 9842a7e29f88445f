//! Macro script loading.
//!
//! Two source formats produce the same [`Row`]s.  The format is picked from
//! the file extension by [`ScriptFormat::from_path`]: `.csv` is CSV,
//! anything else is YAML.
//!
//! CSV scripts start with a header row naming the fields; every following
//! record is one row.  Empty cells are absent fields, and a record shorter
//! than the header leaves its trailing fields absent:
//!
//! ```text
//! start_delay_ms,duration_ms,start_after_id,id,input,angle,magnitude
//! 0,100,,jump,a,,
//! 50,800,,,ls,90,100
//! 20,60,jump,,"+"
//! ```
//!
//! YAML scripts hold an ordered list of rows.  Each row is a flat mapping of
//! field name → scalar:
//!
//! ```yaml
//! rows:
//!   - { id: jump, start_delay_ms: 0, duration_ms: 100, input: a }
//!   - { start_delay_ms: 50, duration_ms: 800, input: ls, angle: 90, magnitude: 100 }
//!   - { start_after_id: jump, start_delay_ms: 20, duration_ms: 60, input: "+" }
//! ```
//!
//! Values are handed to the compiler as text, so `duration_ms: ten` loads
//! fine and is rejected by the compiler with the row attached.  `null`
//! values count as absent.  In YAML `+` and `-` must be quoted; a bare `-`
//! is sequence syntax.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_yaml::Value;
use tracing::{debug, info};

use crate::compiler::Row;

// ── Private YAML deserialization types ────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ScriptFile {
    #[serde(default)]
    rows: Vec<BTreeMap<String, Value>>,
}

// ── Format selection ──────────────────────────────────────────────────────────

/// Source format of a script file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptFormat {
    Csv,
    Yaml,
}

impl ScriptFormat {
    /// `.csv` (any case) is CSV; every other extension is YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => ScriptFormat::Csv,
            _ => ScriptFormat::Yaml,
        }
    }
}

/// Read the rows of the script at `path`, in order, using the format its
/// extension names.
pub fn load_from_file(path: &Path) -> Result<Vec<Row>> {
    match ScriptFormat::from_path(path) {
        ScriptFormat::Csv => load_csv(path),
        ScriptFormat::Yaml => load_yaml(path),
    }
}

// ── CSV ───────────────────────────────────────────────────────────────────────

/// Read a header-keyed CSV script.
///
/// # Errors
/// Returns an error if the file cannot be read, is not valid CSV, or a record
/// has more cells than the header has columns.
pub fn load_csv(path: &Path) -> Result<Vec<Row>> {
    info!("Loading CSV script from: {}", path.display());

    let file = std::fs::File::open(path)
        .with_context(|| format!("Cannot open script file: {}", path.display()))?;

    let rows = rows_from_csv_reader(file)
        .with_context(|| format!("Failed to parse script file: {}", path.display()))?;

    info!("Loaded {} row(s) from {}", rows.len(), path.display());
    Ok(rows)
}

/// Parse rows from CSV text whose first record is the header.
///
/// Row numbers count data records from 1; the header is not a row.
pub fn rows_from_csv_reader<R: Read>(reader: R) -> Result<Vec<Row>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers().context("Cannot read header row")?.clone();

    rdr.records()
        .enumerate()
        .map(|(i, record)| -> Result<Row> {
            let line = i + 1;
            let record = record.with_context(|| format!("row {line}"))?;
            if record.len() > headers.len() {
                bail!(
                    "row {line}: {} cells but the header has {} columns",
                    record.len(),
                    headers.len()
                );
            }

            let mut row = Row::new(line);
            for (name, value) in headers.iter().zip(record.iter()) {
                if !value.is_empty() {
                    row.set(name, value);
                }
            }
            debug!(line, "{row}");
            Ok(row)
        })
        .collect()
}

// ── YAML ──────────────────────────────────────────────────────────────────────

/// Read a YAML script.
///
/// # Errors
/// Returns an error if the file cannot be read, is not valid YAML, or a row
/// holds a nested (non-scalar) value.
pub fn load_yaml(path: &Path) -> Result<Vec<Row>> {
    info!("Loading YAML script from: {}", path.display());

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot open script file: {}", path.display()))?;

    let rows = rows_from_yaml_str(&content)
        .with_context(|| format!("Failed to parse script file: {}", path.display()))?;

    info!("Loaded {} row(s) from {}", rows.len(), path.display());
    Ok(rows)
}

/// Parse rows from a YAML document.
pub fn rows_from_yaml_str(content: &str) -> Result<Vec<Row>> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let file: ScriptFile = serde_yaml::from_str(content)?;

    file.rows
        .into_iter()
        .enumerate()
        .map(|(i, fields)| -> Result<Row> {
            let line = i + 1;
            let mut row = Row::new(line);
            for (name, value) in fields {
                if let Some(text) = scalar_text(&value)
                    .with_context(|| format!("row {line}: field '{name}'"))?
                {
                    row.set(name, text);
                }
            }
            debug!(line, "{row}");
            Ok(row)
        })
        .collect()
}

/// Text form of a scalar; `None` for `null`.
fn scalar_text(value: &Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => {
            bail!("expected a scalar value, found {value:?}")
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
