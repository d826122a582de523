//! CSV and JSON export of results and configurations.
//!
//! CSV files carry a UTF-8 BOM so spreadsheet software detects the encoding.
//! Configuration JSON is the wholesale serialization of [`ReportConfig`];
//! import replaces the active configuration entirely, never merges.

use serde_json::Value;

use crate::engine::ReportResult;
use crate::model::ReportConfig;

/// BOM prefix for spreadsheet compatibility.
pub const CSV_BOM: &str = "\u{feff}";

/// Errors while importing a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("invalid report configuration file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration file has no source")]
    MissingSource,
}

/// Render a result as CSV: BOM, header row, one line per row.
///
/// Null and missing cells stringify to the empty string. Cells containing a
/// comma, quote, or newline are quoted.
pub fn to_csv(result: &ReportResult) -> String {
    let mut lines = Vec::with_capacity(result.rows.len() + 1);
    lines.push(
        result
            .columns
            .iter()
            .map(|c| csv_escape(c))
            .collect::<Vec<_>>()
            .join(","),
    );

    for row in &result.rows {
        let cells: Vec<String> = result
            .columns
            .iter()
            .map(|c| csv_escape(&cell_text(row.get(c))))
            .collect();
        lines.push(cells.join(","));
    }

    format!("{}{}", CSV_BOM, lines.join("\n"))
}

/// Export filename: `reporte-personalizado-<sourceId>-<dateFrom>.csv`.
pub fn csv_filename(config: &ReportConfig) -> String {
    format!(
        "reporte-personalizado-{}-{}.csv",
        config.source_id, config.date_from
    )
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn csv_escape(text: &str) -> String {
    if text.contains(',') || text.contains('"') || text.contains('\n') {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

/// Serialize a configuration for file export (pretty, 2-space indent).
pub fn config_to_json(config: &ReportConfig) -> serde_json::Result<String> {
    serde_json::to_string_pretty(config)
}

/// Parse an exported configuration file.
///
/// The source must be present; everything else replaces the active
/// configuration wholesale.
pub fn config_from_json(json: &str) -> Result<ReportConfig, ImportError> {
    let config: ReportConfig = serde_json::from_str(json)?;
    if config.source_id.is_empty() {
        return Err(ImportError::MissingSource);
    }
    Ok(config)
}

/// Serialize a result for file export.
pub fn result_to_json(result: &ReportResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(result)
}
