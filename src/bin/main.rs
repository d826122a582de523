//! Informe CLI - run, save, and export ad-hoc reports.
//!
//! Usage:
//!   informe sources
//!   informe validate <config.json>
//!   informe run <config.json> --org <id> [--format table|csv|json] [--out <file>]
//!   informe save <config.json> --org <id> --user <id> --name <name>
//!   informe reports --org <id>
//!   informe delete-report <id>
//!   informe load <id> --out <config.json>

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use informe::catalog;
use informe::config::Settings;
use informe::engine::{Engine, ReportResult, SqliteDatastore};
use informe::export;
use informe::model::{self, ReportConfig};
use informe::store::SavedReportStore;

#[derive(Parser)]
#[command(name = "informe")]
#[command(about = "Informe - ad-hoc report builder over tenant-scoped data sources")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the SQLite database (overrides settings).
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered sources and their columns
    Sources,

    /// Validate a report configuration without executing it
    Validate {
        /// Path to the configuration JSON file
        file: PathBuf,
    },

    /// Execute a report
    Run {
        /// Path to the configuration JSON file
        file: PathBuf,

        /// Organization to scope the query to
        #[arg(short, long)]
        org: String,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,

        /// Write output to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Save a configuration under a name
    Save {
        /// Path to the configuration JSON file
        file: PathBuf,

        #[arg(short, long)]
        org: String,

        #[arg(short, long)]
        user: String,

        #[arg(short, long)]
        name: String,
    },

    /// List saved reports of an organization
    Reports {
        #[arg(short, long)]
        org: String,
    },

    /// Delete a saved report
    DeleteReport {
        /// Saved report id
        id: String,
    },

    /// Export a saved report's configuration to a JSON file
    Load {
        /// Saved report id
        id: String,

        /// Destination file (stdout if omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Aligned text table
    Table,
    /// BOM-prefixed CSV
    Csv,
    /// Pretty JSON
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sources => cmd_sources(),
        Commands::Validate { file } => cmd_validate(file),
        Commands::Run {
            file,
            org,
            format,
            out,
        } => cmd_run(file, org, format, out, cli.db).await,
        Commands::Save {
            file,
            org,
            user,
            name,
        } => cmd_save(file, org, user, name),
        Commands::Reports { org } => cmd_reports(org),
        Commands::DeleteReport { id } => cmd_delete_report(id),
        Commands::Load { id, out } => cmd_load(id, out),
    }
}

fn cmd_sources() -> ExitCode {
    for source in catalog::sources() {
        println!("{} ({})", source.id, source.label);
        for column in &source.columns {
            println!("  {:<20} {:?}", column.key, column.ty);
        }
        if let Some(date_column) = source.default_date_column {
            println!("  date column: {}", date_column);
        }
        println!();
    }
    ExitCode::SUCCESS
}

fn cmd_validate(file: PathBuf) -> ExitCode {
    let config = match read_config(&file) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let Some(source) = catalog::get_source(&config.source_id) else {
        eprintln!("error: unknown source '{}'", config.source_id);
        return ExitCode::FAILURE;
    };

    match model::validate(source, &config) {
        Ok(()) => {
            println!("configuration is valid");
            ExitCode::SUCCESS
        }
        Err(errors) => {
            eprintln!("configuration has {} problem(s):", errors.len());
            for error in errors {
                eprintln!("  - {}", error);
            }
            ExitCode::FAILURE
        }
    }
}

async fn cmd_run(
    file: PathBuf,
    org: String,
    format: OutputFormat,
    out: Option<PathBuf>,
    db: Option<PathBuf>,
) -> ExitCode {
    let mut config = match read_config(&file) {
        Ok(c) => c,
        Err(code) => return code,
    };

    // Boundary duties: never send an empty source, clamp the limit before
    // invoking execution.
    if config.source_id.is_empty() {
        eprintln!("error: configuration has no source");
        return ExitCode::FAILURE;
    }
    config.limit = config.clamped_limit();

    let datastore = match open_datastore(db) {
        Ok(d) => d,
        Err(code) => return code,
    };

    let engine = Engine::new(Arc::new(datastore));
    let result = match engine.execute(&org, &config).await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let rendered = match render(&result, format) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // CSV defaults to the conventional export filename.
    let out = out.or_else(|| match format {
        OutputFormat::Csv => Some(PathBuf::from(export::csv_filename(&config))),
        _ => None,
    });

    if let Some(out) = out {
        if let Err(e) = fs::write(&out, rendered) {
            eprintln!("error: failed to write {}: {}", out.display(), e);
            return ExitCode::FAILURE;
        }
        println!("wrote {}", out.display());
    } else {
        println!("{}", rendered);
    }

    // `total` is bounded by the limit, never a full-dataset count.
    eprintln!(
        "showing {} row(s), bounded by limit {}",
        result.total, config.limit
    );
    ExitCode::SUCCESS
}

fn cmd_save(file: PathBuf, org: String, user: String, name: String) -> ExitCode {
    let config = match read_config(&file) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let store = match open_store() {
        Ok(s) => s,
        Err(code) => return code,
    };

    match store.save(&org, &user, &name, &config) {
        Ok(saved) => {
            println!("saved '{}' as {}", saved.name, saved.id);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("could not save report: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_reports(org: String) -> ExitCode {
    let store = match open_store() {
        Ok(s) => s,
        Err(code) => return code,
    };

    match store.list(&org) {
        Ok(reports) => {
            if reports.is_empty() {
                println!("no saved reports");
            }
            for report in reports {
                println!(
                    "{}  {:<30} source={} created_at={}",
                    report.id, report.name, report.config.source_id, report.created_at
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("could not list reports: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_delete_report(id: String) -> ExitCode {
    let store = match open_store() {
        Ok(s) => s,
        Err(code) => return code,
    };

    match store.delete(&id) {
        Ok(true) => {
            println!("deleted {}", id);
            ExitCode::SUCCESS
        }
        // Already gone: not a hard failure for the operator.
        Ok(false) => {
            println!("no report with id {}", id);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("could not delete report: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_load(id: String, out: Option<PathBuf>) -> ExitCode {
    let store = match open_store() {
        Ok(s) => s,
        Err(code) => return code,
    };

    let report = match store.get(&id) {
        Ok(Some(r)) => r,
        Ok(None) => {
            eprintln!("no report with id {}", id);
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("could not load report: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let json = match export::config_to_json(&report.config) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match out {
        Some(out) => {
            if let Err(e) = fs::write(&out, json) {
                eprintln!("error: failed to write {}: {}", out.display(), e);
                return ExitCode::FAILURE;
            }
            println!("wrote {}", out.display());
            ExitCode::SUCCESS
        }
        None => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
    }
}

fn read_config(file: &PathBuf) -> Result<ReportConfig, ExitCode> {
    let json = fs::read_to_string(file).map_err(|e| {
        eprintln!("error: failed to read {}: {}", file.display(), e);
        ExitCode::FAILURE
    })?;

    export::config_from_json(&json).map_err(|e| {
        eprintln!("error: {}", e);
        ExitCode::FAILURE
    })
}

fn open_datastore(db: Option<PathBuf>) -> Result<SqliteDatastore, ExitCode> {
    let path = match db {
        Some(path) => path.display().to_string(),
        None => {
            let settings = Settings::load().map_err(|e| {
                eprintln!("error: {}", e);
                ExitCode::FAILURE
            })?;
            settings.resolved_database_path().map_err(|e| {
                eprintln!("error: {}", e);
                ExitCode::FAILURE
            })?
        }
    };

    SqliteDatastore::open(&path).map_err(|e| {
        eprintln!("error: failed to open database {}: {}", path, e);
        ExitCode::FAILURE
    })
}

fn open_store() -> Result<SavedReportStore, ExitCode> {
    SavedReportStore::open_default().map_err(|e| {
        eprintln!("could not open saved report store: {}", e);
        ExitCode::FAILURE
    })
}

fn render(result: &ReportResult, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Table => Ok(render_table(result)),
        OutputFormat::Csv => Ok(export::to_csv(result)),
        OutputFormat::Json => export::result_to_json(result).map_err(|e| e.to_string()),
    }
}

fn render_table(result: &ReportResult) -> String {
    let mut widths: Vec<usize> = result.columns.iter().map(|c| c.len()).collect();
    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| {
            result
                .columns
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    let text = match row.get(c) {
                        None | Some(serde_json::Value::Null) => String::new(),
                        Some(serde_json::Value::String(s)) => s.clone(),
                        Some(other) => other.to_string(),
                    };
                    widths[i] = widths[i].max(text.len());
                    text
                })
                .collect()
        })
        .collect();

    let mut lines = Vec::with_capacity(cells.len() + 1);
    lines.push(
        result
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{:<width$}", c, width = widths[i]))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in cells {
        lines.push(
            row.iter()
                .enumerate()
                .map(|(i, c)| format!("{:<width$}", c, width = widths[i]))
                .collect::<Vec<_>>()
                .join("  "),
        );
    }
    lines.join("\n")
}
