//! Execution engine - validate, compile, fetch, aggregate.
//!
//! The engine is stateless per call: everything it needs arrives in the
//! configuration or is fetched fresh. Validation and compilation happen
//! before any I/O, so a bad configuration never costs a network request.

mod aggregate;
mod datastore;
mod sequence;

pub use aggregate::NULL_GROUP_LABEL;
pub use datastore::{Datastore, DatastoreError, DatastoreResult, Row, SqliteDatastore};
pub use sequence::{RunSequence, RunTicket};

use std::sync::Arc;

use serde::Serialize;

use crate::catalog;
use crate::model::{self, ConfigError, Metric, ReportConfig};
use crate::sql;

/// Errors surfaced by the execution engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration problems, found before any I/O.
    #[error("invalid report configuration: {}", format_errors(.0))]
    Configuration(Vec<ConfigError>),

    /// The fetch failed. The message is surfaced to the operator verbatim.
    #[error("query failed: {0}")]
    Execution(#[from] DatastoreError),
}

impl From<ConfigError> for EngineError {
    fn from(error: ConfigError) -> Self {
        EngineError::Configuration(vec![error])
    }
}

fn format_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result of one report execution. Created fresh per run, never persisted
/// unless exported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportResult {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    /// Rows actually returned, bounded by the configured limit. Not a
    /// full-dataset count: the presentation layer shows it as
    /// "showing N of possibly more".
    pub total: usize,
}

/// The report execution engine.
pub struct Engine {
    datastore: Arc<dyn Datastore>,
}

impl Engine {
    pub fn new(datastore: Arc<dyn Datastore>) -> Self {
        Self { datastore }
    }

    /// Execute a report for one organization.
    ///
    /// Pipeline: validate → compile → single fetch → optional client-side
    /// group/aggregate. No retry: a failed fetch surfaces immediately.
    pub async fn execute(
        &self,
        organization_id: &str,
        config: &ReportConfig,
    ) -> Result<ReportResult, EngineError> {
        if config.source_id.is_empty() {
            return Err(ConfigError::MissingSource.into());
        }
        let source = catalog::get_source(&config.source_id)
            .ok_or_else(|| ConfigError::UnknownSource(config.source_id.clone()))?;

        model::validate(source, config).map_err(EngineError::Configuration)?;

        let query = sql::compile(organization_id, config)?;
        let fetched = self.datastore.fetch(&query).await?;

        let result = match &config.group_by {
            Some(group_by) => {
                // Grouping without an explicit metric counts rows.
                let metric = config.metric.unwrap_or(Metric::Count);
                let (columns, rows) =
                    aggregate::aggregate(&fetched, group_by, metric, config.metric_column.as_deref());
                ReportResult {
                    total: rows.len(),
                    columns,
                    rows,
                }
            }
            None => passthrough(source, config, fetched),
        };

        Ok(result)
    }
}

/// No grouping: rows pass through restricted to the configured columns.
fn passthrough(
    source: &catalog::SourceDefinition,
    config: &ReportConfig,
    fetched: Vec<Row>,
) -> ReportResult {
    let columns = if config.columns.is_empty() {
        source.column_keys()
    } else {
        config.columns.clone()
    };

    let rows: Vec<Row> = fetched
        .into_iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| {
                    let value = row.get(c).cloned().unwrap_or(serde_json::Value::Null);
                    (c.clone(), value)
                })
                .collect()
        })
        .collect();

    ReportResult {
        total: rows.len(),
        columns,
        rows,
    }
}
