//! Report configuration model.
//!
//! A [`ReportConfig`] is the complete, serializable specification of one
//! report. It is built and mutated by the presentation layer and read-only
//! input to compilation and execution. Wire names are camelCase, matching the
//! JSON files the export/import round-trip produces.

mod validate;

pub use validate::{validate, ConfigError};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::ColumnType;

/// Filter predicate operator.
///
/// Closed set: adding an operator is a compile-time-checked extension of the
/// compatibility table and the compiler, not a stringly-typed branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
    Between,
    In,
}

impl FilterOperator {
    /// Whether this operator is legal for a column of the given type.
    pub fn supports(self, ty: ColumnType) -> bool {
        match self {
            FilterOperator::Equals | FilterOperator::NotEquals | FilterOperator::In => true,
            FilterOperator::Contains => matches!(ty, ColumnType::String | ColumnType::Enum),
            FilterOperator::GreaterThan | FilterOperator::LessThan | FilterOperator::Between => {
                matches!(ty, ColumnType::Number | ColumnType::Date)
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FilterOperator::Equals => "equals",
            FilterOperator::NotEquals => "not_equals",
            FilterOperator::Contains => "contains",
            FilterOperator::GreaterThan => "greater_than",
            FilterOperator::LessThan => "less_than",
            FilterOperator::Between => "between",
            FilterOperator::In => "in",
        }
    }
}

/// A single report filter: column, operator, comparison value.
///
/// `between` carries a two-element array, `in` a non-empty array; every other
/// operator carries one scalar. Validation enforces the shapes before
/// compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportFilter {
    pub column: String,
    pub operator: FilterOperator,
    pub value: Value,
}

/// Aggregation applied to each group when `group_by` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl Metric {
    /// All metrics except `count` aggregate over a numeric column.
    pub fn requires_column(self) -> bool {
        !matches!(self, Metric::Count)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Count => "count",
            Metric::Sum => "sum",
            Metric::Avg => "avg",
            Metric::Min => "min",
            Metric::Max => "max",
        }
    }

    /// Output column name for the aggregated value, e.g. `sum_total`.
    pub fn label(self, metric_column: Option<&str>) -> String {
        match (self, metric_column) {
            (Metric::Count, _) => "count".to_string(),
            (metric, Some(column)) => format!("{}_{}", metric.as_str(), column),
            (metric, None) => metric.as_str().to_string(),
        }
    }
}

pub const MIN_LIMIT: u32 = 1;
pub const MAX_LIMIT: u32 = 1000;
pub const DEFAULT_LIMIT: u32 = 100;

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

/// The complete, serializable specification of a report.
///
/// Never mutated by the engine itself; all execution state derives from it
/// per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportConfig {
    pub source_id: String,
    /// Columns to show. Empty means every column of the source.
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub filters: Vec<ReportFilter>,
    #[serde(default)]
    pub group_by: Option<String>,
    #[serde(default)]
    pub metric: Option<Metric>,
    #[serde(default)]
    pub metric_column: Option<String>,
    /// Inclusive start of the date range, `YYYY-MM-DD`.
    pub date_from: String,
    /// Inclusive end of the date range, `YYYY-MM-DD`.
    pub date_to: String,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl ReportConfig {
    /// A fresh configuration with the UI defaults: no columns (all), no
    /// filters, no grouping, limit 100.
    pub fn new(source_id: &str, date_from: &str, date_to: &str) -> Self {
        Self {
            source_id: source_id.to_string(),
            columns: Vec::new(),
            filters: Vec::new(),
            group_by: None,
            metric: None,
            metric_column: None,
            date_from: date_from.to_string(),
            date_to: date_to.to_string(),
            limit: DEFAULT_LIMIT,
        }
    }

    /// Row limit clamped into the supported `[1, 1000]` range.
    pub fn clamped_limit(&self) -> u32 {
        self.limit.clamp(MIN_LIMIT, MAX_LIMIT)
    }
}
