//! Single validation entry point for report configurations.
//!
//! Every problem is collected before failing so the operator sees the full
//! list at once. Validation runs before compilation and before any I/O:
//! an invalid configuration never reaches the datastore.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::catalog::SourceDefinition;
use crate::model::{FilterOperator, Metric, ReportConfig, ReportFilter};

/// A problem found in a report configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("no source selected")]
    MissingSource,

    #[error("unknown source '{0}'")]
    UnknownSource(String),

    #[error("column '{0}' does not exist in the source")]
    UnknownColumn(String),

    #[error("filter {index}: {reason}")]
    InvalidFilter { index: usize, reason: String },

    #[error("group column '{0}' does not exist in the source")]
    UnknownGroupColumn(String),

    #[error("metric column '{0}' does not exist in the source")]
    UnknownMetricColumn(String),

    #[error("metric '{0}' requires a metric column")]
    MissingMetricColumn(&'static str),

    #[error("metric column '{0}' is not numeric")]
    NonNumericMetricColumn(String),

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern is well-formed")
});

/// Validate a configuration against its source definition.
///
/// Returns every problem found. `Ok(())` means the configuration is safe to
/// compile.
pub fn validate(source: &SourceDefinition, config: &ReportConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    validate_dates(config, &mut errors);
    validate_columns(source, config, &mut errors);

    for (index, filter) in config.filters.iter().enumerate() {
        validate_filter(source, index, filter, &mut errors);
    }

    validate_grouping(source, config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_dates(config: &ReportConfig, errors: &mut Vec<ConfigError>) {
    for date in [&config.date_from, &config.date_to] {
        if !DATE_RE.is_match(date) {
            errors.push(ConfigError::InvalidDate(date.clone()));
        }
    }
}

fn validate_columns(
    source: &SourceDefinition,
    config: &ReportConfig,
    errors: &mut Vec<ConfigError>,
) {
    for column in &config.columns {
        if !source.has_column(column) {
            errors.push(ConfigError::UnknownColumn(column.clone()));
        }
    }
}

fn validate_filter(
    source: &SourceDefinition,
    index: usize,
    filter: &ReportFilter,
    errors: &mut Vec<ConfigError>,
) {
    let Some(column) = source.column(&filter.column) else {
        errors.push(ConfigError::InvalidFilter {
            index,
            reason: format!("column '{}' does not exist in the source", filter.column),
        });
        return;
    };

    if !filter.operator.supports(column.ty) {
        errors.push(ConfigError::InvalidFilter {
            index,
            reason: format!(
                "operator '{}' cannot be applied to {} column '{}'",
                filter.operator.as_str(),
                type_name(column.ty),
                column.key
            ),
        });
        return;
    }

    if let Some(reason) = value_shape_problem(filter.operator, &filter.value) {
        errors.push(ConfigError::InvalidFilter { index, reason });
    }
}

/// Shape check for the filter value. `None` means the value is usable.
fn value_shape_problem(operator: FilterOperator, value: &Value) -> Option<String> {
    match operator {
        FilterOperator::Between => match value.as_array() {
            Some(pair) if pair.len() == 2 && pair.iter().all(|v| !is_empty_scalar(v)) => None,
            Some(pair) => Some(format!(
                "'between' requires exactly two values, got {}",
                pair.len()
            )),
            None => Some("'between' requires an array of two values".to_string()),
        },
        FilterOperator::In => match value.as_array() {
            Some(values) if !values.is_empty() => None,
            Some(_) => Some("'in' requires at least one value".to_string()),
            None => Some("'in' requires an array of values".to_string()),
        },
        _ => {
            if is_empty_scalar(value) {
                Some("filter value must not be empty".to_string())
            } else {
                None
            }
        }
    }
}

fn is_empty_scalar(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
        _ => false,
    }
}

fn validate_grouping(
    source: &SourceDefinition,
    config: &ReportConfig,
    errors: &mut Vec<ConfigError>,
) {
    if let Some(group_by) = &config.group_by {
        if !source.has_column(group_by) {
            errors.push(ConfigError::UnknownGroupColumn(group_by.clone()));
        }
    }

    let Some(metric) = config.metric else {
        return;
    };

    match (&config.metric_column, metric.requires_column()) {
        (None, true) => errors.push(ConfigError::MissingMetricColumn(metric.as_str())),
        (Some(column), _) => match source.column(column) {
            None => errors.push(ConfigError::UnknownMetricColumn(column.clone())),
            Some(def) if !def.ty.is_numeric() && metric.requires_column() => {
                errors.push(ConfigError::NonNumericMetricColumn(column.clone()))
            }
            Some(_) => {}
        },
        (None, false) => {}
    }
}

fn type_name(ty: crate::catalog::ColumnType) -> &'static str {
    match ty {
        crate::catalog::ColumnType::String => "string",
        crate::catalog::ColumnType::Number => "number",
        crate::catalog::ColumnType::Date => "date",
        crate::catalog::ColumnType::Boolean => "boolean",
        crate::catalog::ColumnType::Enum => "enum",
    }
}
