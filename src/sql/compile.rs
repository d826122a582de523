//! Compiler from report configuration to compiled query.

use serde_json::Value;

use crate::catalog::{self, ColumnType, SourceDefinition, TENANT_COLUMN};
use crate::model::{ConfigError, FilterOperator, ReportConfig, ReportFilter};

use super::predicate::{Literal, Predicate};
use super::query::CompiledQuery;

/// Compile a configuration into a query scoped to `organization_id`.
///
/// The tenant predicate is applied first and cannot be produced, replaced,
/// or removed by user-supplied filters. Assumes the configuration has passed
/// [`validate`]; shape problems that would make compilation ambiguous are
/// still rejected here.
///
/// [`validate`]: crate::model::validate
pub fn compile(organization_id: &str, config: &ReportConfig) -> Result<CompiledQuery, ConfigError> {
    if config.source_id.is_empty() {
        return Err(ConfigError::MissingSource);
    }
    let source = catalog::get_source(&config.source_id)
        .ok_or_else(|| ConfigError::UnknownSource(config.source_id.clone()))?;

    let mut predicates = vec![Predicate::Eq {
        column: TENANT_COLUMN.to_string(),
        value: Literal::String(organization_id.to_string()),
    }];

    if let Some(date_column) = date_column(source, config) {
        predicates.push(Predicate::Between {
            column: date_column,
            low: Literal::String(format!("{}T00:00:00", config.date_from)),
            high: Literal::String(format!("{}T23:59:59", config.date_to)),
        });
    }

    for (index, filter) in config.filters.iter().enumerate() {
        predicates.push(compile_filter(index, filter)?);
    }

    let select = projection(source, config)?;

    Ok(CompiledQuery {
        table: source.table.to_string(),
        select,
        predicates,
        limit: config.clamped_limit(),
    })
}

/// Column the date range applies to: the source's configured date column,
/// or the first date column an explicit filter references when the source
/// has none. No candidate means no date predicate.
fn date_column(source: &SourceDefinition, config: &ReportConfig) -> Option<String> {
    if let Some(column) = source.default_date_column {
        return Some(column.to_string());
    }
    config
        .filters
        .iter()
        .find(|f| {
            source
                .column(&f.column)
                .is_some_and(|c| c.ty == ColumnType::Date)
        })
        .map(|f| f.column.clone())
}

fn compile_filter(index: usize, filter: &ReportFilter) -> Result<Predicate, ConfigError> {
    let column = filter.column.clone();

    let predicate = match filter.operator {
        FilterOperator::Equals => Predicate::Eq {
            column,
            value: Literal::from_json(&filter.value),
        },
        FilterOperator::NotEquals => Predicate::Ne {
            column,
            value: Literal::from_json(&filter.value),
        },
        FilterOperator::Contains => Predicate::ContainsCi {
            column,
            pattern: scalar_text(&filter.value),
        },
        FilterOperator::GreaterThan => Predicate::Gt {
            column,
            value: Literal::from_json(&filter.value),
        },
        FilterOperator::LessThan => Predicate::Lt {
            column,
            value: Literal::from_json(&filter.value),
        },
        FilterOperator::Between => {
            let pair = filter
                .value
                .as_array()
                .filter(|p| p.len() == 2)
                .ok_or_else(|| ConfigError::InvalidFilter {
                    index,
                    reason: "'between' requires an array of two values".to_string(),
                })?;
            Predicate::Between {
                column,
                low: Literal::from_json(&pair[0]),
                high: Literal::from_json(&pair[1]),
            }
        }
        FilterOperator::In => {
            let values = filter
                .value
                .as_array()
                .ok_or_else(|| ConfigError::InvalidFilter {
                    index,
                    reason: "'in' requires an array of values".to_string(),
                })?;
            Predicate::In {
                column,
                values: values.iter().map(Literal::from_json).collect(),
            }
        }
    };

    Ok(predicate)
}

/// Textual form of a scalar filter value, for substring matching.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Columns to project: the configured columns (or every source column when
/// none are chosen), plus `group_by` and `metric_column` when set, since the
/// engine needs them post-fetch.
fn projection(source: &SourceDefinition, config: &ReportConfig) -> Result<Vec<String>, ConfigError> {
    let mut select = if config.columns.is_empty() {
        source.column_keys()
    } else {
        config.columns.clone()
    };

    if let Some(group_by) = &config.group_by {
        if !source.has_column(group_by) {
            return Err(ConfigError::UnknownGroupColumn(group_by.clone()));
        }
        if !select.contains(group_by) {
            select.push(group_by.clone());
        }
    }

    if let Some(metric_column) = &config.metric_column {
        if !source.has_column(metric_column) {
            return Err(ConfigError::UnknownMetricColumn(metric_column.clone()));
        }
        if !select.contains(metric_column) {
            select.push(metric_column.clone());
        }
    }

    Ok(select)
}
