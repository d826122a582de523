//! Client-side grouping and aggregation of fetched rows.

use std::collections::HashMap;

use serde_json::Value;

use crate::model::Metric;

use super::datastore::Row;

/// Group bucket used when the group column is null or missing, so no row is
/// ever silently dropped from an aggregate.
pub const NULL_GROUP_LABEL: &str = "sin valor";

/// Partition `rows` by the value of `group_by` and reduce each partition with
/// `metric`. Returns the output columns and one row per distinct group, in
/// first-seen order.
pub(crate) fn aggregate(
    rows: &[Row],
    group_by: &str,
    metric: Metric,
    metric_column: Option<&str>,
) -> (Vec<String>, Vec<Row>) {
    let mut order: Vec<String> = Vec::new();
    let mut partitions: HashMap<String, Vec<&Row>> = HashMap::new();

    for row in rows {
        let key = group_key(row.get(group_by));
        if !partitions.contains_key(&key) {
            order.push(key.clone());
        }
        partitions.entry(key).or_default().push(row);
    }

    let label = metric.label(metric_column);
    let mut out = Vec::with_capacity(order.len());

    for key in order {
        let partition = &partitions[&key];
        let mut row = Row::new();
        row.insert(group_by.to_string(), Value::String(key));
        row.insert(label.clone(), reduce(metric, metric_column, partition));
        out.push(row);
    }

    (vec![group_by.to_string(), label], out)
}

fn group_key(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => NULL_GROUP_LABEL.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn reduce(metric: Metric, metric_column: Option<&str>, partition: &[&Row]) -> Value {
    // Non-numeric and missing cells are excluded, not zeroed: one bad value
    // must not distort avg/min/max.
    let values: Vec<f64> = partition
        .iter()
        .filter_map(|row| metric_column.and_then(|c| row.get(c)).and_then(numeric_value))
        .collect();

    match metric {
        Metric::Count => Value::from(partition.len()),
        Metric::Sum => number(values.iter().sum()),
        Metric::Avg => {
            if values.is_empty() {
                Value::Null
            } else {
                number(values.iter().sum::<f64>() / values.len() as f64)
            }
        }
        Metric::Min => values
            .iter()
            .copied()
            .fold(None, |acc: Option<f64>, v| {
                Some(acc.map_or(v, |a| a.min(v)))
            })
            .map_or(Value::Null, number),
        Metric::Max => values
            .iter()
            .copied()
            .fold(None, |acc: Option<f64>, v| {
                Some(acc.map_or(v, |a| a.max(v)))
            })
            .map_or(Value::Null, number),
    }
}

/// Numeric view of a cell: JSON numbers, or strings that parse cleanly.
fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Render an f64 as an integer JSON number when it is whole, so sums over
/// integer columns read naturally in exports.
fn number(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Value::from(v as i64)
    } else {
        serde_json::Number::from_f64(v)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}
