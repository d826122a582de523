use serde_json::json;

use informe::catalog::ColumnType;
use informe::model::{FilterOperator, Metric, ReportConfig, DEFAULT_LIMIT, MAX_LIMIT, MIN_LIMIT};

#[test]
fn test_new_config_defaults() {
    let config = ReportConfig::new("sales", "2024-01-01", "2024-01-31");
    assert!(config.columns.is_empty());
    assert!(config.filters.is_empty());
    assert!(config.group_by.is_none());
    assert!(config.metric.is_none());
    assert_eq!(config.limit, DEFAULT_LIMIT);
}

#[test]
fn test_limit_clamped_into_range() {
    let mut config = ReportConfig::new("sales", "2024-01-01", "2024-01-31");

    config.limit = 0;
    assert_eq!(config.clamped_limit(), MIN_LIMIT);

    config.limit = 5000;
    assert_eq!(config.clamped_limit(), MAX_LIMIT);

    config.limit = 250;
    assert_eq!(config.clamped_limit(), 250);
}

#[test]
fn test_operator_compatibility_table() {
    use ColumnType::*;
    use FilterOperator::*;

    for ty in [String, Number, Date, Boolean, Enum] {
        assert!(Equals.supports(ty));
        assert!(NotEquals.supports(ty));
        assert!(In.supports(ty));
    }

    assert!(Contains.supports(String));
    assert!(Contains.supports(Enum));
    assert!(!Contains.supports(Number));
    assert!(!Contains.supports(Date));
    assert!(!Contains.supports(Boolean));

    for op in [GreaterThan, LessThan, Between] {
        assert!(op.supports(Number));
        assert!(op.supports(Date));
        assert!(!op.supports(String));
        assert!(!op.supports(Boolean));
        assert!(!op.supports(Enum));
    }
}

#[test]
fn test_operator_wire_names_are_snake_case() {
    assert_eq!(
        serde_json::to_value(FilterOperator::GreaterThan).unwrap(),
        json!("greater_than")
    );
    assert_eq!(
        serde_json::to_value(FilterOperator::NotEquals).unwrap(),
        json!("not_equals")
    );
    let op: FilterOperator = serde_json::from_value(json!("between")).unwrap();
    assert_eq!(op, FilterOperator::Between);
}

#[test]
fn test_config_wire_names_are_camel_case() {
    let config = ReportConfig::new("sales", "2024-01-01", "2024-01-31");
    let value = serde_json::to_value(&config).unwrap();

    assert_eq!(value["sourceId"], json!("sales"));
    assert_eq!(value["dateFrom"], json!("2024-01-01"));
    assert_eq!(value["groupBy"], serde_json::Value::Null);
    assert!(value.get("source_id").is_none());
}

#[test]
fn test_metric_labels() {
    assert_eq!(Metric::Count.label(Some("total")), "count");
    assert_eq!(Metric::Sum.label(Some("total")), "sum_total");
    assert_eq!(Metric::Avg.label(Some("minutes")), "avg_minutes");
}

#[test]
fn test_metric_column_requirements() {
    assert!(!Metric::Count.requires_column());
    for metric in [Metric::Sum, Metric::Avg, Metric::Min, Metric::Max] {
        assert!(metric.requires_column());
    }
}
