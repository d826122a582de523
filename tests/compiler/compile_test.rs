use serde_json::json;

use informe::catalog::TENANT_COLUMN;
use informe::model::{ConfigError, FilterOperator, Metric, ReportConfig, ReportFilter};
use informe::sql::{compile, Literal, Predicate};

fn config() -> ReportConfig {
    ReportConfig::new("sales", "2024-01-01", "2024-01-31")
}

fn filter(column: &str, operator: FilterOperator, value: serde_json::Value) -> ReportFilter {
    ReportFilter {
        column: column.to_string(),
        operator,
        value,
    }
}

#[test]
fn test_tenant_scope_is_always_first_predicate() {
    let query = compile("org-1", &config()).unwrap();

    assert_eq!(
        query.predicates[0],
        Predicate::Eq {
            column: TENANT_COLUMN.to_string(),
            value: Literal::String("org-1".to_string()),
        }
    );
}

#[test]
fn test_user_filters_cannot_displace_tenant_scope() {
    let mut c = config();
    c.filters.push(filter("branch_id", FilterOperator::Equals, json!("b-9")));
    c.filters.push(filter("total", FilterOperator::GreaterThan, json!(0)));

    let query = compile("org-1", &c).unwrap();

    let tenant_predicates: Vec<_> = query
        .predicates
        .iter()
        .filter(|p| p.column() == TENANT_COLUMN)
        .collect();
    assert_eq!(tenant_predicates.len(), 1);
    assert_eq!(query.predicates[0].column(), TENANT_COLUMN);
}

#[test]
fn test_date_range_covers_whole_days() {
    let query = compile("org-1", &config()).unwrap();

    assert!(query.predicates.contains(&Predicate::Between {
        column: "date".to_string(),
        low: Literal::String("2024-01-01T00:00:00".to_string()),
        high: Literal::String("2024-01-31T23:59:59".to_string()),
    }));
}

#[test]
fn test_empty_columns_selects_all_source_columns() {
    let query = compile("org-1", &config()).unwrap();
    assert_eq!(
        query.select,
        vec!["date", "total", "branch_id", "customer_name", "payment_method", "status"]
    );
}

#[test]
fn test_group_and_metric_columns_appended_to_projection() {
    let mut c = config();
    c.columns = vec!["date".to_string()];
    c.group_by = Some("branch_id".to_string());
    c.metric = Some(Metric::Sum);
    c.metric_column = Some("total".to_string());

    let query = compile("org-1", &c).unwrap();
    assert_eq!(query.select, vec!["date", "branch_id", "total"]);
}

#[test]
fn test_projection_does_not_duplicate_selected_columns() {
    let mut c = config();
    c.columns = vec!["branch_id".to_string(), "total".to_string()];
    c.group_by = Some("branch_id".to_string());
    c.metric_column = Some("total".to_string());

    let query = compile("org-1", &c).unwrap();
    assert_eq!(query.select, vec!["branch_id", "total"]);
}

#[test]
fn test_limit_clamped() {
    let mut c = config();
    c.limit = 100_000;
    assert_eq!(compile("org-1", &c).unwrap().limit, 1000);

    c.limit = 0;
    assert_eq!(compile("org-1", &c).unwrap().limit, 1);
}

#[test]
fn test_missing_source_rejected() {
    let mut c = config();
    c.source_id = String::new();
    assert!(matches!(
        compile("org-1", &c),
        Err(ConfigError::MissingSource)
    ));
}

#[test]
fn test_unknown_source_rejected() {
    let mut c = config();
    c.source_id = "payroll_runs".to_string();
    assert!(matches!(
        compile("org-1", &c),
        Err(ConfigError::UnknownSource(_))
    ));
}

#[test]
fn test_unknown_group_column_rejected() {
    let mut c = config();
    c.group_by = Some("ghost".to_string());
    assert!(matches!(
        compile("org-1", &c),
        Err(ConfigError::UnknownGroupColumn(_))
    ));
}

#[test]
fn test_unknown_metric_column_rejected() {
    let mut c = config();
    c.metric_column = Some("ghost".to_string());
    assert!(matches!(
        compile("org-1", &c),
        Err(ConfigError::UnknownMetricColumn(_))
    ));
}

#[test]
fn test_filter_translation_preserves_operator_semantics() {
    let mut c = config();
    c.filters.push(filter("status", FilterOperator::Equals, json!("pagado")));
    c.filters.push(filter("status", FilterOperator::NotEquals, json!("anulado")));
    c.filters.push(filter(
        "customer_name",
        FilterOperator::Contains,
        json!("ana"),
    ));
    c.filters.push(filter("total", FilterOperator::GreaterThan, json!(100)));
    c.filters.push(filter("total", FilterOperator::LessThan, json!(500)));
    c.filters.push(filter(
        "total",
        FilterOperator::Between,
        json!([100, 500]),
    ));
    c.filters.push(filter(
        "branch_id",
        FilterOperator::In,
        json!(["b-1", "b-2"]),
    ));

    let query = compile("org-1", &c).unwrap();
    // Tenant scope + date range + the seven user filters.
    assert_eq!(query.predicates.len(), 9);

    assert!(query.predicates.contains(&Predicate::ContainsCi {
        column: "customer_name".to_string(),
        pattern: "ana".to_string(),
    }));
    assert!(query.predicates.contains(&Predicate::Between {
        column: "total".to_string(),
        low: Literal::Int(100),
        high: Literal::Int(500),
    }));
    assert!(query.predicates.contains(&Predicate::In {
        column: "branch_id".to_string(),
        values: vec![
            Literal::String("b-1".to_string()),
            Literal::String("b-2".to_string()),
        ],
    }));
}

#[test]
fn test_malformed_between_value_rejected_at_compile() {
    let mut c = config();
    c.filters
        .push(filter("total", FilterOperator::Between, json!([100])));
    assert!(matches!(
        compile("org-1", &c),
        Err(ConfigError::InvalidFilter { index: 0, .. })
    ));
}
