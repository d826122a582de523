use serde_json::json;

use informe::model::{FilterOperator, ReportConfig, ReportFilter};
use informe::sql::{compile, CompiledQuery, Literal, Predicate};

#[test]
fn test_full_statement_render() {
    let query = CompiledQuery {
        table: "sales".to_string(),
        select: vec!["date".to_string(), "total".to_string()],
        predicates: vec![
            Predicate::Eq {
                column: "organization_id".to_string(),
                value: Literal::String("org-1".to_string()),
            },
            Predicate::Between {
                column: "date".to_string(),
                low: Literal::String("2024-01-01T00:00:00".to_string()),
                high: Literal::String("2024-01-31T23:59:59".to_string()),
            },
        ],
        limit: 100,
    };

    assert_eq!(
        query.to_sql(),
        "SELECT \"date\", \"total\" FROM \"sales\" \
         WHERE \"organization_id\" = 'org-1' \
         AND \"date\" BETWEEN '2024-01-01T00:00:00' AND '2024-01-31T23:59:59' \
         LIMIT 100"
    );
}

#[test]
fn test_compiled_config_renders_executable_sql() {
    let mut config = ReportConfig::new("sales", "2024-01-01", "2024-01-31");
    config.filters.push(ReportFilter {
        column: "customer_name".to_string(),
        operator: FilterOperator::Contains,
        value: json!("O'Brien"),
    });

    let sql = compile("org-1", &config).unwrap().to_sql();

    // Substring matching is case-insensitive and the quote is escaped.
    assert!(sql.contains("LOWER(\"customer_name\") LIKE '%o''brien%' ESCAPE '\\'"));
    assert!(sql.contains("\"organization_id\" = 'org-1'"));
    assert!(sql.ends_with("LIMIT 100"));
}

#[test]
fn test_tenant_literal_with_quote_cannot_break_out() {
    let query = compile("org'; DROP TABLE sales; --", &ReportConfig::new(
        "sales",
        "2024-01-01",
        "2024-01-31",
    ))
    .unwrap();

    let sql = query.to_sql();
    assert!(sql.contains("'org''; DROP TABLE sales; --'"));
}
