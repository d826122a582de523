use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use informe::engine::{
    Datastore, DatastoreError, Engine, EngineError, Row, SqliteDatastore, NULL_GROUP_LABEL,
};
use informe::model::{FilterOperator, Metric, ReportConfig, ReportFilter};
use informe::sql::CompiledQuery;

/// Fixture: two organizations, five January sales for org-1 split across two
/// branches, plus rows outside the date window and a row with a null branch.
fn fixture_datastore() -> SqliteDatastore {
    let datastore = SqliteDatastore::open_in_memory().unwrap();
    datastore
        .execute_batch(
            "
            CREATE TABLE sales (
                organization_id TEXT NOT NULL,
                date TEXT NOT NULL,
                total REAL,
                branch_id TEXT,
                customer_name TEXT,
                payment_method TEXT,
                status TEXT
            );

            INSERT INTO sales VALUES
                ('org-1', '2024-01-01T00:00:00', 10, 'b-1', 'Ana',   'cash', 'pagado'),
                ('org-1', '2024-01-10T12:30:00', 20, 'b-1', 'Luis',  'card', 'pagado'),
                ('org-1', '2024-01-15T09:00:00', 30, 'b-1', 'Marta', 'cash', 'pagado'),
                ('org-1', '2024-01-20T18:45:00', 40, 'b-2', 'Pedro', 'card', 'pagado'),
                ('org-1', '2024-01-31T23:59:59', 50, 'b-2', 'Sofía', 'cash', 'anulado'),
                ('org-1', '2024-02-01T00:00:00', 99, 'b-1', 'Tarde', 'cash', 'pagado'),
                ('org-1', '2023-12-31T23:59:59', 88, 'b-2', 'Antes', 'card', 'pagado'),
                ('org-2', '2024-01-05T10:00:00', 77, 'b-9', 'Otro',  'cash', 'pagado');
            ",
        )
        .unwrap();
    datastore
}

fn engine() -> Engine {
    Engine::new(Arc::new(fixture_datastore()))
}

fn config() -> ReportConfig {
    ReportConfig::new("sales", "2024-01-01", "2024-01-31")
}

/// Datastore that counts fetches; used to prove validation happens first.
struct CountingDatastore {
    calls: AtomicUsize,
}

#[async_trait]
impl Datastore for CountingDatastore {
    async fn fetch(&self, _query: &CompiledQuery) -> Result<Vec<Row>, DatastoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }
}

/// Datastore whose fetch always fails.
struct FailingDatastore;

#[async_trait]
impl Datastore for FailingDatastore {
    async fn fetch(&self, _query: &CompiledQuery) -> Result<Vec<Row>, DatastoreError> {
        Err(DatastoreError::Backend("connection reset".to_string()))
    }
}

#[tokio::test]
async fn test_simple_report_returns_all_columns_in_window() {
    let result = engine().execute("org-1", &config()).await.unwrap();

    assert_eq!(
        result.columns,
        vec!["date", "total", "branch_id", "customer_name", "payment_method", "status"]
    );
    // Only the five org-1 January rows; window edges are inclusive.
    assert_eq!(result.total, 5);
    for row in &result.rows {
        let date = row["date"].as_str().unwrap();
        assert!(date >= "2024-01-01T00:00:00" && date <= "2024-01-31T23:59:59");
    }
}

#[tokio::test]
async fn test_tenant_isolation() {
    let result = engine().execute("org-1", &config()).await.unwrap();
    for row in &result.rows {
        assert_ne!(row["customer_name"], json!("Otro"));
    }

    let other = engine().execute("org-2", &config()).await.unwrap();
    assert_eq!(other.total, 1);
    assert_eq!(other.rows[0]["customer_name"], json!("Otro"));

    // An organization with no data sees nothing, not someone else's rows.
    let empty = engine().execute("org-3", &config()).await.unwrap();
    assert_eq!(empty.total, 0);
}

#[tokio::test]
async fn test_limit_bounds_returned_rows() {
    let mut c = config();
    c.limit = 2;

    let result = engine().execute("org-1", &c).await.unwrap();
    assert_eq!(result.rows.len(), 2);
    assert_eq!(result.total, 2);
}

#[tokio::test]
async fn test_out_of_range_limit_is_clamped_not_rejected() {
    let mut c = config();
    c.limit = 1_000_000;
    let result = engine().execute("org-1", &c).await.unwrap();
    assert!(result.rows.len() <= 1000);
}

#[tokio::test]
async fn test_grouped_sum_per_branch() {
    let mut c = config();
    c.group_by = Some("branch_id".to_string());
    c.metric = Some(Metric::Sum);
    c.metric_column = Some("total".to_string());

    let result = engine().execute("org-1", &c).await.unwrap();

    assert_eq!(result.columns, vec!["branch_id", "sum_total"]);
    assert_eq!(result.rows.len(), 2);

    let sum_for = |branch: &str| {
        result
            .rows
            .iter()
            .find(|r| r["branch_id"] == json!(branch))
            .map(|r| r["sum_total"].clone())
            .unwrap()
    };
    assert_eq!(sum_for("b-1"), json!(60));
    assert_eq!(sum_for("b-2"), json!(90));
}

#[tokio::test]
async fn test_group_by_completeness_with_null_bucket() {
    let datastore = fixture_datastore();
    datastore
        .execute_batch(
            "INSERT INTO sales VALUES
                ('org-1', '2024-01-12T08:00:00', 5, NULL, 'Nadie', 'cash', 'pagado');",
        )
        .unwrap();
    let engine = Engine::new(Arc::new(datastore));

    let mut c = config();
    c.group_by = Some("branch_id".to_string());
    c.metric = Some(Metric::Count);

    let result = engine.execute("org-1", &c).await.unwrap();

    let total_counted: u64 = result
        .rows
        .iter()
        .map(|r| r["count"].as_u64().unwrap())
        .sum();
    assert_eq!(total_counted, 6);
    assert!(result
        .rows
        .iter()
        .any(|r| r["branch_id"] == json!(NULL_GROUP_LABEL)));
}

#[tokio::test]
async fn test_group_without_metric_counts_rows() {
    let mut c = config();
    c.group_by = Some("branch_id".to_string());

    let result = engine().execute("org-1", &c).await.unwrap();
    assert_eq!(result.columns, vec!["branch_id", "count"]);
    let total: u64 = result
        .rows
        .iter()
        .map(|r| r["count"].as_u64().unwrap())
        .sum();
    assert_eq!(total, 5);
}

#[tokio::test]
async fn test_passthrough_restricts_to_selected_columns() {
    let mut c = config();
    c.columns = vec!["customer_name".to_string(), "total".to_string()];

    let result = engine().execute("org-1", &c).await.unwrap();
    assert_eq!(result.columns, vec!["customer_name", "total"]);
    for row in &result.rows {
        assert_eq!(row.len(), 2);
        assert!(row.contains_key("customer_name"));
        assert!(row.contains_key("total"));
    }
}

#[tokio::test]
async fn test_filters_narrow_results() {
    let mut c = config();
    c.filters.push(ReportFilter {
        column: "status".to_string(),
        operator: FilterOperator::Equals,
        value: json!("pagado"),
    });
    c.filters.push(ReportFilter {
        column: "total".to_string(),
        operator: FilterOperator::GreaterThan,
        value: json!(15),
    });

    let result = engine().execute("org-1", &c).await.unwrap();
    assert_eq!(result.total, 3);
}

#[tokio::test]
async fn test_contains_filter_is_case_insensitive() {
    let mut c = config();
    c.filters.push(ReportFilter {
        column: "customer_name".to_string(),
        operator: FilterOperator::Contains,
        value: json!("ANA"),
    });

    let result = engine().execute("org-1", &c).await.unwrap();
    assert_eq!(result.total, 1);
    assert_eq!(result.rows[0]["customer_name"], json!("Ana"));
}

#[tokio::test]
async fn test_invalid_filter_never_reaches_datastore() {
    let counting = Arc::new(CountingDatastore {
        calls: AtomicUsize::new(0),
    });
    let engine = Engine::new(counting.clone());

    let mut c = config();
    c.filters.push(ReportFilter {
        column: "ghost".to_string(),
        operator: FilterOperator::Equals,
        value: json!("x"),
    });

    let error = engine.execute("org-1", &c).await.unwrap_err();
    assert!(matches!(error, EngineError::Configuration(_)));
    assert_eq!(counting.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_invalid_metric_config_rejected_before_execution() {
    let counting = Arc::new(CountingDatastore {
        calls: AtomicUsize::new(0),
    });
    let engine = Engine::new(counting.clone());

    let mut c = config();
    c.group_by = Some("branch_id".to_string());
    c.metric = Some(Metric::Sum);
    c.metric_column = None;

    let error = engine.execute("org-1", &c).await.unwrap_err();
    match error {
        EngineError::Configuration(errors) => assert!(!errors.is_empty()),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(counting.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_source_rejected_before_execution() {
    let counting = Arc::new(CountingDatastore {
        calls: AtomicUsize::new(0),
    });
    let engine = Engine::new(counting.clone());

    let mut c = config();
    c.source_id = "no_such_source".to_string();

    assert!(engine.execute("org-1", &c).await.is_err());
    assert_eq!(counting.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_fetch_failure_surfaces_backend_message() {
    let engine = Engine::new(Arc::new(FailingDatastore));

    let error = engine.execute("org-1", &config()).await.unwrap_err();
    match error {
        EngineError::Execution(source) => {
            assert!(source.to_string().contains("connection reset"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
