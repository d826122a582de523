//! # Informe
//!
//! An ad-hoc report builder: operators describe a report as data (source,
//! columns, filters, date range, optional grouping and metric, limit) and the
//! engine turns that description into a tenant-scoped query, executes it, and
//! aggregates the result.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │              ReportConfig (serializable)                 │
//! │   source + columns + filters + dates + group + metric    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [model::validate]
//! ┌─────────────────────────────────────────────────────────┐
//! │           Validated config (all errors collected)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [sql::compile]
//! ┌─────────────────────────────────────────────────────────┐
//! │     CompiledQuery (tenant scope + predicates + limit)    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [engine]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Datastore fetch → group/aggregate → ReportResult       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The source catalog is static: every reportable collection is registered at
//! compile time with its typed columns. Saved configurations live in a local
//! SQLite store; results export to CSV/JSON.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod export;
pub mod model;
pub mod sql;
pub mod store;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::catalog::{get_source, sources, ColumnDef, ColumnType, SourceDefinition};
    pub use crate::engine::{
        Datastore, DatastoreError, Engine, EngineError, ReportResult, Row, RunSequence, RunTicket,
        SqliteDatastore,
    };
    pub use crate::model::{
        validate, ConfigError, FilterOperator, Metric, ReportConfig, ReportFilter,
    };
    pub use crate::sql::{compile, CompiledQuery, Literal, Predicate};
    pub use crate::store::{SavedReport, SavedReportStore};
}

pub use engine::{Engine, EngineError, ReportResult};
pub use model::{ReportConfig, ReportFilter};
pub use sql::{compile, CompiledQuery};
