//! Query compilation - from a validated [`ReportConfig`] to a
//! [`CompiledQuery`] ready for the datastore.
//!
//! The predicate AST is a closed set with exhaustive rendering: the compiler
//! enforces that every variant serializes. Tenant scoping is injected here
//! and is not expressible (or removable) through user filters.
//!
//! [`ReportConfig`]: crate::model::ReportConfig

mod compile;
mod predicate;
mod query;

pub use compile::compile;
pub use predicate::{Literal, Predicate};
pub use query::CompiledQuery;

/// Quote an identifier for SQL output.
///
/// Identifiers come from the static catalog or from validated configuration,
/// so embedded quotes are stripped rather than escaped.
pub(crate) fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', ""))
}

/// Escape a string literal: single quotes double, wrapped in single quotes.
pub(crate) fn quote_str(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
