//! Compiled query - projection, predicates, and limit for one fetch.

use super::predicate::Predicate;
use super::quote_ident;

/// The result of compiling a report configuration.
///
/// Read-only input to the datastore. The first predicate is always the
/// tenant scope.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    /// Physical table to read.
    pub table: String,
    /// Columns to project, in output order.
    pub select: Vec<String>,
    /// Conjunction of predicates; all must hold.
    pub predicates: Vec<Predicate>,
    /// Row limit, already clamped to the supported range.
    pub limit: u32,
}

impl CompiledQuery {
    /// Render the query as one SELECT statement.
    pub fn to_sql(&self) -> String {
        let columns: Vec<String> = self.select.iter().map(|c| quote_ident(c)).collect();

        let mut sql = format!(
            "SELECT {} FROM {}",
            columns.join(", "),
            quote_ident(&self.table)
        );

        if !self.predicates.is_empty() {
            let clauses: Vec<String> = self.predicates.iter().map(|p| p.to_sql()).collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        sql.push_str(&format!(" LIMIT {}", self.limit));
        sql
    }
}
