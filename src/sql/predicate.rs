//! Predicate AST - the comparison vocabulary of compiled queries.

use serde_json::Value;

use super::{quote_ident, quote_str};

/// A literal comparison value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Null,
}

impl Literal {
    /// Convert a JSON filter value into a literal.
    pub fn from_json(value: &Value) -> Literal {
        match value {
            Value::Null => Literal::Null,
            Value::Bool(b) => Literal::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Literal::Int(i),
                None => Literal::Float(n.as_f64().unwrap_or(0.0)),
            },
            Value::String(s) => Literal::String(s.clone()),
            // Arrays and objects are unpacked by the compiler before this
            // point; anything left over renders as NULL.
            Value::Array(_) | Value::Object(_) => Literal::Null,
        }
    }

    fn render(&self) -> String {
        match self {
            Literal::Int(i) => i.to_string(),
            Literal::Float(f) => f.to_string(),
            Literal::String(s) => quote_str(s),
            Literal::Bool(true) => "TRUE".to_string(),
            Literal::Bool(false) => "FALSE".to_string(),
            Literal::Null => "NULL".to_string(),
        }
    }
}

/// A compiled predicate.
///
/// Every variant must be handled in `to_sql()` - the compiler enforces this.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq { column: String, value: Literal },
    Ne { column: String, value: Literal },
    /// Case-insensitive substring match.
    ContainsCi { column: String, pattern: String },
    Gt { column: String, value: Literal },
    Lt { column: String, value: Literal },
    /// Inclusive on both ends.
    Between {
        column: String,
        low: Literal,
        high: Literal,
    },
    In { column: String, values: Vec<Literal> },
}

impl Predicate {
    /// Column this predicate constrains.
    pub fn column(&self) -> &str {
        match self {
            Predicate::Eq { column, .. }
            | Predicate::Ne { column, .. }
            | Predicate::ContainsCi { column, .. }
            | Predicate::Gt { column, .. }
            | Predicate::Lt { column, .. }
            | Predicate::Between { column, .. }
            | Predicate::In { column, .. } => column,
        }
    }

    pub fn to_sql(&self) -> String {
        match self {
            Predicate::Eq {
                column,
                value: Literal::Null,
            } => format!("{} IS NULL", quote_ident(column)),
            Predicate::Ne {
                column,
                value: Literal::Null,
            } => format!("{} IS NOT NULL", quote_ident(column)),
            Predicate::Eq { column, value } => {
                format!("{} = {}", quote_ident(column), value.render())
            }
            Predicate::Ne { column, value } => {
                format!("{} <> {}", quote_ident(column), value.render())
            }
            Predicate::ContainsCi { column, pattern } => {
                let escaped = escape_like_pattern(&pattern.to_lowercase());
                format!(
                    "LOWER({}) LIKE {} ESCAPE '\\'",
                    quote_ident(column),
                    quote_str(&format!("%{}%", escaped))
                )
            }
            Predicate::Gt { column, value } => {
                format!("{} > {}", quote_ident(column), value.render())
            }
            Predicate::Lt { column, value } => {
                format!("{} < {}", quote_ident(column), value.render())
            }
            Predicate::Between { column, low, high } => format!(
                "{} BETWEEN {} AND {}",
                quote_ident(column),
                low.render(),
                high.render()
            ),
            Predicate::In { column, values } => {
                if values.is_empty() {
                    // An empty set matches nothing; never widen the query.
                    return "1 = 0".to_string();
                }
                let rendered: Vec<String> = values.iter().map(|v| v.render()).collect();
                format!("{} IN ({})", quote_ident(column), rendered.join(", "))
            }
        }
    }
}

/// Escape LIKE wildcards so user input matches literally.
fn escape_like_pattern(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
