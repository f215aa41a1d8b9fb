use thiserror::Error;

use crate::{catalog::CatalogError, render::TypeParseError};

/// An SQL construct the engine cannot or must not describe.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("InvalidQueryError: {message}")]
pub struct InvalidQueryError {
    pub message: String,
    /// Tag of the offending parse-tree node, when there is one.
    pub node: Option<String>,
}

impl InvalidQueryError {
    pub fn new(message: impl Into<String>, node: Option<&str>) -> Self {
        Self { message: message.into(), node: node.map(str::to_string) }
    }
}

/// Two output columns share a name but come from different relations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Duplicate columns: {}", .columns.join(", "))]
pub struct DuplicateColumnsError {
    /// Qualified origins, e.g. `a.id`, `b.id`.
    pub columns: Vec<String>,
    pub query_text: String,
}

/// Error shaped like the one the database would raise when running the query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct PostgresConstraintError {
    pub message: String,
    pub line: Option<usize>,
    pub position: Option<usize>,
}

impl PostgresConstraintError {
    pub fn not_null_violation(column: &str, relation: &str) -> Self {
        Self {
            message: format!(
                "null value in column \"{column}\" of relation \"{relation}\" violates not-null constraint\n\
                 Hint: Columns \"{column}\" are not nullable and have no default value."
            ),
            line: None,
            position: None,
        }
    }

    pub fn at(mut self, line: usize, position: usize) -> Self {
        self.line = Some(line);
        self.position = Some(position);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerateError {
    #[error(transparent)]
    InvalidQuery(#[from] InvalidQueryError),
    #[error(transparent)]
    DuplicateColumns(#[from] DuplicateColumnsError),
    #[error(transparent)]
    Constraint(#[from] PostgresConstraintError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    TypeParse(#[from] TypeParseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_null_violation_matches_server_wording() {
        let err = PostgresConstraintError::not_null_violation("req", "t");
        assert!(err.message.starts_with("null value in column \"req\" of relation \"t\" violates not-null constraint"));
        assert!(err.message.contains("\nHint: "));
    }

    #[test]
    fn duplicate_columns_lists_origins() {
        let err = DuplicateColumnsError {
            columns: vec!["a.id".into(), "b.id".into()],
            query_text: "select a.id, b.id from a join b on true".into(),
        };
        assert_eq!(err.to_string(), "Duplicate columns: a.id, b.id");
    }

    #[test]
    fn umbrella_error_wraps_each_kind() {
        let err: GenerateError = InvalidQueryError::new("bad", Some("FuncCall")).into();
        assert!(matches!(err, GenerateError::InvalidQuery(_)));
        assert_eq!(err.to_string(), "InvalidQueryError: bad");
    }
}
