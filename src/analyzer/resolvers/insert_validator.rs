use tracing::{debug, warn};

use crate::{
    ast::{ConstValue, InsertStmt, Node, SelectStmt, res_targets},
    catalog::{CatalogSnapshot, ColumnRow},
    error::PostgresConstraintError,
};

/// Columns an INSERT writes, explicit or implied by its source.
#[derive(Debug, Clone, PartialEq, Eq)]
enum InsertColumns<'a> {
    /// Every column may be written, e.g. `INSERT INTO t SELECT * FROM u`.
    All,
    Named(Vec<&'a str>),
}

/// Checks that an INSERT supplies every NOT NULL column without a default.
pub struct InsertValidator;

impl InsertValidator {
    pub fn validate(insert: &InsertStmt, catalog: &CatalogSnapshot) -> Result<(), PostgresConstraintError> {
        let relation = &insert.relation;
        let Some(table) = catalog.find_table(relation.schemaname.as_deref(), &relation.relname) else {
            warn!(table = %relation.relname, "insert target not found in catalog, skipping validation");
            return Ok(());
        };

        let mut rows: Vec<&ColumnRow> = table.columns.iter().collect();
        rows.sort_by_key(|row| row.col_num);

        let written = Self::written_columns(insert, &rows);
        debug!(table = table.name, overriding = ?insert.overriding, columns = ?written, "validating insert");

        let InsertColumns::Named(names) = &written else { return Ok(()) };

        if let Some(missing) = rows.iter().find(|row| row.is_required() && !names.contains(&row.col_name.as_str())) {
            return Err(PostgresConstraintError::not_null_violation(&missing.col_name, table.name));
        }

        let Some(select) = insert.select().filter(|select| select.is_values()) else { return Ok(()) };
        for values in select.values_rows() {
            for (name, value) in names.iter().zip(values) {
                let required = rows.iter().any(|row| row.col_name == *name && row.is_required());
                if required && writes_null(value) {
                    return Err(PostgresConstraintError::not_null_violation(name, table.name));
                }
            }
        }

        Ok(())
    }

    fn written_columns<'a>(insert: &'a InsertStmt, rows: &[&'a ColumnRow]) -> InsertColumns<'a> {
        let explicit = insert.column_names();
        if !explicit.is_empty() {
            return InsertColumns::Named(explicit);
        }

        // DEFAULT VALUES
        let Some(select) = insert.select() else {
            return InsertColumns::Named(Vec::new());
        };

        match implied_width(select) {
            Some(width) => InsertColumns::Named(rows.iter().take(width).map(|row| row.col_name.as_str()).collect()),
            None => InsertColumns::All,
        }
    }
}

/// Number of values each source row supplies; `None` when a `*` hides it.
fn implied_width(select: &SelectStmt) -> Option<usize> {
    if select.is_set_operation() {
        return select.larg.as_deref().and_then(implied_width);
    }
    if select.is_values() {
        return select.values_rows().first().map(|row| row.len());
    }

    let mut width = 0;
    for target in res_targets(&select.target_list) {
        match target.val.as_deref() {
            Some(Node::ColumnRef(column)) if column.is_star() => return None,
            _ => width += 1,
        }
    }
    Some(width)
}

fn writes_null(value: &Node) -> bool {
    match value {
        Node::AConst(value) => value.value() == ConstValue::Null,
        Node::SetToDefault => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::{
        analyzer::_fixtures::fixtures::{catalog, insert_values, parse},
        ast::ParseResult,
    };

    fn insert(result: &ParseResult) -> &InsertStmt {
        match result.statement().unwrap() {
            Node::InsertStmt(insert) => insert,
            other => panic!("expected insert, got {other:?}"),
        }
    }

    fn validate(tree: serde_json::Value) -> Result<(), PostgresConstraintError> {
        let result = parse(tree);
        InsertValidator::validate(insert(&result), &catalog())
    }

    #[test]
    fn missing_required_column_is_reported() {
        // INSERT INTO t (id) VALUES (1)
        let err = validate(insert_values("t", &["id"], vec![vec![
            json!({"A_Const": {"ival": {"ival": 1}}}),
        ]]))
        .unwrap_err();

        assert!(err.message.starts_with("null value in column \"req\" of relation \"t\" violates not-null constraint"));
        assert!(err.message.ends_with("Hint: Columns \"req\" are not nullable and have no default value."));
    }

    #[test]
    fn serial_and_generated_columns_are_optional() {
        // INSERT INTO t (req) VALUES ('x')
        let result = validate(insert_values("t", &["req"], vec![vec![
            json!({"A_Const": {"sval": {"sval": "x"}}}),
        ]]));
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn explicit_null_or_default_in_required_column() {
        let null = validate(insert_values("t", &["req"], vec![vec![
            json!({"A_Const": {"isnull": true}}),
        ]]));
        assert!(null.is_err());

        let default = validate(insert_values("t", &["req"], vec![vec![
            json!({"SetToDefault": {}}),
        ]]));
        assert!(default.is_err());
    }

    #[test]
    fn implied_columns_follow_values_width() {
        // INSERT INTO t VALUES (1, 'x')
        let ok = validate(insert_values("t", &[], vec![vec![
            json!({"A_Const": {"ival": {"ival": 1}}}),
            json!({"A_Const": {"sval": {"sval": "x"}}}),
        ]]));
        assert_eq!(ok, Ok(()));

        // INSERT INTO t VALUES (1)
        let short = validate(insert_values("t", &[], vec![vec![
            json!({"A_Const": {"ival": {"ival": 1}}}),
        ]]));
        assert!(short.is_err());
    }

    #[test]
    fn default_values_misses_required_columns() {
        let err = validate(json!({"InsertStmt": {
            "relation": {"relname": "t", "inh": true, "relpersistence": "p"},
            "override": "OVERRIDING_NOT_SET"
        }}));
        assert!(err.is_err());
    }

    #[test]
    fn insert_select_star_is_not_second_guessed() {
        let ok = validate(json!({"InsertStmt": {
            "relation": {"relname": "t"},
            "selectStmt": {"SelectStmt": {
                "targetList": [{"ResTarget": {"val": {"ColumnRef": {"fields": [{"A_Star": {}}]}}}}],
                "fromClause": [{"RangeVar": {"relname": "users"}}]
            }}
        }}));
        assert_eq!(ok, Ok(()));
    }

    #[test]
    fn identity_and_generated_columns_are_never_required() {
        // INSERT INTO audit (note) VALUES ('x')
        let ok = validate(insert_values("audit", &["note"], vec![vec![
            json!({"A_Const": {"sval": {"sval": "x"}}}),
        ]]));
        assert_eq!(ok, Ok(()));
    }

    #[test]
    fn overriding_system_value_keeps_the_required_set() {
        // INSERT INTO audit (id, note) OVERRIDING SYSTEM VALUE VALUES (1, 'x')
        let mut tree = insert_values("audit", &["id", "note"], vec![vec![
            json!({"A_Const": {"ival": {"ival": 1}}}),
            json!({"A_Const": {"sval": {"sval": "x"}}}),
        ]]);
        tree["InsertStmt"]["override"] = json!("OVERRIDING_SYSTEM_VALUE");
        assert_eq!(validate(tree), Ok(()));

        // INSERT INTO audit (id) OVERRIDING SYSTEM VALUE VALUES (1)
        let mut tree = insert_values("audit", &["id"], vec![vec![json!({"A_Const": {"ival": {"ival": 1}}})]]);
        tree["InsertStmt"]["override"] = json!("OVERRIDING_SYSTEM_VALUE");
        let err = validate(tree).unwrap_err();
        assert!(err.message.starts_with("null value in column \"note\" of relation \"audit\""));
    }
}
