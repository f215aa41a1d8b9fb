use serde::Deserialize;

use crate::{
    ast::{Alias, Node, RangeVar, ResTarget},
    error::InvalidQueryError,
};

/// Top level of libpg_query's JSON output.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ParseResult {
    pub version: i64,
    pub stmts: Vec<RawStmt>,
}

impl ParseResult {
    pub fn from_json(text: &str) -> Result<Self, InvalidQueryError> {
        serde_json::from_str(text)
            .map_err(|err| InvalidQueryError::new(format!("malformed parse tree: {err}"), None))
    }

    /// The single statement of the query; multi-statement text is rejected.
    pub fn statement(&self) -> Result<&Node, InvalidQueryError> {
        match self.stmts.as_slice() {
            [raw] => Ok(&raw.stmt),
            [] => Err(InvalidQueryError::new("query contains no statement", None)),
            _ => Err(InvalidQueryError::new("query must contain exactly one statement", None)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawStmt {
    pub stmt: Node,
    #[serde(default)]
    pub stmt_location: i32,
    #[serde(default)]
    pub stmt_len: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum SetOperation {
    #[default]
    None,
    Union,
    Intersect,
    Except,
}

impl From<String> for SetOperation {
    fn from(value: String) -> Self {
        match value.as_str() {
            "SETOP_UNION" => SetOperation::Union,
            "SETOP_INTERSECT" => SetOperation::Intersect,
            "SETOP_EXCEPT" => SetOperation::Except,
            _ => SetOperation::None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WithClause {
    pub ctes: Vec<Node>,
    pub recursive: bool,
    pub location: i32,
}

impl WithClause {
    pub fn common_table_exprs(&self) -> impl Iterator<Item = &CommonTableExpr> {
        self.ctes.iter().filter_map(|cte| match cte {
            Node::CommonTableExpr(cte) => Some(cte.as_ref()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CommonTableExpr {
    pub ctename: String,
    pub aliascolnames: Vec<Node>,
    pub ctequery: Option<Node>,
    pub location: i32,
}

impl CommonTableExpr {
    pub fn alias_column_names(&self) -> Vec<&str> {
        self.aliascolnames.iter().filter_map(Node::as_str).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SelectStmt {
    #[serde(rename = "distinctClause")]
    pub distinct_clause: Vec<Node>,
    #[serde(rename = "targetList")]
    pub target_list: Vec<Node>,
    #[serde(rename = "fromClause")]
    pub from_clause: Vec<Node>,
    #[serde(rename = "whereClause")]
    pub where_clause: Option<Node>,
    #[serde(rename = "groupClause")]
    pub group_clause: Vec<Node>,
    #[serde(rename = "havingClause")]
    pub having_clause: Option<Node>,
    #[serde(rename = "valuesLists")]
    pub values_lists: Vec<Node>,
    #[serde(rename = "sortClause")]
    pub sort_clause: Vec<Node>,
    #[serde(rename = "limitCount")]
    pub limit_count: Option<Node>,
    #[serde(rename = "limitOffset")]
    pub limit_offset: Option<Node>,
    #[serde(rename = "withClause")]
    pub with_clause: Option<WithClause>,
    pub op: SetOperation,
    pub all: bool,
    pub larg: Option<Box<SelectStmt>>,
    pub rarg: Option<Box<SelectStmt>>,
}

impl SelectStmt {
    pub fn targets(&self) -> impl Iterator<Item = &ResTarget> {
        res_targets(&self.target_list)
    }

    /// Rows of a `VALUES (...), (...)` body.
    pub fn values_rows(&self) -> Vec<&[Node]> {
        self.values_lists
            .iter()
            .map(|row| match row {
                Node::List(items) => items.as_slice(),
                other => std::slice::from_ref(other),
            })
            .collect()
    }

    pub fn is_values(&self) -> bool {
        !self.values_lists.is_empty()
    }

    pub fn is_set_operation(&self) -> bool {
        self.op != SetOperation::None
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum OverridingKind {
    #[default]
    NotSet,
    UserValue,
    SystemValue,
}

impl From<String> for OverridingKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "OVERRIDING_USER_VALUE" => OverridingKind::UserValue,
            "OVERRIDING_SYSTEM_VALUE" => OverridingKind::SystemValue,
            _ => OverridingKind::NotSet,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct InsertStmt {
    pub relation: RangeVar,
    pub cols: Vec<Node>,
    #[serde(rename = "selectStmt")]
    pub select_stmt: Option<Node>,
    #[serde(rename = "onConflictClause")]
    pub on_conflict_clause: Option<serde_json::Value>,
    #[serde(rename = "returningList")]
    pub returning_list: Vec<Node>,
    #[serde(rename = "withClause")]
    pub with_clause: Option<WithClause>,
    #[serde(rename = "override")]
    pub overriding: OverridingKind,
}

impl InsertStmt {
    /// Explicit column list, `INSERT INTO t (a, b)`.
    pub fn column_names(&self) -> Vec<&str> {
        res_targets(&self.cols).filter_map(|target| target.name.as_deref()).collect()
    }

    pub fn select(&self) -> Option<&SelectStmt> {
        match &self.select_stmt {
            Some(Node::SelectStmt(select)) => Some(select),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UpdateStmt {
    pub relation: RangeVar,
    #[serde(rename = "targetList")]
    pub target_list: Vec<Node>,
    #[serde(rename = "whereClause")]
    pub where_clause: Option<Node>,
    #[serde(rename = "fromClause")]
    pub from_clause: Vec<Node>,
    #[serde(rename = "returningList")]
    pub returning_list: Vec<Node>,
    #[serde(rename = "withClause")]
    pub with_clause: Option<WithClause>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DeleteStmt {
    pub relation: RangeVar,
    #[serde(rename = "usingClause")]
    pub using_clause: Vec<Node>,
    #[serde(rename = "whereClause")]
    pub where_clause: Option<Node>,
    #[serde(rename = "returningList")]
    pub returning_list: Vec<Node>,
    #[serde(rename = "withClause")]
    pub with_clause: Option<WithClause>,
}

pub fn res_targets(nodes: &[Node]) -> impl Iterator<Item = &ResTarget> {
    nodes.iter().filter_map(|node| match node {
        Node::ResTarget(target) => Some(target.as_ref()),
        _ => None,
    })
}

/// Alias column list of a FROM item, if it has one.
pub fn alias_columns(alias: Option<&Alias>) -> Vec<&str> {
    alias.map(Alias::column_names).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_result_exposes_single_statement() {
        let text = json!({
            "version": 170004,
            "stmts": [{"stmt": {"SelectStmt": {
                "targetList": [{"ResTarget": {"val": {"A_Const": {"ival": {"ival": 1}}}}}],
                "limitOption": "LIMIT_OPTION_DEFAULT",
                "op": "SETOP_NONE"
            }}}]
        })
        .to_string();

        let parsed = ParseResult::from_json(&text).expect("parse result");
        let Node::SelectStmt(select) = parsed.statement().expect("statement") else {
            panic!("expected select");
        };
        assert_eq!(select.targets().count(), 1);
        assert!(!select.is_set_operation());
    }

    #[test]
    fn multiple_statements_are_rejected() {
        let parsed: ParseResult = serde_json::from_value(json!({"stmts": [
            {"stmt": {"SelectStmt": {}}},
            {"stmt": {"SelectStmt": {}}}
        ]}))
        .unwrap();
        assert!(parsed.statement().is_err());
    }

    #[test]
    fn insert_reads_columns_and_overriding() {
        let insert: InsertStmt = serde_json::from_value(json!({
            "relation": {"relname": "t", "inh": true},
            "cols": [{"ResTarget": {"name": "id"}}, {"ResTarget": {"name": "req"}}],
            "override": "OVERRIDING_SYSTEM_VALUE"
        }))
        .unwrap();
        assert_eq!(insert.column_names(), vec!["id", "req"]);
        assert_eq!(insert.overriding, OverridingKind::SystemValue);
        assert!(insert.select().is_none());
    }

    #[test]
    fn values_rows_unwrap_lists() {
        let select: SelectStmt = serde_json::from_value(json!({"valuesLists": [
            {"List": {"items": [{"A_Const": {"ival": {"ival": 1}}}, {"A_Const": {"sval": {"sval": "a"}}}]}},
            {"List": {"items": [{"A_Const": {"ival": {"ival": 2}}}, {"A_Const": {"isnull": true}}]}}
        ]}))
        .unwrap();
        let rows = select.values_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].len(), 2);
    }
}
