use serde::Deserialize;

use crate::ast::{Node, SelectStmt};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Alias {
    pub aliasname: String,
    pub colnames: Vec<Node>,
}

impl Alias {
    pub fn column_names(&self) -> Vec<&str> {
        self.colnames.iter().filter_map(Node::as_str).collect()
    }
}

/// A table reference in FROM, INSERT INTO, UPDATE or DELETE FROM.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RangeVar {
    pub catalogname: Option<String>,
    pub schemaname: Option<String>,
    pub relname: String,
    pub inh: bool,
    pub alias: Option<Alias>,
    pub location: i32,
}

impl RangeVar {
    /// The name the relation is visible under: its alias, else its table name.
    pub fn visible_name(&self) -> &str {
        match &self.alias {
            Some(alias) if !alias.aliasname.is_empty() => &alias.aliasname,
            _ => &self.relname,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Full,
    Right,
    Semi,
    Anti,
    Other,
}

impl From<String> for JoinType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "JOIN_INNER" => JoinType::Inner,
            "JOIN_LEFT" => JoinType::Left,
            "JOIN_FULL" => JoinType::Full,
            "JOIN_RIGHT" => JoinType::Right,
            "JOIN_SEMI" => JoinType::Semi,
            "JOIN_ANTI" => JoinType::Anti,
            _ => JoinType::Other,
        }
    }
}

impl JoinType {
    /// Rows of the right-hand relation may be missing.
    pub fn nulls_right(&self) -> bool {
        matches!(self, JoinType::Left | JoinType::Full)
    }

    /// Rows of the left-hand relation may be missing.
    pub fn nulls_left(&self) -> bool {
        matches!(self, JoinType::Right | JoinType::Full)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct JoinExpr {
    pub jointype: JoinType,
    #[serde(rename = "isNatural")]
    pub is_natural: bool,
    pub larg: Option<Node>,
    pub rarg: Option<Node>,
    #[serde(rename = "usingClause")]
    pub using_clause: Vec<Node>,
    pub quals: Option<Node>,
    pub alias: Option<Alias>,
    pub rtindex: i32,
}

impl JoinExpr {
    pub fn using_columns(&self) -> Vec<&str> {
        self.using_clause.iter().filter_map(Node::as_str).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RangeSubselect {
    pub lateral: bool,
    pub subquery: Option<Node>,
    pub alias: Option<Alias>,
}

impl RangeSubselect {
    pub fn select(&self) -> Option<&SelectStmt> {
        match &self.subquery {
            Some(Node::SelectStmt(select)) => Some(select),
            _ => None,
        }
    }

    pub fn alias_name(&self) -> Option<&str> {
        self.alias.as_ref().map(|alias| alias.aliasname.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn visible_name_prefers_alias() {
        let plain: RangeVar = serde_json::from_value(json!({"relname": "users", "inh": true})).unwrap();
        assert_eq!(plain.visible_name(), "users");

        let aliased: RangeVar =
            serde_json::from_value(json!({"relname": "users", "alias": {"aliasname": "u"}})).unwrap();
        assert_eq!(aliased.visible_name(), "u");
    }

    #[test]
    fn join_sides_that_null_extend() {
        assert!(JoinType::Left.nulls_right());
        assert!(!JoinType::Left.nulls_left());
        assert!(JoinType::Right.nulls_left());
        assert!(JoinType::Full.nulls_left() && JoinType::Full.nulls_right());
        assert!(!JoinType::Inner.nulls_left() && !JoinType::Inner.nulls_right());
        assert_eq!(JoinType::from("JOIN_UNIQUE_OUTER".to_string()), JoinType::Other);
    }

    #[test]
    fn join_expr_keeps_both_arms() {
        let join: JoinExpr = serde_json::from_value(json!({
            "jointype": "JOIN_LEFT",
            "larg": {"RangeVar": {"relname": "a"}},
            "rarg": {"RangeVar": {"relname": "b"}},
            "usingClause": [{"String": {"sval": "id"}}]
        }))
        .unwrap();
        assert_eq!(join.jointype, JoinType::Left);
        assert!(matches!(join.larg, Some(Node::RangeVar(_))));
        assert_eq!(join.using_columns(), vec!["id"]);
    }
}
