use std::collections::HashSet;

use crate::{
    analyzer::{NullBehavior, pg_functions},
    ast::{AExprKind, BoolExprType, ColumnRef, ColumnRefParts, ConstValue, Node, NullTestType, SelectStmt, SubLinkType},
};

/// Columns and target names proven non-null for one statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NonNullableColumns {
    /// `relation.column` and bare `column` facts from WHERE.
    columns: HashSet<String>,
    /// Ordinals of targets that can never be null.
    targets: HashSet<usize>,
}

impl NonNullableColumns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_column(&mut self, qualifier: Option<&str>, column: &str) {
        match qualifier {
            Some(qualifier) => self.columns.insert(format!("{qualifier}.{column}")),
            None => self.columns.insert(column.to_string()),
        };
    }

    /// A column of `relation` is covered by a qualified or a bare fact.
    pub fn has_column(&self, relation: &str, column: &str) -> bool {
        self.columns.contains(column) || self.columns.contains(&format!("{relation}.{column}"))
    }

    pub fn has_column_ref(&self, column: &ColumnRef) -> bool {
        match column.parts() {
            Some(ColumnRefParts::Column { name }) => self.columns.contains(name),
            Some(ColumnRefParts::QualifiedColumn { table, name }) => self.has_column(table, name),
            _ => false,
        }
    }

    pub fn has_target(&self, ordinal: usize) -> bool {
        self.targets.contains(&ordinal)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.targets.is_empty()
    }
}

pub struct NonNullableResolver;

impl NonNullableResolver {
    pub fn analyze(select: &SelectStmt) -> NonNullableColumns {
        let mut facts = Self::where_facts(select.where_clause.as_ref());

        let mut targets = HashSet::new();
        for (ordinal, target) in select.targets().enumerate() {
            let Some(val) = target.val.as_deref() else { continue };
            if Self::is_non_null_expr(val, &facts) {
                targets.insert(ordinal);
            }
        }
        facts.targets = targets;
        facts
    }

    /// Columns tested `IS NOT NULL` at the top of WHERE or inside a top-level AND chain.
    pub fn where_facts(where_clause: Option<&Node>) -> NonNullableColumns {
        let mut facts = NonNullableColumns::new();
        if let Some(node) = where_clause {
            Self::collect_where_facts(node, &mut facts);
        }
        facts
    }

    fn collect_where_facts(node: &Node, facts: &mut NonNullableColumns) {
        match node {
            Node::NullTest(test) if test.nulltesttype == NullTestType::IsNotNull => {
                if let Some(Node::ColumnRef(column)) = test.arg.as_deref() {
                    match column.parts() {
                        Some(ColumnRefParts::Column { name }) => facts.add_column(None, name),
                        Some(ColumnRefParts::QualifiedColumn { table, name }) => facts.add_column(Some(table), name),
                        _ => {}
                    }
                }
            }
            Node::BoolExpr(expr) if expr.boolop == BoolExprType::And => {
                for arg in &expr.args {
                    Self::collect_where_facts(arg, facts);
                }
            }
            _ => {}
        }
    }

    /// Whether an expression can be shown non-null without the catalog.
    pub fn is_non_null_expr(node: &Node, facts: &NonNullableColumns) -> bool {
        let all = |nodes: &[Node]| nodes.iter().all(|node| Self::is_non_null_expr(node, facts));
        let some = |node: &Option<Box<Node>>| node.as_deref().is_some_and(|node| Self::is_non_null_expr(node, facts));

        match node {
            Node::NullTest(_) => true,
            Node::BoolExpr(expr) if expr.boolop == BoolExprType::Not => true,
            Node::AConst(value) => value.value() != ConstValue::Null,
            Node::ColumnRef(column) => facts.has_column_ref(column),
            Node::FuncCall(call) => match pg_functions::lookup(&call.name()) {
                Some(function) if function.nulls == NullBehavior::NeverNull => true,
                Some(function) if function.nulls == NullBehavior::Strict && !function.aggregate => {
                    !call.args.is_empty() && all(&call.args)
                }
                _ => false,
            },
            Node::TypeCast(cast) => some(&cast.arg),
            Node::SubLink(sublink) => matches!(sublink.sub_link_type, SubLinkType::Exists | SubLinkType::Array),
            Node::AExpr(expr) => match expr.kind {
                AExprKind::Distinct | AExprKind::NotDistinct => true,
                AExprKind::NullIf => false,
                _ if matches!(expr.operator(), "->>" | "#>>" | "->" | "#>") => false,
                _ => some(&expr.lexpr) && some(&expr.rexpr),
            },
            Node::CaseExpr(case) => {
                case.whens().all(|when| some(&when.result)) && some(&case.defresult)
            }
            Node::CoalesceExpr(coalesce) => coalesce.args.iter().any(|arg| Self::is_non_null_expr(arg, facts)),
            Node::AArrayExpr(_) | Node::RowExpr(_) | Node::SqlValueFunction(_) => true,
            Node::List(items) => all(items),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(value: serde_json::Value) -> Node {
        Node::from_value(value).unwrap()
    }

    fn column(names: &[&str]) -> serde_json::Value {
        let fields: Vec<_> = names.iter().map(|n| json!({"String": {"sval": n}})).collect();
        json!({"ColumnRef": {"fields": fields}})
    }

    fn is_not_null(arg: serde_json::Value) -> serde_json::Value {
        json!({"NullTest": {"arg": arg, "nulltesttype": "IS_NOT_NULL"}})
    }

    #[test]
    fn top_level_and_chain_facts() {
        let where_clause = node(json!({"BoolExpr": {"boolop": "AND_EXPR", "args": [
            is_not_null(column(&["u", "email"])),
            is_not_null(column(&["name"])),
            {"BoolExpr": {"boolop": "OR_EXPR", "args": [is_not_null(column(&["bio"]))]}}
        ]}}));
        let facts = NonNullableResolver::where_facts(Some(&where_clause));

        assert!(facts.has_column("u", "email"));
        assert!(!facts.has_column("v", "email"));
        assert!(facts.has_column("anything", "name"));
        assert!(!facts.has_column("u", "bio"));
    }

    #[test]
    fn is_null_tests_prove_nothing() {
        let where_clause = node(json!({"NullTest": {"arg": column(&["id"]), "nulltesttype": "IS_NULL"}}));
        assert!(NonNullableResolver::where_facts(Some(&where_clause)).is_empty());
    }

    #[test]
    fn target_facts() {
        let facts = NonNullableColumns::new();
        let non_null = |value| NonNullableResolver::is_non_null_expr(&node(value), &facts);

        assert!(non_null(json!({"A_Const": {"ival": {"ival": 1}}})));
        assert!(!non_null(json!({"A_Const": {"isnull": true}})));
        assert!(non_null(json!({"FuncCall": {"funcname": [{"String": {"sval": "now"}}]}})));
        assert!(!non_null(json!({"FuncCall": {"funcname": [{"String": {"sval": "lower"}}], "args": [column(&["name"])]}})));
        assert!(non_null(json!({"CoalesceExpr": {"args": [column(&["name"]), {"A_Const": {"sval": {"sval": ""}}}]}})));
        assert!(non_null(json!({"SubLink": {"subLinkType": "EXISTS_SUBLINK"}})));
        assert!(!non_null(json!({"CaseExpr": {"args": [
            {"CaseWhen": {"expr": {"A_Const": {"boolval": {"boolval": true}}}, "result": {"A_Const": {"ival": {"ival": 1}}}}}
        ]}})));
    }

    #[test]
    fn analyze_marks_non_null_target_ordinals() {
        let select: SelectStmt = serde_json::from_value(json!({
            "targetList": [
                {"ResTarget": {"val": column(&["email"])}},
                {"ResTarget": {"name": "n", "val": column(&["name"])}}
            ],
            "whereClause": is_not_null(column(&["email"]))
        }))
        .unwrap();

        let facts = NonNullableResolver::analyze(&select);
        assert!(facts.has_target(0));
        assert!(!facts.has_target(1));
    }

    #[test]
    fn targets_sharing_a_name_keep_separate_facts() {
        let select: SelectStmt = serde_json::from_value(json!({
            "targetList": [
                {"ResTarget": {"name": "n", "val": {"FuncCall": {"funcname": [{"String": {"sval": "now"}}]}}}},
                {"ResTarget": {"name": "n", "val": column(&["email"])}}
            ]
        }))
        .unwrap();

        let facts = NonNullableResolver::analyze(&select);
        assert!(facts.has_target(0));
        assert!(!facts.has_target(1));
    }
}
