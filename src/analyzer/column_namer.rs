use crate::ast::{ColumnRefParts, MinMaxOp, Node, ResTarget, SubLinkType, AExprKind};

/// Output column names the way PostgreSQL picks them for unaliased targets.
pub struct ColumnNamer;

/// How sure the name is; a CASE only borrows its ELSE name when it is `Strong`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NameStrength {
    Weak,
    Strong,
}

impl ColumnNamer {
    pub const FALLBACK: &'static str = "?column?";

    pub fn target_name(target: &ResTarget) -> String {
        if let Some(name) = &target.name {
            return name.clone();
        }
        target.val.as_deref().map(Self::expression_name).unwrap_or_else(|| Self::FALLBACK.to_string())
    }

    pub fn expression_name(node: &Node) -> String {
        Self::figure(node).map(|(name, _)| name).unwrap_or_else(|| Self::FALLBACK.to_string())
    }

    pub fn figure(node: &Node) -> Option<(String, NameStrength)> {
        use NameStrength::*;

        match node {
            Node::ColumnRef(column) => match column.parts()? {
                ColumnRefParts::Column { name } | ColumnRefParts::QualifiedColumn { name, .. } => {
                    Some((name.to_string(), Strong))
                }
                ColumnRefParts::QualifiedStar { table } => Some((table.to_string(), Strong)),
                ColumnRefParts::Star => None,
            },
            Node::AIndirection(indirection) => {
                let field = indirection.indirection.iter().rev().find_map(Node::as_str);
                match field {
                    Some(field) => Some((field.to_string(), Strong)),
                    None => Self::figure(indirection.arg.as_deref()?),
                }
            }
            Node::FuncCall(call) => Some((call.name(), Strong)),
            Node::AExpr(expr) if expr.kind == AExprKind::NullIf => Some(("nullif".into(), Strong)),
            Node::TypeCast(cast) => {
                let inner = cast.arg.as_deref().and_then(Self::figure);
                match inner {
                    Some(found) => Some(found),
                    None => crate::ast::last_name(&cast.type_name.names).map(|name| (name.to_string(), Weak)),
                }
            }
            Node::SubLink(sublink) => match sublink.sub_link_type {
                SubLinkType::Exists => Some(("exists".into(), Strong)),
                SubLinkType::Array => Some(("array".into(), Strong)),
                SubLinkType::Expr => {
                    let first = sublink.select()?.targets().next()?;
                    Some((Self::target_name(first), Strong))
                }
                _ => None,
            },
            Node::CaseExpr(case) => {
                let default_name = case.defresult.as_deref().and_then(Self::figure);
                match default_name {
                    Some((name, Strong)) => Some((name, Strong)),
                    _ => Some(("case".into(), Strong)),
                }
            }
            Node::AArrayExpr(_) => Some(("array".into(), Strong)),
            Node::RowExpr(_) => Some(("row".into(), Strong)),
            Node::CoalesceExpr(_) => Some(("coalesce".into(), Strong)),
            Node::MinMaxExpr(expr) => match expr.op {
                MinMaxOp::Greatest => Some(("greatest".into(), Strong)),
                MinMaxOp::Least => Some(("least".into(), Strong)),
            },
            Node::SqlValueFunction(function) => Some((function.op.column_name().into(), Strong)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn name_of(value: serde_json::Value) -> String {
        ColumnNamer::expression_name(&Node::from_value(value).unwrap())
    }

    #[test]
    fn plain_and_qualified_columns() {
        assert_eq!(name_of(json!({"ColumnRef": {"fields": [{"String": {"sval": "id"}}]}})), "id");
        assert_eq!(
            name_of(json!({"ColumnRef": {"fields": [{"String": {"sval": "u"}}, {"String": {"sval": "email"}}]}})),
            "email"
        );
    }

    #[test]
    fn expressions_without_a_name() {
        assert_eq!(
            name_of(json!({"A_Expr": {"kind": "AEXPR_OP", "name": [{"String": {"sval": "+"}}],
                "lexpr": {"A_Const": {"ival": {"ival": 1}}}, "rexpr": {"A_Const": {"ival": {"ival": 2}}}}})),
            "?column?"
        );
        assert_eq!(name_of(json!({"A_Const": {"sval": {"sval": "x"}}})), "?column?");
    }

    #[test]
    fn casts_of_constants_take_the_type_name() {
        assert_eq!(
            name_of(json!({"TypeCast": {"arg": {"A_Const": {"sval": {"sval": "1"}}},
                "typeName": {"names": [{"String": {"sval": "pg_catalog"}}, {"String": {"sval": "int4"}}]}}})),
            "int4"
        );
        assert_eq!(
            name_of(json!({"TypeCast": {"arg": {"ColumnRef": {"fields": [{"String": {"sval": "id"}}]}},
                "typeName": {"names": [{"String": {"sval": "text"}}]}}})),
            "id"
        );
    }

    #[test]
    fn case_borrows_a_strong_else_name() {
        let with_column_else = json!({"CaseExpr": {
            "args": [{"CaseWhen": {"expr": {"A_Const": {"boolval": {"boolval": true}}}, "result": {"A_Const": {"ival": {"ival": 1}}}}}],
            "defresult": {"ColumnRef": {"fields": [{"String": {"sval": "score"}}]}}
        }});
        assert_eq!(name_of(with_column_else), "score");

        let with_constant_else = json!({"CaseExpr": {
            "args": [],
            "defresult": {"TypeCast": {"arg": {"A_Const": {"ival": {"ival": 2}}}, "typeName": {"names": [{"String": {"sval": "int8"}}]}}}
        }});
        assert_eq!(name_of(with_constant_else), "case");
    }

    #[test]
    fn keyword_names() {
        assert_eq!(name_of(json!({"CoalesceExpr": {"args": []}})), "coalesce");
        assert_eq!(name_of(json!({"MinMaxExpr": {"op": "IS_LEAST", "args": []}})), "least");
        assert_eq!(name_of(json!({"SubLink": {"subLinkType": "EXISTS_SUBLINK"}})), "exists");
        assert_eq!(name_of(json!({"FuncCall": {"funcname": [{"String": {"sval": "count"}}], "agg_star": true}})), "count");
        assert_eq!(name_of(json!({"SQLValueFunction": {"op": "SVFOP_CURRENT_DATE"}})), "current_date");
    }
}
