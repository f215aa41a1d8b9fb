#[cfg(test)]
pub mod fixtures {
    use serde_json::{Value, json};

    use crate::{
        analyzer::{AstDescriber, DescribedColumn},
        ast::ParseResult,
        catalog::{CatalogSnapshot, ColumnRow, column},
        config::Overrides,
    };

    pub const MOOD_OID: u32 = 90100;
    pub const PHONE_OID: u32 = 90200;

    fn with_default(row: ColumnRow) -> ColumnRow {
        ColumnRow { col_has_def: true, ..row }
    }

    /// users, posts, `t(id serial primary key, req text not null)` and `audit`
    /// (identity always `id`, stored generated `total`, required `note`), plus
    /// the `mood` enum, the `phone` domain and one user function.
    pub fn catalog() -> CatalogSnapshot {
        let mut catalog = CatalogSnapshot::with_builtin_types();
        catalog
            .add_enum(MOOD_OID, "mood", &["sad", "ok", "happy"])
            .add_domain(PHONE_OID, "phone", "text")
            .add_table(
                16384,
                "public",
                "users",
                vec![
                    with_default(column("id", 23, true)),
                    column("name", 25, true),
                    column("email", 25, false),
                    column("mood", MOOD_OID, false),
                    column("phone", PHONE_OID, false),
                    with_default(column("created_at", 1184, true)),
                ],
            )
            .add_table(
                16390,
                "public",
                "posts",
                vec![
                    with_default(column("id", 23, true)),
                    column("user_id", 23, true),
                    column("title", 25, true),
                    column("body", 25, false),
                    column("tags", 1009, false),
                    column("meta", 3802, false),
                ],
            )
            .add_table(16400, "public", "t", vec![with_default(column("id", 23, true)), column("req", 25, true)])
            .add_table(
                16410,
                "public",
                "audit",
                vec![
                    ColumnRow { col_identity: "a".into(), ..column("id", 20, true) },
                    ColumnRow { col_generated: "s".into(), ..column("total", 23, true) },
                    column("note", 25, true),
                ],
            )
            .add_function("slugify(text)", "text");
        catalog
    }

    pub fn parse(statement: Value) -> ParseResult {
        serde_json::from_value(json!({"version": 170004, "stmts": [{"stmt": statement}]})).unwrap()
    }

    pub fn describe_with(statement: Value, overrides: &Overrides) -> Vec<DescribedColumn> {
        let catalog = catalog();
        let describer = AstDescriber::new(&catalog, overrides);
        let parsed = parse(statement);
        describer.describe_statement(parsed.statement().unwrap(), None).unwrap().unwrap_or_default()
    }

    pub fn describe(statement: Value) -> Vec<DescribedColumn> {
        describe_with(statement, &Overrides::default())
    }

    pub fn string(value: &str) -> Value {
        json!({"String": {"sval": value}})
    }

    /// `a.b` as a ColumnRef; `*` becomes A_Star.
    pub fn colref(path: &str) -> Value {
        let fields: Vec<Value> =
            path.split('.').map(|part| if part == "*" { json!({"A_Star": {}}) } else { string(part) }).collect();
        json!({"ColumnRef": {"fields": fields}})
    }

    pub fn target(val: Value) -> Value {
        json!({"ResTarget": {"val": val}})
    }

    pub fn named(name: &str, val: Value) -> Value {
        json!({"ResTarget": {"name": name, "val": val}})
    }

    pub fn int(value: i64) -> Value {
        json!({"A_Const": {"ival": {"ival": value}}})
    }

    pub fn text(value: &str) -> Value {
        json!({"A_Const": {"sval": {"sval": value}}})
    }

    pub fn null() -> Value {
        json!({"A_Const": {"isnull": true}})
    }

    pub fn rangevar(name: &str, alias: Option<&str>) -> Value {
        match alias {
            Some(alias) => json!({"RangeVar": {"relname": name, "inh": true, "alias": {"aliasname": alias}}}),
            None => json!({"RangeVar": {"relname": name, "inh": true}}),
        }
    }

    pub fn func(name: &str, args: Vec<Value>) -> Value {
        json!({"FuncCall": {"funcname": [string(name)], "args": args}})
    }

    pub fn op(name: &str, left: Value, right: Value) -> Value {
        json!({"A_Expr": {"kind": "AEXPR_OP", "name": [string(name)], "lexpr": left, "rexpr": right}})
    }

    pub fn is_not_null(arg: Value) -> Value {
        json!({"NullTest": {"arg": arg, "nulltesttype": "IS_NOT_NULL"}})
    }

    /// `jointype` as libpg_query spells it, e.g. `JOIN_LEFT`.
    pub fn join(jointype: &str, larg: Value, rarg: Value, quals: Value) -> Value {
        json!({"JoinExpr": {"jointype": jointype, "larg": larg, "rarg": rarg, "quals": quals}})
    }

    pub fn select(targets: Vec<Value>, from: Vec<Value>) -> Value {
        json!({"SelectStmt": {"targetList": targets, "fromClause": from, "op": "SETOP_NONE"}})
    }

    pub fn select_where(targets: Vec<Value>, from: Vec<Value>, where_clause: Value) -> Value {
        json!({"SelectStmt": {"targetList": targets, "fromClause": from, "whereClause": where_clause, "op": "SETOP_NONE"}})
    }

    /// `INSERT INTO table (cols) VALUES rows`; empty `cols` leaves the list implied.
    pub fn insert_values(table: &str, cols: &[&str], rows: Vec<Vec<Value>>) -> Value {
        let cols: Vec<Value> = cols.iter().map(|name| json!({"ResTarget": {"name": name}})).collect();
        let rows: Vec<Value> = rows.into_iter().map(|row| json!({"List": {"items": row}})).collect();
        json!({"InsertStmt": {
            "relation": {"relname": table, "inh": true},
            "cols": cols,
            "selectStmt": {"SelectStmt": {"valuesLists": rows, "op": "SETOP_NONE"}},
            "override": "OVERRIDING_NOT_SET"
        }})
    }
}
