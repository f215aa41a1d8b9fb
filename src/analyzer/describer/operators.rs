use std::collections::HashMap;

use once_cell::sync::Lazy;

const INTEGERS: &[&str] = &["int2", "int4", "int8"];
const NUMERICS: &[&str] = &["int2", "int4", "int8", "numeric", "float4", "float8"];
const COMPARISONS: &[&str] = &["=", "<>", "!=", "<", ">", "<=", ">="];
const PATTERN_MATCHES: &[&str] = &["~~", "!~~", "~~*", "!~~*", "~", "~*", "!~", "!~*"];
const TEXT_LIKE: &[&str] = &["text", "varchar", "bpchar", "name", "citext", "char"];

/// Result type of combining two numeric types in arithmetic.
fn promote(left: &str, right: &str) -> &'static str {
    let has = |name: &str| left == name || right == name;
    if has("float8") || (has("float4") && (left != right)) {
        "float8"
    } else if has("float4") {
        "float4"
    } else if has("numeric") {
        "numeric"
    } else if has("int8") {
        "int8"
    } else if has("int4") {
        "int4"
    } else {
        "int2"
    }
}

/// Binary operator results keyed `left op right`.
pub static OPERATORS: Lazy<HashMap<String, &'static str>> = Lazy::new(|| {
    let mut operators = HashMap::new();
    let mut add = |left: &str, op: &str, right: &str, result: &'static str| {
        operators.insert(format!("{left} {op} {right}"), result);
    };

    for left in NUMERICS {
        for right in NUMERICS {
            let result = promote(left, right);
            for op in ["+", "-", "*", "/"] {
                add(left, op, right, result);
            }
            let power = if result == "numeric" { "numeric" } else { "float8" };
            add(left, "^", right, power);
            if !result.starts_with("float") {
                add(left, "%", right, result);
            }
        }
    }

    for left in INTEGERS {
        for right in INTEGERS {
            let result = promote(left, right);
            for op in ["&", "|", "#"] {
                add(left, op, right, result);
            }
        }
        for op in ["<<", ">>"] {
            add(left, op, "int4", promote(left, "int2"));
        }
    }

    for left in TEXT_LIKE {
        for right in TEXT_LIKE {
            add(left, "||", right, "text");
            for op in PATTERN_MATCHES {
                add(left, op, right, "bool");
            }
        }
    }

    for json in ["json", "jsonb"] {
        for key in ["text", "int4"] {
            add(json, "->", key, json);
            add(json, "->>", key, "text");
        }
        add(json, "#>", "_text", json);
        add(json, "#>>", "_text", "text");
    }
    for op in ["@>", "<@"] {
        add("jsonb", op, "jsonb", "bool");
    }
    add("jsonb", "?", "text", "bool");
    add("jsonb", "?|", "_text", "bool");
    add("jsonb", "?&", "_text", "bool");
    add("jsonb", "||", "jsonb", "jsonb");
    add("jsonb", "-", "text", "jsonb");
    add("jsonb", "-", "int4", "jsonb");
    add("jsonb", "#-", "_text", "jsonb");
    add("jsonb", "@?", "jsonpath", "bool");
    add("jsonb", "@@", "jsonpath", "bool");

    add("date", "+", "int4", "date");
    add("date", "-", "int4", "date");
    add("date", "-", "date", "int4");
    add("date", "+", "interval", "timestamp");
    add("date", "-", "interval", "timestamp");
    add("date", "+", "time", "timestamp");
    for ts in ["timestamp", "timestamptz"] {
        add(ts, "+", "interval", ts);
        add(ts, "-", "interval", ts);
        add("interval", "+", ts, ts);
        add(ts, "-", ts, "interval");
    }
    add("interval", "+", "interval", "interval");
    add("interval", "-", "interval", "interval");
    for number in ["int4", "int8", "float8", "numeric"] {
        add("interval", "*", number, "interval");
        add(number, "*", "interval", "interval");
        add("interval", "/", number, "interval");
    }
    add("time", "+", "interval", "time");
    add("time", "-", "interval", "time");
    add("time", "-", "time", "interval");

    add("inet", "<<", "inet", "bool");
    add("inet", ">>", "inet", "bool");
    add("tsvector", "@@", "tsquery", "bool");

    operators
});

/// Result type of prefix operators.
fn prefix_result(op: &str, operand: &str) -> Option<String> {
    match op {
        "-" | "+" | "@" if NUMERICS.contains(&operand) => Some(operand.to_string()),
        "-" if operand == "interval" => Some("interval".to_string()),
        "~" if INTEGERS.contains(&operand) => Some(operand.to_string()),
        "|/" | "||/" => Some("float8".to_string()),
        _ => None,
    }
}

/// Canonical key of an operand type name for the operator table.
pub fn operand_key(pg_type: &str) -> String {
    match pg_type {
        "varchar" | "bpchar" | "name" | "citext" | "char" | "unknown" => "text".to_string(),
        other => other.to_string(),
    }
}

/// Result type of `left op right` (or of a prefix operator when `left` is `None`).
pub fn operator_result(left: Option<&str>, op: &str, right: &str) -> Option<String> {
    let right = operand_key(right);
    let Some(left) = left else {
        return prefix_result(op, &right);
    };
    let left = operand_key(left);

    if let Some(result) = OPERATORS.get(&format!("{left} {op} {right}")) {
        return Some(result.to_string());
    }

    let left_array = left.starts_with('_');
    let right_array = right.starts_with('_');
    match op {
        _ if COMPARISONS.contains(&op) => Some("bool".to_string()),
        "@>" | "<@" | "&&" if left_array && right_array => Some("bool".to_string()),
        "||" if left_array => Some(left),
        "||" if right_array => Some(right),
        // anynonarray || text
        "||" if left == "text" || right == "text" => Some("text".to_string()),
        _ => None,
    }
}
