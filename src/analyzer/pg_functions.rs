use std::collections::HashMap;

use once_cell::sync::Lazy;

/// How a builtin's result type follows from its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnRule {
    Fixed(&'static str),
    /// Same type as the argument at this position.
    Arg(usize),
    /// `sum`: small ints widen to int8, int8 to numeric.
    Sum,
    /// `avg` and friends: integers and numeric give numeric, floats float8.
    Avg,
    /// Numeric stays numeric, everything else becomes float8.
    FloatOrNumeric,
    ArrayOf(usize),
    ElementOf(usize),
}

/// What a builtin returns when it is handed nulls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullBehavior {
    /// Never returns null.
    NeverNull,
    /// Null exactly when some argument is null.
    Strict,
    /// May return null for non-null arguments.
    Nullable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PgFunction {
    pub returns: ReturnRule,
    pub nulls: NullBehavior,
    pub aggregate: bool,
}

impl PgFunction {
    const fn scalar(returns: ReturnRule, nulls: NullBehavior) -> Self {
        Self { returns, nulls, aggregate: false }
    }

    const fn aggregate(returns: ReturnRule, nulls: NullBehavior) -> Self {
        Self { returns, nulls, aggregate: true }
    }
}

pub static PG_FUNCTIONS: Lazy<HashMap<&'static str, PgFunction>> = Lazy::new(|| {
    use NullBehavior::*;
    use ReturnRule::*;

    let mut functions = HashMap::new();
    let mut add = |names: &[&'static str], function: PgFunction| {
        for name in names {
            functions.insert(*name, function);
        }
    };

    // aggregates
    add(&["count"], PgFunction::aggregate(Fixed("int8"), NeverNull));
    add(&["sum"], PgFunction::aggregate(Sum, Nullable));
    add(&["avg", "stddev", "stddev_pop", "stddev_samp", "variance", "var_pop", "var_samp"], PgFunction::aggregate(Avg, Nullable));
    add(&["min", "max", "bit_and", "bit_or", "any_value"], PgFunction::aggregate(Arg(0), Nullable));
    add(&["array_agg"], PgFunction::aggregate(ArrayOf(0), Nullable));
    add(&["json_agg", "json_object_agg"], PgFunction::aggregate(Fixed("json"), Nullable));
    add(&["jsonb_agg", "jsonb_object_agg"], PgFunction::aggregate(Fixed("jsonb"), Nullable));
    add(&["string_agg"], PgFunction::aggregate(Fixed("text"), Nullable));
    add(&["bool_and", "bool_or", "every"], PgFunction::aggregate(Fixed("bool"), Nullable));

    // window functions
    add(&["row_number", "rank", "dense_rank"], PgFunction::scalar(Fixed("int8"), NeverNull));
    add(&["ntile"], PgFunction::scalar(Fixed("int4"), Strict));
    add(&["percent_rank", "cume_dist"], PgFunction::scalar(Fixed("float8"), NeverNull));
    add(&["lag", "lead", "first_value", "last_value", "nth_value"], PgFunction::scalar(Arg(0), Nullable));

    // date and time
    add(
        &["now", "clock_timestamp", "statement_timestamp", "transaction_timestamp"],
        PgFunction::scalar(Fixed("timestamptz"), NeverNull),
    );
    add(&["to_timestamp"], PgFunction::scalar(Fixed("timestamptz"), Strict));
    add(&["to_date", "make_date"], PgFunction::scalar(Fixed("date"), Strict));
    add(&["date_trunc"], PgFunction::scalar(Arg(1), Strict));
    add(&["date_part"], PgFunction::scalar(Fixed("float8"), Strict));
    add(&["extract"], PgFunction::scalar(Fixed("numeric"), Strict));
    add(&["age", "make_interval", "justify_days", "justify_hours", "justify_interval"], PgFunction::scalar(Fixed("interval"), Strict));
    add(&["timeofday"], PgFunction::scalar(Fixed("text"), NeverNull));

    // math
    add(&["abs", "ceil", "ceiling", "floor", "sign", "mod", "trunc", "gcd", "lcm"], PgFunction::scalar(Arg(0), Strict));
    add(&["round"], PgFunction::scalar(Avg, Strict));
    add(
        &["sqrt", "cbrt", "exp", "ln", "log", "log10", "power", "pow", "degrees", "radians"],
        PgFunction::scalar(FloatOrNumeric, Strict),
    );
    add(
        &["sin", "cos", "tan", "cot", "asin", "acos", "atan", "atan2", "sinh", "cosh", "tanh"],
        PgFunction::scalar(Fixed("float8"), Strict),
    );
    add(&["pi", "random"], PgFunction::scalar(Fixed("float8"), NeverNull));
    add(&["width_bucket"], PgFunction::scalar(Fixed("int4"), Strict));

    // strings
    add(
        &[
            "lower", "upper", "initcap", "trim", "btrim", "ltrim", "rtrim", "substr", "substring", "replace",
            "reverse", "left", "right", "lpad", "rpad", "repeat", "md5", "split_part", "translate", "to_char",
            "quote_ident", "quote_literal", "chr", "regexp_replace", "encode", "array_to_string", "overlay",
            "to_hex", "sha256",
        ],
        PgFunction::scalar(Fixed("text"), Strict),
    );
    add(&["concat", "concat_ws", "quote_nullable"], PgFunction::scalar(Fixed("text"), NeverNull));
    add(&["format"], PgFunction::scalar(Fixed("text"), Nullable));
    add(
        &["length", "char_length", "character_length", "octet_length", "bit_length", "position", "strpos", "ascii"],
        PgFunction::scalar(Fixed("int4"), Strict),
    );
    add(&["starts_with"], PgFunction::scalar(Fixed("bool"), Strict));
    add(&["similar_to_escape"], PgFunction::scalar(Fixed("text"), Strict));
    add(&["decode"], PgFunction::scalar(Fixed("bytea"), Strict));
    add(&["string_to_array", "regexp_split_to_array"], PgFunction::scalar(Fixed("_text"), Strict));
    add(&["regexp_match", "regexp_matches"], PgFunction::scalar(Fixed("_text"), Nullable));

    // json
    add(&["to_json", "row_to_json", "array_to_json"], PgFunction::scalar(Fixed("json"), Strict));
    add(&["to_jsonb", "jsonb_set", "jsonb_insert", "jsonb_strip_nulls"], PgFunction::scalar(Fixed("jsonb"), Strict));
    add(&["json_build_array"], PgFunction::scalar(Fixed("json"), NeverNull));
    add(&["jsonb_build_array"], PgFunction::scalar(Fixed("jsonb"), NeverNull));
    add(&["json_build_object"], PgFunction::scalar(Fixed("json"), NeverNull));
    add(&["jsonb_build_object"], PgFunction::scalar(Fixed("jsonb"), NeverNull));
    add(&["json_extract_path"], PgFunction::scalar(Fixed("json"), Nullable));
    add(&["jsonb_extract_path", "jsonb_path_query_first"], PgFunction::scalar(Fixed("jsonb"), Nullable));
    add(&["json_extract_path_text", "jsonb_extract_path_text"], PgFunction::scalar(Fixed("text"), Nullable));
    add(&["json_typeof", "jsonb_typeof", "jsonb_pretty"], PgFunction::scalar(Fixed("text"), Strict));
    add(&["json_array_length", "jsonb_array_length"], PgFunction::scalar(Fixed("int4"), Strict));
    add(&["jsonb_path_exists"], PgFunction::scalar(Fixed("bool"), Strict));

    // arrays
    add(&["array_length", "array_upper", "array_lower", "array_position"], PgFunction::scalar(Fixed("int4"), Nullable));
    add(&["cardinality", "array_ndims"], PgFunction::scalar(Fixed("int4"), Strict));
    add(&["array_append", "array_cat", "array_remove", "array_replace"], PgFunction::scalar(Arg(0), Nullable));
    add(&["array_prepend"], PgFunction::scalar(Arg(1), Nullable));
    add(&["unnest"], PgFunction::scalar(ElementOf(0), Nullable));
    add(&["generate_series"], PgFunction::scalar(Arg(0), NeverNull));

    // system
    add(&["gen_random_uuid", "uuid_generate_v4"], PgFunction::scalar(Fixed("uuid"), NeverNull));
    add(&["version", "current_database", "current_setting"], PgFunction::scalar(Fixed("text"), NeverNull));
    add(&["pg_backend_pid"], PgFunction::scalar(Fixed("int4"), NeverNull));
    add(&["txid_current"], PgFunction::scalar(Fixed("int8"), NeverNull));
    add(&["nextval", "currval", "setval"], PgFunction::scalar(Fixed("int8"), NeverNull));
    add(&["pg_typeof"], PgFunction::scalar(Fixed("regtype"), NeverNull));

    functions
});

pub fn lookup(name: &str) -> Option<&'static PgFunction> {
    PG_FUNCTIONS.get(name)
}

/// Result type name for a rule, given the argument type names.
pub fn result_type(rule: ReturnRule, args: &[String]) -> Option<String> {
    let arg = |idx: usize| args.get(idx).map(String::as_str);

    let name = match rule {
        ReturnRule::Fixed(name) => name.to_string(),
        ReturnRule::Arg(idx) => arg(idx)?.to_string(),
        ReturnRule::Sum => match arg(0)? {
            "int2" | "int4" => "int8".to_string(),
            "int8" => "numeric".to_string(),
            other => other.to_string(),
        },
        ReturnRule::Avg => match arg(0)? {
            "float4" | "float8" => "float8".to_string(),
            "interval" => "interval".to_string(),
            _ => "numeric".to_string(),
        },
        ReturnRule::FloatOrNumeric => match arg(0)? {
            "numeric" => "numeric".to_string(),
            _ => "float8".to_string(),
        },
        ReturnRule::ArrayOf(idx) => format!("_{}", arg(idx)?),
        ReturnRule::ElementOf(idx) => arg(idx)?.strip_prefix('_')?.to_string(),
    };
    Some(name)
}
