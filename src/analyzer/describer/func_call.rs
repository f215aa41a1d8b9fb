use tracing::{trace, warn};

use super::operand_type;
use crate::{
    analyzer::{
        AstDescriber, DescribedType, NullBehavior, ReturnRule, SourcesResolver, pg_functions, row_object,
        to_json_context,
    },
    ast::{ConstValue, FuncCall, Node},
    error::InvalidQueryError,
};

impl AstDescriber<'_> {
    pub(crate) fn describe_func_call(&self, call: &FuncCall, scope: &SourcesResolver<'_>) -> Result<DescribedType, InvalidQueryError> {
        let name = call.name();
        trace!(function = %name, args = call.args.len(), "describing function call");

        match name.as_str() {
            "json_build_object" | "jsonb_build_object" => self.describe_build_object(call, scope),
            "json_agg" | "jsonb_agg" | "array_agg" => self.describe_collecting_agg(&name, call, scope),
            "row_to_json" | "to_json" | "to_jsonb" => match call.args.first().and_then(|arg| self.whole_row(arg, scope)) {
                Some(columns) => Ok(to_json_context(row_object(&columns))),
                None => self.describe_by_signature(&name, call, scope),
            },
            _ => self.describe_by_signature(&name, call, scope),
        }
    }

    /// Alternating constant keys and values; PostgreSQL rejects an odd count at runtime.
    fn describe_build_object(&self, call: &FuncCall, scope: &SourcesResolver<'_>) -> Result<DescribedType, InvalidQueryError> {
        if call.args.len() % 2 != 0 {
            return Err(InvalidQueryError::new("argument list must have even number of elements", Some("FuncCall")));
        }

        let mut fields = Vec::with_capacity(call.args.len() / 2);
        for pair in call.args.chunks(2) {
            let key = match &pair[0] {
                Node::AConst(value) => match value.value() {
                    ConstValue::String(key) => Some(key.to_string()),
                    ConstValue::Integer(key) => Some(key.to_string()),
                    _ => None,
                },
                _ => None,
            };
            let Some(key) = key else {
                trace!("non-constant json object key, falling back to plain json");
                return Ok(self.mapper().from_name("json"));
            };
            let value = to_json_context(self.describe_expr(&pair[1], scope)?);
            fields.push((key, value));
        }

        Ok(DescribedType::Object(fields))
    }

    /// `json_agg`, `jsonb_agg` and `array_agg`: an array of the argument, or of
    /// row objects when the argument is a whole row.
    fn describe_collecting_agg(&self, name: &str, call: &FuncCall, scope: &SourcesResolver<'_>) -> Result<DescribedType, InvalidQueryError> {
        let Some(arg) = call.args.first() else {
            return Ok(DescribedType::unknown().with_null());
        };

        let element = match self.whole_row(arg, scope) {
            Some(columns) => row_object(&columns),
            None => self.describe_expr(arg, scope)?.widen(),
        };
        let element = if name == "array_agg" { element } else { to_json_context(element) };

        let non_null = aggregate_has_rows(call, scope);
        Ok(DescribedType::array(element).with_nullability(!non_null))
    }

    /// Catalog signature first, then the builtin table, else `unknown | null`.
    fn describe_by_signature(&self, name: &str, call: &FuncCall, scope: &SourcesResolver<'_>) -> Result<DescribedType, InvalidQueryError> {
        let args = self.describe_all(&call.args, scope)?;
        let arg_types: Vec<String> = args.iter().map(operand_type).collect();
        let any_nullable = args.iter().any(DescribedType::is_nullable);

        let signature = format!("{name}({})", arg_types.join(","));
        if let Some(function) = self.mapper().catalog().function(&signature) {
            let ty = match &function.ts {
                Some(ts) => DescribedType::primitive(ts, &function.pg),
                None => self.mapper().from_name(&function.pg),
            };
            return Ok(ty.with_null());
        }

        let Some(function) = pg_functions::lookup(name) else {
            warn!(%signature, "unknown function, described as unknown");
            return Ok(DescribedType::unknown().with_null());
        };

        let Some(ty) = self.builtin_result(function.returns, &args, &arg_types) else {
            warn!(%signature, "builtin function with unusable arguments, described as unknown");
            return Ok(DescribedType::unknown().with_null());
        };

        let nullable = if name == "count" {
            false
        } else if function.aggregate {
            !(aggregate_has_rows(call, scope) && !any_nullable)
        } else {
            match function.nulls {
                NullBehavior::NeverNull => false,
                NullBehavior::Strict => any_nullable,
                NullBehavior::Nullable => true,
            }
        };

        Ok(ty.with_nullability(nullable))
    }

    fn builtin_result(&self, rule: ReturnRule, args: &[DescribedType], arg_types: &[String]) -> Option<DescribedType> {
        let arg = |idx: usize| args.get(idx).map(|ty| ty.without_null().widen());
        match rule {
            ReturnRule::Arg(idx) => arg(idx),
            ReturnRule::ArrayOf(idx) => arg(idx).map(DescribedType::array),
            ReturnRule::ElementOf(idx) => match arg(idx)? {
                DescribedType::Array(element) => Some(*element),
                _ => None,
            },
            _ => pg_functions::result_type(rule, arg_types).map(|name| self.mapper().from_name(&name)),
        }
    }
}

/// An aggregate sees at least one row: it runs per group or per window, with
/// no FILTER that could drop every row.
fn aggregate_has_rows(call: &FuncCall, scope: &SourcesResolver<'_>) -> bool {
    (scope.is_grouped() || call.over.is_some()) && call.agg_filter.is_none()
}
