use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A user-supplied TypeScript type for a PostgreSQL type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeOverride {
    Plain(String),
    /// Different spellings for query parameters and for results.
    Split {
        parameter: String,
        #[serde(rename = "return")]
        result: String,
    },
}

impl TypeOverride {
    /// The spelling used for result columns.
    pub fn result_type(&self) -> &str {
        match self {
            TypeOverride::Plain(ts) => ts,
            TypeOverride::Split { result, .. } => result,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Overrides {
    /// Keyed by pg type name, or by `/pattern/` for a regex match.
    pub types: IndexMap<String, TypeOverride>,
    /// Keyed by `table.column`.
    pub columns: IndexMap<String, String>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, pg_type: &str, ts: &str) -> Self {
        self.types.insert(pg_type.to_string(), TypeOverride::Plain(ts.to_string()));
        self
    }

    pub fn with_column(mut self, table_column: &str, ts: &str) -> Self {
        self.columns.insert(table_column.to_string(), ts.to_string());
        self
    }

    pub fn column(&self, table: &str, column: &str) -> Option<&str> {
        self.columns.get(&format!("{table}.{column}")).map(String::as_str)
    }

    pub fn compile(&self) -> CompiledTypeOverrides {
        let mut compiled = CompiledTypeOverrides::default();

        for (key, value) in &self.types {
            let pattern = key.strip_prefix('/').and_then(|rest| rest.strip_suffix('/'));
            match pattern {
                Some(pattern) => match Regex::new(pattern) {
                    Ok(regex) => compiled.patterns.push((regex, value.result_type().to_string())),
                    Err(err) => warn!(pattern, error = %err, "ignoring invalid type override pattern"),
                },
                None => {
                    compiled.exact.insert(key.clone(), value.result_type().to_string());
                }
            }
        }

        compiled
    }
}

/// Type overrides with their `/pattern/` keys compiled.
#[derive(Debug, Clone, Default)]
pub struct CompiledTypeOverrides {
    exact: IndexMap<String, String>,
    patterns: Vec<(Regex, String)>,
}

impl CompiledTypeOverrides {
    /// Exact keys win over patterns; patterns are tried in declaration order.
    pub fn lookup(&self, pg_type: &str) -> Option<&str> {
        if let Some(ts) = self.exact.get(pg_type) {
            return Some(ts);
        }
        self.patterns.iter().find(|(regex, _)| regex.is_match(pg_type)).map(|(_, ts)| ts.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn exact_keys_win_over_patterns() {
        let overrides: Overrides = serde_json::from_value(json!({
            "types": {
                "/^int/": "bigint",
                "int4": "number",
                "date": {"parameter": "Date | string", "return": "string"}
            }
        }))
        .unwrap();
        let compiled = overrides.compile();

        assert_eq!(compiled.lookup("int4"), Some("number"));
        assert_eq!(compiled.lookup("int8"), Some("bigint"));
        assert_eq!(compiled.lookup("date"), Some("string"));
        assert_eq!(compiled.lookup("text"), None);
    }

    #[test]
    fn invalid_patterns_are_skipped() {
        let compiled = Overrides::new().with_type("/(/", "never").compile();
        assert!(compiled.is_empty());
    }

    #[test]
    fn column_overrides_use_table_dot_column() {
        let overrides = Overrides::new().with_column("users.settings", "UserSettings");
        assert_eq!(overrides.column("users", "settings"), Some("UserSettings"));
        assert_eq!(overrides.column("users", "id"), None);
    }
}
