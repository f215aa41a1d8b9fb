use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{BUILTIN_TYPES, CatalogError};

/// One column of a user table, as read from `pg_attribute`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnRow {
    pub table_oid: u32,
    pub schema_name: String,
    pub table_name: String,
    pub col_name: String,
    /// Type oid, resolved through [`CatalogSnapshot::types`].
    pub col_type: u32,
    pub col_num: i32,
    pub col_has_def: bool,
    pub col_not_null: bool,
    /// `''`, `'a'` (ALWAYS) or `'d'` (BY DEFAULT).
    pub col_identity: String,
    /// `''` or `'s'` (stored generated column).
    pub col_generated: String,
}

impl ColumnRow {
    pub fn is_identity(&self) -> bool {
        !self.col_identity.is_empty()
    }

    pub fn is_generated(&self) -> bool {
        !self.col_generated.is_empty()
    }

    /// An INSERT must supply a value for this column.
    pub fn is_required(&self) -> bool {
        self.col_not_null && !self.col_has_def && !self.is_identity() && !self.is_generated()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnumRow {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainRow {
    pub name: String,
    /// Name of the underlying type.
    pub base: String,
}

/// Return type of a catalog function, keyed by `name(argtype,argtype)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionSignature {
    pub pg: String,
    pub ts: Option<String>,
}

/// A table found by [`CatalogSnapshot::find_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRef<'a> {
    pub oid: u32,
    pub schema: &'a str,
    pub name: &'a str,
    pub columns: &'a [ColumnRow],
}

impl<'a> TableRef<'a> {
    pub fn column(&self, name: &str) -> Option<&'a ColumnRow> {
        self.columns.iter().find(|col| col.col_name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSnapshot {
    pub types: IndexMap<u32, String>,
    pub columns: IndexMap<u32, Vec<ColumnRow>>,
    pub enums: IndexMap<u32, EnumRow>,
    pub domains: IndexMap<u32, DomainRow>,
    pub functions: IndexMap<String, FunctionSignature>,
}

impl CatalogSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtin_types() -> Self {
        let mut snapshot = Self::new();
        for (oid, name) in BUILTIN_TYPES {
            snapshot.types.insert(*oid, (*name).to_string());
        }
        snapshot
    }

    pub fn add_type(&mut self, oid: u32, name: &str) -> &mut Self {
        self.types.insert(oid, name.to_string());
        self
    }

    /// Registers an enum type together with its `pg_type` row.
    pub fn add_enum(&mut self, oid: u32, name: &str, values: &[&str]) -> &mut Self {
        self.types.insert(oid, name.to_string());
        self.enums.insert(
            oid,
            EnumRow { name: name.to_string(), values: values.iter().map(|v| v.to_string()).collect() },
        );
        self
    }

    pub fn add_domain(&mut self, oid: u32, name: &str, base: &str) -> &mut Self {
        self.types.insert(oid, name.to_string());
        self.domains.insert(oid, DomainRow { name: name.to_string(), base: base.to_string() });
        self
    }

    /// Adds (or replaces) a table; the rows' table fields are filled in.
    pub fn add_table(&mut self, oid: u32, schema: &str, table: &str, mut rows: Vec<ColumnRow>) -> &mut Self {
        for (idx, row) in rows.iter_mut().enumerate() {
            row.table_oid = oid;
            row.schema_name = schema.to_string();
            row.table_name = table.to_string();
            if row.col_num == 0 {
                row.col_num = idx as i32 + 1;
            }
        }
        self.columns.insert(oid, rows);
        self
    }

    pub fn add_function(&mut self, signature: &str, pg: &str) -> &mut Self {
        self.functions.insert(signature.to_string(), FunctionSignature { pg: pg.to_string(), ts: None });
        self
    }

    pub fn type_name(&self, oid: u32) -> Option<&str> {
        self.types.get(&oid).map(String::as_str)
    }

    pub fn column_type_name<'a>(&'a self, column: &ColumnRow) -> &'a str {
        self.type_name(column.col_type).unwrap_or("unknown")
    }

    pub fn enum_by_name(&self, name: &str) -> Option<&EnumRow> {
        self.enums.values().find(|row| row.name == name)
    }

    pub fn domain_by_name(&self, name: &str) -> Option<&DomainRow> {
        self.domains.values().find(|row| row.name == name)
    }

    pub fn function(&self, signature: &str) -> Option<&FunctionSignature> {
        self.functions.get(signature)
    }

    /// Finds a table by name. Without a schema, `public` wins over other schemas.
    pub fn find_table(&self, schema: Option<&str>, name: &str) -> Option<TableRef<'_>> {
        let tables = self.columns.iter().filter_map(|(oid, rows)| {
            let first = rows.first()?;
            (first.table_name == name).then_some(TableRef {
                oid: *oid,
                schema: &first.schema_name,
                name: &first.table_name,
                columns: rows,
            })
        });

        match schema {
            Some(schema) => tables.filter(|table| table.schema == schema).next(),
            None => {
                let candidates: Vec<TableRef<'_>> = tables.collect();
                candidates
                    .iter()
                    .find(|table| table.schema == "public")
                    .or_else(|| candidates.first())
                    .copied()
            }
        }
    }

    pub async fn load_from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let snapshot_error = |message: String| CatalogError::Snapshot { path: path.display().to_string(), message };

        let content = tokio::fs::read_to_string(path).await.map_err(|err| snapshot_error(err.to_string()))?;
        let snapshot: Self = serde_json::from_str(&content).map_err(|err| snapshot_error(err.to_string()))?;

        debug!(path = %path.display(), tables = snapshot.columns.len(), "catalog snapshot loaded");
        Ok(snapshot)
    }

    pub async fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), CatalogError> {
        let path = path.as_ref();
        let snapshot_error = |message: String| CatalogError::Snapshot { path: path.display().to_string(), message };

        let content = serde_json::to_string_pretty(self).map_err(|err| snapshot_error(err.to_string()))?;
        tokio::fs::write(path, content).await.map_err(|err| snapshot_error(err.to_string()))
    }
}

/// Shorthand for building a [`ColumnRow`] in catalogs assembled by hand.
pub fn column(name: &str, col_type: u32, not_null: bool) -> ColumnRow {
    ColumnRow { col_name: name.to_string(), col_type, col_not_null: not_null, ..Default::default() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn snapshot() -> CatalogSnapshot {
        let mut snapshot = CatalogSnapshot::with_builtin_types();
        snapshot
            .add_table(90001, "audit", "users", vec![column("id", 23, true)])
            .add_table(90002, "public", "users", vec![column("id", 23, true), column("name", 25, false)])
            .add_enum(90100, "mood", &["sad", "ok", "happy"]);
        snapshot
    }

    #[test]
    fn find_table_prefers_public() {
        let snapshot = snapshot();
        let users = snapshot.find_table(None, "users").expect("users");
        assert_eq!(users.schema, "public");
        assert_eq!(users.columns.len(), 2);

        let audit = snapshot.find_table(Some("audit"), "users").expect("audit.users");
        assert_eq!(audit.oid, 90001);
        assert!(snapshot.find_table(Some("other"), "users").is_none());
    }

    #[test]
    fn find_table_falls_back_to_any_schema() {
        let mut snapshot = CatalogSnapshot::with_builtin_types();
        snapshot.add_table(1, "reporting", "events", vec![column("at", 1184, true)]);
        let events = snapshot.find_table(None, "events").expect("events");
        assert_eq!(events.schema, "reporting");
        assert_eq!(events.column("at").map(|c| c.col_num), Some(1));
    }

    #[test]
    fn required_columns_exclude_defaults_identity_and_generated() {
        let mut row = column("id", 23, true);
        assert!(row.is_required());
        row.col_identity = "a".into();
        assert!(!row.is_required());

        let mut generated = column("total", 23, true);
        generated.col_generated = "s".into();
        assert!(!generated.is_required());
    }

    #[test]
    fn enum_registers_its_type_name() {
        let snapshot = snapshot();
        assert_eq!(snapshot.type_name(90100), Some("mood"));
        assert_eq!(snapshot.enum_by_name("mood").map(|e| e.values.len()), Some(3));
    }

    #[tokio::test]
    async fn snapshot_survives_a_file_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("catalog.json");

        let original = snapshot();
        original.save_to_file(&path).await.unwrap();
        let loaded = CatalogSnapshot::load_from_file(&path).await.unwrap();
        assert_eq!(loaded, original);
    }

    #[tokio::test]
    async fn missing_file_is_a_snapshot_error() {
        let tmp = TempDir::new().unwrap();
        let err = CatalogSnapshot::load_from_file(tmp.path().join("nope.json")).await.unwrap_err();
        assert!(matches!(err, CatalogError::Snapshot { .. }));
    }
}
