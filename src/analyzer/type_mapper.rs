use crate::{
    analyzer::DescribedType,
    catalog::{CatalogSnapshot, ColumnRow, normalize_type_name},
    config::{CompiledTypeOverrides, Overrides},
};

/// Single-quoted TypeScript string literal for `value`.
pub fn string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Default TypeScript spelling of a builtin PostgreSQL type.
pub fn default_ts_type(pg_type: &str) -> Option<&'static str> {
    let ts = match pg_type {
        "int2" | "int4" | "oid" | "float4" | "float8" => "number",
        "int8" | "numeric" | "money" => "string",
        "text" | "varchar" | "bpchar" | "char" | "name" | "citext" | "uuid" | "time" | "timetz"
        | "interval" | "inet" | "cidr" | "macaddr" | "xml" | "bit" | "varbit" => "string",
        "bool" => "boolean",
        "date" | "timestamp" | "timestamptz" => "Date",
        "json" | "jsonb" => "any",
        "bytea" => "Buffer",
        "void" => "void",
        "null" => "null",
        _ => return None,
    };
    Some(ts)
}

/// Resolves PostgreSQL type names to [`DescribedType`]s against a catalog.
pub struct TypeMapper<'a> {
    catalog: &'a CatalogSnapshot,
    overrides: CompiledTypeOverrides,
}

impl<'a> TypeMapper<'a> {
    pub fn new(catalog: &'a CatalogSnapshot, overrides: &Overrides) -> Self {
        Self { catalog, overrides: overrides.compile() }
    }

    pub fn catalog(&self) -> &'a CatalogSnapshot {
        self.catalog
    }

    /// Non-null type for a type name: override, array, enum, domain, builtin.
    pub fn from_name(&self, pg_type: &str) -> DescribedType {
        let pg_type = normalize_type_name(pg_type);

        if let Some(ts) = self.overrides.lookup(pg_type) {
            return DescribedType::primitive(ts, pg_type);
        }

        if let Some(element) = pg_type.strip_prefix('_') {
            return DescribedType::array(self.from_name(element));
        }

        if let Some(row) = self.catalog.enum_by_name(pg_type) {
            let base = DescribedType::primitive("string", pg_type);
            let members = row
                .values
                .iter()
                .map(|value| DescribedType::literal(string_literal(value), base.clone()))
                .collect();
            return DescribedType::Union(members);
        }

        if let Some(domain) = self.catalog.domain_by_name(pg_type) {
            let value = match self.from_name(&domain.base) {
                DescribedType::Type { value, .. } => value,
                _ => "unknown".to_string(),
            };
            return DescribedType::Type { value, pg_type: pg_type.to_string(), base: Some(domain.base.clone()) };
        }

        match default_ts_type(pg_type) {
            Some(ts) => DescribedType::primitive(ts, pg_type),
            None => DescribedType::primitive("unknown", pg_type),
        }
    }

    pub fn from_oid(&self, oid: u32) -> DescribedType {
        match self.catalog.type_name(oid) {
            Some(name) => self.from_name(name),
            None => DescribedType::unknown(),
        }
    }

    /// Catalog-declared type of a column, null-extended unless NOT NULL.
    pub fn column_type(&self, column: &ColumnRow) -> DescribedType {
        self.from_name(self.catalog.column_type_name(column)).with_nullability(!column.col_not_null)
    }
}

/// Rewrites a type the way PostgreSQL serializes it inside json/jsonb.
pub fn to_json_context(ty: DescribedType) -> DescribedType {
    match ty {
        DescribedType::Type { value, pg_type, base } => {
            let kind = base.as_deref().unwrap_or(&pg_type);
            let value = match kind {
                "date" | "timestamp" | "timestamptz" | "bytea" => "string".to_string(),
                "int8" | "numeric" => "number".to_string(),
                _ => value,
            };
            DescribedType::Type { value, pg_type, base }
        }
        DescribedType::Literal { value, base } => {
            DescribedType::Literal { value, base: Box::new(to_json_context(*base)) }
        }
        DescribedType::Union(members) => DescribedType::Union(members.into_iter().map(to_json_context).collect()),
        DescribedType::Array(element) => DescribedType::array(to_json_context(*element)),
        DescribedType::Object(fields) => {
            DescribedType::Object(fields.into_iter().map(|(key, ty)| (key, to_json_context(ty))).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::column;

    fn catalog() -> CatalogSnapshot {
        let mut catalog = CatalogSnapshot::with_builtin_types();
        catalog.add_enum(90100, "mood", &["sad", "ok", "happy"]).add_domain(90200, "phone", "text");
        catalog
    }

    #[test]
    fn builtin_defaults() {
        let catalog = catalog();
        let mapper = TypeMapper::new(&catalog, &Overrides::default());
        assert_eq!(mapper.from_name("int4"), DescribedType::primitive("number", "int4"));
        assert_eq!(mapper.from_name("int8"), DescribedType::primitive("string", "int8"));
        assert_eq!(mapper.from_name("timestamptz"), DescribedType::primitive("Date", "timestamptz"));
        assert_eq!(mapper.from_name("integer"), DescribedType::primitive("number", "int4"));
        assert_eq!(mapper.from_name("tsvector"), DescribedType::primitive("unknown", "tsvector"));
    }

    #[test]
    fn enums_keep_declaration_order() {
        let catalog = catalog();
        let mapper = TypeMapper::new(&catalog, &Overrides::default());
        let DescribedType::Union(members) = mapper.from_name("mood") else {
            panic!("enum should be a union");
        };
        let values: Vec<_> = members
            .iter()
            .map(|m| match m {
                DescribedType::Literal { value, .. } => value.as_str(),
                _ => "",
            })
            .collect();
        assert_eq!(values, vec!["'sad'", "'ok'", "'happy'"]);
    }

    #[test]
    fn enum_labels_with_quotes_render_as_valid_literals() {
        let mut catalog = catalog();
        catalog.add_enum(90300, "q", &["it's", "a\\b"]);
        let mapper = TypeMapper::new(&catalog, &Overrides::default());
        let ty = mapper.from_name("q");

        let rendered = crate::render::render_type(&ty, &Default::default());
        assert_eq!(rendered, "'it\\'s' | 'a\\\\b'");

        let comparison = crate::render::TypeComparator::compare("\"a\\\\b\" | 'it\\'s'", &rendered, None).unwrap();
        assert!(comparison.is_equal);
    }

    #[test]
    fn domains_map_through_their_base() {
        let catalog = catalog();
        let mapper = TypeMapper::new(&catalog, &Overrides::default());
        assert_eq!(
            mapper.from_name("phone"),
            DescribedType::Type { value: "string".into(), pg_type: "phone".into(), base: Some("text".into()) }
        );
    }

    #[test]
    fn overrides_apply_before_arrays_and_builtins() {
        let catalog = catalog();
        let overrides = Overrides::new().with_type("int8", "bigint").with_type("/^time/", "string");
        let mapper = TypeMapper::new(&catalog, &overrides);
        assert_eq!(mapper.from_name("int8"), DescribedType::primitive("bigint", "int8"));
        assert_eq!(mapper.from_name("_int8"), DescribedType::array(DescribedType::primitive("bigint", "int8")));
        assert_eq!(mapper.from_name("timestamptz"), DescribedType::primitive("string", "timestamptz"));
    }

    #[test]
    fn column_type_respects_not_null() {
        let catalog = catalog();
        let mapper = TypeMapper::new(&catalog, &Overrides::default());
        assert!(!mapper.column_type(&column("id", 23, true)).is_nullable());
        assert!(mapper.column_type(&column("bio", 25, false)).is_nullable());
    }

    #[test]
    fn json_context_stringifies_dates_and_numbers_big_ints() {
        let object = DescribedType::Object(vec![
            ("at".into(), DescribedType::primitive("Date", "timestamptz")),
            ("total".into(), DescribedType::primitive("string", "int8").with_null()),
        ]);
        assert_eq!(
            to_json_context(object),
            DescribedType::Object(vec![
                ("at".into(), DescribedType::primitive("string", "timestamptz")),
                ("total".into(), DescribedType::primitive("number", "int8").with_null()),
            ])
        );
    }
}
