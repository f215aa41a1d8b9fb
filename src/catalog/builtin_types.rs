/// Standard `pg_type` oids for the builtin scalar types and their arrays.
pub const BUILTIN_TYPES: &[(u32, &str)] = &[
    (16, "bool"),
    (17, "bytea"),
    (18, "char"),
    (19, "name"),
    (20, "int8"),
    (21, "int2"),
    (23, "int4"),
    (25, "text"),
    (26, "oid"),
    (114, "json"),
    (142, "xml"),
    (650, "cidr"),
    (700, "float4"),
    (701, "float8"),
    (705, "unknown"),
    (790, "money"),
    (829, "macaddr"),
    (869, "inet"),
    (1042, "bpchar"),
    (1043, "varchar"),
    (1082, "date"),
    (1083, "time"),
    (1114, "timestamp"),
    (1184, "timestamptz"),
    (1186, "interval"),
    (1266, "timetz"),
    (1560, "bit"),
    (1562, "varbit"),
    (1700, "numeric"),
    (2249, "record"),
    (2278, "void"),
    (2950, "uuid"),
    (3802, "jsonb"),
    (143, "_xml"),
    (199, "_json"),
    (651, "_cidr"),
    (791, "_money"),
    (1000, "_bool"),
    (1001, "_bytea"),
    (1002, "_char"),
    (1003, "_name"),
    (1005, "_int2"),
    (1007, "_int4"),
    (1009, "_text"),
    (1014, "_bpchar"),
    (1015, "_varchar"),
    (1016, "_int8"),
    (1021, "_float4"),
    (1022, "_float8"),
    (1028, "_oid"),
    (1040, "_macaddr"),
    (1041, "_inet"),
    (1115, "_timestamp"),
    (1182, "_date"),
    (1183, "_time"),
    (1185, "_timestamptz"),
    (1187, "_interval"),
    (1231, "_numeric"),
    (1270, "_timetz"),
    (1561, "_bit"),
    (1563, "_varbit"),
    (2951, "_uuid"),
    (3807, "_jsonb"),
];

/// Canonical `pg_type` name for the spellings SQL allows in a cast.
pub fn normalize_type_name(name: &str) -> &str {
    match name {
        "int" | "integer" => "int4",
        "smallint" => "int2",
        "bigint" => "int8",
        "real" => "float4",
        "double precision" | "float" => "float8",
        "boolean" => "bool",
        "decimal" => "numeric",
        "character varying" => "varchar",
        "character" => "bpchar",
        "timestamp with time zone" => "timestamptz",
        "timestamp without time zone" => "timestamp",
        "time with time zone" => "timetz",
        "time without time zone" => "time",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_array_type_has_its_element() {
        for (_, name) in BUILTIN_TYPES.iter().filter(|(_, name)| name.starts_with('_')) {
            let element = &name[1..];
            assert!(
                BUILTIN_TYPES.iter().any(|(_, n)| *n == element),
                "array type {name} without element type"
            );
        }
    }

    #[test]
    fn sql_spellings_normalize() {
        assert_eq!(normalize_type_name("integer"), "int4");
        assert_eq!(normalize_type_name("double precision"), "float8");
        assert_eq!(normalize_type_name("citext"), "citext");
    }
}
