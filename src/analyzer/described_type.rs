use crate::{config::RenderOptions, render::render_type};

/// Inferred shape of a query output value.
///
/// Nullability is carried only as a `null` member of a `Union`; there is no
/// separate flag.
#[derive(Debug, Clone, PartialEq)]
pub enum DescribedType {
    /// A primitive: `value` is the TypeScript spelling, `pg_type` the
    /// PostgreSQL type it came from and `base` the underlying type of a domain.
    Type { value: String, pg_type: String, base: Option<String> },
    /// A constant (`1`, `'foo'`) that widens to `base` when merged.
    Literal { value: String, base: Box<DescribedType> },
    Union(Vec<DescribedType>),
    Array(Box<DescribedType>),
    Object(Vec<(String, DescribedType)>),
}

impl DescribedType {
    pub fn primitive(value: &str, pg_type: &str) -> Self {
        DescribedType::Type { value: value.to_string(), pg_type: pg_type.to_string(), base: None }
    }

    pub fn null() -> Self {
        Self::primitive("null", "null")
    }

    pub fn unknown() -> Self {
        Self::primitive("unknown", "unknown")
    }

    pub fn literal(value: impl Into<String>, base: DescribedType) -> Self {
        DescribedType::Literal { value: value.into(), base: Box::new(base) }
    }

    pub fn array(element: DescribedType) -> Self {
        DescribedType::Array(Box::new(element))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DescribedType::Type { value, .. } if value == "null")
    }

    pub fn is_nullable(&self) -> bool {
        match self {
            DescribedType::Union(members) => members.iter().any(DescribedType::is_nullable),
            other => other.is_null(),
        }
    }

    /// `unknown` or `unknown | null`.
    pub fn is_unknown(&self) -> bool {
        matches!(self.without_null(), DescribedType::Type { value, .. } if value == "unknown")
    }

    pub fn with_null(self) -> Self {
        if self.is_nullable() {
            return self;
        }
        match self {
            DescribedType::Union(mut members) => {
                members.push(Self::null());
                DescribedType::Union(members)
            }
            other => DescribedType::Union(vec![other, Self::null()]),
        }
    }

    pub fn without_null(&self) -> DescribedType {
        match self {
            DescribedType::Union(members) => {
                let mut rest: Vec<DescribedType> = members.iter().filter(|m| !m.is_null()).cloned().collect();
                match rest.len() {
                    0 => self.clone(),
                    1 => rest.remove(0),
                    _ => DescribedType::Union(rest),
                }
            }
            other => other.clone(),
        }
    }

    /// Adds or strips the null member.
    pub fn with_nullability(self, nullable: bool) -> Self {
        if nullable { self.with_null() } else { self.without_null() }
    }

    /// A literal's base; anything else unchanged.
    pub fn widen(self) -> Self {
        match self {
            DescribedType::Literal { base, .. } => base.widen(),
            other => other,
        }
    }

    /// PostgreSQL type name of the non-null part, `_elem` for arrays.
    pub fn pg_type(&self) -> String {
        match self {
            DescribedType::Type { pg_type, .. } => pg_type.clone(),
            DescribedType::Literal { base, .. } => base.pg_type(),
            DescribedType::Array(element) => format!("_{}", element.pg_type()),
            DescribedType::Object(_) => "record".to_string(),
            DescribedType::Union(members) => members
                .iter()
                .find(|member| !member.is_null())
                .map(DescribedType::pg_type)
                .unwrap_or_else(|| "null".to_string()),
        }
    }

    /// Key used to keep union members unique: rendered text with one quote style.
    pub fn dedupe_key(&self) -> String {
        render_type(self, &RenderOptions::default()).replace('"', "'")
    }

    /// Merges sibling values (CASE branches, set-operation arms, array elements).
    ///
    /// Literals survive only when every non-null member is a literal of the
    /// same base type; otherwise each literal widens to its base.
    pub fn merge(types: impl IntoIterator<Item = DescribedType>) -> DescribedType {
        let mut flat = Vec::new();
        for ty in types {
            ty.flatten_into(&mut flat);
        }

        let has_null = flat.iter().any(DescribedType::is_null);
        let values: Vec<DescribedType> = flat.into_iter().filter(|ty| !ty.is_null()).collect();

        let mut literal_bases = values.iter().map(|ty| match ty {
            DescribedType::Literal { base, .. } => Some(base.pg_type()),
            _ => None,
        });
        let first_base = literal_bases.next().flatten();
        let keep_literals = first_base.is_some() && literal_bases.all(|base| base == first_base);

        let mut members = Vec::new();
        for value in values {
            let value = if keep_literals { value } else { value.widen() };
            push_unique(&mut members, value);
        }
        if has_null {
            push_unique(&mut members, Self::null());
        }

        match members.len() {
            0 => Self::unknown(),
            1 => members.remove(0),
            _ => DescribedType::Union(members),
        }
    }

    fn flatten_into(self, out: &mut Vec<DescribedType>) {
        match self {
            DescribedType::Union(members) => {
                for member in members {
                    member.flatten_into(out);
                }
            }
            other => out.push(other),
        }
    }
}

fn push_unique(members: &mut Vec<DescribedType>, ty: DescribedType) {
    let key = ty.dedupe_key();
    if !members.iter().any(|member| member.dedupe_key() == key) {
        members.push(ty);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(value: i64) -> DescribedType {
        DescribedType::literal(value.to_string(), DescribedType::primitive("number", "int4"))
    }

    fn text(value: &str) -> DescribedType {
        DescribedType::literal(format!("'{value}'"), DescribedType::primitive("string", "text"))
    }

    #[test]
    fn with_null_is_idempotent() {
        let ty = DescribedType::primitive("string", "text").with_null();
        assert_eq!(ty.clone().with_null(), ty);
        assert!(ty.is_nullable());
        assert_eq!(ty.without_null(), DescribedType::primitive("string", "text"));
    }

    #[test]
    fn same_base_literals_stay_literal() {
        let merged = DescribedType::merge([int(1), int(2)]);
        assert_eq!(merged, DescribedType::Union(vec![int(1), int(2)]));
    }

    #[test]
    fn mixed_base_literals_widen() {
        let merged = DescribedType::merge([int(1), text("x")]);
        assert_eq!(
            merged,
            DescribedType::Union(vec![
                DescribedType::primitive("number", "int4"),
                DescribedType::primitive("string", "text"),
            ])
        );
    }

    #[test]
    fn literal_next_to_plain_type_collapses() {
        let merged = DescribedType::merge([text("a"), DescribedType::primitive("string", "text")]);
        assert_eq!(merged, DescribedType::primitive("string", "text"));
    }

    #[test]
    fn null_members_are_kept_once_and_last() {
        let merged = DescribedType::merge([
            DescribedType::null(),
            int(1),
            DescribedType::null(),
        ]);
        assert_eq!(merged, DescribedType::Union(vec![int(1), DescribedType::null()]));
    }

    #[test]
    fn dedupe_ignores_quote_style() {
        let single = DescribedType::literal("'a'", DescribedType::primitive("string", "text"));
        let double = DescribedType::literal("\"a\"", DescribedType::primitive("string", "text"));
        assert_eq!(single.dedupe_key(), double.dedupe_key());
    }

    #[test]
    fn pg_type_of_arrays_and_nullable() {
        let ty = DescribedType::array(DescribedType::primitive("number", "int4")).with_null();
        assert_eq!(ty.pg_type(), "_int4");
        assert!(DescribedType::unknown().with_null().is_unknown());
    }
}
