use heck::{ToLowerCamelCase, ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};
use serde::{Deserialize, Serialize};

use crate::config::Overrides;

/// Case conversion applied to top-level field names of a rendered row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldTransform {
    #[serde(rename = "snake")]
    Snake,
    #[serde(rename = "camel")]
    Camel,
    #[serde(rename = "pascal")]
    Pascal,
    #[serde(rename = "screaming snake")]
    ScreamingSnake,
}

impl FieldTransform {
    pub fn apply(&self, name: &str) -> String {
        match self {
            FieldTransform::Snake => name.to_snake_case(),
            FieldTransform::Camel => name.to_lower_camel_case(),
            FieldTransform::Pascal => name.to_upper_camel_case(),
            FieldTransform::ScreamingSnake => name.to_shouty_snake_case(),
        }
    }
}

/// Rewrites the generated type text before it is compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeTransform {
    /// `{type}` is replaced with the generated type, e.g. `{type}[]`.
    Template(String),
    /// Find/replace pairs applied in order.
    Replace(Vec<(String, String)>),
}

impl TypeTransform {
    pub fn apply(&self, generated: &str) -> String {
        match self {
            TypeTransform::Template(template) => template.replace("{type}", generated),
            TypeTransform::Replace(pairs) => pairs
                .iter()
                .fold(generated.to_string(), |text, (find, replace)| text.replace(find.as_str(), replace)),
        }
    }
}

/// How null members are written in rendered types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Nullable object keys become `key?: T`.
    pub null_as_optional: bool,
    /// `null` is written as `undefined`.
    pub null_as_undefined: bool,
}

/// Options for one generate/compare run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateOptions {
    pub overrides: Overrides,
    pub null_as_optional: bool,
    pub null_as_undefined: bool,
    pub field_transform: Option<FieldTransform>,
    pub transform: Option<TypeTransform>,
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overrides(overrides: Overrides) -> Self {
        Self { overrides, ..Default::default() }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions { null_as_optional: self.null_as_optional, null_as_undefined: self.null_as_undefined }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn options_read_camel_case_keys() {
        let options: GenerateOptions = serde_json::from_value(json!({
            "nullAsOptional": true,
            "fieldTransform": "camel",
            "transform": "{type}[]"
        }))
        .unwrap();

        assert!(options.null_as_optional);
        assert!(!options.null_as_undefined);
        assert_eq!(options.field_transform, Some(FieldTransform::Camel));
        assert_eq!(options.transform, Some(TypeTransform::Template("{type}[]".into())));
    }

    #[test]
    fn field_transforms() {
        assert_eq!(FieldTransform::Camel.apply("created_at"), "createdAt");
        assert_eq!(FieldTransform::Pascal.apply("created_at"), "CreatedAt");
        assert_eq!(FieldTransform::Snake.apply("createdAt"), "created_at");
        assert_eq!(FieldTransform::ScreamingSnake.apply("created_at"), "CREATED_AT");
    }

    #[test]
    fn replace_pairs_apply_in_order() {
        let transform: TypeTransform = serde_json::from_value(json!([["Date", "string"], ["string", "Text"]])).unwrap();
        assert_eq!(transform.apply("{ at: Date }"), "{ at: Text }");
    }
}
