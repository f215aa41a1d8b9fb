use tracing::debug;

use crate::{
    analyzer::DescribedColumn,
    config::{GenerateOptions, TypeTransform},
    render::{TypeParseError, TypeTextParser, render_row},
};

/// Outcome of checking a user-declared type against the generated one; both
/// sides are given in canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub is_equal: bool,
    pub expected: String,
    pub generated: String,
}

pub struct TypeComparator;

impl TypeComparator {
    /// Order-independent comparison. The transform applies to the generated side only.
    pub fn compare(
        expected: &str,
        generated: &str,
        transform: Option<&TypeTransform>,
    ) -> Result<Comparison, TypeParseError> {
        let generated = match transform {
            Some(transform) => transform.apply(generated),
            None => generated.to_string(),
        };

        let expected = TypeTextParser::parse(expected)?.canonical();
        let generated = TypeTextParser::parse(&generated)?.canonical();
        let is_equal = expected == generated;
        debug!(is_equal, "compared declared type with generated type");

        Ok(Comparison { is_equal, expected: expected.to_string(), generated: generated.to_string() })
    }

    /// Renders the row with `options` and compares it with the declared type.
    pub fn compare_row(
        expected: &str,
        columns: &[DescribedColumn],
        options: &GenerateOptions,
    ) -> Result<Comparison, TypeParseError> {
        let generated = render_row(columns, options);
        Self::compare(expected, &generated, options.transform.as_ref())
    }
}
