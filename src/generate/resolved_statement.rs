use std::ops::Range;

use crate::error::PostgresConstraintError;

/// One embedded expression and the placeholder that replaced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMapping {
    /// Span of `${expr}` in the original text.
    pub original: Range<usize>,
    /// Span of `$n` in the executable SQL.
    pub generated: Range<usize>,
}

/// Executable SQL built from a tagged template, with a map back to the
/// template's own text. Offsets are byte offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStatement {
    pub text: String,
    pub original: String,
    pub source_map: Vec<SourceMapping>,
}

impl ResolvedStatement {
    /// Plain SQL with nothing embedded.
    pub fn from_sql(sql: &str) -> Self {
        Self { text: sql.to_string(), original: sql.to_string(), source_map: Vec::new() }
    }

    /// `quasis` are the literal chunks around the embedded `expressions`
    /// (source text of each `${...}`); there is one more chunk than expressions.
    pub fn from_template(quasis: &[&str], expressions: &[&str]) -> Self {
        let mut text = String::new();
        let mut original = String::new();
        let mut source_map = Vec::with_capacity(expressions.len());

        for (idx, quasi) in quasis.iter().enumerate() {
            text.push_str(quasi);
            original.push_str(quasi);

            let Some(expression) = expressions.get(idx) else { continue };
            let original_start = original.len();
            original.push_str(&format!("${{{expression}}}"));
            let generated_start = text.len();
            text.push_str(&format!("${}", idx + 1));

            source_map.push(SourceMapping {
                original: original_start..original.len(),
                generated: generated_start..text.len(),
            });
        }

        Self { text, original, source_map }
    }

    /// Maps an offset in the executable SQL back to the original text. An
    /// offset inside a placeholder maps to the start of its expression.
    pub fn original_offset(&self, generated_offset: usize) -> usize {
        let mut shift: isize = 0;
        for mapping in &self.source_map {
            if generated_offset < mapping.generated.start {
                break;
            }
            if generated_offset < mapping.generated.end {
                return mapping.original.start;
            }
            shift += mapping.original.len() as isize - mapping.generated.len() as isize;
        }
        generated_offset.saturating_add_signed(shift)
    }

    /// 1-based line and column of a byte offset in the original text.
    pub fn line_and_column(&self, original_offset: usize) -> (usize, usize) {
        let prefix = self.original.get(..original_offset.min(self.original.len())).unwrap_or(&self.original);
        let line = prefix.matches('\n').count() + 1;
        let line_start = prefix.rfind('\n').map(|idx| idx + 1).unwrap_or(0);
        (line, prefix[line_start..].chars().count() + 1)
    }

    /// Attaches the original line and position for an offset in the executable SQL.
    pub fn locate(&self, err: PostgresConstraintError, generated_offset: usize) -> PostgresConstraintError {
        let offset = self.original_offset(generated_offset);
        let (line, _) = self.line_and_column(offset);
        err.at(line, offset + 1)
    }

    /// Re-bases a database-reported error (1-based position in the executable
    /// SQL) onto the original text.
    pub fn remap(&self, err: PostgresConstraintError) -> PostgresConstraintError {
        match err.position {
            Some(position) => self.locate(err, position.saturating_sub(1)),
            None => err,
        }
    }
}
