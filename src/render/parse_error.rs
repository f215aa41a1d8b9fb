use thiserror::Error;

use crate::render::TypeTextParser;

/// Malformed type text, with the span that could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("TypeParseError: {message}\n  at [{start}:{end}] -> '{text}'")]
pub struct TypeParseError {
    pub message: String,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl TypeParseError {
    pub fn new(message: &str, pivot: usize, parser: &TypeTextParser) -> Self {
        Self {
            message: message.to_string(),
            text: parser.text_from_range(pivot, parser.position + 1),
            start: pivot,
            end: parser.position,
        }
    }

    pub fn err<T>(self) -> Result<T, TypeParseError> {
        Err(self)
    }
}
