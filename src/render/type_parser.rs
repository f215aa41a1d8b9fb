use std::fmt::{self, Display};

use crate::render::TypeParseError;

/// A TypeScript type expression, as written by a user or rendered by us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TsType {
    /// `string`, `null`, `Date`, `Foo<T>`.
    Named { name: String, args: Vec<TsType> },
    /// Unescaped content of a quoted literal.
    StringLiteral(String),
    NumberLiteral(String),
    Union(Vec<TsType>),
    Array(Box<TsType>),
    Tuple(Vec<TsType>),
    Object(Vec<TsField>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsField {
    pub name: String,
    pub optional: bool,
    pub ty: TsType,
}

impl TsType {
    /// Order-independent form: union members and object fields sorted, nested
    /// unions flattened, duplicate members dropped.
    pub fn canonical(self) -> TsType {
        match self {
            TsType::Named { name, args } => {
                let mut args: Vec<TsType> = args.into_iter().map(TsType::canonical).collect();
                if name == "Array" && args.len() == 1 {
                    return TsType::Array(Box::new(args.remove(0)));
                }
                TsType::Named { name, args }
            }
            TsType::Union(members) => {
                let mut flat = Vec::new();
                for member in members {
                    match member.canonical() {
                        TsType::Union(inner) => flat.extend(inner),
                        other => flat.push(other),
                    }
                }
                flat.sort_by_key(|member| member.to_string());
                flat.dedup();
                if flat.len() == 1 { flat.remove(0) } else { TsType::Union(flat) }
            }
            TsType::Array(element) => TsType::Array(Box::new(element.canonical())),
            TsType::Tuple(members) => TsType::Tuple(members.into_iter().map(TsType::canonical).collect()),
            TsType::Object(fields) => {
                let mut fields: Vec<TsField> =
                    fields.into_iter().map(|field| TsField { ty: field.ty.canonical(), ..field }).collect();
                fields.sort_by(|a, b| a.name.cmp(&b.name));
                TsType::Object(fields)
            }
            literal => literal,
        }
    }
}

impl Display for TsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TsType::Named { name, args } if args.is_empty() => write!(f, "{name}"),
            TsType::Named { name, args } => {
                let args: Vec<String> = args.iter().map(ToString::to_string).collect();
                write!(f, "{name}<{}>", args.join(", "))
            }
            TsType::StringLiteral(value) => write!(f, "'{}'", value.replace('\\', "\\\\").replace('\'', "\\'")),
            TsType::NumberLiteral(value) => write!(f, "{value}"),
            TsType::Union(members) => {
                let members: Vec<String> = members.iter().map(ToString::to_string).collect();
                write!(f, "{}", members.join(" | "))
            }
            TsType::Array(element) => match element.as_ref() {
                TsType::Union(_) => write!(f, "({element})[]"),
                _ => write!(f, "{element}[]"),
            },
            TsType::Tuple(members) => {
                let members: Vec<String> = members.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", members.join(", "))
            }
            TsType::Object(fields) if fields.is_empty() => write!(f, "{{}}"),
            TsType::Object(fields) => {
                let fields: Vec<String> = fields
                    .iter()
                    .map(|field| {
                        format!("{}{}: {}", property_key(&field.name), if field.optional { "?" } else { "" }, field.ty)
                    })
                    .collect();
                write!(f, "{{ {} }}", fields.join("; "))
            }
        }
    }
}

/// Cursor over TypeScript type text.
#[derive(Debug, Default)]
pub struct TypeTextParser {
    pub position: usize,
    pub length: usize,
    pub text_v: Vec<char>,
}

impl TypeTextParser {
    pub fn new(text: &str) -> Self {
        let text_v: Vec<char> = text.chars().collect();
        Self { position: 0, length: text_v.len(), text_v }
    }

    /// Parses a whole type; trailing text is an error.
    pub fn parse(text: &str) -> Result<TsType, TypeParseError> {
        let mut parser = Self::new(text);
        let ty = parser.parse_type()?;
        parser.next_non_whitespace();
        if !parser.eof() {
            return TypeParseError::new("Unexpected trailing input", parser.position, &parser).err();
        }
        Ok(ty)
    }

    pub fn eof(&self) -> bool {
        self.position >= self.length
    }

    pub fn current(&self) -> char {
        self.peek(0)
    }

    pub fn peek(&self, ahead: usize) -> char {
        self.text_v.get(self.position + ahead).copied().unwrap_or('\0')
    }

    pub fn next(&mut self) {
        self.position += 1;
    }

    pub fn next_non_whitespace(&mut self) {
        while self.current().is_whitespace() {
            self.next();
        }
    }

    pub fn text_from_range(&self, start: usize, end: usize) -> String {
        let end = end.min(self.length);
        let start = start.min(end);
        self.text_v[start..end].iter().collect()
    }

    fn expect(&mut self, expected: char) -> Result<(), TypeParseError> {
        self.next_non_whitespace();
        if self.current() != expected {
            return TypeParseError::new(&format!("Expected '{expected}'"), self.position, self).err();
        }
        self.next();
        Ok(())
    }

    fn parse_type(&mut self) -> Result<TsType, TypeParseError> {
        self.next_non_whitespace();
        if self.current() == '|' {
            self.next();
        }

        let mut members = vec![self.parse_postfix()?];
        loop {
            self.next_non_whitespace();
            if self.current() != '|' {
                break;
            }
            self.next();
            members.push(self.parse_postfix()?);
        }

        Ok(if members.len() == 1 { members.remove(0) } else { TsType::Union(members) })
    }

    fn parse_postfix(&mut self) -> Result<TsType, TypeParseError> {
        let mut ty = self.parse_primary()?;
        loop {
            self.next_non_whitespace();
            if self.current() == '[' && self.peek(1) == ']' {
                self.next();
                self.next();
                ty = TsType::Array(Box::new(ty));
            } else {
                return Ok(ty);
            }
        }
    }

    fn parse_primary(&mut self) -> Result<TsType, TypeParseError> {
        self.next_non_whitespace();
        let pivot = self.position;

        match self.current() {
            '(' => {
                self.next();
                let ty = self.parse_type()?;
                self.expect(')')?;
                Ok(ty)
            }
            '{' => self.parse_object(),
            '[' => {
                self.next();
                let members = self.parse_list(']')?;
                Ok(TsType::Tuple(members))
            }
            '\'' | '"' => Ok(TsType::StringLiteral(self.parse_quoted()?)),
            c if c.is_ascii_digit() || (c == '-' && self.peek(1).is_ascii_digit()) => Ok(self.parse_number()),
            c if is_identifier_char(c) => {
                let name = self.parse_identifier();
                self.next_non_whitespace();
                let args = if self.current() == '<' {
                    self.next();
                    self.parse_list('>')?
                } else {
                    Vec::new()
                };
                Ok(TsType::Named { name, args })
            }
            '\0' => TypeParseError::new("Unexpected end of type", pivot, self).err(),
            _ => TypeParseError::new("Unexpected character", pivot, self).err(),
        }
    }

    /// Comma-separated types up to `close`, which is consumed.
    fn parse_list(&mut self, close: char) -> Result<Vec<TsType>, TypeParseError> {
        let mut items = Vec::new();
        loop {
            self.next_non_whitespace();
            if self.current() == close {
                self.next();
                return Ok(items);
            }
            items.push(self.parse_type()?);
            self.next_non_whitespace();
            match self.current() {
                ',' => self.next(),
                c if c == close => {}
                _ => return TypeParseError::new(&format!("Expected ',' or '{close}'"), self.position, self).err(),
            }
        }
    }

    fn parse_object(&mut self) -> Result<TsType, TypeParseError> {
        self.next();
        let mut fields = Vec::new();

        loop {
            self.next_non_whitespace();
            let pivot = self.position;
            let name = match self.current() {
                '}' => {
                    self.next();
                    return Ok(TsType::Object(fields));
                }
                '\'' | '"' => self.parse_quoted()?,
                c if is_identifier_char(c) => self.parse_identifier(),
                _ => return TypeParseError::new("Expected a field name", pivot, self).err(),
            };

            self.next_non_whitespace();
            let optional = self.current() == '?';
            if optional {
                self.next();
            }
            self.expect(':')?;
            let ty = self.parse_type()?;
            fields.push(TsField { name, optional, ty });

            self.next_non_whitespace();
            match self.current() {
                ';' | ',' => self.next(),
                '}' => {}
                _ => return TypeParseError::new("Expected ';' or '}'", self.position, self).err(),
            }
        }
    }

    fn parse_quoted(&mut self) -> Result<String, TypeParseError> {
        let pivot = self.position;
        let quote = self.current();
        self.next();

        let mut value = String::new();
        loop {
            match self.current() {
                '\0' if self.eof() => return TypeParseError::new("Unterminated string literal", pivot, self).err(),
                '\\' => {
                    self.next();
                    value.push(self.current());
                    self.next();
                }
                c if c == quote => {
                    self.next();
                    return Ok(value);
                }
                c => {
                    value.push(c);
                    self.next();
                }
            }
        }
    }

    fn parse_number(&mut self) -> TsType {
        let pivot = self.position;
        if self.current() == '-' {
            self.next();
        }
        while self.current().is_ascii_digit() || (self.current() == '.' && self.peek(1).is_ascii_digit()) {
            self.next();
        }
        TsType::NumberLiteral(self.text_from_range(pivot, self.position))
    }

    fn parse_identifier(&mut self) -> String {
        let pivot = self.position;
        while is_identifier_char(self.current()) || self.current() == '.' {
            self.next();
        }
        self.text_from_range(pivot, self.position)
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// An object key as it must be written: bare when it is an identifier, quoted otherwise.
pub fn property_key(name: &str) -> String {
    let mut chars = name.chars();
    let bare = chars.next().is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$') && chars.all(is_identifier_char);
    if bare { name.to_string() } else { format!("\"{}\"", name.replace('"', "\\\"")) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> TsType {
        TsType::Named { name: name.into(), args: Vec::new() }
    }

    #[test]
    fn parses_objects_with_optional_fields() {
        let ty = TypeTextParser::parse("{ id: number; name?: string | null }").expect("object");
        assert_eq!(
            ty,
            TsType::Object(vec![
                TsField { name: "id".into(), optional: false, ty: named("number") },
                TsField {
                    name: "name".into(),
                    optional: true,
                    ty: TsType::Union(vec![named("string"), named("null")]),
                },
            ])
        );
    }

    #[test]
    fn parses_arrays_and_literals() {
        assert_eq!(
            TypeTextParser::parse("('a' | \"b\")[]").expect("array"),
            TsType::Array(Box::new(TsType::Union(vec![
                TsType::StringLiteral("a".into()),
                TsType::StringLiteral("b".into()),
            ])))
        );
        assert_eq!(TypeTextParser::parse("-1.5").expect("number"), TsType::NumberLiteral("-1.5".into()));
        assert_eq!(
            TypeTextParser::parse("Array<number>").expect("generic").canonical(),
            TsType::Array(Box::new(named("number")))
        );
    }

    #[test]
    fn canonical_form_ignores_order_and_quotes() {
        let left = TypeTextParser::parse("{ b: 'x' | null; a: number }").expect("left").canonical();
        let right = TypeTextParser::parse("{ a: number, b: null | \"x\" }").expect("right").canonical();
        assert_eq!(left, right);
        assert_eq!(left.to_string(), "{ a: number; b: 'x' | null }");
    }

    #[test]
    fn escaped_quotes_survive() {
        let ty = TypeTextParser::parse("'it\\'s'").expect("literal");
        assert_eq!(ty, TsType::StringLiteral("it's".into()));
        assert_eq!(ty.to_string(), "'it\\'s'");
    }

    #[test]
    fn errors_point_at_the_offending_text() {
        let err = TypeTextParser::parse("{ id number }").unwrap_err();
        assert_eq!(err.message, "Expected ':'");
        assert_eq!(err.start, 5);

        assert!(TypeTextParser::parse("string string").is_err());
        assert!(TypeTextParser::parse("'open").is_err());
    }
}
