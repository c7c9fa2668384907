//! Reader for generated `searchData` script payloads.
//!
//! The payload is a script literal rather than JSON: strings are usually
//! single-quoted, there is a `var searchData=` prelude and a trailing `;`.
//! The reader parses the literal into a small value tree and then maps each
//! record onto [`IndexRecord`], collapsing the single- and multi-entry layouts
//! into one ordered entry list.

use crate::error::ParseError;
use crate::types::{Entry, IndexRecord};

/// Deepest array nesting accepted. Generated payloads nest at most five levels.
const MAX_DEPTH: usize = 32;

/// Literal values that can appear in a payload.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Value {
    Str(String),
    Num(i64),
    Bool(bool),
    Null,
    Array(Vec<Value>),
}

impl Value {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::Num(_) => "number",
            Self::Bool(_) => "boolean",
            Self::Null => "null",
            Self::Array(_) => "array",
        }
    }
}

/// Parses a generated search data file into records, in file order.
///
/// Records are not validated here; pass them to [`SearchIndex::build`].
///
/// [`SearchIndex::build`]: crate::search::SearchIndex::build
pub fn parse_search_data(source: &str) -> Result<Vec<IndexRecord>, ParseError> {
    let mut parser = Parser::new(source);
    let root = parser.parse_document()?;

    let Value::Array(items) = root else {
        return Err(parser.error_at(0, format!("expected an array, found {}", root.kind())));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(record, value)| to_record(record, value))
        .collect()
}

/// Maps `[key, [label, entry...]]` (or `[key, [label, [entry...]]]`) to a record.
fn to_record(record: usize, value: Value) -> Result<IndexRecord, ParseError> {
    let shape = |message: String| ParseError::Shape { record, message };

    let Value::Array(mut parts) = value else {
        return Err(shape(format!("expected [key, [label, ...]], found {}", value.kind())));
    };
    if parts.len() != 2 {
        return Err(shape(format!("expected 2 elements, found {}", parts.len())));
    }

    let body = parts.pop().unwrap_or(Value::Null);
    let key = parts.pop().unwrap_or(Value::Null);
    let Value::Str(search_key) = key else {
        return Err(shape(format!("search key must be a string, found {}", key.kind())));
    };
    let Value::Array(body) = body else {
        return Err(shape(format!("expected [label, ...], found {}", body.kind())));
    };

    let mut body = body.into_iter();
    let label = match body.next() {
        Some(Value::Str(label)) => label,
        Some(other) => return Err(shape(format!("label must be a string, found {}", other.kind()))),
        None => return Err(shape("missing label".to_string())),
    };

    // `[label, [[link, scope], ...]]` carries its entries in one nested list
    let rest = match <[Value; 1]>::try_from(body.collect::<Vec<_>>()) {
        Ok([Value::Array(items)]) if items.is_empty() => vec![],
        Ok([Value::Array(items)]) if matches!(items.first(), Some(Value::Array(_))) => items,
        Ok([single]) => vec![single],
        Err(rest) => rest,
    };

    let entries = rest
        .into_iter()
        .enumerate()
        .map(|(idx, value)| to_entry(&label, value).map_err(|msg| shape(format!("entry {idx}: {msg}"))))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(IndexRecord {
        search_key,
        entries,
    })
}

fn to_entry(label: &str, value: Value) -> Result<Entry, String> {
    let Value::Array(fields) = value else {
        return Err(format!("expected [link, flag, scope], found {}", value.kind()));
    };

    let (link, flag, scope) = match <[Value; 3]>::try_from(fields) {
        Ok([link, flag, scope]) => (link, Some(flag), scope),
        Err(fields) => match <[Value; 2]>::try_from(fields) {
            Ok([link, scope]) => (link, None, scope),
            Err(fields) => return Err(format!("expected 2 or 3 fields, found {}", fields.len())),
        },
    };

    let Value::Str(target_link) = link else {
        return Err(format!("link must be a string, found {}", link.kind()));
    };
    let Value::Str(scope_label) = scope else {
        return Err(format!("scope must be a string, found {}", scope.kind()));
    };
    let target_parent = match flag {
        None => true,
        Some(Value::Num(n)) => n != 0,
        Some(Value::Bool(b)) => b,
        Some(other) => return Err(format!("flag must be a number, found {}", other.kind())),
    };

    Ok(Entry {
        label: label.to_string(),
        target_link,
        scope_label,
        target_parent,
    })
}

/// Recursive-descent parser over the script literal.
pub(crate) struct Parser<'a> {
    source: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub(crate) const fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            depth: 0,
        }
    }

    /// Parses `[var name =] value [;]` followed only by whitespace.
    pub(crate) fn parse_document(&mut self) -> Result<Value, ParseError> {
        self.skip_trivia()?;
        if self.rest().starts_with("var ") {
            let Some(eq) = self.rest().find('=') else {
                return Err(self.error("expected '=' after variable name"));
            };
            self.pos += eq + 1;
        }

        self.skip_trivia()?;
        let value = self.parse_value()?;
        self.skip_trivia()?;
        if self.peek() == Some(';') {
            self.pos += 1;
            self.skip_trivia()?;
        }
        if let Some(c) = self.peek() {
            return Err(self.error(format!("unexpected trailing character '{c}'")));
        }
        Ok(value)
    }

    fn parse_value(&mut self) -> Result<Value, ParseError> {
        match self.peek() {
            Some('[') => self.parse_array(),
            Some(quote @ ('\'' | '"')) => self.parse_string(quote).map(Value::Str),
            Some(c) if c == '-' || c.is_ascii_digit() => self.parse_number(),
            Some(c) if c.is_ascii_alphabetic() => self.parse_keyword(),
            Some(c) => Err(self.error(format!("unexpected character '{c}'"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn parse_array(&mut self) -> Result<Value, ParseError> {
        if self.depth == MAX_DEPTH {
            return Err(self.error(format!("arrays nested deeper than {MAX_DEPTH} levels")));
        }
        self.depth += 1;
        self.pos += 1; // '['
        let mut items = vec![];
        loop {
            self.skip_trivia()?;
            if self.peek() == Some(']') {
                self.pos += 1;
                self.depth -= 1;
                return Ok(Value::Array(items));
            }

            items.push(self.parse_value()?);

            self.skip_trivia()?;
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(']') => {}
                Some(c) => return Err(self.error(format!("expected ',' or ']', found '{c}'"))),
                None => return Err(self.error("unterminated array")),
            }
        }
    }

    /// Parses a quoted string, decoding escapes.
    pub(crate) fn parse_string(&mut self, quote: char) -> Result<String, ParseError> {
        let start = self.pos;
        self.pos += quote.len_utf8();
        let mut out = String::new();

        loop {
            let rest = self.rest();
            // Copy the unescaped run in one go
            let run = rest
                .find(|c: char| c == quote || c == '\\' || c == '\n')
                .unwrap_or(rest.len());
            out.push_str(&rest[..run]);
            self.pos += run;

            match self.bump() {
                Some(c) if c == quote => return Ok(out),
                Some('\\') => self.parse_escape(&mut out)?,
                Some(_) | None => {
                    self.pos = start;
                    return Err(self.error("unterminated string"));
                }
            }
        }
    }

    fn parse_escape(&mut self, out: &mut String) -> Result<(), ParseError> {
        let escape_start = self.pos - 1;
        let decoded = match self.bump() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('r') => '\r',
            Some('b') => '\u{8}',
            Some('f') => '\u{c}',
            Some('v') => '\u{b}',
            Some('0') => '\0',
            Some('x') => self.parse_hex_escape(2, escape_start)?,
            Some('u') => self.parse_hex_escape(4, escape_start)?,
            // Line continuation
            Some('\n') => return Ok(()),
            Some(c) => c,
            None => return Err(self.error("unterminated escape")),
        };
        out.push(decoded);
        Ok(())
    }

    fn parse_hex_escape(&mut self, digits: usize, escape_start: usize) -> Result<char, ParseError> {
        let hex = self.rest().get(..digits).unwrap_or("");
        let code = u32::from_str_radix(hex, 16)
            .ok()
            .filter(|_| hex.len() == digits && hex.chars().all(|c| c.is_ascii_hexdigit()))
            .and_then(char::from_u32);
        match code {
            Some(c) => {
                self.pos += digits;
                Ok(c)
            }
            None => Err(self.error_at(escape_start, "invalid escape sequence")),
        }
    }

    fn parse_number(&mut self) -> Result<Value, ParseError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        let digits = self
            .rest()
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(self.rest().len());
        self.pos += digits;
        self.source[start..self.pos]
            .parse()
            .map(Value::Num)
            .map_err(|_| self.error_at(start, "invalid number"))
    }

    fn parse_keyword(&mut self) -> Result<Value, ParseError> {
        let start = self.pos;
        let len = self
            .rest()
            .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
            .unwrap_or(self.rest().len());
        self.pos += len;
        match &self.source[start..self.pos] {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            "null" | "undefined" => Ok(Value::Null),
            other => Err(self.error_at(start, format!("unexpected identifier '{other}'"))),
        }
    }

    /// Skips whitespace and `//` / `/* */` comments.
    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();

            if trimmed.starts_with("//") {
                self.pos += trimmed.find('\n').unwrap_or(trimmed.len());
            } else if trimmed.starts_with("/*") {
                let Some(end) = trimmed.find("*/") else {
                    return Err(self.error("unterminated comment"));
                };
                self.pos += end + 2;
            } else {
                return Ok(());
            }
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        self.error_at(self.pos, message)
    }

    /// Builds a syntax error with a 1-based line and column for a byte offset.
    fn error_at(&self, offset: usize, message: impl Into<String>) -> ParseError {
        let before = &self.source[..offset.min(self.source.len())];
        let line = before.matches('\n').count() + 1;
        let column = before
            .rfind('\n')
            .map_or(before, |nl| &before[nl + 1..])
            .chars()
            .count()
            + 1;
        ParseError::Syntax {
            line,
            column,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};
    use rstest::rstest;

    const GENERATED: &str = "var searchData=\n[\n  ['matrix4b',['Matrix4b',['../group__mat4aliases.html#ga3a1c98143f406650290733ef30bd9504',1,'sky']]],\n  ['modifier',['modifier',['../structsky_1_1_event_1_1_mouse_event.html#ac719b62a321d9de9c9d3a21237d821a5',1,'sky::Event::MouseEvent::modifier()'],['../structsky_1_1_event_1_1_key_event.html#a1ca4fe1f66e1c45f62b28c6fe9180306',1,'sky::Event::KeyEvent::modifier()']]]\n];\n";

    #[test]
    fn test_parses_generated_layout() {
        let records = parse_search_data(GENERATED).unwrap();
        check!(records.len() == 2);

        check!(records[0].search_key == "matrix4b");
        check!(records[0].entries.len() == 1);
        check!(records[0].entries[0].label == "Matrix4b");
        check!(records[0].entries[0].scope_label == "sky");
        check!(records[0].entries[0].target_parent);

        check!(records[1].search_key == "modifier");
        check!(records[1].entries.len() == 2);
        check!(records[1].entries[1].scope_label == "sky::Event::KeyEvent::modifier()");
        check!(records[1].entries.iter().all(|e| e.label == "modifier"));
    }

    #[test]
    fn test_parses_two_field_entries() {
        let records =
            parse_search_data("[['matrix4',['Matrix4',['structsky_1_1_matrix4.html','']]]]").unwrap();
        check!(records[0].entries[0].target_link == "structsky_1_1_matrix4.html");
        check!(records[0].entries[0].scope_label == "");
        check!(records[0].entries[0].target_parent);
    }

    #[test]
    fn test_parses_nested_entry_list() {
        let source = r#"[["minutes", ["minutes", [["a.html#x", "sky::Timespan"], ["b.html", 0, "sky"]]]]]"#;
        let records = parse_search_data(source).unwrap();
        check!(records[0].entries.len() == 2);
        check!(records[0].entries[0].target_link == "a.html#x");
        check!(!records[0].entries[1].target_parent);
    }

    #[test]
    fn test_record_without_entries_is_kept_for_validation() {
        let records = parse_search_data("[['metalgdi',['MetalGDI']]]").unwrap();
        check!(records[0].entries.is_empty());
    }

    #[test]
    fn test_empty_nested_entry_list_is_kept_for_validation() {
        let records = parse_search_data("[['zero',['Zero',[]]]]").unwrap();
        check!(records[0].search_key == "zero");
        check!(records[0].entries.is_empty());
    }

    #[test]
    fn test_deep_nesting_is_a_syntax_error() {
        let source = "[".repeat(500_000);
        let_assert!(Err(ParseError::Syntax { line: 1, column, message }) = parse_search_data(&source));
        check!(column == MAX_DEPTH + 1);
        check!(message.contains("nested deeper"));

        let within_limit = format!("{}{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
        check!(Parser::new(&within_limit).parse_document().is_ok());
    }

    #[rstest]
    #[case(r"'it\'s'", "it's")]
    #[case(r"'a\\b'", r"a\b")]
    #[case(r#""say \"hi\"""#, "say \"hi\"")]
    #[case(r"'\x3cé'", "<é")]
    #[case(r"'tab\tnew\nline'", "tab\tnew\nline")]
    fn test_string_escapes(#[case] literal: &str, #[case] expected: &str) {
        let mut parser = Parser::new(literal);
        let quote = literal.chars().next().unwrap();
        check!(parser.parse_string(quote).unwrap() == expected);
    }

    #[test]
    fn test_accepts_trailing_commas_and_comments() {
        let source = "// generated\nvar searchData = [\n  /* m */ ['mouse',['mouse',['../a.html',1,'sky::Event'],]],\n];";
        let records = parse_search_data(source).unwrap();
        check!(records.len() == 1);
        check!(records[0].entries.len() == 1);
    }

    #[rstest]
    #[case("var searchData=\n[\n  ['mouse',['mouse',['../a.html',1,'sky']]\n];", 4, 2)]
    #[case("[['mouse'", 1, 10)]
    #[case("[['mou", 1, 3)]
    #[case("[] extra", 1, 4)]
    fn test_syntax_error_position(
        #[case] source: &str,
        #[case] expected_line: usize,
        #[case] expected_column: usize,
    ) {
        let_assert!(Err(ParseError::Syntax { line, column, .. }) = parse_search_data(source));
        check!(line == expected_line);
        check!(column == expected_column);
    }

    #[rstest]
    #[case("[['mouse']]")]
    #[case("[[1, ['mouse', ['../a.html', 1, 'sky']]]]")]
    #[case("[['mouse', ['mouse', ['../a.html', 1]]]]")]
    #[case("[['mouse', ['mouse', ['../a.html', 'x', 'sky']]]]")]
    #[case("[['mouse', 'mouse']]")]
    fn test_shape_errors(#[case] source: &str) {
        let_assert!(Err(ParseError::Shape { record: 0, .. }) = parse_search_data(source));
    }
}
