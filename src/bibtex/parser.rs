//! BibTeX source parser
//!
//! Handles regular entries delimited by braces or parentheses, values in
//! braces, quotes, bare numbers and `@string` macros joined with `#`.
//! `@comment` and `@preamble` blocks are skipped; text outside entries is
//! ignored.

use super::{render_records, Record, SourceParser};
use crate::error::{BibCacheError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Parser for `.bib` files
#[derive(Debug, Default, Clone, Copy)]
pub struct BibtexParser;

impl BibtexParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse all entries of a BibTeX document
    ///
    /// # Arguments
    /// * `input` - Document text
    /// * `origin` - Name used in error messages
    pub fn parse_str(&self, input: &str, origin: &str) -> Result<Vec<Record>> {
        Cursor::new(input, origin).entries()
    }
}

impl SourceParser for BibtexParser {
    fn parse(
        &self,
        path: &Path,
        formatter: &dyn Fn(&Record) -> String,
        sink: &mut dyn FnMut(&str),
    ) -> Result<String> {
        let input = fs::read_to_string(path).map_err(|e| BibCacheError::SourceUnavailable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let records = self.parse_str(&input, &path.display().to_string())?;
        Ok(render_records(&records, formatter, sink))
    }
}

/// Character cursor tracking the current line for error reporting
struct Cursor<'a> {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    origin: &'a str,
    macros: HashMap<String, String>,
}

impl<'a> Cursor<'a> {
    fn new(input: &str, origin: &'a str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            line: 1,
            origin,
            macros: HashMap::new(),
        }
    }

    fn error(&self, message: impl Into<String>) -> BibCacheError {
        BibCacheError::Parse {
            path: self.origin.to_string(),
            line: self.line,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().map_or(false, char::is_whitespace) {
            self.bump();
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        self.skip_whitespace();
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(self.error(format!("expected '{}', found '{}'", expected, c))),
            None => Err(self.error(format!("expected '{}', found end of input", expected))),
        }
    }

    /// Read a run of identifier characters
    fn identifier(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || "_-:.+/'".contains(c) {
                ident.push(c);
                self.bump();
            } else {
                break;
            }
        }
        ident
    }

    fn entries(mut self) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        while let Some(c) = self.bump() {
            if c != '@' {
                continue;
            }
            self.skip_whitespace();
            let entry_type = self.identifier().to_ascii_lowercase();
            if entry_type.is_empty() {
                continue;
            }
            self.skip_whitespace();
            // A bare '@' in free text, e.g. an email address
            let close = match self.peek() {
                Some('{') => '}',
                Some('(') => ')',
                _ => continue,
            };
            self.bump();

            match entry_type.as_str() {
                "comment" | "preamble" => self.skip_balanced(close)?,
                "string" => self.string_macro(close)?,
                _ => records.push(self.entry(&entry_type, close)?),
            }
        }
        Ok(records)
    }

    /// Skip to the delimiter closing the current block
    fn skip_balanced(&mut self, close: char) -> Result<()> {
        let mut depth = 0usize;
        while let Some(c) = self.bump() {
            match c {
                '{' => depth += 1,
                '}' if depth > 0 => depth -= 1,
                c if c == close && depth == 0 => return Ok(()),
                _ => {}
            }
        }
        Err(self.error("unterminated block"))
    }

    fn string_macro(&mut self, close: char) -> Result<()> {
        self.skip_whitespace();
        let name = self.identifier().to_ascii_lowercase();
        if name.is_empty() {
            return Err(self.error("@string without a name"));
        }
        self.expect('=')?;
        let value = self.value(close)?;
        self.expect(close)?;
        self.macros.insert(name, value);
        Ok(())
    }

    fn entry(&mut self, entry_type: &str, close: char) -> Result<Record> {
        self.skip_whitespace();
        let mut key = String::new();
        while let Some(c) = self.peek() {
            if c == ',' || c == close || c.is_whitespace() {
                break;
            }
            key.push(c);
            self.bump();
        }
        let mut record = Record::new(entry_type, &key);

        loop {
            self.skip_whitespace();
            match self.bump() {
                Some(',') => {}
                Some(c) if c == close => return Ok(record),
                Some(c) => return Err(self.error(format!("unexpected '{}' in @{}", c, entry_type))),
                None => return Err(self.error(format!("unterminated @{} entry", entry_type))),
            }

            self.skip_whitespace();
            if self.peek() == Some(close) {
                self.bump();
                return Ok(record);
            }
            let name = self.identifier();
            if name.is_empty() {
                return Err(self.error("expected field name"));
            }
            self.expect('=')?;
            let value = self.value(close)?;
            record.insert(&name, &value);
        }
    }

    /// Parse `part # part # ...` and return the cleaned value
    fn value(&mut self, close: char) -> Result<String> {
        let mut raw = String::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('{') => {
                    self.bump();
                    raw.push_str(&self.delimited('}')?);
                }
                Some('"') => {
                    self.bump();
                    raw.push_str(&self.delimited('"')?);
                }
                Some(c) if c != close && c != ',' => {
                    let word = self.identifier();
                    if word.is_empty() {
                        return Err(self.error(format!("unexpected '{}' in value", c)));
                    }
                    match self.macros.get(&word.to_ascii_lowercase()) {
                        Some(expansion) => raw.push_str(expansion),
                        None => raw.push_str(&word),
                    }
                }
                _ => return Err(self.error("expected field value")),
            }

            self.skip_whitespace();
            if self.peek() == Some('#') {
                self.bump();
            } else {
                return Ok(clean_value(&raw));
            }
        }
    }

    /// Read until `end` at brace depth zero; the opening delimiter is consumed
    fn delimited(&mut self, end: char) -> Result<String> {
        let mut text = String::new();
        let mut depth = 0usize;
        while let Some(c) = self.bump() {
            match c {
                '{' => depth += 1,
                '}' if depth > 0 => depth -= 1,
                c if c == end && depth == 0 => return Ok(text),
                _ => {}
            }
            text.push(c);
        }
        Err(self.error("unterminated field value"))
    }
}

/// Drop grouping braces and collapse whitespace runs
fn clean_value(raw: &str) -> String {
    raw.chars()
        .filter(|&c| c != '{' && c != '}')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
