//! Maps JSON pointers to their position in the original document text.
//!
//! `serde_json::Value` drops positions, so rule findings (which are reported
//! against pointers) are located by re-scanning the raw text. Lines and
//! characters are zero-based; characters count Unicode scalar values and the
//! end position is exclusive.

use crate::domain::models::SourceRange;
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct SourceMap {
    ranges: HashMap<String, SourceRange>,
}

pub fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

impl SourceMap {
    /// Scans `text`. Malformed input yields the ranges found before the
    /// first syntax error.
    pub fn parse(text: &str) -> Self {
        let mut scanner = Scanner {
            chars: text.chars().collect(),
            pos: 0,
            line: 0,
            col: 0,
            ranges: HashMap::new(),
        };
        scanner.skip_ws();
        let _ = scanner.value(String::new());
        SourceMap {
            ranges: scanner.ranges,
        }
    }

    pub fn get(&self, pointer: &str) -> Option<SourceRange> {
        self.ranges.get(pointer).copied()
    }

    /// Range of `pointer`, or of its closest ancestor that exists.
    pub fn locate(&self, pointer: &str) -> Option<SourceRange> {
        let mut current = pointer;
        loop {
            if let Some(r) = self.get(current) {
                return Some(r);
            }
            match current.rsplit_once('/') {
                Some((parent, _)) => current = parent,
                None => return None,
            }
        }
    }
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    ranges: HashMap<String, SourceRange>,
}

impl Scanner {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t' | '\n' | '\r')) {
            self.bump();
        }
    }

    fn expect(&mut self, c: char) -> Option<()> {
        if self.peek() == Some(c) {
            self.bump();
            Some(())
        } else {
            None
        }
    }

    fn value(&mut self, ptr: String) -> Option<()> {
        let (line_start, character_start) = (self.line, self.col);
        match self.peek()? {
            '{' => self.object(&ptr)?,
            '[' => self.array(&ptr)?,
            '"' => {
                self.string()?;
            }
            _ => self.scalar()?,
        }
        self.ranges.insert(
            ptr,
            SourceRange {
                line_start,
                character_start,
                line_end: self.line,
                character_end: self.col,
            },
        );
        Some(())
    }

    fn object(&mut self, ptr: &str) -> Option<()> {
        self.expect('{')?;
        self.skip_ws();
        if self.expect('}').is_some() {
            return Some(());
        }
        loop {
            self.skip_ws();
            let key = self.string()?;
            self.skip_ws();
            self.expect(':')?;
            self.skip_ws();
            self.value(format!("{}/{}", ptr, escape_pointer_token(&key)))?;
            self.skip_ws();
            match self.bump()? {
                ',' => continue,
                '}' => return Some(()),
                _ => return None,
            }
        }
    }

    fn array(&mut self, ptr: &str) -> Option<()> {
        self.expect('[')?;
        self.skip_ws();
        if self.expect(']').is_some() {
            return Some(());
        }
        let mut index = 0usize;
        loop {
            self.skip_ws();
            self.value(format!("{}/{}", ptr, index))?;
            index += 1;
            self.skip_ws();
            match self.bump()? {
                ',' => continue,
                ']' => return Some(()),
                _ => return None,
            }
        }
    }

    fn string(&mut self) -> Option<String> {
        let start = self.pos;
        self.expect('"')?;
        loop {
            match self.bump()? {
                '\\' => {
                    self.bump()?;
                }
                '"' => break,
                _ => {}
            }
        }
        let literal: String = self.chars[start..self.pos].iter().collect();
        serde_json::from_str(&literal).ok()
    }

    fn scalar(&mut self) -> Option<()> {
        let start = self.pos;
        while matches!(
            self.peek(),
            Some(c) if c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '.')
        ) {
            self.bump();
        }
        if self.pos == start {
            None
        } else {
            Some(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
  "nodes": [
    {
      "unique-id": "api",
      "port": 8080
    }
  ],
  "a/b": {"~x": true}
}"#;

    #[test]
    fn locates_nested_values() {
        let map = SourceMap::parse(DOC);
        let id = map.get("/nodes/0/unique-id").unwrap();
        assert_eq!(id.line_start, 3);
        assert_eq!(id.character_start, 19);
        assert_eq!(id.character_end, 24);

        let node = map.get("/nodes/0").unwrap();
        assert_eq!((node.line_start, node.line_end), (2, 5));

        let root = map.get("").unwrap();
        assert_eq!((root.line_start, root.line_end), (0, 8));
    }

    #[test]
    fn escapes_keys_like_json_pointer() {
        let map = SourceMap::parse(DOC);
        assert!(map.get("/a~1b/~0x").is_some());
        assert_eq!(escape_pointer_token("a/b"), "a~1b");
    }

    #[test]
    fn missing_pointer_falls_back_to_ancestor() {
        let map = SourceMap::parse(DOC);
        let fallback = map.locate("/nodes/0/interfaces/3").unwrap();
        assert_eq!(fallback, map.get("/nodes/0").unwrap());
        assert!(map.locate("/nowhere").is_some());
    }

    #[test]
    fn malformed_text_keeps_earlier_ranges() {
        let map = SourceMap::parse("{\"a\": 1, \"b\": [true, }");
        assert!(map.get("/a").is_some());
        assert!(map.get("").is_none());
    }

    #[test]
    fn crlf_and_multibyte_text_count_characters() {
        let map = SourceMap::parse("{\r\n  \"n\u{e4}me\": \"\u{e5}\u{e4}\u{f6}\",\r\n  \"x\": 1\r\n}");
        let name = map.get("/n\u{e4}me").unwrap();
        assert_eq!((name.line_start, name.character_start), (1, 10));
        assert_eq!((name.line_end, name.character_end), (1, 15));

        let x = map.get("/x").unwrap();
        assert_eq!((x.line_start, x.character_start, x.character_end), (2, 7, 8));

        let root = map.get("").unwrap();
        assert_eq!((root.line_end, root.character_end), (3, 1));
    }

    #[test]
    fn escaped_quotes_inside_strings_do_not_end_them() {
        let map = SourceMap::parse(r#"{"say": "he said \"hi\"", "next": 2}"#);
        assert!(map.get("/next").is_some());
    }
}
