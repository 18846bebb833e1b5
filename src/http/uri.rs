//! Relative-URI lexer and parser (spec.md §4.2).
//!
//! A direct idiomatic port of `myuri/parse.hpp`/`.cpp` and `myuri/uri.hpp`:
//! same token set, same `uri := path ('?' query)?` grammar, same
//! last-writer-wins duplicate-parameter rule. One Open Question from
//! spec.md §9 is resolved here rather than left open: percent-decoding
//! accepts both uppercase and lowercase hex digits (RFC 3986 permits
//! both; the original only accepted uppercase).

use crate::errors::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenTag {
    Path,
    Wordy,
    ItemInt,
    ItemEncodedChar,
    QueryMark,
    QueryAssign,
    QueryDelim,
    Eos,
    Unknown,
}

#[derive(Debug, Clone, Copy)]
struct Token {
    start: usize,
    len: usize,
    tag: TokenTag,
    /// Valid only when `tag == ItemEncodedChar`.
    decoded: u8,
}

struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a [u8]) -> Self {
        Self { src, pos: 0 }
    }

    fn at_eos(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn is_alpha(c: u8) -> bool {
        c.is_ascii_alphabetic() || c == b'_'
    }

    fn is_hex(c: u8) -> bool {
        c.is_ascii_digit() || c.is_ascii_hexdigit()
    }

    fn hex_value(c: u8) -> u8 {
        match c {
            b'0'..=b'9' => c - b'0',
            b'A'..=b'F' => c - b'A' + 10,
            b'a'..=b'f' => c - b'a' + 10,
            _ => 0,
        }
    }

    fn next(&mut self) -> Token {
        if self.at_eos() {
            return Token { start: self.src.len(), len: 1, tag: TokenTag::Eos, decoded: 0 };
        }

        match self.src[self.pos] {
            b'?' => self.single(TokenTag::QueryMark),
            b'=' => self.single(TokenTag::QueryAssign),
            b'&' => self.single(TokenTag::QueryDelim),
            b'%' => self.encoded_char(),
            c if c == b'/' || c == b'.' || Self::is_alpha(c) => self.textual(),
            c if c.is_ascii_digit() => self.int(),
            _ => self.single(TokenTag::Unknown),
        }
    }

    fn single(&mut self, tag: TokenTag) -> Token {
        let start = self.pos;
        self.pos += 1;
        Token { start, len: 1, tag, decoded: 0 }
    }

    fn encoded_char(&mut self) -> Token {
        let start = self.pos;
        self.pos += 1; // skip '%'

        let Some(&hi) = self.src.get(self.pos) else {
            return Token { start, len: self.pos - start, tag: TokenTag::Unknown, decoded: 0 };
        };
        if !Self::is_hex(hi) {
            return Token { start, len: self.pos - start, tag: TokenTag::Unknown, decoded: 0 };
        }
        self.pos += 1;

        let Some(&lo) = self.src.get(self.pos) else {
            return Token { start, len: self.pos - start, tag: TokenTag::Unknown, decoded: 0 };
        };
        if !Self::is_hex(lo) {
            return Token { start, len: self.pos - start, tag: TokenTag::Unknown, decoded: 0 };
        }
        self.pos += 1;

        let decoded = (Self::hex_value(hi) << 4) | Self::hex_value(lo);
        Token { start, len: 3, tag: TokenTag::ItemEncodedChar, decoded }
    }

    fn textual(&mut self) -> Token {
        let start = self.pos;
        let mut slashes = 0;

        while !self.at_eos() {
            let c = self.src[self.pos];
            if Self::is_alpha(c) || c.is_ascii_digit() || c == b'.' {
                self.pos += 1;
            } else if c == b'/' {
                slashes += 1;
                self.pos += 1;
            } else {
                break;
            }
        }

        let tag = if slashes < 1 { TokenTag::Wordy } else { TokenTag::Path };
        Token { start, len: self.pos - start, tag, decoded: 0 }
    }

    fn int(&mut self) -> Token {
        let start = self.pos;

        while !self.at_eos() && self.src[self.pos].is_ascii_digit() {
            self.pos += 1;
        }

        Token { start, len: self.pos - start, tag: TokenTag::ItemInt, decoded: 0 }
    }
}

/// The value of one query parameter: either a bare string or, when the
/// lexer recognized a run of digits, a decimal integer (spec.md §3:
/// "QueryValue is the tagged union {string, integer}").
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Str(String),
    Int(i64),
}

/// A decoded relative URI: path plus an ordered, last-writer-wins map of
/// query parameters (spec.md §3).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Uri {
    path: String,
    params: Vec<(String, QueryValue)>,
}

impl Uri {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn param(&self, name: &str) -> Option<&QueryValue> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn params(&self) -> &[(String, QueryValue)] {
        &self.params
    }

    fn set_param(&mut self, name: String, value: QueryValue) {
        match self.params.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.params.push((name, value)),
        }
    }
}

struct Parser<'a> {
    src: &'a [u8],
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    fn lexeme(&self, token: &Token) -> &'a [u8] {
        &self.src[token.start..token.start + token.len]
    }

    fn advance(&mut self) {
        self.current = self.lexer.next();
    }

    fn parse_uri(&mut self) -> Result<Uri, Error> {
        let mut path_bytes = Vec::new();
        self.parse_path(&mut path_bytes);

        let mut uri = Uri {
            path: String::from_utf8_lossy(&path_bytes).into_owned(),
            params: Vec::new(),
        };

        if self.current.tag == TokenTag::QueryMark {
            self.advance();
            self.parse_query(&mut uri)?;
        }

        if self.current.tag != TokenTag::Eos {
            return Err(Error::syntax(format!(
                "unexpected token at byte offset {}",
                self.current.start
            )));
        }

        Ok(uri)
    }

    fn parse_path(&mut self, out: &mut Vec<u8>) {
        loop {
            match self.current.tag {
                TokenTag::Path => {
                    out.extend_from_slice(self.lexeme(&self.current));
                    self.advance();
                }
                TokenTag::ItemEncodedChar => {
                    out.push(self.current.decoded);
                    self.advance();
                }
                _ => break,
            }
        }
    }

    fn parse_query(&mut self, uri: &mut Uri) -> Result<(), Error> {
        loop {
            self.parse_query_item(uri)?;

            if self.current.tag != TokenTag::QueryDelim {
                break;
            }
            self.advance();
        }

        Ok(())
    }

    fn parse_query_item(&mut self, uri: &mut Uri) -> Result<(), Error> {
        if self.current.tag != TokenTag::Wordy {
            return Err(Error::syntax(format!(
                "expected a parameter name at byte offset {}",
                self.current.start
            )));
        }
        let name = String::from_utf8_lossy(self.lexeme(&self.current)).into_owned();
        self.advance();

        if self.current.tag != TokenTag::QueryAssign {
            return Err(Error::syntax(format!(
                "expected '=' at byte offset {}",
                self.current.start
            )));
        }
        self.advance();

        let value = self.parse_query_value()?;
        uri.set_param(name, value);

        Ok(())
    }

    fn parse_query_value(&mut self) -> Result<QueryValue, Error> {
        match self.current.tag {
            TokenTag::ItemInt => {
                let lexeme = std::str::from_utf8(self.lexeme(&self.current)).unwrap_or("0");
                let value = lexeme.parse::<i64>().unwrap_or(0);
                self.advance();
                Ok(QueryValue::Int(value))
            }
            TokenTag::Wordy => {
                let value = String::from_utf8_lossy(self.lexeme(&self.current)).into_owned();
                self.advance();
                Ok(QueryValue::Str(value))
            }
            _ => Err(Error::syntax(format!(
                "expected a query value at byte offset {}",
                self.current.start
            ))),
        }
    }
}

/// Parses a relative URI (`<path>[?<query>]`) per spec.md §4.2.
pub(crate) fn parse(src: &str) -> Result<Uri, Error> {
    let bytes = src.as_bytes();
    let mut lexer = Lexer::new(bytes);
    let current = lexer.next();
    let mut parser = Parser { src: bytes, lexer, current };

    parser.parse_uri()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_path_with_no_query() {
        let uri = parse("/api/users").unwrap();
        assert_eq!(uri.path(), "/api/users");
        assert!(uri.params().is_empty());
    }

    #[test]
    fn typed_query_parameters() {
        let uri = parse("/a?x=1&y=hi").unwrap();
        assert_eq!(uri.path(), "/a");
        assert_eq!(uri.param("x"), Some(&QueryValue::Int(1)));
        assert_eq!(uri.param("y"), Some(&QueryValue::Str("hi".into())));
    }

    #[test]
    fn percent_decoding_preserves_adjacency() {
        let uri = parse("/%2Fetc/passwd").unwrap();
        assert_eq!(uri.path(), "//etc/passwd");
    }

    #[test]
    fn lowercase_hex_is_accepted() {
        let uri = parse("/%2fetc").unwrap();
        assert_eq!(uri.path(), "/etc");
    }

    #[test]
    fn duplicate_params_last_writer_wins() {
        let uri = parse("/a?k=1&k=2").unwrap();
        assert_eq!(uri.param("k"), Some(&QueryValue::Int(2)));
        assert_eq!(uri.params().len(), 1);
    }

    #[test]
    fn round_trips_modulo_parameter_order() {
        let first = parse("/search?q=rust&limit=10").unwrap();
        let rebuilt = format!(
            "{}?{}",
            first.path(),
            first
                .params()
                .iter()
                .map(|(k, v)| match v {
                    QueryValue::Str(s) => format!("{k}={s}"),
                    QueryValue::Int(i) => format!("{k}={i}"),
                })
                .collect::<Vec<_>>()
                .join("&")
        );
        let second = parse(&rebuilt).unwrap();
        assert_eq!(first.path(), second.path());
        assert_eq!(first.param("q"), second.param("q"));
        assert_eq!(first.param("limit"), second.param("limit"));
    }

    #[test]
    fn malformed_query_reports_offset() {
        let err = parse("/a?=1").unwrap_err();
        assert!(format!("{err}").contains("byte offset"));
    }
}
