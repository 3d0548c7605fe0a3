//! Tokenizer for VRML97 text.
//!
//! Produces a lazy stream of [`Token`]s. Whitespace and `#` comments
//! (including the `#VRML V2.0 utf8` header) are skipped; commas are
//! reported as punctuation and left to the parser to ignore.

use std::fmt;

use thiserror::Error;

/// 1-based line/column position in the source text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SourcePos {
    pub line: usize,
    pub column: usize,
}

impl SourcePos {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Errors produced while tokenizing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexError {
    #[error("Unterminated string starting at {pos}")]
    UnterminatedString { pos: SourcePos },

    #[error("Invalid number literal '{text}' at {pos}")]
    InvalidNumber { text: String, pos: SourcePos },

    #[error("Unexpected character '{ch}' at {pos}")]
    UnexpectedChar { ch: char, pos: SourcePos },
}

impl LexError {
    /// Position of the offending input.
    pub fn pos(&self) -> SourcePos {
        match self {
            LexError::UnterminatedString { pos }
            | LexError::InvalidNumber { pos, .. }
            | LexError::UnexpectedChar { pos, .. } => *pos,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Identifier,
    /// Numeric literal; integers (including hex) are exact in an f64.
    Number(f64),
    /// Quoted string; `Token::text` holds the unescaped contents.
    String,
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,
    Comma,
    Period,
}

/// A single lexical token.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub pos: SourcePos,
}

impl Token {
    pub fn is_identifier(&self, name: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text == name
    }

    /// Short human-readable form used in error messages.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::String => format!("string \"{}\"", self.text),
            TokenKind::Number(_) => format!("number {}", self.text),
            TokenKind::Identifier => format!("'{}'", self.text),
            _ => format!("'{}'", self.text),
        }
    }
}

/// Lazy tokenizer over a source string.
///
/// Iteration stops after the first error. [`Lexer::reset`] rewinds to the
/// start of the input.
pub struct Lexer<'a> {
    source: &'a str,
    offset: usize,
    line: usize,
    column: usize,
    failed: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            column: 1,
            failed: false,
        }
    }

    /// Rewind to the beginning of the input.
    pub fn reset(&mut self) {
        self.offset = 0;
        self.line = 1;
        self.column = 1;
        self.failed = false;
    }

    /// Current position (of the next unread character).
    pub fn pos(&self) -> SourcePos {
        SourcePos::new(self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.source[self.offset..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.source[self.offset..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.bump();
                }
            } else {
                break;
            }
        }
    }

    fn starts_number(&self) -> bool {
        let is_digit = |c: Option<char>| c.is_some_and(|c| c.is_ascii_digit());
        match self.peek() {
            Some(c) if c.is_ascii_digit() => true,
            Some('.') => is_digit(self.peek_nth(1)),
            Some('+') | Some('-') => {
                is_digit(self.peek_nth(1))
                    || (self.peek_nth(1) == Some('.') && is_digit(self.peek_nth(2)))
            }
            _ => false,
        }
    }

    fn lex_number(&mut self, pos: SourcePos) -> Result<Token, LexError> {
        let start = self.offset;
        let mut prev = '\0';
        while let Some(c) = self.peek() {
            let sign_ok = (c == '+' || c == '-')
                && (self.offset == start || matches!(prev, 'e' | 'E'));
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || sign_ok {
                prev = c;
                self.bump();
            } else {
                break;
            }
        }

        let text = &self.source[start..self.offset];
        parse_number(text)
            .map(|value| Token {
                kind: TokenKind::Number(value),
                text: text.to_string(),
                pos,
            })
            .ok_or_else(|| LexError::InvalidNumber {
                text: text.to_string(),
                pos,
            })
    }

    fn lex_string(&mut self, pos: SourcePos) -> Result<Token, LexError> {
        self.bump(); // opening quote
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('"') => break,
                Some('\\') => match self.bump() {
                    Some(escaped) => value.push(escaped),
                    None => return Err(LexError::UnterminatedString { pos }),
                },
                Some(c) => value.push(c),
                None => return Err(LexError::UnterminatedString { pos }),
            }
        }
        Ok(Token {
            kind: TokenKind::String,
            text: value,
            pos,
        })
    }

    fn lex_identifier(&mut self, pos: SourcePos) -> Token {
        let start = self.offset;
        while let Some(c) = self.peek() {
            if is_identifier_char(c) {
                self.bump();
            } else {
                break;
            }
        }
        Token {
            kind: TokenKind::Identifier,
            text: self.source[start..self.offset].to_string(),
            pos,
        }
    }

    fn next_token(&mut self) -> Option<Result<Token, LexError>> {
        self.skip_trivia();
        let pos = self.pos();
        let c = self.peek()?;

        let punct = match c {
            '{' => Some(TokenKind::OpenBrace),
            '}' => Some(TokenKind::CloseBrace),
            '[' => Some(TokenKind::OpenBracket),
            ']' => Some(TokenKind::CloseBracket),
            ',' => Some(TokenKind::Comma),
            '.' if !self.starts_number() => Some(TokenKind::Period),
            _ => None,
        };
        if let Some(kind) = punct {
            self.bump();
            return Some(Ok(Token {
                kind,
                text: c.to_string(),
                pos,
            }));
        }

        if c == '"' {
            return Some(self.lex_string(pos));
        }
        if self.starts_number() {
            return Some(self.lex_number(pos));
        }
        if is_identifier_char(c) && !matches!(c, '+' | '-') {
            return Some(Ok(self.lex_identifier(pos)));
        }

        self.bump();
        Some(Err(LexError::UnexpectedChar { ch: c, pos }))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let token = self.next_token();
        if matches!(token, Some(Err(_))) {
            self.failed = true;
        }
        token
    }
}

fn is_identifier_char(c: char) -> bool {
    !c.is_whitespace()
        && !c.is_control()
        && !matches!(c, '"' | '\'' | '#' | ',' | '.' | '[' | ']' | '{' | '}' | '\\')
}

fn parse_number(text: &str) -> Option<f64> {
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        let value = i64::from_str_radix(hex, 16).ok()? as f64;
        return Some(if negative { -value } else { value });
    }

    // Rust's float parser accepts words like "inf"; a VRML number never starts
    // with a letter, so only digits and '.' are allowed after the sign.
    if !digits.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }
    let value = digits.parse::<f64>().ok()?;
    // Every float field is stored as f32
    if !(value as f32).is_finite() {
        return None;
    }
    Some(if negative { -value } else { value })
}

/// Tokenize a whole string, stopping at the first error.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_node_header() {
        let tokens = tokenize("DEF Box1 Transform {").unwrap();
        assert_eq!(tokens.len(), 4);
        assert!(tokens[0].is_identifier("DEF"));
        assert!(tokens[1].is_identifier("Box1"));
        assert!(tokens[2].is_identifier("Transform"));
        assert_eq!(tokens[3].kind, TokenKind::OpenBrace);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("1 -2 3.5 .25 -0.5e2 1E-3 0x1F"),
            vec![
                TokenKind::Number(1.0),
                TokenKind::Number(-2.0),
                TokenKind::Number(3.5),
                TokenKind::Number(0.25),
                TokenKind::Number(-50.0),
                TokenKind::Number(0.001),
                TokenKind::Number(31.0),
            ]
        );
    }

    #[test]
    fn test_commas_and_terminators() {
        assert_eq!(
            kinds("[0, 1, 2, -1]"),
            vec![
                TokenKind::OpenBracket,
                TokenKind::Number(0.0),
                TokenKind::Comma,
                TokenKind::Number(1.0),
                TokenKind::Comma,
                TokenKind::Number(2.0),
                TokenKind::Comma,
                TokenKind::Number(-1.0),
                TokenKind::CloseBracket,
            ]
        );
    }

    #[test]
    fn test_comments_and_header_skipped() {
        let source = "#VRML V2.0 utf8\n# a comment line\nGroup { } # trailing\n";
        let tokens = tokenize(source).unwrap();
        assert_eq!(tokens.len(), 3);
        assert!(tokens[0].is_identifier("Group"));
        assert_eq!(tokens[0].pos, SourcePos::new(3, 1));
    }

    #[test]
    fn test_route_statement_periods() {
        let tokens = tokenize("ROUTE Clock.fraction_changed TO Path.set_fraction").unwrap();
        let texts: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["ROUTE", "Clock", ".", "fraction_changed", "TO", "Path", ".", "set_fraction"]
        );
        assert_eq!(tokens[2].kind, TokenKind::Period);
    }

    #[test]
    fn test_string_escapes() {
        let tokens = tokenize(r#"url "tex \"a\".png""#).unwrap();
        assert_eq!(tokens[1].kind, TokenKind::String);
        assert_eq!(tokens[1].text, "tex \"a\".png");
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("Shape {\n  url \"open").unwrap_err();
        assert_eq!(
            err,
            LexError::UnterminatedString {
                pos: SourcePos::new(2, 7)
            }
        );
    }

    #[test]
    fn test_invalid_number() {
        let err = tokenize("translation 1.2.3 0 0").unwrap_err();
        match err {
            LexError::InvalidNumber { text, pos } => {
                assert_eq!(text, "1.2.3");
                assert_eq!(pos, SourcePos::new(1, 13));
            }
            other => panic!("Expected InvalidNumber, got {:?}", other),
        }

        assert!(matches!(
            tokenize("scale 2abc").unwrap_err(),
            LexError::InvalidNumber { .. }
        ));
    }

    #[test]
    fn test_out_of_range_number() {
        match tokenize("point [ 1e999 0 0 ]").unwrap_err() {
            LexError::InvalidNumber { text, pos } => {
                assert_eq!(text, "1e999");
                assert_eq!(pos, SourcePos::new(1, 9));
            }
            other => panic!("Expected InvalidNumber, got {:?}", other),
        }

        assert!(matches!(
            tokenize("shininess -1e39").unwrap_err(),
            LexError::InvalidNumber { .. }
        ));
        assert_eq!(kinds("3.4e38"), vec![TokenKind::Number(3.4e38)]);
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("Group \\ { }").unwrap_err();
        assert!(matches!(err, LexError::UnexpectedChar { ch: '\\', .. }));
    }

    #[test]
    fn test_lexer_stops_after_error_and_resets() {
        let mut lexer = Lexer::new("a \"b");
        assert!(lexer.next().unwrap().is_ok());
        assert!(lexer.next().unwrap().is_err());
        assert!(lexer.next().is_none());

        lexer.reset();
        let first = lexer.next().unwrap().unwrap();
        assert!(first.is_identifier("a"));
        assert_eq!(first.pos, SourcePos::new(1, 1));
    }
}
