//! Converts HogQL text into a stream of tokens, tracking line and column for error reporting.

use super::token::{Keyword, Token, TokenKind};

/// HogQL lexer that produces a stream of tokens from source text.
pub struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            src: source.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the entire input. The last token is always `Eof`.
    pub fn tokenize(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    /// Produce the next token.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        let offset = self.pos;
        let line = self.line;
        let column = self.column;

        let kind = match self.peek() {
            None => TokenKind::Eof,
            Some(ch) => match ch {
                b'\'' => self.lex_quoted(b'\'', TokenKind::String, "string literal"),
                b'"' => self.lex_quoted(b'"', TokenKind::QuotedIdentifier, "identifier"),
                b'`' => self.lex_quoted(b'`', TokenKind::QuotedIdentifier, "identifier"),
                b'0'..=b'9' => self.lex_number(),
                b'a'..=b'z' | b'A'..=b'Z' | b'_' | b'$' => self.lex_identifier(),
                b'{' => self.lex_placeholder(),
                b'<' => {
                    self.advance();
                    match self.peek() {
                        Some(b'=') => self.then(TokenKind::Le),
                        Some(b'>') => self.then(TokenKind::LtGt),
                        _ => TokenKind::Lt,
                    }
                }
                b'>' => {
                    self.advance();
                    match self.peek() {
                        Some(b'=') => self.then(TokenKind::Ge),
                        _ => TokenKind::Gt,
                    }
                }
                b'=' => {
                    self.advance();
                    match self.peek() {
                        Some(b'=') => self.then(TokenKind::EqEq),
                        _ => TokenKind::Eq,
                    }
                }
                b'!' => {
                    self.advance();
                    match self.peek() {
                        Some(b'=') => self.then(TokenKind::Ne),
                        _ => TokenKind::Error("unexpected character '!'".to_string()),
                    }
                }
                b'+' => self.then(TokenKind::Plus),
                b'-' => self.then(TokenKind::Minus),
                b'*' => self.then(TokenKind::Star),
                b'/' => self.then(TokenKind::Slash),
                b'%' => self.then(TokenKind::Percent),
                b'.' => self.then(TokenKind::Dot),
                b',' => self.then(TokenKind::Comma),
                b';' => self.then(TokenKind::Semicolon),
                b'(' => self.then(TokenKind::LeftParen),
                b')' => self.then(TokenKind::RightParen),
                b'[' => self.then(TokenKind::LeftBracket),
                b']' => self.then(TokenKind::RightBracket),
                _ => {
                    let rest = String::from_utf8_lossy(&self.src[self.pos..]);
                    let unexpected = rest.chars().next().unwrap_or('?');
                    for _ in 0..unexpected.len_utf8() {
                        self.advance();
                    }
                    TokenKind::Error(format!("unexpected character '{unexpected}'"))
                }
            },
        };

        Token {
            kind,
            offset,
            line,
            column,
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn advance(&mut self) {
        let ch = self.src[self.pos];
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.column = 1;
        } else if ch & 0xC0 != 0x80 {
            // continuation bytes of a multi-byte character do not start a new column
            self.column += 1;
        }
    }

    /// Consume one byte and return `kind`.
    fn then(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    /// Skip whitespace, line comments (`--`) and block comments (`/* */`).
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
                self.advance();
            }
            if self.peek() == Some(b'-') && self.peek_at(1) == Some(b'-') {
                while self.peek().is_some_and(|c| c != b'\n') {
                    self.advance();
                }
                continue;
            }
            if self.peek() == Some(b'/') && self.peek_at(1) == Some(b'*') {
                self.advance();
                self.advance();
                while self.peek().is_some() {
                    if self.peek() == Some(b'*') && self.peek_at(1) == Some(b'/') {
                        self.advance();
                        self.advance();
                        break;
                    }
                    self.advance();
                }
                continue;
            }
            break;
        }
    }

    // -----------------------------------------------------------------------
    // Tokenizers
    // -----------------------------------------------------------------------

    /// Lex text between two `quote` characters. Backslash escapes are applied, and a doubled
    /// quote stands for itself.
    fn lex_quoted(
        &mut self,
        quote: u8,
        make: fn(String) -> TokenKind,
        what: &str,
    ) -> TokenKind {
        self.advance();
        let mut value: Vec<u8> = Vec::new();
        loop {
            match self.peek() {
                None => return TokenKind::Error(format!("unterminated {what}")),
                Some(b'\\') => {
                    self.advance();
                    let Some(escaped) = self.peek() else {
                        return TokenKind::Error(format!("unterminated {what}"));
                    };
                    value.push(match escaped {
                        b'b' => 0x08,
                        b'f' => 0x0c,
                        b'r' => b'\r',
                        b'n' => b'\n',
                        b't' => b'\t',
                        b'0' => 0,
                        b'a' => 0x07,
                        b'v' => 0x0b,
                        other => other,
                    });
                    self.advance();
                }
                Some(c) if c == quote => {
                    self.advance();
                    if self.peek() == Some(quote) {
                        value.push(quote);
                        self.advance();
                    } else {
                        return make(String::from_utf8_lossy(&value).into_owned());
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }
    }

    /// Lex an integer or a float: digits, an optional fraction and an optional exponent.
    fn lex_number(&mut self) -> TokenKind {
        let start = self.pos;
        let mut is_float = false;
        self.skip_digits();
        if self.peek() == Some(b'.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.advance();
            self.skip_digits();
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let sign = usize::from(matches!(self.peek_at(1), Some(b'+' | b'-')));
            if self.peek_at(1 + sign).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                for _ in 0..=sign {
                    self.advance();
                }
                self.skip_digits();
            }
        }
        if self.peek().is_some_and(|c| c.is_ascii_alphabetic() || c == b'_') {
            return TokenKind::Error("invalid number literal".to_string());
        }

        let text = String::from_utf8_lossy(&self.src[start..self.pos]);
        if is_float {
            match text.parse::<f64>() {
                Ok(value) => TokenKind::Float(value),
                Err(_) => TokenKind::Error(format!("invalid number literal {text}")),
            }
        } else {
            match text.parse::<i64>() {
                Ok(value) => TokenKind::Integer(value),
                Err(_) => TokenKind::Error(format!("integer literal {text} is out of range")),
            }
        }
    }

    fn skip_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn lex_identifier(&mut self) -> TokenKind {
        let text = self.read_word();
        match Keyword::from_identifier(&text) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Identifier(text),
        }
    }

    fn read_word(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_' || c == b'$')
        {
            self.advance();
        }
        String::from_utf8_lossy(&self.src[start..self.pos]).into_owned()
    }

    /// Lex `{name}`.
    fn lex_placeholder(&mut self) -> TokenKind {
        self.advance();
        self.skip_whitespace_and_comments();
        let name = match self.peek() {
            Some(b'a'..=b'z' | b'A'..=b'Z' | b'_' | b'$') => self.read_word(),
            _ => return TokenKind::Error("expected a placeholder name after '{'".to_string()),
        };
        self.skip_whitespace_and_comments();
        if self.peek() == Some(b'}') {
            self.advance();
            TokenKind::Placeholder(name)
        } else {
            TokenKind::Error("expected '}' to close the placeholder".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source)
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn lexes_a_simple_query() {
        assert_eq!(
            kinds("select count() from events"),
            vec![
                TokenKind::Keyword(Keyword::Select),
                TokenKind::Identifier("count".to_string()),
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::Keyword(Keyword::From),
                TokenKind::Identifier("events".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn dollar_identifiers_and_quoted_identifiers() {
        assert_eq!(
            kinds("properties.$browser `a b` \"c\"\"d\""),
            vec![
                TokenKind::Identifier("properties".to_string()),
                TokenKind::Dot,
                TokenKind::Identifier("$browser".to_string()),
                TokenKind::QuotedIdentifier("a b".to_string()),
                TokenKind::QuotedIdentifier("c\"d".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(
            kinds("1 2.5 1e3 3.0E-2"),
            vec![
                TokenKind::Integer(1),
                TokenKind::Float(2.5),
                TokenKind::Float(1000.0),
                TokenKind::Float(0.03),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn integer_overflow_is_an_error_token() {
        assert!(matches!(
            kinds("99999999999999999999")[0],
            TokenKind::Error(_)
        ));
    }

    #[test]
    fn strings_apply_escapes() {
        assert_eq!(
            kinds(r"'it\'s' 'a''b' 'tab\there'"),
            vec![
                TokenKind::String("it's".to_string()),
                TokenKind::String("a'b".to_string()),
                TokenKind::String("tab\there".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_string_is_an_error_token() {
        assert_eq!(
            kinds("'abc"),
            vec![
                TokenKind::Error("unterminated string literal".to_string()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn operators() {
        assert_eq!(
            kinds("= == != <> < <= > >="),
            vec![
                TokenKind::Eq,
                TokenKind::EqEq,
                TokenKind::Ne,
                TokenKind::LtGt,
                TokenKind::Lt,
                TokenKind::Le,
                TokenKind::Gt,
                TokenKind::Ge,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn placeholders() {
        assert_eq!(
            kinds("{ filter }"),
            vec![
                TokenKind::Placeholder("filter".to_string()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn comments_are_skipped_and_positions_tracked() {
        let tokens = Lexer::tokenize("-- comment\n/* block */ event");
        assert_eq!(tokens[0].kind, TokenKind::Identifier("event".to_string()));
        assert_eq!((tokens[0].line, tokens[0].column), (2, 13));
        assert_eq!(tokens[0].offset, 23);
    }
}
