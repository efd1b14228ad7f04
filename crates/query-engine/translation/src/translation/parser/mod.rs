//! Turn HogQL text into an AST.
//!
//! There is one parser with two entry points. `parse_expr` reads a single expression, while
//! `parse_select` reads a full SELECT query. Both share the expression grammar in `expr`.

mod expr;
pub mod lexer;
mod select;
pub mod token;

use query_engine_sql::sql::ast::{Expr, SelectQuery};

use super::error::Error;
use lexer::Lexer;
use token::{Keyword, Token, TokenKind};

/// How deeply expressions and subqueries may nest.
const MAX_NESTING_DEPTH: usize = 128;

/// Parse a single expression.
pub fn parse_expr(text: &str, allow_placeholders: bool) -> Result<Expr, Error> {
    let mut parser = Parser::new(text, allow_placeholders)?;
    let expr = parser.parse_expr()?;
    parser.expect_end(false)?;
    Ok(expr)
}

/// Parse a full SELECT query. A single trailing `;` is accepted.
pub fn parse_select(text: &str, allow_placeholders: bool) -> Result<SelectQuery, Error> {
    let mut parser = Parser::new(text, allow_placeholders)?;
    let select = parser.parse_select()?;
    parser.expect_end(true)?;
    Ok(select)
}

/// Recursive descent over a token vector.
pub(crate) struct Parser {
    source: String,
    tokens: Vec<Token>,
    pos: usize,
    allow_placeholders: bool,
    depth: usize,
}

impl Parser {
    fn new(text: &str, allow_placeholders: bool) -> Result<Parser, Error> {
        if text.trim().is_empty() {
            return Err(Error::EmptyQuery);
        }
        let tokens = Lexer::tokenize(text);
        // lexing failures are reported before any grammar error
        if let Some(token) = tokens
            .iter()
            .find(|token| matches!(token.kind, TokenKind::Error(_)))
        {
            return Err(syntax_error(token, token.kind.describe()));
        }
        // a query made only of comments
        if tokens.len() == 1 {
            return Err(Error::EmptyQuery);
        }
        Ok(Parser {
            source: text.to_string(),
            tokens,
            pos: 0,
            allow_placeholders,
            depth: 0,
        })
    }

    // ── Token helpers ───────────────────────────────────────────────────

    fn peek(&self) -> &Token {
        // the vector always ends with Eof, and `advance` never moves past it
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn peek_kind_at(&self, offset: usize) -> &TokenKind {
        let index = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[index].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn at(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn at_keyword(&self, keyword: Keyword) -> bool {
        self.peek_kind() == &TokenKind::Keyword(keyword)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        self.eat(&TokenKind::Keyword(keyword))
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), Error> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.unexpected(&kind.describe()))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), Error> {
        self.expect(&TokenKind::Keyword(keyword))
    }

    /// An identifier, quoted or not.
    fn expect_identifier(&mut self) -> Result<String, Error> {
        match self.peek_kind() {
            TokenKind::Identifier(name) | TokenKind::QuotedIdentifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    fn expect_end(&mut self, allow_semicolon: bool) -> Result<(), Error> {
        if allow_semicolon {
            self.eat(&TokenKind::Semicolon);
        }
        if self.at(&TokenKind::Eof) {
            Ok(())
        } else {
            Err(self.unexpected("end of input"))
        }
    }

    /// Run `parse` one nesting level deeper.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Parser) -> Result<T, Error>,
    ) -> Result<T, Error> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error_here(format!(
                "expressions nested more than {MAX_NESTING_DEPTH} levels deep"
            )));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn unexpected(&self, expected: &str) -> Error {
        let token = self.peek();
        syntax_error(
            token,
            format!("expected {expected}, got {}", token.kind.describe()),
        )
    }

    fn error_here(&self, message: impl Into<String>) -> Error {
        syntax_error(self.peek(), message.into())
    }
}

fn syntax_error(token: &Token, message: String) -> Error {
    Error::SyntaxError {
        message,
        line: token.line,
        column: token.column,
        offset: token.offset,
    }
}
