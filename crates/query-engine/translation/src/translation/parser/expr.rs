// Pratt expression parser.
//
// Precedence, lowest to highest:
//   OR
//   AND
//   NOT (prefix)
//   = == != <> < <= > >= LIKE ILIKE NOT LIKE NOT ILIKE IN NOT IN
//   + - (binary)
//   * / %
//   - (prefix)

use query_engine_sql::sql::ast::{
    BinaryOperator, Call, CompareOperator, Constant, Expr, Field, Placeholder, UnaryOperator,
};

use super::token::{Keyword, TokenKind};
use super::{syntax_error, Parser};
use crate::translation::error::Error;

// Binding powers: higher = tighter binding.
// Left BP is checked against min_bp; right BP is passed to recursive call.
mod bp {
    pub const OR: (u8, u8) = (1, 2);
    pub const AND: (u8, u8) = (3, 4);
    pub const NOT_PREFIX: u8 = 5;
    pub const COMPARISON: (u8, u8) = (7, 8);
    pub const ADD: (u8, u8) = (9, 10);
    pub const MUL: (u8, u8) = (11, 12);
    pub const UNARY: u8 = 13;
}

/// An infix operator, and how many tokens it is spelled with.
#[derive(Clone, Copy)]
enum Infix {
    Or,
    And,
    Compare(CompareOperator, usize),
    Binary(BinaryOperator),
}

impl Parser {
    /// Parse a single expression.
    pub(crate) fn parse_expr(&mut self) -> Result<Expr, Error> {
        self.parse_expr_bp(0)
    }

    /// Parse a comma separated list of expressions, stopping before `close`.
    pub(crate) fn parse_expr_list(&mut self, close: &TokenKind) -> Result<Vec<Expr>, Error> {
        let mut exprs = vec![];
        if self.at(close) {
            return Ok(exprs);
        }
        loop {
            exprs.push(self.parse_expr()?);
            if !self.eat(&TokenKind::Comma) {
                return Ok(exprs);
            }
        }
    }

    // ── Pratt core ──────────────────────────────────────────────────────

    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr, Error> {
        self.nested(|parser| {
            let mut lhs = parser.parse_prefix()?;

            while let Some((infix, (l_bp, r_bp))) = parser.infix_bp() {
                if l_bp < min_bp {
                    break;
                }
                lhs = parser.parse_infix(lhs, infix, r_bp)?;
            }

            Ok(lhs)
        })
    }

    fn infix_bp(&self) -> Option<(Infix, (u8, u8))> {
        use CompareOperator as C;

        let compare = |operator, tokens| Some((Infix::Compare(operator, tokens), bp::COMPARISON));
        match self.peek_kind() {
            TokenKind::Keyword(Keyword::Or) => Some((Infix::Or, bp::OR)),
            TokenKind::Keyword(Keyword::And) => Some((Infix::And, bp::AND)),
            TokenKind::Eq | TokenKind::EqEq => compare(C::Eq, 1),
            TokenKind::Ne | TokenKind::LtGt => compare(C::NotEq, 1),
            TokenKind::Lt => compare(C::Lt, 1),
            TokenKind::Le => compare(C::LtE, 1),
            TokenKind::Gt => compare(C::Gt, 1),
            TokenKind::Ge => compare(C::GtE, 1),
            TokenKind::Keyword(Keyword::Like) => compare(C::Like, 1),
            TokenKind::Keyword(Keyword::ILike) => compare(C::ILike, 1),
            TokenKind::Keyword(Keyword::In) => compare(C::In, 1),
            TokenKind::Keyword(Keyword::Not) => match self.peek_kind_at(1) {
                TokenKind::Keyword(Keyword::Like) => compare(C::NotLike, 2),
                TokenKind::Keyword(Keyword::ILike) => compare(C::NotILike, 2),
                TokenKind::Keyword(Keyword::In) => compare(C::NotIn, 2),
                _ => None,
            },
            TokenKind::Plus => Some((Infix::Binary(BinaryOperator::Add), bp::ADD)),
            TokenKind::Minus => Some((Infix::Binary(BinaryOperator::Sub), bp::ADD)),
            TokenKind::Star => Some((Infix::Binary(BinaryOperator::Mult), bp::MUL)),
            TokenKind::Slash => Some((Infix::Binary(BinaryOperator::Div), bp::MUL)),
            TokenKind::Percent => Some((Infix::Binary(BinaryOperator::Mod), bp::MUL)),
            _ => None,
        }
    }

    fn parse_infix(&mut self, lhs: Expr, infix: Infix, r_bp: u8) -> Result<Expr, Error> {
        let tokens = match infix {
            Infix::Compare(_, tokens) => tokens,
            _ => 1,
        };
        for _ in 0..tokens {
            self.advance();
        }
        let rhs = self.parse_expr_bp(r_bp)?;
        Ok(match infix {
            Infix::Or => match lhs {
                Expr::Or(mut exprs) => {
                    exprs.push(rhs);
                    Expr::Or(exprs)
                }
                lhs => Expr::Or(vec![lhs, rhs]),
            },
            Infix::And => match lhs {
                Expr::And(mut exprs) => {
                    exprs.push(rhs);
                    Expr::And(exprs)
                }
                lhs => Expr::And(vec![lhs, rhs]),
            },
            Infix::Compare(operator, _) => Expr::CompareOperation {
                left: Box::new(lhs),
                operator,
                right: Box::new(rhs),
            },
            Infix::Binary(operator) => Expr::BinaryOperation {
                left: Box::new(lhs),
                operator,
                right: Box::new(rhs),
            },
        })
    }

    // ── Prefix ──────────────────────────────────────────────────────────

    fn parse_prefix(&mut self) -> Result<Expr, Error> {
        let token = self.advance();
        match token.kind.clone() {
            TokenKind::Integer(i) => Ok(Expr::Constant(Constant::Integer(i))),
            TokenKind::Float(f) => Ok(Expr::Constant(Constant::Float(f))),
            TokenKind::String(s) => Ok(Expr::Constant(Constant::String(s))),
            TokenKind::Keyword(Keyword::Null) => Ok(Expr::Constant(Constant::Null)),
            TokenKind::Keyword(Keyword::True) => Ok(Expr::Constant(Constant::Boolean(true))),
            TokenKind::Keyword(Keyword::False) => Ok(Expr::Constant(Constant::Boolean(false))),

            TokenKind::Keyword(Keyword::Not) => Ok(Expr::UnaryOperation {
                operator: UnaryOperator::Not,
                expr: Box::new(self.parse_expr_bp(bp::NOT_PREFIX)?),
            }),
            TokenKind::Minus => match self.peek_kind() {
                // negative literals are constants, not negations
                TokenKind::Integer(i) => {
                    let value = -*i;
                    self.advance();
                    Ok(Expr::Constant(Constant::Integer(value)))
                }
                TokenKind::Float(f) => {
                    let value = -*f;
                    self.advance();
                    Ok(Expr::Constant(Constant::Float(value)))
                }
                _ => Ok(Expr::UnaryOperation {
                    operator: UnaryOperator::Negate,
                    expr: Box::new(self.parse_expr_bp(bp::UNARY)?),
                }),
            },

            TokenKind::Star => Ok(Expr::Asterisk),
            TokenKind::Placeholder(name) => {
                if self.allow_placeholders {
                    Ok(Expr::Placeholder(Placeholder { name }))
                } else {
                    Err(syntax_error(
                        &token,
                        format!("Placeholders, such as {{{name}}}, are not supported in this context"),
                    ))
                }
            }

            TokenKind::LeftParen => {
                if self.at_keyword(Keyword::Select) {
                    let select = self.parse_select()?;
                    self.expect(&TokenKind::RightParen)?;
                    return Ok(Expr::SelectQuery(Box::new(select)));
                }
                let first = self.parse_expr()?;
                if self.eat(&TokenKind::Comma) {
                    let mut items = vec![first];
                    items.extend(self.parse_expr_list(&TokenKind::RightParen)?);
                    self.expect(&TokenKind::RightParen)?;
                    Ok(Expr::Tuple(items))
                } else {
                    self.expect(&TokenKind::RightParen)?;
                    Ok(first)
                }
            }
            TokenKind::LeftBracket => {
                let items = self.parse_expr_list(&TokenKind::RightBracket)?;
                self.expect(&TokenKind::RightBracket)?;
                Ok(Expr::Array(items))
            }

            TokenKind::Identifier(name) => {
                if self.eat(&TokenKind::LeftParen) {
                    let distinct = self.eat_keyword(Keyword::Distinct);
                    let args = self.parse_expr_list(&TokenKind::RightParen)?;
                    self.expect(&TokenKind::RightParen)?;
                    Ok(Expr::Call(Call {
                        name,
                        args,
                        distinct,
                    }))
                } else {
                    self.parse_field_chain(name)
                }
            }
            TokenKind::QuotedIdentifier(name) => self.parse_field_chain(name),

            TokenKind::Keyword(Keyword::Select) => Err(syntax_error(
                &token,
                "a nested SELECT must be wrapped in parentheses".to_string(),
            )),
            other => Err(syntax_error(
                &token,
                format!("unexpected {}", other.describe()),
            )),
        }
    }

    /// Read `.name` parts after the first name of a field. Keywords are plain names here, so
    /// `properties.order` is a field.
    fn parse_field_chain(&mut self, first: String) -> Result<Expr, Error> {
        let mut chain = vec![first];
        while self.eat(&TokenKind::Dot) {
            let token = self.advance();
            match token.kind.clone() {
                TokenKind::Identifier(name) | TokenKind::QuotedIdentifier(name) => chain.push(name),
                TokenKind::Keyword(keyword) => {
                    let end = token.offset + keyword.as_str().len();
                    chain.push(self.source[token.offset..end].to_string());
                }
                other => {
                    return Err(syntax_error(
                        &token,
                        format!("expected a field name after '.', got {}", other.describe()),
                    ))
                }
            }
        }
        Ok(Expr::Field(Field {
            chain,
            symbol: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse_expr;
    use super::*;
    use query_engine_sql::sql::helpers::field;

    fn constant(i: i64) -> Expr {
        Expr::Constant(Constant::Integer(i))
    }

    fn binary(left: Expr, operator: BinaryOperator, right: Expr) -> Expr {
        Expr::BinaryOperation {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(
            parse_expr("1 + 2 * 3", false).unwrap(),
            binary(
                constant(1),
                BinaryOperator::Add,
                binary(constant(2), BinaryOperator::Mult, constant(3))
            )
        );
    }

    #[test]
    fn subtraction_is_left_associative() {
        assert_eq!(
            parse_expr("1 - 2 - 3", false).unwrap(),
            binary(
                binary(constant(1), BinaryOperator::Sub, constant(2)),
                BinaryOperator::Sub,
                constant(3)
            )
        );
    }

    #[test]
    fn and_chains_are_flattened_below_or() {
        let expr = parse_expr("a = 1 and b = 2 and c = 3 or d = 4", false).unwrap();
        let Expr::Or(exprs) = expr else {
            panic!("expected OR, got {expr:?}");
        };
        assert_eq!(exprs.len(), 2);
        assert!(matches!(&exprs[0], Expr::And(ands) if ands.len() == 3));
    }

    #[test]
    fn not_applies_to_a_whole_comparison() {
        let expr = parse_expr("not event = 'a'", false).unwrap();
        assert!(matches!(
            expr,
            Expr::UnaryOperation {
                operator: UnaryOperator::Not,
                expr
            } if matches!(*expr, Expr::CompareOperation { operator: CompareOperator::Eq, .. })
        ));
    }

    #[test]
    fn negated_pattern_and_membership_operators() {
        for (text, expected) in [
            ("event not like 'a%'", CompareOperator::NotLike),
            ("event not ilike 'a%'", CompareOperator::NotILike),
            ("event not in ('a', 'b')", CompareOperator::NotIn),
            ("event <> 'a'", CompareOperator::NotEq),
            ("event == 'a'", CompareOperator::Eq),
        ] {
            let expr = parse_expr(text, false).unwrap();
            assert!(
                matches!(expr, Expr::CompareOperation { operator, .. } if operator == expected),
                "{text} parsed as {expr:?}"
            );
        }
    }

    #[test]
    fn negative_literals_are_folded() {
        assert_eq!(parse_expr("-5", false).unwrap(), constant(-5));
        assert_eq!(
            parse_expr("-event", false).unwrap(),
            Expr::UnaryOperation {
                operator: UnaryOperator::Negate,
                expr: Box::new(field(&["event"]))
            }
        );
    }

    #[test]
    fn field_chains_accept_keywords_and_quoted_names() {
        assert_eq!(
            parse_expr("properties.Order.`a b`.$browser", false).unwrap(),
            field(&["properties", "Order", "a b", "$browser"])
        );
    }

    #[test]
    fn calls_tuples_and_arrays() {
        assert_eq!(
            parse_expr("count(distinct event)", false).unwrap(),
            Expr::Call(Call {
                name: "count".to_string(),
                args: vec![field(&["event"])],
                distinct: true,
            })
        );
        assert_eq!(
            parse_expr("(1, 2)", false).unwrap(),
            Expr::Tuple(vec![constant(1), constant(2)])
        );
        assert_eq!(parse_expr("[]", false).unwrap(), Expr::Array(vec![]));
        assert_eq!(parse_expr("(((1)))", false).unwrap(), constant(1));
    }

    #[test]
    fn placeholders_only_when_allowed() {
        assert_eq!(
            parse_expr("{filter}", true).unwrap(),
            Expr::Placeholder(Placeholder {
                name: "filter".to_string()
            })
        );
        assert!(matches!(
            parse_expr("event = {filter}", false),
            Err(Error::SyntaxError {
                column: 9,
                ..
            })
        ));
    }

    #[test]
    fn unbalanced_parentheses_are_syntax_errors() {
        assert!(matches!(
            parse_expr("(1 + 2", false),
            Err(Error::SyntaxError { .. })
        ));
        assert!(matches!(
            parse_expr("1 +", false),
            Err(Error::SyntaxError { .. })
        ));
    }
}
