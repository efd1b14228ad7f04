//! SELECT queries, FROM clauses and joins.

use query_engine_sql::sql::ast::{
    Alias, Expr, JoinExpr, JoinTable, JoinType, OrderDirection, OrderExpr, SelectQuery,
};
use query_engine_sql::sql::helpers::simple_select;

use super::token::{Keyword, TokenKind};
use super::Parser;
use crate::translation::error::Error;

impl Parser {
    /// `SELECT [DISTINCT] select_list [FROM ...] [PREWHERE ...] [WHERE ...] [GROUP BY ...]
    /// [HAVING ...] [ORDER BY ...] [LIMIT ...]`
    pub(crate) fn parse_select(&mut self) -> Result<SelectQuery, Error> {
        self.expect_keyword(Keyword::Select)?;
        let distinct = self.eat_keyword(Keyword::Distinct);

        let mut select = simple_select(self.parse_select_list()?);
        select.distinct = distinct;

        if self.eat_keyword(Keyword::From) {
            select.select_from = Some(self.parse_join_table(None)?);
            while let Some(join_type) = self.parse_join_type()? {
                let mut join = self.parse_join_table(Some(join_type))?;
                if join_type != JoinType::Cross {
                    self.expect_keyword(Keyword::On)?;
                    join.constraint = Some(self.parse_expr()?);
                }
                select.joins.push(join);
            }
        }

        // ClickHouse puts PREWHERE first, but both orders are accepted
        if self.eat_keyword(Keyword::Prewhere) {
            select.prewhere = Some(self.parse_expr()?);
        }
        if self.eat_keyword(Keyword::Where) {
            select.where_ = Some(self.parse_expr()?);
        }
        if select.prewhere.is_none() && self.eat_keyword(Keyword::Prewhere) {
            select.prewhere = Some(self.parse_expr()?);
        }

        if self.eat_keyword(Keyword::Group) {
            self.expect_keyword(Keyword::By)?;
            select.group_by = self.parse_nonempty_list()?;
        }
        if self.eat_keyword(Keyword::Having) {
            select.having = Some(self.parse_expr()?);
        }
        if self.eat_keyword(Keyword::Order) {
            self.expect_keyword(Keyword::By)?;
            loop {
                let expr = self.parse_expr()?;
                let direction = if self.eat_keyword(Keyword::Desc) {
                    OrderDirection::Desc
                } else {
                    self.eat_keyword(Keyword::Asc);
                    OrderDirection::Asc
                };
                select.order_by.push(OrderExpr { expr, direction });
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        if self.eat_keyword(Keyword::Limit) {
            let first = self.parse_unsigned()?;
            if self.eat(&TokenKind::Comma) {
                // LIMIT offset, count
                select.offset = Some(first);
                select.limit = Some(self.parse_unsigned()?);
            } else {
                select.limit = Some(first);
                if self.eat_keyword(Keyword::Offset) {
                    select.offset = Some(self.parse_unsigned()?);
                }
            }
        }

        Ok(select)
    }

    fn parse_select_list(&mut self) -> Result<Vec<Expr>, Error> {
        let mut columns = vec![];
        loop {
            let expr = self.parse_expr()?;
            columns.push(self.parse_alias(expr)?);
            if !self.eat(&TokenKind::Comma) {
                return Ok(columns);
            }
        }
    }

    /// `expr [AS] alias`
    fn parse_alias(&mut self, expr: Expr) -> Result<Expr, Error> {
        let alias = if self.eat_keyword(Keyword::As) {
            Some(self.expect_identifier()?)
        } else {
            self.parse_implicit_alias()
        };
        Ok(match alias {
            Some(alias) => Expr::Alias(Alias {
                alias,
                expr: Box::new(expr),
            }),
            None => expr,
        })
    }

    /// An alias written without `AS`: any identifier that is not a keyword.
    fn parse_implicit_alias(&mut self) -> Option<String> {
        match self.peek_kind() {
            TokenKind::Identifier(name) | TokenKind::QuotedIdentifier(name) => {
                let name = name.clone();
                self.advance();
                Some(name)
            }
            _ => None,
        }
    }

    fn parse_nonempty_list(&mut self) -> Result<Vec<Expr>, Error> {
        let mut exprs = vec![self.parse_expr()?];
        while self.eat(&TokenKind::Comma) {
            exprs.push(self.parse_expr()?);
        }
        Ok(exprs)
    }

    /// A table name or a parenthesized SELECT, with an optional alias.
    fn parse_join_table(&mut self, join_type: Option<JoinType>) -> Result<JoinExpr, Error> {
        let table = if self.eat(&TokenKind::LeftParen) {
            let select = self.nested(Parser::parse_select)?;
            self.expect(&TokenKind::RightParen)?;
            JoinTable::SelectQuery(Box::new(select))
        } else {
            JoinTable::Table(self.expect_identifier()?)
        };
        let alias = if self.eat_keyword(Keyword::As) {
            Some(self.expect_identifier()?)
        } else {
            self.parse_implicit_alias()
        };
        Ok(JoinExpr {
            join_type,
            table,
            alias,
            constraint: None,
            symbol: None,
        })
    }

    /// `[INNER | LEFT [OUTER] | RIGHT [OUTER] | FULL [OUTER]] JOIN` or `CROSS JOIN`. `None` if
    /// no join follows.
    fn parse_join_type(&mut self) -> Result<Option<JoinType>, Error> {
        let join_type = match self.peek_kind() {
            TokenKind::Keyword(Keyword::Join) => JoinType::Inner,
            TokenKind::Keyword(Keyword::Inner) => {
                self.advance();
                JoinType::Inner
            }
            TokenKind::Keyword(Keyword::Left) => {
                self.advance();
                self.eat_keyword(Keyword::Outer);
                JoinType::Left
            }
            TokenKind::Keyword(Keyword::Right) => {
                self.advance();
                self.eat_keyword(Keyword::Outer);
                JoinType::Right
            }
            TokenKind::Keyword(Keyword::Full) => {
                self.advance();
                self.eat_keyword(Keyword::Outer);
                JoinType::Full
            }
            TokenKind::Keyword(Keyword::Cross) => {
                self.advance();
                JoinType::Cross
            }
            _ => return Ok(None),
        };
        self.expect_keyword(Keyword::Join)?;
        Ok(Some(join_type))
    }

    fn parse_unsigned(&mut self) -> Result<u64, Error> {
        match self.peek_kind() {
            TokenKind::Integer(value) => match u64::try_from(*value) {
                Ok(value) => {
                    self.advance();
                    Ok(value)
                }
                Err(_) => Err(self.error_here("expected a non-negative integer")),
            },
            TokenKind::Minus => Err(self.error_here("expected a non-negative integer")),
            _ => Err(self.unexpected("an integer")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse_select;
    use super::*;
    use query_engine_sql::sql::ast::{Call, Constant};
    use query_engine_sql::sql::helpers::field;

    #[test]
    fn minimal_select() {
        let select = parse_select("SELECT 1", false).unwrap();
        assert_eq!(
            select,
            simple_select(vec![Expr::Constant(Constant::Integer(1))])
        );
    }

    #[test]
    fn every_clause() {
        let select = parse_select(
            "select distinct event as e, count() c from events as ev \
             where timestamp > '2023-01-01' group by e having c > 1 \
             order by c desc, e limit 10 offset 5",
            false,
        )
        .unwrap();
        assert!(select.distinct);
        assert_eq!(
            select.select,
            vec![
                Expr::Alias(Alias {
                    alias: "e".to_string(),
                    expr: Box::new(field(&["event"])),
                }),
                Expr::Alias(Alias {
                    alias: "c".to_string(),
                    expr: Box::new(Expr::Call(Call {
                        name: "count".to_string(),
                        args: vec![],
                        distinct: false,
                    })),
                }),
            ]
        );
        let from = select.select_from.unwrap();
        assert_eq!(from.table, JoinTable::Table("events".to_string()));
        assert_eq!(from.alias.as_deref(), Some("ev"));
        assert!(select.where_.is_some());
        assert_eq!(select.group_by, vec![field(&["e"])]);
        assert!(select.having.is_some());
        assert_eq!(
            select.order_by,
            vec![
                OrderExpr {
                    expr: field(&["c"]),
                    direction: OrderDirection::Desc
                },
                OrderExpr {
                    expr: field(&["e"]),
                    direction: OrderDirection::Asc
                },
            ]
        );
        assert_eq!(select.limit, Some(10));
        assert_eq!(select.offset, Some(5));
    }

    #[test]
    fn limit_with_comma_is_offset_then_count() {
        let select = parse_select("SELECT 1 LIMIT 5, 10", false).unwrap();
        assert_eq!(select.offset, Some(5));
        assert_eq!(select.limit, Some(10));
    }

    #[test]
    fn negative_limit_is_rejected() {
        assert!(matches!(
            parse_select("SELECT 1 LIMIT -1", false),
            Err(Error::SyntaxError { .. })
        ));
    }

    #[test]
    fn joins() {
        let select = parse_select(
            "SELECT 1 FROM events e LEFT OUTER JOIN persons p ON e.person_id = p.id \
             CROSS JOIN groups JOIN (SELECT 1 AS x) AS sub ON 1 = 1",
            false,
        )
        .unwrap();
        let kinds = select
            .joins
            .iter()
            .map(|join| (join.join_type, join.alias.clone(), join.constraint.is_some()))
            .collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                (Some(JoinType::Left), Some("p".to_string()), true),
                (Some(JoinType::Cross), None, false),
                (Some(JoinType::Inner), Some("sub".to_string()), true),
            ]
        );
        assert!(matches!(
            select.joins[2].table,
            JoinTable::SelectQuery(_)
        ));
    }

    #[test]
    fn join_without_constraint_is_rejected() {
        assert!(matches!(
            parse_select("SELECT 1 FROM events JOIN persons", false),
            Err(Error::SyntaxError { .. })
        ));
    }

    #[test]
    fn nested_select_in_expression() {
        let select = parse_select(
            "SELECT event FROM events WHERE distinct_id IN (SELECT distinct_id FROM persons)",
            false,
        )
        .unwrap();
        assert!(matches!(
            select.where_,
            Some(Expr::CompareOperation { right, .. }) if matches!(*right, Expr::SelectQuery(_))
        ));
    }

    #[test]
    fn placeholders_in_strict_mode_are_syntax_errors() {
        assert!(matches!(
            parse_select("SELECT event FROM events WHERE {filter}", false),
            Err(Error::SyntaxError { .. })
        ));
        assert!(parse_select("SELECT event FROM events WHERE {filter}", true).is_ok());
    }
}
