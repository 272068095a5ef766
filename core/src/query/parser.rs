//! Query parser.
//!
//! # Grammar
//!
//! ```text
//! expr    := operand [ op operand ]
//! operand := TERM | '(' expr ')'
//! op      := AND | OR | NOT
//! ```
//!
//! Every binary node takes exactly one operator, so `a AND b OR c` must be
//! written `( a AND b ) OR c`. `NOT` is binary (left minus right); a leading
//! `NOT` has no left operand and is rejected. Parsing keeps an explicit stack
//! of open groups instead of recursing, so nesting depth is bounded only by
//! memory.

use super::ast::{Expr, Operator};
use super::QueryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Open,
    Close,
    Op(Operator),
    Word(&'a str),
}

/// Split on single spaces; runs of spaces produce no empty tokens.
fn lex(line: &str) -> impl Iterator<Item = Token<'_>> {
    line.trim().split(' ').filter(|t| !t.is_empty()).map(|t| match t {
        "(" => Token::Open,
        ")" => Token::Close,
        _ => match Operator::from_token(t) {
            Some(op) => Token::Op(op),
            None => Token::Word(t),
        },
    })
}

/// One parenthesized group (or the whole query) being assembled.
#[derive(Default)]
struct Frame {
    left: Option<Expr>,
    op: Option<Operator>,
    complete: bool,
}

impl Frame {
    /// Check that an operand (term or group) may start here.
    fn expect_operand(&self, token: &str) -> Result<(), QueryError> {
        if self.complete {
            return Err(QueryError::Trailing(token.to_string()));
        }
        if self.left.is_some() && self.op.is_none() {
            return Err(QueryError::UnknownOperator(token.to_string()));
        }
        Ok(())
    }

    fn push_operator(&mut self, op: Operator) -> Result<(), QueryError> {
        if self.complete {
            return Err(QueryError::Trailing(op.as_str().to_string()));
        }
        if let Some(pending) = self.op {
            return Err(QueryError::MissingRightOperand(pending.as_str()));
        }
        if self.left.is_none() {
            return Err(QueryError::MissingLeftOperand(op.as_str()));
        }
        self.op = Some(op);
        Ok(())
    }

    fn attach(&mut self, operand: Expr) {
        match (self.left.take(), self.op.take()) {
            (Some(left), Some(op)) => {
                self.left = Some(Expr::binary(op, left, operand));
                self.complete = true;
            }
            _ => self.left = Some(operand),
        }
    }

    fn finish(self) -> Result<Expr, QueryError> {
        match (self.left, self.op) {
            (Some(_), Some(op)) => Err(QueryError::MissingRightOperand(op.as_str())),
            (Some(expr), None) => Ok(expr),
            (None, _) => Err(QueryError::EmptyGroup),
        }
    }
}

/// Parse one query line into an expression tree.
pub fn parse(line: &str) -> Result<Expr, QueryError> {
    let mut stack = vec![Frame::default()];
    for token in lex(line) {
        let top = stack.last_mut().ok_or(QueryError::Unbalanced)?;
        match token {
            Token::Open => {
                top.expect_operand("(")?;
                stack.push(Frame::default());
            }
            Token::Close => {
                if stack.len() == 1 {
                    return Err(QueryError::Unbalanced);
                }
                let group = stack.pop().ok_or(QueryError::Unbalanced)?.finish()?;
                if let Some(parent) = stack.last_mut() {
                    parent.attach(group);
                }
            }
            Token::Op(op) => top.push_operator(op)?,
            Token::Word(w) => {
                top.expect_operand(w)?;
                top.attach(Expr::term(w));
            }
        }
    }
    if stack.len() != 1 {
        return Err(QueryError::Unbalanced);
    }
    match stack.pop().ok_or(QueryError::Empty)?.finish() {
        Err(QueryError::EmptyGroup) => Err(QueryError::Empty),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Operator::*;

    fn t(s: &str) -> Expr { Expr::term(s) }

    #[test]
    fn simple_binary() {
        assert_eq!(parse("a AND b").unwrap(), Expr::binary(And, t("a"), t("b")));
        assert_eq!(parse("a NOT b").unwrap(), Expr::binary(Not, t("a"), t("b")));
    }

    #[test]
    fn parenthesized_operands_on_either_side() {
        let e = parse("( a AND b ) OR c").unwrap();
        assert_eq!(e, Expr::binary(Or, Expr::binary(And, t("a"), t("b")), t("c")));

        let e = parse("( hubble AND ( telescope NOT space ) )").unwrap();
        assert_eq!(e, Expr::binary(And, t("hubble"), Expr::binary(Not, t("telescope"), t("space"))));

        let e = parse("( ( iran OR africa ) NOT ( sanctions OR support ) )").unwrap();
        assert_eq!(e.to_string(), "( ( iran OR africa ) NOT ( sanctions OR support ) )");
    }

    #[test]
    fn bare_term_and_redundant_parens() {
        assert_eq!(parse("a").unwrap(), t("a"));
        assert_eq!(parse("( ( a ) )").unwrap(), t("a"));
    }

    #[test]
    fn lowercase_keywords_are_terms() {
        assert_eq!(parse("and OR not").unwrap(), Expr::binary(Or, t("and"), t("not")));
    }

    #[test]
    fn extra_spaces_are_ignored() {
        assert_eq!(parse("  a  AND   b ").unwrap(), Expr::binary(And, t("a"), t("b")));
    }

    #[test]
    fn unary_not_is_rejected() {
        assert_eq!(parse("NOT a"), Err(QueryError::MissingLeftOperand("NOT")));
        assert_eq!(parse("a AND ( NOT b )"), Err(QueryError::MissingLeftOperand("NOT")));
    }

    #[test]
    fn chained_operators_need_parens() {
        assert_eq!(parse("a AND b OR c"), Err(QueryError::Trailing("OR".into())));
        assert_eq!(parse("a AND b c"), Err(QueryError::Trailing("c".into())));
    }

    #[test]
    fn unknown_operator() {
        assert_eq!(parse("a XOR b"), Err(QueryError::UnknownOperator("XOR".into())));
        assert_eq!(parse("a ( b )"), Err(QueryError::UnknownOperator("(".into())));
    }

    #[test]
    fn structural_errors() {
        assert_eq!(parse(""), Err(QueryError::Empty));
        assert_eq!(parse("   "), Err(QueryError::Empty));
        assert_eq!(parse("( a AND b"), Err(QueryError::Unbalanced));
        assert_eq!(parse("a AND b )"), Err(QueryError::Unbalanced));
        assert_eq!(parse("a AND ( )"), Err(QueryError::EmptyGroup));
        assert_eq!(parse("a AND"), Err(QueryError::MissingRightOperand("AND")));
        assert_eq!(parse("a AND OR b"), Err(QueryError::MissingRightOperand("AND")));
    }

    #[test]
    fn deep_nesting_does_not_recurse() {
        let depth = 20_000;
        let line = format!("{}x{}", "( ".repeat(depth), " )".repeat(depth));
        assert_eq!(parse(&line).unwrap(), t("x"));
    }
}
