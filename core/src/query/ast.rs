use std::fmt;
use std::mem;

/// Binary set operators. `Not` is set difference (left minus right), never complement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    And,
    Or,
    Not,
}

impl Operator {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "AND" => Some(Operator::And),
            "OR" => Some(Operator::Or),
            "NOT" => Some(Operator::Not),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Not => "NOT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Term(String),
    Binary { op: Operator, left: Box<Expr>, right: Box<Expr> },
}

impl Expr {
    pub fn term(t: impl Into<String>) -> Self { Expr::Term(t.into()) }

    pub fn binary(op: Operator, left: Expr, right: Expr) -> Self {
        Expr::Binary { op, left: Box::new(left), right: Box::new(right) }
    }
}

// Children are detached onto a heap stack before each node is freed, so
// dropping a deeply nested tree never recurses more than one level.
impl Drop for Expr {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        detach_children(self, &mut pending);
        while let Some(mut node) = pending.pop() {
            detach_children(&mut node, &mut pending);
        }
    }
}

fn detach_children(node: &mut Expr, pending: &mut Vec<Expr>) {
    if let Expr::Binary { left, right, .. } = node {
        pending.push(mem::replace(left.as_mut(), Expr::Term(String::new())));
        pending.push(mem::replace(right.as_mut(), Expr::Term(String::new())));
    }
}

/// Renders fully parenthesized, e.g. `( ( a AND b ) OR c )`.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Term(t) => f.write_str(t),
            Expr::Binary { op, left, right } => write!(f, "( {left} {} {right} )", op.as_str()),
        }
    }
}
