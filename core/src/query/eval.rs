use super::ast::{Expr, Operator};
use crate::postings::PostingStore;
use crate::InvertedIndex;
use std::borrow::Cow;

enum Step<'e> {
    Visit(&'e Expr),
    Apply(Operator),
}

fn apply(op: Operator, left: &PostingStore, right: &PostingStore) -> PostingStore {
    match op {
        Operator::And => left.intersection(right),
        Operator::Or => left.union(right),
        Operator::Not => left.difference(right),
    }
}

/// Evaluate `expr` against `index`.
///
/// Returns `None` if any term in the expression was never indexed, which is
/// distinct from a query that matches no documents. The tree is walked in
/// post-order with explicit work and value stacks.
pub fn evaluate(expr: &Expr, index: &InvertedIndex) -> Option<PostingStore> {
    let analyzer = index.analyzer();
    let mut work = vec![Step::Visit(expr)];
    let mut values: Vec<Cow<'_, PostingStore>> = Vec::new();

    while let Some(step) = work.pop() {
        match step {
            Step::Visit(Expr::Term(token)) => {
                let term = analyzer.query_term(token)?;
                values.push(Cow::Borrowed(index.get_postlist(&term)?));
            }
            Step::Visit(Expr::Binary { op, left, right }) => {
                work.push(Step::Apply(*op));
                work.push(Step::Visit(right));
                work.push(Step::Visit(left));
            }
            Step::Apply(op) => {
                let right = values.pop()?;
                let left = values.pop()?;
                values.push(Cow::Owned(apply(op, &left, &right)));
            }
        }
    }
    values.pop().map(Cow::into_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::parse;
    use crate::{DocId, Document};

    fn index() -> InvertedIndex {
        let mut idx = InvertedIndex::new();
        let docs = [(1, "a"), (2, "a b"), (3, "a b"), (4, "b"), (5, "c")];
        for (id, text) in docs {
            idx.add_document(&Document { id, name: format!("D{id}"), text: text.into() });
        }
        idx
    }

    fn ids(q: &str) -> Option<Vec<DocId>> {
        evaluate(&parse(q).unwrap(), &index()).map(|p| p.as_slice().to_vec())
    }

    #[test]
    fn operators() {
        assert_eq!(ids("a AND b"), Some(vec![2, 3]));
        assert_eq!(ids("a OR b"), Some(vec![1, 2, 3, 4]));
        assert_eq!(ids("a NOT b"), Some(vec![1]));
        assert_eq!(ids("b NOT a"), Some(vec![4]));
    }

    #[test]
    fn nested() {
        assert_eq!(ids("( a AND b ) OR c"), Some(vec![2, 3, 5]));
        assert_eq!(ids("c OR ( a AND b )"), Some(vec![2, 3, 5]));
        assert_eq!(ids("( a OR c ) NOT ( b AND a )"), Some(vec![1, 5]));
    }

    #[test]
    fn empty_result_is_not_absent() {
        assert_eq!(ids("a AND c"), Some(vec![]));
    }

    #[test]
    fn absent_term_anywhere_is_absent() {
        assert_eq!(ids("a AND zzz"), None);
        assert_eq!(ids("( zzz OR a ) OR b"), None);
        assert_eq!(ids("zzz"), None);
    }

    #[test]
    fn deep_right_nesting() {
        let depth = 1_000;
        let q = format!("{}a{}", "b OR ( ".repeat(depth), " )".repeat(depth));
        let result = evaluate(&parse(&q).unwrap(), &index()).unwrap();
        assert_eq!(result.as_slice(), &[1, 2, 3, 4]);
    }
}
