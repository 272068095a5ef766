//! Boolean queries: parsing, evaluation and the query-file driver.

mod ast;
mod eval;
mod parser;

pub use ast::{Expr, Operator};
pub use eval::evaluate;
pub use parser::parse;

use crate::postings::PostingStore;
use crate::InvertedIndex;
use anyhow::Result;
use std::io::{BufRead, Write};
use thiserror::Error;

/// Written in place of a result when a query cannot be answered.
pub const NOT_ANSWERABLE: &str = "NA";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("empty query")]
    Empty,
    #[error("empty parentheses")]
    EmptyGroup,
    #[error("unbalanced parentheses")]
    Unbalanced,
    #[error("unrecognized operator `{0}`")]
    UnknownOperator(String),
    #[error("operator {0} has no left operand")]
    MissingLeftOperand(&'static str),
    #[error("operator {0} has no right operand")]
    MissingRightOperand(&'static str),
    #[error("unexpected `{0}` after a complete expression; add parentheses")]
    Trailing(String),
}

/// Parse and evaluate a single query line. `None` when the query is malformed
/// or mentions a term that is not in the index.
pub fn answer(index: &InvertedIndex, line: &str) -> Option<PostingStore> {
    match parse(line) {
        Ok(expr) => {
            let result = evaluate(&expr, index);
            if result.is_none() {
                tracing::debug!(query = line, "query references an unindexed term");
            }
            result
        }
        Err(err) => {
            tracing::debug!(query = line, error = %err, "unparseable query");
            None
        }
    }
}

/// Names of the matched documents in id order, space separated, or `NA`.
pub fn render(index: &InvertedIndex, result: Option<&PostingStore>) -> String {
    match result {
        None => NOT_ANSWERABLE.to_string(),
        Some(postings) => postings
            .iter()
            .filter_map(|id| index.doc_name(id))
            .map(str::trim)
            .collect::<Vec<_>>()
            .join(" "),
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QueryRunStats {
    pub queries: usize,
    pub unanswered: usize,
}

/// Answer every line of `queries`, writing one result line per query.
pub fn run_queries<R: BufRead, W: Write>(index: &InvertedIndex, queries: R, mut out: W) -> Result<QueryRunStats> {
    let mut stats = QueryRunStats::default();
    for line in queries.lines() {
        let line = line?;
        let result = answer(index, &line);
        stats.queries += 1;
        if result.is_none() {
            stats.unanswered += 1;
        }
        writeln!(out, "{}", render(index, result.as_ref()))?;
    }
    out.flush()?;
    tracing::info!(queries = stats.queries, unanswered = stats.unanswered, "evaluated queries");
    Ok(stats)
}
