//! Boolean retrieval over an inverted index built from `<DOC>`-tagged corpora.

pub mod document;
pub mod index;
pub mod merge;
pub mod persist;
pub mod postings;
pub mod query;
pub mod tokenizer;

pub type DocId = u32;

pub use document::{DocIdGenerator, Document};
pub use index::InvertedIndex;
pub use merge::{build_sharded, merge_all, BuildOptions};
pub use postings::{IndexEntry, PostingStore};
pub use query::{evaluate, parse, run_queries, Expr, Operator, QueryError};
pub use tokenizer::Analyzer;
