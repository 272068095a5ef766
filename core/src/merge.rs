//! Combining independently built indexes.
//!
//! Shards are built over disjoint sets of documents and merged pairwise. The
//! merged content is the per-term union of postings, so any grouping or order
//! of merges gives the same index. When shards hold increasing, non-overlapping
//! id ranges and are merged in that order, each posting store merge is a plain
//! append.

use crate::tokenizer::Analyzer;
use crate::{Document, InvertedIndex};
use rayon::prelude::*;
use std::collections::btree_map;
use std::collections::hash_map::Entry;

#[derive(Debug, Clone, Copy)]
pub struct BuildOptions {
    pub analyzer: Analyzer,
    /// Number of shards to build in parallel. `0` and `1` both mean a single build.
    pub shards: usize,
}

impl Default for BuildOptions {
    fn default() -> Self { Self { analyzer: Analyzer::default(), shards: 1 } }
}

impl InvertedIndex {
    /// Fold `other` into `self`, taking ownership of its entries.
    pub fn merge(&mut self, other: InvertedIndex) {
        if self.analyzer != other.analyzer {
            tracing::warn!(ours = ?self.analyzer, theirs = ?other.analyzer, "merging indexes built with different analyzers");
        }
        for (term, entry) in other.terms {
            match self.terms.entry(term) {
                Entry::Occupied(mut e) => e.get_mut().merge(entry),
                Entry::Vacant(e) => {
                    e.insert(entry);
                }
            }
        }
        for (doc_id, name) in other.doc_names {
            match self.doc_names.entry(doc_id) {
                btree_map::Entry::Occupied(e) => {
                    if e.get() != &name {
                        tracing::warn!(doc_id, kept = %e.get(), dropped = %name, "conflicting document name on merge");
                    }
                }
                btree_map::Entry::Vacant(e) => {
                    e.insert(name);
                }
            }
        }
    }
}

/// Merge shards left to right. Returns an empty index when given none.
pub fn merge_all<I>(shards: I) -> InvertedIndex
where
    I: IntoIterator<Item = InvertedIndex>,
{
    let mut shards = shards.into_iter();
    let Some(mut merged) = shards.next() else {
        return InvertedIndex::new();
    };
    for shard in shards {
        merged.merge(shard);
    }
    tracing::debug!(num_terms = merged.num_terms(), num_docs = merged.num_docs(), "merged shards");
    merged
}

fn build_one(docs: &[Document], analyzer: Analyzer) -> InvertedIndex {
    let mut index = InvertedIndex::with_analyzer(analyzer);
    for doc in docs {
        index.add_document(doc);
    }
    index
}

/// Build an index over `docs`, splitting them into contiguous chunks that are
/// indexed in parallel and then merged in order.
///
/// `docs` should be in id order (as produced by a single `DocIdGenerator`);
/// the result is the same either way, only the merge fast path depends on it.
pub fn build_sharded(docs: &[Document], options: BuildOptions) -> InvertedIndex {
    let shards = options.shards.max(1);
    if shards == 1 || docs.len() < 2 {
        return build_one(docs, options.analyzer);
    }
    let chunk = docs.len().div_ceil(shards);
    let built: Vec<InvertedIndex> = docs
        .par_chunks(chunk)
        .map(|part| build_one(part, options.analyzer))
        .collect();
    tracing::info!(shards = built.len(), docs = docs.len(), "built shards");
    let mut merged = merge_all(built);
    merged.analyzer = options.analyzer;
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DocId;

    fn doc(id: DocId, text: &str) -> Document {
        Document { id, name: format!("D{id}"), text: text.into() }
    }

    #[test]
    fn adopts_missing_terms_and_unions_shared_ones() {
        let mut a = build_one(&[doc(1, "x y"), doc(2, "y")], Analyzer::Whitespace);
        let b = build_one(&[doc(3, "y z")], Analyzer::Whitespace);
        a.merge(b);
        assert_eq!(a.get_postlist("x").unwrap().as_slice(), &[1]);
        assert_eq!(a.get_postlist("y").unwrap().as_slice(), &[1, 2, 3]);
        assert_eq!(a.get_postlist("z").unwrap().as_slice(), &[3]);
        assert_eq!(a.document_frequency("y"), Some(3));
        assert_eq!(a.num_docs(), 3);
    }

    #[test]
    fn conflicting_name_keeps_receiver() {
        let mut a = build_one(&[doc(1, "x")], Analyzer::Whitespace);
        let mut b = InvertedIndex::new();
        b.set_doc_name(1, "OTHER");
        a.merge(b);
        assert_eq!(a.doc_name(1), Some("D1"));
    }

    #[test]
    fn merge_all_of_nothing_is_empty() {
        assert!(merge_all(Vec::new()).is_empty());
    }

    #[test]
    fn sharded_build_matches_single_build() {
        let docs: Vec<Document> = (1..=23)
            .map(|i| doc(i, &format!("t{} t{} common", i % 3, i % 5)))
            .collect();
        let single = build_one(&docs, Analyzer::Whitespace);
        for shards in [0, 1, 2, 4, 7, 50] {
            let sharded = build_sharded(&docs, BuildOptions { analyzer: Analyzer::Whitespace, shards });
            assert_eq!(sharded, single, "shards = {shards}");
        }
    }
}
