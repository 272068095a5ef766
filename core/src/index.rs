use crate::postings::{IndexEntry, PostingStore};
use crate::tokenizer::Analyzer;
use crate::{DocId, Document};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Term → postings mapping plus the doc id → document name table.
///
/// Every doc id that appears in a posting store has a name in `doc_names`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvertedIndex {
    pub(crate) terms: HashMap<String, IndexEntry>,
    pub(crate) doc_names: BTreeMap<DocId, String>,
    pub(crate) analyzer: Analyzer,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    pub fn with_analyzer(analyzer: Analyzer) -> Self {
        Self { analyzer, ..Self::default() }
    }

    pub fn analyzer(&self) -> Analyzer { self.analyzer }

    /// Index one document. Repeated tokens contribute a single posting.
    pub fn add_document(&mut self, doc: &Document) {
        self.doc_names.insert(doc.id, doc.name.clone());
        for term in self.analyzer.terms(&doc.text) {
            self.update_term(term, doc.id);
        }
    }

    /// Record that `term` occurs in `doc_id`. Returns whether a new posting was added.
    pub fn update_term(&mut self, term: String, doc_id: DocId) -> bool {
        match self.terms.get_mut(&term) {
            Some(entry) => entry.add_doc(doc_id),
            None => {
                self.terms.insert(term, IndexEntry::new(doc_id));
                true
            }
        }
    }

    /// Register a document name without indexing any text.
    pub fn set_doc_name(&mut self, doc_id: DocId, name: impl Into<String>) {
        self.doc_names.insert(doc_id, name.into());
    }

    /// Postings for `term`, or `None` when the term was never indexed.
    pub fn get_postlist(&self, term: &str) -> Option<&PostingStore> {
        self.terms.get(term).map(IndexEntry::postings)
    }

    pub fn entry(&self, term: &str) -> Option<&IndexEntry> { self.terms.get(term) }

    pub fn document_frequency(&self, term: &str) -> Option<usize> {
        self.terms.get(term).map(IndexEntry::document_frequency)
    }

    pub fn doc_name(&self, doc_id: DocId) -> Option<&str> {
        self.doc_names.get(&doc_id).map(String::as_str)
    }

    pub fn doc_names(&self) -> impl Iterator<Item = (DocId, &str)> + '_ {
        self.doc_names.iter().map(|(id, name)| (*id, name.as_str()))
    }

    pub fn terms(&self) -> impl Iterator<Item = (&str, &IndexEntry)> + '_ {
        self.terms.iter().map(|(t, e)| (t.as_str(), e))
    }

    pub fn num_docs(&self) -> usize { self.doc_names.len() }

    pub fn num_terms(&self) -> usize { self.terms.len() }

    pub fn is_empty(&self) -> bool { self.terms.is_empty() && self.doc_names.is_empty() }

    pub fn max_df(&self) -> Option<usize> {
        self.terms.values().map(IndexEntry::document_frequency).max()
    }

    pub fn min_df(&self) -> Option<usize> {
        self.terms.values().map(IndexEntry::document_frequency).min()
    }

    /// The `k` terms with the highest document frequency, highest first.
    pub fn top_k(&self, k: usize) -> Vec<(&str, usize)> {
        let by_df = self.terms_by_df();
        let skip = by_df.len().saturating_sub(k);
        by_df.into_iter().skip(skip).rev().collect()
    }

    /// The `k` terms with the lowest document frequency, lowest first.
    pub fn bottom_k(&self, k: usize) -> Vec<(&str, usize)> {
        let mut by_df = self.terms_by_df();
        by_df.truncate(k);
        by_df
    }

    // ascending df, ties by term
    fn terms_by_df(&self) -> Vec<(&str, usize)> {
        let mut v: Vec<(&str, usize)> = self.terms().map(|(t, e)| (t, e.document_frequency())).collect();
        v.sort_unstable_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: DocId, text: &str) -> Document {
        Document { id, name: format!("DOC-{id}"), text: text.into() }
    }

    fn sample() -> InvertedIndex {
        let mut idx = InvertedIndex::new();
        idx.add_document(&doc(1, "hubble telescope space hubble"));
        idx.add_document(&doc(2, "telescope mirror"));
        idx.add_document(&doc(3, "space telescope  station"));
        idx
    }

    #[test]
    fn repeated_token_counts_once() {
        let idx = sample();
        assert_eq!(idx.get_postlist("hubble").unwrap().as_slice(), &[1]);
        assert_eq!(idx.get_postlist("telescope").unwrap().as_slice(), &[1, 2, 3]);
        assert_eq!(idx.document_frequency("space"), Some(2));
    }

    #[test]
    fn absent_term_is_none() {
        let idx = sample();
        assert!(idx.get_postlist("galaxy").is_none());
        assert!(idx.get_postlist("").is_none());
    }

    #[test]
    fn update_term_reports_new_postings() {
        let mut idx = InvertedIndex::new();
        assert!(idx.update_term("a".into(), 5));
        assert!(!idx.update_term("a".into(), 5));
        assert!(idx.update_term("a".into(), 2));
        assert_eq!(idx.get_postlist("a").unwrap().as_slice(), &[2, 5]);
    }

    #[test]
    fn df_extremes() {
        let idx = sample();
        assert_eq!(idx.max_df(), Some(3));
        assert_eq!(idx.min_df(), Some(1));
        assert_eq!(InvertedIndex::new().max_df(), None);
    }

    #[test]
    fn top_and_bottom_k() {
        let idx = sample();
        assert_eq!(idx.top_k(2), vec![("telescope", 3), ("space", 2)]);
        assert_eq!(idx.bottom_k(3), vec![("hubble", 1), ("mirror", 1), ("station", 1)]);
        assert_eq!(idx.top_k(100).len(), idx.num_terms());
        assert!(idx.bottom_k(0).is_empty());
    }

    #[test]
    fn doc_names_cover_postings() {
        let idx = sample();
        for (_, entry) in idx.terms() {
            for id in entry.postings().iter() {
                assert!(idx.doc_name(id).is_some());
            }
        }
        assert_eq!(idx.num_docs(), 3);
    }
}
