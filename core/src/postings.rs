use crate::DocId;
use serde::{Deserialize, Serialize};

/// Sorted, duplicate-free document ids for a single term.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingStore {
    ids: Vec<DocId>, // strictly increasing
}

impl PostingStore {
    pub fn new() -> Self { Self::default() }

    pub fn single(doc_id: DocId) -> Self {
        Self { ids: vec![doc_id] }
    }

    /// Build from ids in any order; duplicates are dropped.
    pub fn from_unsorted(mut ids: Vec<DocId>) -> Self {
        ids.sort_unstable();
        ids.dedup();
        Self { ids }
    }

    pub fn len(&self) -> usize { self.ids.len() }

    pub fn is_empty(&self) -> bool { self.ids.is_empty() }

    pub fn as_slice(&self) -> &[DocId] { &self.ids }

    pub fn iter(&self) -> impl Iterator<Item = DocId> + '_ { self.ids.iter().copied() }

    pub fn first(&self) -> Option<DocId> { self.ids.first().copied() }

    pub fn last(&self) -> Option<DocId> { self.ids.last().copied() }

    pub fn contains(&self, doc_id: DocId) -> bool {
        self.ids.binary_search(&doc_id).is_ok()
    }

    /// Insert `doc_id` if absent, returning whether the store grew.
    ///
    /// During a build ids arrive in increasing order, so the common case is a
    /// single comparison against the last id followed by a push. An id that is
    /// not greater than the last one goes through a binary search instead, which
    /// keeps the store sorted and unique whatever order documents are added in.
    pub fn insert(&mut self, doc_id: DocId) -> bool {
        match self.ids.last() {
            Some(&last) if last == doc_id => false,
            Some(&last) if last > doc_id => match self.ids.binary_search(&doc_id) {
                Ok(_) => false,
                Err(pos) => {
                    tracing::trace!(doc_id, last, "out-of-order posting insert");
                    self.ids.insert(pos, doc_id);
                    true
                }
            },
            _ => {
                self.ids.push(doc_id);
                true
            }
        }
    }

    /// Merge `other` into `self`.
    ///
    /// When every id in `self` precedes every id in `other` (shards built over
    /// increasing, disjoint id ranges) the stores are concatenated. Otherwise a
    /// full sorted union is taken.
    pub fn merge(&mut self, other: PostingStore) {
        match (self.last(), other.first()) {
            (None, _) => self.ids = other.ids,
            (_, None) => {}
            (Some(last), Some(first)) if last < first => self.ids.extend(other.ids),
            _ => self.ids = union_sorted(&self.ids, &other.ids),
        }
    }

    pub fn intersection(&self, other: &PostingStore) -> PostingStore {
        PostingStore { ids: intersect_sorted(&self.ids, &other.ids) }
    }

    pub fn union(&self, other: &PostingStore) -> PostingStore {
        PostingStore { ids: union_sorted(&self.ids, &other.ids) }
    }

    /// Ids in `self` that are not in `other`.
    pub fn difference(&self, other: &PostingStore) -> PostingStore {
        PostingStore { ids: difference_sorted(&self.ids, &other.ids) }
    }
}

impl FromIterator<DocId> for PostingStore {
    fn from_iter<I: IntoIterator<Item = DocId>>(iter: I) -> Self {
        Self::from_unsorted(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a PostingStore {
    type Item = &'a DocId;
    type IntoIter = std::slice::Iter<'a, DocId>;

    fn into_iter(self) -> Self::IntoIter { self.ids.iter() }
}

/// A term's document frequency together with its postings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    postings: PostingStore,
}

impl IndexEntry {
    pub fn new(doc_id: DocId) -> Self {
        Self { postings: PostingStore::single(doc_id) }
    }

    pub fn from_postings(postings: PostingStore) -> Self { Self { postings } }

    /// Always equal to the number of postings.
    pub fn document_frequency(&self) -> usize { self.postings.len() }

    pub fn postings(&self) -> &PostingStore { &self.postings }

    pub fn add_doc(&mut self, doc_id: DocId) -> bool { self.postings.insert(doc_id) }

    pub fn merge(&mut self, other: IndexEntry) { self.postings.merge(other.postings) }
}

fn intersect_sorted(a: &[DocId], b: &[DocId]) -> Vec<DocId> {
    let (mut i, mut j) = (0, 0);
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            out.push(a[i]);
            i += 1;
            j += 1;
        } else if a[i] < b[j] {
            i += 1;
        } else {
            j += 1;
        }
    }
    out
}

fn union_sorted(a: &[DocId], b: &[DocId]) -> Vec<DocId> {
    let (mut i, mut j) = (0, 0);
    let mut out = Vec::with_capacity(a.len() + b.len());
    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            out.push(a[i]);
            i += 1;
            j += 1;
        } else if a[i] < b[j] {
            out.push(a[i]);
            i += 1;
        } else {
            out.push(b[j]);
            j += 1;
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

fn difference_sorted(a: &[DocId], b: &[DocId]) -> Vec<DocId> {
    let mut j = 0;
    let mut out = Vec::with_capacity(a.len());
    for &id in a {
        while j < b.len() && b[j] < id {
            j += 1;
        }
        if j < b.len() && b[j] == id {
            continue;
        }
        out.push(id);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(ids: &[DocId]) -> PostingStore { PostingStore::from_unsorted(ids.to_vec()) }

    #[test]
    fn insert_in_build_order_skips_repeats() {
        let mut s = PostingStore::new();
        assert!(s.insert(1));
        assert!(s.insert(4));
        assert!(!s.insert(4));
        assert!(s.insert(7));
        assert_eq!(s.as_slice(), &[1, 4, 7]);
    }

    #[test]
    fn insert_out_of_order_keeps_store_sorted() {
        let mut s = store(&[2, 5, 9]);
        assert!(s.insert(3));
        assert!(!s.insert(5));
        assert!(s.insert(1));
        assert_eq!(s.as_slice(), &[1, 2, 3, 5, 9]);
    }

    #[test]
    fn merge_concatenates_disjoint_ranges() {
        let mut a = store(&[1, 2, 3]);
        a.merge(store(&[10, 11]));
        assert_eq!(a.as_slice(), &[1, 2, 3, 10, 11]);
    }

    #[test]
    fn merge_interleaved_dedups() {
        let mut a = store(&[1, 5, 9]);
        a.merge(store(&[2, 5, 10]));
        assert_eq!(a.as_slice(), &[1, 2, 5, 9, 10]);

        let mut b = store(&[10, 11]);
        b.merge(store(&[1, 2]));
        assert_eq!(b.as_slice(), &[1, 2, 10, 11]);
    }

    #[test]
    fn merge_with_empty_side() {
        let mut a = PostingStore::new();
        a.merge(store(&[3, 4]));
        assert_eq!(a.as_slice(), &[3, 4]);
        a.merge(PostingStore::new());
        assert_eq!(a.as_slice(), &[3, 4]);
    }

    #[test]
    fn set_operations() {
        let a = store(&[1, 2, 3]);
        let b = store(&[2, 3, 4]);
        assert_eq!(a.intersection(&b).as_slice(), &[2, 3]);
        assert_eq!(a.union(&b).as_slice(), &[1, 2, 3, 4]);
        assert_eq!(a.difference(&b).as_slice(), &[1]);
        assert_eq!(b.difference(&a).as_slice(), &[4]);
        assert!(a.difference(&a).is_empty());
    }

    #[test]
    fn entry_frequency_tracks_postings() {
        let mut e = IndexEntry::new(1);
        e.add_doc(1);
        e.add_doc(3);
        assert_eq!(e.document_frequency(), 2);
        e.merge(IndexEntry::from_postings(store(&[3, 8])));
        assert_eq!(e.document_frequency(), 3);
        assert_eq!(e.document_frequency(), e.postings().len());
    }
}
