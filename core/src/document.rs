//! Documents and the `<DOC>`-tagged corpus file format.

use crate::DocId;
use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::Path;

lazy_static! {
    static ref DOCNO: Regex = Regex::new(r"(?s)<DOCNO>(.*?)</DOCNO>").expect("valid regex");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: DocId,
    pub name: String,
    pub text: String,
}

/// Hands out document ids in increasing order.
///
/// One generator is threaded through a whole build; shards that are built
/// separately and merged later should each start past the previous shard's
/// range so their posting stores concatenate on merge.
#[derive(Debug, Clone)]
pub struct DocIdGenerator {
    next: DocId,
}

impl Default for DocIdGenerator {
    fn default() -> Self { Self { next: 1 } }
}

impl DocIdGenerator {
    pub fn new() -> Self { Self::default() }

    pub fn starting_at(first: DocId) -> Self { Self { next: first } }

    pub fn next_id(&mut self) -> DocId {
        let id = self.next;
        self.next += 1;
        id
    }

    /// The id the next call to `next_id` returns.
    pub fn peek(&self) -> DocId { self.next }
}

/// Parse every well-formed record in `content`.
///
/// Records without a `<DOCNO>` or `<TEXT>` tag, or whose text is blank, are
/// dropped. Only kept records consume an id.
pub fn parse_documents(content: &str, ids: &mut DocIdGenerator) -> Vec<Document> {
    let mut docs = Vec::new();
    for record in content.split("<DOC>").skip(1) {
        let Some(name) = DOCNO.captures(record).map(|c| single_line(&c[1])) else {
            continue;
        };
        if !record.contains("<TEXT>") {
            continue;
        }
        let text = record
            .split("<TEXT>")
            .skip(1)
            .map(|block| flatten(block.split("</TEXT>").next().unwrap_or_default()))
            .filter(|block| !block.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            continue;
        }
        docs.push(Document { id: ids.next_id(), name, text });
    }
    docs
}

// names are written one per line in the doc-id map
fn single_line(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn flatten(block: &str) -> String {
    block.trim().replace(['\r', '\n'], " ")
}

/// Read and parse a corpus file. Bytes that are not valid UTF-8 are replaced.
pub fn read_document_file<P: AsRef<Path>>(path: P, ids: &mut DocIdGenerator) -> Result<Vec<Document>> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("reading documents from {}", path.display()))?;
    let content = String::from_utf8_lossy(&bytes);
    let docs = parse_documents(&content, ids);
    tracing::debug!(file = %path.display(), docs = docs.len(), "parsed document file");
    Ok(docs)
}
