//! On-disk formats.
//!
//! Text index: one line per term, `'term'->3->7->12`, terms sorted.
//! Doc-id map: one line per document, `<doc_id> <doc_name>`, ids ascending.
//! Snapshot: a directory holding `index.bin` (bincode) and `meta.json`.

use crate::postings::{IndexEntry, PostingStore};
use crate::tokenizer::Analyzer;
use crate::{DocId, InvertedIndex};
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::{create_dir_all, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

const SEP: &str = "->";
const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: usize,
    pub num_terms: usize,
    pub analyzer: Analyzer,
    pub created_at: String,
    pub version: u32,
}

impl MetaFile {
    pub fn describe(index: &InvertedIndex, created_at: impl Into<String>) -> Self {
        Self {
            num_docs: index.num_docs(),
            num_terms: index.num_terms(),
            analyzer: index.analyzer(),
            created_at: created_at.into(),
            version: SNAPSHOT_VERSION,
        }
    }
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn index(&self) -> PathBuf { self.root.join("index.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

pub fn write_index<W: Write>(index: &InvertedIndex, mut out: W) -> Result<()> {
    let mut terms: Vec<(&str, &IndexEntry)> = index.terms().collect();
    terms.sort_unstable_by(|a, b| a.0.cmp(b.0));
    for (term, entry) in terms {
        write!(out, "'{term}'")?;
        for id in entry.postings().iter() {
            write!(out, "{SEP}{id}")?;
        }
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

fn parse_index_line(line: &str) -> Result<(String, PostingStore)> {
    let rest = line.strip_prefix('\'').ok_or_else(|| anyhow!("term must start with a quote"))?;
    let close = rest.rfind('\'').ok_or_else(|| anyhow!("term is missing its closing quote"))?;
    let term = &rest[..close];
    let mut fields = rest[close + 1..].split(SEP);
    if fields.next() != Some("") {
        bail!("expected `{SEP}` after the term");
    }
    let ids = fields
        .map(|f| f.trim().parse::<DocId>().with_context(|| format!("bad doc id `{f}`")))
        .collect::<Result<Vec<_>>>()?;
    if ids.is_empty() {
        bail!("term `{term}` has no postings");
    }
    Ok((term.to_string(), PostingStore::from_unsorted(ids)))
}

/// Read the text index format into term → postings.
pub fn read_index<R: BufRead>(input: R) -> Result<HashMap<String, PostingStore>> {
    let mut terms = HashMap::new();
    for (n, line) in input.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            continue;
        }
        let (term, postings) = parse_index_line(line).with_context(|| format!("index line {}", n + 1))?;
        terms.insert(term, postings);
    }
    Ok(terms)
}

pub fn write_doc_id_map<W: Write>(index: &InvertedIndex, mut out: W) -> Result<()> {
    for (id, name) in index.doc_names() {
        writeln!(out, "{id} {name}")?;
    }
    out.flush()?;
    Ok(())
}

pub fn read_doc_id_map<R: BufRead>(input: R) -> Result<BTreeMap<DocId, String>> {
    let mut map = BTreeMap::new();
    for (n, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let (id, name) = line.split_once(' ').unwrap_or((line.as_str(), ""));
        let id: DocId = id.parse().with_context(|| format!("doc-id map line {}: bad doc id `{id}`", n + 1))?;
        map.insert(id, name.trim_end_matches('\r').to_string());
    }
    Ok(map)
}

/// Write the text index and doc-id map to two files.
pub fn save_index(index: &InvertedIndex, index_path: &Path, doc_map_path: &Path) -> Result<()> {
    let f = File::create(index_path).with_context(|| format!("creating {}", index_path.display()))?;
    write_index(index, BufWriter::new(f))?;
    let f = File::create(doc_map_path).with_context(|| format!("creating {}", doc_map_path.display()))?;
    write_doc_id_map(index, BufWriter::new(f))?;
    tracing::info!(index = %index_path.display(), doc_map = %doc_map_path.display(), num_terms = index.num_terms(), num_docs = index.num_docs(), "saved index");
    Ok(())
}

/// Load a text index and its doc-id map. The text format does not record the
/// analyzer, so the caller supplies the one the index was built with.
pub fn load_index(index_path: &Path, doc_map_path: &Path, analyzer: Analyzer) -> Result<InvertedIndex> {
    let f = File::open(index_path).with_context(|| format!("opening {}", index_path.display()))?;
    let postings = read_index(BufReader::new(f)).with_context(|| format!("reading {}", index_path.display()))?;
    let f = File::open(doc_map_path).with_context(|| format!("opening {}", doc_map_path.display()))?;
    let doc_names = read_doc_id_map(BufReader::new(f)).with_context(|| format!("reading {}", doc_map_path.display()))?;
    let index = assemble(postings, doc_names, analyzer)?;
    tracing::info!(num_terms = index.num_terms(), num_docs = index.num_docs(), "loaded index");
    Ok(index)
}

/// Build an index from parsed parts, checking that every posting has a name.
pub fn assemble(postings: HashMap<String, PostingStore>, doc_names: BTreeMap<DocId, String>, analyzer: Analyzer) -> Result<InvertedIndex> {
    for (term, store) in &postings {
        if let Some(id) = store.iter().find(|id| !doc_names.contains_key(id)) {
            bail!("term `{term}` references doc id {id} which is missing from the doc-id map");
        }
    }
    let terms = postings.into_iter().map(|(t, p)| (t, IndexEntry::from_postings(p))).collect();
    Ok(InvertedIndex { terms, doc_names, analyzer })
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta()).with_context(|| format!("opening {}", paths.meta().display()))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

/// Write `index.bin` and `meta.json` under `paths.root`.
pub fn save_snapshot(paths: &IndexPaths, index: &InvertedIndex, created_at: &str) -> Result<MetaFile> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.index())?;
    let bytes = bincode::serialize(index)?;
    f.write_all(&bytes)?;
    let meta = MetaFile::describe(index, created_at);
    save_meta(paths, &meta)?;
    tracing::info!(root = %paths.root.display(), bytes = bytes.len(), "saved snapshot");
    Ok(meta)
}

pub fn load_snapshot(paths: &IndexPaths) -> Result<(InvertedIndex, MetaFile)> {
    let meta = load_meta(paths)?;
    if meta.version != SNAPSHOT_VERSION {
        bail!("unsupported snapshot version {} (expected {SNAPSHOT_VERSION})", meta.version);
    }
    let mut f = File::open(paths.index()).with_context(|| format!("opening {}", paths.index().display()))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let index: InvertedIndex = bincode::deserialize(&buf)?;
    Ok((index, meta))
}
