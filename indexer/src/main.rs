use anyhow::{bail, Context, Result};
use bquery_core::document::read_document_file;
use bquery_core::persist::{load_index, load_snapshot, save_index, save_snapshot, IndexPaths};
use bquery_core::{build_sharded, merge_all, run_queries, Analyzer, BuildOptions, DocIdGenerator, DocId, InvertedIndex};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build, merge and query boolean inverted indexes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index every document file under a folder
    Build {
        /// Folder (or single file) of <DOC>-tagged documents
        #[arg(long)]
        documents: PathBuf,
        /// Text index output
        #[arg(long, requires = "docmap_out")]
        index_out: Option<PathBuf>,
        /// Doc-id map output
        #[arg(long, requires = "index_out")]
        docmap_out: Option<PathBuf>,
        /// Binary snapshot output directory
        #[arg(long)]
        snapshot_out: Option<PathBuf>,
        /// Build this many shards in parallel and merge them
        #[arg(long, default_value_t = 1)]
        shards: usize,
        /// First document id to assign; give separately built shards disjoint ranges
        #[arg(long, default_value_t = 1)]
        first_id: DocId,
        /// Normalize, stem and drop stopwords instead of indexing raw tokens
        #[arg(long, default_value_t = false)]
        normalize: bool,
    },
    /// Merge text indexes built from separate shards
    Merge {
        /// Shard index file; repeat once per shard
        #[arg(long = "index", required = true)]
        indexes: Vec<PathBuf>,
        /// Shard doc-id map; one per --index, same order
        #[arg(long = "docmap", required = true)]
        docmaps: Vec<PathBuf>,
        #[arg(long)]
        index_out: PathBuf,
        #[arg(long)]
        docmap_out: PathBuf,
        #[arg(long, default_value_t = false)]
        normalize: bool,
    },
    /// Answer a file of boolean queries, one per line
    Query {
        #[command(flatten)]
        source: IndexSource,
        #[arg(long)]
        queries: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Write the terms with the highest and lowest document frequency
    Report {
        #[command(flatten)]
        source: IndexSource,
        #[arg(long)]
        output: PathBuf,
        #[arg(long, default_value_t = 10)]
        top: usize,
        #[arg(long, default_value_t = 10)]
        bottom: usize,
    },
    /// Print index statistics as JSON
    Stats {
        #[command(flatten)]
        source: IndexSource,
    },
}

#[derive(Args)]
struct IndexSource {
    /// Text index file
    #[arg(long, requires = "docmap", conflicts_with = "snapshot")]
    index: Option<PathBuf>,
    /// Doc-id map file
    #[arg(long, requires = "index")]
    docmap: Option<PathBuf>,
    /// Snapshot directory written by `build --snapshot-out`
    #[arg(long)]
    snapshot: Option<PathBuf>,
    /// The text index was built with --normalize
    #[arg(long, default_value_t = false)]
    normalize: bool,
}

impl IndexSource {
    fn load(&self) -> Result<InvertedIndex> {
        match (&self.index, &self.docmap, &self.snapshot) {
            (Some(index), Some(docmap), None) => load_index(index, docmap, analyzer(self.normalize)),
            (None, None, Some(dir)) => {
                let (index, meta) = load_snapshot(&IndexPaths::new(dir))?;
                tracing::info!(created_at = %meta.created_at, num_docs = meta.num_docs, "loaded snapshot");
                Ok(index)
            }
            _ => bail!("give either --index and --docmap, or --snapshot"),
        }
    }
}

#[derive(Serialize)]
struct Stats {
    num_docs: usize,
    num_terms: usize,
    max_df: Option<usize>,
    min_df: Option<usize>,
    analyzer: Analyzer,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { documents, index_out, docmap_out, snapshot_out, shards, first_id, normalize } => {
            let options = BuildOptions { analyzer: analyzer(normalize), shards };
            let index = build_index(&documents, first_id, options)?;
            if let (Some(index_out), Some(docmap_out)) = (index_out, docmap_out) {
                save_index(&index, &index_out, &docmap_out)?;
            }
            if let Some(dir) = snapshot_out {
                save_snapshot(&IndexPaths::new(dir), &index, &now_rfc3339())?;
            }
            Ok(())
        }
        Commands::Merge { indexes, docmaps, index_out, docmap_out, normalize } => {
            if indexes.len() != docmaps.len() {
                bail!("got {} --index but {} --docmap", indexes.len(), docmaps.len());
            }
            let shards = indexes
                .iter()
                .zip(&docmaps)
                .map(|(i, d)| load_index(i, d, analyzer(normalize)))
                .collect::<Result<Vec<_>>>()?;
            let merged = merge_all(shards);
            save_index(&merged, &index_out, &docmap_out)
        }
        Commands::Query { source, queries, output } => {
            let index = source.load()?;
            let input = File::open(&queries).with_context(|| format!("opening {}", queries.display()))?;
            let out = File::create(&output).with_context(|| format!("creating {}", output.display()))?;
            run_queries(&index, BufReader::new(input), BufWriter::new(out))?;
            Ok(())
        }
        Commands::Report { source, output, top, bottom } => {
            let index = source.load()?;
            fs::write(&output, df_report(&index, top, bottom)).with_context(|| format!("writing {}", output.display()))?;
            Ok(())
        }
        Commands::Stats { source } => {
            let index = source.load()?;
            let stats = Stats {
                num_docs: index.num_docs(),
                num_terms: index.num_terms(),
                max_df: index.max_df(),
                min_df: index.min_df(),
                analyzer: index.analyzer(),
            };
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", serde_json::to_string_pretty(&stats)?)?;
            Ok(())
        }
    }
}

fn analyzer(normalize: bool) -> Analyzer {
    if normalize { Analyzer::Normalized } else { Analyzer::Whitespace }
}

fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339).unwrap_or_else(|_| "".into())
}

/// Every file under `input` in file-name order, so doc ids are reproducible.
fn document_files(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        bail!("{} is neither a file nor a directory", input.display());
    }
    let files = WalkDir::new(input)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();
    Ok(files)
}

fn build_index(input: &Path, first_id: DocId, options: BuildOptions) -> Result<InvertedIndex> {
    let mut ids = DocIdGenerator::starting_at(first_id);
    let mut docs = Vec::new();
    for file in document_files(input)? {
        docs.extend(read_document_file(&file, &mut ids)?);
    }
    tracing::info!(num_docs = docs.len(), next_id = ids.peek(), "ingested documents");
    let index = build_sharded(&docs, options);
    tracing::info!(num_terms = index.num_terms(), "index build complete");
    Ok(index)
}

fn df_report(index: &InvertedIndex, top: usize, bottom: usize) -> String {
    const RULE: &str = "--------------------------------------";
    let mut out = String::new();
    out.push_str(RULE);
    out.push_str(&format!("\nTop {top} df terms:\n"));
    for (term, df) in index.top_k(top) {
        out.push_str(&format!("{term}: {df}\n"));
    }
    out.push_str(RULE);
    out.push_str(&format!("\nBottom {bottom} df terms:\n"));
    for (term, df) in index.bottom_k(bottom) {
        out.push_str(&format!("{term}: {df}\n"));
    }
    out
}
