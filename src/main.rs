use anyhow::Result;
use clap::{Parser, Subcommand};

mod error;
mod index;
mod io;
mod progress;
mod tree;
mod util;

use progress::AtomicProgress;
use tree::store::{FileNodeStore, Manifest};
use tree::{build_tree, BuildLimits, ProteinCorpus, ProteinTree, TagBacklog};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "peptree-rust", author, version, about = "Peptide search index inspired by the compomics protein tree", arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the peptide tree index from a protein FASTA
    Index {
        /// Reference protein FASTA file
        reference: String,
        /// Output directory for node files and manifest
        #[arg(short, long, default_value = "peptree.idx")]
        output: String,
        /// Initial tag length
        #[arg(long = "tag-length", default_value_t = 3)]
        tag_length: usize,
        /// Split a node once it holds more occurrences than this
        #[arg(long = "max-node-size", default_value_t = 500)]
        max_node_size: usize,
        /// Never split deeper than this tag length
        #[arg(long = "max-tag-length", default_value_t = 100)]
        max_tag_length: usize,
        #[arg(short = 't', long = "threads", default_value_t = 4)]
        threads: usize,
    },
    /// Look up exact peptide occurrences in a built index
    Query {
        /// Path to the index directory
        #[arg(short = 'i', long = "index")]
        index: String,
        /// Reference protein FASTA (needed to verify occurrences)
        reference: String,
        /// Peptides to search
        #[arg(required = true)]
        peptides: Vec<String>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Index {
            reference,
            output,
            tag_length,
            max_node_size,
            max_tag_length,
            threads,
        } => {
            let limits = BuildLimits {
                max_node_size,
                max_tag_length,
            };
            run_index(&reference, &output, tag_length, limits, threads)
        }
        Commands::Query {
            index,
            reference,
            peptides,
        } => run_query(&index, &reference, &peptides),
    }
}

fn read_corpus(reference: &str) -> Result<ProteinCorpus> {
    let fh = std::fs::File::open(reference)
        .map_err(|e| anyhow::anyhow!("cannot open reference FASTA '{}': {}", reference, e))?;
    let buf = std::io::BufReader::new(fh);
    let corpus = ProteinCorpus::from_fasta(buf)?;
    if corpus.is_empty() {
        anyhow::bail!("FASTA file '{}' contains no usable sequences", reference);
    }
    Ok(corpus)
}

fn run_index(
    reference: &str,
    output: &str,
    tag_length: usize,
    limits: BuildLimits,
    threads: usize,
) -> Result<()> {
    let corpus = read_corpus(reference)?;
    println!("reference: {}", reference);
    println!("proteins:  {}", corpus.len());
    println!("residues:  {}", corpus.total_residues());

    let tree = ProteinTree::from_corpus(&corpus, tag_length);
    let backlog = TagBacklog::seed(tree.tags());
    println!("tags:      {}", backlog.len());

    let store = FileNodeStore::create(output)
        .map_err(|e| anyhow::anyhow!("cannot create index directory '{}': {}", output, e))?;
    let progress = AtomicProgress::new();
    let report = build_tree(
        &tree,
        &corpus,
        &backlog,
        &store,
        limits,
        threads,
        Some(&progress),
    );

    store.save_manifest(&Manifest {
        tag_length,
        max_node_size: limits.max_node_size,
        max_tag_length: limits.max_tag_length,
        reference_file: Some(reference.to_string()),
        build_args: Some(std::env::args().collect::<Vec<_>>().join(" ")),
        build_timestamp: Some(chrono::Utc::now().to_rfc3339()),
    })?;

    println!(
        "finalized: {} ok, {} failed, {} batch flushes",
        report.succeeded, report.failed, report.batch_flushes
    );
    if report.pending > 0 {
        // 重跑同一命令即可收敛剩余 tag
        println!(
            "pending:   {} tags left in backlog (re-run to converge)",
            report.pending
        );
    }
    println!("index saved: {}", store.dir().display());
    Ok(())
}

fn run_query(index_dir: &str, reference: &str, peptides: &[String]) -> Result<()> {
    let store = FileNodeStore::open(index_dir)
        .map_err(|e| anyhow::anyhow!("cannot open index '{}': {}", index_dir, e))?;
    let manifest = store.load_manifest()?;
    let corpus = read_corpus(reference)?;

    for peptide in peptides {
        let hits = tree::query::find_peptide(&store, &manifest, &corpus, peptide)?;
        if hits.is_empty() {
            println!("{}\tno hits", peptide);
            continue;
        }
        for hit in hits {
            println!("{}\t{}\t{}", peptide, hit.accession, hit.position + 1);
        }
    }
    Ok(())
}
