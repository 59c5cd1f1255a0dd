//! Matgraph CLI — sparse-matrix to Neo4j graph ingestor.
//!
//! Usage:
//!   matgraph ingest --bundle graph.json --password <pass>
//!            [--uri bolt://localhost:7687] [--user neo4j]
//!            [--embeddings vectors.txt] [--batch-size 1000] [--skip-labels]

use clap::{Args, Parser, Subcommand};
use matgraph::{ingest_bundle, EmbeddingSource, MatrixBundle, Neo4jSink, WordVectors};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "matgraph",
    version,
    about = "Loads sparse adjacency matrices into a Neo4j property graph"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a matrix bundle into a running Neo4j instance
    Ingest(IngestOpts),
}

#[derive(Args)]
struct IngestOpts {
    /// Path to the JSON matrix bundle ("network" plus optional "group")
    #[arg(long)]
    bundle: PathBuf,
    /// Bolt endpoint
    #[arg(long, default_value = "bolt://localhost:7687")]
    uri: String,
    /// Database user
    #[arg(long, default_value = "neo4j")]
    user: String,
    /// Database password
    #[arg(long)]
    password: String,
    /// Optional word2vec-format embeddings file
    #[arg(long)]
    embeddings: Option<PathBuf>,
    /// Records per write batch
    #[arg(long, default_value_t = matgraph::ingest::batch::DEFAULT_BATCH_SIZE)]
    batch_size: usize,
    /// Skip the label phase even when the bundle carries a label matrix
    #[arg(long)]
    skip_labels: bool,
}

async fn cmd_ingest(opts: IngestOpts) -> i32 {
    let mut bundle = match MatrixBundle::load(&opts.bundle) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error: cannot load '{}': {}", opts.bundle.display(), e);
            return 1;
        }
    };
    if opts.skip_labels {
        bundle.group = None;
    }

    let vectors = match &opts.embeddings {
        Some(path) => match WordVectors::load(path) {
            Ok(v) => Some(v),
            Err(e) => {
                eprintln!("Error: cannot load '{}': {}", path.display(), e);
                return 1;
            }
        },
        None => None,
    };

    let sink = match Neo4jSink::connect(&opts.uri, &opts.user, &opts.password).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: cannot connect to '{}': {}", opts.uri, e);
            return 1;
        }
    };

    let source = vectors.as_ref().map(|v| v as &dyn EmbeddingSource);
    match ingest_bundle(&sink, &bundle, source, opts.batch_size).await {
        Ok(()) => {
            let (n, _) = bundle.network.shape();
            println!("Ingested {} nodes, {} edge triples.", n, bundle.network.nnz());
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Ingest(opts) => runtime.block_on(cmd_ingest(opts)),
    };
    std::process::exit(code);
}
