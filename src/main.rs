use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rsbarrel::api::{answer, create_router, QueryResponse};
use rsbarrel::{EngineConfig, SearchEngine, SearchOptions};
use std::io::{self, BufRead, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

// CLI Arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Barrel-sharded TF-IDF search engine", long_about = None)]
struct Args {
    /// JSON engine configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding lexicon.csv, documents.csv and barrels/
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Collection size used for IDF
    #[arg(long)]
    total_docs: Option<u64>,

    /// Load every barrel at startup
    #[arg(long)]
    preload: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
    /// Answer one query, or one query per stdin line when none is given
    Query {
        #[arg(short, long)]
        query: Option<String>,
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if args.total_docs.is_some() {
        config.total_documents = args.total_docs;
    }
    if args.preload {
        config.preload_shards = true;
    }

    Ok(config)
}

fn print_response(out: &mut impl Write, response: &QueryResponse) -> Result<()> {
    serde_json::to_writer(&mut *out, response)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

fn run_queries(engine: &SearchEngine, query: Option<String>, limit: usize) -> Result<()> {
    let options = SearchOptions {
        limit,
        ..SearchOptions::default()
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Some(query) = query {
        return print_response(&mut out, &answer(engine, &query, &options));
    }

    for line in io::stdin().lock().lines() {
        let line = line.context("Failed to read query from stdin")?;
        if line.trim() == "exit" {
            break;
        }
        print_response(&mut out, &answer(engine, &line, &options))?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let engine = SearchEngine::open(&config)
        .with_context(|| format!("Failed to open index in {}", config.data_dir.display()))?;

    match args.command {
        Command::Serve { host, port } => {
            let app = create_router(Arc::new(engine));
            let addr: SocketAddr = format!("{host}:{port}").parse()?;
            let listener = TcpListener::bind(addr).await?;
            tracing::info!(%addr, "server listening");
            axum::serve(listener, app).await?;
        }
        Command::Query { query, limit } => {
            tokio::task::spawn_blocking(move || run_queries(&engine, query, limit)).await??;
        }
    }

    Ok(())
}
