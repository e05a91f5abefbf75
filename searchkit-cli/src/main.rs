mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use searchkit::{sample, Config, HttpExecutor, InMemoryExecutor, SearchExecutor};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "searchkit")]
#[command(about = "searchkit - build and run Elasticsearch queries from the command line")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.searchkit/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Engine URL, overrides the config file
    #[arg(long, global = true, env = "SEARCHKIT_URL")]
    url: Option<String>,

    /// Index to query, overrides the config file
    #[arg(short, long, global = true)]
    index: Option<String>,

    /// Query N generated bank accounts in memory instead of a live engine
    #[arg(long, global = true, value_name = "N", conflicts_with = "bulk")]
    sample: Option<usize>,

    /// Load an Elasticsearch bulk NDJSON file and query it in memory
    #[arg(long, global = true, value_name = "PATH")]
    bulk: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Count matching documents
    Count {
        /// Match clause, repeatable (all must match)
        #[arg(long = "match", value_name = "FIELD=VALUE")]
        matches: Vec<String>,
    },

    /// Print matching hits as JSON lines
    Search {
        /// Match clause, repeatable (all must match)
        #[arg(long = "match", value_name = "FIELD=VALUE")]
        matches: Vec<String>,

        /// Phrase clause, repeatable
        #[arg(long = "phrase", value_name = "FIELD=VALUE")]
        phrases: Vec<String>,

        /// Inclusive range filter, e.g. balance:20000..30000
        #[arg(long = "range", value_name = "FIELD:LO..HI")]
        ranges: Vec<String>,

        /// Sort criterion, repeatable, e.g. account_number:asc
        #[arg(long, value_name = "FIELD[:asc|desc]")]
        sort: Vec<String>,

        /// Offset of the first hit
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        from: i64,

        /// Number of hits
        #[arg(long, default_value = "10", allow_negative_numbers = true)]
        size: i64,

        /// Comma-separated source fields to return
        #[arg(long, value_name = "FIELDS")]
        source: Option<String>,

        /// Bypass the engine's request cache
        #[arg(long)]
        ignore_cache: bool,

        /// Page through every matching hit, --size hits per request
        #[arg(long)]
        scan: bool,
    },

    /// Bucket documents by a field
    GroupBy {
        /// Field to group on, e.g. state.keyword
        #[arg(long)]
        field: String,

        /// Numeric field to average per bucket
        #[arg(long, value_name = "FIELD")]
        avg: Option<String>,

        /// Number of buckets
        #[arg(long, default_value = "10")]
        size: usize,

        /// Order buckets by the average, highest first
        #[arg(long)]
        order_by_metric: bool,
    },
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(url) = &cli.url {
        config.engine.url = url.clone();
    }
    if let Some(index) = &cli.index {
        config.engine.index = index.clone();
    }
    Ok(config)
}

fn build_executor(cli: &Cli, config: &Config) -> Result<Box<dyn SearchExecutor>> {
    if let Some(n) = cli.sample {
        tracing::info!("Using {} in-memory sample accounts", n);
        return Ok(Box::new(sample::executor(n)));
    }

    if let Some(path) = &cli.bulk {
        let ndjson = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read bulk file {:?}", path))?;
        let executor = InMemoryExecutor::from_bulk_ndjson(&config.engine.index, &ndjson)?;
        return Ok(Box::new(executor));
    }

    tracing::info!("Using engine at {}", config.engine.url);
    Ok(Box::new(HttpExecutor::new(&config.engine)?))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(&cli)?;
    if cli.sample.is_some() && cli.index.is_none() {
        config.engine.index = sample::SAMPLE_INDEX.to_string();
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.logging.level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let executor = build_executor(&cli, &config)?;
    let index = config.engine.index.as_str();
    let mut out = io::stdout().lock();

    match cli.command {
        Commands::Count { matches } => {
            commands::run_count(executor.as_ref(), index, &matches, &mut out).await?;
        }
        Commands::Search {
            matches,
            phrases,
            ranges,
            sort,
            from,
            size,
            source,
            ignore_cache,
            scan,
        } => {
            let opts = commands::SearchOptions {
                matches,
                phrases,
                ranges,
                sort,
                from,
                size,
                source,
                ignore_cache,
                scan,
            };
            commands::run_search(executor.as_ref(), index, &opts, &mut out).await?;
        }
        Commands::GroupBy {
            field,
            avg,
            size,
            order_by_metric,
        } => {
            let opts = commands::GroupByOptions {
                field,
                avg,
                size,
                order_by_metric,
            };
            commands::run_group_by(executor.as_ref(), index, &opts, &mut out).await?;
        }
    }

    Ok(())
}
