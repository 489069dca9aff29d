use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::info;

use subhub::generator;
use subhub::models::NodeFilter;
use subhub::parser::{detect_kind, InputKind, ParserRegistry};
use subhub::probe::{Prober, DEFAULT_CONCURRENCY};
use subhub::OutputFormat;

/// Convert and probe proxy subscription nodes
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse an input and emit a subscription document
    Convert {
        /// Input file; reads stdin when omitted and --url is not set
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Subscription URL to fetch instead of a local input
        #[arg(long, value_name = "URL", conflicts_with = "input")]
        url: Option<String>,

        /// Output format: clash, clash-enhanced, v2rayn or raw
        #[arg(short, long, default_value = "clash")]
        format: String,

        /// Output file; prints to stdout when omitted
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Keep only nodes from these country codes (repeatable)
        #[arg(long = "country", value_name = "CODE")]
        countries: Vec<String>,

        /// Drop nodes whose name contains any of these keywords (repeatable)
        #[arg(long = "exclude", value_name = "KEYWORD")]
        exclude_keywords: Vec<String>,

        /// Keep only nodes whose name contains one of these keywords (repeatable)
        #[arg(long = "include", value_name = "KEYWORD")]
        include_keywords: Vec<String>,

        /// Drop nodes with a measured latency above this many milliseconds
        #[arg(long, value_name = "MS")]
        max_latency: Option<f64>,
    },

    /// Parse an input and probe every node for TCP reachability
    Probe {
        /// Input file; reads stdin when omitted
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Maximum simultaneous dials
        #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let args = Args::parse();
    match args.command {
        Command::Convert {
            input,
            url,
            format,
            output,
            countries,
            exclude_keywords,
            include_keywords,
            max_latency,
        } => {
            let format: OutputFormat = format.parse()?;
            let registry = ParserRegistry::new();

            let nodes = if let Some(url) = url {
                registry.dispatch(&url, InputKind::Url).await?
            } else {
                let content = read_input(input.as_deref())?;
                registry.dispatch(&content, detect_kind(&content)).await?
            };
            if nodes.is_empty() {
                bail!("no usable nodes found in input");
            }
            info!("parsed {} nodes", nodes.len());

            let filter = NodeFilter {
                countries: none_if_empty(countries),
                exclude_keywords: none_if_empty(exclude_keywords),
                include_keywords: none_if_empty(include_keywords),
                max_latency,
                ..Default::default()
            };

            let document = generator::generate(&nodes, format, Some(&filter))?;
            match output {
                Some(path) => {
                    std::fs::write(&path, document)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!("wrote {} output to {}", format, path.display());
                }
                None => println!("{}", document),
            }
        }

        Command::Probe { input, concurrency } => {
            let content = read_input(input.as_deref())?;
            let registry = ParserRegistry::new();
            let nodes = registry
                .dispatch(&content, detect_kind(&content))
                .await?;
            if nodes.is_empty() {
                bail!("no usable nodes found in input");
            }
            info!("probing {} nodes, {} at a time", nodes.len(), concurrency);

            let prober = Prober::default();
            let results = prober.probe_batch(&nodes, concurrency).await;

            let mut reachable = 0;
            for node in &nodes {
                let key = node.key();
                match results.get(&key) {
                    Some(r) if r.success => {
                        reachable += 1;
                        match r.latency_ms {
                            Some(ms) => println!("{}\tok\t{:.2}ms", key, ms),
                            None => println!("{}\tok\t-", key),
                        }
                    }
                    Some(r) => {
                        println!("{}\tfail\t{}", key, r.error.as_deref().unwrap_or("unknown"))
                    }
                    None => println!("{}\tfail\tno result", key),
                }
            }
            info!("{}/{} nodes reachable", reachable, nodes.len());
        }
    }

    Ok(())
}

fn read_input(path: Option<&std::path::Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            Ok(buffer)
        }
    }
}

fn none_if_empty(values: Vec<String>) -> Option<Vec<String>> {
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}
