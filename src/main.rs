use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use tokio::time::sleep;
use tracing_log::LogTracer;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use electsim::repl::{render_state, Repl};
use electsim::{Config, Election};

fn init_logging() {
    if let Ok(path) = std::env::var("ELECTSIM_LOG_FILE") {
        // Keep the interactive console clean by sending plain logs to disk.
        let mut builder =
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
        match File::create(&path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
                builder.init();
                return;
            }
            Err(e) => eprintln!("Cannot open log file {path}: {e}, logging to stderr"),
        }
    }

    let _ = LogTracer::init();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .try_init();
}

#[derive(Parser)]
#[command(name = "electsim")]
#[command(about = "Simulates leader election across crash-prone nodes")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args, Default)]
struct ClusterArgs {
    /// Number of nodes in the cluster
    #[arg(short, long)]
    nodes: Option<usize>,

    /// Base seed for per-node randomness
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON config file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the cluster with an interactive operator console
    Run {
        #[command(flatten)]
        cluster: ClusterArgs,
    },

    /// Run the cluster unattended and print the final state
    Simulate {
        #[command(flatten)]
        cluster: ClusterArgs,

        /// How long to let the cluster run
        #[arg(short, long, default_value_t = 10)]
        duration_secs: u64,

        /// Print the final state as JSON
        #[arg(long)]
        json: bool,
    },
}

fn load_config(args: &ClusterArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(nodes) = args.nodes {
        config.nodes = nodes;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn build_election(config: &Config) -> Result<Election> {
    let seed = config.resolve_seed();
    info!("Building cluster of {} nodes with seed {seed}", config.nodes);
    Election::new(config.nodes, config.election.clone(), seed)
        .context("failed to build cluster")
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    // Parse command line arguments
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Run {
        cluster: ClusterArgs::default(),
    }) {
        Command::Run { cluster } => {
            let config = load_config(&cluster)?;
            let mut election = build_election(&config)?;
            election.start();
            let election = Arc::new(election);

            // The line editor blocks, so keep it off the executor threads.
            tokio::task::spawn_blocking(move || -> Result<()> {
                let mut repl = Repl::new(election).context("failed to create line editor")?;
                repl.run();
                Ok(())
            })
            .await
            .context("console task failed")??;
        }
        Command::Simulate {
            cluster,
            duration_secs,
            json,
        } => {
            let config = load_config(&cluster)?;
            let mut election = build_election(&config)?;
            election.start();

            sleep(Duration::from_secs(duration_secs)).await;
            election.shutdown();

            let reports = election.state();
            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                println!("{}", render_state(&reports));
            }
        }
    }

    Ok(())
}
