mod commands;

use clap::{Parser, Subcommand};
use pagelens_core::{Config, Paths};
use pagelens_tools::{ToolContext, ToolRegistry};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pagelens")]
#[command(about = "Page-quality audits and screenshots over a shared headless-Chrome session", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve tools over stdio (newline-delimited JSON-RPC)
    Serve,

    /// Invoke a tool once and print the result
    Run {
        /// Tool name (e.g. "run-lighthouse")
        tool: String,

        /// Tool parameters as inline JSON
        #[arg(short, long, default_value = "{}")]
        params: String,
    },

    /// List registered tools
    Tools,
}

fn bootstrap() -> anyhow::Result<(ToolContext, ToolRegistry)> {
    let paths = Paths::new();
    paths.ensure_dirs()?;
    let config = Config::load_or_init(&paths)?;
    let ctx = ToolContext::new(config, paths);
    Ok((ctx, ToolRegistry::with_defaults()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup tracing. Logs go to stderr; stdout carries the protocol.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Serve => {
            let (ctx, registry) = bootstrap()?;
            commands::serve::run(ctx, registry).await?;
        }
        Commands::Run { tool, params } => {
            let (ctx, registry) = bootstrap()?;
            commands::run::run(ctx, registry, &tool, &params).await?;
        }
        Commands::Tools => {
            let registry = ToolRegistry::with_defaults();
            commands::tools::run(registry)?;
        }
    }

    Ok(())
}
