mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use quill_core::{Config, GraphqlClient, MemoryBackend, PostApi};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "quill")]
#[command(about = "Collaborative markdown posts from the terminal")]
struct Cli {
    /// GraphQL endpoint (overrides config and QUILL_ENDPOINT)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// API key sent as x-api-key (overrides config and QUILL_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use an in-process backend instead of the network
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print all posts, then every newly created one until Ctrl-C
    List,
    /// Print the editor route for a new post
    New { title: String },
    /// Edit the post at a route such as /post/<id>/<title>
    Open { route: String },
    /// Delete a post by id
    Delete { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quill=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli).await?;
    let api = backend(&cli, &config)?;

    match cli.command {
        Command::List => commands::list(api, &config).await,
        Command::New { title } => commands::new(&title),
        Command::Open { route } => commands::open(api, &config, &route).await,
        Command::Delete { id } => commands::delete(api, &id).await,
    }
}

async fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = Config::load_from(path)
                .await
                .with_context(|| format!("reading config {}", path.display()))?;
            config.apply_env();
            config
        }
        None => Config::load().await?,
    };
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(api_key) = &cli.api_key {
        config.api_key = api_key.clone();
    }
    Ok(config)
}

fn backend(cli: &Cli, config: &Config) -> anyhow::Result<Arc<dyn PostApi>> {
    if cli.memory {
        tracing::info!("Using in-process backend");
        return Ok(Arc::new(MemoryBackend::new()));
    }
    if config.endpoint.is_empty() {
        anyhow::bail!("no endpoint configured; pass --endpoint, set QUILL_ENDPOINT or use --memory");
    }
    let client = GraphqlClient::new(config.client_config()).context("creating GraphQL client")?;
    Ok(Arc::new(client))
}
