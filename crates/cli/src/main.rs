mod cli;
mod config;
mod source;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use rulify_core::{load_dotenv, EngineConfig};
use rulify_rules::reference::parse_path;
use rulify_rules::Rulify;

use crate::cli::CliArgs;
use crate::config::CliConfig;
use crate::source::{load_source, render};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    load_dotenv();
    let args = CliArgs::parse();

    // Environment first, then the config file's [engine] table on top.
    let config = CliConfig::load(args.config.as_deref())
        .context("failed to load configuration")?;
    let engine = config.engine_config(EngineConfig::from_env())?;
    info!(profile = engine.profile_label(), "Engine configured");

    let mut documents = Vec::with_capacity(args.sources.len());
    for source in &args.sources {
        documents.push(load_source(source)?);
    }

    let root = Rulify::new()
        .config(engine)
        .sources(documents)
        .build()
        .context("failed to build rule session")?;

    let target = match &args.path {
        Some(path) => root.at(parse_path(path).with_context(|| format!("invalid --path '{path}'"))?),
        None => root,
    };

    let value = target
        .materialize()
        .await
        .context("failed to evaluate rules")?;
    let out = render(&value, args.format, args.pretty)?;
    println!("{}", out.trim_end());

    Ok(())
}
