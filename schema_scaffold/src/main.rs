use anyhow::Context;
use clap::Parser;
use std::path::Path;

use schema_scaffold::{config, utils::logging::init_logging, ScaffoldClient, WriteOutcome};

/// Generate typed Rust scaffolds from a MySQL or PostgreSQL schema
#[derive(Debug, Parser)]
#[command(name = "schema_scaffold", version, about)]
struct Cli {
    /// Configuration file (.toml, .yaml or .yml)
    #[arg(short, long, default_value = "schema_scaffold.toml")]
    config: String,

    /// Write a starter configuration file and exit
    #[arg(long)]
    init: bool,

    /// Override the output directory
    #[arg(short, long)]
    output: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.init {
        if Path::new(&cli.config).exists() {
            println!("{} already exists, leaving it untouched", cli.config);
        } else {
            config::write_default(&cli.config)
                .with_context(|| format!("writing {}", cli.config))?;
            println!("Wrote {}", cli.config);
        }
        return Ok(());
    }

    let mut config = config::load_from_file(&cli.config)
        .with_context(|| format!("loading {}", cli.config))?;
    if let Some(output) = cli.output {
        config.output.directory = output;
    }
    init_logging(&config.logging)?;

    let client = ScaffoldClient::new(config)?;
    let outcomes = client.generate().await?;

    for outcome in &outcomes {
        if let WriteOutcome::Diverted { canonical, draft } = outcome {
            println!(
                "kept {} (new version in {})",
                canonical.display(),
                draft.display()
            );
        }
    }
    Ok(())
}
