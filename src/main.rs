mod cli;

use csvwatch::{app, config, import};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

async fn start_watch(
    config_path: Option<&Path>,
    path: Option<PathBuf>,
    delay_ms: Option<u64>,
) -> Result<()> {
    // Validate only once the CLI overrides are in place
    let mut config = config::read_config_or_default(config_path)?;
    config.apply_overrides(path, delay_ms);
    config::validate_config(&config)?;

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Interrupt received, shutting down..."),
                Err(e) => tracing::error!("Failed to listen for Ctrl-C: {}", e),
            }
            cancel.cancel();
        })
    };

    let summary = app::run(config, cancel).await;
    ctrl_c.abort();

    let summary = summary?;
    println!(
        "Watched {} cycles, {} new files, {} failed cycles",
        summary.cycles, summary.events_emitted, summary.failed_cycles
    );
    Ok(())
}

fn import_one(file: &Path, write: bool) -> Result<()> {
    let result = import::import_file_sync(file)?;
    tracing::info!("Imported {} records from {:?}", result.len(), file);

    if write {
        let dest = import::json_path_for(file);
        import::write_json(&result, &dest)?;
        println!("Wrote {}", dest.display());
    } else {
        println!("{}", result.to_json().context("Failed to serialize records")?);
    }
    Ok(())
}

fn validate(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    println!("Configuration is valid");
    println!("  Name: {}", config.name);
    println!("  Watch path: {}", config.watch.path.display());
    println!("  Delay: {} ms", config.watch.delay_ms);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "csvwatch=trace,csvwatch_core=trace".to_string()
        } else {
            "csvwatch=info,csvwatch_core=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Watch { path, delay_ms } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_watch(cli.config.as_deref(), path, delay_ms))
        }
        Commands::Import { file, write } => import_one(&file, write),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate(path.as_deref())
        }
        Commands::Version => {
            println!("csvwatch {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
