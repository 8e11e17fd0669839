use anyhow::{bail, Context};
use clap::Parser;
use spark::cli::{self, Cli, Commands};
use spark::config::{AppConfig, StorageConfig};
use spark::logging::{init_logging, init_logging_simple};
use spark::runtime::Runtime;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Config => {
            init_logging_simple();
            println!("{}", toml::to_string_pretty(&config)?);
        }
        Commands::Agents => {
            init_logging_simple();
            let runtime = Runtime::from_config(config).await?;
            cli::print_agents(&runtime.dispatcher().list_agents(), runtime.load_report());
        }
        Commands::Run { agent, task } => {
            init_logging(&config.logging);
            let runtime = Runtime::from_config(config).await?;
            let output = runtime
                .dispatcher()
                .run_agent(agent, &cli::join_task(task))
                .await;
            println!("{}", output);
        }
        Commands::Mode { mode, task } => {
            init_logging(&config.logging);
            let runtime = Runtime::from_config(config).await?;
            let task = cli::join_task(task);
            let task = (!task.is_empty()).then_some(task.as_str());
            println!("{}", runtime.dispatcher().run_mode(mode, task).await);
        }
        Commands::Cycle { repeat, max } => {
            init_logging(&config.logging);
            let runtime = Runtime::from_config(config).await?;
            if *repeat {
                run_repeating(&runtime, *max).await?;
            } else {
                let report = runtime
                    .orchestrator()?
                    .run_cycle()
                    .await
                    .context("cycle failed")?;
                cli::print_cycle_report(&report);
            }
        }
        Commands::Learn { window } => {
            init_logging_simple();
            let window = window.unwrap_or(config.orchestrator.learning_window);
            let runtime = Runtime::from_config(config).await?;
            cli::print_learning(&runtime.learning_summary(window).await);
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config = AppConfig::load_from(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;

    if let Some(dir) = &cli.data_dir {
        config.storage = StorageConfig::rooted_at(dir);
    }

    if let Err(errors) = config.validate() {
        bail!("invalid configuration:\n  - {}", errors.join("\n  - "));
    }
    Ok(config)
}

async fn run_repeating(runtime: &Runtime, max: Option<usize>) -> anyhow::Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, finishing the current cycle");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    let mut driver = runtime.driver()?;
    if let Some(max) = max {
        driver = driver.with_max_cycles(max);
    }

    let completed = driver.run_with(shutdown_rx, cli::print_cycle_report).await;
    info!(completed, "Stopped");
    println!("Completed {} cycle(s)", completed);
    Ok(())
}
