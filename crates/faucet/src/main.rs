//! Faucet simulator binary: a line-oriented stand-in for the web UI.

mod cli;

use anyhow::Context;
use clap::Parser;
use cli::{render_history, render_status, Args, Command, HELP};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::{debug, info};
use ttk_common::utils::logging::init_logging;
use ttk_faucet::{Clock, FaucetConfig, FaucetService, ManualClock, RandomIdGenerator, SimulatedChain};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = FaucetConfig::load(args.config.as_deref()).context("Failed to load faucet configuration")?;
    if args.demo {
        let demo = FaucetConfig::demo();
        config.seed_user_balance = demo.seed_user_balance;
        config.seed_total_claimed = demo.seed_total_claimed;
    }
    if args.debug {
        config.logging.level = "debug".to_string();
    }

    if args.print_config {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let _log_guard = init_logging(&config.logging)?;
    info!("Starting TTK faucet simulator v{}", env!("CARGO_PKG_VERSION"));
    debug!("Configuration: {:?}", config);

    let manual_clock = args.manual_clock.then(|| ManualClock::new(chrono::Utc::now()));
    let service = Arc::new(match &manual_clock {
        Some(clock) => {
            let chain = Arc::new(SimulatedChain::from_config(&config));
            FaucetService::with_components(config, Arc::new(clock.clone()), Arc::new(RandomIdGenerator), chain)?
        }
        None => FaucetService::new(config)?,
    });

    // Notifications play the role of the web UI's toasts
    let mut events = service.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let prefix = if event.is_error() { "!!" } else { "::" };
                    println!("{} {}", prefix, event.message());
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => debug!("Skipped {} notifications", skipped),
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    println!("TTK faucet simulator. Type `help` for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match command {
            // Long-running commands run in the background so the prompt
            // stays usable, as the buttons in a web UI would.
            Command::Connect => {
                let service = service.clone();
                tokio::spawn(async move {
                    let _ = service.connect().await;
                });
            }
            Command::Claim => {
                let service = service.clone();
                tokio::spawn(async move {
                    let _ = service.claim().await;
                });
            }
            Command::Disconnect => service.disconnect(),
            Command::Status { json: false } => println!("{}", render_status(&service.snapshot())),
            Command::Status { json: true } => println!("{}", serde_json::to_string_pretty(&service.snapshot())?),
            Command::History => println!("{}", render_history(&service.snapshot())),
            Command::Advance { by } => match &manual_clock {
                Some(clock) => match clock.advance(by) {
                    Some(now) => println!("clock is now {}", now.format("%Y-%m-%d %H:%M:%S UTC")),
                    None => println!("cannot advance the clock that far"),
                },
                None => println!("`advance` needs --manual-clock"),
            },
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
        }
    }

    info!("Shutting down");
    Ok(())
}
