use std::io::BufRead;
use std::sync::Arc;

use anyhow::Result;
use arena_coordination::{EventBus, GameRunner, RunnerControl, SharedControl};
use arena_runner::{commands, write_export, ArenaConfig, Cli};
use clap::Parser;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ArenaConfig::load(cli.config.as_deref())?.with_cli(&cli);
    config.validate()?;

    info!(
        base_url = %config.endpoint.base_url,
        good = %config.endpoint.good_model,
        evil = %config.endpoint.evil_model,
        games = config.games,
        "Arena runner starting"
    );

    let bus = EventBus::new().shared();
    let control = if cli.step {
        RunnerControl::stepping()
    } else {
        RunnerControl::new()
    }
    .shared();

    let mut events = bus.subscribe_filtered(cli.event_filter());
    let printer = tokio::spawn(async move {
        while let Ok(envelope) = events.recv().await {
            println!("{}", envelope.to_json());
        }
    });

    if !cli.no_stdin {
        spawn_command_reader(Arc::clone(&control));
    }

    let mut runner = GameRunner::new(
        config.game.clone(),
        config.build_oracles()?,
        Arc::clone(&bus),
        Arc::clone(&control),
    )?
    .with_memory_policy(config.memory)?
    .with_sampling(config.sampling);
    if let Some(seed) = config.seed {
        runner = runner.with_seed(seed);
    }

    for game in 1..=config.games {
        if control.session_stopped() {
            info!(game, "Session stopped by operator; remaining games skipped");
            break;
        }
        info!(game, of = config.games, "Starting game");
        let report = runner.run_game().await;
        info!(
            game,
            winner = ?report.winner(),
            stopped = report.stopped,
            "Game over"
        );

        if let Some(ref dir) = config.export_dir {
            if let Err(e) = write_export(dir, &report.export(runner.config())) {
                warn!(game, "Replay export failed: {e:#}");
            }
        }

        if report.stopped {
            info!("Session stopped by operator");
            break;
        }
    }

    drop(runner);
    drop(bus);
    if let Err(e) = printer.await {
        warn!("Event printer task failed: {e}");
    }

    Ok(())
}

/// Blocking stdin reader on its own thread; it dies with the process.
fn spawn_command_reader(control: SharedControl) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            let response = commands::handle_line(&control, &line);
            if !response.ok {
                warn!(line = %line.trim(), "Rejected control command");
            }
            eprintln!("{}", response.to_json_line());
        }
    });
}
