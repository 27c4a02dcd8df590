//! # hamlet
//!
//! Command-line viewer for a live agent town.
//!
//! ## Commands
//!
//! - `hamlet watch` - follow a session's event stream and log the town headline
//! - `hamlet route <from> <to>` - cheapest walk between two landmarks
//! - `hamlet landmarks` - landmarks found on the map

use std::io::BufRead;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use crossbeam_channel::Sender;
use tracing::{debug, info, warn};

use hamlet::map::path_cost;
use hamlet::prelude::*;

mod settings;

/// Hamlet - watch a multi-agent session as a village
#[derive(Parser)]
#[command(name = "hamlet")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a TOML town configuration
    #[arg(short, long, global = true, env = "HAMLET_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Path to a map file (default: the built-in village)
    #[arg(short, long, global = true, env = "HAMLET_MAP", value_name = "FILE")]
    map: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "HAMLET_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Follow a live session
    #[command(name = "watch")]
    Watch {
        /// Server base URL
        #[arg(long, env = "HAMLET_SERVER", default_value = "http://127.0.0.1:8080")]
        server: String,

        /// Post each stdin line to the feed under this identity
        #[arg(long = "as", value_name = "SENDER")]
        sender: Option<String>,

        /// Seconds between reconnect attempts
        #[arg(long, default_value_t = 3.0)]
        retry_secs: f64,
    },

    /// Print the cheapest walk between two landmarks
    #[command(name = "route")]
    Route {
        /// Landmark key to start from
        from: String,
        /// Landmark key to walk to
        to: String,
    },

    /// List the landmarks placed on the map
    #[command(name = "landmarks")]
    Landmarks,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    let config = settings::load_config(cli.config.as_deref())?;
    let map_text = settings::load_map(cli.map.as_deref())?;

    match cli.command {
        Commands::Watch {
            server,
            sender,
            retry_secs,
        } => watch(config, &map_text, &server, sender, retry_secs).await,
        Commands::Route { from, to } => {
            let map = TownMap::load(&map_text, &config.registry, &config.terrain);
            route(&map, &from, &to)
        }
        Commands::Landmarks => {
            let map = TownMap::load(&map_text, &config.registry, &config.terrain);
            for landmark in map.landmarks().iter() {
                let roles: Vec<&str> = landmark.roles.iter().map(|r| r.as_str()).collect();
                println!(
                    "{:<12} {:<20} ({:>3},{:>3})  {}",
                    landmark.key.as_str(),
                    landmark.label,
                    landmark.cell.col,
                    landmark.cell.row,
                    roles.join(", ")
                );
            }
            Ok(())
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    Ok(())
}

fn route(map: &TownMap, from: &str, to: &str) -> Result<()> {
    let lookup = |key: &str| {
        map.landmarks()
            .get(&LandmarkKey::new(key))
            .map(|l| l.cell)
            .with_context(|| format!("No landmark '{key}' on this map"))
    };
    let start = lookup(from)?;
    let goal = lookup(to)?;
    let path = find_path(map.grid(), start, goal);
    if path.is_empty() && start != goal {
        bail!("No route from {from} to {to}");
    }
    let cost = path_cost(map.grid(), start, &path).unwrap_or(0);
    println!("{from} -> {to}: {} steps, cost {cost}", path.len());
    let cells: Vec<String> = path
        .iter()
        .map(|c| format!("({},{})", c.col, c.row))
        .collect();
    if !cells.is_empty() {
        println!("{}", cells.join(" "));
    }
    Ok(())
}

async fn watch(
    config: TownConfig,
    map_text: &str,
    server: &str,
    sender: Option<String>,
    retry_secs: f64,
) -> Result<()> {
    let server = server.trim_end_matches('/').to_string();
    let town = Town::new(config, map_text).context("Failed to build town")?;

    let outbound = OutboundClient::new(server.clone(), tokio::runtime::Handle::current());
    let mut headline = String::new();
    let driver = TownDriver::spawn(town, Box::new(outbound), move |frame: &Snapshot| {
        let next = frame.headline();
        if next != headline {
            info!(visible = frame.visible().count(), headline = %next, "town changed");
            headline = next;
        }
        debug!(generation = frame.generation, "frame");
    })
    .context("Failed to start town driver")?;

    if let Some(sender) = sender {
        spawn_stdin_poster(driver.sender(), SenderId::new(sender));
    }

    let retry = Duration::try_from_secs_f64(retry_secs)
        .with_context(|| format!("Invalid retry interval {retry_secs}"))?;
    let policy = ReconnectPolicy {
        retry,
        ..ReconnectPolicy::default()
    };
    let client =
        EventStreamClient::new(format!("{server}/events"), driver.sender()).with_policy(policy);

    info!(%server, "Watching town");
    tokio::select! {
        _ = client.run() => warn!("Event stream stopped"),
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for ctrl-c")?;
            info!("Shutting down");
        }
    }

    let town = tokio::task::spawn_blocking(move || driver.shutdown())
        .await
        .context("Driver shutdown panicked")?;
    if let Some(town) = town {
        info!(agents = town.roster().len(), messages = town.feed().len(), "Town closed");
    }
    Ok(())
}

/// Forward stdin lines to the feed until stdin closes or the driver stops.
fn spawn_stdin_poster(tx: Sender<DriverInput>, sender: SenderId) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            let input = DriverInput::PostMessage {
                sender: sender.clone(),
                text: text.to_string(),
            };
            if tx.send(input).is_err() {
                break;
            }
        }
    });
}
