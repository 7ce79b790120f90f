//! `geonotify simulate`
//!
//! Replays a position trace through a [`TrackingEngine`] running on the
//! simulated platform. Each fix feeds both the foreground stream (through the
//! teleport filter) and the simulated OS geofencing, so region notifications
//! appear exactly as they would on a device.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use console::style;
use geonotify::config::MemoryStore;
use geonotify::geofence::TransitionKind;
use geonotify::logging::{default_log_dir, default_log_file, init_logging};
use geonotify::permission::{PermissionResponse, PermissionScope};
use geonotify::platform::sim::SimulatedPlatform;
use geonotify::position::LocationSample;
use geonotify::status::UserStatus;
use geonotify::TrackingEngine;
use tracing::info;

use super::load_catalog;
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// JSON-lines file, one location sample per line
    trace: PathBuf,

    /// Enable background tracking before replaying
    #[arg(long)]
    background: bool,

    /// Answer the foreground permission prompt with "deny"
    #[arg(long)]
    deny_foreground: bool,

    /// Answer the background permission prompt with "deny"
    #[arg(long)]
    deny_background: bool,

    /// Treat denials as permanent ("don't ask again")
    #[arg(long)]
    permanent: bool,

    /// Print notifications as JSON lines
    #[arg(long)]
    json: bool,

    /// Directory for the log file
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

pub async fn run(args: SimulateArgs, catalog_path: Option<&Path>) -> Result<(), CliError> {
    let log_dir = args.log_dir.clone().unwrap_or_else(default_log_dir);
    let _logging = init_logging(&log_dir, default_log_file())
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

    let trace = read_trace(&args.trace)?;
    let catalog = Arc::new(load_catalog(catalog_path)?);
    info!(samples = trace.len(), regions = catalog.len(), "Starting simulation");

    let sim = SimulatedPlatform::new(Arc::new(MemoryStore::new()));
    let denied = if args.permanent {
        PermissionResponse::permanently_denied()
    } else {
        PermissionResponse::denied()
    };
    sim.permissions.answer_prompts(
        PermissionScope::Foreground,
        if args.deny_foreground { denied } else { PermissionResponse::granted() },
    );
    sim.permissions.answer_prompts(
        PermissionScope::Background,
        if args.deny_background { denied } else { PermissionResponse::granted() },
    );

    let engine = TrackingEngine::start(sim.platform(), catalog).await?;

    match engine.start_foreground().await {
        Ok(state) => println!("Live position: {}", state),
        Err(e) => println!("{} {}", style("Live position unavailable:").yellow(), e),
    }

    if args.background {
        match engine.set_background_tracking(true).await {
            Ok(()) => println!("Background tracking: {}", style("enabled").green()),
            Err(e) => {
                let status = UserStatus::from(&e);
                println!("Background tracking: {} ({})", style("off").red(), status);
            }
        }
    }
    println!();

    let mut notified = 0;
    for sample in &trace {
        sim.positions.emit(*sample);
        let accepted = engine.latest_sample() == Some(*sample);
        let transitions = sim.geofencing.update_position(sample.point()).await;

        let marker = if accepted {
            style("✓").green()
        } else {
            style("✗").red()
        };
        println!(
            "{} {:>14} {:>10.5} {:>10.5}",
            marker, sample.captured_at_epoch_ms, sample.latitude, sample.longitude
        );
        for transition in transitions {
            let arrow = match transition.kind {
                TransitionKind::Enter => style("→ enter").cyan(),
                TransitionKind::Exit => style("← exit").magenta(),
            };
            println!("    {} {}", arrow, transition.region_id);
        }

        for notification in sim.notifier.notifications().iter().skip(notified) {
            if args.json {
                let line = serde_json::to_string(notification)?;
                println!("{}", line);
            } else {
                println!("    {} {}", style(&notification.title).bold(), notification.body);
            }
            notified += 1;
        }
    }

    println!();
    println!("{}", style("Summary").bold().underlined());
    println!("  Samples:       {}", trace.len());
    println!("  Filtered out:  {}", engine.watcher().rejected_count());
    println!("  Notifications: {}", notified);
    if let Some(status) = engine.position_status() {
        println!("  Status:        {}", status);
    }

    engine.shutdown().await;
    Ok(())
}

/// Parse a JSON-lines trace. Blank lines and `#` comments are skipped.
fn read_trace(path: &Path) -> Result<Vec<LocationSample>, CliError> {
    let content = fs::read_to_string(path).map_err(|error| CliError::FileRead {
        path: path.to_path_buf(),
        error,
    })?;
    parse_trace(&content)
}

fn parse_trace(content: &str) -> Result<Vec<LocationSample>, CliError> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|e| CliError::Trace {
                line: index + 1,
                reason: e.to_string(),
            })
        })
        .collect()
}
