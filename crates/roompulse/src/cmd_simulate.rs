//! `roompulse simulate`: a room of participants on a tokio runtime.
//!
//! Each participant is a task that wakes at random intervals and either
//! changes status or just checks in. A refresh loop ticks the room on a
//! fixed interval, recording the current distribution. Time runs through a
//! [`ScaledClock`], so a short real run can cover minutes of room time.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Args;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use roompulse_core::clock::{Clock, MS_PER_SEC, ScaledClock};
use roompulse_core::config::{Config, RetentionConfig, parse_time_scale};
use roompulse_core::error::Error;
use roompulse_core::retention::RetentionStats;
use roompulse_core::room::Room;
use roompulse_core::status::StatusValue;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Chance that a participant changes status when it wakes.
const CHANGE_PROBABILITY: f64 = 0.3;

#[derive(Args)]
pub struct SimulateArgs {
    /// Number of simulated participants
    #[arg(long, default_value_t = 20)]
    pub participants: usize,

    /// Number of refresh ticks to run
    #[arg(long, default_value_t = 120)]
    pub ticks: u32,

    /// Real milliseconds between refresh ticks
    #[arg(long, default_value_t = 50)]
    pub tick_ms: u64,

    /// Clock acceleration factor (overrides TIME_SCALE and the config file)
    #[arg(long, value_parser = parse_scale_arg)]
    pub time_scale: Option<f64>,

    /// Seed for participant behaviour
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Room-time seconds without activity before a participant is dropped
    #[arg(long, default_value_t = 300)]
    pub inactive_timeout_secs: i64,

    /// Configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn parse_scale_arg(raw: &str) -> Result<f64, String> {
    parse_time_scale(raw).ok_or_else(|| format!("invalid time scale: {raw} (must be a finite number > 0)"))
}

#[derive(Debug, Serialize)]
struct Summary {
    participants: usize,
    ticks: u32,
    time_scale: f64,
    inactive_dropped: usize,
    history_len: usize,
    stats: RetentionStats,
}

pub fn run(args: SimulateArgs) -> anyhow::Result<()> {
    if args.tick_ms == 0 {
        bail!("--tick-ms must be > 0");
    }
    let config = match &args.config {
        Some(path) => Config::load_from(path).map_err(Error::from)?,
        None => Config::default(),
    };
    let time_scale = args
        .time_scale
        .unwrap_or_else(|| config.clock.time_scale_from_env());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    let (room, summary) = runtime.block_on(simulate(&args, config.retention, time_scale))?;

    let mut out = std::io::stdout().lock();
    for snapshot in room.status_history() {
        writeln!(out, "{}", serde_json::to_string(&snapshot)?)?;
    }
    writeln!(out, "{}", serde_json::json!({ "summary": summary }))?;
    Ok(())
}

async fn simulate(
    args: &SimulateArgs,
    retention: RetentionConfig,
    time_scale: f64,
) -> anyhow::Result<(Arc<Room>, Summary)> {
    let clock: Arc<dyn Clock> = Arc::new(
        ScaledClock::system(time_scale)
            .with_context(|| format!("invalid time scale: {time_scale}"))?,
    );
    let room = Arc::new(Room::new("simulated-room", "host", retention, clock).map_err(Error::from)?);
    let tick = Duration::from_millis(args.tick_ms);
    let timeout_ms = args.inactive_timeout_secs.saturating_mul(MS_PER_SEC);

    info!(
        participants = args.participants,
        ticks = args.ticks,
        tick_ms = args.tick_ms,
        time_scale,
        "simulation started"
    );

    let (stop_tx, stop_rx) = watch::channel(false);
    let mut tasks = JoinSet::new();
    for index in 0..args.participants {
        let seed = args.seed.wrapping_add(index as u64);
        tasks.spawn(participant(
            Arc::clone(&room),
            format!("participant-{index}"),
            seed,
            args.tick_ms,
            stop_rx.clone(),
        ));
    }

    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut ticks_run = 0;
    let mut inactive_dropped = 0;
    while ticks_run < args.ticks {
        tokio::select! {
            _ = interval.tick() => {}
            _ = &mut ctrl_c => {
                warn!(ticks_run, "interrupted, stopping early");
                break;
            }
        }
        room.touch_host();
        inactive_dropped += room.remove_inactive_participants(timeout_ms);
        let outcome = room.tick();
        debug!(tick = ticks_run, recorded = outcome.is_recorded(), "refresh tick");
        ticks_run += 1;
    }

    let _ = stop_tx.send(true);
    while let Some(joined) = tasks.join_next().await {
        joined.context("participant task failed")?;
    }

    let stats = room.history_stats();
    info!(
        recorded = stats.recorded,
        throttled = stats.throttled,
        dense = stats.dense_len,
        sparse = stats.sparse_len,
        "simulation finished"
    );
    let summary = Summary {
        participants: args.participants,
        ticks: ticks_run,
        time_scale,
        inactive_dropped,
        history_len: stats.dense_len + stats.sparse_len,
        stats,
    };
    Ok((room, summary))
}

/// One participant: join, then wake at random and change status or check in.
async fn participant(
    room: Arc<Room>,
    id: String,
    seed: u64,
    tick_ms: u64,
    mut stop: watch::Receiver<bool>,
) {
    let mut rng = StdRng::seed_from_u64(seed);
    room.set_participant_status(id.clone(), StatusValue::Unknown);

    loop {
        let pause_ms = rng.random_range(tick_ms / 2..=tick_ms.saturating_mul(4));
        tokio::select! {
            () = tokio::time::sleep(Duration::from_millis(pause_ms)) => {}
            _ = stop.changed() => break,
        }

        // Dropped participants rejoin with their next status.
        if rng.random_bool(CHANGE_PROBABILITY) || !room.touch_participant(&id) {
            let status = StatusValue::ALL[rng.random_range(1..StatusValue::COUNT)];
            room.set_participant_status(id.clone(), status);
        }
    }
}
