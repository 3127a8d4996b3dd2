use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};

use crate::content::{compile_stats_catalog, ContentCompileError, ContentRequest, StatsCatalog};
use crate::{resolve_app_paths, StartupError};

use super::metrics::MetricsAccumulator;
use super::surface::RecordingSurface;
use super::{Scene, SceneCommand};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    /// Stop after this many ticks; `None` runs until the scene quits.
    pub max_ticks: Option<u64>,
    /// Pace ticks against the wall clock instead of running flat out.
    pub realtime: bool,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub content_request: ContentRequest,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_ticks: None,
            realtime: false,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            content_request: ContentRequest::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to compile content catalog: {0}")]
    Content(#[from] ContentCompileError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub ticks: u64,
    pub blits: u64,
    pub quit_requested: bool,
}

pub fn run_headless(config: LoopConfig, scene: &mut dyn Scene) -> Result<LoopSummary, AppError> {
    let app_paths = resolve_app_paths()?;
    info!(
        root = %app_paths.root.display(),
        base_content_dir = %app_paths.base_content_dir.display(),
        mods_dir = %app_paths.mods_dir.display(),
        "startup"
    );
    let catalog = compile_stats_catalog(&app_paths, &config.content_request)?;
    info!(
        monsters = catalog.monsters().len(),
        spawns = catalog.spawns().len(),
        strings = catalog.string_count(),
        "content_loaded"
    );
    Ok(drive_scene(&config, &catalog, scene))
}

/// Loads `scene`, steps it at the fixed rate until it quits or the tick
/// budget runs out, then unloads it. Render always follows update.
pub fn drive_scene(
    config: &LoopConfig,
    catalog: &StatsCatalog,
    scene: &mut dyn Scene,
) -> LoopSummary {
    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let fixed_dt_seconds = fixed_dt.as_secs_f32();

    scene.load(catalog);
    info!(
        entity_count = scene.entity_count(),
        title = scene.debug_title().as_deref().unwrap_or("untitled"),
        "scene_loaded"
    );
    info!(
        target_tps,
        max_ticks = ?config.max_ticks,
        realtime = config.realtime,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        "loop_config"
    );

    let mut surface = RecordingSurface::new();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);
    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut quit_requested = false;

    'frames: loop {
        let ticks_to_run = if config.realtime {
            let now = Instant::now();
            let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
            last_frame_instant = now;
            accumulator = accumulator.saturating_add(clamp_frame_delta(raw_frame_dt, max_frame_delta));
            let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
            accumulator = step_plan.remaining_accumulator;
            if step_plan.dropped_backlog > Duration::ZERO {
                warn!(
                    dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                    max_ticks_per_frame, "sim_clamp_triggered"
                );
            }
            step_plan.ticks_to_run
        } else {
            1
        };

        for _ in 0..ticks_to_run {
            if budget_exhausted(config.max_ticks, metrics_accumulator.total_ticks()) {
                break 'frames;
            }
            let tick_start = Instant::now();
            let command = scene.update(fixed_dt_seconds);
            scene.render(&mut surface);
            metrics_accumulator.record_tick(tick_start.elapsed());
            if command == SceneCommand::Quit {
                info!(reason = "scene_quit", "shutdown_requested");
                quit_requested = true;
                break 'frames;
            }
        }

        if let Some(snapshot) = metrics_accumulator.maybe_snapshot(Instant::now()) {
            info!(
                tps = snapshot.tps,
                tick_time_ms = snapshot.tick_time_ms,
                total_ticks = snapshot.total_ticks,
                entity_count = scene.entity_count(),
                "loop_metrics"
            );
        }

        if config.realtime {
            let elapsed = Instant::now().saturating_duration_since(last_frame_instant);
            let pacing_sleep = compute_pacing_sleep(elapsed, fixed_dt);
            if pacing_sleep > Duration::ZERO {
                thread::sleep(pacing_sleep);
            }
        }
    }

    scene.unload();
    let summary = LoopSummary {
        ticks: metrics_accumulator.total_ticks(),
        blits: surface.blit_count(),
        quit_requested,
    };
    info!(
        ticks = summary.ticks,
        blits = summary.blits,
        quit_requested = summary.quit_requested,
        "shutdown"
    );
    summary
}

fn budget_exhausted(max_ticks: Option<u64>, ticks_run: u64) -> bool {
    max_ticks.is_some_and(|limit| ticks_run >= limit)
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn compute_pacing_sleep(elapsed: Duration, fixed_dt: Duration) -> Duration {
    if elapsed < fixed_dt {
        fixed_dt - elapsed
    } else {
        Duration::ZERO
    }
}
