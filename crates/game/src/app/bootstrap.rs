use std::path::PathBuf;

use engine::{ContentRequest, LoopConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::town::{TownScene, TownSettings};

const ENABLED_MODS_ENV_VAR: &str = "TOWNSFOLK_ENABLED_MODS";
const TICKS_ENV_VAR: &str = "TOWNSFOLK_TICKS";
const SEED_ENV_VAR: &str = "TOWNSFOLK_SEED";
const REALTIME_ENV_VAR: &str = "TOWNSFOLK_REALTIME";
const DUMP_STATE_ENV_VAR: &str = "TOWNSFOLK_DUMP_STATE";
const DEFAULT_TICKS: u64 = 600;

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: TownScene,
}

pub(crate) fn build_app() -> AppWiring {
    init_tracing();
    info!("=== Townsfolk Startup ===");

    let max_ticks = match parse_u64(TICKS_ENV_VAR, env_value(TICKS_ENV_VAR).as_deref()) {
        Some(0) => None,
        Some(ticks) => Some(ticks),
        None => Some(DEFAULT_TICKS),
    };
    let config = LoopConfig {
        max_ticks,
        realtime: parse_flag(env_value(REALTIME_ENV_VAR).as_deref()),
        content_request: ContentRequest {
            enabled_mods: parse_enabled_mods(env_value(ENABLED_MODS_ENV_VAR).as_deref()),
        },
        ..LoopConfig::default()
    };
    let settings = TownSettings {
        seed: parse_u64(SEED_ENV_VAR, env_value(SEED_ENV_VAR).as_deref()).unwrap_or_default(),
        dump_path: env_value(DUMP_STATE_ENV_VAR)
            .filter(|raw| !raw.trim().is_empty())
            .map(PathBuf::from),
        ..TownSettings::default()
    };
    info!(
        seed = settings.seed,
        dump_state = settings.dump_path.is_some(),
        enabled_mods = config.content_request.enabled_mods.len(),
        "settings_resolved"
    );

    AppWiring {
        config,
        scene: TownScene::new(settings),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn env_value(var: &str) -> Option<String> {
    std::env::var(var).ok()
}

fn parse_enabled_mods(raw: Option<&str>) -> Vec<String> {
    raw.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(ToString::to_string)
            .collect::<Vec<_>>()
    })
    .unwrap_or_default()
}

fn parse_u64(var: &str, raw: Option<&str>) -> Option<u64> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<u64>() {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(var, value = raw, error = %err, "env_value_ignored");
            None
        }
    }
}

fn parse_flag(raw: Option<&str>) -> bool {
    raw.map(str::trim)
        .is_some_and(|raw| matches!(raw.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}
