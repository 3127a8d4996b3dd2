use std::fs;
use std::path::{Path, PathBuf};

use engine::{Scene, SceneCommand, StatsCatalog, Surface};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use super::headless::{HeadlessComposite, HeadlessCompositeLoader};
use super::npc::{Npc, NpcSnapshot, RepeatRange};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TownSettings {
    pub(crate) seed: u64,
    pub(crate) repeat_range: RepeatRange,
    pub(crate) dump_path: Option<PathBuf>,
}

impl Default for TownSettings {
    fn default() -> Self {
        Self {
            seed: 0,
            repeat_range: RepeatRange::default(),
            dump_path: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct TownStateDump<'a> {
    seed: u64,
    ticks: u64,
    elapsed_seconds: f32,
    npcs: &'a [NpcSnapshot],
}

#[derive(Debug, Error)]
pub(crate) enum DumpError {
    #[error("failed to serialize town state: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write town state to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Headless town: every spawn in the catalog becomes an NPC walking its route.
pub(crate) struct TownScene {
    settings: TownSettings,
    loader: HeadlessCompositeLoader,
    rng: StdRng,
    npcs: Vec<Npc<HeadlessComposite>>,
    ticks: u64,
    elapsed_seconds: f32,
}

impl TownScene {
    pub(crate) fn new(settings: TownSettings) -> Self {
        let rng = StdRng::seed_from_u64(settings.seed);
        Self {
            settings,
            loader: HeadlessCompositeLoader::default(),
            rng,
            npcs: Vec::new(),
            ticks: 0,
            elapsed_seconds: 0.0,
        }
    }

    #[cfg(test)]
    pub(crate) fn npcs(&self) -> &[Npc<HeadlessComposite>] {
        &self.npcs
    }

    pub(crate) fn snapshots(&self) -> Vec<NpcSnapshot> {
        self.npcs.iter().map(Npc::snapshot).collect()
    }

    pub(crate) fn write_state_dump(&self, path: &Path) -> Result<(), DumpError> {
        let npcs = self.snapshots();
        let dump = TownStateDump {
            seed: self.settings.seed,
            ticks: self.ticks,
            elapsed_seconds: self.elapsed_seconds,
            npcs: &npcs,
        };
        let json = serde_json::to_string_pretty(&dump)?;
        fs::write(path, json).map_err(|source| DumpError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Scene for TownScene {
    fn load(&mut self, catalog: &StatsCatalog) {
        self.rng = StdRng::seed_from_u64(self.settings.seed);
        self.npcs.clear();
        self.ticks = 0;
        self.elapsed_seconds = 0.0;

        for spawn in catalog.spawns() {
            let Some(stats) = catalog.monster_by_name(&spawn.monster) else {
                warn!(spawn = %spawn.def_name, monster = %spawn.monster, "npc_spawn_unknown_monster");
                continue;
            };
            let mut npc = match Npc::new(
                &mut self.loader,
                catalog,
                stats,
                spawn.position,
                spawn.facing,
                self.settings.repeat_range,
                &mut self.rng,
            ) {
                Ok(npc) => npc,
                Err(err) => {
                    warn!(spawn = %spawn.def_name, error = %err, "npc_spawn_failed");
                    continue;
                }
            };
            npc.set_paths(spawn.path.clone());
            info!(
                spawn = %spawn.def_name,
                monster = %npc.monster(),
                name = npc.name().unwrap_or(""),
                selectable = npc.selectable(),
                waypoints = npc.path_len(),
                x = spawn.position.x,
                y = spawn.position.y,
                "npc_spawned"
            );
            self.npcs.push(npc);
        }
    }

    fn update(&mut self, fixed_dt_seconds: f32) -> SceneCommand {
        for npc in &mut self.npcs {
            npc.advance(fixed_dt_seconds, &mut self.rng);
        }
        self.ticks = self.ticks.saturating_add(1);
        self.elapsed_seconds += fixed_dt_seconds;
        SceneCommand::None
    }

    fn render(&self, surface: &mut dyn Surface) {
        for npc in &self.npcs {
            npc.render(surface);
        }
    }

    fn unload(&mut self) {
        if let Some(path) = self.settings.dump_path.clone() {
            match self.write_state_dump(&path) {
                Ok(()) => {
                    info!(path = %path.display(), npcs = self.npcs.len(), "town_state_dumped")
                }
                Err(err) => warn!(error = %err, "town_state_dump_failed"),
            }
        }
        info!(
            ticks = self.ticks,
            elapsed_seconds = self.elapsed_seconds,
            npcs = self.npcs.len(),
            "town_unloaded"
        );
        self.npcs.clear();
    }

    fn entity_count(&self) -> usize {
        self.npcs.len()
    }

    fn debug_title(&self) -> Option<String> {
        Some(format!(
            "Town | npcs: {} | seed: {}",
            self.npcs.len(),
            self.settings.seed
        ))
    }
}
