use engine::{
    isometric_translation, AnimationMode, Composite, CompositeError, CompositeLoader,
    EquipmentSlots, Facing, MonsterStats, Motion, NpcAction, ObjectKind, StatsCatalog, Surface,
    Vec2, Waypoint, PALETTE_UNITS,
};
use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::animation::{arrival_plan, heading_intent, AnimationIntent, RepeatRange};
use super::equipment::select_equipment;
use super::path_cursor::PathCursor;

#[derive(Debug, Error)]
pub(crate) enum NpcError {
    #[error("monster '{monster}' has no appearance record '{key}'")]
    MissingAppearance { monster: String, key: String },
    #[error("failed to assemble composite '{token}' for monster '{monster}'")]
    Assemble {
        monster: String,
        token: String,
        #[source]
        source: CompositeError,
    },
    #[error("failed to set initial mode for monster '{monster}'")]
    SetMode {
        monster: String,
        #[source]
        source: CompositeError,
    },
    #[error("failed to equip monster '{monster}'")]
    Equip {
        monster: String,
        #[source]
        source: CompositeError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct NpcSnapshot {
    pub(crate) monster: String,
    pub(crate) name: Option<String>,
    pub(crate) position: Vec2,
    pub(crate) velocity: Vec2,
    pub(crate) facing: Facing,
    pub(crate) mode: String,
    pub(crate) played_count: u32,
    pub(crate) is_at_rest: bool,
    pub(crate) has_paths: bool,
    pub(crate) repeat_target: u32,
    pub(crate) pending_action: NpcAction,
    pub(crate) path_index: usize,
    pub(crate) path_len: usize,
    pub(crate) equipment: EquipmentSlots,
}

/// Passive townsperson walking a looped route.
///
/// Every frame the NPC steps its motion, plays its composite, and once it has
/// rested at a waypoint for `repeat_target` loops moves on to the next one.
/// Mode and facing are only pushed to the composite when they change.
#[derive(Debug)]
pub(crate) struct Npc<C: Composite> {
    monster: String,
    name: Option<String>,
    motion: Motion,
    composite: C,
    equipment: EquipmentSlots,
    paths: PathCursor,
    has_paths: bool,
    is_at_rest: bool,
    repeat_target: u32,
    pending_action: NpcAction,
    repeat_range: RepeatRange,
}

impl<C: Composite> Npc<C> {
    pub(crate) fn new<L, R>(
        loader: &mut L,
        catalog: &StatsCatalog,
        stats: &MonsterStats,
        position: Vec2,
        facing: Facing,
        repeat_range: RepeatRange,
        rng: &mut R,
    ) -> Result<Self, NpcError>
    where
        L: CompositeLoader<Composite = C>,
        R: Rng + ?Sized,
    {
        let appearance = catalog.appearance(&stats.extra_data_key).ok_or_else(|| {
            NpcError::MissingAppearance {
                monster: stats.def_name.clone(),
                key: stats.extra_data_key.clone(),
            }
        })?;
        let equipment = select_equipment(&appearance.equipment_options, rng);

        let mut composite = loader
            .assemble(ObjectKind::Character, &stats.animation_token, PALETTE_UNITS)
            .map_err(|source| NpcError::Assemble {
                monster: stats.def_name.clone(),
                token: stats.animation_token.clone(),
                source,
            })?;
        composite
            .set_mode(AnimationMode::Neutral, &appearance.base_weapon_class)
            .map_err(|source| NpcError::SetMode {
                monster: stats.def_name.clone(),
                source,
            })?;
        composite
            .equip(&equipment)
            .map_err(|source| NpcError::Equip {
                monster: stats.def_name.clone(),
                source,
            })?;

        let mut motion = Motion::new(position);
        motion.set_speed(stats.speed_base);

        let name = stats
            .interactable
            .then(|| catalog.translate_or_key(&stats.name_string).to_string());

        let mut npc = Self {
            monster: stats.def_name.clone(),
            name,
            motion,
            composite,
            equipment,
            paths: PathCursor::default(),
            has_paths: false,
            is_at_rest: false,
            repeat_target: 0,
            pending_action: NpcAction::Invalid,
            repeat_range,
        };
        npc.apply_intent(AnimationIntent {
            mode: None,
            facing: Some(facing),
        });
        Ok(npc)
    }

    /// Replaces the route and rests at the current position; the first
    /// waypoint is armed once the rest is over.
    pub(crate) fn set_paths(&mut self, waypoints: Vec<Waypoint>) {
        self.paths.replace(waypoints);
        self.has_paths = !self.paths.is_empty();
        self.is_at_rest = true;
    }

    pub(crate) fn advance<R: Rng + ?Sized>(&mut self, dt_seconds: f32, rng: &mut R) {
        if self.motion.step(dt_seconds).arrived {
            self.on_arrival(rng);
        }

        if let Err(err) = self.composite.advance(dt_seconds) {
            debug!(monster = %self.monster, error = %err, "npc_animation_advance_failed");
            return;
        }

        if self.has_paths && self.is_at_rest && self.composite.played_count() > self.repeat_target
        {
            self.retire_waypoint();
        }
    }

    pub(crate) fn render(&self, surface: &mut dyn Surface) {
        let (dx, dy) = isometric_translation(self.motion.position());
        surface.push_translation(dx, dy);
        if let Err(err) = self.composite.render(surface) {
            debug!(monster = %self.monster, error = %err, "npc_render_failed");
        }
        surface.pop();
    }

    fn on_arrival<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.is_at_rest = true;
        let plan = arrival_plan(self.pending_action, self.repeat_range, rng);
        self.repeat_target = plan.repeat_target;
        debug!(
            monster = %self.monster,
            action = %self.pending_action,
            repeat_target = self.repeat_target,
            "npc_waypoint_reached"
        );
        self.apply_intent(plan.intent);
    }

    fn retire_waypoint(&mut self) {
        self.is_at_rest = false;
        let Some(waypoint) = self.paths.advance().copied() else {
            return;
        };
        self.pending_action = waypoint.action;
        let heading = self.motion.set_target(waypoint.position);
        debug!(
            monster = %self.monster,
            path_index = self.paths.index(),
            x = waypoint.position.x,
            y = waypoint.position.y,
            action = %waypoint.action,
            "npc_waypoint_retired"
        );
        if let Some(facing) = heading {
            self.apply_intent(heading_intent(self.motion.at_target(), facing));
        }
    }

    fn apply_intent(&mut self, intent: AnimationIntent) {
        if let Some(mode) = intent.mode {
            if AnimationMode::from_token(self.composite.mode()) != Some(mode) {
                let weapon_class = self.composite.weapon_class().to_string();
                if let Err(err) = self.composite.set_mode(mode, &weapon_class) {
                    debug!(monster = %self.monster, mode = %mode, error = %err, "npc_set_mode_failed");
                }
            }
        }
        if let Some(facing) = intent.facing {
            if self.composite.direction() != facing {
                self.composite.set_direction(facing);
            }
        }
    }

    pub(crate) fn monster(&self) -> &str {
        &self.monster
    }

    pub(crate) fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn selectable(&self) -> bool {
        self.name.as_deref().is_some_and(|name| !name.is_empty())
    }

    pub(crate) fn position(&self) -> Vec2 {
        self.motion.position()
    }

    pub(crate) fn velocity(&self) -> Vec2 {
        self.motion.velocity()
    }

    pub(crate) fn facing(&self) -> Facing {
        self.composite.direction()
    }

    pub(crate) fn is_at_rest(&self) -> bool {
        self.is_at_rest
    }

    pub(crate) fn has_paths(&self) -> bool {
        self.has_paths
    }

    pub(crate) fn repeat_target(&self) -> u32 {
        self.repeat_target
    }

    pub(crate) fn pending_action(&self) -> NpcAction {
        self.pending_action
    }

    pub(crate) fn path_index(&self) -> usize {
        self.paths.index()
    }

    pub(crate) fn path_len(&self) -> usize {
        self.paths.len()
    }

    pub(crate) fn equipment(&self) -> &EquipmentSlots {
        &self.equipment
    }

    pub(crate) fn composite(&self) -> &C {
        &self.composite
    }

    pub(crate) fn snapshot(&self) -> NpcSnapshot {
        NpcSnapshot {
            monster: self.monster.clone(),
            name: self.name.clone(),
            position: self.position(),
            velocity: self.velocity(),
            facing: self.facing(),
            mode: self.composite().mode().to_string(),
            played_count: self.composite().played_count(),
            is_at_rest: self.is_at_rest,
            has_paths: self.has_paths,
            repeat_target: self.repeat_target,
            pending_action: self.pending_action,
            path_index: self.path_index(),
            path_len: self.path_len(),
            equipment: self.equipment().clone(),
        }
    }
}
