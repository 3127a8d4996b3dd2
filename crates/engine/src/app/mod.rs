mod composite;
mod geometry;
mod loop_runner;
mod metrics;
mod motion;
mod route;
mod scene;
mod surface;

pub use composite::{
    AnimationMode, Composite, CompositeError, CompositeLoader, CompositeSlot, EquipmentSlots,
    ObjectKind, EQUIPMENT_SLOT_COUNT, PALETTE_UNITS,
};
pub use geometry::{
    isometric_translation, render_offset, Facing, Vec2, DIRECTION_COUNT, SUB_TILES_PER_TILE,
};
pub use loop_runner::{drive_scene, run_headless, AppError, LoopConfig, LoopSummary};
pub use motion::{Motion, MotionStep};
pub use route::{NpcAction, Waypoint};
pub use scene::{Scene, SceneCommand};
pub use surface::{RecordingSurface, Surface};
