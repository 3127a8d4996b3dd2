mod compiler;
mod database;
mod defs;
mod discovery;
mod types;

pub use compiler::{
    compile_stats_catalog, ContentCompileError, ContentErrorCode, SourceLocation,
};
pub use database::{MonsterAppearance, MonsterId, MonsterStats, NpcSpawnDef, StatsCatalog};
pub use types::{ContentPlanError, ContentRequest};
