use crate::content::StatsCatalog;

use super::surface::Surface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Quit,
}

pub trait Scene {
    fn load(&mut self, catalog: &StatsCatalog);
    fn update(&mut self, fixed_dt_seconds: f32) -> SceneCommand;
    /// Runs after every update; must not change simulation state.
    fn render(&self, surface: &mut dyn Surface);
    fn unload(&mut self);
    fn entity_count(&self) -> usize;
    fn debug_title(&self) -> Option<String> {
        None
    }
}
