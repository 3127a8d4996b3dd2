use tracing::{trace, warn};

/// Drawing target handed to the render pass.
pub trait Surface {
    fn push_translation(&mut self, dx: i32, dy: i32);
    fn pop(&mut self);
    fn blit(&mut self, sprite_key: &str, frame: u32);
}

/// Headless surface: keeps the translation stack and counts what was drawn.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    translations: Vec<(i32, i32)>,
    blit_count: u64,
    last_blit: Option<(String, u32, (i32, i32))>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.translations.len()
    }

    /// Sum of all pushed translations.
    pub fn origin(&self) -> (i32, i32) {
        self.translations
            .iter()
            .fold((0, 0), |(x, y), (dx, dy)| (x + dx, y + dy))
    }

    pub fn blit_count(&self) -> u64 {
        self.blit_count
    }

    pub fn last_blit(&self) -> Option<(&str, u32, (i32, i32))> {
        self.last_blit
            .as_ref()
            .map(|(key, frame, origin)| (key.as_str(), *frame, *origin))
    }
}

impl Surface for RecordingSurface {
    fn push_translation(&mut self, dx: i32, dy: i32) {
        self.translations.push((dx, dy));
    }

    fn pop(&mut self) {
        if self.translations.pop().is_none() {
            warn!("surface_pop_without_push");
        }
    }

    fn blit(&mut self, sprite_key: &str, frame: u32) {
        let origin = self.origin();
        trace!(sprite_key, frame, x = origin.0, y = origin.1, "surface_blit");
        self.blit_count = self.blit_count.saturating_add(1);
        self.last_blit = Some((sprite_key.to_string(), frame, origin));
    }
}
