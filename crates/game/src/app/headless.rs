use engine::{
    compose_sprite_key, AnimationMode, Composite, CompositeError, CompositeLoader, EquipmentSlots,
    Facing, ObjectKind, Surface,
};
use tracing::trace;

pub(crate) const HEADLESS_FRAMES_PER_SECOND: f32 = 25.0;
pub(crate) const DEFAULT_FRAMES_PER_LOOP: u32 = 16;

/// Composite without image data: plays a fixed-length loop per mode and
/// blits one sprite key per equipped layer.
#[derive(Debug, Clone)]
pub(crate) struct HeadlessComposite {
    base_key: String,
    palette: String,
    mode: Option<AnimationMode>,
    weapon_class: String,
    facing: Facing,
    layers: Vec<String>,
    frames_per_loop: u32,
    elapsed_frames: f32,
    played_count: u32,
}

impl HeadlessComposite {
    #[cfg(test)]
    pub(crate) fn base_key(&self) -> &str {
        &self.base_key
    }

    #[cfg(test)]
    pub(crate) fn palette(&self) -> &str {
        &self.palette
    }

    pub(crate) fn current_frame(&self) -> u32 {
        self.elapsed_frames as u32
    }

    fn layer_key(&self, mode: AnimationMode, layer: &str) -> Result<String, CompositeError> {
        compose_sprite_key(&[
            self.base_key.as_str(),
            layer,
            mode.token(),
            self.weapon_class.as_str(),
        ])
        .map_err(|err| CompositeError::Render(err.to_string()))
    }
}

impl Composite for HeadlessComposite {
    fn set_mode(&mut self, mode: AnimationMode, weapon_class: &str) -> Result<(), CompositeError> {
        if compose_sprite_key(&[weapon_class]).is_err() {
            return Err(CompositeError::UnknownMode {
                mode,
                weapon_class: weapon_class.to_string(),
            });
        }
        self.mode = Some(mode);
        self.weapon_class = weapon_class.to_ascii_uppercase();
        self.elapsed_frames = 0.0;
        self.played_count = 0;
        Ok(())
    }

    fn equip(&mut self, equipment: &EquipmentSlots) -> Result<(), CompositeError> {
        let mut layers = Vec::with_capacity(equipment.equipped_count());
        for (slot, option) in equipment.iter() {
            let Some(option) = option else {
                continue;
            };
            let layer = compose_sprite_key(&[slot.token(), option]).map_err(|_| {
                CompositeError::UnknownEquipment {
                    slot,
                    option: option.to_string(),
                }
            })?;
            layers.push(layer);
        }
        self.layers = layers;
        Ok(())
    }

    fn set_direction(&mut self, facing: Facing) {
        self.facing = facing;
    }

    fn direction(&self) -> Facing {
        self.facing
    }

    fn advance(&mut self, dt_seconds: f32) -> Result<(), CompositeError> {
        if self.mode.is_none() {
            return Err(CompositeError::Playback("no mode selected".to_string()));
        }
        if !dt_seconds.is_finite() || dt_seconds < 0.0 {
            return Err(CompositeError::Playback(format!("invalid frame delta {dt_seconds}")));
        }
        let loop_length = self.frames_per_loop as f32;
        self.elapsed_frames += dt_seconds * HEADLESS_FRAMES_PER_SECOND;
        while self.elapsed_frames >= loop_length {
            self.elapsed_frames -= loop_length;
            self.played_count = self.played_count.saturating_add(1);
        }
        Ok(())
    }

    fn render(&self, surface: &mut dyn Surface) -> Result<(), CompositeError> {
        let Some(mode) = self.mode else {
            return Err(CompositeError::Render("no mode selected".to_string()));
        };
        let frame = u32::from(self.facing.index()) * self.frames_per_loop + self.current_frame();
        if self.layers.is_empty() {
            let key = self.layer_key(mode, "body")?;
            surface.blit(&key, frame);
            return Ok(());
        }
        for layer in &self.layers {
            let key = self.layer_key(mode, layer)?;
            surface.blit(&key, frame);
        }
        Ok(())
    }

    fn played_count(&self) -> u32 {
        self.played_count
    }

    fn mode(&self) -> &str {
        self.mode.map(AnimationMode::token).unwrap_or("")
    }

    fn weapon_class(&self) -> &str {
        &self.weapon_class
    }
}

#[derive(Debug, Clone)]
pub(crate) struct HeadlessCompositeLoader {
    frames_per_loop: u32,
}

impl Default for HeadlessCompositeLoader {
    fn default() -> Self {
        Self::new(DEFAULT_FRAMES_PER_LOOP)
    }
}

impl HeadlessCompositeLoader {
    pub(crate) fn new(frames_per_loop: u32) -> Self {
        Self {
            frames_per_loop: frames_per_loop.max(1),
        }
    }
}

impl CompositeLoader for HeadlessCompositeLoader {
    type Composite = HeadlessComposite;

    fn assemble(
        &mut self,
        kind: ObjectKind,
        directory_token: &str,
        palette_token: &str,
    ) -> Result<HeadlessComposite, CompositeError> {
        let base_key = compose_sprite_key(&[kind.as_token(), directory_token]).map_err(|err| {
            CompositeError::InvalidDirectory {
                token: directory_token.to_string(),
                reason: err.to_string(),
            }
        })?;
        trace!(base_key = %base_key, palette = palette_token, "composite_assembled");
        Ok(HeadlessComposite {
            base_key,
            palette: palette_token.to_string(),
            mode: None,
            weapon_class: String::new(),
            facing: Facing::default(),
            layers: Vec::new(),
            frames_per_loop: self.frames_per_loop,
            elapsed_frames: 0.0,
            played_count: 0,
        })
    }
}
