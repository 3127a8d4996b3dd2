use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::geometry::Facing;
use super::surface::Surface;

pub const PALETTE_UNITS: &str = "units";
pub const EQUIPMENT_SLOT_COUNT: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Player,
    Character,
    Item,
}

impl ObjectKind {
    pub fn as_token(self) -> &'static str {
        match self {
            Self::Player => "chars",
            Self::Character => "monsters",
            Self::Item => "items",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationMode {
    Death,
    Neutral,
    Walk,
    GetHit,
    Attack1,
    Attack2,
    Block,
    Cast,
    Skill1,
    Skill2,
    Skill3,
    Skill4,
    Dead,
    Knockback,
    Sequence,
    Run,
}

impl AnimationMode {
    pub const ALL: [AnimationMode; 16] = [
        Self::Death,
        Self::Neutral,
        Self::Walk,
        Self::GetHit,
        Self::Attack1,
        Self::Attack2,
        Self::Block,
        Self::Cast,
        Self::Skill1,
        Self::Skill2,
        Self::Skill3,
        Self::Skill4,
        Self::Dead,
        Self::Knockback,
        Self::Sequence,
        Self::Run,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Self::Death => "DT",
            Self::Neutral => "NU",
            Self::Walk => "WL",
            Self::GetHit => "GH",
            Self::Attack1 => "A1",
            Self::Attack2 => "A2",
            Self::Block => "BL",
            Self::Cast => "SC",
            Self::Skill1 => "S1",
            Self::Skill2 => "S2",
            Self::Skill3 => "S3",
            Self::Skill4 => "S4",
            Self::Dead => "DD",
            Self::Knockback => "KB",
            Self::Sequence => "SQ",
            Self::Run => "RN",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.token().eq_ignore_ascii_case(token))
    }
}

impl fmt::Display for AnimationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Layer of an assembled composite, in sprite-sheet order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CompositeSlot {
    Head,
    Torso,
    Legs,
    RightArm,
    LeftArm,
    RightHand,
    LeftHand,
    Shield,
    Special1,
    Special2,
    Special3,
    Special4,
    Special5,
    Special6,
    Special7,
    Special8,
}

impl CompositeSlot {
    pub const ALL: [CompositeSlot; EQUIPMENT_SLOT_COUNT] = [
        Self::Head,
        Self::Torso,
        Self::Legs,
        Self::RightArm,
        Self::LeftArm,
        Self::RightHand,
        Self::LeftHand,
        Self::Shield,
        Self::Special1,
        Self::Special2,
        Self::Special3,
        Self::Special4,
        Self::Special5,
        Self::Special6,
        Self::Special7,
        Self::Special8,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn token(self) -> &'static str {
        match self {
            Self::Head => "HD",
            Self::Torso => "TR",
            Self::Legs => "LG",
            Self::RightArm => "RA",
            Self::LeftArm => "LA",
            Self::RightHand => "RH",
            Self::LeftHand => "LH",
            Self::Shield => "SH",
            Self::Special1 => "S1",
            Self::Special2 => "S2",
            Self::Special3 => "S3",
            Self::Special4 => "S4",
            Self::Special5 => "S5",
            Self::Special6 => "S6",
            Self::Special7 => "S7",
            Self::Special8 => "S8",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|slot| slot.token().eq_ignore_ascii_case(token))
    }
}

/// One chosen appearance option per composite slot; `None` draws nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EquipmentSlots([Option<String>; EQUIPMENT_SLOT_COUNT]);

impl EquipmentSlots {
    pub fn get(&self, slot: CompositeSlot) -> Option<&str> {
        self.0[slot.index()].as_deref()
    }

    pub fn set(&mut self, slot: CompositeSlot, option: Option<String>) {
        self.0[slot.index()] = option;
    }

    pub fn iter(&self) -> impl Iterator<Item = (CompositeSlot, Option<&str>)> + '_ {
        CompositeSlot::ALL
            .into_iter()
            .map(move |slot| (slot, self.get(slot)))
    }

    pub fn equipped_count(&self) -> usize {
        self.0.iter().filter(|option| option.is_some()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositeError {
    #[error("composite directory '{token}' is not a valid sprite key: {reason}")]
    InvalidDirectory { token: String, reason: String },
    #[error("no animation for mode {mode} with weapon class '{weapon_class}'")]
    UnknownMode {
        mode: AnimationMode,
        weapon_class: String,
    },
    #[error("slot {slot:?} has no layer named '{option}'")]
    UnknownEquipment { slot: CompositeSlot, option: String },
    #[error("animation playback failed: {0}")]
    Playback(String),
    #[error("composite render failed: {0}")]
    Render(String),
}

/// Assembled multi-layer animated appearance of a single entity.
pub trait Composite {
    fn set_mode(&mut self, mode: AnimationMode, weapon_class: &str) -> Result<(), CompositeError>;
    fn equip(&mut self, equipment: &EquipmentSlots) -> Result<(), CompositeError>;
    fn set_direction(&mut self, facing: Facing);
    fn direction(&self) -> Facing;
    fn advance(&mut self, dt_seconds: f32) -> Result<(), CompositeError>;
    fn render(&self, surface: &mut dyn Surface) -> Result<(), CompositeError>;
    /// Completed loops of the current mode; restarts at zero on `set_mode`.
    fn played_count(&self) -> u32;
    /// Token of the current mode, empty before the first `set_mode`.
    fn mode(&self) -> &str;
    fn weapon_class(&self) -> &str;
}

pub trait CompositeLoader {
    type Composite: Composite;

    fn assemble(
        &mut self,
        kind: ObjectKind,
        directory_token: &str,
        palette_token: &str,
    ) -> Result<Self::Composite, CompositeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_tokens_round_trip_case_insensitively() {
        for mode in AnimationMode::ALL {
            assert_eq!(AnimationMode::from_token(mode.token()), Some(mode));
            assert_eq!(
                AnimationMode::from_token(&mode.token().to_ascii_lowercase()),
                Some(mode)
            );
        }
        assert_eq!(AnimationMode::from_token("XX"), None);
    }

    #[test]
    fn slot_indices_follow_declaration_order() {
        for (expected, slot) in CompositeSlot::ALL.into_iter().enumerate() {
            assert_eq!(slot.index(), expected);
        }
        assert_eq!(CompositeSlot::from_token("sh"), Some(CompositeSlot::Shield));
    }

    #[test]
    fn equipment_slots_start_empty() {
        let mut slots = EquipmentSlots::default();
        assert_eq!(slots.equipped_count(), 0);
        slots.set(CompositeSlot::Head, Some("lit".to_string()));
        assert_eq!(slots.get(CompositeSlot::Head), Some("lit"));
        assert_eq!(slots.get(CompositeSlot::Torso), None);
        assert_eq!(slots.equipped_count(), 1);
        assert_eq!(slots.iter().count(), EQUIPMENT_SLOT_COUNT);
    }
}
