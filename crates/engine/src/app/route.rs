use std::fmt;

use serde::{Deserialize, Serialize};

use super::geometry::Vec2;

/// Action code attached to a waypoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NpcAction {
    #[default]
    Invalid,
    Action1,
    Action2,
    Action3,
    Skill1,
}

impl NpcAction {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Invalid),
            1 => Some(Self::Action1),
            2 => Some(Self::Action2),
            3 => Some(Self::Action3),
            4 => Some(Self::Skill1),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        match self {
            Self::Invalid => 0,
            Self::Action1 => 1,
            Self::Action2 => 2,
            Self::Action3 => 3,
            Self::Skill1 => 4,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Invalid" => Some(Self::Invalid),
            "Action1" => Some(Self::Action1),
            "Action2" => Some(Self::Action2),
            "Action3" => Some(Self::Action3),
            "Skill1" => Some(Self::Skill1),
            _ => None,
        }
    }

    /// Accepts either a variant name or its numeric code.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::from_name(raw).or_else(|| raw.parse::<u32>().ok().and_then(Self::from_code))
    }
}

impl fmt::Display for NpcAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub position: Vec2,
    pub action: NpcAction,
}

impl Waypoint {
    pub fn new(position: Vec2, action: NpcAction) -> Self {
        Self { position, action }
    }
}
