use std::f32::consts::TAU;
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// World positions are measured in sub-tiles; a tile spans this many of them.
pub const SUB_TILES_PER_TILE: f32 = 5.0;
pub const DIRECTION_COUNT: u8 = 64;

const POSITION_EPSILON: f32 = 0.0001;
const ISO_SCALAR_X: f32 = 16.0;
const ISO_SCALAR_Y: f32 = 8.0;
const ISO_OFFSET_Y: f32 = 5.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn is_zero(self) -> bool {
        self.length_squared() <= POSITION_EPSILON * POSITION_EPSILON
    }

    pub fn approx_eq(self, other: Vec2) -> bool {
        (self - other).is_zero()
    }

    /// Rescales to `length`; a zero vector stays zero.
    pub fn with_length(self, length: f32) -> Vec2 {
        let current = self.length();
        if current <= POSITION_EPSILON {
            return Vec2::ZERO;
        }
        self * (length / current)
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// Discrete facing in `0..DIRECTION_COUNT`.
///
/// Direction 0 points along the isometric south-west axis and indices grow
/// clockwise on screen, the way composite sprite sheets are laid out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Facing(u8);

impl Facing {
    pub fn new(index: u8) -> Self {
        Self(index % DIRECTION_COUNT)
    }

    pub fn index(self) -> u8 {
        self.0
    }

    /// Returns `None` for a zero heading, which has no direction.
    pub fn from_heading(heading: Vec2) -> Option<Facing> {
        if heading.is_zero() {
            return None;
        }
        let degrees_per_direction = 360.0 / DIRECTION_COUNT as f32;
        let offset = 45.0 - degrees_per_direction * 0.5;
        let mut angle = (-heading.y).atan2(heading.x);
        if angle < 0.0 {
            angle += TAU;
        }
        let degrees = 359.0 - angle.to_degrees();
        let raw = ((degrees - offset) / degrees_per_direction).floor() as i32;
        let index = raw.rem_euclid(DIRECTION_COUNT as i32);
        Some(Facing(index as u8))
    }
}

/// Offset of `position` inside its tile, shifted by one sub-tile.
pub fn render_offset(position: Vec2) -> Vec2 {
    let tile_origin = Vec2::new(
        (position.x / SUB_TILES_PER_TILE).floor() * SUB_TILES_PER_TILE,
        (position.y / SUB_TILES_PER_TILE).floor() * SUB_TILES_PER_TILE,
    );
    let offset = position - tile_origin;
    Vec2::new(offset.x + 1.0, offset.y + 1.0)
}

/// Screen translation in pixels for an entity drawn at `position`.
pub fn isometric_translation(position: Vec2) -> (i32, i32) {
    let offset = render_offset(position);
    let dx = (offset.x - offset.y) * ISO_SCALAR_X;
    let dy = (offset.x + offset.y) * ISO_SCALAR_Y - ISO_OFFSET_Y;
    (dx as i32, dy as i32)
}
