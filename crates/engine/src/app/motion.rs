use super::geometry::{Facing, Vec2};

/// What happened during a single [`Motion::step`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotionStep {
    /// Set exactly once per armed target, on the step that reaches it.
    pub arrived: bool,
}

/// Straight-line target seeking for a map entity.
///
/// Heading changes are reported from [`Motion::set_target`] and arrival from
/// [`Motion::step`], so owners react to them as values instead of callbacks.
#[derive(Debug, Clone, PartialEq)]
pub struct Motion {
    position: Vec2,
    target: Vec2,
    velocity: Vec2,
    speed: f32,
    facing: Option<Facing>,
    arrival_armed: bool,
}

impl Motion {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            target: position,
            velocity: Vec2::ZERO,
            speed: 0.0,
            facing: None,
            arrival_armed: false,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn target(&self) -> Vec2 {
        self.target
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn facing(&self) -> Option<Facing> {
        self.facing
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = if speed.is_finite() { speed.max(0.0) } else { 0.0 };
        if !self.at_target() {
            self.velocity = (self.target - self.position).with_length(self.speed);
        }
    }

    pub fn at_target(&self) -> bool {
        self.position.approx_eq(self.target)
    }

    /// Arms a new target. Returns the heading toward it when there is one to
    /// walk; a target on top of the current position reports no heading but
    /// still arrives on the next step.
    pub fn set_target(&mut self, target: Vec2) -> Option<Facing> {
        self.target = target;
        self.arrival_armed = true;
        self.velocity = (target - self.position).with_length(self.speed);
        let heading = Facing::from_heading(target - self.position)?;
        self.facing = Some(heading);
        Some(heading)
    }

    pub fn step(&mut self, dt_seconds: f32) -> MotionStep {
        if !self.at_target() {
            let remaining = self.target - self.position;
            let max_step = self.speed * dt_seconds.max(0.0);
            if max_step * max_step >= remaining.length_squared() {
                self.position = self.target;
            } else {
                self.position = self.position + remaining.with_length(max_step);
            }
        }

        if !self.at_target() {
            return MotionStep::default();
        }
        self.position = self.target;
        self.velocity = Vec2::ZERO;
        let arrived = std::mem::take(&mut self.arrival_armed);
        MotionStep { arrived }
    }
}
