use engine::{AnimationMode, Facing, NpcAction};
use rand::Rng;

pub(crate) const DEFAULT_MIN_REPEAT: u32 = 3;
pub(crate) const DEFAULT_REPEAT_SPAN: u32 = 5;

/// How many animation loops an NPC plays at a waypoint before moving on,
/// drawn from `min_repeat..min_repeat + repeat_span`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RepeatRange {
    min_repeat: u32,
    repeat_span: u32,
}

impl Default for RepeatRange {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_REPEAT, DEFAULT_REPEAT_SPAN)
    }
}

impl RepeatRange {
    /// A zero span is treated as one so the range is never empty.
    pub(crate) fn new(min_repeat: u32, repeat_span: u32) -> Self {
        Self {
            min_repeat,
            repeat_span: repeat_span.max(1),
        }
    }

    pub(crate) fn min_repeat(self) -> u32 {
        self.min_repeat
    }

    pub(crate) fn max_repeat(self) -> u32 {
        self.min_repeat.saturating_add(self.repeat_span - 1)
    }

    #[cfg(test)]
    pub(crate) fn contains(self, value: u32) -> bool {
        (self.min_repeat..=self.max_repeat()).contains(&value)
    }

    pub(crate) fn roll<R: Rng + ?Sized>(self, rng: &mut R) -> u32 {
        rng.gen_range(self.min_repeat..=self.max_repeat())
    }
}

pub(crate) fn action_animation(action: NpcAction) -> AnimationMode {
    match action {
        NpcAction::Skill1 => AnimationMode::Skill1,
        NpcAction::Invalid | NpcAction::Action1 | NpcAction::Action2 | NpcAction::Action3 => {
            AnimationMode::Neutral
        }
    }
}

/// Desired composite state. `None` fields leave the composite as it is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct AnimationIntent {
    pub(crate) mode: Option<AnimationMode>,
    pub(crate) facing: Option<Facing>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ArrivalPlan {
    pub(crate) repeat_target: u32,
    pub(crate) intent: AnimationIntent,
}

/// Every waypoint action plays its animation once before the NPC moves on.
/// The dwell is still drawn from `repeat_range` and discarded so the random
/// stream stays the same whatever the action.
pub(crate) fn arrival_plan<R: Rng + ?Sized>(
    pending_action: NpcAction,
    repeat_range: RepeatRange,
    rng: &mut R,
) -> ArrivalPlan {
    repeat_range.roll(rng);
    ArrivalPlan {
        repeat_target: 0,
        intent: AnimationIntent {
            mode: Some(action_animation(pending_action)),
            facing: None,
        },
    }
}

pub(crate) fn heading_intent(at_target: bool, facing: Facing) -> AnimationIntent {
    let mode = if at_target {
        AnimationMode::Neutral
    } else {
        AnimationMode::Walk
    };
    AnimationIntent {
        mode: Some(mode),
        facing: Some(facing),
    }
}
