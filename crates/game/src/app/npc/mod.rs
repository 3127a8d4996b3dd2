mod animation;
mod controller;
mod equipment;
mod path_cursor;

pub(crate) use animation::RepeatRange;
pub(crate) use controller::{Npc, NpcSnapshot};

#[cfg(test)]
mod tests;
