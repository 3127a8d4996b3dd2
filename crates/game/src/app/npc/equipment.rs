use std::collections::BTreeMap;

use engine::{CompositeSlot, EquipmentSlots};
use rand::seq::SliceRandom;
use rand::Rng;

/// Picks one option per slot uniformly; slots with no options stay empty.
pub(crate) fn select_equipment<R: Rng + ?Sized>(
    options: &BTreeMap<CompositeSlot, Vec<String>>,
    rng: &mut R,
) -> EquipmentSlots {
    let mut slots = EquipmentSlots::default();
    for slot in CompositeSlot::ALL {
        let choice = options
            .get(&slot)
            .and_then(|candidates| candidates.choose(rng))
            .cloned();
        slots.set(slot, choice);
    }
    slots
}
