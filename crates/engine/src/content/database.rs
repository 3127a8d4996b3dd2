use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::app::{CompositeSlot, Facing, Vec2, Waypoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MonsterId(pub u32);

/// Base stats record of a monster or townsperson.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonsterStats {
    pub id: MonsterId,
    pub def_name: String,
    /// Localization key of the display name.
    pub name_string: String,
    /// Composite directory, e.g. `cr` for a sprite set under `monsters/cr`.
    pub animation_token: String,
    pub speed_base: f32,
    pub interactable: bool,
    /// Key of the matching [`MonsterAppearance`].
    pub extra_data_key: String,
}

/// Extended stats record: how the composite is dressed and armed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonsterAppearance {
    pub def_name: String,
    pub base_weapon_class: String,
    pub equipment_options: BTreeMap<CompositeSlot, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NpcSpawnDef {
    pub def_name: String,
    pub monster: String,
    pub position: Vec2,
    pub facing: Facing,
    pub path: Vec<Waypoint>,
}

#[derive(Debug, Default, Clone)]
pub struct StatsCatalog {
    monsters: Vec<MonsterStats>,
    monster_ids_by_name: HashMap<String, MonsterId>,
    appearances: HashMap<String, MonsterAppearance>,
    strings: HashMap<String, String>,
    spawns: Vec<NpcSpawnDef>,
}

impl StatsCatalog {
    /// Ids are reassigned from the order of `monsters`.
    pub fn from_parts(
        mut monsters: Vec<MonsterStats>,
        appearances: Vec<MonsterAppearance>,
        strings: Vec<(String, String)>,
        spawns: Vec<NpcSpawnDef>,
    ) -> Self {
        let mut monster_ids_by_name = HashMap::with_capacity(monsters.len());
        for (idx, monster) in monsters.iter_mut().enumerate() {
            let id = MonsterId(idx as u32);
            monster.id = id;
            monster_ids_by_name.insert(monster.def_name.clone(), id);
        }
        let appearances = appearances
            .into_iter()
            .map(|appearance| (appearance.def_name.clone(), appearance))
            .collect();
        Self {
            monsters,
            monster_ids_by_name,
            appearances,
            strings: strings.into_iter().collect(),
            spawns,
        }
    }

    pub fn monster_id_by_name(&self, name: &str) -> Option<MonsterId> {
        self.monster_ids_by_name.get(name).copied()
    }

    pub fn monster(&self, id: MonsterId) -> Option<&MonsterStats> {
        self.monsters.get(id.0 as usize)
    }

    pub fn monster_by_name(&self, name: &str) -> Option<&MonsterStats> {
        self.monster_id_by_name(name)
            .and_then(|id| self.monster(id))
    }

    pub fn monsters(&self) -> &[MonsterStats] {
        &self.monsters
    }

    pub fn appearance(&self, key: &str) -> Option<&MonsterAppearance> {
        self.appearances.get(key)
    }

    pub fn translate(&self, key: &str) -> Option<&str> {
        self.strings.get(key).map(String::as_str)
    }

    /// Missing keys render as themselves so untranslated names stay visible.
    pub fn translate_or_key<'a>(&'a self, key: &'a str) -> &'a str {
        self.translate(key).unwrap_or(key)
    }

    pub fn string_count(&self) -> usize {
        self.strings.len()
    }

    pub fn spawns(&self) -> &[NpcSpawnDef] {
        &self.spawns
    }
}
