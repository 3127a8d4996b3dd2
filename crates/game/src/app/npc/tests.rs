use std::collections::BTreeMap;

use engine::{
    isometric_translation, AnimationMode, Composite, CompositeError, CompositeLoader,
    CompositeSlot, EquipmentSlots, Facing, MonsterAppearance, MonsterId, MonsterStats, NpcAction,
    ObjectKind, RecordingSurface, StatsCatalog, Surface, Vec2, Waypoint, PALETTE_UNITS,
};
use rand::rngs::mock::StepRng;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::controller::NpcError;
use super::{Npc, RepeatRange};

const DT: f32 = 0.25;
const LOOP_SECONDS: f32 = 1.0;

#[derive(Debug)]
struct FakeComposite {
    mode: Option<AnimationMode>,
    weapon_class: String,
    facing: Facing,
    elapsed: f32,
    played: u32,
    mode_calls: Vec<AnimationMode>,
    direction_calls: Vec<Facing>,
    equip_calls: usize,
    fail_advance: bool,
    fail_mode_changes: bool,
}

impl FakeComposite {
    fn new() -> Self {
        Self {
            mode: None,
            weapon_class: String::new(),
            facing: Facing::default(),
            elapsed: 0.0,
            played: 0,
            mode_calls: Vec::new(),
            direction_calls: Vec::new(),
            equip_calls: 0,
            fail_advance: false,
            fail_mode_changes: false,
        }
    }
}

impl Composite for FakeComposite {
    fn set_mode(&mut self, mode: AnimationMode, weapon_class: &str) -> Result<(), CompositeError> {
        assert_ne!(self.mode, Some(mode), "redundant set_mode");
        if self.fail_mode_changes && self.mode.is_some() {
            return Err(CompositeError::UnknownMode {
                mode,
                weapon_class: self.weapon_class.clone(),
            });
        }
        self.mode = Some(mode);
        self.weapon_class = weapon_class.to_string();
        self.elapsed = 0.0;
        self.played = 0;
        self.mode_calls.push(mode);
        Ok(())
    }

    fn equip(&mut self, _equipment: &EquipmentSlots) -> Result<(), CompositeError> {
        self.equip_calls += 1;
        Ok(())
    }

    fn set_direction(&mut self, facing: Facing) {
        assert_ne!(self.facing, facing, "redundant set_direction");
        self.facing = facing;
        self.direction_calls.push(facing);
    }

    fn direction(&self) -> Facing {
        self.facing
    }

    fn advance(&mut self, dt_seconds: f32) -> Result<(), CompositeError> {
        if self.fail_advance {
            return Err(CompositeError::Playback("stalled".to_string()));
        }
        self.elapsed += dt_seconds;
        while self.elapsed >= LOOP_SECONDS {
            self.elapsed -= LOOP_SECONDS;
            self.played += 1;
        }
        Ok(())
    }

    fn render(&self, surface: &mut dyn Surface) -> Result<(), CompositeError> {
        surface.blit("monsters/fake", self.played);
        Ok(())
    }

    fn played_count(&self) -> u32 {
        self.played
    }

    fn mode(&self) -> &str {
        self.mode.map(AnimationMode::token).unwrap_or("")
    }

    fn weapon_class(&self) -> &str {
        &self.weapon_class
    }
}

#[derive(Default)]
struct FakeLoader {
    assembled: Vec<(ObjectKind, String, String)>,
    fail: bool,
    fail_advance: bool,
    fail_mode_changes: bool,
}

impl CompositeLoader for FakeLoader {
    type Composite = FakeComposite;

    fn assemble(
        &mut self,
        kind: ObjectKind,
        directory_token: &str,
        palette_token: &str,
    ) -> Result<FakeComposite, CompositeError> {
        self.assembled
            .push((kind, directory_token.to_string(), palette_token.to_string()));
        if self.fail {
            return Err(CompositeError::InvalidDirectory {
                token: directory_token.to_string(),
                reason: "missing".to_string(),
            });
        }
        let mut composite = FakeComposite::new();
        composite.fail_advance = self.fail_advance;
        composite.fail_mode_changes = self.fail_mode_changes;
        Ok(composite)
    }
}

fn stats(def_name: &str, interactable: bool) -> MonsterStats {
    MonsterStats {
        id: MonsterId(0),
        def_name: def_name.to_string(),
        name_string: def_name.to_string(),
        animation_token: "DC".to_string(),
        speed_base: 1.0,
        interactable,
        extra_data_key: def_name.to_string(),
    }
}

fn catalog_for(monsters: Vec<MonsterStats>) -> StatsCatalog {
    let appearances = monsters
        .iter()
        .map(|monster| MonsterAppearance {
            def_name: monster.extra_data_key.clone(),
            base_weapon_class: "HTH".to_string(),
            equipment_options: BTreeMap::from([
                (CompositeSlot::Head, vec!["hod".to_string()]),
                (CompositeSlot::Torso, vec!["lit".to_string(), "med".to_string()]),
            ]),
        })
        .collect();
    StatsCatalog::from_parts(
        monsters,
        appearances,
        vec![("Cain".to_string(), "Deckard Cain".to_string())],
        Vec::new(),
    )
}

fn spawn_at<R: Rng + ?Sized>(position: Vec2, rng: &mut R) -> Npc<FakeComposite> {
    let record = stats("Cain", true);
    let catalog = catalog_for(vec![record.clone()]);
    let mut loader = FakeLoader::default();
    Npc::new(
        &mut loader,
        &catalog,
        &record,
        position,
        Facing::default(),
        RepeatRange::default(),
        rng,
    )
    .expect("npc")
}

fn waypoint(x: f32, y: f32, action: NpcAction) -> Waypoint {
    Waypoint::new(Vec2::new(x, y), action)
}

fn run_until<R: Rng + ?Sized>(
    npc: &mut Npc<FakeComposite>,
    rng: &mut R,
    max_frames: usize,
    mut done: impl FnMut(&Npc<FakeComposite>) -> bool,
) -> usize {
    for frame in 1..=max_frames {
        npc.advance(DT, rng);
        if done(npc) {
            return frame;
        }
    }
    panic!("condition not reached within {max_frames} frames");
}

#[test]
fn construction_assembles_dresses_and_idles() {
    let record = stats("Cain", true);
    let catalog = catalog_for(vec![record.clone()]);
    let mut loader = FakeLoader::default();
    let npc = Npc::new(
        &mut loader,
        &catalog,
        &record,
        Vec2::new(3.0, 4.0),
        Facing::new(9),
        RepeatRange::default(),
        &mut StepRng::new(0, 0),
    )
    .expect("npc");

    assert_eq!(
        loader.assembled,
        vec![(
            ObjectKind::Character,
            "DC".to_string(),
            PALETTE_UNITS.to_string()
        )]
    );
    assert_eq!(npc.composite().mode_calls, vec![AnimationMode::Neutral]);
    assert_eq!(npc.composite().weapon_class(), "HTH");
    assert_eq!(npc.composite().equip_calls, 1);
    assert_eq!(npc.facing(), Facing::new(9));
    assert_eq!(npc.position(), Vec2::new(3.0, 4.0));
    assert_eq!(npc.equipment().get(CompositeSlot::Head), Some("hod"));
    assert_eq!(npc.equipment().get(CompositeSlot::Torso), Some("lit"));
    assert_eq!(npc.equipment().get(CompositeSlot::Shield), None);
    assert!(!npc.is_at_rest());
    assert!(!npc.has_paths());
}

#[test]
fn initial_facing_matching_composite_is_not_pushed() {
    let npc = spawn_at(Vec2::ZERO, &mut StepRng::new(0, 0));
    assert!(npc.composite().direction_calls.is_empty());
}

#[test]
fn missing_appearance_aborts_construction() {
    let mut record = stats("Akara", false);
    let catalog = catalog_for(vec![record.clone()]);
    record.extra_data_key = "Nowhere".to_string();
    let mut loader = FakeLoader::default();
    let err = Npc::new(
        &mut loader,
        &catalog,
        &record,
        Vec2::ZERO,
        Facing::default(),
        RepeatRange::default(),
        &mut StepRng::new(0, 0),
    )
    .expect_err("missing appearance");
    assert!(matches!(err, NpcError::MissingAppearance { ref key, .. } if key == "Nowhere"));
    assert!(loader.assembled.is_empty());
}

#[test]
fn assemble_failure_keeps_its_source() {
    let record = stats("Warriv", false);
    let catalog = catalog_for(vec![record.clone()]);
    let mut loader = FakeLoader {
        fail: true,
        ..FakeLoader::default()
    };
    let err = Npc::new(
        &mut loader,
        &catalog,
        &record,
        Vec2::ZERO,
        Facing::default(),
        RepeatRange::default(),
        &mut StepRng::new(0, 0),
    )
    .expect_err("assemble fails");
    assert!(matches!(err, NpcError::Assemble { .. }));
    let source = std::error::Error::source(&err).expect("source");
    assert!(source.to_string().contains("DC"));
}

#[test]
fn interactable_npc_is_selectable_under_translated_name() {
    let npc = spawn_at(Vec2::ZERO, &mut StepRng::new(0, 0));
    assert_eq!(npc.name(), Some("Deckard Cain"));
    assert!(npc.selectable());
}

#[test]
fn untranslated_name_falls_back_to_key() {
    let record = stats("Gheed", true);
    let catalog = catalog_for(vec![record.clone()]);
    let npc = Npc::new(
        &mut FakeLoader::default(),
        &catalog,
        &record,
        Vec2::ZERO,
        Facing::default(),
        RepeatRange::default(),
        &mut StepRng::new(0, 0),
    )
    .expect("npc");
    assert_eq!(npc.name(), Some("Gheed"));
    assert!(npc.selectable());
}

#[test]
fn non_interactable_npc_is_not_selectable() {
    let record = stats("Rat", false);
    let catalog = catalog_for(vec![record.clone()]);
    let npc = Npc::new(
        &mut FakeLoader::default(),
        &catalog,
        &record,
        Vec2::ZERO,
        Facing::default(),
        RepeatRange::default(),
        &mut StepRng::new(0, 0),
    )
    .expect("npc");
    assert_eq!(npc.name(), None);
    assert!(!npc.selectable());
}

#[test]
fn empty_name_is_not_selectable() {
    let mut record = stats("Blank", true);
    record.name_string = String::new();
    let catalog = catalog_for(vec![record.clone()]);
    let npc = Npc::new(
        &mut FakeLoader::default(),
        &catalog,
        &record,
        Vec2::ZERO,
        Facing::default(),
        RepeatRange::default(),
        &mut StepRng::new(0, 0),
    )
    .expect("npc");
    assert!(!npc.selectable());
}

#[test]
fn npc_without_paths_never_moves() {
    let mut rng = StepRng::new(0, 0);
    let mut npc = spawn_at(Vec2::new(2.0, 2.0), &mut rng);
    for _ in 0..200 {
        npc.advance(DT, &mut rng);
    }
    assert_eq!(npc.position(), Vec2::new(2.0, 2.0));
    assert_eq!(npc.composite().mode_calls, vec![AnimationMode::Neutral]);
}

#[test]
fn empty_paths_never_retire() {
    let mut rng = StepRng::new(0, 0);
    let mut npc = spawn_at(Vec2::ZERO, &mut rng);
    npc.set_paths(Vec::new());
    assert!(!npc.has_paths());
    assert!(npc.is_at_rest());
    for _ in 0..200 {
        npc.advance(DT, &mut rng);
    }
    assert!(npc.is_at_rest());
    assert_eq!(npc.path_index(), 0);
    assert_eq!(npc.position(), Vec2::ZERO);
    assert_eq!(npc.composite().mode_calls, vec![AnimationMode::Neutral]);
}

#[test]
fn walks_to_skill_waypoint_plays_it_once_then_heads_home() {
    let mut rng = StepRng::new(0, 0);
    let mut npc = spawn_at(Vec2::ZERO, &mut rng);
    npc.set_paths(vec![
        waypoint(10.0, 0.0, NpcAction::Skill1),
        waypoint(0.0, 0.0, NpcAction::Invalid),
    ]);

    run_until(&mut npc, &mut rng, 1_000, |npc| {
        assert!(npc.path_index() < 2);
        assert!(npc.position().y.abs() < 0.0001);
        npc.is_at_rest() && npc.pending_action() == NpcAction::Skill1
    });
    assert_eq!(npc.position(), Vec2::new(10.0, 0.0));
    assert_eq!(npc.repeat_target(), 0);
    assert_eq!(npc.composite().mode(), "S1");
    assert_eq!(npc.velocity(), Vec2::ZERO);

    let frames = run_until(&mut npc, &mut rng, 100, |npc| !npc.is_at_rest());
    assert_eq!(frames, 3);
    assert_eq!(npc.path_index(), 1);
    assert_eq!(npc.pending_action(), NpcAction::Invalid);
    assert_eq!(npc.composite().mode(), "WL");
    assert!(npc.velocity().x < 0.0);
}

#[test]
fn non_skill_waypoint_idles_one_loop_then_moves_on() {
    for action in [
        NpcAction::Invalid,
        NpcAction::Action1,
        NpcAction::Action2,
        NpcAction::Action3,
    ] {
        let mut rng = StepRng::new(0, 0);
        let mut npc = spawn_at(Vec2::ZERO, &mut rng);
        npc.set_paths(vec![
            waypoint(0.0, 0.0, NpcAction::Invalid),
            waypoint(2.0, 0.0, action),
        ]);

        run_until(&mut npc, &mut rng, 200, |npc| {
            npc.is_at_rest() && npc.position() == Vec2::new(2.0, 0.0)
        });
        assert_eq!(npc.pending_action(), action);
        assert_eq!(npc.repeat_target(), 0, "action={action}");
        assert_eq!(npc.composite().mode(), "NU");

        let frames = run_until(&mut npc, &mut rng, 100, |npc| !npc.is_at_rest());
        assert_eq!(frames, 3, "action={action}");
        assert_eq!(npc.path_index(), 0);
        assert_eq!(npc.composite().mode(), "WL");
    }
}

#[test]
fn every_arrival_dwells_for_a_single_loop() {
    for seed in 0..8 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut npc = spawn_at(Vec2::ZERO, &mut rng);
        npc.set_paths(vec![
            waypoint(3.0, 0.0, NpcAction::Action1),
            waypoint(3.0, 3.0, NpcAction::Skill1),
            waypoint(3.0, 3.0, NpcAction::Action2),
            waypoint(0.0, 2.0, NpcAction::Invalid),
            waypoint(0.0, 0.0, NpcAction::Action3),
        ]);

        let mut arrivals = 0;
        let mut was_at_rest = npc.is_at_rest();
        for _ in 0..3_000 {
            npc.advance(DT, &mut rng);
            assert!(npc.path_index() < 5);
            assert_eq!(npc.repeat_target(), 0, "seed={seed}");
            if npc.is_at_rest() && !was_at_rest {
                arrivals += 1;
                let expected = if npc.pending_action() == NpcAction::Skill1 {
                    "S1"
                } else {
                    "NU"
                };
                assert_eq!(npc.composite().mode(), expected, "seed={seed}");
            }
            was_at_rest = npc.is_at_rest();
        }
        assert!(arrivals >= 10, "seed={seed} arrivals={arrivals}");
    }
}

#[test]
fn rejected_mode_changes_do_not_stall_the_route() {
    let mut rng = StepRng::new(0, 0);
    let record = stats("Cain", true);
    let catalog = catalog_for(vec![record.clone()]);
    let mut loader = FakeLoader {
        fail_mode_changes: true,
        ..FakeLoader::default()
    };
    let mut npc = Npc::new(
        &mut loader,
        &catalog,
        &record,
        Vec2::ZERO,
        Facing::default(),
        RepeatRange::default(),
        &mut rng,
    )
    .expect("npc");
    npc.set_paths(vec![
        waypoint(2.0, 0.0, NpcAction::Skill1),
        waypoint(0.0, 0.0, NpcAction::Action1),
    ]);

    let mut visits = [0usize; 2];
    let mut last_index = npc.path_index();
    for _ in 0..400 {
        npc.advance(DT, &mut rng);
        if npc.path_index() != last_index {
            last_index = npc.path_index();
            visits[last_index] += 1;
        }
    }
    assert!(visits[0] >= 5, "visits={visits:?}");
    assert!(visits[1] >= 5, "visits={visits:?}");
    assert_eq!(npc.composite().mode_calls, vec![AnimationMode::Neutral]);
    assert_eq!(npc.composite().mode(), "NU");
}

#[test]
fn single_waypoint_route_keeps_returning_to_it() {
    let mut rng = StepRng::new(0, 0);
    let mut npc = spawn_at(Vec2::ZERO, &mut rng);
    npc.set_paths(vec![waypoint(2.0, 0.0, NpcAction::Invalid)]);

    run_until(&mut npc, &mut rng, 200, |npc| {
        npc.is_at_rest() && npc.position() == Vec2::new(2.0, 0.0)
    });
    for _ in 0..200 {
        npc.advance(DT, &mut rng);
        assert_eq!(npc.path_index(), 0);
        assert_eq!(npc.position(), Vec2::new(2.0, 0.0));
    }
}

#[test]
fn set_paths_mid_route_rewinds_and_rests() {
    let mut rng = StepRng::new(0, 0);
    let mut npc = spawn_at(Vec2::ZERO, &mut rng);
    npc.set_paths(vec![
        waypoint(0.0, 0.0, NpcAction::Invalid),
        waypoint(8.0, 8.0, NpcAction::Invalid),
    ]);
    run_until(&mut npc, &mut rng, 200, |npc| !npc.is_at_rest());
    assert_eq!(npc.path_index(), 1);

    npc.set_paths(vec![waypoint(1.0, 1.0, NpcAction::Action1)]);
    assert!(npc.is_at_rest());
    assert!(npc.has_paths());
    assert_eq!(npc.path_index(), 0);
    assert_eq!(npc.path_len(), 1);
}

#[test]
fn composite_advance_failure_skips_retirement() {
    let mut rng = StepRng::new(0, 0);
    let record = stats("Cain", true);
    let catalog = catalog_for(vec![record.clone()]);
    let mut loader = FakeLoader {
        fail_advance: true,
        ..FakeLoader::default()
    };
    let mut npc = Npc::new(
        &mut loader,
        &catalog,
        &record,
        Vec2::ZERO,
        Facing::default(),
        RepeatRange::default(),
        &mut rng,
    )
    .expect("npc");
    npc.set_paths(vec![waypoint(5.0, 0.0, NpcAction::Invalid)]);
    for _ in 0..100 {
        npc.advance(DT, &mut rng);
    }
    assert!(npc.is_at_rest());
    assert_eq!(npc.position(), Vec2::ZERO);
}

#[test]
fn render_wraps_composite_in_isometric_translation() {
    let npc = spawn_at(Vec2::new(7.0, 3.0), &mut StepRng::new(0, 0));
    let mut surface = RecordingSurface::new();
    npc.render(&mut surface);
    assert_eq!(surface.depth(), 0);
    assert_eq!(surface.blit_count(), 1);
    let (key, _, origin) = surface.last_blit().expect("blit");
    assert_eq!(key, "monsters/fake");
    assert_eq!(origin, isometric_translation(Vec2::new(7.0, 3.0)));
}

#[test]
fn snapshot_serializes_route_state() {
    let mut rng = StepRng::new(0, 0);
    let mut npc = spawn_at(Vec2::ZERO, &mut rng);
    npc.set_paths(vec![waypoint(1.0, 0.0, NpcAction::Skill1)]);
    let value = serde_json::to_value(npc.snapshot()).expect("json");
    assert_eq!(value["monster"], "Cain");
    assert_eq!(value["name"], "Deckard Cain");
    assert_eq!(value["mode"], "NU");
    assert_eq!(value["has_paths"], true);
    assert_eq!(value["path_len"], 1);
    assert_eq!(value["pending_action"], "Invalid");
}
