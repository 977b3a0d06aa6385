//! Integration tests for the skill subsystem
//!
//! These tests verify that:
//! - Held skills auto-activate when the opponent enters range
//! - Dash Slash locks motion for its lifecycle and frees the slot at expiry
//! - Shield publishes its stance for the full duration
//! - Phantom Cross teleports behind the opponent
//! - Final Flash Draw roots its owner and lands its guaranteed strike
//! - Orb spawning respects the uncollected-orb cap

use bevy::prelude::*;

use duelsim::headless::build_core_round_app;
use duelsim::states::play_round::{
    AttackState, CombatTuning, DefenseState, DefensiveStance, Fighter, FighterSide, Motion,
    PlayRoundEntity, RoundClock, RoundPolicies, SkillDefinitions, SkillKind, SkillOrb, SkillState,
    SlotOccupied,
};
use duelsim::{RoundLog, RoundLogEventType};

fn test_app(seed: u64) -> App {
    let mut app = build_core_round_app(
        CombatTuning::default(),
        SkillDefinitions::default(),
        RoundPolicies::default(),
        seed,
    );
    *app.world_mut().resource_mut::<RoundClock>() = RoundClock::new(0);
    app
}

fn spawn_fighter(app: &mut App, side: FighterSide, pos: Vec2, velocity: Vec2) -> Entity {
    app.world_mut()
        .spawn((
            Fighter::new(side, 200),
            Motion::new(velocity),
            AttackState::default(),
            DefenseState::default(),
            SkillState::default(),
            Transform::from_translation(pos.extend(0.0)),
            PlayRoundEntity,
        ))
        .id()
}

fn grant(app: &mut App, entity: Entity, kind: SkillKind) {
    app.world_mut()
        .get_mut::<SkillState>(entity)
        .unwrap()
        .grant(kind)
        .unwrap();
}

fn lock_attacks(app: &mut App, entity: Entity) {
    app.world_mut()
        .get_mut::<AttackState>(entity)
        .unwrap()
        .cooldown_ticks = u32::MAX;
}

#[test]
fn test_dash_slash_locks_motion_and_expires() {
    let mut app = test_app(5);
    let red = spawn_fighter(&mut app, FighterSide::Red, Vec2::new(-75.0, 0.0), Vec2::new(0.0, 6.0));
    spawn_fighter(&mut app, FighterSide::Blue, Vec2::new(75.0, 0.0), Vec2::new(0.0, 6.0));
    grant(&mut app, red, SkillKind::DashSlash);

    // 150 apart: inside Dash Slash's 160 activation range.
    app.update();
    {
        let skills = app.world().get::<SkillState>(red).unwrap();
        let active = skills.active.as_ref().expect("dash should activate");
        assert_eq!(active.kind, SkillKind::DashSlash);
        assert!(app.world().get::<Motion>(red).unwrap().locked);
    }

    // While the dash is running the slot refuses another pickup.
    assert_eq!(
        app.world_mut()
            .get_mut::<SkillState>(red)
            .unwrap()
            .grant(SkillKind::Shield),
        Err(SlotOccupied)
    );

    for _ in 0..25 {
        app.update();
    }
    assert!(app.world().get::<SkillState>(red).unwrap().is_empty());
    assert!(!app.world().get::<Motion>(red).unwrap().locked);

    let log = app.world().resource::<RoundLog>();
    assert!(!log.filter_by_type(RoundLogEventType::Skill).is_empty());
}

#[test]
fn test_shield_holds_stance_for_its_duration() {
    let mut app = test_app(5);
    let red = spawn_fighter(&mut app, FighterSide::Red, Vec2::new(-60.0, 0.0), Vec2::new(0.0, 6.0));
    let blue = spawn_fighter(&mut app, FighterSide::Blue, Vec2::new(60.0, 0.0), Vec2::new(0.0, 6.0));
    lock_attacks(&mut app, red);
    lock_attacks(&mut app, blue);
    grant(&mut app, blue, SkillKind::Shield);

    app.update();
    assert_eq!(
        app.world().get::<DefenseState>(blue).unwrap().stance,
        DefensiveStance::Shielding
    );

    // Still up well into the 90-tick duration.
    for _ in 0..50 {
        app.update();
    }
    assert_eq!(
        app.world().get::<DefenseState>(blue).unwrap().stance,
        DefensiveStance::Shielding
    );

    // Expired: stance drops and the slot frees up.
    for _ in 0..50 {
        app.update();
    }
    assert_eq!(
        app.world().get::<DefenseState>(blue).unwrap().stance,
        DefensiveStance::None
    );
    assert!(app.world().get::<SkillState>(blue).unwrap().is_empty());
}

#[test]
fn test_phantom_cross_teleports_behind() {
    let mut app = test_app(5);
    let red = spawn_fighter(&mut app, FighterSide::Red, Vec2::new(-70.0, 0.0), Vec2::new(0.0, 6.0));
    let blue = spawn_fighter(&mut app, FighterSide::Blue, Vec2::new(70.0, 0.0), Vec2::new(0.0, 6.0));
    lock_attacks(&mut app, blue);
    grant(&mut app, red, SkillKind::PhantomCross);

    app.update();

    // Red crossed to the far side of blue.
    let red_x = app.world().get::<Transform>(red).unwrap().translation.x;
    let blue_x = app.world().get::<Transform>(blue).unwrap().translation.x;
    assert!(
        red_x > blue_x,
        "expected red ({red_x}) behind blue ({blue_x})"
    );
}

#[test]
fn test_final_flash_draw_roots_and_strikes() {
    let mut app = test_app(5);
    let red = spawn_fighter(&mut app, FighterSide::Red, Vec2::new(-80.0, 0.0), Vec2::new(0.0, 6.0));
    let blue = spawn_fighter(&mut app, FighterSide::Blue, Vec2::new(80.0, 0.0), Vec2::new(0.0, 6.0));
    lock_attacks(&mut app, blue);
    grant(&mut app, red, SkillKind::FinalFlashDraw);

    app.update();
    {
        let motion = app.world().get::<Motion>(red).unwrap();
        assert!(motion.locked, "the draw pose roots its owner");
        assert_eq!(motion.velocity, Vec2::ZERO);
    }

    // The strike lands at its scripted tick no matter where blue drifted.
    for _ in 0..34 {
        app.update();
    }
    assert_eq!(
        app.world().get::<Fighter>(blue).unwrap().health,
        175,
        "the flash deals 2.5x base damage"
    );

    // Lifecycle over: slot free, motion unlocked.
    for _ in 0..15 {
        app.update();
    }
    assert!(app.world().get::<SkillState>(red).unwrap().is_empty());
    assert!(!app.world().get::<Motion>(red).unwrap().locked);
}

#[test]
fn test_orb_spawns_respect_the_cap() {
    // No fighters: every spawned orb stays on the floor.
    let mut app = test_app(5);

    for _ in 0..1300 {
        app.update();
    }

    let mut orbs = app.world_mut().query::<&SkillOrb>();
    let count = orbs.iter(app.world()).count();
    assert_eq!(count, 3, "uncollected orbs cap at three");
}
