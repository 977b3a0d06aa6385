//! Integration tests for arena escalation and the motion model
//!
//! These tests verify that:
//! - Sustained inactivity walks the controller through its states
//! - A landed hit resets the controller and pauses shrinking
//! - A clash resets the controller without pausing shrink
//! - Rapid shrink closes the walls but never past the floor
//! - The motion model keeps fighters inside the walls at legal speeds

use bevy::prelude::*;

use duelsim::combat::events::{ClashEvent, ClashKind, HitLandedEvent, StrikeSource};
use duelsim::headless::build_core_round_app;
use duelsim::states::play_round::{
    Arena, AttackState, CombatTuning, DefenseState, EscalationController, EscalationState, Fighter,
    FighterSide, Motion, PlayRoundEntity, RoundClock, RoundPolicies, SkillDefinitions, SkillState,
};
use duelsim::{RoundLog, RoundLogEventType};

fn test_app_with(tuning: CombatTuning) -> App {
    let mut app = build_core_round_app(
        tuning,
        SkillDefinitions::default(),
        RoundPolicies::default(),
        11,
    );
    *app.world_mut().resource_mut::<RoundClock>() = RoundClock::new(0);
    app
}

fn test_app() -> App {
    test_app_with(CombatTuning::default())
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

fn lock_attacks(app: &mut App, entity: Entity) {
    app.world_mut()
        .get_mut::<AttackState>(entity)
        .unwrap()
        .cooldown_ticks = u32::MAX;
}

/// Two fighters drifting vertically, 300 apart: nothing ever lands.
fn spawn_passive_pair(app: &mut App) -> (Entity, Entity) {
    let red = spawn_fighter(app, FighterSide::Red, Vec2::new(-150.0, 0.0), Vec2::new(0.0, 6.0));
    let blue = spawn_fighter(app, FighterSide::Blue, Vec2::new(150.0, 0.0), Vec2::new(0.0, 6.0));
    lock_attacks(app, red);
    lock_attacks(app, blue);
    (red, blue)
}

#[test]
fn test_inactivity_reaches_pulse() {
    let mut app = test_app();

    for _ in 0..310 {
        app.update();
    }

    assert_eq!(
        app.world().resource::<EscalationController>().state,
        EscalationState::Pulsing
    );
    let log = app.world().resource::<RoundLog>();
    assert!(!log.filter_by_type(RoundLogEventType::Escalation).is_empty());
}

#[test]
fn test_hit_resets_controller_and_pauses_shrink() {
    let mut app = test_app();
    let (red, blue) = spawn_passive_pair(&mut app);

    for _ in 0..100 {
        app.update();
    }
    assert_eq!(
        app.world().resource::<EscalationController>().inactivity_ticks,
        100
    );

    app.world_mut()
        .resource_mut::<Events<HitLandedEvent>>()
        .send(HitLandedEvent {
            attacker: red,
            defender: blue,
            attacker_side: FighterSide::Red,
            defender_side: FighterSide::Blue,
            damage: 10,
            source: StrikeSource::BasicAttack { stage: 1 },
            position: Vec2::ZERO,
        });
    app.update();

    let controller = app.world().resource::<EscalationController>();
    assert_eq!(controller.state, EscalationState::Stable);
    assert_eq!(controller.inactivity_ticks, 0);
    assert!(controller.shrink_pause_ticks > 0, "a hit buys quiet time");
}

#[test]
fn test_clash_resets_controller_without_pausing_shrink() {
    let mut app = test_app();
    let (red, blue) = spawn_passive_pair(&mut app);

    for _ in 0..100 {
        app.update();
    }

    app.world_mut()
        .resource_mut::<Events<ClashEvent>>()
        .send(ClashEvent {
            a: red,
            b: blue,
            kind: ClashKind::SwordOnSword,
            position: Vec2::ZERO,
        });
    app.update();

    let controller = app.world().resource::<EscalationController>();
    assert_eq!(controller.inactivity_ticks, 0);
    assert_eq!(controller.shrink_pause_ticks, 0);
}

#[test]
fn test_rapid_shrink_closes_the_walls() {
    let mut app = test_app();

    // Stable 300 -> Pulsing 360 -> Warning 540 -> RapidShrink onward.
    for _ in 0..700 {
        app.update();
    }

    assert_eq!(
        app.world().resource::<EscalationController>().state,
        EscalationState::RapidShrink
    );
    let arena = app.world().resource::<Arena>();
    let half = arena.half_extents().x;
    assert!(half < 300.0, "walls should have moved in, got {half}");
    assert!(half >= 150.0, "walls must not pass the floor, got {half}");
}

#[test]
fn test_shrink_never_passes_the_floor() {
    let tuning = CombatTuning {
        rapid_shrink_speed: 50.0,
        ..Default::default()
    };
    let mut app = test_app_with(tuning);

    for _ in 0..700 {
        app.update();
    }

    let arena = app.world().resource::<Arena>();
    assert!(arena.at_floor());
    assert!((arena.half_extents().x - 150.0).abs() < 1e-3);
    assert!((arena.half_extents().y - 150.0).abs() < 1e-3);
}

#[test]
fn test_motion_stays_inside_walls_at_legal_speed() {
    // No orbs and no swings: pure bounce motion for the whole run.
    let tuning = CombatTuning {
        orb_spawn_min_ticks: 1_000_000,
        orb_spawn_max_ticks: 1_000_001,
        ..Default::default()
    };
    let mut app = test_app_with(tuning);
    let red = spawn_fighter(&mut app, FighterSide::Red, Vec2::new(-250.0, 100.0), Vec2::new(40.0, -25.0));
    let blue = spawn_fighter(&mut app, FighterSide::Blue, Vec2::new(250.0, -100.0), Vec2::new(1.0, 0.5));
    lock_attacks(&mut app, red);
    lock_attacks(&mut app, blue);

    // Stop before the first inactivity pulse so velocities stay untouched
    // by escalation.
    for tick in 0..280 {
        app.update();
        for entity in [red, blue] {
            let speed = app.world().get::<Motion>(entity).unwrap().velocity.length();
            assert!(
                (6.0 - 1e-3..=16.0 + 1e-3).contains(&speed),
                "tick {tick}: speed {speed} outside [6, 16]"
            );
            let pos = app.world().get::<Transform>(entity).unwrap().translation;
            assert!(
                pos.x.abs() <= 275.0 + 1e-3 && pos.y.abs() <= 275.0 + 1e-3,
                "tick {tick}: fighter escaped the arena at {pos:?}"
            );
        }
    }
}
