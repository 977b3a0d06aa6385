//! Integration tests for the combo attack subsystem
//!
//! These tests verify that:
//! - Idle fighters in trigger range start a swing
//! - A connecting swing deals stage damage and keeps the chain alive
//! - Two simultaneous swings clash instead of trading damage
//! - Whiffed swings and the combo timeout break the chain

use bevy::prelude::*;

use duelsim::headless::build_core_round_app;
use duelsim::states::play_round::{
    AttackPhase, AttackState, CombatTuning, DefenseState, Fighter, FighterSide, Motion,
    PlayRoundEntity, RoundClock, RoundPolicies, SkillDefinitions, SkillState,
};
use duelsim::{RoundLog, RoundLogEventType};

fn test_app(seed: u64) -> App {
    let mut app = build_core_round_app(
        CombatTuning::default(),
        SkillDefinitions::default(),
        RoundPolicies::default(),
        seed,
    );
    // Skip the countdown so combat is live from the first update.
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

/// Keep a fighter from ever swinging by parking its cooldown.
fn lock_attacks(app: &mut App, entity: Entity) {
    app.world_mut()
        .get_mut::<AttackState>(entity)
        .unwrap()
        .cooldown_ticks = u32::MAX;
}

#[test]
fn test_approaching_fighters_start_a_swing() {
    let mut app = test_app(3);
    let red = spawn_fighter(&mut app, FighterSide::Red, Vec2::new(-70.0, 0.0), Vec2::new(6.0, 0.0));
    spawn_fighter(&mut app, FighterSide::Blue, Vec2::new(70.0, 0.0), Vec2::new(-6.0, 0.0));

    // Closing at 12 px/tick from 140 apart, they enter trigger range on the
    // third tick.
    for _ in 0..3 {
        app.update();
    }

    let attack = app.world().get::<AttackState>(red).unwrap();
    assert_eq!(attack.phase, AttackPhase::Windup);
    assert_eq!(attack.stage, 1);
}

#[test]
fn test_landed_swing_deals_stage_damage() {
    let mut app = test_app(3);
    let red = spawn_fighter(&mut app, FighterSide::Red, Vec2::new(-70.0, 0.0), Vec2::new(6.0, 0.0));
    let blue = spawn_fighter(&mut app, FighterSide::Blue, Vec2::new(70.0, 0.0), Vec2::new(-6.0, 0.0));
    lock_attacks(&mut app, blue);

    for _ in 0..14 {
        app.update();
    }

    let blue_fighter = app.world().get::<Fighter>(blue).unwrap();
    assert_eq!(blue_fighter.health, 190, "stage-1 swing deals base damage");

    // The hit keeps red's chain alive and fully resets the defender's.
    assert_eq!(app.world().get::<AttackState>(red).unwrap().stage, 1);
    assert_eq!(app.world().get::<AttackState>(blue).unwrap().stage, 0);

    let log = app.world().resource::<RoundLog>();
    assert_eq!(log.filter_by_type(RoundLogEventType::Hit).len(), 1);

    let stats = app.world().resource::<duelsim::states::play_round::RoundStats>();
    assert_eq!(stats.red.damage_dealt, 10);
    assert_eq!(stats.red.hits_landed, 1);
}

#[test]
fn test_simultaneous_swings_clash() {
    let mut app = test_app(3);
    let red = spawn_fighter(&mut app, FighterSide::Red, Vec2::new(-70.0, 0.0), Vec2::new(6.0, 0.0));
    let blue = spawn_fighter(&mut app, FighterSide::Blue, Vec2::new(70.0, 0.0), Vec2::new(-6.0, 0.0));

    for _ in 0..14 {
        app.update();
    }

    // The mirrored swings meet blade-on-blade: no damage either way.
    assert_eq!(app.world().get::<Fighter>(red).unwrap().health, 200);
    assert_eq!(app.world().get::<Fighter>(blue).unwrap().health, 200);

    let log = app.world().resource::<RoundLog>();
    assert!(!log.filter_by_type(RoundLogEventType::Clash).is_empty());
    assert!(log.filter_by_type(RoundLogEventType::Hit).is_empty());

    // A clash preserves both combo chains.
    assert_eq!(app.world().get::<AttackState>(red).unwrap().stage, 1);
    assert_eq!(app.world().get::<AttackState>(blue).unwrap().stage, 1);
}

#[test]
fn test_whiffed_swing_breaks_the_chain() {
    let mut app = test_app(3);
    let red = spawn_fighter(&mut app, FighterSide::Red, Vec2::new(-50.0, 0.0), Vec2::new(0.0, 6.0));
    let blue = spawn_fighter(&mut app, FighterSide::Blue, Vec2::new(50.0, 0.0), Vec2::new(0.0, 6.0));
    lock_attacks(&mut app, blue);

    // Red starts a swing, then the target is yanked out of reach before the
    // active window.
    app.update();
    assert_eq!(
        app.world().get::<AttackState>(red).unwrap().phase,
        AttackPhase::Windup
    );
    app.world_mut()
        .get_mut::<Transform>(blue)
        .unwrap()
        .translation
        .x = 250.0;

    for _ in 0..25 {
        app.update();
    }

    assert_eq!(app.world().get::<AttackState>(red).unwrap().stage, 0);
    let log = app.world().resource::<RoundLog>();
    assert!(log.filter_by_type(RoundLogEventType::Hit).is_empty());
}

#[test]
fn test_combo_chain_times_out_between_swings() {
    let mut app = test_app(3);
    // A lone fighter: nothing to swing at, so the stale chain just decays.
    let red = spawn_fighter(&mut app, FighterSide::Red, Vec2::ZERO, Vec2::new(6.0, 0.0));
    {
        let mut attack = app.world_mut().get_mut::<AttackState>(red).unwrap();
        attack.stage = 2;
        attack.combo_ticks = 0;
    }

    for _ in 0..50 {
        app.update();
    }

    assert_eq!(app.world().get::<AttackState>(red).unwrap().stage, 0);
}
