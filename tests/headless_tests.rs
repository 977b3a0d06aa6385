//! Integration tests for headless round execution
//!
//! These tests verify that:
//! - Headless configs parse, validate and map to round policies
//! - A full round runs to completion and commits an outcome
//! - Seeded rounds are deterministic
//! - Timeout resolution and both tie-break policies behave as configured

use bevy::prelude::*;

use duelsim::combat::events::{HitLandedEvent, StrikeSource};
use duelsim::headless::runner::FighterResult;
use duelsim::headless::{build_core_round_app, RoundResult};
use duelsim::states::play_round::{
    AttackState, CombatTuning, DefenseState, EndReason, Fighter, FighterSide, Motion, OutcomeSlot,
    PlayRoundEntity, RoundClock, RoundPhase, RoundPolicies, RoundStats, SkillDefinitions,
    SkillState, TieBreakPolicy,
};
use duelsim::HeadlessRoundConfig;

/// Helper to build a one-update-per-tick app with default tuning.
fn test_app(seed: u64) -> App {
    build_core_round_app(
        CombatTuning::default(),
        SkillDefinitions::default(),
        RoundPolicies::default(),
        seed,
    )
}

/// Tuning for drift-only rounds: short time limit, no countdown, no orbs.
fn short_round_tuning(limit_ticks: u32) -> CombatTuning {
    CombatTuning {
        round_time_limit_ticks: limit_ticks,
        countdown_segment_ticks: 0,
        countdown_fight_ticks: 0,
        orb_spawn_min_ticks: 1_000_000,
        orb_spawn_max_ticks: 1_000_001,
        ..Default::default()
    }
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

#[test]
fn test_config_defaults_map_to_policies() {
    let config = HeadlessRoundConfig::default();
    assert!(config.validate().is_ok());

    let policies = config.to_round_policies().unwrap();
    assert_eq!(policies, RoundPolicies::default());
}

#[test]
fn test_config_rejects_unknown_policy() {
    let config = HeadlessRoundConfig {
        final_flash_shield: "Reflectable".to_string(),
        ..Default::default()
    };
    assert!(config.validate().is_err());
    assert!(config.to_round_policies().is_err());
}

#[test]
fn test_config_with_seed() {
    let config = HeadlessRoundConfig {
        random_seed: Some(42),
        ..Default::default()
    };
    assert_eq!(config.random_seed, Some(42));
}

#[test]
fn test_config_without_seed() {
    let config = HeadlessRoundConfig::default();
    assert!(config.random_seed.is_none());
}

#[test]
fn test_round_result_serializes() {
    let result = RoundResult {
        winner: Some(FighterSide::Red),
        reason: EndReason::Knockout,
        fight_ticks: 900,
        duration_secs: 15.0,
        fighters: vec![FighterResult {
            side: FighterSide::Blue,
            final_health: 0,
            max_health: 200,
            survived: false,
        }],
        stats: RoundStats::default(),
        random_seed: Some(7),
        log: vec![],
    };

    let json = serde_json::to_string(&result).unwrap();
    assert!(json.contains("\"winner\":\"Red\""));
    assert!(json.contains("\"reason\":\"Knockout\""));
}

#[test]
fn test_full_round_commits_an_outcome() {
    let mut app = test_app(7);
    spawn_fighter(&mut app, FighterSide::Red, Vec2::new(-150.0, 0.0), Vec2::new(5.0, 3.0));
    spawn_fighter(&mut app, FighterSide::Blue, Vec2::new(150.0, 0.0), Vec2::new(-4.0, 2.0));

    let mut committed = None;
    for _ in 0..3000 {
        app.update();
        if let Some(outcome) = app.world().resource::<OutcomeSlot>().0 {
            committed = Some(outcome);
            break;
        }
    }

    let outcome = committed.expect("round should resolve within the time limit");
    assert!(matches!(
        outcome.reason,
        EndReason::Knockout | EndReason::Timeout | EndReason::Draw
    ));
    assert!(outcome.fight_ticks <= CombatTuning::default().round_time_limit_ticks + 1);
    assert_eq!(
        app.world().resource::<RoundClock>().phase,
        RoundPhase::Ended
    );
    assert!(!app.world().resource::<duelsim::RoundLog>().is_empty());
}

#[test]
fn test_seeded_rounds_are_deterministic() {
    let run = || {
        let mut app = test_app(42);
        let red = spawn_fighter(
            &mut app,
            FighterSide::Red,
            Vec2::new(-150.0, 0.0),
            Vec2::new(6.0, 4.0),
        );
        let blue = spawn_fighter(
            &mut app,
            FighterSide::Blue,
            Vec2::new(150.0, 0.0),
            Vec2::new(-6.0, -4.0),
        );
        for _ in 0..600 {
            app.update();
        }
        let pos = |entity| {
            app.world()
                .get::<Transform>(entity)
                .unwrap()
                .translation
                .truncate()
        };
        let hp = |entity| app.world().get::<Fighter>(entity).unwrap().health;
        (pos(red), pos(blue), hp(red), hp(blue))
    };

    let (red_a, blue_a, red_hp_a, blue_hp_a) = run();
    let (red_b, blue_b, red_hp_b, blue_hp_b) = run();

    // Bitwise equality: the same seed must replay the exact same round.
    assert_eq!(red_a.x.to_bits(), red_b.x.to_bits());
    assert_eq!(red_a.y.to_bits(), red_b.y.to_bits());
    assert_eq!(blue_a.x.to_bits(), blue_b.x.to_bits());
    assert_eq!(blue_a.y.to_bits(), blue_b.y.to_bits());
    assert_eq!(red_hp_a, red_hp_b);
    assert_eq!(blue_hp_a, blue_hp_b);
}

#[test]
fn test_timeout_goes_to_the_closer_fighter() {
    let mut app = build_core_round_app(
        short_round_tuning(40),
        SkillDefinitions::default(),
        RoundPolicies::default(),
        1,
    );
    // Vertical drift keeps the horizontal gap fixed; red stays closer to
    // center for the whole round.
    spawn_fighter(&mut app, FighterSide::Red, Vec2::new(-50.0, 0.0), Vec2::new(0.0, 6.0));
    spawn_fighter(&mut app, FighterSide::Blue, Vec2::new(150.0, 0.0), Vec2::new(0.0, 6.0));

    for _ in 0..45 {
        app.update();
    }

    let outcome = app
        .world()
        .resource::<OutcomeSlot>()
        .0
        .expect("timeout should commit an outcome");
    assert_eq!(outcome.winner, Some(FighterSide::Red));
    assert_eq!(outcome.reason, EndReason::Timeout);
}

#[test]
fn test_equidistant_timeout_draws_by_default() {
    let mut app = build_core_round_app(
        short_round_tuning(40),
        SkillDefinitions::default(),
        RoundPolicies::default(),
        1,
    );
    spawn_fighter(&mut app, FighterSide::Red, Vec2::new(-100.0, 0.0), Vec2::new(0.0, 6.0));
    spawn_fighter(&mut app, FighterSide::Blue, Vec2::new(100.0, 0.0), Vec2::new(0.0, 6.0));

    for _ in 0..45 {
        app.update();
    }

    let outcome = app.world().resource::<OutcomeSlot>().0.unwrap();
    assert_eq!(outcome.winner, None);
    assert_eq!(outcome.reason, EndReason::Draw);
}

#[test]
fn test_equidistant_timeout_can_go_to_sudden_death() {
    let policies = RoundPolicies {
        tie_break: TieBreakPolicy::SuddenDeath,
        ..Default::default()
    };
    let mut app = build_core_round_app(
        short_round_tuning(40),
        SkillDefinitions::default(),
        policies,
        1,
    );
    let red = spawn_fighter(&mut app, FighterSide::Red, Vec2::new(-100.0, 0.0), Vec2::new(0.0, 6.0));
    let blue = spawn_fighter(&mut app, FighterSide::Blue, Vec2::new(100.0, 0.0), Vec2::new(0.0, 6.0));

    for _ in 0..45 {
        app.update();
    }

    // No outcome yet: the round rolled into sudden death instead.
    assert!(app.world().resource::<OutcomeSlot>().0.is_none());
    assert_eq!(
        app.world().resource::<RoundClock>().phase,
        RoundPhase::SuddenDeath
    );

    // The next landed hit takes the round.
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

    let outcome = app.world().resource::<OutcomeSlot>().0.unwrap();
    assert_eq!(outcome.winner, Some(FighterSide::Red));
    assert_eq!(outcome.reason, EndReason::SuddenDeath);
}
