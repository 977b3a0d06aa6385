//! Play Round Scene - Bouncing Sword Duel
//!
//! The active round: two fighters carom around a shrinking square arena
//! and fence whenever their paths cross.
//!
//! ## Core simulation
//! - **Motion**: fighters drift on fixed velocities and reflect off the
//!   walls, picking up a small center-ward boost on every bounce
//! - **Combo attacks**: proximity-triggered three-stage chains, each stage
//!   narrower, harder-hitting and (at stage three) longer-reaching
//! - **Skills**: seven pickups, one slot per fighter, each a small scripted
//!   lifecycle from telegraph to resolution
//! - **Defense**: every strike runs the shield / parry / clash ladder
//!   before it is allowed to land
//! - **Escalation**: passive play pulses fighters inward and eventually
//!   shrinks the arena; a periodic shrink grinds on regardless
//!
//! ## Flow
//! 1. `setup_play_round`: camera, fighters, fresh per-round resources
//! 2. One core schedule pass per open-gate frame advances one logical tick
//!    (see `systems` for the phase breakdown)
//! 3. Presentation (gizmos, HUD, pacing, input) runs every frame
//! 4. `cleanup_play_round`: despawn all round entities on exit

pub mod combo;
pub mod components;
pub mod constants;
pub mod defense;
pub mod escalation;
pub mod hud;
pub mod match_flow;
pub mod motion;
pub mod orbs;
pub mod pacing;
pub mod rendering;
pub mod skills;
pub mod systems;
pub mod tuning;
pub mod utils;

pub use components::*;
pub use systems::{add_core_round_systems, configure_combat_system_ordering, insert_round_resources};
pub use tuning::{CombatTuning, SkillDefinitions, SkillKind, TuningPlugin};

use bevy::prelude::*;

use crate::combat::events::RoundResetEvent;
use crate::combat::log::{RoundLog, RoundLogEventType};

use super::GameState;

/// Graphical round plugin. Core systems are gated on the play state and the
/// tick gate; presentation runs every frame while in the state.
pub struct PlayRoundPlugin;

impl Plugin for PlayRoundPlugin {
    fn build(&self, app: &mut App) {
        configure_combat_system_ordering(app);
        add_core_round_systems(
            app,
            in_state(GameState::PlayRound).and(components::tick_gate_open),
        );

        app.init_resource::<PacingState>()
            .add_systems(OnEnter(GameState::PlayRound), setup_play_round)
            .add_systems(OnExit(GameState::PlayRound), cleanup_play_round)
            .add_systems(
                Update,
                (play_round_input, pacing::update_pacing)
                    .chain()
                    .before(systems::CombatSystemPhase::Motion)
                    .run_if(in_state(GameState::PlayRound)),
            )
            .add_systems(
                Update,
                (
                    rendering::spawn_effects,
                    rendering::update_effects,
                    rendering::apply_screen_shake,
                    rendering::draw_arena,
                    rendering::draw_fighters,
                    rendering::draw_orbs,
                    rendering::draw_effects,
                    hud::round_hud,
                )
                    .after(systems::CombatSystemPhase::Escalation)
                    .run_if(in_state(GameState::PlayRound)),
            );
    }
}

/// Spawn the camera and both fighters, and put every per-round resource
/// back to its starting value.
pub fn setup_play_round(
    mut commands: Commands,
    tuning: Res<CombatTuning>,
    mut rng: ResMut<GameRng>,
    mut arena: ResMut<Arena>,
    mut controller: ResMut<EscalationController>,
    mut clock: ResMut<RoundClock>,
    mut outcome_slot: ResMut<OutcomeSlot>,
    mut stats: ResMut<RoundStats>,
    mut spawner: ResMut<OrbSpawner>,
    mut pacing: ResMut<PacingState>,
    mut log: ResMut<RoundLog>,
) {
    info!("Entering PlayRound state");

    rendering::spawn_round_camera(&mut commands);
    match_flow::spawn_fighters(&mut commands, &tuning, &mut rng);

    *arena = Arena::new(tuning.arena_half_extent, tuning.arena_floor_half_extent);
    *controller = EscalationController::default();
    *clock = RoundClock::new(match_flow::countdown_total_ticks(&tuning));
    outcome_slot.0 = None;
    *stats = RoundStats::default();
    spawner.next_in = rng.random_ticks(tuning.orb_spawn_min_ticks, tuning.orb_spawn_max_ticks);
    *pacing = PacingState::default();
    log.clear();
    log.log(0, RoundLogEventType::RoundFlow, "round starting");
}

pub fn cleanup_play_round(
    mut commands: Commands,
    mut gate: ResMut<TickGate>,
    query: Query<Entity, With<PlayRoundEntity>>,
) {
    for entity in query.iter() {
        commands.entity(entity).despawn_recursive();
    }
    gate.open = true;
}

/// R restarts the round, Space toggles pause, Esc returns to the title.
pub fn play_round_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut pacing: ResMut<PacingState>,
    mut resets: EventWriter<RoundResetEvent>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if keyboard.just_pressed(KeyCode::KeyR) {
        resets.send(RoundResetEvent);
    }
    if keyboard.just_pressed(KeyCode::Space) {
        pacing.paused = !pacing.paused;
    }
    if keyboard.just_pressed(KeyCode::Escape) {
        next_state.set(GameState::Title);
    }
}
