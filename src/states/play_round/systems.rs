//! Core tick schedule
//!
//! One pass of these systems is one logical tick: Motion, then combo and
//! skill updates, then defense resolution, then escalation and round end.
//! The phases are chained sets, so command flushes land between them and no
//! system ever observes a half-resolved tick.
//!
//! Both the graphical and the headless app build their schedule through
//! [`add_core_round_systems`], differing only in the run condition they
//! pass (state + tick gate vs. round-not-ended).

use bevy::prelude::*;

use crate::combat::log::record_round_events;

use super::combo::{advance_attack_phases, tick_attack_timers, trigger_basic_attacks};
use super::components::{
    Arena, EscalationController, GameRng, OrbSpawner, OutcomeSlot, RoundClock, RoundPolicies,
    RoundStats, TickGate,
};
use super::defense::{resolve_defense, tick_defense_timers};
use super::escalation::update_escalation;
use super::match_flow::{
    advance_round_clock, apply_round_reset, check_round_end, countdown_total_ticks,
};
use super::motion::fighter_motion;
use super::orbs::{collect_orbs, spawn_orbs};
use super::skills::{trigger_skill_activation, update_active_skills};
use super::tuning::CombatTuning;

/// Ordered phases of the core tick.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum CombatSystemPhase {
    /// Clock, timers and the bounce motion model.
    Motion,
    /// Orbs, skill triggers/updates, swing state machines.
    Actions,
    /// The defensive triangle resolver.
    Resolution,
    /// Escalation controller, terminal conditions, logging.
    Escalation,
}

/// Chain the phases so every tick resolves in a fixed order.
pub fn configure_combat_system_ordering(app: &mut App) {
    app.configure_sets(
        Update,
        (
            CombatSystemPhase::Motion,
            CombatSystemPhase::Actions,
            CombatSystemPhase::Resolution,
            CombatSystemPhase::Escalation,
        )
            .chain(),
    );
}

/// Insert the per-round resources. Called once at app construction; a
/// round reset reinitializes them in place.
pub fn insert_round_resources(app: &mut App, tuning: &CombatTuning, seed: Option<u64>) {
    let rng = match seed {
        Some(seed) => GameRng::from_seed(seed),
        None => GameRng::from_entropy(),
    };
    app.insert_resource(Arena::new(
        tuning.arena_half_extent,
        tuning.arena_floor_half_extent,
    ));
    app.insert_resource(EscalationController::default());
    app.insert_resource(RoundClock::new(countdown_total_ticks(tuning)));
    app.insert_resource(OutcomeSlot::default());
    app.insert_resource(RoundStats::default());
    app.insert_resource(OrbSpawner {
        next_in: tuning.orb_spawn_min_ticks,
    });
    app.insert_resource(RoundPolicies::default());
    app.insert_resource(TickGate::default());
    app.insert_resource(rng);
}

/// Add the core combat systems with the given run condition.
pub fn add_core_round_systems<M>(app: &mut App, run_condition: impl Condition<M> + Clone) {
    app.add_systems(
        Update,
        (
            apply_round_reset,
            advance_round_clock,
            tick_attack_timers,
            tick_defense_timers,
            fighter_motion,
        )
            .chain()
            .in_set(CombatSystemPhase::Motion)
            .run_if(run_condition.clone()),
    );
    app.add_systems(
        Update,
        (
            spawn_orbs,
            collect_orbs,
            trigger_skill_activation,
            update_active_skills,
            trigger_basic_attacks,
            advance_attack_phases,
        )
            .chain()
            .in_set(CombatSystemPhase::Actions)
            .run_if(run_condition.clone()),
    );
    app.add_systems(
        Update,
        resolve_defense
            .in_set(CombatSystemPhase::Resolution)
            .run_if(run_condition.clone()),
    );
    app.add_systems(
        Update,
        (update_escalation, check_round_end, record_round_events)
            .chain()
            .in_set(CombatSystemPhase::Escalation)
            .run_if(run_condition),
    );
}
