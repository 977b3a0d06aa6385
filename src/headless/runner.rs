//! Headless round execution
//!
//! Runs a round without any graphical output and writes the result as JSON,
//! suitable for automated testing and batch simulation.

use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use serde::Serialize;
use std::time::Duration;

use crate::combat::log::{RoundLog, RoundLogEntry, RoundLogEventType};
use crate::combat::CombatPlugin;
use crate::states::play_round::constants::TICK_RATE;
use crate::states::play_round::{
    self, add_core_round_systems, configure_combat_system_ordering, insert_round_resources,
    match_flow, systems, CombatTuning, EndReason, Fighter, FighterSide, GameRng, OutcomeSlot,
    RoundClock, RoundPolicies, RoundStats, SkillDefinitions,
};
use crate::states::play_round::tuning::{load_tuning, load_tuning_from};

use super::config::HeadlessRoundConfig;

/// Result of a completed headless round, serialized to the output file.
#[derive(Debug, Clone, Serialize)]
pub struct RoundResult {
    /// The winning side, or None for a draw
    pub winner: Option<FighterSide>,
    pub reason: EndReason,
    /// Fight duration in logical ticks (countdown excluded)
    pub fight_ticks: u32,
    pub duration_secs: f32,
    pub fighters: Vec<FighterResult>,
    pub stats: RoundStats,
    /// Random seed used (if deterministic mode)
    pub random_seed: Option<u64>,
    pub log: Vec<RoundLogEntry>,
}

/// Final state of a single fighter.
#[derive(Debug, Clone, Serialize)]
pub struct FighterResult {
    pub side: FighterSide,
    pub final_health: i32,
    pub max_health: i32,
    pub survived: bool,
}

/// Resource tracking headless round completion.
#[derive(Resource)]
pub struct HeadlessRoundState {
    /// Safety cap in logical ticks; trips only if sudden death never ends
    pub max_duration_ticks: u32,
    pub output_path: Option<String>,
    pub round_complete: bool,
    pub random_seed: Option<u64>,
    /// Round result (populated when the round completes)
    pub result: Option<RoundResult>,
}

/// Plugin for headless round execution
pub struct HeadlessPlugin {
    pub config: HeadlessRoundConfig,
    pub tuning: CombatTuning,
    pub skills: SkillDefinitions,
    pub policies: RoundPolicies,
}

impl Plugin for HeadlessPlugin {
    fn build(&self, app: &mut App) {
        let max_duration_ticks = (self.config.max_duration_secs * TICK_RATE as f32) as u32;

        app.add_plugins(CombatPlugin);
        app.insert_resource(self.tuning.clone());
        app.insert_resource(self.skills.clone());
        insert_round_resources(app, &self.tuning, self.config.random_seed);
        app.insert_resource(self.policies);
        app.insert_resource(HeadlessRoundState {
            max_duration_ticks,
            output_path: self.config.output_path.clone(),
            round_complete: false,
            random_seed: self.config.random_seed,
            result: None,
        });

        configure_combat_system_ordering(app);
        add_core_round_systems(app, headless_round_running);

        app.add_systems(Startup, headless_setup_round)
            .add_systems(
                Update,
                headless_check_round_end
                    .after(systems::CombatSystemPhase::Escalation)
                    .run_if(headless_round_running),
            )
            .add_systems(PostUpdate, headless_exit_on_complete);
    }
}

fn headless_round_running(state: Res<HeadlessRoundState>) -> bool {
    !state.round_complete
}

fn headless_setup_round(
    mut commands: Commands,
    tuning: Res<CombatTuning>,
    state: Res<HeadlessRoundState>,
    mut rng: ResMut<GameRng>,
    mut log: ResMut<RoundLog>,
) {
    match state.random_seed {
        Some(seed) => info!("Using deterministic RNG with seed: {}", seed),
        None => info!("Using non-deterministic RNG (no seed provided)"),
    }

    match_flow::spawn_fighters(&mut commands, &tuning, &mut rng);
    log.log(
        0,
        RoundLogEventType::RoundFlow,
        "round starting (headless mode)",
    );
    info!("Headless round setup complete");
}

/// Watch for the committed outcome and turn it into a [`RoundResult`].
///
/// Also enforces the safety cap: a sudden-death round that somehow never
/// produces a hit is cut off as a draw.
fn headless_check_round_end(
    clock: Res<RoundClock>,
    outcome_slot: Res<OutcomeSlot>,
    log: Res<RoundLog>,
    stats: Res<RoundStats>,
    mut state: ResMut<HeadlessRoundState>,
    fighters: Query<&Fighter>,
) {
    let outcome = if let Some(outcome) = outcome_slot.0 {
        outcome
    } else if clock.fight_ticks >= state.max_duration_ticks {
        info!(
            "Round hit the {:.0}s safety cap - declaring DRAW",
            state.max_duration_ticks as f32 / TICK_RATE as f32
        );
        play_round::RoundOutcome {
            winner: None,
            reason: EndReason::Draw,
            fight_ticks: clock.fight_ticks,
        }
    } else {
        return;
    };

    match outcome.winner {
        Some(side) => info!("Round ended! {} wins ({:?})", side.label(), outcome.reason),
        None => info!("Round ended in a DRAW ({:?})", outcome.reason),
    }

    let fighter_results = fighters
        .iter()
        .map(|fighter| FighterResult {
            side: fighter.side,
            final_health: fighter.health.max(0),
            max_health: fighter.max_health,
            survived: fighter.is_alive(),
        })
        .collect();

    let result = RoundResult {
        winner: outcome.winner,
        reason: outcome.reason,
        fight_ticks: outcome.fight_ticks,
        duration_secs: outcome.fight_ticks as f32 / TICK_RATE as f32,
        fighters: fighter_results,
        stats: stats.clone(),
        random_seed: state.random_seed,
        log: log.entries().to_vec(),
    };

    save_round_result(&result, state.output_path.as_deref());
    state.result = Some(result);
    state.round_complete = true;
}

/// Write the result JSON to the output path (default: round_result.json).
fn save_round_result(result: &RoundResult, output_path: Option<&str>) {
    let path = output_path.unwrap_or("round_result.json");
    match serde_json::to_string_pretty(result) {
        Ok(json) => match std::fs::write(path, json) {
            Ok(()) => println!("Round complete. Result saved to: {}", path),
            Err(e) => eprintln!("Failed to write round result: {}", e),
        },
        Err(e) => eprintln!("Failed to serialize round result: {}", e),
    }
}

/// Exit the app when the round is complete
fn headless_exit_on_complete(state: Res<HeadlessRoundState>, mut exit: EventWriter<AppExit>) {
    if state.round_complete {
        exit.send(AppExit::Success);
    }
}

/// Run a headless round with the given configuration
pub fn run_headless_round(config: HeadlessRoundConfig) -> Result<(), String> {
    let (tuning, skills) = match &config.tuning_path {
        Some(path) => load_tuning_from(std::path::Path::new(path)),
        None => load_tuning(),
    }?;
    let policies = config.to_round_policies()?;

    println!("Starting headless round simulation...");
    println!("  Final Flash vs Shield: {}", config.final_flash_shield);
    println!("  Tie break: {}", config.tie_break);
    println!("  Max duration: {:.0}s", config.max_duration_secs);
    if let Some(seed) = config.random_seed {
        println!("  Seed: {}", seed);
    }

    App::new()
        // Minimal plugins - no window, no rendering
        .add_plugins(
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
                1.0 / 60.0,
            ))),
        )
        // Transform plugin needed for entity positions
        .add_plugins(TransformPlugin)
        .add_plugins(HeadlessPlugin {
            config,
            tuning,
            skills,
            policies,
        })
        .run();

    Ok(())
}

/// Build a core-schedule app with no runner attached. One `update()` call is
/// one logical tick. Used by the integration tests; the caller spawns
/// fighters (or lets `match_flow::spawn_fighters` do it) before stepping.
pub fn build_core_round_app(
    tuning: CombatTuning,
    skills: SkillDefinitions,
    policies: RoundPolicies,
    seed: u64,
) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(TransformPlugin);
    app.add_plugins(CombatPlugin);
    insert_round_resources(&mut app, &tuning, Some(seed));
    app.insert_resource(tuning);
    app.insert_resource(skills);
    app.insert_resource(policies);
    configure_combat_system_ordering(&mut app);
    add_core_round_systems(&mut app, || true);
    app
}
