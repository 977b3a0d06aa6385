//! Round flow
//!
//! Countdown, the logical clock, terminal conditions, and the atomic round
//! reset. A round ends on knockout, on timeout (closer-to-center wins, with
//! an explicit tie-break policy), or on the first hit of sudden death.

use bevy::prelude::*;

use crate::combat::events::{
    HitLandedEvent, RoundEndedEvent, RoundResetEvent, SoundId, SoundRequest,
};
use crate::combat::log::{RoundLog, RoundLogEventType};

use super::components::{
    Arena, AttackState, DefenseState, EndReason, EscalationController, Fighter, FighterSide,
    GameRng, Motion, OrbSpawner, OutcomeSlot, PlayRoundEntity, RoundClock, RoundOutcome,
    RoundPhase, RoundPolicies, RoundStats, SkillOrb, SkillState, TieBreakPolicy,
};
use super::tuning::CombatTuning;

/// Fighters start mirrored at half distance from center, drifting in a
/// random direction.
pub fn fighter_spawn_position(side: FighterSide, tuning: &CombatTuning) -> Vec2 {
    let x = tuning.arena_half_extent * 0.5;
    match side {
        FighterSide::Red => Vec2::new(-x, 0.0),
        FighterSide::Blue => Vec2::new(x, 0.0),
    }
}

fn spawn_velocity(tuning: &CombatTuning, rng: &mut GameRng) -> Vec2 {
    rng.random_dir() * (tuning.min_velocity + tuning.max_velocity) * 0.5
}

/// Total countdown length in ticks.
pub fn countdown_total_ticks(tuning: &CombatTuning) -> u32 {
    tuning.countdown_segment_ticks * 3 + tuning.countdown_fight_ticks
}

/// On-screen countdown label for the remaining tick count.
pub fn countdown_label(tuning: &CombatTuning, countdown_left: u32) -> &'static str {
    let seg = tuning.countdown_segment_ticks;
    let fight = tuning.countdown_fight_ticks;
    if countdown_left > 2 * seg + fight {
        "3"
    } else if countdown_left > seg + fight {
        "2"
    } else if countdown_left > fight {
        "1"
    } else {
        "FIGHT"
    }
}

/// Spawn both fighters for a fresh round.
pub fn spawn_fighters(commands: &mut Commands, tuning: &CombatTuning, rng: &mut GameRng) {
    for side in [FighterSide::Red, FighterSide::Blue] {
        let pos = fighter_spawn_position(side, tuning);
        commands.spawn((
            Fighter::new(side, tuning.max_health),
            Motion::new(spawn_velocity(tuning, rng)),
            AttackState::default(),
            DefenseState::default(),
            SkillState::default(),
            Transform::from_translation(pos.extend(0.0)),
            PlayRoundEntity,
        ));
    }
}

/// Advance the logical clock. Runs first in the tick; everything downstream
/// sees the committed tick number.
pub fn advance_round_clock(
    tuning: Res<CombatTuning>,
    mut clock: ResMut<RoundClock>,
    mut log: ResMut<RoundLog>,
    mut sounds: EventWriter<SoundRequest>,
) {
    clock.tick += 1;

    match clock.phase {
        RoundPhase::Countdown => {
            let before = countdown_label(&tuning, clock.countdown_left);
            clock.countdown_left = clock.countdown_left.saturating_sub(1);
            if clock.countdown_left == 0 {
                clock.phase = RoundPhase::Fighting;
                log.log(clock.tick, RoundLogEventType::RoundFlow, "round begins");
            } else {
                let after = countdown_label(&tuning, clock.countdown_left);
                if before != after {
                    sounds.send(SoundRequest {
                        sound: SoundId::Countdown,
                    });
                }
            }
        }
        RoundPhase::Fighting | RoundPhase::SuddenDeath => {
            clock.fight_ticks += 1;
        }
        RoundPhase::Ended => {}
    }
}

/// Decide whether the round is over. Runs at the end of the tick, after
/// defense resolution, so it sees committed health values.
pub fn check_round_end(
    tuning: Res<CombatTuning>,
    policies: Res<RoundPolicies>,
    arena: Res<Arena>,
    mut clock: ResMut<RoundClock>,
    mut outcome_slot: ResMut<OutcomeSlot>,
    mut log: ResMut<RoundLog>,
    mut hits: EventReader<HitLandedEvent>,
    mut round_ends: EventWriter<RoundEndedEvent>,
    mut sounds: EventWriter<SoundRequest>,
    fighters: Query<(&Fighter, &Transform)>,
) {
    if !clock.combat_enabled() {
        return;
    }

    let mut outcome: Option<RoundOutcome> = None;

    // Knockout beats every other end condition.
    let dead: Vec<FighterSide> = fighters
        .iter()
        .filter(|(fighter, _)| !fighter.is_alive())
        .map(|(fighter, _)| fighter.side)
        .collect();
    match dead.as_slice() {
        [single] => {
            outcome = Some(RoundOutcome {
                winner: Some(single.opponent()),
                reason: EndReason::Knockout,
                fight_ticks: clock.fight_ticks,
            });
        }
        [_, _] => {
            outcome = Some(RoundOutcome {
                winner: None,
                reason: EndReason::Draw,
                fight_ticks: clock.fight_ticks,
            });
        }
        _ => {}
    }

    if outcome.is_none() && clock.phase == RoundPhase::SuddenDeath {
        if let Some(hit) = hits.read().next() {
            outcome = Some(RoundOutcome {
                winner: Some(hit.attacker_side),
                reason: EndReason::SuddenDeath,
                fight_ticks: clock.fight_ticks,
            });
        }
    }

    if outcome.is_none()
        && clock.phase == RoundPhase::Fighting
        && clock.fight_ticks >= tuning.round_time_limit_ticks
    {
        outcome = decide_timeout(&policies, &arena, &fighters, clock.fight_ticks);
        if outcome.is_none() {
            // Equidistant under the SuddenDeath policy: keep fighting, the
            // next landed hit takes the round.
            clock.phase = RoundPhase::SuddenDeath;
            log.log(
                clock.tick,
                RoundLogEventType::RoundFlow,
                "time expired with fighters equidistant: sudden death",
            );
        }
    }

    if let Some(outcome) = outcome {
        clock.phase = RoundPhase::Ended;
        outcome_slot.0 = Some(outcome);
        round_ends.send(RoundEndedEvent { outcome });
        sounds.send(SoundRequest {
            sound: SoundId::RoundEnd,
        });
    }
}

/// Timeout resolution: the fighter closer to the arena center wins. Equal
/// distances fall to the configured tie-break; `None` means sudden death
/// continues.
fn decide_timeout(
    policies: &RoundPolicies,
    arena: &Arena,
    fighters: &Query<(&Fighter, &Transform)>,
    fight_ticks: u32,
) -> Option<RoundOutcome> {
    let center = arena.center();
    let mut distances: Vec<(FighterSide, f32)> = fighters
        .iter()
        .map(|(fighter, transform)| {
            (
                fighter.side,
                transform.translation.truncate().distance(center),
            )
        })
        .collect();
    distances.sort_by(|a, b| a.1.total_cmp(&b.1));

    let [closest, furthest] = distances.as_slice() else {
        return Some(RoundOutcome {
            winner: None,
            reason: EndReason::Draw,
            fight_ticks,
        });
    };

    // Positions are floats; treat sub-pixel separation as equidistant.
    if (closest.1 - furthest.1).abs() < 1.0 {
        return match policies.tie_break {
            TieBreakPolicy::Draw => Some(RoundOutcome {
                winner: None,
                reason: EndReason::Draw,
                fight_ticks,
            }),
            TieBreakPolicy::SuddenDeath => None,
        };
    }

    Some(RoundOutcome {
        winner: Some(closest.0),
        reason: EndReason::Timeout,
        fight_ticks,
    })
}

/// Tear the round down and rebuild it in one tick: fighters, arena,
/// controller, clock, stats and log all reset together.
pub fn apply_round_reset(
    mut commands: Commands,
    tuning: Res<CombatTuning>,
    mut resets: EventReader<RoundResetEvent>,
    mut rng: ResMut<GameRng>,
    mut arena: ResMut<Arena>,
    mut controller: ResMut<EscalationController>,
    mut clock: ResMut<RoundClock>,
    mut outcome_slot: ResMut<OutcomeSlot>,
    mut stats: ResMut<RoundStats>,
    mut spawner: ResMut<OrbSpawner>,
    mut log: ResMut<RoundLog>,
    orbs: Query<Entity, With<SkillOrb>>,
    mut fighters: Query<(
        &mut Fighter,
        &mut Transform,
        &mut Motion,
        &mut AttackState,
        &mut DefenseState,
        &mut SkillState,
    )>,
) {
    if resets.read().next().is_none() {
        return;
    }

    for (mut fighter, mut transform, mut motion, mut attack, mut defense, mut skills) in
        fighters.iter_mut()
    {
        fighter.health = fighter.max_health;
        let pos = fighter_spawn_position(fighter.side, &tuning);
        transform.translation = pos.extend(0.0);
        *motion = Motion::new(spawn_velocity(&tuning, &mut rng));
        *attack = AttackState::default();
        *defense = DefenseState::default();
        *skills = SkillState::default();
    }

    for orb in orbs.iter() {
        commands.entity(orb).despawn();
    }

    *arena = Arena::new(tuning.arena_half_extent, tuning.arena_floor_half_extent);
    *controller = EscalationController::default();
    *clock = RoundClock::new(countdown_total_ticks(&tuning));
    outcome_slot.0 = None;
    *stats = RoundStats::default();
    spawner.next_in = rng.random_ticks(tuning.orb_spawn_min_ticks, tuning.orb_spawn_max_ticks);
    log.clear();
    log.log(0, RoundLogEventType::RoundFlow, "round reset");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown_labels() {
        let tuning = CombatTuning::default();
        let total = countdown_total_ticks(&tuning);
        assert_eq!(total, 165);
        assert_eq!(countdown_label(&tuning, total), "3");
        assert_eq!(countdown_label(&tuning, 120), "2");
        assert_eq!(countdown_label(&tuning, 75), "1");
        assert_eq!(countdown_label(&tuning, 30), "FIGHT");
        assert_eq!(countdown_label(&tuning, 1), "FIGHT");
    }
}
