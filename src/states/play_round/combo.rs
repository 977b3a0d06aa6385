//! Combo attack subsystem
//!
//! The 3-stage basic attack state machine: Idle -> Windup -> Active ->
//! Recovery -> Idle. Stage 1 is a wide sweep, stage 2 a tighter slash,
//! stage 3 a narrow pierce with extra reach. Hit detection samples three
//! points along the blade each active tick and hands connections to the
//! defense resolver as [`StrikeAttempt`]s; no damage is applied here.

use bevy::prelude::*;

use crate::combat::events::{StrikeAttempt, StrikeSource};

use super::components::{
    AttackPhase, AttackState, Fighter, Motion, RoundClock, SkillState,
};
use super::constants::SWORD_SAMPLE_FRACTIONS;
use super::tuning::CombatTuning;
use super::utils::{angle_between, dir_towards, facing_dir};

/// Pick the stage for a new swing: continue the chain if the combo timer is
/// alive, otherwise start over at 1. Chains cycle 1 -> 2 -> 3 -> 1.
pub fn next_stage(stage: u8, combo_alive: bool) -> u8 {
    if combo_alive && stage > 0 {
        (stage % 3) + 1
    } else {
        1
    }
}

/// Sword reach for a stage, including the stage-3 pierce bonus.
pub fn stage_reach(tuning: &CombatTuning, stage: u8) -> f32 {
    let mut reach = tuning.sword_length;
    if stage == 3 {
        reach *= 1.0 + tuning.pierce_reach_bonus;
    }
    reach
}

/// Test one active tick of a swing against a defender body.
///
/// The defender's bearing must fall inside the stage's arc window relative
/// to the attacker's facing. The blade sweeps the whole arc during the
/// active window, so once the bearing qualifies the three blade samples are
/// taken along it and checked against the padded body radius.
pub fn swing_connects(
    tuning: &CombatTuning,
    attacker_pos: Vec2,
    facing: f32,
    stage: u8,
    defender_pos: Vec2,
) -> bool {
    debug_assert!((1..=3).contains(&stage), "swing with stage {}", stage);
    let reach = stage_reach(tuning, stage);
    let half_angle = tuning.combo_arc_half_angle[(stage - 1) as usize];
    let hit_radius = tuning.fighter_radius + tuning.hit_margin;

    let to_defender = defender_pos - attacker_pos;
    let bearing = to_defender.y.atan2(to_defender.x);
    if angle_between(bearing, facing) > half_angle {
        return false;
    }

    let dir = facing_dir(bearing);
    let blade_base = attacker_pos + dir * tuning.fighter_radius;
    SWORD_SAMPLE_FRACTIONS.iter().any(|fraction| {
        let sample = blade_base + dir * (reach * fraction);
        sample.distance_squared(defender_pos) <= hit_radius * hit_radius
    })
}

/// Advance per-fighter attack timers: swing cooldown and the combo timeout.
pub fn tick_attack_timers(
    clock: Res<RoundClock>,
    tuning: Res<CombatTuning>,
    mut fighters: Query<&mut AttackState, With<Fighter>>,
) {
    if !clock.combat_enabled() {
        return;
    }
    for mut attack in fighters.iter_mut() {
        if attack.cooldown_ticks > 0 {
            attack.cooldown_ticks -= 1;
        }
        attack.combo_ticks = attack.combo_ticks.saturating_add(1);
        // The chain dies quietly between swings; mid-swing the stage is
        // owned by the swing itself.
        if attack.phase == AttackPhase::Idle
            && attack.stage > 0
            && attack.combo_ticks > tuning.combo_timeout_ticks
        {
            attack.stage = 0;
        }
    }
}

/// Start a swing for every idle fighter in trigger range with cooldown
/// elapsed. The facing snaps toward the opponent at windup, which is the
/// swing's only aiming.
pub fn trigger_basic_attacks(
    clock: Res<RoundClock>,
    tuning: Res<CombatTuning>,
    mut fighters: Query<
        (Entity, &Transform, &mut Motion, &mut AttackState, &SkillState),
        With<Fighter>,
    >,
) {
    if !clock.combat_enabled() {
        return;
    }

    let snapshot: Vec<(Entity, Vec2)> = fighters
        .iter()
        .map(|(entity, transform, _, _, _)| (entity, transform.translation.truncate()))
        .collect();

    for (entity, transform, mut motion, mut attack, skills) in fighters.iter_mut() {
        if attack.phase != AttackPhase::Idle
            || attack.cooldown_ticks > 0
            || skills.active.is_some()
        {
            continue;
        }
        let pos = transform.translation.truncate();
        let Some(&(_, opponent_pos)) = snapshot.iter().find(|(other, _)| *other != entity)
        else {
            continue;
        };
        if pos.distance(opponent_pos) > tuning.attack_trigger_range {
            continue;
        }

        let combo_alive = attack.combo_ticks <= tuning.combo_timeout_ticks;
        let stage = next_stage(attack.stage, combo_alive);
        attack.stage = stage;
        attack.phase = AttackPhase::Windup;
        attack.phase_ticks = 0;
        attack.swing_hit = false;
        attack.swing_resolved = false;
        attack.swing_recovery = tuning.attack_recovery_ticks[(stage - 1) as usize];
        attack.cooldown_ticks = tuning.attack_cooldown_ticks;
        motion.facing = dir_towards(pos, opponent_pos).to_angle();
    }
}

/// Drive every in-flight swing one tick forward.
///
/// Hit sampling runs before the phase-expiry check, so a connection on the
/// final active tick still counts.
pub fn advance_attack_phases(
    clock: Res<RoundClock>,
    tuning: Res<CombatTuning>,
    mut strikes: EventWriter<StrikeAttempt>,
    mut fighters: Query<(Entity, &Transform, &Motion, &mut AttackState), With<Fighter>>,
) {
    if !clock.combat_enabled() {
        return;
    }

    let snapshot: Vec<(Entity, Vec2)> = fighters
        .iter()
        .map(|(entity, transform, _, _)| (entity, transform.translation.truncate()))
        .collect();

    for (entity, transform, motion, mut attack) in fighters.iter_mut() {
        match attack.phase {
            AttackPhase::Idle => {}
            AttackPhase::Windup => {
                attack.phase_ticks += 1;
                if attack.phase_ticks >= tuning.attack_windup_ticks {
                    attack.phase = AttackPhase::Active;
                    attack.phase_ticks = 0;
                }
            }
            AttackPhase::Active => {
                let pos = transform.translation.truncate();
                if !attack.swing_hit && !attack.swing_resolved {
                    if let Some(&(defender, defender_pos)) =
                        snapshot.iter().find(|(other, _)| *other != entity)
                    {
                        if swing_connects(&tuning, pos, motion.facing, attack.stage, defender_pos)
                        {
                            let stage = attack.stage;
                            let damage = tuning.base_damage
                                * tuning.combo_damage_mult[(stage - 1) as usize];
                            let knockback =
                                dir_towards(pos, defender_pos) * tuning.base_knockback;
                            strikes.send(StrikeAttempt {
                                attacker: entity,
                                defender,
                                source: StrikeSource::BasicAttack { stage },
                                damage,
                                knockback,
                            });
                            attack.swing_hit = true;
                        }
                    }
                }

                attack.phase_ticks += 1;
                if attack.phase_ticks >= tuning.attack_active_ticks {
                    if !attack.swing_hit && !attack.swing_resolved {
                        // Whiffed: the chain breaks.
                        attack.stage = 0;
                    }
                    attack.phase = AttackPhase::Recovery;
                    attack.phase_ticks = 0;
                }
            }
            AttackPhase::Recovery => {
                attack.phase_ticks += 1;
                if attack.phase_ticks >= attack.swing_recovery {
                    attack.phase = AttackPhase::Idle;
                    attack.phase_ticks = 0;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_stage_cycles() {
        assert_eq!(next_stage(0, false), 1);
        assert_eq!(next_stage(1, true), 2);
        assert_eq!(next_stage(2, true), 3);
        assert_eq!(next_stage(3, true), 1);
        // A dead chain always restarts.
        assert_eq!(next_stage(2, false), 1);
        assert_eq!(next_stage(3, false), 1);
    }

    #[test]
    fn test_stage_reach_pierce_bonus() {
        let tuning = CombatTuning::default();
        assert_eq!(stage_reach(&tuning, 1), tuning.sword_length);
        let pierce = stage_reach(&tuning, 3);
        assert!((pierce - tuning.sword_length * 1.3).abs() < 1e-4);
    }

    #[test]
    fn test_swing_connects_respects_arc() {
        let tuning = CombatTuning::default();
        let attacker = Vec2::ZERO;
        // Dead ahead, inside reach.
        assert!(swing_connects(&tuning, attacker, 0.0, 1, Vec2::new(70.0, 0.0)));
        // Behind the attacker: outside every arc.
        assert!(!swing_connects(&tuning, attacker, 0.0, 1, Vec2::new(-70.0, 0.0)));
        // 50 degrees off-axis: inside the wide arc, outside the pierce.
        let off_axis = Vec2::new(70.0 * 0.643, 70.0 * 0.766);
        assert!(swing_connects(&tuning, attacker, 0.0, 1, off_axis));
        assert!(!swing_connects(&tuning, attacker, 0.0, 3, off_axis));
    }

    #[test]
    fn test_swing_connects_pierce_reach() {
        let tuning = CombatTuning::default();
        let attacker = Vec2::ZERO;
        // Past normal reach, within the 30% pierce extension.
        let far = Vec2::new(115.0, 0.0);
        assert!(!swing_connects(&tuning, attacker, 0.0, 1, far));
        assert!(swing_connects(&tuning, attacker, 0.0, 3, far));
    }
}
