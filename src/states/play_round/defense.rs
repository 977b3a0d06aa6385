//! Defensive triangle resolver
//!
//! Runs once per tick after motion, combo and skill updates. Takes every
//! [`StrikeAttempt`] that connected geometrically this tick and resolves it
//! through the precedence ladder: Shield absorb, then Spin Parry, then
//! Clash, then a direct hit. Mutual basic swings are checked for a
//! sword-on-sword clash first, before any individual strike resolves.

use bevy::prelude::*;
use smallvec::SmallVec;

use crate::combat::events::*;

use super::components::{
    AttackPhase, AttackState, DefenseState, DefensiveStance, Fighter, FighterSide,
    FinalFlashShieldPolicy, GameRng, Motion, RoundClock, RoundPolicies, SkillPhase, SkillState,
};
use super::constants::{
    HIT_STOP_TICKS, SCREEN_SHAKE_DECAY, SCREEN_SHAKE_INTENSITY, SLOW_MOTION_FACTOR,
    SLOW_MOTION_TICKS,
};
use super::combo::stage_reach;
use super::skills::apply_skill_clash;
use super::tuning::{CombatTuning, SkillDefinitions, SkillKind};
use super::utils::{dir_towards, facing_dir};

type FighterComponents<'a> = (
    Entity,
    &'a Transform,
    &'a mut Fighter,
    &'a mut Motion,
    &'a mut AttackState,
    &'a mut DefenseState,
    &'a mut SkillState,
);

/// Count down i-frames and the hit flash.
pub fn tick_defense_timers(mut fighters: Query<&mut DefenseState, With<Fighter>>) {
    for mut defense in fighters.iter_mut() {
        if defense.iframes > 0 {
            defense.iframes -= 1;
        }
        if defense.hit_flash > 0 {
            defense.hit_flash -= 1;
        }
    }
}

/// Whether a defender's active skill presents clashable active frames.
fn defender_clashable_skill(skills: &SkillState, defs: &SkillDefinitions) -> Option<SkillKind> {
    let active = skills.active.as_ref()?;
    if !matches!(active.phase, SkillPhase::Activating | SkillPhase::Active) {
        return None;
    }
    defs.get_unchecked(active.kind)
        .clashable
        .then_some(active.kind)
}

pub fn resolve_defense(
    clock: Res<RoundClock>,
    tuning: Res<CombatTuning>,
    defs: Res<SkillDefinitions>,
    policies: Res<RoundPolicies>,
    mut rng: ResMut<GameRng>,
    mut strikes: EventReader<StrikeAttempt>,
    mut hits: EventWriter<HitLandedEvent>,
    mut clashes: EventWriter<ClashEvent>,
    mut parries: EventWriter<ParryEvent>,
    mut absorbs: EventWriter<ShieldAbsorbEvent>,
    mut deaths: EventWriter<FighterDeathEvent>,
    mut particles: EventWriter<ParticleBurstRequest>,
    mut hit_stops: EventWriter<HitStopRequest>,
    mut shakes: EventWriter<ScreenShakeRequest>,
    // Grouped into one tuple param to stay within Bevy's 16-parameter
    // system limit; tuples of system params count as a single parameter.
    (mut slowmos, mut sounds): (EventWriter<SlowMotionRequest>, EventWriter<SoundRequest>),
    mut fighters: Query<FighterComponents, With<Fighter>>,
) {
    if !clock.combat_enabled() {
        return;
    }

    let mut pending: SmallVec<[StrikeAttempt; 4]> = strikes.read().cloned().collect();

    // --- Sword-on-sword clash -------------------------------------------
    // Both fighters swinging with live blades close enough, or landing
    // basic strikes on each other in the same tick, cancels both swings.
    // Neither side takes damage and neither combo changes.
    let swing_snapshot: SmallVec<[(Entity, Vec2, f32, bool); 2]> = fighters
        .iter()
        .map(|(entity, transform, _, motion, attack, _, _)| {
            (
                entity,
                transform.translation.truncate(),
                motion.facing,
                attack.phase == AttackPhase::Active && !attack.swing_resolved,
            )
        })
        .collect();

    if swing_snapshot.len() == 2 && swing_snapshot.iter().all(|(_, _, _, live)| *live) {
        let (a, a_pos, a_facing, _) = swing_snapshot[0];
        let (b, b_pos, b_facing, _) = swing_snapshot[1];
        let a_tip = a_pos + facing_dir(a_facing) * (tuning.fighter_radius + tuning.sword_length);
        let b_tip = b_pos + facing_dir(b_facing) * (tuning.fighter_radius + tuning.sword_length);

        let mutual_basic = pending.iter().any(|s| {
            s.attacker == a && matches!(s.source, StrikeSource::BasicAttack { .. })
        }) && pending.iter().any(|s| {
            s.attacker == b && matches!(s.source, StrikeSource::BasicAttack { .. })
        });

        if mutual_basic || a_tip.distance(b_tip) <= tuning.sword_clash_distance {
            pending.retain(|s| !matches!(s.source, StrikeSource::BasicAttack { .. }));

            if let Ok(mut both) = fighters.get_many_mut([a, b]) {
                for (_, transform, _, motion, attack, _, _) in both.iter_mut() {
                    end_swing_preserving_combo(attack);
                    // Light separation shove so the blades disengage.
                    let away = dir_towards(
                        (a_pos + b_pos) * 0.5,
                        transform.translation.truncate(),
                    );
                    motion.velocity += away * 5.0;
                }
            }

            let midpoint = (a_pos + b_pos) * 0.5;
            clashes.send(ClashEvent {
                a,
                b,
                kind: ClashKind::SwordOnSword,
                position: midpoint,
            });
            particles.send(ParticleBurstRequest {
                position: midpoint,
                color: Color::srgb(1.0, 1.0, 0.7),
                count: 10,
            });
            hit_stops.send(HitStopRequest {
                ticks: HIT_STOP_TICKS,
            });
            sounds.send(SoundRequest {
                sound: SoundId::Clash,
            });
        }
    }

    // --- Per-strike precedence ladder -----------------------------------
    for strike in pending {
        let Ok([attacker_parts, defender_parts]) =
            fighters.get_many_mut([strike.attacker, strike.defender])
        else {
            continue;
        };
        let (_, att_transform, _, mut att_motion, mut att_attack, _, mut att_skills) =
            attacker_parts;
        let (
            _,
            def_transform,
            mut def_fighter,
            mut def_motion,
            mut def_attack,
            mut def_defense,
            mut def_skills,
        ) = defender_parts;

        let att_pos = att_transform.translation.truncate();
        let def_pos = def_transform.translation.truncate();

        if !def_fighter.is_alive() || def_defense.iframes > 0 {
            continue;
        }

        let attacker_side = def_fighter.side.opponent();
        let defender_side = def_fighter.side;

        // 1. Shield absorbs anything, except an unabsorbable Final Flash.
        let shield_up = def_defense.stance == DefensiveStance::Shielding
            && matches!(
                def_skills.active.as_ref().map(|s| s.kind),
                Some(SkillKind::Shield)
            );
        let flash_burns_through = matches!(
            strike.source,
            StrikeSource::Skill {
                kind: SkillKind::FinalFlashDraw
            }
        ) && policies.final_flash_shield == FinalFlashShieldPolicy::Unabsorbable;

        if shield_up && !flash_burns_through {
            if let Some(active) = def_skills.active.as_mut() {
                active.advance_phase(SkillPhase::Expired);
            }
            def_skills.clear_expired();
            def_defense.stance = DefensiveStance::None;
            // Absorption punishes the attacker's momentum.
            att_attack.stage = 0;
            absorbs.send(ShieldAbsorbEvent {
                defender: strike.defender,
                attacker: strike.attacker,
                defender_side,
                source: strike.source,
            });
            particles.send(ParticleBurstRequest {
                position: def_pos,
                color: Color::srgb(0.3, 0.6, 1.0),
                count: 14,
            });
            sounds.send(SoundRequest {
                sound: SoundId::ShieldBreak,
            });
            continue;
        }

        // 2. Spin parry cancels whatever crosses the spin radius and shoves
        //    the attacker away. A basic swing is caught by its blade tip;
        //    a point-blank pierce whose tip is already past the spin slips
        //    through. Clashable skills are delivered at the body and are
        //    always inside the spin.
        let parryable = match strike.source {
            StrikeSource::BasicAttack { stage } => {
                let tip = att_pos
                    + facing_dir(att_motion.facing)
                        * (tuning.fighter_radius + stage_reach(&tuning, stage));
                tip.distance(def_pos)
                    < defs.get_unchecked(SkillKind::SpinParry).parry_radius
            }
            StrikeSource::Skill { kind } => defs.get_unchecked(kind).clashable,
        };
        if def_defense.stance == DefensiveStance::Parrying && parryable {
            let shove = dir_towards(def_pos, att_pos);
            let mut knockback = tuning.parry_knockback;
            if strike.source.is_pierce() {
                knockback *= tuning.pierce_parry_knockback_mult;
            }
            att_motion.velocity += shove * knockback;

            match strike.source {
                StrikeSource::BasicAttack { .. } => {
                    end_swing_preserving_combo(&mut att_attack);
                    att_attack.cooldown_ticks = tuning.parry_attacker_cooldown_ticks;
                }
                StrikeSource::Skill { .. } => {
                    apply_skill_clash(
                        &mut att_skills,
                        &mut att_motion,
                        &mut rng,
                        &tuning,
                        &defs,
                        shove,
                    );
                }
            }

            parries.send(ParryEvent {
                defender: strike.defender,
                attacker: strike.attacker,
                defender_side,
                source: strike.source,
            });
            slowmos.send(SlowMotionRequest {
                factor: SLOW_MOTION_FACTOR,
                ticks: SLOW_MOTION_TICKS / 3,
            });
            sounds.send(SoundRequest {
                sound: SoundId::Parry,
            });
            continue;
        }

        // 3. Clash: a basic swing meeting clashable active skill frames, in
        //    either direction. No damage, combos preserved.
        let clash_skill = match strike.source {
            StrikeSource::BasicAttack { .. } => {
                defender_clashable_skill(&def_skills, &defs)
            }
            StrikeSource::Skill { kind } => {
                let defender_swinging =
                    def_attack.phase == AttackPhase::Active && !def_attack.swing_resolved;
                (defender_swinging && defs.get_unchecked(kind).clashable).then_some(kind)
            }
        };
        if let Some(skill) = clash_skill {
            match strike.source {
                StrikeSource::BasicAttack { .. } => {
                    end_swing_preserving_combo(&mut att_attack);
                    let away = dir_towards(att_pos, def_pos);
                    apply_skill_clash(
                        &mut def_skills,
                        &mut def_motion,
                        &mut rng,
                        &tuning,
                        &defs,
                        away,
                    );
                }
                StrikeSource::Skill { .. } => {
                    end_swing_preserving_combo(&mut def_attack);
                    let away = dir_towards(def_pos, att_pos);
                    apply_skill_clash(
                        &mut att_skills,
                        &mut att_motion,
                        &mut rng,
                        &tuning,
                        &defs,
                        away,
                    );
                }
            }
            let midpoint = (att_pos + def_pos) * 0.5;
            clashes.send(ClashEvent {
                a: strike.attacker,
                b: strike.defender,
                kind: ClashKind::SwordOnSkill { skill },
                position: midpoint,
            });
            sounds.send(SoundRequest {
                sound: SoundId::Clash,
            });
            continue;
        }

        // 4. Direct hit.
        let damage = (strike.damage * def_defense.vulnerability).round().max(1.0) as i32;
        def_fighter.health = (def_fighter.health - damage).max(0);
        def_defense.iframes = tuning.hit_iframes;
        def_defense.hit_flash = tuning.hit_flash_ticks;
        def_motion.velocity += strike.knockback;

        // Taking damage breaks the defender's combo and any swing in
        // flight; landing the hit keeps the attacker's chain alive.
        def_attack.stage = 0;
        def_attack.phase = AttackPhase::Idle;
        def_attack.phase_ticks = 0;
        def_attack.swing_hit = false;
        def_attack.swing_resolved = false;
        att_attack.combo_ticks = 0;

        hits.send(HitLandedEvent {
            attacker: strike.attacker,
            defender: strike.defender,
            attacker_side,
            defender_side,
            damage,
            source: strike.source,
            position: def_pos,
        });
        particles.send(ParticleBurstRequest {
            position: def_pos,
            color: side_color(defender_side),
            count: 12,
        });
        hit_stops.send(HitStopRequest {
            ticks: HIT_STOP_TICKS,
        });
        shakes.send(ScreenShakeRequest {
            intensity: SCREEN_SHAKE_INTENSITY,
            decay: SCREEN_SHAKE_DECAY,
        });
        sounds.send(SoundRequest { sound: SoundId::Hit });

        if !def_fighter.is_alive() {
            deaths.send(FighterDeathEvent {
                victim: strike.defender,
                victim_side: defender_side,
            });
            slowmos.send(SlowMotionRequest {
                factor: SLOW_MOTION_FACTOR,
                ticks: SLOW_MOTION_TICKS,
            });
            sounds.send(SoundRequest {
                sound: SoundId::Death,
            });
        }
    }
}

/// End a swing without touching the combo stage. Used for clashes and
/// parries, which are not hits and must not trip the miss-reset.
fn end_swing_preserving_combo(attack: &mut AttackState) {
    if matches!(attack.phase, AttackPhase::Windup | AttackPhase::Active) {
        attack.phase = AttackPhase::Recovery;
        attack.phase_ticks = 0;
    }
    attack.swing_resolved = true;
}

pub fn side_color(side: FighterSide) -> Color {
    match side {
        FighterSide::Red => Color::srgb(0.95, 0.3, 0.3),
        FighterSide::Blue => Color::srgb(0.35, 0.45, 1.0),
    }
}
