//! Skill subsystem
//!
//! The seven pickup skills share one lifecycle: granted to the single slot
//! by an orb, auto-activated when the trigger range is met, updated every
//! tick, expired when done (slot freed whether or not they connected).
//! Activation captures the opponent's position once; everything after works
//! from that snapshot, which is why skills can still miss.
//!
//! Skills that steer their owner (Dash Slash, Ground Slam, Final Flash
//! Draw) lock the motion model and integrate position themselves; the rest
//! ride the normal bounce movement.

use bevy::prelude::*;
use smallvec::SmallVec;

use crate::combat::events::{
    ParticleBurstRequest, ShockwaveKind, ShockwaveRequest, SkillActivatedEvent,
    SlowMotionRequest, SoundId, SoundRequest, StrikeAttempt, StrikeSource,
};

use super::components::{
    ActiveSkill, Arena, AttackPhase, AttackState, DefenseState, DefensiveStance, Fighter,
    GameRng, Motion, RoundClock, SkillPayload, SkillPhase, SkillState,
};
use super::constants::{SLOW_MOTION_FACTOR, SLOW_MOTION_TICKS};
use super::tuning::{CombatTuning, SkillDefinitions, SkillKind};
use super::utils::{circles_overlap, dir_towards};

/// Display color per kind, shared by orbs and skill telegraphs.
pub fn skill_color(kind: SkillKind) -> Color {
    match kind {
        SkillKind::DashSlash => Color::srgb(1.0, 0.55, 0.1),
        SkillKind::SpinParry => Color::srgb(0.2, 0.9, 0.9),
        SkillKind::GroundSlam => Color::srgb(0.8, 0.5, 0.2),
        SkillKind::Shield => Color::srgb(0.3, 0.6, 1.0),
        SkillKind::PhantomCross => Color::srgb(0.7, 0.2, 0.9),
        SkillKind::BladeCyclone => Color::srgb(0.4, 1.0, 0.4),
        SkillKind::FinalFlashDraw => Color::srgb(1.0, 0.1, 0.1),
    }
}

/// Initial payload for a freshly activated skill, capturing the opponent
/// snapshot where the kind needs one.
fn initial_payload(kind: SkillKind, owner_pos: Vec2, opponent_pos: Vec2) -> SkillPayload {
    match kind {
        SkillKind::DashSlash => SkillPayload::DashSlash {
            direction: dir_towards(owner_pos, opponent_pos),
            hit_landed: false,
        },
        SkillKind::SpinParry => SkillPayload::SpinParry {
            window_left: 0, // filled from the definition at activation
            recovery_left: 0,
        },
        SkillKind::GroundSlam => SkillPayload::GroundSlam {
            landing: opponent_pos,
            reduced: false,
            height: 0.0,
        },
        SkillKind::Shield => SkillPayload::Shield,
        SkillKind::PhantomCross => SkillPayload::PhantomCross { pending: true },
        SkillKind::BladeCyclone => SkillPayload::BladeCyclone { rehit_cooldown: 0 },
        SkillKind::FinalFlashDraw => SkillPayload::FinalFlashDraw { struck: false },
    }
}

/// Activate held skills whose trigger condition is met.
///
/// Activation interrupts any swing and resets the combo chain.
pub fn trigger_skill_activation(
    clock: Res<RoundClock>,
    defs: Res<SkillDefinitions>,
    tuning: Res<CombatTuning>,
    arena: Res<Arena>,
    mut activated: EventWriter<SkillActivatedEvent>,
    mut particles: EventWriter<ParticleBurstRequest>,
    mut sounds: EventWriter<SoundRequest>,
    mut fighters: Query<
        (
            Entity,
            &Fighter,
            &mut Transform,
            &mut Motion,
            &mut AttackState,
            &mut SkillState,
        ),
        With<Fighter>,
    >,
) {
    if !clock.combat_enabled() {
        return;
    }

    let snapshot: Vec<(Entity, Vec2)> = fighters
        .iter()
        .map(|(entity, _, transform, _, _, _)| (entity, transform.translation.truncate()))
        .collect();

    for (entity, fighter, mut transform, mut motion, mut attack, mut skills) in
        fighters.iter_mut()
    {
        let Some(kind) = skills.held() else { continue };
        let pos = transform.translation.truncate();
        let Some(&(_, opponent_pos)) = snapshot.iter().find(|(other, _)| *other != entity)
        else {
            continue;
        };

        let def = defs.get_unchecked(kind);
        if pos.distance(opponent_pos) > def.activation_range {
            continue;
        }

        let mut payload = initial_payload(kind, pos, opponent_pos);
        match &mut payload {
            SkillPayload::SpinParry {
                window_left,
                recovery_left,
            } => {
                *window_left = def.parry_window_ticks;
                *recovery_left = def.recovery_ticks;
            }
            SkillPayload::PhantomCross { .. } => {
                // Teleport behind the captured position, along the approach
                // line, clamped inside the walls.
                let behind = opponent_pos
                    + dir_towards(pos, opponent_pos) * def.teleport_distance;
                let behind = arena.clamp_inside(behind, tuning.fighter_radius);
                transform.translation.x = behind.x;
                transform.translation.y = behind.y;
            }
            _ => {}
        }

        if matches!(
            kind,
            SkillKind::DashSlash | SkillKind::GroundSlam | SkillKind::FinalFlashDraw
        ) {
            motion.locked = true;
        }

        skills.activate(ActiveSkill {
            kind,
            phase: SkillPhase::Activating,
            timer: 0,
            payload,
        });

        // Using a skill abandons the combo chain.
        attack.stage = 0;
        attack.phase = AttackPhase::Idle;
        attack.phase_ticks = 0;
        attack.swing_hit = false;
        attack.swing_resolved = false;

        activated.send(SkillActivatedEvent {
            owner: entity,
            side: fighter.side,
            kind,
        });
        particles.send(ParticleBurstRequest {
            position: pos,
            color: skill_color(kind),
            count: 12,
        });
        sounds.send(SoundRequest {
            sound: SoundId::SkillActivate,
        });
    }
}

/// Drive every active skill one tick forward.
pub fn update_active_skills(
    clock: Res<RoundClock>,
    defs: Res<SkillDefinitions>,
    tuning: Res<CombatTuning>,
    arena: Res<Arena>,
    mut strikes: EventWriter<StrikeAttempt>,
    mut shockwaves: EventWriter<ShockwaveRequest>,
    mut particles: EventWriter<ParticleBurstRequest>,
    mut slowmo: EventWriter<SlowMotionRequest>,
    mut fighters: Query<
        (
            Entity,
            &mut Transform,
            &mut Motion,
            &mut SkillState,
            &mut DefenseState,
        ),
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

    // Impulses on the opponent (cyclone pull/release) are applied after the
    // main pass; mutating the other fighter mid-iteration is not possible.
    let mut impulses: SmallVec<[(Entity, Vec2); 4]> = SmallVec::new();

    for (entity, mut transform, mut motion, mut skills, mut defense) in fighters.iter_mut() {
        let pos = transform.translation.truncate();
        let Some(&(opponent, opponent_pos)) =
            snapshot.iter().find(|(other, _)| *other != entity)
        else {
            continue;
        };

        let Some(active) = skills.active.as_mut() else {
            defense.stance = DefensiveStance::None;
            defense.vulnerability = 1.0;
            continue;
        };

        let def = defs.get_unchecked(active.kind);
        let timer = active.timer;
        let mut stance = DefensiveStance::None;
        let mut vulnerability = 1.0;
        let mut expired = false;

        match &mut active.payload {
            SkillPayload::DashSlash {
                direction,
                hit_landed,
            } => {
                if timer == 0 {
                    active.phase = SkillPhase::Active;
                }
                let next = arena.clamp_inside(
                    pos + *direction * def.dash_speed,
                    tuning.fighter_radius,
                );
                transform.translation.x = next.x;
                transform.translation.y = next.y;

                if !*hit_landed
                    && circles_overlap(
                        next,
                        tuning.fighter_radius,
                        opponent_pos,
                        tuning.fighter_radius + tuning.hit_margin,
                    )
                {
                    strikes.send(StrikeAttempt {
                        attacker: entity,
                        defender: opponent,
                        source: StrikeSource::Skill {
                            kind: SkillKind::DashSlash,
                        },
                        damage: tuning.base_damage * def.damage_mult,
                        knockback: *direction * tuning.base_knockback * def.knockback_mult,
                    });
                    *hit_landed = true;
                }

                if timer + 1 >= def.duration_ticks {
                    // Carry the dash heading into normal movement.
                    motion.velocity = *direction * tuning.max_velocity;
                    expired = true;
                }
            }
            SkillPayload::SpinParry {
                window_left,
                recovery_left,
            } => {
                if *window_left > 0 {
                    *window_left -= 1;
                    stance = DefensiveStance::Parrying;
                    if timer == 0 {
                        active.phase = SkillPhase::Active;
                    }
                    if *window_left == 0 {
                        active.advance_phase(SkillPhase::Resolving);
                    }
                } else if *recovery_left > 0 {
                    *recovery_left -= 1;
                    // Open after the spin: incoming damage is amplified.
                    vulnerability = tuning.parry_recovery_vulnerability;
                    if *recovery_left == 0 {
                        expired = true;
                    }
                } else {
                    expired = true;
                }
            }
            SkillPayload::GroundSlam {
                landing,
                reduced,
                height,
            } => {
                if timer < def.impact_tick {
                    if timer == def.rise_ticks {
                        active.phase = SkillPhase::Active;
                    }
                    // Rise then fall, drifting toward the captured landing
                    // point so the impact lands exactly there.
                    *height = slam_height(timer, def.rise_ticks, def.impact_tick);
                    let remaining = (def.impact_tick - timer) as f32;
                    let step = (*landing - pos) / remaining;
                    let next = arena.clamp_inside(pos + step, tuning.fighter_radius);
                    transform.translation.x = next.x;
                    transform.translation.y = next.y;
                } else if timer == def.impact_tick {
                    *height = 0.0;
                    let scale = if *reduced { 0.5 } else { 1.0 };
                    let radius = def.shockwave_radius * scale;
                    let dist = opponent_pos.distance(*landing);
                    if dist <= radius {
                        let falloff = 1.0 - dist / radius;
                        strikes.send(StrikeAttempt {
                            attacker: entity,
                            defender: opponent,
                            source: StrikeSource::Skill {
                                kind: SkillKind::GroundSlam,
                            },
                            damage: tuning.base_damage * def.damage_mult * scale * falloff,
                            knockback: dir_towards(*landing, opponent_pos)
                                * tuning.base_knockback
                                * def.knockback_mult,
                        });
                    }
                    shockwaves.send(ShockwaveRequest {
                        position: *landing,
                        radius,
                        kind: ShockwaveKind::GroundSlam,
                    });
                    active.advance_phase(SkillPhase::Resolving);
                    motion.locked = false;
                } else if timer + 1 >= def.duration_ticks {
                    expired = true;
                }
            }
            SkillPayload::Shield => {
                if timer == 0 {
                    active.phase = SkillPhase::Active;
                }
                stance = DefensiveStance::Shielding;
                if timer + 1 >= def.duration_ticks {
                    expired = true;
                }
            }
            SkillPayload::PhantomCross { pending } => {
                if timer == def.slash_tick {
                    // Inlined `advance_phase`: calling the method would
                    // re-borrow all of `active` while `payload` is borrowed.
                    debug_assert!(
                        SkillPhase::Active >= active.phase,
                        "skill phase may not move backwards: {:?} -> {:?}",
                        active.phase,
                        SkillPhase::Active
                    );
                    active.phase = SkillPhase::Active;
                    particles.send(ParticleBurstRequest {
                        position: pos,
                        color: skill_color(SkillKind::PhantomCross),
                        count: 8,
                    });
                }
                if timer == def.strike_tick {
                    // The delayed cut only lands if the owner is still close
                    // enough, and only if no clash canceled it.
                    if *pending && pos.distance(opponent_pos) <= def.hit_range {
                        strikes.send(StrikeAttempt {
                            attacker: entity,
                            defender: opponent,
                            source: StrikeSource::Skill {
                                kind: SkillKind::PhantomCross,
                            },
                            damage: tuning.base_damage * def.damage_mult,
                            knockback: dir_towards(pos, opponent_pos)
                                * tuning.base_knockback
                                * def.knockback_mult,
                        });
                    }
                    *pending = false;
                    active.advance_phase(SkillPhase::Resolving);
                }
                if timer + 1 >= def.duration_ticks {
                    expired = true;
                }
            }
            SkillPayload::BladeCyclone { rehit_cooldown } => {
                if timer == 0 {
                    active.phase = SkillPhase::Active;
                }
                if *rehit_cooldown > 0 {
                    *rehit_cooldown -= 1;
                }
                let dist = pos.distance(opponent_pos);
                if dist <= def.hit_range && *rehit_cooldown == 0 {
                    strikes.send(StrikeAttempt {
                        attacker: entity,
                        defender: opponent,
                        source: StrikeSource::Skill {
                            kind: SkillKind::BladeCyclone,
                        },
                        damage: tuning.base_damage * def.damage_mult,
                        knockback: dir_towards(pos, opponent_pos)
                            * tuning.base_knockback
                            * def.knockback_mult,
                    });
                    *rehit_cooldown = def.hit_interval_ticks;
                }
                if dist < def.pull_radius {
                    impulses.push((opponent, dir_towards(opponent_pos, pos) * def.pull_strength));
                }
                if timer + 1 >= def.duration_ticks {
                    active.advance_phase(SkillPhase::Resolving);
                    if dist <= def.release_radius {
                        impulses.push((
                            opponent,
                            dir_towards(pos, opponent_pos) * def.release_knockback,
                        ));
                    }
                    expired = true;
                }
            }
            SkillPayload::FinalFlashDraw { struck } => {
                if timer < def.rise_ticks {
                    // Sheath pose: rooted in place.
                    motion.velocity = Vec2::ZERO;
                } else if timer == def.rise_ticks {
                    // Inlined `advance_phase`: calling the method would
                    // re-borrow all of `active` while `payload` is borrowed.
                    debug_assert!(
                        SkillPhase::Active >= active.phase,
                        "skill phase may not move backwards: {:?} -> {:?}",
                        active.phase,
                        SkillPhase::Active
                    );
                    active.phase = SkillPhase::Active;
                }
                if timer == def.strike_tick && !*struck {
                    // The one guaranteed hit in the game.
                    strikes.send(StrikeAttempt {
                        attacker: entity,
                        defender: opponent,
                        source: StrikeSource::Skill {
                            kind: SkillKind::FinalFlashDraw,
                        },
                        damage: tuning.base_damage * def.damage_mult,
                        knockback: dir_towards(pos, opponent_pos)
                            * tuning.base_knockback
                            * def.knockback_mult,
                    });
                    *struck = true;
                    motion.locked = false;
                    active.advance_phase(SkillPhase::Resolving);
                    slowmo.send(SlowMotionRequest {
                        factor: SLOW_MOTION_FACTOR,
                        ticks: SLOW_MOTION_TICKS,
                    });
                }
                if timer + 1 >= def.duration_ticks {
                    expired = true;
                }
            }
        }

        active.timer += 1;

        if expired {
            active.advance_phase(SkillPhase::Expired);
            skills.clear_expired();
            motion.locked = false;
            defense.stance = DefensiveStance::None;
            defense.vulnerability = 1.0;
        } else {
            defense.stance = stance;
            defense.vulnerability = vulnerability;
        }
    }

    for (target, impulse) in impulses {
        if let Ok((_, _, mut motion, _, _)) = fighters.get_mut(target) {
            motion.velocity += impulse;
        }
    }
}

/// Vertical telegraph offset of a ground slam at a given tick.
fn slam_height(timer: u32, rise_ticks: u32, impact_tick: u32) -> f32 {
    if timer < rise_ticks {
        timer as f32 / rise_ticks.max(1) as f32 * 96.0
    } else {
        let fall = (timer - rise_ticks) as f32;
        let span = (impact_tick - rise_ticks).max(1) as f32;
        96.0 * (1.0 - fall / span)
    }
}

/// Outcome of a clash landing on an active skill, per the kind table.
pub struct ClashResponse {
    /// The skill was canceled outright.
    pub canceled: bool,
}

/// Apply the per-kind clash response to a defender's active skill.
///
/// Dash Slash deflects off-angle and ends; Spin Parry dissipates into a
/// short recovery; Ground Slam keeps falling with a weakened shockwave;
/// Phantom Cross loses its pending cut; Blade Cyclone only shoves its owner
/// back. Final Flash Draw never reaches this path.
pub fn apply_skill_clash(
    skills: &mut SkillState,
    motion: &mut Motion,
    rng: &mut GameRng,
    tuning: &CombatTuning,
    defs: &SkillDefinitions,
    away: Vec2,
) -> ClashResponse {
    let Some(active) = skills.active.as_mut() else {
        return ClashResponse { canceled: false };
    };
    debug_assert!(
        active.kind != SkillKind::FinalFlashDraw,
        "Final Flash Draw cannot be clashed"
    );
    let def = defs.get_unchecked(active.kind);

    let mut canceled = false;
    match &mut active.payload {
        SkillPayload::DashSlash { direction, .. } => {
            let deflect = rng.random_range(-0.8, 0.8);
            let rotated = Vec2::from_angle(deflect).rotate(*direction);
            motion.velocity = rotated * tuning.max_velocity;
            canceled = true;
        }
        SkillPayload::SpinParry {
            window_left,
            recovery_left,
        } => {
            *window_left = 0;
            *recovery_left = def.clash_recovery_ticks;
            active.advance_phase(SkillPhase::Resolving);
        }
        SkillPayload::GroundSlam { reduced, .. } => {
            *reduced = true;
        }
        SkillPayload::PhantomCross { pending } => {
            *pending = false;
            canceled = true;
        }
        SkillPayload::BladeCyclone { .. } => {
            // Pushback only; the remaining hits survive.
            motion.velocity += away * def.clash_pushback;
        }
        SkillPayload::Shield | SkillPayload::FinalFlashDraw { .. } => {}
    }

    if canceled {
        active.advance_phase(SkillPhase::Expired);
        skills.clear_expired();
        motion.locked = false;
    }

    ClashResponse { canceled }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slam_height_rises_then_falls() {
        assert_eq!(slam_height(0, 12, 22), 0.0);
        let top = slam_height(12, 12, 22);
        assert!(top > slam_height(6, 12, 22));
        assert!(slam_height(21, 12, 22) < top);
    }

    #[test]
    fn test_initial_payload_captures_snapshot() {
        let payload = initial_payload(
            SkillKind::GroundSlam,
            Vec2::ZERO,
            Vec2::new(120.0, 0.0),
        );
        match payload {
            SkillPayload::GroundSlam { landing, .. } => {
                assert_eq!(landing, Vec2::new(120.0, 0.0));
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_clash_responses_read_the_skill_table() {
        let tuning = CombatTuning::default();
        let defs = SkillDefinitions::default();
        let mut rng = GameRng::from_seed(1);

        let mut skills = SkillState::default();
        skills.grant(SkillKind::SpinParry).unwrap();
        skills.activate(ActiveSkill {
            kind: SkillKind::SpinParry,
            phase: SkillPhase::Activating,
            timer: 0,
            payload: SkillPayload::SpinParry {
                window_left: 30,
                recovery_left: 20,
            },
        });
        let mut motion = Motion::new(Vec2::new(6.0, 0.0));
        apply_skill_clash(&mut skills, &mut motion, &mut rng, &tuning, &defs, Vec2::X);
        match &skills.active.as_ref().unwrap().payload {
            SkillPayload::SpinParry {
                window_left,
                recovery_left,
            } => {
                assert_eq!(*window_left, 0);
                assert_eq!(
                    *recovery_left,
                    defs.get_unchecked(SkillKind::SpinParry).clash_recovery_ticks
                );
            }
            other => panic!("unexpected payload {:?}", other),
        }

        let mut skills = SkillState::default();
        skills.grant(SkillKind::BladeCyclone).unwrap();
        skills.activate(ActiveSkill {
            kind: SkillKind::BladeCyclone,
            phase: SkillPhase::Activating,
            timer: 0,
            payload: SkillPayload::BladeCyclone { rehit_cooldown: 0 },
        });
        let mut motion = Motion::new(Vec2::ZERO);
        apply_skill_clash(&mut skills, &mut motion, &mut rng, &tuning, &defs, Vec2::X);
        let pushback = defs.get_unchecked(SkillKind::BladeCyclone).clash_pushback;
        assert_eq!(motion.velocity.x, pushback);
        assert!(skills.active.is_some(), "the cyclone keeps spinning");
    }

    #[test]
    fn test_each_kind_has_a_distinct_color() {
        let mut seen = Vec::new();
        for kind in SkillKind::ALL {
            let color = skill_color(kind);
            assert!(!seen.contains(&format!("{:?}", color)));
            seen.push(format!("{:?}", color));
        }
    }
}
