//! Gizmo rendering for the round
//!
//! Everything is drawn with 2D gizmos: the arena walls, both fighters with
//! their swords and stance rings, orbs, and the transient particle and
//! shockwave effects spawned from side-effect events. Purely cosmetic;
//! nothing here feeds back into the core tick.

use bevy::prelude::*;

use crate::combat::events::{ParticleBurstRequest, ShockwaveKind, ShockwaveRequest};

use super::combo::stage_reach;
use super::components::{
    Arena, AttackPhase, AttackState, DefenseState, DefensiveStance, EscalationController,
    EscalationState, Fighter, Motion, PacingState, PlayRoundEntity, RoundClock, SkillOrb,
    SkillPayload, SkillState,
};
use super::defense::side_color;
use super::skills::skill_color;
use super::tuning::CombatTuning;

/// Marker for the round camera, so screen shake finds it.
#[derive(Component)]
pub struct RoundCamera;

/// Short-lived cosmetic spark.
#[derive(Component)]
pub struct Particle {
    pub velocity: Vec2,
    pub life: u32,
    pub life_max: u32,
    pub color: Color,
}

/// Expanding ring drawn for slam impacts and arena pulses.
#[derive(Component)]
pub struct Shockwave {
    pub age: u32,
    pub max_radius: f32,
    pub color: Color,
}

const SHOCKWAVE_LIFETIME: u32 = 20;
const PARTICLE_SPEED: f32 = 4.0;

pub fn spawn_round_camera(commands: &mut Commands) {
    commands.spawn((Camera2d, RoundCamera, PlayRoundEntity));
}

/// Jitter the camera by the current shake amplitude. The offset is derived
/// from elapsed time so it never consumes simulation randomness.
pub fn apply_screen_shake(
    time: Res<Time>,
    pacing: Res<PacingState>,
    mut cameras: Query<&mut Transform, With<RoundCamera>>,
) {
    let t = time.elapsed_secs();
    let offset = if pacing.shake > 0.0 {
        Vec2::new((t * 71.0).sin(), (t * 53.0).cos()) * pacing.shake
    } else {
        Vec2::ZERO
    };
    for mut transform in cameras.iter_mut() {
        transform.translation.x = offset.x;
        transform.translation.y = offset.y;
    }
}

/// Turn fire-and-forget effect requests into transient entities.
pub fn spawn_effects(
    mut commands: Commands,
    mut bursts: EventReader<ParticleBurstRequest>,
    mut shockwaves: EventReader<ShockwaveRequest>,
) {
    for burst in bursts.read() {
        // Deterministic fan: evenly spread directions, staggered speeds.
        for i in 0..burst.count {
            let angle = i as f32 / burst.count.max(1) as f32 * std::f32::consts::TAU;
            let speed = PARTICLE_SPEED * (1.0 + (i % 3) as f32 * 0.4);
            commands.spawn((
                Particle {
                    velocity: Vec2::from_angle(angle) * speed,
                    life: 18,
                    life_max: 18,
                    color: burst.color,
                },
                Transform::from_translation(burst.position.extend(0.0)),
                PlayRoundEntity,
            ));
        }
    }
    for wave in shockwaves.read() {
        let color = match wave.kind {
            ShockwaveKind::GroundSlam => Color::srgb(0.9, 0.6, 0.2),
            ShockwaveKind::ArenaPulse => Color::srgb(0.9, 0.3, 0.3),
        };
        commands.spawn((
            Shockwave {
                age: 0,
                max_radius: wave.radius,
                color,
            },
            Transform::from_translation(wave.position.extend(0.0)),
            PlayRoundEntity,
        ));
    }
}

pub fn update_effects(
    mut commands: Commands,
    mut particles: Query<(Entity, &mut Particle, &mut Transform), Without<Shockwave>>,
    mut shockwaves: Query<(Entity, &mut Shockwave)>,
) {
    for (entity, mut particle, mut transform) in particles.iter_mut() {
        if particle.life == 0 {
            commands.entity(entity).despawn();
            continue;
        }
        particle.life -= 1;
        particle.velocity *= 0.92;
        transform.translation.x += particle.velocity.x;
        transform.translation.y += particle.velocity.y;
    }
    for (entity, mut wave) in shockwaves.iter_mut() {
        wave.age += 1;
        if wave.age > SHOCKWAVE_LIFETIME {
            commands.entity(entity).despawn();
        }
    }
}

pub fn draw_arena(
    mut gizmos: Gizmos,
    arena: Res<Arena>,
    clock: Res<RoundClock>,
    controller: Res<EscalationController>,
) {
    let center = arena.center();
    let size = arena.half_extents() * 2.0;

    let wall_color = match controller.state {
        EscalationState::Warning => {
            // Flash between red and the normal wall color while warning.
            if (clock.tick / 8) % 2 == 0 {
                Color::srgb(1.0, 0.2, 0.2)
            } else {
                Color::srgb(0.6, 0.6, 0.7)
            }
        }
        EscalationState::RapidShrink => Color::srgb(1.0, 0.35, 0.2),
        _ => Color::srgb(0.6, 0.6, 0.7),
    };
    gizmos.rect_2d(Isometry2d::from_translation(center), size, wall_color);

    // Faint outline of the smallest the arena can get.
    gizmos.rect_2d(
        Isometry2d::from_translation(center),
        Vec2::splat(arena.floor_half_extent * 2.0),
        Color::srgba(0.4, 0.4, 0.5, 0.25),
    );
}

pub fn draw_fighters(
    mut gizmos: Gizmos,
    tuning: Res<CombatTuning>,
    fighters: Query<(
        &Fighter,
        &Transform,
        &Motion,
        &AttackState,
        &DefenseState,
        &SkillState,
    )>,
) {
    for (fighter, transform, motion, attack, defense, skills) in fighters.iter() {
        let mut pos = transform.translation.truncate();

        // Ground slam telegraph: the body rises, the landing point stays.
        if let Some(active) = skills.active.as_ref() {
            if let SkillPayload::GroundSlam {
                landing, height, ..
            } = active.payload
            {
                gizmos.circle_2d(
                    Isometry2d::from_translation(landing),
                    tuning.fighter_radius * 1.2,
                    Color::srgba(0.9, 0.5, 0.2, 0.5),
                );
                pos.y += height;
            }
        }

        let body_color = if !fighter.is_alive() {
            Color::srgb(0.3, 0.3, 0.3)
        } else if defense.hit_flash > 0 {
            Color::WHITE
        } else {
            side_color(fighter.side)
        };
        gizmos.circle_2d(
            Isometry2d::from_translation(pos),
            tuning.fighter_radius,
            body_color,
        );

        match defense.stance {
            DefensiveStance::Shielding => {
                gizmos.circle_2d(
                    Isometry2d::from_translation(pos),
                    tuning.fighter_radius + 8.0,
                    Color::srgb(0.3, 0.6, 1.0),
                );
            }
            DefensiveStance::Parrying => {
                gizmos.circle_2d(
                    Isometry2d::from_translation(pos),
                    tuning.fighter_radius + 6.0,
                    Color::srgb(0.2, 0.9, 0.9),
                );
            }
            DefensiveStance::None => {}
        }

        // Skill telegraph ring while a skill is running.
        if let Some(active) = skills.active.as_ref() {
            gizmos.circle_2d(
                Isometry2d::from_translation(pos),
                tuning.fighter_radius + 12.0,
                skill_color(active.kind).with_alpha(0.6),
            );
        }

        draw_sword(&mut gizmos, &tuning, pos, motion.facing, attack);
    }
}

/// Sword line, colored by combo stage and dimmed outside the active window.
fn draw_sword(
    gizmos: &mut Gizmos,
    tuning: &CombatTuning,
    pos: Vec2,
    facing: f32,
    attack: &AttackState,
) {
    let stage_for_color = attack.stage.max(1);
    let stage_color = match stage_for_color {
        1 => Color::srgb(0.9, 0.9, 0.9),
        2 => Color::srgb(1.0, 0.85, 0.3),
        _ => Color::srgb(1.0, 0.35, 0.25),
    };
    let (color, reach) = match attack.phase {
        AttackPhase::Idle => (
            Color::srgba(0.7, 0.7, 0.7, 0.5),
            tuning.sword_length,
        ),
        AttackPhase::Windup => (
            stage_color.with_alpha(0.5),
            stage_reach(tuning, stage_for_color),
        ),
        AttackPhase::Active => (stage_color, stage_reach(tuning, stage_for_color)),
        AttackPhase::Recovery => (
            Color::srgba(0.5, 0.5, 0.5, 0.5),
            tuning.sword_length,
        ),
    };
    let dir = Vec2::from_angle(facing);
    let base = pos + dir * tuning.fighter_radius;
    gizmos.line_2d(base, base + dir * reach, color);
}

pub fn draw_orbs(
    mut gizmos: Gizmos,
    clock: Res<RoundClock>,
    tuning: Res<CombatTuning>,
    orbs: Query<(&Transform, &SkillOrb)>,
) {
    let pulse = 1.0 + 0.15 * (clock.tick as f32 * 0.1).sin();
    for (transform, orb) in orbs.iter() {
        let pos = transform.translation.truncate();
        let color = skill_color(orb.kind);
        gizmos.circle_2d(
            Isometry2d::from_translation(pos),
            tuning.orb_radius * pulse,
            color,
        );
        gizmos.circle_2d(
            Isometry2d::from_translation(pos),
            tuning.orb_radius * 0.4,
            Color::WHITE,
        );
    }
}

pub fn draw_effects(
    mut gizmos: Gizmos,
    particles: Query<(&Particle, &Transform)>,
    shockwaves: Query<(&Shockwave, &Transform)>,
) {
    for (particle, transform) in particles.iter() {
        let fade = particle.life as f32 / particle.life_max.max(1) as f32;
        gizmos.circle_2d(
            Isometry2d::from_translation(transform.translation.truncate()),
            2.0 + fade * 2.0,
            particle.color.with_alpha(fade),
        );
    }
    for (wave, transform) in shockwaves.iter() {
        let progress = wave.age as f32 / SHOCKWAVE_LIFETIME as f32;
        gizmos.circle_2d(
            Isometry2d::from_translation(transform.translation.truncate()),
            wave.max_radius * progress,
            wave.color.with_alpha(1.0 - progress),
        );
    }
}
