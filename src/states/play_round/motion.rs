//! Fighter motion model
//!
//! Constant-speed "DVD bounce" movement. Each tick: integrate position,
//! reflect off walls with a center-ward boost, clamp speed back into the
//! sustained band, and re-launch any fighter that has stalled. Knockback
//! from combat lands as an additive velocity impulse elsewhere; this system
//! re-normalizes it on the following tick.

use bevy::prelude::*;

use super::components::{Arena, AttackPhase, AttackState, Fighter, GameRng, Motion};
use super::tuning::CombatTuning;
use super::utils::{clamp_speed, dir_towards};

pub fn fighter_motion(
    tuning: Res<CombatTuning>,
    arena: Res<Arena>,
    mut rng: ResMut<GameRng>,
    mut fighters: Query<(&mut Transform, &mut Motion, &AttackState), With<Fighter>>,
) {
    let radius = tuning.fighter_radius;
    let center = arena.center();

    for (mut transform, mut motion, attack) in fighters.iter_mut() {
        if motion.locked {
            continue;
        }

        let mut pos = transform.translation.truncate() + motion.velocity;
        let mut velocity = motion.velocity;
        let mut bounced = false;

        // Reflect off each wall. Shrinking walls can overtake a fighter, so
        // this doubles as the clamp-and-continue path for out-of-range
        // positions.
        if pos.x - radius < arena.min.x {
            pos.x = arena.min.x + radius;
            velocity.x = velocity.x.abs();
            bounced = true;
        } else if pos.x + radius > arena.max.x {
            pos.x = arena.max.x - radius;
            velocity.x = -velocity.x.abs();
            bounced = true;
        }
        if pos.y - radius < arena.min.y {
            pos.y = arena.min.y + radius;
            velocity.y = velocity.y.abs();
            bounced = true;
        } else if pos.y + radius > arena.max.y {
            pos.y = arena.max.y - radius;
            velocity.y = -velocity.y.abs();
            bounced = true;
        }

        if bounced {
            // Nudge toward center so fighters cannot camp a corner.
            velocity += dir_towards(pos, center) * tuning.wall_boost;
        }

        velocity = clamp_speed(velocity, tuning.min_velocity, tuning.max_velocity);

        // Stalled fighters get re-launched in a random direction.
        if velocity.length_squared() < f32::EPSILON {
            velocity = rng.random_dir() * tuning.min_velocity;
        }

        motion.velocity = velocity;
        if attack.phase == AttackPhase::Idle {
            motion.facing = velocity.y.atan2(velocity.x);
        }

        transform.translation.x = pos.x;
        transform.translation.y = pos.y;
    }
}
