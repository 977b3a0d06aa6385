//! Arena escalation controller
//!
//! Punishes passivity. Five seconds without a resolved hit pulses both
//! fighters toward center; continued inactivity walks the controller
//! through Warning into RapidShrink, where the walls close in every tick.
//! Independently the arena steps inward every ten seconds regardless of
//! state. Landed hits reset the controller and pause both shrink
//! mechanisms; clashes reset the controller only.

use bevy::prelude::*;

use crate::combat::events::{
    ClashEvent, HitLandedEvent, ShockwaveKind, ShockwaveRequest, SoundId, SoundRequest,
};
use crate::combat::log::{RoundLog, RoundLogEventType};

use super::components::{
    Arena, EscalationController, EscalationState, Fighter, Motion, RoundClock,
};
use super::tuning::CombatTuning;
use super::utils::dir_towards;

pub fn update_escalation(
    clock: Res<RoundClock>,
    tuning: Res<CombatTuning>,
    mut controller: ResMut<EscalationController>,
    mut arena: ResMut<Arena>,
    mut log: ResMut<RoundLog>,
    mut hits: EventReader<HitLandedEvent>,
    mut clashes: EventReader<ClashEvent>,
    mut shockwaves: EventWriter<ShockwaveRequest>,
    mut sounds: EventWriter<SoundRequest>,
    mut fighters: Query<(&Transform, &mut Motion), With<Fighter>>,
) {
    if !clock.combat_enabled() {
        return;
    }

    let hit_this_tick = hits.read().next().is_some();
    let clash_this_tick = clashes.read().next().is_some();

    if hit_this_tick {
        controller.reset_to_stable();
        controller.shrink_pause_ticks = tuning.shrink_pause_ticks;
    } else if clash_this_tick {
        controller.reset_to_stable();
    } else {
        controller.inactivity_ticks += 1;

        match controller.state {
            EscalationState::Stable => {
                if controller.inactivity_ticks >= tuning.inactivity_pulse_ticks {
                    controller.state = EscalationState::Pulsing;
                    controller.state_ticks = 0;
                    arena_pulse(
                        &tuning,
                        &arena,
                        &mut fighters,
                        &mut shockwaves,
                        &mut sounds,
                    );
                    log.log(
                        clock.tick,
                        RoundLogEventType::Escalation,
                        "arena pulses: fighters pushed toward center",
                    );
                }
            }
            EscalationState::Pulsing => {
                controller.state_ticks += 1;
                if controller.state_ticks >= tuning.pulse_to_warning_ticks {
                    controller.state = EscalationState::Warning;
                    controller.state_ticks = 0;
                    log.log(
                        clock.tick,
                        RoundLogEventType::Escalation,
                        "arena warning: shrink imminent",
                    );
                }
            }
            EscalationState::Warning => {
                controller.state_ticks += 1;
                if controller.state_ticks >= tuning.warning_to_shrink_ticks {
                    controller.state = EscalationState::RapidShrink;
                    controller.state_ticks = 0;
                    log.log(
                        clock.tick,
                        RoundLogEventType::Escalation,
                        "arena begins rapid shrink",
                    );
                }
            }
            EscalationState::RapidShrink => {
                controller.state_ticks += 1;
                if controller.shrink_pause_ticks == 0 && !arena.at_floor() {
                    arena.shrink(tuning.rapid_shrink_speed);
                }
            }
        }
    }

    if controller.shrink_pause_ticks > 0 {
        controller.shrink_pause_ticks -= 1;
    } else {
        // The periodic shrink marches on regardless of controller state.
        controller.periodic_ticks += 1;
        if controller.periodic_ticks >= tuning.periodic_shrink_interval_ticks {
            controller.periodic_ticks = 0;
            if !arena.at_floor() {
                arena.shrink(tuning.periodic_shrink_step);
                sounds.send(SoundRequest {
                    sound: SoundId::ArenaShrink,
                });
                log.log(
                    clock.tick,
                    RoundLogEventType::Escalation,
                    format!(
                        "arena steps inward to {:.0}x{:.0}",
                        arena.half_extents().x * 2.0,
                        arena.half_extents().y * 2.0
                    ),
                );
            }
        }
    }
}

/// One-time center-ward boost applied to both fighters when the arena
/// pulses.
fn arena_pulse(
    tuning: &CombatTuning,
    arena: &Arena,
    fighters: &mut Query<(&Transform, &mut Motion), With<Fighter>>,
    shockwaves: &mut EventWriter<ShockwaveRequest>,
    sounds: &mut EventWriter<SoundRequest>,
) {
    let center = arena.center();
    for (transform, mut motion) in fighters.iter_mut() {
        let pos = transform.translation.truncate();
        let boosted =
            (motion.velocity + dir_towards(pos, center) * tuning.pulse_boost)
                * tuning.pulse_speed_scale;
        motion.velocity = boosted;
    }
    shockwaves.send(ShockwaveRequest {
        position: center,
        radius: arena.half_extents().max_element(),
        kind: ShockwaveKind::ArenaPulse,
    });
    sounds.send(SoundRequest {
        sound: SoundId::ArenaPulse,
    });
}
