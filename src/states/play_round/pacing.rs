//! Wall-clock pacing
//!
//! Translates hit-stop, slow-motion and pause into the tick gate. The gate
//! decides whether the core schedule advances a logical tick this frame;
//! closing it stretches presentation time without ever touching logical
//! counters. Headless mode never runs this system, so its gate stays open.

use bevy::prelude::*;

use crate::combat::events::{HitStopRequest, ScreenShakeRequest, SlowMotionRequest};

use super::components::{PacingState, TickGate};

pub fn update_pacing(
    mut pacing: ResMut<PacingState>,
    mut gate: ResMut<TickGate>,
    mut hit_stops: EventReader<HitStopRequest>,
    mut slow_motions: EventReader<SlowMotionRequest>,
    mut shakes: EventReader<ScreenShakeRequest>,
) {
    for request in hit_stops.read() {
        pacing.hit_stop_left = pacing.hit_stop_left.max(request.ticks);
    }
    for request in slow_motions.read() {
        pacing.slow_left = pacing.slow_left.max(request.ticks);
        pacing.slow_factor = request.factor;
    }
    for request in shakes.read() {
        pacing.shake = pacing.shake.max(request.intensity);
        pacing.shake_decay = request.decay;
    }

    pacing.shake *= pacing.shake_decay;
    if pacing.shake < 0.05 {
        pacing.shake = 0.0;
    }

    gate.open = advance_gate(&mut pacing);
}

/// One frame of gate arbitration. Pause beats hit-stop beats slow motion;
/// slow motion accumulates fractional ticks until a whole one is due.
fn advance_gate(pacing: &mut PacingState) -> bool {
    if pacing.paused {
        return false;
    }
    if pacing.hit_stop_left > 0 {
        pacing.hit_stop_left -= 1;
        return false;
    }
    if pacing.slow_left > 0 {
        pacing.slow_left -= 1;
        pacing.accumulator += pacing.slow_factor;
        if pacing.accumulator >= 1.0 {
            pacing.accumulator -= 1.0;
            return true;
        }
        return false;
    }
    pacing.accumulator = 0.0;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_open_by_default() {
        let mut pacing = PacingState::default();
        assert!(advance_gate(&mut pacing));
    }

    #[test]
    fn test_pause_closes_gate() {
        let mut pacing = PacingState {
            paused: true,
            ..Default::default()
        };
        assert!(!advance_gate(&mut pacing));
    }

    #[test]
    fn test_hit_stop_serves_exact_frames() {
        let mut pacing = PacingState {
            hit_stop_left: 3,
            ..Default::default()
        };
        assert!(!advance_gate(&mut pacing));
        assert!(!advance_gate(&mut pacing));
        assert!(!advance_gate(&mut pacing));
        assert!(advance_gate(&mut pacing));
    }

    #[test]
    fn test_slow_motion_quarter_speed() {
        let mut pacing = PacingState {
            slow_left: 8,
            slow_factor: 0.25,
            ..Default::default()
        };
        let ticks = (0..8).filter(|_| advance_gate(&mut pacing)).count();
        assert_eq!(ticks, 2);
        // Back to full speed once the window runs out.
        assert!(advance_gate(&mut pacing));
    }
}
