//! Combat event and logging infrastructure.

pub mod events;
pub mod log;

use bevy::prelude::*;

use events::*;
use log::RoundLog;

/// Registers every combat event plus the round log resource. The systems
/// that produce and drain these are wired up by the play_round schedule.
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RoundLog>()
            .add_event::<StrikeAttempt>()
            .add_event::<HitLandedEvent>()
            .add_event::<ClashEvent>()
            .add_event::<ParryEvent>()
            .add_event::<ShieldAbsorbEvent>()
            .add_event::<SkillActivatedEvent>()
            .add_event::<OrbCollectedEvent>()
            .add_event::<FighterDeathEvent>()
            .add_event::<RoundEndedEvent>()
            .add_event::<RoundResetEvent>()
            .add_event::<ParticleBurstRequest>()
            .add_event::<ShockwaveRequest>()
            .add_event::<HitStopRequest>()
            .add_event::<SlowMotionRequest>()
            .add_event::<ScreenShakeRequest>()
            .add_event::<SoundRequest>();
    }
}
