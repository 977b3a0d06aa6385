//! Combat events
//!
//! Gameplay events produced by the core tick, plus the fire-and-forget
//! side-effect requests the presentation layer drains. Headless mode ignores
//! the requests entirely; nothing in the core ever reads one back.

use bevy::prelude::*;

use crate::states::play_round::components::{FighterSide, RoundOutcome};
use crate::states::play_round::tuning::SkillKind;

/// What produced a strike.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrikeSource {
    /// A basic swing at the given combo stage (1..=3).
    BasicAttack { stage: u8 },
    Skill { kind: SkillKind },
}

impl StrikeSource {
    /// Stage-3 basic attacks get special parry treatment.
    pub fn is_pierce(&self) -> bool {
        matches!(self, StrikeSource::BasicAttack { stage: 3 })
    }

    pub fn describe(&self) -> String {
        match self {
            StrikeSource::BasicAttack { stage } => format!("stage-{} attack", stage),
            StrikeSource::Skill { kind } => format!("{:?}", kind),
        }
    }
}

/// A strike that connected geometrically this tick, before defensive
/// resolution. The defense resolver consumes these and decides shield,
/// parry, clash or damage.
#[derive(Event, Debug, Clone)]
pub struct StrikeAttempt {
    pub attacker: Entity,
    pub defender: Entity,
    pub source: StrikeSource,
    pub damage: f32,
    pub knockback: Vec2,
}

/// A strike that resolved into damage.
#[derive(Event, Debug, Clone)]
pub struct HitLandedEvent {
    pub attacker: Entity,
    pub defender: Entity,
    pub attacker_side: FighterSide,
    pub defender_side: FighterSide,
    pub damage: i32,
    pub source: StrikeSource,
    pub position: Vec2,
}

/// Two offensive effects met and canceled out. Not a hit: no damage, no
/// combo reset on either side.
#[derive(Event, Debug, Clone)]
pub struct ClashEvent {
    pub a: Entity,
    pub b: Entity,
    pub kind: ClashKind,
    pub position: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClashKind {
    SwordOnSword,
    SwordOnSkill { skill: SkillKind },
}

/// A spin parry canceled an incoming strike at its source.
#[derive(Event, Debug, Clone)]
pub struct ParryEvent {
    pub defender: Entity,
    pub attacker: Entity,
    pub defender_side: FighterSide,
    pub source: StrikeSource,
}

/// A shield soaked a strike. Consumes the shield and resets the attacker's
/// combo.
#[derive(Event, Debug, Clone)]
pub struct ShieldAbsorbEvent {
    pub defender: Entity,
    pub attacker: Entity,
    pub defender_side: FighterSide,
    pub source: StrikeSource,
}

#[derive(Event, Debug, Clone)]
pub struct SkillActivatedEvent {
    pub owner: Entity,
    pub side: FighterSide,
    pub kind: SkillKind,
}

#[derive(Event, Debug, Clone)]
pub struct OrbCollectedEvent {
    pub fighter: Entity,
    pub side: FighterSide,
    pub kind: SkillKind,
}

#[derive(Event, Debug, Clone)]
pub struct FighterDeathEvent {
    pub victim: Entity,
    pub victim_side: FighterSide,
}

/// Published exactly once when the round resolves.
#[derive(Event, Debug, Clone)]
pub struct RoundEndedEvent {
    pub outcome: RoundOutcome,
}

/// External command: tear the round down and start it over. Applied only at
/// a tick boundary, so observers never see a half-reset world.
#[derive(Event, Debug, Clone, Default)]
pub struct RoundResetEvent;

// ============================================================================
// Side-effect requests (core -> presentation, fire-and-forget)
// ============================================================================

#[derive(Event, Debug, Clone)]
pub struct ParticleBurstRequest {
    pub position: Vec2,
    pub color: Color,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShockwaveKind {
    GroundSlam,
    ArenaPulse,
}

#[derive(Event, Debug, Clone)]
pub struct ShockwaveRequest {
    pub position: Vec2,
    pub radius: f32,
    pub kind: ShockwaveKind,
}

/// Freeze presentation for a few frames. Logical counters are unaffected.
#[derive(Event, Debug, Clone)]
pub struct HitStopRequest {
    pub ticks: u32,
}

#[derive(Event, Debug, Clone)]
pub struct SlowMotionRequest {
    pub factor: f32,
    pub ticks: u32,
}

#[derive(Event, Debug, Clone)]
pub struct ScreenShakeRequest {
    pub intensity: f32,
    pub decay: f32,
}

/// Sound cues, keyed by event kind. Playback is external.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundId {
    Hit,
    Clash,
    Parry,
    ShieldBreak,
    SkillActivate,
    OrbPickup,
    ArenaPulse,
    ArenaShrink,
    Countdown,
    Death,
    RoundEnd,
}

#[derive(Event, Debug, Clone)]
pub struct SoundRequest {
    pub sound: SoundId,
}
