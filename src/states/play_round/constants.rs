//! Combat Constants
//!
//! Centralized defaults for the combat engine. Everything here feeds the
//! `#[serde(default)]` fields of [`CombatTuning`](super::tuning::CombatTuning),
//! so a round can override any of these through `assets/config/tuning.ron`
//! without touching code.

// ============================================================================
// Simulation
// ============================================================================

/// Fixed logical tick rate. All timers in the engine count ticks at this rate.
pub const TICK_RATE: u32 = 60;

/// Round time limit in ticks (45 seconds).
pub const ROUND_TIME_LIMIT_TICKS: u32 = 45 * TICK_RATE;

/// Countdown segment length for each of "3", "2", "1" in ticks.
pub const COUNTDOWN_SEGMENT_TICKS: u32 = 45;

/// Length of the "FIGHT" flash at the end of the countdown in ticks.
pub const COUNTDOWN_FIGHT_TICKS: u32 = 30;

// ============================================================================
// Arena
// ============================================================================

/// Arena half-extent on each axis at round start (600x600 total).
pub const ARENA_HALF_EXTENT: f32 = 300.0;

/// Minimum arena half-extent. Shrinking never goes below this.
pub const ARENA_FLOOR_HALF_EXTENT: f32 = 150.0;

/// Center-ward boost added to velocity on every wall bounce, in px/tick.
/// Keeps fighters from camping corners.
pub const WALL_BOOST: f32 = 4.0;

/// Interval of the unconditional periodic arena shrink, in ticks (10s).
pub const PERIODIC_SHRINK_INTERVAL_TICKS: u32 = 10 * TICK_RATE;

/// Distance each wall moves inward on a periodic shrink step, in px.
pub const PERIODIC_SHRINK_STEP: f32 = 12.0;

/// Per-tick inward wall speed while the escalation controller is in
/// RapidShrink, in px/tick per side.
pub const RAPID_SHRINK_SPEED: f32 = 0.3;

// ============================================================================
// Escalation
// ============================================================================

/// Ticks without a resolved hit before the arena pulses (5s).
pub const INACTIVITY_PULSE_TICKS: u32 = 5 * TICK_RATE;

/// Ticks spent in Pulsing before the controller moves on to Warning.
pub const PULSE_TO_WARNING_TICKS: u32 = TICK_RATE;

/// Ticks spent in Warning before RapidShrink begins (3s).
pub const WARNING_TO_SHRINK_TICKS: u32 = 3 * TICK_RATE;

/// How long a landed hit pauses both shrink mechanisms, in ticks (2s).
pub const SHRINK_PAUSE_TICKS: u32 = 2 * TICK_RATE;

/// Extra center-ward velocity applied to both fighters on an arena pulse.
pub const PULSE_BOOST: f32 = 4.0;

/// Speed multiplier applied to both fighters on an arena pulse.
pub const PULSE_SPEED_SCALE: f32 = 1.2;

// ============================================================================
// Fighters
// ============================================================================

/// Starting health for both fighters.
pub const MAX_HEALTH: i32 = 200;

/// Fighter body radius in px.
pub const FIGHTER_RADIUS: f32 = 25.0;

/// Sword length in px, measured from the body edge.
pub const SWORD_LENGTH: f32 = 50.0;

/// Minimum sustained speed in px/tick. The motion model re-accelerates
/// fighters that fall below this.
pub const MIN_VELOCITY: f32 = 6.0;

/// Maximum sustained speed in px/tick. Knockback can exceed this for one
/// tick; the motion model clamps it back on the next.
pub const MAX_VELOCITY: f32 = 16.0;

/// Base damage of a stage-1 basic hit. Stages and skills multiply this.
pub const BASE_DAMAGE: f32 = 10.0;

/// Base knockback impulse of a basic hit, in px/tick.
pub const BASE_KNOCKBACK: f32 = 10.0;

/// Invincibility frames granted on taking a hit.
pub const HIT_IFRAMES: u32 = 10;

/// Hit flash duration in ticks, read by the presentation layer.
pub const HIT_FLASH_TICKS: u32 = 6;

// ============================================================================
// Basic Attacks
// ============================================================================

/// Center-to-center distance at which an idle fighter starts a swing.
pub const ATTACK_TRIGGER_RANGE: f32 = 110.0;

/// Cooldown between swings, in ticks.
pub const ATTACK_COOLDOWN_TICKS: u32 = 18;

/// Windup length before the sword becomes live, in ticks.
pub const ATTACK_WINDUP_TICKS: u32 = 6;

/// Active (live sword) window of every swing, in ticks.
pub const ATTACK_ACTIVE_TICKS: u32 = 12;

/// Recovery after a swing, per combo stage.
pub const ATTACK_RECOVERY_TICKS: [u32; 3] = [10, 14, 20];

/// Half-angle of the swing arc per combo stage, in radians.
/// Stage 1 is a wide sweep, stage 3 a narrow pierce.
pub const COMBO_ARC_HALF_ANGLE: [f32; 3] = [
    60.0 * std::f32::consts::PI / 180.0,
    45.0 * std::f32::consts::PI / 180.0,
    15.0 * std::f32::consts::PI / 180.0,
];

/// Damage multiplier per combo stage.
pub const COMBO_DAMAGE_MULT: [f32; 3] = [1.0, 1.2, 1.5];

/// Reach bonus of the stage-3 pierce, as a fraction of sword length.
pub const PIERCE_REACH_BONUS: f32 = 0.3;

/// Ticks the combo chain survives between landed hits before resetting.
pub const COMBO_TIMEOUT_TICKS: u32 = 45;

/// Padding added to the defender's body radius during sword sampling, in px.
pub const HIT_MARGIN: f32 = 8.0;

/// Fractions of sword length where hit samples are taken.
pub const SWORD_SAMPLE_FRACTIONS: [f32; 3] = [0.5, 0.75, 1.0];

/// Sword-tip distance below which two simultaneous swings clash.
pub const SWORD_CLASH_DISTANCE: f32 = 40.0;

// ============================================================================
// Skill Orbs
// ============================================================================

/// Orb pickup radius in px.
pub const ORB_RADIUS: f32 = 15.0;

/// Minimum distance from the current arena walls when placing an orb.
pub const ORB_SPAWN_MARGIN: f32 = 60.0;

/// Maximum number of uncollected orbs in the arena at once.
pub const MAX_ORBS: usize = 3;

/// Orb spawn interval bounds in ticks (4s to 8s).
pub const ORB_SPAWN_MIN_TICKS: u32 = 4 * TICK_RATE;
pub const ORB_SPAWN_MAX_TICKS: u32 = 8 * TICK_RATE;

/// Chance that an orb rolls Final Flash Draw. The remaining probability is
/// split evenly across the other six kinds.
pub const FINAL_FLASH_CHANCE: f32 = 0.1;

// ============================================================================
// Defense
// ============================================================================

/// Knockback dealt to an attacker whose strike is parried.
pub const PARRY_KNOCKBACK: f32 = 15.0;

/// Extra knockback multiplier when a stage-3 pierce is parried.
pub const PIERCE_PARRY_KNOCKBACK_MULT: f32 = 1.5;

/// Attack cooldown forced on a parried attacker, in ticks.
pub const PARRY_ATTACKER_COOLDOWN_TICKS: u32 = 30;

/// Incoming damage multiplier while recovering from a spin parry.
pub const PARRY_RECOVERY_VULNERABILITY: f32 = 1.3;

// ============================================================================
// Presentation pacing
// ============================================================================

/// Frames of hit-stop requested on a landed hit.
pub const HIT_STOP_TICKS: u32 = 3;

/// Slow-motion factor and duration requested on parries and death.
pub const SLOW_MOTION_FACTOR: f32 = 0.25;
pub const SLOW_MOTION_TICKS: u32 = 45;

/// Screen shake parameters requested on a landed hit.
pub const SCREEN_SHAKE_INTENSITY: f32 = 8.0;
pub const SCREEN_SHAKE_DECAY: f32 = 0.85;
