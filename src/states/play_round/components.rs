//! Components and resources for the combat round.
//!
//! Everything the core tick mutates lives here: the two fighters, the arena,
//! the escalation controller, the round clock, and the per-round RNG. The
//! presentation layer only ever reads these between ticks.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::tuning::SkillKind;

/// Marker for all entities spawned for a round, cleaned up on exit or reset.
#[derive(Component)]
pub struct PlayRoundEntity;

// ============================================================================
// RNG
// ============================================================================

/// Random number generator for combat decisions.
///
/// Seeded for deterministic rounds (headless reproduction, tests), or from
/// entropy for normal play.
#[derive(Resource)]
pub struct GameRng {
    rng: StdRng,
    /// The seed used to initialize this RNG (if deterministic)
    pub seed: Option<u64>,
}

impl GameRng {
    /// Create a new GameRng with a specific seed for deterministic behavior
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    /// Create a new GameRng with random entropy (non-deterministic)
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            seed: None,
        }
    }

    /// Generate a random f32 in the range [0.0, 1.0)
    pub fn random_f32(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Generate a random f32 in the given range
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        min + self.random_f32() * (max - min)
    }

    /// Generate a random u32 in [min, max].
    pub fn random_ticks(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    /// Random unit vector.
    pub fn random_dir(&mut self) -> Vec2 {
        let angle = self.random_range(0.0, std::f32::consts::TAU);
        Vec2::new(angle.cos(), angle.sin())
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

// ============================================================================
// Fighters
// ============================================================================

/// Which side a fighter fights for. Red spawns left, Blue right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FighterSide {
    Red,
    Blue,
}

impl FighterSide {
    pub fn opponent(self) -> FighterSide {
        match self {
            FighterSide::Red => FighterSide::Blue,
            FighterSide::Blue => FighterSide::Red,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FighterSide::Red => "Red",
            FighterSide::Blue => "Blue",
        }
    }
}

/// Core fighter identity and health.
#[derive(Component)]
pub struct Fighter {
    pub side: FighterSide,
    pub health: i32,
    pub max_health: i32,
}

impl Fighter {
    pub fn new(side: FighterSide, max_health: i32) -> Self {
        Self {
            side,
            health: max_health,
            max_health,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }
}

/// Velocity and facing for the bounce motion model.
#[derive(Component)]
pub struct Motion {
    pub velocity: Vec2,
    /// Facing angle in radians. Follows velocity while idle, snaps toward
    /// the opponent when a swing starts.
    pub facing: f32,
    /// While true the motion model neither integrates position nor
    /// re-accelerates a stopped fighter. Set by skills that pin their owner
    /// in place (Final Flash Draw's sheath pose).
    pub locked: bool,
}

impl Motion {
    pub fn new(velocity: Vec2) -> Self {
        let facing = if velocity.length_squared() > f32::EPSILON {
            velocity.y.atan2(velocity.x)
        } else {
            0.0
        };
        Self {
            velocity,
            facing,
            locked: false,
        }
    }
}

/// Basic attack state machine.
///
/// Phases advance Idle -> Windup -> Active -> Recovery -> Idle. `stage` is
/// the current combo stage (0 = no combo, 1..=3 while chaining).
#[derive(Component, Default)]
pub struct AttackState {
    pub phase: AttackPhase,
    pub stage: u8,
    /// Ticks spent in the current phase.
    pub phase_ticks: u32,
    /// Ticks since the last landed hit. Past the combo timeout the stage
    /// resets to 0.
    pub combo_ticks: u32,
    /// Ticks until the next swing may start.
    pub cooldown_ticks: u32,
    /// Recovery length locked in when the swing starts, so a mid-swing
    /// combo reset cannot change it.
    pub swing_recovery: u32,
    /// Set once the current swing has landed; a swing never hits twice.
    pub swing_hit: bool,
    /// Set when the current swing was consumed by a clash or parry, so the
    /// miss path does not also reset the combo.
    pub swing_resolved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttackPhase {
    #[default]
    Idle,
    Windup,
    Active,
    Recovery,
}

/// Defensive bookkeeping: stance published by the skill subsystem, plus
/// i-frame and flash counters.
#[derive(Component)]
pub struct DefenseState {
    pub stance: DefensiveStance,
    pub iframes: u32,
    pub hit_flash: u32,
    /// Incoming damage multiplier, 1.0 normally. Raised during spin parry
    /// recovery.
    pub vulnerability: f32,
}

impl Default for DefenseState {
    fn default() -> Self {
        Self {
            stance: DefensiveStance::None,
            iframes: 0,
            hit_flash: 0,
            vulnerability: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefensiveStance {
    #[default]
    None,
    Shielding,
    Parrying,
}

// ============================================================================
// Skills
// ============================================================================

/// Strictly forward lifecycle of an activated skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SkillPhase {
    Activating,
    Active,
    Resolving,
    Expired,
}

/// Kind-specific mutable state of an activated skill.
#[derive(Debug, Clone, PartialEq)]
pub enum SkillPayload {
    DashSlash {
        /// Direction locked in at activation from the opponent snapshot.
        direction: Vec2,
        hit_landed: bool,
    },
    SpinParry {
        /// Remaining parry window; recovery begins when it hits zero.
        window_left: u32,
        recovery_left: u32,
    },
    GroundSlam {
        /// Landing point captured from the opponent position at activation.
        landing: Vec2,
        /// Set by a clash; halves shockwave damage and radius.
        reduced: bool,
        /// Vertical draw offset for the presentation layer.
        height: f32,
    },
    Shield,
    PhantomCross {
        pending: bool,
    },
    BladeCyclone {
        /// Ticks until the opponent can be struck again.
        rehit_cooldown: u32,
    },
    FinalFlashDraw {
        struck: bool,
    },
}

/// A skill mid-lifecycle. Lives inside [`SkillState`], never as its own
/// component, so activation and expiry stay plain data mutations.
#[derive(Debug, Clone)]
pub struct ActiveSkill {
    pub kind: SkillKind,
    pub phase: SkillPhase,
    /// Ticks since activation.
    pub timer: u32,
    pub payload: SkillPayload,
}

impl ActiveSkill {
    /// Advance the lifecycle phase. Transitions are forward-only; going
    /// backwards is a programming error.
    pub fn advance_phase(&mut self, next: SkillPhase) {
        debug_assert!(
            next >= self.phase,
            "skill phase may not move backwards: {:?} -> {:?}",
            self.phase,
            next
        );
        self.phase = next;
    }
}

/// Returned by [`SkillState::grant`] when the slot is already occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotOccupied;

/// A fighter's single skill slot.
///
/// `held` is a picked-up skill waiting for its trigger; `active` is the
/// running lifecycle. At most one of the two is `Some` at any time.
#[derive(Component, Default)]
pub struct SkillState {
    held: Option<SkillKind>,
    pub active: Option<ActiveSkill>,
}

impl SkillState {
    pub fn held(&self) -> Option<SkillKind> {
        self.held
    }

    /// True when a pickup would be accepted.
    pub fn is_empty(&self) -> bool {
        self.held.is_none() && self.active.is_none()
    }

    /// Guarded grant: refuses while any skill is held or running.
    pub fn grant(&mut self, kind: SkillKind) -> Result<(), SlotOccupied> {
        if !self.is_empty() {
            return Err(SlotOccupied);
        }
        self.held = Some(kind);
        Ok(())
    }

    /// Move the held skill into its active lifecycle.
    ///
    /// Calling this with nothing held is an invalid transition.
    pub fn activate(&mut self, active: ActiveSkill) {
        debug_assert!(
            self.held == Some(active.kind),
            "activated skill {:?} does not match held slot {:?}",
            active.kind,
            self.held
        );
        debug_assert!(
            self.active.is_none(),
            "skill activated while one is running"
        );
        self.held = None;
        self.active = Some(active);
    }

    /// Free the slot once the active lifecycle reached Expired.
    pub fn clear_expired(&mut self) {
        if let Some(active) = &self.active {
            debug_assert!(
                active.phase == SkillPhase::Expired,
                "clearing a skill that has not expired: {:?}",
                active.phase
            );
        }
        self.active = None;
    }
}

/// An uncollected pickup in the arena.
#[derive(Component)]
pub struct SkillOrb {
    pub kind: SkillKind,
}

/// Drives orb spawn timing.
#[derive(Resource)]
pub struct OrbSpawner {
    /// Ticks until the next spawn attempt.
    pub next_in: u32,
}

// ============================================================================
// Arena and escalation
// ============================================================================

/// Rectangular arena bounds. Shrinks inward over the round, never grows,
/// never below the floor.
#[derive(Resource, Debug, Clone)]
pub struct Arena {
    pub min: Vec2,
    pub max: Vec2,
    pub floor_half_extent: f32,
}

impl Arena {
    pub fn new(half_extent: f32, floor_half_extent: f32) -> Self {
        Self {
            min: Vec2::splat(-half_extent),
            max: Vec2::splat(half_extent),
            floor_half_extent,
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    /// Move every wall inward by `amount`, stopping at the floor size.
    pub fn shrink(&mut self, amount: f32) {
        debug_assert!(amount >= 0.0, "arena never grows within a round");
        let center = self.center();
        let half =
            (self.half_extents() - Vec2::splat(amount)).max(Vec2::splat(self.floor_half_extent));
        self.min = center - half;
        self.max = center + half;
    }

    pub fn at_floor(&self) -> bool {
        self.half_extents().x <= self.floor_half_extent + f32::EPSILON
            && self.half_extents().y <= self.floor_half_extent + f32::EPSILON
    }

    /// Clamp a fighter center inside the walls.
    pub fn clamp_inside(&self, point: Vec2, radius: f32) -> Vec2 {
        point.clamp(
            self.min + Vec2::splat(radius),
            self.max - Vec2::splat(radius),
        )
    }
}

/// Inactivity-driven escalation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscalationState {
    Stable,
    Pulsing,
    Warning,
    RapidShrink,
}

#[derive(Resource, Debug, Clone)]
pub struct EscalationController {
    pub state: EscalationState,
    /// Ticks since the last resolved hit.
    pub inactivity_ticks: u32,
    /// Ticks spent in the current non-Stable state.
    pub state_ticks: u32,
    /// While positive, both shrink mechanisms are paused.
    pub shrink_pause_ticks: u32,
    /// Counts up to the periodic shrink interval.
    pub periodic_ticks: u32,
}

impl Default for EscalationController {
    fn default() -> Self {
        Self {
            state: EscalationState::Stable,
            inactivity_ticks: 0,
            state_ticks: 0,
            shrink_pause_ticks: 0,
            periodic_ticks: 0,
        }
    }
}

impl EscalationController {
    /// A resolved hit or clash ends the escalation chain.
    pub fn reset_to_stable(&mut self) {
        self.state = EscalationState::Stable;
        self.inactivity_ticks = 0;
        self.state_ticks = 0;
    }
}

// ============================================================================
// Round flow
// ============================================================================

/// Where the round is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// Pre-fight countdown; fighters drift, combat is disarmed.
    Countdown,
    Fighting,
    /// Past the time limit under the SuddenDeath policy: next hit wins.
    SuddenDeath,
    Ended,
}

/// Logical clock for the round. One core schedule pass advances it by one.
#[derive(Resource)]
pub struct RoundClock {
    pub tick: u32,
    pub phase: RoundPhase,
    /// Ticks remaining in the countdown.
    pub countdown_left: u32,
    /// Ticks spent fighting (excludes countdown).
    pub fight_ticks: u32,
}

impl RoundClock {
    pub fn new(countdown_ticks: u32) -> Self {
        Self {
            tick: 0,
            phase: if countdown_ticks > 0 {
                RoundPhase::Countdown
            } else {
                RoundPhase::Fighting
            },
            countdown_left: countdown_ticks,
            fight_ticks: 0,
        }
    }

    pub fn combat_enabled(&self) -> bool {
        matches!(self.phase, RoundPhase::Fighting | RoundPhase::SuddenDeath)
    }
}

/// Whether Shield may absorb Final Flash Draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FinalFlashShieldPolicy {
    /// Shield absorbs the flash like any other hit.
    #[default]
    Absorbable,
    /// The flash burns through Shield.
    Unabsorbable,
}

/// What happens when the timeout finds both fighters equidistant from
/// center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TieBreakPolicy {
    /// The round ends with no winner.
    #[default]
    Draw,
    /// The round continues; the next landed hit decides it.
    SuddenDeath,
}

/// Per-round rule toggles, fixed before the first tick.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoundPolicies {
    pub final_flash_shield: FinalFlashShieldPolicy,
    pub tie_break: TieBreakPolicy,
}

/// Why a round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    Knockout,
    /// Timeout, decided by distance to arena center.
    Timeout,
    SuddenDeath,
    Draw,
}

/// Published once the round resolves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub winner: Option<FighterSide>,
    pub reason: EndReason,
    pub fight_ticks: u32,
}

/// Holds the outcome once the round has resolved. Presentation and the
/// headless runner read it after the final tick commits.
#[derive(Resource, Default)]
pub struct OutcomeSlot(pub Option<RoundOutcome>);

/// Per-side statistics collected over the round.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SideStats {
    pub damage_dealt: i32,
    pub hits_landed: u32,
    pub skills_used: u32,
    pub orbs_collected: u32,
}

#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoundStats {
    pub red: SideStats,
    pub blue: SideStats,
}

impl RoundStats {
    pub fn side_mut(&mut self, side: FighterSide) -> &mut SideStats {
        match side {
            FighterSide::Red => &mut self.red,
            FighterSide::Blue => &mut self.blue,
        }
    }

    pub fn side(&self, side: FighterSide) -> &SideStats {
        match side {
            FighterSide::Red => &self.red,
            FighterSide::Blue => &self.blue,
        }
    }
}

// ============================================================================
// Pacing
// ============================================================================

/// Gate deciding whether the core schedule advances a tick this frame.
///
/// Graphical mode closes it for pause, hit-stop and slow-motion; headless
/// mode and tests leave it permanently open. Closing the gate never touches
/// logical counters.
#[derive(Resource)]
pub struct TickGate {
    pub open: bool,
}

impl Default for TickGate {
    fn default() -> Self {
        Self { open: true }
    }
}

pub fn tick_gate_open(gate: Res<TickGate>) -> bool {
    gate.open
}

/// Wall-clock pacing state for the presentation layer.
#[derive(Resource, Default)]
pub struct PacingState {
    pub paused: bool,
    /// Frames of hit-stop still to serve.
    pub hit_stop_left: u32,
    /// Remaining slow-motion frames and their factor.
    pub slow_left: u32,
    pub slow_factor: f32,
    /// Fractional tick accumulator while in slow motion.
    pub accumulator: f32,
    /// Current screen shake amplitude, decayed per frame.
    pub shake: f32,
    pub shake_decay: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_slot_refuses_double_grant() {
        let mut slot = SkillState::default();
        assert!(slot.grant(SkillKind::Shield).is_ok());
        assert_eq!(slot.grant(SkillKind::DashSlash), Err(SlotOccupied));
        assert_eq!(slot.held(), Some(SkillKind::Shield));
    }

    #[test]
    fn test_arena_shrink_stops_at_floor() {
        let mut arena = Arena::new(300.0, 150.0);
        arena.shrink(1000.0);
        assert!(arena.at_floor());
        assert!((arena.half_extents().x - 150.0).abs() < 1e-4);
    }

    #[test]
    fn test_arena_clamp_inside() {
        let arena = Arena::new(300.0, 150.0);
        let clamped = arena.clamp_inside(Vec2::new(500.0, -500.0), 25.0);
        assert_eq!(clamped, Vec2::new(275.0, -275.0));
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let mut a = GameRng::from_seed(7);
        let mut b = GameRng::from_seed(7);
        for _ in 0..16 {
            assert_eq!(a.random_f32().to_bits(), b.random_f32().to_bits());
        }
    }
}
