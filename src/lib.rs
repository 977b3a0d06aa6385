//! DuelSim - Bouncing Sword Duel Simulator
//!
//! Two autonomous fighters carom around a shrinking square arena and fence
//! whenever their paths cross: three-stage combo chains, seven pickup
//! skills, a shield / parry / clash defense ladder, and an arena that
//! punishes passivity.
//!
//! This library exposes the core game modules for testing and reuse.

pub mod cli;
pub mod combat;
pub mod headless;
pub mod states;

// Re-export commonly used types
pub use combat::log::{RoundLog, RoundLogEventType};
pub use headless::{HeadlessRoundConfig, RoundResult};
pub use states::play_round::{
    CombatTuning, EndReason, FighterSide, RoundOutcome, RoundPolicies, SkillDefinitions, SkillKind,
};
