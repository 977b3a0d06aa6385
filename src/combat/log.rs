//! Round log
//!
//! Structured, tick-stamped record of everything that happened in a round.
//! The HUD shows the recent tail, headless mode serializes the whole log
//! into the round result JSON.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::events::*;
use crate::states::play_round::components::{EndReason, RoundClock, RoundStats};

/// Category tag for log entries, used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundLogEventType {
    Hit,
    Clash,
    Parry,
    Shield,
    Skill,
    Orb,
    Escalation,
    RoundFlow,
    Death,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundLogEntry {
    /// Logical tick the entry was recorded at.
    pub tick: u32,
    pub event_type: RoundLogEventType,
    pub message: String,
}

/// Append-only log of round events.
#[derive(Resource, Default)]
pub struct RoundLog {
    entries: Vec<RoundLogEntry>,
}

impl RoundLog {
    pub fn log(&mut self, tick: u32, event_type: RoundLogEventType, message: impl Into<String>) {
        self.entries.push(RoundLogEntry {
            tick,
            event_type,
            message: message.into(),
        });
    }

    pub fn entries(&self) -> &[RoundLogEntry] {
        &self.entries
    }

    pub fn filter_by_type(&self, event_type: RoundLogEventType) -> Vec<&RoundLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// The most recent `count` entries, oldest first.
    pub fn recent(&self, count: usize) -> &[RoundLogEntry] {
        let start = self.entries.len().saturating_sub(count);
        &self.entries[start..]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Drain this tick's gameplay events into the log and the per-side stats.
///
/// Runs at the end of the core tick, after defense resolution, so entries
/// reflect committed state.
pub fn record_round_events(
    clock: Res<RoundClock>,
    mut log: ResMut<RoundLog>,
    mut stats: ResMut<RoundStats>,
    mut hits: EventReader<HitLandedEvent>,
    mut clashes: EventReader<ClashEvent>,
    mut parries: EventReader<ParryEvent>,
    mut absorbs: EventReader<ShieldAbsorbEvent>,
    mut skills: EventReader<SkillActivatedEvent>,
    mut orbs: EventReader<OrbCollectedEvent>,
    mut deaths: EventReader<FighterDeathEvent>,
    mut round_ends: EventReader<RoundEndedEvent>,
) {
    let tick = clock.tick;

    for hit in hits.read() {
        let side = stats.side_mut(hit.attacker_side);
        side.damage_dealt += hit.damage;
        side.hits_landed += 1;
        log.log(
            tick,
            RoundLogEventType::Hit,
            format!(
                "{} hit {} with {} for {}",
                hit.attacker_side.label(),
                hit.defender_side.label(),
                hit.source.describe(),
                hit.damage
            ),
        );
    }

    for clash in clashes.read() {
        let what = match clash.kind {
            ClashKind::SwordOnSword => "swords clashed".to_string(),
            ClashKind::SwordOnSkill { skill } => format!("sword clashed with {:?}", skill),
        };
        log.log(tick, RoundLogEventType::Clash, what);
    }

    for parry in parries.read() {
        log.log(
            tick,
            RoundLogEventType::Parry,
            format!(
                "{} parried {}",
                parry.defender_side.label(),
                parry.source.describe()
            ),
        );
    }

    for absorb in absorbs.read() {
        log.log(
            tick,
            RoundLogEventType::Shield,
            format!(
                "{}'s shield absorbed {}",
                absorb.defender_side.label(),
                absorb.source.describe()
            ),
        );
    }

    for skill in skills.read() {
        stats.side_mut(skill.side).skills_used += 1;
        log.log(
            tick,
            RoundLogEventType::Skill,
            format!("{} activated {:?}", skill.side.label(), skill.kind),
        );
    }

    for orb in orbs.read() {
        stats.side_mut(orb.side).orbs_collected += 1;
        log.log(
            tick,
            RoundLogEventType::Orb,
            format!("{} picked up {:?}", orb.side.label(), orb.kind),
        );
    }

    for death in deaths.read() {
        log.log(
            tick,
            RoundLogEventType::Death,
            format!("{} was defeated", death.victim_side.label()),
        );
    }

    for end in round_ends.read() {
        let message = match (end.outcome.winner, end.outcome.reason) {
            (Some(winner), EndReason::Knockout) => {
                format!("{} wins by knockout", winner.label())
            }
            (Some(winner), EndReason::Timeout) => {
                format!("{} wins on proximity at the bell", winner.label())
            }
            (Some(winner), EndReason::SuddenDeath) => {
                format!("{} wins in sudden death", winner.label())
            }
            (_, _) => "round ends in a draw".to_string(),
        };
        log.log(tick, RoundLogEventType::RoundFlow, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_and_recent() {
        let mut log = RoundLog::default();
        log.log(1, RoundLogEventType::Hit, "first");
        log.log(2, RoundLogEventType::Clash, "second");
        log.log(3, RoundLogEventType::Hit, "third");

        assert_eq!(log.len(), 3);
        assert_eq!(log.filter_by_type(RoundLogEventType::Hit).len(), 2);

        let recent = log.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].message, "second");
        assert_eq!(recent[1].message, "third");
    }

    #[test]
    fn test_log_clear() {
        let mut log = RoundLog::default();
        log.log(1, RoundLogEventType::RoundFlow, "countdown");
        log.clear();
        assert!(log.is_empty());
    }
}
