//! Skill orbs
//!
//! Pickups drift into the arena on a randomized interval. The first fighter
//! whose body overlaps an orb collects it into their skill slot; a fighter
//! already holding or running a skill is refused and the orb stays.

use bevy::prelude::*;

use crate::combat::events::{OrbCollectedEvent, ParticleBurstRequest, SoundId, SoundRequest};
use crate::combat::log::{RoundLog, RoundLogEventType};

use super::components::{
    Arena, Fighter, GameRng, OrbSpawner, PlayRoundEntity, RoundClock, SkillOrb, SkillState,
};
use super::skills::skill_color;
use super::tuning::{CombatTuning, SkillKind};
use super::utils::circles_overlap;

/// Roll an orb kind: rare Final Flash Draw, otherwise uniform across the
/// common six.
pub fn roll_orb_kind(rng: &mut GameRng, final_flash_chance: f32) -> SkillKind {
    if rng.random_f32() < final_flash_chance {
        SkillKind::FinalFlashDraw
    } else {
        let idx = (rng.random_f32() * SkillKind::COMMON.len() as f32) as usize;
        SkillKind::COMMON[idx.min(SkillKind::COMMON.len() - 1)]
    }
}

pub fn spawn_orbs(
    mut commands: Commands,
    clock: Res<RoundClock>,
    tuning: Res<CombatTuning>,
    arena: Res<Arena>,
    mut rng: ResMut<GameRng>,
    mut spawner: ResMut<OrbSpawner>,
    mut log: ResMut<RoundLog>,
    orbs: Query<(), With<SkillOrb>>,
) {
    if !clock.combat_enabled() {
        return;
    }

    if spawner.next_in > 0 {
        spawner.next_in -= 1;
        return;
    }
    spawner.next_in = rng.random_ticks(tuning.orb_spawn_min_ticks, tuning.orb_spawn_max_ticks);

    if orbs.iter().count() >= tuning.max_orbs {
        return;
    }

    let margin = tuning.orb_spawn_margin;
    let pos = Vec2::new(
        rng.random_range(arena.min.x + margin, arena.max.x - margin),
        rng.random_range(arena.min.y + margin, arena.max.y - margin),
    );
    let kind = roll_orb_kind(&mut rng, tuning.final_flash_chance);

    commands.spawn((
        SkillOrb { kind },
        Transform::from_translation(pos.extend(0.0)),
        PlayRoundEntity,
    ));
    log.log(
        clock.tick,
        RoundLogEventType::Orb,
        format!("a {:?} orb appears", kind),
    );
}

pub fn collect_orbs(
    mut commands: Commands,
    clock: Res<RoundClock>,
    tuning: Res<CombatTuning>,
    mut collected: EventWriter<OrbCollectedEvent>,
    mut particles: EventWriter<ParticleBurstRequest>,
    mut sounds: EventWriter<SoundRequest>,
    orbs: Query<(Entity, &Transform, &SkillOrb)>,
    mut fighters: Query<(Entity, &Fighter, &Transform, &mut SkillState)>,
) {
    if !clock.combat_enabled() {
        return;
    }

    // Red is checked first when both fighters touch an orb the same tick.
    let mut order: Vec<_> = fighters.iter_mut().collect();
    order.sort_by_key(|(_, fighter, _, _)| fighter.side != super::components::FighterSide::Red);

    for (orb_entity, orb_transform, orb) in orbs.iter() {
        let orb_pos = orb_transform.translation.truncate();
        for (entity, fighter, transform, skills) in order.iter_mut() {
            let pos = transform.translation.truncate();
            if !circles_overlap(pos, tuning.fighter_radius, orb_pos, tuning.orb_radius) {
                continue;
            }
            // A full slot refuses the pickup rather than overwriting it.
            if skills.grant(orb.kind).is_err() {
                continue;
            }
            commands.entity(orb_entity).despawn();
            collected.send(OrbCollectedEvent {
                fighter: *entity,
                side: fighter.side,
                kind: orb.kind,
            });
            particles.send(ParticleBurstRequest {
                position: orb_pos,
                color: skill_color(orb.kind),
                count: 8,
            });
            sounds.send(SoundRequest {
                sound: SoundId::OrbPickup,
            });
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roll_orb_kind_never_rolls_flash_at_zero_chance() {
        let mut rng = GameRng::from_seed(11);
        for _ in 0..200 {
            assert_ne!(roll_orb_kind(&mut rng, 0.0), SkillKind::FinalFlashDraw);
        }
    }

    #[test]
    fn test_roll_orb_kind_always_flash_at_full_chance() {
        let mut rng = GameRng::from_seed(12);
        for _ in 0..50 {
            assert_eq!(roll_orb_kind(&mut rng, 1.0), SkillKind::FinalFlashDraw);
        }
    }
}
