//! Combat tuning configuration
//!
//! All balance numbers live in `assets/config/tuning.ron` and are loaded into
//! two resources at startup: [`CombatTuning`] (motion, combo, arena and
//! escalation numbers) and [`SkillDefinitions`] (the static per-kind skill
//! table). Systems never read ambient globals; they take these resources as
//! parameters, so tests can run several simulations with independent tuning.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::constants::*;

/// The seven skill kinds a fighter can pick up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillKind {
    DashSlash,
    SpinParry,
    GroundSlam,
    Shield,
    PhantomCross,
    BladeCyclone,
    FinalFlashDraw,
}

impl SkillKind {
    /// All kinds, in orb-roll order. Final Flash Draw is last and handled
    /// separately by the rarity roll.
    pub const ALL: [SkillKind; 7] = [
        SkillKind::DashSlash,
        SkillKind::SpinParry,
        SkillKind::GroundSlam,
        SkillKind::Shield,
        SkillKind::PhantomCross,
        SkillKind::BladeCyclone,
        SkillKind::FinalFlashDraw,
    ];

    /// The six kinds eligible for the common orb roll.
    pub const COMMON: [SkillKind; 6] = [
        SkillKind::DashSlash,
        SkillKind::SpinParry,
        SkillKind::GroundSlam,
        SkillKind::Shield,
        SkillKind::PhantomCross,
        SkillKind::BladeCyclone,
    ];
}

/// Motion, combo, arena and escalation tuning.
///
/// `#[serde(default)]` at the container level means the RON file only has to
/// spell out overrides; anything missing falls back to the defaults in
/// [`constants`](super::constants).
#[derive(Debug, Clone, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct CombatTuning {
    // Fighters
    pub max_health: i32,
    pub fighter_radius: f32,
    pub sword_length: f32,
    pub min_velocity: f32,
    pub max_velocity: f32,
    pub base_damage: f32,
    pub base_knockback: f32,
    pub hit_iframes: u32,
    pub hit_flash_ticks: u32,

    // Basic attacks
    pub attack_trigger_range: f32,
    pub attack_cooldown_ticks: u32,
    pub attack_windup_ticks: u32,
    pub attack_active_ticks: u32,
    pub attack_recovery_ticks: [u32; 3],
    pub combo_arc_half_angle: [f32; 3],
    pub combo_damage_mult: [f32; 3],
    pub pierce_reach_bonus: f32,
    pub combo_timeout_ticks: u32,
    pub hit_margin: f32,
    pub sword_clash_distance: f32,

    // Arena
    pub arena_half_extent: f32,
    pub arena_floor_half_extent: f32,
    pub wall_boost: f32,

    // Escalation
    pub inactivity_pulse_ticks: u32,
    pub pulse_to_warning_ticks: u32,
    pub warning_to_shrink_ticks: u32,
    pub shrink_pause_ticks: u32,
    pub rapid_shrink_speed: f32,
    pub periodic_shrink_interval_ticks: u32,
    pub periodic_shrink_step: f32,
    pub pulse_boost: f32,
    pub pulse_speed_scale: f32,

    // Round flow
    pub round_time_limit_ticks: u32,
    pub countdown_segment_ticks: u32,
    pub countdown_fight_ticks: u32,

    // Orbs
    pub orb_radius: f32,
    pub orb_spawn_margin: f32,
    pub max_orbs: usize,
    pub orb_spawn_min_ticks: u32,
    pub orb_spawn_max_ticks: u32,
    pub final_flash_chance: f32,

    // Defense
    pub parry_knockback: f32,
    pub pierce_parry_knockback_mult: f32,
    pub parry_attacker_cooldown_ticks: u32,
    pub parry_recovery_vulnerability: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            max_health: MAX_HEALTH,
            fighter_radius: FIGHTER_RADIUS,
            sword_length: SWORD_LENGTH,
            min_velocity: MIN_VELOCITY,
            max_velocity: MAX_VELOCITY,
            base_damage: BASE_DAMAGE,
            base_knockback: BASE_KNOCKBACK,
            hit_iframes: HIT_IFRAMES,
            hit_flash_ticks: HIT_FLASH_TICKS,
            attack_trigger_range: ATTACK_TRIGGER_RANGE,
            attack_cooldown_ticks: ATTACK_COOLDOWN_TICKS,
            attack_windup_ticks: ATTACK_WINDUP_TICKS,
            attack_active_ticks: ATTACK_ACTIVE_TICKS,
            attack_recovery_ticks: ATTACK_RECOVERY_TICKS,
            combo_arc_half_angle: COMBO_ARC_HALF_ANGLE,
            combo_damage_mult: COMBO_DAMAGE_MULT,
            pierce_reach_bonus: PIERCE_REACH_BONUS,
            combo_timeout_ticks: COMBO_TIMEOUT_TICKS,
            hit_margin: HIT_MARGIN,
            sword_clash_distance: SWORD_CLASH_DISTANCE,
            arena_half_extent: ARENA_HALF_EXTENT,
            arena_floor_half_extent: ARENA_FLOOR_HALF_EXTENT,
            wall_boost: WALL_BOOST,
            inactivity_pulse_ticks: INACTIVITY_PULSE_TICKS,
            pulse_to_warning_ticks: PULSE_TO_WARNING_TICKS,
            warning_to_shrink_ticks: WARNING_TO_SHRINK_TICKS,
            shrink_pause_ticks: SHRINK_PAUSE_TICKS,
            rapid_shrink_speed: RAPID_SHRINK_SPEED,
            periodic_shrink_interval_ticks: PERIODIC_SHRINK_INTERVAL_TICKS,
            periodic_shrink_step: PERIODIC_SHRINK_STEP,
            pulse_boost: PULSE_BOOST,
            pulse_speed_scale: PULSE_SPEED_SCALE,
            round_time_limit_ticks: ROUND_TIME_LIMIT_TICKS,
            countdown_segment_ticks: COUNTDOWN_SEGMENT_TICKS,
            countdown_fight_ticks: COUNTDOWN_FIGHT_TICKS,
            orb_radius: ORB_RADIUS,
            orb_spawn_margin: ORB_SPAWN_MARGIN,
            max_orbs: MAX_ORBS,
            orb_spawn_min_ticks: ORB_SPAWN_MIN_TICKS,
            orb_spawn_max_ticks: ORB_SPAWN_MAX_TICKS,
            final_flash_chance: FINAL_FLASH_CHANCE,
            parry_knockback: PARRY_KNOCKBACK,
            pierce_parry_knockback_mult: PIERCE_PARRY_KNOCKBACK_MULT,
            parry_attacker_cooldown_ticks: PARRY_ATTACKER_COOLDOWN_TICKS,
            parry_recovery_vulnerability: PARRY_RECOVERY_VULNERABILITY,
        }
    }
}

impl CombatTuning {
    /// Sanity-check ranges that would silently break the simulation.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_velocity <= 0.0 || self.max_velocity < self.min_velocity {
            return Err(format!(
                "velocity bounds invalid: min {} max {}",
                self.min_velocity, self.max_velocity
            ));
        }
        if self.arena_floor_half_extent > self.arena_half_extent {
            return Err(format!(
                "arena floor {} exceeds starting extent {}",
                self.arena_floor_half_extent, self.arena_half_extent
            ));
        }
        if self.max_health <= 0 {
            return Err("max_health must be positive".to_string());
        }
        if !(0.0..=1.0).contains(&self.final_flash_chance) {
            return Err(format!(
                "final_flash_chance {} outside [0, 1]",
                self.final_flash_chance
            ));
        }
        if self.attack_active_ticks == 0 {
            return Err("attack_active_ticks must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Static per-kind skill tuning. One entry per [`SkillKind`]; the RON file
/// lists all seven, and `validate` refuses to start without them.
///
/// Fields not used by a given kind stay at their zero defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDef {
    pub name: String,
    /// Center-to-center distance at which the held skill auto-activates.
    #[serde(default = "default_activation_range")]
    pub activation_range: f32,
    /// Total lifecycle length in ticks, from activation to slot release.
    pub duration_ticks: u32,
    #[serde(default = "default_mult")]
    pub damage_mult: f32,
    #[serde(default = "default_mult")]
    pub knockback_mult: f32,
    /// Whether a basic attack meeting this skill's active frames clashes
    /// instead of trading damage. Final Flash Draw sets this false.
    #[serde(default = "default_clashable")]
    pub clashable: bool,

    // Dash Slash
    #[serde(default)]
    pub dash_speed: f32,

    // Spin Parry
    #[serde(default)]
    pub parry_window_ticks: u32,
    #[serde(default)]
    pub parry_radius: f32,
    #[serde(default)]
    pub recovery_ticks: u32,
    /// Shortened recovery when the spin is dissipated by a clash.
    #[serde(default)]
    pub clash_recovery_ticks: u32,

    // Ground Slam / Final Flash Draw pose
    #[serde(default)]
    pub rise_ticks: u32,
    #[serde(default)]
    pub impact_tick: u32,
    #[serde(default)]
    pub shockwave_radius: f32,

    // Phantom Cross
    #[serde(default)]
    pub teleport_distance: f32,
    #[serde(default)]
    pub slash_tick: u32,
    #[serde(default)]
    pub strike_tick: u32,
    #[serde(default)]
    pub hit_range: f32,

    // Blade Cyclone
    #[serde(default)]
    pub hit_interval_ticks: u32,
    #[serde(default)]
    pub pull_radius: f32,
    #[serde(default)]
    pub pull_strength: f32,
    #[serde(default)]
    pub release_radius: f32,
    #[serde(default)]
    pub release_knockback: f32,
    /// Owner pushback when a basic swing clashes into the spin.
    #[serde(default)]
    pub clash_pushback: f32,
}

fn default_activation_range() -> f32 {
    ATTACK_TRIGGER_RANGE
}

fn default_mult() -> f32 {
    1.0
}

fn default_clashable() -> bool {
    true
}

/// Root structure of the tuning.ron file.
#[derive(Debug, Serialize, Deserialize)]
pub struct TuningFile {
    #[serde(default)]
    pub combat: CombatTuning,
    pub skills: HashMap<SkillKind, SkillDef>,
}

/// Resource holding the validated skill table.
///
/// Access via `Res<SkillDefinitions>`; use `get_unchecked` in systems since
/// the table is complete after startup validation.
#[derive(Resource, Clone)]
pub struct SkillDefinitions {
    definitions: HashMap<SkillKind, SkillDef>,
}

impl Default for SkillDefinitions {
    /// Load the skill table from the default config file.
    /// Panics if the file cannot be loaded - use for tests only.
    fn default() -> Self {
        load_tuning()
            .expect("Failed to load tuning in Default impl")
            .1
    }
}

impl SkillDefinitions {
    pub fn new(definitions: HashMap<SkillKind, SkillDef>) -> Self {
        Self { definitions }
    }

    pub fn get(&self, kind: SkillKind) -> Option<&SkillDef> {
        self.definitions.get(&kind)
    }

    /// Get a kind's definition, panicking if absent. Safe after startup
    /// validation has confirmed the table is complete.
    pub fn get_unchecked(&self, kind: SkillKind) -> &SkillDef {
        self.definitions
            .get(&kind)
            .unwrap_or_else(|| panic!("Skill {:?} not found in definitions", kind))
    }

    /// Check the table covers every kind and that each kind carries the
    /// fields its behavior depends on.
    pub fn validate(&self) -> Result<(), String> {
        let missing: Vec<SkillKind> = SkillKind::ALL
            .into_iter()
            .filter(|kind| !self.definitions.contains_key(kind))
            .collect();
        if !missing.is_empty() {
            return Err(format!("Missing skill definitions: {:?}", missing));
        }

        for (kind, def) in &self.definitions {
            if def.duration_ticks == 0 {
                return Err(format!("{:?}: duration_ticks must be positive", kind));
            }
            let field_err = |field: &str| format!("{:?}: {} must be positive", kind, field);
            match kind {
                SkillKind::DashSlash => {
                    if def.dash_speed <= 0.0 {
                        return Err(field_err("dash_speed"));
                    }
                }
                SkillKind::SpinParry => {
                    if def.parry_window_ticks == 0 {
                        return Err(field_err("parry_window_ticks"));
                    }
                    if def.parry_radius <= 0.0 {
                        return Err(field_err("parry_radius"));
                    }
                    if def.clash_recovery_ticks == 0 {
                        return Err(field_err("clash_recovery_ticks"));
                    }
                }
                SkillKind::GroundSlam => {
                    if def.impact_tick == 0 || def.impact_tick >= def.duration_ticks {
                        return Err(format!(
                            "{:?}: impact_tick must fall inside the duration",
                            kind
                        ));
                    }
                    if def.shockwave_radius <= 0.0 {
                        return Err(field_err("shockwave_radius"));
                    }
                }
                SkillKind::PhantomCross => {
                    if def.strike_tick == 0 || def.strike_tick >= def.duration_ticks {
                        return Err(format!(
                            "{:?}: strike_tick must fall inside the duration",
                            kind
                        ));
                    }
                    if def.hit_range <= 0.0 {
                        return Err(field_err("hit_range"));
                    }
                }
                SkillKind::BladeCyclone => {
                    if def.hit_interval_ticks == 0 {
                        return Err(field_err("hit_interval_ticks"));
                    }
                    if def.hit_range <= 0.0 {
                        return Err(field_err("hit_range"));
                    }
                    if def.clash_pushback <= 0.0 {
                        return Err(field_err("clash_pushback"));
                    }
                }
                SkillKind::FinalFlashDraw => {
                    if def.strike_tick == 0 || def.strike_tick >= def.duration_ticks {
                        return Err(format!(
                            "{:?}: strike_tick must fall inside the duration",
                            kind
                        ));
                    }
                    if def.clashable {
                        return Err(format!("{:?}: must not be clashable", kind));
                    }
                }
                SkillKind::Shield => {}
            }
        }
        Ok(())
    }

    pub fn kinds(&self) -> impl Iterator<Item = &SkillKind> {
        self.definitions.keys()
    }
}

/// Load and validate tuning from assets/config/tuning.ron.
pub fn load_tuning() -> Result<(CombatTuning, SkillDefinitions), String> {
    load_tuning_from(std::path::Path::new("assets/config/tuning.ron"))
}

/// Load and validate tuning from an explicit path.
pub fn load_tuning_from(
    path: &std::path::Path,
) -> Result<(CombatTuning, SkillDefinitions), String> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    let file: TuningFile = ron::from_str(&contents)
        .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;

    file.combat.validate()?;
    let definitions = SkillDefinitions::new(file.skills);
    definitions.validate()?;

    info!(
        "Loaded combat tuning and {} skill definitions from {}",
        SkillKind::ALL.len(),
        path.display()
    );

    Ok((file.combat, definitions))
}

/// Bevy plugin loading tuning at startup.
pub struct TuningPlugin;

impl Plugin for TuningPlugin {
    fn build(&self, app: &mut App) {
        match load_tuning() {
            Ok((tuning, definitions)) => {
                app.insert_resource(tuning);
                app.insert_resource(definitions);
            }
            Err(e) => {
                // Tuning must be valid before the first tick runs.
                panic!("Failed to load combat tuning: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tuning_is_valid() {
        assert!(CombatTuning::default().validate().is_ok());
    }

    #[test]
    fn test_tuning_rejects_inverted_velocity_bounds() {
        let tuning = CombatTuning {
            min_velocity: 20.0,
            max_velocity: 10.0,
            ..Default::default()
        };
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_skill_table_rejects_missing_kind() {
        let definitions = SkillDefinitions::new(HashMap::new());
        let err = definitions.validate().unwrap_err();
        assert!(err.contains("Missing skill definitions"));
    }

    #[test]
    fn test_shipped_skill_table_carries_clash_tuning() {
        let defs = SkillDefinitions::default();
        assert!(defs.validate().is_ok());
        assert!(defs.get_unchecked(SkillKind::SpinParry).clash_recovery_ticks > 0);
        assert!(defs.get_unchecked(SkillKind::BladeCyclone).clash_pushback > 0.0);
    }
}
