//! JSON configuration parsing for headless mode
//!
//! Parses JSON round configurations into the engine's policy and tuning
//! inputs.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::states::play_round::{FinalFlashShieldPolicy, RoundPolicies, TieBreakPolicy};

/// Headless round configuration loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlessRoundConfig {
    /// Shield behavior against Final Flash Draw: "Absorbable" or
    /// "Unabsorbable" (default: "Absorbable")
    #[serde(default = "default_final_flash_shield")]
    pub final_flash_shield: String,
    /// Timeout tie-break when both fighters are equidistant: "Draw" or
    /// "SuddenDeath" (default: "Draw")
    #[serde(default = "default_tie_break")]
    pub tie_break: String,
    /// Alternate tuning file (default: the bundled assets/config/tuning.ron)
    #[serde(default)]
    pub tuning_path: Option<String>,
    /// Custom output path for the round result JSON (optional)
    #[serde(default)]
    pub output_path: Option<String>,
    /// Safety cap on round duration in seconds (default: 120)
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f32,
    /// Random seed for deterministic round reproduction
    #[serde(default)]
    pub random_seed: Option<u64>,
}

fn default_final_flash_shield() -> String {
    "Absorbable".to_string()
}

fn default_tie_break() -> String {
    "Draw".to_string()
}

fn default_max_duration() -> f32 {
    120.0
}

impl Default for HeadlessRoundConfig {
    fn default() -> Self {
        Self {
            final_flash_shield: default_final_flash_shield(),
            tie_break: default_tie_break(),
            tuning_path: None,
            output_path: None,
            max_duration_secs: default_max_duration(),
            random_seed: None,
        }
    }
}

impl HeadlessRoundConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: HeadlessRoundConfig = serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse JSON: {}", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        Self::parse_final_flash_shield(&self.final_flash_shield)?;
        Self::parse_tie_break(&self.tie_break)?;

        if self.max_duration_secs <= 0.0 {
            return Err("max_duration_secs must be positive".to_string());
        }

        Ok(())
    }

    fn parse_final_flash_shield(name: &str) -> Result<FinalFlashShieldPolicy, String> {
        match name {
            "Absorbable" => Ok(FinalFlashShieldPolicy::Absorbable),
            "Unabsorbable" => Ok(FinalFlashShieldPolicy::Unabsorbable),
            _ => Err(format!(
                "Unknown final_flash_shield policy: '{}'. Valid values: Absorbable, Unabsorbable",
                name
            )),
        }
    }

    fn parse_tie_break(name: &str) -> Result<TieBreakPolicy, String> {
        match name {
            "Draw" => Ok(TieBreakPolicy::Draw),
            "SuddenDeath" => Ok(TieBreakPolicy::SuddenDeath),
            _ => Err(format!(
                "Unknown tie_break policy: '{}'. Valid values: Draw, SuddenDeath",
                name
            )),
        }
    }

    /// Convert to the engine's policy resource
    pub fn to_round_policies(&self) -> Result<RoundPolicies, String> {
        Ok(RoundPolicies {
            final_flash_shield: Self::parse_final_flash_shield(&self.final_flash_shield)?,
            tie_break: Self::parse_tie_break(&self.tie_break)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = HeadlessRoundConfig::default();
        assert!(config.validate().is_ok());
        let policies = config.to_round_policies().unwrap();
        assert_eq!(
            policies.final_flash_shield,
            FinalFlashShieldPolicy::Absorbable
        );
        assert_eq!(policies.tie_break, TieBreakPolicy::Draw);
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let config = HeadlessRoundConfig {
            tie_break: "CoinFlip".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_json_defaults() {
        let config: HeadlessRoundConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.max_duration_secs, 120.0);
        assert!(config.random_seed.is_none());
    }
}
