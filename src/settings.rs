//! Match configuration and difficulty presets
//!
//! Loaded from a JSON file when one is given, otherwise the defaults below
//! reproduce the standard 2:30 match.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cards::{CardId, default_deck};
use crate::consts::ELIXIR_CAP;
use crate::deck::MIN_DECK_SIZE;
use crate::error::{ConfigError, DeckError, Result};

/// Opponent difficulty levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "med" | "medium" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Tuning table for this preset
    pub fn profile(&self) -> DifficultyProfile {
        match self {
            Difficulty::Easy => DifficultyProfile {
                decision_delay_ms: 2500.0,
                action_floor: 3.0,
                push_threshold: 8.0,
                placement_jitter: 40.0,
                defend_threshold: 0.6,
                momentum_use_delay_ms: 3000.0,
            },
            Difficulty::Normal => DifficultyProfile {
                decision_delay_ms: 1500.0,
                action_floor: 2.5,
                push_threshold: 6.0,
                placement_jitter: 20.0,
                defend_threshold: 0.5,
                momentum_use_delay_ms: 1500.0,
            },
            Difficulty::Hard => DifficultyProfile {
                decision_delay_ms: 800.0,
                action_floor: 2.0,
                push_threshold: 4.0,
                placement_jitter: 10.0,
                defend_threshold: 0.4,
                momentum_use_delay_ms: 500.0,
            },
        }
    }
}

/// Plain tuning data for the scripted opponent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    /// Minimum time between two actions
    pub decision_delay_ms: f64,
    /// Below this much elixir the opponent does nothing
    pub action_floor: f32,
    /// Elixir needed before starting a push
    pub push_threshold: f32,
    /// Maximum horizontal placement offset from the lane center
    pub placement_jitter: f32,
    /// Lane threat (minus own push) above `defend_threshold * 100` triggers defense
    pub defend_threshold: f32,
    /// How long a full momentum meter is held before use
    pub momentum_use_delay_ms: f64,
}

/// Match configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Match length in seconds
    pub match_duration_secs: u32,
    /// Elixir regen doubles once this many seconds remain
    pub double_elixir_at_secs: u32,
    pub starting_elixir: f32,
    pub max_elixir: f32,
    /// Elixir gained per second (before doubling)
    pub elixir_regen_per_sec: f32,
    /// Fury / fortify duration
    pub buff_duration_ms: f64,
    pub player_deck: Vec<CardId>,
    pub opponent_deck: Vec<CardId>,
    pub difficulty: Difficulty,
    /// Chance the opponent deliberately pushes the other lane
    pub lane_switch_chance: f64,
    /// Reject card placements outside the playing side's half
    pub enforce_placement_half: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            match_duration_secs: 150,
            double_elixir_at_secs: 75,
            starting_elixir: 5.0,
            max_elixir: ELIXIR_CAP,
            elixir_regen_per_sec: 0.35,
            buff_duration_ms: 5000.0,
            player_deck: default_deck(),
            opponent_deck: default_deck(),
            difficulty: Difficulty::Normal,
            lane_switch_chance: 0.3,
            enforce_placement_half: true,
        }
    }
}

impl MatchConfig {
    /// Create a default config with the given opponent difficulty
    pub fn with_difficulty(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded match config from {}", path.display());
        Ok(config)
    }

    /// Write this config as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Match config saved to {}", path.as_ref().display());
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.match_duration_secs == 0 {
            return Err(ConfigError::Invalid("match_duration_secs must be positive".into()));
        }
        if self.double_elixir_at_secs > self.match_duration_secs {
            return Err(ConfigError::Invalid(format!(
                "double_elixir_at_secs ({}) exceeds match duration ({})",
                self.double_elixir_at_secs, self.match_duration_secs
            )));
        }
        if !(self.max_elixir > 0.0 && self.max_elixir <= ELIXIR_CAP) {
            return Err(ConfigError::Invalid(format!(
                "max_elixir {} must lie in (0, {}]",
                self.max_elixir, ELIXIR_CAP
            )));
        }
        if !(0.0..=self.max_elixir).contains(&self.starting_elixir) {
            return Err(ConfigError::Invalid(format!(
                "starting_elixir {} must lie in [0, {}]",
                self.starting_elixir, self.max_elixir
            )));
        }
        if !(self.elixir_regen_per_sec >= 0.0) {
            return Err(ConfigError::Invalid("elixir_regen_per_sec must not be negative".into()));
        }
        if !(self.buff_duration_ms > 0.0) {
            return Err(ConfigError::Invalid("buff_duration_ms must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.lane_switch_chance) {
            return Err(ConfigError::Invalid(format!(
                "lane_switch_chance {} must lie in [0, 1]",
                self.lane_switch_chance
            )));
        }
        for deck in [&self.player_deck, &self.opponent_deck] {
            if deck.len() < MIN_DECK_SIZE {
                return Err(DeckError::TooFewCards {
                    have: deck.len(),
                    need: MIN_DECK_SIZE,
                }
                .into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(MatchConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = MatchConfig::from_json(r#"{ "difficulty": "hard", "match_duration_secs": 90 }"#)
            .unwrap();
        assert_eq!(config.difficulty, Difficulty::Hard);
        assert_eq!(config.match_duration_secs, 90);
        assert_eq!(config.double_elixir_at_secs, 75);
        assert_eq!(config.player_deck.len(), 8);
    }

    #[test]
    fn test_unknown_card_is_rejected() {
        let err = MatchConfig::from_json(r#"{ "player_deck": ["runner", "dragon"] }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_short_deck_is_rejected() {
        let err = MatchConfig::from_json(r#"{ "opponent_deck": ["runner", "guardian"] }"#)
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Deck(DeckError::TooFewCards { have: 2, need: 5 })
        ));
    }

    #[test]
    fn test_double_elixir_after_end_is_rejected() {
        let config = MatchConfig {
            match_duration_secs: 60,
            ..MatchConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_elixir_cap_is_bounded() {
        let too_high = MatchConfig {
            max_elixir: ELIXIR_CAP + 2.0,
            ..MatchConfig::default()
        };
        assert!(matches!(too_high.validate(), Err(ConfigError::Invalid(_))));

        let lower = MatchConfig {
            max_elixir: 8.0,
            starting_elixir: 4.0,
            ..MatchConfig::default()
        };
        assert!(lower.validate().is_ok());
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!("lane-storm-config-{}.json", std::process::id()));
        let config = MatchConfig {
            difficulty: Difficulty::Easy,
            lane_switch_chance: 0.1,
            ..MatchConfig::default()
        };
        config.save(&path).unwrap();
        let loaded = MatchConfig::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_harder_presets_are_sharper() {
        let easy = Difficulty::Easy.profile();
        let normal = Difficulty::Normal.profile();
        let hard = Difficulty::Hard.profile();
        for (soft, sharp) in [(easy, normal), (normal, hard)] {
            assert!(sharp.decision_delay_ms < soft.decision_delay_ms);
            assert!(sharp.action_floor < soft.action_floor);
            assert!(sharp.push_threshold < soft.push_threshold);
            assert!(sharp.placement_jitter < soft.placement_jitter);
            assert!(sharp.defend_threshold < soft.defend_threshold);
            assert!(sharp.momentum_use_delay_ms < soft.momentum_use_delay_ms);
        }
    }

    #[test]
    fn test_difficulty_from_str() {
        assert_eq!(Difficulty::from_str("HARD"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_str("medium"), Some(Difficulty::Normal));
        assert_eq!(Difficulty::from_str("nightmare"), None);
    }
}
