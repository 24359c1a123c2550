//! Error types for Lane Storm

use serde::Serialize;
use thiserror::Error;

/// Failures while loading or validating a `MatchConfig`
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),

    #[error("Invalid deck: {0}")]
    Deck(#[from] DeckError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeckError {
    #[error("deck has {have} cards, needs at least {need}")]
    TooFewCards { have: usize, need: usize },
}

/// Why an intent (card play or comeback activation) was refused.
///
/// These are expected outcomes of a live input stream; the engine leaves its
/// state untouched and reports them as `GameEvent::PlayRejected`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Serialize)]
pub enum IntentError {
    #[error("hand index {0} is out of range")]
    InvalidHandIndex(usize),

    #[error("not enough elixir: have {have:.1}, need {need}")]
    NotEnoughElixir { have: f32, need: u8 },

    #[error("momentum is not full ({0:.0}/100)")]
    MomentumNotReady(f32),

    #[error("placement ({x:.0}, {y:.0}) is outside the side's own half")]
    OutsideOwnHalf { x: f32, y: f32 },

    #[error("match is not running")]
    MatchNotRunning,
}

pub type Result<T> = std::result::Result<T, ConfigError>;
