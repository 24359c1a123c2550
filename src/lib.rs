//! Lane Storm - a real-time two-lane tower-pushing arena game
//!
//! Core modules:
//! - `cards`: Static card catalog (units and tactics)
//! - `deck`: Per-side draw pile, hand and next-card preview
//! - `opponent`: Pluggable scripted opponent policy
//! - `sim`: Combat simulation (targeting, movement, projectiles, win detection)
//! - `settings`: Match configuration and difficulty presets

pub mod cards;
pub mod deck;
pub mod error;
pub mod opponent;
pub mod settings;
pub mod sim;

pub use cards::{CardDef, CardId, CardKind};
pub use deck::Deck;
pub use error::{ConfigError, DeckError, IntentError};
pub use opponent::{OpponentPolicy, Passive, PolicyAction, ScriptedOpponent};
pub use settings::{Difficulty, DifficultyProfile, MatchConfig};

use glam::Vec2;

/// RNG used by the simulation and the scripted opponent
pub type SimRng = rand_pcg::Pcg32;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep in milliseconds (60 Hz)
    pub const SIM_DT_MS: f64 = 1000.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Field dimensions (HUD excluded)
    pub const FIELD_WIDTH: f32 = 800.0;
    pub const FIELD_HEIGHT: f32 = 500.0;
    pub const MID_Y: f32 = FIELD_HEIGHT / 2.0;
    /// Units are kept this far from the field edges
    pub const FIELD_MARGIN: f32 = 20.0;

    /// Lane center lines
    pub const TOP_LANE_X: f32 = FIELD_WIDTH * 0.3;
    pub const BOTTOM_LANE_X: f32 = FIELD_WIDTH * 0.7;

    /// Baselines: the player defends the bottom, the opponent the top
    pub const PLAYER_BASE_Y: f32 = FIELD_HEIGHT - 50.0;
    pub const OPPONENT_BASE_Y: f32 = 50.0;
    /// Lane towers stand this far in front of their baseline
    pub const LANE_TOWER_OFFSET: f32 = 60.0;

    /// Structure stats
    pub const LANE_TOWER_HP: f32 = 1000.0;
    pub const LANE_TOWER_DAMAGE: f32 = 60.0;
    pub const CORE_HP: f32 = 2000.0;
    pub const CORE_DAMAGE: f32 = 80.0;
    pub const STRUCTURE_RANGE: f32 = 150.0;
    pub const STRUCTURE_ATTACK_RATE: f32 = 0.8;
    pub const STRUCTURE_PROJECTILE_SPEED: f32 = 400.0;

    /// Attacks at or below this range resolve instantly
    pub const MELEE_RANGE: f32 = 50.0;
    /// Projectiles impact once this close to their target
    pub const PROJECTILE_HIT_RADIUS: f32 = 10.0;
    /// Used when a ranged unit does not declare its own projectile speed
    pub const DEFAULT_PROJECTILE_SPEED: f32 = 300.0;

    /// Side-wide buffs
    pub const FURY_ATTACK_RATE_MULTIPLIER: f32 = 1.5;
    pub const FORTIFY_DAMAGE_MULTIPLIER: f32 = 0.5;

    /// Momentum (comeback meter)
    pub const MOMENTUM_MAX: f32 = 100.0;
    /// Hard ceiling for any configured elixir cap
    pub const ELIXIR_CAP: f32 = 10.0;
    /// Structure damage divided by this feeds the attacker's meter
    pub const MOMENTUM_DAMAGE_DIVISOR: f32 = 20.0;

    /// Hand size shown to each side
    pub const HAND_SIZE: usize = 4;
}

/// Clamp a position to the playable field
#[inline]
pub fn clamp_to_field(pos: Vec2) -> Vec2 {
    use consts::*;
    Vec2::new(
        pos.x.clamp(FIELD_MARGIN, FIELD_WIDTH - FIELD_MARGIN),
        pos.y.clamp(FIELD_MARGIN, FIELD_HEIGHT - FIELD_MARGIN),
    )
}
