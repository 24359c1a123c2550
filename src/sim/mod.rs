//! Deterministic match simulation
//!
//! All gameplay logic lives here. Given the same seed, config and intent
//! stream, a match plays out identically:
//! - Caller-supplied time step (fixed in the headless runner)
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod combat;
pub mod state;
pub mod targeting;
pub mod tick;
pub mod view;

pub use combat::{DamageReport, deal_damage};
pub use state::{
    Buff, BuffKind, EndReason, EntityId, GameEvent, Lane, MatchPhase, MatchResult, MatchState, Side,
    StructureRole, TargetRef,
};
pub use tick::{PlayIntent, TickInput, activate_momentum, play_card, tick};
pub use view::{BattleView, MatchView};
