//! Match state and core simulation types
//!
//! Everything the engine owns for one match lives in `MatchState`. Entity
//! collections are append-only between cleanups and keyed by a monotonically
//! increasing id, so they stay sorted and lookups can binary search.

use glam::Vec2;
use rand::SeedableRng;
use serde::Serialize;

use crate::SimRng;
use crate::cards::{CardId, ChainStats, SplashStats, TacticEffect, UnitStats};
use crate::consts::*;
use crate::deck::Deck;
use crate::error::ConfigError;
use crate::settings::MatchConfig;

pub type EntityId = u32;

/// One of the two competing sides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Side {
    /// Human side, defends the bottom baseline
    Player,
    /// Scripted side, defends the top baseline
    Opponent,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Player, Side::Opponent];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Side::Player => 0,
            Side::Opponent => 1,
        }
    }

    #[inline]
    pub fn enemy(self) -> Side {
        match self {
            Side::Player => Side::Opponent,
            Side::Opponent => Side::Player,
        }
    }

    pub fn base_y(self) -> f32 {
        match self {
            Side::Player => PLAYER_BASE_Y,
            Side::Opponent => OPPONENT_BASE_Y,
        }
    }

    /// Sign of y movement toward the enemy baseline
    pub fn forward(self) -> f32 {
        match self {
            Side::Player => -1.0,
            Side::Opponent => 1.0,
        }
    }

    /// Whether `pos` lies in this side's half of the field
    pub fn owns(self, pos: Vec2) -> bool {
        let in_width = (0.0..=FIELD_WIDTH).contains(&pos.x);
        let in_half = match self {
            Side::Player => pos.y >= MID_Y && pos.y <= FIELD_HEIGHT,
            Side::Opponent => pos.y <= MID_Y && pos.y >= 0.0,
        };
        in_width && in_half
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Lane {
    Top,
    Bottom,
}

impl Lane {
    pub const BOTH: [Lane; 2] = [Lane::Top, Lane::Bottom];

    pub fn x(self) -> f32 {
        match self {
            Lane::Top => TOP_LANE_X,
            Lane::Bottom => BOTTOM_LANE_X,
        }
    }

    pub fn other(self) -> Lane {
        match self {
            Lane::Top => Lane::Bottom,
            Lane::Bottom => Lane::Top,
        }
    }

    /// Lane whose center line is closest to `x`
    pub fn nearest(x: f32) -> Lane {
        if (x - TOP_LANE_X).abs() <= (x - BOTTOM_LANE_X).abs() {
            Lane::Top
        } else {
            Lane::Bottom
        }
    }
}

/// Hit points plus a damage-absorbing shield
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Vitals {
    pub hp: f32,
    pub max_hp: f32,
    /// Absorbs damage before hp; only ever reduced by damage
    pub shield: f32,
}

impl Vitals {
    pub fn new(max_hp: f32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            shield: 0.0,
        }
    }

    #[inline]
    pub fn is_depleted(&self) -> bool {
        self.hp <= 0.0
    }
}

/// Reference to anything a unit, structure or projectile can aim at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TargetRef {
    Unit(EntityId),
    Decoy(EntityId),
    Structure(EntityId),
}

/// A live combatant spawned from a unit card
#[derive(Debug, Clone, Serialize)]
pub struct Unit {
    pub id: EntityId,
    pub card: CardId,
    pub side: Side,
    pub lane: Lane,
    pub pos: Vec2,
    pub vitals: Vitals,
    /// Copied from the catalog at spawn time
    pub stats: UnitStats,
    pub last_attack_at: Option<f64>,
    pub last_heal_at: Option<f64>,
    /// Lifetime healing received from healers
    pub heal_received: f32,
    pub target: Option<TargetRef>,
    pub destroyed: bool,
}

impl Unit {
    pub fn spawn(id: EntityId, card: CardId, stats: UnitStats, side: Side, lane: Lane, pos: Vec2) -> Self {
        Self {
            id,
            card,
            side,
            lane,
            pos,
            vitals: Vitals::new(stats.hp),
            stats,
            last_attack_at: None,
            last_heal_at: None,
            heal_received: 0.0,
            target: None,
            destroyed: false,
        }
    }

    #[inline]
    pub fn alive(&self) -> bool {
        !self.destroyed && !self.vitals.is_depleted()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StructureRole {
    LaneTower(Lane),
    Core,
}

/// A tower; three per side
#[derive(Debug, Clone, Serialize)]
pub struct Structure {
    pub id: EntityId,
    pub side: Side,
    pub role: StructureRole,
    pub pos: Vec2,
    pub vitals: Vitals,
    pub damage: f32,
    pub range: f32,
    pub attack_rate: f32,
    pub last_attack_at: Option<f64>,
    pub destroyed: bool,
}

impl Structure {
    fn new(id: EntityId, side: Side, role: StructureRole) -> Self {
        let (pos, hp, damage) = match role {
            StructureRole::Core => (Vec2::new(FIELD_WIDTH / 2.0, side.base_y()), CORE_HP, CORE_DAMAGE),
            StructureRole::LaneTower(lane) => (
                Vec2::new(lane.x(), side.base_y() + side.forward() * LANE_TOWER_OFFSET),
                LANE_TOWER_HP,
                LANE_TOWER_DAMAGE,
            ),
        };
        Self {
            id,
            side,
            role,
            pos,
            vitals: Vitals::new(hp),
            damage,
            range: STRUCTURE_RANGE,
            attack_rate: STRUCTURE_ATTACK_RATE,
            last_attack_at: None,
            destroyed: false,
        }
    }

    #[inline]
    pub fn is_core(&self) -> bool {
        self.role == StructureRole::Core
    }
}

/// Effect carried by a projectile and resolved on impact
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ImpactEffect {
    Chain(ChainStats),
    Splash(SplashStats),
}

/// A homing shot
#[derive(Debug, Clone, Serialize)]
pub struct Projectile {
    pub id: EntityId,
    pub side: Side,
    /// Firing unit or structure
    pub source: EntityId,
    pub target: TargetRef,
    pub pos: Vec2,
    pub damage: f32,
    pub speed: f32,
    pub effect: Option<ImpactEffect>,
    pub spent: bool,
}

/// Per-kind runtime data of a placed tactic
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum TacticRuntime {
    ShieldZone { radius: f32, shield: f32 },
    Decoy { vitals: Vitals, taunt_radius: f32, size: f32 },
}

/// A placed, timed area effect
#[derive(Debug, Clone, Serialize)]
pub struct Tactic {
    pub id: EntityId,
    pub card: CardId,
    pub side: Side,
    pub pos: Vec2,
    pub placed_at: f64,
    pub duration_ms: f64,
    pub runtime: TacticRuntime,
    pub expired: bool,
}

impl Tactic {
    pub fn place(id: EntityId, card: CardId, side: Side, pos: Vec2, now: f64, duration_ms: f64, effect: TacticEffect) -> Self {
        let runtime = match effect {
            TacticEffect::ShieldZone { radius, shield } => TacticRuntime::ShieldZone { radius, shield },
            TacticEffect::Decoy { hp, taunt_radius, size } => TacticRuntime::Decoy {
                vitals: Vitals::new(hp),
                taunt_radius,
                size,
            },
        };
        Self {
            id,
            card,
            side,
            pos,
            placed_at: now,
            duration_ms,
            runtime,
            expired: false,
        }
    }

    /// Taunt radius of a decoy that can still be hit
    pub fn live_decoy_radius(&self) -> Option<f32> {
        match self.runtime {
            TacticRuntime::Decoy { vitals, taunt_radius, .. } if !self.expired && !vitals.is_depleted() => {
                Some(taunt_radius)
            }
            _ => None,
        }
    }

    pub fn decoy_vitals_mut(&mut self) -> Option<&mut Vitals> {
        match &mut self.runtime {
            TacticRuntime::Decoy { vitals, .. } => Some(vitals),
            TacticRuntime::ShieldZone { .. } => None,
        }
    }
}

/// The two comeback abilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BuffKind {
    /// Offense: attack rate ×1.5
    Fury,
    /// Defense: incoming damage halved
    Fortify,
}

/// A side-wide timed buff
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Buff {
    pub kind: BuffKind,
    pub expires_at_ms: f64,
}

impl Buff {
    /// Attack-rate multiplier for the buffed side
    #[inline]
    pub fn attack_rate_multiplier(buff: Option<Buff>) -> f32 {
        match buff {
            Some(Buff { kind: BuffKind::Fury, .. }) => FURY_ATTACK_RATE_MULTIPLIER,
            _ => 1.0,
        }
    }

    /// Incoming-damage multiplier for the buffed side
    #[inline]
    pub fn damage_taken_multiplier(buff: Option<Buff>) -> f32 {
        match buff {
            Some(Buff { kind: BuffKind::Fortify, .. }) => FORTIFY_DAMAGE_MULTIPLIER,
            _ => 1.0,
        }
    }
}

/// Elixir, comeback meter and active buff of one side
#[derive(Debug, Clone, Serialize)]
pub struct Economy {
    pub elixir: f32,
    pub momentum: f32,
    pub buff: Option<Buff>,
    /// MomentumReady already announced for the current fill
    pub momentum_announced: bool,
}

/// Everything the engine tracks per side
#[derive(Debug, Clone)]
pub struct SideState {
    pub economy: Economy,
    pub deck: Deck,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchClock {
    /// Simulated time since the match started
    pub now_ms: f64,
    pub time_remaining_secs: u32,
    /// Time accumulated toward the next whole second
    pub second_accum_ms: f64,
    /// One-way latch
    pub double_elixir: bool,
}

/// Lifecycle: Setup → Running → Ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchPhase {
    Setup,
    Running,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EndReason {
    CoreDestroyed,
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub reason: EndReason,
    /// `None` is a draw
    pub winner: Option<Side>,
}

/// Discrete notifications for presentation (effects, audio, HUD)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    UnitSpawned { id: EntityId, side: Side, card: CardId, pos: Vec2 },
    TacticPlaced { id: EntityId, side: Side, card: CardId, pos: Vec2 },
    PlayRejected { side: Side, reason: crate::error::IntentError },
    Hit { target: TargetRef, amount: f32, pos: Vec2 },
    Healed { target: EntityId, amount: f32 },
    ChainArc { from: Vec2, to: Vec2 },
    Splash { pos: Vec2, radius: f32 },
    UnitDied { id: EntityId, side: Side, pos: Vec2 },
    DecoyDestroyed { id: EntityId },
    TacticExpired { id: EntityId },
    StructureDestroyed { id: EntityId, side: Side, role: StructureRole },
    MomentumReady { side: Side },
    BuffActivated { side: Side, kind: BuffKind },
    BuffExpired { side: Side, kind: BuffKind },
    DoubleElixir,
    MatchEnded { result: MatchResult },
}

/// Complete state of one match
#[derive(Debug, Clone)]
pub struct MatchState {
    pub config: MatchConfig,
    /// Seed the match RNG was created from
    pub seed: u64,
    pub(crate) rng: SimRng,
    pub phase: MatchPhase,
    pub clock: MatchClock,
    /// Indexed by `Side::index`
    pub sides: [SideState; 2],
    pub units: Vec<Unit>,
    pub structures: Vec<Structure>,
    pub projectiles: Vec<Projectile>,
    pub tactics: Vec<Tactic>,
    pub result: Option<MatchResult>,
    pub(crate) events: Vec<GameEvent>,
    next_id: EntityId,
}

impl MatchState {
    /// Validate `config`, shuffle both decks and raise the six structures
    pub fn new(config: MatchConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = SimRng::seed_from_u64(seed);

        let economy = Economy {
            elixir: config.starting_elixir,
            momentum: 0.0,
            buff: None,
            momentum_announced: false,
        };
        let player = SideState {
            economy: economy.clone(),
            deck: Deck::new(&config.player_deck, &mut rng)?,
        };
        let opponent = SideState {
            economy,
            deck: Deck::new(&config.opponent_deck, &mut rng)?,
        };

        let clock = MatchClock {
            now_ms: 0.0,
            time_remaining_secs: config.match_duration_secs,
            second_accum_ms: 0.0,
            double_elixir: false,
        };

        let mut state = Self {
            config,
            seed,
            rng,
            phase: MatchPhase::Setup,
            clock,
            sides: [player, opponent],
            units: Vec::new(),
            structures: Vec::with_capacity(6),
            projectiles: Vec::new(),
            tactics: Vec::new(),
            result: None,
            events: Vec::new(),
            next_id: 1,
        };

        for side in Side::BOTH {
            for role in [
                StructureRole::LaneTower(Lane::Top),
                StructureRole::LaneTower(Lane::Bottom),
                StructureRole::Core,
            ] {
                let id = state.next_entity_id();
                state.structures.push(Structure::new(id, side, role));
            }
        }

        Ok(state)
    }

    /// Setup → Running
    pub fn start(&mut self) {
        if self.phase == MatchPhase::Setup {
            self.phase = MatchPhase::Running;
            log::info!(
                "Match started (seed {}, difficulty {})",
                self.seed,
                self.config.difficulty.as_str()
            );
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.phase == MatchPhase::Running
    }

    #[inline]
    pub fn now(&self) -> f64 {
        self.clock.now_ms
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn side(&self, side: Side) -> &SideState {
        &self.sides[side.index()]
    }

    pub fn side_mut(&mut self, side: Side) -> &mut SideState {
        &mut self.sides[side.index()]
    }

    pub fn economy(&self, side: Side) -> &Economy {
        &self.sides[side.index()].economy
    }

    /// Active buff of `side`, if any
    #[inline]
    pub fn buff(&self, side: Side) -> Option<Buff> {
        self.sides[side.index()].economy.buff
    }

    pub fn unit_index(&self, id: EntityId) -> Option<usize> {
        self.units.binary_search_by_key(&id, |u| u.id).ok()
    }

    pub fn unit(&self, id: EntityId) -> Option<&Unit> {
        self.unit_index(id).map(|i| &self.units[i])
    }

    pub fn unit_mut(&mut self, id: EntityId) -> Option<&mut Unit> {
        self.unit_index(id).map(move |i| &mut self.units[i])
    }

    pub fn structure(&self, id: EntityId) -> Option<&Structure> {
        self.structures.iter().find(|s| s.id == id)
    }

    pub fn tactic(&self, id: EntityId) -> Option<&Tactic> {
        self.tactics
            .binary_search_by_key(&id, |t| t.id)
            .ok()
            .map(|i| &self.tactics[i])
    }

    pub fn tactic_mut(&mut self, id: EntityId) -> Option<&mut Tactic> {
        self.tactics
            .binary_search_by_key(&id, |t| t.id)
            .ok()
            .map(move |i| &mut self.tactics[i])
    }

    /// Structure of `side` with the given role
    pub fn structure_of(&self, side: Side, role: StructureRole) -> Option<&Structure> {
        self.structures.iter().find(|s| s.side == side && s.role == role)
    }

    /// Position of a target that can still be engaged: living units,
    /// standing decoys and structures that are not destroyed
    pub fn live_target_pos(&self, target: TargetRef) -> Option<Vec2> {
        match target {
            TargetRef::Unit(id) => self.unit(id).filter(|u| u.alive()).map(|u| u.pos),
            TargetRef::Decoy(id) => self
                .tactic(id)
                .filter(|t| t.live_decoy_radius().is_some())
                .map(|t| t.pos),
            TargetRef::Structure(id) => self.structure(id).filter(|s| !s.destroyed).map(|s| s.pos),
        }
    }

    /// Summed remaining structure hp of `side`
    pub fn structure_hp(&self, side: Side) -> f32 {
        self.structures
            .iter()
            .filter(|s| s.side == side)
            .map(|s| s.vitals.hp.max(0.0))
            .sum()
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Hand all pending events to the caller
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Running → Ended. Repeated calls are ignored.
    pub fn end_match(&mut self, reason: EndReason, winner: Option<Side>) {
        if self.phase == MatchPhase::Ended {
            return;
        }
        self.phase = MatchPhase::Ended;
        let result = MatchResult { reason, winner };
        self.result = Some(result);
        self.events.push(GameEvent::MatchEnded { result });
        log::info!(
            "Match ended at {:.1}s: {:?}, winner {:?} (structure hp player {:.0} / opponent {:.0})",
            self.clock.now_ms / 1000.0,
            reason,
            winner,
            self.structure_hp(Side::Player),
            self.structure_hp(Side::Opponent),
        );
    }

    /// End on timeout; the side with more structure hp wins
    pub fn end_by_timeout(&mut self) {
        let player = self.structure_hp(Side::Player);
        let opponent = self.structure_hp(Side::Opponent);
        let winner = if player > opponent {
            Some(Side::Player)
        } else if opponent > player {
            Some(Side::Opponent)
        } else {
            None
        };
        self.end_match(EndReason::Timeout, winner);
    }

    /// Place a unit directly, bypassing deck and elixir
    pub fn spawn_unit(&mut self, card: CardId, side: Side, lane: Lane, pos: Vec2) -> Option<EntityId> {
        let stats = *card.def().unit_stats()?;
        let id = self.next_entity_id();
        self.units.push(Unit::spawn(id, card, stats, side, lane, pos));
        self.events.push(GameEvent::UnitSpawned { id, side, card, pos });
        log::debug!("{:?} spawned {} #{} at ({:.0}, {:.0})", side, card.as_str(), id, pos.x, pos.y);
        Some(id)
    }

    /// Place a tactic directly, bypassing deck and elixir
    pub fn place_tactic(&mut self, card: CardId, side: Side, pos: Vec2) -> Option<EntityId> {
        let stats = *card.def().tactic_stats()?;
        let id = self.next_entity_id();
        let now = self.clock.now_ms;
        self.tactics
            .push(Tactic::place(id, card, side, pos, now, stats.duration_ms, stats.effect));
        self.events.push(GameEvent::TacticPlaced { id, side, card, pos });
        log::debug!("{:?} placed {} #{} at ({:.0}, {:.0})", side, card.as_str(), id, pos.x, pos.y);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_state() -> MatchState {
        MatchState::new(MatchConfig::default(), 42).unwrap()
    }

    #[test]
    fn test_new_match_has_three_structures_per_side() {
        let state = new_state();
        assert_eq!(state.phase, MatchPhase::Setup);
        for side in Side::BOTH {
            let count = state.structures.iter().filter(|s| s.side == side).count();
            assert_eq!(count, 3);
            let core = state.structure_of(side, StructureRole::Core).unwrap();
            assert_eq!(core.vitals.hp, CORE_HP);
            assert_eq!(core.pos.y, side.base_y());
        }
        assert_eq!(state.structure_hp(Side::Player), 2.0 * LANE_TOWER_HP + CORE_HP);
    }

    #[test]
    fn test_lane_towers_stand_in_front_of_base() {
        let state = new_state();
        let player_top = state
            .structure_of(Side::Player, StructureRole::LaneTower(Lane::Top))
            .unwrap();
        assert_eq!(player_top.pos, Vec2::new(TOP_LANE_X, PLAYER_BASE_Y - LANE_TOWER_OFFSET));
        let opp_bottom = state
            .structure_of(Side::Opponent, StructureRole::LaneTower(Lane::Bottom))
            .unwrap();
        assert_eq!(opp_bottom.pos, Vec2::new(BOTTOM_LANE_X, OPPONENT_BASE_Y + LANE_TOWER_OFFSET));
    }

    #[test]
    fn test_start_is_one_way() {
        let mut state = new_state();
        state.start();
        assert!(state.is_running());
        state.end_match(EndReason::Timeout, None);
        state.start();
        assert_eq!(state.phase, MatchPhase::Ended);
    }

    #[test]
    fn test_end_match_is_idempotent() {
        let mut state = new_state();
        state.start();
        state.end_match(EndReason::CoreDestroyed, Some(Side::Player));
        state.end_match(EndReason::Timeout, Some(Side::Opponent));
        assert_eq!(
            state.result,
            Some(MatchResult {
                reason: EndReason::CoreDestroyed,
                winner: Some(Side::Player)
            })
        );
        let ended = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::MatchEnded { .. }))
            .count();
        assert_eq!(ended, 1);
    }

    #[test]
    fn test_unit_lookup_by_id() {
        let mut state = new_state();
        let a = state
            .spawn_unit(CardId::Runner, Side::Player, Lane::Top, Vec2::new(240.0, 400.0))
            .unwrap();
        let b = state
            .spawn_unit(CardId::Guardian, Side::Opponent, Lane::Bottom, Vec2::new(560.0, 100.0))
            .unwrap();
        assert_eq!(state.unit(a).unwrap().card, CardId::Runner);
        assert_eq!(state.unit(b).unwrap().side, Side::Opponent);
        assert!(state.spawn_unit(CardId::BarrierPad, Side::Player, Lane::Top, Vec2::ZERO).is_none());
    }

    #[test]
    fn test_side_halves() {
        assert!(Side::Player.owns(Vec2::new(100.0, 300.0)));
        assert!(!Side::Player.owns(Vec2::new(100.0, 200.0)));
        assert!(Side::Opponent.owns(Vec2::new(100.0, 200.0)));
        assert!(!Side::Opponent.owns(Vec2::new(-5.0, 200.0)));
    }

    #[test]
    fn test_lane_nearest() {
        assert_eq!(Lane::nearest(100.0), Lane::Top);
        assert_eq!(Lane::nearest(700.0), Lane::Bottom);
        assert_eq!(Lane::Top.other(), Lane::Bottom);
    }
}
