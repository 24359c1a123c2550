//! Opponent policies
//!
//! A policy looks at a `BattleView` of its own side and returns at most one
//! action per call. The engine applies the action exactly like a human
//! intent, so a policy can never bypass elixir or placement rules.

use glam::Vec2;
use rand::Rng;

use crate::SimRng;
use crate::cards::CardId;
use crate::consts::{FIELD_MARGIN, FIELD_WIDTH, MOMENTUM_MAX};
use crate::deck::affordable;
use crate::settings::{Difficulty, DifficultyProfile, MatchConfig};
use crate::sim::state::{BuffKind, Lane, Side};
use crate::sim::tick::PlayIntent;
use crate::sim::view::{BattleView, FieldGeometry};

/// Defense plays, strongest stabilizers first
pub const DEFENSE_PRIORITY: [CardId; 6] = [
    CardId::Guardian,
    CardId::BomberBug,
    CardId::Runner,
    CardId::Slingbot,
    CardId::SparkMage,
    CardId::HealerDrone,
];

/// Push plays, front-liners first
pub const PUSH_PRIORITY: [CardId; 8] = [
    CardId::Guardian,
    CardId::SparkMage,
    CardId::Slingbot,
    CardId::BomberBug,
    CardId::Runner,
    CardId::HealerDrone,
    CardId::BarrierPad,
    CardId::DecoyBeacon,
];

/// Defense placements sit this far (min, max) in front of the own base
const DEFENSE_OFFSET: (f32, f32) = (40.0, 80.0);
const PUSH_OFFSET: (f32, f32) = (80.0, 140.0);

/// Total threat below this counts as "quiet" when choosing a buff
const LOW_THREAT: f32 = 50.0;

/// What a policy wants the engine to do this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PolicyAction {
    PlayCard(PlayIntent),
    UseMomentum(BuffKind),
}

/// Decision maker for one side
pub trait OpponentPolicy {
    /// Side this policy plays for
    fn side(&self) -> Side;

    /// Called once per tick with a fresh snapshot
    fn decide(&mut self, view: &BattleView, rng: &mut SimRng) -> Option<PolicyAction>;
}

/// Never acts. Useful when only one side should play.
#[derive(Debug, Clone, Copy)]
pub struct Passive {
    side: Side,
}

impl Passive {
    pub fn new(side: Side) -> Self {
        Self { side }
    }
}

impl OpponentPolicy for Passive {
    fn side(&self) -> Side {
        self.side
    }

    fn decide(&mut self, _view: &BattleView, _rng: &mut SimRng) -> Option<PolicyAction> {
        None
    }
}

/// Per-lane accumulator
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LaneScores {
    pub top: f32,
    pub bottom: f32,
}

impl LaneScores {
    pub fn get(&self, lane: Lane) -> f32 {
        match lane {
            Lane::Top => self.top,
            Lane::Bottom => self.bottom,
        }
    }

    fn add(&mut self, lane: Lane, amount: f32) {
        match lane {
            Lane::Top => self.top += amount,
            Lane::Bottom => self.bottom += amount,
        }
    }

    pub fn total(&self) -> f32 {
        self.top + self.bottom
    }

    /// Lane with the higher score; ties go to the top lane
    pub fn hottest(&self) -> Lane {
        if self.top >= self.bottom { Lane::Top } else { Lane::Bottom }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stance {
    Defend,
    Push,
}

/// Rule-based opponent tuned by a difficulty profile
#[derive(Debug, Clone)]
pub struct ScriptedOpponent {
    side: Side,
    profile: DifficultyProfile,
    lane_switch_chance: f64,
    last_action_at: f64,
    /// When the momentum meter was first seen full
    momentum_ready_since: Option<f64>,
    threat: LaneScores,
    push: LaneScores,
}

impl ScriptedOpponent {
    pub fn new(side: Side, difficulty: Difficulty, lane_switch_chance: f64) -> Self {
        Self {
            side,
            profile: difficulty.profile(),
            lane_switch_chance: lane_switch_chance.clamp(0.0, 1.0),
            last_action_at: 0.0,
            momentum_ready_since: None,
            threat: LaneScores::default(),
            push: LaneScores::default(),
        }
    }

    pub fn from_config(side: Side, config: &MatchConfig) -> Self {
        Self::new(side, config.difficulty, config.lane_switch_chance)
    }

    pub fn threat(&self) -> LaneScores {
        self.threat
    }

    pub fn push(&self) -> LaneScores {
        self.push
    }

    /// Recompute per-lane threat (enemy pressure on our base) and push
    /// (our pressure on theirs)
    pub fn analyze(&mut self, view: &BattleView) {
        let geo = &view.geometry;
        self.threat = LaneScores::default();
        self.push = LaneScores::default();

        let own_span = (geo.mid_y - geo.own_base_y).abs().max(1.0);
        for unit in &view.enemy_units {
            let progress = 1.0 - (unit.pos.y - geo.own_base_y).abs() / own_span;
            self.threat.add(unit.lane, progress * 100.0 + unit.hp / 10.0);
        }

        let enemy_span = (geo.mid_y - geo.enemy_base_y).abs().max(1.0);
        for unit in &view.own_units {
            let progress = 1.0 - (unit.pos.y - geo.enemy_base_y).abs() / enemy_span;
            self.push.add(unit.lane, progress * 50.0 + unit.hp / 10.0);
        }
    }

    /// Fury when pushing or when little is coming at us
    pub fn choose_buff(&self) -> BuffKind {
        let threat = self.threat.total();
        if self.push.total() > threat || threat < LOW_THREAT {
            BuffKind::Fury
        } else {
            BuffKind::Fortify
        }
    }

    fn choose(&mut self, view: &BattleView, rng: &mut SimRng) -> Option<PolicyAction> {
        self.analyze(view);

        if let Some(since) = self.momentum_ready_since {
            if view.buff.is_none() && view.now_ms - since >= self.profile.momentum_use_delay_ms {
                return Some(PolicyAction::UseMomentum(self.choose_buff()));
            }
        }

        if view.elixir < self.profile.action_floor {
            return None;
        }

        let hot = self.threat.hottest();
        let margin = self.threat.get(hot) - self.push.get(hot);
        if margin > self.profile.defend_threshold * 100.0 {
            let exposure = |lane: Lane| self.threat.get(lane) - self.push.get(lane);
            let lane = if exposure(Lane::Top) > exposure(Lane::Bottom) {
                Lane::Top
            } else {
                Lane::Bottom
            };
            log::debug!("{:?} defending {:?} lane (margin {:.0})", self.side, lane, margin);
            return self.play_from(&DEFENSE_PRIORITY, lane, Stance::Defend, view, rng);
        }

        if view.elixir >= self.profile.push_threshold {
            let mut lane = self.push.hottest();
            if rng.random_bool(self.lane_switch_chance) {
                lane = lane.other();
            }
            log::debug!("{:?} pushing {:?} lane", self.side, lane);
            return self.play_from(&PUSH_PRIORITY, lane, Stance::Push, view, rng);
        }

        None
    }

    /// First card of `priority` that is in hand and affordable
    fn play_from(
        &self,
        priority: &[CardId],
        lane: Lane,
        stance: Stance,
        view: &BattleView,
        rng: &mut SimRng,
    ) -> Option<PolicyAction> {
        let hand_index = priority.iter().find_map(|&id| {
            view.hand
                .iter()
                .position(|&c| c == id)
                .filter(|_| affordable(id, view.elixir))
        })?;
        let pos = self.placement(&view.geometry, lane, stance, rng);
        Some(PolicyAction::PlayCard(PlayIntent { hand_index, pos, lane }))
    }

    /// Lane x plus jitter; y in front of the own base, deeper for pushes,
    /// never past the midline
    fn placement(&self, geo: &FieldGeometry, lane: Lane, stance: Stance, rng: &mut SimRng) -> Vec2 {
        let jitter = self.profile.placement_jitter;
        let x = geo.lane_x(lane) + rng.random_range(-1.0f32..=1.0) * jitter;

        let (min, max) = match stance {
            Stance::Defend => DEFENSE_OFFSET,
            Stance::Push => PUSH_OFFSET,
        };
        let dir = geo.toward_mid();
        let y = geo.own_base_y + dir * rng.random_range(min..=max);
        let y = if dir > 0.0 { y.min(geo.mid_y) } else { y.max(geo.mid_y) };

        Vec2::new(x.clamp(FIELD_MARGIN, FIELD_WIDTH - FIELD_MARGIN), y)
    }
}

impl OpponentPolicy for ScriptedOpponent {
    fn side(&self) -> Side {
        self.side
    }

    fn decide(&mut self, view: &BattleView, rng: &mut SimRng) -> Option<PolicyAction> {
        if view.momentum >= MOMENTUM_MAX && view.buff.is_none() {
            self.momentum_ready_since.get_or_insert(view.now_ms);
        } else {
            self.momentum_ready_since = None;
        }

        if view.now_ms - self.last_action_at < self.profile.decision_delay_ms {
            return None;
        }

        let action = self.choose(view, rng);
        if action.is_some() {
            self.last_action_at = view.now_ms;
        }
        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::view::UnitSummary;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn view(side: Side, elixir: f32, hand: [CardId; 4]) -> BattleView {
        BattleView {
            side,
            now_ms: 10_000.0,
            elixir,
            momentum: 0.0,
            buff: None,
            hand,
            own_units: Vec::new(),
            enemy_units: Vec::new(),
            geometry: FieldGeometry::for_side(side),
        }
    }

    fn enemy_at(lane: Lane, y: f32, hp: f32) -> UnitSummary {
        UnitSummary {
            pos: Vec2::new(lane.x(), y),
            hp,
            lane,
        }
    }

    const MIXED_HAND: [CardId; 4] = [CardId::Runner, CardId::SparkMage, CardId::Guardian, CardId::BarrierPad];

    #[test]
    fn test_threat_counts_progress_and_hp() {
        let mut ai = ScriptedOpponent::new(Side::Opponent, Difficulty::Normal, 0.0);
        let mut v = view(Side::Opponent, 5.0, MIXED_HAND);
        // At the midline: no progress, hp only
        v.enemy_units.push(enemy_at(Lane::Top, MID_Y, 600.0));
        // At the opponent base: full progress
        v.enemy_units.push(enemy_at(Lane::Bottom, OPPONENT_BASE_Y, 150.0));
        ai.analyze(&v);
        assert!((ai.threat().top - 60.0).abs() < 1e-3);
        assert!((ai.threat().bottom - 115.0).abs() < 1e-3);
    }

    #[test]
    fn test_waits_for_decision_delay() {
        let mut ai = ScriptedOpponent::new(Side::Opponent, Difficulty::Easy, 0.0);
        let mut rng = SimRng::seed_from_u64(1);
        let mut v = view(Side::Opponent, 10.0, MIXED_HAND);
        v.now_ms = 1000.0;
        assert!(ai.decide(&v, &mut rng).is_none());
        v.now_ms = 2600.0;
        assert!(ai.decide(&v, &mut rng).is_some());
        v.now_ms = 3000.0;
        assert!(ai.decide(&v, &mut rng).is_none());
    }

    #[test]
    fn test_hoards_below_action_floor() {
        let mut ai = ScriptedOpponent::new(Side::Opponent, Difficulty::Normal, 0.0);
        let mut rng = SimRng::seed_from_u64(1);
        let mut v = view(Side::Opponent, 2.0, MIXED_HAND);
        v.enemy_units.push(enemy_at(Lane::Top, 80.0, 600.0));
        assert!(ai.decide(&v, &mut rng).is_none());
    }

    #[test]
    fn test_defends_threatened_lane_with_priority_card() {
        let mut ai = ScriptedOpponent::new(Side::Opponent, Difficulty::Hard, 0.0);
        let mut rng = SimRng::seed_from_u64(2);
        let mut v = view(Side::Opponent, 4.0, MIXED_HAND);
        v.enemy_units.push(enemy_at(Lane::Bottom, 100.0, 600.0));

        let Some(PolicyAction::PlayCard(intent)) = ai.decide(&v, &mut rng) else {
            panic!("expected a defensive play");
        };
        assert_eq!(v.hand[intent.hand_index], CardId::Guardian);
        assert_eq!(intent.lane, Lane::Bottom);
        assert!(intent.pos.y >= OPPONENT_BASE_Y + 40.0 && intent.pos.y <= OPPONENT_BASE_Y + 80.0);
        assert!((intent.pos.x - BOTTOM_LANE_X).abs() <= 10.0);
    }

    #[test]
    fn test_defense_skips_when_nothing_affordable() {
        let mut ai = ScriptedOpponent::new(Side::Opponent, Difficulty::Hard, 0.0);
        let mut rng = SimRng::seed_from_u64(3);
        // Only tactics and a 5-cost card, with 3 elixir
        let hand = [CardId::BarrierPad, CardId::DecoyBeacon, CardId::SparkMage, CardId::BarrierPad];
        let mut v = view(Side::Opponent, 3.0, hand);
        v.enemy_units.push(enemy_at(Lane::Top, 90.0, 600.0));
        assert!(ai.decide(&v, &mut rng).is_none());
    }

    #[test]
    fn test_pushes_when_rich_and_quiet() {
        let mut ai = ScriptedOpponent::new(Side::Opponent, Difficulty::Normal, 0.0);
        let mut rng = SimRng::seed_from_u64(4);
        let v = view(Side::Opponent, 7.0, MIXED_HAND);
        let Some(PolicyAction::PlayCard(intent)) = ai.decide(&v, &mut rng) else {
            panic!("expected a push");
        };
        assert_eq!(v.hand[intent.hand_index], CardId::Guardian);
        assert!(intent.pos.y >= OPPONENT_BASE_Y + 80.0 && intent.pos.y <= OPPONENT_BASE_Y + 140.0);
    }

    #[test]
    fn test_momentum_used_after_delay() {
        let mut ai = ScriptedOpponent::new(Side::Opponent, Difficulty::Normal, 0.0);
        let mut rng = SimRng::seed_from_u64(5);
        let mut v = view(Side::Opponent, 0.0, MIXED_HAND);
        v.momentum = MOMENTUM_MAX;
        v.now_ms = 10_000.0;
        assert!(ai.decide(&v, &mut rng).is_none());
        v.now_ms = 11_600.0;
        assert_eq!(ai.decide(&v, &mut rng), Some(PolicyAction::UseMomentum(BuffKind::Fury)));
    }

    #[test]
    fn test_fortify_under_pressure() {
        let mut ai = ScriptedOpponent::new(Side::Player, Difficulty::Normal, 0.0);
        let mut v = view(Side::Player, 0.0, MIXED_HAND);
        v.enemy_units.push(enemy_at(Lane::Top, 380.0, 600.0));
        ai.analyze(&v);
        assert_eq!(ai.choose_buff(), BuffKind::Fortify);
    }

    #[test]
    fn test_player_side_places_in_bottom_half() {
        let mut ai = ScriptedOpponent::new(Side::Player, Difficulty::Easy, 1.0);
        let mut rng = SimRng::seed_from_u64(6);
        let v = view(Side::Player, 9.0, MIXED_HAND);
        let Some(PolicyAction::PlayCard(intent)) = ai.decide(&v, &mut rng) else {
            panic!("expected a push");
        };
        assert!(Side::Player.owns(intent.pos));
        assert!(intent.pos.y <= PLAYER_BASE_Y - 80.0);
    }

    #[test]
    fn test_priority_tables_reference_catalog() {
        for id in DEFENSE_PRIORITY.iter().chain(PUSH_PRIORITY.iter()) {
            assert_eq!(id.def().id, *id);
        }
    }

    proptest! {
        #[test]
        fn prop_placement_stays_in_own_half(seed in any::<u64>(), top in any::<bool>(), push in any::<bool>(), player in any::<bool>()) {
            let side = if player { Side::Player } else { Side::Opponent };
            let ai = ScriptedOpponent::new(side, Difficulty::Easy, 0.3);
            let mut rng = SimRng::seed_from_u64(seed);
            let lane = if top { Lane::Top } else { Lane::Bottom };
            let stance = if push { Stance::Push } else { Stance::Defend };
            let pos = ai.placement(&FieldGeometry::for_side(side), lane, stance, &mut rng);
            prop_assert!(side.owns(pos));
        }
    }
}
