//! Read-only snapshots of a match
//!
//! `MatchView` is what a presentation layer renders from; `BattleView` is the
//! narrower, side-relative picture handed to an opponent policy.

use glam::Vec2;
use serde::Serialize;

use super::state::{BuffKind, EntityId, Lane, MatchPhase, MatchResult, MatchState, Side, StructureRole, TacticRuntime};
use crate::cards::CardId;
use crate::consts::{HAND_SIZE, MID_Y};

/// Field layout as seen from one side
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldGeometry {
    pub top_lane_x: f32,
    pub bottom_lane_x: f32,
    pub mid_y: f32,
    pub own_base_y: f32,
    pub enemy_base_y: f32,
}

impl FieldGeometry {
    pub fn for_side(side: Side) -> Self {
        Self {
            top_lane_x: Lane::Top.x(),
            bottom_lane_x: Lane::Bottom.x(),
            mid_y: MID_Y,
            own_base_y: side.base_y(),
            enemy_base_y: side.enemy().base_y(),
        }
    }

    pub fn lane_x(&self, lane: Lane) -> f32 {
        match lane {
            Lane::Top => self.top_lane_x,
            Lane::Bottom => self.bottom_lane_x,
        }
    }

    /// +1 or -1: direction of y from the own baseline toward the midline
    pub fn toward_mid(&self) -> f32 {
        if self.mid_y >= self.own_base_y { 1.0 } else { -1.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UnitSummary {
    pub pos: Vec2,
    pub hp: f32,
    pub lane: Lane,
}

/// Everything an opponent policy may look at
#[derive(Debug, Clone, Serialize)]
pub struct BattleView {
    pub side: Side,
    pub now_ms: f64,
    pub elixir: f32,
    pub momentum: f32,
    pub buff: Option<BuffKind>,
    pub hand: [CardId; HAND_SIZE],
    pub own_units: Vec<UnitSummary>,
    pub enemy_units: Vec<UnitSummary>,
    pub geometry: FieldGeometry,
}

impl BattleView {
    pub fn capture(state: &MatchState, side: Side) -> Self {
        let own = state.side(side);
        let mut own_units = Vec::new();
        let mut enemy_units = Vec::new();
        for unit in state.units.iter().filter(|u| u.alive()) {
            let summary = UnitSummary {
                pos: unit.pos,
                hp: unit.vitals.hp,
                lane: unit.lane,
            };
            if unit.side == side {
                own_units.push(summary);
            } else {
                enemy_units.push(summary);
            }
        }
        Self {
            side,
            now_ms: state.now(),
            elixir: own.economy.elixir,
            momentum: own.economy.momentum,
            buff: own.economy.buff.map(|b| b.kind),
            hand: *own.deck.hand(),
            own_units,
            enemy_units,
            geometry: FieldGeometry::for_side(side),
        }
    }
}

/// Per-side HUD data
#[derive(Debug, Clone, Serialize)]
pub struct SideHud {
    pub elixir: f32,
    pub momentum: f32,
    pub buff: Option<BuffKind>,
    pub buff_remaining_ms: f64,
    pub hand: [CardId; HAND_SIZE],
    pub next_card: CardId,
    pub structure_hp: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntityKind {
    Unit(CardId),
    Structure(StructureRole),
    Projectile,
    ShieldZone,
    Decoy,
}

/// Render-sync record for one entity
#[derive(Debug, Clone, Serialize)]
pub struct EntityView {
    pub id: EntityId,
    pub kind: EntityKind,
    pub side: Side,
    pub pos: Vec2,
    pub hp: f32,
    pub max_hp: f32,
    pub shield: f32,
    pub destroyed: bool,
}

/// Full snapshot for rendering and UI
#[derive(Debug, Clone, Serialize)]
pub struct MatchView {
    pub phase: MatchPhase,
    pub result: Option<MatchResult>,
    pub time_remaining_secs: u32,
    pub double_elixir: bool,
    /// Indexed by `Side::index`
    pub sides: [SideHud; 2],
    pub entities: Vec<EntityView>,
}

impl MatchView {
    pub fn capture(state: &MatchState) -> Self {
        let now = state.now();
        let sides = Side::BOTH.map(|side| {
            let s = state.side(side);
            SideHud {
                elixir: s.economy.elixir,
                momentum: s.economy.momentum,
                buff: s.economy.buff.map(|b| b.kind),
                buff_remaining_ms: s.economy.buff.map_or(0.0, |b| (b.expires_at_ms - now).max(0.0)),
                hand: *s.deck.hand(),
                next_card: s.deck.next_id(),
                structure_hp: state.structure_hp(side),
            }
        });

        let mut entities = Vec::with_capacity(
            state.structures.len() + state.units.len() + state.projectiles.len() + state.tactics.len(),
        );
        entities.extend(state.structures.iter().map(|s| EntityView {
            id: s.id,
            kind: EntityKind::Structure(s.role),
            side: s.side,
            pos: s.pos,
            hp: s.vitals.hp.max(0.0),
            max_hp: s.vitals.max_hp,
            shield: s.vitals.shield,
            destroyed: s.destroyed,
        }));
        entities.extend(state.units.iter().map(|u| EntityView {
            id: u.id,
            kind: EntityKind::Unit(u.card),
            side: u.side,
            pos: u.pos,
            hp: u.vitals.hp.max(0.0),
            max_hp: u.vitals.max_hp,
            shield: u.vitals.shield,
            destroyed: !u.alive(),
        }));
        entities.extend(state.projectiles.iter().map(|p| EntityView {
            id: p.id,
            kind: EntityKind::Projectile,
            side: p.side,
            pos: p.pos,
            hp: 0.0,
            max_hp: 0.0,
            shield: 0.0,
            destroyed: p.spent,
        }));
        entities.extend(state.tactics.iter().map(|t| {
            let (kind, hp, max_hp) = match t.runtime {
                TacticRuntime::ShieldZone { .. } => (EntityKind::ShieldZone, 0.0, 0.0),
                TacticRuntime::Decoy { vitals, .. } => (EntityKind::Decoy, vitals.hp.max(0.0), vitals.max_hp),
            };
            EntityView {
                id: t.id,
                kind,
                side: t.side,
                pos: t.pos,
                hp,
                max_hp,
                shield: 0.0,
                destroyed: t.expired,
            }
        }));

        Self {
            phase: state.phase,
            result: state.result,
            time_remaining_secs: state.clock.time_remaining_secs,
            double_elixir: state.clock.double_elixir,
            sides,
            entities,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MatchConfig;

    #[test]
    fn test_battle_view_is_side_relative() {
        let mut state = MatchState::new(MatchConfig::default(), 1).unwrap();
        state.spawn_unit(CardId::Runner, Side::Player, Lane::Top, Vec2::new(240.0, 400.0));
        state.spawn_unit(CardId::Guardian, Side::Opponent, Lane::Bottom, Vec2::new(560.0, 100.0));

        let view = BattleView::capture(&state, Side::Opponent);
        assert_eq!(view.own_units.len(), 1);
        assert_eq!(view.enemy_units[0].lane, Lane::Top);
        assert_eq!(view.geometry.own_base_y, crate::consts::OPPONENT_BASE_Y);
        assert_eq!(view.geometry.toward_mid(), 1.0);
        assert_eq!(FieldGeometry::for_side(Side::Player).toward_mid(), -1.0);
    }

    #[test]
    fn test_match_view_serializes() {
        let state = MatchState::new(MatchConfig::default(), 2).unwrap();
        let view = MatchView::capture(&state);
        assert_eq!(view.entities.len(), 6);
        let json = serde_json::to_string(&view).unwrap();
        assert!(json.contains("\"phase\":\"Setup\""));
    }
}
