//! Target resolution, re-run every tick for every attacker

use glam::Vec2;

use super::state::{Lane, MatchState, Side, Structure, StructureRole, TargetRef, Unit};

/// First enemy decoy of `attacker` whose taunt radius contains `pos`
pub fn taunting_decoy(state: &MatchState, attacker: Side, pos: Vec2) -> Option<TargetRef> {
    state
        .tactics
        .iter()
        .filter(|t| t.side != attacker)
        .find(|t| t.live_decoy_radius().is_some_and(|r| pos.distance(t.pos) <= r))
        .map(|t| TargetRef::Decoy(t.id))
}

/// The structure a unit in `lane` marches on: its lane tower, or the
/// enemy core once that tower has fallen
pub fn lane_objective(state: &MatchState, attacker: Side, lane: Lane) -> Option<(TargetRef, Vec2)> {
    let enemy = attacker.enemy();
    let tower = state.structure_of(enemy, StructureRole::LaneTower(lane));
    let pick = match tower {
        Some(t) if !t.destroyed => Some(t),
        _ => state.structure_of(enemy, StructureRole::Core).filter(|c| !c.destroyed),
    };
    pick.map(|s| (TargetRef::Structure(s.id), s.pos))
}

/// Decoy in range, else whichever of the nearest enemy unit and the lane
/// objective is closer. `None` once nothing is left to fight.
pub fn resolve_unit_target(state: &MatchState, unit: &Unit) -> Option<TargetRef> {
    if let Some(decoy) = taunting_decoy(state, unit.side, unit.pos) {
        return Some(decoy);
    }

    let nearest_unit = state
        .units
        .iter()
        .filter(|u| u.side != unit.side && u.alive())
        .map(|u| (TargetRef::Unit(u.id), u.pos.distance(unit.pos)))
        .min_by(|a, b| a.1.total_cmp(&b.1));
    let objective = lane_objective(state, unit.side, unit.lane).map(|(t, pos)| (t, pos.distance(unit.pos)));

    match (nearest_unit, objective) {
        (Some(u), Some(o)) => Some(if o.1 < u.1 { o.0 } else { u.0 }),
        (Some(u), None) => Some(u.0),
        (None, Some(o)) => Some(o.0),
        (None, None) => None,
    }
}

/// Decoy in range, else the best enemy unit within the structure's range:
/// taunting units outrank everything else, then nearest wins
pub fn resolve_structure_target(state: &MatchState, structure: &Structure) -> Option<TargetRef> {
    if let Some(decoy) = taunting_decoy(state, structure.side, structure.pos) {
        return Some(decoy);
    }

    state
        .units
        .iter()
        .filter(|u| u.side != structure.side && u.alive())
        .map(|u| (u, u.pos.distance(structure.pos)))
        .filter(|&(_, d)| d <= structure.range)
        .min_by(|(a, da), (b, db)| {
            b.stats
                .archetype
                .taunts()
                .cmp(&a.stats.archetype.taunts())
                .then(da.total_cmp(db))
        })
        .map(|(u, _)| TargetRef::Unit(u.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardId;
    use crate::consts::*;
    use crate::settings::MatchConfig;

    fn state() -> MatchState {
        let mut state = MatchState::new(MatchConfig::default(), 3).unwrap();
        state.start();
        state
    }

    fn tower(state: &MatchState, side: Side, lane: Lane) -> &Structure {
        state.structure_of(side, StructureRole::LaneTower(lane)).unwrap()
    }

    #[test]
    fn test_taunt_outranks_distance() {
        let mut s = state();
        let t = tower(&s, Side::Player, Lane::Top).pos;
        let close = s
            .spawn_unit(CardId::Runner, Side::Opponent, Lane::Top, t + Vec2::new(0.0, -20.0))
            .unwrap();
        let tank = s
            .spawn_unit(CardId::Guardian, Side::Opponent, Lane::Top, t + Vec2::new(0.0, -140.0))
            .unwrap();
        assert_eq!(
            resolve_structure_target(&s, tower(&s, Side::Player, Lane::Top)),
            Some(TargetRef::Unit(tank))
        );

        s.unit_mut(tank).unwrap().destroyed = true;
        assert_eq!(
            resolve_structure_target(&s, tower(&s, Side::Player, Lane::Top)),
            Some(TargetRef::Unit(close))
        );
    }

    #[test]
    fn test_structure_ignores_units_out_of_range() {
        let mut s = state();
        let t = tower(&s, Side::Player, Lane::Top).pos;
        s.spawn_unit(CardId::Guardian, Side::Opponent, Lane::Top, t + Vec2::new(0.0, -(STRUCTURE_RANGE + 1.0)));
        assert_eq!(resolve_structure_target(&s, tower(&s, Side::Player, Lane::Top)), None);
    }

    #[test]
    fn test_decoy_overrides_closer_targets() {
        let mut s = state();
        let pos = Vec2::new(TOP_LANE_X, 260.0);
        let attacker = s.spawn_unit(CardId::Runner, Side::Player, Lane::Top, pos).unwrap();
        s.spawn_unit(CardId::Runner, Side::Opponent, Lane::Top, pos + Vec2::new(0.0, -5.0));
        let decoy = s
            .place_tactic(CardId::DecoyBeacon, Side::Opponent, pos + Vec2::new(100.0, 0.0))
            .unwrap();

        let unit = s.unit(attacker).unwrap();
        assert_eq!(resolve_unit_target(&s, unit), Some(TargetRef::Decoy(decoy)));
    }

    #[test]
    fn test_own_decoy_is_ignored() {
        let mut s = state();
        let pos = Vec2::new(TOP_LANE_X, 300.0);
        let attacker = s.spawn_unit(CardId::Runner, Side::Player, Lane::Top, pos).unwrap();
        s.place_tactic(CardId::DecoyBeacon, Side::Player, pos);
        let unit = s.unit(attacker).unwrap();
        assert!(matches!(resolve_unit_target(&s, unit), Some(TargetRef::Structure(_))));
    }

    #[test]
    fn test_lane_tower_then_core() {
        let mut s = state();
        let attacker = s
            .spawn_unit(CardId::Runner, Side::Player, Lane::Bottom, Vec2::new(BOTTOM_LANE_X, 300.0))
            .unwrap();
        let tower_id = tower(&s, Side::Opponent, Lane::Bottom).id;
        let core_id = s.structure_of(Side::Opponent, StructureRole::Core).unwrap().id;

        assert_eq!(
            resolve_unit_target(&s, s.unit(attacker).unwrap()),
            Some(TargetRef::Structure(tower_id))
        );

        if let Some(t) = s.structures.iter_mut().find(|t| t.id == tower_id) {
            t.destroyed = true;
        }
        assert_eq!(
            resolve_unit_target(&s, s.unit(attacker).unwrap()),
            Some(TargetRef::Structure(core_id))
        );

        if let Some(c) = s.structures.iter_mut().find(|c| c.id == core_id) {
            c.destroyed = true;
        }
        assert_eq!(resolve_unit_target(&s, s.unit(attacker).unwrap()), None);
    }

    #[test]
    fn test_nearest_enemy_unit_beats_far_tower() {
        let mut s = state();
        let pos = Vec2::new(TOP_LANE_X, 400.0);
        let attacker = s.spawn_unit(CardId::Runner, Side::Player, Lane::Top, pos).unwrap();
        let enemy = s
            .spawn_unit(CardId::Runner, Side::Opponent, Lane::Top, pos + Vec2::new(30.0, -30.0))
            .unwrap();
        assert_eq!(
            resolve_unit_target(&s, s.unit(attacker).unwrap()),
            Some(TargetRef::Unit(enemy))
        );
    }
}
