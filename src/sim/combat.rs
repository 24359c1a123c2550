//! Damage, projectiles and area effects
//!
//! All damage flows through `deal_damage`, which applies the defender's
//! fortify buff, drains shields before hp, feeds the attacker's momentum
//! meter on structure hits and flags anything that drops to zero.

use glam::Vec2;

use super::state::{
    Buff, EntityId, GameEvent, ImpactEffect, MatchState, Projectile, Side, StructureRole, TacticRuntime, TargetRef,
    Vitals,
};
use crate::cards::{ChainStats, HealStats, SplashStats};
use crate::consts::*;

/// Outcome of a single damage application
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageReport {
    /// Damage after the fortify multiplier
    pub dealt: f32,
    pub absorbed: f32,
    /// Portion that reached hp
    pub to_hp: f32,
}

impl Vitals {
    /// Apply `raw` damage: fortify first, then shield, remainder to hp.
    /// Hp may go negative; callers treat `hp <= 0` as destroyed.
    pub fn take_damage(&mut self, raw: f32, defender_buff: Option<Buff>) -> DamageReport {
        let dealt = raw.max(0.0) * Buff::damage_taken_multiplier(defender_buff);
        let absorbed = dealt.min(self.shield);
        self.shield -= absorbed;
        let to_hp = dealt - absorbed;
        self.hp -= to_hp;
        DamageReport { dealt, absorbed, to_hp }
    }
}

/// Whether an attacker with the given cooldown state may attack now
#[inline]
pub fn attack_ready(last_attack_at: Option<f64>, now: f64, attack_rate: f32, buff: Option<Buff>) -> bool {
    let rate = attack_rate * Buff::attack_rate_multiplier(buff);
    if rate <= 0.0 {
        return false;
    }
    match last_attack_at {
        None => true,
        Some(last) => now - last >= 1000.0 / f64::from(rate),
    }
}

/// Damage `target` on behalf of `attacker`.
///
/// Returns `None` when the target is already gone; structures that are
/// already destroyed are ignored.
pub fn deal_damage(state: &mut MatchState, target: TargetRef, raw: f32, attacker: Side) -> Option<DamageReport> {
    match target {
        TargetRef::Unit(id) => {
            let idx = state.unit_index(id)?;
            if !state.units[idx].alive() {
                return None;
            }
            let buff = state.buff(state.units[idx].side);
            let unit = &mut state.units[idx];
            let report = unit.vitals.take_damage(raw, buff);
            log::trace!("{:?} hit unit #{} for {:.1} ({:.1} absorbed)", attacker, id, report.dealt, report.absorbed);
            let (pos, side) = (unit.pos, unit.side);
            let died = unit.vitals.is_depleted();
            if died {
                unit.destroyed = true;
            }
            state.push_event(GameEvent::Hit {
                target,
                amount: report.dealt,
                pos,
            });
            if died {
                log::debug!("{:?} unit #{} destroyed", side, id);
                state.push_event(GameEvent::UnitDied { id, side, pos });
            }
            Some(report)
        }
        TargetRef::Decoy(id) => {
            let side = state.tactic(id).filter(|t| t.live_decoy_radius().is_some())?.side;
            let buff = state.buff(side);
            let tactic = state.tactic_mut(id)?;
            let pos = tactic.pos;
            let vitals = tactic.decoy_vitals_mut()?;
            let report = vitals.take_damage(raw, buff);
            let broken = vitals.is_depleted();
            if broken {
                tactic.expired = true;
            }
            state.push_event(GameEvent::Hit {
                target,
                amount: report.dealt,
                pos,
            });
            if broken {
                state.push_event(GameEvent::DecoyDestroyed { id });
            }
            Some(report)
        }
        TargetRef::Structure(id) => {
            let idx = state.structures.iter().position(|s| s.id == id && !s.destroyed)?;
            let buff = state.buff(state.structures[idx].side);
            let structure = &mut state.structures[idx];
            let report = structure.vitals.take_damage(raw, buff);
            let pos = structure.pos;
            let fallen = structure.vitals.is_depleted();

            state.push_event(GameEvent::Hit {
                target,
                amount: report.dealt,
                pos,
            });
            add_momentum(state, attacker, report.to_hp / MOMENTUM_DAMAGE_DIVISOR);
            if fallen {
                destroy_structure(state, idx);
            }
            Some(report)
        }
    }
}

fn destroy_structure(state: &mut MatchState, idx: usize) {
    let structure = &mut state.structures[idx];
    structure.destroyed = true;
    structure.vitals.hp = 0.0;
    let (id, side, role) = (structure.id, structure.side, structure.role);

    log::info!("{:?} {:?} destroyed at {:.1}s", side, role, state.now() / 1000.0);
    state.push_event(GameEvent::StructureDestroyed { id, side, role });

    if role == StructureRole::Core {
        state.end_match(super::state::EndReason::CoreDestroyed, Some(side.enemy()));
    }
}

/// Raise `side`'s momentum meter, capped at `MOMENTUM_MAX`
pub fn add_momentum(state: &mut MatchState, side: Side, amount: f32) {
    if amount <= 0.0 {
        return;
    }
    let economy = &mut state.side_mut(side).economy;
    economy.momentum = (economy.momentum + amount).min(MOMENTUM_MAX);
    announce_momentum(state, side);
}

/// Emit `MomentumReady` once per fill, and only while no buff is active
pub fn announce_momentum(state: &mut MatchState, side: Side) {
    let economy = &mut state.side_mut(side).economy;
    if economy.momentum >= MOMENTUM_MAX && economy.buff.is_none() && !economy.momentum_announced {
        economy.momentum_announced = true;
        log::debug!("{:?} momentum ready", side);
        state.push_event(GameEvent::MomentumReady { side });
    }
}

/// Launch a homing projectile
#[allow(clippy::too_many_arguments)]
pub fn fire_projectile(
    state: &mut MatchState,
    side: Side,
    source: EntityId,
    from: Vec2,
    target: TargetRef,
    damage: f32,
    speed: f32,
    effect: Option<ImpactEffect>,
) -> EntityId {
    let id = state.next_entity_id();
    state.projectiles.push(Projectile {
        id,
        side,
        source,
        target,
        pos: from,
        damage,
        speed,
        effect,
        spent: false,
    });
    id
}

/// Where a projectile should fly. Units and decoys must still stand;
/// structures are always tracked so a shot in flight still lands.
fn projectile_aim(state: &MatchState, target: TargetRef) -> Option<Vec2> {
    match target {
        TargetRef::Structure(id) => state.structure(id).map(|s| s.pos),
        other => state.live_target_pos(other),
    }
}

/// Move every projectile toward its target and resolve impacts
pub fn update_projectiles(state: &mut MatchState, dt_ms: f64) {
    let dt = (dt_ms / 1000.0) as f32;
    for i in 0..state.projectiles.len() {
        if state.projectiles[i].spent {
            continue;
        }
        let Some(aim) = projectile_aim(state, state.projectiles[i].target) else {
            state.projectiles[i].spent = true;
            continue;
        };

        let projectile = &mut state.projectiles[i];
        let delta = aim - projectile.pos;
        let dist = delta.length();
        if dist < PROJECTILE_HIT_RADIUS {
            projectile.spent = true;
            let (side, target, damage, effect) = (projectile.side, projectile.target, projectile.damage, projectile.effect);
            // A shot at a structure that already fell lands on rubble
            if deal_damage(state, target, damage, side).is_none() {
                continue;
            }
            match effect {
                Some(ImpactEffect::Chain(chain)) => {
                    resolve_chain(state, side, target, aim, damage, chain);
                }
                Some(ImpactEffect::Splash(splash)) => {
                    resolve_splash(state, side, target, aim, damage, splash);
                }
                None => {}
            }
            if !state.is_running() {
                return;
            }
        } else {
            let step = (projectile.speed * dt).min(dist);
            projectile.pos += delta / dist * step;
        }
    }
}

/// Arc from the primary hit to up to `max_chains` further enemy units.
///
/// Each jump picks the nearest unhit living enemy strictly inside
/// `chain.range` of the previous link and multiplies the running damage by
/// `chain.falloff`. Returns the (unit, damage) pairs hit by jumps.
pub fn resolve_chain(
    state: &mut MatchState,
    side: Side,
    primary: TargetRef,
    from: Vec2,
    damage: f32,
    chain: ChainStats,
) -> Vec<(EntityId, f32)> {
    let mut hit: Vec<EntityId> = match primary {
        TargetRef::Unit(id) => vec![id],
        _ => Vec::new(),
    };
    let mut jumps = Vec::new();
    let mut origin = from;
    let mut running = damage;

    for _ in 0..chain.max_chains {
        let next = state
            .units
            .iter()
            .filter(|u| u.side != side && u.alive() && !hit.contains(&u.id))
            .map(|u| (u.id, u.pos, u.pos.distance(origin)))
            .filter(|&(_, _, d)| d < chain.range)
            .min_by(|a, b| a.2.total_cmp(&b.2));
        let Some((id, pos, _)) = next else {
            break;
        };

        running *= chain.falloff;
        hit.push(id);
        state.push_event(GameEvent::ChainArc { from: origin, to: pos });
        deal_damage(state, TargetRef::Unit(id), running, side);
        jumps.push((id, running));
        origin = pos;
    }
    jumps
}

/// Damage enemy units around `center` with linear falloff to half at the
/// rim. The primary target is excluded. Returns the (unit, damage) pairs.
pub fn resolve_splash(
    state: &mut MatchState,
    side: Side,
    primary: TargetRef,
    center: Vec2,
    damage: f32,
    splash: SplashStats,
) -> Vec<(EntityId, f32)> {
    let primary_id = match primary {
        TargetRef::Unit(id) => Some(id),
        _ => None,
    };
    let victims: Vec<(EntityId, f32)> = state
        .units
        .iter()
        .filter(|u| u.side != side && u.alive() && Some(u.id) != primary_id)
        .filter_map(|u| {
            let d = u.pos.distance(center);
            (d <= splash.radius).then(|| (u.id, damage * (1.0 - 0.5 * d / splash.radius)))
        })
        .collect();

    state.push_event(GameEvent::Splash {
        pos: center,
        radius: splash.radius,
    });
    for &(id, amount) in &victims {
        deal_damage(state, TargetRef::Unit(id), amount, side);
    }
    victims
}

/// Run one healer pulse if its cooldown has elapsed.
///
/// Allies inside the radius (not the healer itself) gain up to
/// `heal.amount`, limited by missing hp and the per-ally lifetime cap.
/// The cooldown restarts even when nobody needed healing.
pub fn pulse_heal(state: &mut MatchState, healer_idx: usize, heal: HealStats) -> f32 {
    let now = state.now();
    let healer = &state.units[healer_idx];
    if let Some(last) = healer.last_heal_at {
        if now - last < heal.cooldown_ms {
            return 0.0;
        }
    }
    let (healer_id, side, center) = (healer.id, healer.side, healer.pos);
    state.units[healer_idx].last_heal_at = Some(now);

    let mut healed = Vec::new();
    for ally in state
        .units
        .iter_mut()
        .filter(|u| u.side == side && u.id != healer_id && u.alive())
    {
        if ally.pos.distance(center) > heal.radius {
            continue;
        }
        let amount = heal
            .amount
            .min(ally.vitals.max_hp - ally.vitals.hp)
            .min(heal.max_per_unit - ally.heal_received);
        if amount > 0.0 {
            ally.vitals.hp += amount;
            ally.heal_received += amount;
            healed.push((ally.id, amount));
        }
    }

    let total = healed.iter().map(|&(_, a)| a).sum();
    for (target, amount) in healed {
        state.push_event(GameEvent::Healed { target, amount });
    }
    total
}

/// Raise the shield of allies standing in active shield zones
pub fn apply_shield_zones(state: &mut MatchState) {
    let zones: Vec<(Side, Vec2, f32, f32)> = state
        .tactics
        .iter()
        .filter(|t| !t.expired)
        .filter_map(|t| match t.runtime {
            TacticRuntime::ShieldZone { radius, shield } => Some((t.side, t.pos, radius, shield)),
            TacticRuntime::Decoy { .. } => None,
        })
        .collect();

    for (side, center, radius, shield) in zones {
        for unit in state
            .units
            .iter_mut()
            .filter(|u| u.side == side && u.alive() && u.pos.distance(center) <= radius)
        {
            unit.vitals.shield = unit.vitals.shield.max(shield);
        }
    }
}
