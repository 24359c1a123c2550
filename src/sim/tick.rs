//! Simulation tick
//!
//! One call advances every subsystem in a fixed order: intents, clock,
//! elixir regen, buff expiry, opponent policy, units, projectiles,
//! structures, tactics, cleanup. Later stages read flags set by earlier
//! ones within the same tick.

use glam::Vec2;
use serde::Serialize;

use super::combat::{self, attack_ready, deal_damage, fire_projectile};
use super::state::{Buff, BuffKind, GameEvent, ImpactEffect, Lane, MatchState, Side, TacticRuntime, TargetRef};
use super::targeting::{resolve_structure_target, resolve_unit_target};
use super::view::BattleView;
use crate::cards::CardKind;
use crate::clamp_to_field;
use crate::consts::*;
use crate::error::IntentError;
use crate::opponent::{OpponentPolicy, PolicyAction};

/// Request to play the card in `hand_index` at `pos`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlayIntent {
    pub hand_index: usize,
    pub pos: Vec2,
    /// Lane a spawned unit belongs to; ignored for tactics
    pub lane: Lane,
}

impl PlayIntent {
    /// Lane derived from the x of the drop position
    pub fn at(hand_index: usize, pos: Vec2) -> Self {
        Self {
            hand_index,
            pos,
            lane: Lane::nearest(pos.x),
        }
    }
}

/// Player intents for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub play: Option<PlayIntent>,
    /// Spend a full momentum meter on this buff
    pub activate: Option<BuffKind>,
}

/// Advance the match by `dt_ms` milliseconds
pub fn tick(state: &mut MatchState, input: &TickInput, policy: &mut dyn OpponentPolicy, dt_ms: f64) {
    if !state.is_running() {
        return;
    }
    if dt_ms.is_nan() || dt_ms < 0.0 {
        log::warn!("Ignoring tick with invalid step {dt_ms}");
        return;
    }

    state.clock.now_ms += dt_ms;

    if let Some(intent) = input.play {
        let _ = play_card(state, Side::Player, intent);
    }
    if let Some(kind) = input.activate {
        let _ = activate_momentum(state, Side::Player, kind);
    }

    advance_clock(state, dt_ms);
    if !state.is_running() {
        return;
    }

    regen_elixir(state, dt_ms);
    expire_buffs(state);
    run_policy(state, policy);

    update_units(state, dt_ms);
    if !state.is_running() {
        return;
    }
    combat::update_projectiles(state, dt_ms);
    if !state.is_running() {
        return;
    }
    update_structures(state);
    update_tactics(state);
    cleanup(state);
}

/// Play a card for `side`. On rejection nothing changes and a
/// `PlayRejected` event is recorded.
pub fn play_card(state: &mut MatchState, side: Side, intent: PlayIntent) -> Result<(), IntentError> {
    let result = try_play_card(state, side, intent);
    if let Err(reason) = result {
        log::debug!("{:?} play rejected: {}", side, reason);
        state.push_event(GameEvent::PlayRejected { side, reason });
    }
    result
}

fn try_play_card(state: &mut MatchState, side: Side, intent: PlayIntent) -> Result<(), IntentError> {
    if !state.is_running() {
        return Err(IntentError::MatchNotRunning);
    }
    let idx = side.index();
    let elixir = state.sides[idx].economy.elixir;
    let Some(&id) = state.sides[idx].deck.hand().get(intent.hand_index) else {
        return Err(IntentError::InvalidHandIndex(intent.hand_index));
    };
    if !state.sides[idx].deck.can_afford(intent.hand_index, elixir) {
        return Err(IntentError::NotEnoughElixir {
            have: elixir,
            need: id.def().cost,
        });
    }
    if state.config.enforce_placement_half && !side.owns(intent.pos) {
        return Err(IntentError::OutsideOwnHalf {
            x: intent.pos.x,
            y: intent.pos.y,
        });
    }

    let Some(def) = state.sides[idx].deck.play(intent.hand_index, &mut state.rng) else {
        return Err(IntentError::InvalidHandIndex(intent.hand_index));
    };
    state.sides[idx].economy.elixir -= f32::from(def.cost);

    let pos = clamp_to_field(intent.pos);
    match def.kind {
        CardKind::Unit(_) => {
            state.spawn_unit(def.id, side, intent.lane, pos);
        }
        CardKind::Tactic(_) => {
            state.place_tactic(def.id, side, pos);
        }
    }
    Ok(())
}

/// Spend a full momentum meter on a timed side-wide buff
pub fn activate_momentum(state: &mut MatchState, side: Side, kind: BuffKind) -> Result<(), IntentError> {
    if !state.is_running() {
        return Err(IntentError::MatchNotRunning);
    }
    let now = state.now();
    let duration = state.config.buff_duration_ms;
    let economy = &mut state.side_mut(side).economy;
    if economy.momentum < MOMENTUM_MAX {
        return Err(IntentError::MomentumNotReady(economy.momentum));
    }
    economy.momentum = 0.0;
    economy.momentum_announced = false;
    economy.buff = Some(Buff {
        kind,
        expires_at_ms: now + duration,
    });

    log::info!("{:?} activated {:?} for {:.1}s", side, kind, duration / 1000.0);
    state.push_event(GameEvent::BuffActivated { side, kind });
    Ok(())
}

/// Count down whole seconds; latch double elixir and end on timeout
fn advance_clock(state: &mut MatchState, dt_ms: f64) {
    state.clock.second_accum_ms += dt_ms;
    while state.clock.second_accum_ms >= 1000.0 {
        state.clock.second_accum_ms -= 1000.0;
        state.clock.time_remaining_secs = state.clock.time_remaining_secs.saturating_sub(1);

        if !state.clock.double_elixir && state.clock.time_remaining_secs <= state.config.double_elixir_at_secs {
            state.clock.double_elixir = true;
            log::info!("Double elixir with {}s remaining", state.clock.time_remaining_secs);
            state.push_event(GameEvent::DoubleElixir);
        }
        if state.clock.time_remaining_secs == 0 {
            state.end_by_timeout();
            return;
        }
    }
}

fn regen_elixir(state: &mut MatchState, dt_ms: f64) {
    let rate = if state.clock.double_elixir {
        state.config.elixir_regen_per_sec * 2.0
    } else {
        state.config.elixir_regen_per_sec
    };
    let gain = rate * (dt_ms / 1000.0) as f32;
    let max = state.config.max_elixir;
    for side in &mut state.sides {
        side.economy.elixir = (side.economy.elixir + gain).min(max);
    }
}

fn expire_buffs(state: &mut MatchState) {
    let now = state.now();
    for side in Side::BOTH {
        let economy = &mut state.side_mut(side).economy;
        let Some(buff) = economy.buff else {
            continue;
        };
        if now >= buff.expires_at_ms {
            economy.buff = None;
            log::debug!("{:?} {:?} expired", side, buff.kind);
            state.push_event(GameEvent::BuffExpired { side, kind: buff.kind });
            // A meter refilled while the buff ran is announced now
            combat::announce_momentum(state, side);
        }
    }
}

fn run_policy(state: &mut MatchState, policy: &mut dyn OpponentPolicy) {
    let side = policy.side();
    let view = BattleView::capture(state, side);
    match policy.decide(&view, &mut state.rng) {
        Some(PolicyAction::PlayCard(intent)) => {
            let _ = play_card(state, side, intent);
        }
        Some(PolicyAction::UseMomentum(kind)) => {
            let _ = activate_momentum(state, side, kind);
        }
        None => {}
    }
}

fn update_units(state: &mut MatchState, dt_ms: f64) {
    let now = state.now();
    let dt = (dt_ms / 1000.0) as f32;

    for i in 0..state.units.len() {
        if !state.units[i].alive() {
            continue;
        }
        let target = resolve_unit_target(state, &state.units[i]);
        state.units[i].target = target;

        if let Some(heal) = state.units[i].stats.archetype.heal() {
            combat::pulse_heal(state, i, heal);
        }

        let unit = &state.units[i];
        let (id, side, pos, stats) = (unit.id, unit.side, unit.pos, unit.stats);

        let Some(target) = target else {
            let advanced = pos + Vec2::new(0.0, side.forward() * stats.move_speed * dt);
            state.units[i].pos = clamp_to_field(advanced);
            continue;
        };
        let Some(target_pos) = state.live_target_pos(target) else {
            continue;
        };

        let delta = target_pos - pos;
        if delta.length() > stats.range {
            let step = delta.normalize_or_zero() * stats.move_speed * dt;
            state.units[i].pos = clamp_to_field(pos + step);
            continue;
        }

        if !attack_ready(state.units[i].last_attack_at, now, stats.attack_rate, state.buff(side)) {
            continue;
        }
        state.units[i].last_attack_at = Some(now);

        if stats.is_melee() {
            deal_damage(state, target, stats.damage, side);
            if !state.is_running() {
                return;
            }
        } else {
            let effect = match (stats.archetype.chain(), stats.archetype.splash()) {
                (Some(chain), _) => Some(ImpactEffect::Chain(chain)),
                (None, Some(splash)) => Some(ImpactEffect::Splash(splash)),
                (None, None) => None,
            };
            let speed = stats.projectile_speed.unwrap_or(DEFAULT_PROJECTILE_SPEED);
            fire_projectile(state, side, id, pos, target, stats.damage, speed, effect);
        }
    }
}

fn update_structures(state: &mut MatchState) {
    let now = state.now();
    for i in 0..state.structures.len() {
        let structure = &state.structures[i];
        if structure.destroyed {
            continue;
        }
        let Some(target) = resolve_structure_target(state, structure) else {
            continue;
        };
        let Some(target_pos) = state.live_target_pos(target) else {
            continue;
        };
        let (id, side, pos, damage, range, rate, last) = (
            structure.id,
            structure.side,
            structure.pos,
            structure.damage,
            structure.range,
            structure.attack_rate,
            structure.last_attack_at,
        );
        // Decoys pull fire from anywhere inside their taunt radius
        if !matches!(target, TargetRef::Decoy(_)) && pos.distance(target_pos) > range {
            continue;
        }
        if !attack_ready(last, now, rate, state.buff(side)) {
            continue;
        }
        state.structures[i].last_attack_at = Some(now);
        fire_projectile(state, side, id, pos, target, damage, STRUCTURE_PROJECTILE_SPEED, None);
    }
}

fn update_tactics(state: &mut MatchState) {
    let now = state.now();
    let mut expired = Vec::new();
    for tactic in state.tactics.iter_mut().filter(|t| !t.expired) {
        let timed_out = now - tactic.placed_at >= tactic.duration_ms;
        let broken = matches!(tactic.runtime, TacticRuntime::Decoy { vitals, .. } if vitals.is_depleted());
        if timed_out || broken {
            tactic.expired = true;
            expired.push(tactic.id);
        }
    }
    for id in expired {
        state.push_event(GameEvent::TacticExpired { id });
    }
    combat::apply_shield_zones(state);
}

/// Drop destroyed units, spent projectiles and expired tactics.
/// Structures stay in place for the rest of the match.
fn cleanup(state: &mut MatchState) {
    state.units.retain(|u| u.alive());
    state.projectiles.retain(|p| !p.spent);
    state.tactics.retain(|t| !t.expired);
}
