//! Card catalog
//!
//! Static registry of every unit and tactic card. Stats never change at
//! runtime; live entities copy what they need at spawn time.

use serde::{Deserialize, Serialize};

/// Identity of a catalog card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CardId {
    Runner,
    Guardian,
    Slingbot,
    SparkMage,
    BomberBug,
    HealerDrone,
    BarrierPad,
    DecoyBeacon,
}

impl CardId {
    /// Every card in catalog order
    pub const ALL: [CardId; 8] = [
        CardId::Runner,
        CardId::Guardian,
        CardId::Slingbot,
        CardId::SparkMage,
        CardId::BomberBug,
        CardId::HealerDrone,
        CardId::BarrierPad,
        CardId::DecoyBeacon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CardId::Runner => "runner",
            CardId::Guardian => "guardian",
            CardId::Slingbot => "slingbot",
            CardId::SparkMage => "sparkMage",
            CardId::BomberBug => "bomberBug",
            CardId::HealerDrone => "healerDrone",
            CardId::BarrierPad => "barrierPad",
            CardId::DecoyBeacon => "decoyBeacon",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        CardId::ALL.into_iter().find(|id| id.as_str().eq_ignore_ascii_case(s))
    }

    /// Catalog definition for this id
    #[inline]
    pub fn def(self) -> &'static CardDef {
        card(self)
    }
}

/// Extra data for units that deal area damage on impact
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SplashStats {
    pub radius: f32,
}

/// Extra data for units whose projectiles arc to further enemies
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChainStats {
    pub max_chains: u32,
    pub range: f32,
    /// Multiplier applied to the running damage on every jump
    pub falloff: f32,
}

/// Extra data for units that periodically heal nearby allies
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HealStats {
    pub amount: f32,
    pub radius: f32,
    pub cooldown_ms: f64,
    /// Lifetime healing a single ally may receive
    pub max_per_unit: f32,
}

/// Unit archetypes; special behavior is keyed off the attached stat block
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Archetype {
    Melee,
    /// Taunts enemy structures
    Tank,
    Ranged,
    Splash(SplashStats),
    Chain(ChainStats),
    Healer(HealStats),
}

impl Archetype {
    pub fn taunts(&self) -> bool {
        matches!(self, Archetype::Tank)
    }

    pub fn splash(&self) -> Option<SplashStats> {
        match self {
            Archetype::Splash(s) => Some(*s),
            _ => None,
        }
    }

    pub fn chain(&self) -> Option<ChainStats> {
        match self {
            Archetype::Chain(c) => Some(*c),
            _ => None,
        }
    }

    pub fn heal(&self) -> Option<HealStats> {
        match self {
            Archetype::Healer(h) => Some(*h),
            _ => None,
        }
    }
}

/// Combat stats for a unit card
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UnitStats {
    pub hp: f32,
    pub damage: f32,
    /// Attacks per second
    pub attack_rate: f32,
    pub move_speed: f32,
    pub range: f32,
    /// Collision size (render hint, also used for decoy hit boxes)
    pub size: f32,
    pub projectile_speed: Option<f32>,
    pub archetype: Archetype,
}

impl UnitStats {
    /// Whether attacks resolve instantly instead of firing a projectile
    pub fn is_melee(&self) -> bool {
        self.range <= crate::consts::MELEE_RANGE
    }
}

/// Timed area effect placed by a tactic card
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum TacticEffect {
    /// Raises the shield of allies inside to `shield`
    ShieldZone { radius: f32, shield: f32 },
    /// Targetable beacon that pulls enemies inside its taunt radius
    Decoy { hp: f32, taunt_radius: f32, size: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TacticStats {
    pub duration_ms: f64,
    pub effect: TacticEffect,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum CardKind {
    Unit(UnitStats),
    Tactic(TacticStats),
}

/// An immutable catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CardDef {
    pub id: CardId,
    pub name: &'static str,
    pub cost: u8,
    pub kind: CardKind,
    pub description: &'static str,
}

impl CardDef {
    pub fn unit_stats(&self) -> Option<&UnitStats> {
        match &self.kind {
            CardKind::Unit(stats) => Some(stats),
            CardKind::Tactic(_) => None,
        }
    }

    pub fn tactic_stats(&self) -> Option<&TacticStats> {
        match &self.kind {
            CardKind::Tactic(stats) => Some(stats),
            CardKind::Unit(_) => None,
        }
    }
}

/// Catalog entries, indexed by `CardId as usize`
static CATALOG: [CardDef; 8] = [
    CardDef {
        id: CardId::Runner,
        name: "Runner",
        cost: 2,
        kind: CardKind::Unit(UnitStats {
            hp: 150.0,
            damage: 35.0,
            attack_rate: 0.8,
            move_speed: 120.0,
            range: 30.0,
            size: 12.0,
            projectile_speed: None,
            archetype: Archetype::Melee,
        }),
        description: "Fast melee unit with low HP",
    },
    CardDef {
        id: CardId::Guardian,
        name: "Guardian",
        cost: 4,
        kind: CardKind::Unit(UnitStats {
            hp: 600.0,
            damage: 50.0,
            attack_rate: 0.5,
            move_speed: 50.0,
            range: 35.0,
            size: 20.0,
            projectile_speed: None,
            archetype: Archetype::Tank,
        }),
        description: "Tanky unit that draws tower fire",
    },
    CardDef {
        id: CardId::Slingbot,
        name: "Slingbot",
        cost: 3,
        kind: CardKind::Unit(UnitStats {
            hp: 200.0,
            damage: 60.0,
            attack_rate: 0.7,
            move_speed: 70.0,
            range: 180.0,
            size: 14.0,
            projectile_speed: Some(300.0),
            archetype: Archetype::Ranged,
        }),
        description: "Ranged unit, single target",
    },
    CardDef {
        id: CardId::SparkMage,
        name: "Spark Mage",
        cost: 5,
        kind: CardKind::Unit(UnitStats {
            hp: 250.0,
            damage: 80.0,
            attack_rate: 0.6,
            move_speed: 60.0,
            range: 150.0,
            size: 16.0,
            projectile_speed: Some(250.0),
            archetype: Archetype::Chain(ChainStats {
                max_chains: 2,
                range: 100.0,
                falloff: 0.6,
            }),
        }),
        description: "Chain lightning hits up to 3 enemies",
    },
    CardDef {
        id: CardId::BomberBug,
        name: "Bomber Bug",
        cost: 3,
        kind: CardKind::Unit(UnitStats {
            hp: 180.0,
            damage: 70.0,
            attack_rate: 0.6,
            move_speed: 75.0,
            range: 80.0,
            size: 14.0,
            projectile_speed: Some(200.0),
            archetype: Archetype::Splash(SplashStats { radius: 50.0 }),
        }),
        description: "Short-range AoE splash damage",
    },
    CardDef {
        id: CardId::HealerDrone,
        name: "Healer Drone",
        cost: 4,
        kind: CardKind::Unit(UnitStats {
            hp: 220.0,
            damage: 20.0,
            attack_rate: 0.4,
            move_speed: 80.0,
            range: 100.0,
            size: 14.0,
            projectile_speed: None,
            archetype: Archetype::Healer(HealStats {
                amount: 25.0,
                radius: 80.0,
                cooldown_ms: 2000.0,
                max_per_unit: 150.0,
            }),
        }),
        description: "Heals nearby allies periodically",
    },
    CardDef {
        id: CardId::BarrierPad,
        name: "Barrier Pad",
        cost: 2,
        kind: CardKind::Tactic(TacticStats {
            duration_ms: 4000.0,
            effect: TacticEffect::ShieldZone {
                radius: 60.0,
                shield: 100.0,
            },
        }),
        description: "Place a zone that shields allies inside",
    },
    CardDef {
        id: CardId::DecoyBeacon,
        name: "Decoy Beacon",
        cost: 2,
        kind: CardKind::Tactic(TacticStats {
            duration_ms: 3500.0,
            effect: TacticEffect::Decoy {
                hp: 200.0,
                taunt_radius: 120.0,
                size: 18.0,
            },
        }),
        description: "Distracts nearby enemies briefly",
    },
];

/// Look up a card definition
#[inline]
pub fn card(id: CardId) -> &'static CardDef {
    &CATALOG[id as usize]
}

/// Deck used when a config does not specify one
pub fn default_deck() -> Vec<CardId> {
    CardId::ALL.to_vec()
}
