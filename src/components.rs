//! Core data - identifiers, live NPC instances, damage ledgers.

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::{Faction, NpcTypeDef};

// ============================================================================
// IDENTIFIERS
// ============================================================================

/// Simulation-allocated NPC handle. Never reused within one state.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct NpcId(pub u32);

/// Base handle supplied by the world generator.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct BaseId(pub u32);

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct FormationId(pub u32);

/// Player handle supplied by the host.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct PlayerId(pub u64);

// ============================================================================
// NPC STATE
// ============================================================================

/// Lifecycle state. Movement/targeting inside a state belongs to the tactics module.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "snake_case")]
pub enum NpcState {
    #[default]
    Patrol,
    /// Queen egg incubating. No AI, no movement.
    Hatching,
    /// Leviathan emerging. No AI, no movement.
    Spawning,
    /// Drone latched onto a base.
    Attached,
    /// Home base destroyed; hits harder until the orphan timeout.
    Rage,
    /// Heading for a reported target.
    Raid,
}

impl NpcState {
    /// States that skip the tactics hook entirely.
    pub fn is_passive(self) -> bool {
        matches!(self, Self::Hatching | Self::Spawning)
    }

    pub fn is_immobile(self) -> bool {
        matches!(self, Self::Hatching | Self::Spawning | Self::Attached)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Patrol => "patrol",
            Self::Hatching => "hatching",
            Self::Spawning => "spawning",
            Self::Attached => "attached",
            Self::Rage => "rage",
            Self::Raid => "raid",
        }
    }
}

// ============================================================================
// DAMAGE LEDGER
// ============================================================================

/// Damage dealt per player. Ordered so reward shares come out in player-id order.
#[derive(Clone, Debug, Default)]
pub struct DamageLedger(BTreeMap<PlayerId, f32>);

impl DamageLedger {
    pub fn record(&mut self, player: PlayerId, amount: f32) {
        *self.0.entry(player).or_insert(0.0) += amount;
    }

    pub fn contributors(&self) -> Vec<PlayerId> {
        self.0.keys().copied().collect()
    }

    pub fn dealt_by(&self, player: PlayerId) -> f32 {
        self.0.get(&player).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn clear(&mut self) { self.0.clear(); }
}

// ============================================================================
// NPC INSTANCE
// ============================================================================

#[derive(Clone, Debug)]
pub struct NpcInstance {
    pub id: NpcId,
    pub type_key: String,
    pub faction: Faction,
    pub position: Vec2,
    pub hull: f32,
    pub hull_max: f32,
    pub shield: f32,
    pub shield_max: f32,
    pub state: NpcState,
    /// Base whose roster this NPC is on. `None` once orphaned.
    pub home_base: Option<BaseId>,
    /// Back-reference into the assimilation records.
    pub attached_to: Option<BaseId>,
    pub aggro_range: f32,
    /// Per-shot weapon damage after modifiers.
    pub damage: f32,
    pub ledger: DamageLedger,
    pub spawned_at: u64,
    pub last_fire_ms: Option<u64>,
    pub last_damage_ms: Option<u64>,
    pub orphaned_at: Option<u64>,
    pub raid_target: Option<Vec2>,
}

impl NpcInstance {
    pub fn from_def(id: NpcId, def: &NpcTypeDef, position: Vec2, now: u64) -> Self {
        Self {
            id,
            type_key: def.key.clone(),
            faction: def.faction,
            position,
            hull: def.hull,
            hull_max: def.hull,
            shield: def.shield,
            shield_max: def.shield,
            state: NpcState::Patrol,
            home_base: None,
            attached_to: None,
            aggro_range: def.aggro_range,
            damage: def.weapon.damage,
            ledger: DamageLedger::default(),
            spawned_at: now,
            last_fire_ms: None,
            last_damage_ms: None,
            orphaned_at: None,
            raid_target: None,
        }
    }

    /// Shield absorbs first, the remainder goes to hull. Returns true if fatal.
    pub fn apply_damage(&mut self, amount: f32, attacker: Option<PlayerId>, now: u64) -> bool {
        if amount <= 0.0 || self.hull <= 0.0 {
            return false;
        }
        let absorbed = amount.min(self.shield);
        self.shield -= absorbed;
        self.hull = (self.hull - (amount - absorbed)).max(0.0);
        self.last_damage_ms = Some(now);
        if let Some(player) = attacker {
            self.ledger.record(player, amount);
        }
        self.hull <= 0.0
    }

    pub fn health_fraction(&self) -> f32 {
        if self.hull_max <= 0.0 { return 0.0; }
        (self.hull / self.hull_max).clamp(0.0, 1.0)
    }

    pub fn is_orphaned(&self) -> bool {
        self.orphaned_at.is_some() && self.home_base.is_none()
    }

    /// Home base died: cut the link and enrage.
    pub fn orphan(&mut self, now: u64, aggro_mult: f32, damage_mult: f32) {
        self.home_base = None;
        self.state = NpcState::Rage;
        self.aggro_range *= aggro_mult;
        self.damage *= damage_mult;
        self.orphaned_at = Some(now);
    }

    /// Swap archetype in place, keeping hull/shield fractions. Raid orders are dropped.
    pub fn retype(&mut self, def: &NpcTypeDef) {
        let hull_frac = self.health_fraction();
        let shield_frac = if self.shield_max > 0.0 { self.shield / self.shield_max } else { 1.0 };
        self.type_key = def.key.clone();
        self.faction = def.faction;
        self.hull_max = def.hull;
        self.hull = (def.hull * hull_frac).max(1.0);
        self.shield_max = def.shield;
        self.shield = def.shield * shield_frac;
        self.aggro_range = def.aggro_range;
        self.damage = def.weapon.damage;
        if self.state == NpcState::Raid {
            self.state = NpcState::Patrol;
        }
        self.raid_target = None;
    }
}
