//! API - Collaborator seams and the read-only queries exposed to the broadcast/UI layer.

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::catalog::Faction;
use crate::components::{BaseId, FormationId, NpcId, NpcInstance, NpcState, PlayerId};
use crate::messages::{LootItem, NpcAction};
use crate::world::{vec2_as_array, BaseInstance, SimulationState};

// ============================================================================
// COLLABORATORS
// ============================================================================

/// Resolves live coordinates for orbital or moving bases.
pub trait PositionProvider {
    fn object_position(&self, object_id: u64) -> Option<Vec2>;
}

/// Movement/targeting brain. Only the lifecycle-affecting part of its answer matters here.
pub trait Tactics {
    fn update_npc_ai(
        &mut self,
        npc: &NpcSnapshot,
        nearby_players: &[PlayerPresence],
        all_npcs: &[NpcSnapshot],
        dt_ms: u64,
    ) -> Option<NpcAction>;
}

pub trait LootGenerator {
    fn generate_loot(&self, type_key: &str) -> Vec<LootItem>;
}

/// Static world: every object stays where the seed put it.
pub struct StaticPositions;

impl PositionProvider for StaticPositions {
    fn object_position(&self, _object_id: u64) -> Option<Vec2> { None }
}

/// Tactics that never decide anything.
pub struct IdleTactics;

impl Tactics for IdleTactics {
    fn update_npc_ai(&mut self, _: &NpcSnapshot, _: &[PlayerPresence], _: &[NpcSnapshot], _: u64) -> Option<NpcAction> {
        None
    }
}

pub struct NoLoot;

impl LootGenerator for NoLoot {
    fn generate_loot(&self, _type_key: &str) -> Vec<LootItem> { Vec::new() }
}

/// Borrowed collaborator set for one tick.
pub struct Collaborators<'a> {
    pub positions: &'a dyn PositionProvider,
    pub tactics: &'a mut dyn Tactics,
    pub loot: &'a dyn LootGenerator,
}

// ============================================================================
// SNAPSHOTS
// ============================================================================

/// A player ship the host considers present this tick.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct PlayerPresence {
    pub id: PlayerId,
    #[serde(with = "vec2_as_array")]
    pub position: Vec2,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NpcSnapshot {
    pub id: NpcId,
    pub type_key: String,
    pub faction: Faction,
    #[serde(with = "vec2_as_array")]
    pub position: Vec2,
    pub hull: f32,
    pub hull_max: f32,
    pub shield: f32,
    pub shield_max: f32,
    pub state: NpcState,
    pub home_base: Option<BaseId>,
    pub attached_to: Option<BaseId>,
    pub aggro_range: f32,
    pub damage: f32,
    pub territorial: bool,
    pub orphaned: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BaseSnapshot {
    pub id: BaseId,
    pub type_key: String,
    pub original_type: String,
    pub faction: Faction,
    #[serde(with = "vec2_as_array")]
    pub position: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub destroyed: bool,
    pub garrison: usize,
    pub special_units: usize,
    pub pending_respawns: usize,
    pub attached_drones: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AssimilationSummary {
    pub base: BaseId,
    pub base_type: String,
    pub drones: Vec<NpcId>,
    pub threshold: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FormationSummary {
    pub id: FormationId,
    pub leader: Option<NpcId>,
    pub members: Vec<NpcId>,
    pub last_leader: Option<NpcId>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BossSlot {
    pub npc: NpcId,
    pub state: NpcState,
    pub health_fraction: f32,
    pub minions: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BossStatus {
    pub queen: Option<BossSlot>,
    pub queen_cooldown_ms: u64,
    pub leviathan: Option<BossSlot>,
    pub leviathan_cooldown_ms: u64,
}

impl SimulationState {
    pub fn npc_snapshot(&self, npc: &NpcInstance) -> NpcSnapshot {
        let territorial = self.catalog.npc(&npc.type_key).is_some_and(|d| d.territorial);
        NpcSnapshot {
            id: npc.id,
            type_key: npc.type_key.clone(),
            faction: npc.faction,
            position: npc.position,
            hull: npc.hull,
            hull_max: npc.hull_max,
            shield: npc.shield,
            shield_max: npc.shield_max,
            state: npc.state,
            home_base: npc.home_base,
            attached_to: npc.attached_to,
            aggro_range: npc.aggro_range,
            damage: npc.damage,
            territorial,
            orphaned: npc.is_orphaned(),
        }
    }

    fn base_snapshot(&self, base: &BaseInstance) -> BaseSnapshot {
        let attached = self.assimilation.get(&base.id).map_or(0, |d| d.len());
        BaseSnapshot {
            id: base.id,
            type_key: base.type_key.clone(),
            original_type: base.original_type.clone(),
            faction: base.faction,
            position: base.position,
            health: base.health,
            max_health: base.max_health,
            destroyed: base.destroyed,
            garrison: base.garrison.len(),
            special_units: base.special_units.len(),
            pending_respawns: base.pending.len(),
            attached_drones: attached + base.absorbed_drones.len(),
        }
    }

    /// Live NPCs within `radius` of `center`, id order.
    pub fn npcs_in_radius(&self, center: Vec2, radius: f32) -> Vec<NpcSnapshot> {
        let r2 = radius * radius;
        self.npcs.values()
            .filter(|n| n.position.distance_squared(center) <= r2)
            .map(|n| self.npc_snapshot(n))
            .collect()
    }

    /// Active bases (destroyed ones included) within `radius` of `center`.
    pub fn bases_in_radius(&self, center: Vec2, radius: f32) -> Vec<BaseSnapshot> {
        let r2 = radius * radius;
        self.bases.values()
            .filter(|b| b.position.distance_squared(center) <= r2)
            .map(|b| self.base_snapshot(b))
            .collect()
    }

    /// Bases with drones attached but not yet converted.
    pub fn assimilation_summary(&self) -> Vec<AssimilationSummary> {
        self.assimilation.iter()
            .filter_map(|(base_id, drones)| {
                let base = self.bases.get(base_id)?;
                Some(AssimilationSummary {
                    base: *base_id,
                    base_type: base.type_key.clone(),
                    drones: drones.iter().copied().collect(),
                    threshold: self.config.assimilation_threshold,
                })
            })
            .collect()
    }

    pub fn formation_summary(&self) -> Vec<FormationSummary> {
        self.formations.iter()
            .map(|f| FormationSummary {
                id: f.id,
                leader: f.leader,
                members: f.members.iter().copied().collect(),
                last_leader: f.last_leader,
            })
            .collect()
    }

    pub fn boss_status(&self) -> BossStatus {
        let slot = |npc: NpcId, minions: usize| {
            self.npcs.get(&npc).map(|n| BossSlot {
                npc,
                state: n.state,
                health_fraction: n.health_fraction(),
                minions,
            })
        };
        let remaining = |last: Option<u64>, cooldown: u64| {
            last.map_or(0, |t| (t + cooldown).saturating_sub(self.now_ms))
        };
        BossStatus {
            queen: self.queen.as_ref().and_then(|q| slot(q.npc, q.minions.len())),
            queen_cooldown_ms: remaining(self.last_queen_at, self.config.queen_cooldown_ms),
            leviathan: self.leviathan.as_ref().and_then(|l| slot(l.npc, l.minions.len())),
            leviathan_cooldown_ms: remaining(self.last_leviathan_at, self.config.leviathan_cooldown_ms),
        }
    }
}
