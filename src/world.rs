//! World Data - The simulation state, base records, boss slots and the tick scheduler.

use bevy::math::Vec2;
use bevy::prelude::Resource;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, VecDeque};

use crate::catalog::{BaseTypeDef, Catalog, Faction};
use crate::components::{BaseId, DamageLedger, NpcId, NpcInstance};
use crate::constants::{MINING_CLAIM, PIRATE_OUTPOST, SCAVENGER_YARD};
use crate::messages::{ScheduledAction, SimEvent};
use crate::settings::EngineConfig;
use crate::systems::FormationRegistry;

/// Serialize Vec2 as [f32; 2] for compact JSON.
pub mod vec2_as_array {
    use bevy::math::Vec2;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    pub fn serialize<S: Serializer>(v: &Vec2, s: S) -> Result<S::Ok, S::Error> {
        [v.x, v.y].serialize(s)
    }
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec2, D::Error> {
        let [x, y] = <[f32; 2]>::deserialize(d)?;
        Ok(Vec2::new(x, y))
    }
}

// ============================================================================
// BASES
// ============================================================================

/// What the world generator hands us when a base comes into range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BaseSeed {
    pub id: BaseId,
    pub type_key: String,
    #[serde(with = "vec2_as_array")]
    pub position: Vec2,
    /// Orbital/moving object this base rides on, resolved through the position provider.
    #[serde(default)]
    pub world_object_id: Option<u64>,
}

/// Id-less replacement ticket. One per garrison death.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingRespawn {
    pub ready_at: u64,
}

/// Per-faction trigger state hung off a base.
#[derive(Clone, Debug, PartialEq)]
pub enum BaseExtension {
    None,
    ScavengerYard {
        scrap_pile: u32,
        transforming: bool,
        hauler: Option<NpcId>,
    },
    MiningClaim {
        credits: u64,
        foreman: Option<NpcId>,
    },
    PirateOutpost {
        scouts: BTreeSet<NpcId>,
        last_scout_at: u64,
        intel: Option<Vec2>,
        captain: Option<NpcId>,
        dreadnought_spawned: bool,
    },
}

impl BaseExtension {
    /// Fresh trigger state for a base type. Hive bases carry none.
    pub fn for_type(type_key: &str, now: u64) -> Self {
        match type_key {
            SCAVENGER_YARD => Self::ScavengerYard { scrap_pile: 0, transforming: false, hauler: None },
            MINING_CLAIM => Self::MiningClaim { credits: 0, foreman: None },
            PIRATE_OUTPOST => Self::PirateOutpost {
                scouts: BTreeSet::new(),
                last_scout_at: now,
                intel: None,
                captain: None,
                dreadnought_spawned: false,
            },
            _ => Self::None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct BaseInstance {
    pub id: BaseId,
    pub type_key: String,
    /// Type at activation. Destroyed bases revert to it on respawn.
    pub original_type: String,
    pub faction: Faction,
    pub position: Vec2,
    pub world_object_id: Option<u64>,
    pub health: f32,
    pub max_health: f32,
    /// Pool-spawned units. Counts against capacity and feeds the respawn queue.
    pub garrison: BTreeSet<NpcId>,
    /// Trigger-spawned units (scouts, haulers, captains...). Orphaned with the base, never respawned.
    pub special_units: BTreeSet<NpcId>,
    pub pending: VecDeque<PendingRespawn>,
    pub ledger: DamageLedger,
    pub destroyed: bool,
    pub respawn_at: Option<u64>,
    pub last_spawn_at: Option<u64>,
    /// Drones that converted this base. Owned here after conversion.
    pub absorbed_drones: Vec<NpcId>,
    pub ext: BaseExtension,
}

impl BaseInstance {
    pub fn new(seed: &BaseSeed, def: &BaseTypeDef, now: u64) -> Self {
        Self {
            id: seed.id,
            type_key: def.key.clone(),
            original_type: def.key.clone(),
            faction: def.faction,
            position: seed.position,
            world_object_id: seed.world_object_id,
            health: def.max_health,
            max_health: def.max_health,
            garrison: BTreeSet::new(),
            special_units: BTreeSet::new(),
            pending: VecDeque::new(),
            ledger: DamageLedger::default(),
            destroyed: false,
            respawn_at: None,
            last_spawn_at: None,
            absorbed_drones: Vec::new(),
            ext: BaseExtension::for_type(&def.key, now),
        }
    }

    /// Take on a (possibly different) type: health, faction and trigger state follow it.
    pub fn reset_to(&mut self, def: &BaseTypeDef, now: u64) {
        self.type_key = def.key.clone();
        self.faction = def.faction;
        self.max_health = def.max_health;
        self.health = def.max_health;
        self.pending.clear();
        self.last_spawn_at = None;
        self.ext = BaseExtension::for_type(&def.key, now);
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 { return 0.0; }
        (self.health / self.max_health).clamp(0.0, 1.0)
    }

    /// Garrison then special units.
    pub fn roster(&self) -> impl Iterator<Item = NpcId> + '_ {
        self.garrison.iter().chain(self.special_units.iter()).copied()
    }

    pub fn owns(&self, npc: NpcId) -> bool {
        self.garrison.contains(&npc) || self.special_units.contains(&npc)
    }
}

// ============================================================================
// BOSS SLOTS
// ============================================================================

#[derive(Clone, Debug)]
pub struct QueenState {
    pub npc: NpcId,
    pub laid_at: u64,
    pub hatched: bool,
    /// First time a player came within contact range. Combat clock for periodic waves.
    pub contact_at: Option<u64>,
    pub thresholds_fired: Vec<bool>,
    pub last_wave_at: Option<u64>,
    pub minions: BTreeSet<NpcId>,
}

#[derive(Clone, Debug)]
pub struct LeviathanState {
    pub npc: NpcId,
    pub spawned_at: u64,
    pub active: bool,
    pub last_wave_at: Option<u64>,
    pub minions: BTreeSet<NpcId>,
}

// ============================================================================
// SCHEDULER
// ============================================================================

/// Deferred actions keyed by (due time, insertion order).
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: BinaryHeap<Reverse<(u64, u64, ScheduledAction)>>,
    seq: u64,
}

impl Scheduler {
    pub fn schedule(&mut self, due_ms: u64, action: ScheduledAction) {
        self.queue.push(Reverse((due_ms, self.seq, action)));
        self.seq += 1;
    }

    /// Pop the next action due at or before `now`.
    pub fn pop_due(&mut self, now: u64) -> Option<ScheduledAction> {
        match self.queue.peek() {
            Some(Reverse((due, _, _))) if *due <= now => {
                self.queue.pop().map(|Reverse((_, _, action))| action)
            }
            _ => None,
        }
    }

    pub fn next_due(&self) -> Option<u64> {
        self.queue.peek().map(|Reverse((due, _, _))| *due)
    }

    pub fn len(&self) -> usize { self.queue.len() }

    pub fn is_empty(&self) -> bool { self.queue.is_empty() }
}

// ============================================================================
// SIMULATION STATE
// ============================================================================

/// The single mutable state every operation reads and writes.
/// Constructed fresh per test; owned by the Bevy world as a resource in the server.
#[derive(Resource)]
pub struct SimulationState {
    pub now_ms: u64,
    pub config: EngineConfig,
    pub catalog: Catalog,
    pub rng: StdRng,
    pub npcs: BTreeMap<NpcId, NpcInstance>,
    pub bases: BTreeMap<BaseId, BaseInstance>,
    /// Drones attached to a not-yet-converted base.
    pub assimilation: BTreeMap<BaseId, BTreeSet<NpcId>>,
    pub formations: FormationRegistry,
    pub queen: Option<QueenState>,
    pub last_queen_at: Option<u64>,
    pub leviathan: Option<LeviathanState>,
    pub last_leviathan_at: Option<u64>,
    pub scheduler: Scheduler,
    events: Vec<SimEvent>,
    next_npc_id: u32,
}

impl Default for SimulationState {
    fn default() -> Self {
        Self::new(EngineConfig::default(), Catalog::builtin())
    }
}

impl SimulationState {
    pub fn new(config: EngineConfig, catalog: Catalog) -> Self {
        let rng = StdRng::seed_from_u64(config.rng_seed);
        Self {
            now_ms: 0,
            config,
            catalog,
            rng,
            npcs: BTreeMap::new(),
            bases: BTreeMap::new(),
            assimilation: BTreeMap::new(),
            formations: FormationRegistry::default(),
            queen: None,
            last_queen_at: None,
            leviathan: None,
            last_leviathan_at: None,
            scheduler: Scheduler::default(),
            events: Vec::new(),
            next_npc_id: 1,
        }
    }

    pub(crate) fn alloc_npc_id(&mut self) -> NpcId {
        let id = NpcId(self.next_npc_id);
        self.next_npc_id += 1;
        id
    }

    pub(crate) fn emit(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    /// Hand the accumulated broadcast events to the host.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn npc(&self, id: NpcId) -> Option<&NpcInstance> {
        self.npcs.get(&id)
    }

    pub fn base(&self, id: BaseId) -> Option<&BaseInstance> {
        self.bases.get(&id)
    }

    /// Roster owner of an NPC, if any base still lists it.
    pub fn owning_base(&self, npc: NpcId) -> Option<BaseId> {
        let home = self.npcs.get(&npc).and_then(|n| n.home_base)?;
        self.bases.get(&home).filter(|b| b.owns(npc)).map(|b| b.id)
    }

    /// Live NPCs of one archetype.
    pub fn count_type(&self, type_key: &str) -> usize {
        self.npcs.values().filter(|n| n.type_key == type_key).count()
    }
}
