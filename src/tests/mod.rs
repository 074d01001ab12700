//! Test Framework - Scenario tests for the hostile simulation.
//!
//! Each file in src/tests/ covers one lifecycle area. Scenarios drive a fresh
//! `SimulationState` through its public operations and the fixed tick, with
//! scripted collaborators standing in for the host.

mod assimilation;
mod bosses;
mod plugin;
mod queries;

use bevy::math::Vec2;
use std::collections::BTreeMap;

use crate::api::{
    Collaborators, IdleTactics, LootGenerator, NoLoot, NpcSnapshot, PlayerPresence,
    PositionProvider, StaticPositions, Tactics,
};
use crate::catalog::Catalog;
use crate::components::{BaseId, NpcId, PlayerId};
use crate::messages::{LootItem, NpcAction, SimEvent, SpawnCause};
use crate::settings::EngineConfig;
use crate::world::{BaseSeed, SimulationState};

// ============================================================================
// STUB COLLABORATORS
// ============================================================================

/// Object positions keyed by world object id.
#[derive(Default)]
pub struct FixedPositions(pub BTreeMap<u64, Vec2>);

impl PositionProvider for FixedPositions {
    fn object_position(&self, object_id: u64) -> Option<Vec2> {
        self.0.get(&object_id).copied()
    }
}

/// Plays back queued actions per NPC and records every call.
#[derive(Default)]
pub struct ScriptedTactics {
    pub script: BTreeMap<NpcId, Vec<NpcAction>>,
    /// (npc, nearby player count) per call.
    pub calls: Vec<(NpcId, usize)>,
}

impl ScriptedTactics {
    pub fn queue(&mut self, npc: NpcId, action: NpcAction) {
        self.script.entry(npc).or_default().push(action);
    }

    pub fn called(&self, npc: NpcId) -> bool {
        self.calls.iter().any(|(id, _)| *id == npc)
    }
}

impl Tactics for ScriptedTactics {
    fn update_npc_ai(
        &mut self,
        npc: &NpcSnapshot,
        nearby_players: &[PlayerPresence],
        _all_npcs: &[NpcSnapshot],
        _dt_ms: u64,
    ) -> Option<NpcAction> {
        self.calls.push((npc.id, nearby_players.len()));
        let queue = self.script.get_mut(&npc.id)?;
        if queue.is_empty() { None } else { Some(queue.remove(0)) }
    }
}

/// Same drop for everything.
pub struct StaticLoot(pub Vec<LootItem>);

impl LootGenerator for StaticLoot {
    fn generate_loot(&self, _type_key: &str) -> Vec<LootItem> {
        self.0.clone()
    }
}

// ============================================================================
// SETUP HELPERS
// ============================================================================

pub fn state() -> SimulationState {
    SimulationState::new(EngineConfig::default(), Catalog::builtin())
}

pub fn state_with(tune: impl FnOnce(&mut EngineConfig)) -> SimulationState {
    let mut config = EngineConfig::default();
    tune(&mut config);
    SimulationState::new(config, Catalog::builtin())
}

pub fn seed(id: u32, type_key: &str, x: f32, y: f32) -> BaseSeed {
    BaseSeed {
        id: BaseId(id),
        type_key: type_key.to_string(),
        position: Vec2::new(x, y),
        world_object_id: None,
    }
}

pub fn player(id: u64, x: f32, y: f32) -> PlayerPresence {
    PlayerPresence { id: PlayerId(id), position: Vec2::new(x, y) }
}

/// Activate a base and return its garrison in id order.
pub fn activate(state: &mut SimulationState, id: u32, type_key: &str, x: f32, y: f32) -> Vec<NpcId> {
    assert!(state.activate(seed(id, type_key, x, y)), "activate {type_key}");
    state.base(BaseId(id)).expect("base").garrison.iter().copied().collect()
}

/// A homeless swarm drone.
pub fn drone(state: &mut SimulationState, x: f32, y: f32) -> NpcId {
    state.spawn_npc("swarm_drone", Vec2::new(x, y), None, SpawnCause::Garrison).expect("drone")
}

/// Attach enough fresh drones to convert the base.
pub fn assimilate(state: &mut SimulationState, base: BaseId) {
    for _ in 0..state.config.assimilation_threshold {
        let d = drone(state, 0.0, 0.0);
        state.attach(d, base).expect("attach");
    }
    assert!(state.base(base).expect("base").type_key.starts_with("assimilated_"));
}

pub fn kill(state: &mut SimulationState, npc: NpcId) {
    assert!(state.damage_npc(npc, 1.0e7, Some(PlayerId(1)), &NoLoot), "kill {npc:?}");
}

// ============================================================================
// TICK HELPERS
// ============================================================================

pub fn tick(state: &mut SimulationState, dt_ms: u64, players: &[PlayerPresence]) {
    let mut tactics = IdleTactics;
    tick_with(state, dt_ms, players, &mut tactics);
}

pub fn tick_with(state: &mut SimulationState, dt_ms: u64, players: &[PlayerPresence], tactics: &mut dyn Tactics) {
    let mut hooks = Collaborators { positions: &StaticPositions, tactics, loot: &NoLoot };
    state.tick(dt_ms, players, &mut hooks);
}

/// Run `total_ms` of simulation in `step_ms` ticks.
pub fn advance(state: &mut SimulationState, total_ms: u64, step_ms: u64, players: &[PlayerPresence]) {
    let mut elapsed = 0;
    while elapsed < total_ms {
        let dt = step_ms.min(total_ms - elapsed);
        tick(state, dt, players);
        elapsed += dt;
    }
}

pub fn count_events(events: &[SimEvent], pred: impl Fn(&SimEvent) -> bool) -> usize {
    events.iter().filter(|e| pred(e)).count()
}
