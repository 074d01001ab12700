//! Messages - actions coming in from the tactics module, events going out to broadcast,
//! and deferred actions queued on the simulation clock.

use bevy::math::Vec2;
use bevy::prelude::Message;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::catalog::DeathEffect;
use crate::components::{BaseId, FormationId, NpcId, NpcState, PlayerId};
use crate::world::{vec2_as_array, BaseSeed};

// ============================================================================
// INBOUND: TACTICS ACTIONS
// ============================================================================

/// Lifecycle-affecting decision returned by the tactics hook for one NPC.
/// Wire form is an object tagged by `type`, e.g. `{"type":"scavenger:dumped","amount":40}`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum NpcAction {
    #[serde(rename = "despawn")]
    Despawn,
    #[serde(rename = "move")]
    Move {
        #[serde(with = "vec2_as_array")]
        position: Vec2,
    },
    #[serde(rename = "fire")]
    Fire { target: PlayerId },
    #[serde(rename = "attach")]
    Attach { base_id: BaseId },
    #[serde(rename = "raid")]
    Raid {
        #[serde(with = "vec2_as_array")]
        target: Vec2,
    },
    #[serde(rename = "scavenger:dumped")]
    ScavengerDumped { amount: u32 },
    #[serde(rename = "miner:deposit")]
    MinerDeposit { credits: u64 },
    #[serde(rename = "pirate:intel")]
    PirateIntel {
        #[serde(with = "vec2_as_array")]
        target: Vec2,
    },
}

impl NpcAction {
    /// Parse an action from a scripted/remote tactics module.
    /// Unknown tags and malformed payloads are dropped with a warning.
    pub fn from_json(raw: &str) -> Option<Self> {
        match serde_json::from_str(raw) {
            Ok(action) => Some(action),
            Err(e) => {
                tracing::warn!("Ignoring malformed npc action {}: {}", raw, e);
                None
            }
        }
    }
}

// ============================================================================
// INBOUND: HOST COMMANDS
// ============================================================================

/// Work handed to the simulation by the world generator, combat resolution or a remote AI.
#[derive(Message, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum HostCommand {
    ActivateBase(BaseSeed),
    DeactivateBase { base: BaseId },
    DamageNpc { npc: NpcId, amount: f32, attacker: Option<PlayerId> },
    DamageBase { base: BaseId, amount: f32, attacker: Option<PlayerId> },
    /// Decision from an out-of-process tactics module.
    Action { npc: NpcId, action: NpcAction },
}

/// Filled from network/IO threads, drained into Bevy messages each fixed step.
pub static HOST_COMMAND_QUEUE: Mutex<Vec<HostCommand>> = Mutex::new(Vec::new());

// ============================================================================
// OUTBOUND: BROADCAST EVENTS
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RewardShare {
    pub player: PlayerId,
    pub credits: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LootItem {
    pub item: String,
    pub quantity: u32,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum SpawnCause {
    Garrison,
    Respawn,
    Scout,
    Captain,
    Dreadnought,
    Hauler,
    Excavator,
    Foreman,
    QueenEgg,
    QueenMinion,
    Leviathan,
    LeviathanMinion,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum RemovalCause {
    /// Tactics asked for it.
    Despawned,
    /// Orphan timeout ran out.
    OrphanExpired,
    /// Went down with its base (linked health or attached drone).
    BaseCollapse,
    /// Base left the active set.
    BaseDeactivated,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum WaveTrigger {
    FirstContact,
    HealthThreshold { index: usize },
    Periodic,
}

/// Everything the broadcast layer needs to tell clients, drained once per tick.
#[derive(Message, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimEvent {
    NpcSpawned {
        npc: NpcId,
        type_key: String,
        #[serde(with = "vec2_as_array")]
        position: Vec2,
        cause: SpawnCause,
        base: Option<BaseId>,
    },
    NpcDestroyed {
        npc: NpcId,
        type_key: String,
        #[serde(with = "vec2_as_array")]
        position: Vec2,
        death_effect: DeathEffect,
        rewards: Vec<RewardShare>,
        loot: Vec<LootItem>,
    },
    NpcRemoved {
        npc: NpcId,
        type_key: String,
        #[serde(with = "vec2_as_array")]
        position: Vec2,
        cause: RemovalCause,
    },
    NpcStateChanged {
        npc: NpcId,
        state: NpcState,
    },
    NpcOrphaned {
        npc: NpcId,
        base: BaseId,
    },
    NpcFired {
        npc: NpcId,
        target: PlayerId,
    },
    BaseActivated {
        base: BaseId,
        base_type: String,
        #[serde(with = "vec2_as_array")]
        position: Vec2,
    },
    BaseDeactivated {
        base: BaseId,
    },
    BaseDestroyed {
        base: BaseId,
        base_type: String,
        #[serde(with = "vec2_as_array")]
        position: Vec2,
        rewards: Vec<RewardShare>,
        loot: Vec<LootItem>,
        drones_destroyed: Vec<NpcId>,
        orphaned: Vec<NpcId>,
    },
    BaseRespawned {
        base: BaseId,
        base_type: String,
        #[serde(with = "vec2_as_array")]
        position: Vec2,
    },
    DroneAttached {
        drone: NpcId,
        base: BaseId,
        attached: usize,
        threshold: usize,
    },
    BaseAssimilated {
        base: BaseId,
        from_type: String,
        to_type: String,
        #[serde(with = "vec2_as_array")]
        position: Vec2,
        converted: Vec<NpcId>,
        expelled: Vec<NpcId>,
    },
    FormationCreated {
        formation: FormationId,
        leader: NpcId,
        members: Vec<NpcId>,
    },
    FormationSuccession {
        formation: FormationId,
        old_leader: Option<NpcId>,
        new_leader: NpcId,
        score: f32,
    },
    FormationDisbanded {
        formation: FormationId,
    },
    QueenEggLaid {
        npc: NpcId,
        #[serde(with = "vec2_as_array")]
        position: Vec2,
        assimilated_bases: usize,
    },
    QueenHatched {
        npc: NpcId,
    },
    QueenMinionWave {
        queen: NpcId,
        trigger: WaveTrigger,
        spawned: Vec<NpcId>,
    },
    QueenDied {
        npc: NpcId,
        #[serde(with = "vec2_as_array")]
        position: Vec2,
    },
    LeviathanEmerging {
        npc: NpcId,
        #[serde(with = "vec2_as_array")]
        position: Vec2,
    },
    LeviathanActive {
        npc: NpcId,
    },
    LeviathanMinionWave {
        leviathan: NpcId,
        spawned: Vec<NpcId>,
    },
    LeviathanDied {
        npc: NpcId,
        #[serde(with = "vec2_as_array")]
        position: Vec2,
    },
    ScrapDeposited {
        base: BaseId,
        scrap_pile: u32,
    },
    HaulerTransformStarted {
        base: BaseId,
        ready_at: u64,
    },
    ClaimDeposit {
        base: BaseId,
        claim_credits: u64,
    },
    IntelReported {
        base: BaseId,
        scout: NpcId,
        #[serde(with = "vec2_as_array")]
        target: Vec2,
    },
}

// ============================================================================
// DEFERRED ACTIONS
// ============================================================================

/// Work scheduled on the simulation clock. Each variant re-validates its target when it fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScheduledAction {
    HaulerTransform { base: BaseId },
    QueenHatch { npc: NpcId },
    LeviathanEmerge { npc: NpcId },
}
