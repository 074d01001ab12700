//! Rejection and error types.
//! Contention (busy singleton, duplicate attach) is a normal outcome, not a bug;
//! callers log and move on.

use thiserror::Error;

use crate::components::{BaseId, NpcId};

/// Why a drone could not attach to a base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AttachRejection {
    #[error("drone {0:?} does not exist")]
    UnknownDrone(NpcId),
    #[error("npc {0:?} is not an assimilation drone")]
    NotADrone(NpcId),
    #[error("drone {drone:?} is already attached to base {base:?}")]
    AlreadyAttached { drone: NpcId, base: BaseId },
    #[error("base {0:?} is not active")]
    UnknownBase(BaseId),
    #[error("base {0:?} is destroyed")]
    BaseDestroyed(BaseId),
    #[error("base {0:?} cannot be assimilated")]
    NotAssimilable(BaseId),
}

/// Why a singleton boss was not spawned.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum BossGateRejection {
    #[error("boss already alive")]
    AlreadyAlive,
    #[error("cooldown active, {remaining_ms}ms remaining")]
    Cooldown { remaining_ms: u64 },
    #[error("only {found} assimilated bases in range, {required} required")]
    InsufficientAssimilation { found: usize, required: usize },
    #[error("spawn roll failed")]
    RollFailed,
    #[error("boss type missing from catalog")]
    MissingType,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("catalog: {0}")]
    Catalog(String),
}
