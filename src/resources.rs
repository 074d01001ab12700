//! ECS Resources - Host-side state the fixed-step systems read alongside the simulation

use bevy::prelude::Resource;

use crate::api::{
    Collaborators, IdleTactics, LootGenerator, NoLoot, PlayerPresence, PositionProvider,
    StaticPositions, Tactics,
};

/// Players the host considers present this step. Written by the connection layer.
#[derive(Resource, Default, Clone, Debug)]
pub struct PlayerPresences(pub Vec<PlayerPresence>);

/// Boxed collaborators. Defaults are inert: static positions, idle tactics, no loot.
#[derive(Resource)]
pub struct HostHooks {
    pub positions: Box<dyn PositionProvider + Send + Sync>,
    pub tactics: Box<dyn Tactics + Send + Sync>,
    pub loot: Box<dyn LootGenerator + Send + Sync>,
}

impl Default for HostHooks {
    fn default() -> Self {
        Self {
            positions: Box::new(StaticPositions),
            tactics: Box::new(IdleTactics),
            loot: Box::new(NoLoot),
        }
    }
}

impl HostHooks {
    pub fn collaborators(&mut self) -> Collaborators<'_> {
        Collaborators {
            positions: &*self.positions,
            tactics: &mut *self.tactics,
            loot: &*self.loot,
        }
    }
}
