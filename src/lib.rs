//! Hostiles - Server-side simulation of hostile NPC factions: bases, spawn pools,
//! assimilation, singleton bosses, formations and per-faction escalation.
//! The simulation is a plain state struct; `HostilesPlugin` runs it on Bevy's fixed timestep.

// ============================================================================
// MODULES
// ============================================================================

pub mod api;
pub mod catalog;
pub mod components;
pub mod constants;
pub mod error;
pub mod messages;
pub mod resources;
pub mod settings;
pub mod systems;
pub mod world;

#[cfg(test)]
mod tests;

// ============================================================================
// IMPORTS
// ============================================================================

use bevy::prelude::*;
use std::time::Duration;

use catalog::Catalog;
use messages::{HostCommand, SimEvent};
use resources::{HostHooks, PlayerPresences};
use settings::EngineConfig;
use systems::{apply_host_commands, drain_host_queue};
use world::SimulationState;

// ============================================================================
// BEVY APP
// ============================================================================

/// Fixed-step phases. Host input lands before the tick reads it.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Drain, // Static queue -> messages -> state
    Tick,  // Advance the simulation, forward events
}

/// Runs the hostile simulation on `FixedUpdate` at the configured tick interval.
#[derive(Clone)]
pub struct HostilesPlugin {
    pub config: EngineConfig,
    pub catalog: Catalog,
}

impl Default for HostilesPlugin {
    fn default() -> Self {
        Self { config: EngineConfig::default(), catalog: Catalog::builtin() }
    }
}

impl Plugin for HostilesPlugin {
    fn build(&self, app: &mut App) {
        let step = Duration::from_millis(self.config.tick_interval_ms.max(1));
        app.insert_resource(SimulationState::new(self.config.clone(), self.catalog.clone()))
            .insert_resource(Time::<Fixed>::from_duration(step))
            .init_resource::<PlayerPresences>()
            .init_resource::<HostHooks>()
            .add_message::<HostCommand>()
            .add_message::<SimEvent>()
            .configure_sets(FixedUpdate, (Step::Drain, Step::Tick).chain())
            .add_systems(FixedUpdate, (drain_host_queue, apply_host_commands).chain().in_set(Step::Drain))
            .add_systems(FixedUpdate, hostile_tick_system.in_set(Step::Tick));
    }
}

/// One simulation tick per fixed step. Drained events go out as `SimEvent` messages.
pub fn hostile_tick_system(
    time: Res<Time<Fixed>>,
    mut state: ResMut<SimulationState>,
    players: Res<PlayerPresences>,
    mut hooks: ResMut<HostHooks>,
    mut events: MessageWriter<SimEvent>,
) {
    let dt_ms = time.timestep().as_millis() as u64;
    let mut collaborators = hooks.collaborators();
    state.tick(dt_ms, &players.0, &mut collaborators);
    events.write_batch(state.drain_events());
}
