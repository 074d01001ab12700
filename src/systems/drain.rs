//! Queue drain systems - Move host commands from the static queue into Bevy messages,
//! then apply them to the simulation

use bevy::prelude::*;

use crate::messages::{HostCommand, HOST_COMMAND_QUEUE};
use crate::resources::HostHooks;
use crate::world::SimulationState;

/// Drain the host command queue.
pub fn drain_host_queue(mut messages: MessageWriter<HostCommand>) {
    if let Ok(mut queue) = HOST_COMMAND_QUEUE.lock() {
        for cmd in queue.drain(..) {
            messages.write(cmd);
        }
    }
}

/// Apply activations, damage and remote actions before the tick runs.
pub fn apply_host_commands(
    mut commands: MessageReader<HostCommand>,
    mut state: ResMut<SimulationState>,
    hooks: Res<HostHooks>,
) {
    for cmd in commands.read() {
        match cmd.clone() {
            HostCommand::ActivateBase(seed) => {
                state.activate(seed);
            }
            HostCommand::DeactivateBase { base } => {
                state.deactivate(base);
            }
            HostCommand::DamageNpc { npc, amount, attacker } => {
                state.damage_npc(npc, amount, attacker, &*hooks.loot);
            }
            HostCommand::DamageBase { base, amount, attacker } => {
                state.damage_base(base, amount, attacker, &*hooks.loot);
            }
            HostCommand::Action { npc, action } => {
                state.apply_action(npc, action);
            }
        }
    }
}
