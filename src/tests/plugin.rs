//! Plugin Test
//! Validates: host commands (queued or written as messages) → applied before the tick →
//! one fixed step advances the clock → events leave as `SimEvent` messages.

use bevy::ecs::message::Messages;
use bevy::prelude::*;

use super::*;
use crate::components::{BaseId, PlayerId};
use crate::messages::{HostCommand, SimEvent, HOST_COMMAND_QUEUE};
use crate::world::SimulationState;
use crate::HostilesPlugin;

fn sim_events(app: &App) -> Vec<SimEvent> {
    let messages = app.world().resource::<Messages<SimEvent>>();
    let mut cursor = messages.get_cursor();
    cursor.read(messages).cloned().collect()
}

#[test]
fn fixed_step_applies_commands_and_forwards_events() {
    let mut app = App::new();
    app.add_plugins(HostilesPlugin::default());

    app.world_mut().write_message(HostCommand::ActivateBase(seed(1, "mining_claim", 0.0, 0.0)));
    HOST_COMMAND_QUEUE.lock().expect("queue")
        .push(HostCommand::ActivateBase(seed(2, "pirate_outpost", 5_000.0, 0.0)));
    app.world_mut().run_schedule(FixedUpdate);

    let state = app.world().resource::<SimulationState>();
    assert_eq!(state.now_ms, 50);
    assert_eq!(state.bases.len(), 2);
    assert_eq!(state.npcs.len(), 3 + 4);
    assert!(state.pending_events().is_empty());
    let target = state.base(BaseId(1)).and_then(|b| b.garrison.first().copied()).expect("prospector");

    let events = sim_events(&app);
    assert_eq!(count_events(&events, |e| matches!(e, SimEvent::BaseActivated { .. })), 2);
    assert_eq!(count_events(&events, |e| matches!(e, SimEvent::NpcSpawned { .. })), 7);

    app.world_mut().write_message(HostCommand::DamageNpc { npc: target, amount: 1.0e6, attacker: Some(PlayerId(1)) });
    app.world_mut().run_schedule(FixedUpdate);

    let state = app.world().resource::<SimulationState>();
    assert_eq!(state.now_ms, 100);
    assert!(state.npc(target).is_none());
    let events = sim_events(&app);
    assert!(events.iter().any(|e| matches!(e, SimEvent::NpcDestroyed { npc, .. } if *npc == target)));
}
