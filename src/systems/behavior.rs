//! Behavior systems - Tick orchestration and application of tactics actions

use crate::api::{Collaborators, NpcSnapshot, PlayerPresence};
use crate::components::{NpcId, NpcState};
use crate::messages::{NpcAction, RemovalCause, ScheduledAction, SimEvent};
use crate::world::SimulationState;

impl SimulationState {
    /// Advance the simulation by `dt_ms`.
    ///
    /// Order: clock, due scheduled actions, base revival, base spawning,
    /// per-NPC tactics in id order, boss combat hooks.
    pub fn tick(&mut self, dt_ms: u64, players: &[PlayerPresence], hooks: &mut Collaborators) {
        self.now_ms += dt_ms;
        self.run_scheduled();
        self.revive_bases();
        self.update_spawning(players, hooks.positions);
        self.run_npc_ai(dt_ms, players, hooks);
        self.queen_combat_tick(players);
        self.leviathan_combat_tick(players);
    }

    fn run_scheduled(&mut self) {
        while let Some(action) = self.scheduler.pop_due(self.now_ms) {
            match action {
                ScheduledAction::HaulerTransform { base } => self.finish_hauler_transform(base),
                ScheduledAction::QueenHatch { npc } => self.hatch_queen(npc),
                ScheduledAction::LeviathanEmerge { npc } => self.emerge_leviathan(npc),
            }
        }
    }

    fn run_npc_ai(&mut self, dt_ms: u64, players: &[PlayerPresence], hooks: &mut Collaborators) {
        let ids: Vec<NpcId> = self.npcs.keys().copied().collect();
        let all: Vec<NpcSnapshot> = self.npcs.values().map(|n| self.npc_snapshot(n)).collect();
        let r2 = self.config.ai_awareness_radius * self.config.ai_awareness_radius;

        for id in ids {
            let Some(npc) = self.npcs.get(&id) else { continue };
            if npc.state.is_passive() {
                continue;
            }
            if let Some(action) = self.orphan_timeout_action(id) {
                self.apply_action_as(id, action, RemovalCause::OrphanExpired);
                continue;
            }
            let snapshot = self.npc_snapshot(npc);
            let nearby: Vec<PlayerPresence> = players.iter()
                .filter(|p| p.position.distance_squared(snapshot.position) <= r2)
                .copied()
                .collect();
            if let Some(action) = hooks.tactics.update_npc_ai(&snapshot, &nearby, &all, dt_ms) {
                self.apply_action(id, action);
            }
        }
    }

    /// `Despawn` once an orphan has raged for the full timeout, never earlier.
    pub fn orphan_timeout_action(&self, npc_id: NpcId) -> Option<NpcAction> {
        let npc = self.npcs.get(&npc_id)?;
        let orphaned_at = npc.orphaned_at.filter(|_| npc.is_orphaned())?;
        (self.now_ms >= orphaned_at + self.config.orphan_despawn_ms).then_some(NpcAction::Despawn)
    }

    /// Interpret one tactics decision. Returns false when the action was rejected or had no effect.
    pub fn apply_action(&mut self, npc_id: NpcId, action: NpcAction) -> bool {
        self.apply_action_as(npc_id, action, RemovalCause::Despawned)
    }

    fn apply_action_as(&mut self, npc_id: NpcId, action: NpcAction, removal: RemovalCause) -> bool {
        let now = self.now_ms;
        let Some(npc) = self.npcs.get_mut(&npc_id) else { return false };
        if npc.state.is_passive() && action != NpcAction::Despawn {
            return false;
        }

        match action {
            NpcAction::Despawn => self.remove_npc(npc_id, removal).is_some(),
            NpcAction::Move { position } => {
                if npc.state.is_immobile() {
                    return false;
                }
                npc.position = position;
                true
            }
            NpcAction::Fire { target } => {
                npc.last_fire_ms = Some(now);
                self.emit(SimEvent::NpcFired { npc: npc_id, target });
                true
            }
            NpcAction::Attach { base_id } => match self.attach(npc_id, base_id) {
                Ok(_) => true,
                Err(reason) => {
                    tracing::debug!("attach {:?} -> {:?} rejected: {}", npc_id, base_id, reason);
                    false
                }
            },
            NpcAction::Raid { target } => {
                if npc.state.is_immobile() {
                    return false;
                }
                npc.state = NpcState::Raid;
                npc.raid_target = Some(target);
                self.emit(SimEvent::NpcStateChanged { npc: npc_id, state: NpcState::Raid });
                true
            }
            NpcAction::ScavengerDumped { amount } => self.on_scrap_dumped(npc_id, amount),
            NpcAction::MinerDeposit { credits } => self.on_miner_deposit(npc_id, credits),
            NpcAction::PirateIntel { target } => self.on_pirate_intel(npc_id, target),
        }
    }
}
