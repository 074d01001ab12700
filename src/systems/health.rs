//! Health systems - Damage, death, reward split, base destruction fallout

use crate::api::LootGenerator;
use crate::catalog::{DeathEffect, Faction};
use crate::components::{BaseId, NpcId, NpcInstance, NpcState, PlayerId};
use crate::messages::{RemovalCause, RewardShare, SimEvent};
use crate::settings::EngineConfig;
use crate::world::SimulationState;

/// Team-size reward split. `total = round(base * multiplier[N])`, each player gets `round(total / N)`.
pub fn split_reward(base_reward: u64, contributors: &[PlayerId]) -> Vec<RewardShare> {
    let n = contributors.len();
    if n == 0 {
        return Vec::new();
    }
    let total = (base_reward as f64 * EngineConfig::team_multiplier(n)).round();
    let credits = (total / n as f64).round() as u64;
    contributors.iter()
        .map(|&player| RewardShare { player, credits })
        .collect()
}

impl SimulationState {
    // ========================================================================
    // NPCS
    // ========================================================================

    /// Apply already-resolved damage, shield first. Returns true if the NPC died.
    pub fn damage_npc(
        &mut self,
        npc_id: NpcId,
        amount: f32,
        attacker: Option<PlayerId>,
        loot: &dyn LootGenerator,
    ) -> bool {
        let now = self.now_ms;
        let Some(npc) = self.npcs.get_mut(&npc_id) else { return false };
        if !npc.apply_damage(amount, attacker, now) {
            return false;
        }
        self.kill_npc(npc_id, loot);
        true
    }

    /// Death with wreckage: rewards, loot, death effect, then the leviathan roll for void losses.
    pub fn kill_npc(&mut self, npc_id: NpcId, loot: &dyn LootGenerator) {
        let Some(npc) = self.npcs.remove(&npc_id) else { return };
        let def = self.catalog.npc(&npc.type_key);
        let death_effect = def.map_or(DeathEffect::Explosion, |d| d.death_effect);
        let is_boss = def.is_some_and(|d| d.boss);

        // Eggs leave nothing behind.
        let (rewards, items) = if npc.state == NpcState::Hatching {
            (Vec::new(), Vec::new())
        } else {
            let reward = def.map_or(0, |d| d.credit_reward);
            (split_reward(reward, &npc.ledger.contributors()), loot.generate_loot(&npc.type_key))
        };

        if is_boss {
            tracing::info!("{} {:?} destroyed by {} players", npc.type_key, npc_id, npc.ledger.len());
        }
        self.emit(SimEvent::NpcDestroyed {
            npc: npc_id,
            type_key: npc.type_key.clone(),
            position: npc.position,
            death_effect,
            rewards,
            loot: items,
        });
        self.after_npc_removed(&npc);

        if npc.faction == Faction::Void && !is_boss {
            if let Err(reason) = self.roll_leviathan(npc.position) {
                tracing::trace!("leviathan gate: {}", reason);
            }
        }
    }

    /// Removal without wreckage (despawn, collapse, deactivation).
    pub fn remove_npc(&mut self, npc_id: NpcId, cause: RemovalCause) -> Option<NpcInstance> {
        let npc = self.npcs.remove(&npc_id)?;
        self.emit(SimEvent::NpcRemoved {
            npc: npc_id,
            type_key: npc.type_key.clone(),
            position: npc.position,
            cause,
        });
        self.after_npc_removed(&npc);
        Some(npc)
    }

    /// Bookkeeping shared by every way an NPC leaves the store.
    /// Roster entries are left for `update_spawning` to reconcile.
    fn after_npc_removed(&mut self, npc: &NpcInstance) {
        if let Some(base) = npc.attached_to {
            self.release_attachment(npc.id, base);
        }
        self.formation_on_death(npc.id);

        let now = self.now_ms;
        if self.queen.as_ref().is_some_and(|q| q.npc == npc.id) {
            self.queen = None;
            self.last_queen_at = Some(now);
            tracing::info!("swarm queen {:?} gone, cooldown restarts", npc.id);
            self.emit(SimEvent::QueenDied { npc: npc.id, position: npc.position });
        }
        if self.leviathan.as_ref().is_some_and(|l| l.npc == npc.id) {
            self.leviathan = None;
            self.last_leviathan_at = Some(now);
            tracing::info!("void leviathan {:?} gone, cooldown restarts", npc.id);
            self.emit(SimEvent::LeviathanDied { npc: npc.id, position: npc.position });
        }
    }

    // ========================================================================
    // BASES
    // ========================================================================

    /// Damage a base. Returns true if this hit destroyed it.
    pub fn damage_base(
        &mut self,
        base_id: BaseId,
        amount: f32,
        attacker: Option<PlayerId>,
        loot: &dyn LootGenerator,
    ) -> bool {
        let Some(base) = self.bases.get_mut(&base_id) else { return false };
        if base.destroyed || amount <= 0.0 {
            return false;
        }
        base.health = (base.health - amount).max(0.0);
        if let Some(player) = attacker {
            base.ledger.record(player, amount);
        }
        if base.health > 0.0 {
            self.check_dreadnought(base_id);
            return false;
        }
        self.destroy_base(base_id, loot);
        true
    }

    /// Zero health: pay out, kill attached drones, orphan the rosters, start the respawn timer.
    fn destroy_base(&mut self, base_id: BaseId, loot: &dyn LootGenerator) {
        let now = self.now_ms;
        let respawn_at = now + self.config.base_respawn_delay_ms;
        let Some(base) = self.bases.get_mut(&base_id) else { return };
        base.destroyed = true;
        base.health = 0.0;
        base.respawn_at = Some(respawn_at);
        let contributors = base.ledger.contributors();
        let roster: Vec<NpcId> = base.roster().collect();
        base.garrison.clear();
        base.special_units.clear();
        base.pending.clear();
        let mut drones = std::mem::take(&mut base.absorbed_drones);
        let (base_type, position) = (base.type_key.clone(), base.position);

        let reward = self.catalog.base(&base_type).map_or(0, |d| d.credit_reward);
        let rewards = split_reward(reward, &contributors);
        let items = loot.generate_loot(&base_type);

        if let Some(attached) = self.assimilation.remove(&base_id) {
            drones.extend(attached);
        }
        let mut drones_destroyed = Vec::new();
        for drone in drones {
            if let Some(npc) = self.npcs.get_mut(&drone) {
                npc.attached_to = None;
            }
            if self.remove_npc(drone, RemovalCause::BaseCollapse).is_some() {
                drones_destroyed.push(drone);
            }
        }

        let (aggro_mult, damage_mult) = (self.config.orphan_aggro_mult, self.config.orphan_damage_mult);
        let mut orphaned = Vec::new();
        for id in roster {
            let Some(npc) = self.npcs.get_mut(&id) else { continue };
            if npc.attached_to.is_some() {
                // Latched onto another base; lives and dies with that one.
                npc.home_base = None;
                continue;
            }
            if self.catalog.npc(&npc.type_key).is_some_and(|d| d.linked_health) {
                self.remove_npc(id, RemovalCause::BaseCollapse);
                continue;
            }
            npc.orphan(now, aggro_mult, damage_mult);
            orphaned.push(id);
        }
        for id in &orphaned {
            self.emit(SimEvent::NpcOrphaned { npc: *id, base: base_id });
        }

        tracing::info!(
            "base {:?} ({}) destroyed: {} contributors, {} drones destroyed, {} orphaned",
            base_id, base_type, contributors.len(), drones_destroyed.len(), orphaned.len(),
        );
        self.emit(SimEvent::BaseDestroyed {
            base: base_id,
            base_type,
            position,
            rewards,
            loot: items,
            drones_destroyed,
            orphaned,
        });
    }
}
