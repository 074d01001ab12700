//! Spawn systems - Base activation, garrison spawning, respawn queue, base revival

use bevy::math::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

use crate::api::{PlayerPresence, PositionProvider};
use crate::components::{BaseId, NpcId, NpcInstance, NpcState};
use crate::constants::{FORMATION_MAX_FOLLOWERS, PIRATE_OUTPOST};
use crate::messages::{RemovalCause, SimEvent, SpawnCause};
use crate::world::{BaseInstance, BaseSeed, PendingRespawn, SimulationState};

impl SimulationState {
    /// Create an NPC of `type_key` and put it in the store. Rosters are the caller's business.
    pub fn spawn_npc(
        &mut self,
        type_key: &str,
        position: Vec2,
        home: Option<BaseId>,
        cause: SpawnCause,
    ) -> Option<NpcId> {
        let Some(def) = self.catalog.npc(type_key) else {
            tracing::warn!("spawn_npc: unknown npc type {}", type_key);
            return None;
        };
        let mut npc = NpcInstance::from_def(NpcId(0), def, position, self.now_ms);
        let id = self.alloc_npc_id();
        npc.id = id;
        npc.home_base = home;
        self.npcs.insert(id, npc);
        self.emit(SimEvent::NpcSpawned {
            npc: id,
            type_key: type_key.to_string(),
            position,
            cause,
            base: home,
        });
        Some(id)
    }

    /// Uniform random point within `radius` of `center`.
    pub(crate) fn scatter(&mut self, center: Vec2, radius: f32) -> Vec2 {
        if radius <= 0.0 {
            return center;
        }
        let angle = self.rng.random_range(0.0..TAU);
        let dist = radius * self.rng.random_range(0.0f32..1.0).sqrt();
        center + Vec2::from_angle(angle) * dist
    }

    /// Spawn a trigger unit onto a base's special roster.
    pub(crate) fn spawn_special(
        &mut self,
        base_id: BaseId,
        type_key: &str,
        position: Vec2,
        cause: SpawnCause,
    ) -> Option<NpcId> {
        let id = self.spawn_npc(type_key, position, Some(base_id), cause)?;
        if let Some(base) = self.bases.get_mut(&base_id) {
            base.special_units.insert(id);
        }
        Some(id)
    }

    /// Pick from the base's pool and add one unit to its garrison.
    fn spawn_garrison_unit(&mut self, base_id: BaseId, cause: SpawnCause) -> Option<NpcId> {
        let base = self.bases.get(&base_id)?;
        let def = self.catalog.base(&base.type_key)?;
        let type_key = def.spawn.pick(&mut self.rng)?.to_string();
        let (center, spread) = (base.position, def.spawn.spawn_spread);

        let position = self.scatter(center, spread);
        let id = self.spawn_npc(&type_key, position, Some(base_id), cause)?;
        let now = self.now_ms;
        if let Some(base) = self.bases.get_mut(&base_id) {
            base.garrison.insert(id);
            base.last_spawn_at = Some(now);
        }
        self.form_up(id, base_id);
        Some(id)
    }

    /// A freshly spawned formation leader collects unformed garrison mates.
    fn form_up(&mut self, leader: NpcId, base_id: BaseId) {
        let is_leader = self.npcs.get(&leader)
            .and_then(|n| self.catalog.npc(&n.type_key))
            .is_some_and(|d| d.formation_leader);
        if !is_leader {
            return;
        }
        let Some(base) = self.bases.get(&base_id) else { return };
        let candidates: Vec<NpcId> = base.garrison.iter()
            .filter(|id| **id != leader)
            .filter(|id| {
                self.npcs.get(*id)
                    .and_then(|n| self.catalog.npc(&n.type_key))
                    .is_some_and(|d| !d.formation_leader && !d.boss)
            })
            .copied()
            .collect();
        let followers: Vec<NpcId> = candidates.into_iter()
            .filter(|id| self.formations.formation_of(*id).is_none())
            .take(FORMATION_MAX_FOLLOWERS)
            .collect();
        if !followers.is_empty() {
            self.register_formation(leader, followers);
        }
    }

    fn initial_spawn(&mut self, base_id: BaseId) {
        let count = self.bases.get(&base_id)
            .and_then(|b| self.catalog.base(&b.type_key))
            .map_or(0, |d| d.spawn.initial_spawn.min(d.spawn.max_npcs));
        for _ in 0..count {
            self.spawn_garrison_unit(base_id, SpawnCause::Garrison);
        }
    }

    // ========================================================================
    // ACTIVATION
    // ========================================================================

    /// Start tracking a base the world generator brought into range.
    /// False if the id is already active or the type is unknown.
    pub fn activate(&mut self, seed: BaseSeed) -> bool {
        if self.bases.contains_key(&seed.id) {
            tracing::debug!("activate: base {:?} already active", seed.id);
            return false;
        }
        let Some(def) = self.catalog.base(&seed.type_key) else {
            tracing::warn!("activate: unknown base type {}", seed.type_key);
            return false;
        };
        let base = BaseInstance::new(&seed, def, self.now_ms);
        self.bases.insert(seed.id, base);
        self.emit(SimEvent::BaseActivated {
            base: seed.id,
            base_type: seed.type_key.clone(),
            position: seed.position,
        });
        self.initial_spawn(seed.id);
        true
    }

    /// Stop tracking a base. Its rosters go with it, except drones latched onto
    /// some other base and bosses. Bosses are orphaned so the despawn timeout
    /// still reaches them. Drones latched onto this base are let go.
    pub fn deactivate(&mut self, base_id: BaseId) -> bool {
        let now = self.now_ms;
        let (aggro_mult, damage_mult) = (self.config.orphan_aggro_mult, self.config.orphan_damage_mult);
        let Some(base) = self.bases.remove(&base_id) else { return false };

        let mut released: Vec<NpcId> = self.assimilation.remove(&base_id)
            .map(|drones| drones.into_iter().collect())
            .unwrap_or_default();
        released.extend(base.absorbed_drones.iter().copied());
        for drone in released {
            if let Some(npc) = self.npcs.get_mut(&drone) {
                npc.attached_to = None;
                npc.state = NpcState::Patrol;
                self.emit(SimEvent::NpcStateChanged { npc: drone, state: NpcState::Patrol });
            }
        }

        for id in base.roster() {
            let Some(npc) = self.npcs.get_mut(&id) else { continue };
            let is_boss = self.catalog.npc(&npc.type_key).is_some_and(|d| d.boss);
            let attached_elsewhere = npc.attached_to.is_some_and(|b| b != base_id);
            if attached_elsewhere {
                npc.home_base = None;
                continue;
            }
            if is_boss {
                npc.orphan(now, aggro_mult, damage_mult);
                self.emit(SimEvent::NpcOrphaned { npc: id, base: base_id });
                continue;
            }
            self.remove_npc(id, RemovalCause::BaseDeactivated);
        }

        self.emit(SimEvent::BaseDeactivated { base: base_id });
        true
    }

    // ========================================================================
    // PER-TICK SPAWNING
    // ========================================================================

    /// Refresh positions, turn garrison deaths into pending respawns, then spawn
    /// at most one unit per base.
    pub fn update_spawning(&mut self, players: &[PlayerPresence], positions: &dyn PositionProvider) {
        let now = self.now_ms;
        let ids: Vec<BaseId> = self.bases.keys().copied().collect();
        for base_id in ids {
            let Some(base) = self.bases.get_mut(&base_id) else { continue };
            if base.destroyed {
                continue;
            }
            if let Some(pos) = base.world_object_id.and_then(|obj| positions.object_position(obj)) {
                base.position = pos;
            }

            let delay = self.catalog.base(&base.type_key).map_or(0, |d| d.spawn.respawn_delay_ms);
            let npcs = &self.npcs;
            let dead: Vec<NpcId> = base.garrison.iter()
                .filter(|id| !npcs.contains_key(*id))
                .copied()
                .collect();
            for id in dead {
                base.garrison.remove(&id);
                base.pending.push_back(PendingRespawn { ready_at: now + delay });
            }
            base.special_units.retain(|id| npcs.contains_key(id));
            let is_outpost = base.type_key == PIRATE_OUTPOST;

            self.try_spawn(base_id, players);
            if is_outpost {
                self.pirate_scout_tick(base_id);
            }
        }
    }

    fn try_spawn(&mut self, base_id: BaseId, players: &[PlayerPresence]) {
        let now = self.now_ms;
        let Some(base) = self.bases.get_mut(&base_id) else { return };
        let Some(def) = self.catalog.base(&base.type_key) else { return };
        let spawn = &def.spawn;

        if base.garrison.len() >= spawn.capacity() {
            return;
        }
        if base.last_spawn_at.is_some_and(|t| now < t + spawn.spawn_cooldown_ms) {
            return;
        }
        if spawn.continuous {
            let r2 = spawn.patrol_radius * spawn.patrol_radius;
            if !players.iter().any(|p| p.position.distance_squared(base.position) <= r2) {
                return;
            }
        }

        let cause = if base.pending.front().is_some_and(|p| p.ready_at <= now) {
            base.pending.pop_front();
            SpawnCause::Respawn
        } else if spawn.continuous && base.pending.is_empty() {
            SpawnCause::Garrison
        } else {
            return;
        };
        self.spawn_garrison_unit(base_id, cause);
    }

    /// Bring destroyed bases back once their timer is up, as their original type.
    pub(crate) fn revive_bases(&mut self) {
        let now = self.now_ms;
        let due: Vec<BaseId> = self.bases.values()
            .filter(|b| b.destroyed && b.respawn_at.is_some_and(|t| now >= t))
            .map(|b| b.id)
            .collect();
        for base_id in due {
            let Some(base) = self.bases.get_mut(&base_id) else { continue };
            let Some(def) = self.catalog.base(&base.original_type) else {
                tracing::warn!("base {:?}: original type {} missing, cannot respawn", base_id, base.original_type);
                continue;
            };
            base.reset_to(def, now);
            base.destroyed = false;
            base.respawn_at = None;
            base.ledger.clear();
            base.garrison.clear();
            base.special_units.clear();
            base.absorbed_drones.clear();
            let (base_type, position) = (base.type_key.clone(), base.position);

            tracing::info!("base {:?} respawned as {}", base_id, base_type);
            self.emit(SimEvent::BaseRespawned { base: base_id, base_type, position });
            self.initial_spawn(base_id);
        }
    }
}
