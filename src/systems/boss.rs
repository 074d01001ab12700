//! Boss systems - Swarm queen and void leviathan gates, hatch/emerge, minion waves

use bevy::math::Vec2;
use rand::Rng;
use std::collections::BTreeSet;
use std::f32::consts::TAU;

use crate::api::PlayerPresence;
use crate::catalog::weighted_pick;
use crate::components::{NpcId, NpcState};
use crate::constants::{
    ASSIMILATED_PREFIX, LEVIATHAN_MINION_RING, LEVIATHAN_MINION_TYPE, QUEEN_MINION_MIX,
    QUEEN_MINION_RING, SWARM_HIVE, SWARM_QUEEN, VOID_LEVIATHAN,
};
use crate::error::BossGateRejection;
use crate::messages::{ScheduledAction, SimEvent, SpawnCause, WaveTrigger};
use crate::world::{LeviathanState, QueenState, SimulationState};

fn cooldown_check(last: Option<u64>, cooldown_ms: u64, now: u64) -> Result<(), BossGateRejection> {
    match last {
        Some(t) if now < t + cooldown_ms => Err(BossGateRejection::Cooldown { remaining_ms: t + cooldown_ms - now }),
        _ => Ok(()),
    }
}

fn any_player_within(players: &[PlayerPresence], center: Vec2, radius: f32) -> bool {
    let r2 = radius * radius;
    players.iter().any(|p| p.position.distance_squared(center) <= r2)
}

impl SimulationState {
    // ========================================================================
    // SWARM QUEEN
    // ========================================================================

    /// Lay a queen egg if the hive holds enough converted bases near its heart.
    /// Reference point is the lowest-id live swarm hive, else `fallback`.
    pub fn try_spawn_queen(&mut self, fallback: Vec2) -> Result<NpcId, BossGateRejection> {
        let now = self.now_ms;
        if self.queen.is_some() {
            return Err(BossGateRejection::AlreadyAlive);
        }
        cooldown_check(self.last_queen_at, self.config.queen_cooldown_ms, now)?;

        let reference = self.bases.values()
            .find(|b| b.type_key == SWARM_HIVE && !b.destroyed)
            .map_or(fallback, |b| b.position);
        let r2 = self.config.queen_spawn_radius * self.config.queen_spawn_radius;
        let found = self.bases.values()
            .filter(|b| !b.destroyed && b.type_key.starts_with(ASSIMILATED_PREFIX))
            .filter(|b| b.position.distance_squared(reference) <= r2)
            .count();
        let required = self.config.queen_min_assimilated;
        if found < required {
            return Err(BossGateRejection::InsufficientAssimilation { found, required });
        }

        let id = self.spawn_npc(SWARM_QUEEN, reference, None, SpawnCause::QueenEgg)
            .ok_or(BossGateRejection::MissingType)?;
        if let Some(egg) = self.npcs.get_mut(&id) {
            egg.state = NpcState::Hatching;
        }
        self.queen = Some(QueenState {
            npc: id,
            laid_at: now,
            hatched: false,
            contact_at: None,
            thresholds_fired: vec![false; self.config.queen_health_thresholds.len()],
            last_wave_at: None,
            minions: BTreeSet::new(),
        });
        self.last_queen_at = Some(now);
        self.scheduler.schedule(now + self.config.queen_hatch_ms, ScheduledAction::QueenHatch { npc: id });

        tracing::info!("swarm queen egg {:?} laid at {:?} ({} assimilated bases)", id, reference, found);
        self.emit(SimEvent::QueenEggLaid { npc: id, position: reference, assimilated_bases: found });
        Ok(id)
    }

    pub(crate) fn hatch_queen(&mut self, npc_id: NpcId) {
        let Some(queen) = self.queen.as_mut().filter(|q| q.npc == npc_id && !q.hatched) else { return };
        let Some(npc) = self.npcs.get_mut(&npc_id).filter(|n| n.state == NpcState::Hatching) else { return };
        npc.state = NpcState::Patrol;
        queen.hatched = true;
        tracing::info!("swarm queen {:?} hatched", npc_id);
        self.emit(SimEvent::QueenHatched { npc: npc_id });
    }

    /// Queen combat hook: first contact, health thresholds, periodic waves.
    pub fn queen_combat_tick(&mut self, players: &[PlayerPresence]) {
        let now = self.now_ms;
        let Some(mut queen) = self.queen.take() else { return };
        let Some(npc) = self.npcs.get(&queen.npc).filter(|_| queen.hatched) else {
            self.queen = Some(queen);
            return;
        };
        let (center, fraction) = (npc.position, npc.health_fraction());
        queen.minions.retain(|m| self.npcs.contains_key(m));

        let mut triggers = Vec::new();
        let near = any_player_within(players, center, self.config.queen_contact_radius);
        if near && queen.contact_at.is_none() {
            queen.contact_at = Some(now);
            triggers.push(WaveTrigger::FirstContact);
        }
        for (index, threshold) in self.config.queen_health_thresholds.iter().enumerate() {
            if let Some(fired) = queen.thresholds_fired.get_mut(index) {
                if !*fired && fraction <= *threshold {
                    *fired = true;
                    triggers.push(WaveTrigger::HealthThreshold { index });
                }
            }
        }
        let combat_long_enough = queen.contact_at
            .is_some_and(|t| now >= t + self.config.queen_periodic_delay_ms);
        let wave_due = queen.last_wave_at
            .is_none_or(|t| now >= t + self.config.queen_wave_interval_ms);
        if triggers.is_empty() && near && combat_long_enough && wave_due {
            triggers.push(WaveTrigger::Periodic);
        }

        for trigger in triggers {
            let room = self.config.queen_max_minions.saturating_sub(queen.minions.len());
            let count = self.rng.random_range(2..=4).min(room);
            let mut spawned = Vec::with_capacity(count);
            for i in 0..count {
                let Some(key) = weighted_pick(&mut self.rng, &QUEEN_MINION_MIX[..]) else { break };
                let pos = center + Vec2::from_angle(i as f32 * TAU / count as f32) * QUEEN_MINION_RING;
                if let Some(id) = self.spawn_npc(key, pos, None, SpawnCause::QueenMinion) {
                    queen.minions.insert(id);
                    spawned.push(id);
                }
            }
            queen.last_wave_at = Some(now);
            if !spawned.is_empty() {
                self.emit(SimEvent::QueenMinionWave { queen: queen.npc, trigger, spawned });
            }
        }
        self.queen = Some(queen);
    }

    // ========================================================================
    // VOID LEVIATHAN
    // ========================================================================

    /// Roll for a leviathan at the site of a void death.
    pub fn roll_leviathan(&mut self, site: Vec2) -> Result<NpcId, BossGateRejection> {
        let now = self.now_ms;
        if self.leviathan.is_some() {
            return Err(BossGateRejection::AlreadyAlive);
        }
        cooldown_check(self.last_leviathan_at, self.config.leviathan_cooldown_ms, now)?;
        let chance = self.config.leviathan_spawn_chance.clamp(0.0, 1.0);
        if !self.rng.random_bool(chance) {
            return Err(BossGateRejection::RollFailed);
        }

        let id = self.spawn_npc(VOID_LEVIATHAN, site, None, SpawnCause::Leviathan)
            .ok_or(BossGateRejection::MissingType)?;
        if let Some(npc) = self.npcs.get_mut(&id) {
            npc.state = NpcState::Spawning;
        }
        self.leviathan = Some(LeviathanState {
            npc: id,
            spawned_at: now,
            active: false,
            last_wave_at: None,
            minions: BTreeSet::new(),
        });
        self.last_leviathan_at = Some(now);
        self.scheduler.schedule(now + self.config.leviathan_emerge_ms, ScheduledAction::LeviathanEmerge { npc: id });

        tracing::info!("void leviathan {:?} emerging at {:?}", id, site);
        self.emit(SimEvent::LeviathanEmerging { npc: id, position: site });
        Ok(id)
    }

    pub(crate) fn emerge_leviathan(&mut self, npc_id: NpcId) {
        let Some(leviathan) = self.leviathan.as_mut().filter(|l| l.npc == npc_id && !l.active) else { return };
        let Some(npc) = self.npcs.get_mut(&npc_id).filter(|n| n.state == NpcState::Spawning) else { return };
        npc.state = NpcState::Patrol;
        leviathan.active = true;
        self.emit(SimEvent::LeviathanActive { npc: npc_id });
    }

    /// Leviathan combat hook: a whisper wave every interval while a player is close.
    pub fn leviathan_combat_tick(&mut self, players: &[PlayerPresence]) {
        let now = self.now_ms;
        let Some(mut leviathan) = self.leviathan.take() else { return };
        let Some(center) = self.npcs.get(&leviathan.npc)
            .filter(|_| leviathan.active)
            .map(|n| n.position)
        else {
            self.leviathan = Some(leviathan);
            return;
        };
        leviathan.minions.retain(|m| self.npcs.contains_key(m));

        let near = any_player_within(players, center, self.config.leviathan_contact_radius);
        let wave_due = leviathan.last_wave_at
            .is_none_or(|t| now >= t + self.config.leviathan_wave_interval_ms);
        let room = self.config.leviathan_max_minions.saturating_sub(leviathan.minions.len());
        if near && wave_due && room > 0 {
            let count = self.rng.random_range(2..=3).min(room);
            let offset = self.rng.random_range(0.0..TAU);
            let mut spawned = Vec::with_capacity(count);
            for i in 0..count {
                let angle = offset + i as f32 * TAU / count as f32;
                let pos = center + Vec2::from_angle(angle) * LEVIATHAN_MINION_RING;
                if let Some(id) = self.spawn_npc(LEVIATHAN_MINION_TYPE, pos, None, SpawnCause::LeviathanMinion) {
                    leviathan.minions.insert(id);
                    spawned.push(id);
                }
            }
            leviathan.last_wave_at = Some(now);
            self.emit(SimEvent::LeviathanMinionWave { leviathan: leviathan.npc, spawned });
        }
        self.leviathan = Some(leviathan);
    }
}
