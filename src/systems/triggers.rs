//! Trigger systems - Per-faction escalation: scrap haulers, claim excavators/foremen,
//! pirate scouts, captains and the dreadnought

use bevy::math::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

use crate::components::{BaseId, NpcId, NpcState};
use crate::constants::{
    PIRATE_CAPTAIN, PIRATE_DREADNOUGHT, PIRATE_FIGHTER, PIRATE_SCOUT, PIRATE_SCOUT_DISTANCE,
    ROGUE_EXCAVATOR, ROGUE_FOREMAN, ROGUE_PROSPECTOR, SCAVENGER_HAULER, SCAVENGER_YARD,
    FORMATION_MAX_FOLLOWERS,
};
use crate::messages::{ScheduledAction, SimEvent, SpawnCause};
use crate::world::{BaseExtension, SimulationState};

impl SimulationState {
    // ========================================================================
    // SCAVENGER YARD
    // ========================================================================

    /// A yard unit dumped wreckage. Enough scrap (and no hauler around) starts a timed transformation.
    pub fn on_scrap_dumped(&mut self, npc_id: NpcId, amount: u32) -> bool {
        let now = self.now_ms;
        let Some(base_id) = self.owning_base(npc_id) else { return false };
        let threshold = self.config.scrap_hauler_threshold;
        let transform_ms = self.config.hauler_transform_ms;
        let Some(base) = self.bases.get_mut(&base_id) else { return false };
        let BaseExtension::ScavengerYard { scrap_pile, transforming, hauler } = &mut base.ext else { return false };

        *scrap_pile = scrap_pile.saturating_add(amount);
        let pile = *scrap_pile;
        let hauler_alive = hauler.is_some_and(|h| self.npcs.contains_key(&h));
        let start = pile >= threshold && !*transforming && !hauler_alive;
        if start {
            *scrap_pile -= threshold;
            *transforming = true;
        }

        self.emit(SimEvent::ScrapDeposited { base: base_id, scrap_pile: pile });
        if start {
            let ready_at = now + transform_ms;
            self.scheduler.schedule(ready_at, ScheduledAction::HaulerTransform { base: base_id });
            tracing::debug!("scavenger yard {:?}: hauler transformation started", base_id);
            self.emit(SimEvent::HaulerTransformStarted { base: base_id, ready_at });
        }
        true
    }

    /// Deferred half of the hauler transformation. Dropped if the yard moved on meanwhile.
    pub(crate) fn finish_hauler_transform(&mut self, base_id: BaseId) {
        let Some(base) = self.bases.get_mut(&base_id) else { return };
        if base.destroyed || base.type_key != SCAVENGER_YARD {
            return;
        }
        let BaseExtension::ScavengerYard { transforming, .. } = &mut base.ext else { return };
        if !*transforming {
            return;
        }
        *transforming = false;
        let center = base.position;

        let Some(id) = self.spawn_special(base_id, SCAVENGER_HAULER, center, SpawnCause::Hauler) else { return };
        if let Some(BaseExtension::ScavengerYard { hauler, .. }) = self.bases.get_mut(&base_id).map(|b| &mut b.ext) {
            *hauler = Some(id);
        }
        tracing::info!("scavenger yard {:?} fielded hauler {:?}", base_id, id);
    }

    // ========================================================================
    // MINING CLAIM
    // ========================================================================

    /// Ore sold at the claim. Prospectors may call an excavator, excavators the foreman.
    pub fn on_miner_deposit(&mut self, npc_id: NpcId, credits: u64) -> bool {
        let Some(base_id) = self.owning_base(npc_id) else { return false };
        let Some(type_key) = self.npcs.get(&npc_id).map(|n| n.type_key.clone()) else { return false };
        let Some(base) = self.bases.get_mut(&base_id) else { return false };
        let BaseExtension::MiningClaim { credits: claim, foreman } = &mut base.ext else { return false };

        *claim = claim.saturating_add(credits);
        let claim_credits = *claim;
        let foreman_alive = foreman.is_some_and(|f| self.npcs.contains_key(&f));
        let center = base.position;
        let spread = self.catalog.base(&base.type_key).map_or(0.0, |d| d.spawn.spawn_spread);
        self.emit(SimEvent::ClaimDeposit { base: base_id, claim_credits });

        let call_in = match type_key.as_str() {
            ROGUE_PROSPECTOR if self.rng.random_bool(self.config.excavator_spawn_chance.clamp(0.0, 1.0)) => {
                Some((ROGUE_EXCAVATOR, SpawnCause::Excavator))
            }
            ROGUE_EXCAVATOR if !foreman_alive
                && self.rng.random_bool(self.config.foreman_spawn_chance.clamp(0.0, 1.0)) => {
                Some((ROGUE_FOREMAN, SpawnCause::Foreman))
            }
            _ => None,
        };
        if let Some((key, cause)) = call_in {
            let pos = self.scatter(center, spread);
            if let Some(id) = self.spawn_special(base_id, key, pos, cause) {
                if cause == SpawnCause::Foreman {
                    if let Some(BaseExtension::MiningClaim { foreman, .. }) = self.bases.get_mut(&base_id).map(|b| &mut b.ext) {
                        *foreman = Some(id);
                    }
                    tracing::info!("mining claim {:?} called in foreman {:?}", base_id, id);
                }
            }
        }
        true
    }

    // ========================================================================
    // PIRATE OUTPOST
    // ========================================================================

    /// Launch a scout on the interval while the outpost is short of them.
    pub(crate) fn pirate_scout_tick(&mut self, base_id: BaseId) {
        let now = self.now_ms;
        let interval = self.config.pirate_scout_interval_ms;
        let max_scouts = self.config.pirate_max_scouts;
        let Some(base) = self.bases.get_mut(&base_id) else { return };
        if base.destroyed {
            return;
        }
        let center = base.position;
        let BaseExtension::PirateOutpost { scouts, last_scout_at, .. } = &mut base.ext else { return };
        scouts.retain(|s| self.npcs.contains_key(s));
        if scouts.len() >= max_scouts || now < *last_scout_at + interval {
            return;
        }
        *last_scout_at = now;

        let (min, max) = PIRATE_SCOUT_DISTANCE;
        let angle = self.rng.random_range(0.0..TAU);
        let dist = self.rng.random_range(min..=max);
        let pos = center + Vec2::from_angle(angle) * dist;
        let Some(id) = self.spawn_special(base_id, PIRATE_SCOUT, pos, SpawnCause::Scout) else { return };
        if let Some(BaseExtension::PirateOutpost { scouts, .. }) = self.bases.get_mut(&base_id).map(|b| &mut b.ext) {
            scouts.insert(id);
        }
    }

    /// Scout intel is the only way a captain appears. The captain raids the reported
    /// target leading the outpost's fighters.
    pub fn on_pirate_intel(&mut self, npc_id: NpcId, target: Vec2) -> bool {
        if !self.npcs.get(&npc_id).is_some_and(|n| n.type_key == PIRATE_SCOUT) {
            return false;
        }
        let Some(base_id) = self.owning_base(npc_id) else { return false };
        let Some(base) = self.bases.get_mut(&base_id) else { return false };
        let center = base.position;
        let BaseExtension::PirateOutpost { intel, captain, .. } = &mut base.ext else { return false };
        *intel = Some(target);
        let captain_alive = captain.is_some_and(|c| self.npcs.contains_key(&c));
        self.emit(SimEvent::IntelReported { base: base_id, scout: npc_id, target });
        if captain_alive {
            return true;
        }

        let Some(id) = self.spawn_special(base_id, PIRATE_CAPTAIN, center, SpawnCause::Captain) else { return true };
        if let Some(npc) = self.npcs.get_mut(&id) {
            npc.state = NpcState::Raid;
            npc.raid_target = Some(target);
        }
        self.emit(SimEvent::NpcStateChanged { npc: id, state: NpcState::Raid });

        let fighters: Vec<NpcId> = self.bases.get(&base_id)
            .map(|b| b.garrison.iter()
                .filter(|f| self.npcs.get(*f).is_some_and(|n| n.type_key == PIRATE_FIGHTER))
                .copied()
                .take(FORMATION_MAX_FOLLOWERS)
                .collect())
            .unwrap_or_default();
        if let Some(BaseExtension::PirateOutpost { captain, .. }) = self.bases.get_mut(&base_id).map(|b| &mut b.ext) {
            *captain = Some(id);
        }
        if !fighters.is_empty() {
            self.register_formation(id, fighters);
        }
        tracing::info!("pirate outpost {:?}: captain {:?} raiding {:?}", base_id, id, target);
        true
    }

    /// One dreadnought per outpost lifetime, the first time health falls to the threshold.
    pub(crate) fn check_dreadnought(&mut self, base_id: BaseId) {
        let fraction = self.config.dreadnought_health_fraction;
        let Some(base) = self.bases.get_mut(&base_id) else { return };
        if base.destroyed || base.health_fraction() > fraction {
            return;
        }
        let center = base.position;
        let BaseExtension::PirateOutpost { dreadnought_spawned, .. } = &mut base.ext else { return };
        if *dreadnought_spawned {
            return;
        }
        *dreadnought_spawned = true;
        if let Some(id) = self.spawn_special(base_id, PIRATE_DREADNOUGHT, center, SpawnCause::Dreadnought) {
            tracing::info!("pirate outpost {:?} launched dreadnought {:?}", base_id, id);
        }
    }
}
