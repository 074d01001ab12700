//! Assimilation systems - Drones latching onto enemy bases and converting them to the hive

use bevy::math::Vec2;
use std::collections::BTreeSet;
use std::f32::consts::TAU;

use crate::components::{BaseId, NpcId, NpcState};
use crate::error::AttachRejection;
use crate::messages::SimEvent;
use crate::world::{BaseExtension, SimulationState};

/// Result of a successful attach.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttachOutcome {
    /// Drones on the base after this one (threshold when it converted).
    pub attached: usize,
    pub converted: bool,
}

impl SimulationState {
    /// Latch `drone` onto `base_id`. Converts the base in the same call once the threshold is reached.
    /// Rejections leave everything untouched.
    pub fn attach(&mut self, drone: NpcId, base_id: BaseId) -> Result<AttachOutcome, AttachRejection> {
        let npc = self.npcs.get(&drone).ok_or(AttachRejection::UnknownDrone(drone))?;
        if !self.catalog.npc(&npc.type_key).is_some_and(|d| d.assimilation_drone) {
            return Err(AttachRejection::NotADrone(drone));
        }
        if let Some(base) = npc.attached_to {
            return Err(AttachRejection::AlreadyAttached { drone, base });
        }
        let base = self.bases.get(&base_id).ok_or(AttachRejection::UnknownBase(base_id))?;
        if base.destroyed {
            return Err(AttachRejection::BaseDestroyed(base_id));
        }
        if !base.faction.is_assimilable() || self.catalog.assimilated_variant(&base.type_key).is_none() {
            return Err(AttachRejection::NotAssimilable(base_id));
        }
        let center = base.position;

        let threshold = self.config.assimilation_threshold.max(1);
        let record = self.assimilation.entry(base_id).or_default();
        let index = record.len();
        record.insert(drone);
        let attached = record.len();

        let angle = index as f32 * TAU / threshold as f32;
        let radius = self.config.drone_attach_radius;
        if let Some(npc) = self.npcs.get_mut(&drone) {
            npc.state = NpcState::Attached;
            npc.attached_to = Some(base_id);
            npc.position = center + Vec2::from_angle(angle) * radius;
        }
        self.emit(SimEvent::DroneAttached { drone, base: base_id, attached, threshold });

        let converted = attached >= threshold && self.convert_base(base_id);
        Ok(AttachOutcome { attached, converted })
    }

    /// Let go of a drone (death, despawn, host cleanup). Its state drops back to patrol if it lives.
    pub fn detach(&mut self, drone: NpcId) -> bool {
        let Some(npc) = self.npcs.get_mut(&drone) else { return false };
        let Some(base) = npc.attached_to.take() else { return false };
        if npc.state == NpcState::Attached {
            npc.state = NpcState::Patrol;
        }
        self.release_attachment(drone, base)
    }

    /// Drop the drone from whichever place owns it: the progress record, else the converted base.
    pub(crate) fn release_attachment(&mut self, drone: NpcId, base_id: BaseId) -> bool {
        if let Some(record) = self.assimilation.get_mut(&base_id) {
            if record.remove(&drone) {
                if record.is_empty() {
                    self.assimilation.remove(&base_id);
                }
                return true;
            }
        }
        if let Some(base) = self.bases.get_mut(&base_id) {
            if let Some(pos) = base.absorbed_drones.iter().position(|d| *d == drone) {
                base.absorbed_drones.remove(pos);
                return true;
            }
        }
        false
    }

    /// Hand the base to the hive: new type and faction, garrison translated,
    /// drones moved onto the base, hive spawn config, then the queen gate.
    fn convert_base(&mut self, base_id: BaseId) -> bool {
        let now = self.now_ms;
        let Some(base) = self.bases.get(&base_id) else { return false };
        let Some(def) = self.catalog.assimilated_variant(&base.type_key) else { return false };
        let (from_type, to_type) = (base.type_key.clone(), def.key.clone());
        let cap = def.spawn.max_npcs;
        let roster: Vec<NpcId> = base.roster().collect();

        let mut converted = Vec::new();
        let mut expelled = Vec::new();
        for id in roster {
            let Some(npc) = self.npcs.get_mut(&id) else { continue };
            let target = self.catalog.conversion(&npc.type_key).and_then(|k| self.catalog.npc(k));
            match target {
                Some(target) if converted.len() < cap => {
                    npc.retype(target);
                    converted.push(id);
                }
                _ => expelled.push(id),
            }
        }

        let (aggro_mult, damage_mult) = (self.config.orphan_aggro_mult, self.config.orphan_damage_mult);
        for id in &expelled {
            if let Some(npc) = self.npcs.get_mut(id) {
                npc.orphan(now, aggro_mult, damage_mult);
            }
            // Expelled leaders hand their formation to the converted members.
            self.formation_on_death(*id);
        }

        let drones: Vec<NpcId> = self.assimilation.remove(&base_id)
            .map(|d| d.into_iter().collect())
            .unwrap_or_default();

        let Some(def) = self.catalog.assimilated_variant(&from_type) else { return false };
        let Some(base) = self.bases.get_mut(&base_id) else { return false };
        let fraction = base.health_fraction();
        base.type_key = def.key.clone();
        base.faction = def.faction;
        base.max_health = def.max_health;
        base.health = def.max_health * fraction;
        base.garrison = converted.iter().copied().collect();
        base.special_units = BTreeSet::new();
        base.pending.clear();
        base.absorbed_drones = drones;
        base.ext = BaseExtension::None;
        let position = base.position;

        for id in &expelled {
            self.emit(SimEvent::NpcOrphaned { npc: *id, base: base_id });
        }
        tracing::info!(
            "base {:?} assimilated: {} -> {} ({} converted, {} expelled)",
            base_id, from_type, to_type, converted.len(), expelled.len(),
        );
        self.emit(SimEvent::BaseAssimilated {
            base: base_id,
            from_type,
            to_type,
            position,
            converted,
            expelled,
        });

        if let Err(reason) = self.try_spawn_queen(position) {
            tracing::debug!("queen gate after assimilation of {:?}: {}", base_id, reason);
        }
        true
    }
}
