//! Formation systems - Leader/follower groupings and succession on leader death

use hashbrown::HashMap;
use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::Catalog;
use crate::components::{FormationId, NpcId, NpcInstance};
use crate::constants::{SUCCESSION_HEALTH_WEIGHT, SUCCESSION_TIER_WEIGHT};
use crate::messages::SimEvent;
use crate::world::SimulationState;

#[derive(Clone, Debug)]
pub struct Formation {
    pub id: FormationId,
    pub leader: Option<NpcId>,
    /// Never contains the leader.
    pub members: BTreeSet<NpcId>,
    pub last_leader: Option<NpcId>,
}

/// Outcome of a leader death that found a survivor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Succession {
    pub formation: FormationId,
    pub old_leader: Option<NpcId>,
    pub new_leader: NpcId,
    pub score: f32,
}

/// Formations plus a reverse index npc -> formation. The index may go stale;
/// `formation_of` drops bad entries when it trips over them.
#[derive(Clone, Debug, Default)]
pub struct FormationRegistry {
    formations: BTreeMap<FormationId, Formation>,
    index: HashMap<NpcId, FormationId>,
    next_id: u32,
}

/// `health_fraction * 100 + tier * 10`.
pub fn succession_score(npc: &NpcInstance, catalog: &Catalog) -> f32 {
    let tier = catalog.npc(&npc.type_key).map_or(0, |d| d.tier);
    npc.health_fraction() * SUCCESSION_HEALTH_WEIGHT + tier as f32 * SUCCESSION_TIER_WEIGHT
}

impl FormationRegistry {
    pub fn get(&self, id: FormationId) -> Option<&Formation> {
        self.formations.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Formation> {
        self.formations.values()
    }

    pub fn len(&self) -> usize { self.formations.len() }

    pub fn is_empty(&self) -> bool { self.formations.is_empty() }

    pub fn leader_of(&self, id: FormationId) -> Option<NpcId> {
        self.formations.get(&id).and_then(|f| f.leader)
    }

    /// Formation the npc leads or follows in. Stale index entries are removed.
    pub fn formation_of(&mut self, npc: NpcId) -> Option<FormationId> {
        let id = *self.index.get(&npc)?;
        let valid = self.formations.get(&id)
            .is_some_and(|f| f.leader == Some(npc) || f.members.contains(&npc));
        if valid {
            Some(id)
        } else {
            self.index.remove(&npc);
            None
        }
    }

    /// Create a formation for `leader`, or replace the member set of the one it already leads.
    /// Members are pulled out of any previous formation; leaders of other formations are skipped.
    pub fn register(&mut self, leader: NpcId, members: impl IntoIterator<Item = NpcId>) -> FormationId {
        let existing = self.formation_of(leader)
            .filter(|id| self.leader_of(*id) == Some(leader));
        if existing.is_none() {
            self.remove_member(leader);
        }
        let id = existing.unwrap_or_else(|| {
            self.next_id += 1;
            FormationId(self.next_id)
        });

        let last_leader = match self.formations.remove(&id) {
            Some(old) => {
                for m in &old.members {
                    self.index.remove(m);
                }
                old.last_leader
            }
            None => None,
        };

        let mut set = BTreeSet::new();
        for member in members {
            if member == leader || set.contains(&member) {
                continue;
            }
            if let Some(other) = self.formation_of(member) {
                if self.leader_of(other) == Some(member) {
                    continue;
                }
                self.remove_member(member);
            }
            set.insert(member);
        }

        for m in &set {
            self.index.insert(*m, id);
        }
        self.index.insert(leader, id);
        self.formations.insert(id, Formation { id, leader: Some(leader), members: set, last_leader });
        id
    }

    /// Drop a follower. Returns true if that left the formation empty and it was deleted.
    pub fn on_member_death(&mut self, npc: NpcId) -> bool {
        let Some(id) = self.formation_of(npc) else { return false };
        if self.leader_of(id) == Some(npc) {
            return false;
        }
        self.remove_member(npc)
    }

    /// Promote the best-scoring survivor. Dead members (absent from `npcs`) are pruned first.
    /// Equal scores go to the lowest id. Returns `None` and deletes the formation when nobody is left.
    pub fn on_leader_death(
        &mut self,
        id: FormationId,
        npcs: &BTreeMap<NpcId, NpcInstance>,
        catalog: &Catalog,
    ) -> Option<Succession> {
        let formation = self.formations.get_mut(&id)?;
        let old_leader = formation.leader.take();
        if old_leader.is_some() {
            formation.last_leader = old_leader;
        }

        let dead: Vec<NpcId> = formation.members.iter()
            .filter(|m| !npcs.contains_key(*m))
            .copied()
            .collect();
        for m in &dead {
            formation.members.remove(m);
        }

        let mut best: Option<(NpcId, f32)> = None;
        for m in &formation.members {
            let Some(npc) = npcs.get(m) else { continue };
            let score = succession_score(npc, catalog);
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((*m, score));
            }
        }

        if let Some((new_leader, _)) = best {
            formation.members.remove(&new_leader);
            formation.leader = Some(new_leader);
        }

        for m in dead {
            self.index.remove(&m);
        }
        if let Some(old) = old_leader {
            self.index.remove(&old);
        }

        match best {
            Some((new_leader, score)) => Some(Succession { formation: id, old_leader, new_leader, score }),
            None => {
                self.formations.remove(&id);
                None
            }
        }
    }

    /// Remove `npc` from whatever formation it follows in; delete that formation if it is now empty
    /// and leaderless.
    fn remove_member(&mut self, npc: NpcId) -> bool {
        let Some(id) = self.index.remove(&npc) else { return false };
        let Some(formation) = self.formations.get_mut(&id) else { return false };
        formation.members.remove(&npc);
        if formation.leader.is_none() && formation.members.is_empty() {
            self.formations.remove(&id);
            return true;
        }
        false
    }
}

impl SimulationState {
    /// Group `leader` with `members` and announce it.
    pub fn register_formation(&mut self, leader: NpcId, members: Vec<NpcId>) -> FormationId {
        let id = self.formations.register(leader, members);
        let members = self.formations.get(id)
            .map(|f| f.members.iter().copied().collect())
            .unwrap_or_default();
        self.emit(SimEvent::FormationCreated { formation: id, leader, members });
        id
    }

    /// Formation bookkeeping for an NPC that just left the store or was expelled from its base.
    pub(crate) fn formation_on_death(&mut self, npc: NpcId) {
        let Some(id) = self.formations.formation_of(npc) else { return };
        if self.formations.leader_of(id) == Some(npc) {
            match self.formations.on_leader_death(id, &self.npcs, &self.catalog) {
                Some(s) => {
                    tracing::debug!("formation {:?}: {:?} succeeds {:?} (score {:.1})", id, s.new_leader, npc, s.score);
                    self.emit(SimEvent::FormationSuccession {
                        formation: id,
                        old_leader: s.old_leader,
                        new_leader: s.new_leader,
                        score: s.score,
                    });
                }
                None => self.emit(SimEvent::FormationDisbanded { formation: id }),
            }
        } else if self.formations.on_member_death(npc) {
            self.emit(SimEvent::FormationDisbanded { formation: id });
        }
    }
}
