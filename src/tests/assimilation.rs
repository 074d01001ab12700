//! Assimilation Test
//! Validates: drones latch on in a ring → third drone converts the base to the hive →
//! garrison translated, unmapped units expelled → queen gate runs after every conversion.

use bevy::math::Vec2;
use std::f32::consts::TAU;

use super::*;
use crate::catalog::Faction;
use crate::components::{BaseId, NpcId, NpcState};
use crate::error::AttachRejection;
use crate::messages::{NpcAction, SimEvent, SpawnCause};
use crate::systems::AttachOutcome;
use crate::world::BaseExtension;

#[test]
fn three_drones_convert_scavenger_yard() {
    let mut state = state();
    let garrison = activate(&mut state, 1, "scavenger_yard", 0.0, 0.0);
    let drones: Vec<NpcId> = (0..3).map(|_| drone(&mut state, 500.0, 0.0)).collect();
    state.drain_events();

    assert_eq!(state.attach(drones[0], BaseId(1)), Ok(AttachOutcome { attached: 1, converted: false }));
    let first = state.npc(drones[0]).expect("drone");
    assert_eq!(first.state, NpcState::Attached);
    assert_eq!(first.attached_to, Some(BaseId(1)));
    assert_eq!(first.position, Vec2::new(60.0, 0.0));

    assert_eq!(state.attach(drones[1], BaseId(1)), Ok(AttachOutcome { attached: 2, converted: false }));
    let expected = Vec2::from_angle(TAU / 3.0) * 60.0;
    assert!(state.npc(drones[1]).expect("drone").position.distance(expected) < 1e-3);
    assert_eq!(state.base(BaseId(1)).expect("base").type_key, "scavenger_yard");

    assert_eq!(state.attach(drones[2], BaseId(1)), Ok(AttachOutcome { attached: 3, converted: true }));

    let base = state.base(BaseId(1)).expect("base");
    assert_eq!(base.type_key, "assimilated_scavenger_yard");
    assert_eq!(base.original_type, "scavenger_yard");
    assert_eq!(base.faction, Faction::Swarm);
    assert_eq!(base.max_health, 2000.0);
    assert_eq!(base.health, 2000.0);
    assert_eq!(base.absorbed_drones, drones);
    assert_eq!(base.ext, BaseExtension::None);
    assert_eq!(base.garrison.iter().copied().collect::<Vec<_>>(), garrison);
    assert!(state.assimilation.is_empty());

    for id in &garrison {
        let npc = state.npc(*id).expect("converted unit");
        assert_eq!(npc.faction, Faction::Swarm);
        assert!(matches!(npc.type_key.as_str(), "swarm_worker" | "swarm_warrior"), "{}", npc.type_key);
        assert_eq!(npc.home_base, Some(BaseId(1)));
    }

    let events = state.drain_events();
    assert_eq!(count_events(&events, |e| matches!(e, SimEvent::DroneAttached { .. })), 3);
    assert!(events.iter().any(|e| matches!(e,
        SimEvent::BaseAssimilated { from_type, to_type, expelled, .. }
            if from_type == "scavenger_yard" && to_type == "assimilated_scavenger_yard" && expelled.is_empty()
    )));
    // Only one assimilated base: the queen gate ran and refused.
    assert!(state.queen.is_none());
}

#[test]
fn conversion_keeps_health_fraction() {
    let mut state = state();
    activate(&mut state, 1, "pirate_outpost", 0.0, 0.0);
    // 2000 -> 1500 is 75%, above the dreadnought line
    state.damage_base(BaseId(1), 500.0, None, &NoLoot);
    assimilate(&mut state, BaseId(1));

    let base = state.base(BaseId(1)).expect("base");
    assert_eq!(base.type_key, "assimilated_pirate_outpost");
    assert_eq!(base.health, 2000.0 * 0.75);
}

#[test]
fn units_without_a_hive_form_are_expelled() {
    let mut state = state();
    let garrison = activate(&mut state, 1, "pirate_outpost", 0.0, 0.0);
    let captain = state.spawn_special(BaseId(1), "pirate_captain", Vec2::ZERO, SpawnCause::Captain)
        .expect("captain");

    assimilate(&mut state, BaseId(1));

    let npc = state.npc(captain).expect("expelled captain lives");
    assert_eq!(npc.type_key, "pirate_captain");
    assert_eq!(npc.state, NpcState::Rage);
    assert!(npc.is_orphaned());
    let base = state.base(BaseId(1)).expect("base");
    assert!(!base.owns(captain));
    assert!(base.special_units.is_empty());
    assert_eq!(base.garrison.len(), garrison.len());
    assert!(garrison.iter().all(|id| state.npc(*id).is_some_and(|n| n.type_key == "swarm_warrior")));

    let events = state.drain_events();
    assert!(events.iter().any(|e| matches!(e, SimEvent::NpcOrphaned { npc, .. } if *npc == captain)));
}

#[test]
fn expelled_captain_hands_formation_to_converted_fighters() {
    let mut state = state();
    let fighters = activate(&mut state, 1, "pirate_outpost", 0.0, 0.0);
    tick(&mut state, 60_000, &[]);
    let scout = state.npcs.values().find(|n| n.type_key == "pirate_scout").map(|n| n.id).expect("scout");
    assert!(state.apply_action(scout, NpcAction::PirateIntel { target: Vec2::new(3_000.0, 0.0) }));
    let captain = state.npcs.values().find(|n| n.type_key == "pirate_captain").map(|n| n.id).expect("captain");
    assert!(state.apply_action(fighters[1], NpcAction::Raid { target: Vec2::new(3_000.0, 0.0) }));
    state.drain_events();

    assimilate(&mut state, BaseId(1));

    let summary = state.formation_summary();
    assert_eq!(summary.len(), 1);
    // All warriors at full health: lowest id takes over.
    assert_eq!(summary[0].leader, Some(fighters[0]));
    assert_eq!(summary[0].members, fighters[1..].to_vec());
    assert_eq!(summary[0].last_leader, Some(captain));
    assert!(fighters.iter().all(|id| state.npc(*id).is_some_and(|n| n.faction == Faction::Swarm)));

    let raider = state.npc(fighters[1]).expect("converted raider");
    assert_eq!(raider.state, NpcState::Patrol);
    assert_eq!(raider.raid_target, None);
    assert_eq!(state.npc(captain).map(|n| n.state), Some(NpcState::Rage));

    let events = state.drain_events();
    assert!(events.iter().any(|e| matches!(e,
        SimEvent::FormationSuccession { old_leader: Some(old), new_leader, .. } if *old == captain && *new_leader == fighters[0])));
}

#[test]
fn attach_rejections_leave_state_untouched() {
    let mut state = state();
    let yard = activate(&mut state, 1, "scavenger_yard", 0.0, 0.0);
    activate(&mut state, 2, "swarm_hive", 3_000.0, 0.0);
    activate(&mut state, 3, "mining_claim", -3_000.0, 0.0);
    let d = drone(&mut state, 0.0, 0.0);

    assert_eq!(state.attach(NpcId(999), BaseId(1)), Err(AttachRejection::UnknownDrone(NpcId(999))));
    assert_eq!(state.attach(yard[0], BaseId(1)), Err(AttachRejection::NotADrone(yard[0])));
    assert_eq!(state.attach(d, BaseId(42)), Err(AttachRejection::UnknownBase(BaseId(42))));
    assert_eq!(state.attach(d, BaseId(2)), Err(AttachRejection::NotAssimilable(BaseId(2))));

    assert!(state.damage_base(BaseId(3), 1.0e6, None, &NoLoot));
    assert_eq!(state.attach(d, BaseId(3)), Err(AttachRejection::BaseDestroyed(BaseId(3))));

    let npc = state.npc(d).expect("drone");
    assert_eq!(npc.state, NpcState::Patrol);
    assert_eq!(npc.attached_to, None);
    assert!(state.assimilation.is_empty());

    state.attach(d, BaseId(1)).expect("attach");
    assert_eq!(state.attach(d, BaseId(1)), Err(AttachRejection::AlreadyAttached { drone: d, base: BaseId(1) }));
    assert_eq!(state.assimilation.get(&BaseId(1)).map(|r| r.len()), Some(1));
}

#[test]
fn detach_and_death_release_progress() {
    let mut state = state();
    activate(&mut state, 1, "scavenger_yard", 0.0, 0.0);
    let a = drone(&mut state, 0.0, 0.0);
    let b = drone(&mut state, 0.0, 0.0);
    state.attach(a, BaseId(1)).expect("attach a");
    state.attach(b, BaseId(1)).expect("attach b");

    kill(&mut state, a);
    let summary = state.assimilation_summary();
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0].drones, vec![b]);
    assert_eq!(summary[0].threshold, 3);

    assert!(state.detach(b));
    assert_eq!(state.npc(b).map(|n| n.state), Some(NpcState::Patrol));
    assert!(state.assimilation.is_empty());
    assert!(!state.detach(b));
}

#[test]
fn third_conversion_lays_queen_egg_at_converted_base() {
    let mut state = state();
    activate(&mut state, 1, "scavenger_yard", 0.0, 0.0);
    activate(&mut state, 2, "mining_claim", 1_000.0, 0.0);
    activate(&mut state, 3, "pirate_outpost", 0.0, 1_000.0);

    assimilate(&mut state, BaseId(1));
    assimilate(&mut state, BaseId(2));
    assert!(state.queen.is_none());
    assimilate(&mut state, BaseId(3));

    let queen = state.queen.as_ref().expect("egg laid");
    let egg = state.npc(queen.npc).expect("egg npc");
    assert_eq!(egg.type_key, "swarm_queen");
    assert_eq!(egg.state, NpcState::Hatching);
    assert_eq!(egg.position, Vec2::new(0.0, 1_000.0));
    assert_eq!(state.last_queen_at, Some(0));
    assert_eq!(state.scheduler.next_due(), Some(30_000));

    let events = state.drain_events();
    assert!(events.iter().any(|e| matches!(e, SimEvent::QueenEggLaid { assimilated_bases: 3, .. })));
}
