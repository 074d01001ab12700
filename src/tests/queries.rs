//! Query Test
//! Validates: radius queries, base snapshots, boss status and snapshot flags read the live state.

use bevy::math::Vec2;

use super::*;
use crate::components::{BaseId, NpcState};

#[test]
fn radius_queries_filter_by_distance() {
    let mut state = state();
    activate(&mut state, 1, "pirate_outpost", 0.0, 0.0);
    activate(&mut state, 2, "mining_claim", 10_000.0, 0.0);
    let d = drone(&mut state, 10_000.0, 400.0);
    state.attach(d, BaseId(2)).expect("attach");

    let near_origin = state.npcs_in_radius(Vec2::ZERO, 500.0);
    assert_eq!(near_origin.len(), 4);
    assert!(near_origin.iter().all(|n| n.type_key == "pirate_fighter" && n.territorial && !n.orphaned));
    assert!(near_origin.windows(2).all(|w| w[0].id < w[1].id));

    let bases = state.bases_in_radius(Vec2::new(9_000.0, 0.0), 2_000.0);
    assert_eq!(bases.len(), 1);
    let claim = &bases[0];
    assert_eq!(claim.id, BaseId(2));
    assert_eq!(claim.garrison, 3);
    assert_eq!(claim.attached_drones, 1);
    assert_eq!(claim.health, claim.max_health);
}

#[test]
fn snapshots_flag_orphans() {
    let mut state = state();
    let garrison = activate(&mut state, 1, "mining_claim", 0.0, 0.0);
    assert!(state.damage_base(BaseId(1), 1.0e6, None, &NoLoot));

    let npc = state.npc(garrison[0]).expect("orphan");
    let snapshot = state.npc_snapshot(npc);
    assert!(snapshot.orphaned);
    assert_eq!(snapshot.state, NpcState::Rage);
    assert_eq!(snapshot.home_base, None);

    let bases = state.bases_in_radius(Vec2::ZERO, 1.0);
    assert!(bases[0].destroyed);
    assert_eq!(bases[0].garrison, 0);
}

#[test]
fn boss_status_tracks_slots_and_cooldowns() {
    let mut state = state_with(|c| c.leviathan_spawn_chance = 1.0);
    let idle = state.boss_status();
    assert!(idle.queen.is_none() && idle.leviathan.is_none());
    assert_eq!((idle.queen_cooldown_ms, idle.leviathan_cooldown_ms), (0, 0));

    let lev = state.roll_leviathan(Vec2::ZERO).expect("leviathan");
    state.now_ms = 100_000;
    let status = state.boss_status();
    let slot = status.leviathan.expect("slot");
    assert_eq!(slot.npc, lev);
    assert_eq!(slot.state, NpcState::Spawning);
    assert_eq!(slot.health_fraction, 1.0);
    assert_eq!(status.leviathan_cooldown_ms, 800_000);
}
