//! Boss Test
//! Validates: queen gate (reference point, radius, count) → singleton + cooldown → egg hatches
//! on schedule → minion waves on contact, thresholds and period. Leviathan: roll on void
//! death → emerge → whisper waves under cap.

use bevy::math::Vec2;

use super::*;
use crate::components::{NpcId, NpcState, PlayerId};
use crate::error::BossGateRejection;
use crate::messages::{NpcAction, SimEvent, WaveTrigger};

/// Three converted bases around the origin, far enough apart that a player at the origin
/// is outside their patrol radius.
fn hive_ring(state: &mut SimulationState) {
    activate(state, 11, "assimilated_pirate_outpost", 3_000.0, 0.0);
    activate(state, 12, "assimilated_scavenger_yard", 0.0, 3_000.0);
    activate(state, 13, "assimilated_mining_claim", -3_000.0, 0.0);
}

fn hatched_queen(state: &mut SimulationState) -> NpcId {
    hive_ring(state);
    let queen = state.try_spawn_queen(Vec2::ZERO).expect("egg");
    let hatch_ms = state.config.queen_hatch_ms;
    tick(state, hatch_ms, &[]);
    assert_eq!(state.npc(queen).map(|n| n.state), Some(NpcState::Patrol));
    state.drain_events();
    queen
}

fn queen_waves(events: &[SimEvent]) -> Vec<(WaveTrigger, usize)> {
    events.iter()
        .filter_map(|e| match e {
            SimEvent::QueenMinionWave { trigger, spawned, .. } => Some((*trigger, spawned.len())),
            _ => None,
        })
        .collect()
}

// ============================================================================
// QUEEN
// ============================================================================

#[test]
fn queen_gate_counts_assimilated_bases_in_radius() {
    let mut state = state();
    activate(&mut state, 11, "assimilated_pirate_outpost", 3_000.0, 0.0);
    activate(&mut state, 12, "assimilated_scavenger_yard", 0.0, 3_000.0);
    activate(&mut state, 13, "assimilated_mining_claim", 6_000.0, 0.0);

    assert_eq!(
        state.try_spawn_queen(Vec2::ZERO),
        Err(BossGateRejection::InsufficientAssimilation { found: 2, required: 3 }),
    );
    assert!(state.queen.is_none());
    assert_eq!(state.count_type("swarm_queen"), 0);

    activate(&mut state, 14, "assimilated_mining_claim", -3_000.0, 0.0);
    let egg = state.try_spawn_queen(Vec2::ZERO).expect("egg");
    assert_eq!(state.npc(egg).map(|n| n.position), Some(Vec2::ZERO));
}

#[test]
fn queen_gate_measures_from_live_hive() {
    let mut state = state();
    hive_ring(&mut state);
    activate(&mut state, 1, "swarm_hive", 20_000.0, 0.0);

    assert_eq!(
        state.try_spawn_queen(Vec2::ZERO),
        Err(BossGateRejection::InsufficientAssimilation { found: 0, required: 3 }),
    );

    // Hive gone: back to the fallback point.
    assert!(state.deactivate(BaseId(1)));
    assert!(state.try_spawn_queen(Vec2::ZERO).is_ok());
}

#[test]
fn queen_is_singleton_with_cooldown() {
    let mut state = state();
    hive_ring(&mut state);
    let egg = state.try_spawn_queen(Vec2::ZERO).expect("egg");
    assert_eq!(state.try_spawn_queen(Vec2::ZERO), Err(BossGateRejection::AlreadyAlive));
    state.drain_events();

    state.now_ms = 1_000;
    let loot = StaticLoot(vec![crate::messages::LootItem { item: "chitin".into(), quantity: 1 }]);
    assert!(state.damage_npc(egg, 1.0e6, Some(PlayerId(2)), &loot));
    assert!(state.queen.is_none());
    assert_eq!(state.last_queen_at, Some(1_000));

    let events = state.drain_events();
    assert!(events.iter().any(|e| matches!(e,
        SimEvent::NpcDestroyed { rewards, loot, .. } if rewards.is_empty() && loot.is_empty()
    )), "eggs drop nothing");
    assert!(events.iter().any(|e| matches!(e, SimEvent::QueenDied { npc, .. } if *npc == egg)));

    assert_eq!(
        state.try_spawn_queen(Vec2::ZERO),
        Err(BossGateRejection::Cooldown { remaining_ms: 600_000 }),
    );
    assert_eq!(state.boss_status().queen_cooldown_ms, 600_000);

    state.now_ms = 601_000;
    assert!(state.try_spawn_queen(Vec2::ZERO).is_ok());
}

#[test]
fn egg_hatches_on_schedule_and_stays_passive() {
    let mut state = state();
    hive_ring(&mut state);
    let egg = state.try_spawn_queen(Vec2::ZERO).expect("egg");
    let mut tactics = ScriptedTactics::default();
    tactics.queue(egg, NpcAction::Move { position: Vec2::new(500.0, 0.0) });

    assert!(!state.apply_action(egg, NpcAction::Move { position: Vec2::ONE }));
    tick_with(&mut state, 29_950, &[], &mut tactics);
    assert_eq!(state.npc(egg).map(|n| n.state), Some(NpcState::Hatching));
    assert!(!tactics.called(egg));

    tick_with(&mut state, 50, &[], &mut tactics);
    let queen = state.npc(egg).expect("queen");
    assert_eq!(queen.state, NpcState::Patrol);
    assert!(tactics.called(egg));
    assert_eq!(queen.position, Vec2::new(500.0, 0.0));
    assert!(state.queen.as_ref().is_some_and(|q| q.hatched));
    assert!(state.drain_events().iter().any(|e| matches!(e, SimEvent::QueenHatched { .. })));
}

#[test]
fn queen_waves_on_contact_and_thresholds() {
    let mut state = state();
    let queen = hatched_queen(&mut state);
    let players = [player(1, 100.0, 0.0)];

    tick(&mut state, 50, &players);
    let waves = queen_waves(&state.drain_events());
    assert_eq!(waves.len(), 1);
    assert_eq!(waves[0].0, WaveTrigger::FirstContact);
    assert!((2..=4).contains(&waves[0].1));

    // 800 shield + 900 hull: 2100 / 3000 = 0.7
    assert!(!state.damage_npc(queen, 1_700.0, Some(PlayerId(1)), &NoLoot));
    tick(&mut state, 50, &players);
    let waves = queen_waves(&state.drain_events());
    assert_eq!(waves.len(), 1);
    assert_eq!(waves[0].0, WaveTrigger::HealthThreshold { index: 0 });

    // Straight past both remaining thresholds.
    assert!(!state.damage_npc(queen, 1_500.0, Some(PlayerId(1)), &NoLoot));
    tick(&mut state, 50, &players);
    let q = state.queen.as_ref().expect("queen alive");
    assert!(q.thresholds_fired.iter().all(|f| *f));
    assert!(q.minions.len() <= 12);
    assert!(q.minions.iter().all(|m| {
        state.npc(*m).is_some_and(|n| matches!(n.type_key.as_str(), "swarm_drone" | "swarm_warrior" | "swarm_worker"))
    }));
    let waves = queen_waves(&state.drain_events());
    assert!(!waves.is_empty());
    assert!(waves.iter().all(|(t, _)| matches!(t, WaveTrigger::HealthThreshold { index: 1 | 2 })));

    // Thresholds fire once per lifetime.
    tick(&mut state, 50, &players);
    let waves = queen_waves(&state.drain_events());
    assert!(waves.iter().all(|(t, _)| *t == WaveTrigger::Periodic));
}

#[test]
fn periodic_waves_need_sustained_combat() {
    let mut state = state();
    hatched_queen(&mut state);
    let players = [player(1, 100.0, 0.0)];

    tick(&mut state, 50, &players); // first contact at 30_050
    state.drain_events();

    let mut periodic_at = Vec::new();
    for _ in 0..40 {
        tick(&mut state, 1_000, &players);
        if queen_waves(&state.drain_events()).iter().any(|(t, _)| *t == WaveTrigger::Periodic) {
            periodic_at.push(state.now_ms);
        }
    }
    // Combat delay 15s, wave interval 20s from the contact wave.
    assert_eq!(periodic_at.first(), Some(&50_050));
    assert!(periodic_at.windows(2).all(|w| w[1] - w[0] >= 20_000));

    // Nobody near: no waves at all.
    let before = state.queen.as_ref().map(|q| q.last_wave_at);
    advance(&mut state, 60_000, 1_000, &[]);
    assert_eq!(state.queen.as_ref().map(|q| q.last_wave_at), before);
}

// ============================================================================
// LEVIATHAN
// ============================================================================

#[test]
fn void_death_rolls_leviathan() {
    let mut state = state_with(|c| c.leviathan_spawn_chance = 1.0);
    let rift = activate(&mut state, 1, "void_rift", 0.0, 0.0);
    assert_eq!(rift.len(), 3);
    let site = state.npc(rift[0]).expect("void unit").position;

    kill(&mut state, rift[0]);
    let lev = state.leviathan.as_ref().expect("leviathan").npc;
    let npc = state.npc(lev).expect("leviathan npc");
    assert_eq!(npc.type_key, "void_leviathan");
    assert_eq!(npc.state, NpcState::Spawning);
    assert_eq!(npc.position, site);
    assert_eq!(state.last_leviathan_at, Some(0));

    kill(&mut state, rift[1]);
    assert_eq!(state.count_type("void_leviathan"), 1);

    assert!(!state.apply_action(lev, NpcAction::Move { position: Vec2::ONE }));
    tick(&mut state, 8_000, &[]);
    assert_eq!(state.npc(lev).map(|n| n.state), Some(NpcState::Patrol));
    assert!(state.leviathan.as_ref().is_some_and(|l| l.active));

    state.now_ms = 20_000;
    kill(&mut state, lev);
    assert!(state.leviathan.is_none());
    assert_eq!(state.last_leviathan_at, Some(20_000));
    let events = state.drain_events();
    assert!(events.iter().any(|e| matches!(e, SimEvent::LeviathanDied { npc, .. } if *npc == lev)));

    kill(&mut state, rift[2]);
    assert_eq!(state.count_type("void_leviathan"), 0);
    assert_eq!(
        state.roll_leviathan(Vec2::ZERO),
        Err(BossGateRejection::Cooldown { remaining_ms: 900_000 }),
    );
}

#[test]
fn leviathan_roll_can_fail() {
    let mut state = state_with(|c| c.leviathan_spawn_chance = 0.0);
    assert_eq!(state.roll_leviathan(Vec2::ZERO), Err(BossGateRejection::RollFailed));
    assert!(state.leviathan.is_none());
    assert_eq!(state.last_leviathan_at, None);
}

#[test]
fn leviathan_whisper_waves_respect_interval_and_cap() {
    let mut state = state_with(|c| c.leviathan_spawn_chance = 1.0);
    let lev = state.roll_leviathan(Vec2::new(5_000.0, 5_000.0)).expect("leviathan");
    tick(&mut state, 8_000, &[]);
    state.drain_events();

    let players = [player(1, 5_100.0, 5_000.0)];
    tick(&mut state, 50, &players);
    let events = state.drain_events();
    let spawned: Vec<NpcId> = events.iter()
        .filter_map(|e| match e {
            SimEvent::LeviathanMinionWave { leviathan, spawned } if *leviathan == lev => Some(spawned.clone()),
            _ => None,
        })
        .flatten()
        .collect();
    assert!((2..=3).contains(&spawned.len()));
    for id in &spawned {
        let whisper = state.npc(*id).expect("whisper");
        assert_eq!(whisper.type_key, "void_whisper");
        assert!((whisper.position.distance(Vec2::new(5_000.0, 5_000.0)) - 300.0).abs() < 0.5);
    }

    tick(&mut state, 50, &players);
    assert_eq!(count_events(&state.drain_events(), |e| matches!(e, SimEvent::LeviathanMinionWave { .. })), 0);

    for _ in 0..6 {
        tick(&mut state, 25_000, &players);
    }
    let l = state.leviathan.as_ref().expect("leviathan");
    assert_eq!(l.minions.len(), 6);
}
