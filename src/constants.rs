//! Constants - Tuning defaults for the hostile faction simulation.
//! Every value here is the default for the matching `EngineConfig` field.

/// Fixed simulation tick in milliseconds (20 Hz).
pub const TICK_INTERVAL_MS: u64 = 50;

/// Seed for the simulation RNG when the config does not supply one.
pub const DEFAULT_RNG_SEED: u64 = 0x5EED_F00D;

/// Players farther than this from an NPC are not passed to its tactics hook.
pub const AI_AWARENESS_RADIUS: f32 = 2000.0;

// ============================================================================
// BASE LIFECYCLE
// ============================================================================

/// Milliseconds a destroyed base stays down before it respawns.
pub const BASE_RESPAWN_DELAY_MS: u64 = 300_000;

/// Random scatter around the base center for freshly spawned garrison units.
pub const DEFAULT_SPAWN_SPREAD: f32 = 120.0;

/// Reward multiplier by distinct contributor count (1, 2, 3, 4+).
pub const TEAM_REWARD_MULTIPLIERS: [f64; 4] = [1.0, 1.5, 2.0, 2.5];

// ============================================================================
// ORPHANING
// ============================================================================

/// Milliseconds an orphaned NPC rages before despawning.
pub const ORPHAN_DESPAWN_MS: u64 = 90_000;

/// Aggro range multiplier applied when a home base dies.
pub const ORPHAN_AGGRO_MULT: f32 = 1.5;

/// Weapon damage multiplier applied when a home base dies.
pub const ORPHAN_DAMAGE_MULT: f32 = 1.25;

// ============================================================================
// ASSIMILATION
// ============================================================================

/// Attached drones needed to convert a base.
pub const ASSIMILATION_THRESHOLD: usize = 3;

/// Distance from base center at which attached drones sit.
pub const DRONE_ATTACH_RADIUS: f32 = 60.0;

/// Type prefix for converted base types.
pub const ASSIMILATED_PREFIX: &str = "assimilated_";

// ============================================================================
// SWARM QUEEN
// ============================================================================

/// Minimum milliseconds between queen spawns (measured from spawn or death).
pub const QUEEN_COOLDOWN_MS: u64 = 600_000;

/// Radius around the reference point in which assimilated bases are counted.
pub const QUEEN_SPAWN_RADIUS: f32 = 5000.0;

/// Assimilated bases required inside the radius before an egg is laid.
pub const QUEEN_MIN_ASSIMILATED: usize = 3;

/// Egg incubation time.
pub const QUEEN_HATCH_MS: u64 = 30_000;

/// Hull fractions that each trigger one minion wave per queen lifetime.
pub const QUEEN_HEALTH_THRESHOLDS: [f32; 3] = [0.75, 0.5, 0.25];

/// Player distance that counts as first contact.
pub const QUEEN_CONTACT_RADIUS: f32 = 1500.0;

/// Combat must last this long before periodic waves start.
pub const QUEEN_PERIODIC_DELAY_MS: u64 = 15_000;

/// Interval between periodic waves.
pub const QUEEN_WAVE_INTERVAL_MS: u64 = 20_000;

/// Live minion cap.
pub const QUEEN_MAX_MINIONS: usize = 12;

/// Minion ring radius around the queen.
pub const QUEEN_MINION_RING: f32 = 200.0;

/// Weighted minion mix (type key, weight).
pub const QUEEN_MINION_MIX: [(&str, f32); 3] = [
    ("swarm_drone", 50.0),
    ("swarm_warrior", 30.0),
    ("swarm_worker", 20.0),
];

// ============================================================================
// VOID LEVIATHAN
// ============================================================================

/// Chance per qualifying void death.
pub const LEVIATHAN_SPAWN_CHANCE: f64 = 0.02;

/// Minimum milliseconds between leviathans (measured from spawn or death).
pub const LEVIATHAN_COOLDOWN_MS: u64 = 900_000;

/// Emergence animation length; the leviathan is passive meanwhile.
pub const LEVIATHAN_EMERGE_MS: u64 = 8_000;

/// Player distance that wakes the leviathan's minion logic.
pub const LEVIATHAN_CONTACT_RADIUS: f32 = 1500.0;

/// Interval between leviathan minion waves.
pub const LEVIATHAN_WAVE_INTERVAL_MS: u64 = 25_000;

/// Live minion cap.
pub const LEVIATHAN_MAX_MINIONS: usize = 6;

/// Minion type spawned by the leviathan.
pub const LEVIATHAN_MINION_TYPE: &str = "void_whisper";

/// Minion ring radius around the leviathan.
pub const LEVIATHAN_MINION_RING: f32 = 300.0;

// ============================================================================
// FORMATIONS
// ============================================================================

/// Maximum followers recruited when a formation leader spawns.
pub const FORMATION_MAX_FOLLOWERS: usize = 4;

/// Succession score weights: health fraction and archetype tier.
pub const SUCCESSION_HEALTH_WEIGHT: f32 = 100.0;
pub const SUCCESSION_TIER_WEIGHT: f32 = 10.0;

// ============================================================================
// SCAVENGER YARD
// ============================================================================

/// Scrap required to start a hauler transformation.
pub const SCRAP_HAULER_THRESHOLD: u32 = 100;

/// Delay between the transformation starting and the hauler appearing.
pub const HAULER_TRANSFORM_MS: u64 = 5_000;

// ============================================================================
// MINING CLAIM
// ============================================================================

/// Chance a prospector deposit calls in an excavator.
pub const EXCAVATOR_SPAWN_CHANCE: f64 = 0.10;

/// Chance an excavator deposit calls in the foreman.
pub const FOREMAN_SPAWN_CHANCE: f64 = 0.05;

// ============================================================================
// PIRATE OUTPOST
// ============================================================================

/// Interval between scout launches.
pub const PIRATE_SCOUT_INTERVAL_MS: u64 = 60_000;

/// Live scouts per outpost.
pub const PIRATE_MAX_SCOUTS: usize = 2;

/// Scouts launch this far from the outpost (min, max).
pub const PIRATE_SCOUT_DISTANCE: (f32, f32) = (800.0, 1200.0);

/// Base health fraction at or below which the dreadnought launches.
pub const DREADNOUGHT_HEALTH_FRACTION: f32 = 0.5;

// ============================================================================
// ARCHETYPE + BASE TYPE KEYS
// ============================================================================

pub const PIRATE_OUTPOST: &str = "pirate_outpost";
pub const SCAVENGER_YARD: &str = "scavenger_yard";
pub const MINING_CLAIM: &str = "mining_claim";
pub const SWARM_HIVE: &str = "swarm_hive";

pub const PIRATE_SCOUT: &str = "pirate_scout";
pub const PIRATE_FIGHTER: &str = "pirate_fighter";
pub const PIRATE_CAPTAIN: &str = "pirate_captain";
pub const PIRATE_DREADNOUGHT: &str = "pirate_dreadnought";
pub const SCAVENGER_HAULER: &str = "scavenger_hauler";
pub const ROGUE_PROSPECTOR: &str = "rogue_prospector";
pub const ROGUE_EXCAVATOR: &str = "rogue_excavator";
pub const ROGUE_FOREMAN: &str = "rogue_foreman";
pub const SWARM_QUEEN: &str = "swarm_queen";
pub const VOID_LEVIATHAN: &str = "void_leviathan";
