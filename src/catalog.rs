//! Type Catalog - NPC archetypes and per-base-type spawn pools.
//! Built once at startup (builtin table or JSON override) and read-only afterwards.

use hashbrown::HashMap;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{ASSIMILATED_PREFIX, DEFAULT_SPAWN_SPREAD};
use crate::error::ConfigError;

// ============================================================================
// FACTIONS
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    Pirate,
    Scavenger,
    Swarm,
    Void,
    RogueMiner,
}

impl Faction {
    pub fn name(self) -> &'static str {
        match self {
            Self::Pirate => "pirate",
            Self::Scavenger => "scavenger",
            Self::Swarm => "swarm",
            Self::Void => "void",
            Self::RogueMiner => "rogue_miner",
        }
    }

    /// Factions whose bases swarm drones can convert.
    pub fn is_assimilable(self) -> bool {
        matches!(self, Self::Pirate | Self::Scavenger | Self::RogueMiner)
    }
}

// ============================================================================
// ARCHETYPES
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum WeaponKind {
    Laser,
    Cannon,
    Railgun,
    Acid,
    DarkEnergy,
    MiningLaser,
}

/// How an archetype fights. Consumed by the tactics collaborator, forwarded as-is.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
pub struct WeaponProfile {
    pub kind: WeaponKind,
    pub damage: f32,
    pub range: f32,
    pub cooldown_ms: u64,
}

/// Visual tag broadcast with a death event.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum DeathEffect {
    Explosion,
    Shatter,
    Dissolve,
    Implosion,
    Cataclysm,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NpcTypeDef {
    pub key: String,
    pub name: String,
    pub faction: Faction,
    pub hull: f32,
    pub shield: f32,
    pub speed: f32,
    pub aggro_range: f32,
    pub weapon: WeaponProfile,
    pub credit_reward: u64,
    pub death_effect: DeathEffect,
    /// 1 (fodder) .. 5 (boss). Weighs formation succession.
    pub tier: u8,
    #[serde(default)]
    pub boss: bool,
    /// Leashed to its home; the tactics module reads this.
    #[serde(default)]
    pub territorial: bool,
    /// Dies together with its home base instead of being orphaned.
    #[serde(default)]
    pub linked_health: bool,
    /// Spawning one groups unformed garrison mates under it.
    #[serde(default)]
    pub formation_leader: bool,
    /// Can attach to enemy bases.
    #[serde(default)]
    pub assimilation_drone: bool,
}

// ============================================================================
// BASE TYPES + SPAWN POOLS
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PoolEntry {
    pub type_key: String,
    pub weight: f32,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SpawnConfig {
    pub pool: Vec<PoolEntry>,
    pub max_npcs: usize,
    pub spawn_cooldown_ms: u64,
    pub respawn_delay_ms: u64,
    pub initial_spawn: usize,
    /// Continuous bases refill to `max_npcs` while players are near;
    /// regular bases only top back up to `initial_spawn`.
    #[serde(default)]
    pub continuous: bool,
    pub patrol_radius: f32,
    #[serde(default = "default_spread")]
    pub spawn_spread: f32,
}

fn default_spread() -> f32 { DEFAULT_SPAWN_SPREAD }

impl SpawnConfig {
    /// Garrison size the base refills to.
    pub fn capacity(&self) -> usize {
        if self.continuous {
            self.max_npcs
        } else {
            self.initial_spawn.min(self.max_npcs)
        }
    }

    /// Weighted archetype pick from the pool.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        let entries: Vec<(&str, f32)> = self.pool.iter()
            .map(|e| (e.type_key.as_str(), e.weight))
            .collect();
        weighted_pick(rng, &entries)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct BaseTypeDef {
    pub key: String,
    pub faction: Faction,
    pub max_health: f32,
    pub credit_reward: u64,
    pub spawn: SpawnConfig,
}

impl BaseTypeDef {
    pub fn is_assimilated(&self) -> bool {
        self.key.starts_with(ASSIMILATED_PREFIX)
    }
}

// ============================================================================
// CATALOG
// ============================================================================

/// On-disk catalog shape.
#[derive(Serialize, Deserialize, Default)]
pub struct CatalogFile {
    pub npc_types: Vec<NpcTypeDef>,
    pub base_types: Vec<BaseTypeDef>,
    /// Garrison translation applied when a base is assimilated: (from, to).
    pub conversions: Vec<(String, String)>,
}

#[derive(Clone, Debug, Default)]
pub struct Catalog {
    npc_types: HashMap<String, NpcTypeDef>,
    base_types: HashMap<String, BaseTypeDef>,
    conversions: HashMap<String, String>,
}

impl Catalog {
    pub fn npc(&self, key: &str) -> Option<&NpcTypeDef> {
        self.npc_types.get(key)
    }

    pub fn base(&self, key: &str) -> Option<&BaseTypeDef> {
        self.base_types.get(key)
    }

    /// Hive-side archetype a garrison unit turns into on assimilation.
    pub fn conversion(&self, key: &str) -> Option<&str> {
        self.conversions.get(key).map(|s| s.as_str())
    }

    /// `pirate_outpost` -> `assimilated_pirate_outpost`, if the catalog has it.
    pub fn assimilated_variant(&self, base_key: &str) -> Option<&BaseTypeDef> {
        self.base_types.get(&format!("{ASSIMILATED_PREFIX}{base_key}"))
    }

    pub fn from_file(file: CatalogFile) -> Result<Self, ConfigError> {
        let mut catalog = Catalog::default();
        for def in file.npc_types {
            catalog.npc_types.insert(def.key.clone(), def);
        }
        for def in file.base_types {
            for entry in &def.spawn.pool {
                if !catalog.npc_types.contains_key(&entry.type_key) {
                    return Err(ConfigError::Catalog(format!(
                        "base type {} spawns unknown npc type {}", def.key, entry.type_key,
                    )));
                }
            }
            catalog.base_types.insert(def.key.clone(), def);
        }
        for (from, to) in file.conversions {
            if !catalog.npc_types.contains_key(&to) {
                return Err(ConfigError::Catalog(format!("conversion target {to} unknown")));
            }
            catalog.conversions.insert(from, to);
        }
        Ok(catalog)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::from_file(file)
    }

    /// Default faction roster shipped with the server.
    pub fn builtin() -> Self {
        use DeathEffect::*;
        use Faction::*;
        use WeaponKind::*;

        let npc_types = vec![
            // Pirates
            npc("pirate_scout", "Pirate Scout", Pirate, [60.0, 20.0, 220.0, 600.0], weapon(Laser, 6.0, 350.0, 900), 40, Explosion, 1),
            NpcTypeDef { territorial: true, ..npc("pirate_fighter", "Pirate Fighter", Pirate, [120.0, 40.0, 160.0, 500.0], weapon(Cannon, 12.0, 400.0, 1200), 80, Explosion, 2) },
            NpcTypeDef { formation_leader: true, ..npc("pirate_captain", "Pirate Captain", Pirate, [320.0, 160.0, 130.0, 700.0], weapon(Railgun, 28.0, 550.0, 1600), 300, Explosion, 3) },
            NpcTypeDef { boss: true, ..npc("pirate_dreadnought", "Pirate Dreadnought", Pirate, [1400.0, 600.0, 70.0, 900.0], weapon(Railgun, 60.0, 700.0, 2500), 1200, Cataclysm, 4) },
            // Scavengers
            npc("scavenger_scrapper", "Scrapper", Scavenger, [80.0, 10.0, 140.0, 400.0], weapon(Cannon, 8.0, 300.0, 1000), 35, Shatter, 1),
            NpcTypeDef { territorial: true, ..npc("scavenger_salvager", "Salvager", Scavenger, [150.0, 30.0, 110.0, 450.0], weapon(Cannon, 14.0, 350.0, 1400), 60, Shatter, 2) },
            npc("scavenger_hauler", "Hauler", Scavenger, [600.0, 120.0, 60.0, 300.0], weapon(Cannon, 10.0, 300.0, 2000), 400, Shatter, 3),
            // Swarm
            NpcTypeDef { assimilation_drone: true, ..npc("swarm_drone", "Swarm Drone", Swarm, [40.0, 0.0, 260.0, 500.0], weapon(Acid, 4.0, 150.0, 600), 15, Dissolve, 1) },
            NpcTypeDef { linked_health: true, ..npc("swarm_worker", "Swarm Worker", Swarm, [70.0, 0.0, 180.0, 350.0], weapon(Acid, 6.0, 200.0, 800), 20, Dissolve, 1) },
            NpcTypeDef { territorial: true, ..npc("swarm_warrior", "Swarm Warrior", Swarm, [160.0, 0.0, 200.0, 550.0], weapon(Acid, 15.0, 250.0, 900), 60, Dissolve, 2) },
            NpcTypeDef { boss: true, ..npc("swarm_queen", "Swarm Queen", Swarm, [3000.0, 800.0, 40.0, 1200.0], weapon(Acid, 45.0, 600.0, 2000), 2500, Cataclysm, 5) },
            // Void
            npc("void_whisper", "Void Whisper", Void, [60.0, 60.0, 240.0, 500.0], weapon(DarkEnergy, 8.0, 350.0, 1000), 30, Implosion, 1),
            npc("void_shadow", "Void Shadow", Void, [110.0, 110.0, 200.0, 550.0], weapon(DarkEnergy, 14.0, 400.0, 1200), 60, Implosion, 2),
            NpcTypeDef { formation_leader: true, ..npc("void_phantom", "Void Phantom", Void, [220.0, 220.0, 170.0, 650.0], weapon(DarkEnergy, 24.0, 500.0, 1500), 140, Implosion, 3) },
            NpcTypeDef { boss: true, ..npc("void_leviathan", "Void Leviathan", Void, [5000.0, 2000.0, 50.0, 1500.0], weapon(DarkEnergy, 80.0, 800.0, 2500), 5000, Cataclysm, 5) },
            // Rogue miners
            npc("rogue_prospector", "Prospector", RogueMiner, [90.0, 30.0, 150.0, 350.0], weapon(MiningLaser, 7.0, 250.0, 1000), 30, Explosion, 1),
            NpcTypeDef { territorial: true, ..npc("rogue_excavator", "Excavator", RogueMiner, [260.0, 60.0, 90.0, 400.0], weapon(MiningLaser, 18.0, 300.0, 1600), 120, Explosion, 2) },
            NpcTypeDef { boss: true, ..npc("rogue_foreman", "Foreman", RogueMiner, [900.0, 300.0, 80.0, 700.0], weapon(MiningLaser, 40.0, 450.0, 2000), 900, Cataclysm, 4) },
        ];

        let hive_pool = || pool(&[("swarm_drone", 50.0), ("swarm_worker", 30.0), ("swarm_warrior", 20.0)]);
        let assimilated = |key: &str| BaseTypeDef {
            key: format!("{ASSIMILATED_PREFIX}{key}"),
            faction: Swarm,
            max_health: 2000.0,
            credit_reward: 450,
            spawn: spawn_config(hive_pool(), 8, 7_000, 30_000, 3, true, 1800.0),
        };

        let base_types = vec![
            BaseTypeDef {
                key: "pirate_outpost".into(), faction: Pirate, max_health: 2000.0, credit_reward: 500,
                spawn: spawn_config(pool(&[("pirate_fighter", 100.0)]), 6, 8_000, 45_000, 4, false, 1500.0),
            },
            BaseTypeDef {
                key: "scavenger_yard".into(), faction: Scavenger, max_health: 1500.0, credit_reward: 350,
                spawn: spawn_config(pool(&[("scavenger_scrapper", 60.0), ("scavenger_salvager", 40.0)]), 6, 10_000, 40_000, 4, false, 1200.0),
            },
            BaseTypeDef {
                key: "mining_claim".into(), faction: RogueMiner, max_health: 1800.0, credit_reward: 400,
                spawn: spawn_config(pool(&[("rogue_prospector", 100.0)]), 5, 10_000, 50_000, 3, false, 1200.0),
            },
            BaseTypeDef {
                key: "swarm_hive".into(), faction: Swarm, max_health: 2500.0, credit_reward: 600,
                spawn: spawn_config(pool(&[("swarm_drone", 45.0), ("swarm_worker", 30.0), ("swarm_warrior", 25.0)]), 10, 6_000, 30_000, 4, true, 2000.0),
            },
            BaseTypeDef {
                key: "void_rift".into(), faction: Void, max_health: 2200.0, credit_reward: 550,
                spawn: spawn_config(pool(&[("void_whisper", 50.0), ("void_shadow", 35.0), ("void_phantom", 15.0)]), 8, 9_000, 40_000, 3, true, 1800.0),
            },
            assimilated("pirate_outpost"),
            assimilated("scavenger_yard"),
            assimilated("mining_claim"),
        ];

        let conversions = [
            ("pirate_scout", "swarm_drone"),
            ("pirate_fighter", "swarm_warrior"),
            ("scavenger_scrapper", "swarm_worker"),
            ("scavenger_salvager", "swarm_warrior"),
            ("rogue_prospector", "swarm_worker"),
            ("rogue_excavator", "swarm_warrior"),
        ];

        let mut catalog = Catalog::default();
        for def in npc_types {
            catalog.npc_types.insert(def.key.clone(), def);
        }
        for def in base_types {
            catalog.base_types.insert(def.key.clone(), def);
        }
        for (from, to) in conversions {
            catalog.conversions.insert(from.to_string(), to.to_string());
        }
        catalog
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// `stats` = [hull, shield, speed, aggro_range].
fn npc(
    key: &str,
    name: &str,
    faction: Faction,
    stats: [f32; 4],
    weapon: WeaponProfile,
    credit_reward: u64,
    death_effect: DeathEffect,
    tier: u8,
) -> NpcTypeDef {
    let [hull, shield, speed, aggro_range] = stats;
    NpcTypeDef {
        key: key.into(),
        name: name.into(),
        faction,
        hull,
        shield,
        speed,
        aggro_range,
        weapon,
        credit_reward,
        death_effect,
        tier,
        boss: false,
        territorial: false,
        linked_health: false,
        formation_leader: false,
        assimilation_drone: false,
    }
}

fn weapon(kind: WeaponKind, damage: f32, range: f32, cooldown_ms: u64) -> WeaponProfile {
    WeaponProfile { kind, damage, range, cooldown_ms }
}

fn pool(entries: &[(&str, f32)]) -> Vec<PoolEntry> {
    entries.iter()
        .map(|(k, w)| PoolEntry { type_key: (*k).into(), weight: *w })
        .collect()
}

fn spawn_config(
    pool: Vec<PoolEntry>,
    max_npcs: usize,
    spawn_cooldown_ms: u64,
    respawn_delay_ms: u64,
    initial_spawn: usize,
    continuous: bool,
    patrol_radius: f32,
) -> SpawnConfig {
    SpawnConfig {
        pool,
        max_npcs,
        spawn_cooldown_ms,
        respawn_delay_ms,
        initial_spawn,
        continuous,
        patrol_radius,
        spawn_spread: DEFAULT_SPAWN_SPREAD,
    }
}

/// Weighted random selection. Entries with non-positive weight never win.
pub fn weighted_pick<T: Copy, R: Rng + ?Sized>(rng: &mut R, entries: &[(T, f32)]) -> Option<T> {
    let total: f32 = entries.iter().map(|(_, w)| w.max(0.0)).sum();
    if total <= 0.0 { return None; }
    let roll = rng.random_range(0.0..total);
    let mut acc = 0.0;
    for (item, weight) in entries {
        acc += weight.max(0.0);
        if roll < acc {
            return Some(*item);
        }
    }
    entries.iter().rev().find(|(_, w)| *w > 0.0).map(|(item, _)| *item)
}
