//! Engine settings - tunables loaded from a JSON file at server startup.
//! Missing fields fall back to the defaults in `constants`.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::*;
use crate::error::ConfigError;

/// Every tunable the simulation reads at runtime.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    // Clock + RNG
    pub tick_interval_ms: u64,
    pub rng_seed: u64,
    pub ai_awareness_radius: f32,
    /// Max level for the server's log subscriber ("error" .. "trace").
    pub log_level: String,

    // Bases
    pub base_respawn_delay_ms: u64,
    pub orphan_despawn_ms: u64,
    pub orphan_aggro_mult: f32,
    pub orphan_damage_mult: f32,

    // Assimilation
    pub assimilation_threshold: usize,
    pub drone_attach_radius: f32,

    // Queen
    pub queen_cooldown_ms: u64,
    pub queen_spawn_radius: f32,
    pub queen_min_assimilated: usize,
    pub queen_hatch_ms: u64,
    pub queen_health_thresholds: Vec<f32>,
    pub queen_contact_radius: f32,
    pub queen_periodic_delay_ms: u64,
    pub queen_wave_interval_ms: u64,
    pub queen_max_minions: usize,

    // Leviathan
    pub leviathan_spawn_chance: f64,
    pub leviathan_cooldown_ms: u64,
    pub leviathan_emerge_ms: u64,
    pub leviathan_contact_radius: f32,
    pub leviathan_wave_interval_ms: u64,
    pub leviathan_max_minions: usize,

    // Faction triggers
    pub scrap_hauler_threshold: u32,
    pub hauler_transform_ms: u64,
    pub excavator_spawn_chance: f64,
    pub foreman_spawn_chance: f64,
    pub pirate_scout_interval_ms: u64,
    pub pirate_max_scouts: usize,
    pub dreadnought_health_fraction: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: TICK_INTERVAL_MS,
            rng_seed: DEFAULT_RNG_SEED,
            ai_awareness_radius: AI_AWARENESS_RADIUS,
            log_level: "info".into(),
            base_respawn_delay_ms: BASE_RESPAWN_DELAY_MS,
            orphan_despawn_ms: ORPHAN_DESPAWN_MS,
            orphan_aggro_mult: ORPHAN_AGGRO_MULT,
            orphan_damage_mult: ORPHAN_DAMAGE_MULT,
            assimilation_threshold: ASSIMILATION_THRESHOLD,
            drone_attach_radius: DRONE_ATTACH_RADIUS,
            queen_cooldown_ms: QUEEN_COOLDOWN_MS,
            queen_spawn_radius: QUEEN_SPAWN_RADIUS,
            queen_min_assimilated: QUEEN_MIN_ASSIMILATED,
            queen_hatch_ms: QUEEN_HATCH_MS,
            queen_health_thresholds: QUEEN_HEALTH_THRESHOLDS.to_vec(),
            queen_contact_radius: QUEEN_CONTACT_RADIUS,
            queen_periodic_delay_ms: QUEEN_PERIODIC_DELAY_MS,
            queen_wave_interval_ms: QUEEN_WAVE_INTERVAL_MS,
            queen_max_minions: QUEEN_MAX_MINIONS,
            leviathan_spawn_chance: LEVIATHAN_SPAWN_CHANCE,
            leviathan_cooldown_ms: LEVIATHAN_COOLDOWN_MS,
            leviathan_emerge_ms: LEVIATHAN_EMERGE_MS,
            leviathan_contact_radius: LEVIATHAN_CONTACT_RADIUS,
            leviathan_wave_interval_ms: LEVIATHAN_WAVE_INTERVAL_MS,
            leviathan_max_minions: LEVIATHAN_MAX_MINIONS,
            scrap_hauler_threshold: SCRAP_HAULER_THRESHOLD,
            hauler_transform_ms: HAULER_TRANSFORM_MS,
            excavator_spawn_chance: EXCAVATOR_SPAWN_CHANCE,
            foreman_spawn_chance: FOREMAN_SPAWN_CHANCE,
            pirate_scout_interval_ms: PIRATE_SCOUT_INTERVAL_MS,
            pirate_max_scouts: PIRATE_MAX_SCOUTS,
            dreadnought_health_fraction: DREADNOUGHT_HEALTH_FRACTION,
        }
    }
}

impl EngineConfig {
    /// Parse a config from JSON text. Absent fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reward multiplier for `contributors` distinct damage dealers.
    pub fn team_multiplier(contributors: usize) -> f64 {
        match contributors {
            0 => 0.0,
            n => TEAM_REWARD_MULTIPLIERS[(n - 1).min(TEAM_REWARD_MULTIPLIERS.len() - 1)],
        }
    }
}

pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let json = std::fs::read_to_string(path)?;
    EngineConfig::from_json(&json)
}

/// Load the config, falling back to defaults (with a warning) on any failure.
pub fn load_config_or_default(path: &Path) -> EngineConfig {
    match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Failed to load config {}: {}, using defaults", path.display(), e);
            EngineConfig::default()
        }
    }
}

pub fn save_config(config: &EngineConfig, path: &Path) -> Result<(), ConfigError> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}
