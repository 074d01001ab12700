//! Hostiles server - Headless fixed-step host running a demo sector.
//!
//! Usage: `hostiles-server [--config hostiles.json] [--catalog catalog.json]`

use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;

use hostiles::api::{NpcSnapshot, PlayerPresence, Tactics};
use hostiles::catalog::Catalog;
use hostiles::components::{BaseId, NpcState, PlayerId};
use hostiles::messages::{NpcAction, SimEvent};
use hostiles::resources::{HostHooks, PlayerPresences};
use hostiles::settings::load_config_or_default;
use hostiles::world::{BaseSeed, SimulationState};
use hostiles::HostilesPlugin;

#[derive(Parser)]
#[command(author, version, about = "Headless hostile faction simulation", long_about = None)]
struct Cli {
    /// Engine config JSON. Missing or invalid files fall back to defaults.
    #[arg(short, long, default_value = "hostiles.json")]
    config: PathBuf,
    /// NPC and base type catalog JSON. The builtin catalog when omitted.
    #[arg(long)]
    catalog: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    let config = load_config_or_default(&cli.config);

    let level = config.log_level.parse::<tracing::Level>().unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();
    tracing::info!("hostiles-server {} starting, tick {}ms", env!("BUILD_COMMIT"), config.tick_interval_ms);

    let catalog = match &cli.catalog {
        Some(path) => load_catalog(path),
        None => Catalog::builtin(),
    };
    let tick = Duration::from_millis(config.tick_interval_ms.max(1));

    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(tick)))
        .add_plugins(HostilesPlugin { config, catalog })
        .insert_resource(HostHooks { tactics: Box::new(DemoTactics::default()), ..default() })
        .add_systems(Startup, seed_demo_sector)
        .add_systems(Update, log_sim_events)
        .run();
}

fn load_catalog(path: &Path) -> Catalog {
    let loaded = std::fs::read_to_string(path)
        .map_err(hostiles::error::ConfigError::from)
        .and_then(|json| Catalog::from_json(&json));
    match loaded {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::warn!("Failed to load catalog {}: {}, using builtin", path.display(), e);
            Catalog::builtin()
        }
    }
}

/// One base of every faction around the origin and a player parked in the middle.
fn seed_demo_sector(mut state: ResMut<SimulationState>, mut players: ResMut<PlayerPresences>) {
    let bases = [
        (1, "swarm_hive", Vec2::new(-2500.0, 0.0)),
        (2, "pirate_outpost", Vec2::new(2500.0, 0.0)),
        (3, "scavenger_yard", Vec2::new(0.0, 2500.0)),
        (4, "mining_claim", Vec2::new(0.0, -2500.0)),
        (5, "void_rift", Vec2::new(1800.0, 1800.0)),
    ];
    for (id, type_key, position) in bases {
        state.activate(BaseSeed {
            id: BaseId(id),
            type_key: type_key.to_string(),
            position,
            world_object_id: None,
        });
    }
    players.0.push(PlayerPresence { id: PlayerId(1), position: Vec2::ZERO });
    tracing::info!("demo sector seeded: {} bases, {} npcs", state.bases.len(), state.npcs.len());
}

fn log_sim_events(mut events: MessageReader<SimEvent>) {
    for event in events.read() {
        match serde_json::to_string(event) {
            Ok(json) => tracing::debug!("event {}", json),
            Err(e) => tracing::warn!("event not serializable: {}", e),
        }
    }
}

/// Stand-in brain: shoots what is in range, scouts report, workers haul home.
#[derive(Default)]
struct DemoTactics {
    calls: u64,
}

impl Tactics for DemoTactics {
    fn update_npc_ai(
        &mut self,
        npc: &NpcSnapshot,
        nearby_players: &[PlayerPresence],
        _all_npcs: &[NpcSnapshot],
        _dt_ms: u64,
    ) -> Option<NpcAction> {
        self.calls += 1;
        let target = nearby_players.iter()
            .min_by(|a, b| {
                let (da, db) = (a.position.distance(npc.position), b.position.distance(npc.position));
                da.total_cmp(&db)
            });
        let in_range = target.filter(|p| p.position.distance(npc.position) <= npc.aggro_range);

        match (npc.type_key.as_str(), in_range) {
            ("pirate_scout", Some(p)) => Some(NpcAction::PirateIntel { target: p.position }),
            (_, Some(p)) if npc.state != NpcState::Attached => Some(NpcAction::Fire { target: p.id }),
            ("scavenger_scrapper" | "scavenger_salvager", None) if self.calls % 200 == 0 => {
                Some(NpcAction::ScavengerDumped { amount: 25 })
            }
            ("rogue_prospector" | "rogue_excavator", None) if self.calls % 300 == 0 => {
                Some(NpcAction::MinerDeposit { credits: 40 })
            }
            _ => None,
        }
    }
}
