//! Simulation systems - Lifecycle logic on `SimulationState`, plus the Bevy glue that feeds it

mod assimilation;
mod behavior;
mod boss;
mod drain;
mod formation;
mod health;
mod spawn;
mod triggers;

pub use assimilation::*;
pub use drain::*;
pub use formation::*;
pub use health::*;
