//! Domain models for the encounter simulation.

mod action;
mod case;
mod state;
mod turn;

pub use action::*;
pub use case::*;
pub use state::*;
pub use turn::*;
