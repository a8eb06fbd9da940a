pub mod accumulator;
pub mod config;
pub mod dice;
pub mod error;
pub mod progress;
#[cfg(test)]
mod race_game;
pub mod rollout;
pub mod stopping;
mod trial;

pub use accumulator::*;
pub use config::*;
pub use dice::*;
pub use error::*;
pub use progress::*;
pub use rollout::*;
pub use stopping::*;
