pub mod dice;
pub mod engine;
pub mod players;

pub use crate::dice::*;
pub use crate::engine::*;
pub use crate::players::*;
