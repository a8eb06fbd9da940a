pub mod cancellation;
pub mod config;
pub mod env;
pub mod math;
pub mod rng;

pub use cancellation::*;
pub use config::*;
pub use env::*;
pub use math::*;
pub use rng::*;
