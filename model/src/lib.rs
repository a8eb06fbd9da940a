pub mod cube;
pub mod cube_equity;
pub mod equity;
pub mod evaluator;
pub mod match_equity;

pub use cube::*;
pub use cube_equity::*;
pub use equity::*;
pub use evaluator::*;
pub use match_equity::*;
