pub mod context;
pub mod cube_decision;
pub mod luck;
pub mod options;
pub mod rating;
pub mod skill;
pub mod statcontext;

pub use context::*;
pub use cube_decision::*;
pub use luck::*;
pub use options::*;
pub use rating::*;
pub use skill::*;
pub use statcontext::*;
