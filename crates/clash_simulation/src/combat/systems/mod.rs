//! Combat systems

pub mod advance;
pub mod commands;
pub mod lifecycle;
pub mod resolution;
pub mod stamina;
pub mod status;


// Re-export all systems
pub use advance::*;
pub use commands::*;
pub use lifecycle::*;
pub use resolution::*;
pub use stamina::*;
pub use status::*;
