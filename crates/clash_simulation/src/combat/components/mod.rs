//! Combat components

pub mod state_machine;
pub mod status;

#[cfg(test)]
mod status_tests;

// Re-export all components
pub use state_machine::*;
pub use status::*;
