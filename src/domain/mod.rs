//! Domain layer for Rust Discipline
//!
//! Core vocabulary shared by every other module: disciplines, severities,
//! violations, diagnostics, reports and the error taxonomy.

pub mod discipline;
pub mod violations;

// Re-export main domain types for convenience
pub use discipline::Discipline;
pub use violations::*;
