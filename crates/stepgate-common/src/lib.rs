//! # Stepgate Common
//!
//! Shared types, errors, and constants used across Stepgate components.
//!
//! ## Modules
//! - `types` - Core data structures (Subject, StepUpPolicy, outcomes)
//! - `error` - Common error types
//! - `constants` - Shared configuration constants and attribute names

pub mod constants;
pub mod error;
pub mod types;

pub use error::StepUpError;
pub use types::*;
