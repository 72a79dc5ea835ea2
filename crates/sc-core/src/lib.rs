//! sc-core: shared errors, configuration, platform detection, and the audio
//! file policy.
//!
//! This crate is the foundational dependency for the other sc-* crates.

pub mod config;
pub mod error;
pub mod media;
pub mod platform;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use platform::Platform;
