//! # Pacer Library
//!
//! This library exposes the Pacer modules for testing and integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod aggregate;
pub mod cli;
pub mod limiter;

// Re-export pacer_core for convenience
pub use pacer_core;
