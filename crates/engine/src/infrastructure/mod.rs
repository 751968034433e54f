//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod clock;
pub mod config;
pub mod file_system;
pub mod memory_save;
pub mod ports;
pub mod sqlite_save;
