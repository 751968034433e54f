//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Save slots (could swap SQLite -> browser storage)
//! - The virtual file system owned by the desktop shell
//! - Clock (for testing)

mod error;
mod file_system;
mod persistence;
mod testing;

// =============================================================================
// Persistence Ports
// =============================================================================
pub use persistence::SaveStorePort;

// =============================================================================
// Collaborator Ports
// =============================================================================
pub use file_system::{FileEntry, FileMetadata, FileSystemPort, NodeKind};

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::ClockPort;

#[cfg(test)]
pub use file_system::MockFileSystemPort;
#[cfg(test)]
pub use persistence::MockSaveStorePort;
#[cfg(test)]
pub use testing::MockClockPort;

// =============================================================================
// Error Types
// =============================================================================
pub use error::{FileSystemError, SaveError};
