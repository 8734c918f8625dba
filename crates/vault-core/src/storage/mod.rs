//! Storage backends for the vault record and authenticator credentials
//!
//! This module provides three backends:
//! 1. In-memory (tests, ephemeral sessions)
//! 2. JSON file in the data directory
//! 3. OS Keychain (hardware-backed where available)

mod file;
mod keychain;
mod memory;
mod traits;

pub use file::FileStore;
pub use keychain::{KeychainStore, DEFAULT_SERVICE_NAME};
pub use memory::MemoryStore;
pub use traits::KeyValueStore;
