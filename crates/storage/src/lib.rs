#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub mod memory;
pub mod snapshot;

pub use memory::MemoryStorage;
pub use snapshot::{Snapshot, SnapshotError};
