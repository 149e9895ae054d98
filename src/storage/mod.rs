//! Storage handler boundary and reference backends.
//!
//! The engine delegates all byte persistence to a pluggable asynchronous
//! [`StorageHandler`]. Two backends ship with the crate:
//! - [`MemoryStorage`]: in-process reference implementation, also used in
//!   tests and for embedded hosts
//! - [`FsStorage`]: directory-rooted filesystem backend

mod filesystem;
mod memory;
mod traits;

pub use filesystem::FsStorage;
pub use memory::MemoryStorage;
pub use traits::{StorageError, StorageHandler};
