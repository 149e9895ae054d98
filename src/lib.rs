//! # saveslot
//!
//! Slot-based save persistence engine for long-lived interactive
//! applications.
//!
//! The engine serializes a mutable in-memory document by asking every
//! registered participant ([`Savable`]) to contribute its state, slicing
//! the iteration across scheduling quanta so a large participant
//! population never stalls the host. Byte persistence is delegated to a
//! pluggable asynchronous [`StorageHandler`]; saves land in numbered
//! slots with predictable file names, each accompanied by a lightweight
//! header for slot pickers.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use saveslot::{FsStorage, SaveData, ConfigData, SaveEngine};
//!
//! # async fn run() -> saveslot::SaveResult<()> {
//! let storage = Arc::new(FsStorage::new("saves"));
//! let engine: SaveEngine<SaveData, ConfigData> =
//!     SaveEngine::builder(storage).build()?;
//!
//! let slot = engine.find_next_free_slot().await?.unwrap_or(0);
//! engine.set_current_save_data(SaveData::new(slot, "New Game")).await;
//! engine.save_current_data(true).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! Save and load of the same category (data or config) exclude each
//! other; an attempt to start a conflicting operation fails immediately
//! with [`SaveError::OperationInProgress`] rather than queueing. Data and
//! config operations are independent. At most one [`SaveEngine`] may be
//! live per process.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod codec;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod savable;
pub mod scheduler;
pub mod storage;

pub use codec::{CodecError, DocumentCodec, JsonCodec};
pub use config::EngineConfig;
pub use document::{ConfigData, ConfigDocument, SaveData, SaveDocument, SaveHeader};
pub use engine::{EngineHooks, SaveEngine, SaveEngineBuilder};
pub use error::{OpCategory, SaveError, SaveResult};
pub use savable::Savable;
pub use scheduler::{InlineScheduler, Scheduler, TokioScheduler};
pub use storage::{FsStorage, MemoryStorage, StorageError, StorageHandler};
