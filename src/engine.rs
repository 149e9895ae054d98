//! Orchestration engine.
//!
//! [`SaveEngine`] owns the current save and config documents, the ordered
//! participant registry, and the per-category mutual-exclusion gates. It
//! delegates byte persistence to a [`StorageHandler`], (de)serialization
//! to a [`DocumentCodec`], and suspension to a [`Scheduler`].
//!
//! Concurrency model: save and load of the same category (data or config)
//! exclude each other; data and config operations are independent and may
//! overlap. Participant iteration is time-sliced cooperatively, never
//! parallelized, so participant callbacks for one operation run strictly
//! in registration order. An operation that has started always runs to
//! completion; there is no cancellation, which is why the gates exist.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError, Weak};

use tokio::sync::Mutex;

use crate::codec::{DocumentCodec, JsonCodec};
use crate::config::EngineConfig;
use crate::document::{ConfigDocument, SaveDocument, SaveHeader};
use crate::error::{OpCategory, SaveError, SaveResult};
use crate::savable::Savable;
use crate::scheduler::{Scheduler, TokioScheduler};
use crate::storage::StorageHandler;

/// Host customization points invoked at the start of the data pipelines,
/// before any participant runs. All methods default to no-ops; `()` can
/// be used where no last-moment adjustments are needed.
pub trait EngineHooks<S>: Send + Sync {
    /// Runs before participants populate the document on save.
    fn pre_save(&self, _data: &mut S) {}

    /// Runs before participants read the document on load.
    fn pre_load(&self, _data: &mut S) {}
}

impl<S> EngineHooks<S> for () {}

type SavableRef<S> = Weak<dyn Savable<S> + Send + Sync>;

// At most one engine may be live per process. The token is released when
// the engine is dropped.
static ENGINE_LIVE: AtomicBool = AtomicBool::new(false);

fn acquire_engine_token() -> bool {
    ENGINE_LIVE
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_ok()
}

fn release_engine_token() {
    ENGINE_LIVE.store(false, Ordering::SeqCst);
}

const IDLE: u8 = 0;
const SAVING: u8 = 1;
const LOADING: u8 = 2;

/// Tri-state mutual-exclusion gate for one operation category.
///
/// Acquisition is a single compare-exchange, so the check-then-set is
/// race-free under multithreaded hosts.
struct Gate {
    category: OpCategory,
    state: AtomicU8,
}

impl Gate {
    const fn new(category: OpCategory) -> Self {
        Self {
            category,
            state: AtomicU8::new(IDLE),
        }
    }

    fn begin(&self, op: u8) -> SaveResult<GateGuard<'_>> {
        if self
            .state
            .compare_exchange(IDLE, op, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::error!(
                category = %self.category,
                "a save/load operation is already in progress, refusing to start another"
            );
            return Err(SaveError::OperationInProgress {
                category: self.category,
            });
        }
        Ok(GateGuard { gate: self })
    }

    fn is(&self, op: u8) -> bool {
        self.state.load(Ordering::SeqCst) == op
    }
}

/// Clears the gate on every exit path, success or failure, so one failed
/// operation can never leave the engine permanently unavailable.
struct GateGuard<'a> {
    gate: &'a Gate,
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        self.gate.state.store(IDLE, Ordering::SeqCst);
    }
}

/// Slot-based save persistence engine.
///
/// Constructed through [`SaveEngine::builder`]; at most one engine may be
/// live per process, and the host's composition root owns it.
pub struct SaveEngine<S: SaveDocument, C: ConfigDocument> {
    config: EngineConfig,
    storage: Arc<dyn StorageHandler>,
    scheduler: Arc<dyn Scheduler>,
    save_codec: Box<dyn DocumentCodec<S>>,
    config_codec: Box<dyn DocumentCodec<C>>,
    hooks: Box<dyn EngineHooks<S>>,
    savables: StdMutex<Vec<SavableRef<S>>>,
    current_save: Mutex<Option<S>>,
    current_config: Mutex<Option<C>>,
    data_gate: Gate,
    config_gate: Gate,
}

impl<S: SaveDocument, C: ConfigDocument> std::fmt::Debug for SaveEngine<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`SaveEngine`].
///
/// A storage handler is required; scheduler, codecs, hooks, and
/// configuration default to [`TokioScheduler`], [`JsonCodec`], no-op
/// hooks, and [`EngineConfig::default`].
pub struct SaveEngineBuilder<S: SaveDocument, C: ConfigDocument> {
    config: EngineConfig,
    storage: Arc<dyn StorageHandler>,
    scheduler: Arc<dyn Scheduler>,
    save_codec: Box<dyn DocumentCodec<S>>,
    config_codec: Box<dyn DocumentCodec<C>>,
    hooks: Box<dyn EngineHooks<S>>,
}

impl<S: SaveDocument, C: ConfigDocument> SaveEngineBuilder<S, C> {
    fn new(storage: Arc<dyn StorageHandler>) -> Self {
        Self {
            config: EngineConfig::default(),
            storage,
            scheduler: Arc::new(TokioScheduler),
            save_codec: Box::new(JsonCodec),
            config_codec: Box::new(JsonCodec),
            hooks: Box::new(()),
        }
    }

    /// Replaces the engine configuration.
    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the yield injection point.
    #[must_use]
    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Replaces the save document codec.
    #[must_use]
    pub fn save_codec(mut self, codec: Box<dyn DocumentCodec<S>>) -> Self {
        self.save_codec = codec;
        self
    }

    /// Replaces the config document codec.
    #[must_use]
    pub fn config_codec(mut self, codec: Box<dyn DocumentCodec<C>>) -> Self {
        self.config_codec = codec;
        self
    }

    /// Replaces the pre-save/pre-load hooks.
    #[must_use]
    pub fn hooks(mut self, hooks: Box<dyn EngineHooks<S>>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Builds the engine.
    ///
    /// # Errors
    /// Returns [`SaveError::AlreadyInitialized`] while another engine is
    /// live in this process.
    pub fn build(self) -> SaveResult<SaveEngine<S, C>> {
        if !acquire_engine_token() {
            tracing::error!("duplicate save engine initialization attempt");
            return Err(SaveError::AlreadyInitialized);
        }
        tracing::debug!(
            slot_count = self.config.slot_count,
            "save engine initialized"
        );
        Ok(SaveEngine {
            config: self.config,
            storage: self.storage,
            scheduler: self.scheduler,
            save_codec: self.save_codec,
            config_codec: self.config_codec,
            hooks: self.hooks,
            savables: StdMutex::new(Vec::new()),
            current_save: Mutex::new(None),
            current_config: Mutex::new(None),
            data_gate: Gate::new(OpCategory::Data),
            config_gate: Gate::new(OpCategory::Config),
        })
    }
}

impl<S: SaveDocument, C: ConfigDocument> SaveEngine<S, C> {
    /// Starts building an engine bound to `storage`.
    #[must_use]
    pub fn builder(storage: Arc<dyn StorageHandler>) -> SaveEngineBuilder<S, C> {
        SaveEngineBuilder::new(storage)
    }

    /// The engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ---- participant registry ------------------------------------------

    /// Registers a participant. Registration is weak: the engine never
    /// extends the participant's lifetime, and iteration follows
    /// registration order.
    pub fn register_savable<P>(&self, savable: &Arc<P>)
    where
        P: Savable<S> + Send + Sync + 'static,
    {
        let weak = Arc::downgrade(savable);
        let weak: SavableRef<S> = weak;
        self.lock_savables().push(weak);
    }

    /// Unregisters a participant by identity. Dead entries are pruned in
    /// the same pass.
    pub fn unregister_savable<P>(&self, savable: &Arc<P>)
    where
        P: Savable<S> + Send + Sync + 'static,
    {
        let target = Arc::as_ptr(savable).cast::<()>();
        self.lock_savables()
            .retain(|entry| entry.strong_count() > 0 && entry.as_ptr().cast::<()>() != target);
    }

    /// Number of registered (live or not-yet-pruned) participants.
    #[must_use]
    pub fn registered_savable_count(&self) -> usize {
        self.lock_savables().len()
    }

    fn lock_savables(&self) -> std::sync::MutexGuard<'_, Vec<SavableRef<S>>> {
        self.savables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot_savables(&self) -> Vec<SavableRef<S>> {
        self.lock_savables().clone()
    }

    // ---- busy flags ------------------------------------------------------

    /// True while a data save is in flight.
    #[must_use]
    pub fn is_saving_data(&self) -> bool {
        self.data_gate.is(SAVING)
    }

    /// True while a data load is in flight.
    #[must_use]
    pub fn is_loading_data(&self) -> bool {
        self.data_gate.is(LOADING)
    }

    /// True while a config save is in flight.
    #[must_use]
    pub fn is_saving_config(&self) -> bool {
        self.config_gate.is(SAVING)
    }

    /// True while a config load is in flight.
    #[must_use]
    pub fn is_loading_config(&self) -> bool {
        self.config_gate.is(LOADING)
    }

    // ---- current documents -----------------------------------------------

    /// Installs `data` as the current save document.
    pub async fn set_current_save_data(&self, data: S) {
        *self.current_save.lock().await = Some(data);
    }

    /// Clone of the current save document, if set.
    pub async fn current_save_data(&self) -> Option<S>
    where
        S: Clone,
    {
        self.current_save.lock().await.clone()
    }

    /// Removes and returns the current save document.
    pub async fn take_current_save_data(&self) -> Option<S> {
        self.current_save.lock().await.take()
    }

    /// Installs `config` as the current config document.
    pub async fn set_current_config_data(&self, config: C) {
        *self.current_config.lock().await = Some(config);
    }

    /// Clone of the current config document, if set.
    pub async fn current_config_data(&self) -> Option<C>
    where
        C: Clone,
    {
        self.current_config.lock().await.clone()
    }

    // ---- data pipeline -----------------------------------------------------

    /// Saves the current save document.
    ///
    /// Runs the pre-save hook, yields one quantum, iterates participants
    /// in registration order (yielding between quanta), yields once more,
    /// then, if `persist_to_storage`, encodes the document and writes it
    /// to the slot's storage key plus a best-effort header.
    ///
    /// # Errors
    /// - [`SaveError::OperationInProgress`] if a data save/load is in flight
    /// - [`SaveError::NoCurrentSaveData`] if no document has been set
    /// - [`SaveError::Codec`] / [`SaveError::Storage`] from persistence;
    ///   the in-memory document keeps everything participants populated
    pub async fn save_current_data(&self, persist_to_storage: bool) -> SaveResult<()> {
        let _gate = self.data_gate.begin(SAVING)?;
        let mut guard = self.current_save.lock().await;
        let Some(data) = guard.as_mut() else {
            tracing::error!("save file not loaded or created, cannot save");
            return Err(SaveError::NoCurrentSaveData);
        };

        self.hooks.pre_save(data);
        self.scheduler.yield_now().await;

        self.run_savables(data, true).await;
        self.scheduler.yield_now().await;

        if !persist_to_storage {
            tracing::debug!(slot = data.slot_index(), "in-memory save complete");
            return Ok(());
        }

        let slot = data.slot_index();
        let key = self.config.save_file_name(slot);
        let bytes = self.save_codec.encode(data).map_err(|e| {
            tracing::error!(%key, error = %e, "encoding save document failed");
            e
        })?;
        self.storage.write(&key, &bytes).await.map_err(|e| {
            tracing::error!(%key, error = %e, "writing save document failed");
            e
        })?;

        self.write_header(data.display_name(), slot).await;
        tracing::debug!(%key, "save persisted");
        Ok(())
    }

    /// Loads the save document stored in `slot` and returns it.
    ///
    /// Does not install the document as current; the host decides what to
    /// do with it (typically [`set_current_save_data`] followed by
    /// [`load_current_data`]).
    ///
    /// [`set_current_save_data`]: SaveEngine::set_current_save_data
    /// [`load_current_data`]: SaveEngine::load_current_data
    ///
    /// # Errors
    /// - [`SaveError::OperationInProgress`] if a data save/load is in flight
    /// - [`SaveError::SlotNotFound`] when the slot has no stored document
    /// - [`SaveError::Storage`] / [`SaveError::Codec`] on I/O or decode
    ///   failure
    pub async fn load_slot(&self, slot: u32) -> SaveResult<S> {
        let _gate = self.data_gate.begin(LOADING)?;
        let key = self.config.save_file_name(slot);

        let exists = self.storage.exists(&key).await.map_err(|e| {
            tracing::error!(%key, error = %e, "save file existence check failed");
            e
        })?;
        if !exists {
            tracing::error!(%key, "load failed, save file does not exist");
            return Err(SaveError::SlotNotFound { slot });
        }

        let bytes = self.storage.read(&key).await.map_err(|e| {
            tracing::error!(%key, error = %e, "reading save document failed");
            e
        })?;
        let mut data = self.save_codec.decode(&bytes).map_err(|e| {
            tracing::error!(%key, error = %e, "decoding save document failed");
            e
        })?;

        data.mark_loaded(slot);
        tracing::debug!(%key, "save loaded");
        Ok(data)
    }

    /// Reads the lightweight header for `slot` without decoding the full
    /// save document. Read-only and not exclusion-guarded: a poll during
    /// an in-flight save may observe the slot's previous header.
    ///
    /// # Errors
    /// - [`SaveError::HeaderNotFound`] when no header was recorded
    /// - [`SaveError::Storage`] / [`SaveError::Codec`] on I/O or decode
    ///   failure
    pub async fn load_slot_header(&self, slot: u32) -> SaveResult<SaveHeader> {
        let key = self.config.save_header_file_name(slot);
        if !self.storage.exists(&key).await? {
            return Err(SaveError::HeaderNotFound { slot });
        }
        let bytes = self.storage.read(&key).await?;
        Ok(JsonCodec.decode(&bytes)?)
    }

    /// Redistributes the current save document to all participants by
    /// invoking their `load` methods, with the same quantum discipline as
    /// saving. Touches no storage: the document bytes are assumed to have
    /// been loaded already via [`load_slot`](SaveEngine::load_slot).
    ///
    /// # Errors
    /// - [`SaveError::OperationInProgress`] if a data save/load is in flight
    /// - [`SaveError::NoCurrentSaveData`] if no document has been set
    pub async fn load_current_data(&self) -> SaveResult<()> {
        let _gate = self.data_gate.begin(LOADING)?;
        let mut guard = self.current_save.lock().await;
        let Some(data) = guard.as_mut() else {
            tracing::error!("save file not loaded or created, cannot load");
            return Err(SaveError::NoCurrentSaveData);
        };

        self.hooks.pre_load(data);
        self.scheduler.yield_now().await;

        self.run_savables(data, false).await;
        self.scheduler.yield_now().await;
        Ok(())
    }

    /// Iterates the participant snapshot in registration order, yielding
    /// a quantum after every `max_savables_per_quantum + 1` participants
    /// processed. Dropped participants are skipped.
    async fn run_savables(&self, data: &mut S, saving: bool) {
        let savables = self.snapshot_savables();
        let mut processed = 0_usize;
        for entry in &savables {
            let Some(savable) = entry.upgrade() else {
                continue;
            };
            if saving {
                savable.save(data);
            } else {
                savable.load(data);
            }
            processed += 1;
            if processed > self.config.max_savables_per_quantum {
                processed = 0;
                self.scheduler.yield_now().await;
            }
        }
    }

    // ---- config pipeline -------------------------------------------------

    /// Saves the current config document; single-shot, no participant
    /// iteration. With `persist_to_storage` false this only validates the
    /// in-memory copy, still exercising the exclusion gate.
    ///
    /// # Errors
    /// - [`SaveError::OperationInProgress`] if a config save/load is in
    ///   flight
    /// - [`SaveError::NoCurrentConfigData`] if no config has been set
    /// - [`SaveError::Codec`] / [`SaveError::Storage`] from persistence
    pub async fn save_current_config(&self, persist_to_storage: bool) -> SaveResult<()> {
        let _gate = self.config_gate.begin(SAVING)?;
        let guard = self.current_config.lock().await;
        let Some(config) = guard.as_ref() else {
            tracing::error!("config data not loaded or created, cannot save");
            return Err(SaveError::NoCurrentConfigData);
        };

        if !persist_to_storage {
            return Ok(());
        }

        let key = self.config.config_file_name.as_str();
        let bytes = self.config_codec.encode(config).map_err(|e| {
            tracing::error!(%key, error = %e, "encoding config failed");
            e
        })?;
        self.storage.write(key, &bytes).await.map_err(|e| {
            tracing::error!(%key, error = %e, "writing config failed");
            e
        })?;
        tracing::debug!(%key, "config persisted");
        Ok(())
    }

    /// Loads the config document from storage and installs it as the
    /// current config on success.
    ///
    /// # Errors
    /// - [`SaveError::OperationInProgress`] if a config save/load is in
    ///   flight
    /// - [`SaveError::ConfigNotFound`] when no config has been persisted
    /// - [`SaveError::Storage`] / [`SaveError::Codec`] on I/O or decode
    ///   failure
    pub async fn load_current_config(&self) -> SaveResult<()> {
        let _gate = self.config_gate.begin(LOADING)?;
        let key = self.config.config_file_name.as_str();

        let exists = self.storage.exists(key).await.map_err(|e| {
            tracing::error!(%key, error = %e, "config existence check failed");
            e
        })?;
        if !exists {
            tracing::error!(%key, "load failed, config file does not exist");
            return Err(SaveError::ConfigNotFound);
        }

        let bytes = self.storage.read(key).await.map_err(|e| {
            tracing::error!(%key, error = %e, "reading config failed");
            e
        })?;
        let config = self.config_codec.decode(&bytes).map_err(|e| {
            tracing::error!(%key, error = %e, "decoding config failed");
            e
        })?;

        *self.current_config.lock().await = Some(config);
        tracing::debug!(%key, "config loaded");
        Ok(())
    }

    /// Reports whether a config document has been persisted.
    ///
    /// # Errors
    /// Returns [`SaveError::Storage`] if the existence check itself failed.
    pub async fn does_config_exist(&self) -> SaveResult<bool> {
        Ok(self
            .storage
            .exists(self.config.config_file_name.as_str())
            .await?)
    }

    // ---- slot search -------------------------------------------------------

    /// Finds the lowest slot index with no stored save document.
    ///
    /// Probes are sequential, each completes before the next starts, and
    /// the search stops at the first gap. Slots are densely packed from
    /// zero under normal operation, so the linear scan costs at most
    /// `slot_count` storage round-trips.
    ///
    /// Returns `Ok(None)` when all slots are occupied; the host decides
    /// how to proceed (e.g. prompt for overwrite).
    ///
    /// # Errors
    /// Returns [`SaveError::Storage`] if any existence check fails; an I/O
    /// error is never treated as "slot available".
    pub async fn find_next_free_slot(&self) -> SaveResult<Option<u32>> {
        for slot in 0..self.config.slot_count {
            let key = self.config.save_file_name(slot);
            let occupied = self.storage.exists(&key).await.map_err(|e| {
                tracing::error!(%key, error = %e, "failed to check if a save file exists");
                e
            })?;
            if !occupied {
                return Ok(Some(slot));
            }
        }
        Ok(None)
    }

    // ---- internals ---------------------------------------------------------

    /// Best-effort header write; a failure here never fails the save.
    async fn write_header(&self, name: &str, slot: u32) {
        let key = self.config.save_header_file_name(slot);
        let header = SaveHeader::new(name, slot);
        match JsonCodec.encode(&header) {
            Ok(bytes) => {
                if let Err(e) = self.storage.write(&key, &bytes).await {
                    tracing::warn!(%key, error = %e, "writing save header failed, save itself succeeded");
                }
            }
            Err(e) => {
                tracing::warn!(%key, error = %e, "encoding save header failed, save itself succeeded");
            }
        }
    }
}

impl<S: SaveDocument, C: ConfigDocument> Drop for SaveEngine<S, C> {
    fn drop(&mut self) {
        release_engine_token();
        tracing::debug!("save engine dropped");
    }
}
