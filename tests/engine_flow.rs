//! End-to-end lifecycle tests against the filesystem backend: a session
//! that creates a save, persists it, then a fresh engine (a simulated
//! restart) that finds and restores it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use saveslot::{
    ConfigData, FsStorage, Savable, SaveData, SaveEngine, SaveError, Scheduler, TokioScheduler,
};
use tempfile::tempdir;

type Engine = SaveEngine<SaveData, ConfigData>;

// One engine per process: tests in this binary take turns.
fn engine_lock() -> MutexGuard<'static, ()> {
    static LOCK: Mutex<()> = Mutex::new(());
    LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A participant with real mutable state, the way a host subsystem would
/// hold it.
struct PlayerState {
    health: Mutex<u32>,
    zone: Mutex<String>,
}

impl PlayerState {
    fn new(health: u32, zone: &str) -> Arc<Self> {
        Arc::new(Self {
            health: Mutex::new(health),
            zone: Mutex::new(zone.to_string()),
        })
    }
}

impl Savable<SaveData> for PlayerState {
    fn save(&self, data: &mut SaveData) {
        data.set("player.health", self.health.lock().unwrap().to_string());
        data.set("player.zone", self.zone.lock().unwrap().clone());
    }

    fn load(&self, data: &SaveData) {
        *self.health.lock().unwrap() = data.get("player.health", "100").parse().unwrap();
        *self.zone.lock().unwrap() = data.get("player.zone", "start").to_string();
    }
}

struct WorldClock {
    day: Mutex<u32>,
}

impl Savable<SaveData> for WorldClock {
    fn save(&self, data: &mut SaveData) {
        data.set("world.day", self.day.lock().unwrap().to_string());
    }

    fn load(&self, data: &SaveData) {
        *self.day.lock().unwrap() = data.get("world.day", "1").parse().unwrap();
    }
}

#[tokio::test]
async fn save_then_restart_then_restore() {
    let _serial = engine_lock();
    let dir = tempdir().unwrap();
    let scheduler: Arc<dyn Scheduler> = Arc::new(TokioScheduler);

    // --- first session: new game, save to the first free slot ---------
    {
        let storage = Arc::new(FsStorage::new(dir.path()));
        let engine: Engine = SaveEngine::builder(storage)
            .scheduler(scheduler.clone())
            .build()
            .unwrap();

        assert!(!engine.does_config_exist().await.unwrap());
        let slot = engine.find_next_free_slot().await.unwrap().unwrap();
        assert_eq!(slot, 0);

        let player = PlayerState::new(73, "caves");
        let clock = Arc::new(WorldClock { day: Mutex::new(42) });
        engine.register_savable(&player);
        engine.register_savable(&clock);

        engine
            .set_current_save_data(SaveData::new(slot, "Expedition"))
            .await;
        engine.save_current_data(true).await.unwrap();

        let mut config = ConfigData::new();
        config.set_previous_slot(slot);
        engine.set_current_config_data(config).await;
        engine.save_current_config(true).await.unwrap();
    }

    // --- restart: a new engine over the same directory ----------------
    {
        let storage = Arc::new(FsStorage::new(dir.path()));
        let engine: Engine = SaveEngine::builder(storage)
            .scheduler(scheduler.clone())
            .build()
            .unwrap();

        assert!(engine.does_config_exist().await.unwrap());
        engine.load_current_config().await.unwrap();
        let config = engine.current_config_data().await.unwrap();
        let slot = config.previous_slot().unwrap();

        // The header is enough to populate a slot picker.
        let header = engine.load_slot_header(slot).await.unwrap();
        assert_eq!(header.name, "Expedition");
        assert_eq!(header.slot_index, slot);

        // Fresh subsystem state, then restore from the slot.
        let player = PlayerState::new(100, "start");
        let clock = Arc::new(WorldClock { day: Mutex::new(1) });
        engine.register_savable(&player);
        engine.register_savable(&clock);

        let data = engine.load_slot(slot).await.unwrap();
        assert!(!data.is_fresh());
        engine.set_current_save_data(data).await;
        engine.load_current_data().await.unwrap();

        assert_eq!(*player.health.lock().unwrap(), 73);
        assert_eq!(*player.zone.lock().unwrap(), "caves");
        assert_eq!(*clock.day.lock().unwrap(), 42);

        // The occupied slot is skipped by the next free-slot search.
        assert_eq!(engine.find_next_free_slot().await.unwrap(), Some(1));
    }
}

#[tokio::test]
async fn slots_fill_in_order_until_exhausted() {
    let _serial = engine_lock();
    let dir = tempdir().unwrap();

    let storage = Arc::new(FsStorage::new(dir.path()));
    let engine: Engine = SaveEngine::builder(storage).build().unwrap();
    let slot_count = engine.config().slot_count;

    for expected in 0..slot_count {
        let slot = engine.find_next_free_slot().await.unwrap();
        assert_eq!(slot, Some(expected));
        engine
            .set_current_save_data(SaveData::new(expected, format!("Run {expected}")))
            .await;
        engine.save_current_data(true).await.unwrap();
    }

    assert_eq!(engine.find_next_free_slot().await.unwrap(), None);

    // Every header is independently listable.
    for slot in 0..slot_count {
        let header = engine.load_slot_header(slot).await.unwrap();
        assert_eq!(header.name, format!("Run {slot}"));
    }
}

#[tokio::test]
async fn missing_slot_is_a_clean_error_on_disk() {
    let _serial = engine_lock();
    let dir = tempdir().unwrap();

    let storage = Arc::new(FsStorage::new(dir.path()));
    let engine: Engine = SaveEngine::builder(storage).build().unwrap();

    let err = engine.load_slot(4).await.unwrap_err();
    assert!(matches!(err, SaveError::SlotNotFound { slot: 4 }));
    assert!(err.is_not_found());
    assert!(!engine.is_loading_data());
}
