//! Participant capability.
//!
//! Any host component that contributes state to a save document
//! implements [`Savable`] and registers itself with the engine.
//! Registration is weak and non-owning: the engine never extends a
//! participant's lifetime, and participants dropped by the host are
//! silently skipped during iteration.

/// A component that can populate fields into a save document on save and
/// read them back out on load.
///
/// Both methods are synchronous from the engine's point of view; a
/// participant must not suspend mid-call. The engine passes `&S` on load,
/// so participants that mutate themselves while loading use interior
/// mutability.
pub trait Savable<S> {
    /// Writes this component's state into the document.
    fn save(&self, data: &mut S);

    /// Reads this component's state back out of the document.
    fn load(&self, data: &S);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SaveData;

    use std::sync::atomic::{AtomicU32, Ordering};

    struct HealthTracker {
        hp: AtomicU32,
    }

    impl Savable<SaveData> for HealthTracker {
        fn save(&self, data: &mut SaveData) {
            data.set("hp", self.hp.load(Ordering::SeqCst).to_string());
        }

        fn load(&self, data: &SaveData) {
            if let Ok(hp) = data.get("hp", "0").parse() {
                self.hp.store(hp, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn savable_round_trips_through_a_document() {
        let tracker = HealthTracker {
            hp: AtomicU32::new(73),
        };

        let mut data = SaveData::new(0, "s");
        tracker.save(&mut data);
        assert_eq!(data.get("hp", ""), "73");

        tracker.hp.store(1, Ordering::SeqCst);
        tracker.load(&data);
        assert_eq!(tracker.hp.load(Ordering::SeqCst), 73);
    }
}
