// 🏦 Allocation Store - owns the form state and mirrors it into storage
//
// Every public operation is total: bad input degrades to a no-op or to 0,
// storage failures are logged and swallowed. Nothing is saved until the
// initial load has finished, so the seed never overwrites real data.

use tracing::{debug, info, warn};

use crate::allocation::{parse_percentage, AllocationState, AllocationStatus, Category};
use crate::record;
use crate::storage::KeyValueStore;
use crate::summary::AllocationSummary;

/// Fixed key the record is stored under
pub const STORAGE_KEY: &str = "moneypot-data";

pub struct AllocationStore<S: KeyValueStore> {
    state: AllocationState,
    storage: S,
    key: String,
    ready: bool,
}

impl<S: KeyValueStore> AllocationStore<S> {
    /// Seeded store that has not loaded yet (`is_ready() == false`)
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, STORAGE_KEY)
    }

    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        AllocationStore {
            state: AllocationState::seed(),
            storage,
            key: key.into(),
            ready: false,
        }
    }

    /// Create and immediately load from storage
    pub fn open(storage: S) -> Self {
        let mut store = Self::new(storage);
        store.load();
        store
    }

    /// Pull the persisted record, if any, over the current state and mark the store ready.
    ///
    /// Returns true when a stored record was applied. Absent or undecodable
    /// data leaves the seed in place.
    pub fn load(&mut self) -> bool {
        let applied = match self.storage.load(&self.key) {
            Ok(Some(payload)) => match record::decode(&payload) {
                Ok(persisted) => {
                    debug!(key = %self.key, version = persisted.version, "Loaded saved allocation");
                    persisted.apply_to(&mut self.state);
                    true
                }
                Err(e) => {
                    warn!(key = %self.key, "Ignoring undecodable saved data: {}", e);
                    false
                }
            },
            Ok(None) => {
                debug!(key = %self.key, "No saved data found, using defaults");
                false
            }
            Err(e) => {
                warn!(key = %self.key, "Error loading data: {}", e);
                false
            }
        };

        self.ready = true;
        applied
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn state(&self) -> &AllocationState {
        &self.state
    }

    pub fn categories(&self) -> &[Category] {
        &self.state.categories
    }

    pub fn total_amount(&self) -> &str {
        &self.state.total_amount
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Store the raw total; it is only validated when allocations are derived.
    pub fn set_total_amount(&mut self, value: &str) -> bool {
        if self.state.total_amount == value {
            return false;
        }
        self.state.total_amount = value.to_string();
        self.persist();
        true
    }

    /// Append a goal at 0%. Returns the new id, or `None` when the trimmed name is empty.
    pub fn add_category(&mut self, name: &str) -> Option<String> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let category = Category::new(name, 0.0);
        let id = category.id.clone();
        self.state.categories.push(category);
        self.persist();
        Some(id)
    }

    pub fn delete_category(&mut self, id: &str) -> bool {
        let before = self.state.categories.len();
        self.state.categories.retain(|c| c.id != id);
        if self.state.categories.len() == before {
            return false;
        }
        self.persist();
        true
    }

    /// Replace the name of `id`; an empty (after trimming) name is dropped.
    pub fn rename_category(&mut self, id: &str, new_name: &str) -> bool {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return false;
        }

        match self.state.find_mut(id) {
            Some(category) if category.name != new_name => {
                category.name = new_name.to_string();
            }
            _ => return false,
        }
        self.persist();
        true
    }

    /// Parse, clamp to [0, 100] and store. Unparseable input stores 0.
    pub fn set_percentage(&mut self, id: &str, raw_value: &str) -> bool {
        let value = parse_percentage(raw_value);

        match self.state.find_mut(id) {
            Some(category) if category.percentage != value => {
                category.percentage = value;
            }
            _ => return false,
        }
        self.persist();
        true
    }

    /// Restore the seed and erase the stored record. Does nothing unless `confirmed`.
    pub fn reset(&mut self, confirmed: bool) -> bool {
        if !confirmed {
            debug!("Reset not confirmed, keeping current data");
            return false;
        }

        if let Err(e) = self.storage.erase(&self.key) {
            warn!(key = %self.key, "Error resetting data: {}", e);
        }
        self.state = AllocationState::seed();
        info!(key = %self.key, "Allocation data reset to defaults");
        true
    }

    // ========================================================================
    // DERIVED VALUES
    // ========================================================================

    pub fn allocation_for(&self, category: &Category) -> f64 {
        self.state.allocation_for(category)
    }

    pub fn total_percentage(&self) -> f64 {
        self.state.total_percentage()
    }

    pub fn is_balanced(&self) -> bool {
        self.state.is_balanced()
    }

    pub fn remaining_amount(&self) -> f64 {
        self.state.remaining_amount()
    }

    pub fn status(&self) -> AllocationStatus {
        self.state.status()
    }

    pub fn summary(&self) -> AllocationSummary {
        AllocationSummary::from_state(&self.state)
    }

    fn persist(&self) {
        if !self.ready {
            debug!(key = %self.key, "Skipping save before initial load");
            return;
        }

        let payload = match record::encode(&self.state) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Error encoding data: {}", e);
                return;
            }
        };

        match self.storage.save(&self.key, &payload) {
            Ok(()) => debug!(key = %self.key, bytes = payload.len(), "Saved allocation"),
            Err(e) => warn!(key = %self.key, "Error saving data: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, Result as StorageResult, StorageError};
    use std::cell::Cell;

    /// Store double whose every call fails
    struct BrokenStore {
        saves: Cell<usize>,
    }

    impl BrokenStore {
        fn new() -> Self {
            BrokenStore { saves: Cell::new(0) }
        }
    }

    impl KeyValueStore for BrokenStore {
        fn load(&self, _key: &str) -> StorageResult<Option<String>> {
            Err(StorageError::Unavailable("disk on fire".to_string()))
        }

        fn save(&self, _key: &str, _value: &str) -> StorageResult<()> {
            self.saves.set(self.saves.get() + 1);
            Err(StorageError::Unavailable("disk on fire".to_string()))
        }

        fn erase(&self, _key: &str) -> StorageResult<()> {
            Err(StorageError::Unavailable("disk on fire".to_string()))
        }
    }

    fn opened() -> (AllocationStore<MemoryStore>, MemoryStore) {
        let storage = MemoryStore::new();
        (AllocationStore::open(storage.clone()), storage)
    }

    #[test]
    fn test_starts_with_seed_when_storage_empty() {
        let (store, storage) = opened();
        assert!(store.is_ready());
        assert!(store.state().is_seed());
        // loading alone never writes
        assert!(storage.is_empty());
    }

    #[test]
    fn test_not_ready_until_loaded() {
        let store = AllocationStore::new(MemoryStore::new());
        assert!(!store.is_ready());
    }

    #[test]
    fn test_no_save_before_ready() {
        let storage = MemoryStore::new();
        storage
            .save(STORAGE_KEY, r#"{"categories":[],"totalAmount":"999"}"#)
            .unwrap();

        let mut store = AllocationStore::new(storage.clone());
        store.set_total_amount("5");
        assert_eq!(
            storage.load(STORAGE_KEY).unwrap().as_deref(),
            Some(r#"{"categories":[],"totalAmount":"999"}"#)
        );

        store.load();
        assert!(store.categories().is_empty());
        assert_eq!(store.total_amount(), "999");
    }

    #[test]
    fn test_set_percentage_clamps() {
        let (mut store, _) = opened();
        let id = store.categories()[0].id.clone();

        for (raw, expected) in [("42", 42.0), ("100", 100.0), ("180", 100.0), ("-7", 0.0), ("0.5", 0.5)] {
            store.set_percentage(&id, raw);
            assert_eq!(store.state().find(&id).unwrap().percentage, expected, "input {}", raw);
        }
    }

    #[test]
    fn test_negative_zero_percentage_is_stored_as_zero() {
        let (mut store, storage) = opened();
        store.set_total_amount("1000");
        let id = store.categories()[0].id.clone();

        store.set_percentage(&id, "-0");
        let stored = store.state().find(&id).unwrap().percentage;
        assert_eq!(stored, 0.0);
        assert!(!stored.is_sign_negative());
        assert_eq!(crate::summary::format_percentage(stored), "0");

        let payload = storage.load(STORAGE_KEY).unwrap().unwrap();
        let saved: serde_json::Value = serde_json::from_str(&payload).unwrap();
        let saved_pct = saved["categories"][0]["percentage"].as_f64().unwrap();
        assert!(!saved_pct.is_sign_negative());
    }

    #[test]
    fn test_set_percentage_non_numeric_is_zero() {
        let (mut store, _) = opened();
        let id = store.categories()[1].id.clone();

        for raw in ["", "abc", "twelve", "--"] {
            store.set_percentage(&id, "10");
            store.set_percentage(&id, raw);
            assert_eq!(store.state().find(&id).unwrap().percentage, 0.0);
        }
    }

    #[test]
    fn test_add_category() {
        let (mut store, _) = opened();

        assert_eq!(store.add_category(""), None);
        assert_eq!(store.add_category("   "), None);
        assert_eq!(store.categories().len(), 3);

        let id = store.add_category("Trip").unwrap();
        assert_eq!(store.categories().len(), 4);
        let last = store.categories().last().unwrap();
        assert_eq!(last.id, id);
        assert_eq!(last.name, "Trip");
        assert_eq!(last.percentage, 0.0);
    }

    #[test]
    fn test_add_category_trims_and_allows_duplicates() {
        let (mut store, _) = opened();

        let a = store.add_category("  Travel  ").unwrap();
        assert_eq!(store.state().find(&a).unwrap().name, "Travel");

        let names: Vec<&str> = store.categories().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Buy Phone", "Travel", "Mutual Funds", "Travel"]);
    }

    #[test]
    fn test_delete_category() {
        let (mut store, _) = opened();
        let id = store.categories()[1].id.clone();

        assert!(store.delete_category(&id));
        assert_eq!(store.categories().len(), 2);
        assert!(store.state().find(&id).is_none());

        assert!(!store.delete_category(&id));
        assert!(!store.delete_category("no-such-id"));
        assert_eq!(store.categories().len(), 2);
    }

    #[test]
    fn test_rename_category() {
        let (mut store, _) = opened();
        let id = store.categories()[0].id.clone();

        assert!(store.rename_category(&id, "  New Phone "));
        assert_eq!(store.categories()[0].name, "New Phone");

        assert!(!store.rename_category(&id, "   "));
        assert_eq!(store.categories()[0].name, "New Phone");

        let before = store.state().clone();
        assert!(!store.rename_category("no-such-id", "Ghost"));
        assert_eq!(store.state(), &before);
    }

    #[test]
    fn test_edits_preserve_order() {
        let (mut store, _) = opened();
        let middle = store.categories()[1].id.clone();

        store.set_percentage(&middle, "5");
        store.rename_category(&middle, "Holiday");
        store.add_category("Laptop");

        let names: Vec<&str> = store.categories().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Buy Phone", "Holiday", "Mutual Funds", "Laptop"]);
    }

    #[test]
    fn test_every_mutation_is_persisted() {
        let (mut store, storage) = opened();

        store.set_total_amount("1000");
        let id = store.add_category("Trip").unwrap();
        store.set_percentage(&id, "12.5");

        let reopened = AllocationStore::open(storage.clone());
        assert_eq!(reopened.state(), store.state());
        assert_eq!(reopened.total_amount(), "1000");
    }

    #[test]
    fn test_round_trip_through_fresh_instance() {
        let (mut store, storage) = opened();
        store.set_total_amount("80000");
        let first = store.categories()[0].id.clone();
        store.rename_category(&first, "Phone");
        let last = store.categories()[2].id.clone();
        store.delete_category(&last);
        store.add_category("Emergency Fund");

        let fresh = AllocationStore::open(storage);
        assert_eq!(fresh.categories(), store.categories());
        assert_eq!(fresh.total_amount(), store.total_amount());
    }

    #[test]
    fn test_reset_requires_confirmation() {
        let (mut store, storage) = opened();
        store.set_total_amount("1000");
        store.add_category("Trip");
        let before = store.state().clone();

        assert!(!store.reset(false));
        assert_eq!(store.state(), &before);
        assert!(storage.load(STORAGE_KEY).unwrap().is_some());
    }

    #[test]
    fn test_confirmed_reset_restores_seed_and_erases() {
        let (mut store, storage) = opened();
        store.set_total_amount("1000");
        store.add_category("Trip");

        assert!(store.reset(true));
        assert!(store.state().is_seed());
        assert_eq!(store.total_amount(), "");
        assert_eq!(storage.load(STORAGE_KEY).unwrap(), None);

        let fresh = AllocationStore::open(storage);
        assert!(fresh.state().is_seed());
    }

    #[test]
    fn test_no_op_mutations_do_not_save() {
        let (mut store, storage) = opened();
        store.add_category("");
        store.delete_category("missing");
        store.rename_category("missing", "X");
        store.set_percentage("missing", "50");
        assert!(storage.is_empty());
    }

    #[test]
    fn test_corrupt_payload_falls_back_to_seed() {
        let storage = MemoryStore::new();
        storage.save(STORAGE_KEY, "{not json").unwrap();

        let mut store = AllocationStore::new(storage);
        assert!(!store.load());
        assert!(store.is_ready());
        assert!(store.state().is_seed());
    }

    #[test]
    fn test_storage_failures_are_swallowed() {
        let mut store = AllocationStore::open(BrokenStore::new());
        assert!(store.is_ready());
        assert!(store.state().is_seed());

        assert!(store.set_total_amount("250"));
        assert!(store.add_category("Trip").is_some());
        assert_eq!(store.storage().saves.get(), 2);
        assert_eq!(store.total_amount(), "250");

        assert!(store.reset(true));
        assert!(store.state().is_seed());
    }

    #[test]
    fn test_derived_values_follow_state() {
        let (mut store, _) = opened();
        store.set_total_amount("1000");

        assert!(store.is_balanced());
        assert_eq!(store.status(), AllocationStatus::Balanced);
        let first = store.categories()[0].clone();
        assert_eq!(store.allocation_for(&first), 300.0);

        store.set_percentage(&first.id, "10");
        assert_eq!(store.total_percentage(), 80.0);
        assert_eq!(store.remaining_amount(), 200.0);
        assert_eq!(store.status(), AllocationStatus::UnderAllocated);
    }

    #[test]
    fn test_custom_key_is_isolated() {
        let storage = MemoryStore::new();
        let mut a = AllocationStore::open(storage.clone());
        let mut b = AllocationStore::with_key(storage.clone(), "other-pot");
        b.load();

        a.set_total_amount("10");
        b.set_total_amount("20");

        assert_eq!(AllocationStore::open(storage.clone()).total_amount(), "10");
        let mut other = AllocationStore::with_key(storage, "other-pot");
        other.load();
        assert_eq!(other.total_amount(), "20");
    }
}
