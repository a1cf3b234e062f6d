//! Client-side copy of the signed-in user's journal.
//!
//! The map is only ever swapped as a whole, so a render never sees half of an
//! update. Local writes are applied optimistically and then reconciled with a
//! fresh `load`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::date_engine::{CivilDate, DateKey};
use crate::error::AppError;
use crate::gateway::EntryGateway;

/// The happy/sad text pair for one day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    pub happy: String,
    pub sad: String,
}

impl Entry {
    /// Both fields empty after trimming. Such an entry must not be stored.
    pub fn is_blank(&self) -> bool {
        self.happy.trim().is_empty() && self.sad.trim().is_empty()
    }

    pub fn field(&self, field: EntryField) -> &str {
        match field {
            EntryField::Happy => &self.happy,
            EntryField::Sad => &self.sad,
        }
    }

    fn cleared(&self, field: EntryField) -> Self {
        let mut next = self.clone();
        match field {
            EntryField::Happy => next.happy.clear(),
            EntryField::Sad => next.sad.clear(),
        }
        next
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryField {
    Happy,
    Sad,
}

impl EntryField {
    pub fn other(self) -> Self {
        match self {
            EntryField::Happy => EntryField::Sad,
            EntryField::Sad => EntryField::Happy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayStatus {
    Empty,
    Happy,
    Sad,
}

pub type EntryMap = HashMap<DateKey, Entry>;

#[derive(Debug, Clone, Default)]
pub struct EntryStore {
    entries: Arc<EntryMap>,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn from_map(entries: EntryMap) -> Self {
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Current map. Later updates never touch a snapshot already handed out.
    pub fn snapshot(&self) -> Arc<EntryMap> {
        Arc::clone(&self.entries)
    }

    pub fn get(&self, key: &DateKey) -> Option<&Entry> {
        self.entries.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Entry::is_blank)
    }

    /// Drop everything, e.g. on logout.
    pub fn clear(&mut self) {
        self.replace(EntryMap::new());
    }

    fn replace(&mut self, next: EntryMap) {
        self.entries = Arc::new(next);
    }

    /// Replace the map with the remote collection. On failure the previous
    /// map is kept as is.
    pub async fn load<G: EntryGateway + ?Sized>(
        &mut self,
        gateway: &G,
        user_id: &str,
    ) -> Result<(), AppError> {
        match gateway.list_entries(user_id).await {
            Ok(mut remote) => {
                remote.retain(|_, entry| !entry.is_blank());
                tracing::info!(count = remote.len(), "Loaded entries");
                self.replace(remote);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to load entries, keeping last known map: {}", e);
                Err(e)
            }
        }
    }

    /// Upsert the trimmed entry at `key`, or delete it when both fields trim to
    /// empty.
    /// Saving the same pair twice leaves the same stored state.
    pub async fn save<G: EntryGateway + ?Sized>(
        &mut self,
        gateway: &G,
        user_id: &str,
        key: &DateKey,
        happy: &str,
        sad: &str,
    ) -> Result<(), AppError> {
        let entry = Entry {
            happy: happy.trim().to_string(),
            sad: sad.trim().to_string(),
        };
        let previous = self.apply_local(key, &entry);

        let result = if entry.is_blank() {
            gateway.delete_entry(user_id, key).await
        } else {
            gateway
                .upsert_entry(user_id, key, &entry.happy, &entry.sad)
                .await
        };

        self.reconcile(gateway, user_id, previous, result).await
    }

    /// Clear one field of the remote entry at `key`, removing the entry when
    /// nothing is left. No-op when the entry does not exist remotely.
    ///
    /// Reads the remote entry and then writes, so a concurrent writer to the
    /// same key between those two calls is overwritten.
    pub async fn delete_field<G: EntryGateway + ?Sized>(
        &mut self,
        gateway: &G,
        user_id: &str,
        key: &DateKey,
        field: EntryField,
    ) -> Result<(), AppError> {
        let current = match gateway.get_entry(user_id, key).await {
            Ok(Some(current)) => current,
            Ok(None) => return Ok(()),
            Err(e) => {
                tracing::warn!("Failed to fetch entry before clearing a field: {}", e);
                return Err(e);
            }
        };

        let next = current.cleared(field);
        let previous = self.apply_local(key, &next);

        let result = if next.is_blank() {
            gateway.delete_entry(user_id, key).await
        } else {
            gateway
                .upsert_entry(user_id, key, &next.happy, &next.sad)
                .await
        };

        self.reconcile(gateway, user_id, previous, result).await
    }

    /// Optimistic local update. Returns the map it replaced.
    fn apply_local(&mut self, key: &DateKey, entry: &Entry) -> Arc<EntryMap> {
        let previous = self.snapshot();
        let mut next = (*previous).clone();
        if entry.is_blank() {
            next.remove(key);
        } else {
            next.insert(key.clone(), entry.clone());
        }
        self.replace(next);
        previous
    }

    async fn reconcile<G: EntryGateway + ?Sized>(
        &mut self,
        gateway: &G,
        user_id: &str,
        previous: Arc<EntryMap>,
        write: Result<(), AppError>,
    ) -> Result<(), AppError> {
        match write {
            Ok(()) => {
                // The write landed; a failed refresh leaves the optimistic map in place.
                let _ = self.load(gateway, user_id).await;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Write failed, re-syncing from backend: {}", e);
                if self.load(gateway, user_id).await.is_err() {
                    self.entries = previous;
                }
                Err(e)
            }
        }
    }

    pub fn has_data_for_year(&self, year: i32) -> bool {
        self.entries
            .iter()
            .any(|(key, entry)| key.is_in_year(year) && !entry.is_blank())
    }

    pub fn has_data_for_month(&self, year: i32, month: u8) -> bool {
        self.entries
            .iter()
            .any(|(key, entry)| key.is_in_month(year, month) && !entry.is_blank())
    }

    /// Sad wins over happy: any sad text marks the day sad.
    pub fn status_of(&self, date: CivilDate) -> DayStatus {
        match self.entries.get(&date.key()) {
            Some(entry) if !entry.sad.trim().is_empty() => DayStatus::Sad,
            Some(entry) if !entry.happy.trim().is_empty() => DayStatus::Happy,
            _ => DayStatus::Empty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{AuthGateway, DevBackend};
    use crate::validation::Credentials;

    async fn signed_in() -> (DevBackend, String) {
        let backend = DevBackend::new();
        let user = backend
            .sign_in(&Credentials::validate("a@b.co", "secret1").unwrap())
            .await
            .unwrap();
        (backend, user.id)
    }

    fn key(year: i32, month: u8, day: u8) -> DateKey {
        CivilDate::new(year, month, day).key()
    }

    fn entry(happy: &str, sad: &str) -> Entry {
        Entry {
            happy: happy.to_string(),
            sad: sad.to_string(),
        }
    }

    #[tokio::test]
    async fn saving_twice_is_idempotent() {
        let (backend, user) = signed_in().await;
        let mut store = EntryStore::new();
        let k = key(2024, 6, 1);

        store.save(&backend, &user, &k, "a", "b").await.unwrap();
        let once = backend.stored(&user, &k);
        store.save(&backend, &user, &k, "a", "b").await.unwrap();

        assert_eq!(backend.stored(&user, &k), once);
        assert_eq!(store.get(&k), Some(&entry("a", "b")));
        assert_eq!(store.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn saved_fields_are_trimmed() {
        let (backend, user) = signed_in().await;
        let mut store = EntryStore::new();
        let k = key(2024, 6, 1);

        store
            .save(&backend, &user, &k, "good day \n", "  ")
            .await
            .unwrap();

        assert_eq!(backend.stored(&user, &k), Some(entry("good day", "")));
        assert_eq!(store.get(&k), Some(&entry("good day", "")));
    }

    #[tokio::test]
    async fn saving_blank_pair_deletes_the_entry() {
        let (backend, user) = signed_in().await;
        let mut store = EntryStore::new();
        let k = key(2024, 6, 1);

        store.save(&backend, &user, &k, "x", "y").await.unwrap();
        store.save(&backend, &user, &k, "  ", "\n").await.unwrap();

        assert_eq!(backend.stored(&user, &k), None);
        store.load(&backend, &user).await.unwrap();
        assert!(store.get(&k).is_none());
    }

    #[tokio::test]
    async fn clearing_fields_one_by_one_removes_the_entry() {
        let (backend, user) = signed_in().await;
        let mut store = EntryStore::new();
        let k = key(2024, 6, 1);
        store.save(&backend, &user, &k, "x", "y").await.unwrap();

        store
            .delete_field(&backend, &user, &k, EntryField::Happy)
            .await
            .unwrap();
        assert_eq!(backend.stored(&user, &k), Some(entry("", "y")));
        assert_eq!(store.get(&k), Some(&entry("", "y")));

        store
            .delete_field(&backend, &user, &k, EntryField::Sad)
            .await
            .unwrap();
        assert_eq!(backend.stored(&user, &k), None);
        assert!(store.get(&k).is_none());
    }

    #[tokio::test]
    async fn clearing_a_field_of_a_missing_entry_is_a_no_op() {
        let (backend, user) = signed_in().await;
        let mut store = EntryStore::new();

        store
            .delete_field(&backend, &user, &key(2024, 6, 1), EntryField::Sad)
            .await
            .unwrap();

        assert_eq!(backend.write_count(), 0);
    }

    #[tokio::test]
    async fn failed_load_keeps_previous_map() {
        let (backend, user) = signed_in().await;
        let mut store = EntryStore::new();
        let k = key(2024, 6, 1);
        store.save(&backend, &user, &k, "x", "").await.unwrap();

        backend.set_unreachable(true);
        assert!(matches!(
            store.load(&backend, &user).await,
            Err(AppError::Network(_))
        ));
        assert_eq!(store.get(&k), Some(&entry("x", "")));
    }

    #[tokio::test]
    async fn failed_save_does_not_keep_optimistic_change() {
        let (backend, user) = signed_in().await;
        let mut store = EntryStore::new();
        let k = key(2024, 6, 1);
        store.save(&backend, &user, &k, "kept", "").await.unwrap();

        backend.set_unreachable(true);
        let result = store.save(&backend, &user, &k, "lost", "").await;

        assert!(result.is_err());
        assert_eq!(store.get(&k), Some(&entry("kept", "")));
    }

    #[tokio::test]
    async fn snapshots_are_not_mutated_by_later_saves() {
        let (backend, user) = signed_in().await;
        let mut store = EntryStore::new();
        let before = store.snapshot();

        store
            .save(&backend, &user, &key(2024, 6, 1), "x", "")
            .await
            .unwrap();

        assert!(before.is_empty());
        assert_eq!(store.snapshot().len(), 1);
    }

    #[test]
    fn sad_takes_priority_over_happy() {
        let mut map = EntryMap::new();
        map.insert(key(2024, 6, 1), entry("great", "but also this"));
        map.insert(key(2024, 6, 2), entry("great", "   "));
        map.insert(key(2024, 6, 3), entry(" ", ""));
        let store = EntryStore::from_map(map);

        assert_eq!(store.status_of(CivilDate::new(2024, 6, 1)), DayStatus::Sad);
        assert_eq!(store.status_of(CivilDate::new(2024, 6, 2)), DayStatus::Happy);
        assert_eq!(store.status_of(CivilDate::new(2024, 6, 3)), DayStatus::Empty);
        assert_eq!(store.status_of(CivilDate::new(2024, 6, 4)), DayStatus::Empty);
    }

    #[test]
    fn year_and_month_data_ignore_blank_entries() {
        let mut map = EntryMap::new();
        map.insert(key(2023, 11, 5), entry("x", ""));
        map.insert(key(2024, 1, 5), entry("", "  "));
        let store = EntryStore::from_map(map);

        assert!(store.has_data_for_year(2023));
        assert!(store.has_data_for_month(2023, 11));
        assert!(!store.has_data_for_month(2023, 1));
        assert!(!store.has_data_for_year(2024));
        assert!(!store.is_empty());
    }
}
