use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use supabase::{AuthEvent, OAuthProvider, OAuthRequest, User};
use tokio::sync::broadcast;

use super::{AuthGateway, EntryGateway, SignUpResult};
use crate::date_engine::{CivilDate, DateKey};
use crate::entry_store::{Entry, EntryMap};
use crate::error::{AppError, AuthFailure};
use crate::validation::Credentials;

pub const DEV_EMAIL: &str = "dev@localhost.dev";
const DEV_PASSWORD: &str = "devpass";

/// In-memory backend for `mind-storage dev` and for tests.
#[derive(Debug, Clone)]
pub struct DevBackend {
    store: Arc<Mutex<DevStore>>,
    events: broadcast::Sender<AuthEvent>,
}

#[derive(Debug, Default)]
struct DevStore {
    user: Option<User>,
    /// email -> password
    accounts: HashMap<String, String>,
    rows: HashMap<(String, DateKey), Entry>,
    unreachable: bool,
    writes: usize,
}

impl Default for DevBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DevBackend {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            store: Arc::new(Mutex::new(DevStore::default())),
            events,
        }
    }

    /// Signed in as the dev user with a few days of history before `today`.
    pub fn seeded(today: CivilDate) -> Self {
        let backend = Self::new();
        let user = dev_user(DEV_EMAIL);
        {
            let mut store = backend.lock();
            store
                .accounts
                .insert(DEV_EMAIL.to_string(), DEV_PASSWORD.to_string());
            let mut day = today;
            for (i, (happy, sad)) in seed_notes().into_iter().enumerate() {
                day = day.prev_day();
                if i % 3 == 2 {
                    day = day.prev_day();
                }
                store.rows.insert(
                    (user.id.clone(), day.key()),
                    Entry {
                        happy: happy.to_string(),
                        sad: sad.to_string(),
                    },
                );
            }
            store.user = Some(user);
        }
        backend
    }

    /// Make every subsequent call fail like a dropped connection.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.lock().unreachable = unreachable;
    }

    /// Number of upserts and deletes that reached the store.
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    /// Entry as stored remotely, bypassing any client-side map.
    pub fn stored(&self, user_id: &str, key: &DateKey) -> Option<Entry> {
        self.lock()
            .rows
            .get(&(user_id.to_string(), key.clone()))
            .cloned()
    }

    /// Simulate the session ending outside the app.
    pub fn expire_session(&self) {
        if self.lock().user.take().is_some() {
            let _ = self.events.send(AuthEvent::SignedOut);
        }
    }

    fn lock(&self) -> MutexGuard<'_, DevStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reachable(&self) -> Result<MutexGuard<'_, DevStore>, AppError> {
        let store = self.lock();
        if store.unreachable {
            return Err(AppError::Network("dev backend unreachable".to_string()));
        }
        Ok(store)
    }

    fn authorized(&self, user_id: &str) -> Result<MutexGuard<'_, DevStore>, AppError> {
        let store = self.reachable()?;
        match &store.user {
            Some(user) if user.id == user_id => Ok(store),
            _ => Err(AuthFailure::SessionExpired.into()),
        }
    }

    fn sign_in_as(&self, store: &mut DevStore, email: &str) -> User {
        let user = dev_user(email);
        store.user = Some(user.clone());
        let _ = self.events.send(AuthEvent::SignedIn(user.clone()));
        user
    }
}

fn dev_user(email: &str) -> User {
    User {
        id: format!("dev-{}", email),
        email: Some(email.to_string()),
    }
}

fn seed_notes() -> Vec<(&'static str, &'static str)> {
    vec![
        ("Long walk along the river", ""),
        ("Coffee with an old friend", "Missed the last bus"),
        ("", "Rainy and tired"),
        ("Finished the book I started in spring", ""),
        ("Cooked dinner for everyone", ""),
        ("Good news from home", "Argued about something small"),
    ]
}

#[async_trait]
impl AuthGateway for DevBackend {
    async fn sign_in(&self, credentials: &Credentials) -> Result<User, AppError> {
        let mut store = self.reachable()?;
        let email = credentials.email.as_ref().to_string();
        match store.accounts.get(&email) {
            Some(password) if *password != credentials.password => {
                return Err(AuthFailure::InvalidCredentials.into());
            }
            Some(_) => {}
            None => {
                store
                    .accounts
                    .insert(email.clone(), credentials.password.clone());
            }
        }
        Ok(self.sign_in_as(&mut store, &email))
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpResult, AppError> {
        let mut store = self.reachable()?;
        let email = credentials.email.as_ref().to_string();
        if store.accounts.contains_key(&email) {
            return Err(AuthFailure::Rejected("User already registered".to_string()).into());
        }
        store
            .accounts
            .insert(email.clone(), credentials.password.clone());
        Ok(SignUpResult::SignedIn(self.sign_in_as(&mut store, &email)))
    }

    fn oauth_request(
        &self,
        provider: OAuthProvider,
        _redirect_to: &str,
    ) -> Result<OAuthRequest, AppError> {
        Err(AppError::Configuration(format!(
            "{} sign-in is not available in dev mode",
            provider
        )))
    }

    async fn complete_oauth(
        &self,
        _auth_code: &str,
        _code_verifier: &str,
    ) -> Result<User, AppError> {
        Err(AppError::Configuration(
            "OAuth is not available in dev mode".to_string(),
        ))
    }

    async fn sign_out(&self) -> Result<(), AppError> {
        self.expire_session();
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<User>, AppError> {
        Ok(self.reachable()?.user.clone())
    }

    async fn delete_account(&self, user_id: &str) -> Result<(), AppError> {
        {
            let mut store = self.authorized(user_id)?;
            store.rows.retain(|(owner, _), _| owner != user_id);
            if let Some(email) = store.user.as_ref().and_then(|u| u.email.clone()) {
                store.accounts.remove(&email);
            }
        }
        self.expire_session();
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[async_trait]
impl EntryGateway for DevBackend {
    async fn list_entries(&self, user_id: &str) -> Result<EntryMap, AppError> {
        let store = self.authorized(user_id)?;
        Ok(store
            .rows
            .iter()
            .filter(|((owner, _), _)| owner == user_id)
            .map(|((_, key), entry)| (key.clone(), entry.clone()))
            .collect())
    }

    async fn get_entry(&self, user_id: &str, key: &DateKey) -> Result<Option<Entry>, AppError> {
        let store = self.authorized(user_id)?;
        Ok(store.rows.get(&(user_id.to_string(), key.clone())).cloned())
    }

    async fn upsert_entry(
        &self,
        user_id: &str,
        key: &DateKey,
        happy: &str,
        sad: &str,
    ) -> Result<(), AppError> {
        let mut store = self.authorized(user_id)?;
        store.writes += 1;
        store.rows.insert(
            (user_id.to_string(), key.clone()),
            Entry {
                happy: happy.to_string(),
                sad: sad.to_string(),
            },
        );
        Ok(())
    }

    async fn delete_entry(&self, user_id: &str, key: &DateKey) -> Result<(), AppError> {
        let mut store = self.authorized(user_id)?;
        store.writes += 1;
        store.rows.remove(&(user_id.to_string(), key.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(email: &str, password: &str) -> Credentials {
        Credentials::validate(email, password).unwrap()
    }

    #[test]
    fn store_stays_usable_after_a_panic_while_locked() {
        let backend = DevBackend::seeded(CivilDate::new(2024, 6, 15));
        let held = backend.clone();
        let _ = std::thread::spawn(move || {
            let _guard = held.lock();
            panic!("panicked while holding the store");
        })
        .join();

        assert!(backend.store.is_poisoned());
        assert_eq!(backend.write_count(), 0);
        backend.expire_session();
        assert!(backend.lock().user.is_none());
    }

    #[tokio::test]
    async fn seeded_backend_is_signed_in_with_history() {
        let backend = DevBackend::seeded(CivilDate::new(2024, 6, 15));
        let user = backend.current_user().await.unwrap().unwrap();
        assert_eq!(user.email.as_deref(), Some(DEV_EMAIL));

        let entries = backend.list_entries(&user.id).await.unwrap();
        assert_eq!(entries.len(), seed_notes().len());
        assert!(entries
            .keys()
            .all(|key| key.as_str() < CivilDate::new(2024, 6, 15).key().as_str()));
    }

    #[tokio::test]
    async fn wrong_password_for_known_account_is_rejected() {
        let backend = DevBackend::new();
        backend
            .sign_up(&credentials("a@b.co", "secret1"))
            .await
            .unwrap();
        backend.sign_out().await.unwrap();

        assert_eq!(
            backend
                .sign_in(&credentials("a@b.co", "secret2"))
                .await
                .unwrap_err(),
            AppError::Auth(AuthFailure::InvalidCredentials)
        );
        assert!(backend
            .sign_in(&credentials("a@b.co", "secret1"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn sign_in_and_out_are_pushed_to_subscribers() {
        let backend = DevBackend::new();
        let mut events = backend.subscribe();

        let user = backend
            .sign_in(&credentials("a@b.co", "secret1"))
            .await
            .unwrap();
        backend.sign_out().await.unwrap();

        assert_eq!(events.try_recv().unwrap(), AuthEvent::SignedIn(user));
        assert_eq!(events.try_recv().unwrap(), AuthEvent::SignedOut);
    }

    #[tokio::test]
    async fn entries_are_private_to_the_signed_in_user() {
        let backend = DevBackend::new();
        let user = backend
            .sign_in(&credentials("a@b.co", "secret1"))
            .await
            .unwrap();
        let key = CivilDate::new(2024, 6, 1).key();
        backend.upsert_entry(&user.id, &key, "x", "").await.unwrap();

        assert_eq!(
            backend.list_entries("someone-else").await.unwrap_err(),
            AppError::Auth(AuthFailure::SessionExpired)
        );
    }

    #[tokio::test]
    async fn delete_account_removes_rows_and_signs_out() {
        let backend = DevBackend::new();
        let user = backend
            .sign_in(&credentials("a@b.co", "secret1"))
            .await
            .unwrap();
        let key = CivilDate::new(2024, 6, 1).key();
        backend.upsert_entry(&user.id, &key, "x", "").await.unwrap();

        backend.delete_account(&user.id).await.unwrap();

        assert_eq!(backend.current_user().await.unwrap(), None);
        assert_eq!(backend.stored(&user.id, &key), None);
    }
}
