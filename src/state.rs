use crate::config::AppConfig;
use crate::dashboard::{DataProvider, DatasetError};
use crate::notifications::{self, FeedTimer, NotificationFeed};
use crate::ports::storage::{KeyValueStore, StorageError};
use crate::ports::time::TimeProvider;
use crate::preferences::PreferenceStore;
use crate::session::SessionStore;

use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Everything one dashboard profile needs, wired to a shared clock and
/// storage. Cloning hands out another handle onto the same state.
#[derive(Clone)]
pub struct AppState<T, S> {
    pub config: AppConfig,
    pub session: SessionStore<T, S>,
    pub preferences: PreferenceStore<S>,
    pub feed: NotificationFeed,
    pub provider: DataProvider<T>,
    feed_timer: Arc<Mutex<Option<FeedTimer>>>,
    feed_interval: Duration,
    time: T,
}

impl<T, S> AppState<T, S>
where
    T: TimeProvider,
    S: KeyValueStore,
{
    pub fn new(config: AppConfig, time: T, storage: S) -> Result<Self, DatasetError> {
        let provider = DataProvider::new(time.clone())?;
        Ok(Self::with_provider(config, time, storage, provider))
    }

    pub fn with_provider(
        config: AppConfig,
        time: T,
        storage: S,
        provider: DataProvider<T>,
    ) -> Self {
        Self {
            config,
            session: SessionStore::new(time.clone(), storage.clone()),
            preferences: PreferenceStore::load(storage),
            feed: NotificationFeed::new(),
            provider,
            feed_timer: Arc::new(Mutex::new(None)),
            feed_interval: notifications::DEFAULT_TICK_INTERVAL,
            time,
        }
    }

    pub fn with_feed_interval(mut self, interval: Duration) -> Self {
        self.feed_interval = interval;
        self
    }

    /// Restores the persisted session and, unless opted out, starts the
    /// notification generator.
    pub async fn start(&self) {
        self.session.restore().await;
        if self.preferences.notifications_enabled() {
            self.spawn_feed_timer();
        }
    }

    /// Flips the notification preference and keeps the timer in step:
    /// disabling cancels it, re-enabling starts a fresh one.
    pub fn set_notifications_enabled(&self, enabled: bool) -> Result<(), StorageError> {
        let persisted = self.preferences.set_notifications_enabled(enabled);
        if enabled {
            self.spawn_feed_timer();
        } else {
            self.abort_feed_timer();
        }
        persisted
    }

    pub fn shutdown(&self) {
        self.abort_feed_timer();
    }

    pub fn feed_timer_running(&self) -> bool {
        self.feed_timer
            .lock()
            .expect("feed timer lock")
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }

    fn spawn_feed_timer(&self) {
        let timer = notifications::spawn_generator(
            self.time.clone(),
            self.feed.clone(),
            self.feed_interval,
        );
        tracing::debug!("notification timer started");
        let mut guard = self.feed_timer.lock().expect("feed timer lock");
        if let Some(previous) = guard.replace(timer) {
            previous.abort();
        }
    }

    fn abort_feed_timer(&self) {
        let mut guard = self.feed_timer.lock().expect("feed timer lock");
        if let Some(timer) = guard.take() {
            timer.abort();
            tracing::debug!("notification timer stopped");
        }
    }
}
