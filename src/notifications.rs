use crate::ports::time::TimeProvider;

use rand::Rng;
use rand::seq::SliceRandom;
use time::OffsetDateTime;
use tokio::task::JoinHandle;

use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const FEED_CAPACITY: usize = 5;
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(30);

const CATALOG: [(&str, &str); 4] = [
    ("Fresh Data", "Your analytics just updated!"),
    ("Report Ready", "This week's insights are waiting for you"),
    ("What's New", "We've made your dashboard even better"),
    ("Busy Alert", "Checkout area is getting crowded"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    pub created_at: OffsetDateTime,
    pub read: bool,
}

struct FeedInner {
    // Newest first, never longer than FEED_CAPACITY.
    entries: Vec<Notification>,
    next_seq: u64,
}

/// Bounded in-app notification feed. Pushing beyond capacity drops the
/// oldest entry; ids stay unique even across clears.
#[derive(Clone)]
pub struct NotificationFeed {
    inner: Arc<Mutex<FeedInner>>,
}

impl NotificationFeed {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FeedInner {
                entries: Vec::new(),
                next_seq: 0,
            })),
        }
    }

    pub fn push(&self, title: &str, message: &str, now: OffsetDateTime) -> String {
        let mut inner = self.inner.lock().expect("feed lock");
        let seq = inner.next_seq;
        inner.next_seq += 1;
        let id = format!("{}-{}", unix_millis(now), seq);
        inner.entries.insert(
            0,
            Notification {
                id: id.clone(),
                title: title.to_string(),
                message: message.to_string(),
                created_at: now,
                read: false,
            },
        );
        inner.entries.truncate(FEED_CAPACITY);
        id
    }

    pub fn mark_read(&self, id: &str) {
        let mut inner = self.inner.lock().expect("feed lock");
        if let Some(entry) = inner.entries.iter_mut().find(|entry| entry.id == id) {
            entry.read = true;
        }
    }

    pub fn clear_all(&self) {
        self.inner.lock().expect("feed lock").entries.clear();
    }

    pub fn unread_count(&self) -> usize {
        self.inner
            .lock()
            .expect("feed lock")
            .entries
            .iter()
            .filter(|entry| !entry.read)
            .count()
    }

    pub fn entries(&self) -> Vec<Notification> {
        self.inner.lock().expect("feed lock").entries.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("feed lock").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().expect("feed lock").entries.is_empty()
    }
}

impl Default for NotificationFeed {
    fn default() -> Self {
        Self::new()
    }
}

pub struct FeedTimer {
    handle: JoinHandle<()>,
}

impl FeedTimer {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn abort(&self) {
        self.handle.abort();
    }

    #[cfg(test)]
    pub(crate) async fn join(self) -> Result<(), tokio::task::JoinError> {
        self.handle.await
    }
}

/// Spawns the periodic generator that feigns server pushes: every tick it
/// picks a random catalog entry and appends it to the feed.
pub fn spawn_generator<T>(time: T, feed: NotificationFeed, interval: Duration) -> FeedTimer
where
    T: TimeProvider,
{
    let handle = tokio::spawn(async move {
        loop {
            time.sleep(interval).await;
            let (title, message) = synthesize();
            let id = feed.push(title, message, time.now());
            tracing::debug!("synthesized notification {id}: {title}");
        }
    });
    FeedTimer { handle }
}

fn synthesize() -> (&'static str, &'static str) {
    synthesize_with_rng(&mut rand::thread_rng())
}

fn synthesize_with_rng<R: Rng>(rng: &mut R) -> (&'static str, &'static str) {
    *CATALOG.choose(rng).expect("catalog is non-empty")
}

fn unix_millis(at: OffsetDateTime) -> i128 {
    at.unix_timestamp_nanos() / 1_000_000
}
