use crate::ports::time::TimeProvider;

use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::sync::oneshot;

pub(crate) fn fixture_now() -> OffsetDateTime {
    OffsetDateTime::parse("2025-08-01T09:30:00Z", &Rfc3339).expect("parse fixture time")
}

/// Time provider with a frozen clock. Sleeps either resolve immediately
/// (`instant`) or park until `trigger_all` fires them (`new`); requested
/// durations are recorded either way.
#[derive(Clone)]
pub(crate) struct TestTime {
    now: OffsetDateTime,
    instant: bool,
    sleeps: Arc<Mutex<Vec<oneshot::Sender<()>>>>,
    durations: Arc<Mutex<Vec<Duration>>>,
}

impl TestTime {
    pub(crate) fn new(now: OffsetDateTime) -> Self {
        Self {
            now,
            instant: false,
            sleeps: Arc::new(Mutex::new(Vec::new())),
            durations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn instant(now: OffsetDateTime) -> Self {
        Self {
            instant: true,
            ..Self::new(now)
        }
    }

    pub(crate) fn sleep_durations(&self) -> Vec<Duration> {
        self.durations.lock().expect("durations lock").clone()
    }

    pub(crate) fn pending_sleep_count(&self) -> usize {
        self.sleeps.lock().expect("sleeps lock").len()
    }

    pub(crate) fn trigger_all(&self) {
        let mut sends = self.sleeps.lock().expect("sleeps lock");
        for sender in sends.drain(..) {
            let _ = sender.send(());
        }
    }
}

pub(crate) struct TestSleep {
    receiver: Option<oneshot::Receiver<()>>,
}

impl Future for TestSleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.get_mut().receiver.as_mut() {
            None => Poll::Ready(()),
            Some(receiver) => match Pin::new(receiver).poll(cx) {
                Poll::Ready(_) => Poll::Ready(()),
                Poll::Pending => Poll::Pending,
            },
        }
    }
}

impl TimeProvider for TestTime {
    type Sleep<'a>
        = TestSleep
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime {
        self.now
    }

    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a> {
        self.durations
            .lock()
            .expect("durations lock")
            .push(duration);
        if self.instant {
            return TestSleep { receiver: None };
        }
        let (sender, receiver) = oneshot::channel();
        self.sleeps.lock().expect("sleeps lock").push(sender);
        TestSleep {
            receiver: Some(receiver),
        }
    }
}

/// Polls `cond` between scheduler turns so spawned tasks can make progress.
pub(crate) async fn wait_until(cond: impl Fn() -> bool) {
    for _ in 0..256 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition was not reached");
}
