use std::time::Duration;

use time::OffsetDateTime;

/// Clock and timer seam. Every simulated round trip in the stores sleeps
/// through this trait, so tests run against a manual clock.
pub trait TimeProvider: Clone + Send + Sync + 'static {
    type Sleep<'a>: Future<Output = ()> + Send + 'a
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime;
    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a>;
}
