//! Pacing between automatic phase advances.
//!
//! When several phases end back to back (a night with nobody able to act,
//! say) the narration would otherwise arrive as one wall of text. The
//! throttle makes the session wait at least `interval` between two
//! advances. It is awaited inside the session actor, so only that
//! session's queue is held up.

use std::time::Duration;

use tokio::time::{self, Instant as TokioInstant};

#[derive(Debug)]
pub(crate) struct Throttle {
    interval: Duration,
    /// When the previous advance happened.
    last: Option<TokioInstant>,
}

impl Throttle {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Waits until `interval` has elapsed since the previous call.
    ///
    /// The first call never waits. A zero interval never waits.
    pub(crate) async fn pace(&mut self) {
        if !self.interval.is_zero() {
            if let Some(last) = self.last {
                time::sleep_until(last + self.interval).await;
            }
        }
        self.last = Some(TokioInstant::now());
    }
}
