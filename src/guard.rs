//! Poll guard for transports with unreliable error notifications.
//!
//! The mobile transport sometimes reports an HTTP status in the 400-599
//! range on an intermediate loading event and then never fires a terminal
//! failure event. The guard re-samples the in-flight response text over a
//! bounded number of attempts to give slow error bodies time to arrive
//! before the lifecycle aborts the transport.

use std::time::Duration;

use log::debug;
use tokio::time::sleep;

/// Outcome of a poll window.
///
/// Both verdicts converge on the same lifecycle action (abort the transport
/// and produce an error response); the distinction is informational.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollVerdict {
    /// Response body text was observed while polling.
    ContentObserved(String),

    /// The attempt budget ran out without any further content.
    Exhausted,
}

/// Bounded re-checker for a suspected transport error.
///
/// The attempt counter lives inside one `check()` call; it is reset per
/// request and discarded once a verdict is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollGuard {
    attempts: u32,
    interval: Duration,
}

impl PollGuard {
    /// Create a guard with the given attempt budget and spacing.
    pub fn new(attempts: u32, interval: Duration) -> Self {
        PollGuard { attempts, interval }
    }

    /// The attempt budget.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The delay between attempts.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Watch for response content to confirm a suspected failure.
    ///
    /// `captured` is the partial body available when the suspicious status
    /// was first seen; `sample` re-reads the transport's current response
    /// text on every attempt.
    pub async fn check(&self, captured: &str, mut sample: impl FnMut() -> String) -> PollVerdict {
        if !captured.is_empty() {
            return PollVerdict::ContentObserved(captured.to_string());
        }

        for attempt in 1..=self.attempts {
            sleep(self.interval).await;

            let body = sample();
            if !body.is_empty() {
                debug!("poll guard observed content on attempt {}", attempt);
                return PollVerdict::ContentObserved(body);
            }
        }

        debug!("poll guard exhausted after {} attempts", self.attempts);
        PollVerdict::Exhausted
    }
}
