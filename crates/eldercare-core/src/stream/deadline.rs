//! Per-request deadline and cooperative cancellation.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::Sleep;
use tokio_util::sync::CancellationToken;

/// Races awaited work against an optional timer and an optional token.
///
/// Owned by a single request; the timer is released when this is dropped.
pub(crate) struct Deadline {
    sleep: Option<Pin<Box<Sleep>>>,
    cancel: Option<CancellationToken>,
}

impl Deadline {
    pub(crate) fn new(timeout: Option<Duration>, cancel: Option<CancellationToken>) -> Self {
        Self {
            sleep: timeout.map(|d| Box::pin(tokio::time::sleep(d))),
            cancel,
        }
    }

    /// Drive `fut` to completion unless the deadline passes or the token is
    /// cancelled first. On `None` the future has been dropped, which aborts
    /// whatever I/O it was waiting on.
    pub(crate) async fn run<F: Future>(&mut self, fut: F) -> Option<F::Output> {
        let sleep = self.sleep.as_mut();
        let cancel = self.cancel.as_ref();

        let expired = async move {
            match sleep {
                Some(s) => s.await,
                None => std::future::pending().await,
            }
        };
        let cancelled = async move {
            match cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            () = expired => None,
            () = cancelled => None,
            out = fut => Some(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn completes_without_deadline() {
        let mut deadline = Deadline::new(None, None);
        assert_eq!(deadline.run(async { 7 }).await, Some(7));
    }

    #[tokio::test]
    async fn elapsed_deadline_aborts_and_stays_elapsed() {
        let mut deadline = Deadline::new(Some(Duration::from_millis(20)), None);
        let slow = tokio::time::sleep(Duration::from_secs(30));
        assert_eq!(deadline.run(slow).await, None);
        // Once elapsed, even ready work is refused.
        assert_eq!(deadline.run(async { 1 }).await, None);
    }

    #[tokio::test]
    async fn token_cancels() {
        let token = CancellationToken::new();
        let mut deadline = Deadline::new(None, Some(token.clone()));
        token.cancel();
        assert_eq!(deadline.run(std::future::pending::<()>()).await, None);
    }
}
