//! Bounded run polling with an injectable clock.
//!
//! A run is checked at most `max_attempts` times, each check preceded by a
//! fixed delay. The loop ends on the first terminal status or when the
//! attempt budget runs out.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mentor_core::config::PollingConfig;

use crate::error::RelayError;
use crate::provider::{AssistantProvider, Run};

/// Source of delays between status checks.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Wall-clock delays via `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Clock that returns immediately and records how long it was asked to wait.
#[derive(Debug, Default)]
pub struct InstantClock {
    sleeps: AtomicU64,
    slept_ms: AtomicU64,
}

impl InstantClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sleeps(&self) -> u64 {
        self.sleeps.load(Ordering::SeqCst)
    }

    /// Total simulated wait.
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.slept_ms.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl Clock for InstantClock {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.fetch_add(1, Ordering::SeqCst);
        self.slept_ms
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }
}

/// Waits for a run to reach a terminal status.
#[derive(Clone)]
pub struct RunPoller {
    interval: Duration,
    max_attempts: u32,
    clock: Arc<dyn Clock>,
}

impl RunPoller {
    pub fn new(interval: Duration, max_attempts: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            interval,
            max_attempts,
            clock,
        }
    }

    /// Poller with the configured timing and a real clock.
    pub fn from_config(config: &PollingConfig) -> Self {
        Self::new(
            Duration::from_millis(config.interval_ms),
            config.max_attempts,
            Arc::new(TokioClock),
        )
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Poll `run_id` until it completes.
    ///
    /// Returns the completed run, `RunFailed` on a terminal failure status,
    /// or `Timeout` once `max_attempts` checks saw no terminal status.
    /// Provider errors during a check end the loop immediately.
    pub async fn wait_for_completion(
        &self,
        provider: &dyn AssistantProvider,
        thread_id: &str,
        run_id: &str,
    ) -> Result<Run, RelayError> {
        for attempt in 1..=self.max_attempts {
            self.clock.sleep(self.interval).await;

            let run = provider.retrieve_run(thread_id, run_id).await?;
            tracing::debug!(
                run_id,
                attempt,
                max_attempts = self.max_attempts,
                status = %run.status,
                "Run status"
            );

            if run.status.is_completed() {
                return Ok(run);
            }
            if run.status.is_failure() {
                let reason = run.failure_reason().unwrap_or("Unknown error").to_string();
                return Err(RelayError::RunFailed {
                    status: run.status,
                    reason,
                });
            }
        }

        tracing::warn!(run_id, attempts = self.max_attempts, "Run polling timed out");
        Err(RelayError::Timeout {
            attempts: self.max_attempts,
        })
    }
}

impl std::fmt::Debug for RunPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunPoller")
            .field("interval", &self.interval)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{MockProvider, RunStatus};

    fn poller(clock: Arc<InstantClock>) -> RunPoller {
        RunPoller::new(Duration::from_secs(1), 60, clock)
    }

    async fn poll_with(mock: &MockProvider, clock: Arc<InstantClock>) -> Result<Run, RelayError> {
        let thread = mock.create_thread().await.unwrap();
        let run = mock.create_run(&thread.id).await.unwrap();
        poller(clock)
            .wait_for_completion(mock, &thread.id, &run.id)
            .await
    }

    #[tokio::test]
    async fn test_completes_on_first_check() {
        let mock = MockProvider::new();
        let clock = Arc::new(InstantClock::new());
        let run = poll_with(&mock, clock.clone()).await.unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(mock.status_checks(), 1);
        assert_eq!(clock.sleeps(), 1);
    }

    #[tokio::test]
    async fn test_fifty_nine_in_progress_then_completed_succeeds() {
        let mut statuses = vec![RunStatus::InProgress; 59];
        statuses.push(RunStatus::Completed);
        let mock = MockProvider::new().with_statuses(statuses);
        let clock = Arc::new(InstantClock::new());

        let run = poll_with(&mock, clock.clone()).await.unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(mock.status_checks(), 60);
        assert_eq!(clock.elapsed(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_sixty_in_progress_times_out() {
        let mock = MockProvider::new().with_statuses(vec![RunStatus::InProgress; 61]);
        let clock = Arc::new(InstantClock::new());

        let err = poll_with(&mock, clock.clone()).await.unwrap_err();
        assert!(matches!(err, RelayError::Timeout { attempts: 60 }));
        assert_eq!(mock.status_checks(), 60);
        assert_eq!(clock.sleeps(), 60);
    }

    #[tokio::test]
    async fn test_stops_on_first_terminal_failure() {
        let mock = MockProvider::new()
            .with_statuses([RunStatus::Queued, RunStatus::Failed, RunStatus::Completed])
            .with_failure_reason("Rate limit reached");
        let clock = Arc::new(InstantClock::new());

        let err = poll_with(&mock, clock).await.unwrap_err();
        match err {
            RelayError::RunFailed { status, reason } => {
                assert_eq!(status, RunStatus::Failed);
                assert_eq!(reason, "Rate limit reached");
            }
            other => panic!("expected RunFailed, got {:?}", other),
        }
        assert_eq!(mock.status_checks(), 2);
    }

    #[tokio::test]
    async fn test_failure_without_reason_uses_unknown_error() {
        for status in [RunStatus::Cancelled, RunStatus::Expired] {
            let mock = MockProvider::new().with_statuses([status]);
            let err = poll_with(&mock, Arc::new(InstantClock::new()))
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), format!("Run {}: Unknown error", status));
        }
    }

    #[tokio::test]
    async fn test_non_terminal_statuses_keep_polling() {
        let mock = MockProvider::new().with_statuses([
            RunStatus::Queued,
            RunStatus::RequiresAction,
            RunStatus::Cancelling,
            RunStatus::Unknown,
        ]);
        let run = poll_with(&mock, Arc::new(InstantClock::new())).await.unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(mock.status_checks(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_clock_waits_the_interval() {
        let mock =
            MockProvider::new().with_statuses([RunStatus::InProgress, RunStatus::InProgress]);
        let thread = mock.create_thread().await.unwrap();
        let run = mock.create_run(&thread.id).await.unwrap();

        let start = tokio::time::Instant::now();
        let poller = RunPoller::from_config(&PollingConfig::default());
        poller
            .wait_for_completion(&mock, &thread.id, &run.id)
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_secs(3));
    }
}
