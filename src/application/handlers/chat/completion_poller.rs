//! Completion poller.
//!
//! Waits for a run to reach `completed` by checking its status in a bounded
//! loop. Two strategies are supported:
//!
//! - **Exponential backoff**: sleep `min(2^attempt * base, cap)` before every
//!   check, give up after `max_retries` checks or once the elapsed time exceeds
//!   `max_wait`.
//! - **Fixed interval**: sleep a constant interval before every check, with no
//!   retry cap and no time budget.
//!
//! A status check that fails with a transient error is logged and counts as an
//! attempt, exactly like a check that reports a non-terminal status. A
//! permanent error (authentication, missing run, undecodable body) ends polling
//! at once. The time budget is evaluated after every attempt.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::domain::thread::{RunId, RunStatus, ThreadId};
use crate::ports::{AssistantApi, AssistantApiError};

/// How the poller spaces and bounds its status checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStrategy {
    /// Exponentially growing delay with a retry cap and a wall-clock budget.
    ExponentialBackoff {
        /// Delay before the first check.
        base_delay: Duration,
        /// Upper bound for any single delay.
        max_delay: Duration,
        /// Maximum number of status checks.
        max_retries: u32,
        /// Wall-clock budget measured from the start of polling.
        max_wait: Duration,
    },
    /// Constant delay, polls until the run completes.
    FixedInterval {
        /// Delay before every check.
        interval: Duration,
    },
}

impl PollStrategy {
    /// Delay slept before the check with the given zero-based attempt number.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match *self {
            PollStrategy::ExponentialBackoff {
                base_delay,
                max_delay,
                ..
            } => backoff_delay(attempt, base_delay, max_delay),
            PollStrategy::FixedInterval { interval } => interval,
        }
    }

    fn max_retries(&self) -> Option<u32> {
        match *self {
            PollStrategy::ExponentialBackoff { max_retries, .. } => Some(max_retries),
            PollStrategy::FixedInterval { .. } => None,
        }
    }

    fn max_wait(&self) -> Option<Duration> {
        match *self {
            PollStrategy::ExponentialBackoff { max_wait, .. } => Some(max_wait),
            PollStrategy::FixedInterval { .. } => None,
        }
    }
}

impl Default for PollStrategy {
    fn default() -> Self {
        PollStrategy::ExponentialBackoff {
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(15000),
            max_retries: 10,
            max_wait: Duration::from_millis(60000),
        }
    }
}

/// `min(2^attempt * base, cap)`, saturating at `cap`.
pub fn backoff_delay(attempt: u32, base: Duration, cap: Duration) -> Duration {
    let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
    base.checked_mul(factor).unwrap_or(cap).min(cap)
}

/// Log level used for individual status checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollVerbosity {
    /// Status checks logged at debug.
    #[default]
    Quiet,
    /// Status checks logged at info.
    Verbose,
}

/// Poller configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    pub strategy: PollStrategy,
    pub verbosity: PollVerbosity,
    /// End polling as soon as the run reports a terminal failure status.
    pub stop_on_terminal_failure: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            strategy: PollStrategy::default(),
            verbosity: PollVerbosity::default(),
            stop_on_terminal_failure: true,
        }
    }
}

impl PollerConfig {
    /// Sets the strategy.
    pub fn with_strategy(mut self, strategy: PollStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the verbosity.
    pub fn with_verbosity(mut self, verbosity: PollVerbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Sets whether terminal failure statuses end polling.
    pub fn with_stop_on_terminal_failure(mut self, stop: bool) -> Self {
        self.stop_on_terminal_failure = stop;
        self
    }
}

/// Result of waiting for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The run reported `completed`.
    Completed { attempts: u32 },
    /// The wall-clock budget ran out.
    TimedOut { attempts: u32, elapsed: Duration },
    /// The retry cap was reached.
    RetriesExhausted { attempts: u32 },
    /// The run reached a terminal failure status.
    RunEnded { status: RunStatus, attempts: u32 },
    /// A status check failed with a permanent error.
    Failed {
        error: AssistantApiError,
        attempts: u32,
    },
}

impl PollOutcome {
    /// Returns true if the run completed.
    pub fn is_completed(&self) -> bool {
        matches!(self, PollOutcome::Completed { .. })
    }

    /// Number of status checks made, failed ones included.
    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Completed { attempts }
            | PollOutcome::TimedOut { attempts, .. }
            | PollOutcome::RetriesExhausted { attempts }
            | PollOutcome::RunEnded { attempts, .. }
            | PollOutcome::Failed { attempts, .. } => *attempts,
        }
    }
}

/// Waits for runs to complete.
#[derive(Clone)]
pub struct CompletionPoller {
    api: Arc<dyn AssistantApi>,
    config: PollerConfig,
}

impl CompletionPoller {
    /// Creates a poller over the given API.
    pub fn new(api: Arc<dyn AssistantApi>, config: PollerConfig) -> Self {
        Self { api, config }
    }

    /// Polls the run until it completes or the budget is exhausted.
    pub async fn poll(&self, thread_id: &ThreadId, run_id: &RunId) -> PollOutcome {
        let strategy = self.config.strategy;
        let started = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            if let Some(max_retries) = strategy.max_retries() {
                if attempts >= max_retries {
                    tracing::warn!(
                        %thread_id, %run_id, attempts,
                        "Assistant did not complete within the retry limit"
                    );
                    return PollOutcome::RetriesExhausted { attempts };
                }
            }

            sleep(strategy.delay_for(attempts)).await;
            let attempt = attempts.saturating_add(1);

            match self.api.run_status(thread_id, run_id).await {
                Ok(status) => {
                    self.log_check(thread_id, run_id, attempt, status);

                    if status.is_completed() {
                        return PollOutcome::Completed { attempts: attempt };
                    }

                    if self.config.stop_on_terminal_failure && status.is_terminal_failure() {
                        tracing::warn!(%thread_id, %run_id, %status, "Run ended without completing");
                        return PollOutcome::RunEnded {
                            status,
                            attempts: attempt,
                        };
                    }
                }
                Err(err) if err.is_transient() => {
                    tracing::warn!(%thread_id, %run_id, attempt, error = %err, "Error checking run status");
                }
                Err(err) => {
                    tracing::warn!(%thread_id, %run_id, attempt, error = %err, "Run status check failed permanently");
                    return PollOutcome::Failed {
                        error: err,
                        attempts: attempt,
                    };
                }
            }

            attempts = attempt;

            if let Some(max_wait) = strategy.max_wait() {
                let elapsed = started.elapsed();
                if elapsed > max_wait {
                    tracing::warn!(
                        %thread_id, %run_id, attempts,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Timeout: assistant response took too long"
                    );
                    return PollOutcome::TimedOut { attempts, elapsed };
                }
            }
        }
    }

    fn log_check(&self, thread_id: &ThreadId, run_id: &RunId, attempt: u32, status: RunStatus) {
        match self.config.verbosity {
            PollVerbosity::Verbose => {
                tracing::info!(%thread_id, %run_id, attempt, %status, "Checked run status")
            }
            PollVerbosity::Quiet => {
                tracing::debug!(%thread_id, %run_id, attempt, %status, "Checked run status")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::assistants::{MockAssistantApi, MockOperation};
    use crate::ports::AssistantApiError;
    use proptest::prelude::*;

    fn ids() -> (ThreadId, RunId) {
        (ThreadId::new("c1"), RunId::new("r1"))
    }

    fn poller(api: &MockAssistantApi, config: PollerConfig) -> CompletionPoller {
        CompletionPoller::new(Arc::new(api.clone()), config)
    }

    fn generous_backoff(max_retries: u32) -> PollStrategy {
        PollStrategy::ExponentialBackoff {
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
            max_retries,
            max_wait: Duration::from_secs(3600),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Backoff schedule
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn default_schedule_doubles_then_caps() {
        let strategy = PollStrategy::default();
        let delays: Vec<u64> = (0..7).map(|a| strategy.delay_for(a).as_millis() as u64).collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 15000, 15000, 15000]);
    }

    #[test]
    fn fixed_interval_is_constant() {
        let strategy = PollStrategy::FixedInterval {
            interval: Duration::from_millis(500),
        };
        assert_eq!(strategy.delay_for(0), Duration::from_millis(500));
        assert_eq!(strategy.delay_for(40), Duration::from_millis(500));
    }

    #[test]
    fn huge_attempt_numbers_saturate_at_cap() {
        let cap = Duration::from_secs(15);
        assert_eq!(backoff_delay(31, Duration::from_secs(1), cap), cap);
        assert_eq!(backoff_delay(64, Duration::from_secs(1), cap), cap);
        assert_eq!(backoff_delay(u32::MAX, Duration::from_secs(1), cap), cap);
    }

    proptest! {
        #[test]
        fn backoff_never_exceeds_cap(attempt in 0u32..200, base_ms in 1u64..10_000, cap_ms in 1u64..120_000) {
            let cap = Duration::from_millis(cap_ms);
            prop_assert!(backoff_delay(attempt, Duration::from_millis(base_ms), cap) <= cap);
        }

        #[test]
        fn backoff_is_monotonic(attempt in 0u32..100, base_ms in 1u64..10_000, cap_ms in 1u64..120_000) {
            let base = Duration::from_millis(base_ms);
            let cap = Duration::from_millis(cap_ms);
            prop_assert!(backoff_delay(attempt, base, cap) <= backoff_delay(attempt + 1, base, cap));
        }

        #[test]
        fn backoff_matches_formula_below_cap(attempt in 0u32..10, base_ms in 1u64..1_000) {
            let base = Duration::from_millis(base_ms);
            let cap = Duration::from_secs(3600);
            prop_assert_eq!(backoff_delay(attempt, base, cap), base * 2u32.pow(attempt));
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Polling
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test(start_paused = true)]
    async fn already_completed_run_succeeds_after_first_delay() {
        let api = MockAssistantApi::new().with_statuses([RunStatus::Completed]);
        let (thread, run) = ids();

        let started = Instant::now();
        let outcome = poller(&api, PollerConfig::default()).poll(&thread, &run).await;

        assert_eq!(outcome, PollOutcome::Completed { attempts: 1 });
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(1));
        assert!(elapsed < Duration::from_secs(2));
        assert_eq!(api.status_checks(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn completes_after_exactly_n_checks() {
        let api = MockAssistantApi::new().with_statuses([
            RunStatus::Queued,
            RunStatus::InProgress,
            RunStatus::InProgress,
            RunStatus::Completed,
        ]);
        let (thread, run) = ids();

        let started = Instant::now();
        let outcome = poller(&api, PollerConfig::default()).poll(&thread, &run).await;

        assert!(outcome.is_completed());
        assert_eq!(outcome.attempts(), 4);
        assert_eq!(api.status_checks(), 4);
        // 1s + 2s + 4s + 8s
        assert!(started.elapsed() >= Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn never_completing_run_times_out() {
        let api = MockAssistantApi::new().with_fallback_status(RunStatus::InProgress);
        let (thread, run) = ids();

        let outcome = poller(&api, PollerConfig::default()).poll(&thread, &run).await;

        match outcome {
            PollOutcome::TimedOut { attempts, elapsed } => {
                // Cumulative delays: 1, 3, 7, 15, 30, 45, 60, 75 seconds.
                assert_eq!(attempts, 8);
                assert!(elapsed > Duration::from_secs(60));
            }
            other => panic!("expected timeout, got {:?}", other),
        }
        assert_eq!(api.status_checks(), 8);
    }

    #[tokio::test(start_paused = true)]
    async fn completion_on_check_after_retry_limit_is_failure() {
        let api = MockAssistantApi::new()
            .with_statuses(std::iter::repeat(RunStatus::Queued).take(10))
            .with_statuses([RunStatus::Completed]);
        let (thread, run) = ids();
        let config = PollerConfig::default().with_strategy(generous_backoff(10));

        let outcome = poller(&api, config).poll(&thread, &run).await;

        assert_eq!(outcome, PollOutcome::RetriesExhausted { attempts: 10 });
        assert!(!outcome.is_completed());
        assert_eq!(api.status_checks(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn completion_on_last_allowed_check_succeeds() {
        let api = MockAssistantApi::new()
            .with_statuses(std::iter::repeat(RunStatus::Queued).take(9))
            .with_statuses([RunStatus::Completed]);
        let (thread, run) = ids();
        let config = PollerConfig::default().with_strategy(generous_backoff(10));

        let outcome = poller(&api, config).poll(&thread, &run).await;

        assert_eq!(outcome, PollOutcome::Completed { attempts: 10 });
    }

    #[tokio::test(start_paused = true)]
    async fn failed_checks_consume_attempts() {
        let api = MockAssistantApi::new()
            .failing_on(MockOperation::RunStatus, AssistantApiError::network("reset"));
        let (thread, run) = ids();
        let config = PollerConfig::default().with_strategy(generous_backoff(5));

        let outcome = poller(&api, config).poll(&thread, &run).await;

        assert_eq!(outcome, PollOutcome::RetriesExhausted { attempts: 5 });
        assert_eq!(api.status_checks(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_checks_are_bounded_by_time_budget() {
        let api = MockAssistantApi::new()
            .failing_on(MockOperation::RunStatus, AssistantApiError::unavailable("503"));
        let (thread, run) = ids();

        let outcome = poller(&api, PollerConfig::default()).poll(&thread, &run).await;

        assert!(matches!(outcome, PollOutcome::TimedOut { attempts: 8, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn authentication_failure_ends_polling_immediately() {
        let api = MockAssistantApi::new()
            .failing_on(MockOperation::RunStatus, AssistantApiError::AuthenticationFailed);
        let (thread, run) = ids();

        let started = Instant::now();
        let outcome = poller(&api, PollerConfig::default()).poll(&thread, &run).await;

        assert_eq!(
            outcome,
            PollOutcome::Failed {
                error: AssistantApiError::AuthenticationFailed,
                attempts: 1
            }
        );
        assert_eq!(api.status_checks(), 1);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_run_ends_polling_after_transient_errors() {
        let api = MockAssistantApi::new()
            .with_status_error(AssistantApiError::network("reset"))
            .with_status_error(AssistantApiError::not_found("run r1"));
        let (thread, run) = ids();

        let outcome = poller(&api, PollerConfig::default()).poll(&thread, &run).await;

        assert!(!outcome.is_completed());
        assert_eq!(outcome.attempts(), 2);
        assert!(matches!(
            outcome,
            PollOutcome::Failed {
                error: AssistantApiError::NotFound(_),
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_error_then_completion() {
        let api = MockAssistantApi::new()
            .with_status_error(AssistantApiError::network("reset"))
            .with_statuses([RunStatus::Completed]);
        let (thread, run) = ids();

        let outcome = poller(&api, PollerConfig::default()).poll(&thread, &run).await;

        assert_eq!(outcome, PollOutcome::Completed { attempts: 2 });
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_failure_ends_polling() {
        let api = MockAssistantApi::new().with_statuses([RunStatus::Queued, RunStatus::Failed]);
        let (thread, run) = ids();

        let outcome = poller(&api, PollerConfig::default()).poll(&thread, &run).await;

        assert_eq!(
            outcome,
            PollOutcome::RunEnded {
                status: RunStatus::Failed,
                attempts: 2
            }
        );
        assert_eq!(api.status_checks(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_failure_can_be_polled_through() {
        let api = MockAssistantApi::new().with_statuses([RunStatus::Expired, RunStatus::Completed]);
        let (thread, run) = ids();
        let config = PollerConfig::default().with_stop_on_terminal_failure(false);

        let outcome = poller(&api, config).poll(&thread, &run).await;

        assert_eq!(outcome, PollOutcome::Completed { attempts: 2 });
    }

    #[tokio::test(start_paused = true)]
    async fn fixed_interval_polls_until_completed() {
        let api = MockAssistantApi::new()
            .with_statuses(std::iter::repeat(RunStatus::InProgress).take(25))
            .with_statuses([RunStatus::Completed]);
        let (thread, run) = ids();
        let config = PollerConfig::default()
            .with_strategy(PollStrategy::FixedInterval {
                interval: Duration::from_millis(500),
            })
            .with_verbosity(PollVerbosity::Verbose);

        let started = Instant::now();
        let outcome = poller(&api, config).poll(&thread, &run).await;

        assert_eq!(outcome, PollOutcome::Completed { attempts: 26 });
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(13_000));
        assert!(elapsed < Duration::from_millis(13_500));
    }

    #[tokio::test(start_paused = true)]
    async fn polls_the_given_thread_and_run() {
        let api = MockAssistantApi::new();
        let thread = ThreadId::new("thread_x");
        let run = RunId::new("run_y");

        poller(&api, PollerConfig::default()).poll(&thread, &run).await;

        assert_eq!(
            api.calls(),
            vec![crate::adapters::assistants::MockCall::RunStatus {
                thread_id: thread,
                run_id: run,
            }]
        );
    }
}
