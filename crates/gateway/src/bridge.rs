//! Runs blocking backend calls off the async scheduler.
//!
//! This is the only place that inspects what a backend client hands back.
//! Everything leaves as a [`RawOutcome`]; classification happens later in
//! `toolgate_core::normalize`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::task::JoinError;
use toolgate_backends::{ClientError, HttpReply};
use toolgate_core::config::BridgeConfig;
use toolgate_core::{ErrorClass, RawOutcome, ThrownError};
use tracing::{debug, warn};

/// Structural inspection of a value returned by a blocking call.
pub trait IntoRawOutcome {
    fn into_raw_outcome(self) -> RawOutcome;
}

impl IntoRawOutcome for HttpReply {
    fn into_raw_outcome(self) -> RawOutcome {
        if self.is_success() && self.has_empty_body() {
            RawOutcome::EmptySuccess
        } else {
            RawOutcome::StatusBody { code: self.status, body: self.body }
        }
    }
}

impl IntoRawOutcome for Value {
    fn into_raw_outcome(self) -> RawOutcome {
        match self {
            Value::Null => RawOutcome::EmptySuccess,
            value => RawOutcome::StructuredPayload(value),
        }
    }
}

impl IntoRawOutcome for () {
    fn into_raw_outcome(self) -> RawOutcome {
        RawOutcome::EmptySuccess
    }
}

impl<T: IntoRawOutcome> IntoRawOutcome for Option<T> {
    fn into_raw_outcome(self) -> RawOutcome {
        self.map_or(RawOutcome::EmptySuccess, IntoRawOutcome::into_raw_outcome)
    }
}

/// Captures whatever status, reason and body an error exposes.
pub trait IntoThrownError {
    fn into_thrown_error(self) -> ThrownError;
}

impl IntoThrownError for ClientError {
    fn into_thrown_error(self) -> ThrownError {
        match self {
            Self::Timeout => ThrownError::new(ErrorClass::Timeout).with_reason("request timed out"),
            Self::Transport(reason) => ThrownError::new(ErrorClass::Transport).with_reason(reason),
            Self::Status { status, reason, body } => {
                ThrownError::status(status, reason, Some(body))
            }
            Self::Decode(reason) => ThrownError::new(ErrorClass::Decode).with_reason(reason),
        }
    }
}

/// Bounded pool of blocking workers with a per-call deadline.
pub struct Bridge {
    permits: Arc<Semaphore>,
    timeout: Duration,
    dispatched: AtomicU64,
}

impl Bridge {
    pub fn new(config: &BridgeConfig) -> Self {
        Self::with_limits(Duration::from_secs(config.timeout_secs), config.max_in_flight)
    }

    pub fn with_limits(timeout: Duration, max_in_flight: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
            timeout,
            dispatched: AtomicU64::new(0),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of blocking calls handed to a worker so far.
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    pub async fn run<F, T, E>(&self, call: F) -> RawOutcome
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: IntoRawOutcome + Send + 'static,
        E: IntoThrownError + Send + 'static,
    {
        let permit = match Arc::clone(&self.permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                return RawOutcome::Thrown(
                    ThrownError::new(ErrorClass::Transport).with_reason("bridge is closed"),
                )
            }
        };

        self.dispatched.fetch_add(1, Ordering::Relaxed);
        // The permit travels with the worker, so an abandoned call still holds its slot.
        let worker = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            call()
        });

        match tokio::time::timeout(self.timeout, worker).await {
            Ok(Ok(Ok(value))) => value.into_raw_outcome(),
            Ok(Ok(Err(error))) => RawOutcome::Thrown(error.into_thrown_error()),
            Ok(Err(join_error)) => {
                warn!(
                    event_name = "bridge.worker.failed",
                    panicked = join_error.is_panic(),
                    "blocking worker did not complete"
                );
                RawOutcome::Thrown(join_failure(&join_error))
            }
            Err(_) => {
                debug!(
                    event_name = "bridge.call.timeout",
                    timeout_ms = self.timeout.as_millis() as u64,
                    "blocking call exceeded its deadline"
                );
                RawOutcome::Thrown(ThrownError::new(ErrorClass::Timeout).with_reason(format!(
                    "no reply within {}s",
                    self.timeout.as_secs_f64()
                )))
            }
        }
    }
}

/// A panicked worker is an internal fault; a cancelled one never reached the backend.
fn join_failure(join_error: &JoinError) -> ThrownError {
    if join_error.is_panic() {
        ThrownError::new(ErrorClass::Panic)
            .with_reason(format!("blocking call failed: {join_error}"))
    } else {
        ThrownError::new(ErrorClass::Transport)
            .with_reason(format!("blocking call was cancelled: {join_error}"))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;
    use toolgate_backends::{ClientError, HttpReply};
    use toolgate_core::{ErrorClass, RawOutcome};

    use super::{join_failure, Bridge};

    fn bridge() -> Bridge {
        Bridge::with_limits(Duration::from_secs(5), 4)
    }

    #[tokio::test]
    async fn http_reply_becomes_status_body() {
        let outcome = bridge()
            .run(|| Ok::<_, ClientError>(HttpReply::new(404, "{\"error\":\"nope\"}")))
            .await;
        assert_eq!(
            outcome,
            RawOutcome::StatusBody { code: 404, body: b"{\"error\":\"nope\"}".to_vec() }
        );
    }

    #[tokio::test]
    async fn blank_success_reply_is_empty_success() {
        let outcome = bridge().run(|| Ok::<_, ClientError>(HttpReply::new(200, ""))).await;
        assert_eq!(outcome, RawOutcome::EmptySuccess);
    }

    #[tokio::test]
    async fn decoded_values_pass_through_structurally() {
        let bridge = bridge();
        let outcome = bridge.run(|| Ok::<_, ClientError>(json!({"id": 1}))).await;
        assert_eq!(outcome, RawOutcome::StructuredPayload(json!({"id": 1})));

        let outcome = bridge.run(|| Ok::<_, ClientError>(serde_json::Value::Null)).await;
        assert_eq!(outcome, RawOutcome::EmptySuccess);

        let outcome = bridge.run(|| Ok::<_, ClientError>(None::<HttpReply>)).await;
        assert_eq!(outcome, RawOutcome::EmptySuccess);

        let outcome = bridge.run(|| Ok::<_, ClientError>(())).await;
        assert_eq!(outcome, RawOutcome::EmptySuccess);
    }

    #[tokio::test]
    async fn client_errors_keep_their_attributes() {
        let outcome = bridge()
            .run(|| {
                Err::<HttpReply, _>(ClientError::Status {
                    status: 503,
                    reason: Some("Service Unavailable".to_string()),
                    body: b"down".to_vec(),
                })
            })
            .await;
        let RawOutcome::Thrown(thrown) = outcome else {
            panic!("expected thrown error");
        };
        assert_eq!(thrown.class, ErrorClass::Status);
        assert_eq!(thrown.code, Some(503));
        assert_eq!(thrown.reason.as_deref(), Some("Service Unavailable"));
        assert_eq!(thrown.body.as_deref(), Some(&b"down"[..]));

        let outcome =
            bridge().run(|| Err::<HttpReply, _>(ClientError::Transport("refused".into()))).await;
        let RawOutcome::Thrown(thrown) = outcome else {
            panic!("expected thrown error");
        };
        assert_eq!(thrown.class, ErrorClass::Transport);
        assert_eq!(thrown.code, None);
        assert_eq!(thrown.body, None);
    }

    #[tokio::test]
    async fn worker_panic_is_captured() {
        let outcome = bridge()
            .run(|| -> Result<HttpReply, ClientError> { panic!("backend client exploded") })
            .await;
        let RawOutcome::Thrown(thrown) = outcome else {
            panic!("expected thrown error");
        };
        assert_eq!(thrown.class, ErrorClass::Panic);
    }

    #[tokio::test]
    async fn cancelled_worker_is_not_reported_as_a_panic() {
        let handle = tokio::spawn(std::future::pending::<()>());
        handle.abort();
        let cancelled = handle.await.expect_err("aborted task");
        assert!(cancelled.is_cancelled());
        let thrown = join_failure(&cancelled);
        assert_eq!(thrown.class, ErrorClass::Transport);
        assert!(thrown.reason.as_deref().is_some_and(|reason| reason.contains("cancelled")));

        let panicked = tokio::spawn(async { panic!("worker exploded") })
            .await
            .expect_err("panicked task");
        assert_eq!(join_failure(&panicked).class, ErrorClass::Panic);
    }

    #[tokio::test]
    async fn slow_call_times_out() {
        let bridge = Bridge::with_limits(Duration::from_millis(20), 2);
        let outcome = bridge
            .run(|| {
                std::thread::sleep(Duration::from_millis(300));
                Ok::<_, ClientError>(HttpReply::new(200, "{}"))
            })
            .await;
        let RawOutcome::Thrown(thrown) = outcome else {
            panic!("expected thrown error");
        };
        assert_eq!(thrown.class, ErrorClass::Timeout);
        assert_eq!(thrown.code, None);
    }

    #[tokio::test]
    async fn dispatch_counter_tracks_calls() {
        let bridge = bridge();
        assert_eq!(bridge.dispatched(), 0);
        bridge.run(|| Ok::<_, ClientError>(())).await;
        bridge.run(|| Ok::<_, ClientError>(())).await;
        assert_eq!(bridge.dispatched(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn in_flight_calls_are_bounded() {
        let bridge = Arc::new(Bridge::with_limits(Duration::from_secs(5), 2));
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let bridge = Arc::clone(&bridge);
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                bridge
                    .run(move || {
                        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        std::thread::sleep(Duration::from_millis(30));
                        active.fetch_sub(1, Ordering::SeqCst);
                        Ok::<_, ClientError>(())
                    })
                    .await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.expect("join"), RawOutcome::EmptySuccess);
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(bridge.dispatched(), 6);
    }
}
