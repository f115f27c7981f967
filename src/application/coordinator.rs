use crate::domain::capture::{CaptureFailure, CaptureKey, CaptureOutcome, FailureKind};
use crate::domain::ports::PaymentGatewayRef;
use crate::error::{BillingError, GatewayError, Result};
use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Receiving side of one outbound capture call; `None` until it resolves.
type InFlightHandle = watch::Receiver<Option<CaptureOutcome>>;
type InFlightResolver = watch::Sender<Option<CaptureOutcome>>;

#[derive(Default)]
struct Registry {
    in_flight: HashMap<CaptureKey, InFlightHandle>,
    /// Successful outcomes only.
    completed: HashMap<CaptureKey, CaptureOutcome>,
}

/// The registry is never held across an `.await`, so a blocking lock is enough and
/// it can also be taken from `Drop`.
fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns the in-flight entry for one key.
///
/// Dropping it without calling `resolve` (the capture task was cancelled or its
/// runtime shut down) removes the entry, so the next caller starts a fresh call
/// instead of attaching to a handle nobody will ever resolve.
struct InFlightGuard {
    registry: Arc<Mutex<Registry>>,
    key: Option<CaptureKey>,
}

impl InFlightGuard {
    fn resolve(mut self, outcome: CaptureOutcome, resolver: &InFlightResolver) {
        let Some(key) = self.key.take() else {
            return;
        };
        let mut registry = lock(&self.registry);
        if outcome.is_success() {
            registry.completed.insert(key.clone(), outcome.clone());
        }
        resolver.send_replace(Some(outcome));
        registry.in_flight.remove(&key);
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            warn!(order_id = %key, "capture task dropped before resolving");
            lock(&self.registry).in_flight.remove(&key);
        }
    }
}

/// Single chokepoint for gateway captures.
///
/// Concurrent `capture` calls for the same order share one outbound call, and a
/// successful capture is cached for the lifetime of the coordinator so it is never
/// issued again. Failures are handed to every waiting caller and then forgotten, so
/// the next call retries. Different orders never wait on each other beyond the brief
/// registry lock.
///
/// Cloning is cheap and every clone shares the same registry.
#[derive(Clone)]
pub struct CaptureCoordinator {
    gateway: PaymentGatewayRef,
    registry: Arc<Mutex<Registry>>,
}

impl CaptureCoordinator {
    /// Creates a coordinator with an empty registry in front of `gateway`.
    pub fn new(gateway: PaymentGatewayRef) -> Self {
        Self {
            gateway,
            registry: Arc::new(Mutex::new(Registry::default())),
        }
    }

    /// Captures the order identified by `key`, at most once.
    ///
    /// Fails only with `InvalidKey`; gateway and transport failures come back as a
    /// failed [`CaptureOutcome`].
    pub async fn capture(&self, key: &str) -> Result<CaptureOutcome> {
        let key = CaptureKey::new(key)?;

        let (handle, resolver) = {
            let mut registry = lock(&self.registry);

            if let Some(outcome) = registry.completed.get(&key) {
                debug!(order_id = %key, "capture served from cache");
                return Ok(outcome.clone());
            }

            match registry.in_flight.get(&key).cloned() {
                Some(handle) => {
                    debug!(order_id = %key, "attaching to in-flight capture");
                    (handle, None)
                }
                None => {
                    let (resolver, handle) = watch::channel(None);
                    registry.in_flight.insert(key.clone(), handle.clone());
                    (handle, Some(resolver))
                }
            }
        };

        if let Some(resolver) = resolver {
            self.spawn_capture(key.clone(), resolver);
        }

        Ok(Self::wait(key, handle).await)
    }

    /// Like [`capture`](Self::capture), but gives up waiting after `wait`.
    ///
    /// The outbound call is not aborted: if it succeeds later the result is still
    /// cached and returned to the next caller.
    pub async fn capture_with_timeout(&self, key: &str, wait: Duration) -> Result<CaptureOutcome> {
        match tokio::time::timeout(wait, self.capture(key)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(order_id = key, wait = ?wait, "stopped waiting for capture");
                Err(BillingError::WaitTimeout)
            }
        }
    }

    /// Returns the cached successful outcome for `key`, if any.
    pub fn cached(&self, key: &str) -> Option<CaptureOutcome> {
        let key = CaptureKey::new(key).ok()?;
        lock(&self.registry).completed.get(&key).cloned()
    }

    /// Number of orders captured successfully so far.
    pub fn cached_count(&self) -> usize {
        lock(&self.registry).completed.len()
    }

    /// Number of outbound captures currently unresolved.
    pub fn in_flight_count(&self) -> usize {
        lock(&self.registry).in_flight.len()
    }

    /// Issues the single outbound call for `key` on a detached task.
    ///
    /// Must be called after the handle is registered and with the registry lock
    /// released, since dropping an unstarted task takes the lock.
    fn spawn_capture(&self, key: CaptureKey, resolver: InFlightResolver) {
        let gateway = Arc::clone(&self.gateway);
        let guard = InFlightGuard {
            registry: Arc::clone(&self.registry),
            key: Some(key.clone()),
        };

        tokio::spawn(async move {
            info!(order_id = %key, "capturing order");
            let call = AssertUnwindSafe(gateway.capture_order(&key))
                .catch_unwind()
                .await;

            let outcome = match call {
                Ok(Ok(payload)) => CaptureOutcome::captured(key.clone(), payload),
                Ok(Err(err)) => CaptureOutcome::failed(key.clone(), failure_from(err)),
                Err(_) => CaptureOutcome::failed(
                    key.clone(),
                    CaptureFailure {
                        kind: FailureKind::Transport,
                        code: None,
                        detail: "gateway client panicked during capture".to_string(),
                    },
                ),
            };

            match outcome.failure() {
                None => info!(order_id = %key, "order captured"),
                Some(failure) => {
                    warn!(order_id = %key, kind = ?failure.kind, detail = %failure.detail, "capture failed");
                }
            }
            guard.resolve(outcome, &resolver);
        });
    }

    async fn wait(key: CaptureKey, mut handle: InFlightHandle) -> CaptureOutcome {
        let resolved = handle
            .wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|value| value.clone());

        resolved.unwrap_or_else(|| {
            CaptureOutcome::failed(
                key,
                CaptureFailure {
                    kind: FailureKind::Transport,
                    code: None,
                    detail: "capture task ended without a result".to_string(),
                },
            )
        })
    }
}

fn failure_from(err: GatewayError) -> CaptureFailure {
    match err {
        GatewayError::Transport(detail) => CaptureFailure {
            kind: FailureKind::Transport,
            code: None,
            detail,
        },
        GatewayError::Rejected { code, message } => CaptureFailure {
            kind: FailureKind::GatewayRejected,
            code,
            detail: message,
        },
    }
}
