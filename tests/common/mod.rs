#![allow(dead_code)]

use async_trait::async_trait;
use billing_capture::domain::balance::AppointmentBalance;
use billing_capture::domain::capture::{CaptureKey, CapturePayload};
use billing_capture::domain::money::Money;
use billing_capture::domain::ports::PaymentGateway;
use billing_capture::error::GatewayError;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

/// In-memory gateway for exercising the capture path.
///
/// Captures for a held order block until the order is released. Scripted errors are
/// returned per order before falling back to success.
#[derive(Default)]
pub struct MockGateway {
    orders: AtomicUsize,
    created: Mutex<Vec<(Money, String)>>,
    create_error: Mutex<Option<GatewayError>>,
    calls: Mutex<HashMap<String, usize>>,
    failures: Mutex<HashMap<String, VecDeque<GatewayError>>>,
    held: Mutex<HashSet<String>>,
    released: Notify,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks captures of `order` until [`release`](Self::release) is called.
    pub fn hold(&self, order: &str) {
        self.held.lock().unwrap().insert(order.to_string());
    }

    pub fn release(&self, order: &str) {
        self.held.lock().unwrap().remove(order);
        self.released.notify_waiters();
    }

    pub fn fail_next(&self, order: &str, err: GatewayError) {
        self.failures
            .lock()
            .unwrap()
            .entry(order.to_string())
            .or_default()
            .push_back(err);
    }

    pub fn fail_create(&self, err: GatewayError) {
        *self.create_error.lock().unwrap() = Some(err);
    }

    pub fn calls(&self, order: &str) -> usize {
        self.calls.lock().unwrap().get(order).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    pub fn created_orders(&self) -> Vec<(Money, String)> {
        self.created.lock().unwrap().clone()
    }

    pub async fn wait_for_calls(&self, order: &str, expected: usize) {
        while self.calls(order) < expected {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    fn is_held(&self, order: &str) -> bool {
        self.held.lock().unwrap().contains(order)
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_order(&self, amount: Money, description: &str) -> Result<String, GatewayError> {
        if let Some(err) = self.create_error.lock().unwrap().take() {
            return Err(err);
        }
        let n = self.orders.fetch_add(1, Ordering::SeqCst) + 1;
        self.created
            .lock()
            .unwrap()
            .push((amount, description.to_string()));
        Ok(format!("ORDER-{n}"))
    }

    async fn capture_order(&self, order_id: &CaptureKey) -> Result<CapturePayload, GatewayError> {
        let order = order_id.as_str();
        let attempt = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(order.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        loop {
            let released = self.released.notified();
            if !self.is_held(order) {
                break;
            }
            released.await;
        }

        let scripted = self
            .failures
            .lock()
            .unwrap()
            .get_mut(order)
            .and_then(VecDeque::pop_front);
        if let Some(err) = scripted {
            return Err(err);
        }

        Ok(CapturePayload {
            capture_id: format!("CAP-{order}-{attempt}"),
            status: "COMPLETED".to_string(),
            raw: serde_json::json!({ "id": order, "status": "COMPLETED" }),
        })
    }
}

pub fn balance(id: &str, total: Decimal, paid: Decimal, advance_paid: bool) -> AppointmentBalance {
    AppointmentBalance::new(
        id,
        Money::new(total).unwrap(),
        Money::new(paid).unwrap(),
        advance_paid,
    )
    .unwrap()
}

pub fn transport_error() -> GatewayError {
    GatewayError::Transport("connection reset by peer".to_string())
}
