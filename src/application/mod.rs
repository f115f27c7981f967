//! Application layer: capture coordination and the billing logic around it.
//!
//! `CaptureCoordinator` is the only component allowed to call the gateway's capture
//! operation. `resolver` and `aggregator` are pure functions over balances, and
//! `BillingService` wires them to the backend and gateway ports.

pub mod aggregator;
pub mod billing;
pub mod coordinator;
pub mod resolver;
