//! Metrics for registry observability
//!
//! Recorded through the `metrics` facade. Nothing is exported unless the
//! embedding binary installs a recorder.

use crate::core_registry::Amount;
use ::metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram,
};
use std::time::Instant;

pub const CHANNELS_CREATED: &str = "registry.channels.created";
pub const MEMBERSHIPS_MINTED: &str = "registry.memberships.minted";
pub const OPERATIONS_REJECTED: &str = "registry.operations.rejected";
pub const WITHDRAWALS: &str = "registry.withdrawals";
pub const BALANCE: &str = "registry.balance";
pub const OPERATION_DURATION: &str = "registry.operation.duration_ms";

/// Initialize metrics with descriptions
pub fn init_metrics() {
    describe_counter!(CHANNELS_CREATED, "Number of channels created");
    describe_counter!(MEMBERSHIPS_MINTED, "Number of membership credentials minted");
    describe_counter!(
        OPERATIONS_REJECTED,
        "Registry operations rejected, labelled by operation and error kind"
    );
    describe_counter!(WITHDRAWALS, "Number of successful withdrawals");
    describe_gauge!(BALANCE, "Custodial balance in whole tokens");
    describe_histogram!(OPERATION_DURATION, "Registry operation duration in milliseconds");
}

/// Record a counter metric
pub fn record_counter(name: &'static str, value: u64) {
    counter!(name).increment(value);
}

/// Record a rejected operation
pub fn record_rejection(operation: &'static str, kind: &'static str) {
    counter!(OPERATIONS_REJECTED, "operation" => operation, "kind" => kind).increment(1);
}

/// Record the custodial balance gauge
pub fn record_balance(balance: Amount) {
    // Lossy once the balance exceeds 2^53 units, which is fine for a gauge.
    let tokens = balance.units() as f64 / crate::core_registry::types::UNITS_PER_TOKEN as f64;
    gauge!(BALANCE).set(tokens);
}

/// Timer for measuring operation duration
pub struct Timer {
    operation: &'static str,
    start: Instant,
}

impl Timer {
    /// Start timing `operation`
    pub fn start(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }

    /// Stop the timer and record the duration
    pub fn stop(self) {
        let duration = self.start.elapsed();
        histogram!(OPERATION_DURATION, "operation" => self.operation)
            .record(duration.as_secs_f64() * 1000.0);
    }
}
