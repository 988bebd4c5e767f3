//! Drives a registry with debug logging enabled
//!
//! Run with:
//! ```bash
//! cargo run --example logging_demo
//! ```

use dappcord_core::core_registry::{AccessRegistry, Address, Amount, ChannelId, InMemoryLedger};
use dappcord_core::logging::{init_logging_with_config, LogConfig, LogLevel};

fn main() {
    let config = LogConfig::new(LogLevel::Debug).with_target(true);
    init_logging_with_config(config).expect("Failed to initialize logging");
    dappcord_core::metrics::init_metrics();

    let owner = Address::generate();
    let member = Address::generate();
    let ledger = InMemoryLedger::new();

    let mut registry = AccessRegistry::new("Dappcord", "DC", owner).expect("deploy");
    registry
        .create_channel(&owner, "general", Amount::from_tokens(1))
        .expect("create channel");

    // Rejected calls are logged at warn
    let _ = registry.create_channel(&member, "intruders", Amount::ZERO);
    let _ = registry.mint(&member, ChannelId(2), Amount::from_tokens(1));

    registry
        .mint(&member, ChannelId(1), Amount::from_tokens(1))
        .expect("mint");
    let _ = registry.mint(&member, ChannelId(1), Amount::from_tokens(1));

    registry.withdraw(&owner, &ledger).expect("withdraw");
}
