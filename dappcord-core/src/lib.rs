//! Dappcord access registry
//!
//! Token-gated channel membership with owner-controlled custody. See
//! [`core_registry`] for the state machine; the remaining modules carry the
//! configuration, logging and metrics used by the CLI.

pub mod config;
pub mod core_registry;
pub mod logging;
pub mod metrics;
pub mod test_utils;

pub use core_registry::{
    AccessRegistry, Address, Amount, ChannelId, Credential, InMemoryLedger, RegistryError,
    SharedRegistry, SnapshotStore, TokenId, ValueTransfer,
};
pub use logging::{init_logging, LogLevel};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let _ = LogLevel::Info;
        let _ = Amount::ZERO;
    }
}
