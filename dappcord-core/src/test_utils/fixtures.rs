//! Test fixtures for building registries and identities

use crate::core_registry::{AccessRegistry, Address, Amount, ChannelId};

pub const NAME: &str = "Dappcord";
pub const SYMBOL: &str = "DC";

/// `n` whole tokens
pub fn tokens(n: u64) -> Amount {
    Amount::from_tokens(n)
}

/// Deterministic, non-zero address derived from `seed`
pub fn test_address(seed: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[0] = 0xDC;
    bytes[19] = seed;
    Address::from_bytes(bytes)
}

/// Identity that deploys registries in tests
pub fn deployer() -> Address {
    test_address(0)
}

/// A non-owner identity
pub fn user() -> Address {
    test_address(1)
}

/// Freshly deployed registry owned by [`deployer`]
pub fn deployed_registry() -> AccessRegistry {
    match AccessRegistry::new(NAME, SYMBOL, deployer()) {
        Ok(registry) => registry,
        Err(e) => panic!("fixture deployment failed: {}", e),
    }
}

/// Registry with channel 1, "general", costing one token
pub fn registry_with_general() -> AccessRegistry {
    let mut registry = deployed_registry();
    match registry.create_channel(&deployer(), "general", tokens(1)) {
        Ok(id) => assert_eq!(id, ChannelId(1)),
        Err(e) => panic!("fixture channel creation failed: {}", e),
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addresses_are_distinct_and_non_zero() {
        assert_ne!(deployer(), user());
        assert!(!deployer().is_zero());
        assert_eq!(test_address(7), test_address(7));
    }

    #[test]
    fn test_registry_with_general() {
        let registry = registry_with_general();
        assert_eq!(registry.total_channels(), 1);
        assert_eq!(registry.owner(), deployer());
    }
}
