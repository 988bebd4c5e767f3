//! Property tests for registry invariants

use dappcord_core::core_registry::{
    AccessRegistry, Address, Amount, ChannelId, InMemoryLedger, RegistryError,
};
use dappcord_core::test_utils::*;
use proptest::prelude::*;
use std::collections::HashSet;

#[derive(Debug, Clone)]
enum Op {
    Create { caller: u8, cost: u64 },
    Mint { caller: u8, channel: u64, payment: u64 },
    Withdraw { caller: u8 },
}

// Caller 0 is the deployer; costs and payments are in raw units.
fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..3u8, 0..50u64).prop_map(|(caller, cost)| Op::Create { caller, cost }),
        (0..5u8, 0..8u64, 0..60u64).prop_map(|(caller, channel, payment)| Op::Mint {
            caller,
            channel,
            payment
        }),
        (0..3u8).prop_map(|caller| Op::Withdraw { caller }),
    ]
}

fn caller(seed: u8) -> Address {
    test_address(seed)
}

proptest! {
    #[test]
    fn prop_channel_ids_are_dense(costs in prop::collection::vec(0..1_000u64, 0..20)) {
        let mut registry = deployed_registry();
        for (i, cost) in costs.iter().enumerate() {
            let id = registry
                .create_channel(&deployer(), format!("c{}", i), Amount::from_units(*cost as u128))
                .unwrap();
            prop_assert_eq!(id, ChannelId(i as u64 + 1));
        }
        prop_assert_eq!(registry.total_channels(), costs.len() as u64);
        for (i, channel) in registry.channels().iter().enumerate() {
            prop_assert_eq!(channel.id, ChannelId(i as u64 + 1));
        }
    }

    #[test]
    fn prop_non_owner_never_creates(seed in 1..=255u8, cost in 0..1_000u64) {
        let mut registry = registry_with_general();
        let result = registry.create_channel(&caller(seed), "x", Amount::from_units(cost as u128));
        prop_assert!(
            matches!(result, Err(RegistryError::Unauthorized { .. })),
            "expected Unauthorized, got {:?}",
            result
        );
        prop_assert_eq!(registry.total_channels(), 1);
    }

    #[test]
    fn prop_payment_boundary(cost in 0..1_000_000u64, delta in 0..1_000u64) {
        let mut registry = deployed_registry();
        registry
            .create_channel(&deployer(), "priced", Amount::from_units(cost as u128))
            .unwrap();

        if delta > 0 && delta <= cost {
            let short = Amount::from_units((cost - delta) as u128);
            let short_result = registry.mint(&user(), ChannelId(1), short);
            prop_assert!(
                matches!(short_result, Err(RegistryError::InsufficientPayment { .. })),
                "expected InsufficientPayment, got {:?}",
                short_result
            );
        }

        let exact = Amount::from_units(cost as u128);
        prop_assert!(registry.mint(&user(), ChannelId(1), exact).is_ok());
        prop_assert_eq!(registry.balance(), exact);
    }

    #[test]
    fn prop_random_operations_preserve_invariants(
        ops in prop::collection::vec(op_strategy(), 1..60)
    ) {
        let mut registry = deployed_registry();
        let ledger = InMemoryLedger::new();

        let mut expected_balance: u128 = 0;
        let mut withdrawn: u128 = 0;
        let mut joined: HashSet<(u64, u8)> = HashSet::new();

        for op in ops {
            let before = registry.snapshot();
            match op {
                Op::Create { caller: seed, cost } => {
                    let result = registry.create_channel(
                        &caller(seed),
                        "c",
                        Amount::from_units(cost as u128),
                    );
                    if seed == 0 {
                        prop_assert_eq!(result.unwrap(), ChannelId(before.channels.len() as u64 + 1));
                    } else {
                        prop_assert!(result.is_err());
                        prop_assert_eq!(registry.snapshot(), before);
                    }
                }
                Op::Mint { caller: seed, channel, payment } => {
                    let result = registry.mint(
                        &caller(seed),
                        ChannelId(channel),
                        Amount::from_units(payment as u128),
                    );
                    let in_range = channel >= 1 && channel <= before.channels.len() as u64;
                    match result {
                        Ok(credential) => {
                            prop_assert!(in_range);
                            prop_assert!(joined.insert((channel, seed)));
                            prop_assert_eq!(credential.token_id.value(), before.credentials.len() as u64 + 1);
                            expected_balance += payment as u128;
                        }
                        Err(RegistryError::InvalidChannel(_)) => prop_assert!(!in_range),
                        Err(RegistryError::AlreadyMember { .. }) => {
                            prop_assert!(joined.contains(&(channel, seed)));
                        }
                        Err(RegistryError::InsufficientPayment { sent, cost }) => {
                            prop_assert!(sent < cost);
                        }
                        Err(other) => prop_assert!(false, "unexpected error {:?}", other),
                    }
                    if registry.snapshot().credentials.len() == before.credentials.len() {
                        prop_assert_eq!(registry.snapshot(), before);
                    }
                }
                Op::Withdraw { caller: seed } => {
                    let result = registry.withdraw(&caller(seed), &ledger);
                    if seed == 0 {
                        prop_assert_eq!(result.unwrap().units(), expected_balance);
                        withdrawn += expected_balance;
                        expected_balance = 0;
                    } else {
                        prop_assert!(result.is_err());
                        prop_assert_eq!(registry.snapshot(), before);
                    }
                }
            }

            prop_assert_eq!(registry.balance().units(), expected_balance);
            prop_assert_eq!(registry.total_supply(), joined.len() as u64);
            for (channel, seed) in &joined {
                prop_assert!(registry.has_joined(ChannelId(*channel), &caller(*seed)));
            }
        }

        prop_assert_eq!(ledger.balance_of(&deployer()).unwrap().units(), withdrawn);

        // The persisted form always restores
        let restored = AccessRegistry::from_snapshot(registry.snapshot()).unwrap();
        prop_assert_eq!(restored.snapshot(), registry.snapshot());
    }
}
