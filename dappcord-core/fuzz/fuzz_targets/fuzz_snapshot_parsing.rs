#![no_main]

use dappcord_core::core_registry::{AccessRegistry, RegistrySnapshot};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Any snapshot that restores must satisfy the registry invariants
    if let Ok(snapshot) = serde_json::from_slice::<RegistrySnapshot>(data) {
        if let Ok(registry) = AccessRegistry::from_snapshot(snapshot) {
            assert_eq!(registry.total_channels() as usize, registry.channels().len());
            for credential in registry.snapshot().credentials {
                assert!(registry.has_joined(credential.channel_id, &credential.holder));
                assert!(registry.get_channel(credential.channel_id).is_ok());
            }
        }
    }
});
