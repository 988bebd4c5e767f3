#![no_main]

use dappcord_core::core_registry::{Address, Amount};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(address) = text.parse::<Address>() {
            assert_eq!(address.to_string().parse::<Address>().unwrap(), address);
        }
        if let Ok(amount) = Amount::parse_tokens(text) {
            assert_eq!(Amount::parse_tokens(&amount.to_tokens_string()).unwrap(), amount);
        }
    }
});
