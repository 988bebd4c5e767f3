//! Registry-specific assertions

use crate::core_registry::{AccessRegistry, RegistryError};
use std::fmt::Debug;

/// Assert that a Result is Ok and return the value
pub fn assert_ok<T, E: Debug>(result: Result<T, E>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => panic!("Expected Ok, got Err: {:?}", e),
    }
}

/// Run `op` and assert it is rejected without touching any state
///
/// Returns the error so callers can match on its kind.
pub fn assert_rejected_unchanged<T, F>(registry: &mut AccessRegistry, op: F) -> RegistryError
where
    T: Debug,
    F: FnOnce(&mut AccessRegistry) -> Result<T, RegistryError>,
{
    let before = registry.snapshot();
    let err = match op(registry) {
        Ok(value) => panic!("Expected rejection, got Ok: {:?}", value),
        Err(e) => e,
    };
    assert_eq!(
        registry.snapshot(),
        before,
        "Rejected operation ({}) modified registry state",
        err
    );
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_registry::ChannelId;
    use crate::test_utils::fixtures::*;

    #[test]
    fn test_assert_rejected_unchanged() {
        let mut registry = registry_with_general();
        let err = assert_rejected_unchanged(&mut registry, |r| {
            r.mint(&user(), ChannelId(9), tokens(1))
        });
        assert_eq!(err, RegistryError::InvalidChannel(ChannelId(9)));
    }

    #[test]
    #[should_panic(expected = "Expected rejection")]
    fn test_assert_rejected_unchanged_panics_on_success() {
        let mut registry = registry_with_general();
        assert_rejected_unchanged(&mut registry, |r| r.mint(&user(), ChannelId(1), tokens(1)));
    }
}
