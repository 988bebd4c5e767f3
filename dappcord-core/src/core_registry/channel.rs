//! Channel data structure

use super::errors::RegistryError;
use super::types::{Amount, ChannelId};
use serde::{Deserialize, Serialize};

/// Longest accepted channel or registry display name, in characters
pub const MAX_NAME_LEN: usize = 100;

/// A named, priced resource that gates membership
///
/// Channels are immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Sequential identifier, starting at 1
    pub id: ChannelId,

    /// Human-readable name
    pub name: String,

    /// Minimum payment required to mint a membership
    pub cost: Amount,
}

impl Channel {
    pub(crate) fn new(id: ChannelId, name: String, cost: Amount) -> Self {
        Channel { id, name, cost }
    }

    /// Whether `payment` covers this channel's cost (inclusive)
    pub fn is_covered_by(&self, payment: Amount) -> bool {
        payment >= self.cost
    }
}

/// Validate a display name
pub(crate) fn validate_name(name: &str) -> Result<(), RegistryError> {
    if name.trim().is_empty() {
        return Err(RegistryError::InvalidName("name must not be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(RegistryError::InvalidName(format!(
            "name exceeds {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(())
}
