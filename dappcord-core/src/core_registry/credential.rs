//! Membership credentials and registry events

use super::types::{Address, Amount, ChannelId, TokenId};
use serde::{Deserialize, Serialize};

/// Non-fungible proof of paid access to one channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Global issue number, dense from 1
    pub token_id: TokenId,

    /// Channel this credential grants access to
    pub channel_id: ChannelId,

    /// Holder the credential was minted to
    pub holder: Address,
}

/// Entry in the registry's append-only event log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistryEvent {
    ChannelCreated {
        id: ChannelId,
        name: String,
        cost: Amount,
    },
    MembershipMinted {
        token_id: TokenId,
        channel_id: ChannelId,
        holder: Address,
        paid: Amount,
    },
    Withdrawn {
        recipient: Address,
        amount: Amount,
    },
}
