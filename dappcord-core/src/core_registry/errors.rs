//! Error types for registry operations

use super::types::{Address, Amount, ChannelId, TokenId};
use thiserror::Error;

/// Failures of the value-transfer collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("Recipient {0} rejected the transfer")]
    Rejected(Address),

    #[error("Crediting {amount} to {recipient} would overflow its account")]
    Overflow { recipient: Address, amount: Amount },

    #[error("Transfer backend unavailable: {0}")]
    Unavailable(String),
}

/// Registry operation errors
///
/// Every variant is returned before any state is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Caller {caller} is not the registry owner")]
    Unauthorized { caller: Address },

    #[error("Invalid channel id {0}")]
    InvalidChannel(ChannelId),

    #[error("{holder} already holds a membership for channel {channel_id}")]
    AlreadyMember {
        channel_id: ChannelId,
        holder: Address,
    },

    #[error("Insufficient payment: sent {sent}, channel costs {cost}")]
    InsufficientPayment { sent: Amount, cost: Amount },

    #[error("Withdrawal transfer failed: {0}")]
    TransferFailure(#[from] TransferError),

    #[error("Channel {0} not found")]
    NotFound(ChannelId),

    #[error("Credential {0} does not exist")]
    UnknownToken(TokenId),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Owner cannot be the zero address")]
    InvalidOwner,

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    #[error("Corrupt snapshot: {0}")]
    CorruptSnapshot(String),
}

impl RegistryError {
    /// Short label used for the rejection metric
    pub fn kind(&self) -> &'static str {
        match self {
            RegistryError::Unauthorized { .. } => "unauthorized",
            RegistryError::InvalidChannel(_) => "invalid_channel",
            RegistryError::AlreadyMember { .. } => "already_member",
            RegistryError::InsufficientPayment { .. } => "insufficient_payment",
            RegistryError::TransferFailure(_) => "transfer_failure",
            RegistryError::NotFound(_) => "not_found",
            RegistryError::UnknownToken(_) => "unknown_token",
            RegistryError::InvalidName(_) => "invalid_name",
            RegistryError::InvalidOwner => "invalid_owner",
            RegistryError::ArithmeticOverflow => "arithmetic_overflow",
            RegistryError::CorruptSnapshot(_) => "corrupt_snapshot",
        }
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;
