//! Token-gated channel access registry
//!
//! A single owner creates priced channels. Anyone else joins a channel by
//! paying at least its cost, which mints them a non-fungible membership
//! credential. Payments accumulate in a custodial balance that only the owner
//! can withdraw.
//!
//! ## Layout
//!
//! - [`AccessRegistry`]: the state machine (`&mut self`, all-or-nothing)
//! - [`SharedRegistry`]: async handle serializing operations behind a lock
//! - [`ValueTransfer`]: seam through which withdrawals pay the owner
//! - [`SnapshotStore`]: checksummed file persistence

pub mod channel;
pub mod credential;
pub mod errors;
pub mod registry;
pub mod shared;
pub mod store;
pub mod transfer;
pub mod types;

pub use channel::Channel;
pub use credential::{Credential, RegistryEvent};
pub use errors::{RegistryError, RegistryResult, TransferError};
pub use registry::{AccessRegistry, RegistrySnapshot};
pub use shared::SharedRegistry;
pub use store::{SnapshotStore, StoreError, StoreResult};
pub use transfer::{InMemoryLedger, LedgerSnapshot, ValueTransfer};
pub use types::{Address, Amount, ChannelId, ParseError, TokenId};
