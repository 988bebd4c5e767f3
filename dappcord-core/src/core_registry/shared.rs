//! Shared registry handle with operation-level atomicity
//!
//! Wraps an [`AccessRegistry`] in an async `RwLock`. Each mutation holds the
//! write lock from its first check to its final commit (including the
//! withdrawal transfer), so concurrent callers observe the operations in a
//! single total order.

use super::channel::Channel;
use super::credential::Credential;
use super::errors::RegistryResult;
use super::registry::{AccessRegistry, RegistrySnapshot};
use super::transfer::ValueTransfer;
use super::types::{Address, Amount, ChannelId, TokenId};
use crate::metrics::Timer;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Cloneable, thread-safe handle to one registry
#[derive(Clone)]
pub struct SharedRegistry {
    inner: Arc<RwLock<AccessRegistry>>,
    transfer: Arc<dyn ValueTransfer>,
}

impl SharedRegistry {
    /// Wrap `registry`, paying withdrawals out through `transfer`
    pub fn new(registry: AccessRegistry, transfer: Arc<dyn ValueTransfer>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
            transfer,
        }
    }

    pub async fn create_channel(
        &self,
        caller: &Address,
        name: impl Into<String>,
        cost: Amount,
    ) -> RegistryResult<ChannelId> {
        let timer = Timer::start("create_channel");
        let result = self.inner.write().await.create_channel(caller, name, cost);
        timer.stop();
        result
    }

    pub async fn mint(
        &self,
        caller: &Address,
        channel_id: ChannelId,
        payment: Amount,
    ) -> RegistryResult<Credential> {
        let timer = Timer::start("mint");
        let result = self.inner.write().await.mint(caller, channel_id, payment);
        timer.stop();
        result
    }

    pub async fn withdraw(&self, caller: &Address) -> RegistryResult<Amount> {
        let timer = Timer::start("withdraw");
        let result = self
            .inner
            .write()
            .await
            .withdraw(caller, self.transfer.as_ref());
        timer.stop();
        result
    }

    pub async fn get_channel(&self, id: ChannelId) -> RegistryResult<Channel> {
        self.inner.read().await.get_channel(id).cloned()
    }

    pub async fn has_joined(&self, channel_id: ChannelId, holder: &Address) -> bool {
        self.inner.read().await.has_joined(channel_id, holder)
    }

    pub async fn total_channels(&self) -> u64 {
        self.inner.read().await.total_channels()
    }

    pub async fn total_supply(&self) -> u64 {
        self.inner.read().await.total_supply()
    }

    pub async fn balance(&self) -> Amount {
        self.inner.read().await.balance()
    }

    pub async fn owner(&self) -> Address {
        self.inner.read().await.owner()
    }

    pub async fn name(&self) -> String {
        self.inner.read().await.name().to_string()
    }

    pub async fn symbol(&self) -> String {
        self.inner.read().await.symbol().to_string()
    }

    pub async fn channels(&self) -> Vec<Channel> {
        self.inner.read().await.channels().to_vec()
    }

    pub async fn owner_of(&self, token_id: TokenId) -> RegistryResult<Address> {
        self.inner.read().await.owner_of(token_id)
    }

    pub async fn credentials_of(&self, holder: &Address) -> Vec<Credential> {
        self.inner
            .read()
            .await
            .credentials_of(holder)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Consistent copy of the full state
    pub async fn snapshot(&self) -> RegistrySnapshot {
        self.inner.read().await.snapshot()
    }
}
