//! The access registry state machine
//!
//! Every mutating operation validates all of its preconditions before it
//! touches any field, so a rejected call leaves the registry exactly as it
//! found it. Exclusive access is enforced by `&mut self`; see
//! [`SharedRegistry`](super::shared::SharedRegistry) for a locked handle.

use super::channel::{validate_name, Channel};
use super::credential::{Credential, RegistryEvent};
use super::errors::{RegistryError, RegistryResult};
use super::transfer::ValueTransfer;
use super::types::{Address, Amount, ChannelId, TokenId};
use crate::metrics;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

/// Complete persisted state of a registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub name: String,
    pub symbol: String,
    pub owner: Address,
    pub channels: Vec<Channel>,
    pub credentials: Vec<Credential>,
    pub balance: Amount,
    pub events: Vec<RegistryEvent>,
}

/// Token-gated channel access registry
#[derive(Debug, Clone)]
pub struct AccessRegistry {
    name: String,
    symbol: String,
    owner: Address,
    /// Channel `n` lives at index `n - 1`
    channels: Vec<Channel>,
    /// Credential `n` lives at index `n - 1`
    credentials: Vec<Credential>,
    memberships: HashSet<(ChannelId, Address)>,
    holdings: HashMap<Address, Vec<TokenId>>,
    balance: Amount,
    events: Vec<RegistryEvent>,
}

impl AccessRegistry {
    /// Deploy a new registry owned by `owner`
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        owner: Address,
    ) -> RegistryResult<Self> {
        let name = name.into();
        let symbol = symbol.into();
        validate_name(&name)?;
        validate_name(&symbol)?;
        if owner.is_zero() {
            return Err(RegistryError::InvalidOwner);
        }

        info!(name = %name, symbol = %symbol, owner = %owner, "Registry deployed");

        Ok(Self {
            name,
            symbol,
            owner,
            channels: Vec::new(),
            credentials: Vec::new(),
            memberships: HashSet::new(),
            holdings: HashMap::new(),
            balance: Amount::ZERO,
            events: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Whether `caller` holds owner privilege
    pub fn is_owner(&self, caller: &Address) -> bool {
        *caller == self.owner
    }

    fn ensure_owner(&self, caller: &Address) -> RegistryResult<()> {
        if !self.is_owner(caller) {
            return Err(RegistryError::Unauthorized { caller: *caller });
        }
        Ok(())
    }

    /// Create a channel (owner only) and return its id
    pub fn create_channel(
        &mut self,
        caller: &Address,
        name: impl Into<String>,
        cost: Amount,
    ) -> RegistryResult<ChannelId> {
        let name = name.into();
        self.try_create_channel(caller, name, cost)
            .inspect_err(|e| reject("create_channel", caller, e))
    }

    fn try_create_channel(
        &mut self,
        caller: &Address,
        name: String,
        cost: Amount,
    ) -> RegistryResult<ChannelId> {
        self.ensure_owner(caller)?;
        validate_name(&name)?;

        let next = self
            .total_channels()
            .checked_add(1)
            .ok_or(RegistryError::ArithmeticOverflow)?;
        let id = ChannelId(next);

        self.channels.push(Channel::new(id, name.clone(), cost));
        self.events.push(RegistryEvent::ChannelCreated {
            id,
            name: name.clone(),
            cost,
        });

        info!(channel_id = %id, name = %name, cost = %cost, "Channel created");
        metrics::record_counter(metrics::CHANNELS_CREATED, 1);
        Ok(id)
    }

    /// Look up a channel by id
    pub fn get_channel(&self, id: ChannelId) -> RegistryResult<&Channel> {
        self.channel_index(id)
            .map(|index| &self.channels[index])
            .ok_or(RegistryError::NotFound(id))
    }

    /// All channels in id order
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    fn channel_index(&self, id: ChannelId) -> Option<usize> {
        if id.0 == 0 || id.0 > self.total_channels() {
            return None;
        }
        usize::try_from(id.0 - 1).ok()
    }

    /// Mint a membership credential for `channel_id` to `caller`
    ///
    /// The full `payment` is retained, including any amount above the cost.
    pub fn mint(
        &mut self,
        caller: &Address,
        channel_id: ChannelId,
        payment: Amount,
    ) -> RegistryResult<Credential> {
        self.try_mint(caller, channel_id, payment)
            .inspect_err(|e| reject("mint", caller, e))
    }

    fn try_mint(
        &mut self,
        caller: &Address,
        channel_id: ChannelId,
        payment: Amount,
    ) -> RegistryResult<Credential> {
        let index = self
            .channel_index(channel_id)
            .ok_or(RegistryError::InvalidChannel(channel_id))?;

        if self.has_joined(channel_id, caller) {
            return Err(RegistryError::AlreadyMember {
                channel_id,
                holder: *caller,
            });
        }

        let cost = self.channels[index].cost;
        if !self.channels[index].is_covered_by(payment) {
            return Err(RegistryError::InsufficientPayment { sent: payment, cost });
        }

        let balance = self
            .balance
            .checked_add(payment)
            .ok_or(RegistryError::ArithmeticOverflow)?;
        let token_id = TokenId(
            self.total_supply()
                .checked_add(1)
                .ok_or(RegistryError::ArithmeticOverflow)?,
        );

        // All checks passed; commit.
        let credential = Credential {
            token_id,
            channel_id,
            holder: *caller,
        };
        self.memberships.insert((channel_id, *caller));
        self.holdings.entry(*caller).or_default().push(token_id);
        self.credentials.push(credential.clone());
        self.balance = balance;
        self.events.push(RegistryEvent::MembershipMinted {
            token_id,
            channel_id,
            holder: *caller,
            paid: payment,
        });

        info!(
            token_id = %token_id,
            channel_id = %channel_id,
            holder = %caller,
            paid = %payment,
            "Membership minted"
        );
        metrics::record_counter(metrics::MEMBERSHIPS_MINTED, 1);
        metrics::record_balance(self.balance);
        Ok(credential)
    }

    /// Whether `holder` has a credential for `channel_id`
    pub fn has_joined(&self, channel_id: ChannelId, holder: &Address) -> bool {
        self.memberships.contains(&(channel_id, *holder))
    }

    pub fn total_channels(&self) -> u64 {
        self.channels.len() as u64
    }

    pub fn total_supply(&self) -> u64 {
        self.credentials.len() as u64
    }

    /// Custodial balance awaiting withdrawal
    pub fn balance(&self) -> Amount {
        self.balance
    }

    /// Send the entire custodial balance to the owner (owner only)
    ///
    /// Returns the amount sent. The balance is only cleared after `transfer`
    /// reports success.
    pub fn withdraw<T: ValueTransfer + ?Sized>(
        &mut self,
        caller: &Address,
        transfer: &T,
    ) -> RegistryResult<Amount> {
        self.try_withdraw(caller, transfer)
            .inspect_err(|e| reject("withdraw", caller, e))
    }

    fn try_withdraw<T: ValueTransfer + ?Sized>(
        &mut self,
        caller: &Address,
        transfer: &T,
    ) -> RegistryResult<Amount> {
        self.ensure_owner(caller)?;

        let amount = self.balance;
        if amount.is_zero() {
            info!(owner = %self.owner, "Nothing to withdraw");
            return Ok(Amount::ZERO);
        }

        transfer.send(&self.owner, amount)?;

        self.balance = Amount::ZERO;
        self.events.push(RegistryEvent::Withdrawn {
            recipient: self.owner,
            amount,
        });

        info!(recipient = %self.owner, amount = %amount, "Balance withdrawn");
        metrics::record_counter(metrics::WITHDRAWALS, 1);
        metrics::record_balance(self.balance);
        Ok(amount)
    }

    /// Holder of a credential
    pub fn owner_of(&self, token_id: TokenId) -> RegistryResult<Address> {
        self.credential(token_id).map(|c| c.holder)
    }

    pub fn credential(&self, token_id: TokenId) -> RegistryResult<&Credential> {
        if token_id.0 == 0 || token_id.0 > self.total_supply() {
            return Err(RegistryError::UnknownToken(token_id));
        }
        usize::try_from(token_id.0 - 1)
            .ok()
            .and_then(|index| self.credentials.get(index))
            .ok_or(RegistryError::UnknownToken(token_id))
    }

    /// Number of credentials held by `holder`
    pub fn balance_of(&self, holder: &Address) -> u64 {
        self.holdings.get(holder).map_or(0, |tokens| tokens.len() as u64)
    }

    /// Credentials held by `holder`, in issue order
    pub fn credentials_of(&self, holder: &Address) -> Vec<&Credential> {
        self.holdings
            .get(holder)
            .into_iter()
            .flatten()
            .filter_map(|token_id| self.credential(*token_id).ok())
            .collect()
    }

    /// Append-only log of successful operations
    pub fn events(&self) -> &[RegistryEvent] {
        &self.events
    }

    /// Capture the full state for persistence
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            owner: self.owner,
            channels: self.channels.clone(),
            credentials: self.credentials.clone(),
            balance: self.balance,
            events: self.events.clone(),
        }
    }

    /// Rebuild a registry from a snapshot, rejecting inconsistent state
    pub fn from_snapshot(snapshot: RegistrySnapshot) -> RegistryResult<Self> {
        let corrupt = |msg: String| RegistryError::CorruptSnapshot(msg);

        validate_name(&snapshot.name).map_err(|e| corrupt(e.to_string()))?;
        validate_name(&snapshot.symbol).map_err(|e| corrupt(e.to_string()))?;
        if snapshot.owner.is_zero() {
            return Err(corrupt("owner is the zero address".to_string()));
        }

        for (index, channel) in snapshot.channels.iter().enumerate() {
            if channel.id.0 != index as u64 + 1 {
                return Err(corrupt(format!(
                    "channel at position {} has id {}",
                    index + 1,
                    channel.id
                )));
            }
            validate_name(&channel.name).map_err(|e| corrupt(e.to_string()))?;
        }

        let total_channels = snapshot.channels.len() as u64;
        let mut memberships = HashSet::new();
        let mut holdings: HashMap<Address, Vec<TokenId>> = HashMap::new();
        for (index, credential) in snapshot.credentials.iter().enumerate() {
            if credential.token_id.0 != index as u64 + 1 {
                return Err(corrupt(format!(
                    "credential at position {} has id {}",
                    index + 1,
                    credential.token_id
                )));
            }
            if credential.channel_id.0 == 0 || credential.channel_id.0 > total_channels {
                return Err(corrupt(format!(
                    "credential {} references unknown channel {}",
                    credential.token_id, credential.channel_id
                )));
            }
            if !memberships.insert((credential.channel_id, credential.holder)) {
                return Err(corrupt(format!(
                    "{} holds more than one credential for channel {}",
                    credential.holder, credential.channel_id
                )));
            }
            holdings
                .entry(credential.holder)
                .or_default()
                .push(credential.token_id);
        }

        Self::verify_event_log(&snapshot)?;

        Ok(Self {
            name: snapshot.name,
            symbol: snapshot.symbol,
            owner: snapshot.owner,
            channels: snapshot.channels,
            credentials: snapshot.credentials,
            memberships,
            holdings,
            balance: snapshot.balance,
            events: snapshot.events,
        })
    }

    /// Replay the event log against the tables and the balance
    ///
    /// The i-th `ChannelCreated` must describe `channels[i]` and the j-th
    /// `MembershipMinted` must describe `credentials[j]`, paid at or above the
    /// channel cost, for a channel already created at that point in the log.
    fn verify_event_log(snapshot: &RegistrySnapshot) -> RegistryResult<()> {
        let corrupt = |msg: String| RegistryError::CorruptSnapshot(msg);
        let mut created = 0usize;
        let mut minted = 0usize;
        let mut balance = Amount::ZERO;

        for event in &snapshot.events {
            match event {
                RegistryEvent::ChannelCreated { id, name, cost } => {
                    let channel = snapshot.channels.get(created).ok_or_else(|| {
                        corrupt(format!("event log creates unrecorded channel {}", id))
                    })?;
                    if channel.id != *id || channel.name != *name || channel.cost != *cost {
                        return Err(corrupt(format!(
                            "creation event for channel {} does not match the channel table",
                            id
                        )));
                    }
                    created += 1;
                }
                RegistryEvent::MembershipMinted {
                    token_id,
                    channel_id,
                    holder,
                    paid,
                } => {
                    let credential = snapshot.credentials.get(minted).ok_or_else(|| {
                        corrupt(format!("event log mints unrecorded token {}", token_id))
                    })?;
                    if credential.token_id != *token_id
                        || credential.channel_id != *channel_id
                        || credential.holder != *holder
                    {
                        return Err(corrupt(format!(
                            "mint event for token {} does not match the credential table",
                            token_id
                        )));
                    }
                    let channel = channel_id
                        .0
                        .checked_sub(1)
                        .filter(|index| (*index as usize) < created)
                        .and_then(|index| snapshot.channels.get(index as usize))
                        .ok_or_else(|| {
                            corrupt(format!(
                                "token {} minted before channel {} was created",
                                token_id, channel_id
                            ))
                        })?;
                    if !channel.is_covered_by(*paid) {
                        return Err(corrupt(format!(
                            "token {} paid {} below channel cost {}",
                            token_id, paid, channel.cost
                        )));
                    }
                    minted += 1;
                    balance = balance
                        .checked_add(*paid)
                        .ok_or(RegistryError::ArithmeticOverflow)?;
                }
                RegistryEvent::Withdrawn { recipient, amount } => {
                    if *recipient != snapshot.owner {
                        return Err(corrupt(format!(
                            "withdrawal paid to {} instead of the owner",
                            recipient
                        )));
                    }
                    if amount.is_zero() || *amount != balance {
                        return Err(corrupt(format!(
                            "withdrawal of {} does not drain balance {}",
                            amount, balance
                        )));
                    }
                    balance = Amount::ZERO;
                }
            }
        }

        if created != snapshot.channels.len() || minted != snapshot.credentials.len() {
            return Err(corrupt(
                "event log does not match channel and credential tables".to_string(),
            ));
        }
        if balance != snapshot.balance {
            return Err(corrupt(format!(
                "balance {} does not match receipts minus withdrawals {}",
                snapshot.balance, balance
            )));
        }
        Ok(())
    }
}

fn reject(operation: &'static str, caller: &Address, error: &RegistryError) {
    warn!(operation, caller = %caller, error = %error, "Registry operation rejected");
    metrics::record_rejection(operation, error.kind());
}
