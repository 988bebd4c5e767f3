//! Subcommand implementations
//!
//! Each mutating command loads the snapshot, applies one registry operation
//! through a [`SharedRegistry`], and saves only if the operation succeeded.

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use dappcord_core::config::Config;
use dappcord_core::core_registry::{
    AccessRegistry, Address, Amount, ChannelId, InMemoryLedger, SharedRegistry, SnapshotStore,
    TokenId,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Deploy a new registry into the data directory
    Deploy {
        /// Initial owner (defaults to deployment.owner from config)
        #[arg(long)]
        owner: Option<Address>,

        /// Display name (defaults to deployment.name)
        #[arg(long)]
        name: Option<String>,

        /// Display symbol (defaults to deployment.symbol)
        #[arg(long)]
        symbol: Option<String>,

        /// Overwrite an existing registry
        #[arg(long)]
        force: bool,
    },

    /// Create a channel (owner only)
    CreateChannel {
        #[arg(long)]
        caller: Address,

        #[arg(long)]
        name: String,

        /// Cost in tokens, e.g. 1 or 0.5
        #[arg(long, value_parser = Amount::parse_tokens)]
        cost: Amount,
    },

    /// Show one channel
    Channel { id: u64 },

    /// List all channels
    Channels,

    /// Pay for and mint a channel membership
    Mint {
        #[arg(long)]
        caller: Address,

        #[arg(long)]
        channel: u64,

        /// Attached payment in tokens
        #[arg(long, value_parser = Amount::parse_tokens)]
        value: Amount,
    },

    /// Check whether an address has joined a channel
    HasJoined {
        #[arg(long)]
        channel: u64,

        #[arg(long)]
        address: Address,
    },

    /// Show the holder of a credential
    OwnerOf { token_id: u64 },

    /// List the credentials held by an address
    Credentials {
        #[arg(long)]
        address: Address,
    },

    /// Registry name, symbol, owner, totals and balance
    Info,

    /// Withdraw the custodial balance to the owner (owner only)
    Withdraw {
        #[arg(long)]
        caller: Address,
    },

    /// Show how much the payout ledger has credited an address
    Payouts {
        #[arg(long)]
        address: Address,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Deploy { .. } => "deploy",
            Command::CreateChannel { .. } => "create-channel",
            Command::Channel { .. } => "channel",
            Command::Channels => "channels",
            Command::Mint { .. } => "mint",
            Command::HasJoined { .. } => "has-joined",
            Command::OwnerOf { .. } => "owner-of",
            Command::Credentials { .. } => "credentials",
            Command::Info => "info",
            Command::Withdraw { .. } => "withdraw",
            Command::Payouts { .. } => "payouts",
        }
    }
}

struct Session {
    store: SnapshotStore,
    registry: SharedRegistry,
    ledger: Arc<InMemoryLedger>,
}

impl Session {
    fn open(store: SnapshotStore) -> Result<Self> {
        if !store.exists() {
            bail!(
                "no registry at {}; run `dappcord deploy` first",
                store.registry_path().display()
            );
        }
        let registry = store
            .load_registry()
            .with_context(|| format!("loading {}", store.registry_path().display()))?;
        let ledger = Arc::new(store.load_ledger().context("loading payout ledger")?);
        let registry = SharedRegistry::new(registry, ledger.clone());
        Ok(Self {
            store,
            registry,
            ledger,
        })
    }

    /// Persist after a successful mutation
    ///
    /// The registry is written before the ledger so an interrupted save can
    /// never leave a payout recorded while the balance is still withdrawable.
    async fn commit(&self) -> Result<()> {
        self.store.save_registry(&self.registry.snapshot().await)?;
        self.store.save_ledger(&self.ledger)?;
        Ok(())
    }
}

/// Run `command` against the store configured in `config`
pub async fn execute(command: Command, config: &Config) -> Result<Value> {
    let store = SnapshotStore::open(&config.store.data_dir, config.store.registry_file.clone())
        .with_context(|| format!("opening data dir {}", config.store.data_dir.display()))?;
    info!(command = command.name(), data_dir = %config.store.data_dir.display(), "Running command");

    match command {
        Command::Deploy {
            owner,
            name,
            symbol,
            force,
        } => {
            if store.exists() && !force {
                bail!(
                    "a registry already exists at {}; pass --force to replace it",
                    store.registry_path().display()
                );
            }
            let owner = owner
                .or(config.deployment.owner)
                .context("no owner given; pass --owner or set deployment.owner")?;
            let name = name.unwrap_or_else(|| config.deployment.name.clone());
            let symbol = symbol.unwrap_or_else(|| config.deployment.symbol.clone());

            let registry = AccessRegistry::new(name, symbol, owner)?;
            store.save_registry(&registry.snapshot())?;
            store.save_ledger(&InMemoryLedger::new())?;
            Ok(json!({
                "name": registry.name(),
                "symbol": registry.symbol(),
                "owner": registry.owner(),
            }))
        }

        Command::CreateChannel { caller, name, cost } => {
            let session = Session::open(store)?;
            let id = session.registry.create_channel(&caller, name, cost).await?;
            session.commit().await?;
            Ok(json!(session.registry.get_channel(id).await?))
        }

        Command::Channel { id } => {
            let session = Session::open(store)?;
            Ok(json!(session.registry.get_channel(ChannelId(id)).await?))
        }

        Command::Channels => {
            let session = Session::open(store)?;
            Ok(json!(session.registry.channels().await))
        }

        Command::Mint {
            caller,
            channel,
            value,
        } => {
            let session = Session::open(store)?;
            let credential = session
                .registry
                .mint(&caller, ChannelId(channel), value)
                .await?;
            session.commit().await?;
            Ok(json!(credential))
        }

        Command::HasJoined { channel, address } => {
            let session = Session::open(store)?;
            let joined = session
                .registry
                .has_joined(ChannelId(channel), &address)
                .await;
            Ok(json!({ "channel": channel, "address": address, "joined": joined }))
        }

        Command::OwnerOf { token_id } => {
            let session = Session::open(store)?;
            let holder = session.registry.owner_of(TokenId(token_id)).await?;
            Ok(json!({ "token_id": token_id, "owner": holder }))
        }

        Command::Credentials { address } => {
            let session = Session::open(store)?;
            Ok(json!(session.registry.credentials_of(&address).await))
        }

        Command::Info => {
            let session = Session::open(store)?;
            let registry = &session.registry;
            let balance = registry.balance().await;
            Ok(json!({
                "name": registry.name().await,
                "symbol": registry.symbol().await,
                "owner": registry.owner().await,
                "total_channels": registry.total_channels().await,
                "total_supply": registry.total_supply().await,
                "balance": balance,
                "balance_tokens": balance.to_tokens_string(),
            }))
        }

        Command::Withdraw { caller } => {
            let session = Session::open(store)?;
            let amount = session.registry.withdraw(&caller).await?;
            session.commit().await?;
            Ok(json!({
                "recipient": session.registry.owner().await,
                "amount": amount,
                "amount_tokens": amount.to_tokens_string(),
            }))
        }

        Command::Payouts { address } => {
            let ledger = store.load_ledger()?;
            let credited = ledger.balance_of(&address)?;
            Ok(json!({
                "address": address,
                "credited": credited,
                "credited_tokens": credited.to_tokens_string(),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dappcord_core::core_registry::RegistryError;
    use tempfile::TempDir;

    fn owner() -> Address {
        "0xdc00000000000000000000000000000000000000".parse().unwrap()
    }

    fn user() -> Address {
        "0xdc00000000000000000000000000000000000001".parse().unwrap()
    }

    fn config_in(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.store.data_dir = dir.path().to_path_buf();
        config
    }

    async fn deploy(config: &Config) -> Value {
        execute(
            Command::Deploy {
                owner: Some(owner()),
                name: None,
                symbol: None,
                force: false,
            },
            config,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_full_workflow() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);

        let deployed = deploy(&config).await;
        assert_eq!(deployed["name"], "Dappcord");
        assert_eq!(deployed["symbol"], "DC");

        let channel = execute(
            Command::CreateChannel {
                caller: owner(),
                name: "general".to_string(),
                cost: Amount::from_tokens(1),
            },
            &config,
        )
        .await
        .unwrap();
        assert_eq!(channel["id"], 1);
        assert_eq!(channel["cost"], "1000000000000000000");

        let credential = execute(
            Command::Mint {
                caller: user(),
                channel: 1,
                value: Amount::from_tokens(1),
            },
            &config,
        )
        .await
        .unwrap();
        assert_eq!(credential["token_id"], 1);

        let joined = execute(
            Command::HasJoined {
                channel: 1,
                address: user(),
            },
            &config,
        )
        .await
        .unwrap();
        assert_eq!(joined["joined"], true);

        let info = execute(Command::Info, &config).await.unwrap();
        assert_eq!(info["total_channels"], 1);
        assert_eq!(info["total_supply"], 1);
        assert_eq!(info["balance_tokens"], "1");

        let withdrawn = execute(Command::Withdraw { caller: owner() }, &config)
            .await
            .unwrap();
        assert_eq!(withdrawn["amount_tokens"], "1");

        let info = execute(Command::Info, &config).await.unwrap();
        assert_eq!(info["balance"], "0");

        let payouts = execute(Command::Payouts { address: owner() }, &config)
            .await
            .unwrap();
        assert_eq!(payouts["credited_tokens"], "1");
    }

    #[tokio::test]
    async fn test_rejected_mint_is_not_persisted() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        deploy(&config).await;
        execute(
            Command::CreateChannel {
                caller: owner(),
                name: "general".to_string(),
                cost: Amount::from_tokens(1),
            },
            &config,
        )
        .await
        .unwrap();

        let err = execute(
            Command::Mint {
                caller: user(),
                channel: 1,
                value: Amount::parse_tokens("0.5").unwrap(),
            },
            &config,
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RegistryError>(),
            Some(RegistryError::InsufficientPayment { .. })
        ));

        let info = execute(Command::Info, &config).await.unwrap();
        assert_eq!(info["total_supply"], 0);
        assert_eq!(info["balance"], "0");
    }

    #[tokio::test]
    async fn test_non_owner_cannot_create_channel() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        deploy(&config).await;

        let err = execute(
            Command::CreateChannel {
                caller: user(),
                name: "newChannel".to_string(),
                cost: Amount::from_tokens(3),
            },
            &config,
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RegistryError>(),
            Some(RegistryError::Unauthorized { .. })
        ));
    }

    #[tokio::test]
    async fn test_deploy_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        deploy(&config).await;

        let again = execute(
            Command::Deploy {
                owner: Some(user()),
                name: None,
                symbol: None,
                force: false,
            },
            &config,
        )
        .await;
        assert!(again.is_err());

        let forced = execute(
            Command::Deploy {
                owner: Some(user()),
                name: Some("Guild".to_string()),
                symbol: Some("GLD".to_string()),
                force: true,
            },
            &config,
        )
        .await
        .unwrap();
        assert_eq!(forced["owner"], user().to_string());
        assert_eq!(forced["name"], "Guild");
    }

    #[tokio::test]
    async fn test_deploy_requires_owner() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);

        let result = execute(
            Command::Deploy {
                owner: None,
                name: None,
                symbol: None,
                force: false,
            },
            &config,
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_commands_before_deploy_fail() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        assert!(execute(Command::Info, &config).await.is_err());
        assert!(execute(Command::Channels, &config).await.is_err());
    }
}
