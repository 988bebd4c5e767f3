//! File-based snapshot storage
//!
//! Layout of every snapshot file:
//! `[magic: 8][version: 1][crc32 of body: 4, LE][body: JSON]`.
//! Files are written to a temporary sibling and renamed into place.

use super::errors::{RegistryError, TransferError};
use super::registry::{AccessRegistry, RegistrySnapshot};
use super::transfer::{InMemoryLedger, LedgerSnapshot};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Magic header for registry snapshot files
const REGISTRY_MAGIC: &[u8; 8] = b"DCRG0001";

/// Magic header for payout ledger files
const LEDGER_MAGIC: &[u8; 8] = b"DCLG0001";

/// Current snapshot format version
const FORMAT_VERSION: u8 = 1;

const HEADER_LEN: usize = 8 + 1 + 4;

/// Default file name of the payout ledger
pub const LEDGER_FILE: &str = "ledger.snapshot";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid snapshot format: {0}")]
    InvalidFormat(String),

    #[error("Unsupported format version: {0}")]
    UnsupportedVersion(u8),

    #[error("Checksum mismatch: expected {expected:#010x}, found {found:#010x}")]
    ChecksumMismatch { expected: u32, found: u32 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No registry snapshot at {0}")]
    Missing(PathBuf),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] TransferError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Snapshot storage rooted at a data directory
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    data_dir: PathBuf,
    registry_file: String,
}

impl SnapshotStore {
    /// Open (and create if needed) a store in `data_dir`
    pub fn open(data_dir: impl Into<PathBuf>, registry_file: impl Into<String>) -> StoreResult<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;
        Ok(Self {
            data_dir,
            registry_file: registry_file.into(),
        })
    }

    pub fn registry_path(&self) -> PathBuf {
        self.data_dir.join(&self.registry_file)
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join(LEDGER_FILE)
    }

    /// Whether a registry has been saved here
    pub fn exists(&self) -> bool {
        self.registry_path().is_file()
    }

    pub fn save_registry(&self, snapshot: &RegistrySnapshot) -> StoreResult<()> {
        let path = self.registry_path();
        write_atomic(&path, &encode(REGISTRY_MAGIC, snapshot)?)?;
        info!(
            path = %path.display(),
            channels = snapshot.channels.len(),
            credentials = snapshot.credentials.len(),
            "Registry snapshot saved"
        );
        Ok(())
    }

    /// Load and validate the registry snapshot
    pub fn load_registry(&self) -> StoreResult<AccessRegistry> {
        let path = self.registry_path();
        if !path.is_file() {
            return Err(StoreError::Missing(path));
        }
        let snapshot: RegistrySnapshot = decode(REGISTRY_MAGIC, &fs::read(&path)?)?;
        let registry = AccessRegistry::from_snapshot(snapshot)?;
        debug!(path = %path.display(), "Registry snapshot loaded");
        Ok(registry)
    }

    pub fn save_ledger(&self, ledger: &InMemoryLedger) -> StoreResult<()> {
        let snapshot = ledger.snapshot()?;
        write_atomic(&self.ledger_path(), &encode(LEDGER_MAGIC, &snapshot)?)?;
        Ok(())
    }

    /// Load the payout ledger, or an empty one if none was saved yet
    pub fn load_ledger(&self) -> StoreResult<InMemoryLedger> {
        let path = self.ledger_path();
        if !path.is_file() {
            return Ok(InMemoryLedger::new());
        }
        let snapshot: LedgerSnapshot = decode(LEDGER_MAGIC, &fs::read(&path)?)?;
        Ok(InMemoryLedger::from_snapshot(snapshot))
    }
}

fn encode<T: Serialize>(magic: &[u8; 8], value: &T) -> StoreResult<Vec<u8>> {
    let body = serde_json::to_vec_pretty(value)?;
    let checksum = crc32fast::hash(&body);

    let mut result = Vec::with_capacity(HEADER_LEN + body.len());
    result.extend_from_slice(magic);
    result.push(FORMAT_VERSION);
    result.extend_from_slice(&checksum.to_le_bytes());
    result.extend_from_slice(&body);
    Ok(result)
}

fn decode<T: DeserializeOwned>(magic: &[u8; 8], bytes: &[u8]) -> StoreResult<T> {
    if bytes.len() < HEADER_LEN || &bytes[0..8] != magic {
        return Err(StoreError::InvalidFormat("bad magic header".to_string()));
    }

    let version = bytes[8];
    if version != FORMAT_VERSION {
        return Err(StoreError::UnsupportedVersion(version));
    }

    let expected = u32::from_le_bytes([bytes[9], bytes[10], bytes[11], bytes[12]]);
    let body = &bytes[HEADER_LEN..];
    let found = crc32fast::hash(body);
    if expected != found {
        return Err(StoreError::ChecksumMismatch { expected, found });
    }

    Ok(serde_json::from_slice(body)?)
}

/// Sibling temp file named after the full file name, so no two targets share one
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let tmp = temp_path(path);
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}
