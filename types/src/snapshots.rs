use ola_basic_types::{Address, L1BatchNumber, MiniblockNumber, H256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::proto;

/// Response of `snapshots_getAllSnapshots`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllSnapshots {
    pub snapshots_l1_batch_numbers: Vec<L1BatchNumber>,
}

impl AllSnapshots {
    /// The snapshot with the highest L1 batch number, if any snapshot exists.
    pub fn latest(&self) -> Option<L1BatchNumber> {
        self.snapshots_l1_batch_numbers.iter().copied().max()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum SnapshotVersion {
    /// Storage logs are keyed by `(address, key)`.
    Version0 = 0,
    /// Storage logs are keyed by the hashed key only.
    Version1 = 1,
}

impl TryFrom<u16> for SnapshotVersion {
    type Error = u16;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Version0),
            1 => Ok(Self::Version1),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotStorageLogsChunkMetadata {
    pub chunk_id: u64,
    /// Path of the gzipped chunk, relative to the artifacts root.
    pub filepath: String,
}

/// Snapshot metadata as returned by `snapshots_getSnapshot`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotHeader {
    #[serde(default)]
    pub version: u16,
    pub l1_batch_number: L1BatchNumber,
    pub miniblock_number: MiniblockNumber,
    pub storage_logs_chunks: Vec<SnapshotStorageLogsChunkMetadata>,
    pub factory_deps_filepath: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotDecodeError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` has {actual} bytes, expected {expected}")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("storage log has neither a plain nor a hashed key")]
    MissingStorageKey,
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, SnapshotDecodeError> {
    value.ok_or(SnapshotDecodeError::MissingField(field))
}

fn fixed_bytes<const N: usize>(
    bytes: &[u8],
    field: &'static str,
) -> Result<[u8; N], SnapshotDecodeError> {
    bytes
        .try_into()
        .map_err(|_| SnapshotDecodeError::InvalidLength {
            field,
            expected: N,
            actual: bytes.len(),
        })
}

/// Factory dependency from a snapshot. The hash is kept as raw bytes: its length
/// is checked during validation rather than during decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFactoryDependency {
    pub bytecode: Vec<u8>,
    pub hash: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotFactoryDependencies {
    pub factory_deps: Vec<SnapshotFactoryDependency>,
}

impl TryFrom<proto::SnapshotFactoryDependencies> for SnapshotFactoryDependencies {
    type Error = SnapshotDecodeError;

    fn try_from(message: proto::SnapshotFactoryDependencies) -> Result<Self, Self::Error> {
        let factory_deps = message
            .factory_deps
            .into_iter()
            .map(|dep| {
                Ok(SnapshotFactoryDependency {
                    bytecode: required(dep.bytecode, "bytecode")?,
                    hash: dep.hash,
                })
            })
            .collect::<Result<_, SnapshotDecodeError>>()?;
        Ok(Self { factory_deps })
    }
}

impl From<&SnapshotFactoryDependencies> for proto::SnapshotFactoryDependencies {
    fn from(deps: &SnapshotFactoryDependencies) -> Self {
        Self {
            factory_deps: deps
                .factory_deps
                .iter()
                .map(|dep| proto::SnapshotFactoryDependency {
                    bytecode: Some(dep.bytecode.clone()),
                    hash: dep.hash.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotStorageKey {
    Plain { address: Address, key: H256 },
    Hashed(H256),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotStorageLog {
    pub key: SnapshotStorageKey,
    pub value: H256,
    pub l1_batch_number_of_initial_write: L1BatchNumber,
    pub enumeration_index: u64,
}

impl TryFrom<proto::SnapshotStorageLog> for SnapshotStorageLog {
    type Error = SnapshotDecodeError;

    fn try_from(log: proto::SnapshotStorageLog) -> Result<Self, Self::Error> {
        let key = match (&log.account_address, &log.storage_key, &log.hashed_key) {
            (Some(address), Some(key), _) => SnapshotStorageKey::Plain {
                address: Address::from(fixed_bytes::<20>(address, "account_address")?),
                key: H256(fixed_bytes(key, "storage_key")?),
            },
            (None, None, Some(hashed_key)) => {
                SnapshotStorageKey::Hashed(H256(fixed_bytes(hashed_key, "hashed_key")?))
            }
            (Some(_), None, _) => return Err(SnapshotDecodeError::MissingField("storage_key")),
            (None, Some(_), _) => {
                return Err(SnapshotDecodeError::MissingField("account_address"))
            }
            (None, None, None) => return Err(SnapshotDecodeError::MissingStorageKey),
        };
        let value = required(log.storage_value.as_deref(), "storage_value")?;

        Ok(Self {
            key,
            value: H256(fixed_bytes(value, "storage_value")?),
            l1_batch_number_of_initial_write: L1BatchNumber(required(
                log.l1_batch_number_of_initial_write,
                "l1_batch_number_of_initial_write",
            )?),
            enumeration_index: required(log.enumeration_index, "enumeration_index")?,
        })
    }
}

impl From<&SnapshotStorageLog> for proto::SnapshotStorageLog {
    fn from(log: &SnapshotStorageLog) -> Self {
        let (account_address, storage_key, hashed_key) = match log.key {
            SnapshotStorageKey::Plain { address, key } => (
                Some(address.as_bytes().to_vec()),
                Some(key.as_bytes().to_vec()),
                None,
            ),
            SnapshotStorageKey::Hashed(hashed_key) => {
                (None, None, Some(hashed_key.as_bytes().to_vec()))
            }
        };
        Self {
            account_address,
            storage_key,
            storage_value: Some(log.value.as_bytes().to_vec()),
            l1_batch_number_of_initial_write: Some(log.l1_batch_number_of_initial_write.0),
            enumeration_index: Some(log.enumeration_index),
            hashed_key,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotStorageLogsChunk {
    pub storage_logs: Vec<SnapshotStorageLog>,
}

impl TryFrom<proto::SnapshotStorageLogsChunk> for SnapshotStorageLogsChunk {
    type Error = SnapshotDecodeError;

    fn try_from(chunk: proto::SnapshotStorageLogsChunk) -> Result<Self, Self::Error> {
        let storage_logs = chunk
            .storage_logs
            .into_iter()
            .map(SnapshotStorageLog::try_from)
            .collect::<Result<_, _>>()?;
        Ok(Self { storage_logs })
    }
}

impl From<&SnapshotStorageLogsChunk> for proto::SnapshotStorageLogsChunk {
    fn from(chunk: &SnapshotStorageLogsChunk) -> Self {
        Self {
            storage_logs: chunk.storage_logs.iter().map(Into::into).collect(),
        }
    }
}
