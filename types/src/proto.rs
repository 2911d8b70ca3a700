//! Protobuf wire messages of the snapshot artifacts.
//!
//! Field tags must stay in sync with the messages the snapshot creator writes;
//! everything is declared `optional` and checked when converting into the
//! types from [`crate::snapshots`].

#[derive(Clone, PartialEq, prost::Message)]
pub struct SnapshotFactoryDependency {
    #[prost(bytes = "vec", optional, tag = "1")]
    pub bytecode: Option<Vec<u8>>,
    #[prost(bytes = "vec", optional, tag = "2")]
    pub hash: Option<Vec<u8>>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SnapshotFactoryDependencies {
    #[prost(message, repeated, tag = "1")]
    pub factory_deps: Vec<SnapshotFactoryDependency>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SnapshotStorageLog {
    /// Version 0 only; 20 bytes.
    #[prost(bytes = "vec", optional, tag = "1")]
    pub account_address: Option<Vec<u8>>,
    /// Version 0 only; 32 bytes.
    #[prost(bytes = "vec", optional, tag = "2")]
    pub storage_key: Option<Vec<u8>>,
    #[prost(bytes = "vec", optional, tag = "3")]
    pub storage_value: Option<Vec<u8>>,
    #[prost(uint32, optional, tag = "4")]
    pub l1_batch_number_of_initial_write: Option<u32>,
    #[prost(uint64, optional, tag = "5")]
    pub enumeration_index: Option<u64>,
    /// Version 1 only; 32 bytes.
    #[prost(bytes = "vec", optional, tag = "6")]
    pub hashed_key: Option<Vec<u8>>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SnapshotStorageLogsChunk {
    #[prost(message, repeated, tag = "1")]
    pub storage_logs: Vec<SnapshotStorageLog>,
}
