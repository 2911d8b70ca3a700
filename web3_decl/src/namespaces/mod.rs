pub mod en;
pub mod eth;
pub mod ola;
pub mod snapshots;

#[cfg(feature = "client")]
pub use self::{
    en::EnNamespaceClient, eth::EthNamespaceClient, ola::OlaNamespaceClient,
    snapshots::SnapshotsNamespaceClient,
};
#[cfg(feature = "server")]
pub use self::{
    en::EnNamespaceServer, eth::EthNamespaceServer, ola::OlaNamespaceServer,
    snapshots::SnapshotsNamespaceServer,
};
