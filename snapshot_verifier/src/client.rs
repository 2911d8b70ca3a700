//! [`NodeApi`] implementation backed by a JSON-RPC HTTP client.

use anyhow::Context as _;
use async_trait::async_trait;
use ola_types::{
    snapshots::{AllSnapshots, SnapshotHeader},
    tokens::TokenInfo,
    Address, L1BatchNumber, MiniblockNumber, H256, U256, U64,
};
use ola_web3_decl::{
    jsonrpsee::http_client::{HttpClient, HttpClientBuilder},
    namespaces::{
        EnNamespaceClient, EthNamespaceClient, OlaNamespaceClient, SnapshotsNamespaceClient,
    },
};

use crate::node::NodeApi;

#[derive(Debug, Clone)]
pub struct NodeClient {
    name: &'static str,
    client: HttpClient,
}

impl NodeClient {
    pub fn http(name: &'static str, url: &str) -> anyhow::Result<Self> {
        let client = HttpClientBuilder::default()
            .build(url)
            .with_context(|| format!("failed building JSON-RPC client for {name} at {url}"))?;
        Ok(Self { name, client })
    }
}

fn narrow_u32(value: U64, what: &str) -> anyhow::Result<u32> {
    u32::try_from(value.as_u64()).with_context(|| format!("{what} {value} does not fit into u32"))
}

#[async_trait]
impl NodeApi for NodeClient {
    async fn all_snapshots(&self) -> anyhow::Result<AllSnapshots> {
        self.client
            .get_all_snapshots()
            .await
            .with_context(|| format!("snapshots_getAllSnapshots on {}", self.name))
    }

    async fn snapshot(
        &self,
        l1_batch_number: L1BatchNumber,
    ) -> anyhow::Result<Option<SnapshotHeader>> {
        self.client
            .get_snapshot_by_l1_batch_number(l1_batch_number)
            .await
            .with_context(|| format!("snapshots_getSnapshot({l1_batch_number}) on {}", self.name))
    }

    async fn storage_value(
        &self,
        address: Address,
        key: H256,
        miniblock_number: MiniblockNumber,
    ) -> anyhow::Result<H256> {
        let idx = U256::from_big_endian(key.as_bytes());
        self.client
            .get_storage_at(address, idx, Some(miniblock_number.into()))
            .await
            .with_context(|| format!("eth_getStorageAt({address:?}, {key:?}) on {}", self.name))
    }

    async fn sync_tokens(
        &self,
        miniblock_number: Option<MiniblockNumber>,
    ) -> anyhow::Result<Vec<TokenInfo>> {
        self.client
            .sync_tokens(miniblock_number)
            .await
            .with_context(|| format!("en_syncTokens on {}", self.name))
    }

    async fn block_number(&self) -> anyhow::Result<MiniblockNumber> {
        let number = self
            .client
            .get_block_number()
            .await
            .with_context(|| format!("eth_blockNumber on {}", self.name))?;
        narrow_u32(number, "miniblock number").map(MiniblockNumber)
    }

    async fn l1_batch_number(&self) -> anyhow::Result<L1BatchNumber> {
        let number = self
            .client
            .get_l1_batch_number()
            .await
            .with_context(|| format!("ola_L1BatchNumber on {}", self.name))?;
        narrow_u32(number, "L1 batch number").map(L1BatchNumber)
    }
}
