use jsonrpsee::{core::RpcResult, proc_macros::rpc};
use ola_types::{api::BlockNumber, Address, H256, U256, U64};

#[cfg_attr(
    all(feature = "client", feature = "server"),
    rpc(server, client, namespace = "eth")
)]
#[cfg_attr(
    all(feature = "client", not(feature = "server")),
    rpc(client, namespace = "eth")
)]
#[cfg_attr(
    all(not(feature = "client"), feature = "server"),
    rpc(server, namespace = "eth")
)]
pub trait EthNamespace {
    #[method(name = "blockNumber")]
    async fn get_block_number(&self) -> RpcResult<U64>;

    #[method(name = "getStorageAt")]
    async fn get_storage_at(
        &self,
        address: Address,
        idx: U256,
        block: Option<BlockNumber>,
    ) -> RpcResult<H256>;
}
