use jsonrpsee::{core::RpcResult, proc_macros::rpc};
use ola_types::{tokens::TokenInfo, MiniblockNumber};

/// Namespace used by external nodes to sync from the main node.
#[cfg_attr(
    all(feature = "client", feature = "server"),
    rpc(server, client, namespace = "en")
)]
#[cfg_attr(
    all(feature = "client", not(feature = "server")),
    rpc(client, namespace = "en")
)]
#[cfg_attr(
    all(not(feature = "client"), feature = "server"),
    rpc(server, namespace = "en")
)]
pub trait EnNamespace {
    /// Returns all tokens known at `block_number`, or at the latest block if it's not set.
    #[method(name = "syncTokens")]
    async fn sync_tokens(&self, block_number: Option<MiniblockNumber>)
        -> RpcResult<Vec<TokenInfo>>;
}
