use ola_basic_types::Address;
use serde::{Deserialize, Serialize};

/// Token as returned by `en_syncTokens`. `l1_address` is zero for tokens
/// that have no L1 counterpart.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub l1_address: Address,
    pub l2_address: Address,
    pub metadata: TokenMetadata,
}

impl TokenInfo {
    /// Token without L1 counterpart and with empty metadata.
    pub fn l2_only(l2_address: Address) -> Self {
        Self {
            l1_address: Address::zero(),
            l2_address,
            metadata: TokenMetadata::default(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TokenMetadata {
    /// Token name (e.g. "Ethereum" or "USD Coin")
    pub name: String,
    /// Token symbol (e.g. "ETH" or "USDC")
    pub symbol: String,
    /// Token precision (e.g. 18 for "ETH" so "1.0" ETH = 10e18 as U256 number)
    pub decimals: u8,
}
