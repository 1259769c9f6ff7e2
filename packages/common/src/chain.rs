use serde::Serialize;

/// Static metadata for an EVM chain tokens can be deployed to.
///
/// RPC endpoints are deployment configuration and live in the server config.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ChainInfo {
    pub id: u64,
    pub name: &'static str,
    /// Symbol of the native gas currency.
    pub native_symbol: &'static str,
    pub testnet: bool,
    /// Block explorer base URL used for links.
    pub explorer_url: &'static str,
    /// DexScreener chain slug, when the chain is indexed there.
    pub dexscreener_slug: Option<&'static str>,
}

pub const SUPPORTED_CHAINS: &[ChainInfo] = &[
    ChainInfo {
        id: 137,
        name: "Polygon",
        native_symbol: "POL",
        testnet: false,
        explorer_url: "https://polygonscan.com",
        dexscreener_slug: Some("polygon"),
    },
    ChainInfo {
        id: 80002,
        name: "Polygon Amoy",
        native_symbol: "POL",
        testnet: true,
        explorer_url: "https://amoy.polygonscan.com",
        dexscreener_slug: None,
    },
    ChainInfo {
        id: 1,
        name: "Ethereum",
        native_symbol: "ETH",
        testnet: false,
        explorer_url: "https://etherscan.io",
        dexscreener_slug: Some("ethereum"),
    },
    ChainInfo {
        id: 11155111,
        name: "Sepolia",
        native_symbol: "ETH",
        testnet: true,
        explorer_url: "https://sepolia.etherscan.io",
        dexscreener_slug: None,
    },
    ChainInfo {
        id: 8453,
        name: "Base",
        native_symbol: "ETH",
        testnet: false,
        explorer_url: "https://basescan.org",
        dexscreener_slug: Some("base"),
    },
    ChainInfo {
        id: 56,
        name: "BNB Smart Chain",
        native_symbol: "BNB",
        testnet: false,
        explorer_url: "https://bscscan.com",
        dexscreener_slug: Some("bsc"),
    },
];

/// Look up a supported chain by id.
pub fn find(chain_id: u64) -> Option<&'static ChainInfo> {
    SUPPORTED_CHAINS.iter().find(|c| c.id == chain_id)
}

impl ChainInfo {
    pub fn address_url(&self, address: &str) -> String {
        format!("{}/address/{}", self.explorer_url, address)
    }

    pub fn tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url, tx_hash)
    }
}
