/*
[INPUT]:  Environment variables (network selector, credentials)
[OUTPUT]: Validated adapter configuration with resolved endpoint sets
[POS]:    Configuration layer - single place env is read
[UPDATE]: When adding networks, endpoints, or credential sources
*/

use std::fmt;
use std::str::FromStr;

use crate::http::{PorticoError, Result};

/// Recognized network selectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Testnet,
    Mainnet,
}

/// Endpoint set resolved from a network selector
#[derive(Debug, Clone, Copy)]
pub struct NetworkConfig {
    pub api_base_url: &'static str,
    pub prover_url: &'static str,
    pub rpc_url: &'static str,
    pub chain_id: &'static str,
}

const TESTNET: NetworkConfig = NetworkConfig {
    api_base_url: "https://api.testnet.portico.market",
    prover_url: "https://prover.testnet.portico.market/v1",
    rpc_url: "https://fullnode.testnet.sui.io:443",
    chain_id: "sui:testnet",
};

const MAINNET: NetworkConfig = NetworkConfig {
    api_base_url: "https://api.portico.market",
    prover_url: "https://prover.portico.market/v1",
    rpc_url: "https://fullnode.mainnet.sui.io:443",
    chain_id: "sui:mainnet",
};

impl Network {
    /// Resolve the endpoint set for this network
    pub fn config(self) -> NetworkConfig {
        match self {
            Network::Testnet => TESTNET,
            Network::Mainnet => MAINNET,
        }
    }
}

impl FromStr for Network {
    type Err = PorticoError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "testnet" => Ok(Network::Testnet),
            "mainnet" => Ok(Network::Mainnet),
            other => Err(PorticoError::Config(format!(
                "unrecognized network {other:?}; expected \"testnet\" or \"mainnet\""
            ))),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Testnet => write!(f, "testnet"),
            Network::Mainnet => write!(f, "mainnet"),
        }
    }
}

/// Which login strategy the configured credentials select
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStrategy<'a> {
    /// Raw-key signature login with the configured private key
    DirectKey { private_key: &'a str },
    /// Browser-based OAuth + zero-knowledge-proof login
    ZkLogin { client_id: &'a str },
}

/// Validated adapter configuration.
///
/// Read from the environment exactly once at startup; everything downstream
/// takes this struct by reference.
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    pub network: Network,
    wallet_key: Option<String>,
    google_client_id: Option<String>,
}

impl AdapterConfig {
    /// Build and validate a configuration from explicit values.
    ///
    /// At least one credential must be present; with both set, the direct
    /// key wins since it needs no human in a browser.
    pub fn new(
        network: Network,
        wallet_key: Option<String>,
        google_client_id: Option<String>,
    ) -> Result<Self> {
        let wallet_key = wallet_key.filter(|value| !value.trim().is_empty());
        let google_client_id = google_client_id.filter(|value| !value.trim().is_empty());

        if wallet_key.is_none() && google_client_id.is_none() {
            return Err(PorticoError::Config(
                "no credentials configured: set PORTICO_WALLET_KEY for direct-key login \
                 or PORTICO_GOOGLE_CLIENT_ID for zkLogin"
                    .to_string(),
            ));
        }

        Ok(Self {
            network,
            wallet_key,
            google_client_id,
        })
    }

    /// Load configuration from the environment.
    ///
    /// `PORTICO_NETWORK` selects the network (default: testnet);
    /// `PORTICO_WALLET_KEY` / `PORTICO_GOOGLE_CLIENT_ID` select the login
    /// strategy. A missing network defaults, an unrecognized one fails.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(
            std::env::var("PORTICO_NETWORK").ok(),
            std::env::var("PORTICO_WALLET_KEY").ok(),
            std::env::var("PORTICO_GOOGLE_CLIENT_ID").ok(),
        )
    }

    fn from_vars(
        network: Option<String>,
        wallet_key: Option<String>,
        google_client_id: Option<String>,
    ) -> Result<Self> {
        let network = match network {
            Some(value) => value.parse()?,
            None => Network::Testnet,
        };
        Self::new(network, wallet_key, google_client_id)
    }

    /// The login strategy selected by the configured credentials
    pub fn login_strategy(&self) -> LoginStrategy<'_> {
        if let Some(key) = &self.wallet_key {
            LoginStrategy::DirectKey { private_key: key }
        } else {
            LoginStrategy::ZkLogin {
                client_id: self
                    .google_client_id
                    .as_deref()
                    .unwrap_or_default(),
            }
        }
    }

    /// Resolved endpoint set for the configured network
    pub fn network_config(&self) -> NetworkConfig {
        self.network.config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case("testnet", Network::Testnet)]
    #[case("MAINNET", Network::Mainnet)]
    #[case(" testnet ", Network::Testnet)]
    fn test_network_from_str(#[case] input: &str, #[case] expected: Network) {
        assert_eq!(input.parse::<Network>().unwrap(), expected);
    }

    #[test]
    fn test_network_from_str_rejects_unknown() {
        let err = "devnet".parse::<Network>().unwrap_err();
        match err {
            PorticoError::Config(msg) => assert!(msg.contains("devnet")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_credentials_is_fatal() {
        let err = AdapterConfig::from_vars(Some("testnet".to_string()), None, None).unwrap_err();
        assert!(err.is_terminal());
    }

    #[test]
    fn test_blank_credentials_count_as_missing() {
        let err = AdapterConfig::from_vars(
            None,
            Some("  ".to_string()),
            Some(String::new()),
        )
        .unwrap_err();
        assert!(matches!(err, PorticoError::Config(_)));
    }

    #[test]
    fn test_direct_key_takes_precedence() {
        let config = AdapterConfig::new(
            Network::Testnet,
            Some("secret".to_string()),
            Some("client-1".to_string()),
        )
        .unwrap();

        match config.login_strategy() {
            LoginStrategy::DirectKey { private_key } => assert_eq!(private_key, "secret"),
            other => panic!("unexpected strategy: {other:?}"),
        }
    }

    #[test]
    fn test_zklogin_strategy_when_only_client_id() {
        let config =
            AdapterConfig::new(Network::Mainnet, None, Some("client-1".to_string())).unwrap();

        match config.login_strategy() {
            LoginStrategy::ZkLogin { client_id } => assert_eq!(client_id, "client-1"),
            other => panic!("unexpected strategy: {other:?}"),
        }
    }

    #[test]
    fn test_network_defaults_to_testnet() {
        let config =
            AdapterConfig::from_vars(None, Some("secret".to_string()), None).unwrap();
        assert_eq!(config.network, Network::Testnet);
        assert_eq!(
            config.network_config().api_base_url,
            "https://api.testnet.portico.market"
        );
    }
}
