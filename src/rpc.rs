//! Provider construction over JSON-RPC HTTP endpoints.

use std::str::FromStr;

use alloy::{
    network::EthereumWallet,
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
};
use url::Url;

use crate::error::ClientError;

fn parse_endpoint(rpc_url: &str) -> Result<Url, ClientError> {
    Url::parse(rpc_url).map_err(|e| ClientError::InvalidUrl {
        value: rpc_url.to_string(),
        reason: e.to_string(),
    })
}

/// Build a read-only provider without touching the network.
///
/// No request is sent until a call is awaited, which keeps configuration and
/// signer checks testable offline.
pub fn connect_offline(rpc_url: &str) -> Result<DynProvider, ClientError> {
    let url = parse_endpoint(rpc_url)?;
    Ok(ProviderBuilder::new().connect_http(url).erased())
}

/// Connect a shared read provider and discover the chain id from the node.
pub async fn connect(rpc_url: &str) -> Result<(DynProvider, u64), ClientError> {
    let provider = connect_offline(rpc_url)?;
    let chain_id = provider.get_chain_id().await?;
    Ok((provider, chain_id))
}

/// Build a wallet-backed provider for signing calls.
///
/// Returns the provider together with the signer's address.
pub fn connect_with_key(
    rpc_url: &str,
    private_key: &str,
) -> Result<(DynProvider, Address), ClientError> {
    let url = parse_endpoint(rpc_url)?;
    let signer = PrivateKeySigner::from_str(private_key.trim())
        .map_err(|e| ClientError::InvalidKey(e.to_string()))?;
    let address = signer.address();
    let wallet = EthereumWallet::from(signer);
    let provider = ProviderBuilder::new()
        .wallet(wallet)
        .connect_http(url)
        .erased();
    Ok((provider, address))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_endpoint() {
        assert!(matches!(
            connect_offline("not a url"),
            Err(ClientError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn rejects_malformed_private_key() {
        assert!(matches!(
            connect_with_key("http://127.0.0.1:8545", "0xzz"),
            Err(ClientError::InvalidKey(_))
        ));
    }

    #[test]
    fn wallet_provider_reports_signer_address() {
        // Well-known anvil dev key #0.
        let key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
        let (_, address) = connect_with_key("http://127.0.0.1:8545", key).unwrap();
        assert_eq!(
            address,
            Address::from_str("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").unwrap()
        );
    }
}
