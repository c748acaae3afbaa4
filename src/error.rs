use thiserror::Error;

use crate::config::ContractName;

/// Canonical error type exposed by the client layer.
///
/// Transport and contract failures coming out of the RPC stack are propagated
/// unchanged; retry, if any, is the caller's decision.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No address registered for the contract on the active chain.
    #[error("contract {name} not configured for chain {chain_id}; set {env_var}")]
    NotConfigured {
        name: ContractName,
        chain_id: u64,
        env_var: String,
    },

    /// A state-changing call was attempted without a connected wallet.
    #[error("no signer connected; {operation} requires a wallet key")]
    NoSigner { operation: &'static str },

    /// A configured or user-supplied address failed to parse.
    #[error("invalid address {value}: {reason}")]
    InvalidAddress { value: String, reason: String },

    /// A decimal amount string failed to parse into fixed-point units.
    #[error("invalid amount {value:?}: {reason}")]
    InvalidAmount { value: String, reason: String },

    /// A referral code failed the well-formedness check (42 chars, 0x prefix,
    /// hex body) and was not persisted.
    #[error("invalid referral code {0:?}")]
    InvalidReferral(String),

    /// Malformed wallet key material.
    #[error("invalid private key: {0}")]
    InvalidKey(String),

    /// Malformed RPC endpoint or capture URL.
    #[error("invalid url {value:?}: {reason}")]
    InvalidUrl { value: String, reason: String },

    /// Raw JSON-RPC transport failure, surfaced as-is.
    #[error("transport error: {0}")]
    Transport(#[from] alloy::transports::TransportError),

    /// Contract call failure (revert, ABI decode, gas estimation), surfaced
    /// as-is.
    #[error("contract error: {0}")]
    Contract(#[from] alloy::contract::Error),

    /// Referral store I/O failure.
    #[error("referral store error: {0}")]
    Store(#[from] std::io::Error),
}
