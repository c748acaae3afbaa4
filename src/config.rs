//! Per-chain contract address configuration.
//!
//! Addresses come from the environment: `<VAR>_<CHAIN_ID>` first, then the
//! unsuffixed `<VAR>` as a fallback. Lookups re-read the environment on every
//! call so address changes take effect without a restart.

use std::{env, fmt, str::FromStr};

use alloy::primitives::Address;

use crate::error::ClientError;

/// Logical names of the three platform contracts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContractName {
    VaiToken,
    Membership,
    BootstrapBay,
}

impl ContractName {
    /// Base environment variable holding the contract address.
    pub fn env_var(&self) -> &'static str {
        match self {
            ContractName::VaiToken => "VAI_TOKEN_ADDRESS",
            ContractName::Membership => "MEMBERSHIP_ADDRESS",
            ContractName::BootstrapBay => "BOOTSTRAP_BAY_ADDRESS",
        }
    }
}

impl fmt::Display for ContractName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContractName::VaiToken => "VAI token",
            ContractName::Membership => "membership",
            ContractName::BootstrapBay => "bootstrap bay",
        };
        f.write_str(name)
    }
}

/// Resolve the address of `name` on `chain_id`.
///
/// Fails with [`ClientError::NotConfigured`] when neither the chain-suffixed
/// nor the plain variable is set; no request ever goes over the transport for
/// an unconfigured contract.
pub fn contract_address(chain_id: u64, name: ContractName) -> Result<Address, ClientError> {
    let suffixed = format!("{}_{}", name.env_var(), chain_id);
    let (var, raw) = match env::var(&suffixed) {
        Ok(value) if !value.is_empty() => (suffixed, value),
        _ => match env::var(name.env_var()) {
            Ok(value) if !value.is_empty() => (name.env_var().to_string(), value),
            _ => {
                return Err(ClientError::NotConfigured {
                    name,
                    chain_id,
                    env_var: suffixed,
                })
            }
        },
    };
    Address::from_str(raw.trim()).map_err(|e| ClientError::InvalidAddress {
        value: format!("{var}={raw}"),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test uses its own fake chain id and only chain-suffixed variables,
    // so parallel tests cannot race on shared env keys.

    #[test]
    fn missing_address_is_not_configured() {
        let err = contract_address(901_001, ContractName::BootstrapBay).unwrap_err();
        match err {
            ClientError::NotConfigured { name, chain_id, env_var } => {
                assert_eq!(name, ContractName::BootstrapBay);
                assert_eq!(chain_id, 901_001);
                assert_eq!(env_var, "BOOTSTRAP_BAY_ADDRESS_901001");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn chain_suffixed_address_resolves() {
        env::set_var(
            "VAI_TOKEN_ADDRESS_901002",
            "0x00000000000000000000000000000000000000aa",
        );
        let addr = contract_address(901_002, ContractName::VaiToken).unwrap();
        assert_eq!(
            addr,
            Address::from_str("0x00000000000000000000000000000000000000aa").unwrap()
        );
    }

    #[test]
    fn malformed_address_is_rejected() {
        env::set_var("MEMBERSHIP_ADDRESS_901003", "not-an-address");
        let err = contract_address(901_003, ContractName::Membership).unwrap_err();
        assert!(matches!(err, ClientError::InvalidAddress { .. }));
    }

    #[test]
    fn environment_changes_take_effect_between_calls() {
        env::set_var(
            "MEMBERSHIP_ADDRESS_901004",
            "0x00000000000000000000000000000000000000bb",
        );
        contract_address(901_004, ContractName::Membership).unwrap();
        env::remove_var("MEMBERSHIP_ADDRESS_901004");
        assert!(contract_address(901_004, ContractName::Membership).is_err());
    }
}
