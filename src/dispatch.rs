//! Write dispatchers: single-purpose wrappers around the state-changing
//! contract calls.
//!
//! Every dispatcher checks for a signer, resolves the target contract, submits
//! exactly one call, and returns the transaction hash as soon as the node
//! accepts it. Waiting for confirmation is the caller's business. After a
//! successful send the cached reads for the sender are invalidated so the
//! next snapshot reflects the pending change instead of waiting a poll tick.

use alloy::primitives::{Address, B256};

use crate::{
    cache::QueryCache,
    contracts::{CallMode, ContractService},
    error::ClientError,
    units::{parse_units, NATIVE_DECIMALS, VAI_DECIMALS},
};

/// Dispatch surface bound to a contract service and an optional query cache.
pub struct Dispatch<'a> {
    service: &'a ContractService,
    cache: Option<&'a QueryCache>,
}

impl<'a> Dispatch<'a> {
    pub fn new(service: &'a ContractService) -> Self {
        Self { service, cache: None }
    }

    /// Invalidate `cache` after every successful send.
    pub fn with_cache(service: &'a ContractService, cache: &'a QueryCache) -> Self {
        Self { service, cache: Some(cache) }
    }

    fn invalidate(&self) {
        if let (Some(cache), Some(sender)) = (self.cache, self.service.signer_address()) {
            cache.invalidate_account(sender);
        }
    }

    /// Join the membership, optionally crediting a referrer. The zero address
    /// counts as no referrer.
    pub async fn join(&self, referrer: Option<Address>) -> Result<B256, ClientError> {
        let membership = self.service.membership(CallMode::Sign)?;
        let pending = match referrer.filter(|r| *r != Address::ZERO) {
            Some(referrer) => membership.join_1(referrer).send().await?,
            None => membership.join_0().send().await?,
        };
        self.invalidate();
        Ok(*pending.tx_hash())
    }

    /// Claim accrued referral commissions.
    pub async fn claim_commissions(&self) -> Result<B256, ClientError> {
        let membership = self.service.membership(CallMode::Sign)?;
        let pending = membership.claimCommissions().send().await?;
        self.invalidate();
        Ok(*pending.tx_hash())
    }

    /// Contribute `amount` (native-coin decimal string) to the active round.
    pub async fn contribute(&self, amount: &str) -> Result<B256, ClientError> {
        let value = parse_units(amount, NATIVE_DECIMALS)?;
        let bay = self.service.bootstrap_bay(CallMode::Sign)?;
        let pending = bay.contribute().value(value).send().await?;
        self.invalidate();
        Ok(*pending.tx_hash())
    }

    /// Claim the bootstrap round rewards.
    pub async fn claim_rewards(&self) -> Result<B256, ClientError> {
        let bay = self.service.bootstrap_bay(CallMode::Sign)?;
        let pending = bay.claimRewards().send().await?;
        self.invalidate();
        Ok(*pending.tx_hash())
    }

    /// Transfer VAI (decimal string) to another account.
    pub async fn transfer(&self, to: Address, amount: &str) -> Result<B256, ClientError> {
        let value = parse_units(amount, VAI_DECIMALS)?;
        let token = self.service.vai_token(CallMode::Sign)?;
        let pending = token.transfer(to, value).send().await?;
        self.invalidate();
        Ok(*pending.tx_hash())
    }

    /// Approve a spender for VAI (decimal string).
    pub async fn approve(&self, spender: Address, amount: &str) -> Result<B256, ClientError> {
        let value = parse_units(amount, VAI_DECIMALS)?;
        let token = self.service.vai_token(CallMode::Sign)?;
        let pending = token.approve(spender, value).send().await?;
        self.invalidate();
        Ok(*pending.tx_hash())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cache::{QueryKey, SnapshotCell},
        rpc,
    };
    use std::sync::Arc;

    // Well-known anvil dev key #0.
    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn signerless_service(chain_id: u64) -> ContractService {
        let provider = rpc::connect_offline("http://127.0.0.1:8545").unwrap();
        ContractService::new(chain_id, provider)
    }

    fn wallet_service(chain_id: u64, endpoint: &str) -> (ContractService, Address) {
        let provider = rpc::connect_offline(endpoint).unwrap();
        let (wallet, sender) = rpc::connect_with_key(endpoint, KEY).unwrap();
        (
            ContractService::new(chain_id, provider).with_wallet(wallet, sender),
            sender,
        )
    }

    #[tokio::test]
    async fn dispatch_without_signer_fails_before_transport() {
        std::env::set_var(
            "MEMBERSHIP_ADDRESS_904001",
            "0x00000000000000000000000000000000000000dd",
        );
        std::env::set_var(
            "BOOTSTRAP_BAY_ADDRESS_904001",
            "0x00000000000000000000000000000000000000ee",
        );
        std::env::set_var(
            "VAI_TOKEN_ADDRESS_904001",
            "0x00000000000000000000000000000000000000ff",
        );
        let service = signerless_service(904_001);
        let dispatch = Dispatch::new(&service);

        assert!(matches!(
            dispatch.join(None).await,
            Err(ClientError::NoSigner { .. })
        ));
        assert!(matches!(
            dispatch.claim_commissions().await,
            Err(ClientError::NoSigner { .. })
        ));
        assert!(matches!(
            dispatch.contribute("0.1").await,
            Err(ClientError::NoSigner { .. })
        ));
        assert!(matches!(
            dispatch.claim_rewards().await,
            Err(ClientError::NoSigner { .. })
        ));
        assert!(matches!(
            dispatch.transfer(Address::repeat_byte(0x01), "1").await,
            Err(ClientError::NoSigner { .. })
        ));
        assert!(matches!(
            dispatch.approve(Address::repeat_byte(0x02), "1").await,
            Err(ClientError::NoSigner { .. })
        ));
    }

    #[tokio::test]
    async fn dispatch_on_unconfigured_chain_is_not_configured() {
        let service = signerless_service(904_002);
        assert!(matches!(
            Dispatch::new(&service).join(None).await,
            Err(ClientError::NotConfigured { .. })
        ));
    }

    #[test]
    fn invalidation_after_send_hits_sender_and_global_cells() {
        let (service, sender) = wallet_service(904_004, "http://127.0.0.1:8545");
        let cache = QueryCache::new();
        let portfolio = Arc::new(SnapshotCell::<u32>::new());
        let round = Arc::new(SnapshotCell::<u32>::new());
        let other = Arc::new(SnapshotCell::<u32>::new());
        cache.register(QueryKey::new("portfolio", Some(sender), 904_004), portfolio.clone());
        cache.register(QueryKey::new("round_statistics", None, 904_004), round.clone());
        cache.register(
            QueryKey::new("portfolio", Some(Address::repeat_byte(0x04)), 904_004),
            other.clone(),
        );

        Dispatch::with_cache(&service, &cache).invalidate();
        assert!(portfolio.snapshot().stale);
        assert!(round.snapshot().stale);
        assert!(!other.snapshot().stale);

        // Without a connected signer there is no sender to invalidate for.
        let fresh = Arc::new(SnapshotCell::<u32>::new());
        cache.register(QueryKey::new("history", None, 904_004), fresh.clone());
        Dispatch::with_cache(&signerless_service(904_004), &cache).invalidate();
        assert!(!fresh.snapshot().stale);
    }

    #[tokio::test]
    async fn failed_send_leaves_cached_reads_fresh() {
        std::env::set_var(
            "MEMBERSHIP_ADDRESS_904005",
            "0x0000000000000000000000000000000000000011",
        );
        // Port 9 (discard) refuses the connection, so the send fails.
        let (service, sender) = wallet_service(904_005, "http://127.0.0.1:9");
        let cache = QueryCache::new();
        let cell = Arc::new(SnapshotCell::<u32>::new());
        cache.register(QueryKey::new("portfolio", Some(sender), 904_005), cell.clone());

        let dispatch = Dispatch::with_cache(&service, &cache);
        assert!(dispatch.claim_commissions().await.is_err());
        assert!(!cell.snapshot().stale);
    }

    #[tokio::test]
    async fn malformed_amount_is_rejected_before_any_resolution() {
        std::env::set_var(
            "VAI_TOKEN_ADDRESS_904003",
            "0x00000000000000000000000000000000000000aa",
        );
        let service = signerless_service(904_003);
        assert!(matches!(
            Dispatch::new(&service)
                .transfer(Address::repeat_byte(0x03), "1,5")
                .await,
            Err(ClientError::InvalidAmount { .. })
        ));
    }
}
