//! Transaction history reconstructed from recent contract event logs.

use std::collections::HashMap;

use alloy::{
    primitives::{Address, B256, U256},
    providers::Provider,
    rpc::types::Filter,
    sol_types::SolEvent,
};
use serde::{Deserialize, Serialize};

use super::or_default;
use crate::{
    contracts::{CallMode, ContractService, IBootstrapBay, IMembership, IVaiToken},
    error::ClientError,
    units::{format_units, NATIVE_DECIMALS, VAI_DECIMALS},
};

/// How far back the log scan reaches.
pub const HISTORY_BLOCK_SPAN: u64 = 10_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    TokenSent,
    TokenReceived,
    CommissionClaim,
    BootstrapContribute,
    BootstrapClaim,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Vai,
    Native,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub hash: B256,
    pub kind: TransactionKind,
    pub amount: String,
    pub token: TokenKind,
    pub timestamp: u64,
    pub from: Option<Address>,
    pub to: Option<Address>,
}

/// Scan recent logs of the three contracts for activity of `account`,
/// newest first, truncated to `limit` records.
///
/// Missing contract configuration yields an empty history; individual log
/// categories degrade independently.
pub async fn fetch_history(
    service: &ContractService,
    account: Address,
    limit: usize,
) -> Result<Vec<TransactionRecord>, ClientError> {
    let provider = service.public_provider();
    let latest = provider.get_block_number().await?;
    let from_block = latest.saturating_sub(HISTORY_BLOCK_SPAN);

    let mut records = Vec::new();
    let mut timestamps = BlockTimestamps::default();

    if let Ok(token) = service.vai_token(CallMode::Read) {
        let base = Filter::new()
            .address(*token.address())
            .event_signature(IVaiToken::Transfer::SIGNATURE_HASH)
            .from_block(from_block)
            .to_block(latest);
        let sent = or_default(
            provider.get_logs(&base.clone().topic1(account.into_word())).await,
            "sent transfers",
            vec![],
        );
        let received = or_default(
            provider.get_logs(&base.topic2(account.into_word())).await,
            "received transfers",
            vec![],
        );
        for log in sent.into_iter().chain(received) {
            let Ok(event) = log.log_decode::<IVaiToken::Transfer>() else {
                continue;
            };
            let transfer = &event.inner.data;
            let kind = if transfer.from == account {
                TransactionKind::TokenSent
            } else {
                TransactionKind::TokenReceived
            };
            records.push(TransactionRecord {
                hash: log.transaction_hash.unwrap_or_default(),
                kind,
                amount: format_units(transfer.value, VAI_DECIMALS),
                token: TokenKind::Vai,
                timestamp: timestamps.resolve(provider, log.block_hash).await,
                from: Some(transfer.from),
                to: Some(transfer.to),
            });
        }
    }

    if let Ok(membership) = service.membership(CallMode::Read) {
        let filter = Filter::new()
            .address(*membership.address())
            .event_signature(IMembership::CommissionClaimed::SIGNATURE_HASH)
            .topic1(account.into_word())
            .from_block(from_block)
            .to_block(latest);
        let logs = or_default(provider.get_logs(&filter).await, "commission claims", vec![]);
        for log in logs {
            let Ok(event) = log.log_decode::<IMembership::CommissionClaimed>() else {
                continue;
            };
            records.push(TransactionRecord {
                hash: log.transaction_hash.unwrap_or_default(),
                kind: TransactionKind::CommissionClaim,
                amount: format_units(event.inner.data.amount, NATIVE_DECIMALS),
                token: TokenKind::Native,
                timestamp: timestamps.resolve(provider, log.block_hash).await,
                from: None,
                to: None,
            });
        }
    }

    if let Ok(bay) = service.bootstrap_bay(CallMode::Read) {
        let base = Filter::new()
            .address(*bay.address())
            .topic1(account.into_word())
            .from_block(from_block)
            .to_block(latest);
        let contributions = or_default(
            provider
                .get_logs(
                    &base
                        .clone()
                        .event_signature(IBootstrapBay::ContributionMade::SIGNATURE_HASH),
                )
                .await,
            "bootstrap contributions",
            vec![],
        );
        for log in contributions {
            let Ok(event) = log.log_decode::<IBootstrapBay::ContributionMade>() else {
                continue;
            };
            records.push(TransactionRecord {
                hash: log.transaction_hash.unwrap_or_default(),
                kind: TransactionKind::BootstrapContribute,
                amount: format_units(event.inner.data.amount, NATIVE_DECIMALS),
                token: TokenKind::Native,
                timestamp: timestamps.resolve(provider, log.block_hash).await,
                from: None,
                to: None,
            });
        }

        let claims = or_default(
            provider
                .get_logs(&base.event_signature(IBootstrapBay::RewardClaimed::SIGNATURE_HASH))
                .await,
            "bootstrap reward claims",
            vec![],
        );
        for log in claims {
            let Ok(event) = log.log_decode::<IBootstrapBay::RewardClaimed>() else {
                continue;
            };
            let claimed = &event.inner.data;
            let timestamp = timestamps.resolve(provider, log.block_hash).await;
            let hash = log.transaction_hash.unwrap_or_default();
            // One claim can pay out in both the native coin and VAI.
            if claimed.bnbAmount > U256::ZERO {
                records.push(TransactionRecord {
                    hash,
                    kind: TransactionKind::BootstrapClaim,
                    amount: format_units(claimed.bnbAmount, NATIVE_DECIMALS),
                    token: TokenKind::Native,
                    timestamp,
                    from: None,
                    to: None,
                });
            }
            if claimed.vaiAmount > U256::ZERO {
                records.push(TransactionRecord {
                    hash,
                    kind: TransactionKind::BootstrapClaim,
                    amount: format_units(claimed.vaiAmount, VAI_DECIMALS),
                    token: TokenKind::Vai,
                    timestamp,
                    from: None,
                    to: None,
                });
            }
        }
    }

    Ok(newest_first(records, limit))
}

/// Per-scan cache of block-hash → timestamp lookups.
#[derive(Default)]
struct BlockTimestamps {
    cache: HashMap<B256, u64>,
}

impl BlockTimestamps {
    async fn resolve<P: Provider>(&mut self, provider: &P, block_hash: Option<B256>) -> u64 {
        let Some(hash) = block_hash else { return 0 };
        if let Some(&timestamp) = self.cache.get(&hash) {
            return timestamp;
        }
        let timestamp = match provider.get_block_by_hash(hash).await {
            Ok(Some(block)) => block.header.timestamp,
            Ok(None) => 0,
            Err(error) => {
                eprintln!("warn: failed to fetch block {hash}: {error}");
                0
            }
        };
        self.cache.insert(hash, timestamp);
        timestamp
    }
}

fn newest_first(mut records: Vec<TransactionRecord>, limit: usize) -> Vec<TransactionRecord> {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    records.truncate(limit);
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(timestamp: u64) -> TransactionRecord {
        TransactionRecord {
            hash: B256::ZERO,
            kind: TransactionKind::TokenSent,
            amount: "1".to_string(),
            token: TokenKind::Vai,
            timestamp,
            from: None,
            to: None,
        }
    }

    #[test]
    fn history_is_newest_first_and_bounded() {
        let records = vec![record(10), record(30), record(20), record(40)];
        let sorted = newest_first(records, 3);
        let stamps: Vec<u64> = sorted.iter().map(|r| r.timestamp).collect();
        assert_eq!(stamps, vec![40, 30, 20]);
    }
}
