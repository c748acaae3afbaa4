//! Affiliate view: referral standing, commissions, and referred accounts.

use alloy::{
    primitives::{Address, U256},
    providers::Provider,
    rpc::types::Filter,
    sol_types::SolEvent,
};
use serde::{Deserialize, Serialize};

use super::{or_default, to_u64, HISTORY_BLOCK_SPAN};
use crate::{
    contracts::{CallMode, ContractService, IBootstrapBay, IMembership},
    error::ClientError,
    units::{format_units, NATIVE_DECIMALS},
};

/// Flat referral commission rate advertised by the platform.
pub const REFERRAL_RATE_PERCENT: u8 = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffiliateView {
    /// The account's own referral code (its address, as shared in links).
    pub referral_code: String,
    pub total_referrals: u64,
    pub total_commissions: String,
    pub claimable_commissions: String,
    pub referral_rate_percent: u8,
    /// Accounts that contributed with this account as referrer, from the
    /// scanned log window.
    pub referred_users: Vec<Address>,
    /// Commissions claimed inside the scanned log window.
    pub recent_commissions: String,
}

impl AffiliateView {
    fn zeroed(account: Address) -> Self {
        Self {
            referral_code: account.to_string(),
            total_referrals: 0,
            total_commissions: "0".to_string(),
            claimable_commissions: "0".to_string(),
            referral_rate_percent: REFERRAL_RATE_PERCENT,
            referred_users: Vec::new(),
            recent_commissions: "0".to_string(),
        }
    }
}

/// Shareable referral link for `account`.
pub fn referral_link(base_url: &str, account: Address) -> String {
    let sep = if base_url.contains('?') { '&' } else { '?' };
    format!("{base_url}{sep}ref={account}")
}

/// Aggregate the affiliate view for `account`.
pub async fn fetch_affiliate(
    service: &ContractService,
    account: Address,
) -> Result<AffiliateView, ClientError> {
    let membership = match service.membership(CallMode::Read) {
        Ok(membership) => membership,
        Err(error @ ClientError::NotConfigured { .. }) => {
            eprintln!("warn: {error}");
            return Ok(AffiliateView::zeroed(account));
        }
        Err(error) => return Err(error),
    };

    let zero_info = IMembership::MemberInfo {
        adaptation: U256::ZERO,
        referrer: Address::ZERO,
        totalEarnings: U256::ZERO,
        referralEarnings: U256::ZERO,
        referralCount: U256::ZERO,
        isActive: false,
        joinedAt: U256::ZERO,
    };
    let info = or_default(
        membership.getMemberInfo(account).call().await,
        "member info",
        zero_info,
    );
    let claimable = or_default(
        membership.getClaimableCommissions(account).call().await,
        "claimable commissions",
        U256::ZERO,
    );

    let (referred_users, recent_commissions) = scan_referral_logs(service, account).await;

    Ok(AffiliateView {
        referral_code: account.to_string(),
        total_referrals: to_u64(info.referralCount),
        total_commissions: format_units(info.referralEarnings, NATIVE_DECIMALS),
        claimable_commissions: format_units(claimable, NATIVE_DECIMALS),
        referral_rate_percent: REFERRAL_RATE_PERCENT,
        referred_users,
        recent_commissions: format_units(recent_commissions, NATIVE_DECIMALS),
    })
}

/// Best-effort scan of the recent log window: contributors referred by
/// `account` and commissions it claimed. Failures degrade to empty/zero.
async fn scan_referral_logs(service: &ContractService, account: Address) -> (Vec<Address>, U256) {
    let provider = service.public_provider();
    let latest = match provider.get_block_number().await {
        Ok(block) => block,
        Err(error) => {
            eprintln!("warn: failed to fetch block number for referral scan: {error}");
            return (Vec::new(), U256::ZERO);
        }
    };
    let from_block = latest.saturating_sub(HISTORY_BLOCK_SPAN);

    let mut referred = Vec::new();
    if let Ok(bay) = service.bootstrap_bay(CallMode::Read) {
        let filter = Filter::new()
            .address(*bay.address())
            .event_signature(IBootstrapBay::ContributionMade::SIGNATURE_HASH)
            .topic2(account.into_word())
            .from_block(from_block)
            .to_block(latest);
        let logs = or_default(provider.get_logs(&filter).await, "referred contributions", vec![]);
        for log in logs {
            if let Ok(event) = log.log_decode::<IBootstrapBay::ContributionMade>() {
                let contributor = event.inner.data.contributor;
                if !referred.contains(&contributor) {
                    referred.push(contributor);
                }
            }
        }
    }

    let mut claimed = U256::ZERO;
    if let Ok(membership) = service.membership(CallMode::Read) {
        let filter = Filter::new()
            .address(*membership.address())
            .event_signature(IMembership::CommissionClaimed::SIGNATURE_HASH)
            .topic1(account.into_word())
            .from_block(from_block)
            .to_block(latest);
        let logs = or_default(provider.get_logs(&filter).await, "claimed commissions", vec![]);
        for log in logs {
            if let Ok(event) = log.log_decode::<IMembership::CommissionClaimed>() {
                claimed = claimed.saturating_add(event.inner.data.amount);
            }
        }
    }

    (referred, claimed)
}
