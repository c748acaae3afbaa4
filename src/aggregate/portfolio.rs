//! Portfolio view: balances, membership state, and earnings for one account.

use alloy::primitives::{Address, U256};
use alloy::providers::Provider;
use serde::{Deserialize, Serialize};

use super::{or_default, to_u64};
use crate::{
    contracts::{CallMode, ContractService, IMembership},
    error::ClientError,
    units::{format_units, NATIVE_DECIMALS, VAI_DECIMALS},
};

/// Upper bound of the adaptation score maintained by the membership contract.
pub const ADAPTATION_SCALE: u32 = 10_000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioView {
    pub vai_balance: String,
    pub native_balance: String,
    pub total_earnings: String,
    pub referral_earnings: String,
    pub claimable_commissions: String,
    pub membership_status: bool,
    /// Bounded 0..=10000.
    pub adaptation_score: u32,
    pub referral_count: u64,
    pub joined_at: u64,
    pub referrer: Option<Address>,
}

impl PortfolioView {
    /// The uniform "not yet a member" rendering: populated, all zeroes.
    pub fn zeroed() -> Self {
        Self {
            vai_balance: "0".to_string(),
            native_balance: "0".to_string(),
            total_earnings: "0".to_string(),
            referral_earnings: "0".to_string(),
            claimable_commissions: "0".to_string(),
            membership_status: false,
            adaptation_score: 0,
            referral_count: 0,
            joined_at: 0,
            referrer: None,
        }
    }
}

fn zero_member_info() -> IMembership::MemberInfo {
    IMembership::MemberInfo {
        adaptation: U256::ZERO,
        referrer: Address::ZERO,
        totalEarnings: U256::ZERO,
        referralEarnings: U256::ZERO,
        referralCount: U256::ZERO,
        isActive: false,
        joinedAt: U256::ZERO,
    }
}

/// Aggregate the portfolio view for `account`.
///
/// Missing contract configuration degrades to the zeroed view (the rest of
/// the platform stays usable); individual failed reads degrade per field.
/// A non-member gets the zeroed member fields, never an error.
pub async fn fetch_portfolio(
    service: &ContractService,
    account: Address,
) -> Result<PortfolioView, ClientError> {
    let (token, membership) = match (
        service.vai_token(CallMode::Read),
        service.membership(CallMode::Read),
    ) {
        (Ok(token), Ok(membership)) => (token, membership),
        (token, membership) => {
            if let Err(error) = token {
                eprintln!("warn: {error}");
            }
            if let Err(error) = membership {
                eprintln!("warn: {error}");
            }
            return Ok(PortfolioView::zeroed());
        }
    };

    let native_balance = or_default(
        service.public_provider().get_balance(account).await,
        "native balance",
        U256::ZERO,
    );
    let vai_balance = or_default(
        token.balanceOf(account).call().await,
        "VAI balance",
        U256::ZERO,
    );
    let is_member = or_default(
        membership.isMember(account).call().await,
        "membership status",
        false,
    );

    let mut info = zero_member_info();
    let mut claimable = U256::ZERO;
    if is_member {
        info = or_default(
            membership.getMemberInfo(account).call().await,
            "member info",
            zero_member_info(),
        );
        claimable = or_default(
            membership.getClaimableCommissions(account).call().await,
            "claimable commissions",
            U256::ZERO,
        );
    }

    Ok(PortfolioView {
        vai_balance: format_units(vai_balance, VAI_DECIMALS),
        native_balance: format_units(native_balance, NATIVE_DECIMALS),
        total_earnings: format_units(info.totalEarnings, NATIVE_DECIMALS),
        referral_earnings: format_units(info.referralEarnings, NATIVE_DECIMALS),
        claimable_commissions: format_units(claimable, NATIVE_DECIMALS),
        membership_status: is_member,
        adaptation_score: to_u64(info.adaptation).min(ADAPTATION_SCALE as u64) as u32,
        referral_count: to_u64(info.referralCount),
        joined_at: to_u64(info.joinedAt),
        referrer: (info.referrer != Address::ZERO).then_some(info.referrer),
    })
}
