//! Bootstrap bay views: the active round, its statistics, and per-account
//! contribution state.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use super::{or_default, to_u64};
use crate::{
    contracts::{CallMode, ContractService},
    error::ClientError,
    units::{format_units, NATIVE_DECIMALS, VAI_DECIMALS},
};

/// The active time-boxed contribution campaign.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    /// Native-coin entry price.
    pub entry: String,
    /// Total native-coin pool size.
    pub pool: String,
    pub slots: u64,
    /// VAI reserve distributed proportionally at close.
    pub reserve: String,
    /// Unix deadline.
    pub deadline: u64,
    pub is_active: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundStatistics {
    pub contributions: String,
    pub contributors_count: u64,
    pub referral_bonuses: String,
    pub available_slots: u64,
    pub is_active: bool,
    pub rewards_calculated: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorView {
    pub contribution: String,
    pub referral_bonus: String,
    pub has_withdrawn: bool,
    pub referrer: Option<Address>,
    pub contributed_at: u64,
    /// Client-side estimate only; the contract-computed reward is
    /// authoritative at claim time.
    pub expected_reward: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRemaining {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
}

/// Fetch the currently active round.
pub async fn fetch_round(service: &ContractService) -> Result<Round, ClientError> {
    let bay = service.bootstrap_bay(CallMode::Read)?;
    let info = bay.getCurrentRound().call().await?;
    Ok(Round {
        entry: format_units(info.entry, NATIVE_DECIMALS),
        pool: format_units(info.pool, NATIVE_DECIMALS),
        slots: to_u64(info.slots),
        reserve: format_units(info.reserve, VAI_DECIMALS),
        deadline: to_u64(info.deadline),
        is_active: info.isActive,
    })
}

/// Fetch the live statistics of the active round.
pub async fn fetch_round_statistics(
    service: &ContractService,
) -> Result<RoundStatistics, ClientError> {
    let bay = service.bootstrap_bay(CallMode::Read)?;
    let stats = bay.getRoundStatistics().call().await?;
    Ok(RoundStatistics {
        contributions: format_units(stats.contributions, NATIVE_DECIMALS),
        contributors_count: to_u64(stats.contributorsCount),
        referral_bonuses: format_units(stats.referralBonuses, NATIVE_DECIMALS),
        available_slots: to_u64(stats.availableSlots),
        is_active: stats.isActive,
        rewards_calculated: stats.rewardsCalculated,
    })
}

/// Fetch the contribution state of `account` in the active round.
///
/// The expected reward is estimated from the round parameters; a failed round
/// read degrades the estimate to "0" without failing the view.
pub async fn fetch_contributor(
    service: &ContractService,
    account: Address,
) -> Result<ContributorView, ClientError> {
    let bay = service.bootstrap_bay(CallMode::Read)?;
    let info = bay.getContributorInfo(account).call().await?;
    let contribution = format_units(info.contribution, NATIVE_DECIMALS);

    let expected_reward = match fetch_round(service).await {
        Ok(round) => expected_reward(&round, &contribution),
        Err(error) => {
            eprintln!("warn: failed to fetch round for reward estimate: {error}");
            "0".to_string()
        }
    };

    Ok(ContributorView {
        referral_bonus: format_units(info.referralBonus, NATIVE_DECIMALS),
        has_withdrawn: info.hasWithdrawn,
        referrer: (info.referrer != Address::ZERO).then_some(info.referrer),
        contributed_at: to_u64(info.contributedAt),
        contribution,
        expected_reward,
    })
}

/// Estimate the VAI reward for `contribution`: `(contribution / pool) *
/// reserve`, rendered with two decimal places. Display-only.
pub fn expected_reward(round: &Round, contribution: &str) -> String {
    let contribution: f64 = contribution.parse().unwrap_or(0.0);
    let pool: f64 = round.pool.parse().unwrap_or(0.0);
    let reserve: f64 = round.reserve.parse().unwrap_or(0.0);
    if pool == 0.0 {
        return "0".to_string();
    }
    format!("{:.2}", contribution / pool * reserve)
}

/// Countdown to the round deadline, clamped at zero once passed.
pub fn time_remaining(deadline: u64, now: u64) -> TimeRemaining {
    let remaining = deadline.saturating_sub(now);
    TimeRemaining {
        days: remaining / 86_400,
        hours: (remaining % 86_400) / 3_600,
        minutes: (remaining % 3_600) / 60,
    }
}

/// Whether a new contribution can still enter the round.
pub fn can_participate(round: &Round, statistics: &RoundStatistics, now: u64) -> bool {
    round.is_active
        && now < round.deadline
        && statistics.available_slots > 0
        && !statistics.rewards_calculated
}
