//! Read aggregators: fixed sequences of contract reads reshaped into
//! view-models.
//!
//! Aggregators degrade per field instead of failing whole: a read that errors
//! is replaced by its zero default with a best-effort warning, so one bad
//! field never takes down the view. Nothing here retries; the poll schedule
//! in [`crate::cache`] is the only refresh mechanism.

mod affiliate;
mod bootstrap;
mod history;
mod portfolio;

pub use affiliate::{fetch_affiliate, referral_link, AffiliateView, REFERRAL_RATE_PERCENT};
pub use bootstrap::{
    can_participate, expected_reward, fetch_contributor, fetch_round, fetch_round_statistics,
    time_remaining, ContributorView, Round, RoundStatistics, TimeRemaining,
};
pub use history::{
    fetch_history, TokenKind, TransactionKind, TransactionRecord, HISTORY_BLOCK_SPAN,
};
pub use portfolio::{fetch_portfolio, PortfolioView, ADAPTATION_SCALE};

use alloy::primitives::U256;

/// Substitute a zero default for a failed field, with a warning.
pub(crate) fn or_default<T, E: std::fmt::Display>(
    result: Result<T, E>,
    what: &str,
    default: T,
) -> T {
    match result {
        Ok(value) => value,
        Err(error) => {
            eprintln!("warn: failed to fetch {what}: {error}");
            default
        }
    }
}

/// Narrow a U256 counter/timestamp field, saturating on overflow.
pub(crate) fn to_u64(value: U256) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}
