//! Referral capture: pick a referral code out of a shared link, keep it in
//! local state across sessions, and hand it to the join flow.
//!
//! The capture is a two-state machine (`NoCode` / `CodeHeld`). Only
//! address-shaped codes — exactly 42 characters, `0x` prefix, hex body — are
//! ever persisted. How long a held code survives is a policy decision, not a
//! hardcoded behavior.

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ClientError;

/// Query parameter carrying a referral code in shared links.
pub const REFERRAL_QUERY_PARAM: &str = "ref";

/// File name of the stored code under the state directory.
const STORE_FILE: &str = "referral.json";

/// Lifetime of a captured code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExpiryPolicy {
    /// Survives until an explicit clear.
    KeepUntilCleared,
    /// Cleared once a join consumes it.
    ConsumeOnJoin,
    /// Dropped after the given window.
    ExpireAfter(Duration),
}

/// Current capture state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureState {
    NoCode,
    CodeHeld(Address),
}

#[derive(Serialize, Deserialize)]
struct StoredReferral {
    code: String,
    captured_at: u64,
}

/// True iff `code` looks like a chain address: 42 chars, `0x`, hex body.
pub fn is_address_shaped(code: &str) -> bool {
    code.len() == 42
        && code.starts_with("0x")
        && hex::decode(&code[2..]).map(|b| b.len() == 20).unwrap_or(false)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// File-backed referral code store.
pub struct ReferralCapture {
    path: PathBuf,
    policy: ExpiryPolicy,
}

impl ReferralCapture {
    pub fn new(state_dir: impl AsRef<Path>, policy: ExpiryPolicy) -> Self {
        Self {
            path: state_dir.as_ref().join(STORE_FILE),
            policy,
        }
    }

    pub fn policy(&self) -> ExpiryPolicy {
        self.policy
    }

    /// Inspect a visited URL for a `ref` parameter.
    ///
    /// A well-formed code is persisted (idempotently) and the returned URL has
    /// the parameter stripped — a cosmetic cleanup for re-display. A missing
    /// or malformed parameter leaves the stored state untouched and returns
    /// the URL unchanged.
    pub fn capture_from_url(&self, visited: &str) -> Result<(CaptureState, String), ClientError> {
        let mut url = Url::parse(visited).map_err(|e| ClientError::InvalidUrl {
            value: visited.to_string(),
            reason: e.to_string(),
        })?;

        let code = url
            .query_pairs()
            .find(|(key, _)| key == REFERRAL_QUERY_PARAM)
            .map(|(_, value)| value.into_owned());

        let Some(code) = code else {
            return Ok((self.state(), visited.to_string()));
        };
        if !is_address_shaped(&code) {
            return Ok((self.state(), visited.to_string()));
        }

        self.persist(&code)?;

        let retained: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != REFERRAL_QUERY_PARAM)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        if retained.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(retained).finish();
        }

        Ok((self.state(), url.to_string()))
    }

    /// Store a code entered by hand. Malformed codes are rejected and never
    /// persisted.
    pub fn set_manual(&self, code: &str) -> Result<CaptureState, ClientError> {
        if !is_address_shaped(code) {
            return Err(ClientError::InvalidReferral(code.to_string()));
        }
        self.persist(code)?;
        Ok(self.state())
    }

    /// Current state, applying the expiry policy to anything read back.
    pub fn state(&self) -> CaptureState {
        let Some(stored) = self.read_store() else {
            return CaptureState::NoCode;
        };
        if let ExpiryPolicy::ExpireAfter(window) = self.policy {
            if unix_now().saturating_sub(stored.captured_at) > window.as_secs() {
                self.clear();
                return CaptureState::NoCode;
            }
        }
        match Address::from_str(&stored.code) {
            Ok(address) => CaptureState::CodeHeld(address),
            // A corrupt store file behaves like no code at all.
            Err(_) => CaptureState::NoCode,
        }
    }

    /// The referrer to pass to a join call, if one is held.
    ///
    /// The zero address never counts as a referrer.
    pub fn referrer_for_join(&self) -> Option<Address> {
        match self.state() {
            CaptureState::CodeHeld(address) if address != Address::ZERO => Some(address),
            _ => None,
        }
    }

    /// Called after a join succeeded; under `ConsumeOnJoin` the held code is
    /// dropped, other policies leave it in place.
    pub fn on_join_complete(&self) {
        if self.policy == ExpiryPolicy::ConsumeOnJoin {
            self.clear();
        }
    }

    /// Explicit user-driven clear.
    pub fn clear(&self) {
        // Best effort; a missing file already means NoCode.
        let _ = fs::remove_file(&self.path);
    }

    fn persist(&self, code: &str) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let stored = StoredReferral {
            code: code.to_string(),
            captured_at: unix_now(),
        };
        let json = serde_json::to_vec_pretty(&stored).expect("referral store encode");
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn read_store(&self) -> Option<StoredReferral> {
        // A missing file is the normal NoCode case; only corruption is worth
        // a warning.
        let bytes = fs::read(&self.path).ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(stored) => Some(stored),
            Err(error) => {
                eprintln!(
                    "warn: unreadable referral store {}: {error}",
                    self.path.display()
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    static DIR_SEQ: AtomicU64 = AtomicU64::new(0);

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "vai-referral-test-{}-{}",
            std::process::id(),
            DIR_SEQ.fetch_add(1, Ordering::SeqCst)
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    const CODE: &str = "0x1111111111111111111111111111111111111111";

    #[test]
    fn address_shape_check() {
        assert!(is_address_shaped(CODE));
        assert!(!is_address_shaped("0x1111"));
        assert!(!is_address_shaped(&CODE[2..]));
        assert!(!is_address_shaped("0xgg11111111111111111111111111111111111111"));
    }

    #[test]
    fn capture_persists_and_strips_parameter() {
        let capture = ReferralCapture::new(scratch_dir(), ExpiryPolicy::KeepUntilCleared);
        let (state, cleaned) = capture
            .capture_from_url(&format!("https://app.example.com/?ref={CODE}&tab=bootstrap"))
            .unwrap();
        assert_eq!(state, CaptureState::CodeHeld(Address::from_str(CODE).unwrap()));
        assert!(!cleaned.contains("ref="));
        assert!(cleaned.contains("tab=bootstrap"));
    }

    #[test]
    fn capture_is_idempotent() {
        let dir = scratch_dir();
        let capture = ReferralCapture::new(&dir, ExpiryPolicy::KeepUntilCleared);
        let url = format!("https://app.example.com/?ref={CODE}");
        let (first, _) = capture.capture_from_url(&url).unwrap();
        let (second, _) = capture.capture_from_url(&url).unwrap();
        assert_eq!(first, second);
        // Exactly one stored value, identical both times.
        let stored: StoredReferral =
            serde_json::from_slice(&fs::read(dir.join(STORE_FILE)).unwrap()).unwrap();
        assert_eq!(stored.code, CODE);
    }

    #[test]
    fn malformed_code_is_never_persisted() {
        let dir = scratch_dir();
        let capture = ReferralCapture::new(&dir, ExpiryPolicy::KeepUntilCleared);
        let (state, unchanged) = capture
            .capture_from_url("https://app.example.com/?ref=0x1234")
            .unwrap();
        assert_eq!(state, CaptureState::NoCode);
        assert!(unchanged.contains("ref=0x1234"));
        assert!(!dir.join(STORE_FILE).exists());
        assert!(capture.set_manual("12345").is_err());
        assert!(!dir.join(STORE_FILE).exists());
    }

    #[test]
    fn held_code_survives_a_new_session() {
        let dir = scratch_dir();
        ReferralCapture::new(&dir, ExpiryPolicy::KeepUntilCleared)
            .set_manual(CODE)
            .unwrap();
        let fresh = ReferralCapture::new(&dir, ExpiryPolicy::KeepUntilCleared);
        assert_eq!(
            fresh.state(),
            CaptureState::CodeHeld(Address::from_str(CODE).unwrap())
        );
    }

    #[test]
    fn clear_returns_to_no_code() {
        let capture = ReferralCapture::new(scratch_dir(), ExpiryPolicy::KeepUntilCleared);
        capture.set_manual(CODE).unwrap();
        capture.clear();
        assert_eq!(capture.state(), CaptureState::NoCode);
    }

    #[test]
    fn consume_on_join_drops_the_code_after_join() {
        let capture = ReferralCapture::new(scratch_dir(), ExpiryPolicy::ConsumeOnJoin);
        capture.set_manual(CODE).unwrap();
        assert!(capture.referrer_for_join().is_some());
        capture.on_join_complete();
        assert_eq!(capture.state(), CaptureState::NoCode);
    }

    #[test]
    fn keep_until_cleared_survives_join() {
        let capture = ReferralCapture::new(scratch_dir(), ExpiryPolicy::KeepUntilCleared);
        capture.set_manual(CODE).unwrap();
        capture.on_join_complete();
        assert!(capture.referrer_for_join().is_some());
    }

    #[test]
    fn expired_code_reads_back_as_no_code() {
        let dir = scratch_dir();
        let capture = ReferralCapture::new(&dir, ExpiryPolicy::ExpireAfter(Duration::from_secs(60)));
        // Write a store entry captured well outside the window.
        let stale = StoredReferral {
            code: CODE.to_string(),
            captured_at: unix_now() - 3_600,
        };
        fs::write(dir.join(STORE_FILE), serde_json::to_vec(&stale).unwrap()).unwrap();
        assert_eq!(capture.state(), CaptureState::NoCode);
        assert!(!dir.join(STORE_FILE).exists());
    }

    #[test]
    fn corrupt_store_file_degrades_to_no_code() {
        let dir = scratch_dir();
        fs::write(dir.join(STORE_FILE), b"{not json").unwrap();
        let capture = ReferralCapture::new(&dir, ExpiryPolicy::KeepUntilCleared);
        assert_eq!(capture.state(), CaptureState::NoCode);
        assert_eq!(capture.referrer_for_join(), None);
    }

    #[test]
    fn zero_address_is_not_a_referrer() {
        let capture = ReferralCapture::new(scratch_dir(), ExpiryPolicy::KeepUntilCleared);
        capture
            .set_manual("0x0000000000000000000000000000000000000000")
            .unwrap();
        assert_eq!(capture.referrer_for_join(), None);
    }
}
