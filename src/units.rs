//! Fixed-point unit conversion between raw on-chain integers and decimal
//! strings.
//!
//! The on-chain side always deals in the smallest unit; the human side in
//! decimal strings. Formatting trims trailing zeros but never drops
//! significant digits, so `parse_units(format_units(v, d), d) == v` holds for
//! every representable value.

use alloy::primitives::U256;

use crate::error::ClientError;

/// VAI token decimals.
pub const VAI_DECIMALS: u8 = 9;
/// Native coin decimals.
pub const NATIVE_DECIMALS: u8 = 18;

/// Render a raw fixed-point integer as a decimal string.
pub fn format_units(value: U256, decimals: u8) -> String {
    if decimals == 0 {
        return value.to_string();
    }
    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = value / divisor;
    let remainder = value % divisor;
    if remainder.is_zero() {
        return whole.to_string();
    }
    let frac = format!("{remainder:0>width$}", width = decimals as usize);
    let frac = frac.trim_end_matches('0');
    format!("{whole}.{frac}")
}

/// Parse a decimal string into a raw fixed-point integer.
///
/// Rejects empty input, non-digit characters, more fractional digits than
/// `decimals`, and values that overflow 256 bits.
pub fn parse_units(text: &str, decimals: u8) -> Result<U256, ClientError> {
    let invalid = |reason: &str| ClientError::InvalidAmount {
        value: text.to_string(),
        reason: reason.to_string(),
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(invalid("empty amount"));
    }
    let mut parts = text.splitn(2, '.');
    let whole_str = parts.next().unwrap_or("");
    let frac_str = parts.next().unwrap_or("");
    if whole_str.is_empty() && frac_str.is_empty() {
        return Err(invalid("no digits"));
    }
    if !whole_str.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("non-digit in integer part"));
    }
    if !frac_str.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("non-digit in fractional part"));
    }
    if frac_str.len() > decimals as usize {
        return Err(invalid("more fractional digits than the token supports"));
    }

    let scale = U256::from(10u64).pow(U256::from(decimals));
    let whole = if whole_str.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(whole_str, 10).map_err(|_| invalid("integer part out of range"))?
    };
    // Right-pad the fraction to `decimals` digits before parsing.
    let frac = if frac_str.is_empty() {
        U256::ZERO
    } else {
        let padded = format!("{frac_str:0<width$}", width = decimals as usize);
        U256::from_str_radix(&padded, 10).map_err(|_| invalid("fractional part out of range"))?
    };

    whole
        .checked_mul(scale)
        .and_then(|scaled| scaled.checked_add(frac))
        .ok_or_else(|| invalid("amount overflows 256 bits"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_whole_and_fractional_values() {
        assert_eq!(format_units(U256::from(1_000_000_000u64), VAI_DECIMALS), "1");
        assert_eq!(format_units(U256::from(1_500_000_000u64), VAI_DECIMALS), "1.5");
        assert_eq!(format_units(U256::from(1u64), VAI_DECIMALS), "0.000000001");
        assert_eq!(format_units(U256::ZERO, VAI_DECIMALS), "0");
        assert_eq!(format_units(U256::from(42u64), 0), "42");
    }

    #[test]
    fn parse_accepts_plain_and_fractional_amounts() {
        assert_eq!(
            parse_units("0.1", NATIVE_DECIMALS).unwrap(),
            U256::from(100_000_000_000_000_000u128)
        );
        assert_eq!(parse_units("1", VAI_DECIMALS).unwrap(), U256::from(1_000_000_000u64));
        assert_eq!(parse_units(".5", VAI_DECIMALS).unwrap(), U256::from(500_000_000u64));
    }

    #[test]
    fn parse_rejects_malformed_input() {
        assert!(parse_units("", VAI_DECIMALS).is_err());
        assert!(parse_units(".", VAI_DECIMALS).is_err());
        assert!(parse_units("1,5", VAI_DECIMALS).is_err());
        assert!(parse_units("-1", VAI_DECIMALS).is_err());
        assert!(parse_units("0.0000000001", VAI_DECIMALS).is_err());
    }

    #[test]
    fn format_then_parse_round_trips() {
        for raw in [0u128, 1, 999, 1_000_000_000, 123_456_789_012_345, u64::MAX as u128] {
            let value = U256::from(raw);
            let text = format_units(value, VAI_DECIMALS);
            assert_eq!(parse_units(&text, VAI_DECIMALS).unwrap(), value, "raw={raw}");
        }
    }
}
