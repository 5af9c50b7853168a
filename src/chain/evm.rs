//! EVM-family decoding helpers.
//!
//! Pure functions shared by every EVM-style adapter: ERC-20 `transfer`
//! calldata decoding, base-unit conversion at token decimals, and
//! case-insensitive hex address comparison.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// 4-byte selector of `transfer(address,uint256)`.
pub const TRANSFER_SELECTOR: &str = "a9059cbb";

/// Compare two hex addresses ignoring case (and an optional `0x` prefix).
#[must_use]
pub fn address_eq(a: &str, b: &str) -> bool {
    strip_0x(a).eq_ignore_ascii_case(strip_0x(b))
}

fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s)
}

/// Decode an ERC-20 `transfer(address,uint256)` call.
///
/// Returns the recipient (0x-prefixed, lowercase) and the raw amount in
/// base units, or `None` if the input is not a well-formed transfer call.
#[must_use]
pub fn decode_transfer_call(input: &str) -> Option<(String, u128)> {
    let data = strip_0x(input);
    if data.len() < 8 + 64 + 64 || !data[..8].eq_ignore_ascii_case(TRANSFER_SELECTOR) {
        return None;
    }

    // First argument: address, left-padded to 32 bytes.
    let to_word = &data[8..8 + 64];
    if !to_word[..24].chars().all(|c| c == '0') {
        return None;
    }
    let to = format!("0x{}", &to_word[24..].to_lowercase());

    // Second argument: uint256 amount. Reject values beyond u128.
    let amount_word = &data[8 + 64..8 + 128];
    let trimmed = amount_word.trim_start_matches('0');
    if trimmed.len() > 32 {
        return None;
    }
    let amount = if trimmed.is_empty() {
        0
    } else {
        u128::from_str_radix(trimmed, 16).ok()?
    };

    Some((to, amount))
}

/// Encode an ERC-20 `transfer(address,uint256)` call.
#[must_use]
pub fn encode_transfer_call(to: &str, raw_amount: u128) -> String {
    format!(
        "0x{TRANSFER_SELECTOR}{:0>64}{:0>64x}",
        strip_0x(to).to_lowercase(),
        raw_amount
    )
}

/// Convert a raw base-unit amount to display units at `decimals`.
///
/// Returns `None` if the value does not fit `Decimal`'s 96-bit mantissa.
#[must_use]
pub fn from_base_units(raw: u128, decimals: u32) -> Option<Decimal> {
    let mantissa = i128::try_from(raw).ok()?;
    Decimal::try_from_i128_with_scale(mantissa, decimals)
        .ok()
        .map(|d| d.normalize())
}

/// Convert a display-unit amount to raw base units at `decimals`.
///
/// Returns `None` if the amount has more fractional digits than
/// `decimals` or overflows.
#[must_use]
pub fn to_base_units(amount: Decimal, decimals: u32) -> Option<u128> {
    if amount.is_sign_negative() {
        return None;
    }
    let scaled = amount.checked_mul(Decimal::from(10u64.checked_pow(decimals)?))?;
    if scaled.fract() != Decimal::ZERO {
        return None;
    }
    scaled.trunc().to_u128()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const WALLET: &str = "0x742d35Cc6634C0532925a3b8D4C9db96590c0000";

    #[test]
    fn test_transfer_round_trip() {
        let raw = to_base_units(dec!(100.42), 18).expect("base units");
        let input = encode_transfer_call(WALLET, raw);

        let (to, amount) = decode_transfer_call(&input).expect("decode");
        assert!(address_eq(&to, WALLET));
        assert_eq!(amount, raw);
        assert_eq!(from_base_units(amount, 18), Some(dec!(100.42)));
    }

    #[test]
    fn test_decode_rejects_other_selectors() {
        // approve(address,uint256)
        let input = format!("0x095ea7b3{:0>64}{:0>64x}", "ab", 1u128);
        assert!(decode_transfer_call(&input).is_none());
    }

    #[test]
    fn test_decode_rejects_short_input() {
        assert!(decode_transfer_call("0xa9059cbb").is_none());
        assert!(decode_transfer_call("").is_none());
    }

    #[test]
    fn test_decode_zero_amount() {
        let input = encode_transfer_call(WALLET, 0);
        let (_, amount) = decode_transfer_call(&input).expect("decode");
        assert_eq!(amount, 0);
    }

    #[test]
    fn test_address_eq_ignores_case_and_prefix() {
        assert!(address_eq(WALLET, &WALLET.to_lowercase()));
        assert!(address_eq(&WALLET[2..], WALLET));
        assert!(!address_eq(WALLET, "0x0000000000000000000000000000000000000000"));
    }

    #[test]
    fn test_base_unit_conversions() {
        assert_eq!(to_base_units(dec!(1.5), 6), Some(1_500_000));
        assert_eq!(from_base_units(1_500_000, 6), Some(dec!(1.5)));

        // More fractional digits than the token carries.
        assert_eq!(to_base_units(dec!(0.0000001), 6), None);
        assert_eq!(to_base_units(dec!(-1), 6), None);
    }

    #[test]
    fn test_smallest_unit_is_distinguishable() {
        let exact = to_base_units(dec!(100.42), 6).expect("base units");
        let off_by_one = exact + 1;
        assert_ne!(
            from_base_units(exact, 6),
            from_base_units(off_by_one, 6)
        );
    }
}
