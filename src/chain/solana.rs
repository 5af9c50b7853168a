//! Account-model (Solana-style) decoding helpers.
//!
//! On account-model chains the transferred value is not carried in call
//! arguments; it is recovered from the pre/post balance snapshots the
//! chain attaches to a transaction.

use rust_decimal::Decimal;

/// Lamports per SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Native currency decimals.
pub const NATIVE_DECIMALS: u32 = 9;

/// Token balance of one account at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenBalanceSnapshot {
    /// Owner of the token account.
    pub owner: String,
    /// Token mint address.
    pub mint: String,
    /// Balance in display units.
    pub amount: Decimal,
}

/// Net native balance change of an account, in display units.
///
/// Positive means the account received funds.
#[must_use]
pub fn native_delta(pre_lamports: u64, post_lamports: u64) -> Decimal {
    let delta = i128::from(post_lamports) - i128::from(pre_lamports);
    Decimal::from_i128_with_scale(delta, NATIVE_DECIMALS).normalize()
}

/// Net token balance change for `(owner, mint)` across two snapshots.
///
/// Accounts absent from a snapshot are treated as zero balance, matching
/// chains that omit untouched or newly created token accounts.
#[must_use]
pub fn token_delta(
    pre: &[TokenBalanceSnapshot],
    post: &[TokenBalanceSnapshot],
    owner: &str,
    mint: &str,
) -> Decimal {
    let balance_in = |snapshots: &[TokenBalanceSnapshot]| {
        snapshots
            .iter()
            .find(|b| b.owner == owner && b.mint == mint)
            .map_or(Decimal::ZERO, |b| b.amount)
    };

    (balance_in(post) - balance_in(pre)).normalize()
}
