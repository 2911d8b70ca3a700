//! Order-insensitive comparison of token lists.

use ola_types::tokens::TokenInfo;

use crate::errors::VerificationError;

/// Checks whether two token lists contain the same tokens, ignoring order.
///
/// Tokens are keyed by their L2 address; a list with two tokens sharing an L2 address
/// is malformed and results in [`VerificationError::DuplicateKey`].
pub fn compare_token_sets(
    lhs: &[TokenInfo],
    rhs: &[TokenInfo],
) -> Result<bool, VerificationError> {
    let lhs = sorted_by_l2_address(lhs)?;
    let rhs = sorted_by_l2_address(rhs)?;
    Ok(lhs == rhs)
}

fn sorted_by_l2_address(tokens: &[TokenInfo]) -> Result<Vec<&TokenInfo>, VerificationError> {
    let mut sorted: Vec<_> = tokens.iter().collect();
    sorted.sort_unstable_by_key(|token| token.l2_address);
    if let Some(pair) = sorted
        .windows(2)
        .find(|pair| pair[0].l2_address == pair[1].l2_address)
    {
        return Err(VerificationError::DuplicateKey(pair[0].l2_address));
    }
    Ok(sorted)
}
