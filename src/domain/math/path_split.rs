//! Golden-ratio distribution of an amount across path legs
//!
//! Earlier legs receive the larger shares: three legs split evenly, four
//! legs decay by φ ≈ 0.618034 per position and five legs by φ² ≈ 0.381966.
//! The last leg absorbs the rounding remainder so the shares always sum to
//! the total exactly.

use primitive_types::{U256, U512};

use crate::shared::errors::SwapError;
use crate::shared::types::PRECISION;

/// φ ≈ 0.618034 at `PRECISION` scale
pub const PHI: u64 = 618_034;

/// φ² ≈ 0.381966 at `PRECISION` scale
pub const PHI_SQUARED: u64 = 381_966;

fn decay_factor(path_length: usize) -> Result<u64, SwapError> {
    match path_length {
        3 => Ok(PRECISION),
        4 => Ok(PHI),
        5 => Ok(PHI_SQUARED),
        _ => Err(SwapError::InvalidPath),
    }
}

/// Per-position weights at `PRECISION` scale: `PRECISION · decayⁱ`
fn weights(path_length: usize) -> Result<Vec<u64>, SwapError> {
    let decay = decay_factor(path_length)?;
    let mut weights = Vec::with_capacity(path_length);
    let mut current = PRECISION;
    for _ in 0..path_length {
        weights.push(current);
        current = current * decay / PRECISION;
    }
    Ok(weights)
}

fn share(total: U256, weight: u64, weight_sum: u64) -> U256 {
    let scaled = total.full_mul(U256::from(weight)) / U512::from(weight_sum);
    // weight <= weight_sum, so the share never exceeds the total
    U256::try_from(scaled).unwrap_or(total)
}

/// Amount assigned to `position` when `total` is spread over
/// `path_length` legs. Only 3, 4 and 5 legs are supported; shorter paths
/// use the full input amount.
pub fn optimal_amount(total: U256, path_length: usize, position: usize) -> Result<U256, SwapError> {
    let weights = weights(path_length)?;
    if position >= path_length {
        return Err(SwapError::InvalidArrayLength);
    }

    let weight_sum: u64 = weights.iter().sum();
    if position + 1 < path_length {
        return Ok(share(total, weights[position], weight_sum));
    }

    let allotted = weights[..path_length - 1]
        .iter()
        .fold(U256::zero(), |acc, w| acc + share(total, *w, weight_sum));
    Ok(total - allotted)
}

/// Full leg plan for a total: golden-ratio shares for 3-5 legs, the whole
/// amount as a single entry for 1-2 legs.
pub fn split_amount(total: U256, legs: usize) -> Result<Vec<U256>, SwapError> {
    match legs {
        1 | 2 => Ok(vec![total]),
        3..=5 => (0..legs).map(|i| optimal_amount(total, legs, i)).collect(),
        _ => Err(SwapError::InvalidPath),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_equal_thirds() {
        let total = U256::from(100u64);
        let shares: Vec<U256> = (0..3).map(|i| optimal_amount(total, 3, i).unwrap()).collect();
        assert_eq!(shares, vec![U256::from(33u64), U256::from(33u64), U256::from(34u64)]);
    }

    #[test]
    fn test_golden_decay_four_legs() {
        let total = U256::from(1_000_000u64);
        let shares: Vec<U256> = (0..4).map(|i| optimal_amount(total, 4, i).unwrap()).collect();
        assert!(shares[0] > shares[1] && shares[1] > shares[2] && shares[2] > shares[3]);
        // weights 1e6, 618034, 381966, 236067 -> first share ~ 44.7%
        assert_eq!(shares[0], U256::from(447_213u64));
    }

    #[test]
    fn test_five_legs_decay_faster() {
        let total = U256::from(1_000_000u64);
        let four = optimal_amount(total, 4, 0).unwrap();
        let five = optimal_amount(total, 5, 0).unwrap();
        assert!(five > four);
    }

    #[test]
    fn test_rejects_unsupported_lengths() {
        assert_eq!(optimal_amount(U256::from(10u64), 2, 0), Err(SwapError::InvalidPath));
        assert_eq!(optimal_amount(U256::from(10u64), 6, 0), Err(SwapError::InvalidPath));
        assert_eq!(optimal_amount(U256::from(10u64), 3, 3), Err(SwapError::InvalidArrayLength));
    }

    #[test]
    fn test_split_amount_short_paths_use_full_amount() {
        let total = U256::from(500u64);
        assert_eq!(split_amount(total, 2).unwrap(), vec![total]);
        assert_eq!(split_amount(total, 4).unwrap().len(), 4);
        assert!(split_amount(total, 0).is_err());
    }

    proptest! {
        #[test]
        fn prop_split_sums_to_total(hi in any::<u128>(), lo in any::<u128>(), n in 3usize..=5) {
            let total = (U256::from(hi) << 128) | U256::from(lo);
            let sum = (0..n).fold(U256::zero(), |acc, i| acc + optimal_amount(total, n, i).unwrap());
            prop_assert_eq!(sum, total);
        }
    }
}
