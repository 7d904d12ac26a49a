//! EIP-1559 fee math for speed-up and cancellation replacements.
//!
//! Grounded on `TransactionTracker._calculate_speedup_fee` and
//! `_calculate_cancel_fee` in the reference implementation.

/// `new_tip = round(max(existing_tip, suggested_tip) * bump_factor)`
/// `new_max_fee = round(max(existing_max_fee * bump_factor, 2*base_fee + new_tip))`
pub fn speedup_fee(
    existing_tip: u128,
    existing_max_fee: u128,
    suggested_tip: u128,
    base_fee: u128,
    bump_factor: f64,
) -> (u128, u128) {
    let increased_tip = round_mul(existing_tip.max(suggested_tip), bump_factor);
    let bumped_max_fee = round_mul(existing_max_fee, bump_factor);
    let fee_floor = base_fee.saturating_mul(2).saturating_add(increased_tip);
    (increased_tip, bumped_max_fee.max(fee_floor))
}

/// `tip = suggested_tip * cancel_bump_factor`; `max_fee = 2*base_fee + tip`.
pub fn cancel_fee(suggested_tip: u128, base_fee: u128, cancel_bump_factor: f64) -> (u128, u128) {
    let tip = round_mul(suggested_tip, cancel_bump_factor);
    let max_fee = base_fee.saturating_mul(2).saturating_add(tip);
    (tip, max_fee)
}

fn round_mul(value: u128, factor: f64) -> u128 {
    ((value as f64) * factor).round() as u128
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speedup_bumps_tip_by_factor() {
        // S7: tip=8 gwei, chain suggests tip=9 gwei, factor 1.2 -> 11 gwei (rounded).
        let (tip, _) = speedup_fee(8_000_000_000, 20_000_000_000, 9_000_000_000, 5_000_000_000, 1.2);
        assert_eq!(tip, 10_800_000_000); // round(max(8,9)*1.2 gwei) = 10.8 gwei
    }

    #[test]
    fn speedup_max_fee_is_floor_of_two_paths() {
        let (tip, max_fee) = speedup_fee(8_000_000_000, 10_000_000_000, 9_000_000_000, 50_000_000_000, 1.2);
        // base_fee dominates: 2*50 + tip(10.8) = 110.8 gwei > 10*1.2=12 gwei
        assert!(max_fee > 100_000_000_000);
        assert_eq!(tip, 10_800_000_000);
    }

    #[test]
    fn cancel_fee_doubles_suggested_tip() {
        let (tip, max_fee) = cancel_fee(5_000_000_000, 10_000_000_000, 2.0);
        assert_eq!(tip, 10_000_000_000);
        assert_eq!(max_fee, 30_000_000_000);
    }
}
