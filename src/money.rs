//! Monetary arithmetic shared by the quote rollup, production and finance ledgers.
//!
//! Every stored amount carries two fractional digits. Rounding uses
//! `Decimal::round_dp`, which rounds half to even.

use rust_decimal::Decimal;
use serde::Serialize;

/// Fractional digits kept on every stored amount.
pub const MONEY_SCALE: u32 = 2;

pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp(MONEY_SCALE)
}

/// `quantity × unit_price`, rounded.
pub fn line_total(quantity: Decimal, unit_price: Decimal) -> Decimal {
    round_money(quantity * unit_price)
}

/// Sum of a phase's line totals.
pub fn phase_amount<I>(line_totals: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    round_money(line_totals.into_iter().sum())
}

/// Amount payable after a discount; never negative.
pub fn final_amount(total: Decimal, discount: Decimal) -> Decimal {
    round_money((total - discount).max(Decimal::ZERO))
}

/// Production value before the discount: `base × multiplier`.
pub fn gross_value(base: Decimal, multiplier: Decimal) -> Decimal {
    round_money(base * multiplier)
}

/// Share of a discount assigned to one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscountShare {
    pub phase_id: i32,
    pub share: Decimal,
}

/// Splits `discount` across phases in ascending `sort_order` (ties keep input order).
///
/// Every phase but the last gets `round(discount / n)`; the last absorbs the
/// remainder so the shares add back up to the discount. Shares are clamped at zero.
pub fn prorate_discount(discount: Decimal, phases: &[(i32, i32)]) -> Vec<DiscountShare> {
    if phases.is_empty() {
        return Vec::new();
    }

    let mut ordered: Vec<(i32, i32)> = phases.to_vec();
    ordered.sort_by_key(|&(_, order)| order);

    let count = Decimal::from(ordered.len() as u64);
    let base_share = round_money(discount / count);
    let last = ordered.len() - 1;

    let mut accumulated = Decimal::ZERO;
    ordered
        .iter()
        .enumerate()
        .map(|(idx, &(phase_id, _))| {
            let share = if idx == last {
                round_money(discount - accumulated)
            } else {
                base_share
            };
            accumulated += share;
            DiscountShare {
                phase_id,
                share: share.max(Decimal::ZERO),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn line_total_rounds_to_cents() {
        assert_eq!(line_total(dec!(2.5), dec!(10.333)), dec!(25.83));
    }

    #[test]
    fn final_amount_never_negative() {
        assert_eq!(final_amount(dec!(100), dec!(150)), dec!(0));
        assert_eq!(final_amount(dec!(100), dec!(10.5)), dec!(89.50));
    }

    #[test]
    fn prorates_one_hundred_over_three_phases() {
        let shares = prorate_discount(dec!(100), &[(11, 1), (12, 2), (13, 3)]);
        let values: Vec<Decimal> = shares.iter().map(|s| s.share).collect();
        assert_eq!(values, vec![dec!(33.33), dec!(33.33), dec!(33.34)]);
        assert_eq!(shares[2].phase_id, 13);
    }

    #[test]
    fn proration_follows_sort_order_not_input_order() {
        let shares = prorate_discount(dec!(10), &[(1, 3), (2, 1), (3, 2)]);
        let ids: Vec<i32> = shares.iter().map(|s| s.phase_id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(shares[2].share, dec!(3.34));
    }

    #[test]
    fn proration_ties_keep_input_order() {
        let shares = prorate_discount(dec!(1), &[(5, 1), (4, 1)]);
        let ids: Vec<i32> = shares.iter().map(|s| s.phase_id).collect();
        assert_eq!(ids, vec![5, 4]);
    }

    #[test]
    fn proration_of_nothing_is_empty() {
        assert!(prorate_discount(dec!(50), &[]).is_empty());
    }

    #[test]
    fn single_phase_takes_everything() {
        let shares = prorate_discount(dec!(12.34), &[(9, 4)]);
        assert_eq!(shares, vec![DiscountShare { phase_id: 9, share: dec!(12.34) }]);
    }
}
