use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::schedule::{amortizing_payment, monthly_rate, months_for_years};
use crate::error::SellerFinanceError;
use crate::time_value;
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Rate};
use crate::SellerFinanceResult;

/// Loan to be cut short by a balloon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalloonInput {
    pub principal: Money,
    pub annual_rate_pct: Percent,
    pub term_years: u32,
    pub balloon_years: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalloonOutput {
    /// Fully-amortizing payment over the whole term
    pub monthly_payment: Money,
    /// Scheduled payments left unpaid when the balloon falls due
    pub remaining_months: u32,
    /// Balance owed at the balloon month
    pub remaining_balance: Money,
}

/// Balance outstanding after `balloon_years` of a level-payment loan.
///
/// Values the `n - b` payments still owed at the same monthly rate, so it
/// agrees with reading the balance off the iterated schedule at month `b`.
/// A balloon at or after maturity leaves nothing owed.
pub fn remaining_balance_at_balloon(
    principal: Money,
    annual_rate_pct: Percent,
    term_years: u32,
    balloon_years: u32,
) -> SellerFinanceResult<Money> {
    let total_months = months_for_years("term_years", term_years)?;
    let balloon_months = months_for_years("balloon_years", balloon_years)?;
    if balloon_months >= total_months {
        return Ok(Decimal::ZERO);
    }

    let rate = monthly_rate(annual_rate_pct);
    let payment = amortizing_payment(principal, rate, total_months)?;
    outstanding_balance(payment, rate, total_months - balloon_months)
}

/// Present value of `remaining_months` level payments at `rate` per month.
pub fn outstanding_balance(
    monthly_payment: Money,
    rate: Rate,
    remaining_months: u32,
) -> SellerFinanceResult<Money> {
    time_value::pv(rate, remaining_months, -monthly_payment, Decimal::ZERO)
}

/// Standalone balloon valuation with the usual output envelope.
pub fn balloon_balance(input: &BalloonInput) -> SellerFinanceResult<ComputationOutput<BalloonOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.principal < Decimal::ZERO {
        return Err(SellerFinanceError::invalid(
            "principal",
            "Principal cannot be negative",
        ));
    }
    if input.annual_rate_pct < Decimal::ZERO || input.annual_rate_pct > Decimal::ONE_HUNDRED {
        return Err(SellerFinanceError::invalid(
            "annual_rate_pct",
            "Interest rate must be between 0% and 100%",
        ));
    }
    if input.term_years == 0 {
        return Err(SellerFinanceError::invalid(
            "term_years",
            "Loan term must be at least 1 year",
        ));
    }
    if input.balloon_years >= input.term_years {
        warnings.push("Balloon at or after maturity; nothing remains owed".into());
    }

    let total_months = months_for_years("term_years", input.term_years)?;
    let balloon_months = months_for_years("balloon_years", input.balloon_years)?;
    let monthly_payment = amortizing_payment(
        input.principal,
        monthly_rate(input.annual_rate_pct),
        total_months,
    )?;
    let remaining_balance = remaining_balance_at_balloon(
        input.principal,
        input.annual_rate_pct,
        input.term_years,
        input.balloon_years,
    )?;

    let output = BalloonOutput {
        monthly_payment,
        remaining_months: total_months.saturating_sub(balloon_months),
        remaining_balance,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Balloon Remaining Balance (closed-form present value)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::schedule::{compute_amortization, LoanSpec};
    use rust_decimal_macros::dec;

    #[test]
    fn test_matches_iterated_schedule() {
        let spec = LoanSpec {
            sale_price: dec!(400000),
            down_payment_pct: dec!(10),
            annual_rate_pct: dec!(5),
            term_years: 30,
            balloon_years: Some(5),
            interest_only_years: None,
        };
        let schedule = compute_amortization(&spec).unwrap().result;
        let closed = remaining_balance_at_balloon(dec!(360000), dec!(5), 30, 5).unwrap();

        assert!((closed - schedule.balloon_amount).abs() < dec!(0.0001));
        // ~330,583 still owed after 5 years on 360k at 5%
        assert!((closed - dec!(330583.44)).abs() < dec!(1));
    }

    #[test]
    fn test_zero_horizon_is_full_principal() {
        let closed = remaining_balance_at_balloon(dec!(250000), dec!(6), 30, 0).unwrap();
        assert!((closed - dec!(250000)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_at_maturity_is_zero() {
        assert_eq!(
            remaining_balance_at_balloon(dec!(250000), dec!(6), 30, 30).unwrap(),
            Decimal::ZERO
        );
        assert_eq!(
            remaining_balance_at_balloon(dec!(250000), dec!(6), 30, 35).unwrap(),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_zero_rate_is_linear() {
        // 1000/month, 300 months left
        let closed = remaining_balance_at_balloon(dec!(360000), Decimal::ZERO, 30, 5).unwrap();
        assert_eq!(closed, dec!(300000));
    }

    #[test]
    fn test_balloon_balance_envelope() {
        let input = BalloonInput {
            principal: dec!(360000),
            annual_rate_pct: dec!(5),
            term_years: 30,
            balloon_years: 5,
        };
        let result = balloon_balance(&input).unwrap();
        assert_eq!(result.result.remaining_months, 300);
        assert!((result.result.monthly_payment - dec!(1932.56)).abs() < dec!(0.01));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_huge_balloon_years_is_invalid_input() {
        let input = BalloonInput {
            principal: dec!(360000),
            annual_rate_pct: dec!(5),
            term_years: 30,
            balloon_years: 400_000_000,
        };
        let err = balloon_balance(&input).unwrap_err();
        assert!(matches!(
            err,
            SellerFinanceError::InvalidInput { ref field, .. } if field == "balloon_years"
        ));
        assert!(remaining_balance_at_balloon(dec!(360000), dec!(5), u32::MAX, 5).is_err());
    }

    #[test]
    fn test_balloon_balance_rejects_zero_term() {
        let input = BalloonInput {
            principal: dec!(1000),
            annual_rate_pct: dec!(5),
            term_years: 0,
            balloon_years: 0,
        };
        assert!(balloon_balance(&input).is_err());
    }
}
