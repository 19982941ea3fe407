use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;

use crate::error::SellerFinanceError;
use crate::types::{Money, Rate};
use crate::SellerFinanceResult;

/// (1 + rate)^nper, failing instead of panicking when the factor overflows.
pub fn compound_factor(rate: Rate, nper: u32) -> SellerFinanceResult<Decimal> {
    (Decimal::ONE + rate)
        .checked_powu(u64::from(nper))
        .ok_or_else(|| {
            SellerFinanceError::FinancialImpossibility(format!(
                "compound factor (1 + {rate})^{nper} overflows"
            ))
        })
}

/// Present Value. `rate` must be non-negative, so the compound factor is at least 1.
pub fn pv(rate: Rate, nper: u32, pmt: Money, fv: Money) -> SellerFinanceResult<Money> {
    if rate.is_zero() {
        return Ok(-(pmt * Decimal::from(nper) + fv));
    }

    let factor = compound_factor(rate, nper)?;
    let annuity_factor = (Decimal::ONE - Decimal::ONE / factor) / rate;
    Ok(-(pmt * annuity_factor + fv / factor))
}

/// Payment (PMT)
pub fn pmt(rate: Rate, nper: u32, present_value: Money, future_value: Money) -> SellerFinanceResult<Money> {
    if nper == 0 {
        return Err(SellerFinanceError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate.is_zero() {
        return Ok(-(present_value + future_value) / Decimal::from(nper));
    }

    let factor = compound_factor(rate, nper)?;
    let annuity_factor = (factor - Decimal::ONE) / rate;

    if annuity_factor.is_zero() {
        return Err(SellerFinanceError::DivisionByZero {
            context: "PMT annuity factor".into(),
        });
    }

    Ok(-(present_value * factor + future_value) / annuity_factor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_pv_basic() {
        let result = pv(dec!(0.08), 10, dec!(-100), dec!(0)).unwrap();
        // PV of annuity: 100 * (1 - 1/1.08^10) / 0.08 = ~671
        assert!((result - dec!(671)).abs() < dec!(2.0));
    }

    #[test]
    fn test_pv_zero_rate() {
        let result = pv(Decimal::ZERO, 12, dec!(-250), dec!(0)).unwrap();
        assert_eq!(result, dec!(3000));
    }

    #[test]
    fn test_pmt_matches_mortgage_formula() {
        // 360,000 over 360 months at 5%/12: standard payment ~1932.56
        let result = pmt(dec!(0.05) / dec!(12), 360, dec!(-360000), dec!(0)).unwrap();
        assert!((result - dec!(1932.56)).abs() < dec!(0.01));
    }

    #[test]
    fn test_pmt_zero_rate_is_straight_line() {
        let result = pmt(Decimal::ZERO, 360, dec!(-360000), dec!(0)).unwrap();
        assert_eq!(result, dec!(1000));
    }

    #[test]
    fn test_pmt_zero_periods_error() {
        assert!(pmt(dec!(0.01), 0, dec!(-1000), dec!(0)).is_err());
    }

    #[test]
    fn test_pv_of_pmt_round_trips() {
        let rate = dec!(0.06) / dec!(12);
        let payment = pmt(rate, 120, dec!(-50000), dec!(0)).unwrap();
        let principal = pv(rate, 120, -payment, dec!(0)).unwrap();
        assert!((principal - dec!(50000)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_compound_factor_overflow_is_error() {
        let result = compound_factor(dec!(1000), 5000);
        assert!(matches!(
            result,
            Err(SellerFinanceError::FinancialImpossibility(_))
        ));
    }
}
