use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::SellerFinanceError;
use crate::time_value;
use crate::types::{percent_to_rate, with_metadata, ComputationOutput, Money, Percent, Rate};
use crate::SellerFinanceResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Seller-financed loan terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanSpec {
    /// Sale / offer price of the property
    pub sale_price: Money,
    /// Down payment as a percentage of the sale price (10 = 10%)
    pub down_payment_pct: Percent,
    /// Annual interest rate as a percentage (5 = 5%)
    pub annual_rate_pct: Percent,
    /// Amortization period in years
    pub term_years: u32,
    /// Year at which the remaining balance falls due. Zero means no balloon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balloon_years: Option<u32>,
    /// Leading years during which only interest is paid. Zero means none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_only_years: Option<u32>,
}

/// One month of the amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    /// 1-based month index
    pub month: u32,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub remaining_balance: Money,
}

/// Summary totals plus the month-by-month schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationResult {
    /// floor(price * down%)
    pub down_payment: Money,
    /// Sale price less down payment
    pub loan_principal: Money,
    /// Fully-amortizing payment over the whole term
    pub monthly_payment: Money,
    /// Balance settled at the balloon month, zero without a balloon
    pub balloon_amount: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balloon_month: Option<u32>,
    /// Payment in month 1 (the interest-only payment when that window is set)
    pub first_month_payment: Money,
    /// Payment in the final month (the amortizing payment when a balloon ends the loan)
    pub last_month_payment: Money,
    /// Interest over the schedule plus the balloon month's settlement row
    pub total_interest_paid: Money,
    /// Scheduled payments, the settlement row's payment and the balloon payoff
    pub total_amount_paid: Money,
    /// Down payment plus total amount paid
    pub seller_grand_total: Money,
    pub schedule: Vec<AmortizationRow>,
}

/// Payoff at the balloon month: the amortizing payment due that month plus the
/// balance it settles.
#[derive(Debug)]
struct BalloonSettlement {
    month: u32,
    amount: Money,
    payment: Money,
    interest: Money,
}

/// Longest term, balloon or interest-only window accepted, in years.
pub const MAX_TERM_YEARS: u32 = 50;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Convert a year count into months, rejecting anything past [`MAX_TERM_YEARS`].
pub fn months_for_years(field: &str, years: u32) -> SellerFinanceResult<u32> {
    if years > MAX_TERM_YEARS {
        return Err(SellerFinanceError::invalid(
            field,
            format!("Cannot exceed {MAX_TERM_YEARS} years"),
        ));
    }
    Ok(years * 12)
}

/// Monthly periodic rate for an annual percentage: pct / 100 / 12.
pub fn monthly_rate(annual_rate_pct: Percent) -> Rate {
    percent_to_rate(annual_rate_pct) / Decimal::from(12)
}

/// Level payment that retires `principal` over `months` at `rate` per month.
///
/// With a zero rate this is straight-line: `principal / months`.
pub fn amortizing_payment(principal: Money, rate: Rate, months: u32) -> SellerFinanceResult<Money> {
    time_value::pmt(rate, months, -principal, Decimal::ZERO)
}

/// Build the month-by-month schedule for a seller-financed loan.
pub fn compute_amortization(
    spec: &LoanSpec,
) -> SellerFinanceResult<ComputationOutput<AmortizationResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let windows = validate_spec(spec, &mut warnings)?;

    let down_payment = (spec.sale_price * percent_to_rate(spec.down_payment_pct)).floor();
    let loan_principal = spec.sale_price - down_payment;
    let rate = monthly_rate(spec.annual_rate_pct);
    let total_months = windows.total_months;
    let monthly_payment = amortizing_payment(loan_principal, rate, total_months)?;
    let interest_only_payment = loan_principal * rate;

    let mut schedule = Vec::with_capacity(total_months as usize);
    let mut balance = loan_principal;
    let mut balloon: Option<BalloonSettlement> = None;

    for month in 1..=total_months {
        let interest = balance * rate;

        if month <= windows.interest_only_months {
            schedule.push(AmortizationRow {
                month,
                payment: interest_only_payment,
                interest,
                principal: Decimal::ZERO,
                remaining_balance: balance,
            });
        } else {
            let principal = monthly_payment - interest;
            balance = (balance - principal).max(Decimal::ZERO);
            schedule.push(AmortizationRow {
                month,
                payment: monthly_payment,
                interest,
                principal,
                remaining_balance: balance,
            });
        }

        // The settlement row is left out of the schedule but still counts toward totals.
        if windows.balloon_month == Some(month) {
            balloon = Some(BalloonSettlement {
                month,
                amount: balance,
                payment: monthly_payment,
                interest,
            });
            break;
        }
    }

    let balloon_amount = balloon.as_ref().map_or(Decimal::ZERO, |b| b.amount);
    let total_interest_paid: Money = schedule.iter().map(|r| r.interest).sum::<Money>()
        + balloon.as_ref().map_or(Decimal::ZERO, |b| b.interest);
    let scheduled_paid: Money = schedule.iter().map(|r| r.payment).sum::<Money>()
        + balloon.as_ref().map_or(Decimal::ZERO, |b| b.payment);
    let total_amount_paid = scheduled_paid + balloon_amount;

    let first_month_payment = schedule.first().map_or(Decimal::ZERO, |r| r.payment);
    let last_month_payment = if balloon.is_some() {
        monthly_payment
    } else {
        schedule.last().map_or(Decimal::ZERO, |r| r.payment)
    };

    log::debug!(
        "amortization: {} rows, principal {}, balloon {:?}",
        schedule.len(),
        loan_principal,
        balloon.as_ref().map(|b| (b.month, b.amount))
    );

    let output = AmortizationResult {
        down_payment,
        loan_principal,
        monthly_payment,
        balloon_amount,
        balloon_month: balloon.as_ref().map(|b| b.month),
        first_month_payment,
        last_month_payment,
        total_interest_paid,
        total_amount_paid,
        seller_grand_total: down_payment + total_amount_paid,
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Seller Financing Amortization (balloon / interest-only)",
        spec,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Term, balloon and interest-only windows in months, with zero-year values dropped.
struct Windows {
    total_months: u32,
    balloon_month: Option<u32>,
    interest_only_months: u32,
}

fn validate_spec(spec: &LoanSpec, warnings: &mut Vec<String>) -> SellerFinanceResult<Windows> {
    if spec.sale_price < Decimal::ZERO {
        return Err(SellerFinanceError::invalid(
            "sale_price",
            "Sale price cannot be negative",
        ));
    }
    if spec.down_payment_pct < Decimal::ZERO || spec.down_payment_pct > Decimal::ONE_HUNDRED {
        return Err(SellerFinanceError::invalid(
            "down_payment_pct",
            "Down payment must be between 0% and 100%",
        ));
    }
    if spec.annual_rate_pct < Decimal::ZERO || spec.annual_rate_pct > Decimal::ONE_HUNDRED {
        return Err(SellerFinanceError::invalid(
            "annual_rate_pct",
            "Interest rate must be between 0% and 100%",
        ));
    }
    if spec.term_years == 0 {
        return Err(SellerFinanceError::invalid(
            "term_years",
            "Loan term must be at least 1 year",
        ));
    }

    let total_months = months_for_years("term_years", spec.term_years)?;
    let balloon_month = spec
        .balloon_years
        .filter(|y| *y > 0)
        .map(|y| months_for_years("balloon_years", y))
        .transpose()?;
    let interest_only_months =
        months_for_years("interest_only_years", spec.interest_only_years.unwrap_or(0))?;

    if let Some(month) = balloon_month {
        if month > total_months {
            return Err(SellerFinanceError::invalid(
                "balloon_years",
                "Balloon cannot fall due after the loan term",
            ));
        }
        if interest_only_months > month {
            return Err(SellerFinanceError::invalid(
                "interest_only_years",
                "Interest-only period must end no later than the balloon",
            ));
        }
        if month == total_months {
            warnings.push("Balloon falls in the final month; treated as a normal payoff".into());
        }
    }
    if interest_only_months > total_months {
        return Err(SellerFinanceError::invalid(
            "interest_only_years",
            "Interest-only period cannot exceed the loan term",
        ));
    }
    if interest_only_months == total_months {
        warnings.push("Interest-only period spans the whole term; no principal is repaid".into());
    }
    if spec.annual_rate_pct.is_zero() {
        warnings.push("Zero interest rate; principal is repaid straight-line".into());
    }

    Ok(Windows {
        total_months,
        balloon_month: balloon_month.filter(|month| *month < total_months),
        interest_only_months,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_spec() -> LoanSpec {
        LoanSpec {
            sale_price: dec!(400000),
            down_payment_pct: dec!(10),
            annual_rate_pct: dec!(5),
            term_years: 30,
            balloon_years: None,
            interest_only_years: None,
        }
    }

    #[test]
    fn test_full_term_schedule_pays_off() {
        let result = compute_amortization(&sample_spec()).unwrap();
        let out = &result.result;

        assert_eq!(out.down_payment, dec!(40000));
        assert_eq!(out.loan_principal, dec!(360000));
        assert_eq!(out.schedule.len(), 360);
        assert_eq!(out.balloon_amount, Decimal::ZERO);
        assert!(out.balloon_month.is_none());

        let last = out.schedule.last().unwrap();
        assert!(last.remaining_balance < dec!(0.000001));
        assert!((out.monthly_payment - dec!(1932.56)).abs() < dec!(0.01));
    }

    #[test]
    fn test_down_payment_is_floored() {
        let mut spec = sample_spec();
        spec.sale_price = dec!(359999);
        spec.down_payment_pct = dec!(7);
        let out = compute_amortization(&spec).unwrap().result;
        // 359999 * 0.07 = 25199.93
        assert_eq!(out.down_payment, dec!(25199));
        assert_eq!(out.loan_principal, dec!(334800));
    }

    #[test]
    fn test_balloon_truncates_schedule() {
        let mut spec = sample_spec();
        spec.balloon_years = Some(5);
        let out = compute_amortization(&spec).unwrap().result;

        assert_eq!(out.schedule.len(), 60);
        assert_eq!(out.balloon_month, Some(60));
        assert_eq!(out.balloon_amount, out.schedule[59].remaining_balance);
        assert_eq!(out.last_month_payment, out.monthly_payment);

        // The month-60 settlement row is counted once more on top of the schedule
        let scheduled: Money = out.schedule.iter().map(|r| r.payment).sum();
        assert_eq!(
            out.total_amount_paid,
            scheduled + out.monthly_payment + out.balloon_amount
        );
        let interest: Money = out.schedule.iter().map(|r| r.interest).sum();
        assert_eq!(
            out.total_interest_paid,
            interest + out.schedule[59].interest
        );
        assert_eq!(
            out.seller_grand_total,
            out.down_payment + out.total_amount_paid
        );
    }

    #[test]
    fn test_interest_only_rows_hold_balance() {
        let mut spec = sample_spec();
        spec.interest_only_years = Some(1);
        let out = compute_amortization(&spec).unwrap().result;

        for row in &out.schedule[..12] {
            assert_eq!(row.principal, Decimal::ZERO);
            assert_eq!(row.remaining_balance, dec!(360000));
            assert_eq!(row.payment, dec!(360000) * monthly_rate(dec!(5)));
        }
        assert_eq!(out.first_month_payment, out.schedule[0].payment);
        // Amortization resumes against the undiminished principal
        let resumed = &out.schedule[12];
        assert_eq!(resumed.payment, out.monthly_payment);
        assert_eq!(resumed.interest, dec!(360000) * monthly_rate(dec!(5)));
    }

    #[test]
    fn test_zero_rate_straight_line() {
        let mut spec = sample_spec();
        spec.annual_rate_pct = Decimal::ZERO;
        let result = compute_amortization(&spec).unwrap();
        let out = &result.result;

        assert_eq!(out.monthly_payment, dec!(1000));
        assert_eq!(out.total_interest_paid, Decimal::ZERO);
        assert_eq!(out.schedule.last().unwrap().remaining_balance, Decimal::ZERO);
        assert!(result.warnings.iter().any(|w| w.contains("straight-line")));
    }

    #[test]
    fn test_zero_year_modifiers_mean_absent() {
        let mut spec = sample_spec();
        spec.balloon_years = Some(0);
        spec.interest_only_years = Some(0);
        let out = compute_amortization(&spec).unwrap().result;
        assert_eq!(out.schedule.len(), 360);
        assert!(out.balloon_month.is_none());
        assert_eq!(out.first_month_payment, out.monthly_payment);
    }

    #[test]
    fn test_balloon_at_maturity_is_normal_payoff() {
        let mut spec = sample_spec();
        spec.balloon_years = Some(30);
        let result = compute_amortization(&spec).unwrap();
        let plain = compute_amortization(&sample_spec()).unwrap().result;

        assert_eq!(result.result.schedule.len(), 360);
        assert!(result.result.balloon_month.is_none());
        assert_eq!(result.result.balloon_amount, Decimal::ZERO);
        assert_eq!(result.result.total_amount_paid, plain.total_amount_paid);
        assert!(result.warnings.iter().any(|w| w.contains("final month")));
    }

    #[test]
    fn test_months_for_years_bounds() {
        assert_eq!(months_for_years("term_years", 50).unwrap(), 600);
        assert!(months_for_years("term_years", 51).is_err());
        assert!(months_for_years("term_years", u32::MAX).is_err());
    }

    #[test]
    fn test_huge_year_counts_are_invalid_input() {
        let mut spec = sample_spec();
        spec.balloon_years = Some(400_000_000);
        let err = compute_amortization(&spec).unwrap_err();
        assert!(matches!(
            err,
            SellerFinanceError::InvalidInput { ref field, .. } if field == "balloon_years"
        ));

        let mut spec = sample_spec();
        spec.term_years = u32::MAX;
        spec.annual_rate_pct = Decimal::ZERO;
        let err = compute_amortization(&spec).unwrap_err();
        assert!(matches!(
            err,
            SellerFinanceError::InvalidInput { ref field, .. } if field == "term_years"
        ));

        let mut spec = sample_spec();
        spec.interest_only_years = Some(u32::MAX);
        assert!(compute_amortization(&spec).is_err());
    }

    #[test]
    fn test_zero_term_error() {
        let mut spec = sample_spec();
        spec.term_years = 0;
        assert!(compute_amortization(&spec).is_err());
    }

    #[test]
    fn test_negative_price_error() {
        let mut spec = sample_spec();
        spec.sale_price = dec!(-1);
        assert!(compute_amortization(&spec).is_err());
    }

    #[test]
    fn test_balloon_after_term_error() {
        let mut spec = sample_spec();
        spec.term_years = 10;
        spec.balloon_years = Some(11);
        assert!(compute_amortization(&spec).is_err());
    }

    #[test]
    fn test_interest_only_past_balloon_error() {
        let mut spec = sample_spec();
        spec.balloon_years = Some(3);
        spec.interest_only_years = Some(4);
        let err = compute_amortization(&spec).unwrap_err();
        assert!(matches!(
            err,
            SellerFinanceError::InvalidInput { ref field, .. } if field == "interest_only_years"
        ));
    }

    #[test]
    fn test_interest_only_whole_term_warns() {
        let mut spec = sample_spec();
        spec.term_years = 5;
        spec.interest_only_years = Some(5);
        let result = compute_amortization(&spec).unwrap();
        let last = result.result.schedule.last().unwrap();
        assert_eq!(last.remaining_balance, dec!(360000));
        assert!(result.warnings.iter().any(|w| w.contains("Interest-only")));
    }
}
