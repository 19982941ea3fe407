use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Instant;

use crate::amortization::balloon::outstanding_balance;
use crate::amortization::schedule::{amortizing_payment, monthly_rate};
use crate::error::SellerFinanceError;
use crate::types::{percent_to_rate, with_metadata, ComputationOutput, Money, Percent, Rate};
use crate::SellerFinanceResult;

/// Minimum buyer cash-on-cash return for a candidate to qualify.
pub const TARGET_CASH_ON_CASH_RETURN: Rate = dec!(0.07);

/// Every candidate is priced against this amortization period.
pub const BASE_AMORTIZATION_YEARS: u32 = 30;

/// Offers start at this fraction of the listing price.
pub const OFFER_FLOOR_RATIO: Rate = dec!(0.8);

/// Spacing between candidate offer prices.
pub const OFFER_PRICE_STEP: Money = dec!(1000);

/// Balloon years scanned when the fixed horizon has no feasible terms.
pub const FALLBACK_BALLOON_YEARS: RangeInclusive<u32> = 5..=10;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

fn default_required_seller_earnings_pct() -> Percent {
    dec!(5)
}

/// Bounds of the terms search plus the deal's operating figures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConstraints {
    pub listing_price: Money,
    /// Inclusive whole-percent bounds on the down payment
    pub min_down_payment_pct: u32,
    pub max_down_payment_pct: u32,
    /// Inclusive whole-percent bounds on the annual interest rate
    pub min_interest_rate_pct: u32,
    pub max_interest_rate_pct: u32,
    pub monthly_rental_income: Money,
    pub monthly_expenses: Money,
    /// Balloon horizon for the first pass
    pub balloon_years: u32,
    /// Allow a second pass over 5..=10 balloon years if the first finds nothing
    #[serde(default)]
    pub balloon_adjustable: bool,
    /// Seller must receive at least listing * (1 + pct / 100)
    #[serde(default = "default_required_seller_earnings_pct")]
    pub required_seller_earnings_pct: Percent,
}

/// One evaluated point of the search grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateTerms {
    pub offer_price: Money,
    pub down_payment_pct: u32,
    pub interest_rate_pct: u32,
    pub down_payment: Money,
    pub loan_amount: Money,
    pub monthly_payment: Money,
    pub monthly_cash_flow: Money,
    pub annual_cash_flow: Money,
    pub cash_on_cash_return: Rate,
    /// Scheduled payments over the balloon horizon plus the balloon payoff
    pub total_payments: Money,
    /// Down payment plus total payments
    pub seller_earnings: Money,
    pub balloon_years: u32,
}

/// Counters for one scan of the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPassSummary {
    pub balloon_years: Vec<u32>,
    pub candidates_evaluated: u64,
    pub feasible_candidates: u64,
}

/// How the winning terms compare with the listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealSummary {
    /// Offer price minus listing price (zero or negative)
    pub offer_price_difference: Money,
    /// Seller earnings above the offer price
    pub interest_earned: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerOutput {
    /// `None` when no candidate clears both thresholds
    pub optimal_terms: Option<CandidateTerms>,
    pub required_seller_earnings: Money,
    pub target_cash_on_cash_return: Rate,
    pub search_passes: Vec<SearchPassSummary>,
    pub used_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deal_summary: Option<DealSummary>,
}

struct Thresholds {
    min_cash_on_cash_return: Rate,
    required_seller_earnings: Money,
}

impl Thresholds {
    fn accepts(&self, candidate: &CandidateTerms) -> bool {
        candidate.cash_on_cash_return >= self.min_cash_on_cash_return
            && candidate.seller_earnings >= self.required_seller_earnings
    }
}

/// Best-so-far accumulator threaded through one pass.
struct SearchPass {
    summary: SearchPassSummary,
    best: Option<CandidateTerms>,
}

impl SearchPass {
    fn new(horizons: &[u32]) -> Self {
        SearchPass {
            summary: SearchPassSummary {
                balloon_years: horizons.to_vec(),
                candidates_evaluated: 0,
                feasible_candidates: 0,
            },
            best: None,
        }
    }

    /// Ties keep the incumbent: only strictly greater earnings replace it.
    fn consider(mut self, candidate: Option<CandidateTerms>, thresholds: &Thresholds) -> Self {
        self.summary.candidates_evaluated += 1;

        let Some(candidate) = candidate else {
            return self;
        };
        if !thresholds.accepts(&candidate) {
            return self;
        }
        self.summary.feasible_candidates += 1;

        let improves = self
            .best
            .as_ref()
            .map_or(true, |best| candidate.seller_earnings > best.seller_earnings);
        if improves {
            self.best = Some(candidate);
        }
        self
    }
}

/// Loan for one (offer, down %, rate %) point, shared by every balloon horizon.
struct PricedLoan {
    offer_price: Money,
    down_payment_pct: u32,
    interest_rate_pct: u32,
    down_payment: Money,
    loan_amount: Money,
    rate: Rate,
    monthly_payment: Money,
}

impl PricedLoan {
    fn new(offer_price: Money, down_payment_pct: u32, interest_rate_pct: u32) -> SellerFinanceResult<Self> {
        let down_payment = offer_price * percent_to_rate(Decimal::from(down_payment_pct));
        let loan_amount = offer_price - down_payment;
        let rate = monthly_rate(Decimal::from(interest_rate_pct));
        let monthly_payment = amortizing_payment(loan_amount, rate, BASE_AMORTIZATION_YEARS * 12)?;

        Ok(PricedLoan {
            offer_price,
            down_payment_pct,
            interest_rate_pct,
            down_payment,
            loan_amount,
            rate,
            monthly_payment,
        })
    }

    /// `None` when the buyer puts in no cash, leaving cash-on-cash undefined.
    fn evaluate(
        &self,
        constraints: &SearchConstraints,
        balloon_years: u32,
    ) -> SellerFinanceResult<Option<CandidateTerms>> {
        let annual_cash_flow = (constraints.monthly_rental_income
            - self.monthly_payment
            - constraints.monthly_expenses)
            * Decimal::from(12);
        let initial_cash_investment =
            self.down_payment + constraints.monthly_expenses * Decimal::from(12);
        if initial_cash_investment.is_zero() {
            return Ok(None);
        }
        let cash_on_cash_return = annual_cash_flow / initial_cash_investment;

        let total_months = BASE_AMORTIZATION_YEARS * 12;
        let horizon_months = balloon_years * 12;
        let balloon_payoff =
            outstanding_balance(self.monthly_payment, self.rate, total_months - horizon_months)?;
        let total_payments = self.monthly_payment * Decimal::from(horizon_months) + balloon_payoff;

        Ok(Some(CandidateTerms {
            offer_price: self.offer_price,
            down_payment_pct: self.down_payment_pct,
            interest_rate_pct: self.interest_rate_pct,
            down_payment: self.down_payment,
            loan_amount: self.loan_amount,
            monthly_payment: self.monthly_payment,
            monthly_cash_flow: annual_cash_flow / Decimal::from(12),
            annual_cash_flow,
            cash_on_cash_return,
            total_payments,
            seller_earnings: self.down_payment + total_payments,
            balloon_years,
        }))
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Search for the financing terms that pay the seller the most while the
/// buyer still clears the cash-on-cash target.
///
/// The grid is scanned down-payment % outermost, then rate %, then offer
/// price, then balloon years. If nothing qualifies at the fixed balloon
/// horizon and `balloon_adjustable` is set, the whole grid is scanned again
/// over 5 to 10 balloon years with a fresh incumbent.
pub fn find_optimal_terms(
    constraints: &SearchConstraints,
) -> SellerFinanceResult<ComputationOutput<OptimizerOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_constraints(constraints)?;

    let thresholds = Thresholds {
        min_cash_on_cash_return: TARGET_CASH_ON_CASH_RETURN,
        required_seller_earnings: constraints.listing_price
            * (Decimal::ONE + percent_to_rate(constraints.required_seller_earnings_pct)),
    };

    let first = run_pass(constraints, &thresholds, &[constraints.balloon_years])?;
    let mut best = first.best;
    let mut search_passes = vec![first.summary];
    let mut used_fallback = false;

    if best.is_none() && constraints.balloon_adjustable {
        log::info!(
            "no feasible terms at {} balloon years; widening to {:?}",
            constraints.balloon_years,
            FALLBACK_BALLOON_YEARS
        );
        let horizons: Vec<u32> = FALLBACK_BALLOON_YEARS.collect();
        let second = run_pass(constraints, &thresholds, &horizons)?;
        best = second.best;
        search_passes.push(second.summary);
        used_fallback = true;
    }

    if best.is_none() {
        warnings.push("No financing terms meet both the cash-on-cash and seller earnings thresholds".into());
    }

    let deal_summary = best.as_ref().map(|terms| DealSummary {
        offer_price_difference: terms.offer_price - constraints.listing_price,
        interest_earned: terms.seller_earnings - terms.offer_price,
    });

    let output = OptimizerOutput {
        optimal_terms: best,
        required_seller_earnings: thresholds.required_seller_earnings,
        target_cash_on_cash_return: thresholds.min_cash_on_cash_return,
        search_passes,
        used_fallback,
        deal_summary,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Seller Financing Terms Search (exhaustive grid, 30-year base amortization)",
        constraints,
        warnings,
        elapsed,
        output,
    ))
}

/// Candidate offer prices: floor(0.8 * listing) upward in fixed steps, never above listing.
pub fn offer_prices(listing_price: Money) -> impl Iterator<Item = Money> {
    let first = (listing_price * OFFER_FLOOR_RATIO).floor();
    std::iter::successors(Some(first), |price| Some(price + OFFER_PRICE_STEP))
        .take_while(move |price| *price <= listing_price)
}

// ---------------------------------------------------------------------------
// Grid scan
// ---------------------------------------------------------------------------

fn run_pass(
    constraints: &SearchConstraints,
    thresholds: &Thresholds,
    horizons: &[u32],
) -> SellerFinanceResult<SearchPass> {
    let mut pass = SearchPass::new(horizons);

    for down_payment_pct in constraints.min_down_payment_pct..=constraints.max_down_payment_pct {
        for interest_rate_pct in constraints.min_interest_rate_pct..=constraints.max_interest_rate_pct {
            for offer_price in offer_prices(constraints.listing_price) {
                let loan = PricedLoan::new(offer_price, down_payment_pct, interest_rate_pct)?;
                for &balloon_years in horizons {
                    let candidate = loan.evaluate(constraints, balloon_years)?;
                    pass = pass.consider(candidate, thresholds);
                }
            }
        }
    }

    log::debug!(
        "pass over balloon years {:?}: {} evaluated, {} feasible",
        pass.summary.balloon_years,
        pass.summary.candidates_evaluated,
        pass.summary.feasible_candidates
    );
    Ok(pass)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_constraints(c: &SearchConstraints) -> SellerFinanceResult<()> {
    if c.listing_price < Decimal::ZERO {
        return Err(SellerFinanceError::invalid(
            "listing_price",
            "Listing price cannot be negative",
        ));
    }
    if c.monthly_rental_income < Decimal::ZERO {
        return Err(SellerFinanceError::invalid(
            "monthly_rental_income",
            "Rental income cannot be negative",
        ));
    }
    if c.monthly_expenses < Decimal::ZERO {
        return Err(SellerFinanceError::invalid(
            "monthly_expenses",
            "Monthly expenses cannot be negative",
        ));
    }
    if c.required_seller_earnings_pct < Decimal::ZERO {
        return Err(SellerFinanceError::invalid(
            "required_seller_earnings_pct",
            "Required seller earnings premium cannot be negative",
        ));
    }
    if c.min_down_payment_pct > c.max_down_payment_pct {
        return Err(SellerFinanceError::invalid(
            "min_down_payment_pct",
            "Minimum down payment exceeds the maximum",
        ));
    }
    if c.max_down_payment_pct > 100 {
        return Err(SellerFinanceError::invalid(
            "max_down_payment_pct",
            "Down payment cannot exceed 100%",
        ));
    }
    if c.min_interest_rate_pct > c.max_interest_rate_pct {
        return Err(SellerFinanceError::invalid(
            "min_interest_rate_pct",
            "Minimum interest rate exceeds the maximum",
        ));
    }
    if c.max_interest_rate_pct > 100 {
        return Err(SellerFinanceError::invalid(
            "max_interest_rate_pct",
            "Interest rate cannot exceed 100%",
        ));
    }
    if c.balloon_years > BASE_AMORTIZATION_YEARS {
        return Err(SellerFinanceError::invalid(
            "balloon_years",
            format!("Balloon cannot exceed the {BASE_AMORTIZATION_YEARS}-year base amortization"),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
