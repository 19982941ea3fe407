use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use seller_finance_core::amortization::balloon::{self, BalloonInput};
use seller_finance_core::amortization::schedule::{self, LoanSpec};
use seller_finance_core::optimizer::terms_search::{self, SearchConstraints};

use crate::input;

/// Arguments for an amortization schedule
#[derive(Args)]
pub struct AmortizeArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Sale price
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Down payment as a whole percentage (10 = 10%)
    #[arg(long, default_value = "10")]
    pub down_payment_pct: Decimal,

    /// Annual interest rate as a whole percentage
    #[arg(long, default_value = "5")]
    pub rate_pct: Decimal,

    /// Loan term in years
    #[arg(long, default_value_t = 30)]
    pub term_years: u32,

    /// Balloon due after this many years
    #[arg(long)]
    pub balloon_years: Option<u32>,

    /// Interest-only for this many leading years
    #[arg(long)]
    pub interest_only_years: Option<u32>,
}

pub fn run_amortize(args: AmortizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let spec: LoanSpec = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(piped) = input::stdin::read_stdin()? {
        piped
    } else {
        let price = args.price.ok_or("--price is required (or provide --input)")?;
        LoanSpec {
            sale_price: price,
            down_payment_pct: args.down_payment_pct,
            annual_rate_pct: args.rate_pct,
            term_years: args.term_years,
            balloon_years: args.balloon_years,
            interest_only_years: args.interest_only_years,
        }
    };

    let result = schedule::compute_amortization(&spec)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for a balloon payoff valuation
#[derive(Args)]
pub struct BalloonArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate as a whole percentage
    #[arg(long, default_value = "5")]
    pub rate_pct: Decimal,

    /// Amortization term in years
    #[arg(long, default_value_t = 30)]
    pub term_years: u32,

    /// Years until the balloon falls due
    #[arg(long)]
    pub balloon_years: Option<u32>,
}

pub fn run_balloon(args: BalloonArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let balloon_input: BalloonInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(piped) = input::stdin::read_stdin()? {
        piped
    } else {
        let principal = args
            .principal
            .ok_or("--principal is required (or provide --input)")?;
        let balloon_years = args
            .balloon_years
            .ok_or("--balloon-years is required (or provide --input)")?;
        BalloonInput {
            principal,
            annual_rate_pct: args.rate_pct,
            term_years: args.term_years,
            balloon_years,
        }
    };

    let result = balloon::balloon_balance(&balloon_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the offer-terms search
#[derive(Args)]
pub struct BestTermsArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Listing price
    #[arg(long)]
    pub listing_price: Option<Decimal>,

    /// Monthly rental income
    #[arg(long)]
    pub rental_income: Option<Decimal>,

    /// Monthly operating expenses
    #[arg(long)]
    pub monthly_expenses: Option<Decimal>,

    /// Down payment range as MIN:MAX whole percentages
    #[arg(long, default_value = "10:30")]
    pub down_payment_range: String,

    /// Interest rate range as MIN:MAX whole percentages
    #[arg(long, default_value = "1:7")]
    pub rate_range: String,

    /// Balloon horizon in years for the first pass
    #[arg(long, default_value_t = 5)]
    pub balloon_years: u32,

    /// Retry over 5-10 balloon years when the first pass finds nothing
    #[arg(long)]
    pub balloon_adjustable: bool,

    /// Required seller earnings premium over listing, whole percent
    #[arg(long)]
    pub required_seller_earnings_pct: Option<Decimal>,
}

fn parse_pct_range(flag: &str, spec: &str) -> Result<(u32, u32), Box<dyn std::error::Error>> {
    let (min, max) = spec
        .split_once(':')
        .ok_or_else(|| format!("--{flag} must be MIN:MAX, got '{spec}'"))?;
    let min: u32 = min
        .trim()
        .parse()
        .map_err(|_| format!("--{flag}: invalid minimum '{min}'"))?;
    let max: u32 = max
        .trim()
        .parse()
        .map_err(|_| format!("--{flag}: invalid maximum '{max}'"))?;
    Ok((min, max))
}

pub fn run_best_terms(args: BestTermsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let constraints: SearchConstraints = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(piped) = input::stdin::read_stdin()? {
        piped
    } else {
        let listing_price = args
            .listing_price
            .ok_or("--listing-price is required (or provide --input)")?;
        let rental_income = args
            .rental_income
            .ok_or("--rental-income is required (or provide --input)")?;
        let monthly_expenses = args
            .monthly_expenses
            .ok_or("--monthly-expenses is required (or provide --input)")?;
        let (min_dp, max_dp) = parse_pct_range("down-payment-range", &args.down_payment_range)?;
        let (min_rate, max_rate) = parse_pct_range("rate-range", &args.rate_range)?;

        SearchConstraints {
            listing_price,
            min_down_payment_pct: min_dp,
            max_down_payment_pct: max_dp,
            min_interest_rate_pct: min_rate,
            max_interest_rate_pct: max_rate,
            monthly_rental_income: rental_income,
            monthly_expenses,
            balloon_years: args.balloon_years,
            balloon_adjustable: args.balloon_adjustable,
            required_seller_earnings_pct: args.required_seller_earnings_pct.unwrap_or(dec!(5)),
        }
    };

    let result = terms_search::find_optimal_terms(&constraints)?;
    Ok(serde_json::to_value(result)?)
}
