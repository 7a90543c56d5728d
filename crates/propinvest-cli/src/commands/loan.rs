use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use propinvest_core::amortization::{self, LoanTerms};

use crate::input;

/// Arguments for a mortgage amortization schedule
#[derive(Args)]
pub struct AmortizeArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent (e.g. 4.5)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in years
    #[arg(long, default_value_t = 25)]
    pub term: u32,
}

pub fn run_amortize(args: AmortizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms: LoanTerms = match input::read_input(args.input.as_deref())? {
        Some(terms) => terms,
        None => {
            let principal = args
                .principal
                .ok_or("--principal is required (or provide --input)")?;
            let rate = args.rate.ok_or("--rate is required (or provide --input)")?;
            LoanTerms::new(principal, rate, args.term)?
        }
    };

    let result = amortization::build_schedule(&terms)?;
    Ok(serde_json::to_value(result)?)
}
