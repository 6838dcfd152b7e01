//! Compare snowball and avalanche payoff across a range of monthly budgets
//!
//! Outputs one CSV row per budget with both plans side by side

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use rayon::prelude::*;
use serde::Serialize;

use hushall_core::debt::{compare_strategies, required_minimum, PayoffConfig};
use hushall_core::loans::load_loans;
use hushall_core::{FinanceError, Settings};

#[derive(Parser)]
#[command(name = "compare_strategies", about = "Snowball vs avalanche over a budget range")]
struct Args {
    /// Loans CSV file
    #[arg(default_value = "data/loans_sample.csv")]
    loans: PathBuf,

    /// Highest budget to try; the lowest is the sum of minimum payments
    #[arg(long)]
    max_budget: f64,

    /// Budget increment between rows
    #[arg(long, default_value_t = 500.0)]
    step: f64,

    #[arg(long)]
    start: Option<NaiveDate>,

    #[arg(long)]
    settings: Option<PathBuf>,

    #[arg(long, default_value = "strategy_comparison.csv")]
    output: PathBuf,
}

/// One budget level, both strategies
#[derive(Debug, Serialize)]
struct ComparisonRow {
    budget: f64,
    snowball_months: Option<u32>,
    snowball_interest: Option<f64>,
    avalanche_months: Option<u32>,
    avalanche_interest: Option<f64>,
    interest_saved: Option<f64>,
    months_saved: Option<i64>,
    recommended: String,
}

impl ComparisonRow {
    fn undetermined(budget: f64, reason: &str) -> Self {
        Self {
            budget,
            snowball_months: None,
            snowball_interest: None,
            avalanche_months: None,
            avalanche_interest: None,
            interest_saved: None,
            months_saved: None,
            recommended: reason.to_string(),
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    anyhow::ensure!(args.step > 0.0, "step must be positive");

    let settings = Settings::load_or_default(args.settings.as_deref())?;
    let config = PayoffConfig {
        start_date: args.start.unwrap_or_else(|| Utc::now().date_naive()),
        max_months: settings.limits.max_payoff_months,
    };

    let start = Instant::now();
    let loans = load_loans(&args.loans)
        .with_context(|| format!("Failed to load loans from {}", args.loans.display()))?;
    println!("Loaded {} loans in {:?}", loans.len(), start.elapsed());

    let minimum = required_minimum(&loans);
    let steps = ((args.max_budget - minimum) / args.step).floor().max(0.0) as usize;
    let budgets: Vec<f64> = (0..=steps).map(|i| minimum + i as f64 * args.step).collect();
    println!("Minimum payments total {:.2}; running {} budgets...", minimum, budgets.len());

    let run_start = Instant::now();
    let rows: Vec<ComparisonRow> = budgets
        .par_iter()
        .map(|&budget| match compare_strategies(&loans, budget, 0.0, &config) {
            Ok(c) => Ok(ComparisonRow {
                budget,
                snowball_months: Some(c.snowball.total_months),
                snowball_interest: Some(c.snowball.total_interest),
                avalanche_months: Some(c.avalanche.total_months),
                avalanche_interest: Some(c.avalanche.total_interest),
                interest_saved: Some(c.interest_saved),
                months_saved: Some(c.months_saved),
                recommended: c.recommended.to_string(),
            }),
            Err(FinanceError::Undeterminable { .. }) => {
                Ok(ComparisonRow::undetermined(budget, "undeterminable"))
            }
            Err(FinanceError::InsufficientBudget { .. }) => {
                Ok(ComparisonRow::undetermined(budget, "insufficient budget"))
            }
            Err(e) => Err(e),
        })
        .collect::<Result<_, FinanceError>>()?;
    println!("Simulations complete in {:?}", run_start.elapsed());

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    println!("Output written to {}", args.output.display());

    if let Some(best) = rows
        .iter()
        .filter_map(|r| r.interest_saved.map(|saved| (r.budget, saved)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
    {
        println!("\nLargest avalanche advantage: {:.2} at budget {:.2}", best.1, best.0);
    }
    println!("Total time: {:?}", start.elapsed());

    Ok(())
}
