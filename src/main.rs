//! Hushåll CLI
//!
//! Command-line front end for projections, amortization schedules and debt
//! payoff plans

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};

use hushall_core::debt::{compare_strategies, simulate_payoff, PayoffConfig, StrategyKind};
use hushall_core::audit::{AuditSink, JsonlAuditSink, LogAuditSink};
use hushall_core::loans::{
    effective_annual_rate, generate_schedule, load_loans, load_rate_changes, AmortizationRequest, LoanFees,
};
use hushall_core::projection::{CashFlowScenario, ExtraContribution, ProjectionConfig, ProjectionEngine};
use hushall_core::temporal::{InMemoryTemporalStore, RateRecord};
use hushall_core::{Scope, Settings, TemporalService};

#[derive(Parser)]
#[command(name = "hushall", version, about = "Household finance calculations")]
struct Cli {
    /// JSON settings file (limits and tax parameters)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// First month of the calculation (YYYY-MM-DD), defaults to today
    #[arg(long, global = true)]
    start: Option<NaiveDate>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Project savings growth month by month
    Project {
        #[arg(long, default_value_t = 0.0)]
        initial: f64,
        #[arg(long)]
        monthly: f64,
        /// Annual return, percent
        #[arg(long)]
        rate: f64,
        #[arg(long)]
        years: u32,
        /// Annual inflation, percent
        #[arg(long)]
        inflation: Option<f64>,
        /// Yearly raise of the monthly savings, percent
        #[arg(long)]
        increase: Option<f64>,
        /// One-off deposit as AMOUNT@MONTH
        #[arg(long, value_parser = parse_extra)]
        extra: Option<ExtraContribution>,
        /// Write every month to this CSV file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the amortization schedule of a single loan
    Amortize {
        #[arg(long)]
        principal: f64,
        /// Annual rate, percent
        #[arg(long)]
        rate: f64,
        #[arg(long)]
        payment: f64,
        #[arg(long, default_value_t = 0.0)]
        extra: f64,
        #[arg(long, default_value_t = 0.0)]
        setup_fee: f64,
        #[arg(long, default_value_t = 0.0)]
        monthly_fee: f64,
    },
    /// Plan debt payoff for loans in a CSV file
    Payoff {
        loans: PathBuf,
        /// Total monthly budget for all loans
        #[arg(long)]
        budget: f64,
        #[arg(long, default_value_t = 0.0)]
        extra: f64,
        /// snowball or avalanche; both are compared when omitted
        #[arg(long)]
        strategy: Option<StrategyKind>,
    },
    /// Replay rate changes from a CSV file and show each loan's rate history
    Rates {
        changes: PathBuf,
        /// Append audit events as JSON lines here instead of logging them
        #[arg(long)]
        audit_log: Option<PathBuf>,
    },
}

fn parse_extra(s: &str) -> Result<ExtraContribution, String> {
    let (amount, month) = s
        .split_once('@')
        .ok_or_else(|| format!("expected AMOUNT@MONTH, got {}", s))?;
    Ok(ExtraContribution {
        amount: amount.trim().parse().map_err(|e| format!("bad amount: {}", e))?,
        month: month.trim().parse().map_err(|e| format!("bad month: {}", e))?,
    })
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let settings = Settings::load_or_default(cli.settings.as_deref())
        .context("Failed to load settings")?;
    let start = cli.start.unwrap_or_else(|| Utc::now().date_naive());

    match cli.command {
        Command::Project {
            initial,
            monthly,
            rate,
            years,
            inflation,
            increase,
            extra,
            output,
        } => {
            let mut scenario = CashFlowScenario::new("cli", initial, monthly, rate, years);
            if let Some(inflation) = inflation {
                scenario = scenario.with_inflation(inflation);
            }
            if let Some(increase) = increase {
                scenario = scenario.with_annual_increase(increase);
            }
            if let Some(extra) = extra {
                scenario = scenario.with_extra_contribution(extra.amount, extra.month);
            }

            let config = ProjectionConfig {
                start_date: start,
                max_months: settings.limits.max_projection_months,
            };
            let result = ProjectionEngine::new(config).project(&scenario)?;

            println!("{:>4} {:>10} {:>16} {:>16} {:>16}", "Year", "Date", "Balance", "Contributed", "Real value");
            println!("{}", "-".repeat(68));
            for row in result.yearly() {
                println!(
                    "{:>4} {:>10} {:>16.2} {:>16.2} {:>16}",
                    row.month / 12,
                    row.date,
                    row.balance,
                    row.cumulative_contributions,
                    row.real_value.map_or("-".to_string(), |v| format!("{:.2}", v)),
                );
            }

            println!("\nFinal amount:        {:.2}", result.final_amount);
            println!("Total contributions: {:.2}", result.total_contributions);
            println!(
                "Total interest:      {:.2} ({:.1}% of final)",
                result.total_interest,
                result.interest_share() * 100.0
            );
            if let Some(real) = result.real_final_amount {
                println!("Real final amount:   {:.2}", real);
            }

            if let Some(path) = output {
                let mut writer = csv::Writer::from_path(&path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                for row in &result.monthly_data {
                    writer.serialize(row)?;
                }
                writer.flush()?;
                println!("\nMonthly results written to: {}", path.display());
            }
        }

        Command::Amortize {
            principal,
            rate,
            payment,
            extra,
            setup_fee,
            monthly_fee,
        } => {
            let request = AmortizationRequest::new(principal, rate, payment, start).with_extra(extra);
            let schedule = generate_schedule(&request, settings.limits.max_amortization_periods)?;

            println!("{:>6} {:>10} {:>12} {:>12} {:>12} {:>14}", "Period", "Date", "Payment", "Interest", "Principal", "Balance");
            println!("{}", "-".repeat(72));
            for entry in &schedule.entries {
                println!(
                    "{:>6} {:>10} {:>12.2} {:>12.2} {:>12.2} {:>14.2}",
                    entry.period, entry.date, entry.payment, entry.interest, entry.principal, entry.remaining_balance,
                );
            }

            println!("\nPeriods:        {}", schedule.periods());
            println!("Total paid:     {:.2}", schedule.total_paid());
            println!("Total interest: {:.2}", schedule.total_interest());
            let fees = LoanFees { setup_fee, monthly_fee };
            match effective_annual_rate(principal, &schedule, fees) {
                Some(rate) => println!("Effective rate: {:.2}%", rate),
                None => println!("Effective rate: n/a"),
            }
        }

        Command::Payoff {
            loans,
            budget,
            extra,
            strategy,
        } => {
            let loans = load_loans(&loans)
                .with_context(|| format!("Failed to load loans from {}", loans.display()))?;
            if loans.is_empty() {
                bail!("No loans found");
            }
            let config = PayoffConfig {
                start_date: start,
                max_months: settings.limits.max_payoff_months,
            };

            match strategy {
                Some(kind) => {
                    let plan = simulate_payoff(kind, &loans, budget, extra, &config)?;
                    println!("{} plan: debt free {} after {} months", plan.kind, plan.debt_free_date, plan.total_months);
                    println!("{:>6} {:<24} {:>14} {:>8} {:>12}", "Loan", "Name", "Balance", "Month", "Interest");
                    for payoff in &plan.loans {
                        println!(
                            "{:>6} {:<24} {:>14.2} {:>8} {:>12.2}",
                            payoff.loan_id, payoff.name, payoff.starting_balance, payoff.payoff_month, payoff.interest_paid,
                        );
                    }
                    println!("\nTotal interest: {:.2}", plan.total_interest);
                    println!("Total paid:     {:.2}", plan.total_paid);
                }
                None => {
                    let comparison = compare_strategies(&loans, budget, extra, &config)?;
                    for plan in [&comparison.snowball, &comparison.avalanche] {
                        println!(
                            "{:<10} {:>4} months  interest {:>12.2}  debt free {}",
                            plan.kind, plan.total_months, plan.total_interest, plan.debt_free_date,
                        );
                    }
                    println!(
                        "\nRecommended: {} (saves {:.2} in interest, {} months)",
                        comparison.recommended, comparison.interest_saved, comparison.months_saved,
                    );
                }
            }
        }

        Command::Rates { changes, audit_log } => {
            let changes = load_rate_changes(&changes)
                .with_context(|| format!("Failed to load rate changes from {}", changes.display()))?;
            let audit: Arc<dyn AuditSink> = match audit_log {
                Some(path) => Arc::new(JsonlAuditSink::new(path)),
                None => Arc::new(LogAuditSink),
            };
            let service = TemporalService::with_audit(InMemoryTemporalStore::<RateRecord>::new(), audit);

            for change in &changes {
                service
                    .record_change(change.to_record(), Some(change.effective()))
                    .with_context(|| format!("Rate change for loan {} on {}", change.loan_id, change.effective_from))?;
            }

            let as_of = start.and_time(chrono::NaiveTime::MIN).and_utc();
            let loan_ids: BTreeSet<u32> = changes.iter().map(|c| c.loan_id).collect();
            println!("{:>6} {:>10} {:>10} {:>8}", "Loan", "From", "To", "Rate");
            println!("{}", "-".repeat(37));
            for loan_id in loan_ids {
                for version in service.history(&loan_id, Scope::All)? {
                    println!(
                        "{:>6} {:>10} {:>10} {:>7.2}%",
                        loan_id,
                        version.validity.valid_from.date_naive(),
                        version.validity.valid_to.map_or("-".to_string(), |to| to.date_naive().to_string()),
                        version.interest_rate,
                    );
                }
                match service.as_of(&loan_id, as_of, Scope::All)? {
                    Some(rate) => println!("{:>6} rate on {}: {:.2}%", loan_id, start, rate.interest_rate),
                    None => println!("{:>6} no rate on {}", loan_id, start),
                }
            }
        }
    }

    Ok(())
}
