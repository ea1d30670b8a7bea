//! Finance Engine CLI
//!
//! Runs the engine operations against CSV data in a directory

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use finance_engine::debt::{total_current_payment, DebtAmortizationSimulator};
use finance_engine::repository::loader::{write_budgets, BUDGETS_FILE};
use finance_engine::repository::{DebtRepository, RetirementPlanRepository};
use finance_engine::{
    DebtStrategy, EngineConfig, FinanceEngine, IncomeEstimator, InMemoryRepository, UserId,
};
use log::info;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "finance_engine",
    about = "Cash flow forecasts, debt payoff plans, retirement projections and budget rollover"
)]
struct Cli {
    #[arg(long, default_value = "data", help = "Directory holding the input CSV files")]
    data_dir: PathBuf,

    #[arg(long, help = "JSON engine config; FINANCE_* environment variables are used otherwise")]
    config: Option<PathBuf>,

    #[arg(long, help = "Print results as JSON")]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Day-by-day balance forecast
    Forecast {
        #[arg(long)]
        user: UserId,
        #[arg(long, default_value_t = 3, allow_negative_numbers = true)]
        months: i32,
    },
    /// Debt payoff plan
    Payoff {
        #[arg(long)]
        user: UserId,
        #[arg(long, help = "Monthly payment; defaults to the sum of current payments")]
        payment: Option<f64>,
        #[arg(long, default_value = "avalanche")]
        strategy: DebtStrategy,
        #[arg(long, help = "Simulate both strategies and report the interest difference")]
        compare: bool,
    },
    /// Retirement projection for the stored plan
    Retirement {
        #[arg(long)]
        user: UserId,
        #[arg(long, help = "Project with this monthly contribution instead of the stored one")]
        contribution: Option<f64>,
    },
    /// Smallest monthly contribution that puts the plan on track
    Optimize {
        #[arg(long)]
        user: UserId,
    },
    /// Roll this month's budgets into next month
    AdjustBudgets {
        #[arg(long)]
        user: UserId,
        #[arg(long, help = "Write the updated budgets back to budgets.csv")]
        write: bool,
    },
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_json_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(EngineConfig::from_env()),
    }
}

fn build_engine(
    repo: Arc<InMemoryRepository>,
    config: EngineConfig,
) -> FinanceEngine<InMemoryRepository, impl IncomeEstimator> {
    let income = {
        let repo = repo.clone();
        move |user_id| repo.monthly_income_estimate(user_id)
    };
    FinanceEngine::new(repo, income, config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let repo = Arc::new(
        InMemoryRepository::from_data_dir(&cli.data_dir)
            .with_context(|| format!("Failed to load data from {}", cli.data_dir.display()))?,
    );
    info!("Loaded data from {} (today is {})", cli.data_dir.display(), config.today());

    let engine = build_engine(repo.clone(), config.clone());

    match cli.command {
        Command::Forecast { user, months } => {
            let report = engine.forecast(user, months)?;
            if cli.json {
                return print_json(&report);
            }

            println!("Cash flow forecast for user {} ({} months)", user, months);
            println!("  Current balance: ${:.2}", report.current_balance);
            println!("  Lowest balance:  ${:.2}", report.lowest_balance);
            println!("  Highest balance: ${:.2}", report.highest_balance);
            println!("  Final balance:   ${:.2}", report.final_balance);
            if let Some(date) = report.first_negative_date {
                println!("  Overdrawn from:  {}", date);
            }
            println!();
            println!("{:<12} {:>12} {:>12}  {}", "Date", "Change", "Balance", "Events");
            println!("{}", "-".repeat(60));
            for point in report.forecast.iter().filter(|p| !p.events.is_empty()) {
                let change: f64 = point.events.iter().map(|e| e.amount).sum();
                let labels: Vec<&str> = point.events.iter().map(|e| e.label.as_str()).collect();
                println!(
                    "{:<12} {:>12.2} {:>12.2}  {}",
                    point.date.to_string(),
                    change,
                    point.balance,
                    labels.join(", ")
                );
            }
        }

        Command::Payoff {
            user,
            payment,
            strategy,
            compare,
        } => {
            let payment = match payment {
                Some(payment) => payment,
                None => total_current_payment(&repo.debts(user)?),
            };

            if compare {
                let comparison = DebtAmortizationSimulator::from_config(&config)
                    .compare_strategies(&repo.debts(user)?, payment)?;
                if cli.json {
                    return print_json(&comparison);
                }
                println!("Strategy comparison for user {} at ${:.2}/month", user, payment);
                for result in [&comparison.avalanche, &comparison.snowball] {
                    println!(
                        "  {:<10} {:>4} months, interest ${:.2}{}",
                        result.strategy.to_string(),
                        result.total_months,
                        result.total_interest,
                        if result.converged { "" } else { " (not paid off)" }
                    );
                }
                println!(
                    "  {} saves ${:.2}",
                    comparison.cheaper(),
                    comparison.interest_saved.abs()
                );
                return Ok(());
            }

            let plan = engine.payoff_plan(user, payment, strategy)?;
            if cli.json {
                return print_json(&plan);
            }

            println!("{} payoff plan for user {}", plan.strategy, user);
            println!("  Total debt:      ${:.2}", plan.total_debt);
            println!("  Monthly payment: ${:.2}", plan.monthly_payment);
            println!("  Months:          {}", plan.payoff_months);
            match plan.payoff_date {
                Some(date) => println!("  Debt free on:    {}", date),
                None => println!("  Debt free on:    not within the simulation limit"),
            }
            println!("  Total interest:  ${:.2}", plan.total_interest);
            println!("\nPayoff order:");
            for entry in &plan.payoff_order {
                println!("  Month {:>3}: {}", entry.month, entry.creditor);
            }
        }

        Command::Retirement { user, contribution } => {
            let plan = repo
                .retirement_plan(user)?
                .with_context(|| format!("No retirement plan for user {}", user))?;
            let plan = match contribution {
                Some(contribution) => plan.with_contribution(contribution),
                None => plan,
            };

            let projection = engine.retirement_projection(&plan)?;
            if cli.json {
                return print_json(&projection);
            }

            println!("Retirement projection for user {} (age {} -> {})", user, plan.current_age, plan.retirement_age);
            println!("  Monthly contribution: ${:.2}", plan.monthly_contribution);
            println!("  Projected value:      ${:.2}", projection.projected_value);
            println!("  In today's money:     ${:.2}", projection.real_value);
            println!("  Monthly income:       ${:.2}", projection.monthly_income);
            println!("  Real monthly income:  ${:.2}", projection.real_monthly_income);
            println!("  Target income:        ${:.2}", projection.target_income);
            println!("  Replacement ratio:    {:.1}%", projection.replacement_ratio * 100.0);
            println!("  On track:             {}", if projection.is_on_track { "yes" } else { "no" });
            if projection.gap > 0.0 {
                println!("  Monthly shortfall:    ${:.2}", projection.gap);
            }
        }

        Command::Optimize { user } => {
            let result = engine.optimize_contribution(user)?;
            if cli.json {
                return print_json(&result);
            }

            println!("Contribution recommendation for user {}", user);
            println!("  Current:     ${:.2}", result.current_contribution);
            println!("  Recommended: ${:.2}", result.recommended_contribution);
            println!("  Increase:    ${:.2}", result.increase);
            if !result.reaches_target {
                println!("  Target is out of reach within the search range");
            }
        }

        Command::AdjustBudgets { user, write } => {
            let adjusted = engine.adjust_budgets(user)?;

            if write {
                let path = cli.data_dir.join(BUDGETS_FILE);
                let file = File::create(&path)
                    .with_context(|| format!("Unable to create {}", path.display()))?;
                write_budgets(file, &repo.all_budgets()?)?;
                info!("Wrote budgets to {}", path.display());
            }

            if cli.json {
                return print_json(&serde_json::json!({ "success": adjusted }));
            }
            println!("Budgets rolled over for user {}: {}", user, adjusted);
        }
    }

    Ok(())
}
