#![cfg(not(tarpaulin_include))]

use clap::{Args, Parser, Subcommand, ValueEnum};
use savings_calculator::config::StorageOptions;
use savings_calculator::downloader::{to_csv, to_xlsx};
use savings_calculator::logging;
use savings_calculator::report::{ScheduleReport, format_amount, render_table};
use savings_calculator::scenario::{ScenarioParams, SortOrder};
use savings_calculator::session::ScenarioSession;
use savings_calculator::validation::{ScenarioForm, validate};
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "savings-cli", about = "Year-by-year savings growth, with and without a monthly deposit")]
struct Cli {
    #[command(flatten)]
    storage: StorageOptions,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the year-end tables for a scenario
    Calc {
        #[command(flatten)]
        scenario: ScenarioArgs,

        #[arg(long, value_enum, default_value_t = Policy::Both)]
        policy: Policy,
    },
    /// Save a scenario to the active store
    Save {
        #[command(flatten)]
        scenario: ScenarioArgs,
    },
    /// List saved scenarios
    List {
        #[arg(long, value_enum, default_value_t = SortOrder::Created)]
        sort: SortOrder,
    },
    /// Delete a saved scenario by id
    Delete { id: String },
    /// Write both tables to a CSV or XLSX file
    Export {
        #[command(flatten)]
        scenario: ScenarioArgs,

        #[arg(long, value_enum, default_value_t = Format::Csv)]
        format: Format,

        #[arg(long, short)]
        output: PathBuf,
    },
}

/// Raw scenario fields; checked by the validation gate, not by clap
#[derive(Args)]
struct ScenarioArgs {
    #[arg(long, allow_hyphen_values = true)]
    initial: String,

    #[arg(long, allow_hyphen_values = true)]
    deposit: String,

    #[arg(long, allow_hyphen_values = true)]
    rate: String,

    #[arg(long, allow_hyphen_values = true)]
    years: String,
}

impl ScenarioArgs {
    fn params(&self) -> Result<ScenarioParams, Box<dyn Error>> {
        let form = ScenarioForm::new(
            self.initial.as_str(),
            self.deposit.as_str(),
            self.rate.as_str(),
            self.years.as_str(),
        );
        Ok(validate(&form)?)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Policy {
    Both,
    With,
    Without,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Xlsx,
}

async fn open_session(storage: &StorageOptions) -> Result<ScenarioSession, Box<dyn Error>> {
    let session = ScenarioSession::open(storage.strategy(), storage.store.clone()).await?;
    eprintln!("{}", session.status());
    Ok(session)
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Command::Calc { scenario, policy } => {
            let report = ScheduleReport::build(scenario.params()?);
            if policy != Policy::With {
                println!("{}", render_table("Without Deposit", &report.without_deposit));
            }
            if policy != Policy::Without {
                println!("{}", render_table("With Deposit", &report.with_deposit));
            }
        }
        Command::Save { scenario } => {
            // validate before touching any store
            let params = scenario.params()?;
            let mut session = open_session(&cli.storage).await?;
            let saved = session.save(params).await?;
            println!("Saved scenario {} ({} store)", saved.id, session.kind());
        }
        Command::List { sort } => {
            let mut session = open_session(&cli.storage).await?;
            session.sort_by(sort);
            if session.scenarios().is_empty() {
                println!("No saved scenarios");
            }
            for s in session.scenarios() {
                println!(
                    "{:>36}  {:>12}  {:>10}/month  {:>6}%  {:>4} years  {}",
                    s.id,
                    format_amount(s.initial_balance),
                    format_amount(s.monthly_deposit),
                    s.annual_rate_percent,
                    s.years,
                    s.created_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Command::Delete { id } => {
            let mut session = open_session(&cli.storage).await?;
            session.delete(&id).await?;
            println!("Deleted scenario {}", id);
        }
        Command::Export {
            scenario,
            format,
            output,
        } => {
            let report = ScheduleReport::build(scenario.params()?);
            match format {
                Format::Csv => std::fs::write(&output, to_csv(&report)?)?,
                Format::Xlsx => std::fs::write(&output, to_xlsx(&report)?)?,
            }
            println!("Wrote {}", output.display());
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    logging::init_cli();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
