use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use expensebook::app::{
    self, ExpenseDraft, ExpenseOutput, ExportFormat, ListOutput, ReportOutput, TodayOutput,
};
use expensebook::clock::Clock;
use expensebook::config::{default_config_path, ResolvedConfig};
use expensebook::models::{
    Expense, ExpenseCategory, ExpenseFilter, ExpenseId, GroupBy, ReportPeriod,
};
use expensebook::storage::{ExpenseStore, JsonFileStorage};

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_COMMIT_HASH"), ")");

#[derive(Parser)]
#[command(name = "expensebook")]
#[command(about = "Local-first expense tracker")]
#[command(version = VERSION)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record a new expense
    Add {
        #[arg(long)]
        title: String,
        /// Amount as a decimal number, e.g. 12.50
        #[arg(long, allow_hyphen_values = true)]
        amount: String,
        /// staff, travel, food or utility
        #[arg(long)]
        category: ExpenseCategory,
        /// Date the expense counts towards (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        notes: Option<String>,
        /// Path or URI of a receipt image
        #[arg(long)]
        receipt: Option<String>,
    },
    /// Change fields of an existing expense
    Update {
        id: ExpenseId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        amount: Option<String>,
        #[arg(long)]
        category: Option<ExpenseCategory>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        receipt: Option<String>,
    },
    /// Remove an expense
    Delete { id: ExpenseId },
    /// Show one expense
    Show { id: ExpenseId },
    /// List expenses, optionally filtered and grouped
    List {
        /// Start of an inclusive date range; ignored without --end
        #[arg(long)]
        start: Option<NaiveDate>,
        /// End of an inclusive date range; ignored without --start
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        category: Option<ExpenseCategory>,
        #[arg(long, value_enum, default_value_t = GroupByArg::Time)]
        group_by: GroupByArg,
    },
    /// Totals by day and category for a period
    Report {
        #[arg(long, value_enum, default_value_t = PeriodArg::Last7Days)]
        period: PeriodArg,
        /// Custom range start; requires --end and overrides --period
        #[arg(long, requires = "end")]
        start: Option<NaiveDate>,
        #[arg(long, requires = "start")]
        end: Option<NaiveDate>,
        #[arg(long, value_enum, default_value_t = FormatArg::Json)]
        format: FormatArg,
        /// Write to this file instead of stdout. A directory gets the
        /// default report file name.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Today's total and count
    Today,
    /// Show current configuration
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum GroupByArg {
    Time,
    Category,
}

impl From<GroupByArg> for GroupBy {
    fn from(arg: GroupByArg) -> Self {
        match arg {
            GroupByArg::Time => GroupBy::Time,
            GroupByArg::Category => GroupBy::Category,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PeriodArg {
    Today,
    #[value(name = "last-7-days")]
    Last7Days,
    #[value(name = "last-30-days")]
    Last30Days,
}

impl From<PeriodArg> for ReportPeriod {
    fn from(arg: PeriodArg) -> Self {
        match arg {
            PeriodArg::Today => ReportPeriod::Today,
            PeriodArg::Last7Days => ReportPeriod::Last7Days,
            PeriodArg::Last30Days => ReportPeriod::Last30Days,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Json,
    Csv,
    Text,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn find_expense(storage: &dyn ExpenseStore, id: ExpenseId) -> Result<Expense> {
    app::get_expense(storage, id)
        .await?
        .with_context(|| format!("Expense not found: {id}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .json(),
        )
        .init();

    let cli = Cli::parse();

    let config = ResolvedConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load expensebook config: {}", cli.config.display()))?;
    let clock_impl = config.clock();
    let clock: &dyn Clock = clock_impl.as_ref();
    let storage = JsonFileStorage::new(&config.data_dir);
    let display = &config.display;

    match cli.command {
        Command::Add {
            title,
            amount,
            category,
            date,
            notes,
            receipt,
        } => {
            let mut draft = ExpenseDraft::new(title, amount, category);
            draft.date = date;
            draft.notes = notes;
            draft.receipt_image = receipt;
            let id = app::add_expense_draft(&storage, clock, draft).await?;
            let stored = find_expense(&storage, id).await?;
            print_json(&ExpenseOutput::new(&stored, display))?;
        }
        Command::Update {
            id,
            title,
            amount,
            category,
            date,
            notes,
            receipt,
        } => {
            let mut expense = find_expense(&storage, id).await?;
            if let Some(title) = title {
                expense.title = title.trim().to_string();
            }
            if let Some(amount) = amount {
                expense.amount = app::parse_amount(&amount).map_err(app::ExpenseError::from)?;
            }
            if let Some(category) = category {
                expense.category = category;
            }
            if let Some(date) = date {
                expense = expense.with_date(date);
            }
            if let Some(notes) = notes {
                expense = expense.with_notes(notes);
            }
            if let Some(receipt) = receipt {
                expense = expense.with_receipt_image(receipt);
            }
            let updated = app::update_expense(&storage, clock, &expense).await?;
            print_json(&ExpenseOutput::new(&updated, display))?;
        }
        Command::Delete { id } => {
            let deleted = app::delete_expense(&storage, id).await?;
            print_json(&serde_json::json!({ "id": id.get(), "deleted": deleted }))?;
        }
        Command::Show { id } => {
            let expense = find_expense(&storage, id).await?;
            print_json(&ExpenseOutput::new(&expense, display))?;
        }
        Command::List {
            start,
            end,
            category,
            group_by,
        } => {
            let filter = ExpenseFilter {
                start_date: start,
                end_date: end,
                category,
                group_by: group_by.into(),
            };
            let grouped = app::filter_expenses(&storage, &filter).await?;
            print_json(&ListOutput::new(&grouped, display)?)?;
        }
        Command::Report {
            period,
            start,
            end,
            format,
            output,
        } => {
            let period = match start.zip(end) {
                Some((start, end)) => ReportPeriod::Custom { start, end },
                None => period.into(),
            };
            let report = app::expense_report(&storage, clock, period).await?;

            let export_format = match format {
                FormatArg::Json => None,
                FormatArg::Csv => Some(ExportFormat::Csv),
                FormatArg::Text => Some(ExportFormat::Text),
            };
            let rendered = match export_format {
                None => serde_json::to_string_pretty(&ReportOutput::new(&report, display))? + "\n",
                Some(export_format) => {
                    app::export_report(&report, export_format, clock.now(), display.symbol())?
                }
            };

            match output {
                Some(path) => {
                    let path = if path.is_dir() {
                        path.join(match export_format {
                            Some(export_format) => app::export_file_name(period, export_format),
                            None => format!("expense_report_{}.json", period.slug()),
                        })
                    } else {
                        path
                    };
                    tokio::fs::write(&path, rendered)
                        .await
                        .with_context(|| format!("Failed to write report: {}", path.display()))?;
                    tracing::info!(path = %path.display(), "Wrote expense report");
                    print_json(&serde_json::json!({ "written": path.display().to_string() }))?;
                }
                None => print!("{rendered}"),
            }
        }
        Command::Today => {
            let summary = app::today_summary(&storage, clock).await?;
            print_json(&TodayOutput::new(&summary, display))?;
        }
        Command::Config => {
            print_json(&app::config_output(&cli.config, &config))?;
        }
    }

    Ok(())
}
