//! drip CLI: dividend-reinvested total return from the terminal.
//!
//! Commands:
//! - `calc`: one calculation for a symbol, investment, and look-back
//! - `compare`: the same calculation across several symbols, ranked
//! - `run`: a calculation described by a TOML config file

use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use drip_core::data::PriceBasis;
use drip_runner::config::{DEFAULT_INITIAL_INVESTMENT, DEFAULT_SYMBOL, DEFAULT_YEARS_BACK};
use drip_runner::export::{write_curve_csv, write_json, write_table_csv};
use drip_runner::{
    build_provider, run_calculation, run_calculation_cached, table_rows, BatchRunner, CalcConfig,
    CalcRequest, CalcResult, DataConfig, ResultCache, RunError, SourceKind,
};

const MAX_YEARS_BACK: i64 = 40;
const NO_DATA_MESSAGE: &str = "No data returned. Check the symbol or date range.";

#[derive(Parser)]
#[command(
    name = "drip",
    about = "drip: total return of a stock with every dividend reinvested"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the reinvested growth curve for one symbol.
    Calc {
        /// Ticker symbol, passed to the data source as-is.
        #[arg(default_value = DEFAULT_SYMBOL)]
        symbol: String,

        #[command(flatten)]
        amount: AmountArgs,

        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Run the same calculation for several symbols and rank them.
    Compare {
        /// Ticker symbols (e.g., KO PG JNJ).
        #[arg(required = true)]
        symbols: Vec<String>,

        #[command(flatten)]
        amount: AmountArgs,

        #[command(flatten)]
        data: DataArgs,
    },
    /// Execute a calculation from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Result cache directory. Caching is off without it.
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args)]
struct AmountArgs {
    /// Initial investment in account currency.
    #[arg(long, default_value_t = DEFAULT_INITIAL_INVESTMENT)]
    initial: f64,

    /// Look-back period in whole years (1-40).
    #[arg(
        long,
        default_value_t = DEFAULT_YEARS_BACK,
        value_parser = clap::value_parser!(u32).range(1..=MAX_YEARS_BACK)
    )]
    years: u32,
}

#[derive(Args)]
struct DataArgs {
    /// Where price and dividend history comes from.
    #[arg(long, value_enum, default_value_t = SourceArg::Yahoo)]
    source: SourceArg,

    /// CSV file or directory of <SYMBOL>.csv files (required with --source csv).
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Use Yahoo's raw close instead of the dividend-adjusted close.
    #[arg(long, default_value_t = false)]
    raw_close: bool,

    /// Seed for the synthetic source.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Result cache directory. Caching is off without it.
    #[arg(long)]
    cache_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    Yahoo,
    Csv,
    Synthetic,
}

impl DataArgs {
    fn to_config(&self) -> DataConfig {
        DataConfig {
            source: match self.source {
                SourceArg::Yahoo => SourceKind::Yahoo,
                SourceArg::Csv => SourceKind::Csv,
                SourceArg::Synthetic => SourceKind::Synthetic,
            },
            csv_path: self.csv.clone(),
            price_basis: if self.raw_close {
                PriceBasis::Close
            } else {
                PriceBasis::AdjustedClose
            },
            seed: self.seed,
        }
    }
}

#[derive(Args)]
struct OutputArgs {
    /// Print the rounded daily table.
    #[arg(long, default_value_t = false)]
    table: bool,

    /// Write the rounded table as CSV.
    #[arg(long)]
    export_csv: Option<PathBuf>,

    /// Write the growth curve as CSV.
    #[arg(long)]
    curve_csv: Option<PathBuf>,

    /// Write the full result as JSON.
    #[arg(long)]
    json: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Calc {
            symbol,
            amount,
            data,
            output,
        } => {
            let request = CalcRequest::new(symbol, amount.initial, amount.years);
            run_calc_cmd(&request, &data.to_config(), data.cache_dir.as_ref(), &output)
        }
        Commands::Compare {
            symbols,
            amount,
            data,
        } => run_compare_cmd(&symbols, &amount, &data),
        Commands::Run {
            config,
            cache_dir,
            output,
        } => {
            let config = CalcConfig::from_file(&config)?;
            if i64::from(config.calculation.years_back) > MAX_YEARS_BACK {
                bail!("years_back must be at most {MAX_YEARS_BACK}");
            }
            run_calc_cmd(&config.calculation, &config.data, cache_dir.as_ref(), &output)
        }
    }
}

/// Logs go to stderr so stdout stays clean for results.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn run_calc_cmd(
    request: &CalcRequest,
    data: &DataConfig,
    cache_dir: Option<&PathBuf>,
    output: &OutputArgs,
) -> Result<()> {
    let provider = build_provider(data)?;
    let end = today();
    debug!(symbol = %request.symbol, provider = provider.name(), %end, "starting calculation");

    let outcome = match cache_dir {
        Some(dir) => {
            let cache = ResultCache::new(dir)?;
            run_calculation_cached(request, provider.as_ref(), end, &cache)
        }
        None => run_calculation(request, provider.as_ref(), end),
    };
    let result = outcome.map_err(user_facing)?;

    print_summary(&result);
    if output.table {
        print_table(&result);
    }
    if let Some(path) = &output.export_csv {
        write_table_csv(&result, path)?;
        println!("Table saved to: {}", path.display());
    }
    if let Some(path) = &output.curve_csv {
        write_curve_csv(&result, path)?;
        println!("Growth curve saved to: {}", path.display());
    }
    if let Some(path) = &output.json {
        write_json(&result, path)?;
        println!("Result saved to: {}", path.display());
    }
    Ok(())
}

fn run_compare_cmd(symbols: &[String], amount: &AmountArgs, data: &DataArgs) -> Result<()> {
    let provider = build_provider(&data.to_config())?;
    let cache = data.cache_dir.as_ref().map(ResultCache::new).transpose()?;

    let mut runner = BatchRunner::new(provider.as_ref());
    if let Some(cache) = &cache {
        runner = runner.with_cache(cache);
    }
    let entries = runner.run(symbols, amount.initial, amount.years, today());

    println!();
    println!(
        "=== {} invested, {} year(s), dividends reinvested ===",
        format_money(amount.initial),
        amount.years
    );
    println!(
        "{:<10} {:>16} {:>16} {:>10} {:>8}",
        "Symbol", "Final Value", "Gain", "Return", "CAGR"
    );
    let mut failed = 0;
    for entry in &entries {
        match &entry.outcome {
            Ok(r) => println!(
                "{:<10} {:>16} {:>16} {:>10} {:>8}{}",
                entry.symbol,
                format_money(r.summary.final_value),
                format_money(r.summary.absolute_gain),
                format_percent(r.summary.percent_return),
                format_percent(r.extended.cagr * 100.0),
                if r.is_synthetic() { "  (synthetic)" } else { "" },
            ),
            Err(e) => {
                failed += 1;
                let msg = if e.is_no_data() {
                    NO_DATA_MESSAGE.to_string()
                } else {
                    e.to_string()
                };
                println!("{:<10} error: {msg}", entry.symbol);
            }
        }
    }

    if failed == entries.len() {
        bail!("all {failed} calculation(s) failed");
    }
    Ok(())
}

/// The no-data outcome gets a fixed message; everything else keeps its own text.
fn user_facing(err: RunError) -> anyhow::Error {
    if err.is_no_data() {
        anyhow::anyhow!(NO_DATA_MESSAGE)
    } else {
        err.into()
    }
}

fn print_summary(result: &CalcResult) {
    let s = &result.summary;
    let x = &result.extended;
    println!();
    println!("=== Dividend Reinvestment Result ===");
    println!("Symbol:           {}", result.symbol);
    println!(
        "Period:           {} to {} ({} trading days)",
        result.first_trading_day().unwrap_or(result.start_date),
        result.last_trading_day().unwrap_or(result.end_date),
        result.points.len()
    );
    println!("Initial:          {}", format_money(s.initial_investment));
    println!();
    println!("--- Total Return ---");
    println!("Final Value:      {}", format_money(s.final_value));
    println!("Gain:             {}", format_money(s.absolute_gain));
    println!("Return:           {}", format_percent(s.percent_return));
    println!();
    println!("--- Details ---");
    println!("CAGR:             {}", format_percent(x.cagr * 100.0));
    println!("Max Drawdown:     {}", format_percent(x.max_drawdown * 100.0));
    println!("Reinvestments:    {}", x.reinvestment_count);
    println!("Dividends Reinv.: {}", format_money(x.dividend_cash_reinvested));
    println!("Final Shares:     {:.4}", x.final_shares);
    println!(
        "Price Only:       {} ({})",
        format_money(x.price_only_final_value),
        format_percent(x.price_only_percent_return)
    );
    if result.is_synthetic() {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
}

fn print_table(result: &CalcResult) {
    println!();
    println!(
        "{:<12} {:>12} {:>10} {:>16}",
        "Date", "Close", "Dividends", "Total Value"
    );
    for row in table_rows(result) {
        println!(
            "{:<12} {:>12.2} {:>10.2} {:>16.2}",
            row.date.to_string(),
            row.close,
            row.dividends,
            row.total_value
        );
    }
}

/// `$1,234.56`, with a leading minus for losses.
fn format_money(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}${grouped}.{cents}")
}

fn format_percent(pct: f64) -> String {
    format!("{pct:.2}%")
}
