//! Order Statistics
//!
//! Reads third-party order-list exports, groups orders per product and
//! prints/exports a profit summary.

mod report;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use order_stats::config::FileConfig;
use order_stats::payload::Submission;
use order_stats::{
    calculate_statistics, constants, AcceptancePolicy, BatchSummary, Config, ProfitOverrides,
};

#[derive(Parser, Debug)]
#[command(name = "order-stats")]
#[command(about = "Per-product order statistics and profit summary")]
struct Args {
    /// Config file (defaults apply when it does not exist)
    #[arg(short, long, default_value = constants::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the statistics report from one or more order payloads
    Report {
        /// JSON payload files with an "orderList" array ("-" reads stdin)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output directory for the exported sheet
        #[arg(short, long, default_value = "./output")]
        output_dir: PathBuf,

        /// Export format
        #[arg(long, value_enum, default_value = "xlsx")]
        format: ExportFormat,

        /// Expected profit per order for a product, e.g. "Widget (¥10)=0.5"
        #[arg(long = "expected-profit", value_name = "NAME=VALUE", value_parser = parse_override)]
        expected_profit: Vec<(String, f64)>,

        /// How to handle rejected payloads (overrides the config file)
        #[arg(long, value_enum)]
        accept: Option<AcceptArg>,

        /// Skip writing the export
        #[arg(long)]
        no_export: bool,
    },

    /// Show the platform fee charged on amounts
    Fee {
        #[arg(required = true, allow_negative_numbers = true)]
        amounts: Vec<f64>,
    },

    /// List order status codes and their labels
    States,
}

/// Command-line spelling of [`AcceptancePolicy`]
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum AcceptArg {
    /// Reject the submission on the first rejected payload
    AllOrNothing,
    /// Keep every accepted payload, skip rejected ones
    ValidOnly,
}

impl From<AcceptArg> for AcceptancePolicy {
    fn from(arg: AcceptArg) -> Self {
        match arg {
            AcceptArg::AllOrNothing => AcceptancePolicy::AllOrNothing,
            AcceptArg::ValidOnly => AcceptancePolicy::ValidOnly,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ExportFormat {
    /// Excel workbook with a bold summary block
    Xlsx,
    /// Plain CSV
    Csv,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }
}

/// Parse "NAME=VALUE"; the name may itself contain '='
fn parse_override(raw: &str) -> Result<(String, f64), String> {
    let (name, value) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))?;

    let name = name.trim();
    if name.is_empty() {
        return Err("product name must not be empty".to_string());
    }

    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid expected profit '{}'", value.trim()))?;

    Ok((name.to_string(), value))
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let file_config = FileConfig::load_or_default(&args.config)?;

    match args.command {
        Command::Report {
            files,
            output_dir,
            format,
            expected_profit,
            accept,
            no_export,
        } => {
            let config = Config::from_file(&file_config, accept.map(AcceptancePolicy::from))?;
            let export = (!no_export).then_some((output_dir.as_path(), format));
            run_report(&config, &files, &expected_profit, export)
        }
        Command::Fee { amounts } => {
            let config = Config::from_file(&file_config, None)?;
            println!("{:>16} {:>14}", "Amount", "Fee");
            println!("{}", "-".repeat(31));
            for amount in amounts {
                println!("{:>16.2} {:>14.4}", amount, config.fees.fee(amount));
            }
            Ok(())
        }
        Command::States => {
            report::print_status_labels();
            Ok(())
        }
    }
}

/// Read one payload per file; "-" means stdin
fn read_payloads(files: &[PathBuf]) -> Result<Vec<String>> {
    files
        .iter()
        .map(|path| {
            if path.as_os_str() == "-" {
                let mut input = String::new();
                std::io::stdin()
                    .read_to_string(&mut input)
                    .context("Failed to read payload from stdin")?;
                Ok(input)
            } else {
                std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read payload {}", path.display()))
            }
        })
        .collect()
}

/// "statistics_<YYYY-MM-DD>.<ext>"
fn export_filename(format: ExportFormat, date: chrono::NaiveDate) -> String {
    format!(
        "{}_{}.{}",
        constants::STATISTICS_EXPORT_PREFIX,
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

/// Load, aggregate, apply overrides, print and export
fn run_report(
    config: &Config,
    files: &[PathBuf],
    cli_overrides: &[(String, f64)],
    export: Option<(&Path, ExportFormat)>,
) -> Result<()> {
    let inputs = read_payloads(files)?;
    let submission = Submission::from_inputs(&inputs)?;

    for outcome in submission.outcomes() {
        match outcome {
            Ok(accepted) => info!(
                "Payload #{}: {} order(s), {} incomplete",
                accepted.index + 1,
                accepted.records.len(),
                accepted.invalid_count
            ),
            Err(e) => warn!("{}", e),
        }
    }

    let batch = submission.into_batch(config.policy)?;
    if batch.invalid_count > 0 {
        println!(
            "Warning: {} incomplete order record(s) were filtered out\n",
            batch.invalid_count
        );
    }

    let mut statistics = calculate_statistics(&batch.records, config);

    // Config file first, command line second so it wins on conflicts
    let mut overrides = ProfitOverrides::new();
    let requested = config
        .expected_profit_overrides
        .iter()
        .map(|(name, value)| (name.as_str(), *value))
        .chain(cli_overrides.iter().map(|(name, value)| (name.as_str(), *value)));
    for (name, value) in requested {
        overrides.set_by_display_name(&statistics, name, value);
    }
    overrides.apply(&mut statistics);

    let model = config.profit_model();
    let summary = BatchSummary::from_statistics(&statistics, &model);

    report::print_statistics(&statistics, &model);
    report::print_summary(&summary);

    if let Some((dir, format)) = export {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        let path = dir.join(export_filename(format, chrono::Local::now().date_naive()));
        println!();
        match format {
            ExportFormat::Xlsx => {
                report::export_statistics_xlsx(&path, &statistics, &model, &summary)?
            }
            ExportFormat::Csv => report::export_statistics_csv(&path, &statistics, &model, &summary)?,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_override() {
        assert_eq!(
            parse_override("Widget (¥10)=0.5").unwrap(),
            ("Widget (¥10)".to_string(), 0.5)
        );
        assert_eq!(
            parse_override("a=b (¥1) = 2").unwrap(),
            ("a=b (¥1)".to_string(), 2.0)
        );
        assert!(parse_override("Widget").is_err());
        assert!(parse_override("=0.5").is_err());
        assert!(parse_override("Widget=abc").is_err());
    }

    #[test]
    fn test_cli_parses_report() {
        let args = Args::try_parse_from([
            "order-stats",
            "report",
            "a.json",
            "b.json",
            "--expected-profit",
            "Widget (¥10)=0.5",
            "--accept",
            "valid-only",
        ])
        .unwrap();

        match args.command {
            Command::Report {
                files,
                format,
                expected_profit,
                accept,
                no_export,
                ..
            } => {
                assert_eq!(files.len(), 2);
                assert_eq!(format, ExportFormat::Xlsx);
                assert_eq!(expected_profit, vec![("Widget (¥10)".to_string(), 0.5)]);
                assert_eq!(accept.map(AcceptancePolicy::from), Some(AcceptancePolicy::ValidOnly));
                assert!(!no_export);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_export_format() {
        let args =
            Args::try_parse_from(["order-stats", "report", "a.json", "--format", "csv"]).unwrap();
        match args.command {
            Command::Report { format, .. } => assert_eq!(format, ExportFormat::Csv),
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(Args::try_parse_from(["order-stats", "report", "a.json", "--format", "ods"]).is_err());
    }

    #[test]
    fn test_export_filename() {
        let date = chrono::NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(export_filename(ExportFormat::Xlsx, date), "statistics_2026-03-07.xlsx");
        assert_eq!(export_filename(ExportFormat::Csv, date), "statistics_2026-03-07.csv");
    }

    #[test]
    fn test_cli_requires_payload() {
        assert!(Args::try_parse_from(["order-stats", "report"]).is_err());
    }
}
