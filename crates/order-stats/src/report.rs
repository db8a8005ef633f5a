//! Report generation (spreadsheet export and console output)

use anyhow::{Context, Result};
use csv::WriterBuilder;
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use order_stats::{BatchSummary, GroupStatistics, OrderStatus, ProfitModel};

/// Column headers of the statistics sheet
const EXPORT_HEADER: [&str; 13] = [
    "Index",
    "Product",
    "Orders",
    "Unit_Price",
    "Expected_Profit",
    "Platform_Fee",
    "Refund_Count",
    "Refund_Amount",
    "Total_Sales",
    "Total_Cost",
    "Order_States",
    "Total_Profit",
    "Profit_Margin_Pct",
];

/// Blank rows between the group rows and the summary block
const SEPARATOR_ROWS: usize = 2;

/// Number format of money cells in the workbook
const MONEY_FORMAT: &str = "0.00";

/// One cell of a group row
enum Cell<'a> {
    Count(u64),
    Money(f64),
    Text(&'a str),
}

impl Cell<'_> {
    fn to_csv(&self) -> String {
        match self {
            Cell::Count(n) => n.to_string(),
            Cell::Money(v) => format!("{:.2}", v),
            Cell::Text(s) => s.to_string(),
        }
    }
}

fn group_row<'a>(
    idx: usize,
    stats: &'a GroupStatistics,
    model: &ProfitModel,
    states: &'a str,
) -> [Cell<'a>; 13] {
    let figures = model.figures(stats);
    [
        Cell::Count(idx as u64 + 1),
        Cell::Text(&stats.display_name),
        Cell::Count(stats.order_count),
        Cell::Money(stats.avg_unit_price),
        Cell::Money(figures.expected_profit),
        Cell::Money(figures.platform_fee),
        Cell::Count(stats.total_refund_count),
        Cell::Money(stats.total_refund_amount),
        Cell::Money(stats.total_sales),
        Cell::Money(figures.total_cost),
        Cell::Text(states),
        Cell::Money(figures.total_profit),
        Cell::Money(figures.profit_margin),
    ]
}

fn summary_rows(summary: &BatchSummary) -> [(&'static str, Cell<'static>); 7] {
    [
        ("Total Orders", Cell::Count(summary.order_count)),
        ("Total Sales", Cell::Money(summary.total_sales)),
        ("Total Cost", Cell::Money(summary.total_cost)),
        ("Platform Fee", Cell::Money(summary.total_platform_fee)),
        ("Refund Count", Cell::Count(summary.total_refund_count)),
        ("Refund Amount", Cell::Money(summary.total_refund_amount)),
        ("Total Profit", Cell::Money(summary.total_profit)),
    ]
}

/// Write the statistics workbook: bold header, one row per group, then a
/// bold summary block. Money cells keep full precision and display 2 decimals.
pub fn export_statistics_xlsx(
    path: &Path,
    statistics: &[GroupStatistics],
    model: &ProfitModel,
    summary: &BatchSummary,
) -> Result<()> {
    let bold = Format::new().set_bold();
    let money = Format::new().set_num_format(MONEY_FORMAT);
    let bold_money = Format::new().set_bold().set_num_format(MONEY_FORMAT);

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Statistics")?;
    sheet.set_column_width(1, 30)?;
    sheet.set_column_width(10, 30)?;

    for (col, title) in EXPORT_HEADER.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &bold)?;
    }

    for (idx, stats) in statistics.iter().enumerate() {
        let row = idx as u32 + 1;
        let states = stats.order_states.to_string();
        for (col, cell) in group_row(idx, stats, model, &states).iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Count(n) => sheet.write_number(row, col, *n as f64)?,
                Cell::Money(v) => sheet.write_number_with_format(row, col, *v, &money)?,
                Cell::Text(s) => sheet.write_string(row, col, *s)?,
            };
        }
    }

    let mut row = (statistics.len() + 1 + SEPARATOR_ROWS) as u32;
    sheet.write_string_with_format(row, 0, "Summary", &bold)?;
    for (label, value) in summary_rows(summary) {
        row += 1;
        sheet.write_string_with_format(row, 0, label, &bold)?;
        match value {
            Cell::Count(n) => sheet.write_number_with_format(row, 1, n as f64, &bold)?,
            Cell::Money(v) => sheet.write_number_with_format(row, 1, v, &bold_money)?,
            Cell::Text(s) => sheet.write_string_with_format(row, 1, s, &bold)?,
        };
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("  Generated: {}", path.display());

    Ok(())
}

/// Write the statistics sheet as CSV: one row per group, then the batch summary
///
/// CSV carries no styling; the summary block is marked by its "Summary" row.
pub fn export_statistics_csv(
    path: &Path,
    statistics: &[GroupStatistics],
    model: &ProfitModel,
    summary: &BatchSummary,
) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    wtr.write_record(EXPORT_HEADER)?;

    for (idx, stats) in statistics.iter().enumerate() {
        let states = stats.order_states.to_string();
        let row = group_row(idx, stats, model, &states);
        wtr.write_record(row.iter().map(Cell::to_csv))?;
    }

    let blank = vec![""; EXPORT_HEADER.len()];
    for _ in 0..SEPARATOR_ROWS {
        wtr.write_record(&blank)?;
    }

    wtr.write_record(["Summary", ""])?;
    for (label, value) in summary_rows(summary) {
        wtr.write_record([label.to_string(), value.to_csv()])?;
    }

    wtr.flush()?;
    println!("  Generated: {}", path.display());

    Ok(())
}

/// Console row for one group
#[derive(Tabled)]
struct StatisticsRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Product")]
    product: String,
    #[tabled(rename = "Orders")]
    orders: u64,
    #[tabled(rename = "Unit Price")]
    unit_price: String,
    #[tabled(rename = "Exp. Profit")]
    expected_profit: String,
    #[tabled(rename = "Platform Fee")]
    platform_fee: String,
    #[tabled(rename = "Refunds")]
    refunds: u64,
    #[tabled(rename = "Refunded")]
    refund_amount: String,
    #[tabled(rename = "Sales")]
    sales: String,
    #[tabled(rename = "Cost")]
    cost: String,
    #[tabled(rename = "Profit")]
    profit: String,
    #[tabled(rename = "States")]
    states: String,
}

fn money(value: f64) -> String {
    format!("¥{:.4}", value)
}

/// Print the statistics table
pub fn print_statistics(statistics: &[GroupStatistics], model: &ProfitModel) {
    let rows: Vec<StatisticsRow> = statistics
        .iter()
        .enumerate()
        .map(|(idx, stats)| {
            let figures = model.figures(stats);
            StatisticsRow {
                index: idx + 1,
                product: stats.display_name.clone(),
                orders: stats.order_count,
                unit_price: money(stats.avg_unit_price),
                expected_profit: format!("{:.2}", figures.expected_profit),
                platform_fee: money(figures.platform_fee),
                refunds: stats.total_refund_count,
                refund_amount: money(stats.total_refund_amount),
                sales: money(stats.total_sales),
                cost: money(figures.total_cost),
                profit: money(figures.total_profit),
                states: stats.order_states.to_string(),
            }
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
}

/// Print the batch summary
pub fn print_summary(summary: &BatchSummary) {
    println!("\n============================================================");
    println!("                      BATCH SUMMARY");
    println!("============================================================\n");

    println!("  Total Orders:        {:>14}", summary.order_count);
    println!("  Total Sales:         {:>14}", money(summary.total_sales));
    println!("  Total Cost:          {:>14}", money(summary.total_cost));
    println!("  Platform Fee:        {:>14}", money(summary.total_platform_fee));
    println!("  Refund Count:        {:>14}", summary.total_refund_count);
    println!("  Refund Amount:       {:>14}", money(summary.total_refund_amount));
    println!("  ─────────────────────────────────────");
    println!("  Total Profit:        {:>14}", money(summary.total_profit));
    println!("============================================================");
}

/// Print the status code -> label mapping
pub fn print_status_labels() {
    println!("Code   Label");
    println!("{}", "-".repeat(30));
    for status in OrderStatus::KNOWN {
        println!("{:<6} {}", status.code(), status);
    }
    println!("\nOther codes are shown as \"status-<code>\".");
}
