//! Read Excel files for data-analysis workflows.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};

use sheet_profile::logging;
use sheet_profile::services::{excel_loader, profiler, render};

#[derive(Parser, Debug)]
#[command(
    name = "read-excel",
    about = "Read and profile Excel files",
    after_help = "Examples:\n  \
      read-excel report.xlsx                     # First sheet as Markdown\n  \
      read-excel report.xlsx --all-sheets        # List sheets and dimensions\n  \
      read-excel report.xlsx --sheet 2 --profile # Third sheet with profile\n  \
      read-excel report.xlsx --format csv        # Re-serialize as CSV"
)]
struct Cli {
    /// Path to .xlsx or .xls file
    file: PathBuf,

    /// Sheet name or index (default: first)
    #[arg(long)]
    sheet: Option<String>,

    /// List all sheets and their dimensions
    #[arg(long = "all-sheets")]
    all_sheets: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Md)]
    format: OutputFormat,

    /// Max rows to output (0 = all)
    #[arg(long, default_value_t = 100)]
    rows: usize,

    /// Show statistical profile
    #[arg(long)]
    profile: bool,

    /// Show only first N rows
    #[arg(long)]
    head: Option<usize>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq)]
enum OutputFormat {
    Md,
    Csv,
    Json,
}

fn main() -> Result<()> {
    logging::init_logging()?;
    let cli = Cli::parse();

    if !cli.file.exists() {
        eprintln!("Error: File not found: {}", cli.file.display());
        std::process::exit(1);
    }

    let file_name = cli
        .file
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| cli.file.display().to_string());

    if cli.all_sheets {
        println!("## Sheets in {file_name}\n");
        for (index, sheet) in excel_loader::list_sheets(&cli.file)?.iter().enumerate() {
            println!(
                "- **Sheet {index}:** `{}` — {} rows × {} columns",
                sheet.name,
                render::fmt_count(sheet.rows),
                sheet.columns
            );
        }
        return Ok(());
    }

    let table = excel_loader::load_sheet(&cli.file, cli.sheet.as_deref())?;
    let total = table.df.height();

    println!("# {file_name} — Sheet: {}\n", table.sheet_name);
    println!(
        "**{} rows × {} columns**\n",
        render::fmt_count(total),
        table.df.width()
    );

    if cli.profile {
        let profile = profiler::profile_table(&table.df)?;
        println!("{}", render::excel_profile(&profile));
    }

    let n_out = render::resolve_output_rows(total, cli.rows, cli.head);
    let truncated = n_out < total;

    match cli.format {
        OutputFormat::Md => {
            println!(
                "\n## Data ({} of {} rows)\n",
                render::fmt_count(n_out),
                render::fmt_count(total)
            );
            println!("{}", render::sample_table(&table.df, n_out, 2)?);
            if truncated {
                println!(
                    "\n*… {} more rows not shown. Use --rows 0 to output all.*",
                    render::fmt_count(total - n_out)
                );
            }
        }
        OutputFormat::Csv => {
            print!("{}", render::sample_csv(&table.df, n_out)?);
            if truncated {
                eprintln!("# … {} more rows", render::fmt_count(total - n_out));
            }
        }
        OutputFormat::Json => {
            println!("{}", render::excel_json(&table, &cli.file, n_out)?);
        }
    }

    Ok(())
}
