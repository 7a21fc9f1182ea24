//! Read and profile CSV files for data-analysis workflows.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};

use sheet_profile::logging;
use sheet_profile::services::{csv_loader, profiler, render};

#[derive(Parser, Debug)]
#[command(
    name = "read-csv",
    about = "Read and profile CSV files",
    after_help = "Examples:\n  \
      read-csv data.csv                        # First 100 rows as Markdown\n  \
      read-csv data.csv --profile --no-data    # Statistical profile only\n  \
      read-csv data.csv --format json --rows 0 # Whole file as JSON\n  \
      read-csv data.csv --sep ';' --head 5     # Quick preview"
)]
struct Cli {
    /// Path to CSV file
    file: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Md)]
    format: OutputFormat,

    /// Max rows to output (0 = all)
    #[arg(long, default_value_t = 100)]
    rows: usize,

    /// Show only first N rows
    #[arg(long)]
    head: Option<usize>,

    /// Full statistical profile
    #[arg(long)]
    profile: bool,

    /// File encoding (default: auto-detect)
    #[arg(long)]
    encoding: Option<String>,

    /// Delimiter (default: auto-detect)
    #[arg(long)]
    sep: Option<char>,

    /// Profile only, skip data output
    #[arg(long = "no-data")]
    no_data: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq)]
enum OutputFormat {
    Md,
    Json,
    Summary,
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

    let table = csv_loader::load_csv(&cli.file, cli.encoding.as_deref(), cli.sep)?;
    let total = table.df.height();
    let summary_mode = cli.format == OutputFormat::Summary;

    if cli.profile || summary_mode {
        let profile = profiler::profile_table(&table.df)?;
        let file_size = std::fs::metadata(&cli.file)?.len();
        println!("{}", render::csv_profile(&profile, &file_name, file_size));
        if cli.no_data || summary_mode {
            return Ok(());
        }
    }

    if cli.no_data {
        return Ok(());
    }

    let n_out = render::resolve_output_rows(total, cli.rows, cli.head);
    let truncated = n_out < total;

    match cli.format {
        OutputFormat::Md | OutputFormat::Summary => {
            if !cli.profile {
                println!("# {file_name}\n");
                println!(
                    "**{} rows × {} columns** | encoding: {} | sep: `{}`\n",
                    render::fmt_count(total),
                    table.df.width(),
                    table.encoding,
                    table.separator
                );
            }
            println!(
                "\n## Data ({} of {} rows)\n",
                render::fmt_count(n_out),
                render::fmt_count(total)
            );
            println!("{}", render::sample_table(&table.df, n_out, 4)?);
            if truncated {
                println!(
                    "\n*… {} more rows. Use --rows 0 to output all.*",
                    render::fmt_count(total - n_out)
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", render::csv_json(&table, &cli.file, n_out)?);
        }
    }

    Ok(())
}
