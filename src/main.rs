use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use dbpull::config::AppConfig;
use dbpull::model::ExportSummary;
use dbpull::month::MonthSelection;
use dbpull::{ExportError, Result, export, input, registry, tunnel};

fn main() {
    let cli = Cli::parse();
    match run(cli) {
        Ok(summary) => {
            let _ = summary.write_report(std::io::stdout());
            if summary.failed() > 0 {
                process::exit(4);
            }
        }
        Err(error) => {
            eprintln!("error: {error}");
            process::exit(error.exit_code());
        }
    }
}

fn run(cli: Cli) -> Result<ExportSummary> {
    init_tracing()?;

    let month_text = match cli.month {
        Some(month) => month,
        None => {
            let stdin = std::io::stdin();
            input::read_month(&mut stdin.lock(), &mut std::io::stderr())?
        }
    };
    let selection = MonthSelection::parse(&month_text)?;
    let range = selection.range()?;
    let label = selection.label();

    let config = AppConfig::load(&cli.config)?;
    tunnel::with_database(&config, |conn| {
        Ok(export::export_all(
            conn,
            registry::TABLES,
            &range,
            &label,
            &cli.output_dir,
        ))
    })
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|error| ExportError::Logging(error.to_string()))
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Export one month of table data from MySQL, over an SSH tunnel, to Excel and CSV."
)]
struct Cli {
    /// Month to export in YYYY/MM form; prompts on stdin when omitted.
    #[arg(long)]
    month: Option<String>,

    /// Path to the TOML configuration file with [ssh] and [database] sections.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Directory receiving the workbook and CSV files.
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,
}
