//! AQT CLI - Command line tool for analysing daily PM2.5 air quality data.

use aqt_cmd::OutputFormat;
use clap::Parser;

#[derive(Parser)]
#[command(
    name = "aqt",
    version,
    about = "PM2.5 air quality toolkit: extremes, trends and AQI"
)]
struct Cli {
    /// Output format for derived records
    #[arg(short, long, value_enum, global = true, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    #[command(subcommand)]
    command: aqt_cmd::Command,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("{:?}", cli.command);
    aqt_cmd::run(cli.command, cli.format)
}
