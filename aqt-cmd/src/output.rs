//! Writing derived records as CSV or JSON.

use clap::ValueEnum;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Header row followed by one row per record
    #[default]
    Csv,
    /// Pretty-printed JSON array
    Json,
}

/// Serialize `records` to `writer` in the requested format.
pub fn write_records<T, W>(records: &[T], format: OutputFormat, mut writer: W) -> anyhow::Result<()>
where
    T: Serialize,
    W: Write,
{
    match format {
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(writer);
            for record in records {
                wtr.serialize(record)?;
            }
            wtr.flush()?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, records)?;
            writeln!(writer)?;
            writer.flush()?;
        }
    }
    Ok(())
}

/// Write to standard output.
pub fn print_records<T: Serialize>(records: &[T], format: OutputFormat) -> anyhow::Result<()> {
    log::debug!("writing {} records as {:?}", records.len(), format);
    let stdout = std::io::stdout();
    write_records(records, format, stdout.lock())
}
