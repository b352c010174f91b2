//! Save a table as CSV.

use std::path::Path;

use anyhow::{Context, Result};
use csv::WriterBuilder;

use crate::series::{Table, DATE_FORMAT};

pub fn save_table(table: &Table, file_path: &Path) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .from_path(file_path)
        .with_context(|| format!("Failed to create {}", file_path.display()))?;

    let mut header = Vec::with_capacity(table.columns.len() + 1);
    header.push("date");
    header.extend(table.columns.iter().map(String::as_str));
    writer.write_record(&header)?;

    for (date, values) in &table.rows {
        let mut record = Vec::with_capacity(values.len() + 1);
        record.push(date.format(DATE_FORMAT).to_string());
        record.extend(values.iter().map(|v| v.map(format_value).unwrap_or_default()));
        writer.write_record(&record)?;
    }

    writer.flush()?;

    Ok(())
}

/// Shortest representation that reads back to the same value, always with
/// a decimal point or exponent (`12.0`, `0.25`, `-9e33`).
pub fn format_value(value: f64) -> String {
    format!("{:?}", value)
}

// -- Tests -------------------------------------------------------------------
