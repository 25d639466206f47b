//! Summary table output.
//!
//! Cells follow fixed formatting so that identical rows always serialize to
//! identical bytes: a null value is an empty cell, opening times are JSON
//! arrays of `HH:MM-HH:MM` strings, distances carry two decimals.

use std::path::{Path, PathBuf};

use csv::Writer;
use gpfinder_core::{SurgerySummary, DAYS_OF_THE_WEEK, SUMMARY_COLUMNS};

use crate::error::WriteError;

/// Output file name for `postcode`'s summary.
#[must_use]
pub fn summary_file_name(postcode: &gpfinder_core::Postcode) -> String {
    format!("{}_surgery_summaries.csv", postcode.as_str())
}

/// Formats one row as the cells of [`SUMMARY_COLUMNS`], in order.
///
/// # Errors
///
/// Returns [`WriteError::Encode`] if an opening-times list cannot be
/// serialized.
pub fn summary_record(row: &SurgerySummary) -> Result<Vec<String>, WriteError> {
    let mut record = Vec::with_capacity(SUMMARY_COLUMNS.len());
    record.push(row.id.clone());
    record.push(row.name.clone());
    record.push(row.nhs_url.clone());
    record.push(row.address.clone().unwrap_or_default());
    record.push(row.phone_number.clone().unwrap_or_default());
    record.push(
        row.distance_miles
            .map(|d| format!("{d:.2}"))
            .unwrap_or_default(),
    );
    record.push(
        row.is_in_catchment
            .as_flag()
            .map(|flag| flag.to_string())
            .unwrap_or_default(),
    );
    record.push(row.website.clone().unwrap_or_default());

    for day in DAYS_OF_THE_WEEK {
        let cell = match &row.opening_times {
            Some(times) => serde_json::to_string(&times.formatted(day))?,
            None => String::new(),
        };
        record.push(cell);
    }

    match row.ratings {
        Some(ratings) => {
            record.push(ratings.count.to_string());
            record.push(format!("{:?}", ratings.mean));
            record.push(ratings.min.to_string());
            record.push(ratings.max.to_string());
        }
        None => record.resize(record.len() + 4, String::new()),
    }

    Ok(record)
}

/// Writes `rows` with a header line to `path`.
///
/// The table is written to a sibling temp file and renamed into place, so
/// `path` either keeps its previous contents or holds the complete new table.
///
/// # Errors
///
/// Returns [`WriteError`] if the directory, temp file, or rename fails.
pub fn write_summary_csv(path: &Path, rows: &[SurgerySummary]) -> Result<(), WriteError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| WriteError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let tmp_path = tmp_sibling(path);
    let mut writer = Writer::from_path(&tmp_path)?;
    writer.write_record(SUMMARY_COLUMNS)?;
    for row in rows {
        writer.write_record(summary_record(row)?)?;
    }
    writer.flush().map_err(|source| WriteError::Io {
        path: tmp_path.clone(),
        source,
    })?;
    drop(writer);

    std::fs::rename(&tmp_path, path).map_err(|source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), rows = rows.len(), "wrote surgery summary");
    Ok(())
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
