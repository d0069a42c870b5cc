// src/process/write.rs

use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::{ReaderBuilder, Terminator, WriterBuilder};
use std::{
    fs,
    iter,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};

use super::table::Table;

/// Where snapshots land, relative to the working directory.
pub const OUTPUT_DIR: &str = "downloaded-files";

/// Every snapshot file name starts with this.
pub const FILE_PREFIX: &str = "whc-en-";

/// `whc-en-YYYY-MM-DD.csv` for `date`.
pub fn snapshot_file_name(date: NaiveDate) -> String {
    format!("{}{}.csv", FILE_PREFIX, date.format("%Y-%m-%d"))
}

/// Write `table` as `<dir>/whc-en-<date>.csv`, replacing any snapshot already there.
///
/// - `dir` is created if it does not exist
/// - the CSV is written to a hidden temp file in `dir` and renamed into place,
///   so a failed write never leaves a partial snapshot behind
///
/// Layout: a leading unnamed index column (`0..N`), then one column per field;
/// missing values are empty fields.
#[instrument(level = "info", skip(table, dir, date), fields(dir = %dir.as_ref().display(), %date))]
pub fn write_snapshot<P: AsRef<Path>>(table: &Table, dir: P, date: NaiveDate) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).with_context(|| format!("creating output directory {:?}", dir))?;

    let file_name = snapshot_file_name(date);
    let path = dir.join(&file_name);
    let tmp_path = dir.join(format!(".{}.tmp", file_name));

    if let Err(e) = write_csv(table, &tmp_path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    fs::rename(&tmp_path, &path)
        .with_context(|| format!("renaming {:?} -> {:?}", tmp_path, path))?;

    info!(
        rows = table.len(),
        columns = table.columns.len(),
        path = %path.display(),
        "wrote snapshot"
    );
    Ok(path)
}

fn write_csv(table: &Table, path: &Path) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_path(path)
        .with_context(|| format!("creating {:?}", path))?;

    // empty first header cell sits over the row index
    wtr.write_record(iter::once("").chain(table.columns.iter().map(String::as_str)))
        .context("writing CSV header")?;
    for (idx, row) in table.rows.iter().enumerate() {
        let index = idx.to_string();
        wtr.write_record(
            iter::once(index.as_str()).chain(row.iter().map(|v| v.as_deref().unwrap_or(""))),
        )
        .with_context(|| format!("writing CSV row {}", idx))?;
    }
    wtr.flush().with_context(|| format!("flushing {:?}", path))?;
    debug!(path = %path.display(), "csv flushed");
    Ok(())
}

/// Load a snapshot written by [`write_snapshot`] back into a [`Table`].
///
/// The unnamed index column is dropped and empty fields come back as `None`.
pub fn read_snapshot<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to open snapshot {:?}", path))?;

    let headers = rdr
        .headers()
        .with_context(|| format!("reading CSV header of {:?}", path))?
        .clone();
    let skip = usize::from(headers.get(0) == Some(""));
    let columns: Vec<String> = headers.iter().skip(skip).map(str::to_string).collect();

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result
            .with_context(|| format!("CSV parse error in {:?} at record {}", path, idx))?;
        rows.push(
            record
                .iter()
                .skip(skip)
                .map(|v| (!v.is_empty()).then(|| v.to_string()))
                .collect(),
        );
    }

    Ok(Table { columns, rows })
}
