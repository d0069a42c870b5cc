// src/pipeline.rs

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::Client;
use std::{
    path::{Path, PathBuf},
    time::Instant,
};
use tracing::{info, instrument};
use url::Url;

use crate::{
    fetch::fetch_list_xml,
    process::{parse_sites, write_snapshot},
};

/// Download the site list from `url`, parse it, and write the dated CSV under `out_dir`.
///
/// Each step finishes before the next starts; nothing is written unless the
/// whole document parsed. Returns the path of the snapshot.
#[instrument(level = "info", skip(client, url, out_dir, date), fields(url = %url, %date))]
pub async fn snapshot<P: AsRef<Path>>(
    client: &Client,
    url: &Url,
    out_dir: P,
    date: NaiveDate,
) -> Result<PathBuf> {
    let start = Instant::now();

    let xml = fetch_list_xml(client, url)
        .await
        .context("fetching World Heritage list")?;

    let table = parse_sites(&xml).context("parsing World Heritage list XML")?;
    info!(
        sites = table.len(),
        columns = table.columns.len(),
        "parsed site list"
    );

    let path = write_snapshot(&table, out_dir, date).context("writing snapshot CSV")?;
    info!(elapsed = ?start.elapsed(), path = %path.display(), "snapshot complete");
    Ok(path)
}
