// src/fetch.rs

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::{debug, info, instrument};
use url::Url;

/// The UNESCO World Heritage List, English edition, as XML.
pub const WHC_LIST_URL: &str = "https://whc.unesco.org/en/list/xml";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Parsed form of [`WHC_LIST_URL`].
pub fn whc_list_url() -> Result<Url> {
    Url::parse(WHC_LIST_URL).with_context(|| format!("parsing feed URL {}", WHC_LIST_URL))
}

/// HTTP client used for the download. No timeout: the request runs to completion.
pub fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("building HTTP client")
}

/// One GET against `url`, returning the whole body as text.
///
/// Non-success statuses and bodies that are not valid UTF-8 are errors.
#[instrument(level = "info", skip(client, url), fields(url = %url))]
pub async fn fetch_list_xml(client: &Client, url: &Url) -> Result<String> {
    debug!("requesting site list");
    let bytes = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("GET {} failed", url))?
        .error_for_status()
        .with_context(|| format!("Non-success status {}", url))?
        .bytes()
        .await
        .with_context(|| format!("reading body from {}", url))?;

    let xml = String::from_utf8(bytes.to_vec())
        .with_context(|| format!("body from {} is not valid UTF-8", url))?;
    info!(bytes = xml.len(), "fetched site list");
    Ok(xml)
}
