// src/fetch/mod.rs
//! Download the published workbooks into the raw-data directories.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use tracing::info;
use url::Url;

use crate::sources::{PERMIT_SOURCES, PROGRAMME_SOURCES};

/// Download `url_str` and save it as `dest`. Returns the saved path.
pub fn download(client: &Client, url_str: &str, dest: &Path) -> Result<PathBuf> {
    let url = Url::parse(url_str).with_context(|| format!("invalid source url {url_str}"))?;

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let resp = client
        .get(url.as_str())
        .send()
        .and_then(|r| r.error_for_status())
        .with_context(|| format!("fetching {url_str}"))?;
    let bytes = resp.bytes()?;
    fs::write(dest, &bytes).with_context(|| format!("writing {}", dest.display()))?;
    info!(url = %url_str, dest = %dest.display(), size = bytes.len(), "downloaded");

    Ok(dest.to_path_buf())
}

/// Fetch every accreditation table into `raw_dir` under its published name.
pub fn fetch_programme_sources(client: &Client, raw_dir: &Path) -> Result<()> {
    for source in PROGRAMME_SOURCES {
        download(client, source.source_url, &raw_dir.join(source.file))?;
    }
    Ok(())
}

/// Fetch every yearly permit list into `raw_dir`. The upload names are
/// unstable across revisions, so files are saved under a normalized
/// `building-permits-{year}.xlsx` name instead.
pub fn fetch_permit_sources(client: &Client, raw_dir: &Path) -> Result<()> {
    for (year, url) in PERMIT_SOURCES {
        let dest = raw_dir.join(format!("building-permits-{year}.xlsx"));
        download(client, url, &dest)?;
    }
    Ok(())
}
