use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use glob::glob;
use reqwest::blocking::Client;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use rksdata::output::{
    self, PermitIndexEntry, PermitsIndex, PermitsPayload, ProgrammeIndexEntry, ProgrammesIndex,
    ProgrammesPayload,
};
use rksdata::parse::parse_workbook;
use rksdata::schema::{permits, programmes};
use rksdata::fetch;
use rksdata::sources::{permit_source_url, PROGRAMME_SOURCES};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Dataset {
    Programmes,
    Permits,
    All,
}

struct Args {
    dataset: Dataset,
    me_dir: PathBuf,
    prishtina_dir: PathBuf,
    out_dir: PathBuf,
    fetch: bool,
}

const USAGE: &str = "\
Usage: rksdata [programmes|permits|all] [options]

Options:
  --me-dir <dir>         KAA workbooks directory (default: raw_data/me)
  --prishtina-dir <dir>  permit workbooks directory (default: raw_data/prishtina)
  --out <dir>            output root for generated datasets (default: data)
  --fetch                download the published workbooks before generating
  --help                 show this message
";

fn parse_args() -> Result<Args> {
    let mut args = Args {
        dataset: Dataset::All,
        me_dir: PathBuf::from("raw_data/me"),
        prishtina_dir: PathBuf::from("raw_data/prishtina"),
        out_dir: PathBuf::from("data"),
        fetch: false,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "programmes" => args.dataset = Dataset::Programmes,
            "permits" => args.dataset = Dataset::Permits,
            "all" => args.dataset = Dataset::All,
            "--me-dir" => {
                args.me_dir = PathBuf::from(iter.next().context("--me-dir needs a value")?)
            }
            "--prishtina-dir" => {
                args.prishtina_dir =
                    PathBuf::from(iter.next().context("--prishtina-dir needs a value")?)
            }
            "--out" => args.out_dir = PathBuf::from(iter.next().context("--out needs a value")?),
            "--fetch" => args.fetch = true,
            "--help" | "-h" => {
                print!("{USAGE}");
                std::process::exit(0);
            }
            other => bail!("unknown argument {other:?}\n{USAGE}"),
        }
    }
    Ok(args)
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let args = parse_args()?;
    // one timestamp for the whole run so payloads and indexes agree
    let generated_at = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

    if args.fetch {
        let client = Client::new();
        if args.dataset != Dataset::Permits {
            fetch::fetch_programme_sources(&client, &args.me_dir)?;
        }
        if args.dataset != Dataset::Programmes {
            fetch::fetch_permit_sources(&client, &args.prishtina_dir)?;
        }
    }

    let mut failures = 0;
    if args.dataset != Dataset::Permits {
        failures += generate_programmes(&args.me_dir, &args.out_dir.join("kaa"), &generated_at)?;
    }
    if args.dataset != Dataset::Programmes {
        failures += generate_permits(
            &args.prishtina_dir,
            &args.out_dir.join("prishtina/building_permits"),
            &generated_at,
        )?;
    }

    if failures > 0 {
        bail!("{failures} workbook(s) failed structural checks");
    }
    info!("all datasets generated");
    Ok(())
}

/// Generate the accredited-programmes datasets plus their index. Returns the
/// number of workbooks that failed structural checks.
fn generate_programmes(raw_dir: &Path, out_dir: &Path, generated_at: &str) -> Result<usize> {
    let mut entries: Vec<ProgrammeIndexEntry> = Vec::new();
    let mut failures = 0;

    for source in PROGRAMME_SOURCES {
        let path = raw_dir.join(source.file);
        if !path.exists() {
            bail!("missing required source file: {}", path.display());
        }

        let parsed = match parse_workbook(&path, &programmes::SCHEMA, source.period) {
            Ok(parsed) => parsed,
            Err(err) => {
                error!("{}: {err:#}", path.display());
                failures += 1;
                continue;
            }
        };

        let payload = ProgrammesPayload {
            generated_at: generated_at.to_string(),
            period: source.period,
            record_count: parsed.records.len(),
            institution_count: output::institution_count(&parsed.records),
            source_url: source.source_url,
            source_file: path.display().to_string(),
            records: parsed.records,
            version: source.version,
        };
        let out_file = out_dir.join(source.category).join(source.output_file);
        output::write_json(&out_file, &payload)?;

        entries.push(ProgrammeIndexEntry {
            category: source.category,
            path: format!("{}/{}", source.category, source.output_file),
            period: source.period,
            record_count: payload.record_count,
            institution_count: payload.institution_count,
            source_url: source.source_url,
            source_file: payload.source_file.clone(),
            generated_at: generated_at.to_string(),
            version: source.version,
        });
    }

    output::sort_programme_index(&mut entries);
    output::write_json(
        &out_dir.join("index.json"),
        &ProgrammesIndex {
            generated_at: generated_at.to_string(),
            datasets: entries,
        },
    )?;
    Ok(failures)
}

/// Generate one permits dataset per discovered workbook plus the yearly
/// index. Returns the number of workbooks that failed structural checks.
fn generate_permits(raw_dir: &Path, out_dir: &Path, generated_at: &str) -> Result<usize> {
    let pattern = raw_dir.join("building-permits-*.xlsx");
    let pattern = pattern
        .to_str()
        .with_context(|| format!("non-utf8 raw dir {}", raw_dir.display()))?;
    let mut files: Vec<PathBuf> = glob(pattern)?.filter_map(Result::ok).collect();
    files.sort();
    if files.is_empty() {
        bail!("no workbooks matching {pattern}");
    }

    let mut years: Vec<PermitIndexEntry> = Vec::new();
    let mut failures = 0;

    for path in files {
        let stem = path.file_stem().map(|s| s.to_string_lossy().to_string());
        let Some(year) = stem.as_deref().and_then(output::extract_year) else {
            warn!("cannot read a year from {}, skipping", path.display());
            continue;
        };

        let parsed = match parse_workbook(&path, &permits::SCHEMA, &year.to_string()) {
            Ok(parsed) => parsed,
            Err(err) => {
                error!("{}: {err:#}", path.display());
                failures += 1;
                continue;
            }
        };

        let records_file = format!("permits_{year}.json");
        let payload = PermitsPayload {
            year,
            generated_at: generated_at.to_string(),
            source_url: permit_source_url(year),
            record_count: parsed.records.len(),
            records: parsed.records,
        };
        output::write_json(&out_dir.join(&records_file), &payload)?;

        years.push(PermitIndexEntry {
            year,
            records_file,
            record_count: payload.record_count,
        });
    }

    years.sort_by_key(|entry| std::cmp::Reverse(entry.year));
    output::write_json(
        &out_dir.join("index.json"),
        &PermitsIndex {
            generated_at: generated_at.to_string(),
            years,
        },
    )?;
    Ok(failures)
}
