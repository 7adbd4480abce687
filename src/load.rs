use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::settings::Settings;
use crate::db::{self, SaveCounts};
use crate::dump::{DumpError, Page};
use crate::parser::{self, extract::ExtractConfig};
use crate::record::Record;

#[derive(Debug, Default)]
pub struct LoadCounts {
    /// Pages handed to the pipeline.
    pub pages: usize,
    /// Pages outside the main namespace.
    pub skipped: usize,
    pub records: usize,
    pub saved: SaveCounts,
}

impl LoadCounts {
    pub fn print(&self) {
        println!(
            "Read {} pages ({} skipped), extracted {} people.",
            self.pages, self.skipped, self.records
        );
        println!(
            "Saved {} people, {} occupations, {} works, {} awards.",
            self.saved.people, self.saved.occupations, self.saved.works, self.saved.awards,
        );
    }
}

/// Stream `pages` through the pipeline in parallel chunks, saving each chunk
/// before the next is read. A read error stops the load after the pages
/// already read are saved.
pub fn load_dump<I>(
    conn: &Connection,
    pages: I,
    settings: &Settings,
    limit: Option<usize>,
) -> Result<LoadCounts>
where
    I: IntoIterator<Item = Result<Page, DumpError>>,
{
    let config = settings.extract_config();
    let batch_size = settings.batch_size.max(1);

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} pages ({per_sec}) {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(120));

    let mut counts = LoadCounts::default();
    let mut batch: Vec<Page> = Vec::with_capacity(batch_size);
    let mut failure = None;

    for item in pages {
        if limit.is_some_and(|n| counts.pages >= n) {
            break;
        }
        let page = match item {
            Ok(page) => page,
            Err(e) => {
                warn!(error = %e, "dump read failed, saving pages read so far");
                failure = Some(e);
                break;
            }
        };
        if settings.main_namespace_only && page.ns.is_some_and(|ns| ns != 0) {
            counts.skipped += 1;
            continue;
        }
        counts.pages += 1;
        batch.push(page);
        if batch.len() >= batch_size {
            save_batch(conn, &mut batch, &config, &mut counts, &pb)?;
        }
    }
    save_batch(conn, &mut batch, &config, &mut counts, &pb)?;
    pb.finish_and_clear();

    info!(
        pages = counts.pages,
        skipped = counts.skipped,
        records = counts.records,
        "load finished"
    );
    match failure {
        Some(e) => Err(e).context(format!(
            "dump stopped after {} pages ({} people saved)",
            counts.pages, counts.saved.people
        )),
        None => Ok(counts),
    }
}

fn save_batch(
    conn: &Connection,
    batch: &mut Vec<Page>,
    config: &ExtractConfig,
    counts: &mut LoadCounts,
    pb: &ProgressBar,
) -> Result<()> {
    if batch.is_empty() {
        return Ok(());
    }
    let records: Vec<Record> = batch
        .par_iter()
        .filter_map(|page| parser::process_page(page, config))
        .collect();

    counts.records += records.len();
    counts.saved.add(db::save_records(conn, &records)?);
    pb.inc(batch.len() as u64);
    batch.clear();
    Ok(())
}

// ── Tests ──
