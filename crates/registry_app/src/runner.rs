use std::io::Write;

use anyhow::Context;
use registry_core::{Record, RecordKind, SearchQuery};
use registry_engine::{Crawler, PageSource};
use registry_logging::{registry_error, registry_info, registry_warn};
use serde::Serialize;

use crate::config::AppConfig;

/// Counts for the end-of-run log line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub searches: usize,
    pub failed_searches: usize,
    pub rows: usize,
    pub details: usize,
    pub failed_details: usize,
}

#[derive(Serialize)]
struct OutputLine<'a> {
    record_type: &'a str,
    search: &'a str,
    scraped_at: String,
    #[serde(flatten)]
    record: &'a Record,
}

/// Runs every configured search and writes one JSON object per line to `out`.
///
/// A failing search or detail page is logged and skipped; only write errors
/// abort the run.
pub async fn run<S: PageSource, W: Write>(
    crawler: &mut Crawler<S>,
    config: &AppConfig,
    out: &mut W,
) -> anyhow::Result<RunSummary> {
    let mut summary = RunSummary::default();
    for query in &config.searches {
        summary.searches += 1;
        let description = query.describe();
        let rows = match crawler.search(query).await {
            Ok(rows) => rows,
            Err(err) => {
                registry_error!("Search {} failed: {}", description, err);
                summary.failed_searches += 1;
                continue;
            }
        };

        for row in &rows {
            write_line(out, "search_row", &description, row)?;
            summary.rows += 1;
        }
        if config.follow_details {
            follow_details(crawler, query, &rows, out, &mut summary).await?;
        }
    }
    out.flush().context("flushing output")?;
    registry_info!(
        "Finished {} searches ({} failed): {} rows, {} detail records",
        summary.searches,
        summary.failed_searches,
        summary.rows,
        summary.details
    );
    Ok(summary)
}

async fn follow_details<S: PageSource, W: Write>(
    crawler: &mut Crawler<S>,
    query: &SearchQuery,
    rows: &[Record],
    out: &mut W,
    summary: &mut RunSummary,
) -> anyhow::Result<()> {
    let kind = query.target().record_kind();
    let description = query.describe();
    for link in rows.iter().flat_map(|row| detail_links(row, kind)) {
        match crawler.detail(kind, link).await {
            Ok(Some(record)) => {
                write_line(out, kind_label(kind), &description, &record)?;
                summary.details += 1;
            }
            Ok(None) => {}
            Err(err) => {
                registry_warn!("Detail {} failed: {}", link, err);
                summary.failed_details += 1;
            }
        }
    }
    Ok(())
}

/// `*_link` values of a row that point at a record of `kind`.
fn detail_links(row: &Record, kind: RecordKind) -> impl Iterator<Item = &str> {
    row.iter()
        .filter(|(key, _)| key.ends_with("_link"))
        .map(|(_, link)| link.as_str())
        .filter(move |link| RecordKind::from_link(link) == Some(kind))
}

fn kind_label(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Dog => "dog",
        RecordKind::Person => "person",
        RecordKind::Litter => "litter",
    }
}

fn write_line<W: Write>(
    out: &mut W,
    record_type: &str,
    search: &str,
    record: &Record,
) -> anyhow::Result<()> {
    let line = OutputLine {
        record_type,
        search,
        scraped_at: chrono::Utc::now().to_rfc3339(),
        record,
    };
    serde_json::to_writer(&mut *out, &line).context("serializing record")?;
    out.write_all(b"\n").context("writing output")?;
    Ok(())
}
