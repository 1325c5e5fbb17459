//! Report export — CSV and JSON serialization of batch reports.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;

use anyhow::Context;
use compact_str::CompactString;
use serde::Serialize;

use crate::model::FolderReportEntry;

/// One CSV row of a folder report.
#[derive(Serialize)]
struct ReportRow<'a> {
    folder: &'a str,
    tree_size: u64,
    tree_size_exclusive: u64,
}

/// Write a folder report as CSV, one row per folder, sorted by path so the
/// output is stable across runs.
pub fn write_report_csv<W: Write>(
    report: &HashMap<CompactString, FolderReportEntry>,
    out: W,
) -> anyhow::Result<()> {
    let mut rows: Vec<(&CompactString, &FolderReportEntry)> = report.iter().collect();
    rows.sort_unstable_by_key(|(folder, _)| *folder);

    let mut writer = csv::Writer::from_writer(out);
    for (folder, entry) in rows {
        writer
            .serialize(ReportRow {
                folder,
                tree_size: entry.tree_size,
                tree_size_exclusive: entry.tree_size_exclusive,
            })
            .with_context(|| format!("writing CSV row for {folder}"))?;
    }
    writer.flush().context("flushing CSV output")?;
    Ok(())
}

/// Write a folder report as a JSON object keyed by path, sorted by path.
pub fn write_report_json<W: Write>(
    report: &HashMap<CompactString, FolderReportEntry>,
    out: W,
) -> anyhow::Result<()> {
    let ordered: BTreeMap<&str, &FolderReportEntry> = report
        .iter()
        .map(|(folder, entry)| (folder.as_str(), entry))
        .collect();
    serde_json::to_writer_pretty(out, &ordered).context("serializing report to JSON")?;
    Ok(())
}
