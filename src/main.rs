//! Foldersight — folder size reporting over a local directory tree.
//!
//! Thin binary entry point. All logic lives in the `foldersight-core`
//! crate; this wrapper wires a filesystem-backed statistics source into
//! the size table and prints a one-shot report.
//!
//! Usage: `foldersight <dir> [--csv FILE] [--json FILE]`

use std::fs::File;
use std::sync::Arc;

use anyhow::{bail, Context};
use foldersight_core::export::{write_report_csv, write_report_json};
use foldersight_core::model::path::parent_folder;
use foldersight_core::source::fs::FsStatsSource;
use foldersight_core::FolderSizeTable;

struct Args {
    root: String,
    csv_out: Option<String>,
    json_out: Option<String>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut root = None;
    let mut csv_out = None;
    let mut json_out = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--csv" => csv_out = Some(args.next().context("--csv requires a file path")?),
            "--json" => json_out = Some(args.next().context("--json requires a file path")?),
            _ if root.is_none() => root = Some(arg),
            _ => bail!("unexpected argument: {arg}"),
        }
    }

    Ok(Args {
        root: root.context("usage: foldersight <dir> [--csv FILE] [--json FILE]")?,
        csv_out,
        json_out,
    })
}

fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

fn main() -> anyhow::Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = parse_args()?;
    tracing::info!("Foldersight reading {}", args.root);

    let source = Arc::new(FsStatsSource::new(args.root.as_str()));
    let mut table = FolderSizeTable::new(source, true);
    table
        .load_all()
        .with_context(|| format!("loading folder statistics from {}", args.root))?;

    // Report on the root plus every top-level folder.
    let folders: Vec<&str> = table
        .iter()
        .map(|entry| entry.root_path.as_str())
        .filter(|path| *path == "/" || parent_folder(path).as_deref() == Some("/"))
        .collect();
    let report = table.folder_report(&folders);

    let mut rows: Vec<_> = report.iter().collect();
    rows.sort_unstable_by_key(|(folder, _)| *folder);
    println!("{:<40} {:>12} {:>12}", "folder", "tree", "exclusive");
    for (folder, entry) in rows {
        println!(
            "{:<40} {:>12} {:>12}",
            folder,
            human_bytes(entry.tree_size),
            human_bytes(entry.tree_size_exclusive)
        );
    }
    println!(
        "{} folders indexed, {} total",
        table.len(),
        human_bytes(table.total_folder_size("/"))
    );

    if let Some(path) = &args.csv_out {
        let file = File::create(path).with_context(|| format!("creating {path}"))?;
        write_report_csv(&report, file)?;
        tracing::info!("report written to {path}");
    }
    if let Some(path) = &args.json_out {
        let file = File::create(path).with_context(|| format!("creating {path}"))?;
        write_report_json(&report, file)?;
        tracing::info!("report written to {path}");
    }

    Ok(())
}
