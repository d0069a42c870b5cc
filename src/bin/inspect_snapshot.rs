use anyhow::{anyhow, Context, Result};
use glob::glob;
use std::{
    env, fs,
    path::{Path, PathBuf},
    process::exit,
};
use whcscraper::process::{read_snapshot, FILE_PREFIX, OUTPUT_DIR};

fn main() {
    // Optional CLI argument: path to a snapshot CSV. Defaults to the newest one.
    let args: Vec<String> = env::args().collect();
    if args.len() > 2 {
        eprintln!("Usage: {} [SNAPSHOT_CSV]", args[0]);
        exit(1);
    }
    let path = match args.get(1) {
        Some(p) => Ok(PathBuf::from(p)),
        None => latest_snapshot(),
    };
    if let Err(e) = path.and_then(|p| inspect_snapshot(&p)) {
        eprintln!("Error: {:#}", e);
        exit(1);
    }
}

/// Snapshot names embed `YYYY-MM-DD`, so the lexically greatest is the newest.
fn latest_snapshot() -> Result<PathBuf> {
    let pattern = format!("{}/{}*.csv", OUTPUT_DIR, FILE_PREFIX);
    glob(&pattern)
        .with_context(|| format!("Failed to read glob pattern '{}'", pattern))?
        .filter_map(|entry| entry.ok())
        .max()
        .ok_or_else(|| anyhow!("No snapshots found under '{}'", pattern))
}

fn inspect_snapshot(path: &Path) -> Result<()> {
    let table = read_snapshot(path)?;
    let file_size = fs::metadata(path)?.len();

    println!("=== Snapshot: {} ===", path.display());
    println!("Sites:             {}", table.len());
    println!("Columns:           {}", table.columns.len());
    println!("File-size on disk: {} bytes", file_size);
    println!();

    println!("=== Columns ===");
    for (idx, name) in table.columns.iter().enumerate() {
        let filled = table.rows.iter().filter(|row| row[idx].is_some()).count();
        println!("- {:<30} | filled: {}/{}", name, filled, table.len());
    }
    Ok(())
}
