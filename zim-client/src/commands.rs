//! Subcommand handlers
//!
//! Every handler opens the archive, walks the requested structures, and
//! serializes one JSON record per stdout line. Library errors propagate to
//! `main`, which reports them on stderr with a non-zero exit.

use crate::Commands;
use crate::records::{ClusterRecord, EntryRecord, HeaderRecord, PointerRecord};
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use zim_parser::{Archive, Cluster, EntryLocator};

pub fn handle(command: Commands) -> Result<()> {
    match command {
        Commands::Header { filename } => header(&filename),
        Commands::Entries { filename } => entries(&filename),
        Commands::Entry { index, filename } => entry(index, &filename),
        Commands::Clusters { filename } => clusters(&filename),
        Commands::Cluster { index, filename } => cluster(index, &filename),
        Commands::Stream { filename } => stream(&filename),
        Commands::Extract {
            output_dir,
            filename,
        } => extract(&output_dir, &filename),
    }
}

fn open(filename: &Path) -> Result<Archive> {
    Archive::open(filename).with_context(|| format!("failed to open archive {}", filename.display()))
}

fn emit<W: Write, T: Serialize>(out: &mut W, record: &T) -> Result<()> {
    serde_json::to_writer(&mut *out, record)?;
    out.write_all(b"\n")?;
    Ok(())
}

fn header(filename: &Path) -> Result<()> {
    let archive = open(filename)?;
    let mut out = io::stdout().lock();
    emit(&mut out, &HeaderRecord::from(archive.header()))
}

fn entries(filename: &Path) -> Result<()> {
    let archive = open(filename)?;
    let mut out = io::stdout().lock();

    for pointer in archive.entry_offsets(None) {
        let pointer = pointer?;
        let resolved = archive.entry(EntryLocator::Offset(pointer.offset))?;
        let record = EntryRecord::new(Some(pointer.index), pointer.offset, &resolved.entry, None);
        emit(&mut out, &record)?;
    }
    Ok(())
}

fn entry(index: u32, filename: &Path) -> Result<()> {
    let archive = open(filename)?;
    let resolved = archive.entry(EntryLocator::Index(index))?;
    let contents = archive
        .content(&resolved.entry)?
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());

    let mut out = io::stdout().lock();
    emit(
        &mut out,
        &EntryRecord::new(resolved.index, resolved.offset, &resolved.entry, contents),
    )
}

fn clusters(filename: &Path) -> Result<()> {
    let archive = open(filename)?;
    let mut out = io::stdout().lock();

    for pointer in archive.cluster_offsets(None) {
        emit(&mut out, &PointerRecord::from(pointer?))?;
    }
    Ok(())
}

fn cluster(index: u32, filename: &Path) -> Result<()> {
    let archive = open(filename)?;
    let cluster = archive.cluster(index)?;

    let mut out = io::stdout().lock();
    emit(&mut out, &ClusterRecord::from(&cluster))
}

fn stream(filename: &Path) -> Result<()> {
    let archive = open(filename)?;
    let mut out = io::stdout().lock();

    for pointer in archive.entry_offsets(None) {
        let pointer = pointer?;
        let resolved = archive.entry(EntryLocator::Offset(pointer.offset))?;
        let contents = archive
            .content(&resolved.entry)?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());
        let record =
            EntryRecord::new(Some(pointer.index), pointer.offset, &resolved.entry, contents);
        emit(&mut out, &record)?;
    }
    Ok(())
}

fn extract(output_dir: &Path, filename: &Path) -> Result<()> {
    let archive = open(filename)?;

    // The core re-decompresses on every cluster read; keep the last cluster
    // around since consecutive entries usually share one.
    let mut cached: Option<Cluster> = None;
    let mut written = 0u32;
    let mut skipped = 0u32;

    for pointer in archive.entry_offsets(None) {
        let pointer = pointer?;
        let resolved = archive.entry(EntryLocator::Offset(pointer.offset))?;
        let Some((cluster_index, blob_index)) = resolved.entry.location() else {
            skipped += 1;
            continue;
        };

        let Some(path) = entry_path(output_dir, resolved.entry.namespace, &resolved.entry.url)
        else {
            warn!("Skipping entry with unsafe path: {}", resolved.entry.url);
            skipped += 1;
            continue;
        };

        let cluster = match cached.take() {
            Some(cluster) if cluster.index() == cluster_index => cached.insert(cluster),
            _ => cached.insert(
                archive
                    .cluster(cluster_index)
                    .with_context(|| format!("failed to read cluster {cluster_index}"))?,
            ),
        };
        let blob = cluster.blob(blob_index)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, blob)
            .with_context(|| format!("failed to write {}", path.display()))?;
        debug!("Wrote {} ({} bytes)", path.display(), blob.len());
        written += 1;
    }

    info!("Extracted {written} entries to {} ({skipped} skipped)", output_dir.display());
    Ok(())
}

/// Target path for one entry, or `None` when the URL would escape the
/// output directory.
fn entry_path(output_dir: &Path, namespace: char, url: &str) -> Option<PathBuf> {
    let relative = Path::new(url);
    let safe = !url.is_empty()
        && relative.is_relative()
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if !safe {
        return None;
    }
    Some(output_dir.join(namespace.to_string()).join(relative))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_path_joins_namespace_and_url() {
        let path = entry_path(Path::new("out"), 'A', "wiki/Article.html").unwrap();
        assert_eq!(path, Path::new("out/A/wiki/Article.html"));
    }

    #[test]
    fn test_entry_path_refuses_escapes() {
        assert!(entry_path(Path::new("out"), 'A', "../evil").is_none());
        assert!(entry_path(Path::new("out"), 'A', "/etc/passwd").is_none());
        assert!(entry_path(Path::new("out"), 'A', "a/../../b").is_none());
        assert!(entry_path(Path::new("out"), 'A', "").is_none());
    }
}
