//! Import of JSON catalog files into the SQLite store
//!
//! Each `*.json` file under the source directory is a catalog fragment
//! `{"products": [...], "processes": [...]}`. Fragments are applied in sorted
//! path order so the resulting catalog order is reproducible.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use walkdir::WalkDir;

use crate::catalog::CatalogIndex;
use crate::db;
use crate::error::{ChainError, ChainResult};
use crate::models::Catalog;

/// Find all catalog files under `source_dir`, sorted by path
pub fn find_catalog_files(source_dir: &Path) -> ChainResult<Vec<PathBuf>> {
    if !source_dir.is_dir() {
        return Err(ChainError::invalid_request(format!(
            "{} is not a directory",
            source_dir.display()
        )));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(source_dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}

/// Parse a single catalog fragment
pub fn parse_catalog_file(path: &Path) -> ChainResult<Catalog> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Import every catalog file under `source_dir`.
///
/// Files that fail to parse are counted and skipped. The merged result is
/// validated as a whole before anything is written.
pub fn import_directory(conn: &mut Connection, source_dir: &Path) -> ChainResult<ImportStats> {
    let mut stats = ImportStats::default();
    let files = find_catalog_files(source_dir)?;
    tracing::info!(dir = %source_dir.display(), files = files.len(), "Scanning catalog files");

    let mut merged = db::load_catalog(conn)?;
    let mut fresh = Catalog::default();
    for path in &files {
        match parse_catalog_file(path) {
            Ok(fragment) if fragment.products.is_empty() && fragment.processes.is_empty() => {
                stats.skipped += 1;
            }
            Ok(fragment) => {
                tracing::debug!(
                    file = %path.display(),
                    products = fragment.products.len(),
                    processes = fragment.processes.len(),
                    "Parsed catalog file"
                );
                stats.files += 1;
                stats.products += fragment.products.len();
                stats.processes += fragment.processes.len();
                fresh.extend(fragment);
            }
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "Failed to parse catalog file");
                stats.errors += 1;
            }
        }
    }

    merge_for_validation(&mut merged, &fresh);
    CatalogIndex::new(merged)?;
    db::append_catalog(conn, &fresh)?;
    Ok(stats)
}

/// Apply `fresh` on top of `stored` the way the store will: existing ids are
/// replaced in place, new ids appended.
fn merge_for_validation(stored: &mut Catalog, fresh: &Catalog) {
    for product in &fresh.products {
        match stored.products.iter_mut().find(|p| p.id == product.id) {
            Some(existing) => *existing = product.clone(),
            None => stored.products.push(product.clone()),
        }
    }
    for process in &fresh.processes {
        match stored.processes.iter_mut().find(|p| p.id == process.id) {
            Some(existing) => *existing = process.clone(),
            None => stored.processes.push(process.clone()),
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub files: usize,
    pub products: usize,
    pub processes: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl std::fmt::Display for ImportStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Imported {} files ({} products, {} processes). Skipped: {}, Errors: {}",
            self.files, self.products, self.processes, self.skipped, self.errors
        )
    }
}
