//! Catalog providers backed by memory or a catalog directory.

use super::{Catalog, CatalogProvider, Language};
use crate::errors::{ScanviewError, ScanviewResult};
use rayon::prelude::*;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Serves catalogs already held in memory.
#[derive(Debug, Default, Clone)]
pub struct StaticCatalogProvider {
    catalogs: HashMap<Language, Arc<Catalog>>,
}

impl StaticCatalogProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.insert(catalog);
        self
    }

    pub fn insert(&mut self, catalog: Catalog) {
        self.catalogs.insert(catalog.language(), Arc::new(catalog));
    }
}

impl CatalogProvider for StaticCatalogProvider {
    fn get(&self, language: Language) -> ScanviewResult<Arc<Catalog>> {
        resolve(&self.catalogs, language)
    }
}

/// Loads every `<code>.json` catalog found in a directory.
#[derive(Debug, Clone)]
pub struct DirCatalogProvider {
    root: PathBuf,
    catalogs: HashMap<Language, Arc<Catalog>>,
}

impl DirCatalogProvider {
    pub fn load(root: impl AsRef<Path>) -> ScanviewResult<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(ScanviewError::io(
                std::io::Error::new(std::io::ErrorKind::NotFound, "catalog directory not found"),
                root,
            ));
        }

        let files = discover(&root)?;
        log::debug!("Discovered {} catalog files in {:?}", files.len(), root);

        let catalogs: HashMap<Language, Arc<Catalog>> = files
            .par_iter()
            .filter_map(|(language, path)| match Catalog::from_file(*language, path) {
                Ok(catalog) => {
                    log::debug!("Loaded {} catalog with {} entries", language, catalog.len());
                    Some((*language, Arc::new(catalog)))
                }
                Err(e) => {
                    log::warn!("Skipping malformed catalog {:?}: {}", path, e);
                    None
                }
            })
            .collect();

        log::info!("Loaded {} issue catalogs from {:?}", catalogs.len(), root);
        Ok(Self { root, catalogs })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn languages(&self) -> Vec<Language> {
        let mut languages: Vec<Language> = self.catalogs.keys().copied().collect();
        languages.sort_by_key(|l| l.index());
        languages
    }
}

impl CatalogProvider for DirCatalogProvider {
    fn get(&self, language: Language) -> ScanviewResult<Arc<Catalog>> {
        resolve(&self.catalogs, language)
    }
}

/// Find `<code>.json` files directly under `root`.
fn discover(root: &Path) -> ScanviewResult<Vec<(Language, PathBuf)>> {
    let pattern = Regex::new(r"^([a-z]{2})\.json$")
        .map_err(|e| ScanviewError::external("catalog file pattern", e.to_string()))?;

    let mut files = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Cannot read catalog directory entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        let Some(code) = pattern.captures(&file_name).and_then(|c| c.get(1)) else {
            continue;
        };
        match Language::from_code(code.as_str()) {
            Some(language) => files.push((language, entry.path().to_path_buf())),
            None => log::debug!("Ignoring catalog for unsupported language '{}'", code.as_str()),
        }
    }
    Ok(files)
}

/// Requested language, else English, else `CatalogUnavailable`.
fn resolve(
    catalogs: &HashMap<Language, Arc<Catalog>>,
    language: Language,
) -> ScanviewResult<Arc<Catalog>> {
    if let Some(catalog) = catalogs.get(&language) {
        return Ok(Arc::clone(catalog));
    }
    match catalogs.get(&Language::English) {
        Some(catalog) => {
            log::warn!("No {} catalog loaded; using {}", language, Language::English);
            Ok(Arc::clone(catalog))
        }
        None => Err(ScanviewError::CatalogUnavailable(language)),
    }
}
