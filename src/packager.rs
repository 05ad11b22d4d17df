//! Per-milestone card archives.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{DamError, Result};
use crate::matcher::{CardMatcher, MatchMode};
use crate::models::Milestone;
use crate::store::CardStore;

/// Extension of every milestone archive.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Outcome of packaging one milestone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReport {
    pub identifier: String,
    pub archive: PathBuf,
    /// Card filenames stored in the archive, sorted.
    pub included: Vec<String>,
}

/// Scans the card directory and bundles matching cards into `<identifier>.zip`.
#[derive(Debug, Clone)]
pub struct Packager {
    store: CardStore,
    archive_dir: PathBuf,
    mode: MatchMode,
}

impl Packager {
    pub fn new(store: CardStore, archive_dir: impl Into<PathBuf>, mode: MatchMode) -> Self {
        Self {
            store,
            archive_dir: archive_dir.into(),
            mode,
        }
    }

    pub fn archive_path(&self, milestone: &Milestone) -> PathBuf {
        self.archive_dir
            .join(format!("{}.{}", milestone.identifier, ARCHIVE_EXTENSION))
    }

    /// Package one milestone. An existing archive of the same name is replaced.
    pub fn package(&self, milestone: &Milestone) -> Result<PackageReport> {
        let matcher = self.mode.matcher(&milestone.selection)?;
        let included = self.select(matcher.as_ref())?;

        fs::create_dir_all(&self.archive_dir).map_err(|e| DamError::io(&self.archive_dir, e))?;
        let archive = self.archive_path(milestone);
        self.write_archive(&archive, &included)?;

        if included.is_empty() {
            tracing::warn!(
                "{}: selection {:?} matched no cards ({} mode)",
                milestone.identifier,
                milestone.selection,
                self.mode.as_str()
            );
        } else {
            tracing::info!(
                "{}: archived {} cards to {}",
                milestone.identifier,
                included.len(),
                archive.display()
            );
        }

        Ok(PackageReport {
            identifier: milestone.identifier.clone(),
            archive,
            included,
        })
    }

    /// Package every milestone. A failure is confined to its own milestone.
    pub fn package_all(&self, registry: &[Milestone]) -> Vec<(String, Result<PackageReport>)> {
        registry
            .iter()
            .map(|milestone| {
                let result = self.package(milestone);
                if let Err(ref e) = result {
                    tracing::error!("{}: packaging failed: {}", milestone.identifier, e);
                }
                (milestone.identifier.clone(), result)
            })
            .collect()
    }

    fn select(&self, matcher: &dyn CardMatcher) -> Result<Vec<String>> {
        Ok(self
            .store
            .file_names()?
            .into_iter()
            .filter(|name| matcher.matches(name))
            .collect())
    }

    fn write_archive(&self, archive: &Path, names: &[String]) -> Result<()> {
        let file = File::create(archive).map_err(|e| DamError::io(archive, e))?;
        let mut zip = ZipWriter::new(file);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for name in names {
            let source = self.store.dir().join(name);
            let bytes = fs::read(&source).map_err(|e| DamError::io(&source, e))?;
            zip.start_file(name.as_str(), options)
                .map_err(|e| DamError::zip(archive, e))?;
            zip.write_all(&bytes).map_err(|e| DamError::io(archive, e))?;
            tracing::debug!("{}: added {}", archive.display(), name);
        }

        zip.finish().map_err(|e| DamError::zip(archive, e))?;
        Ok(())
    }
}
