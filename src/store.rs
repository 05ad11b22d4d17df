//! On-disk card directory.
//!
//! Filenames are a pure function of card number and milestone name, so
//! regenerating from an unchanged registry rewrites byte-identical files.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{DamError, Result};
use crate::models::{CardNumber, WorkCard};

/// Extension of every card file.
pub const CARD_EXTENSION: &str = "yml";

/// `<CARD_NNN>_<milestone_slug>.yml`
pub fn card_filename(number: CardNumber, milestone_name: &str) -> String {
    format!(
        "{}_{}.{}",
        number.tag(),
        milestone_name.to_lowercase().replace(' ', "_"),
        CARD_EXTENSION
    )
}

/// Encode a card to its YAML text.
pub fn encode(card: &WorkCard) -> std::result::Result<String, serde_yaml::Error> {
    serde_yaml::to_string(card)
}

/// Decode a card from YAML text.
pub fn decode(text: &str) -> std::result::Result<WorkCard, serde_yaml::Error> {
    serde_yaml::from_str(text)
}

/// A directory of card files.
#[derive(Debug, Clone)]
pub struct CardStore {
    dir: PathBuf,
}

impl CardStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, card: &WorkCard) -> PathBuf {
        self.dir.join(card_filename(card.card_number, &card.milestone))
    }

    /// Write one card, creating the directory if needed. Overwrites an existing file.
    pub fn write(&self, card: &WorkCard) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| DamError::io(&self.dir, e))?;

        let path = self.path_for(card);
        let content = encode(card).map_err(|e| DamError::yaml(&path, e))?;
        fs::write(&path, content).map_err(|e| DamError::io(&path, e))?;

        tracing::debug!("Wrote {}", path.display());
        Ok(path)
    }

    /// Write every card in order, stopping at the first failure.
    pub fn write_all(&self, cards: &[WorkCard]) -> Result<Vec<PathBuf>> {
        let paths = cards
            .iter()
            .map(|card| self.write(card))
            .collect::<Result<Vec<_>>>()?;
        tracing::info!("Wrote {} cards to {}", paths.len(), self.dir.display());
        Ok(paths)
    }

    pub fn read(&self, path: &Path) -> Result<WorkCard> {
        let content = fs::read_to_string(path).map_err(|e| DamError::io(path, e))?;
        decode(&content).map_err(|e| DamError::yaml(path, e))
    }

    /// Sorted names of the regular files in the directory.
    pub fn file_names(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| DamError::io(&self.dir, e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DamError::io(&self.dir, e))?;
            let file_type = entry.file_type().map_err(|e| DamError::io(entry.path(), e))?;
            if !file_type.is_file() {
                continue;
            }
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}
