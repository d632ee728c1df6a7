//! Yearly population snapshots written as JSON.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::island::{CellPopulation, SpeciesCount};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IslandSnapshot {
    pub scenario: String,
    pub year: u32,
    pub total: usize,
    pub per_species: SpeciesCount,
    pub cells: Vec<CellPopulation>,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub struct SnapshotWriter {
    dir: PathBuf,
    interval_years: u32,
}

impl SnapshotWriter {
    /// An interval of 0 disables writing.
    pub fn new(dir: impl AsRef<Path>, interval_years: u32) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            interval_years,
        }
    }

    pub fn maybe_write(&self, snapshot: &IslandSnapshot) -> Result<Option<PathBuf>, SnapshotError> {
        if self.interval_years == 0 || snapshot.year % self.interval_years != 0 {
            return Ok(None);
        }

        let dir = self.dir.join(&snapshot.scenario);
        fs::create_dir_all(&dir)?;
        let file_path = dir.join(format!("year_{:06}.json", snapshot.year));
        let json = serde_json::to_string_pretty(snapshot)?;
        fs::write(&file_path, json)?;
        Ok(Some(file_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(year: u32) -> IslandSnapshot {
        IslandSnapshot {
            scenario: "tiny".into(),
            year,
            total: 3,
            per_species: SpeciesCount {
                herbivores: 2,
                carnivores: 1,
            },
            cells: vec![CellPopulation {
                row: 1,
                col: 1,
                herbivores: 2,
                carnivores: 1,
            }],
        }
    }

    #[test]
    fn writes_on_interval_only() {
        let temp = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(temp.path(), 5);

        assert_eq!(writer.maybe_write(&snapshot(3)).unwrap(), None);
        let path = writer.maybe_write(&snapshot(10)).unwrap().expect("written");

        assert_eq!(path, temp.path().join("tiny").join("year_000010.json"));
        let loaded: IslandSnapshot =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(loaded, snapshot(10));
    }

    #[test]
    fn zero_interval_disables_writing() {
        let temp = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(temp.path(), 0);
        assert_eq!(writer.maybe_write(&snapshot(10)).unwrap(), None);
        assert!(!temp.path().join("tiny").exists());
    }
}
