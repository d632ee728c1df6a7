//! Validation errors raised by map construction, population insertion and
//! parameter overrides.

use thiserror::Error;

use crate::landscape::Terrain;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapError {
    #[error("island map is empty")]
    Empty,

    #[error("invalid landscape '{ch}' at row {row}, column {col}")]
    InvalidCharacter { ch: char, row: usize, col: usize },

    #[error("row {row} has length {found}, expected {expected}: all rows must have equal length")]
    UnequalRowLength {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("cell at row {row}, column {col} is on the edge of the map and must be ocean")]
    NonOceanBorder { row: usize, col: usize },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PopulationError {
    #[error("unknown species '{0}'")]
    UnknownSpecies(String),

    #[error("age must be a non-negative integer, got {0}")]
    InvalidAge(i64),

    #[error("age {0} is beyond the supported maximum of {max}", max = u32::MAX)]
    AgeOutOfRange(i64),

    #[error("weight must be a positive number, got {0}")]
    InvalidWeight(f64),

    #[error("location ({row}, {col}) does not exist on the map")]
    OutOfBounds { row: usize, col: usize },

    #[error("cannot schedule animals for year {year}, the run is already at year {current}")]
    PastIntroduction { year: u32, current: u32 },

    #[error("animals cannot be placed in {terrain} cells, location ({row}, {col})")]
    Uninhabitable {
        row: usize,
        col: usize,
        terrain: Terrain,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("unknown parameter '{name}' for {target}")]
    UnknownParameter { name: String, target: String },

    #[error("parameter '{name}' has invalid value {value}")]
    InvalidValue { name: String, value: f64 },

    #[error("unknown landscape code '{0}'")]
    UnknownLandscape(String),

    #[error("{0} has no configurable parameters")]
    NotConfigurable(Terrain),
}

/// Any failure raised while assembling or mutating a simulation.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    Population(#[from] PopulationError),

    #[error(transparent)]
    Parameter(#[from] ParameterError),
}
