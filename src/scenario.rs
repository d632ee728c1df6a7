use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::animal::Species;
use crate::error::{ParameterError, SimulationError};
use crate::island::PopulationSpec;
use crate::landscape::Terrain;
use crate::params::{Overrides, Parameters};
use crate::simulation::Simulation;

const DEFAULT_YEARS: u32 = 50;

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default)]
    pub years: Option<u32>,
    pub map: String,
    #[serde(default)]
    pub population: Vec<PopulationSpec>,
    /// Batches that arrive after the given number of years.
    #[serde(default)]
    pub introductions: Vec<Introduction>,
    #[serde(default)]
    pub animal_parameters: BTreeMap<Species, Overrides>,
    /// Keyed by landscape letter (`J`, `S`).
    #[serde(default)]
    pub landscape_parameters: BTreeMap<String, Overrides>,
    #[serde(default)]
    pub snapshot_interval_years: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Introduction {
    pub year: u32,
    pub population: Vec<PopulationSpec>,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    /// Default tables with this scenario's overrides applied.
    pub fn parameters(&self) -> Result<Parameters, ParameterError> {
        let mut params = Parameters::default();
        for (&species, overrides) in &self.animal_parameters {
            params.override_species(species, overrides)?;
        }
        for (code, overrides) in &self.landscape_parameters {
            let terrain = parse_landscape_code(code)?;
            params.override_landscape(terrain, overrides)?;
        }
        Ok(params)
    }

    pub fn build_simulation(&self) -> Result<Simulation, SimulationError> {
        let params = self.parameters()?;
        let mut sim = Simulation::with_parameters(&self.map, &self.population, self.seed, params)?;
        for introduction in &self.introductions {
            sim.schedule_population(introduction.year, introduction.population.clone())?;
        }
        Ok(sim)
    }

    pub fn years(&self, override_years: Option<u32>) -> u32 {
        override_years.or(self.years).unwrap_or(DEFAULT_YEARS)
    }
}

fn parse_landscape_code(code: &str) -> Result<Terrain, ParameterError> {
    let mut chars = code.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => {
            Terrain::from_code(ch).ok_or_else(|| ParameterError::UnknownLandscape(code.to_string()))
        }
        _ => Err(ParameterError::UnknownLandscape(code.to_string())),
    }
}
