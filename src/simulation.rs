use std::collections::BTreeMap;
use std::convert::Infallible;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::animal::Species;
use crate::error::{ParameterError, PopulationError, SimulationError};
use crate::island::{CellPopulation, CycleReport, Island, PopulationSpec, SpeciesCount};
use crate::landscape::Terrain;
use crate::params::{Overrides, Parameters};
use crate::rng::{seeded, SimRng};
use crate::snapshot::IslandSnapshot;

/// What happened in one simulated year, read after the cycle completes.
#[derive(Clone, Debug, Serialize)]
pub struct YearSummary {
    pub year: u32,
    pub population: SpeciesCount,
    /// Animals added from the schedule at the start of this year.
    pub introduced: usize,
    pub events: CycleReport,
}

/// Owns the island, the parameter tables and the random stream for one run.
pub struct Simulation {
    island: Island,
    params: Parameters,
    rng: SimRng,
    year: u32,
    scheduled: BTreeMap<u32, Vec<PopulationSpec>>,
}

impl Simulation {
    pub fn new(
        map: &str,
        initial_population: &[PopulationSpec],
        seed: u64,
    ) -> Result<Self, SimulationError> {
        Self::with_parameters(map, initial_population, seed, Parameters::default())
    }

    pub fn with_parameters(
        map: &str,
        initial_population: &[PopulationSpec],
        seed: u64,
        params: Parameters,
    ) -> Result<Self, SimulationError> {
        Self::with_rng(map, initial_population, seeded(seed), params)
    }

    /// Builds a run around a caller-provided stream.
    pub fn with_rng(
        map: &str,
        initial_population: &[PopulationSpec],
        rng: SimRng,
        params: Parameters,
    ) -> Result<Self, SimulationError> {
        let mut island = Island::new(map, &params)?;
        island.add_population(initial_population)?;
        Ok(Self {
            island,
            params,
            rng,
            year: 0,
            scheduled: BTreeMap::new(),
        })
    }

    pub fn set_animal_parameters(
        &mut self,
        species: Species,
        overrides: &Overrides,
    ) -> Result<(), ParameterError> {
        self.params.override_species(species, overrides)
    }

    pub fn set_landscape_parameters(
        &mut self,
        terrain: Terrain,
        overrides: &Overrides,
    ) -> Result<(), ParameterError> {
        self.params.override_landscape(terrain, overrides)?;
        self.island.clamp_fodder(&self.params);
        Ok(())
    }

    pub fn add_population(
        &mut self,
        population: &[PopulationSpec],
    ) -> Result<usize, PopulationError> {
        let added = self.island.add_population(population)?;
        debug!(added, year = self.year, "population added");
        Ok(added)
    }

    /// Queues a batch to arrive once `year` years have run, just before the
    /// next annual cycle. The batch is validated now; a batch for the current
    /// year is inserted immediately.
    pub fn schedule_population(
        &mut self,
        year: u32,
        population: Vec<PopulationSpec>,
    ) -> Result<(), PopulationError> {
        if year < self.year {
            return Err(PopulationError::PastIntroduction {
                year,
                current: self.year,
            });
        }
        if year == self.year {
            self.add_population(&population)?;
            return Ok(());
        }
        self.island.validate_population(&population)?;
        self.scheduled.entry(year).or_default().extend(population);
        Ok(())
    }

    /// Number of animals still waiting in the schedule.
    pub fn num_scheduled(&self) -> usize {
        self.scheduled
            .values()
            .flatten()
            .map(|spec| spec.pop.len())
            .sum()
    }

    fn introduce_scheduled(&mut self) -> usize {
        let Some(batch) = self.scheduled.remove(&self.year) else {
            return 0;
        };
        match self.island.add_population(&batch) {
            Ok(added) => {
                info!(year = self.year, added, "scheduled population introduced");
                added
            }
            Err(error) => {
                warn!(year = self.year, %error, "scheduled population rejected");
                0
            }
        }
    }

    /// Runs up to `num_years` annual cycles and returns how many ran.
    pub fn simulate(&mut self, num_years: u32) -> u32 {
        match self.simulate_with_hook(num_years, |_, _| Ok::<(), Infallible>(())) {
            Ok(completed) => completed,
            Err(never) => match never {},
        }
    }

    /// Like [`Simulation::simulate`], calling `hook` with the island state after
    /// every year. Stops early once the island holds no animals and none are
    /// scheduled, or with the first error the hook returns.
    pub fn simulate_with_hook<F, E>(&mut self, num_years: u32, mut hook: F) -> Result<u32, E>
    where
        F: FnMut(&Simulation, &YearSummary) -> Result<(), E>,
    {
        let target = self.year + num_years;
        info!(
            from = self.year,
            to = target,
            animals = self.num_animals(),
            "simulation started"
        );
        let mut completed = 0;
        while self.year < target {
            if self.island.num_animals() == 0 && self.scheduled.is_empty() {
                info!(year = self.year, "no animals left on the island, stopping");
                break;
            }
            let summary = self.step();
            completed += 1;
            hook(self, &summary)?;
        }
        info!(
            year = self.year,
            herbivores = self.num_animals_per_species().herbivores,
            carnivores = self.num_animals_per_species().carnivores,
            "simulation finished"
        );
        Ok(completed)
    }

    /// Scheduled arrivals for the current year, then one annual cycle,
    /// regardless of population.
    pub fn step(&mut self) -> YearSummary {
        let introduced = self.introduce_scheduled();
        let events = self.island.annual_cycle(&self.params, &mut self.rng);
        self.year += 1;
        let population = self.island.num_animals_per_species();
        debug!(
            year = self.year,
            herbivores = population.herbivores,
            carnivores = population.carnivores,
            births = events.births,
            deaths = events.deaths,
            kills = events.kills,
            migrations = events.migrations,
            "year complete"
        );
        YearSummary {
            year: self.year,
            population,
            introduced,
            events,
        }
    }

    pub fn year(&self) -> u32 {
        self.year
    }

    pub fn num_animals(&self) -> usize {
        self.island.num_animals()
    }

    pub fn num_animals_per_species(&self) -> SpeciesCount {
        self.island.num_animals_per_species()
    }

    pub fn animal_distribution(&self) -> Vec<CellPopulation> {
        self.island.animal_distribution()
    }

    pub fn island(&self) -> &Island {
        &self.island
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    pub fn snapshot(&self, scenario: &str) -> IslandSnapshot {
        IslandSnapshot {
            scenario: scenario.to_string(),
            year: self.year,
            total: self.num_animals(),
            per_species: self.num_animals_per_species(),
            cells: self.animal_distribution(),
        }
    }
}
