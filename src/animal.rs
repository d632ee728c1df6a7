//! A single animal and its per-individual biology.
//!
//! Species behaviour is a tag plus an injected parameter table; the same
//! struct serves herbivores and carnivores. Fitness is always derived from the
//! current age and weight and never stored.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::PopulationError;
use crate::params::SpeciesParams;
use crate::rng::RngExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Species {
    Herbivore,
    Carnivore,
}

impl Species {
    pub const ALL: [Species; 2] = [Species::Herbivore, Species::Carnivore];
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Species::Herbivore => f.write_str("Herbivore"),
            Species::Carnivore => f.write_str("Carnivore"),
        }
    }
}

impl FromStr for Species {
    type Err = PopulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Herbivore" => Ok(Species::Herbivore),
            "Carnivore" => Ok(Species::Carnivore),
            other => Err(PopulationError::UnknownSpecies(other.to_string())),
        }
    }
}

impl TryFrom<String> for Species {
    type Error = PopulationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animal {
    species: Species,
    age: u32,
    weight: f64,
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl Animal {
    pub fn new(species: Species, age: u32, weight: f64) -> Self {
        Self {
            species,
            age,
            weight,
        }
    }

    /// Draws a newborn weight from `N(w_birth, sigma_birth)`.
    pub fn birth_weight<R: Rng + ?Sized>(params: &SpeciesParams, rng: &mut R) -> f64 {
        match Normal::new(params.w_birth, params.sigma_birth) {
            Ok(normal) => normal.sample(rng),
            Err(_) => params.w_birth,
        }
    }

    pub fn species(&self) -> Species {
        self.species
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn fitness(&self, params: &SpeciesParams) -> f64 {
        if self.weight <= 0.0 {
            return 0.0;
        }
        let age_term = sigmoid(params.phi_age * (params.a_half - f64::from(self.age)));
        let weight_term = sigmoid(params.phi_weight * (self.weight - params.w_half));
        age_term * weight_term
    }

    pub fn age_one_year(&mut self) {
        self.age += 1;
    }

    pub fn lose_weight(&mut self, params: &SpeciesParams) {
        self.weight -= params.eta * self.weight;
    }

    /// Always consumes exactly one draw.
    pub fn check_death<R: Rng + ?Sized>(&self, params: &SpeciesParams, rng: &mut R) -> bool {
        let roll = rng.draw();
        let fitness = self.fitness(params);
        fitness == 0.0 || roll < params.omega * (1.0 - fitness)
    }

    /// `n_same_species` counts this animal too. Underweight animals return
    /// `false` without drawing.
    pub fn check_birth<R: Rng + ?Sized>(
        &self,
        params: &SpeciesParams,
        n_same_species: usize,
        rng: &mut R,
    ) -> bool {
        if self.weight < params.zeta * (params.w_birth + params.sigma_birth) {
            return false;
        }
        let others = n_same_species.saturating_sub(1) as f64;
        let probability = (params.gamma * self.fitness(params) * others).min(1.0);
        rng.chance(probability)
    }

    /// Carries the weight cost of a birth. Returns `false`, leaving the parent
    /// untouched, when the parent cannot afford a newborn of this weight.
    pub fn give_birth(&mut self, params: &SpeciesParams, newborn_weight: f64) -> bool {
        let cost = params.xi * newborn_weight;
        if newborn_weight <= 0.0 || self.weight < cost {
            return false;
        }
        self.weight -= cost;
        true
    }

    /// Herbivore feeding on `amount` of fodder the cell has already granted.
    pub fn eat(&mut self, params: &SpeciesParams, amount: f64) {
        self.weight += params.beta * amount;
    }

    /// Whether this carnivore kills `prey`. Draws only in the linear range
    /// `0 < difference < DeltaPhiMax`.
    pub fn attempt_kill<R: Rng + ?Sized>(
        &self,
        params: &SpeciesParams,
        prey: &Animal,
        prey_params: &SpeciesParams,
        rng: &mut R,
    ) -> bool {
        let Some(delta_phi_max) = params.delta_phi_max else {
            return false;
        };
        let difference = self.fitness(params) - prey.fitness(prey_params);
        if difference <= 0.0 {
            false
        } else if difference >= delta_phi_max {
            true
        } else {
            rng.chance(difference / delta_phi_max)
        }
    }

    /// Eats at most `remaining_appetite` of the prey's weight and returns the
    /// amount eaten.
    pub fn consume(
        &mut self,
        params: &SpeciesParams,
        prey_weight: f64,
        remaining_appetite: f64,
    ) -> f64 {
        let eaten = prey_weight.min(remaining_appetite).max(0.0);
        self.weight += params.beta * eaten;
        eaten
    }
}
