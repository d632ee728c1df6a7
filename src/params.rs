//! Species and landscape parameter tables.
//!
//! A `Parameters` value is owned by the simulation and handed to every island,
//! cell and animal operation by reference. Overrides arrive as partial maps of
//! named values and are applied all-or-nothing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::animal::Species;
use crate::error::ParameterError;
use crate::landscape::Terrain;

/// Named parameter values, e.g. `{"beta": 0.8, "F": 12.0}`.
pub type Overrides = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesParams {
    pub w_birth: f64,
    pub sigma_birth: f64,
    pub beta: f64,
    pub eta: f64,
    pub a_half: f64,
    pub phi_age: f64,
    pub w_half: f64,
    pub phi_weight: f64,
    pub mu: f64,
    pub lambda: f64,
    pub gamma: f64,
    pub zeta: f64,
    pub xi: f64,
    pub omega: f64,
    /// Appetite: the most fodder or prey biomass eaten in one year.
    #[serde(rename = "F")]
    pub f: f64,
    /// Fitness difference at which a kill becomes certain. Carnivores only.
    #[serde(rename = "DeltaPhiMax", default, skip_serializing_if = "Option::is_none")]
    pub delta_phi_max: Option<f64>,
}

impl SpeciesParams {
    pub fn herbivore() -> Self {
        Self {
            w_birth: 8.0,
            sigma_birth: 1.5,
            beta: 0.9,
            eta: 0.05,
            a_half: 40.0,
            phi_age: 0.2,
            w_half: 10.0,
            phi_weight: 0.1,
            mu: 0.25,
            lambda: 1.0,
            gamma: 0.2,
            zeta: 3.5,
            xi: 1.2,
            omega: 0.4,
            f: 10.0,
            delta_phi_max: None,
        }
    }

    pub fn carnivore() -> Self {
        Self {
            w_birth: 6.0,
            sigma_birth: 1.0,
            beta: 0.75,
            eta: 0.125,
            a_half: 60.0,
            phi_age: 0.4,
            w_half: 4.0,
            phi_weight: 0.4,
            mu: 0.4,
            lambda: 1.0,
            gamma: 0.8,
            zeta: 3.5,
            xi: 1.1,
            omega: 0.9,
            f: 50.0,
            delta_phi_max: Some(10.0),
        }
    }

    fn set(&mut self, species: Species, name: &str, value: f64) -> Result<(), ParameterError> {
        let slot = match name {
            "w_birth" => &mut self.w_birth,
            "sigma_birth" => &mut self.sigma_birth,
            "beta" => &mut self.beta,
            "eta" => &mut self.eta,
            "a_half" => &mut self.a_half,
            "phi_age" => &mut self.phi_age,
            "w_half" => &mut self.w_half,
            "phi_weight" => &mut self.phi_weight,
            "mu" => &mut self.mu,
            "lambda" => &mut self.lambda,
            "gamma" => &mut self.gamma,
            "zeta" => &mut self.zeta,
            "xi" => &mut self.xi,
            "omega" => &mut self.omega,
            "F" => &mut self.f,
            "DeltaPhiMax" if species == Species::Carnivore => {
                self.delta_phi_max = Some(value);
                return Ok(());
            }
            _ => {
                return Err(ParameterError::UnknownParameter {
                    name: name.to_string(),
                    target: species.to_string(),
                })
            }
        };
        *slot = value;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandscapeParams {
    pub f_max: f64,
    /// Fraction of the gap to `f_max` regrown each year. Savannah only.
    #[serde(default)]
    pub alpha: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    pub herbivore: SpeciesParams,
    pub carnivore: SpeciesParams,
    pub jungle: LandscapeParams,
    pub savannah: LandscapeParams,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            herbivore: SpeciesParams::herbivore(),
            carnivore: SpeciesParams::carnivore(),
            jungle: LandscapeParams {
                f_max: 800.0,
                alpha: 0.0,
            },
            savannah: LandscapeParams {
                f_max: 300.0,
                alpha: 0.3,
            },
        }
    }
}

impl Parameters {
    pub fn species(&self, species: Species) -> &SpeciesParams {
        match species {
            Species::Herbivore => &self.herbivore,
            Species::Carnivore => &self.carnivore,
        }
    }

    pub fn landscape(&self, terrain: Terrain) -> Option<&LandscapeParams> {
        match terrain {
            Terrain::Jungle => Some(&self.jungle),
            Terrain::Savannah => Some(&self.savannah),
            Terrain::Ocean | Terrain::Mountain | Terrain::Desert => None,
        }
    }

    /// Upper bound on the fodder a cell of this terrain can hold.
    pub fn f_max(&self, terrain: Terrain) -> f64 {
        self.landscape(terrain).map(|l| l.f_max).unwrap_or(0.0)
    }

    pub fn override_species(
        &mut self,
        species: Species,
        overrides: &Overrides,
    ) -> Result<(), ParameterError> {
        let slot = match species {
            Species::Herbivore => &mut self.herbivore,
            Species::Carnivore => &mut self.carnivore,
        };
        let mut updated = slot.clone();
        for (name, &value) in overrides {
            check_value(name, value)?;
            updated.set(species, name, value)?;
        }
        *slot = updated;
        Ok(())
    }

    pub fn override_landscape(
        &mut self,
        terrain: Terrain,
        overrides: &Overrides,
    ) -> Result<(), ParameterError> {
        let slot = match terrain {
            Terrain::Jungle => &mut self.jungle,
            Terrain::Savannah => &mut self.savannah,
            Terrain::Ocean | Terrain::Mountain | Terrain::Desert => {
                return Err(ParameterError::NotConfigurable(terrain))
            }
        };
        let mut updated = slot.clone();
        for (name, &value) in overrides {
            check_value(name, value)?;
            match (terrain, name.as_str()) {
                (_, "f_max") => updated.f_max = value,
                (Terrain::Savannah, "alpha") => updated.alpha = value,
                _ => {
                    return Err(ParameterError::UnknownParameter {
                        name: name.clone(),
                        target: terrain.to_string(),
                    })
                }
            }
        }
        *slot = updated;
        Ok(())
    }
}

fn check_value(name: &str, value: f64) -> Result<(), ParameterError> {
    let valid = value.is_finite()
        && value >= 0.0
        && match name {
            "F" | "DeltaPhiMax" => value > 0.0,
            "eta" | "alpha" => value <= 1.0,
            _ => true,
        };
    if valid {
        Ok(())
    } else {
        Err(ParameterError::InvalidValue {
            name: name.to_string(),
            value,
        })
    }
}
