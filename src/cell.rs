//! One map location: its fodder and the animals living there.
//!
//! The annual operations run in a fixed order driven by the island:
//! `grow_fodder`, `herbivores_eat`, `carnivores_eat`, `mate`, migration,
//! `age_and_lose_weight`, `remove_dead`.

use rand::Rng;

use crate::animal::{Animal, Species};
use crate::landscape::Terrain;
use crate::params::Parameters;
use crate::rng::RngExt;

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    terrain: Terrain,
    fodder: f64,
    herbivores: Vec<Animal>,
    carnivores: Vec<Animal>,
}

/// Indices of the residents that decided to leave this year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadyToMigrate {
    pub herbivores: Vec<usize>,
    pub carnivores: Vec<usize>,
}

impl ReadyToMigrate {
    pub fn of(&self, species: Species) -> &[usize] {
        match species {
            Species::Herbivore => &self.herbivores,
            Species::Carnivore => &self.carnivores,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.herbivores.is_empty() && self.carnivores.is_empty()
    }
}

impl Cell {
    /// A fresh cell starts with a full fodder stock.
    pub fn new(terrain: Terrain, params: &Parameters) -> Self {
        Self {
            terrain,
            fodder: params.f_max(terrain),
            herbivores: Vec::new(),
            carnivores: Vec::new(),
        }
    }

    pub fn terrain(&self) -> Terrain {
        self.terrain
    }

    pub fn fodder(&self) -> f64 {
        self.fodder
    }

    pub fn herbivores(&self) -> &[Animal] {
        &self.herbivores
    }

    pub fn carnivores(&self) -> &[Animal] {
        &self.carnivores
    }

    pub fn animals(&self, species: Species) -> &[Animal] {
        match species {
            Species::Herbivore => &self.herbivores,
            Species::Carnivore => &self.carnivores,
        }
    }

    fn animals_mut(&mut self, species: Species) -> &mut Vec<Animal> {
        match species {
            Species::Herbivore => &mut self.herbivores,
            Species::Carnivore => &mut self.carnivores,
        }
    }

    pub fn herbivore_count(&self) -> usize {
        self.herbivores.len()
    }

    pub fn carnivore_count(&self) -> usize {
        self.carnivores.len()
    }

    pub fn total_population(&self) -> usize {
        self.herbivores.len() + self.carnivores.len()
    }

    /// Total weight of the herbivores here, the carnivores' food supply.
    pub fn herbivore_biomass(&self) -> f64 {
        self.herbivores.iter().map(Animal::weight).sum()
    }

    /// Appends an animal. Callers check habitability before placing animals.
    pub fn add_animal(&mut self, animal: Animal) {
        let species = animal.species();
        self.animals_mut(species).push(animal);
    }

    /// Removes the animals at `indices` (ascending) and returns them in order.
    pub fn take_animals(&mut self, species: Species, indices: &[usize]) -> Vec<Animal> {
        let residents = std::mem::take(self.animals_mut(species));
        let mut taken = Vec::with_capacity(indices.len());
        let mut kept = Vec::with_capacity(residents.len().saturating_sub(indices.len()));
        let mut pending = indices.iter().peekable();
        for (index, animal) in residents.into_iter().enumerate() {
            if pending.next_if_eq(&&index).is_some() {
                taken.push(animal);
            } else {
                kept.push(animal);
            }
        }
        *self.animals_mut(species) = kept;
        taken
    }

    /// Clamps fodder back under the terrain's bound after a parameter change.
    pub fn clamp_fodder(&mut self, params: &Parameters) {
        self.fodder = self.fodder.clamp(0.0, params.f_max(self.terrain));
    }

    pub fn grow_fodder(&mut self, params: &Parameters) {
        self.fodder = match (self.terrain, params.landscape(self.terrain)) {
            (Terrain::Jungle, Some(jungle)) => jungle.f_max,
            (Terrain::Savannah, Some(savannah)) => {
                let grown = self.fodder + savannah.alpha * (savannah.f_max - self.fodder);
                grown.clamp(0.0, savannah.f_max)
            }
            _ => 0.0,
        };
    }

    /// Fittest herbivores eat first; equally fit ones keep their order.
    pub fn herbivores_eat(&mut self, params: &Parameters) {
        let herb = &params.herbivore;
        self.herbivores
            .sort_by(|a, b| b.fitness(herb).total_cmp(&a.fitness(herb)));
        for herbivore in &mut self.herbivores {
            if self.fodder <= 0.0 {
                break;
            }
            let amount = herb.f.min(self.fodder);
            herbivore.eat(herb, amount);
            self.fodder = (self.fodder - amount).max(0.0);
        }
    }

    /// Fittest carnivores hunt first, each working up from the weakest
    /// herbivore. Every herbivore is tried at most once per carnivore and a
    /// killed herbivore is always removed. Returns the number of kills.
    pub fn carnivores_eat<R: Rng + ?Sized>(&mut self, params: &Parameters, rng: &mut R) -> usize {
        let (herb, carn) = (&params.herbivore, &params.carnivore);
        self.carnivores
            .sort_by(|a, b| b.fitness(carn).total_cmp(&a.fitness(carn)));
        self.herbivores
            .sort_by(|a, b| a.fitness(herb).total_cmp(&b.fitness(herb)));

        let mut kills = 0;
        for carnivore in &mut self.carnivores {
            if self.herbivores.is_empty() {
                break;
            }
            let mut eaten = 0.0;
            let mut survivors = Vec::with_capacity(self.herbivores.len());
            let mut prey_iter = std::mem::take(&mut self.herbivores).into_iter();
            for prey in prey_iter.by_ref() {
                if carnivore.attempt_kill(carn, &prey, herb, rng) {
                    eaten += carnivore.consume(carn, prey.weight(), carn.f - eaten);
                    kills += 1;
                    if eaten >= carn.f {
                        break;
                    }
                } else {
                    survivors.push(prey);
                }
            }
            survivors.extend(prey_iter);
            self.herbivores = survivors;
        }
        kills
    }

    /// Only animals present when mating starts can give birth; newborns join
    /// the cell once both species are done. Returns the number of births.
    pub fn mate<R: Rng + ?Sized>(&mut self, params: &Parameters, rng: &mut R) -> usize {
        let mut births = 0;
        for species in Species::ALL {
            let species_params = params.species(species);
            let parents = self.animals_mut(species);
            let count = parents.len();
            let mut newborns = Vec::new();
            for parent in parents.iter_mut() {
                if !parent.check_birth(species_params, count, rng) {
                    continue;
                }
                let newborn_weight = Animal::birth_weight(species_params, rng);
                if parent.give_birth(species_params, newborn_weight) {
                    newborns.push(Animal::new(species, 0, newborn_weight));
                }
            }
            births += newborns.len();
            parents.extend(newborns);
        }
        births
    }

    /// `exp(lambda * resource / ((n + 1) * F))`, zero on impassable terrain.
    pub fn migration_propensity(&self, species: Species, params: &Parameters) -> f64 {
        if !self.terrain.is_habitable() {
            return 0.0;
        }
        let species_params = params.species(species);
        let resource = match species {
            Species::Herbivore => self.fodder,
            Species::Carnivore => self.herbivore_biomass(),
        };
        let crowd = (self.animals(species).len() + 1) as f64;
        (species_params.lambda * (resource / (crowd * species_params.f))).exp()
    }

    /// One draw per resident, herbivores first: ready with probability
    /// `mu * fitness`.
    pub fn animals_ready_to_migrate<R: Rng + ?Sized>(
        &self,
        params: &Parameters,
        rng: &mut R,
    ) -> ReadyToMigrate {
        let mut ready = ReadyToMigrate::default();
        for (index, animal) in self.herbivores.iter().enumerate() {
            let herb = &params.herbivore;
            if rng.chance(herb.mu * animal.fitness(herb)) {
                ready.herbivores.push(index);
            }
        }
        for (index, animal) in self.carnivores.iter().enumerate() {
            let carn = &params.carnivore;
            if rng.chance(carn.mu * animal.fitness(carn)) {
                ready.carnivores.push(index);
            }
        }
        ready
    }

    pub fn age_and_lose_weight(&mut self, params: &Parameters) {
        for species in Species::ALL {
            let species_params = params.species(species);
            for animal in self.animals_mut(species) {
                animal.age_one_year();
                animal.lose_weight(species_params);
            }
        }
    }

    /// One death draw per resident, herbivores first. Returns the number of
    /// deaths.
    pub fn remove_dead<R: Rng + ?Sized>(&mut self, params: &Parameters, rng: &mut R) -> usize {
        let before = self.total_population();
        for species in Species::ALL {
            let species_params = params.species(species);
            self.animals_mut(species)
                .retain(|animal| !animal.check_death(species_params, rng));
        }
        before - self.total_population()
    }
}
