//! The island: a rectangular, ocean-bordered grid of cells keyed by
//! `(row, col)`, and the yearly cycle that drives them.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::animal::{Animal, Species};
use crate::cell::Cell;
use crate::error::{MapError, PopulationError};
use crate::landscape::Terrain;
use crate::params::Parameters;
use crate::rng::RngExt;

/// `(row, col)`, zero-based from the top-left corner of the map.
pub type Coord = (usize, usize);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimalSpec {
    pub species: Species,
    pub age: i64,
    pub weight: f64,
}

impl AnimalSpec {
    pub fn new(species: Species, age: i64, weight: f64) -> Self {
        Self {
            species,
            age,
            weight,
        }
    }

    pub fn to_animal(&self) -> Result<Animal, PopulationError> {
        if self.age < 0 {
            return Err(PopulationError::InvalidAge(self.age));
        }
        let age = u32::try_from(self.age).map_err(|_| PopulationError::AgeOutOfRange(self.age))?;
        if !(self.weight > 0.0 && self.weight.is_finite()) {
            return Err(PopulationError::InvalidWeight(self.weight));
        }
        Ok(Animal::new(self.species, age, self.weight))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationSpec {
    pub loc: Coord,
    pub pop: Vec<AnimalSpec>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesCount {
    pub herbivores: usize,
    pub carnivores: usize,
}

impl SpeciesCount {
    pub fn total(&self) -> usize {
        self.herbivores + self.carnivores
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellPopulation {
    pub row: usize,
    pub col: usize,
    pub herbivores: usize,
    pub carnivores: usize,
}

/// Event counts for one annual cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    pub kills: usize,
    pub births: usize,
    pub migrations: usize,
    pub deaths: usize,
}

#[derive(Debug, Clone)]
pub struct Island {
    rows: usize,
    cols: usize,
    cells: BTreeMap<Coord, Cell>,
}

/// Validates a map description and returns its terrain grid.
///
/// Surrounding whitespace on each line is ignored, as are blank lines before
/// the first row and after the last, so indented multi-line literals are
/// accepted. A blank line between rows is a row of length zero.
pub fn parse_map(map: &str) -> Result<Vec<Vec<Terrain>>, MapError> {
    let lines: Vec<&str> = map.lines().map(str::trim).collect();
    let start = lines.iter().position(|line| !line.is_empty());
    let end = lines.iter().rposition(|line| !line.is_empty());
    let rows = match (start, end) {
        (Some(start), Some(end)) => &lines[start..=end],
        _ => &[][..],
    };

    let mut grid = Vec::new();
    for (row, line) in rows.iter().enumerate() {
        let terrain = line
            .chars()
            .enumerate()
            .map(|(col, ch)| {
                Terrain::from_code(ch).ok_or(MapError::InvalidCharacter { ch, row, col })
            })
            .collect::<Result<Vec<_>, _>>()?;
        grid.push(terrain);
    }

    let Some(first) = grid.first() else {
        return Err(MapError::Empty);
    };
    let expected = first.len();
    if let Some((row, found)) = grid
        .iter()
        .map(Vec::len)
        .enumerate()
        .find(|&(_, len)| len != expected)
    {
        return Err(MapError::UnequalRowLength {
            row,
            expected,
            found,
        });
    }

    let last_row = grid.len() - 1;
    let last_col = expected - 1;
    for (row, line) in grid.iter().enumerate() {
        for (col, terrain) in line.iter().enumerate() {
            let on_edge = row == 0 || row == last_row || col == 0 || col == last_col;
            if on_edge && *terrain != Terrain::Ocean {
                return Err(MapError::NonOceanBorder { row, col });
            }
        }
    }
    Ok(grid)
}

impl Island {
    pub fn new(map: &str, params: &Parameters) -> Result<Self, MapError> {
        let grid = parse_map(map)?;
        let rows = grid.len();
        let cols = grid[0].len();
        let cells = grid
            .into_iter()
            .enumerate()
            .flat_map(|(row, line)| {
                line.into_iter()
                    .enumerate()
                    .map(move |(col, terrain)| ((row, col), Cell::new(terrain, params)))
            })
            .collect();
        Ok(Self { rows, cols, cells })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cell(&self, coord: Coord) -> Option<&Cell> {
        self.cells.get(&coord)
    }

    pub fn cell_mut(&mut self, coord: Coord) -> Option<&mut Cell> {
        self.cells.get_mut(&coord)
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (Coord, &Cell)> + '_ {
        self.cells.iter().map(|(&coord, cell)| (coord, cell))
    }

    /// North, south, east, west. Positions off the grid are `None`.
    pub fn neighbours(&self, (row, col): Coord) -> [Option<Coord>; 4] {
        let inside = |coord: Coord| (coord.0 < self.rows && coord.1 < self.cols).then_some(coord);
        [
            row.checked_sub(1).and_then(|r| inside((r, col))),
            inside((row + 1, col)),
            inside((row, col + 1)),
            col.checked_sub(1).and_then(|c| inside((row, c))),
        ]
    }

    /// Checks a whole batch and returns the animals to place, without
    /// touching the island.
    pub fn validate_population(
        &self,
        population: &[PopulationSpec],
    ) -> Result<Vec<(Coord, Animal)>, PopulationError> {
        let mut placed = Vec::new();
        for spec in population {
            let (row, col) = spec.loc;
            let cell = self
                .cells
                .get(&spec.loc)
                .ok_or(PopulationError::OutOfBounds { row, col })?;
            if !cell.terrain().is_habitable() {
                return Err(PopulationError::Uninhabitable {
                    row,
                    col,
                    terrain: cell.terrain(),
                });
            }
            for animal in &spec.pop {
                placed.push((spec.loc, animal.to_animal()?));
            }
        }
        Ok(placed)
    }

    /// Inserts a batch of animals. Nothing is inserted unless every record is
    /// valid.
    pub fn add_population(
        &mut self,
        population: &[PopulationSpec],
    ) -> Result<usize, PopulationError> {
        let placed = self.validate_population(population)?;
        let count = placed.len();
        for (coord, animal) in placed {
            if let Some(cell) = self.cells.get_mut(&coord) {
                cell.add_animal(animal);
            }
        }
        Ok(count)
    }

    pub fn clamp_fodder(&mut self, params: &Parameters) {
        for cell in self.cells.values_mut() {
            cell.clamp_fodder(params);
        }
    }

    /// Runs one year: growth, feeding and mating per cell, then migration
    /// across the island, then aging and death per cell.
    pub fn annual_cycle<R: Rng + ?Sized>(
        &mut self,
        params: &Parameters,
        rng: &mut R,
    ) -> CycleReport {
        let mut report = CycleReport::default();
        for cell in self.cells.values_mut() {
            cell.grow_fodder(params);
            cell.herbivores_eat(params);
            report.kills += cell.carnivores_eat(params, rng);
            report.births += cell.mate(params, rng);
        }
        report.migrations = self.migrate(params, rng);
        for cell in self.cells.values_mut() {
            cell.age_and_lose_weight(params);
            report.deaths += cell.remove_dead(params, rng);
        }
        report
    }

    fn propensities(&self, coord: Coord, species: Species, params: &Parameters) -> [f64; 4] {
        self.neighbours(coord).map(|neighbour| {
            neighbour
                .and_then(|c| self.cells.get(&c))
                .map(|cell| cell.migration_propensity(species, params))
                .unwrap_or(0.0)
        })
    }

    /// Destination for one migrating animal of `species` standing at
    /// `position`, judged on the island as it is now. Returns `position`
    /// without drawing when no neighbour attracts it.
    pub fn migrate_to<R: Rng + ?Sized>(
        &self,
        position: Coord,
        species: Species,
        params: &Parameters,
        rng: &mut R,
    ) -> Coord {
        let weights = self.propensities(position, species, params);
        choose_destination(&self.neighbours(position), &weights, rng).unwrap_or(position)
    }

    /// Moves every animal that decides to migrate this year, at most once.
    ///
    /// Decisions and destinations are all taken against the island as it was
    /// before anyone moved; arrivals are applied afterwards. Returns the number
    /// of animals that changed cell.
    pub fn migrate<R: Rng + ?Sized>(&mut self, params: &Parameters, rng: &mut R) -> usize {
        let snapshot: BTreeMap<Coord, [[f64; 4]; 2]> = self
            .cells
            .iter()
            .filter(|(_, cell)| cell.total_population() > 0)
            .map(|(&coord, _)| {
                (
                    coord,
                    Species::ALL.map(|species| self.propensities(coord, species, params)),
                )
            })
            .collect();

        let mut arrivals: Vec<(Coord, Animal)> = Vec::new();
        for (&origin, weights) in &snapshot {
            let neighbours = self.neighbours(origin);
            let Some(cell) = self.cells.get_mut(&origin) else {
                continue;
            };
            let ready = cell.animals_ready_to_migrate(params, rng);
            if ready.is_empty() {
                continue;
            }
            for species in Species::ALL {
                let weights = &weights[species as usize];
                let mut leaving = Vec::new();
                let mut destinations = Vec::new();
                for &index in ready.of(species) {
                    if let Some(destination) = choose_destination(&neighbours, weights, rng) {
                        leaving.push(index);
                        destinations.push(destination);
                    }
                }
                let movers = cell.take_animals(species, &leaving);
                arrivals.extend(destinations.into_iter().zip(movers));
            }
        }

        let moved = arrivals.len();
        for (destination, animal) in arrivals {
            match self.cells.get_mut(&destination) {
                Some(cell) => cell.add_animal(animal),
                None => warn!(?destination, "migration target missing from island"),
            }
        }
        trace!(moved, "migration resolved");
        moved
    }

    pub fn num_animals(&self) -> usize {
        self.cells.values().map(Cell::total_population).sum()
    }

    pub fn num_animals_per_species(&self) -> SpeciesCount {
        self.cells
            .values()
            .fold(SpeciesCount::default(), |mut count, cell| {
                count.herbivores += cell.herbivore_count();
                count.carnivores += cell.carnivore_count();
                count
            })
    }

    /// Per-cell counts for every cell, row-major.
    pub fn animal_distribution(&self) -> Vec<CellPopulation> {
        self.cells
            .iter()
            .map(|(&(row, col), cell)| CellPopulation {
                row,
                col,
                herbivores: cell.herbivore_count(),
                carnivores: cell.carnivore_count(),
            })
            .collect()
    }
}

/// Picks a neighbour with probability proportional to its weight, walking the
/// cumulative sums in N-S-E-W order. Draws once, or not at all when every
/// weight is zero.
fn choose_destination<R: Rng + ?Sized>(
    neighbours: &[Option<Coord>; 4],
    weights: &[f64; 4],
    rng: &mut R,
) -> Option<Coord> {
    let mut weights = *weights;
    if weights.iter().any(|w| w.is_infinite()) {
        weights = weights.map(|w| if w.is_infinite() { 1.0 } else { 0.0 });
    }
    let total: f64 = weights.iter().sum();
    if total.is_nan() || total <= 0.0 {
        return None;
    }

    let draw = rng.draw();
    let mut cumulative = 0.0;
    let mut chosen = None;
    for (neighbour, weight) in neighbours.iter().zip(weights) {
        let Some(coord) = neighbour else {
            continue;
        };
        if weight <= 0.0 {
            continue;
        }
        cumulative += weight / total;
        chosen = Some(*coord);
        if cumulative >= draw {
            break;
        }
    }
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::seeded;

    fn island(map: &str) -> Island {
        Island::new(map, &Parameters::default()).unwrap()
    }

    fn herd(loc: Coord, species: Species, n: usize, age: i64, weight: f64) -> PopulationSpec {
        PopulationSpec {
            loc,
            pop: (0..n).map(|_| AnimalSpec::new(species, age, weight)).collect(),
        }
    }

    #[test]
    fn builds_cells_for_every_character() {
        let island = island(
            "OOOOO
             OJSDO
             OMJJO
             OOOOO",
        );
        assert_eq!((island.rows(), island.cols()), (4, 5));
        assert_eq!(island.cells().count(), 20);
        assert_eq!(island.cell((1, 2)).unwrap().terrain(), Terrain::Savannah);
        assert_eq!(island.cell((2, 1)).unwrap().terrain(), Terrain::Mountain);
        assert_eq!(island.cell((1, 1)).unwrap().fodder(), 800.0);
    }

    #[test]
    fn rejects_malformed_maps() {
        let params = Parameters::default();
        assert_eq!(
            Island::new("ODO\nOJO\nODO", &params).unwrap_err(),
            MapError::NonOceanBorder { row: 0, col: 1 }
        );
        assert_eq!(
            Island::new("OOO\nOPO\nOOO", &params).unwrap_err(),
            MapError::InvalidCharacter {
                ch: 'P',
                row: 1,
                col: 1
            }
        );
        assert_eq!(
            Island::new("OOO\nOJJ\nOOO", &params).unwrap_err(),
            MapError::NonOceanBorder { row: 1, col: 2 }
        );
        assert_eq!(
            Island::new("OOO\nOSOO\nOOO", &params).unwrap_err(),
            MapError::UnequalRowLength {
                row: 1,
                expected: 3,
                found: 4
            }
        );
        assert_eq!(Island::new("  \n", &params).unwrap_err(), MapError::Empty);
    }

    #[test]
    fn blank_row_inside_the_map_is_ragged() {
        assert_eq!(
            parse_map("OOOOO\nOJJJO\n\nOJJJO\nOOOOO").unwrap_err(),
            MapError::UnequalRowLength {
                row: 2,
                expected: 5,
                found: 0
            }
        );
        let grid = parse_map("\n\n   OOO\n   OJO\n   OOO\n\n").unwrap();
        assert_eq!(grid.len(), 3);
    }

    #[test]
    fn neighbours_are_north_south_east_west() {
        let island = island("OOOO\nOSDO\nOOOO");
        assert_eq!(
            island.neighbours((1, 1)),
            [Some((0, 1)), Some((2, 1)), Some((1, 2)), Some((1, 0))]
        );
        assert_eq!(island.neighbours((0, 0)), [None, Some((1, 0)), Some((0, 1)), None]);
        assert_eq!(island.neighbours((2, 3))[1], None);
        assert_eq!(island.neighbours((2, 3))[2], None);
    }

    #[test]
    fn population_must_land_on_habitable_cells() {
        let mut island = island("OOO\nOMO\nOOO");
        let herbs = |loc| vec![herd(loc, Species::Herbivore, 1, 5, 20.0)];
        assert_eq!(
            island.add_population(&herbs((1, 1))),
            Err(PopulationError::Uninhabitable {
                row: 1,
                col: 1,
                terrain: Terrain::Mountain
            })
        );
        assert!(matches!(
            island.add_population(&herbs((0, 1))),
            Err(PopulationError::Uninhabitable { .. })
        ));
        assert_eq!(
            island.add_population(&herbs((3, 1))),
            Err(PopulationError::OutOfBounds { row: 3, col: 1 })
        );
    }

    #[test]
    fn failed_batch_inserts_nothing() {
        let mut island = island("OOOO\nOJJO\nOOOO");
        let batch = vec![
            herd((1, 1), Species::Herbivore, 10, 5, 20.0),
            PopulationSpec {
                loc: (1, 2),
                pop: vec![
                    AnimalSpec::new(Species::Carnivore, 5, 20.0),
                    AnimalSpec::new(Species::Carnivore, -1, 20.0),
                ],
            },
        ];
        assert_eq!(
            island.add_population(&batch),
            Err(PopulationError::InvalidAge(-1))
        );
        assert_eq!(island.num_animals(), 0);

        let batch = vec![herd((1, 1), Species::Herbivore, 3, 5, 0.0)];
        assert_eq!(
            island.add_population(&batch),
            Err(PopulationError::InvalidWeight(0.0))
        );
        assert_eq!(island.num_animals(), 0);

        let batch = vec![herd((1, 1), Species::Herbivore, 1, 5_000_000_000, 20.0)];
        let err = island.add_population(&batch).unwrap_err();
        assert_eq!(err, PopulationError::AgeOutOfRange(5_000_000_000));
        assert!(err.to_string().contains("beyond the supported maximum"));
    }

    #[test]
    fn populates_cells() {
        let mut island = island("OOOOOO\nOJDJJO\nOSJJOO\nOOOOOO");
        let batch = vec![
            herd((1, 1), Species::Carnivore, 2, 5, 20.0),
            herd((1, 1), Species::Herbivore, 1, 5, 20.0),
        ];
        assert_eq!(island.add_population(&batch), Ok(3));
        let cell = island.cell((1, 1)).unwrap();
        assert_eq!(cell.total_population(), 3);
        assert_eq!(cell.carnivore_count(), 2);
        assert_eq!(
            island.num_animals_per_species(),
            SpeciesCount {
                herbivores: 1,
                carnivores: 2
            }
        );
    }

    #[test]
    fn enclosed_cell_keeps_its_animals() {
        let island = island("OOOO\nOJMO\nOOOO");
        let params = Parameters::default();
        let mut rng = seeded(21);
        let mut reference = rng.clone();
        for species in Species::ALL {
            for _ in 0..100 {
                assert_eq!(island.migrate_to((1, 1), species, &params, &mut rng), (1, 1));
            }
        }
        assert_eq!(rng.draw(), reference.draw());
    }

    #[test]
    fn single_open_neighbour_is_always_chosen() {
        let island = island("OOOOO\nOJJMO\nOOOOO");
        let params = Parameters::default();
        let mut rng = seeded(22);
        for _ in 0..100 {
            assert_eq!(
                island.migrate_to((1, 1), Species::Herbivore, &params, &mut rng),
                (1, 2)
            );
        }
    }

    #[test]
    fn migrate_to_reaches_every_open_direction() {
        let island = island("OOOOO\nOJJJO\nOJJJO\nOJJJO\nOOOOO");
        let params = Parameters::default();
        let mut rng = seeded(23);
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..200 {
            let destination = island.migrate_to((2, 2), Species::Herbivore, &params, &mut rng);
            assert!(island.neighbours((2, 2)).contains(&Some(destination)));
            seen.insert(destination);
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn choose_destination_walks_cumulative_sums() {
        let neighbours = [Some((0, 1)), Some((2, 1)), Some((1, 2)), Some((1, 0))];
        let mut rng = seeded(24);
        let draw = rng.clone().draw();
        let weights = [0.0, 1.0, 1.0, 0.0];
        let expected = if draw <= 0.5 { (2, 1) } else { (1, 2) };
        assert_eq!(choose_destination(&neighbours, &weights, &mut rng), Some(expected));
        assert_eq!(choose_destination(&neighbours, &[0.0; 4], &mut rng), None);
        assert_eq!(
            choose_destination(&neighbours, &[1.0, f64::INFINITY, 2.0, 0.0], &mut rng),
            Some((2, 1))
        );
    }

    #[test]
    fn migration_conserves_animals_and_moves_each_at_most_once() {
        let mut island = island("OOOOOO\nOODOJO\nOOJJOO\nOOOOOO");
        island
            .add_population(&[
                herd((1, 2), Species::Carnivore, 100, 10, 50.0),
                herd((1, 2), Species::Herbivore, 10, 15, 30.0),
            ])
            .unwrap();
        let params = Parameters::default();
        let mut rng = seeded(5);

        let before = island.num_animals();
        let moved = island.migrate(&params, &mut rng);

        assert_eq!(island.num_animals(), before);
        assert!(moved > 0);
        // (2, 2) is the only open neighbour of (1, 2).
        let origin = island.cell((1, 2)).unwrap().total_population();
        let target = island.cell((2, 2)).unwrap().total_population();
        assert_eq!(origin + target, before);
        assert_eq!(target, moved);
    }

    #[test]
    fn annual_cycle_runs_on_a_crowded_cell() {
        let mut island = island("OOOO\nOJJO\nOOOO");
        island
            .add_population(&[
                herd((1, 2), Species::Carnivore, 100, 10, 50.0),
                herd((1, 2), Species::Herbivore, 10, 15, 30.0),
            ])
            .unwrap();
        let params = Parameters::default();
        let mut rng = seeded(25);
        for _ in 0..10 {
            island.annual_cycle(&params, &mut rng);
        }
        for (_, cell) in island.cells() {
            assert!(cell.fodder() >= 0.0 && cell.fodder() <= 800.0);
            assert!(cell.terrain().is_habitable() || cell.total_population() == 0);
        }
    }
}
