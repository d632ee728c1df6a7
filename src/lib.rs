pub mod animal;
pub mod cell;
pub mod error;
pub mod island;
pub mod landscape;
pub mod params;
pub mod rng;
pub mod scenario;
pub mod simulation;
pub mod snapshot;

pub use animal::{Animal, Species};
pub use error::{MapError, ParameterError, PopulationError, SimulationError};
pub use island::{AnimalSpec, CellPopulation, Coord, Island, PopulationSpec, SpeciesCount};
pub use landscape::Terrain;
pub use params::Parameters;
pub use simulation::{Simulation, YearSummary};
pub use scenario::{Introduction, Scenario, ScenarioLoader};
pub use snapshot::{IslandSnapshot, SnapshotWriter};
