use biosim::{
    params::SpeciesParams, rng::seeded, Animal, AnimalSpec, Island, Parameters, PopulationSpec,
    Simulation, Species,
};
use proptest::prelude::*;
use rand::Rng;

proptest! {
    #[test]
    fn fitness_stays_in_unit_interval(age in 0u32..300, weight in -50.0f64..500.0) {
        for params in [SpeciesParams::herbivore(), SpeciesParams::carnivore()] {
            let fitness = Animal::new(Species::Herbivore, age, weight).fitness(&params);
            prop_assert!((0.0..=1.0).contains(&fitness));
        }
    }

    #[test]
    fn underweight_animals_never_give_birth(
        seed in any::<u64>(),
        weight in 0.1f64..33.2,
        n in 2usize..500,
    ) {
        let params = SpeciesParams::herbivore();
        let animal = Animal::new(Species::Herbivore, 5, weight);
        let mut rng = seeded(seed);
        prop_assert!(!animal.check_birth(&params, n, &mut rng));
    }

    #[test]
    fn fodder_stays_within_bounds(seed in any::<u64>()) {
        let map = "OOOOO
                   OJSDO
                   OSJJO
                   OOOOO";
        let population = vec![PopulationSpec {
            loc: (1, 1),
            pop: (0..60)
                .map(|_| AnimalSpec::new(Species::Herbivore, 5, 20.0))
                .chain((0..5).map(|_| AnimalSpec::new(Species::Carnivore, 5, 20.0)))
                .collect(),
        }];
        let mut sim = Simulation::new(map, &population, seed).unwrap();
        for _ in 0..5 {
            sim.step();
            let params = sim.parameters().clone();
            for (_, cell) in sim.island().cells() {
                prop_assert!(cell.fodder() >= 0.0);
                prop_assert!(cell.fodder() <= params.f_max(cell.terrain()));
            }
        }
    }

    #[test]
    fn enclosed_cell_is_never_left(seed in any::<u64>()) {
        let params = Parameters::default();
        let island = Island::new("OOO\nOJO\nOOO", &params).unwrap();
        let mut rng = seeded(seed);
        let mut reference = rng.clone();
        for species in Species::ALL {
            prop_assert_eq!(island.migrate_to((1, 1), species, &params, &mut rng), (1, 1));
        }
        prop_assert_eq!(rng.gen::<f64>(), reference.gen::<f64>());
    }
}
