use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Terrain {
    Ocean,
    Mountain,
    Desert,
    Savannah,
    Jungle,
}

impl Terrain {
    pub const ALL: [Terrain; 5] = [
        Terrain::Ocean,
        Terrain::Mountain,
        Terrain::Desert,
        Terrain::Savannah,
        Terrain::Jungle,
    ];

    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'O' => Some(Terrain::Ocean),
            'M' => Some(Terrain::Mountain),
            'D' => Some(Terrain::Desert),
            'S' => Some(Terrain::Savannah),
            'J' => Some(Terrain::Jungle),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            Terrain::Ocean => 'O',
            Terrain::Mountain => 'M',
            Terrain::Desert => 'D',
            Terrain::Savannah => 'S',
            Terrain::Jungle => 'J',
        }
    }

    /// Ocean and mountain cells never host animals and never hold fodder.
    pub fn is_habitable(self) -> bool {
        !matches!(self, Terrain::Ocean | Terrain::Mountain)
    }
}

impl fmt::Display for Terrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Terrain::Ocean => "ocean",
            Terrain::Mountain => "mountain",
            Terrain::Desert => "desert",
            Terrain::Savannah => "savannah",
            Terrain::Jungle => "jungle",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for terrain in Terrain::ALL {
            assert_eq!(Terrain::from_code(terrain.code()), Some(terrain));
        }
        assert_eq!(Terrain::from_code('P'), None);
    }

    #[test]
    fn only_land_is_habitable() {
        assert!(!Terrain::Ocean.is_habitable());
        assert!(!Terrain::Mountain.is_habitable());
        assert!(Terrain::Desert.is_habitable());
        assert!(Terrain::Savannah.is_habitable());
        assert!(Terrain::Jungle.is_habitable());
    }
}
