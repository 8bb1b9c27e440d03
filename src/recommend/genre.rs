//! Static genre profiles used as a pre-filter.

use crate::catalog::SongRecord;
use crate::features::{AudioFeature::*, RangeTable, range};

#[derive(Debug, Clone, Copy)]
pub struct GenreProfile {
    pub name: &'static str,
    pub constraints: RangeTable,
}

pub const GENRE_PROFILES: &[GenreProfile] = &[
    GenreProfile {
        name: "electronic",
        constraints: &[
            (Danceability, range(0.6, 1.0)),
            (Energy, range(0.7, 1.0)),
            (Instrumentalness, range(0.4, 1.0)),
            (Acousticness, range(0.0, 0.3)),
        ],
    },
    GenreProfile {
        name: "acoustic",
        constraints: &[
            (Acousticness, range(0.7, 1.0)),
            (Energy, range(0.3, 0.7)),
            (Instrumentalness, range(0.0, 0.4)),
        ],
    },
    GenreProfile {
        name: "hip_hop",
        constraints: &[
            (Speechiness, range(0.2, 1.0)),
            (Danceability, range(0.6, 1.0)),
            (Acousticness, range(0.0, 0.4)),
        ],
    },
    GenreProfile {
        name: "classical",
        constraints: &[
            (Instrumentalness, range(0.7, 1.0)),
            (Acousticness, range(0.6, 1.0)),
            (Speechiness, range(0.0, 0.1)),
        ],
    },
    GenreProfile {
        name: "rock",
        constraints: &[
            (Energy, range(0.7, 1.0)),
            (Instrumentalness, range(0.0, 0.3)),
            (Valence, range(0.4, 0.8)),
        ],
    },
];

impl GenreProfile {
    /// Exact, case-sensitive lookup.
    #[must_use]
    pub fn lookup(name: &str) -> Option<&'static GenreProfile> {
        GENRE_PROFILES.iter().find(|profile| profile.name == name)
    }

    /// Profile names in declaration order.
    #[must_use]
    pub fn names() -> Vec<&'static str> {
        GENRE_PROFILES.iter().map(|profile| profile.name).collect()
    }

    /// Every constraint holds, bounds inclusive. A missing song value fails
    /// its constraint.
    #[must_use]
    pub fn admits(&self, song: &SongRecord) -> bool {
        self.constraints.iter().all(|(feature, band)| {
            song.value(*feature)
                .is_some_and(|value| band.contains(value))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classical_candidate(speechiness: f64) -> SongRecord {
        SongRecord {
            track_name: "Gymnopedie No.1".to_string(),
            artist_name: "Satie".to_string(),
            danceability: 0.3,
            energy: 0.1,
            valence: 0.2,
            tempo: 70.0,
            acousticness: 0.8,
            instrumentalness: 0.9,
            speechiness,
            loudness: None,
        }
    }

    #[test]
    fn classical_keeps_quiet_instrumentals() {
        let classical = GenreProfile::lookup("classical").expect("classical profile");
        assert!(classical.admits(&classical_candidate(0.05)));
        assert!(!classical.admits(&classical_candidate(0.5)));
    }

    #[test]
    fn bounds_are_inclusive() {
        let classical = GenreProfile::lookup("classical").expect("classical profile");
        assert!(classical.admits(&classical_candidate(0.1)));
    }

    #[test]
    fn lookup_is_exact() {
        assert!(GenreProfile::lookup("Classical").is_none());
        assert!(GenreProfile::lookup("polka").is_none());
        assert_eq!(
            GenreProfile::names(),
            vec!["electronic", "acoustic", "hip_hop", "classical", "rock"]
        );
    }
}
