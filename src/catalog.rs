//! Song catalog: the read-only table of tracks and their audio features.

use serde::{Deserialize, Serialize};

use crate::features::AudioFeature;

pub mod cache;
pub mod source;
pub mod sqlite;

pub use cache::{CatalogCache, CatalogSnapshot};
pub use source::{CatalogSource, InMemoryCatalog};
pub use sqlite::{SqliteCatalog, SqliteCatalogOptions};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to connect to catalog database")]
    Connect(#[source] sqlx::Error),
    #[error("catalog query failed")]
    Query(#[source] sqlx::Error),
    #[error("failed to decode catalog column {column}")]
    Decode {
        column: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

/// One catalog row. Required features are never null; rows with missing
/// values are dropped at the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongRecord {
    pub track_name: String,
    pub artist_name: String,
    pub danceability: f64,
    pub energy: f64,
    pub valence: f64,
    pub tempo: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    pub speechiness: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loudness: Option<f64>,
}

impl SongRecord {
    #[must_use]
    pub fn value(&self, feature: AudioFeature) -> Option<f64> {
        match feature {
            AudioFeature::Danceability => Some(self.danceability),
            AudioFeature::Energy => Some(self.energy),
            AudioFeature::Loudness => self.loudness,
            AudioFeature::Speechiness => Some(self.speechiness),
            AudioFeature::Acousticness => Some(self.acousticness),
            AudioFeature::Instrumentalness => Some(self.instrumentalness),
            AudioFeature::Valence => Some(self.valence),
            AudioFeature::Tempo => Some(self.tempo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loudness_is_the_only_optional_feature() {
        let song = SongRecord {
            track_name: "Clair de Lune".to_string(),
            artist_name: "Debussy".to_string(),
            danceability: 0.2,
            energy: 0.1,
            valence: 0.3,
            tempo: 66.0,
            acousticness: 0.99,
            instrumentalness: 0.95,
            speechiness: 0.04,
            loudness: None,
        };
        for feature in AudioFeature::ALL {
            assert_eq!(song.value(feature).is_none(), feature == AudioFeature::Loudness);
        }
        assert_eq!(song.value(AudioFeature::Tempo), Some(66.0));
    }
}
