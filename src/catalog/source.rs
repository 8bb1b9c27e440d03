//! The catalog source seam and its in-memory implementation.

use async_trait::async_trait;

use super::{CatalogError, SongRecord};

/// Where catalog rows come from.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Every song with all required features present, in source order.
    async fn fetch_songs(&self, limit: Option<u32>) -> Result<Vec<SongRecord>, CatalogError>;

    /// Cheap reachability check for readiness probes.
    async fn ping(&self) -> Result<(), CatalogError>;
}

/// Fixed list of songs held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    songs: Vec<SongRecord>,
}

impl InMemoryCatalog {
    #[must_use]
    pub fn new(songs: Vec<SongRecord>) -> Self {
        Self { songs }
    }
}

#[async_trait]
impl CatalogSource for InMemoryCatalog {
    async fn fetch_songs(&self, limit: Option<u32>) -> Result<Vec<SongRecord>, CatalogError> {
        let take = limit.map_or(self.songs.len(), |limit| limit as usize);
        Ok(self.songs.iter().take(take).cloned().collect())
    }

    async fn ping(&self) -> Result<(), CatalogError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(name: &str) -> SongRecord {
        SongRecord {
            track_name: name.to_string(),
            artist_name: "artist".to_string(),
            danceability: 0.5,
            energy: 0.5,
            valence: 0.5,
            tempo: 100.0,
            acousticness: 0.5,
            instrumentalness: 0.5,
            speechiness: 0.1,
            loudness: None,
        }
    }

    #[tokio::test]
    async fn limit_keeps_source_order() {
        let catalog = InMemoryCatalog::new(vec![song("a"), song("b"), song("c")]);
        let songs = catalog.fetch_songs(Some(2)).await.expect("fetch");
        let names: Vec<_> = songs.iter().map(|song| song.track_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(catalog.fetch_songs(None).await.expect("fetch").len(), 3);
    }
}
