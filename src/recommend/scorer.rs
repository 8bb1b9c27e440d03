//! Range-match scoring and top-N selection over a catalog snapshot.

use tracing::debug;

use crate::catalog::SongRecord;
use crate::features::FeatureRanges;

use super::genre::GenreProfile;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredSong<'a> {
    pub song: &'a SongRecord,
    pub score: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogScorer;

impl CatalogScorer {
    /// Number of range features whose song value lies inside the range.
    #[must_use]
    pub fn score(song: &SongRecord, ranges: &FeatureRanges) -> usize {
        ranges
            .iter()
            .filter(|(feature, band)| {
                song.value(*feature)
                    .is_some_and(|value| band.contains(value))
            })
            .count()
    }

    /// Songs admitted by the named genre, or all songs when the name is
    /// absent or unknown.
    #[must_use]
    pub fn filter_by_genre<'a>(songs: &'a [SongRecord], genre: Option<&str>) -> Vec<&'a SongRecord> {
        match genre.and_then(GenreProfile::lookup) {
            Some(profile) => songs.iter().filter(|song| profile.admits(song)).collect(),
            None => {
                if let Some(name) = genre {
                    debug!(genre = name, "unknown genre, filter skipped");
                }
                songs.iter().collect()
            }
        }
    }

    /// Top `n` songs by descending score. Equal scores keep catalog order.
    #[must_use]
    pub fn rank<'a>(
        &self,
        songs: &'a [SongRecord],
        ranges: &FeatureRanges,
        genre: Option<&str>,
        n: usize,
    ) -> Vec<ScoredSong<'a>> {
        let mut scored: Vec<ScoredSong<'a>> = Self::filter_by_genre(songs, genre)
            .into_iter()
            .map(|song| ScoredSong {
                song,
                score: Self::score(song, ranges),
            })
            .collect();
        // Stable, so ties stay in catalog order.
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored.truncate(n);
        scored
    }
}
