//! Per-request orchestration: resolve the scenario, rank the catalog snapshot,
//! project the winners.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::catalog::{CatalogCache, CatalogError, SongRecord};
use crate::embedding::EmbeddingError;
use crate::observability::metrics::{Metrics, RequestOutcome};
use crate::scenario::{ResolutionTrace, ScenarioResolver};

use super::genre::GenreProfile;
use super::scorer::CatalogScorer;

pub const DEFAULT_TOP_N: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum RecommendError {
    #[error("failed to process scenario")]
    ScenarioProcessingFailure(#[source] EmbeddingError),
    #[error("song catalog unavailable")]
    CatalogUnavailable(#[source] CatalogError),
}

impl RecommendError {
    #[must_use]
    pub fn outcome(&self) -> RequestOutcome {
        match self {
            RecommendError::ScenarioProcessingFailure(_) => RequestOutcome::ScenarioFailure,
            RecommendError::CatalogUnavailable(_) => RequestOutcome::CatalogUnavailable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationRequest {
    pub request_id: Uuid,
    pub input: String,
    pub genre: Option<String>,
    pub top_n: usize,
}

impl RecommendationRequest {
    #[must_use]
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            input: input.into(),
            genre: None,
            top_n: DEFAULT_TOP_N,
        }
    }

    #[must_use]
    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    #[must_use]
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }
}

/// One recommended song. Speechiness and the match score stay internal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub track_name: String,
    pub artist_name: String,
    pub danceability: f64,
    pub energy: f64,
    pub valence: f64,
    pub tempo: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
}

impl From<&SongRecord> for Recommendation {
    fn from(song: &SongRecord) -> Self {
        Self {
            track_name: song.track_name.clone(),
            artist_name: song.artist_name.clone(),
            danceability: song.danceability,
            energy: song.energy,
            valence: song.valence,
            tempo: song.tempo,
            acousticness: song.acousticness,
            instrumentalness: song.instrumentalness,
        }
    }
}

/// Resolution, catalog and scoring wired together for one query at a time.
#[derive(Debug, Clone)]
pub struct SongRecommender {
    resolver: Arc<ScenarioResolver>,
    catalog: Arc<CatalogCache>,
    scorer: CatalogScorer,
    metrics: Arc<Metrics>,
}

impl SongRecommender {
    #[must_use]
    pub fn new(
        resolver: Arc<ScenarioResolver>,
        catalog: Arc<CatalogCache>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            resolver,
            catalog,
            scorer: CatalogScorer,
            metrics,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<CatalogCache> {
        &self.catalog
    }

    #[must_use]
    pub fn resolver(&self) -> &Arc<ScenarioResolver> {
        &self.resolver
    }

    /// # Errors
    /// `ScenarioProcessingFailure` when embedding fails, `CatalogUnavailable`
    /// when the catalog cannot be loaded.
    #[instrument(
        skip_all,
        fields(
            request_id = %request.request_id,
            genre = request.genre.as_deref(),
            top_n = request.top_n,
        )
    )]
    pub async fn recommend(
        &self,
        request: RecommendationRequest,
    ) -> Result<Vec<Recommendation>, RecommendError> {
        let started = Instant::now();
        let result = self.recommend_inner(request).await;
        self.metrics
            .recommend_duration
            .observe(started.elapsed().as_secs_f64());

        match &result {
            Ok(songs) => {
                self.metrics.record_outcome(RequestOutcome::Success);
                info!(returned = songs.len(), "recommendations served");
            }
            Err(err) => {
                self.metrics.record_outcome(err.outcome());
                error!(error = ?err, "recommendation failed");
            }
        }
        result
    }

    async fn recommend_inner(
        &self,
        request: RecommendationRequest,
    ) -> Result<Vec<Recommendation>, RecommendError> {
        let RecommendationRequest {
            input,
            genre,
            top_n,
            ..
        } = request;
        let trace = self.resolve(input).await?;

        let snapshot = self
            .catalog
            .snapshot()
            .await
            .map_err(RecommendError::CatalogUnavailable)?;
        self.metrics.catalog_songs.set(gauge_value(snapshot.len()));

        let ranked = self
            .scorer
            .rank(snapshot.songs(), &trace.ranges, genre.as_deref(), top_n);
        Ok(ranked
            .into_iter()
            .map(|hit| Recommendation::from(hit.song))
            .collect())
    }

    /// Full resolution trace for `text`, without touching the catalog.
    ///
    /// # Errors
    /// `ScenarioProcessingFailure` when embedding fails.
    pub async fn inspect(&self, text: String) -> Result<ResolutionTrace, RecommendError> {
        self.resolve(text).await
    }

    #[must_use]
    pub fn available_genres(&self) -> Vec<&'static str> {
        GenreProfile::names()
    }

    /// Runs the blocking resolution on the blocking pool.
    async fn resolve(&self, text: String) -> Result<ResolutionTrace, RecommendError> {
        let resolver = Arc::clone(&self.resolver);
        let started = Instant::now();
        let trace = tokio::task::spawn_blocking(move || resolver.inspect(&text))
            .await
            .map_err(|err| RecommendError::ScenarioProcessingFailure(EmbeddingError::TaskJoin(err)))?
            .map_err(RecommendError::ScenarioProcessingFailure)?;

        self.metrics
            .resolve_duration
            .observe(started.elapsed().as_secs_f64());
        if trace.fallback {
            self.metrics.archetype_fallbacks.inc();
        }
        Ok(trace)
    }
}

fn gauge_value(count: usize) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use prometheus::Registry;

    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::embedding::{EmbeddingProvider, HashingEmbeddingProvider};
    use crate::scenario::{ArchetypeTable, ResolverSettings, TextCategorizer};

    struct FailingProvider;

    impl EmbeddingProvider for FailingProvider {
        fn dimension(&self) -> usize {
            4
        }

        fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::EmptyOutput)
        }
    }

    fn song(name: &str, energy: f64, acousticness: f64) -> SongRecord {
        SongRecord {
            track_name: name.to_string(),
            artist_name: "artist".to_string(),
            danceability: 0.5,
            energy,
            valence: 0.5,
            tempo: 95.0,
            acousticness,
            instrumentalness: 0.5,
            speechiness: 0.05,
            loudness: None,
        }
    }

    fn recommender(provider: Arc<dyn EmbeddingProvider>, songs: Vec<SongRecord>) -> SongRecommender {
        let table = ArchetypeTable::build(&HashingEmbeddingProvider::default(), None)
            .expect("table");
        let resolver = ScenarioResolver::new(
            TextCategorizer::new().expect("categorizer"),
            provider,
            Arc::new(table),
            ResolverSettings::default(),
        );
        let catalog = CatalogCache::new(Arc::new(InMemoryCatalog::new(songs)), None);
        let metrics = Metrics::new(Arc::new(Registry::new())).expect("metrics");
        SongRecommender::new(Arc::new(resolver), Arc::new(catalog), Arc::new(metrics))
    }

    #[tokio::test]
    async fn recommends_at_most_top_n() {
        let songs = (0..5).map(|i| song(&format!("track {i}"), 0.3, 0.7)).collect();
        let recommender = recommender(Arc::new(HashingEmbeddingProvider::default()), songs);

        let request = RecommendationRequest::new("Relaxing evening at home").with_top_n(3);
        let recommendations = recommender.recommend(request).await.expect("recommend");
        assert_eq!(recommendations.len(), 3);
        // all songs tie, so catalog order is kept
        assert_eq!(recommendations[0].track_name, "track 0");
        assert_eq!(
            recommender
                .metrics
                .recommendations
                .with_label_values(&["success"])
                .get(),
            1
        );
    }

    #[tokio::test]
    async fn embedding_failure_is_a_scenario_processing_failure() {
        let recommender = recommender(Arc::new(FailingProvider), vec![song("a", 0.5, 0.5)]);
        let err = recommender
            .recommend(RecommendationRequest::new("anything"))
            .await
            .expect_err("embedding fails");
        assert!(matches!(err, RecommendError::ScenarioProcessingFailure(_)));
        assert_eq!(
            recommender
                .metrics
                .recommendations
                .with_label_values(&["scenario_failure"])
                .get(),
            1
        );
    }

    #[tokio::test]
    async fn empty_text_counts_a_fallback() {
        let recommender = recommender(Arc::new(HashingEmbeddingProvider::default()), Vec::new());
        let trace = recommender.inspect(String::new()).await.expect("inspect");
        assert!(trace.fallback);
        assert_eq!(recommender.metrics.archetype_fallbacks.get(), 1);
    }

    #[test]
    fn recommendation_omits_speechiness() {
        let json = serde_json::to_value(Recommendation::from(&song("a", 0.5, 0.5)))
            .expect("serialize");
        assert!(json.get("speechiness").is_none());
        assert!(json.get("instrumentalness").is_some());
    }

    #[test]
    fn genres_follow_profile_order() {
        let recommender = recommender(Arc::new(HashingEmbeddingProvider::default()), Vec::new());
        assert_eq!(recommender.available_genres()[0], "electronic");
        assert_eq!(recommender.available_genres().len(), 5);
    }
}
