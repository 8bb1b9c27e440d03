//! Resolution of free text into target feature ranges.
//!
//! text -> labels + embedding -> base ranges + nearest archetypes -> blend.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::embedding::{EmbeddingError, EmbeddingProvider};
use crate::features::{AudioFeature, FeatureRange, FeatureRanges};

use super::archetype::{ArchetypeKey, ArchetypeTable};
use super::categorizer::{ScenarioLabels, TextCategorizer};
use super::labels::{Activity, Mood, SocialContext, TimeOfDay};

pub const DEFAULT_TOP_K: usize = 3;

/// Structured view of one request's text. Built per request, never mutated.
#[derive(Debug, Clone)]
pub struct ScenarioFeatures {
    pub labels: ScenarioLabels,
    /// Lower-cased input.
    pub text: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimilarArchetype {
    pub key: ArchetypeKey,
    pub similarity: f32,
    pub ranges: FeatureRanges,
}

/// Every intermediate result of a resolution.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionTrace {
    pub text: String,
    pub labels: ScenarioLabels,
    pub base_ranges: FeatureRanges,
    pub similar: Vec<SimilarArchetype>,
    /// True when no archetype was comparable and the default stood in.
    pub fallback: bool,
    pub ranges: FeatureRanges,
}

#[derive(Debug, Clone, Copy)]
pub struct ResolverSettings {
    /// Used with similarity 1.0 when the search yields no candidates.
    pub default_archetype: ArchetypeKey,
    pub top_k: usize,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            default_archetype: ArchetypeKey {
                mood: Mood::Relaxed,
                activity: Activity::Relaxing,
                time: TimeOfDay::Evening,
                social: SocialContext::Alone,
            },
            top_k: DEFAULT_TOP_K,
        }
    }
}

pub struct ScenarioResolver {
    categorizer: TextCategorizer,
    provider: Arc<dyn EmbeddingProvider>,
    table: Arc<ArchetypeTable>,
    settings: ResolverSettings,
}

impl std::fmt::Debug for ScenarioResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioResolver")
            .field("archetypes", &self.table.len())
            .field("dimension", &self.provider.dimension())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl ScenarioResolver {
    #[must_use]
    pub fn new(
        categorizer: TextCategorizer,
        provider: Arc<dyn EmbeddingProvider>,
        table: Arc<ArchetypeTable>,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            categorizer,
            provider,
            table,
            settings,
        }
    }

    #[must_use]
    pub fn table(&self) -> &ArchetypeTable {
        &self.table
    }

    #[must_use]
    pub fn settings(&self) -> ResolverSettings {
        self.settings
    }

    /// Classifies and embeds the lower-cased text. Blocking.
    ///
    /// # Errors
    /// Propagates embedding provider failures.
    pub fn process(&self, text: &str) -> Result<ScenarioFeatures, EmbeddingError> {
        let lowered = text.to_lowercase();
        let labels = self.categorizer.classify_lowered(&lowered);
        let embedding = self.provider.embed(&lowered)?;
        Ok(ScenarioFeatures {
            labels,
            text: lowered,
            embedding,
        })
    }

    /// Ranges contributed by the detected labels alone.
    #[must_use]
    pub fn base_ranges(labels: &ScenarioLabels) -> FeatureRanges {
        let mut ranges = FeatureRanges::new();
        // Mood overwrites key-wise; the other axes union into what is there.
        if let Some(mood) = labels.mood {
            ranges.assign_table(mood.feature_ranges());
        }
        if let Some(activity) = labels.activity {
            ranges.merge_table(activity.feature_ranges());
        }
        if let Some(time) = labels.time {
            ranges.merge_table(time.feature_ranges());
        }
        if let Some(social) = labels.social {
            ranges.merge_table(social.feature_ranges());
        }
        ranges
    }

    /// Top-k archetypes by cosine similarity, or the default archetype with
    /// similarity 1.0 when nothing is comparable. The flag reports the fallback.
    #[must_use]
    pub fn similar_archetypes(&self, embedding: &[f32]) -> (Vec<SimilarArchetype>, bool) {
        let similar: Vec<SimilarArchetype> = self
            .table
            .nearest(embedding, self.settings.top_k)
            .into_iter()
            .map(|(archetype, similarity)| SimilarArchetype {
                key: archetype.key,
                similarity,
                ranges: archetype.ranges.clone(),
            })
            .collect();

        if similar.is_empty() {
            warn!(
                archetypes = self.table.len(),
                query_dimension = embedding.len(),
                table_dimension = self.table.dimension(),
                "no comparable archetype, using default"
            );
            let key = self.settings.default_archetype;
            let fallback = SimilarArchetype {
                key,
                similarity: 1.0,
                ranges: key.feature_ranges(),
            };
            return (vec![fallback], true);
        }
        (similar, false)
    }

    #[must_use]
    pub fn resolve(&self, features: &ScenarioFeatures) -> FeatureRanges {
        self.trace(features).ranges
    }

    #[must_use]
    pub fn trace(&self, features: &ScenarioFeatures) -> ResolutionTrace {
        let base_ranges = Self::base_ranges(&features.labels);
        let (similar, fallback) = self.similar_archetypes(&features.embedding);
        let ranges = blend(&base_ranges, &similar);
        debug!(
            text = %features.text,
            fallback,
            features = ranges.len(),
            "scenario resolved"
        );
        ResolutionTrace {
            text: features.text.clone(),
            labels: features.labels,
            base_ranges,
            similar,
            fallback,
            ranges,
        }
    }

    /// `process` followed by `trace`.
    ///
    /// # Errors
    /// Propagates embedding provider failures.
    pub fn inspect(&self, text: &str) -> Result<ResolutionTrace, EmbeddingError> {
        let features = self.process(text)?;
        Ok(self.trace(&features))
    }
}

/// Blends base ranges with the neighbours' mean ranges, feature by feature in
/// vocabulary order.
///
/// With contributors, the neighbour mean is averaged with the base range when
/// one exists, or used as is. Without contributors the base range survives
/// untouched; features in neither are omitted.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn blend(base: &FeatureRanges, similar: &[SimilarArchetype]) -> FeatureRanges {
    let mut blended = FeatureRanges::new();
    for feature in AudioFeature::ALL {
        let contributions: Vec<FeatureRange> = similar
            .iter()
            .filter_map(|archetype| archetype.ranges.get(feature))
            .collect();

        let base_range = base.get(feature);
        if contributions.is_empty() {
            if let Some(range) = base_range {
                blended.insert(feature, range);
            }
            continue;
        }

        let count = contributions.len() as f64;
        let mean = FeatureRange {
            min: contributions.iter().map(|range| range.min).sum::<f64>() / count,
            max: contributions.iter().map(|range| range.max).sum::<f64>() / count,
        };
        let range = match base_range {
            Some(range) => range.midpoint_with(mean),
            None => mean,
        };
        blended.insert(feature, range);
    }
    blended
}
