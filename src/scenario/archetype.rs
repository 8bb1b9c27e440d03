//! Precomputed scenario archetypes: every mood x activity x time x social
//! combination with its merged feature ranges and description embedding.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::embedding::{EmbeddingError, EmbeddingProvider, cosine_similarity};
use crate::features::FeatureRanges;

use super::labels::{Activity, Mood, SocialContext, TimeOfDay};

/// Number of concrete label combinations.
pub const ARCHETYPE_COUNT: usize =
    Mood::ALL.len() * Activity::ALL.len() * TimeOfDay::ALL.len() * SocialContext::ALL.len();

#[derive(Debug, thiserror::Error)]
pub enum ArchetypeError {
    #[error("failed to embed archetype descriptions")]
    Embedding(#[from] EmbeddingError),
    #[error("embedding provider returned {actual} vectors for {expected} descriptions")]
    CountMismatch { expected: usize, actual: usize },
    #[error("archetype {index} embedding has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
}

/// One concrete label combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArchetypeKey {
    pub mood: Mood,
    pub activity: Activity,
    pub time: TimeOfDay,
    pub social: SocialContext,
}

impl ArchetypeKey {
    /// All combinations, mood outermost and social innermost.
    pub fn all() -> impl Iterator<Item = ArchetypeKey> {
        Mood::ALL.iter().flat_map(|&mood| {
            Activity::ALL.iter().flat_map(move |&activity| {
                TimeOfDay::ALL.iter().flat_map(move |&time| {
                    SocialContext::ALL.iter().map(move |&social| ArchetypeKey {
                        mood,
                        activity,
                        time,
                        social,
                    })
                })
            })
        })
    }

    /// Mood table assigned, then activity, time and social unioned in.
    #[must_use]
    pub fn feature_ranges(&self) -> FeatureRanges {
        let mut ranges = FeatureRanges::from_table(self.mood.feature_ranges());
        ranges.merge_table(self.activity.feature_ranges());
        ranges.merge_table(self.time.feature_ranges());
        ranges.merge_table(self.social.feature_ranges());
        ranges
    }

    /// `"{activity} in the {time}, feeling {mood}, {social}"`; the social clause
    /// is dropped when it equals `silent_social`.
    #[must_use]
    pub fn description(&self, silent_social: Option<SocialContext>) -> String {
        let mut text = format!(
            "{} in the {}, feeling {}",
            self.activity, self.time, self.mood
        );
        if silent_social != Some(self.social) {
            text.push_str(", ");
            text.push_str(self.social.as_str());
        }
        text
    }
}

#[derive(Debug, Clone)]
pub struct Archetype {
    pub key: ArchetypeKey,
    pub ranges: FeatureRanges,
    pub description: String,
    pub embedding: Vec<f32>,
}

/// Immutable archetype catalog. Built once at startup with a single batch
/// embedding call.
#[derive(Debug, Default)]
pub struct ArchetypeTable {
    archetypes: Vec<Archetype>,
    dimension: usize,
}

impl ArchetypeTable {
    /// # Errors
    /// Fails when the provider errors or returns vectors of the wrong count or
    /// dimension.
    pub fn build(
        provider: &dyn EmbeddingProvider,
        silent_social: Option<SocialContext>,
    ) -> Result<Self, ArchetypeError> {
        let keys: Vec<ArchetypeKey> = ArchetypeKey::all().collect();
        let descriptions: Vec<String> = keys
            .iter()
            .map(|key| key.description(silent_social))
            .collect();

        let embeddings = provider.embed_batch(&descriptions)?;
        if embeddings.len() != keys.len() {
            return Err(ArchetypeError::CountMismatch {
                expected: keys.len(),
                actual: embeddings.len(),
            });
        }

        let dimension = provider.dimension();
        let mut archetypes = Vec::with_capacity(keys.len());
        for (index, ((key, description), embedding)) in keys
            .into_iter()
            .zip(descriptions)
            .zip(embeddings)
            .enumerate()
        {
            if embedding.len() != dimension {
                return Err(ArchetypeError::DimensionMismatch {
                    index,
                    expected: dimension,
                    actual: embedding.len(),
                });
            }
            archetypes.push(Archetype {
                key,
                ranges: key.feature_ranges(),
                description,
                embedding,
            });
        }

        info!(
            archetypes = archetypes.len(),
            dimension, "archetype table built"
        );
        Ok(Self {
            archetypes,
            dimension,
        })
    }

    /// A table with no archetypes; every search falls back to the default.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn iter(&self) -> impl Iterator<Item = &Archetype> {
        self.archetypes.iter()
    }

    #[must_use]
    pub fn get(&self, key: ArchetypeKey) -> Option<&Archetype> {
        self.archetypes.iter().find(|archetype| archetype.key == key)
    }

    /// Linear scan for the `k` archetypes most similar to `query`.
    ///
    /// Archetypes whose similarity is undefined (zero norm, length mismatch)
    /// are skipped. Ties keep table order.
    #[must_use]
    pub fn nearest(&self, query: &[f32], k: usize) -> Vec<(&Archetype, f32)> {
        let mut scored: Vec<(&Archetype, f32)> = self
            .archetypes
            .iter()
            .filter_map(|archetype| {
                cosine_similarity(query, &archetype.embedding).map(|score| (archetype, score))
            })
            .collect();
        // sort_by is stable.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);
        scored
    }
}
