//! Text embedding providers.
//!
//! The resolver only depends on [`EmbeddingProvider`]: a synchronous,
//! deterministic `text -> vector` map with a fixed dimension. Two providers ship
//! with the crate: the rust-bert sentence-embeddings pipeline and a feature
//! hashing stand-in that needs no model weights.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use rust_bert::RustBertError;
use rust_bert::pipelines::sentence_embeddings::{
    SentenceEmbeddingsBuilder, SentenceEmbeddingsModel, SentenceEmbeddingsModelType,
};
use tracing::info;
use xxhash_rust::xxh3::xxh3_64;

#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("failed to load embedding model")]
    ModelLoad(#[source] RustBertError),
    #[error("embedding model loader thread panicked")]
    LoaderPanicked,
    #[error("failed to encode text")]
    Encode(#[source] RustBertError),
    #[error("embedding model returned no vectors")]
    EmptyOutput,
    #[error("embedding model lock poisoned")]
    LockPoisoned,
    #[error("embedding task failed to join")]
    TaskJoin(#[source] tokio::task::JoinError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown embedding model: {0}")]
pub struct UnknownModel(pub String);

/// Opaque `text -> vector` boundary.
///
/// Implementations are blocking; async callers must move calls onto a blocking
/// worker.
pub trait EmbeddingProvider: Send + Sync {
    /// Length of every vector this provider returns.
    fn dimension(&self) -> usize;

    /// # Errors
    /// Returns an error when the underlying model fails to encode the text.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embeds texts in order. The default calls [`EmbeddingProvider::embed`]
    /// once per text.
    ///
    /// # Errors
    /// Returns the first encoding error.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

/// Selectable embedding backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbeddingModel {
    #[default]
    AllDistilrobertaV1,
    AllMiniLmL12V2,
    AllMiniLmL6V2,
    /// Deterministic feature hashing; no weights to download.
    Hashing,
}

impl EmbeddingModel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EmbeddingModel::AllDistilrobertaV1 => "all-distilroberta-v1",
            EmbeddingModel::AllMiniLmL12V2 => "all-mini-lm-l12-v2",
            EmbeddingModel::AllMiniLmL6V2 => "all-mini-lm-l6-v2",
            EmbeddingModel::Hashing => "hashing",
        }
    }

    /// Builds the provider. Sentence models load their weights here, which can
    /// take a while on first run.
    ///
    /// # Errors
    /// Returns an error when the model cannot be loaded.
    pub fn load(self) -> Result<Arc<dyn EmbeddingProvider>, EmbeddingError> {
        let provider: Arc<dyn EmbeddingProvider> = match self {
            EmbeddingModel::AllDistilrobertaV1 => Arc::new(SentenceEmbeddingProvider::new(
                SentenceEmbeddingsModelType::AllDistilrobertaV1,
            )?),
            EmbeddingModel::AllMiniLmL12V2 => Arc::new(SentenceEmbeddingProvider::new(
                SentenceEmbeddingsModelType::AllMiniLmL12V2,
            )?),
            EmbeddingModel::AllMiniLmL6V2 => Arc::new(SentenceEmbeddingProvider::new(
                SentenceEmbeddingsModelType::AllMiniLmL6V2,
            )?),
            EmbeddingModel::Hashing => Arc::new(HashingEmbeddingProvider::default()),
        };
        info!(
            model = self.as_str(),
            dimension = provider.dimension(),
            "embedding provider ready"
        );
        Ok(provider)
    }
}

impl fmt::Display for EmbeddingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmbeddingModel {
    type Err = UnknownModel;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "all-distilroberta-v1" => Ok(EmbeddingModel::AllDistilrobertaV1),
            "all-mini-lm-l12-v2" => Ok(EmbeddingModel::AllMiniLmL12V2),
            "all-mini-lm-l6-v2" => Ok(EmbeddingModel::AllMiniLmL6V2),
            "hashing" => Ok(EmbeddingModel::Hashing),
            _ => Err(UnknownModel(raw.to_string())),
        }
    }
}

/// Sentence embeddings via rust-bert. CPU only.
pub struct SentenceEmbeddingProvider {
    model: Mutex<SentenceEmbeddingsModel>,
    dimension: usize,
}

impl fmt::Debug for SentenceEmbeddingProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SentenceEmbeddingProvider")
            .field("model", &"<SentenceEmbeddingsModel>")
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl SentenceEmbeddingProvider {
    /// Loads the model on a dedicated thread and probes its output dimension.
    ///
    /// # Errors
    /// Returns an error when the weights cannot be fetched or loaded.
    pub fn new(model_type: SentenceEmbeddingsModelType) -> Result<Self, EmbeddingError> {
        // Model creation is blocking and may download weights.
        let model = std::thread::spawn(move || {
            SentenceEmbeddingsBuilder::remote(model_type).create_model()
        })
        .join()
        .map_err(|_| EmbeddingError::LoaderPanicked)?
        .map_err(EmbeddingError::ModelLoad)?;

        let probe = model
            .encode(&["dimension probe"])
            .map_err(EmbeddingError::Encode)?;
        let dimension = probe.first().map(Vec::len).ok_or(EmbeddingError::EmptyOutput)?;

        Ok(Self {
            model: Mutex::new(model),
            dimension,
        })
    }
}

impl EmbeddingProvider for SentenceEmbeddingProvider {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_batch(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or(EmbeddingError::EmptyOutput)
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let model = self.model.lock().map_err(|_| EmbeddingError::LockPoisoned)?;
        let vectors = model.encode(texts).map_err(EmbeddingError::Encode)?;
        if vectors.len() != texts.len() {
            return Err(EmbeddingError::EmptyOutput);
        }
        Ok(vectors)
    }
}

pub const DEFAULT_HASHING_DIMENSION: usize = 256;

/// Signed feature hashing over lower-cased alphanumeric tokens, L2-normalized.
///
/// Texts sharing words land close together, which is enough for tests and
/// offline inspection. Text without tokens maps to the zero vector.
#[derive(Debug, Clone)]
pub struct HashingEmbeddingProvider {
    dimension: usize,
}

impl HashingEmbeddingProvider {
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }
}

impl Default for HashingEmbeddingProvider {
    fn default() -> Self {
        Self::new(DEFAULT_HASHING_DIMENSION)
    }
}

impl EmbeddingProvider for HashingEmbeddingProvider {
    fn dimension(&self) -> usize {
        self.dimension
    }

    #[allow(clippy::cast_possible_truncation)]
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = vec![0.0_f32; self.dimension];
        let lowered = text.to_lowercase();
        for token in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
        {
            let hash = xxh3_64(token.as_bytes());
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if hash >> 63 == 1 { -1.0 } else { 1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        Ok(vector)
    }
}

/// Cosine similarity `dot / (|a| |b|)`, clamped to `[-1, 1]`.
///
/// Returns `None` when either vector has zero norm or the lengths differ.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = norm(a);
    let norm_b = norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }
    Some((dot / (norm_a * norm_b)).clamp(-1.0, 1.0))
}

pub(crate) fn norm(vector: &[f32]) -> f32 {
    vector.iter().map(|x| x * x).sum::<f32>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(vec![1.0, 0.0, 0.0])]
    #[case(vec![0.3, -2.5, 7.0, 0.01])]
    #[case(vec![1e-3; 16])]
    fn cosine_of_vector_with_itself_is_one(#[case] vector: Vec<f32>) {
        let similarity = cosine_similarity(&vector, &vector).expect("non-zero vector");
        assert!((similarity - 1.0).abs() < 1e-5);
    }

    #[test]
    fn cosine_rejects_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), None);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), None);
        assert_eq!(cosine_similarity(&[], &[]), None);
    }

    #[test]
    fn cosine_of_opposite_vectors_is_minus_one() {
        let similarity = cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]).expect("non-zero");
        assert!((similarity + 1.0).abs() < 1e-5);
    }

    #[test]
    fn hashing_provider_is_deterministic_and_normalized() {
        let provider = HashingEmbeddingProvider::default();
        let first = provider.embed("Relaxing evening at home").expect("embed");
        let second = provider.embed("relaxing   EVENING at home!").expect("embed");
        assert_eq!(first.len(), DEFAULT_HASHING_DIMENSION);
        assert_eq!(first, second);
        assert!((norm(&first) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn hashing_provider_maps_empty_text_to_zero_vector() {
        let provider = HashingEmbeddingProvider::new(8);
        let vector = provider.embed("  ,.; ").expect("embed");
        assert_eq!(vector, vec![0.0; 8]);
    }

    #[test]
    fn shared_words_increase_similarity() {
        let provider = HashingEmbeddingProvider::default();
        let query = provider.embed("relaxing in the evening").expect("embed");
        let close = provider.embed("relaxing in the evening, feeling calm").expect("embed");
        let far = provider.embed("exercising at dawn").expect("embed");
        let close_score = cosine_similarity(&query, &close).expect("non-zero");
        let far_score = cosine_similarity(&query, &far).unwrap_or(0.0);
        assert!(close_score > far_score);
    }

    #[test]
    fn batch_preserves_order() {
        let provider = HashingEmbeddingProvider::default();
        let texts = vec!["morning".to_string(), "night".to_string()];
        let batch = provider.embed_batch(&texts).expect("batch");
        assert_eq!(batch[0], provider.embed("morning").expect("embed"));
        assert_eq!(batch[1], provider.embed("night").expect("embed"));
    }

    #[test]
    fn model_names_parse() {
        assert_eq!(
            "all-distilroberta-v1".parse::<EmbeddingModel>().ok(),
            Some(EmbeddingModel::AllDistilrobertaV1)
        );
        assert_eq!("HASHING".parse::<EmbeddingModel>().ok(), Some(EmbeddingModel::Hashing));
        assert!("word2vec".parse::<EmbeddingModel>().is_err());
    }
}
