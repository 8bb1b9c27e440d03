//! Scoring the catalog against resolved ranges and serving recommendations.

pub mod genre;
pub mod recommender;
pub mod scorer;

pub use genre::{GENRE_PROFILES, GenreProfile};
pub use recommender::{
    DEFAULT_TOP_N, Recommendation, RecommendError, RecommendationRequest, SongRecommender,
};
pub use scorer::{CatalogScorer, ScoredSong};
