use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::app::AppState;
use crate::recommend::{RecommendError, RecommendationRequest};

#[derive(Debug, Deserialize)]
pub(crate) struct RecommendBody {
    #[serde(default)]
    input: Option<String>,
    #[serde(default)]
    genre: Option<String>,
    #[serde(default)]
    top_n: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InspectBody {
    #[serde(default)]
    input: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct GenresResponse {
    genres: Vec<&'static str>,
}

pub(crate) enum ApiError {
    InvalidBody(JsonRejection),
    MissingInput,
    Recommend(RecommendError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection)
    }
}

impl From<RecommendError> for ApiError {
    fn from(error: RecommendError) -> Self {
        ApiError::Recommend(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidBody(rejection) => (rejection.status(), rejection.body_text()),
            ApiError::MissingInput => (
                StatusCode::BAD_REQUEST,
                "input must be a non-empty string".to_string(),
            ),
            ApiError::Recommend(error) => {
                let status = match error {
                    RecommendError::ScenarioProcessingFailure(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                    RecommendError::CatalogUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                };
                (status, error.to_string())
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

fn required_input(input: Option<String>) -> Result<String, ApiError> {
    match input {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(ApiError::MissingInput),
    }
}

pub(crate) async fn recommend(
    State(state): State<AppState>,
    body: Result<Json<RecommendBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let input = required_input(body.input)?;
    let config = state.config();
    let max_top_n = config.recommend_max_top_n();
    let top_n = body.top_n.unwrap_or(config.recommend_default_top_n());
    if top_n > max_top_n {
        warn!(requested = top_n, max_top_n, "top_n clamped");
    }

    let mut request = RecommendationRequest::new(input).with_top_n(top_n.min(max_top_n));
    if let Some(genre) = body.genre.filter(|genre| !genre.is_empty()) {
        request = request.with_genre(genre);
    }

    let recommendations = state.recommender().recommend(request).await?;
    Ok((StatusCode::OK, Json(recommendations)).into_response())
}

pub(crate) async fn genres(State(state): State<AppState>) -> impl IntoResponse {
    Json(GenresResponse {
        genres: state.recommender().available_genres(),
    })
}

pub(crate) async fn inspect(
    State(state): State<AppState>,
    body: Result<Json<InspectBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let input = required_input(body.input)?;
    let trace = state.recommender().inspect(input).await?;
    Ok((StatusCode::OK, Json(trace)).into_response())
}
