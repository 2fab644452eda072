use crate::error::AppError;
use crate::models::RecommendationOutcome;
use crate::service::export::export_history_csv;
use crate::service::Recommender;
use axum::{
    extract::{Json, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Query string of the legacy lookup endpoint
#[derive(Debug, Deserialize)]
pub struct RutQuery {
    pub rut: String,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub status: &'static str,
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse { status: "ok" })
}

/// Health check
pub async fn health_check() -> &'static str {
    "OK"
}

/// `GET /consultar-rut?rut=...`
pub async fn consult_rut(
    State(recommender): State<Arc<Recommender>>,
    Query(query): Query<RutQuery>,
) -> Result<Json<RecommendationOutcome>, AppError> {
    Ok(Json(recommender.recommend(&query.rut).await?))
}

/// `GET /api/recommend/:rut`
pub async fn recommend(
    State(recommender): State<Arc<Recommender>>,
    Path(rut): Path<String>,
) -> Result<Json<RecommendationOutcome>, AppError> {
    Ok(Json(recommender.recommend(&rut).await?))
}

/// `GET /api/recommend/:rut/history.csv`
pub async fn history_csv(
    State(recommender): State<Arc<Recommender>>,
    Path(rut): Path<String>,
) -> Result<Response, AppError> {
    if rut.trim().is_empty() {
        return Err(AppError::InvalidRequest("rut must not be empty".to_string()));
    }
    let records = recommender.matched_history(&rut).await?;
    let mut body = Vec::new();
    export_history_csv(&records, &mut body)?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        body,
    )
        .into_response())
}
