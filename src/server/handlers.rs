use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use axum::middleware::Next;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tracing::{info, warn};

use crate::detect::DetectorBackend;
use crate::recipe::Recipe;
use crate::terms;

use super::errors::ServerError;
use super::models::{
    DetectResponse, HealthResponse, LegacyDetectResponse, ReloadResponse, SearchParams,
    SearchResponse, TranslateRequest, TranslateResponse,
};
use super::state::ServerState;
use super::upload::DetectUpload;

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/recipes", get(list_recipes))
        .route("/api/recipes/reload", get(reload_recipes))
        .route("/api/recipes/search", get(search_recipes))
        .route("/api/recipes/:id", get(recipe_by_id))
        .route("/api/detect", post(detect))
        .route("/api/detect-ingredients", post(detect_ingredients))
        .route("/api/translate", post(translate))
        .with_state(Arc::new(state))
        .layer(axum::middleware::from_fn(cors_middleware))
}

pub async fn run_server(state: ServerState, addr: &str) -> Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind server address: {}", addr))?;
    info!("listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        message: "Server is running",
    })
}

async fn cors_middleware(req: Request<Body>, next: Next) -> Result<Response<Body>, StatusCode> {
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return Ok(response);
    }
    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut());
    Ok(response)
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("content-type,authorization"),
    );
}

async fn list_recipes(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<Vec<Recipe>>, ServerError> {
    let recipes = state.assistant.all_recipes().map_err(|err| {
        warn!("failed to list recipes: {:#}", err);
        ServerError::internal("Failed to fetch recipes")
    })?;
    Ok(Json(recipes))
}

async fn reload_recipes(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<ReloadResponse>, ServerError> {
    let count = state.assistant.reload().map_err(|err| {
        warn!("failed to reload recipes: {:#}", err);
        ServerError::internal("Failed to reload recipes")
    })?;
    Ok(Json(ReloadResponse {
        message: format!("Successfully reloaded {} recipes", count),
        count,
    }))
}

async fn search_recipes(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ServerError> {
    let ingredients = params.ingredients.unwrap_or_default();
    if terms::split_terms(&ingredients).is_empty() {
        return Err(ServerError::bad_request("Ingredients parameter is required"));
    }
    let result = state.assistant.search(&ingredients).await?;
    Ok(Json(SearchResponse::from(result)))
}

async fn recipe_by_id(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<Json<Recipe>, ServerError> {
    state
        .assistant
        .recipe(&id)
        .await
        .map(Json)
        .ok_or_else(|| ServerError::not_found("Recipe not found"))
}

async fn detect(
    State(state): State<Arc<ServerState>>,
    upload: DetectUpload,
) -> Result<Json<DetectResponse>, ServerError> {
    let backend = parse_backend(upload.backend.as_deref())?;
    let image = upload.into_image()?;
    let result = state.assistant.detect(&image, backend).await;
    Ok(Json(DetectResponse::from(&result)))
}

async fn detect_ingredients(
    State(state): State<Arc<ServerState>>,
    upload: DetectUpload,
) -> Result<Json<LegacyDetectResponse>, ServerError> {
    let image = upload.into_image()?;
    let result = state
        .assistant
        .detect(&image, Some(DetectorBackend::Local))
        .await;
    Ok(Json(LegacyDetectResponse::from(&result)))
}

async fn translate(
    payload: Result<Json<TranslateRequest>, JsonRejection>,
) -> Result<Json<TranslateResponse>, ServerError> {
    let Json(payload) = payload.map_err(|err| ServerError::bad_request(err.body_text()))?;
    let text = payload.text.unwrap_or_default();
    if text.trim().is_empty() {
        return Err(ServerError::bad_request("Text is required"));
    }
    Ok(Json(TranslateResponse { translation: text }))
}

fn parse_backend(value: Option<&str>) -> Result<Option<DetectorBackend>, ServerError> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|err: anyhow::Error| ServerError::bad_request(err.to_string())),
        None => Ok(None),
    }
}
