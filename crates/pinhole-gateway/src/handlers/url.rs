use crate::error::{AppError, Result};
use crate::model::{CreateUrlRequest, RenameUrlRequest, UpdateUrlRequest, UrlResponse};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::header::LOCATION;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use pinhole_core::{ShortCode, ShortenerError};

fn parse_code(raw: String) -> Result<ShortCode> {
    Ok(ShortCode::new(raw)?)
}

pub async fn create_url_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateUrlRequest>,
) -> Result<(StatusCode, Json<UrlResponse>)> {
    let mapping = state.shortener().allocate(&request.url).await?;
    Ok((
        StatusCode::CREATED,
        Json(UrlResponse::new(mapping, state.base_url())),
    ))
}

pub async fn list_urls_handler(State(state): State<AppState>) -> Result<Json<Vec<UrlResponse>>> {
    let mappings = state.shortener().list_all().await?;
    Ok(Json(
        mappings
            .into_iter()
            .map(|mapping| UrlResponse::new(mapping, state.base_url()))
            .collect(),
    ))
}

pub async fn get_url_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<UrlResponse>> {
    let code = parse_code(short_code)?;
    let mapping = state.redirector().stats(&code).await?;
    Ok(Json(UrlResponse::new(mapping, state.base_url())))
}

pub async fn update_url_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<UpdateUrlRequest>,
) -> Result<Json<UrlResponse>> {
    let code = parse_code(short_code)?;
    let mapping = state.shortener().update_target(&code, &request.url).await?;
    Ok(Json(UrlResponse::new(mapping, state.base_url())))
}

pub async fn rename_url_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<RenameUrlRequest>,
) -> Result<Json<UrlResponse>> {
    let code = parse_code(short_code)?;
    let mapping = state.shortener().rename(&code, &request.new_code).await?;
    Ok(Json(UrlResponse::new(mapping, state.base_url())))
}

pub async fn delete_url_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode> {
    let code = parse_code(short_code)?;
    state.shortener().delete(&code).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Public redirect. A malformed code can never exist, so it is a 404 here.
pub async fn redirect_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<Response> {
    let code = ShortCode::new(short_code.as_str())
        .map_err(|_| ShortenerError::NotFound(short_code.clone()))?;

    let target = state.redirector().resolve(&code).await?;
    let location =
        HeaderValue::from_str(&target).map_err(|_| AppError::InvalidLocation(short_code))?;

    Ok((StatusCode::TEMPORARY_REDIRECT, [(LOCATION, location)]).into_response())
}
