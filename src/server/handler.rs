// src/server/handler.rs

//! The static content handler: every GET/HEAD request path is looked up
//! through the caching factory.

use super::context::AppState;
use crate::core::{Content, ContentDescriptor};
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, error};

/// The file served when a request path resolves to a directory.
const WELCOME_FILE: &str = "index.html";

pub async fn serve_content(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    let path = match urlencoding::decode(uri.path()) {
        Ok(path) => path.into_owned(),
        Err(_) => return (StatusCode::BAD_REQUEST, "Invalid path encoding").into_response(),
    };

    match lookup(&state, &path).await {
        Ok(Some(content)) => content_response(content).await,
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(status) => status.into_response(),
    }
}

/// Resolves `path`, falling back to the welcome file for directories.
async fn lookup(state: &AppState, path: &str) -> Result<Option<Content>, StatusCode> {
    let content = state.factory.get_content(path).await.map_err(|e| {
        error!("Failed to resolve '{}': {}", path, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    match content {
        Some(c) if c.resource().is_some_and(|r| r.is_directory()) => {
            let welcome = format!("{}/{}", path.trim_end_matches('/'), WELCOME_FILE);
            debug!("'{}' is a directory, trying '{}'.", path, welcome);
            let welcome_content = state.factory.get_content(&welcome).await.map_err(|e| {
                error!("Failed to resolve '{}': {}", welcome, e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?;
            Ok(welcome_content.filter(|c| !c.resource().is_some_and(|r| r.is_directory())))
        }
        other => Ok(other),
    }
}

async fn content_response(content: Content) -> Response {
    let body = match content.buffer() {
        Some(bytes) => bytes,
        None => match read_unbuffered(&content).await {
            Ok(bytes) => bytes,
            Err(status) => return status.into_response(),
        },
    };

    let mut response = Response::new(Body::from(body));
    let headers = response.headers_mut();
    if let Some(value) = content
        .content_type_value()
        .and_then(|v| HeaderValue::from_str(&v).ok())
    {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Some(value) = content
        .content_length()
        .and_then(|v| HeaderValue::from_str(v).ok())
    {
        headers.insert(header::CONTENT_LENGTH, value);
    }
    if let Some(value) = content
        .etag_value()
        .and_then(|v| HeaderValue::from_str(v).ok())
    {
        headers.insert(header::ETAG, value);
    }
    if let Some(value) = content
        .last_modified_value()
        .and_then(|v| HeaderValue::from_str(v).ok())
    {
        headers.insert(header::LAST_MODIFIED, value);
    }
    response
}

/// Reads a body the authority left on disk because it was too large to buffer.
async fn read_unbuffered(content: &Content) -> Result<Bytes, StatusCode> {
    let Some(resource) = content.resource() else {
        return Ok(Bytes::new());
    };
    tokio::fs::read(resource.path())
        .await
        .map(Bytes::from)
        .map_err(|e| {
            error!("Failed to read '{}': {}", resource.path().display(), e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}
