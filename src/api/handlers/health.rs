use crate::{api::response::ApiResponse, GIT_COMMIT_HASH};
use axum::{
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Health {
    status: String,
}

#[utoipa::path(
    get,
    path= "/api/v1/health-check",
    responses (
        (status = 200, description = "Service is up", body = ApiResponse<Health>, content_type = "application/json"),
    ),
    tag= "health"
)]
// axum handler for health
pub async fn health_check() -> impl IntoResponse {
    let response = ApiResponse::new(
        StatusCode::OK,
        Health {
            status: "OK".to_string(),
        },
        "Health check successful",
    );

    let short_hash = if GIT_COMMIT_HASH.len() > 7 {
        &GIT_COMMIT_HASH[0..7]
    } else {
        ""
    };

    let headers = format!(
        "{}:{}:{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        short_hash
    )
    .parse::<HeaderValue>()
    .map(|x_app_header_value| {
        debug!("X-App header: {:?}", x_app_header_value);

        let mut headers = HeaderMap::new();

        headers.insert("X-App", x_app_header_value);

        headers
    })
    .map_err(|err| {
        error!("Failed to parse X-App header: {}", err);
    });

    // Unwrap the headers or provide a default value (empty headers) in case of an error
    let headers = headers.unwrap_or_else(|()| HeaderMap::new());

    (response.status(), headers, Json(response))
}
