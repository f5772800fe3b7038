use crate::cli::{globals::GlobalArgs, telemetry};
use anyhow::{anyhow, Context, Result};
use axum::{
    body::Body,
    extract::{DefaultBodyLimit, MatchedPath},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    middleware, Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use url::Url;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

pub mod error;
pub(crate) mod handlers;
mod openapi;
pub mod response;

pub use openapi::openapi;

/// JSON and form bodies are capped at 16KB.
pub const BODY_LIMIT: usize = 16 * 1024;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the API router with all documented routes registered.
#[must_use]
pub fn router() -> OpenApiRouter {
    openapi::api_router()
}

/// Assemble the full application: documented routes, docs UI, fallback and layers.
///
/// # Errors
/// Returns an error if the configured CORS origin is not a valid URL.
pub fn app(globals: &GlobalArgs) -> Result<Router> {
    let cors = cors_layer(globals.cors_origin.as_deref())?;

    let (router, openapi) = router().split_for_parts();

    let app = router
        .merge(SwaggerUi::new("/api/v1/docs").url("/api/v1/openapi.json", openapi))
        .fallback(error::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static(REQUEST_ID_HEADER),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    REQUEST_ID_HEADER,
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(middleware::from_fn_with_state(
                    globals.environment,
                    error::render_errors,
                ))
                .layer(CatchPanicLayer::custom(error::panic_response))
                .layer(DefaultBodyLimit::max(BODY_LIMIT)),
        );

    Ok(app)
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, globals: &GlobalArgs) -> Result<()> {
    let app = app(globals)?;

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!(
        "Listening on [::]:{} ({} environment)",
        port, globals.environment
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", err);
            }
            info!("Gracefully shutdown");
        })
        .await?;

    telemetry::shutdown_tracer();

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

/// Credentials are allowed, so the origin must be exact; without one no
/// cross-origin access is granted.
fn cors_layer(origin: Option<&str>) -> Result<CorsLayer> {
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST]);

    match origin {
        Some(origin) => Ok(cors
            .allow_origin(AllowOrigin::exact(cors_origin(origin)?))
            .allow_credentials(true)),
        None => Ok(cors),
    }
}

fn cors_origin(origin: &str) -> Result<HeaderValue> {
    let parsed = Url::parse(origin).with_context(|| format!("Invalid CORS origin: {origin}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("CORS origin must include a valid host: {origin}"))?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build CORS origin header")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cli::globals::Environment;
    use axum::{
        body::to_bytes,
        http::{header::ORIGIN, StatusCode},
        routing::get,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    fn globals(environment: Environment, origin: Option<&str>) -> GlobalArgs {
        let mut globals = GlobalArgs::new(environment);
        if let Some(origin) = origin {
            globals.set_cors_origin(origin.to_string());
        }
        globals
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_check_reports_ok() {
        let app = app(&globals(Environment::Production, None)).unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health-check")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        assert!(response.headers().contains_key("x-app"));

        let body = json_body(response).await;
        assert_eq!(body["statusCode"], 200);
        assert_eq!(body["data"]["status"], "OK");
        assert_eq!(body["message"], "Health check successful");
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn health_check_ignores_payload() {
        let app = app(&globals(Environment::Production, None)).unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health-check")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(vec![b'x'; BODY_LIMIT * 2]))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["success"], true);
    }

    #[tokio::test]
    async fn request_id_is_propagated() {
        let app = app(&globals(Environment::Production, None)).unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health-check")
                    .header(REQUEST_ID_HEADER, "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get(REQUEST_ID_HEADER).unwrap(),
            "req-42"
        );
    }

    #[tokio::test]
    async fn unknown_route_renders_error_shape() {
        let app = app(&globals(Environment::Production, None)).unwrap();

        let response = app
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Route not found");
        assert_eq!(body["errors"], Value::Array(vec![]));
        assert!(body.get("stack").is_none());
    }

    #[tokio::test]
    async fn stack_only_in_development() {
        let response = app(&globals(Environment::Development, None))
            .unwrap()
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(json_body(response).await["stack"].is_string());
    }

    #[tokio::test]
    async fn panics_become_internal_server_error() {
        let environment = Environment::Development;
        async fn boom() -> &'static str {
            panic!("handler blew up")
        }

        let app = Router::new()
            .route("/panic", get(boom))
            .layer(
                ServiceBuilder::new()
                    .layer(middleware::from_fn_with_state(
                        environment,
                        error::render_errors,
                    ))
                    .layer(CatchPanicLayer::custom(error::panic_response)),
            );

        let response = app
            .oneshot(Request::builder().uri("/panic").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], error::INTERNAL_SERVER_ERROR);
        assert!(body.get("errors").is_none());
        assert_eq!(body["stack"], "panic: handler blew up");
    }

    #[tokio::test]
    async fn cors_allows_configured_origin_with_credentials() {
        let app = app(&globals(
            Environment::Production,
            Some("http://localhost:5173/app"),
        ))
        .unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health-check")
                    .header(ORIGIN, "http://localhost:5173")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(
            headers.get("access-control-allow-origin").unwrap(),
            "http://localhost:5173"
        );
        assert_eq!(
            headers.get("access-control-allow-credentials").unwrap(),
            "true"
        );
    }

    #[test]
    fn invalid_cors_origin_is_rejected() {
        assert!(app(&globals(Environment::Production, Some("not a url"))).is_err());
        assert_eq!(
            cors_origin("https://portal.dev:8443/path").unwrap(),
            "https://portal.dev:8443"
        );
    }

    #[test]
    fn openapi_served_paths_exist() {
        let spec = openapi();
        assert!(spec.paths.paths.contains_key("/api/v1/health-check"));
    }
}
