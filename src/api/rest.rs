// =============================================================================
// REST API Endpoints: Axum 0.7
// =============================================================================
//
//   GET  /                  HTML form posting to /generate
//   POST /generate          form { stock_ticker, rsi_periods } -> chart JSON
//   GET  /proxy             raw chart API pass-through
//   GET  /api/v1/health     liveness
//
// CORS is permissive; every request gets a tracing span.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Form, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::analysis::generate_chart;
use crate::app_state::AppState;
use crate::market_data::ChartQuery;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full router with CORS/tracing middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/generate", post(generate))
        .route("/proxy", get(proxy))
        .route("/api/v1/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Form page
// =============================================================================

async fn index() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}

// =============================================================================
// Chart generation
// =============================================================================

#[derive(Debug, Deserialize)]
struct GenerateForm {
    #[serde(default)]
    stock_ticker: String,
    #[serde(default)]
    rsi_periods: String,
}

async fn generate(
    State(state): State<Arc<AppState>>,
    Form(form): Form<GenerateForm>,
) -> impl IntoResponse {
    match generate_chart(
        state.market_data.as_ref(),
        &state.config,
        &form.stock_ticker,
        &form.rsi_periods,
    )
    .await
    {
        Ok(chart) => Json(chart).into_response(),
        Err(e) => {
            warn!(
                ticker = %form.stock_ticker,
                periods = %form.rsi_periods,
                error = %e,
                "chart request rejected"
            );
            e.into_response()
        }
    }
}

// =============================================================================
// Raw chart proxy
// =============================================================================

async fn proxy(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChartQuery>,
) -> impl IntoResponse {
    match state.market_data.raw_chart(&query).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            error!(ticker = %query.ticker, error = %e, "chart proxy failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

// =============================================================================
// Health (public)
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_seconds: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_seconds: state.uptime_secs(),
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tests::{sample_bars, StubProvider};
    use crate::runtime_config::RuntimeConfig;
    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    fn app(provider: StubProvider) -> Router {
        router(Arc::new(AppState::new(
            RuntimeConfig::default(),
            Arc::new(provider),
        )))
    }

    async fn json_body(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn form_request(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/generate")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let resp = app(StubProvider::with_bars(Vec::new()))
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["status"], "ok");
        assert!(body["server_time"].as_i64().is_some());
    }

    #[tokio::test]
    async fn index_serves_form() {
        let resp = app(StubProvider::with_bars(Vec::new()))
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("name=\"stock_ticker\""));
        assert!(html.contains("name=\"rsi_periods\""));
    }

    #[tokio::test]
    async fn generate_returns_chart() {
        let resp = app(StubProvider::with_bars(sample_bars()))
            .oneshot(form_request("stock_ticker=aapl&rsi_periods=2%2C3%2C4%2C5"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["symbol"], "AAPL");
        let lines = body["rsi_panel"]["lines"].as_array().unwrap();
        let periods: Vec<u64> = lines.iter().map(|l| l["period"].as_u64().unwrap()).collect();
        assert_eq!(periods, vec![2, 3, 4]);
        assert_eq!(body["weighted_rsi_panel"]["lines"][0]["column"], "Weighted_RSI_2");
    }

    #[tokio::test]
    async fn generate_rejects_bad_periods_with_400() {
        let resp = app(StubProvider::with_bars(sample_bars()))
            .oneshot(form_request("stock_ticker=AAPL&rsi_periods=0%2C-1"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = json_body(resp).await;
        assert_eq!(body["error"], "no positive periods supplied.");
    }

    #[tokio::test]
    async fn generate_reports_missing_data_with_400() {
        let resp = app(StubProvider::with_bars(Vec::new()))
            .oneshot(form_request("stock_ticker=NOPE&rsi_periods=14"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = json_body(resp).await;
        assert_eq!(body["error"], "No data available for NOPE");
    }

    #[tokio::test]
    async fn generate_treats_missing_fields_as_empty() {
        let resp = app(StubProvider::with_bars(sample_bars()))
            .oneshot(form_request("stock_ticker=AAPL"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = json_body(resp).await;
        assert!(body["error"].as_str().unwrap().starts_with("invalid period"));
    }

    #[tokio::test]
    async fn proxy_passes_upstream_json_through() {
        let resp = app(StubProvider::with_bars(Vec::new()))
            .oneshot(
                Request::get("/proxy?ticker=MSFT&period1=1&period2=2&interval=1d")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["chart"]["ticker"], "MSFT");
    }

    #[tokio::test]
    async fn proxy_failure_is_500() {
        let resp = app(StubProvider::failing())
            .oneshot(Request::get("/proxy?ticker=MSFT").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(resp).await;
        assert_eq!(body["error"], "Failed to fetch data for MSFT");
    }
}
