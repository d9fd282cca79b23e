//! Always-on HTTP adapter over the helpdesk engine

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use pcte_chat::config::ServerConfig;
use pcte_chat::{ChatEngine, ChatRequest, ErrorBody, HelpdeskError};

pub const BROCHURE_ROUTE: &str = "/PCTE-BROCHURE-2023-1.pdf";
const TIMEZONE_HEADER: &str = "x-timezone";

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ChatEngine>,
    pub brochure_path: PathBuf,
}

impl AppState {
    pub fn new(engine: ChatEngine, brochure_path: impl Into<PathBuf>) -> Self {
        Self {
            engine: Arc::new(engine),
            brochure_path: brochure_path.into(),
        }
    }
}

pub fn error_response(err: &HelpdeskError) -> Response {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        tracing::error!("Chat request failed: {}", err);
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(ErrorBody::from(err))).into_response()
}

async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!("Rejected chat body: {}", rejection);
            let msg = match rejection {
                JsonRejection::MissingJsonContentType(_) => "Missing message field",
                _ => "Invalid JSON body",
            };
            return error_response(&HelpdeskError::validation(msg));
        }
    };

    let header_timezone = headers
        .get(TIMEZONE_HEADER)
        .and_then(|v| v.to_str().ok());

    match state.engine.handle(request, header_timezone).await {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn health(State(state): State<AppState>) -> Response {
    Json(state.engine.health()).into_response()
}

async fn home() -> Response {
    Json(json!({
        "message": "Chatbot API with Gemini Integration",
        "endpoints": {
            "POST /chat": "Send a message and get AI response",
            "GET /health": "Check API health status",
            "GET /PCTE-BROCHURE-2023-1.pdf": "Download college brochure"
        },
        "usage": {
            "method": "POST",
            "url": "/chat",
            "body": {"message": "Your question here"}
        }
    }))
    .into_response()
}

async fn brochure(State(state): State<AppState>) -> Response {
    match tokio::fs::read(&state.brochure_path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "application/pdf")], bytes).into_response(),
        Err(e) => {
            tracing::warn!("Brochure unavailable at {}: {}", state.brochure_path.display(), e);
            (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Brochure not found"})),
            )
                .into_response()
        }
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

pub fn router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/chat", post(chat))
        .route("/api/chat", post(chat))
        .route("/health", get(health))
        .route("/api/health", get(health))
        .route(BROCHURE_ROUTE, get(brochure))
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

pub async fn start_server(engine: ChatEngine, config: &ServerConfig) -> anyhow::Result<()> {
    let state = AppState::new(engine, config.brochure_path.clone());
    let app = router(state, &config.allowed_origins);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Helpdesk API listening on http://{}", addr);
    tracing::info!("POST /chat, GET /health, GET /");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
