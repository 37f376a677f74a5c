//! Web UI and HTTP API server.
//!
//! `GET /` serves a two-panel page: the question box and mode selector on the
//! left, the answer and its sources on the right. The page talks to the JSON
//! endpoints below.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::FolioError;
use crate::openai::api_key_present;
use crate::orchestrator::{IndexReport, Orchestrator};
use crate::rag::{AnswerMode, ContextChunk, SearchType};
use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

const INDEX_HTML: &str = include_str!("ui.html");

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
}

/// Run the web UI and HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    if !api_key_present() {
        Output::warning("OPENAI_API_KEY not set; /ask, /search and /index will fail.");
    }

    let addr = format!("{}:{}", host, port);
    let origin = HeaderValue::from_str(&format!("http://{}", addr))?;

    let orchestrator = Orchestrator::new(settings)?;
    let app = router(Arc::new(AppState { orchestrator }), origin);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Folio Server");
    println!();
    Output::success(&format!("Open http://{} in your browser", addr));
    println!();
    println!("Endpoints:");
    Output::kv("UI", "GET  /");
    Output::kv("Health", "GET  /health");
    Output::kv("Ask", "POST /ask");
    Output::kv("Search", "POST /search");
    Output::kv("Sources", "GET  /sources");
    Output::kv("Index", "POST /index");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the app. Cross-origin requests are only allowed from `origin`, the
/// address the server is bound to.
fn router(state: Arc<AppState>, origin: HeaderValue) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(index_page))
        .route("/health", get(health))
        .route("/ask", post(ask))
        .route("/search", post(search))
        .route("/sources", get(list_sources))
        .route("/index", post(index))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct AskRequest {
    question: String,
    /// strict, loose or enhanced. Defaults to `rag.default_mode`.
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    k: Option<usize>,
}

#[derive(Serialize)]
struct AskResponse {
    mode: AnswerMode,
    banner: String,
    answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    initial_answer: Option<String>,
    source_names: Vec<String>,
    sources: Vec<ContextChunk>,
}

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default = "default_min_score")]
    min_score: f32,
}

fn default_limit() -> usize {
    5
}

fn default_min_score() -> f32 {
    0.3
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<ContextChunk>,
}

#[derive(Serialize)]
struct SourcesResponse {
    sources: Vec<SourceInfo>,
    total: usize,
}

#[derive(Serialize)]
struct SourceInfo {
    source: String,
    chunk_count: u32,
    indexed_at: String,
}

#[derive(Deserialize)]
struct IndexRequest {
    /// Directory or PDF file. Defaults to `library.pdf_dir`.
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    force: bool,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(e: FolioError) -> Response {
    let status = match e {
        FolioError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        FolioError::SourceNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse { error: e.to_string() })).into_response()
}

// === Handlers ===

async fn index_page() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn ask(State(state): State<Arc<AppState>>, Json(req): Json<AskRequest>) -> Response {
    let settings = state.orchestrator.settings();
    let mode: AnswerMode = match req
        .mode
        .as_deref()
        .unwrap_or(&settings.rag.default_mode)
        .parse()
    {
        Ok(mode) => mode,
        Err(e) => return error_response(FolioError::InvalidInput(e)),
    };

    let mut engine = state.orchestrator.rag_engine(req.model.as_deref());
    if let Some(k) = req.k {
        engine = engine.with_k(k);
    }

    match engine.ask(&req.question, mode).await {
        Ok(response) => {
            info!("Answered in {} mode with {} sources", mode, response.sources.len());
            Json(AskResponse {
                mode: response.mode,
                banner: response.mode.banner(),
                source_names: response.source_names(),
                answer: response.answer,
                initial_answer: response.initial_answer,
                sources: response.sources,
            })
            .into_response()
        }
        Err(e) => error_response(e),
    }
}

async fn search(State(state): State<Arc<AppState>>, Json(req): Json<SearchRequest>) -> Response {
    let retriever = state
        .orchestrator
        .retriever()
        .with_search_type(SearchType::Similarity)
        .with_k(req.limit)
        .with_min_score(req.min_score);

    match retriever.retrieve(&req.query).await {
        Ok(results) => Json(SearchResponse { results }).into_response(),
        Err(e) => error_response(e),
    }
}

async fn list_sources(State(state): State<Arc<AppState>>) -> Response {
    match state.orchestrator.vector_store().list_sources().await {
        Ok(sources) => Json(SourcesResponse {
            total: sources.len(),
            sources: sources
                .into_iter()
                .map(|s| SourceInfo {
                    source: s.source,
                    chunk_count: s.chunk_count,
                    indexed_at: s.indexed_at.to_rfc3339(),
                })
                .collect(),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn index(State(state): State<Arc<AppState>>, Json(req): Json<IndexRequest>) -> Response {
    let target = match req.path.as_deref() {
        Some(p) => Settings::expand_path(p),
        None => state.orchestrator.settings().pdf_dir(),
    };

    let result: crate::error::Result<IndexReport> = if target.is_file() {
        state.orchestrator.index_file(&target, req.force).await
    } else {
        state.orchestrator.index_directory(&target, req.force).await
    };

    match result {
        Ok(report) => Json(report).into_response(),
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Prompts;
    use crate::embedding::Embedder;
    use crate::extract::TextExtractor;
    use crate::vector_store::{Document, MemoryVectorStore, VectorStore};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use std::path::Path;
    use tower::ServiceExt;

    struct PlainTextExtractor;

    #[async_trait]
    impl TextExtractor for PlainTextExtractor {
        async fn extract(&self, path: &Path) -> crate::error::Result<String> {
            Ok(tokio::fs::read_to_string(path).await?)
        }
    }

    struct UnitEmbedder;

    #[async_trait]
    impl Embedder for UnitEmbedder {
        async fn embed(&self, _text: &str) -> crate::error::Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> crate::error::Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    async fn state() -> Arc<AppState> {
        let store = MemoryVectorStore::new();
        store
            .upsert(&Document::new(
                "radiology.pdf".to_string(),
                0,
                "Roentgen discovered X-rays.".to_string(),
                vec![1.0, 0.0],
            ))
            .await
            .unwrap();

        let orchestrator = Orchestrator::with_components(
            Settings::default(),
            Prompts::default(),
            Arc::new(PlainTextExtractor),
            Arc::new(UnitEmbedder),
            Arc::new(store),
        );
        Arc::new(AppState { orchestrator })
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn preflight(origin: &str) -> Request<Body> {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/ask")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_cors_only_allows_bound_origin() {
        let origin = HeaderValue::from_static("http://127.0.0.1:3000");
        let app = router(state().await, origin);

        let response = app
            .clone()
            .oneshot(preflight("http://127.0.0.1:3000"))
            .await
            .unwrap();
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static("http://127.0.0.1:3000"))
        );

        let response = app.oneshot(preflight("https://evil.example")).await.unwrap();
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[tokio::test]
    async fn test_cors_foreign_origin_gets_no_allow_header_on_get() {
        let app = router(state().await, HeaderValue::from_static("http://127.0.0.1:3000"));
        let request = Request::builder()
            .uri("/sources")
            .header(header::ORIGIN, "https://evil.example")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[tokio::test]
    async fn test_index_page_has_both_panels() {
        let Html(page) = index_page().await;
        assert!(page.contains("id=\"left\""));
        assert!(page.contains("id=\"right\""));
        assert!(page.contains("value=\"enhanced\""));
    }

    #[tokio::test]
    async fn test_list_sources() {
        let response = list_sources(State(state().await)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["total"], 1);
        assert_eq!(json["sources"][0]["source"], "radiology.pdf");
        assert_eq!(json["sources"][0]["chunk_count"], 1);
    }

    #[tokio::test]
    async fn test_search_returns_chunks() {
        let req = SearchRequest {
            query: "x-rays".to_string(),
            limit: 5,
            min_score: 0.3,
        };
        let response = search(State(state().await), Json(req)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["results"][0]["source"], "radiology.pdf");
        assert_eq!(json["results"][0]["content"], "Roentgen discovered X-rays.");
    }

    #[tokio::test]
    async fn test_ask_rejects_bad_input() {
        let bad_mode = AskRequest {
            question: "Who?".to_string(),
            mode: Some("creative".to_string()),
            model: None,
            k: None,
        };
        let response = ask(State(state().await), Json(bad_mode)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let empty = AskRequest {
            question: "  ".to_string(),
            mode: None,
            model: None,
            k: None,
        };
        let response = ask(State(state().await), Json(empty)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_index_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("anatomy.pdf"), "The femur is a bone.").unwrap();

        let state = state().await;
        let req = IndexRequest {
            path: Some(dir.path().display().to_string()),
            force: false,
        };
        let response = index(State(state.clone()), Json(req)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["chunks_indexed"], 1);
        assert_eq!(json["loaded"][0]["source"], "anatomy.pdf");
        assert_eq!(state.orchestrator.vector_store().document_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_index_missing_directory_is_bad_request() {
        let req = IndexRequest {
            path: Some("/definitely/not/here".to_string()),
            force: false,
        };
        let response = index(State(state().await), Json(req)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
