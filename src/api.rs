use crate::engine::{SearchEngine, SearchHit, SearchOptions, SearchOutcome};
use crate::DocId;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Upper bound on results returned for one query
pub const MAX_LIMIT: usize = 100;

// ========== Request/Response Types ==========

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// One ranked document in a query response
#[derive(Debug, Serialize)]
pub struct ResultRecord {
    pub doc_id: DocId,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}

impl From<SearchHit> for ResultRecord {
    fn from(hit: SearchHit) -> Self {
        let (title, url, tags) = match hit.document {
            Some(doc) => (Some(doc.title), Some(doc.url), Some(doc.tags)),
            None => (None, None, None),
        };
        Self {
            doc_id: hit.doc_id,
            score: hit.score,
            title,
            url,
            tags,
        }
    }
}

/// JSON record answering one query, shared by the HTTP API and the CLI
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub query: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub results: Vec<ResultRecord>,
}

impl QueryResponse {
    fn success(query: String, results: Vec<ResultRecord>, message: Option<String>) -> Self {
        Self {
            query,
            status: "success",
            message,
            results,
        }
    }

    pub fn error(query: String, message: impl Into<String>) -> Self {
        Self {
            query,
            status: "error",
            message: Some(message.into()),
            results: Vec::new(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == "error"
    }
}

/// Run a query and shape the outcome into a response record
pub fn answer(engine: &SearchEngine, query: &str, options: &SearchOptions) -> QueryResponse {
    let query_text = query.to_string();
    if query.trim().is_empty() {
        return QueryResponse::error(query_text, "Empty query received.");
    }
    if options.limit == 0 {
        return QueryResponse::error(query_text, "Result limit must be positive.");
    }

    let options = SearchOptions {
        limit: options.limit.min(MAX_LIMIT),
        offset: options.offset,
    };

    match engine.search(query, &options) {
        Ok(SearchOutcome::NoValidTerms) => {
            QueryResponse::error(query_text, "No valid words found in the lexicon.")
        }
        Ok(SearchOutcome::NoMatchingDocuments) => QueryResponse::success(
            query_text,
            Vec::new(),
            Some("No documents contain all the query words.".to_string()),
        ),
        Ok(SearchOutcome::Ranked(hits)) => QueryResponse::success(
            query_text,
            hits.into_iter().map(ResultRecord::from).collect(),
            None,
        ),
        Err(e) => {
            tracing::error!(query, "query failed: {}", e);
            QueryResponse::error(query_text, e.to_string())
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
        }
    }
}

// ========== Error Handling ==========

struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = format!("{:#}", self.0);
        tracing::error!("API error: {}", message);

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<()>::error(message)),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

// ========== Handlers ==========

async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::success("OK"))
}

async fn run_query(
    engine: Arc<SearchEngine>,
    query: String,
    options: SearchOptions,
) -> Result<Response, AppError> {
    // Barrel loads read files; keep them off the async workers
    let response =
        tokio::task::spawn_blocking(move || answer(&engine, &query, &options)).await?;

    let status = if response.is_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    };
    Ok((status, Json(response)).into_response())
}

async fn search(
    State(engine): State<Arc<SearchEngine>>,
    Query(params): Query<SearchParams>,
) -> Result<Response, AppError> {
    let defaults = SearchOptions::default();
    let options = SearchOptions {
        limit: params.limit.unwrap_or(defaults.limit),
        offset: params.offset.unwrap_or(defaults.offset),
    };
    run_query(engine, params.q, options).await
}

async fn query(
    State(engine): State<Arc<SearchEngine>>,
    Json(req): Json<QueryRequest>,
) -> Result<Response, AppError> {
    let options = SearchOptions {
        limit: req.limit.unwrap_or(MAX_LIMIT),
        offset: 0,
    };
    run_query(engine, req.query, options).await
}

async fn get_document(
    State(engine): State<Arc<SearchEngine>>,
    Path(id): Path<DocId>,
) -> impl IntoResponse {
    match engine.document(id) {
        Some(doc) => (StatusCode::OK, Json(ApiResponse::success(doc.clone()))),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(format!("Document with id '{id}' not found"))),
        ),
    }
}

async fn get_stats(State(engine): State<Arc<SearchEngine>>) -> impl IntoResponse {
    Json(ApiResponse::success(engine.stats()))
}

// ========== Router ==========

pub fn create_router(engine: Arc<SearchEngine>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/search", get(search))
        .route("/query", post(query))
        .route("/documents/:id", get(get_document))
        .route("/stats", get(get_stats))
        .with_state(engine)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
