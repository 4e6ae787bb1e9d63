//! Web UI server.
//!
//! Server-rendered HTML forms for the browser plus a JSON endpoint for
//! scripts. Every request runs its own pipeline; the only shared state is
//! the pipeline itself and the compiled templates.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::BriefError;
use crate::pipeline::{Pipeline, PipelineReport};
use crate::status::StatusMessage;
use crate::transcript::TranscriptSource;
use crate::video::{is_video_id, summary_file_name};
use axum::{
    extract::{Form, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use minijinja::{context, Environment};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, instrument};
use uuid::Uuid;

const PAGE_TEMPLATE: &str = "page.html";

/// Model details shown in the sidebar.
#[derive(Debug, Clone, Serialize)]
struct SidebarInfo {
    model: String,
    temperature: f32,
    provider: &'static str,
}

/// Shared application state.
pub struct AppState {
    pipeline: Pipeline,
    templates: Environment<'static>,
    sidebar: SidebarInfo,
}

impl AppState {
    pub fn new(pipeline: Pipeline, settings: &Settings) -> crate::error::Result<Self> {
        Ok(Self {
            pipeline,
            templates: templates()?,
            sidebar: SidebarInfo {
                model: settings.llm.model.clone(),
                temperature: settings.llm.temperature,
                provider: settings.llm.provider(),
            },
        })
    }
}

fn templates() -> crate::error::Result<Environment<'static>> {
    let mut env = Environment::new();
    env.add_template(PAGE_TEMPLATE, include_str!("../templates/page.html"))?;
    Ok(env)
}

/// Run the web UI server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    for warning in preflight::check(Operation::Serve, &settings)? {
        Output::warning(&warning);
    }

    let pipeline = Pipeline::new(&settings)?;
    let state = Arc::new(AppState::new(pipeline, &settings)?);
    let app = build_router(state);

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("YouTube Video Summarizer");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    Output::kv("Model", &settings.llm.model);
    Output::kv("Provider", settings.llm.provider());
    println!();
    println!("Endpoints:");
    Output::kv("Web UI", "GET  /");
    Output::kv("Summarize", "POST /summarize");
    Output::kv("Manual transcript", "POST /summarize/manual");
    Output::kv("Download", "POST /download");
    Output::kv("JSON API", "POST /api/summarize");
    Output::kv("Health", "GET  /health");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    info!("Serving on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Routes for the web UI and JSON API.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/summarize", post(summarize))
        .route("/summarize/manual", post(summarize_manual))
        .route("/download", post(download))
        .route("/health", get(health))
        .route("/api/summarize", post(api_summarize))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct SummarizeForm {
    #[serde(default)]
    url: String,
}

#[derive(Deserialize)]
struct ManualForm {
    #[serde(default)]
    url: String,
    #[serde(default)]
    transcript: String,
}

#[derive(Deserialize)]
struct DownloadForm {
    video_id: String,
    #[serde(default)]
    summary: String,
}

#[derive(Deserialize)]
struct ApiRequest {
    url: String,
    /// Skip automatic acquisition and summarize this text.
    #[serde(default)]
    transcript: Option<String>,
}

#[derive(Debug, Serialize)]
struct ApiResponse {
    video_id: String,
    transcript_source: Option<TranscriptSource>,
    summary: Option<String>,
    statuses: Vec<StatusMessage>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Everything the page template needs.
#[derive(Debug, Default, Serialize)]
struct PageView {
    url: String,
    statuses: Vec<StatusMessage>,
    video_id: Option<String>,
    embed_url: Option<String>,
    summary: Option<String>,
    transcript: Option<String>,
    transcript_source: Option<TranscriptSource>,
    manual_required: bool,
}

impl PageView {
    fn from_report(report: PipelineReport) -> Self {
        // The preview is shown once a transcript exists, as the summary step starts.
        let embed_url = report.transcript.as_ref().map(|_| report.video.embed_url());
        Self {
            url: report.video.url().to_string(),
            video_id: Some(report.video.video_id().to_string()),
            embed_url,
            summary: report.summary.map(|s| s.text),
            transcript_source: report.transcript.as_ref().map(|t| t.source),
            transcript: report.transcript.map(|t| t.text),
            statuses: report.statuses,
            manual_required: report.manual_required,
        }
    }

    fn input_error(url: &str, err: &BriefError) -> Self {
        let status = if url.is_empty() {
            StatusMessage::warning("Please enter a YouTube URL first.")
        } else {
            match err {
                BriefError::InvalidInput(msg) => StatusMessage::error(msg.clone()),
                other => StatusMessage::error(other.to_string()),
            }
        };
        Self {
            url: url.to_string(),
            statuses: vec![status],
            ..Self::default()
        }
    }
}

impl From<PipelineReport> for ApiResponse {
    fn from(report: PipelineReport) -> Self {
        Self {
            video_id: report.video.video_id().to_string(),
            transcript_source: report.transcript.map(|t| t.source),
            summary: report.summary.map(|s| s.text),
            statuses: report.statuses,
        }
    }
}

fn render_page(state: &AppState, page: &PageView) -> Response {
    let rendered = state
        .templates
        .get_template(PAGE_TEMPLATE)
        .and_then(|tmpl| tmpl.render(context! { config => &state.sidebar, page => page }));

    match rendered {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Failed to render page: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
        }
    }
}

// === Handlers ===

async fn index(State(state): State<Arc<AppState>>) -> Response {
    render_page(&state, &PageView::default())
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

#[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
async fn summarize(State(state): State<Arc<AppState>>, Form(form): Form<SummarizeForm>) -> Response {
    let url = form.url.trim();
    let page = match state.pipeline.run(url).await {
        Ok(report) => PageView::from_report(report),
        Err(e) => PageView::input_error(url, &e),
    };
    render_page(&state, &page)
}

#[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
async fn summarize_manual(State(state): State<Arc<AppState>>, Form(form): Form<ManualForm>) -> Response {
    let url = form.url.trim();
    let page = match state.pipeline.run_manual(url, &form.transcript).await {
        Ok(report) => PageView::from_report(report),
        Err(e) => PageView::input_error(url, &e),
    };
    render_page(&state, &page)
}

async fn download(Form(form): Form<DownloadForm>) -> Response {
    if !is_video_id(&form.video_id) {
        return (StatusCode::BAD_REQUEST, "Invalid video ID").into_response();
    }

    // Browsers submit form newlines as CRLF.
    let summary = form.summary.replace("\r\n", "\n");
    let disposition = format!("attachment; filename=\"{}\"", summary_file_name(&form.video_id));
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        summary,
    )
        .into_response()
}

#[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
async fn api_summarize(State(state): State<Arc<AppState>>, Json(req): Json<ApiRequest>) -> Response {
    let url = req.url.trim();
    let result = match req.transcript.as_deref() {
        Some(text) => state.pipeline.run_manual(url, text).await,
        None => state.pipeline.run(url).await,
    };

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    };

    let status = match (&report.transcript, &report.summary) {
        (_, Some(_)) => StatusCode::OK,
        (None, None) => StatusCode::UNPROCESSABLE_ENTITY,
        (Some(_), None) => StatusCode::BAD_GATEWAY,
    };

    (status, Json(ApiResponse::from(report))).into_response()
}
