use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use result_kernel_api::{LookupRequest, LookupResponse, ResultLookupApi};
use result_kernel_core::{LookupPolicy, ResolveError};
use result_kernel_store_json::BranchStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
struct ServiceState {
    api: ResultLookupApi,
}

#[derive(Debug, Clone, Serialize)]
struct ServiceError {
    #[serde(skip)]
    status: StatusCode,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
struct BranchesResponse {
    branches: Vec<BranchStatus>,
}

#[derive(Debug, Clone, Deserialize)]
struct ResultParams {
    #[serde(default)]
    reg: Option<String>,
    #[serde(default)]
    branch: Option<String>,
}

#[derive(Debug, Parser)]
#[command(name = "result-kernel-service")]
#[command(about = "HTTP lookup service over per-branch result records")]
struct Args {
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,
    #[arg(long, default_value = "127.0.0.1:4020")]
    bind: SocketAddr,
    /// Reject unrecognized branch hints and pin hinted searches to that
    /// branch alone.
    #[arg(long, default_value_t = false)]
    strict_branch_hint: bool,
    /// Emit the college roll number field in lookup responses.
    #[arg(long, default_value_t = false)]
    include_college_roll: bool,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<ResolveError> for ServiceError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Validation(message) => {
                Self { status: StatusCode::BAD_REQUEST, error: message, detail: None }
            }
            ResolveError::Storage(err) => Self {
                status: StatusCode::SERVICE_UNAVAILABLE,
                error: "branch records unavailable".to_string(),
                detail: Some(err.to_string()),
            },
        }
    }
}

fn app(state: ServiceState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/result", get(result))
        .route("/api/branches", get(branches))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let policy = LookupPolicy {
        strict_branch_hint: args.strict_branch_hint,
        include_college_roll: args.include_college_roll,
    };
    let state = ServiceState { api: ResultLookupApi::new(args.data_dir, policy) };
    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    tracing::info!(bind = %args.bind, "result lookup service listening");
    axum::serve(listener, app(state)).await?;
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn result(
    State(state): State<ServiceState>,
    Query(params): Query<ResultParams>,
) -> Result<Json<LookupResponse>, ServiceError> {
    let request = LookupRequest {
        registration: params.reg.unwrap_or_default(),
        branch: params.branch,
    };
    state.api.lookup(request).map(Json).map_err(ServiceError::from)
}

async fn branches(State(state): State<ServiceState>) -> Json<BranchesResponse> {
    Json(BranchesResponse { branches: state.api.branches() })
}
