//! Request routing and JSON responses.

use crate::state::AppState;
use caseflow::context::RequestParameters;
use caseflow::errors::CaseflowError;
use caseflow::utils::iso_timestamp;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{self, HeaderValue};
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

const DEFAULT_CANCEL_REASON: &str = "Cancelled by client";

/// Response type for every route.
pub type ApiResponse = Response<Full<Bytes>>;

/// Body of `POST /analysis/{id}/refine`.
#[derive(Debug, Deserialize)]
pub struct RefineBody {
    /// Client feedback.
    pub refinement_input: String,
}

/// Body of `POST /analysis/{id}/cancel`.
#[derive(Debug, Default, Deserialize)]
pub struct CancelBody {
    /// Reason recorded on the session.
    #[serde(default)]
    pub reason: Option<String>,
}

/// An error rendered as `{error, kind}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_request", message)
    }

    fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "invalid_request", message)
    }

    fn into_response(self) -> ApiResponse {
        if self.status.is_server_error() {
            warn!(status = %self.status, kind = self.kind, error = %self.message, "Request failed");
        }
        json_response(
            self.status,
            &json!({ "error": self.message, "kind": self.kind }),
        )
    }
}

impl From<CaseflowError> for ApiError {
    fn from(err: CaseflowError) -> Self {
        let status = match &err {
            CaseflowError::NotFound { .. } => StatusCode::NOT_FOUND,
            CaseflowError::InvalidRequest(_) | CaseflowError::InvalidProjection(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.kind(), err.to_string())
    }
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> ApiResponse {
    match serde_json::to_vec(value) {
        Ok(bytes) => {
            let mut response = Response::new(Full::new(Bytes::from(bytes)));
            *response.status_mut() = status;
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
            response
        }
        Err(err) => {
            warn!(error = %err, "Failed to serialize response");
            let mut response = Response::new(Full::new(Bytes::from_static(
                br#"{"error":"Failed to serialize response","kind":"serialization_error"}"#,
            )));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        }
    }
}

fn empty_response(status: StatusCode) -> ApiResponse {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

async fn read_body<B>(body: B) -> Result<Bytes, ApiError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    Limited::new(body, MAX_BODY_BYTES)
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|e| ApiError::bad_request(format!("Failed to read request body: {e}")))
}

fn parse_json<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(bytes).map_err(|e| ApiError::unprocessable(format!("Invalid JSON body: {e}")))
}

fn parse_session_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found(format!("Session {raw} not found")))
}

/// Adds CORS headers when the request origin is allowed.
fn apply_cors(state: &AppState, origin: Option<&HeaderValue>, response: &mut ApiResponse) {
    let Some(origin) = origin else {
        return;
    };
    let allowed = origin
        .to_str()
        .is_ok_and(|value| state.server.allows_origin(value));
    if !allowed {
        return;
    }
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("content-type, authorization"),
    );
    headers.insert(header::VARY, HeaderValue::from_static("Origin"));
}

/// Entry point for every request.
///
/// # Errors
///
/// Never fails; errors are rendered as JSON responses.
pub async fn handle<B>(state: Arc<AppState>, req: Request<B>) -> Result<ApiResponse, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let origin = req.headers().get(header::ORIGIN).cloned();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    debug!(%method, %path, "Request");

    let mut response = match route(&state, req).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    };
    apply_cors(&state, origin.as_ref(), &mut response);
    Ok(response)
}

async fn route<B>(state: &AppState, req: Request<B>) -> Result<ApiResponse, ApiError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if req.method() == Method::OPTIONS {
        return Ok(empty_response(StatusCode::NO_CONTENT));
    }

    let method = req.method().clone();
    let path = req.uri().path().trim_end_matches('/').to_string();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match (method, segments.as_slice()) {
        (Method::GET, ["health"]) => Ok(health(state)),
        (Method::GET, ["agents"]) => Ok(agents(state)),
        (Method::POST, ["analysis"]) => start_analysis(state, read_body(req.into_body()).await?),
        (Method::GET, ["analysis", id]) => get_analysis(state, id),
        (Method::POST, ["analysis", id, "refine"]) => {
            let id = parse_session_id(id)?;
            refine(state, id, read_body(req.into_body()).await?)
        }
        (Method::POST, ["analysis", id, "cancel"]) => {
            let id = parse_session_id(id)?;
            cancel(state, id, read_body(req.into_body()).await?)
        }
        (_, ["health" | "agents" | "analysis", ..]) => Err(ApiError::new(
            StatusCode::METHOD_NOT_ALLOWED,
            "method_not_allowed",
            "Method not allowed",
        )),
        _ => Err(ApiError::not_found(format!("No route for {path}"))),
    }
}

fn health(state: &AppState) -> ApiResponse {
    let tracker = &state.tracker;
    json_response(
        StatusCode::OK,
        &json!({
            "status": "healthy",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "mode": tracker.mode().name(),
            "pipeline": tracker.pipeline().map(caseflow::pipeline::PipelineDefinition::name),
            "agents": tracker.total_agents(),
            "active_sessions": tracker.session_count(),
            "timestamp": iso_timestamp(),
        }),
    )
}

fn agents(state: &AppState) -> ApiResponse {
    let tracker = &state.tracker;
    json_response(
        StatusCode::OK,
        &json!({
            "mode": tracker.mode().name(),
            "pipeline": tracker.pipeline().map(caseflow::pipeline::PipelineDefinition::name),
            "agents": tracker.agents(),
        }),
    )
}

fn start_analysis(state: &AppState, body: Bytes) -> Result<ApiResponse, ApiError> {
    let request: RequestParameters = parse_json(&body)?;
    let session_id = state.tracker.create(request)?;
    Ok(json_response(
        StatusCode::OK,
        &json!({
            "session_id": session_id,
            "status": "processing",
            "message": "Business case analysis started",
        }),
    ))
}

fn get_analysis(state: &AppState, raw_id: &str) -> Result<ApiResponse, ApiError> {
    let id = parse_session_id(raw_id)?;
    let snapshot = state.tracker.get_status(&id)?;
    Ok(json_response(StatusCode::OK, &snapshot))
}

fn refine(state: &AppState, id: Uuid, body: Bytes) -> Result<ApiResponse, ApiError> {
    let body: RefineBody = parse_json(&body)?;
    let refined = state.tracker.refine(&id, &body.refinement_input)?;
    Ok(json_response(
        StatusCode::OK,
        &json!({ "session_id": id, "refined_analysis": refined }),
    ))
}

fn cancel(state: &AppState, id: Uuid, body: Bytes) -> Result<ApiResponse, ApiError> {
    let body: CancelBody = if body.is_empty() {
        CancelBody::default()
    } else {
        parse_json(&body)?
    };
    let reason = body
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_CANCEL_REASON);
    let snapshot = state.tracker.cancel(&id, reason)?;
    Ok(json_response(StatusCode::ACCEPTED, &snapshot))
}
