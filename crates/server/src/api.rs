use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use estimo_core::config::ContactConfig;
use estimo_core::domain::options::parse_option_key;
use estimo_core::estimator::export::{
    contact_link, export_file_name, render_message, whatsapp_link, QuoteDocument,
};
use estimo_core::estimator::persistence::encode_state;
use estimo_core::{
    ApplicationError, Catalog, CatalogView, EstimatorSession, EstimatorState, InterfaceError,
    QuoteBreakdown, Region, RestoreReport, StateStore,
};

#[derive(Clone)]
pub struct ApiState {
    catalog: Arc<Catalog>,
    store: Arc<dyn StateStore>,
    contact: ContactConfig,
    default_region: Region,
}

impl ApiState {
    pub fn new(
        catalog: Arc<Catalog>,
        store: Arc<dyn StateStore>,
        contact: ContactConfig,
        default_region: Region,
    ) -> Self {
        Self { catalog, store, contact, default_region }
    }

    fn session(&self, state: EstimatorState) -> EstimatorSession {
        EstimatorSession::from_state(Arc::clone(&self.catalog), state)
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/catalog", get(catalog_view))
        .route("/api/v1/quotes", post(compute))
        .route("/api/v1/quotes/export", post(export))
        .route("/api/v1/state/{key}", get(load_state).put(save_state))
        .with_state(state)
}

/// JSON error body; the detail is kept server-side except for bad requests.
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: &'static str,
    pub detail: Option<String>,
    pub correlation_id: String,
}

#[derive(Debug)]
pub struct ApiError(InterfaceError);

impl ApiError {
    fn from_application(error: impl Into<ApplicationError>) -> Self {
        Self(error.into().into_interface(Uuid::new_v4().to_string()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self.0 {
            InterfaceError::BadRequest { message, .. } => {
                (StatusCode::BAD_REQUEST, Some(message.clone()))
            }
            InterfaceError::ServiceUnavailable { message, .. } => {
                warn!(
                    event_name = "server.request.unavailable",
                    correlation_id = %self.0.correlation_id(),
                    error = %message,
                    "request failed on an unavailable dependency"
                );
                (StatusCode::SERVICE_UNAVAILABLE, None)
            }
            InterfaceError::Internal { message, .. } => {
                warn!(
                    event_name = "server.request.internal_error",
                    correlation_id = %self.0.correlation_id(),
                    error = %message,
                    "request failed"
                );
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
        };

        let body = ApiErrorBody {
            error: self.0.user_message(),
            detail,
            correlation_id: self.0.correlation_id().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub region: Option<String>,
}

async fn catalog_view(
    State(state): State<ApiState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<CatalogView>, ApiError> {
    let region = match query.region.as_deref() {
        Some(raw) => parse_option_key::<Region>(raw).map_err(ApiError::from_application)?,
        None => state.default_region,
    };
    Ok(Json(state.catalog.view(region)))
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub state: EstimatorState,
    pub breakdown: QuoteBreakdown,
    pub document: QuoteDocument,
    pub message: String,
    pub whatsapp_url: String,
    pub contact_url: String,
}

async fn compute(
    State(state): State<ApiState>,
    Json(selection): Json<EstimatorState>,
) -> Result<Json<QuoteResponse>, ApiError> {
    let session = state.session(selection);
    let document =
        QuoteDocument::build(session.catalog(), session.state(), session.breakdown(), Utc::now());
    let message = render_message(&document, &state.contact.greeting);
    let whatsapp_url = whatsapp_link(&state.contact.whatsapp_phone, &message)
        .map_err(ApiError::from_application)?;
    let contact_url =
        contact_link(&state.contact.contact_url, &document).map_err(ApiError::from_application)?;

    info!(
        event_name = "server.quote.computed",
        reference = %document.reference,
        region = %session.state().scope.region,
        project_type = %session.state().scope.project_type,
        total = %session.breakdown().one_time_total,
        "quote computed"
    );

    Ok(Json(QuoteResponse {
        state: session.state().clone(),
        breakdown: session.breakdown().clone(),
        document,
        message,
        whatsapp_url: whatsapp_url.to_string(),
        contact_url: contact_url.to_string(),
    }))
}

async fn export(
    State(state): State<ApiState>,
    Json(selection): Json<EstimatorState>,
) -> Result<Response, ApiError> {
    let session = state.session(selection);
    let document =
        QuoteDocument::build(session.catalog(), session.state(), session.breakdown(), Utc::now());
    let body = document.to_json_pretty().map_err(ApiError::from_application)?;
    let disposition = format!("attachment; filename=\"{}\"", export_file_name(&document));

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub state_key: String,
    pub state: EstimatorState,
    pub breakdown: QuoteBreakdown,
    pub restore: Option<RestoreReport>,
}

async fn load_state(
    State(state): State<ApiState>,
    Path(key): Path<String>,
) -> Result<Json<StateResponse>, ApiError> {
    validate_state_key(&key)?;
    let payload = state.store.load(&key).await.map_err(ApiError::from_application)?;
    let (session, report) = EstimatorSession::restore(
        Arc::clone(&state.catalog),
        state.default_region,
        payload.as_deref(),
    );

    if report.payload_found {
        info!(
            event_name = "estimator.state.restored",
            state_key = %key,
            malformed = report.malformed,
            discarded = report.discarded.len(),
            clamped = report.clamped.len(),
            "estimator state restored"
        );
    }

    Ok(Json(StateResponse {
        state_key: key,
        state: session.state().clone(),
        breakdown: session.breakdown().clone(),
        restore: Some(report),
    }))
}

async fn save_state(
    State(state): State<ApiState>,
    Path(key): Path<String>,
    Json(selection): Json<EstimatorState>,
) -> Result<Json<StateResponse>, ApiError> {
    validate_state_key(&key)?;
    let session = state.session(selection);
    state
        .store
        .save(&key, &encode_state(session.state()))
        .await
        .map_err(ApiError::from_application)?;

    Ok(Json(StateResponse {
        state_key: key,
        state: session.state().clone(),
        breakdown: session.breakdown().clone(),
        restore: None,
    }))
}

fn validate_state_key(key: &str) -> Result<(), ApiError> {
    let valid = !key.is_empty()
        && key.len() <= 128
        && key.chars().all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'));
    if valid {
        return Ok(());
    }
    Err(ApiError(InterfaceError::BadRequest {
        message: format!("state key `{key}` must be 1..=128 of [A-Za-z0-9-_.]"),
        correlation_id: Uuid::new_v4().to_string(),
    }))
}
