//! HTTP counter endpoints.
//!
//! Every handler authenticates, applies the shared rate limit, then calls the
//! counter service. Errors render as `{ "error": CODE, "message": ... }`.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use tally_core::error::{Result, TallyError};
use tally_core::protocol::CounterView;

use crate::app_state::AppState;
use crate::dispatch::RequestCtx;
use crate::services::CounterOp;

const TRANSPORT: &str = "http";

/// `TallyError` rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub TallyError);

impl From<TallyError> for ApiError {
    fn from(e: TallyError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            TallyError::InvalidArgument(_)
            | TallyError::BadRequest(_)
            | TallyError::UnsupportedVersion => StatusCode::BAD_REQUEST,
            TallyError::AuthenticationFailed => StatusCode::UNAUTHORIZED,
            TallyError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            TallyError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            TallyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({
            "error": self.0.client_code().as_str(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

fn admit(app: &AppState, headers: &HeaderMap) -> Result<RequestCtx> {
    let user = app.authenticate(headers, TRANSPORT)?;
    app.check_http_rate()?;
    Ok(RequestCtx::new(user, TRANSPORT))
}

fn run(app: &AppState, headers: &HeaderMap, op: CounterOp, name: &str) -> Result<Option<i64>> {
    let ctx = admit(app, headers)?;
    app.counters().execute(&ctx, op, name)
}

fn value_of(name: String, value: Option<i64>) -> Result<Json<CounterView>> {
    value
        .map(|v| Json(CounterView::new(name, v)))
        .ok_or_else(|| TallyError::Internal("counter op returned no value".into()))
}

/// `GET /v1/counters`
pub async fn list_counters(
    State(app): State<AppState>,
    headers: HeaderMap,
) -> std::result::Result<Json<Vec<CounterView>>, ApiError> {
    admit(&app, &headers)?;
    let views = app
        .counters()
        .cache()
        .snapshot()
        .into_iter()
        .map(CounterView::from)
        .collect();
    Ok(Json(views))
}

/// `GET /v1/counters/:name` (read-through)
pub async fn get_counter(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> std::result::Result<Json<CounterView>, ApiError> {
    let value = run(&app, &headers, CounterOp::Get, &name)?;
    Ok(value_of(name, value)?)
}

/// `POST /v1/counters/:name/increment`
pub async fn increment_counter(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> std::result::Result<Json<CounterView>, ApiError> {
    let value = run(&app, &headers, CounterOp::Incr, &name)?;
    Ok(value_of(name, value)?)
}

/// `DELETE /v1/counters/:name`
pub async fn reset_counter(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> std::result::Result<StatusCode, ApiError> {
    run(&app, &headers, CounterOp::Reset, &name)?;
    Ok(StatusCode::NO_CONTENT)
}
