use axum::{
    extract::{rejection::JsonRejection, rejection::RawFormRejection, RawForm, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

use crate::error::PredictError;
use crate::pipeline::{self, AppContext};
use crate::presenter::{self, Outcome};
use crate::types::{CropInput, PredictionReport};

// ---------- Server state ----------

pub type SharedContext = Arc<AppContext>;

pub fn router(ctx: SharedContext) -> Router {
    Router::new()
        .route("/", get(form_page))
        .route("/predict", post(predict_form))
        .route("/api/predict", post(predict_json))
        .route("/health", get(health))
        .with_state(ctx)
}

fn status_for(err: &PredictError) -> StatusCode {
    if err.is_client_error() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn run_logged(ctx: &AppContext, input: &CropInput) -> Result<PredictionReport, PredictError> {
    match pipeline::run(ctx, input) {
        Ok(report) => {
            tracing::info!("prediction {}", presenter::summary(&report));
            Ok(report)
        }
        Err(e) => {
            if e.is_client_error() {
                tracing::debug!("rejected input: {}", e);
            } else {
                tracing::error!("prediction failed: {}", e);
            }
            Err(e)
        }
    }
}

// ---------- Handlers ----------

async fn form_page() -> Html<String> {
    Html(presenter::page(&CropInput::default(), Outcome::None))
}

async fn predict_form(
    State(ctx): State<SharedContext>,
    form: Result<RawForm, RawFormRejection>,
) -> Response {
    let body = match form {
        Ok(RawForm(body)) => body,
        Err(rejection) => {
            let page = presenter::page(&CropInput::default(), Outcome::Error(&rejection.body_text()));
            return (rejection.status(), Html(page)).into_response();
        }
    };

    let input: CropInput = match serde_urlencoded::from_bytes(&body) {
        Ok(input) => input,
        Err(e) => {
            let pairs: Vec<(String, String)> =
                serde_urlencoded::from_bytes(&body).unwrap_or_default();
            let msg = format!("invalid form submission: {e}");
            tracing::debug!("{}", msg);
            let page = presenter::page(&CropInput::prefill(&pairs), Outcome::Error(&msg));
            return (StatusCode::UNPROCESSABLE_ENTITY, Html(page)).into_response();
        }
    };

    match run_logged(&ctx, &input) {
        Ok(report) => Html(presenter::page(&input, Outcome::Report(&report))).into_response(),
        Err(e) => {
            let page = presenter::page(&input, Outcome::Error(&e.to_string()));
            (status_for(&e), Html(page)).into_response()
        }
    }
}

async fn predict_json(
    State(ctx): State<SharedContext>,
    payload: Result<Json<CropInput>, JsonRejection>,
) -> Result<Json<PredictionReport>, (StatusCode, Json<serde_json::Value>)> {
    let Json(input) =
        payload.map_err(|r| (r.status(), Json(json!({ "error": r.body_text() }))))?;

    run_logged(&ctx, &input)
        .map(Json)
        .map_err(|e| (status_for(&e), Json(json!({ "error": e.to_string() }))))
}

async fn health(State(ctx): State<SharedContext>) -> Json<serde_json::Value> {
    let t = ctx.thresholds();
    Json(json!({
        "status": "ok",
        "in_dim": ctx.schema().len(),
        "encoding_policy": ctx.encoder().policy(),
        "thresholds": { "low": t.low(), "high": t.high(), "source": ctx.threshold_source() },
    }))
}
