use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::config::{InputBounds, InputError, Settings};
use crate::core::{
    GoalSolveConfig, GoalSolveResult, GoalType, InputParameters, ProjectionResult,
    ScheduleError, SolveError, YearPoint, ZeroRatePolicy, compute_with_policy,
    run_yearly_projection, solve_goal,
};
use crate::display::{ChartSection, DisplaySummary, chart_sections};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

const DEFAULT_GOAL_TOLERANCE: f64 = 1.0;
const DEFAULT_GOAL_MAX_ITERATIONS: u32 = 64;

/// Field names follow the web calculator's state (`sip`, `timeInYears`,
/// `estimatedReturns`); the descriptive names are accepted too.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    lumpsum: Option<f64>,
    #[serde(alias = "monthlyContribution", alias = "monthly_contribution")]
    sip: Option<f64>,
    #[serde(alias = "horizonYears", alias = "horizon_years", alias = "years")]
    time_in_years: Option<f64>,
    #[serde(
        alias = "annualReturnRatePercent",
        alias = "annual_return_rate_percent",
        alias = "rate"
    )]
    estimated_returns: Option<f64>,
    #[serde(alias = "zero_rate_policy")]
    zero_rate_policy: Option<ZeroRatePolicy>,
    #[serde(alias = "include_yearly")]
    include_yearly: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GoalPayload {
    #[serde(flatten)]
    base: ProjectPayload,
    goal: Option<GoalType>,
    #[serde(alias = "target")]
    target_value: Option<f64>,
    search_min: Option<f64>,
    search_max: Option<f64>,
    tolerance: Option<f64>,
    max_iterations: Option<u32>,
}

#[derive(Debug, Clone, Copy)]
struct ProjectRequest {
    inputs: InputParameters,
    policy: ZeroRatePolicy,
    include_yearly: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
struct InputEcho {
    lumpsum: f64,
    sip: f64,
    time_in_years: f64,
    estimated_returns: f64,
}

impl From<InputParameters> for InputEcho {
    fn from(value: InputParameters) -> Self {
        Self {
            lumpsum: value.lumpsum,
            sip: value.monthly_contribution,
            time_in_years: value.horizon_years,
            estimated_returns: value.annual_return_rate_percent,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    inputs: InputEcho,
    zero_rate_policy: ZeroRatePolicy,
    result: ProjectionResult,
    display: DisplaySummary,
    chart: Vec<ChartSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    yearly: Option<Vec<YearPoint>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GoalResponse {
    inputs: InputEcho,
    zero_rate_policy: ZeroRatePolicy,
    goal: GoalSolveResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BoundsResponse {
    bounds: InputBounds,
    defaults: InputEcho,
    zero_rate_policy: ZeroRatePolicy,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Solve(#[from] SolveError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error("{0} is required")]
    Missing(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(error = %self, "rejected request");
        error_response(StatusCode::BAD_REQUEST, &self.to_string())
    }
}

pub async fn run_http_server(settings: Settings) -> std::io::Result<()> {
    let addr = settings.server.socket_addr();
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route("/api/bounds", get(bounds_handler))
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .route("/api/goal", post(goal_handler))
        .fallback(not_found_handler)
        .with_state(settings);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "SIP calculator HTTP API listening");
    info!("Local access: http://127.0.0.1:{}/", settings.server.port);

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn bounds_handler(State(settings): State<Settings>) -> Response {
    json_response(
        StatusCode::OK,
        BoundsResponse {
            bounds: settings.bounds,
            defaults: settings.defaults.into(),
            zero_rate_policy: settings.zero_rate_policy,
        },
    )
}

async fn project_get_handler(
    State(settings): State<Settings>,
    Query(payload): Query<ProjectPayload>,
) -> Response {
    project_response(&settings, payload)
}

async fn project_post_handler(
    State(settings): State<Settings>,
    Json(payload): Json<ProjectPayload>,
) -> Response {
    project_response(&settings, payload)
}

async fn goal_handler(
    State(settings): State<Settings>,
    Json(payload): Json<GoalPayload>,
) -> Response {
    match goal_response_from_payload(&settings, payload) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => err.into_response(),
    }
}

fn project_response(settings: &Settings, payload: ProjectPayload) -> Response {
    let request = match project_request_from_payload(settings, payload) {
        Ok(request) => request,
        Err(err) => return err.into_response(),
    };
    debug!(inputs = ?request.inputs, policy = ?request.policy, "projecting");
    match build_project_response(request) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => err.into_response(),
    }
}

fn build_project_response(request: ProjectRequest) -> Result<ProjectResponse, ApiError> {
    let result = compute_with_policy(&request.inputs, request.policy);
    let yearly = if request.include_yearly {
        Some(run_yearly_projection(&request.inputs, request.policy)?)
    } else {
        None
    };
    Ok(ProjectResponse {
        inputs: request.inputs.into(),
        zero_rate_policy: request.policy,
        display: DisplaySummary::from_result(&result),
        chart: chart_sections(&result),
        yearly,
        result,
    })
}

fn project_request_from_payload(
    settings: &Settings,
    payload: ProjectPayload,
) -> Result<ProjectRequest, ApiError> {
    let mut inputs = settings.defaults;

    if let Some(v) = payload.lumpsum {
        inputs.lumpsum = v;
    }
    if let Some(v) = payload.sip {
        inputs.monthly_contribution = v;
    }
    if let Some(v) = payload.time_in_years {
        inputs.horizon_years = v;
    }
    if let Some(v) = payload.estimated_returns {
        inputs.annual_return_rate_percent = v;
    }

    settings.bounds.check(&inputs)?;

    Ok(ProjectRequest {
        inputs,
        policy: payload.zero_rate_policy.unwrap_or(settings.zero_rate_policy),
        include_yearly: payload.include_yearly.unwrap_or(false),
    })
}

fn goal_response_from_payload(
    settings: &Settings,
    payload: GoalPayload,
) -> Result<GoalResponse, ApiError> {
    let request = project_request_from_payload(settings, payload.base)?;
    let goal_type = payload.goal.unwrap_or(GoalType::RequiredContribution);
    let field_bounds = match goal_type {
        GoalType::RequiredContribution => settings.bounds.monthly_contribution,
        GoalType::RequiredLumpsum => settings.bounds.lumpsum,
    };
    let config = GoalSolveConfig {
        goal_type,
        target_value: payload.target_value.ok_or(ApiError::Missing("targetValue"))?,
        search_min: payload.search_min.unwrap_or(field_bounds.min),
        search_max: payload.search_max.unwrap_or(field_bounds.max),
        tolerance: payload.tolerance.unwrap_or(DEFAULT_GOAL_TOLERANCE),
        max_iterations: payload
            .max_iterations
            .unwrap_or(DEFAULT_GOAL_MAX_ITERATIONS),
        zero_rate_policy: request.policy,
    };
    let goal = solve_goal(&request.inputs, config)?;

    Ok(GoalResponse {
        inputs: request.inputs.into(),
        zero_rate_policy: request.policy,
        goal,
    })
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
