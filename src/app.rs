use axum::{
    Extension, Form, Json, Router,
    extract::{Path, Query, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{delete, get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::account_store::AccountScenarioStore;
use crate::config::ServerConfig;
use crate::downloader;
use crate::error::{AppError, Result};
use crate::login::{AuthState, UserCredentials};
use crate::report::{FormattedReport, ScheduleReport};
use crate::scenario::{Scenario, SortOrder, sort_scenarios};
use crate::store::ScenarioStore;
use crate::validation::{ScenarioForm, validate};

const SESSION_COOKIE: &str = "session";

/// Shared server state
pub struct AppState {
    pub auth: AuthState,
    database_dir: PathBuf,
    scenario_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(auth: AuthState) -> Self {
        AppState {
            database_dir: auth.database_dir().to_path_buf(),
            auth,
            scenario_lock: Arc::new(Mutex::new(())),
        }
    }

    fn store_for(&self, username: &str) -> AccountScenarioStore {
        AccountScenarioStore::new(&self.database_dir, username, self.scenario_lock.clone())
    }
}

/// Username of the request's session, inserted by [`require_auth`]
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

#[derive(Deserialize)]
struct SortQuery {
    sort: Option<SortOrder>,
}

#[derive(Deserialize)]
struct ExportQuery {
    format: Option<String>,
}

#[derive(Serialize)]
struct TokenResponse {
    token: String,
}

#[derive(Serialize)]
struct WhoAmI {
    username: String,
}

/// Start the web server and block until it stops
pub async fn run(config: ServerConfig) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let auth = AuthState::new(&config.database_dir, config.session_ttl());
    auth.init()?;
    let state = Arc::new(AppState::new(auth));

    let app = router(state);

    let addr = config.addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    let scenarios = Router::new()
        .route("/api/scenarios", get(list_scenarios).post(save_scenario))
        .route("/api/scenarios/:id", delete(delete_scenario))
        .route("/api/me", get(who_am_i))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(serve_landing))
        .route("/health", get(health))
        .route("/api/calculate", post(calculate))
        .route("/api/export", post(export))
        .route("/signup", post(handle_signup))
        .route("/login", post(handle_login))
        .route("/logout", post(handle_logout))
        .route("/api/login", post(api_login))
        .merge(scenarios)
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
}

async fn serve_landing() -> Html<&'static str> {
    Html(include_str!("./static/index.html"))
}

async fn health() -> &'static str {
    "ok"
}

/// Validate the form and return both schedules
async fn calculate(Json(form): Json<ScenarioForm>) -> Result<Json<FormattedReport>> {
    let params = validate(&form)?;
    tracing::debug!(?params, "calculating schedules");
    Ok(Json(ScheduleReport::build(params).formatted()))
}

async fn export(
    Query(query): Query<ExportQuery>,
    Json(form): Json<ScenarioForm>,
) -> Result<Response> {
    let params = validate(&form)?;
    let report = ScheduleReport::build(params);

    match query.format.as_deref().unwrap_or("csv") {
        "csv" => {
            let csv = downloader::to_csv(&report).map_err(|e| AppError::Internal(e.to_string()))?;
            Ok((
                [
                    (header::CONTENT_TYPE, "text/csv"),
                    (header::CONTENT_DISPOSITION, "attachment; filename=\"schedule.csv\""),
                ],
                csv,
            )
                .into_response())
        }
        "xlsx" => {
            let bytes =
                downloader::to_xlsx(&report).map_err(|e| AppError::Internal(e.to_string()))?;
            Ok((
                [
                    (
                        header::CONTENT_TYPE,
                        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                    ),
                    (header::CONTENT_DISPOSITION, "attachment; filename=\"schedule.xlsx\""),
                ],
                bytes,
            )
                .into_response())
        }
        other => Err(AppError::UnknownFormat(other.to_string())),
    }
}

/// Run an account operation on the blocking pool
///
/// Password hashing and the users file are slow, synchronous work.
async fn with_auth<T, F>(state: &Arc<AppState>, op: F) -> Result<T>
where
    F: FnOnce(&AuthState) -> T + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || op(&state.auth))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .build()
}

fn error_redirect(message: &str) -> Redirect {
    Redirect::to(&format!("/?error={}", urlencoding::encode(message)))
}

/// Handle signup form submissions
async fn handle_signup(State(state): State<Arc<AppState>>, Form(credentials): Form<UserCredentials>) -> Redirect {
    let registered = with_auth(&state, move |auth| {
        auth.register_user(&credentials.username, &credentials.email, &credentials.password)
    })
    .await;

    match registered {
        Ok(Ok(())) => Redirect::to("/?registered=true"),
        Ok(Err(e)) => error_redirect(&e.to_string()),
        Err(e) => error_redirect(&e.to_string()),
    }
}

/// Handle login form submissions; sets the session cookie on success
async fn handle_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(credentials): Form<UserCredentials>,
) -> Response {
    let username = credentials.username.clone();
    let verified = with_auth(&state, move |auth| {
        auth.verify_user(&credentials.username, &credentials.password)
            .map_err(AppError::from)
    })
    .await
    .and_then(|result| result);

    match verified {
        Ok(true) => {
            let token = state.auth.create_session(&username);
            (jar.add(session_cookie(token)), Redirect::to("/")).into_response()
        }
        Ok(false) => error_redirect("Invalid username or password").into_response(),
        Err(e) => {
            tracing::error!(error = %e, "authentication error");
            error_redirect("Authentication error").into_response()
        }
    }
}

async fn handle_logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.auth.end_session(cookie.value());
    }
    let removal = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    (jar.remove(removal), Redirect::to("/"))
}

/// JSON login used by API clients; returns the session token and also sets
/// it as a cookie
async fn api_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(credentials): Json<UserCredentials>,
) -> Result<(CookieJar, Json<TokenResponse>)> {
    let username = credentials.username.clone();
    let verified = with_auth(&state, move |auth| {
        auth.verify_user(&credentials.username, &credentials.password)
    })
    .await??;
    if !verified {
        tracing::info!(user = %username, "rejected login");
        return Err(AppError::BadCredentials);
    }
    let token = state.auth.create_session(&username);
    Ok((jar.add(session_cookie(token.clone())), Json(TokenResponse { token })))
}

/// Reject requests without a live session and attach the user otherwise
async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let user = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| state.auth.validate_session(cookie.value()));

    match user {
        Some(username) => {
            request.extensions_mut().insert(CurrentUser(username));
            next.run(request).await
        }
        None => AppError::Unauthorized.into_response(),
    }
}

async fn who_am_i(Extension(CurrentUser(username)): Extension<CurrentUser>) -> Json<WhoAmI> {
    Json(WhoAmI { username })
}

async fn list_scenarios(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
    Query(query): Query<SortQuery>,
) -> Result<Json<Vec<Scenario>>> {
    let mut scenarios = state.store_for(&username).list().await?;
    if let Some(order) = query.sort {
        sort_scenarios(&mut scenarios, order);
    }
    Ok(Json(scenarios))
}

async fn save_scenario(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
    Json(form): Json<ScenarioForm>,
) -> Result<(StatusCode, Json<Scenario>)> {
    let params = validate(&form)?;
    let scenario = state.store_for(&username).save(params).await?;
    tracing::info!(user = %username, id = %scenario.id, "saved scenario");
    Ok((StatusCode::CREATED, Json(scenario)))
}

async fn delete_scenario(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.store_for(&username).delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
