use std::sync::Arc;

use axum::{Form, Json, extract::State, response::Response};
use axum_extra::extract::CookieJar;
use tracing::{error, info, warn};

use warbler_db::{CredentialStore, Database};
use warbler_types::api::{FormResponse, LoginForm, SignupForm};
use warbler_types::models::NewAccount;

use crate::error::AppError;
use crate::middleware::{clear_session, encode_session, session_cookie};
use crate::redirect;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub session_secret: String,
}

const MIN_PASSWORD_LEN: usize = 6;

/// Run blocking work (SQLite, Argon2) off the async runtime.
pub async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, AppError>
where
    F: FnOnce(&Database) -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            AppError::Internal(e.to_string())
        })?
}

pub async fn signup_form() -> Json<FormResponse> {
    Json(FormResponse {
        heading: "Join Warbler today.".into(),
        action: "/signup".into(),
        fields: ["username", "email", "password", "image_url"].map(String::from).to_vec(),
    })
}

pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> Result<(CookieJar, Response), AppError> {
    if let Some(password) = &form.password {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::BadRequest(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
    }

    let new = NewAccount::from(form);
    let account = run_blocking(&state, move |db| {
        Ok(db.transaction(|conn| conn.signup(&new))?)
    })
    .await?;

    info!("New account {} ({})", account.username, account.id);

    let token = encode_session(&state.session_secret, account.id)?;
    Ok((jar.add(session_cookie(token)), redirect("/")))
}

pub async fn login_form() -> Json<FormResponse> {
    Json(FormResponse {
        heading: "Welcome back.".into(),
        action: "/login".into(),
        fields: ["username", "password"].map(String::from).to_vec(),
    })
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Response), AppError> {
    let username = form.username.clone();
    let account = run_blocking(&state, move |db| {
        Ok(db.with_conn(|conn| conn.authenticate(&form.username, &form.password))?)
    })
    .await?
    .ok_or_else(|| {
        warn!("Failed login for {}", username);
        AppError::InvalidCredentials
    })?;

    info!("Hello, {}!", account.username);

    let token = encode_session(&state.session_secret, account.id)?;
    Ok((jar.add(session_cookie(token)), redirect("/")))
}

pub async fn logout(jar: CookieJar) -> (CookieJar, Response) {
    (clear_session(jar), redirect("/login"))
}
