use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::warn;

use warbler_db::CredentialStore;
use warbler_types::api::SessionClaims;
use warbler_types::models::Account;

use crate::auth::{AppState, run_blocking};
use crate::error::AppError;

/// Cookie holding the signed session token.
pub const SESSION_COOKIE: &str = "curr_user";

const SESSION_DAYS: i64 = 30;

/// Request-scoped session, inserted by [`load_session`] on every request.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub account: Option<Account>,
}

/// The logged-in account, inserted by [`require_session`] on gated routes.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Account);

pub fn encode_session(secret: &str, user_id: i64) -> Result<String, AppError> {
    let claims = SessionClaims {
        sub: user_id,
        exp: (chrono::Utc::now() + chrono::Duration::days(SESSION_DAYS)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(e.to_string()))
}

/// Account id from a session token; `None` if forged or expired.
pub fn decode_session(secret: &str, token: &str) -> Option<i64> {
    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims.sub)
    .ok()
}

pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub fn clear_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/"))
}

/// Resolve the session cookie to an account. A session whose account has
/// since been deleted is treated as anonymous.
pub async fn load_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| decode_session(&state.session_secret, cookie.value()));

    let account = match user_id {
        Some(id) => run_blocking(&state, move |db| Ok(db.with_conn(|conn| conn.account(id))?)).await?,
        None => None,
    };

    req.extensions_mut().insert(Session { account });
    Ok(next.run(req).await)
}

/// Reject requests without a logged-in account.
pub async fn require_session(mut req: Request, next: Next) -> Result<Response, AppError> {
    let account = req
        .extensions()
        .get::<Session>()
        .and_then(|session| session.account.clone())
        .ok_or_else(|| {
            warn!("Access unauthorized: {} {}", req.method(), req.uri().path());
            AppError::Unauthorized
        })?;

    req.extensions_mut().insert(CurrentUser(account));
    Ok(next.run(req).await)
}
