use axum::{
    Extension, Form, Json,
    extract::{Path, Query, State},
    response::Response,
};
use axum_extra::extract::CookieJar;
use tracing::{info, warn};

use warbler_db::{CredentialStore, MessageLedger, SocialGraph};
use warbler_types::api::{ProfileForm, ProfileResponse, SearchQuery};
use warbler_types::models::{Account, ProfileUpdate};

use crate::auth::{AppState, run_blocking};
use crate::error::AppError;
use crate::middleware::{CurrentUser, clear_session};
use crate::redirect;

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Account>>, AppError> {
    let users = run_blocking(&state, move |db| {
        Ok(db.with_conn(|conn| conn.search_accounts(query.q.as_deref()))?)
    })
    .await?;

    Ok(Json(users))
}

/// Profile page: the account, its counters and its messages.
pub async fn show_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = run_blocking(&state, move |db| {
        Ok(db.with_conn(|conn| {
            let Some(user) = conn.account(user_id)? else {
                return Ok(None);
            };
            Ok(Some(ProfileResponse {
                counts: conn.profile_counts(user_id)?,
                messages: conn.messages_by_author(user_id)?,
                liked_message_ids: conn.liked_message_ids(user_id)?,
                user,
            }))
        })?)
    })
    .await?
    .ok_or(AppError::NotFound)?;

    Ok(Json(profile))
}

pub async fn show_following(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<Account>>, AppError> {
    let accounts = run_blocking(&state, move |db| {
        Ok(db.with_conn(|conn| {
            if conn.account(user_id)?.is_none() {
                return Ok(None);
            }
            conn.following(user_id).map(Some)
        })?)
    })
    .await?
    .ok_or(AppError::NotFound)?;

    Ok(Json(accounts))
}

pub async fn show_followers(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<Account>>, AppError> {
    let accounts = run_blocking(&state, move |db| {
        Ok(db.with_conn(|conn| {
            if conn.account(user_id)?.is_none() {
                return Ok(None);
            }
            conn.followers(user_id).map(Some)
        })?)
    })
    .await?
    .ok_or(AppError::NotFound)?;

    Ok(Json(accounts))
}

pub async fn follow(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(followee): Path<i64>,
) -> Result<Response, AppError> {
    let follower = user.id;
    let added = run_blocking(&state, move |db| {
        Ok(db.transaction(|conn| conn.follow(follower, followee))?)
    })
    .await?;

    if added {
        info!("{} now follows {}", user.username, followee);
    }
    Ok(redirect(&format!("/users/{}/following", user.id)))
}

pub async fn stop_following(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(followee): Path<i64>,
) -> Result<Response, AppError> {
    let follower = user.id;
    run_blocking(&state, move |db| {
        Ok(db.transaction(|conn| conn.unfollow(follower, followee))?)
    })
    .await?;

    Ok(redirect(&format!("/users/{}/following", user.id)))
}

/// Current values for the edit-profile form.
pub async fn profile(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<Account> {
    Json(user)
}

/// Apply a profile edit after re-checking the account's password.
pub async fn edit_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Form(form): Form<ProfileForm>,
) -> Result<Response, AppError> {
    let id = user.id;
    let username = user.username.clone();
    let password = form.password.clone();
    let update = ProfileUpdate::from(form);

    let updated = run_blocking(&state, move |db| {
        db.transaction(|conn| {
            if conn.authenticate(&username, &password)?.is_none() {
                return Ok(None);
            }
            conn.update_profile(id, &update).map(Some)
        })?
        .ok_or_else(|| {
            warn!("Profile edit for {} with a wrong password", username);
            AppError::InvalidCredentials
        })
    })
    .await?;

    info!("{} updated their profile", updated.username);
    Ok(redirect(&format!("/users/{}", updated.id)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    jar: CookieJar,
) -> Result<(CookieJar, Response), AppError> {
    let id = user.id;
    run_blocking(&state, move |db| Ok(db.transaction(|conn| conn.delete_account(id))?)).await?;

    info!("Deleted account {} ({})", user.username, id);
    Ok((clear_session(jar), redirect("/signup")))
}
