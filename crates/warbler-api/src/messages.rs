use axum::{
    Extension, Form, Json,
    extract::{Path, State},
    response::Response,
};
use tracing::info;

use warbler_db::{CredentialStore, MessageLedger, SocialGraph};
use warbler_types::api::{ComposeResponse, HomeResponse, MessageForm, MessageResponse};
use warbler_types::models::{MAX_MESSAGE_LEN, TIMELINE_LIMIT};

use crate::auth::{AppState, run_blocking};
use crate::error::AppError;
use crate::middleware::{CurrentUser, Session};
use crate::redirect;

/// Timeline of the logged-in account; empty for anonymous visitors.
pub async fn home(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<HomeResponse>, AppError> {
    let Some(user) = session.account else {
        return Ok(Json(HomeResponse {
            user: None,
            counts: None,
            messages: vec![],
            liked_message_ids: vec![],
        }));
    };

    let id = user.id;
    let (counts, messages, liked_message_ids) = run_blocking(&state, move |db| {
        Ok(db.with_conn(|conn| {
            Ok((
                conn.profile_counts(id)?,
                conn.timeline(id, TIMELINE_LIMIT)?,
                conn.liked_message_ids(id)?,
            ))
        })?)
    })
    .await?;

    Ok(Json(HomeResponse {
        user: Some(user),
        counts: Some(counts),
        messages,
        liked_message_ids,
    }))
}

pub async fn compose(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<ComposeResponse> {
    Json(ComposeResponse {
        user,
        max_length: MAX_MESSAGE_LEN,
    })
}

pub async fn create_message(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Form(form): Form<MessageForm>,
) -> Result<Response, AppError> {
    let author = user.id;
    let message = run_blocking(&state, move |db| {
        Ok(db.transaction(|conn| conn.create_message(&form.text, author))?)
    })
    .await?;

    info!("{} posted message {}", user.username, message.id);
    Ok(redirect(&format!("/users/{}", user.id)))
}

pub async fn show_message(
    State(state): State<AppState>,
    Path(message_id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    let (message, author) = run_blocking(&state, move |db| {
        Ok(db.with_conn(|conn| {
            let Some(message) = conn.message(message_id)? else {
                return Ok(None);
            };
            let author = conn.account(message.user_id)?;
            Ok(author.map(|author| (message, author)))
        })?)
    })
    .await?
    .ok_or(AppError::NotFound)?;

    Ok(Json(MessageResponse { message, author }))
}

pub async fn delete_message(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(message_id): Path<i64>,
) -> Result<Response, AppError> {
    let requester = user.id;
    run_blocking(&state, move |db| {
        Ok(db.transaction(|conn| conn.delete_message(message_id, requester))?)
    })
    .await?;

    info!("{} deleted message {}", user.username, message_id);
    Ok(redirect(&format!("/users/{}", user.id)))
}
