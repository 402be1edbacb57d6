use axum::{
    Extension, Json,
    extract::{Path, State},
    response::Response,
};
use tracing::debug;

use warbler_db::SocialGraph;
use warbler_types::models::Message;

use crate::auth::{AppState, run_blocking};
use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::redirect;

/// Messages the logged-in account has liked.
pub async fn liked_messages(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<Message>>, AppError> {
    let messages = run_blocking(&state, move |db| {
        Ok(db.with_conn(|conn| conn.liked_messages(user.id))?)
    })
    .await?;

    Ok(Json(messages))
}

pub async fn add_like(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(message_id): Path<i64>,
) -> Result<Response, AppError> {
    let liked = run_blocking(&state, move |db| {
        Ok(db.transaction(|conn| conn.toggle_like(user.id, message_id))?)
    })
    .await?;

    debug!("Message {} liked: {}", message_id, liked);
    Ok(redirect("/"))
}

pub async fn delete_like(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(message_id): Path<i64>,
) -> Result<Response, AppError> {
    let removed = run_blocking(&state, move |db| {
        Ok(db.transaction(|conn| conn.unlike(user.id, message_id))?)
    })
    .await?;

    debug!("Message {} unliked: {}", message_id, removed);
    Ok(redirect("/"))
}
