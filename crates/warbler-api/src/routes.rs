use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::auth::{self, AppState};
use crate::middleware::{load_session, require_session};
use crate::{likes, messages, users};

/// Every route of the site. Gated routes answer 401 without a session.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(messages::home))
        .route("/signup", get(auth::signup_form).post(auth::signup))
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/users", get(users::list_users))
        .route("/users/{user_id}", get(users::show_user))
        .route("/messages/{message_id}", get(messages::show_message))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/users/{user_id}/following", get(users::show_following))
        .route("/users/{user_id}/followers", get(users::show_followers))
        .route("/users/follow/{user_id}", post(users::follow))
        .route("/users/stop-following/{user_id}", post(users::stop_following))
        .route("/users/likes", get(likes::liked_messages))
        .route("/users/add_like/{message_id}", post(likes::add_like))
        .route("/users/delete_like/{message_id}", post(likes::delete_like))
        .route("/users/profile", get(users::profile).post(users::edit_profile))
        .route("/users/delete", post(users::delete_user))
        .route("/messages/new", get(messages::compose).post(messages::create_message))
        .route("/messages/{message_id}/delete", post(messages::delete_message))
        .route_layer(middleware::from_fn(require_session))
        .with_state(state.clone());

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn_with_state(state, load_session))
        .layer(TraceLayer::new_for_http())
}
