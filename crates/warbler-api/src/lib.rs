pub mod auth;
pub mod error;
pub mod likes;
pub mod messages;
pub mod middleware;
pub mod routes;
pub mod users;

pub use auth::{AppState, AppStateInner};
pub use error::AppError;
pub use routes::router;

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

/// 302 Found, the status every successful form post answers with.
pub(crate) fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
