use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Account Router
///
/// Registration, login, and logout. The form pages and their submissions
/// carry an idempotent guard: an already-authenticated caller is redirected
/// to the listing without the form being processed.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        // GET /users/register — the registration form.
        // POST /users/register — creates the account; all validation
        // violations are aggregated into one message.
        .route(
            "/users/register",
            get(handlers::register_form).post(handlers::register),
        )
        // GET /users/login — the login form.
        // POST /users/login — authenticates by username-or-email; all
        // failures produce the same message.
        .route(
            "/users/login",
            get(handlers::login_form).post(handlers::login),
        )
        // GET|POST /users/logout
        // Destroys the session unconditionally. GET is kept for plain-link
        // navigation.
        .route(
            "/users/logout",
            get(handlers::logout).post(handlers::logout),
        )
}
