use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Content Router
///
/// The anonymous-readable surface of the application. Nothing here mutates
/// state, and every page degrades gracefully: a storage failure renders as an
/// empty listing, never an error page.
pub fn content_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // The home page: the 10 most recent posts, newest first, joined with
        // their authors' usernames.
        .route("/", get(handlers::home))
        // GET /about, GET /contact
        // Static informational pages; only the session's user summary varies.
        .route("/about", get(handlers::about))
        .route("/contact", get(handlers::contact))
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load
        // balancer checks. Returns "ok" immediately.
        .route("/health", get(handlers::health))
}
