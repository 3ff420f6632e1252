use crate::{AppState, handlers};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

// Multipart bodies may carry a 5MB image plus the text fields; the transport
// cap sits above the application-level image limit so oversized images get
// the specific message instead of a bare 413.
const MAX_UPLOAD_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Post Management Router
///
/// Creation and deletion require an authenticated caller: those handlers take
/// the `AuthUser` extractor, which redirects anonymous requests to the login
/// page before the handler body runs. Reading a single post is public.
pub fn post_routes() -> Router<AppState> {
    Router::new()
        // GET /posts/new
        // The creation form page. Auth required.
        .route("/posts/new", get(handlers::new_post_form))
        // POST /posts
        // Creates a post from a multipart form (title, body, optional image).
        // Auth required; validation failures redirect back with a message.
        .route("/posts", post(handlers::create_post))
        // GET /posts/{id}
        // Public single-post view. Unknown ids redirect to the listing.
        // DELETE /posts/{id}
        // Removes the caller's own post. Auth plus ownership required.
        .route(
            "/posts/{id}",
            get(handlers::show_post).delete(handlers::delete_post),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES))
}
