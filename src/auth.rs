use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::Redirect,
};
use std::convert::Infallible;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{
    models::{Flash, SessionUser},
    repository::RepositoryState,
};

// --- Session Keys ---

/// Key under which the authenticated user's UUID is stored in the session.
pub const SESSION_USER_ID_KEY: &str = "user_id";
/// Key under which the authenticated user's username is stored in the session.
pub const SESSION_USERNAME_KEY: &str = "username";
/// Key under which one-shot flash messages are stored in the session.
pub const SESSION_FLASH_KEY: &str = "flash";

// --- Password Hashing ---

/// hash_password
///
/// Produces a salted Argon2 hash in PHC string form. The plaintext is never
/// persisted or logged anywhere in the application.
pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| e.to_string())
}

/// verify_password
///
/// One-way comparison of a candidate password against a stored hash. An
/// unparsable hash counts as a failed verification rather than an error the
/// caller could leak to the client.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::error!("stored password hash is unparsable: {:?}", e);
            false
        }
    }
}

// --- Flash Messages ---

/// flash_error
///
/// Stores a one-shot error message in the session. Session-store failures are
/// logged and swallowed: losing a flash must never fail the request.
pub async fn flash_error(session: &Session, message: &str) {
    let mut flash = peek_flash(session).await;
    flash.error = Some(message.to_string());
    if let Err(e) = session.insert(SESSION_FLASH_KEY, &flash).await {
        tracing::error!("failed to store flash message: {:?}", e);
    }
}

/// flash_success
///
/// Stores a one-shot success message in the session.
pub async fn flash_success(session: &Session, message: &str) {
    let mut flash = peek_flash(session).await;
    flash.success = Some(message.to_string());
    if let Err(e) = session.insert(SESSION_FLASH_KEY, &flash).await {
        tracing::error!("failed to store flash message: {:?}", e);
    }
}

/// take_flash
///
/// Removes and returns any pending flash, so a message is rendered exactly
/// once.
pub async fn take_flash(session: &Session) -> Flash {
    match session.remove::<Flash>(SESSION_FLASH_KEY).await {
        Ok(flash) => flash.unwrap_or_default(),
        Err(e) => {
            tracing::error!("failed to read flash message: {:?}", e);
            Flash::default()
        }
    }
}

async fn peek_flash(session: &Session) -> Flash {
    session
        .get::<Flash>(SESSION_FLASH_KEY)
        .await
        .unwrap_or_default()
        .unwrap_or_default()
}

// --- Identity Extractors ---

/// AuthUser
///
/// The resolved identity of an authenticated request: the session's user id,
/// re-validated against the database so a session outliving its user stops
/// working. Handlers on protected routes take this as an argument; extraction
/// failure redirects to the login page with a flash, it never reaches the
/// handler.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);

        // The session layer sits outside every route, so extraction only fails
        // if the router was built without it.
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| {
                tracing::error!("session unavailable: {}", msg);
                Redirect::to("/users/login")
            })?;

        let user_id = match session.get::<Uuid>(SESSION_USER_ID_KEY).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                flash_error(&session, "Please log in to access this page").await;
                return Err(Redirect::to("/users/login"));
            }
            Err(e) => {
                tracing::error!("failed to read session: {:?}", e);
                flash_error(&session, "Please log in to access this page").await;
                return Err(Redirect::to("/users/login"));
            }
        };

        // The session references the user weakly; drop it if the account is gone.
        match repo.get_user(user_id).await {
            Some(user) => Ok(AuthUser {
                id: user.id,
                username: user.username,
            }),
            None => {
                if let Err(e) = session.flush().await {
                    tracing::error!("failed to destroy stale session: {:?}", e);
                }
                flash_error(&session, "Please log in to access this page").await;
                Err(Redirect::to("/users/login"))
            }
        }
    }
}

/// CurrentUser
///
/// Optional identity for pages anyone may view: `None` for anonymous callers.
/// Reads only the session (no database round trip) and never rejects, which
/// is what the already-authenticated guards on the login and register routes
/// need.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<SessionUser>);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Ok(session) = Session::from_request_parts(parts, state).await else {
            return Ok(CurrentUser(None));
        };
        Ok(CurrentUser(session_user(&session).await))
    }
}

/// PageContext
///
/// The request-scoped context every page render needs: the optional user
/// summary plus any pending flash (consumed here, so it renders exactly once).
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub user: Option<SessionUser>,
    pub flash: Flash,
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Ok(session) = Session::from_request_parts(parts, state).await else {
            return Ok(PageContext::default());
        };
        Ok(PageContext {
            user: session_user(&session).await,
            flash: take_flash(&session).await,
        })
    }
}

async fn session_user(session: &Session) -> Option<SessionUser> {
    match session.get::<String>(SESSION_USERNAME_KEY).await {
        Ok(Some(username)) => Some(SessionUser { username }),
        Ok(None) => None,
        Err(e) => {
            tracing::error!("failed to read session: {:?}", e);
            None
        }
    }
}
