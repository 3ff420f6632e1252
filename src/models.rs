use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Canonical account record stored in the `users` table. The password is only
/// ever held as a salted one-way hash; the hash is excluded from all JSON
/// output so it can never leak through a response body.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    // Unique, 3-20 chars, alphanumeric and underscore only.
    pub username: String,
    // Unique, stored normalized (trimmed, lowercased).
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Post
///
/// A blog post row from the `posts` table. Immutable after creation except for
/// deletion by its author.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    // Public URL path under /img/uploads, set only when an image was attached.
    pub image: Option<String>,
    // FK to users.id (author).
    pub author_id: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// PostView
///
/// Author-joined read model used by the listing and detail pages. The
/// `author_username` field is loaded via a JOIN in the repository query.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct PostView {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub image: Option<String>,
    pub author_id: Uuid,
    pub author_username: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// NewPost
///
/// Validated input for a post insertion. Built by the creation handler after
/// the multipart form has passed its checks; `image` already holds the public
/// path returned by the upload store.
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub title: String,
    pub body: String,
    pub image: Option<String>,
}

/// NewUser
///
/// Validated input for a user insertion. The password arrives here hashed.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

// --- Request Payloads (Form Input) ---

/// RegisterForm
///
/// Raw registration form fields (POST /users/register). Fields default to
/// empty strings so a missing input fails validation instead of rejecting the
/// request body outright.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(default)]
#[ts(export)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
}

/// ValidRegistration
///
/// The result of a successful `RegisterForm::validate()`: trimmed username,
/// normalized email, and the password ready for hashing.
#[derive(Debug, Clone)]
pub struct ValidRegistration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// LoginForm
///
/// Login form fields (POST /users/login). The `username` field accepts either
/// a username or an email address.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(default)]
#[ts(export)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl RegisterForm {
    /// validate
    ///
    /// Evaluates the full rule list eagerly and aggregates every violation, so
    /// the user sees all problems at once rather than one per submission.
    pub fn validate(&self) -> Result<ValidRegistration, Vec<String>> {
        let username = self.username.trim().to_string();
        let email = normalize_email(&self.email);

        let rules: [(bool, &str); 5] = [
            (
                (3..=20).contains(&username.chars().count()),
                "Username must be between 3 and 20 characters",
            ),
            (
                !username.is_empty()
                    && username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'),
                "Username can only contain letters, numbers, and underscores",
            ),
            (is_valid_email(&email), "Please enter a valid email"),
            (
                self.password.chars().count() >= 6,
                "Password must be at least 6 characters long",
            ),
            (self.password2 == self.password, "Passwords do not match"),
        ];

        let errors: Vec<String> = rules
            .into_iter()
            .filter(|&(ok, _)| !ok)
            .map(|(_, msg)| msg.to_string())
            .collect();

        if errors.is_empty() {
            Ok(ValidRegistration {
                username,
                email,
                password: self.password.clone(),
            })
        } else {
            Err(errors)
        }
    }
}

/// normalize_email
///
/// Emails are compared and stored in this form: trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// is_valid_email
///
/// Syntactic check only: a single '@' with a non-empty local part and a
/// dotted domain. Deliverability is not this application's concern.
pub fn is_valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !domain.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        _ => false,
    }
}

// --- Page Payloads (Output Schemas) ---

/// SessionUser
///
/// The authenticated user summary rendered on every page: just the username,
/// read from the session without a database round trip.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct SessionUser {
    pub username: String,
}

/// Flash
///
/// One-shot message pair carried through the session by redirecting handlers
/// and consumed by the next page render.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct Flash {
    pub success: Option<String>,
    pub error: Option<String>,
}

/// HomePage
///
/// Payload for the listing page: the 10 most recent posts, newest first, each
/// joined with its author's username.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct HomePage {
    pub title: String,
    pub posts: Vec<PostView>,
    pub user: Option<SessionUser>,
    pub flash: Flash,
}

/// PostPage
///
/// Payload for the single-post view.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PostPage {
    pub title: String,
    pub post: PostView,
    pub user: Option<SessionUser>,
    pub flash: Flash,
}

/// StaticPage
///
/// Payload for pages without content of their own (about, contact, and the
/// three form pages): title, the optional user summary, and any flash.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct StaticPage {
    pub title: String,
    pub user: Option<SessionUser>,
    pub flash: Flash,
}
