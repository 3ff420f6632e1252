use crate::models::{NewPost, NewUser, Post, PostView, User, normalize_email};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// CreateUserError
///
/// Outcome of a failed user insertion. `Duplicate` is the database's
/// unique-index rejection on username or email; which of the two collided is
/// deliberately not carried, so callers can only ever report a generic
/// "already exists".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateUserError {
    Duplicate,
    Database,
}

/// Repository Trait
///
/// Abstract contract for all persistence operations. Handlers interact with
/// the data layer only through this trait, so tests substitute an in-memory
/// implementation for the Postgres one.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across the async task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Posts ---
    // Listing read model: newest first, author username joined in, capped at
    // `limit`. Degrades to an empty list on storage errors.
    async fn recent_posts(&self, limit: i64) -> Vec<PostView>;
    async fn get_post(&self, id: Uuid) -> Option<PostView>;
    // Returns None (logged) on storage failure; no partial record remains.
    async fn create_post(&self, post: NewPost, author_id: Uuid) -> Option<Post>;
    // Owner-only: deletes only if `author_id` matches the post's author.
    async fn delete_post(&self, id: Uuid, author_id: Uuid) -> bool;

    // --- Users ---
    async fn get_user(&self, id: Uuid) -> Option<User>;
    // Login lookup: the identifier may be a username (compared as stored) or
    // an email (compared in normalized form).
    async fn find_user_by_identifier(&self, identifier: &str) -> Option<User>;
    // Uniqueness of username and email is enforced by the database indexes;
    // a conflict surfaces as CreateUserError::Duplicate.
    async fn create_user(&self, user: NewUser) -> Result<User, CreateUserError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const POST_VIEW_COLUMNS: &str = r#"
    p.id, p.title, p.body, p.image, p.author_id, u.username AS author_username, p.created_at
"#;

#[async_trait]
impl Repository for PostgresRepository {
    /// recent_posts
    ///
    /// The listing query. A storage failure is logged and rendered as an empty
    /// page rather than an error response.
    async fn recent_posts(&self, limit: i64) -> Vec<PostView> {
        let query = format!(
            r#"
            SELECT {POST_VIEW_COLUMNS}
            FROM posts p
            JOIN users u ON p.author_id = u.id
            ORDER BY p.created_at DESC
            LIMIT $1
            "#
        );

        sqlx::query_as::<_, PostView>(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("recent_posts error: {:?}", e);
                vec![]
            })
    }

    /// get_post
    ///
    /// Single-post fetch with the author join. No access restriction: reading
    /// is public.
    async fn get_post(&self, id: Uuid) -> Option<PostView> {
        let query = format!(
            r#"
            SELECT {POST_VIEW_COLUMNS}
            FROM posts p
            JOIN users u ON p.author_id = u.id
            WHERE p.id = $1
            "#
        );

        sqlx::query_as::<_, PostView>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_post error: {:?}", e);
                None
            })
    }

    /// create_post
    ///
    /// Inserts a new post. The author FK guarantees the referenced user exists
    /// at creation time; a violation is a storage error like any other here.
    async fn create_post(&self, post: NewPost, author_id: Uuid) -> Option<Post> {
        sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, title, body, image, author_id, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING id, title, body, image, author_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(post.title)
        .bind(post.body)
        .bind(post.image)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| tracing::error!("create_post error: {:?}", e))
        .ok()
    }

    /// delete_post
    ///
    /// Deletes a post only if the provided `author_id` matches the post's
    /// author. The ownership check rides in the query itself, so a non-owner
    /// delete affects zero rows.
    async fn delete_post(&self, id: Uuid, author_id: Uuid) -> bool {
        match sqlx::query("DELETE FROM posts WHERE id = $1 AND author_id = $2")
            .bind(id)
            .bind(author_id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_post error: {:?}", e);
                false
            }
        }
    }

    /// get_user
    ///
    /// Identity re-validation for the authenticated-user extractor.
    async fn get_user(&self, id: Uuid) -> Option<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_user error: {:?}", e);
            None
        })
    }

    /// find_user_by_identifier
    ///
    /// Login lookup across both unique columns. Usernames compare exactly as
    /// stored; emails compare in the same normalized form they were stored in.
    async fn find_user_by_identifier(&self, identifier: &str) -> Option<User> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM users
            WHERE username = $1 OR email = $2
            "#,
        )
        .bind(identifier)
        .bind(normalize_email(identifier))
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_user_by_identifier error: {:?}", e);
            None
        })
    }

    /// create_user
    ///
    /// Inserts a new account. There is no pre-flight existence check: the
    /// unique indexes on username and email are the single source of truth, so
    /// two concurrent registrations of the same name resolve to one success
    /// and one `Duplicate`.
    async fn create_user(&self, user: NewUser) -> Result<User, CreateUserError> {
        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING id, username, email, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user.username)
        .bind(user.email)
        .bind(user.password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(CreateUserError::Duplicate)
            }
            Err(e) => {
                tracing::error!("create_user error: {:?}", e);
                Err(CreateUserError::Database)
            }
        }
    }
}
