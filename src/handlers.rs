use crate::{
    AppState,
    auth::{
        self, AuthUser, CurrentUser, PageContext, SESSION_USER_ID_KEY, SESSION_USERNAME_KEY,
        flash_error, flash_success,
    },
    models::{HomePage, LoginForm, NewPost, NewUser, PostPage, RegisterForm, StaticPage},
};
use axum::{
    Json,
    extract::{Multipart, Path, State},
    response::Redirect,
};
use tower_sessions::Session;
use uuid::Uuid;

/// The listing page never shows more than this many posts.
pub const RECENT_POST_LIMIT: i64 = 10;

/// Upload ceiling for a single image attachment.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

// --- Content Pages ---

/// home
///
/// [Public Route] The listing page: the most recent posts, newest first, each
/// carrying its author's username. A storage failure degrades to an empty
/// list (logged in the repository), never an error page.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Recent posts listing", body = HomePage))
)]
pub async fn home(State(state): State<AppState>, ctx: PageContext) -> Json<HomePage> {
    let posts = state.repo.recent_posts(RECENT_POST_LIMIT).await;
    Json(HomePage {
        title: "Clean Blog - Home".to_string(),
        posts,
        user: ctx.user,
        flash: ctx.flash,
    })
}

/// about
///
/// [Public Route] Static informational page.
#[utoipa::path(
    get,
    path = "/about",
    responses((status = 200, description = "About page", body = StaticPage))
)]
pub async fn about(ctx: PageContext) -> Json<StaticPage> {
    Json(StaticPage {
        title: "Clean Blog - About".to_string(),
        user: ctx.user,
        flash: ctx.flash,
    })
}

/// contact
///
/// [Public Route] Static informational page.
#[utoipa::path(
    get,
    path = "/contact",
    responses((status = 200, description = "Contact page", body = StaticPage))
)]
pub async fn contact(ctx: PageContext) -> Json<StaticPage> {
    Json(StaticPage {
        title: "Clean Blog - Contact".to_string(),
        user: ctx.user,
        flash: ctx.flash,
    })
}

// --- Post Management ---

/// new_post_form
///
/// [Authenticated Route] The creation form page. Anonymous callers are
/// redirected to login by the `AuthUser` extractor before this body runs.
#[utoipa::path(
    get,
    path = "/posts/new",
    responses(
        (status = 200, description = "Post creation form", body = StaticPage),
        (status = 303, description = "Not logged in; redirected to login")
    )
)]
pub async fn new_post_form(auth_user: AuthUser, ctx: PageContext) -> Json<StaticPage> {
    Json(StaticPage {
        title: "Clean Blog - New Post".to_string(),
        user: Some(crate::models::SessionUser {
            username: auth_user.username,
        }),
        flash: ctx.flash,
    })
}

/// create_post
///
/// [Authenticated Route] Creates a post from a multipart form (`title`,
/// `body`, optional file `image`). Every validation failure flashes a message
/// and redirects back to the form with nothing persisted: an attachment must
/// be an image and at most 5MB, and title and body must be non-empty. An
/// accepted attachment is written through the upload store under a generated
/// collision-resistant name before the record is inserted.
#[utoipa::path(
    post,
    path = "/posts",
    responses(
        (status = 303, description = "Redirect to the new post, or back to the form with a message")
    )
)]
pub async fn create_post(
    auth_user: AuthUser,
    State(state): State<AppState>,
    session: Session,
    mut multipart: Multipart,
) -> Redirect {
    let mut title = String::new();
    let mut body = String::new();
    let mut image: Option<(String, Vec<u8>)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("error reading upload form: {:?}", e);
                flash_error(&session, "Error creating post").await;
                return Redirect::to("/posts/new");
            }
        };

        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "title" => match field.text().await {
                Ok(value) => title = value,
                Err(e) => {
                    tracing::error!("error reading title field: {:?}", e);
                    flash_error(&session, "Error creating post").await;
                    return Redirect::to("/posts/new");
                }
            },
            "body" => match field.text().await {
                Ok(value) => body = value,
                Err(e) => {
                    tracing::error!("error reading body field: {:?}", e);
                    flash_error(&session, "Error creating post").await;
                    return Redirect::to("/posts/new");
                }
            },
            "image" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let content_type = field.content_type().unwrap_or("").to_string();
                let data = match field.bytes().await {
                    Ok(data) => data,
                    Err(e) => {
                        tracing::error!("error reading image field: {:?}", e);
                        flash_error(&session, "Error creating post").await;
                        return Redirect::to("/posts/new");
                    }
                };

                // A file input left empty still submits an empty part.
                if filename.is_empty() && data.is_empty() {
                    continue;
                }
                if !content_type.starts_with("image/") {
                    flash_error(&session, "Only image files are allowed").await;
                    return Redirect::to("/posts/new");
                }
                if data.len() > MAX_IMAGE_BYTES {
                    flash_error(&session, "Image exceeds the 5MB upload limit").await;
                    return Redirect::to("/posts/new");
                }

                image = Some((filename, data.to_vec()));
            }
            _ => {}
        }
    }

    if title.trim().is_empty() || body.trim().is_empty() {
        flash_error(&session, "Title and body are required").await;
        return Redirect::to("/posts/new");
    }

    // Store the attachment first; the post only ever references a file that
    // exists.
    let image_path = match image {
        Some((filename, data)) => match state.uploads.store_image(&filename, &data).await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::error!("image upload failed: {}", e);
                flash_error(&session, "Error uploading image").await;
                return Redirect::to("/posts/new");
            }
        },
        None => None,
    };

    let new_post = NewPost {
        title,
        body,
        image: image_path,
    };

    match state.repo.create_post(new_post, auth_user.id).await {
        Some(post) => {
            flash_success(&session, "Post created successfully!").await;
            Redirect::to(&format!("/posts/{}", post.id))
        }
        None => {
            flash_error(&session, "Error creating post").await;
            Redirect::to("/posts/new")
        }
    }
}

/// show_post
///
/// [Public Route] Single post view with the author join. Malformed and
/// unknown ids are both treated as "nothing to show": a flash and a redirect
/// to the listing, never a hard 404.
#[utoipa::path(
    get,
    path = "/posts/{id}",
    params(("id" = String, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post detail", body = PostPage),
        (status = 303, description = "Unknown post; redirected to the listing")
    )
)]
pub async fn show_post(
    State(state): State<AppState>,
    ctx: PageContext,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<PostPage>, Redirect> {
    let Ok(id) = Uuid::parse_str(&id) else {
        flash_error(&session, "Post not found").await;
        return Err(Redirect::to("/"));
    };

    match state.repo.get_post(id).await {
        Some(post) => Ok(Json(PostPage {
            title: format!("Clean Blog - {}", post.title),
            post,
            user: ctx.user,
            flash: ctx.flash,
        })),
        None => {
            flash_error(&session, "Post not found").await;
            Err(Redirect::to("/"))
        }
    }
}

/// delete_post
///
/// [Authenticated Route] Deletes the caller's own post. Ownership is a plain
/// id equality check; a mismatch is refused with a message. The repository
/// query carries the same author guard, so the row can only ever disappear
/// for its author. The uploaded image file, if any, is left on disk.
#[utoipa::path(
    delete,
    path = "/posts/{id}",
    params(("id" = String, Path, description = "Post ID")),
    responses(
        (status = 303, description = "Redirect to the listing with an outcome message")
    )
)]
pub async fn delete_post(
    auth_user: AuthUser,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Redirect {
    let Ok(id) = Uuid::parse_str(&id) else {
        flash_error(&session, "Post not found").await;
        return Redirect::to("/");
    };

    match state.repo.get_post(id).await {
        None => {
            flash_error(&session, "Post not found").await;
        }
        Some(post) if post.author_id != auth_user.id => {
            flash_error(&session, "Not authorized to delete this post").await;
        }
        Some(_) => {
            if state.repo.delete_post(id, auth_user.id).await {
                flash_success(&session, "Post deleted successfully").await;
            } else {
                flash_error(&session, "Error deleting post").await;
            }
        }
    }
    Redirect::to("/")
}

// --- Account ---

/// register_form
///
/// [Public Route] Registration form page. Already-authenticated callers are
/// sent back to the listing without rendering the form.
#[utoipa::path(
    get,
    path = "/users/register",
    responses(
        (status = 200, description = "Registration form", body = StaticPage),
        (status = 303, description = "Already logged in; redirected home")
    )
)]
pub async fn register_form(ctx: PageContext) -> Result<Json<StaticPage>, Redirect> {
    if ctx.user.is_some() {
        return Err(Redirect::to("/"));
    }
    Ok(Json(StaticPage {
        title: "Clean Blog - Register".to_string(),
        user: None,
        flash: ctx.flash,
    }))
}

/// register
///
/// [Public Route] Creates an account. All validation rule violations are
/// aggregated into a single flash. Uniqueness of username and email is
/// enforced by the database indexes; a conflict reports the generic "already
/// exists" without revealing which field collided. The password is hashed
/// before storage; the plaintext is never persisted.
#[utoipa::path(
    post,
    path = "/users/register",
    responses(
        (status = 303, description = "Redirect to login on success, back to the form otherwise")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(current): CurrentUser,
    axum::Form(form): axum::Form<RegisterForm>,
) -> Redirect {
    // Idempotent guard: an authenticated caller is redirected away without
    // the form being processed.
    if current.is_some() {
        return Redirect::to("/");
    }

    let valid = match form.validate() {
        Ok(valid) => valid,
        Err(errors) => {
            flash_error(&session, &errors.join(", ")).await;
            return Redirect::to("/users/register");
        }
    };

    let password_hash = match auth::hash_password(&valid.password) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("password hashing failed: {}", e);
            flash_error(&session, "Registration failed. Please try again.").await;
            return Redirect::to("/users/register");
        }
    };

    let new_user = NewUser {
        username: valid.username,
        email: valid.email,
        password_hash,
    };

    match state.repo.create_user(new_user).await {
        Ok(_) => {
            flash_success(&session, "Registration successful! Please log in.").await;
            Redirect::to("/users/login")
        }
        Err(crate::repository::CreateUserError::Duplicate) => {
            flash_error(&session, "User with this email or username already exists").await;
            Redirect::to("/users/register")
        }
        Err(crate::repository::CreateUserError::Database) => {
            flash_error(&session, "Registration failed. Please try again.").await;
            Redirect::to("/users/register")
        }
    }
}

/// login_form
///
/// [Public Route] Login form page, with the same already-authenticated guard
/// as registration.
#[utoipa::path(
    get,
    path = "/users/login",
    responses(
        (status = 200, description = "Login form", body = StaticPage),
        (status = 303, description = "Already logged in; redirected home")
    )
)]
pub async fn login_form(ctx: PageContext) -> Result<Json<StaticPage>, Redirect> {
    if ctx.user.is_some() {
        return Err(Redirect::to("/"));
    }
    Ok(Json(StaticPage {
        title: "Clean Blog - Login".to_string(),
        user: None,
        flash: ctx.flash,
    }))
}

/// login
///
/// [Public Route] Authenticates by username-or-email plus password. An
/// unknown identifier and a wrong password produce the identical message, so
/// the two causes are indistinguishable to the caller. Success populates the
/// session with the user's id and username.
#[utoipa::path(
    post,
    path = "/users/login",
    responses(
        (status = 303, description = "Redirect home on success, back to the form otherwise")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    CurrentUser(current): CurrentUser,
    axum::Form(form): axum::Form<LoginForm>,
) -> Redirect {
    if current.is_some() {
        return Redirect::to("/");
    }

    let identifier = form.username.trim();
    if identifier.is_empty() || form.password.is_empty() {
        flash_error(&session, "Username and password are required").await;
        return Redirect::to("/users/login");
    }

    let user = state.repo.find_user_by_identifier(identifier).await;

    match user {
        Some(user) if auth::verify_password(&form.password, &user.password_hash) => {
            let stored = session.insert(SESSION_USER_ID_KEY, user.id).await;
            let stored_name = session.insert(SESSION_USERNAME_KEY, &user.username).await;
            if let Err(e) = stored.and(stored_name) {
                tracing::error!("failed to populate session: {:?}", e);
                flash_error(&session, "Login failed. Please try again.").await;
                return Redirect::to("/users/login");
            }
            flash_success(&session, "Login successful!").await;
            Redirect::to("/")
        }
        // Same message for "no such user" and "wrong password".
        _ => {
            flash_error(&session, "Invalid username or password").await;
            Redirect::to("/users/login")
        }
    }
}

/// logout
///
/// [Public Route] Destroys the session unconditionally, whatever its prior
/// state. A store error is logged, never surfaced: the caller always lands
/// back on the listing. Registered for both GET and POST.
#[utoipa::path(
    get,
    path = "/users/logout",
    responses((status = 303, description = "Redirect to the listing"))
)]
pub async fn logout(session: Session) -> Redirect {
    if let Err(e) = session.flush().await {
        tracing::error!("logout error: {:?}", e);
    }
    Redirect::to("/")
}

/// health
///
/// [Public Route] Liveness probe for monitoring and load balancer checks.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health() -> &'static str {
    "ok"
}
