use axum::{extract::State, Json};
use serde::{Deserialize, Deserializer, Serialize};

use crate::app::articles::{ArticleService, NewArticle};
use crate::app::auth::{AuthService, LoginOutcome};
use crate::app::engagement::{DeleteCommentOutcome, EngagementService};
use crate::app::posts::PostService;
use crate::app::users::{ProfileUpdate, UserService};
use crate::domain::article::{Article, ArticlePreview, CATEGORIES};
use crate::domain::engagement::{Comment, CommentThread, UserComment};
use crate::domain::post::Post;
use crate::domain::user::{User, UserProfile};
use crate::http::extract::{AppJson, AppPath, AppQuery};
use crate::http::form::FormData;
use crate::http::AppError;
use crate::infra::db::unique_violation;
use crate::AppState;

const MAX_COMMENT_LEN: usize = 500;
const MAX_SUMMARY_LEN: usize = 500;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Caller identity, passed as `?userId=`.
#[derive(Deserialize)]
pub struct ViewerQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<i64>,
}

impl ViewerQuery {
    fn require(&self) -> Result<i64, AppError> {
        self.user_id
            .ok_or_else(|| AppError::bad_request("userId is required"))
    }
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.db.ping().await.is_ok() {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse { status })
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<Json<UserProfile>, AppError> {
    let (Some(username), Some(email), Some(password)) =
        (non_blank(payload.username), non_blank(payload.email), payload.password)
    else {
        return Err(AppError::bad_request("all fields are required"));
    };
    if password.is_empty() {
        return Err(AppError::bad_request("all fields are required"));
    }

    let users = UserService::new(state.db.clone());
    let username_taken = users.username_exists(&username).await.map_err(|err| {
        tracing::error!(error = ?err, "failed to check username");
        AppError::internal("failed to register")
    })?;
    if username_taken {
        return Err(AppError::bad_request("username already exists"));
    }
    let email_taken = users.email_exists(&email).await.map_err(|err| {
        tracing::error!(error = ?err, "failed to check email");
        AppError::internal("failed to register")
    })?;
    if email_taken {
        return Err(AppError::bad_request("email already registered"));
    }

    let service = AuthService::new(state.db.clone());
    let user = service
        .register(&username, &email, &password)
        .await
        .map_err(|err| {
            if let Some(constraint) = unique_violation(&err) {
                if constraint.contains("users_username_key") {
                    return AppError::bad_request("username already exists");
                }
                if constraint.contains("users_email_key") {
                    return AppError::bad_request("email already registered");
                }
            }
            tracing::error!(error = ?err, "failed to register user");
            AppError::internal("failed to register")
        })?;

    tracing::info!(user_id = user.id, "account created");

    Ok(Json(UserProfile {
        user,
        post_count: 0,
    }))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<UserProfile>, AppError> {
    let (Some(username), Some(password)) = (non_blank(payload.username), payload.password) else {
        return Err(AppError::bad_request("username and password are required"));
    };

    let service = AuthService::new(state.db.clone());
    let outcome = service.login(&username, &password).await.map_err(|err| {
        tracing::error!(error = ?err, "failed to login");
        AppError::internal("failed to login")
    })?;

    let user = match outcome {
        LoginOutcome::Success(user) => user,
        LoginOutcome::UnknownUser => return Err(AppError::bad_request("user not found")),
        LoginOutcome::WrongPassword => return Err(AppError::bad_request("incorrect password")),
    };

    Ok(Json(fetch_profile(&state, user.id).await?))
}

pub async fn get_user(
    AppPath(id): AppPath<i64>,
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, AppError> {
    Ok(Json(fetch_profile(&state, id).await?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default, deserialize_with = "present")]
    pub display_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub bio: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub occupation: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub avatar: Option<Option<String>>,
}

pub async fn update_user(
    AppPath(id): AppPath<i64>,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> Result<Json<UserProfile>, AppError> {
    let update = ProfileUpdate {
        display_name: payload.display_name,
        bio: payload.bio,
        location: payload.location,
        occupation: payload.occupation,
        avatar: payload.avatar,
    };

    let service = UserService::new(state.db.clone());
    let updated = service.update_profile(id, update).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = id, "failed to update profile");
        AppError::internal("failed to update profile")
    })?;
    if !updated {
        return Err(AppError::not_found("user not found"));
    }

    Ok(Json(fetch_profile(&state, id).await?))
}

pub async fn upload_avatar(
    AppPath(id): AppPath<i64>,
    State(state): State<AppState>,
    form: FormData,
) -> Result<Json<UserProfile>, AppError> {
    fetch_user(&state, id)
        .await?
        .ok_or_else(|| AppError::not_found("user not found"))?;

    let avatar = form
        .file("avatar")
        .ok_or_else(|| AppError::bad_request("no image was sent"))?;

    let url = state
        .storage
        .save(&format!("avatar_{}_", id), avatar.file_name.as_deref(), &avatar.bytes)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = id, "failed to store avatar");
            AppError::internal("failed to save image")
        })?;

    let service = UserService::new(state.db.clone());
    service.set_avatar(id, &url).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = id, "failed to set avatar");
        AppError::internal("failed to save image")
    })?;

    Ok(Json(fetch_profile(&state, id).await?))
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

pub async fn list_posts(
    State(state): State<AppState>,
    AppQuery(viewer): AppQuery<ViewerQuery>,
) -> Result<Json<Vec<Post>>, AppError> {
    let service = PostService::new(state.db.clone());
    let posts = service.list_posts(viewer.user_id).await.map_err(|err| {
        tracing::error!(error = ?err, "failed to list posts");
        AppError::internal("failed to list posts")
    })?;

    Ok(Json(posts))
}

pub async fn list_author_posts(
    AppPath(author_id): AppPath<i64>,
    State(state): State<AppState>,
    AppQuery(viewer): AppQuery<ViewerQuery>,
) -> Result<Json<Vec<Post>>, AppError> {
    let service = PostService::new(state.db.clone());
    let posts = service
        .list_by_author(author_id, viewer.user_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, author_id, "failed to list author posts");
            AppError::internal("failed to list posts")
        })?;

    Ok(Json(posts))
}

pub async fn create_post(
    State(state): State<AppState>,
    form: FormData,
) -> Result<Json<Post>, AppError> {
    let title = form.required("title")?;
    let content = form.required("content")?;
    let user_id = form.optional_i64("userId")?;

    let img = match form.file("image") {
        Some(image) => Some(
            state
                .storage
                .save("", image.file_name.as_deref(), &image.bytes)
                .await
                .map_err(|err| {
                    tracing::error!(error = ?err, "failed to store post image");
                    AppError::internal("failed to save image")
                })?,
        ),
        None => None,
    };

    // Unknown authors are dropped rather than rejected.
    let author_id = match user_id {
        Some(user_id) => fetch_user(&state, user_id).await?.map(|user| user.id),
        None => None,
    };

    let service = PostService::new(state.db.clone());
    let post_id = service
        .create_post(title, content, img, author_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, author_id = ?author_id, "failed to create post");
            AppError::internal("failed to create post")
        })?;

    Ok(Json(fetch_post(&state, post_id, user_id).await?))
}

pub async fn toggle_like(
    AppPath(post_id): AppPath<i64>,
    State(state): State<AppState>,
    AppQuery(viewer): AppQuery<ViewerQuery>,
) -> Result<Json<Post>, AppError> {
    let user_id = viewer.require()?;
    fetch_user(&state, user_id)
        .await?
        .ok_or_else(|| AppError::bad_request("user not found"))?;

    let service = EngagementService::new(state.db.clone());
    let liked = service
        .toggle_like(user_id, post_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id, post_id, "failed to toggle like");
            AppError::internal("failed to toggle like")
        })?
        .ok_or_else(|| AppError::not_found("post not found"))?;

    tracing::debug!(user_id, post_id, liked, "like toggled");

    Ok(Json(fetch_post(&state, post_id, Some(user_id)).await?))
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

pub async fn list_comments(
    AppPath(post_id): AppPath<i64>,
    State(state): State<AppState>,
) -> Result<Json<Vec<CommentThread>>, AppError> {
    ensure_post_exists(&state, post_id).await?;

    let service = EngagementService::new(state.db.clone());
    let threads = service.list_comments(post_id).await.map_err(|err| {
        tracing::error!(error = ?err, post_id, "failed to list comments");
        AppError::internal("failed to list comments")
    })?;

    Ok(Json(threads))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub user_id: Option<i64>,
    pub content: Option<String>,
    pub parent_id: Option<i64>,
}

pub async fn create_comment(
    AppPath(post_id): AppPath<i64>,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCommentRequest>,
) -> Result<Json<Comment>, AppError> {
    ensure_post_exists(&state, post_id).await?;

    let content = payload.content.as_deref().map(str::trim).unwrap_or_default();
    if content.is_empty() {
        return Err(AppError::bad_request("comment cannot be empty"));
    }
    if content.chars().count() > MAX_COMMENT_LEN {
        return Err(AppError::bad_request("comment must be at most 500 characters"));
    }

    let user_id = payload
        .user_id
        .ok_or_else(|| AppError::bad_request("userId is required"))?;
    fetch_user(&state, user_id)
        .await?
        .ok_or_else(|| AppError::bad_request("user not found"))?;

    let service = EngagementService::new(state.db.clone());
    let parent_id = match payload.parent_id {
        Some(parent_id) => {
            let parent = service
                .find_comment(parent_id)
                .await
                .map_err(|err| {
                    tracing::error!(error = ?err, parent_id, "failed to load parent comment");
                    AppError::internal("failed to create comment")
                })?
                .filter(|parent| parent.post_id == post_id)
                .ok_or_else(|| AppError::bad_request("parent comment not found"))?;
            Some(parent.thread_root())
        }
        None => None,
    };

    let comment = service
        .create_comment(post_id, user_id, content.to_string(), parent_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id, post_id, "failed to create comment");
            AppError::internal("failed to create comment")
        })?;

    Ok(Json(comment))
}

pub async fn delete_comment(
    AppPath((post_id, comment_id)): AppPath<(i64, i64)>,
    State(state): State<AppState>,
    AppQuery(viewer): AppQuery<ViewerQuery>,
) -> Result<Json<MessageResponse>, AppError> {
    let user_id = viewer.require()?;

    let service = EngagementService::new(state.db.clone());
    let outcome = service
        .delete_comment(post_id, comment_id, user_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, comment_id, user_id, "failed to delete comment");
            AppError::internal("failed to delete comment")
        })?;

    match outcome {
        DeleteCommentOutcome::Deleted(removed) => {
            tracing::info!(post_id, comment_id, removed, "comment deleted");
            Ok(Json(MessageResponse {
                message: "comment deleted",
            }))
        }
        DeleteCommentOutcome::NotFound => Err(AppError::not_found("comment not found")),
        DeleteCommentOutcome::Forbidden => {
            Err(AppError::forbidden("you cannot delete this comment"))
        }
    }
}

// ---------------------------------------------------------------------------
// Articles
// ---------------------------------------------------------------------------

pub async fn list_articles(
    State(state): State<AppState>,
) -> Result<Json<Vec<ArticlePreview>>, AppError> {
    let service = ArticleService::new(state.db.clone());
    let articles = service.list_published().await.map_err(|err| {
        tracing::error!(error = ?err, "failed to list articles");
        AppError::internal("failed to list articles")
    })?;

    Ok(Json(articles))
}

pub async fn list_articles_by_category(
    AppPath(category): AppPath<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<ArticlePreview>>, AppError> {
    let service = ArticleService::new(state.db.clone());
    let articles = service.list_by_category(&category).await.map_err(|err| {
        tracing::error!(error = ?err, category = %category, "failed to list articles");
        AppError::internal("failed to list articles")
    })?;

    Ok(Json(articles))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

pub async fn search_articles(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SearchQuery>,
) -> Result<Json<Vec<ArticlePreview>>, AppError> {
    let q = non_blank(query.q).ok_or_else(|| AppError::bad_request("q is required"))?;

    let service = ArticleService::new(state.db.clone());
    let articles = service.search_titles(&q).await.map_err(|err| {
        tracing::error!(error = ?err, "failed to search articles");
        AppError::internal("failed to search articles")
    })?;

    Ok(Json(articles))
}

pub async fn get_article(
    AppPath(id): AppPath<i64>,
    State(state): State<AppState>,
) -> Result<Json<Article>, AppError> {
    let service = ArticleService::new(state.db.clone());
    let article = service.get_article(id).await.map_err(|err| {
        tracing::error!(error = ?err, article_id = id, "failed to fetch article");
        AppError::internal("failed to fetch article")
    })?;

    match article {
        Some(article) => Ok(Json(article)),
        None => Err(AppError::not_found("article not found")),
    }
}

pub async fn create_article(
    State(state): State<AppState>,
    form: FormData,
) -> Result<Json<Article>, AppError> {
    let title = form.required("title")?;
    let summary = form.required("summary")?;
    let content = form.required("content")?;
    let category = form.required("category")?;
    let user_id = form
        .optional_i64("userId")?
        .ok_or_else(|| AppError::bad_request("userId is required"))?;
    let published = form.optional_bool("published")?.unwrap_or(true);

    let author = fetch_user(&state, user_id)
        .await?
        .ok_or_else(|| AppError::bad_request("user not found"))?;
    if !author.is_admin() {
        return Err(AppError::forbidden("only administrators can create articles"));
    }

    if summary.chars().count() > MAX_SUMMARY_LEN {
        return Err(AppError::bad_request("summary must be at most 500 characters"));
    }

    let cover_image = match form.file("coverImage") {
        Some(cover) => Some(
            state
                .storage
                .save("article_", cover.file_name.as_deref(), &cover.bytes)
                .await
                .map_err(|err| {
                    tracing::error!(error = ?err, "failed to store article cover");
                    AppError::internal("failed to upload image")
                })?,
        ),
        None => None,
    };

    let service = ArticleService::new(state.db.clone());
    let article = service
        .create_article(NewArticle {
            title,
            summary,
            content,
            category,
            cover_image,
            published,
            author_id: author.id,
        })
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id, "failed to create article");
            AppError::internal("failed to create article")
        })?;

    tracing::info!(article_id = article.preview.id, author_id = author.id, "article created");

    Ok(Json(article))
}

pub async fn delete_article(
    AppPath(id): AppPath<i64>,
    State(state): State<AppState>,
    AppQuery(viewer): AppQuery<ViewerQuery>,
) -> Result<Json<MessageResponse>, AppError> {
    let user_id = viewer.require()?;
    let is_admin = fetch_user(&state, user_id)
        .await?
        .map(|user| user.is_admin())
        .unwrap_or(false);
    if !is_admin {
        return Err(AppError::forbidden("not authorized"));
    }

    let service = ArticleService::new(state.db.clone());
    let deleted = service.delete_article(id).await.map_err(|err| {
        tracing::error!(error = ?err, article_id = id, "failed to delete article");
        AppError::internal("failed to delete article")
    })?;

    if deleted {
        tracing::info!(article_id = id, user_id, "article deleted");
        Ok(Json(MessageResponse {
            message: "article deleted",
        }))
    } else {
        Err(AppError::not_found("article not found"))
    }
}

pub async fn article_categories() -> Json<Vec<&'static str>> {
    Json(CATEGORIES.to_vec())
}

// ---------------------------------------------------------------------------
// User activity
// ---------------------------------------------------------------------------

pub async fn liked_posts(
    AppPath(user_id): AppPath<i64>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Post>>, AppError> {
    let service = EngagementService::new(state.db.clone());
    let posts = service.liked_posts(user_id).await.map_err(|err| {
        tracing::error!(error = ?err, user_id, "failed to list liked posts");
        AppError::internal("failed to list liked posts")
    })?;

    Ok(Json(posts))
}

pub async fn user_comments(
    AppPath(user_id): AppPath<i64>,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserComment>>, AppError> {
    let service = EngagementService::new(state.db.clone());
    let comments = service.user_comments(user_id).await.map_err(|err| {
        tracing::error!(error = ?err, user_id, "failed to list user comments");
        AppError::internal("failed to list comments")
    })?;

    Ok(Json(comments))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn fetch_user(state: &AppState, user_id: i64) -> Result<Option<User>, AppError> {
    UserService::new(state.db.clone())
        .get_user(user_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id, "failed to fetch user");
            AppError::internal("failed to fetch user")
        })
}

async fn fetch_profile(state: &AppState, user_id: i64) -> Result<UserProfile, AppError> {
    UserService::new(state.db.clone())
        .get_profile(user_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id, "failed to fetch profile");
            AppError::internal("failed to fetch user")
        })?
        .ok_or_else(|| AppError::not_found("user not found"))
}

async fn fetch_post(state: &AppState, post_id: i64, viewer_id: Option<i64>) -> Result<Post, AppError> {
    PostService::new(state.db.clone())
        .get_post(post_id, viewer_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, post_id, "failed to fetch post");
            AppError::internal("failed to fetch post")
        })?
        .ok_or_else(|| AppError::not_found("post not found"))
}

async fn ensure_post_exists(state: &AppState, post_id: i64) -> Result<(), AppError> {
    let exists = PostService::new(state.db.clone())
        .post_exists(post_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, post_id, "failed to fetch post");
            AppError::internal("failed to fetch post")
        })?;

    if exists {
        Ok(())
    } else {
        Err(AppError::not_found("post not found"))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Distinguishes a field sent as `null` from one left out entirely.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
