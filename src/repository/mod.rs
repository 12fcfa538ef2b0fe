use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    error::AppResult,
    models::{
        Category, Comment, NewComment, NewPost, NewUser, PageRequest, Post, PostChanges,
        PostFilter, Role, User,
    },
};

mod postgres;

pub use postgres::PostgresRepository;

// Every read below ignores soft-deleted rows; every delete sets `deleted_at`.

/// UserRepository
///
/// Persistence contract for accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: NewUser) -> AppResult<User>;
    async fn find_user(&self, id: i64) -> AppResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;
    /// One page of users ordered by id, plus the total count.
    async fn list_users(&self, page: PageRequest) -> AppResult<(Vec<User>, i64)>;
    /// `None` leaves the column as it is.
    async fn update_profile(
        &self,
        id: i64,
        avatar: Option<String>,
        bio: Option<String>,
    ) -> AppResult<Option<User>>;
    async fn update_password(&self, id: i64, password_hash: &str) -> AppResult<bool>;
    async fn update_role(&self, id: i64, role: Role) -> AppResult<Option<User>>;
    async fn delete_user(&self, id: i64) -> AppResult<bool>;
    async fn count_admins(&self) -> AppResult<i64>;
}

/// CategoryRepository
///
/// The post counter is only touched through `increment_post_count` and
/// `decrement_post_count`, each a single atomic statement. The decrement never
/// takes the counter below zero.
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn list_categories(&self) -> AppResult<Vec<Category>>;
    async fn find_category(&self, id: i64) -> AppResult<Option<Category>>;
    async fn create_category(&self, name: &str, description: &str) -> AppResult<Category>;
    async fn update_category(
        &self,
        id: i64,
        name: Option<String>,
        description: Option<String>,
    ) -> AppResult<Option<Category>>;
    async fn delete_category(&self, id: i64) -> AppResult<bool>;
    async fn increment_post_count(&self, id: i64) -> AppResult<()>;
    async fn decrement_post_count(&self, id: i64) -> AppResult<()>;
    async fn count_categories(&self) -> AppResult<i64>;
}

/// PostRepository
///
/// Single-entity persistence for posts. Counter orchestration lives in the
/// post service, not here.
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create_post(&self, post: NewPost) -> AppResult<Post>;
    /// Includes the author's username and the category name.
    async fn find_post(&self, id: i64) -> AppResult<Option<Post>>;
    /// Pinned posts come first, then the requested order.
    async fn list_posts(&self, filter: &PostFilter, page: PageRequest)
    -> AppResult<(Vec<Post>, i64)>;
    async fn update_post(&self, id: i64, changes: PostChanges) -> AppResult<Option<Post>>;
    async fn delete_post(&self, id: i64) -> AppResult<bool>;
    async fn increment_view_count(&self, id: i64) -> AppResult<()>;
    async fn set_pinned(&self, id: i64, pinned: bool) -> AppResult<Option<Post>>;
    async fn set_featured(&self, id: i64, featured: bool) -> AppResult<Option<Post>>;
    async fn featured_posts(&self, limit: i64) -> AppResult<Vec<Post>>;
}

/// CommentRepository
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create_comment(&self, comment: NewComment) -> AppResult<Comment>;
    async fn find_comment(&self, id: i64) -> AppResult<Option<Comment>>;
    /// Top-level comments of a post, newest first, plus their total count.
    async fn list_top_level_comments(
        &self,
        post_id: i64,
        page: PageRequest,
    ) -> AppResult<(Vec<Comment>, i64)>;
    /// Replies to any of `parent_ids`, oldest first.
    async fn list_replies(&self, parent_ids: &[i64]) -> AppResult<Vec<Comment>>;
    async fn update_comment(&self, id: i64, content: &str) -> AppResult<Option<Comment>>;
    async fn delete_comment(&self, id: i64) -> AppResult<bool>;
}

pub type UserRepositoryState = Arc<dyn UserRepository>;
pub type CategoryRepositoryState = Arc<dyn CategoryRepository>;
pub type PostRepositoryState = Arc<dyn PostRepository>;
pub type CommentRepositoryState = Arc<dyn CommentRepository>;

/// Repositories
///
/// The bundle of storage handles the services are built from. Production
/// points all four at one Postgres pool; tests swap in memory stores.
#[derive(Clone)]
pub struct Repositories {
    pub users: UserRepositoryState,
    pub categories: CategoryRepositoryState,
    pub posts: PostRepositoryState,
    pub comments: CommentRepositoryState,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        let repo = Arc::new(PostgresRepository::new(pool));
        Self {
            users: repo.clone(),
            categories: repo.clone(),
            posts: repo.clone(),
            comments: repo,
        }
    }
}
