use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{CategoryRepository, CommentRepository, PostRepository, UserRepository};
use crate::{
    error::AppResult,
    models::{
        Category, Comment, NewComment, NewPost, NewUser, PageRequest, Post, PostChanges,
        PostFilter, PostOrder, Role, User,
    },
};

const USER_COLUMNS: &str =
    "id, username, email, password_hash, avatar, bio, role, created_at, updated_at";

const CATEGORY_COLUMNS: &str = "id, name, description, post_count, created_at, updated_at";

const POST_COLUMNS: &str = "id, title, content, user_id, category_id, view_count, like_count, \
     is_pinned, is_featured, created_at, updated_at";

// Read path for posts: joins the author and category names.
const POST_SELECT: &str = r#"
    SELECT
        p.id, p.title, p.content, p.user_id, p.category_id, p.view_count, p.like_count,
        p.is_pinned, p.is_featured, p.created_at, p.updated_at,
        u.username AS author_name, c.name AS category_name
    FROM posts p
    LEFT JOIN users u ON u.id = p.user_id
    LEFT JOIN categories c ON c.id = p.category_id AND c.deleted_at IS NULL
    WHERE p.deleted_at IS NULL
"#;

const COMMENT_COLUMNS: &str =
    "id, content, user_id, post_id, parent_id, like_count, created_at, updated_at";

const COMMENT_SELECT: &str = r#"
    SELECT
        c.id, c.content, c.user_id, c.post_id, c.parent_id, c.like_count,
        c.created_at, c.updated_at, u.username AS author_name
    FROM comments c
    LEFT JOIN users u ON u.id = c.user_id
    WHERE c.deleted_at IS NULL
"#;

/// PostgresRepository
///
/// Implements every repository trait against one connection pool. Queries use
/// runtime binding so the crate builds without a live database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresRepository {
    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let sql = format!(
            "INSERT INTO users (username, email, password_hash, role, bio) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        );
        let created = sqlx::query_as::<_, User>(&sql)
            .bind(user.username)
            .bind(user.email)
            .bind(user.password_hash)
            .bind(user.role.as_str())
            .bind(user.bio)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn find_user(&self, id: i64) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1 AND deleted_at IS NULL"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let sql =
            format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND deleted_at IS NULL");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn list_users(&self, page: PageRequest) -> AppResult<(Vec<User>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE deleted_at IS NULL \
             ORDER BY id LIMIT $1 OFFSET $2"
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(page.page_size)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;
        Ok((users, total))
    }

    async fn update_profile(
        &self,
        id: i64,
        avatar: Option<String>,
        bio: Option<String>,
    ) -> AppResult<Option<User>> {
        let sql = format!(
            "UPDATE users SET avatar = COALESCE($2, avatar), bio = COALESCE($3, bio), \
             updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(avatar)
            .bind(bio)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_role(&self, id: i64, role: Role) -> AppResult<Option<User>> {
        let sql = format!(
            "UPDATE users SET role = $2, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(role.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn delete_user(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_admins(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE role = 'admin' AND deleted_at IS NULL",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

#[async_trait]
impl CategoryRepository for PostgresRepository {
    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let sql =
            format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE deleted_at IS NULL ORDER BY id");
        let categories = sqlx::query_as::<_, Category>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    async fn find_category(&self, id: i64) -> AppResult<Option<Category>> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1 AND deleted_at IS NULL"
        );
        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(category)
    }

    async fn create_category(&self, name: &str, description: &str) -> AppResult<Category> {
        let sql = format!(
            "INSERT INTO categories (name, description) VALUES ($1, $2) \
             RETURNING {CATEGORY_COLUMNS}"
        );
        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(name)
            .bind(description)
            .fetch_one(&self.pool)
            .await?;
        Ok(category)
    }

    async fn update_category(
        &self,
        id: i64,
        name: Option<String>,
        description: Option<String>,
    ) -> AppResult<Option<Category>> {
        let sql = format!(
            "UPDATE categories SET name = COALESCE($2, name), \
             description = COALESCE($3, description), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING {CATEGORY_COLUMNS}"
        );
        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .bind(name)
            .bind(description)
            .fetch_optional(&self.pool)
            .await?;
        Ok(category)
    }

    async fn delete_category(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE categories SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment_post_count(&self, id: i64) -> AppResult<()> {
        sqlx::query("UPDATE categories SET post_count = post_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// decrement_post_count
    ///
    /// Clamped in SQL so concurrent decrements can never push the counter
    /// negative.
    async fn decrement_post_count(&self, id: i64) -> AppResult<()> {
        sqlx::query("UPDATE categories SET post_count = GREATEST(post_count - 1, 0) WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn count_categories(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// push_post_filters
///
/// Appends the listing filter to a builder whose base query already ends in a
/// `WHERE` clause.
fn push_post_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &PostFilter) {
    if let Some(category_id) = filter.category_id {
        builder.push(" AND p.category_id = ");
        builder.push_bind(category_id);
    }
    if let Some(user_id) = filter.user_id {
        builder.push(" AND p.user_id = ");
        builder.push_bind(user_id);
    }
    if let Some(keyword) = &filter.keyword {
        let pattern = format!("%{keyword}%");
        builder.push(" AND (p.title ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR p.content ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
}

#[async_trait]
impl PostRepository for PostgresRepository {
    async fn create_post(&self, post: NewPost) -> AppResult<Post> {
        let sql = format!(
            "INSERT INTO posts (user_id, category_id, title, content) VALUES ($1, $2, $3, $4) \
             RETURNING {POST_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Post>(&sql)
            .bind(post.user_id)
            .bind(post.category_id)
            .bind(post.title)
            .bind(post.content)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn find_post(&self, id: i64) -> AppResult<Option<Post>> {
        let sql = format!("{POST_SELECT} AND p.id = $1");
        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn list_posts(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<Post>, i64)> {
        let mut count =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts p WHERE p.deleted_at IS NULL");
        push_post_filters(&mut count, filter);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut builder = QueryBuilder::<Postgres>::new(POST_SELECT);
        push_post_filters(&mut builder, filter);
        builder.push(match filter.order {
            PostOrder::Latest => " ORDER BY p.is_pinned DESC, p.created_at DESC",
            PostOrder::Popular => " ORDER BY p.is_pinned DESC, p.like_count DESC, p.created_at DESC",
        });
        builder.push(" LIMIT ");
        builder.push_bind(page.page_size);
        builder.push(" OFFSET ");
        builder.push_bind(page.offset());

        let posts = builder
            .build_query_as::<Post>()
            .fetch_all(&self.pool)
            .await?;
        Ok((posts, total))
    }

    async fn update_post(&self, id: i64, changes: PostChanges) -> AppResult<Option<Post>> {
        let sql = format!(
            "UPDATE posts SET title = $2, content = $3, category_id = $4, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING {POST_COLUMNS}"
        );
        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .bind(changes.title)
            .bind(changes.content)
            .bind(changes.category_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn delete_post(&self, id: i64) -> AppResult<bool> {
        let result =
            sqlx::query("UPDATE posts SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment_view_count(&self, id: i64) -> AppResult<()> {
        sqlx::query("UPDATE posts SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_pinned(&self, id: i64, pinned: bool) -> AppResult<Option<Post>> {
        let sql = format!(
            "UPDATE posts SET is_pinned = $2, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING {POST_COLUMNS}"
        );
        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .bind(pinned)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn set_featured(&self, id: i64, featured: bool) -> AppResult<Option<Post>> {
        let sql = format!(
            "UPDATE posts SET is_featured = $2, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING {POST_COLUMNS}"
        );
        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .bind(featured)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn featured_posts(&self, limit: i64) -> AppResult<Vec<Post>> {
        let sql = format!("{POST_SELECT} AND p.is_featured = true ORDER BY p.created_at DESC LIMIT $1");
        let posts = sqlx::query_as::<_, Post>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(posts)
    }
}

#[async_trait]
impl CommentRepository for PostgresRepository {
    async fn create_comment(&self, comment: NewComment) -> AppResult<Comment> {
        let sql = format!(
            "INSERT INTO comments (user_id, post_id, parent_id, content) VALUES ($1, $2, $3, $4) \
             RETURNING {COMMENT_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Comment>(&sql)
            .bind(comment.user_id)
            .bind(comment.post_id)
            .bind(comment.parent_id)
            .bind(comment.content)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn find_comment(&self, id: i64) -> AppResult<Option<Comment>> {
        let sql = format!("{COMMENT_SELECT} AND c.id = $1");
        let comment = sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(comment)
    }

    async fn list_top_level_comments(
        &self,
        post_id: i64,
        page: PageRequest,
    ) -> AppResult<(Vec<Comment>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM comments \
             WHERE post_id = $1 AND parent_id IS NULL AND deleted_at IS NULL",
        )
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            "{COMMENT_SELECT} AND c.post_id = $1 AND c.parent_id IS NULL \
             ORDER BY c.created_at DESC, c.id DESC LIMIT $2 OFFSET $3"
        );
        let comments = sqlx::query_as::<_, Comment>(&sql)
            .bind(post_id)
            .bind(page.page_size)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;
        Ok((comments, total))
    }

    async fn list_replies(&self, parent_ids: &[i64]) -> AppResult<Vec<Comment>> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "{COMMENT_SELECT} AND c.parent_id = ANY($1) ORDER BY c.created_at ASC, c.id ASC"
        );
        let replies = sqlx::query_as::<_, Comment>(&sql)
            .bind(parent_ids.to_vec())
            .fetch_all(&self.pool)
            .await?;
        Ok(replies)
    }

    async fn update_comment(&self, id: i64, content: &str) -> AppResult<Option<Comment>> {
        let sql = format!(
            "UPDATE comments SET content = $2, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING {COMMENT_COLUMNS}"
        );
        let comment = sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .bind(content)
            .fetch_optional(&self.pool)
            .await?;
        Ok(comment)
    }

    async fn delete_comment(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE comments SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
