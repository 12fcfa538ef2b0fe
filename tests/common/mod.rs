#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::Utc;
use chitchat::{
    AppConfig, AppError, AppResult, AppState, Repositories, ViewCounter, create_router,
    models::{
        Category, Comment, NewComment, NewPost, NewUser, PageRequest, Post, PostChanges,
        PostFilter, PostOrder, Role, User,
    },
    repository::{CategoryRepository, CommentRepository, PostRepository, UserRepository},
};
use serde_json::Value;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-for-integration-tests";

// --- IN-MEMORY REPOSITORY ---

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: Vec<User>,
    categories: Vec<Category>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    views: Vec<i64>,
}

impl Tables {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn decorate_post(&self, mut post: Post) -> Post {
        post.author_name = self
            .users
            .iter()
            .find(|u| u.id == post.user_id)
            .map(|u| u.username.clone());
        post.category_name = post
            .category_id
            .and_then(|id| self.categories.iter().find(|c| c.id == id))
            .map(|c| c.name.clone());
        post
    }

    fn decorate_comment(&self, mut comment: Comment) -> Comment {
        comment.author_name = self
            .users
            .iter()
            .find(|u| u.id == comment.user_id)
            .map(|u| u.username.clone());
        comment
    }
}

/// Stand-in for Postgres. Deleted rows are removed outright, which reads the
/// same as a soft delete from the traits' point of view.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    fail_counter_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn repositories(self: &Arc<Self>) -> Repositories {
        Repositories {
            users: self.clone(),
            categories: self.clone(),
            posts: self.clone(),
            comments: self.clone(),
        }
    }

    pub fn fail_counter_writes(&self, fail: bool) {
        self.fail_counter_writes.store(fail, Ordering::SeqCst);
    }

    pub fn add_user(&self, username: &str, role: Role) -> User {
        let mut t = self.tables.lock().unwrap();
        let now = Utc::now();
        let user = User {
            id: t.id(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "not-a-real-hash".to_string(),
            avatar: String::new(),
            bio: String::new(),
            role,
            created_at: now,
            updated_at: now,
        };
        t.users.push(user.clone());
        user
    }

    pub fn add_category(&self, name: &str) -> Category {
        let mut t = self.tables.lock().unwrap();
        let now = Utc::now();
        let category = Category {
            id: t.id(),
            name: name.to_string(),
            description: String::new(),
            post_count: 0,
            created_at: now,
            updated_at: now,
        };
        t.categories.push(category.clone());
        category
    }

    /// Inserts a post without touching any counter.
    pub fn add_post(&self, user_id: i64, category_id: Option<i64>) -> Post {
        let mut t = self.tables.lock().unwrap();
        let now = Utc::now();
        let post = Post {
            id: t.id(),
            title: "seeded".to_string(),
            content: "seeded content".to_string(),
            user_id,
            category_id,
            created_at: now,
            updated_at: now,
            ..Post::default()
        };
        t.posts.push(post.clone());
        post
    }

    pub fn post_count(&self, category_id: i64) -> i64 {
        let t = self.tables.lock().unwrap();
        t.categories
            .iter()
            .find(|c| c.id == category_id)
            .map(|c| c.post_count)
            .expect("category exists")
    }

    pub fn set_post_count(&self, category_id: i64, count: i64) {
        let mut t = self.tables.lock().unwrap();
        if let Some(c) = t.categories.iter_mut().find(|c| c.id == category_id) {
            c.post_count = count;
        }
    }

    pub fn post(&self, id: i64) -> Option<Post> {
        let t = self.tables.lock().unwrap();
        t.posts.iter().find(|p| p.id == id).cloned()
    }

    pub fn post_total(&self) -> usize {
        self.tables.lock().unwrap().posts.len()
    }

    pub fn user(&self, id: i64) -> Option<User> {
        let t = self.tables.lock().unwrap();
        t.users.iter().find(|u| u.id == id).cloned()
    }

    fn counter_write(&self, id: i64, delta: i64) -> AppResult<()> {
        if self.fail_counter_writes.load(Ordering::SeqCst) {
            return Err(AppError::internal("counter write failed"));
        }
        let mut t = self.tables.lock().unwrap();
        if let Some(c) = t.categories.iter_mut().find(|c| c.id == id) {
            c.post_count = (c.post_count + delta).max(0);
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let mut t = self.tables.lock().unwrap();
        if t
            .users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(AppError::conflict("duplicate record"));
        }
        let now = Utc::now();
        let created = User {
            id: t.id(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            avatar: String::new(),
            bio: user.bio,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        t.users.push(created.clone());
        Ok(created)
    }

    async fn find_user(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.user(id))
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self, page: PageRequest) -> AppResult<(Vec<User>, i64)> {
        let t = self.tables.lock().unwrap();
        let users = t
            .users
            .iter()
            .skip(page.offset() as usize)
            .take(page.page_size as usize)
            .cloned()
            .collect();
        Ok((users, t.users.len() as i64))
    }

    async fn update_profile(
        &self,
        id: i64,
        avatar: Option<String>,
        bio: Option<String>,
    ) -> AppResult<Option<User>> {
        let mut t = self.tables.lock().unwrap();
        let Some(user) = t.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(avatar) = avatar {
            user.avatar = avatar;
        }
        if let Some(bio) = bio {
            user.bio = bio;
        }
        Ok(Some(user.clone()))
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> AppResult<bool> {
        let mut t = self.tables.lock().unwrap();
        match t.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_role(&self, id: i64, role: Role) -> AppResult<Option<User>> {
        let mut t = self.tables.lock().unwrap();
        Ok(t.users.iter_mut().find(|u| u.id == id).map(|user| {
            user.role = role;
            user.clone()
        }))
    }

    async fn delete_user(&self, id: i64) -> AppResult<bool> {
        let mut t = self.tables.lock().unwrap();
        let before = t.users.len();
        t.users.retain(|u| u.id != id);
        Ok(t.users.len() < before)
    }

    async fn count_admins(&self) -> AppResult<i64> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().filter(|u| u.role == Role::Admin).count() as i64)
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        Ok(self.tables.lock().unwrap().categories.clone())
    }

    async fn find_category(&self, id: i64) -> AppResult<Option<Category>> {
        let t = self.tables.lock().unwrap();
        Ok(t.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn create_category(&self, name: &str, description: &str) -> AppResult<Category> {
        let category = self.add_category(name);
        let mut t = self.tables.lock().unwrap();
        let stored = t
            .categories
            .iter_mut()
            .find(|c| c.id == category.id)
            .expect("just inserted");
        stored.description = description.to_string();
        Ok(stored.clone())
    }

    async fn update_category(
        &self,
        id: i64,
        name: Option<String>,
        description: Option<String>,
    ) -> AppResult<Option<Category>> {
        let mut t = self.tables.lock().unwrap();
        Ok(t.categories.iter_mut().find(|c| c.id == id).map(|c| {
            if let Some(name) = name {
                c.name = name;
            }
            if let Some(description) = description {
                c.description = description;
            }
            c.clone()
        }))
    }

    async fn delete_category(&self, id: i64) -> AppResult<bool> {
        let mut t = self.tables.lock().unwrap();
        let before = t.categories.len();
        t.categories.retain(|c| c.id != id);
        Ok(t.categories.len() < before)
    }

    async fn increment_post_count(&self, id: i64) -> AppResult<()> {
        self.counter_write(id, 1)
    }

    async fn decrement_post_count(&self, id: i64) -> AppResult<()> {
        self.counter_write(id, -1)
    }

    async fn count_categories(&self) -> AppResult<i64> {
        Ok(self.tables.lock().unwrap().categories.len() as i64)
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn create_post(&self, post: NewPost) -> AppResult<Post> {
        let mut t = self.tables.lock().unwrap();
        let now = Utc::now();
        let created = Post {
            id: t.id(),
            title: post.title,
            content: post.content,
            user_id: post.user_id,
            category_id: post.category_id,
            created_at: now,
            updated_at: now,
            ..Post::default()
        };
        t.posts.push(created.clone());
        Ok(created)
    }

    async fn find_post(&self, id: i64) -> AppResult<Option<Post>> {
        let t = self.tables.lock().unwrap();
        Ok(t
            .posts
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .map(|p| t.decorate_post(p)))
    }

    async fn list_posts(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<Post>, i64)> {
        let t = self.tables.lock().unwrap();
        let mut matching: Vec<Post> = t
            .posts
            .iter()
            .filter(|p| filter.category_id.is_none_or(|c| p.category_id == Some(c)))
            .filter(|p| filter.user_id.is_none_or(|u| p.user_id == u))
            .filter(|p| {
                filter
                    .keyword
                    .as_ref()
                    .is_none_or(|k| p.title.contains(k.as_str()) || p.content.contains(k.as_str()))
            })
            .cloned()
            .collect();

        // Insertion order stands in for created_at.
        matching.sort_by(|a, b| {
            b.is_pinned.cmp(&a.is_pinned).then_with(|| match filter.order {
                PostOrder::Latest => b.id.cmp(&a.id),
                PostOrder::Popular => b.like_count.cmp(&a.like_count).then(b.id.cmp(&a.id)),
            })
        });

        let total = matching.len() as i64;
        let posts = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.page_size as usize)
            .map(|p| t.decorate_post(p))
            .collect();
        Ok((posts, total))
    }

    async fn update_post(&self, id: i64, changes: PostChanges) -> AppResult<Option<Post>> {
        let mut t = self.tables.lock().unwrap();
        Ok(t.posts.iter_mut().find(|p| p.id == id).map(|p| {
            p.title = changes.title;
            p.content = changes.content;
            p.category_id = changes.category_id;
            p.updated_at = Utc::now();
            p.clone()
        }))
    }

    async fn delete_post(&self, id: i64) -> AppResult<bool> {
        let mut t = self.tables.lock().unwrap();
        let before = t.posts.len();
        t.posts.retain(|p| p.id != id);
        Ok(t.posts.len() < before)
    }

    async fn increment_view_count(&self, id: i64) -> AppResult<()> {
        let mut t = self.tables.lock().unwrap();
        t.views.push(id);
        if let Some(p) = t.posts.iter_mut().find(|p| p.id == id) {
            p.view_count += 1;
        }
        Ok(())
    }

    async fn set_pinned(&self, id: i64, pinned: bool) -> AppResult<Option<Post>> {
        let mut t = self.tables.lock().unwrap();
        Ok(t.posts.iter_mut().find(|p| p.id == id).map(|p| {
            p.is_pinned = pinned;
            p.clone()
        }))
    }

    async fn set_featured(&self, id: i64, featured: bool) -> AppResult<Option<Post>> {
        let mut t = self.tables.lock().unwrap();
        Ok(t.posts.iter_mut().find(|p| p.id == id).map(|p| {
            p.is_featured = featured;
            p.clone()
        }))
    }

    async fn featured_posts(&self, limit: i64) -> AppResult<Vec<Post>> {
        let t = self.tables.lock().unwrap();
        Ok(t
            .posts
            .iter()
            .rev()
            .filter(|p| p.is_featured)
            .take(limit as usize)
            .cloned()
            .map(|p| t.decorate_post(p))
            .collect())
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn create_comment(&self, comment: NewComment) -> AppResult<Comment> {
        let mut t = self.tables.lock().unwrap();
        let now = Utc::now();
        let created = Comment {
            id: t.id(),
            content: comment.content,
            user_id: comment.user_id,
            post_id: comment.post_id,
            parent_id: comment.parent_id,
            like_count: 0,
            created_at: now,
            updated_at: now,
            author_name: None,
        };
        t.comments.push(created.clone());
        Ok(created)
    }

    async fn find_comment(&self, id: i64) -> AppResult<Option<Comment>> {
        let t = self.tables.lock().unwrap();
        Ok(t
            .comments
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .map(|c| t.decorate_comment(c)))
    }

    async fn list_top_level_comments(
        &self,
        post_id: i64,
        page: PageRequest,
    ) -> AppResult<(Vec<Comment>, i64)> {
        let t = self.tables.lock().unwrap();
        let top: Vec<Comment> = t
            .comments
            .iter()
            .rev()
            .filter(|c| c.post_id == post_id && c.parent_id.is_none())
            .cloned()
            .collect();
        let total = top.len() as i64;
        let page_items = top
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.page_size as usize)
            .map(|c| t.decorate_comment(c))
            .collect();
        Ok((page_items, total))
    }

    async fn list_replies(&self, parent_ids: &[i64]) -> AppResult<Vec<Comment>> {
        let t = self.tables.lock().unwrap();
        Ok(t
            .comments
            .iter()
            .filter(|c| c.parent_id.is_some_and(|p| parent_ids.contains(&p)))
            .cloned()
            .map(|c| t.decorate_comment(c))
            .collect())
    }

    async fn update_comment(&self, id: i64, content: &str) -> AppResult<Option<Comment>> {
        let mut t = self.tables.lock().unwrap();
        Ok(t.comments.iter_mut().find(|c| c.id == id).map(|c| {
            c.content = content.to_string();
            c.clone()
        }))
    }

    async fn delete_comment(&self, id: i64) -> AppResult<bool> {
        let mut t = self.tables.lock().unwrap();
        let before = t.comments.len();
        t.comments.retain(|c| c.id != id);
        Ok(t.comments.len() < before)
    }
}

// --- APP SCAFFOLDING ---

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.jwt.secret = TEST_SECRET.to_string();
    config
}

pub struct TestApp {
    pub store: Arc<InMemoryStore>,
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    /// Router over an in-memory store with a live view worker. Needs a tokio
    /// runtime.
    pub fn new() -> Self {
        let store = InMemoryStore::new();
        let state = AppState::new(store.repositories(), test_config());
        Self::from_parts(store, state)
    }

    /// Router whose view queue is handed back undrained.
    pub fn with_view_queue(capacity: usize) -> (Self, tokio::sync::mpsc::Receiver<i64>) {
        let store = InMemoryStore::new();
        let (views, rx) = ViewCounter::channel(capacity);
        let state = AppState::with_views(store.repositories(), test_config(), views);
        (Self::from_parts(store, state), rx)
    }

    fn from_parts(store: Arc<InMemoryStore>, state: AppState) -> Self {
        let router = create_router(state.clone());
        Self {
            store,
            state,
            router,
        }
    }

    /// Adds a user directly to the store and signs a token for it.
    pub fn user_with_token(&self, username: &str, role: Role) -> (User, String) {
        let user = self.store.add_user(username, role);
        let token = self
            .state
            .tokens
            .issue(user.id, user.role)
            .expect("token issued");
        (user, token)
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let auth = token.map(|t| format!("Bearer {t}"));
        self.send_raw(method, uri, auth.as_deref(), body).await
    }

    /// Like `send`, but the `Authorization` header is passed through as is.
    pub async fn send_raw(
        &self,
        method: Method,
        uri: &str,
        authorization: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }
}
