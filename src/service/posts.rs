use crate::{
    error::{AppError, AppResult},
    models::{
        CreatePostRequest, NewPost, PageQuery, PageRequest, Post, PostChanges, PostFilter,
        PostList, PostListQuery, UpdatePostRequest, non_empty, normalize_category,
    },
    repository::{CategoryRepositoryState, PostRepositoryState},
    service::FEATURED_LIMIT,
};

/// PostService
///
/// Owns the post lifecycle and keeps `categories.post_count` in step with it.
///
/// The post write and the counter writes are separate statements with no
/// transaction around them. If a counter write fails after the post write
/// succeeded, the caller gets `Internal` and the counter is left one off;
/// nothing reconciles it later.
#[derive(Clone)]
pub struct PostService {
    posts: PostRepositoryState,
    categories: CategoryRepositoryState,
}

impl PostService {
    pub fn new(posts: PostRepositoryState, categories: CategoryRepositoryState) -> Self {
        Self { posts, categories }
    }

    async fn ensure_category(&self, id: i64) -> AppResult<()> {
        match self.categories.find_category(id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::not_found("category not found")),
        }
    }

    async fn load(&self, id: i64) -> AppResult<Post> {
        self.posts
            .find_post(id)
            .await?
            .ok_or_else(|| AppError::not_found("post not found"))
    }

    /// create_post
    ///
    /// Checks the category, inserts the post, then bumps the category counter.
    pub async fn create_post(&self, author_id: i64, req: CreatePostRequest) -> AppResult<Post> {
        req.validate()?;
        let category_id = normalize_category(req.category_id);
        if let Some(id) = category_id {
            self.ensure_category(id).await?;
        }

        let post = self
            .posts
            .create_post(NewPost {
                user_id: author_id,
                category_id,
                title: req.title.trim().to_string(),
                content: req.content,
            })
            .await?;

        if let Some(id) = category_id {
            if let Err(e) = self.categories.increment_post_count(id).await {
                tracing::error!(post_id = post.id, category_id = id, "post created but counter increment failed");
                return Err(e);
            }
        }

        tracing::info!(post_id = post.id, user_id = author_id, "post created");
        Ok(self.posts.find_post(post.id).await?.unwrap_or(post))
    }

    pub async fn get_post(&self, id: i64) -> AppResult<Post> {
        self.load(id).await
    }

    pub async fn list_posts(&self, query: PostListQuery) -> AppResult<PostList> {
        let page = PageRequest::new(query.page, query.page_size, 10);
        let filter = PostFilter {
            category_id: normalize_category(query.category_id),
            user_id: None,
            keyword: non_empty(query.keyword).map(|k| k.trim().to_string()),
            order: query.order_by.unwrap_or_default(),
        };
        let (posts, total) = self.posts.list_posts(&filter, page).await?;
        Ok(PostList {
            posts,
            meta: page.meta(total),
        })
    }

    pub async fn user_posts(&self, user_id: i64, query: PageQuery) -> AppResult<PostList> {
        let page = PageRequest::new(query.page, query.page_size, 10);
        let filter = PostFilter {
            user_id: Some(user_id),
            ..PostFilter::default()
        };
        let (posts, total) = self.posts.list_posts(&filter, page).await?;
        Ok(PostList {
            posts,
            meta: page.meta(total),
        })
    }

    pub async fn featured_posts(&self) -> AppResult<Vec<Post>> {
        self.posts.featured_posts(FEATURED_LIMIT).await
    }

    /// update_post
    ///
    /// Owner only, whatever the requester's role. A positive `category_id`
    /// different from the current one moves the post: the row is written
    /// first, then the old category is decremented and the new one
    /// incremented.
    pub async fn update_post(
        &self,
        post_id: i64,
        requester_id: i64,
        req: UpdatePostRequest,
    ) -> AppResult<Post> {
        let post = self.load(post_id).await?;
        if post.user_id != requester_id {
            return Err(AppError::permission_denied("you can only edit your own posts"));
        }

        let old_category = post.category_id;
        let target = normalize_category(req.category_id).filter(|id| Some(*id) != old_category);
        if let Some(id) = target {
            self.ensure_category(id).await?;
        }

        let changes = PostChanges {
            title: non_empty(req.title)
                .map(|t| t.trim().to_string())
                .unwrap_or(post.title),
            content: non_empty(req.content).unwrap_or(post.content),
            category_id: target.or(old_category),
        };
        if changes.title.chars().count() > 255 {
            return Err(AppError::invalid_input("title must be at most 255 characters"));
        }

        self.posts
            .update_post(post_id, changes)
            .await?
            .ok_or_else(|| AppError::not_found("post not found"))?;

        if let Some(new_id) = target {
            if let Some(old_id) = old_category {
                self.categories.decrement_post_count(old_id).await?;
            }
            self.categories.increment_post_count(new_id).await?;
            tracing::info!(post_id, from = ?old_category, to = new_id, "post moved");
        }

        self.load(post_id).await
    }

    /// delete_post
    ///
    /// The owner or an admin may delete. Moderators get no extra rights here.
    /// The category counter is decremented after the soft delete.
    pub async fn delete_post(&self, post_id: i64, requester_id: i64, is_admin: bool) -> AppResult<()> {
        let post = self.load(post_id).await?;
        if post.user_id != requester_id && !is_admin {
            return Err(AppError::permission_denied("you can only delete your own posts"));
        }

        if !self.posts.delete_post(post_id).await? {
            return Err(AppError::not_found("post not found"));
        }
        if let Some(category_id) = post.category_id {
            self.categories.decrement_post_count(category_id).await?;
        }

        tracing::info!(post_id, user_id = requester_id, "post deleted");
        Ok(())
    }

    pub async fn set_pinned(&self, post_id: i64, pinned: bool) -> AppResult<Post> {
        self.posts
            .set_pinned(post_id, pinned)
            .await?
            .ok_or_else(|| AppError::not_found("post not found"))?;
        self.load(post_id).await
    }

    pub async fn set_featured(&self, post_id: i64, featured: bool) -> AppResult<Post> {
        self.posts
            .set_featured(post_id, featured)
            .await?
            .ok_or_else(|| AppError::not_found("post not found"))?;
        self.load(post_id).await
    }
}
