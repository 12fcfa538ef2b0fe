use std::collections::HashMap;

use crate::{
    error::{AppError, AppResult},
    models::{
        Comment, CommentList, CommentThread, CreateCommentRequest, NewComment, PageQuery,
        PageRequest, UpdateCommentRequest,
    },
    repository::{CommentRepositoryState, PostRepositoryState},
};

const DEFAULT_PAGE_SIZE: i64 = 20;

/// CommentService
///
/// Threads are two levels deep. A reply to a reply is attached to the
/// top-level comment of its thread.
#[derive(Clone)]
pub struct CommentService {
    comments: CommentRepositoryState,
    posts: PostRepositoryState,
}

impl CommentService {
    pub fn new(comments: CommentRepositoryState, posts: PostRepositoryState) -> Self {
        Self { comments, posts }
    }

    async fn ensure_post(&self, post_id: i64) -> AppResult<()> {
        match self.posts.find_post(post_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::not_found("post not found")),
        }
    }

    async fn load(&self, id: i64) -> AppResult<Comment> {
        self.comments
            .find_comment(id)
            .await?
            .ok_or_else(|| AppError::not_found("comment not found"))
    }

    pub async fn create_comment(
        &self,
        author_id: i64,
        req: CreateCommentRequest,
    ) -> AppResult<Comment> {
        if req.content.trim().is_empty() {
            return Err(AppError::invalid_input("content is required"));
        }
        self.ensure_post(req.post_id).await?;

        let parent_id = match req.parent_id.filter(|id| *id > 0) {
            Some(id) => {
                let parent = self
                    .comments
                    .find_comment(id)
                    .await?
                    .ok_or_else(|| AppError::invalid_input("parent comment not found"))?;
                if parent.post_id != req.post_id {
                    return Err(AppError::invalid_input(
                        "parent comment belongs to another post",
                    ));
                }
                Some(parent.parent_id.unwrap_or(parent.id))
            }
            None => None,
        };

        let comment = self
            .comments
            .create_comment(NewComment {
                user_id: author_id,
                post_id: req.post_id,
                parent_id,
                content: req.content,
            })
            .await?;
        Ok(self.comments.find_comment(comment.id).await?.unwrap_or(comment))
    }

    /// list_post_comments
    ///
    /// One page of top-level comments, newest first, each carrying all of its
    /// replies oldest first.
    pub async fn list_post_comments(&self, post_id: i64, query: PageQuery) -> AppResult<CommentList> {
        self.ensure_post(post_id).await?;
        let page = PageRequest::new(query.page, query.page_size, DEFAULT_PAGE_SIZE);

        let (top_level, total) = self.comments.list_top_level_comments(post_id, page).await?;
        let ids: Vec<i64> = top_level.iter().map(|c| c.id).collect();

        let mut replies_by_parent: HashMap<i64, Vec<Comment>> = HashMap::new();
        for reply in self.comments.list_replies(&ids).await? {
            if let Some(parent_id) = reply.parent_id {
                replies_by_parent.entry(parent_id).or_default().push(reply);
            }
        }

        let comments = top_level
            .into_iter()
            .map(|comment| CommentThread {
                replies: replies_by_parent.remove(&comment.id).unwrap_or_default(),
                comment,
            })
            .collect();

        Ok(CommentList {
            comments,
            meta: page.meta(total),
        })
    }

    pub async fn update_comment(
        &self,
        comment_id: i64,
        requester_id: i64,
        req: UpdateCommentRequest,
    ) -> AppResult<Comment> {
        if req.content.trim().is_empty() {
            return Err(AppError::invalid_input("content is required"));
        }
        let comment = self.load(comment_id).await?;
        if comment.user_id != requester_id {
            return Err(AppError::permission_denied("you can only edit your own comments"));
        }

        self.comments
            .update_comment(comment_id, &req.content)
            .await?
            .ok_or_else(|| AppError::not_found("comment not found"))?;
        self.load(comment_id).await
    }

    pub async fn delete_comment(
        &self,
        comment_id: i64,
        requester_id: i64,
        is_admin: bool,
    ) -> AppResult<()> {
        let comment = self.load(comment_id).await?;
        if comment.user_id != requester_id && !is_admin {
            return Err(AppError::permission_denied("you can only delete your own comments"));
        }
        if !self.comments.delete_comment(comment_id).await? {
            return Err(AppError::not_found("comment not found"));
        }
        Ok(())
    }
}
