//! Business rules sitting between the handlers and the repositories:
//! validation, ownership and role policy, and the category counter
//! bookkeeping that spans more than one table.

pub mod categories;
pub mod comments;
pub mod posts;
pub mod users;

pub use categories::CategoryService;
pub use comments::CommentService;
pub use posts::PostService;
pub use users::UserService;

/// Number of posts returned by the featured listing.
pub const FEATURED_LIMIT: i64 = 10;
