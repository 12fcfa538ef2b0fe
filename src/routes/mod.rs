/// Router Module Index
///
/// Routes are grouped by who may call them. Access control is applied as a
/// layer on each group in `create_router`, never inside the handlers.

/// Anonymous, read-only routes plus registration and login.
pub mod public;

/// Routes behind the auth gate. Handlers receive a verified `Principal`.
pub mod authenticated;

/// The `/admin` group: admin-only management plus the moderation routes
/// open to moderators.
pub mod admin;
