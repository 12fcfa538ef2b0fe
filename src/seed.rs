use crate::{
    config::SeedConfig,
    error::AppResult,
    models::{NewUser, Role},
    password::hash_password,
    repository::Repositories,
};

pub const DEFAULT_CATEGORIES: [(&str, &str); 5] = [
    ("General", "General discussion"),
    ("Tech", "Technology and programming"),
    ("Life", "Everyday life"),
    ("Hobbies", "Hobbies and interests"),
    ("Feedback", "Feedback and suggestions for the forum"),
];

/// seed_defaults
///
/// Idempotent startup seeding. Creates the configured admin account when no
/// admin exists and the default categories when the table is empty.
pub async fn seed_defaults(config: &SeedConfig, repos: &Repositories) -> AppResult<()> {
    if !config.enabled {
        tracing::debug!("seeding disabled");
        return Ok(());
    }

    if repos.users.count_admins().await? == 0 {
        let plaintext = config.admin_password.clone();
        let password_hash =
            tokio::task::spawn_blocking(move || hash_password(&plaintext)).await??;
        let admin = repos
            .users
            .create_user(NewUser {
                username: config.admin_username.clone(),
                email: config.admin_email.clone(),
                password_hash,
                role: Role::Admin,
                bio: "System administrator".to_string(),
            })
            .await?;
        tracing::info!(user_id = admin.id, username = %admin.username, "seeded admin account");
    }

    if repos.categories.count_categories().await? == 0 {
        for (name, description) in DEFAULT_CATEGORIES {
            repos.categories.create_category(name, description).await?;
        }
        tracing::info!(count = DEFAULT_CATEGORIES.len(), "seeded default categories");
    }

    Ok(())
}
