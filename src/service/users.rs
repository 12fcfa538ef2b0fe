use crate::{
    error::{AppError, AppResult},
    models::{
        AuthResponse, ChangePasswordRequest, LoginRequest, NewUser, PageQuery, PageRequest,
        RegisterRequest, Role, UpdateProfileRequest, UserList, UserProfile, non_empty,
        validate_new_password,
    },
    password::{hash_password, verify_password},
    repository::UserRepositoryState,
    token::TokenService,
};

const LOGIN_FAILED: &str = "invalid username or password";

/// Argon2 is CPU-bound; keep it off the async workers.
async fn hash_off_thread(plaintext: String) -> AppResult<String> {
    let hash = tokio::task::spawn_blocking(move || hash_password(&plaintext)).await??;
    Ok(hash)
}

async fn verify_off_thread(plaintext: String, hash: String) -> AppResult<bool> {
    let matches = tokio::task::spawn_blocking(move || verify_password(&plaintext, &hash)).await?;
    Ok(matches)
}

/// UserService
///
/// Registration, login and account management.
#[derive(Clone)]
pub struct UserService {
    users: UserRepositoryState,
    tokens: TokenService,
}

impl UserService {
    pub fn new(users: UserRepositoryState, tokens: TokenService) -> Self {
        Self { users, tokens }
    }

    /// register
    ///
    /// Creates a `user`-role account and signs a token for it. A taken username
    /// or email is a `Conflict`; a race that slips past the lookups is caught
    /// by the unique index and surfaces the same way.
    pub async fn register(&self, req: RegisterRequest) -> AppResult<AuthResponse> {
        req.validate()?;
        let username = req.username.trim().to_string();
        let email = req.email.trim().to_string();

        if self.users.find_user_by_username(&username).await?.is_some() {
            return Err(AppError::conflict("username already exists"));
        }
        if self.users.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("email already exists"));
        }

        let password_hash = hash_off_thread(req.password).await?;
        let user = self
            .users
            .create_user(NewUser {
                username,
                email,
                password_hash,
                role: Role::User,
                bio: String::new(),
            })
            .await?;

        tracing::info!(user_id = user.id, username = %user.username, "user registered");

        let token = self.tokens.issue(user.id, user.role)?;
        Ok(AuthResponse {
            user: user.into(),
            token,
        })
    }

    /// login
    ///
    /// Unknown usernames and wrong passwords fail identically.
    pub async fn login(&self, req: LoginRequest) -> AppResult<AuthResponse> {
        let Some(user) = self.users.find_user_by_username(req.username.trim()).await? else {
            return Err(AppError::invalid_input(LOGIN_FAILED));
        };

        if !verify_off_thread(req.password, user.password_hash.clone()).await? {
            tracing::debug!(user_id = user.id, "login rejected: wrong password");
            return Err(AppError::invalid_input(LOGIN_FAILED));
        }

        let token = self.tokens.issue(user.id, user.role)?;
        Ok(AuthResponse {
            user: user.into(),
            token,
        })
    }

    pub async fn get_user(&self, id: i64) -> AppResult<UserProfile> {
        self.users
            .find_user(id)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| AppError::not_found("user not found"))
    }

    pub async fn list_users(&self, query: PageQuery) -> AppResult<UserList> {
        let page = PageRequest::new(query.page, query.page_size, 10);
        let (users, total) = self.users.list_users(page).await?;
        Ok(UserList {
            users: users.into_iter().map(UserProfile::from).collect(),
            meta: page.meta(total),
        })
    }

    pub async fn update_profile(
        &self,
        id: i64,
        req: UpdateProfileRequest,
    ) -> AppResult<UserProfile> {
        self.users
            .update_profile(id, non_empty(req.avatar), non_empty(req.bio))
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| AppError::not_found("user not found"))
    }

    /// change_password
    ///
    /// Requires the current password. Tokens issued before the change stay
    /// valid until they expire.
    pub async fn change_password(&self, id: i64, req: ChangePasswordRequest) -> AppResult<()> {
        validate_new_password(&req.new_password)?;

        let user = self
            .users
            .find_user(id)
            .await?
            .ok_or_else(|| AppError::not_found("user not found"))?;

        if !verify_off_thread(req.old_password, user.password_hash).await? {
            return Err(AppError::invalid_input("old password is incorrect"));
        }

        let new_hash = hash_off_thread(req.new_password).await?;
        if !self.users.update_password(id, &new_hash).await? {
            return Err(AppError::not_found("user not found"));
        }
        Ok(())
    }

    pub async fn update_role(&self, id: i64, role: Role) -> AppResult<UserProfile> {
        let user = self
            .users
            .update_role(id, role)
            .await?
            .ok_or_else(|| AppError::not_found("user not found"))?;
        tracing::info!(user_id = id, role = %role, "user role changed");
        Ok(user.into())
    }

    pub async fn delete_user(&self, id: i64) -> AppResult<()> {
        if !self.users.delete_user(id).await? {
            return Err(AppError::not_found("user not found"));
        }
        tracing::info!(user_id = id, "user deleted");
        Ok(())
    }
}
