use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod password;
pub mod repository;
pub mod response;
pub mod seed;
pub mod service;
pub mod token;
pub mod views;

// Routing segregated by access tier (public, authenticated, admin).
pub mod routes;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use repository::{PostgresRepository, Repositories};
pub use token::TokenService;
pub use views::ViewCounter;

use service::{CategoryService, CommentService, PostService, UserService};

/// ApiDoc
///
/// OpenAPI document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::ping, handlers::auth::register, handlers::auth::login,
        handlers::users::get_me, handlers::users::update_me, handlers::users::change_password,
        handlers::users::list_users, handlers::users::get_user, handlers::users::get_user_posts,
        handlers::users::update_user_role, handlers::users::delete_user,
        handlers::categories::list_categories, handlers::categories::get_category,
        handlers::categories::create_category, handlers::categories::update_category,
        handlers::categories::delete_category,
        handlers::posts::list_posts, handlers::posts::featured_posts, handlers::posts::get_post,
        handlers::posts::create_post, handlers::posts::update_post, handlers::posts::delete_post,
        handlers::posts::pin_post, handlers::posts::unpin_post, handlers::posts::feature_post,
        handlers::posts::unfeature_post,
        handlers::comments::list_post_comments, handlers::comments::create_comment,
        handlers::comments::update_comment, handlers::comments::delete_comment,
    ),
    components(
        schemas(
            models::Role, models::UserProfile, models::AuthResponse, models::Category,
            models::Post, models::Comment, models::CommentThread, models::PageMeta,
            models::PostList, models::UserList, models::CommentList, models::PostOrder,
            models::RegisterRequest, models::LoginRequest, models::UpdateProfileRequest,
            models::ChangePasswordRequest, models::UpdateRoleRequest,
            models::CreateCategoryRequest, models::UpdateCategoryRequest,
            models::CreatePostRequest, models::UpdatePostRequest,
            models::CreateCommentRequest, models::UpdateCommentRequest,
        )
    ),
    tags(
        (name = "chitchat", description = "Discussion forum API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, cloneable container shared by every request: the services,
/// the token signer, the view queue and the immutable configuration.
#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub categories: CategoryService,
    pub posts: PostService,
    pub comments: CommentService,
    pub tokens: TokenService,
    pub views: ViewCounter,
    pub config: AppConfig,
}

impl AppState {
    /// new
    ///
    /// Wires the services over `repos` and starts the view-count worker.
    /// Must be called inside a tokio runtime.
    pub fn new(repos: Repositories, config: AppConfig) -> Self {
        let views = ViewCounter::spawn(repos.posts.clone(), config.views.queue_capacity);
        Self::with_views(repos, config, views)
    }

    /// Same as [`AppState::new`] with a caller-supplied view queue.
    pub fn with_views(repos: Repositories, config: AppConfig, views: ViewCounter) -> Self {
        let tokens = TokenService::new(&config.jwt);
        Self {
            users: UserService::new(repos.users.clone(), tokens.clone()),
            categories: CategoryService::new(repos.categories.clone()),
            posts: PostService::new(repos.posts.clone(), repos.categories.clone()),
            comments: CommentService::new(repos.comments, repos.posts),
            tokens,
            views,
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for TokenService {
    fn from_ref(app_state: &AppState) -> TokenService {
        app_state.tokens.clone()
    }
}

async fn route_not_found() -> AppError {
    AppError::not_found("route not found")
}

/// create_router
///
/// Assembles the routing tree under `/api/v1`, applies the access layers per
/// group and wraps everything in the observability stack.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Access tiers. `route_layer` added last runs first, so the auth gate
    // attaches the principal before either role gate looks for it.
    let admin_group = admin::admin_routes()
        .route_layer(middleware::from_fn(auth::require_admin))
        .merge(
            admin::moderation_routes().route_layer(middleware::from_fn(auth::require_moderator)),
        );

    let protected = authenticated::authenticated_routes()
        .nest("/admin", admin_group)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_gate,
        ));

    let api = public::public_routes().merge(protected);

    // 3. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api/v1", api)
        .fallback(route_not_found)
        .with_state(state);

    // 4. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for one HTTP request, correlated by the generated `x-request-id`.
/// `user_id` is filled in by the auth gate once the caller is known.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
        user_id = tracing::field::Empty,
    )
}
