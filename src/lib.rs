use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::{IntoResponse, Response},
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
pub mod ledger;
pub mod mailer;
pub mod models;
pub mod policy;
pub mod repository;
pub mod revocation;
pub mod storage;

// Route tables, split by the gate in front of them.
pub mod routes;
use auth::AuthUser;
use policy::{Permission, authorize};
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use mailer::{MailerState, MockMailer, SendGridMailer};
pub use repository::{PostgresRepository, RepositoryState};
pub use revocation::{InMemoryRevocationStore, PostgresRevocationStore, RevocationState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// OpenAPI document for every routed handler, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::home,
        handlers::identity::register_user, handlers::identity::sign_in,
        handlers::identity::logout, handlers::identity::admin_register,
        handlers::identity::admin_login,
        handlers::users::list_users, handlers::users::get_user, handlers::users::delete_user,
        handlers::users::update_user, handlers::users::get_me, handlers::users::change_password,
        handlers::users::liked_artworks, handlers::users::my_contacts,
        handlers::users::user_artworks,
        handlers::artworks::submit_artwork, handlers::artworks::get_artworks,
        handlers::artworks::delete_artwork, handlers::artworks::like_artwork,
        handlers::artworks::unlike_artwork,
        handlers::contacts::create_contact, handlers::contacts::list_contacts,
        handlers::contacts::list_contacts_by_email, handlers::contacts::get_contact,
        handlers::contacts::delete_contact,
    ),
    components(
        schemas(
            models::User, models::Admin, models::Artwork, models::ArtworkWithLikes,
            models::ArtworkLike, models::Contact, models::SignInRequest,
            models::AdminRegisterRequest, models::AdminLoginRequest,
            models::ChangePasswordRequest, models::CreateContactRequest,
            models::MessageResponse, models::SignInResponse, models::AdminLoginResponse,
            models::LikeResponse, models::SubmitArtworkResponse,
        )
    ),
    tags(
        (name = "gallery", description = "Art gallery API: accounts, artworks, likes and contact inbox")
    )
)]
struct ApiDoc;

/// AppState
///
/// The shared service container. Every collaborator sits behind a trait object so tests can
/// swap in the mock and in-memory implementations.
#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    pub storage: StorageState,
    pub mailer: MailerState,
    /// Revoked token ids, consulted by the `AuthUser` extractor on every protected request.
    pub revocations: RevocationState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for MailerState {
    fn from_ref(app_state: &AppState) -> MailerState {
        app_state.mailer.clone()
    }
}

impl FromRef<AppState> for RevocationState {
    fn from_ref(app_state: &AppState) -> RevocationState {
        app_state.revocations.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Rejects the request with 401 unless the `AuthUser` extractor resolves a valid, unrevoked
/// identity. The identity is stored in the request extensions so the handler's own
/// extractor does not decode the token a second time.
async fn auth_middleware(auth_user: AuthUser, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(auth_user);
    next.run(request).await
}

/// admin_middleware
///
/// Second gate for the admin router: `Permission::Admin` must hold.
async fn admin_middleware(auth_user: AuthUser, request: Request, next: Next) -> Response {
    if let Err(err) = authorize(&auth_user, Permission::Admin) {
        return err.into_response();
    }
    next.run(request).await
}

/// create_router
///
/// Public routes, token-gated routes and admin routes, plus Swagger UI, behind the
/// request-id and tracing layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        // Layers run outermost-last: authentication first, then the admin check.
        .merge(
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    admin_middleware,
                ))
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        )
        .with_state(state);

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
/// Request span carrying method, URI and the `x-request-id` set by `SetRequestIdLayer`.
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
    )
}
