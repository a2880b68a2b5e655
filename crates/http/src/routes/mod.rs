//! API route definitions
use crate::state::AppState;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

pub mod auth;
pub mod health;
pub mod user;

#[derive(OpenApi)]
#[openapi(
    info(title = "Larkauth", description = "Lark sign-in backend"),
    tags(
        (name = "authentication", description = "Lark OAuth login, callback and token refresh"),
        (name = "users", description = "Signed-in user sessions"),
        (name = "health", description = "Liveness probe"),
    ),
)]
struct ApiDoc;

/// All backend routes with their OpenAPI description
pub fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(auth::router())
        .merge(user::router())
        .merge(health::router())
}
