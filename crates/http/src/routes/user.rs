//! User session lookup

use crate::{error::HttpError, state::AppState};
use axum::{
    extract::{Path, State},
    response::Json,
};
use larkauth_core::UserSession;
use tracing::instrument;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Profile and tokens of a signed-in user
#[utoipa::path(
    get,
    path = "/api/user/{user_id}",
    params(
        ("user_id" = String, Path, description = "User ID from the login redirect")
    ),
    responses(
        (status = 200, description = "User session", body = UserSession),
        (status = 404, description = "User or auth record not found"),
    ),
    tag = "users"
)]
#[instrument(name = "get_user", skip(app_state))]
pub async fn get_user(
    State(app_state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserSession>, HttpError> {
    let session = app_state.auth_service.session(&user_id).await?;
    Ok(Json(session))
}

pub fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(get_user))
}
