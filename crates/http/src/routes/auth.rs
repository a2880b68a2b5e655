//! Lark OAuth endpoints

use crate::{error::HttpError, state::AppState};
use axum::{
    extract::{Query, State},
    response::{Json, Redirect},
};
use larkauth_core::{AuthTokens, RefreshTokenRequest};
use serde::Deserialize;
use tracing::instrument;
use utoipa::IntoParams;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Query string Lark appends to the callback URL
#[derive(Debug, Deserialize, IntoParams)]
pub struct CallbackParams {
    /// Authorization code issued by Lark
    pub code: Option<String>,
    /// Opaque state echoed back by Lark
    pub state: Option<String>,
}

/// Start a Lark login
#[utoipa::path(
    get,
    path = "/api/auth/user/lark/login",
    responses(
        (status = 307, description = "Redirect to the Lark consent page"),
        (status = 500, description = "Lark URL misconfigured"),
    ),
    tag = "authentication"
)]
pub async fn lark_login(State(app_state): State<AppState>) -> Result<Redirect, HttpError> {
    let url = app_state.auth_service.login_url()?;
    Ok(Redirect::temporary(url.as_str()))
}

/// Handle the redirect back from Lark
#[utoipa::path(
    get,
    path = "/api/auth/user/lark/callback",
    params(CallbackParams),
    responses(
        (status = 303, description = "Login completed, redirect to the success page"),
        (status = 400, description = "Missing code or incomplete profile"),
        (status = 401, description = "Lark rejected the code"),
        (status = 503, description = "Lark unreachable"),
    ),
    tag = "authentication"
)]
#[instrument(name = "lark_callback", skip_all, fields(has_state = params.state.is_some()))]
pub async fn lark_callback(
    State(app_state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect, HttpError> {
    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return Err(HttpError::BadRequest(
            "Missing authorization code".to_string(),
        ));
    };

    let session = app_state.auth_service.complete_login(&code).await?;
    Ok(Redirect::to(&app_state.success_redirect(&session.user.id)))
}

/// Refresh an access token
#[utoipa::path(
    post,
    path = "/api/auth/user/lark/refresh",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New tokens", body = AuthTokens),
        (status = 400, description = "Missing refresh token"),
        (status = 401, description = "Lark rejected the refresh token"),
        (status = 503, description = "Lark unreachable"),
    ),
    tag = "authentication"
)]
#[instrument(name = "refresh_token", skip_all)]
pub async fn refresh_token(
    State(app_state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<AuthTokens>, HttpError> {
    let tokens = app_state
        .auth_service
        .refresh(&request.refresh_token)
        .await?;
    Ok(Json(tokens))
}

pub fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(lark_login))
        .routes(routes!(lark_callback))
        .routes(routes!(refresh_token))
}
