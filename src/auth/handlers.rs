use axum::{
    extract::{FromRef, State},
    routing::post,
    Form, Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{error::ApiError, state::AppState};

use super::{
    claims::Role,
    dto::{LoginForm, LoginResponse},
    jwt::JwtKeys,
    password::{placeholder_hash, verify_password},
    repo::User,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

/// POST /auth/login. Exchanges an email/password form for a signed bearer
/// token. Unknown emails and wrong passwords are indistinguishable on the
/// wire.
#[instrument(skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = User::find_by_email(&state.db, &form.username).await?;

    let Some(user) = user else {
        // burn one verification so an unknown email costs the same as a
        // wrong password
        verify_password(&form.password, placeholder_hash());
        warn!(username = %form.username, "login attempt for unknown email");
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password(&form.password, &user.password_hash) {
        warn!(username = %form.username, user_id = user.id, "login with invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let role = Role::parse(&user.role).ok_or_else(|| {
        anyhow::anyhow!("user {} has unrecognized role {:?}", user.id, user.role)
    })?;

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.issue(&user.email, role)?;

    info!(user_id = user.id, email = %user.email, role = role.as_str(), "user logged in");
    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer",
        role,
    }))
}
