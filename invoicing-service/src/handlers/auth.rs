use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use service_core::error::AppError;

use crate::{
    dtos::auth::{AuthResponse, LoginRequest, RegisterRequest, UpdateProfileRequest},
    middleware::{CurrentUser, ACCESS_TOKEN_COOKIE},
    models::{normalize_email, User},
    services::metrics::record_auth_event,
    utils::{hash_password, verify_password, Password, ValidatedJson},
    AppState,
};

fn session_response(state: &AppState, user: &User) -> Result<(CookieJar, AuthResponse), AppError> {
    let token = state
        .jwt
        .generate_access_token(&user.id, &user.email)
        .map_err(AppError::InternalError)?;

    let cookie = Cookie::build((ACCESS_TOKEN_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    Ok((
        CookieJar::new().add(cookie),
        AuthResponse {
            token,
            expires_in: state.jwt.access_token_expiry_seconds(),
            user: user.sanitized(),
        },
    ))
}

pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = normalize_email(&req.email);
    let password = Password::new(req.password);
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::InternalError(anyhow::anyhow!(e)))??;

    let user = User::new(&email, password_hash, req.company_profile);
    state.users.insert_user(&user).await.map_err(|e| match e {
        AppError::Conflict(_) => AppError::Conflict(anyhow::anyhow!("User already exists")),
        other => other,
    })?;

    record_auth_event("register");
    tracing::info!(user_id = %user.id, "User registered");

    let (jar, body) = session_response(&state, &user)?;
    Ok((StatusCode::CREATED, jar, Json(body)))
}

pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let invalid = || AppError::Unauthorized(anyhow::anyhow!("Invalid email or password"));

    let Some(user) = state.users.find_by_email(&normalize_email(&req.email)).await? else {
        record_auth_event("login_failed");
        return Err(invalid());
    };

    let password = Password::new(req.password);
    let hash = user.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::InternalError(anyhow::anyhow!(e)))?;
    if verified.is_err() {
        record_auth_event("login_failed");
        tracing::info!(user_id = %user.id, "Login rejected");
        return Err(invalid());
    }

    record_auth_event("login");
    tracing::info!(user_id = %user.id, "User logged in");

    let (jar, body) = session_response(&state, &user)?;
    Ok((StatusCode::OK, jar, Json(body)))
}

/// Clear the session cookie. Works without a valid session so an expired
/// cookie can still be dropped.
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    record_auth_event("logout");
    let mut cookie = Cookie::build((ACCESS_TOKEN_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    cookie.make_removal();
    (StatusCode::NO_CONTENT, jar.add(cookie))
}

pub async fn me(current: CurrentUser) -> impl IntoResponse {
    Json(current.user.sanitized())
}

/// Replace the company profile. Existing invoices keep their snapshot.
pub async fn update_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .users
        .update_profile(current.id(), &req.company_profile)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    tracing::info!(user_id = %user.id, "Company profile updated");
    Ok(Json(user.sanitized()))
}
