use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RefreshRequest, RegisterRequest},
        jwt::{AuthUser, JwtKeys},
        password::{hash_password, verify_password},
        repo::{CreateUser, User},
    },
    error::AppError,
    extract::ApiJson,
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 8;
const MAX_NAME_LEN: usize = 255;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/profile", get(profile))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn validate_registration(payload: &mut RegisterRequest) -> Result<(), AppError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.name = payload.name.trim().to_string();

    if payload.name.is_empty() {
        return Err(AppError::bad_request("Name is required"));
    }
    if payload.name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::bad_request("Name too long"));
    }
    if !is_valid_email(&payload.email) {
        return Err(AppError::bad_request("Invalid email"));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request("Password too short"));
    }
    Ok(())
}

fn auth_response(state: &AppState, user: User) -> Result<AuthResponse, AppError> {
    let pair = JwtKeys::from_ref(state).issue_pair(user.id)?;
    Ok(AuthResponse {
        token: pair.access,
        refresh_token: pair.refresh,
        user: user.into(),
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(mut payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    if let Err(e) = validate_registration(&mut payload) {
        warn!(email = %payload.email, reason = %e, "registration rejected");
        return Err(e);
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(AppError::conflict("Email already registered"));
    }

    let hash = hash_password(payload.password).await?;
    let user = match User::create(&state.db, &payload.name, &payload.email, &hash).await? {
        CreateUser::Created(u) => u,
        CreateUser::EmailTaken => {
            warn!(email = %payload.email, "email registered concurrently");
            return Err(AppError::conflict("Email already registered"));
        }
    };

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(auth_response(&state, user)?)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(mut payload): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "login with malformed email");
        return Err(AppError::unauthorized("Invalid credentials"));
    }

    let Some(user) = User::find_by_email(&state.db, &payload.email).await? else {
        warn!(email = %payload.email, "login unknown email");
        return Err(AppError::unauthorized("Invalid credentials"));
    };

    let ok = verify_password(payload.password, user.password_hash.clone()).await?;
    if !ok {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(AppError::unauthorized("Invalid credentials"));
    }

    info!(user_id = %user.id, "user logged in");
    Ok(Json(auth_response(&state, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let claims = JwtKeys::from_ref(&state)
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| {
            warn!(error = %e, "refresh rejected");
            AppError::unauthorized("Invalid refresh token")
        })?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| AppError::unauthorized("User not found"))?;

    Ok(Json(auth_response(&state, user)?))
}

#[instrument(skip(state))]
pub async fn profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = User::find_by_id(&state.db, user_id).await?.ok_or_else(|| {
        warn!(%user_id, "token for unknown user");
        AppError::unauthorized("User not found")
    })?;
    Ok(Json(user.into()))
}
