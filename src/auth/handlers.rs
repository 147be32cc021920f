use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{
            CheckManagerResponse, LoginRequest, LoginResponse, MessageResponse, PublicUser,
            RegisterRequest, ResetPasswordRequest, SendVerificationRequest, VerifyCodeRequest,
        },
        extractors::AuthUser,
        repo::Managers,
        services,
    },
    error::AppError,
    extract::Json,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/send-verification", post(send_verification))
        .route("/auth/verify-code", post(verify_code))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/reset-password", post(reset_password))
        .route("/auth/check-manager", get(check_manager))
}

#[instrument(skip(state, payload))]
pub async fn send_verification(
    State(state): State<AppState>,
    Json(payload): Json<SendVerificationRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    services::send_verification(&state, &payload.email, &payload.purpose).await?;
    Ok(Json(MessageResponse::new("Verification code sent")))
}

#[instrument(skip(state, payload))]
pub async fn verify_code(
    State(state): State<AppState>,
    Json(payload): Json<VerifyCodeRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    services::verify_code(&state, &payload.email, &payload.code).await?;
    Ok(Json(MessageResponse::new("Code verified")))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    services::register(
        &state,
        &payload.username,
        &payload.email,
        &payload.password,
        &payload.verification_code,
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Registration successful")),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let outcome = services::login(&state, &payload.email, &payload.password).await?;
    Ok(Json(LoginResponse {
        message: "Login successful".into(),
        token: outcome.token,
        user: PublicUser {
            id: outcome.user.id,
            username: outcome.user.username,
            email: outcome.user.email,
        },
        is_manager: outcome.is_manager,
    }))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    services::reset_password(
        &state,
        &payload.email,
        &payload.verification_code,
        &payload.new_password,
    )
    .await?;
    Ok(Json(MessageResponse::new("Password reset successful")))
}

#[instrument(skip(state))]
pub async fn check_manager(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<CheckManagerResponse>, AppError> {
    let is_manager = Managers::contains(&state.db, &user.email).await?;
    Ok(Json(CheckManagerResponse { is_manager }))
}
