/// Authentication endpoints
///
/// # Account lifecycle
///
/// ```text
/// create-account ──> unconfirmed ──confirm-account──> confirmed ──login──> session token
///                       │   ▲
///                       └───┘ login / request-code (new code emailed)
/// ```
///
/// One-time codes are six digits, emailed to the user and valid for ten
/// minutes. Redeeming a code consumes it.
///
/// # Endpoints
///
/// - `POST /auth/create-account` - Register (201, 409 email taken)
/// - `POST /auth/confirm-account` - Redeem confirmation code (200, 401)
/// - `POST /auth/login` - Session token (200) or new confirmation code (201)
/// - `POST /auth/request-code` - Resend confirmation code (201, 404, 409)
/// - `POST /auth/forgot-password` - Email a reset code (201, 404)
/// - `POST /auth/validate-token` - Check a reset code (200, 401)
/// - `POST /auth/update-password/:token` - Reset password with a code (200, 401)
/// - `GET /auth/user` - Session identity
/// - `PUT /auth/profile` - Update name and email (409 email taken)
/// - `POST /auth/update-password` - Change password given the current one (401)
/// - `POST /auth/check-password` - Verify the current password (401)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::body::JsonBody,
    routes::MessageResponse,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uptask_shared::{
    auth::{code, jwt, middleware::AuthUser, password},
    mail::templates,
    models::{
        token::Token,
        user::{CreateUser, User},
    },
};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,

    pub password_confirmation: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CodeRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EmailRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPasswordRequest {
    pub password: String,

    pub password_confirmation: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,

    pub password: String,

    pub password_confirmation: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckPasswordRequest {
    pub password: String,
}

/// Login outcome
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LoginResponse {
    /// Confirmed account, correct password
    Session { token: String },

    /// Unconfirmed account; a fresh code has been emailed
    ConfirmationRequired { message: String },
}

/// Policy and confirmation check for a new password
fn check_new_password(password: &str, confirmation: &str) -> ApiResult<()> {
    password::validate_password_strength(password)
        .map_err(|e| ApiError::invalid_field("password", e))?;

    if password != confirmation {
        return Err(ApiError::invalid_field(
            "passwordConfirmation",
            "Passwords do not match",
        ));
    }

    Ok(())
}

/// Loads the token for a submitted code, or fails with 401
async fn redeemable_token(state: &AppState, submitted: &str) -> ApiResult<Token> {
    let submitted = submitted.trim();
    if !code::is_well_formed(submitted) {
        return Err(ApiError::Unauthorized("Invalid token".to_string()));
    }

    Token::find_valid(&state.db, submitted)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid token".to_string()))
}

/// Issues a confirmation code for `user` and emails it
async fn send_confirmation_code(state: &AppState, user: &User) -> ApiResult<()> {
    let issued = Token::issue(&state.db, user.id).await?;

    state.send_email(templates::confirmation_email(
        &user.email,
        &user.name,
        &issued.code,
        state.frontend_url(),
    ));

    Ok(())
}

/// Register a new account
///
/// # Endpoint
///
/// ```text
/// POST /auth/create-account
/// Content-Type: application/json
///
/// {
///   "name": "Ana",
///   "email": "ana@example.com",
///   "password": "password123",
///   "passwordConfirmation": "password123"
/// }
/// ```
///
/// The account starts unconfirmed; a confirmation code is emailed. Mail
/// failures do not fail the request.
///
/// # Errors
///
/// - `409 Conflict`: Email already registered
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_account(
    State(state): State<AppState>,
    JsonBody(mut req): JsonBody<CreateAccountRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    req.name = req.name.trim().to_string();
    req.validate()?;
    check_new_password(&req.password, &req.password_confirmation)?;

    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        return Err(ApiError::Conflict("User already registered".to_string()));
    }

    let password_hash = password::hash_password_blocking(req.password).await?;

    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name,
            email: req.email,
            password_hash,
        },
    )
    .await?;

    send_confirmation_code(&state, &user).await?;
    info!(user_id = %user.id, "Account created");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(
            "Account created, check your email to confirm it",
        )),
    ))
}

/// Redeem a confirmation code
///
/// ```text
/// POST /auth/confirm-account
///
/// { "token": "482913" }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown, expired or already used code
pub async fn confirm_account(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CodeRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let token = redeemable_token(&state, &req.token).await?;

    tokio::try_join!(
        User::confirm(&state.db, token.user_id),
        Token::delete(&state.db, token.id),
    )?;

    info!(user_id = %token.user_id, "Account confirmed");
    Ok(Json(MessageResponse::new("Account confirmed successfully")))
}

/// Log in
///
/// ```text
/// POST /auth/login
///
/// { "email": "ana@example.com", "password": "password123" }
/// ```
///
/// # Response
///
/// - `200 OK` `{ "token": "eyJ..." }` for a confirmed account
/// - `201 Created` `{ "message": "..." }` for an unconfirmed account; a
///   new confirmation code has been emailed and no session is issued
///
/// # Errors
///
/// - `404 Not Found`: Unknown email
/// - `401 Unauthorized`: Wrong password
pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> ApiResult<Response> {
    req.validate()?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !user.confirmed {
        send_confirmation_code(&state, &user).await?;

        let body = LoginResponse::ConfirmationRequired {
            message: "The account has not been confirmed, we have sent a new code to your email"
                .to_string(),
        };
        return Ok((StatusCode::CREATED, Json(body)).into_response());
    }

    let valid = password::verify_password_blocking(req.password, user.password_hash.clone()).await?;
    if !valid {
        return Err(ApiError::Unauthorized("Incorrect password".to_string()));
    }

    let token = jwt::issue_session_token(user.id, state.config.session_lifetime(), state.jwt_secret())?;
    info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse::Session { token }).into_response())
}

/// Email a new confirmation code
///
/// # Errors
///
/// - `404 Not Found`: Unknown email
/// - `409 Conflict`: Account already confirmed
pub async fn request_code(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<EmailRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    req.validate()?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if user.confirmed {
        return Err(ApiError::Conflict("User already confirmed".to_string()));
    }

    send_confirmation_code(&state, &user).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("A new code has been sent to your email")),
    ))
}

/// Email a password reset code
///
/// # Errors
///
/// - `404 Not Found`: Unknown email
pub async fn forgot_password(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<EmailRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    req.validate()?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let issued = Token::issue(&state.db, user.id).await?;
    state.send_email(templates::password_reset_email(
        &user.email,
        &user.name,
        &issued.code,
        state.frontend_url(),
    ));

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Check your email for instructions")),
    ))
}

/// Check a reset code without consuming it
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown or expired code
pub async fn validate_token(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CodeRequest>,
) -> ApiResult<Json<MessageResponse>> {
    redeemable_token(&state, &req.token).await?;
    Ok(Json(MessageResponse::new("Valid token, set your new password")))
}

/// Set a new password using a reset code
///
/// ```text
/// POST /auth/update-password/482913
///
/// { "password": "new-password", "passwordConfirmation": "new-password" }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown or expired code
/// - `422 Unprocessable Entity`: Password policy or confirmation mismatch
pub async fn update_password_with_token(
    State(state): State<AppState>,
    Path(submitted): Path<String>,
    JsonBody(req): JsonBody<NewPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    check_new_password(&req.password, &req.password_confirmation)?;

    let token = redeemable_token(&state, &submitted).await?;
    let password_hash = password::hash_password_blocking(req.password).await?;

    tokio::try_join!(
        User::set_password_hash(&state.db, token.user_id, &password_hash),
        Token::delete(&state.db, token.id),
    )?;

    info!(user_id = %token.user_id, "Password reset");
    Ok(Json(MessageResponse::new("Password updated successfully")))
}

/// The session user
pub async fn current_user(Extension(user): Extension<AuthUser>) -> Json<AuthUser> {
    Json(user)
}

/// Update name and email of the session user
///
/// # Errors
///
/// - `409 Conflict`: Email belongs to another account
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    JsonBody(mut req): JsonBody<UpdateProfileRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.name = req.name.trim().to_string();
    req.validate()?;

    if let Some(owner) = User::find_by_email(&state.db, &req.email).await? {
        if owner.id != user.id {
            return Err(ApiError::Conflict("Email already in use".to_string()));
        }
    }

    User::update_profile(&state.db, user.id, &req.name, &req.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(MessageResponse::new("Profile updated successfully")))
}

/// Loads the session user's record and checks `password` against it
async fn verify_current_password(
    state: &AppState,
    user: &AuthUser,
    password: String,
) -> ApiResult<bool> {
    let record = User::find_by_id(&state.db, user.id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid token".to_string()))?;

    Ok(password::verify_password_blocking(password, record.password_hash).await?)
}

/// Change password given the current one
///
/// # Errors
///
/// - `401 Unauthorized`: Current password is wrong
/// - `422 Unprocessable Entity`: Password policy or confirmation mismatch
pub async fn update_current_password(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    JsonBody(req): JsonBody<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    check_new_password(&req.password, &req.password_confirmation)?;

    if !verify_current_password(&state, &user, req.current_password).await? {
        return Err(ApiError::Unauthorized("Current password is incorrect".to_string()));
    }

    let password_hash = password::hash_password_blocking(req.password).await?;
    User::set_password_hash(&state.db, user.id, &password_hash).await?;

    info!(user_id = %user.id, "Password changed");
    Ok(Json(MessageResponse::new("Password updated successfully")))
}

/// Verify the session user's password
///
/// # Errors
///
/// - `401 Unauthorized`: Wrong password
pub async fn check_password(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    JsonBody(req): JsonBody<CheckPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    if !verify_current_password(&state, &user, req.password).await? {
        return Err(ApiError::Unauthorized("Incorrect password".to_string()));
    }

    Ok(Json(MessageResponse::new("Correct password")))
}
