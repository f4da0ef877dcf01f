//! Authentication and profile endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        member::Member,
        user::{Role, Signup, UpdateProfile, User},
    },
};

use super::AuthenticatedUser;

/// Login request
#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token issued on login and signup
#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    /// JWT bearer token
    pub token: String,
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: u64,
    pub user: UserInfo,
}

/// Identity of the authenticated user
#[derive(Serialize, ToSchema)]
pub struct UserInfo {
    pub id: i32,
    pub email: String,
    pub role: Role,
    pub member_id: Option<i32>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
            member_id: user.member_id,
        }
    }
}

/// Own login plus member profile
#[derive(Serialize, ToSchema)]
pub struct ProfileResponse {
    pub user: User,
    pub member: Option<Member>,
}

fn auth_response(state: &crate::AppState, token: String, user: &User) -> AuthResponse {
    AuthResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.config.auth.jwt_expiration_hours * 3600,
        user: UserInfo::from(user),
    }
}

/// Register as a library member
#[utoipa::path(
    post,
    path = "/auth/signup",
    tag = "auth",
    request_body = Signup,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn signup(
    State(state): State<crate::AppState>,
    Json(request): Json<Signup>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    request.validate()?;

    let (token, user) = state.services.auth.signup(request).await?;
    Ok((StatusCode::CREATED, Json(auth_response(&state, token, &user))))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account deactivated")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let (token, user) = state
        .services
        .auth
        .login(&request.email, &request.password)
        .await?;
    Ok(Json(auth_response(&state, token, &user)))
}

/// Sign in (same as login)
#[utoipa::path(
    post,
    path = "/auth/signin",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account deactivated")
    )
)]
pub async fn signin(
    state: State<crate::AppState>,
    request: Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    login(state, request).await
}

/// Get current user info
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user info", body = UserInfo),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(AuthenticatedUser(caller): AuthenticatedUser) -> Json<UserInfo> {
    Json(UserInfo {
        id: caller.user_id,
        email: caller.email,
        role: caller.role,
        member_id: caller.member_id,
    })
}

/// Get own profile
#[utoipa::path(
    get,
    path = "/profile",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_profile(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> AppResult<Json<ProfileResponse>> {
    let (user, member) = state.services.auth.profile(&caller).await?;
    Ok(Json(ProfileResponse { user, member }))
}

/// Update own profile
#[utoipa::path(
    put,
    path = "/profile",
    tag = "auth",
    security(("bearer_auth" = [])),
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = ProfileResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn update_profile(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(profile): Json<UpdateProfile>,
) -> AppResult<Json<ProfileResponse>> {
    profile.validate()?;

    let (user, member) = state.services.auth.update_profile(&caller, profile).await?;
    Ok(Json(ProfileResponse { user, member }))
}
