use crate::api::gateway::ApiGateway;
use crate::error::ApiError;
use crate::models::{AuthTokens, LoginData, RefreshRequest, RegisterData, User};

/// Register a new user
///
/// Creates the account and returns the created user. No tokens are issued; the caller
/// logs in separately.
pub async fn register(gateway: &ApiGateway, data: &RegisterData) -> Result<User, ApiError> {
    gateway.post("/auth/register", data).await
}

/// Login user
///
/// Exchanges email and password for an access/refresh token pair.
pub async fn login(gateway: &ApiGateway, data: &LoginData) -> Result<AuthTokens, ApiError> {
    gateway.post("/auth/login", data).await
}

/// Fetch the identity behind the stored access token.
pub async fn current_user(gateway: &ApiGateway) -> Result<User, ApiError> {
    gateway.get("/auth/me").await
}

/// Exchange a refresh token for a new access token.
pub async fn refresh_token(
    gateway: &ApiGateway,
    refresh_token: &str,
) -> Result<AuthTokens, ApiError> {
    let body = RefreshRequest {
        refresh_token: refresh_token.to_string(),
    };
    gateway.post("/auth/refresh", &body).await
}
