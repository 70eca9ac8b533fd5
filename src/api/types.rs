use serde::{Deserialize, Serialize};

use crate::db::{Address, Token};
use crate::services::UserInfo;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// Account
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: UserInfo,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
}

// ============================================================================
// Administration
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, rename = "isAdmin")]
    pub is_admin: bool,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserDto {
    #[serde(rename = "ID")]
    pub id: i32,
    pub username: String,
    pub is_admin: bool,
    pub needs_password_reset: bool,
}

impl From<UserInfo> for UserDto {
    fn from(user: UserInfo) -> Self {
        Self {
            id: user.id,
            username: user.username,
            is_admin: user.is_admin,
            needs_password_reset: user.needs_password_reset,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<UserDto>,
}

// ============================================================================
// Tokens & addresses
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AddTokenRequest {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TokenDto {
    #[serde(rename = "ID")]
    pub id: i32,
    pub value: String,
    pub description: String,
    pub is_default: bool,
}

impl From<Token> for TokenDto {
    fn from(token: Token) -> Self {
        Self {
            id: token.id,
            value: token.value,
            description: token.description,
            is_default: token.is_default,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokensResponse {
    pub tokens: Vec<TokenDto>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateAddressRequest {
    #[serde(default)]
    pub real_address: String,
    pub token_id: i32,
}

#[derive(Debug, Serialize)]
pub struct GenerateAddressResponse {
    pub generated_address: String,
}

/// The token value used for generation stays server-side.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddressDto {
    #[serde(rename = "ID")]
    pub id: i32,
    pub created_at: String,
    pub generated_address: String,
    pub real_address: String,
    pub converted_address: String,
    pub token_description: String,
}

impl From<Address> for AddressDto {
    fn from(address: Address) -> Self {
        Self {
            id: address.id,
            created_at: address.created_at,
            generated_address: address.generated_address,
            real_address: address.real_address,
            converted_address: address.converted_address,
            token_description: address.token_description,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AddressesResponse {
    pub addresses: Vec<AddressDto>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
