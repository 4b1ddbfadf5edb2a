use crate::models::User;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Body returned to JSON clients after a successful login
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub is_admin: bool,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LogoutForm {
    #[serde(rename = "_csrf")]
    pub csrf: Option<String>,
}

/// Identity of the session owner, as served by `/api/auth/userinfo`
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub age: i32,
    pub roles: Vec<String>,
    pub is_admin: bool,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        let is_admin = user.is_admin();
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            age: user.age,
            roles: user.roles,
            is_admin,
        }
    }
}

/// Answer of `/api/auth/check-auth`. Anonymous callers only get `authenticated: false`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct AuthStatus {
    pub authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authorities: Vec<String>,
}
