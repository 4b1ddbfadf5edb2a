pub mod auth;
pub mod message;
pub mod role;
pub mod user;
pub use auth::*;
pub use message::Message;
pub use role::RolePayload;
pub use user::*;

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

use super::{Role, RoleEntity};

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(
            Message,
            UserRecord,
            UserPayload,
            UserPatch,
            LoginForm,
            LoginResponse,
            UserInfo,
            AuthStatus,
            RolePayload,
            Role,
            RoleEntity,
        ),
    ),
    modifiers(&SecurityAddon)
)]
/// Captures OpenAPI schemas and canned responses defined in the DTO module
pub struct OpenApiSchemas;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "SESSION";

pub struct SecurityAddon;
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "sessionCookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE))),
            )
        }
    }
}
