use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of role create and rename requests
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct RolePayload {
    #[serde(default)]
    pub name: String,
}
