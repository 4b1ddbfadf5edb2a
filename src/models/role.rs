use core::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The fixed set of access tags a user can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Every role, in the order role checkboxes are laid out
    pub const ALL: [Role; 2] = [Role::Admin, Role::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    /// Looks up a role by its wire tag. Tags are case sensitive.
    pub fn parse(tag: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|role| role.as_str() == tag)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A role row as stored in the database
#[derive(Debug, Default, Deserialize, Serialize, Clone, ToSchema)]
pub struct RoleEntity {
    pub id: i64,
    pub name: String,
}
