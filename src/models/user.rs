use serde::{Deserialize, Serialize};

/// A stored user account, roles resolved to their names
#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub age: i32,
    pub password_hash: String,
    pub roles: Vec<String>,
}

impl User {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(super::Role::Admin.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_detected_from_role_names() {
        let user = User {
            roles: vec!["user".to_string(), "admin".to_string()],
            ..Default::default()
        };
        assert!(user.is_admin());
        assert!(user.has_role("user"));

        let plain = User {
            roles: vec!["user".to_string()],
            ..Default::default()
        };
        assert!(!plain.is_admin());
    }
}
