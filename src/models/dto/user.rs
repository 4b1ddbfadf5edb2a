use crate::models::User;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A user account as exchanged over the wire. Roles stay plain strings so
/// tags the client does not know about still reach the renderer.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub age: i32,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl From<User> for UserRecord {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            age: user.age,
            roles: user.roles,
        }
    }
}

/// Body of create and update requests.
///
/// `password` is write-only and left out entirely when not being set. `age`
/// is sent as `null` when the form text did not parse as a number.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Body of a partial update. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
}

impl UserPatch {
    /// Overlays the provided fields on a full payload
    pub fn merge_into(self, mut base: UserPayload) -> UserPayload {
        if let Some(first_name) = self.first_name {
            base.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            base.last_name = last_name;
        }
        if let Some(email) = self.email {
            base.email = email;
        }
        if let Some(age) = self.age {
            base.age = Some(age);
        }
        if let Some(roles) = self.roles {
            base.roles = roles;
        }
        base.password = self.password;
        base
    }
}

impl From<UserRecord> for UserPayload {
    fn from(record: UserRecord) -> Self {
        Self {
            id: Some(record.id),
            first_name: record.first_name,
            last_name: record.last_name,
            email: record.email,
            age: Some(record.age),
            password: None,
            roles: record.roles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_without_password_has_no_password_key() {
        let payload = UserPayload {
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
            email: "ann@example.com".to_string(),
            age: Some(31),
            roles: vec!["user".to_string()],
            ..Default::default()
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            json!({
                "firstName": "Ann",
                "lastName": "Lee",
                "email": "ann@example.com",
                "age": 31,
                "roles": ["user"],
            })
        );
    }

    #[test]
    fn unparsed_age_is_sent_as_null() {
        let payload = UserPayload::default();
        let value = serde_json::to_value(&payload).unwrap();
        assert!(value["age"].is_null());
        assert!(value.get("id").is_none());
    }

    #[test]
    fn record_keeps_unknown_role_tags() {
        let record: UserRecord = serde_json::from_value(json!({
            "id": 7,
            "firstName": "Bo",
            "lastName": "Ng",
            "email": "bo@example.com",
            "age": 40,
            "roles": ["admin", "auditor"],
        }))
        .unwrap();
        assert_eq!(record.roles, vec!["admin", "auditor"]);
    }

    #[test]
    fn record_from_user_drops_password_hash() {
        let user = User {
            id: 3,
            first_name: "Cy".to_string(),
            last_name: "Po".to_string(),
            email: "cy@example.com".to_string(),
            age: 22,
            password_hash: "$argon2id$...".to_string(),
            roles: vec!["user".to_string()],
        };
        let value = serde_json::to_value(UserRecord::from(user)).unwrap();
        assert!(value.get("password").is_none());
        assert!(value.get("passwordHash").is_none());
        assert_eq!(value["id"], 3);
    }

    #[test]
    fn patch_overrides_only_given_fields() {
        let stored = UserRecord {
            id: 4,
            first_name: "Dee".to_string(),
            last_name: "Ray".to_string(),
            email: "dee@example.com".to_string(),
            age: 33,
            roles: vec!["admin".to_string(), "user".to_string()],
        };
        let patch: UserPatch = serde_json::from_value(json!({
            "lastName": "Moss",
            "roles": ["user"],
        }))
        .unwrap();

        let merged = patch.merge_into(UserPayload::from(stored));
        assert_eq!(merged.id, Some(4));
        assert_eq!(merged.first_name, "Dee");
        assert_eq!(merged.last_name, "Moss");
        assert_eq!(merged.age, Some(33));
        assert_eq!(merged.roles, vec!["user"]);
        assert_eq!(merged.password, None);
    }
}
