//! Identity types: the internal profile record and the external account

use serde::{Deserialize, Serialize};
use std::fmt;

/// Access-control role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Organizer,
    Admin,
}

impl Role {
    /// Wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Organizer => "organizer",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Internal profile record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Logged-in principal issued by the external account system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUser {
    pub name: String,
    pub account_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_login_time: Option<String>,
}

/// POST /auth/login body
#[derive(Debug, Clone, Serialize)]
pub struct LoginForm {
    pub account: String,
    pub password: String,
}

impl LoginForm {
    /// Login with account and password
    pub fn new(account: &str, password: &str) -> Self {
        Self {
            account: account.to_string(),
            password: password.to_string(),
        }
    }
}

/// POST /auth/register body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Role,
}

/// Payload of a successful registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResult {
    pub token: String,
    pub user: User,
}

/// PUT /auth/profile body; only populated fields are sent
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// PUT /auth/password body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
}

/// Admin credentials required by every organizer-management endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminCredentials {
    pub admin_account: String,
    pub admin_password: String,
}

impl AdminCredentials {
    /// Admin account and password
    pub fn new(account: &str, password: &str) -> Self {
        Self {
            admin_account: account.to_string(),
            admin_password: password.to_string(),
        }
    }
}

/// POST /auth/admin/create-organizer body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganizerForm {
    #[serde(flatten)]
    pub admin: AdminCredentials,
    pub account: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_account_user_with_embedded_user() {
        let account: AccountUser = serde_json::from_value(json!({
            "name": "李老师",
            "accountId": "T2024001",
            "role": "organizer",
            "token": "jwt-token",
            "user": {
                "id": 7,
                "username": "T2024001",
                "email": null,
                "role": "organizer",
                "isActive": true,
                "isDeleted": false,
                "createdAt": "2024-09-01T08:00:00Z"
            }
        }))
        .unwrap();

        assert_eq!(account.role, Some(Role::Organizer));
        let user = account.user.unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(user.email, None);
        assert_eq!(user.is_active, Some(true));
    }

    #[test]
    fn test_create_organizer_flattens_admin_credentials() {
        let form = CreateOrganizerForm {
            admin: AdminCredentials::new("admin", "secret"),
            account: "org01".into(),
            password: "pass123".into(),
            name: None,
        };
        assert_eq!(
            serde_json::to_value(&form).unwrap(),
            json!({
                "adminAccount": "admin",
                "adminPassword": "secret",
                "account": "org01",
                "password": "pass123"
            })
        );
    }
}
