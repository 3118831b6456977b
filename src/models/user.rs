// Allow dead code: API envelope fields kept for wire-format completeness
#![allow(dead_code)]

use std::fmt;

use serde::{Deserialize, Serialize};

/// Account role as issued by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "USER")]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }

    /// Flip between the two roles (used by the role selector in forms).
    pub fn toggle(&self) -> Self {
        match self {
            Role::Admin => Role::User,
            Role::User => Role::Admin,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub role: Role,
    pub username: String,
}

/// Paginated envelope returned by `/admin/users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPage {
    pub page: i64,
    pub total: i64,
    #[serde(rename = "perPage")]
    pub per_page: i64,
    pub users: Vec<UserInfo>,
}

/// Sortable columns of the Users table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSortColumn {
    Role,
    Username,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_page() {
        let json = r#"{
            "page": 1,
            "total": 2,
            "perPage": 20,
            "users": [
                {"id": 1, "role": "ADMIN", "username": "alice"},
                {"id": 7, "role": "USER", "username": "bob"}
            ]
        }"#;

        let page: UserPage = serde_json::from_str(json).expect("Failed to parse user page");
        assert_eq!(page.per_page, 20);
        assert_eq!(page.users.len(), 2);
        assert_eq!(page.users[0].role, Role::Admin);
        assert_eq!(page.users[1].username, "bob");
    }

    #[test]
    fn test_role_round_trip() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), r#""ADMIN""#);
        assert_eq!(
            serde_json::from_str::<Role>(r#""USER""#).unwrap(),
            Role::User
        );
        assert_eq!(Role::User.toggle(), Role::Admin);
    }
}
