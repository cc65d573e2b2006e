use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A system account in the `users` collection. Only the bcrypt hash of the
/// password is persisted, never the plaintext. The role is kept as the raw
/// stored string; gating parses it through `roles::Role`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Shape returned to the frontend; the credential hash never leaves the API.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        UserInfo {
            id: user.user_id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
        }
    }
}
