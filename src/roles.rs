// src/roles.rs

use log::error;
use mongodb::bson::doc;
use mongodb::Database;
use serde::{Deserialize, Serialize};

/// Access level stored on each document in `users`. Gates which mutating
/// actions a signed-in user may perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Editor,
    Visitante,
}

impl Role {
    /// Unknown or empty strings parse to `None`; callers treat that as a
    /// user with every mutating action withheld.
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "Admin" => Some(Role::Admin),
            "Editor" => Some(Role::Editor),
            "Visitante" => Some(Role::Visitante),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Editor => "Editor",
            Role::Visitante => "Visitante",
        }
    }

    pub fn can_create(self) -> bool {
        matches!(self, Role::Admin | Role::Editor)
    }

    pub fn can_edit(self) -> bool {
        matches!(self, Role::Admin | Role::Editor)
    }

    pub fn can_delete(self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn can_manage_users(self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Actions the frontend is allowed to render for this role. Read access is
/// always offered to a signed-in user.
pub fn allowed_actions(role: Option<Role>) -> Vec<&'static str> {
    let mut actions = vec!["read"];
    if let Some(role) = role {
        if role.can_create() {
            actions.push("create");
        }
        if role.can_edit() {
            actions.push("edit");
        }
        if role.can_delete() {
            actions.push("delete");
        }
    }
    actions
}

/// Looks up the signed-in user's role in `users`. Any failure reads as
/// "no role", which withholds every mutating action.
pub async fn fetch_role(db: &Database, user_id: &str) -> Option<Role> {
    let users = db.collection::<mongodb::bson::Document>("users");
    match users.find_one(doc! { "userId": user_id }).await {
        Ok(Some(user_doc)) => user_doc.get_str("role").ok().and_then(Role::parse),
        Ok(None) => None,
        Err(e) => {
            error!("Error fetching role for {}: {}", user_id, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_and_editor_may_create_and_edit() {
        for role in [Role::Admin, Role::Editor] {
            assert!(role.can_create());
            assert!(role.can_edit());
        }
        assert!(!Role::Visitante.can_create());
        assert!(!Role::Visitante.can_edit());
    }

    #[test]
    fn only_admin_may_delete_or_manage_users() {
        assert!(Role::Admin.can_delete());
        assert!(Role::Admin.can_manage_users());
        assert!(!Role::Editor.can_delete());
        assert!(!Role::Editor.can_manage_users());
        assert!(!Role::Visitante.can_delete());
    }

    #[test]
    fn unrecognized_roles_parse_to_none() {
        assert_eq!(Role::parse("Admin"), Some(Role::Admin));
        assert_eq!(Role::parse("admin"), None);
        assert_eq!(Role::parse("Gestor"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn allowed_actions_follow_the_role_table() {
        assert_eq!(
            allowed_actions(Some(Role::Admin)),
            vec!["read", "create", "edit", "delete"]
        );
        assert_eq!(
            allowed_actions(Some(Role::Editor)),
            vec!["read", "create", "edit"]
        );
        assert_eq!(allowed_actions(Some(Role::Visitante)), vec!["read"]);
        // null/unknown role: every mutating action withheld
        assert_eq!(allowed_actions(None), vec!["read"]);
    }
}
