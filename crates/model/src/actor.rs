use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Role {
    Admin,
    Employee,
    #[default]
    User,
}

impl Role {
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::Employee)
    }
}

/// The authenticated user a transition runs on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: ObjectId,
    pub email_verified: bool,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: ObjectId, email_verified: bool, role: Role) -> Actor {
        Actor {
            user_id,
            email_verified,
            role,
        }
    }

    pub fn user(user_id: ObjectId) -> Actor {
        Actor::new(user_id, true, Role::User)
    }

    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    /// Staff may act without a verified email.
    pub fn may_book(&self) -> bool {
        self.email_verified || self.is_staff()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("Employee".parse::<Role>().unwrap(), Role::Employee);
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert!("guest".parse::<Role>().is_err());
        assert_eq!(Role::Employee.to_string(), "employee");
    }

    #[test]
    fn test_may_book() {
        let id = ObjectId::new();
        assert!(Actor::new(id, true, Role::User).may_book());
        assert!(!Actor::new(id, false, Role::User).may_book());
        assert!(Actor::new(id, false, Role::Admin).may_book());
        assert!(Actor::new(id, false, Role::Employee).may_book());
    }
}
