//! User records and the role / priority vocabulary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Type alias for the messaging platform's user id.
pub type UserId = String;

/// Caller role. Known roles get variants; anything else is carried verbatim
/// so free-text roles survive a round-trip through the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Technician,
    Admin,
    Other(String),
}

impl Role {
    pub const TECHNICIAN_LABEL: &'static str = "維修員";
    pub const ADMIN_LABEL: &'static str = "管理員";

    /// User-facing label, also the on-disk representation.
    pub fn label(&self) -> &str {
        match self {
            Role::Technician => Self::TECHNICIAN_LABEL,
            Role::Admin => Self::ADMIN_LABEL,
            Role::Other(label) => label,
        }
    }
}

impl From<String> for Role {
    fn from(label: String) -> Self {
        match label.as_str() {
            Role::TECHNICIAN_LABEL => Role::Technician,
            Role::ADMIN_LABEL => Role::Admin,
            _ => Role::Other(label),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.label().to_string()
    }
}

/// Rejected priority rank.
#[derive(Debug, Error)]
#[error("priority rank must be 1..=3, got {0}")]
pub struct InvalidPriority(pub u8);

/// Priority rank for a (user, factory) pair. Lower = more responsible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Priority(u8);

impl Priority {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 3;

    /// Build a priority, accepting only ranks 1 through 3.
    pub fn new(rank: u8) -> Option<Self> {
        Self::try_from(rank).ok()
    }

    pub fn rank(self) -> u8 {
        self.0
    }

    /// User-facing label, e.g. 第一優先.
    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "第一優先",
            2 => "第二優先",
            _ => "第三優先",
        }
    }
}

impl TryFrom<u8> for Priority {
    type Error = InvalidPriority;

    fn try_from(rank: u8) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&rank) {
            Ok(Self(rank))
        } else {
            Err(InvalidPriority(rank))
        }
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.0
    }
}

/// A registered user.
///
/// The priority map may later be extended (never shrunk) through
/// [`crate::store::UserStore::merge_priorities`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub name: String,
    /// Factory name → priority rank for that factory.
    #[serde(default)]
    pub factory_priority: BTreeMap<String, Priority>,
    pub role: Role,
}

impl User {
    pub fn is_technician(&self) -> bool {
        self.role == Role::Technician
    }

    /// The user's rank for this factory, if they are responsible for it.
    pub fn priority_for(&self, factory: &str) -> Option<Priority> {
        self.factory_priority.get(factory).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_label_round_trip() {
        for role in [
            Role::Technician,
            Role::Admin,
            Role::Other("廠長".to_string()),
        ] {
            let json = serde_json::to_string(&role).unwrap();
            let back: Role = serde_json::from_str(&json).unwrap();
            assert_eq!(back, role);
        }

        assert_eq!(Role::from("維修員".to_string()), Role::Technician);
        assert_eq!(Role::from("管理員".to_string()), Role::Admin);
    }

    #[test]
    fn test_priority_bounds() {
        assert!(Priority::new(0).is_none());
        assert!(Priority::new(4).is_none());
        assert_eq!(Priority::new(2).map(Priority::rank), Some(2));

        let err = serde_json::from_str::<Priority>("9");
        assert!(err.is_err());
    }

    #[test]
    fn test_priority_for_missing_factory() {
        let user = User {
            user_id: "U1".to_string(),
            name: "小明".to_string(),
            factory_priority: BTreeMap::from([(
                "北區廠".to_string(),
                Priority::new(1).unwrap(),
            )]),
            role: Role::Technician,
        };

        assert_eq!(
            user.priority_for("北區廠").map(Priority::rank),
            Some(1)
        );
        assert!(user.priority_for("南區廠").is_none());
    }
}
