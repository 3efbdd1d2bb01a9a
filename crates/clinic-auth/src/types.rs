//! Identity types shared by the credential service and the policy engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Primary key of a row in `users`.
pub type UserId = i32;

/// Primary key of a row in `patients`.
pub type PatientId = i32;

/// Primary key of a row in `healthcare_providers`.
pub type ProviderId = i32;

/// Role of a user account. Role is the only axis of authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Nurse,
    Staff,
    Patient,
}

impl Role {
    /// Every role, in a stable order.
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Doctor,
        Role::Nurse,
        Role::Staff,
        Role::Patient,
    ];

    /// Returns the role name as stored in the database and in tokens.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Doctor => "doctor",
            Self::Nurse => "nurse",
            Self::Staff => "staff",
            Self::Patient => "patient",
        }
    }

    /// Returns `true` for roles backed by a `healthcare_providers` row.
    #[must_use]
    pub fn is_provider(&self) -> bool {
        matches!(self, Self::Doctor | Self::Nurse)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a known role.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "doctor" => Ok(Self::Doctor),
            "nurse" => Ok(Self::Nurse),
            "staff" => Ok(Self::Staff),
            "patient" => Ok(Self::Patient),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Authenticated identity derived from a verified credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub username: String,
    pub role: Role,
}

impl Principal {
    #[must_use]
    pub fn new(id: UserId, username: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            username: username.into(),
            role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        let err = "superuser".parse::<Role>().unwrap_err();
        assert_eq!(err, UnknownRole("superuser".to_string()));
        // Case matters: role strings are stored lowercase.
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Nurse).unwrap(), "\"nurse\"");
        let role: Role = serde_json::from_str("\"doctor\"").unwrap();
        assert_eq!(role, Role::Doctor);
        assert!(serde_json::from_str::<Role>("\"janitor\"").is_err());
    }

    #[test]
    fn provider_roles() {
        assert!(Role::Doctor.is_provider());
        assert!(Role::Nurse.is_provider());
        assert!(!Role::Admin.is_provider());
        assert!(!Role::Staff.is_provider());
        assert!(!Role::Patient.is_provider());
    }
}
