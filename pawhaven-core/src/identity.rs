use crate::appointment::Appointment;
use serde::{Deserialize, Serialize};

/// Role carried by the authenticated identity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// The authenticated caller, as supplied by the identity collaborator.
/// Admins bypass ownership checks on every operation.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
}

impl Identity {
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::User,
        }
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Owner-or-admin check used by reads, amendments and cancellation.
    pub fn may_act_on(&self, appointment: &Appointment) -> bool {
        self.is_admin() || appointment.user_id == self.user_id
    }
}
