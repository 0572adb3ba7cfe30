use super::{Identity, Role};
use crate::error::{AuthError, Result};

/// Admits a resolved caller only when it holds exactly the required role.
///
/// Roles are not ranked. A gate for [`Role::User`] rejects admins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleGate {
    required: Role,
}

impl RoleGate {
    pub fn new(required: Role) -> Self {
        Self { required }
    }

    pub fn required(&self) -> Role {
        self.required
    }

    /// Pass the identity through unchanged, or fail with
    /// [`AuthError::Forbidden`] naming only the required role.
    pub fn check(&self, identity: Identity) -> Result<Identity> {
        if identity.role == self.required {
            Ok(identity)
        } else {
            Err(AuthError::Forbidden {
                required: self.required,
            })
        }
    }
}

/// Shorthand for [`RoleGate::new`].
pub fn require(role: Role) -> RoleGate {
    RoleGate::new(role)
}
