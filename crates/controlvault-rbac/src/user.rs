//! User records and role-specific state.
//!
//! A user record couples identity (id, username, opaque password token)
//! with a tagged union of role-specific state. The union replaces the
//! per-role subclassing of classic RBAC designs so the whole decision
//! table stays auditable in one place (the engine) instead of scattered
//! across overrides.

use std::fmt::{self, Display};

use controlvault_types::{BadgeValidity, UserId};

use crate::roles::Role;

/// Role-specific state carried by a user record.
///
/// `Unrecognized` is the defensive variant for role strings arriving from
/// untrusted deserialization (a corrupt credential-store row). A record in
/// that state is denied every zone with an `UnknownRole` verdict; it exists
/// so corrupt data is observable and auditable rather than silently
/// dropped at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleState {
    /// Administrator. No extra state.
    Admin,
    /// Employee. Attendance state lives outside the authorization core.
    Employee,
    /// Visitor with a metered badge.
    Visitor {
        /// Remaining successful entries. Mutated only by the engine.
        badge: BadgeValidity,
    },
    /// Defensive state for a role string outside the closed set.
    Unrecognized {
        /// The raw role string as it appeared in the credential store.
        raw: String,
    },
}

impl RoleState {
    /// The closed-set role, if this record has one.
    pub fn role(&self) -> Option<Role> {
        match self {
            RoleState::Admin => Some(Role::Admin),
            RoleState::Employee => Some(Role::Employee),
            RoleState::Visitor { .. } => Some(Role::Visitor),
            RoleState::Unrecognized { .. } => None,
        }
    }
}

/// A user known to the vault.
///
/// Records are exclusively owned by the user directory; the engine
/// receives a `&mut UserRecord` per decision and is the only component
/// that mutates badge state. The password is an opaque token compared
/// verbatim — hashing and strength policy belong to an external
/// credential system, not this vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    id: UserId,
    username: String,
    password: String,
    state: RoleState,
}

impl UserRecord {
    /// Creates a record with explicit role state.
    pub fn new(
        id: UserId,
        username: impl Into<String>,
        password: impl Into<String>,
        state: RoleState,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            password: password.into(),
            state,
        }
    }

    /// Creates an admin record.
    pub fn admin(id: UserId, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::new(id, username, password, RoleState::Admin)
    }

    /// Creates an employee record.
    pub fn employee(id: UserId, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::new(id, username, password, RoleState::Employee)
    }

    /// Creates a visitor record with the given badge validity.
    pub fn visitor(
        id: UserId,
        username: impl Into<String>,
        password: impl Into<String>,
        badge: BadgeValidity,
    ) -> Self {
        Self::new(id, username, password, RoleState::Visitor { badge })
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// The opaque credential token, needed by the directory to serialize
    /// the record back to the credential store.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Compares a candidate credential against the stored token.
    pub fn verify_password(&self, candidate: &str) -> bool {
        self.password == candidate
    }

    pub fn state(&self) -> &RoleState {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut RoleState {
        &mut self.state
    }

    /// The closed-set role, if the record has one.
    pub fn role(&self) -> Option<Role> {
        self.state.role()
    }

    /// Remaining badge validity, for visitor records.
    pub fn badge(&self) -> Option<BadgeValidity> {
        match &self.state {
            RoleState::Visitor { badge } => Some(*badge),
            _ => None,
        }
    }
}

impl Display for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            RoleState::Visitor { badge } => {
                write!(
                    f,
                    "[VISITOR] {} (ID: {}, Badge: {badge})",
                    self.username, self.id
                )
            }
            RoleState::Unrecognized { raw } => {
                write!(f, "[?{raw}] {} (ID: {})", self.username, self.id)
            }
            state => {
                // Admin and Employee render their role tag
                let role = state.role().map_or("?", Role::as_str);
                write!(f, "[{role}] {} (ID: {})", self.username, self.id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_the_expected_state() {
        let admin = UserRecord::admin(UserId::new("U001"), "alice", "pw");
        assert_eq!(admin.role(), Some(Role::Admin));
        assert_eq!(admin.badge(), None);

        let employee = UserRecord::employee(UserId::new("U002"), "bob", "pw");
        assert_eq!(employee.role(), Some(Role::Employee));

        let visitor =
            UserRecord::visitor(UserId::new("V001"), "carol", "pw", BadgeValidity::new(3));
        assert_eq!(visitor.role(), Some(Role::Visitor));
        assert_eq!(visitor.badge(), Some(BadgeValidity::new(3)));
    }

    #[test]
    fn unrecognized_state_has_no_role() {
        let record = UserRecord::new(
            UserId::new("U009"),
            "mallory",
            "pw",
            RoleState::Unrecognized {
                raw: "SUPERUSER".to_string(),
            },
        );
        assert_eq!(record.role(), None);
    }

    #[test]
    fn password_verification_is_verbatim() {
        let record = UserRecord::admin(UserId::new("U001"), "alice", "s3cret");
        assert!(record.verify_password("s3cret"));
        assert!(!record.verify_password("S3CRET"));
        assert!(!record.verify_password(""));
    }

    #[test]
    fn display_includes_badge_for_visitors() {
        let visitor =
            UserRecord::visitor(UserId::new("V001"), "carol", "pw", BadgeValidity::new(2));
        assert_eq!(visitor.to_string(), "[VISITOR] carol (ID: V001, Badge: 2)");

        let admin = UserRecord::admin(UserId::new("U001"), "alice", "pw");
        assert_eq!(admin.to_string(), "[ADMIN] alice (ID: U001)");
    }
}
