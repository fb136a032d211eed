#![allow(clippy::match_same_arms)]
//! Role definitions for RBAC.
//!
//! Defines 3 roles with escalating reach:
//! - Visitor: lobby only, metered by badge validity (most restrictive)
//! - Employee: everything except the server room
//! - Admin: every zone, unconditionally (least restrictive)

use std::fmt::{self, Display};
use std::str::FromStr;

use controlvault_types::Zone;
use serde::{Deserialize, Serialize};

/// A user's authorization class.
///
/// The set is closed; role strings arriving from the credential store are
/// validated at the parsing boundary. An unrecognized string never becomes
/// a `Role` — it is carried as a defensive record state and denied by the
/// engine (see `controlvault_rbac::user::RoleState::Unrecognized`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Full access to every zone.
    ///
    /// **Permissions:**
    /// - Enter any zone, unconditionally
    /// - Register new users
    ///
    /// No badge or other consumable state is involved; an admin decision
    /// never mutates the record.
    Admin,

    /// Staff access to working areas.
    ///
    /// **Permissions:**
    /// - Enter the lab, office floor, and lobby
    /// - Record attendance (check in / check out)
    ///
    /// The server room is off limits.
    Employee,

    /// Escorted guest access.
    ///
    /// **Permissions:**
    /// - Enter the lobby only, while badge validity remains
    ///
    /// Each successful entry consumes one badge validity unit. An expired
    /// badge rejects the visitor everywhere, including the lobby.
    Visitor,
}

impl Role {
    /// Returns whether this role may enter the given zone.
    ///
    /// This is the full role × zone matrix in one place. For visitors it
    /// answers the zone question only; badge expiry is checked separately
    /// (and first) by the engine.
    pub fn permits(self, zone: Zone) -> bool {
        match (self, zone) {
            (Role::Admin, _) => true,
            (Role::Employee, Zone::Lab | Zone::OfficeFloor | Zone::Lobby) => true,
            (Role::Employee, Zone::ServerRoom) => false,
            (Role::Visitor, Zone::Lobby) => true,
            (Role::Visitor, _) => false,
        }
    }

    /// Zones this role may enter, in menu order.
    pub fn permitted_zones(self) -> &'static [Zone] {
        match self {
            Role::Admin => &[Zone::ServerRoom, Zone::Lab, Zone::OfficeFloor, Zone::Lobby],
            Role::Employee => &[Zone::Lab, Zone::OfficeFloor, Zone::Lobby],
            Role::Visitor => &[Zone::Lobby],
        }
    }

    /// Whether successful entries for this role consume badge validity.
    pub fn meters_entries(self) -> bool {
        matches!(self, Role::Visitor)
    }

    /// Returns the credential-store spelling of this role.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Employee => "EMPLOYEE",
            Role::Visitor => "VISITOR",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a role in the closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct RoleParseError(pub String);

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "EMPLOYEE" => Ok(Role::Employee),
            "VISITOR" => Ok(Role::Visitor),
            other => Err(RoleParseError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_permits_every_zone() {
        for zone in Zone::ALL {
            assert!(Role::Admin.permits(zone), "admin should enter {zone}");
        }
    }

    #[test]
    fn employee_permits_all_but_server_room() {
        assert!(!Role::Employee.permits(Zone::ServerRoom));
        assert!(Role::Employee.permits(Zone::Lab));
        assert!(Role::Employee.permits(Zone::OfficeFloor));
        assert!(Role::Employee.permits(Zone::Lobby));
    }

    #[test]
    fn visitor_permits_lobby_only() {
        assert!(Role::Visitor.permits(Zone::Lobby));
        assert!(!Role::Visitor.permits(Zone::ServerRoom));
        assert!(!Role::Visitor.permits(Zone::Lab));
        assert!(!Role::Visitor.permits(Zone::OfficeFloor));
    }

    #[test]
    fn permitted_zones_agree_with_matrix() {
        for role in [Role::Admin, Role::Employee, Role::Visitor] {
            for zone in Zone::ALL {
                assert_eq!(
                    role.permitted_zones().contains(&zone),
                    role.permits(zone),
                    "{role} / {zone} disagree"
                );
            }
        }
    }

    #[test]
    fn only_visitors_meter_entries() {
        assert!(!Role::Admin.meters_entries());
        assert!(!Role::Employee.meters_entries());
        assert!(Role::Visitor.meters_entries());
    }

    #[test]
    fn role_round_trips_through_its_spelling() {
        for role in [Role::Admin, Role::Employee, Role::Visitor] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_string_is_rejected() {
        let err = "CONTRACTOR".parse::<Role>().unwrap_err();
        assert_eq!(err, RoleParseError("CONTRACTOR".to_string()));
    }
}
