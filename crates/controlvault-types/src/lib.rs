//! # controlvault-types: Core types for `ControlVault`
//!
//! This crate contains shared types used across the `ControlVault` system:
//! - Entity IDs ([`UserId`])
//! - Access areas ([`Zone`])
//! - Consumable visitor privileges ([`BadgeValidity`])
//!
//! These are leaf types: they carry no policy. The role-to-zone decision
//! table lives in `controlvault-rbac`.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// Entity IDs
// ============================================================================

/// Unique identifier for a user, as issued by the credential store
/// (e.g. `U001`).
///
/// Treated as an opaque token: the vault never derives meaning from its
/// contents.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

// ============================================================================
// Zones - closed set of access areas
// ============================================================================

/// An enumerated physical/logical access area.
///
/// The set is closed: no zone value outside this enumeration exists in the
/// system. Strings arriving from files use the credential-store vocabulary
/// (`SERVER_ROOM`, `LAB`, `OFFICE_FLOOR`, `LOBBY`) and are validated at the
/// parsing boundary, so the policy engine never sees an unknown zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Zone {
    /// Server room. Admin only.
    ServerRoom,
    /// Laboratory.
    Lab,
    /// General office floor.
    OfficeFloor,
    /// Public lobby. The one zone visitors may enter.
    Lobby,
}

impl Zone {
    /// All zones, in menu order.
    pub const ALL: [Zone; 4] = [Zone::ServerRoom, Zone::Lab, Zone::OfficeFloor, Zone::Lobby];

    /// Returns the credential-store spelling of this zone.
    pub fn as_str(self) -> &'static str {
        match self {
            Zone::ServerRoom => "SERVER_ROOM",
            Zone::Lab => "LAB",
            Zone::OfficeFloor => "OFFICE_FLOOR",
            Zone::Lobby => "LOBBY",
        }
    }
}

impl Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a zone in the closed set.
///
/// This is a data-integrity condition: it can only arise from untrusted
/// input (a malformed file row or CLI argument), never from within the
/// system.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown zone: {0}")]
pub struct ZoneParseError(pub String);

impl FromStr for Zone {
    type Err = ZoneParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SERVER_ROOM" => Ok(Zone::ServerRoom),
            "LAB" => Ok(Zone::Lab),
            "OFFICE_FLOOR" => Ok(Zone::OfficeFloor),
            "LOBBY" => Ok(Zone::Lobby),
            other => Err(ZoneParseError(other.to_string())),
        }
    }
}

// ============================================================================
// Badge validity - consumable visitor privilege
// ============================================================================

/// A visitor's remaining count of permitted successful zone entries.
///
/// **Invariants:**
/// - Never negative (by representation).
/// - Only ever decreases, by exactly 1, and only through [`consume`](Self::consume).
/// - Once it reaches 0 the visitor is permanently expired; no replenishment
///   operation exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BadgeValidity(u32);

impl BadgeValidity {
    pub fn new(entries: u32) -> Self {
        Self(entries)
    }

    /// Remaining successful entries.
    pub fn remaining(self) -> u32 {
        self.0
    }

    /// Whether the badge has no entries left.
    pub fn is_expired(self) -> bool {
        self.0 == 0
    }

    /// Consumes one entry. Returns `false` (and leaves the count at 0)
    /// if the badge is already expired.
    ///
    /// Callers must check [`is_expired`](Self::is_expired) first and treat
    /// an expired badge as a distinct outcome; `consume` merely refuses to
    /// underflow.
    pub fn consume(&mut self) -> bool {
        if self.0 == 0 {
            return false;
        }
        self.0 -= 1;
        true
    }
}

impl Display for BadgeValidity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for BadgeValidity {
    fn from(entries: u32) -> Self {
        Self(entries)
    }
}

impl From<BadgeValidity> for u32 {
    fn from(badge: BadgeValidity) -> Self {
        badge.0
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("SERVER_ROOM", Zone::ServerRoom)]
    #[test_case("LAB", Zone::Lab)]
    #[test_case("OFFICE_FLOOR", Zone::OfficeFloor)]
    #[test_case("LOBBY", Zone::Lobby)]
    fn zone_round_trips_through_its_spelling(spelling: &str, zone: Zone) {
        assert_eq!(spelling.parse::<Zone>().unwrap(), zone);
        assert_eq!(zone.to_string(), spelling);
    }

    #[test]
    fn unknown_zone_string_is_rejected() {
        let err = "BROOM_CLOSET".parse::<Zone>().unwrap_err();
        assert_eq!(err, ZoneParseError("BROOM_CLOSET".to_string()));
    }

    #[test]
    fn zone_serde_uses_file_vocabulary() {
        let json = serde_json::to_string(&Zone::ServerRoom).unwrap();
        assert_eq!(json, "\"SERVER_ROOM\"");
        let zone: Zone = serde_json::from_str("\"LOBBY\"").unwrap();
        assert_eq!(zone, Zone::Lobby);
    }

    #[test]
    fn badge_consumes_down_to_zero_and_stops() {
        let mut badge = BadgeValidity::new(2);
        assert!(!badge.is_expired());

        assert!(badge.consume());
        assert_eq!(badge.remaining(), 1);

        assert!(badge.consume());
        assert_eq!(badge.remaining(), 0);
        assert!(badge.is_expired());

        // Expired badge refuses further consumption
        assert!(!badge.consume());
        assert_eq!(badge.remaining(), 0);
    }

    #[test]
    fn zero_entry_badge_starts_expired() {
        let badge = BadgeValidity::new(0);
        assert!(badge.is_expired());
    }

    #[test]
    fn user_id_is_opaque_and_displays_verbatim() {
        let id = UserId::new("U042");
        assert_eq!(id.as_str(), "U042");
        assert_eq!(id.to_string(), "U042");
        assert_eq!(String::from(id), "U042");
    }
}
