//! # controlvault-rbac: Role-Based Access Control
//!
//! The authorization core of `ControlVault`:
//! - **Role-based access control** (3 roles: Admin, Employee, Visitor)
//! - **Consumable visitor privileges** (badge validity, decremented on
//!   successful entry)
//! - **Structured verdicts** (every denial and expiry is a distinct,
//!   observable value — never a bare boolean)
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Access Request (user record + zone)         │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  AccessEngine                                │
//! │  ├─ Role × zone decision table               │
//! │  ├─ Visitor badge check + consumption        │
//! │  └─ Entry notification (EntrySink)           │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  Verdict                                     │
//! │  - Allowed (badge consumed if visitor)       │
//! │  - Denied { role forbids zone, unknown role }│
//! │  - VisitorExpired                            │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Decision table
//!
//! | Role     | ServerRoom | Lab | OfficeFloor | Lobby |
//! |----------|------------|-----|-------------|-------|
//! | Admin    | ✓          | ✓   | ✓           | ✓     |
//! | Employee | ✗          | ✓   | ✓           | ✓     |
//! | Visitor  | ✗          | ✗   | ✗           | ✓*    |
//!
//! \* A visitor entry additionally requires a non-expired badge and
//! consumes one badge entry on success. An expired badge takes precedence
//! over the zone check: `VisitorExpired` is returned even for the lobby.
//!
//! ## Examples
//!
//! ```
//! use controlvault_rbac::{AccessEngine, UserRecord, Verdict};
//! use controlvault_types::{BadgeValidity, UserId, Zone};
//!
//! let engine = AccessEngine::new().without_audit();
//!
//! let mut visitor = UserRecord::visitor(
//!     UserId::new("V001"),
//!     "guest",
//!     "hunter2",
//!     BadgeValidity::new(1),
//! );
//!
//! // The lobby entry is granted and consumes the badge.
//! assert_eq!(engine.decide(&mut visitor, Zone::Lobby), Verdict::Allowed);
//!
//! // The badge is now spent: the next attempt is expired, not denied.
//! assert_eq!(engine.decide(&mut visitor, Zone::Lobby), Verdict::VisitorExpired);
//! ```

pub mod enforcement;
pub mod roles;
pub mod user;

// Re-export commonly used types
pub use enforcement::{
    AccessEngine, DenialReason, EntrySink, ExecutionOutcome, NoopSink, Verdict,
};
pub use roles::{Role, RoleParseError};
pub use user::{RoleState, UserRecord};
