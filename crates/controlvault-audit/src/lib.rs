//! controlvault-audit: access audit logging for `ControlVault`
//!
//! Implements the audit sink of the vault: every authentication attempt,
//! access decision, registration, and attendance event is recorded as a
//! structured, immutable entry.
//!
//! # Architecture
//!
//! ```text
//! AuditLog = {
//!     events: Vec<AuditEvent>,          // Append-only, immutable
//!     append(action, actor) -> Uuid,
//!     query(filter) -> Vec<&Event>,
//!     export_json(filter) -> String,
//! }
//! ```
//!
//! The log is append-only: events cannot be modified or deleted after
//! insertion — the API provides no mutation or deletion methods. Grants,
//! denials, and badge expiries are distinct event kinds; no outcome is
//! ever collapsed into a boolean.
//!
//! With a journal attached, every appended event is additionally written
//! as one JSON line to a flat file (fsync before returning) and replayed
//! on the next open.
//!
//! # Example
//!
//! ```
//! use controlvault_audit::{AuditAction, AuditLog, AuditQuery};
//! use controlvault_types::{UserId, Zone};
//!
//! let mut log = AuditLog::new();
//!
//! log.append(
//!     AuditAction::AccessGranted {
//!         user_id: UserId::new("U001"),
//!         username: "alice".into(),
//!         zone: Zone::Lobby,
//!         role: "ADMIN".into(),
//!     },
//!     Some("alice".into()),
//! )?;
//!
//! let query = AuditQuery::default().with_user("alice");
//! assert_eq!(log.query(&query).len(), 1);
//! # Ok::<(), controlvault_audit::AuditError>(())
//! ```

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use controlvault_rbac::{EntrySink, Role, UserRecord};
use controlvault_types::{UserId, Zone};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

/// Errors that can occur while appending to or replaying the audit log.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Journal I/O failed.
    #[error("audit journal i/o failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A journal line is not a valid event.
    #[error("malformed audit journal line {line}: {source}")]
    MalformedJournal {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Event serialization failed.
    #[error("audit serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AuditError>;

/// What happened, with the structured context needed for later review.
///
/// Role fields carry the credential-store spelling so events stay
/// readable even for records whose role string was outside the closed
/// set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    // -- Authentication --
    /// A login attempt succeeded.
    LoginSucceeded {
        user_id: UserId,
        username: String,
        role: String,
    },
    /// A login attempt failed (unknown user or bad credentials).
    LoginFailed { username: String, reason: String },

    // -- Access decisions --
    /// A zone entry was granted.
    AccessGranted {
        user_id: UserId,
        username: String,
        zone: Zone,
        role: String,
    },
    /// A zone entry was refused by policy.
    AccessDenied {
        user_id: UserId,
        username: String,
        zone: Zone,
        reason: String,
    },
    /// A visitor was refused because their badge was already spent.
    ///
    /// Distinct from [`AuditAction::AccessDenied`], mirroring the verdict
    /// taxonomy: an expiry is not a policy denial.
    BadgeExpired {
        user_id: UserId,
        username: String,
        zone: Zone,
    },

    // -- Directory changes --
    /// A new user was registered.
    UserRegistered {
        user_id: UserId,
        username: String,
        role: String,
        registered_by: String,
    },

    // -- Attendance --
    /// An employee checked in.
    CheckedIn { user_id: UserId, username: String },
    /// An employee checked out.
    CheckedOut { user_id: UserId, username: String },
}

impl AuditAction {
    /// Returns the action type prefix for filtering (e.g. "Access",
    /// "Login", "Attendance").
    fn action_type_prefix(&self) -> &'static str {
        match self {
            Self::LoginSucceeded { .. } | Self::LoginFailed { .. } => "Login",
            Self::AccessGranted { .. } | Self::AccessDenied { .. } | Self::BadgeExpired { .. } => {
                "Access"
            }
            Self::UserRegistered { .. } => "UserRegistered",
            Self::CheckedIn { .. } | Self::CheckedOut { .. } => "Attendance",
        }
    }

    /// Check if this action references the given user, by username or id.
    fn matches_user(&self, needle: &str) -> bool {
        match self {
            Self::LoginFailed { username, .. } => username == needle,

            Self::LoginSucceeded {
                user_id, username, ..
            }
            | Self::AccessGranted {
                user_id, username, ..
            }
            | Self::AccessDenied {
                user_id, username, ..
            }
            | Self::BadgeExpired {
                user_id, username, ..
            }
            | Self::UserRegistered {
                user_id, username, ..
            }
            | Self::CheckedIn { user_id, username }
            | Self::CheckedOut { user_id, username } => {
                username == needle || user_id.as_str() == needle
            }
        }
    }
}

/// A single audit event with full context.
///
/// Once appended to the log, an event is immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    pub action: AuditAction,
    /// Who performed the action (operator, system, etc.).
    pub actor: Option<String>,
}

/// Query filter for the audit log.
///
/// All fields are optional; set fields combine with AND logic. Use the
/// builder methods for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct AuditQuery {
    pub user: Option<String>,
    pub action_type: Option<String>,
    pub actor: Option<String>,
    pub time_from: Option<DateTime<Utc>>,
    pub time_to: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl AuditQuery {
    /// Filter to events referencing the given user (username or id).
    pub fn with_user(mut self, user: &str) -> Self {
        self.user = Some(user.to_string());
        self
    }

    /// Filter by action type prefix ("Login", "Access", "Attendance",
    /// "UserRegistered").
    pub fn with_action_type(mut self, action_type: &str) -> Self {
        self.action_type = Some(action_type.to_string());
        self
    }

    /// Filter by the actor who performed the action.
    pub fn with_actor(mut self, actor: &str) -> Self {
        self.actor = Some(actor.to_string());
        self
    }

    /// Filter to events within a time range (inclusive).
    pub fn with_time_range(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.time_from = Some(from);
        self.time_to = Some(to);
        self
    }

    /// Limit the number of results returned.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Immutable, append-only audit log, optionally journaled to disk.
#[derive(Debug, Default)]
pub struct AuditLog {
    events: Vec<AuditEvent>,
    journal: Option<Journal>,
}

#[derive(Debug)]
struct Journal {
    path: PathBuf,
    file: File,
}

impl AuditLog {
    /// Creates a new, empty, in-memory log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a log journaled to the given path.
    ///
    /// Existing journal lines are replayed into memory (preserving their
    /// original ids and timestamps) and new events are appended to the
    /// file with fsync before `append` returns.
    pub fn with_journal(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut events = Vec::new();

        if path.exists() {
            let file = File::open(&path).map_err(|source| AuditError::Io {
                path: path.clone(),
                source,
            })?;
            for (idx, line) in BufReader::new(file).lines().enumerate() {
                let line = line.map_err(|source| AuditError::Io {
                    path: path.clone(),
                    source,
                })?;
                if line.trim().is_empty() {
                    continue;
                }
                let event: AuditEvent = serde_json::from_str(&line).map_err(|source| {
                    AuditError::MalformedJournal {
                        line: idx + 1,
                        source,
                    }
                })?;
                events.push(event);
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| AuditError::Io {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            events,
            journal: Some(Journal { path, file }),
        })
    }

    /// Appends an audit event and returns its unique ID.
    ///
    /// The event is timestamped at the moment of insertion. With a
    /// journal attached, the JSON line is on disk before this returns.
    ///
    /// # Assertions
    ///
    /// - Post: event count increases by exactly 1
    pub fn append(&mut self, action: AuditAction, actor: Option<String>) -> Result<Uuid> {
        let count_before = self.events.len();

        let event = AuditEvent {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            action,
            actor,
        };

        if let Some(journal) = &mut self.journal {
            let line = serde_json::to_string(&event)?;
            writeln!(journal.file, "{line}").map_err(|source| AuditError::Io {
                path: journal.path.clone(),
                source,
            })?;
            journal.file.sync_all().map_err(|source| AuditError::Io {
                path: journal.path.clone(),
                source,
            })?;
        }

        let event_id = event.event_id;
        self.events.push(event);

        // Post-condition: exactly one event was added
        assert_eq!(
            self.events.len(),
            count_before + 1,
            "audit log append must increase event count by exactly 1"
        );

        Ok(event_id)
    }

    /// Query events matching the given filter.
    ///
    /// All filter fields use AND logic. An empty query returns all
    /// events, in insertion (chronological) order.
    pub fn query(&self, filter: &AuditQuery) -> Vec<&AuditEvent> {
        let mut results: Vec<&AuditEvent> = self
            .events
            .iter()
            .filter(|event| Self::matches_filter(event, filter))
            .collect();

        if let Some(limit) = filter.limit {
            results.truncate(limit);
        }

        results
    }

    /// Look up a single event by its unique ID.
    pub fn get_event(&self, event_id: Uuid) -> Option<&AuditEvent> {
        self.events.iter().find(|e| e.event_id == event_id)
    }

    /// All events recorded since the given timestamp (inclusive).
    pub fn events_since(&self, since: DateTime<Utc>) -> Vec<&AuditEvent> {
        self.events
            .iter()
            .filter(|e| e.timestamp >= since)
            .collect()
    }

    /// All events that reference the given user (username or id).
    pub fn events_for_user(&self, user: &str) -> Vec<&AuditEvent> {
        self.events
            .iter()
            .filter(|e| e.action.matches_user(user))
            .collect()
    }

    /// Total number of events in the log.
    pub fn count(&self) -> usize {
        self.events.len()
    }

    /// Export filtered events as a JSON array string.
    pub fn export_json(&self, filter: &AuditQuery) -> Result<String> {
        let events = self.query(filter);
        serde_json::to_string_pretty(&events).map_err(AuditError::from)
    }

    fn matches_filter(event: &AuditEvent, filter: &AuditQuery) -> bool {
        if let Some(ref user) = filter.user {
            if !event.action.matches_user(user) {
                return false;
            }
        }

        if let Some(ref action_type) = filter.action_type {
            if event.action.action_type_prefix() != action_type {
                return false;
            }
        }

        if let Some(ref actor) = filter.actor {
            if event.actor.as_deref() != Some(actor.as_str()) {
                return false;
            }
        }

        if let Some(from) = filter.time_from {
            if event.timestamp < from {
                return false;
            }
        }

        if let Some(to) = filter.time_to {
            if event.timestamp > to {
                return false;
            }
        }

        true
    }
}

/// The audit log doubles as the engine's zone-entry sink: a granted
/// entry is recorded as an `AccessGranted` event attributed to the user.
///
/// A journal write failure cannot be returned through the sink seam, so
/// it is reported via `tracing` instead of being silently dropped.
impl EntrySink for AuditLog {
    fn zone_entered(&mut self, user: &UserRecord, zone: Zone) {
        let action = AuditAction::AccessGranted {
            user_id: user.id().clone(),
            username: user.username().to_string(),
            zone,
            role: user.role().map_or("?", Role::as_str).to_string(),
        };

        if let Err(err) = self.append(action, Some(user.username().to_string())) {
            error!(%err, user = %user.username(), %zone, "failed to journal zone entry");
        }
    }
}
