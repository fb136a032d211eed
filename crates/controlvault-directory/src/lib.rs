//! controlvault-directory: the user directory for `ControlVault`
//!
//! Exclusive owner of user records. The directory is populated from a
//! line-based credential store and hands out `&mut UserRecord` handles to
//! the caller; the policy engine is the only component that mutates badge
//! state through those handles.
//!
//! # Credential store format
//!
//! One record per line, comma separated, blank lines ignored:
//!
//! ```text
//! userId,username,password,role[,badgeValidity]
//! ```
//!
//! The trailing badge field is present only for `VISITOR` rows:
//!
//! ```text
//! U001,alice,s3cret,ADMIN
//! U002,bob,hunter2,EMPLOYEE
//! V001,carol,guest,VISITOR,3
//! ```
//!
//! A row whose role string is outside the closed set still loads — as a
//! defensive `Unrecognized` record that the engine denies everywhere —
//! so corrupt data is observable and auditable instead of silently
//! dropped. Structurally broken rows (missing fields, non-numeric badge)
//! are load errors.
//!
//! # Example
//!
//! ```no_run
//! use controlvault_directory::UserDirectory;
//!
//! let mut directory = UserDirectory::open("data/users.txt")?;
//! let user = directory.authenticate("alice", "s3cret")?;
//! println!("welcome {user}");
//! # Ok::<(), controlvault_directory::DirectoryError>(())
//! ```

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use controlvault_rbac::{Role, RoleState, UserRecord};
use controlvault_types::{BadgeValidity, UserId};
use tracing::{debug, warn};

pub mod attendance;

pub use attendance::{AttendanceEntry, AttendanceError, AttendanceEvent, AttendanceLog};

/// Errors that can occur while loading, querying, or persisting the
/// directory.
///
/// `UserNotFound` and `IncorrectPassword` are authentication failures:
/// they belong to this collaborator and never reach the policy engine,
/// which assumes an already-authenticated record.
#[derive(thiserror::Error, Debug)]
pub enum DirectoryError {
    /// Credential store I/O failed.
    #[error("credential store i/o failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A row is structurally broken (too few fields, bad badge count).
    #[error("malformed credential row at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    /// No record exists for the username.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// The record exists but the credential token does not match.
    #[error("incorrect password for user: {0}")]
    IncorrectPassword(String),

    /// Registration would shadow an existing username.
    #[error("duplicate username: {0}")]
    DuplicateUser(String),
}

/// In-memory mapping from username to user record, backed by a flat
/// credential file.
///
/// Records live for the process lifetime; the directory never deletes
/// them. Badge consumption happens in memory through the engine and
/// becomes durable only via [`save`](Self::save) — there is no
/// transactionality.
#[derive(Debug)]
pub struct UserDirectory {
    /// Path of the backing credential store.
    path: PathBuf,
    /// Records keyed by username.
    users: HashMap<String, UserRecord>,
}

impl UserDirectory {
    /// Opens a directory backed by the given credential store.
    ///
    /// A missing file yields an empty directory (the store is created on
    /// first [`register`](Self::register) or [`save`](Self::save)).
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let path = path.as_ref().to_path_buf();
        let mut users = HashMap::new();

        if path.exists() {
            let file = File::open(&path).map_err(|source| DirectoryError::Io {
                path: path.clone(),
                source,
            })?;

            for (idx, line) in BufReader::new(file).lines().enumerate() {
                let line = line.map_err(|source| DirectoryError::Io {
                    path: path.clone(),
                    source,
                })?;
                if line.trim().is_empty() {
                    continue;
                }

                let record = parse_record(&line, idx + 1)?;
                users.insert(record.username().to_string(), record);
            }
        }

        debug!(path = %path.display(), count = users.len(), "user directory loaded");
        Ok(Self { path, users })
    }

    /// Path of the backing credential store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records in the directory.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether the directory holds no records.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Looks up a record by username.
    pub fn user(&self, username: &str) -> Option<&UserRecord> {
        self.users.get(username)
    }

    /// Looks up a record by username, mutably. The returned handle is
    /// what the caller passes to the policy engine.
    pub fn user_mut(&mut self, username: &str) -> Option<&mut UserRecord> {
        self.users.get_mut(username)
    }

    /// Iterates over all records, ordered by user id.
    pub fn iter(&self) -> impl Iterator<Item = &UserRecord> {
        let mut records: Vec<&UserRecord> = self.users.values().collect();
        records.sort_by(|a, b| a.id().cmp(b.id()));
        records.into_iter()
    }

    /// Verifies credentials and returns the mutable record on success.
    ///
    /// Credentials are compared as opaque strings; hashing and strength
    /// policy are out of scope by design.
    pub fn authenticate(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<&mut UserRecord, DirectoryError> {
        let user = self
            .users
            .get_mut(username)
            .ok_or_else(|| DirectoryError::UserNotFound(username.to_string()))?;

        if !user.verify_password(password) {
            return Err(DirectoryError::IncorrectPassword(username.to_string()));
        }

        Ok(user)
    }

    /// Registers a new record: appends its row to the credential store,
    /// then inserts it into the map.
    ///
    /// Rejects usernames that already exist.
    pub fn register(&mut self, record: UserRecord) -> Result<(), DirectoryError> {
        if self.users.contains_key(record.username()) {
            return Err(DirectoryError::DuplicateUser(record.username().to_string()));
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| DirectoryError::Io {
                path: self.path.clone(),
                source,
            })?;

        writeln!(file, "{}", serialize_record(&record)).map_err(|source| DirectoryError::Io {
            path: self.path.clone(),
            source,
        })?;
        file.sync_all().map_err(|source| DirectoryError::Io {
            path: self.path.clone(),
            source,
        })?;

        self.users.insert(record.username().to_string(), record);
        Ok(())
    }

    /// Rewrites the credential store from the in-memory map, making any
    /// badge consumption durable. Rows are ordered by user id so the file
    /// is deterministic.
    pub fn save(&self) -> Result<(), DirectoryError> {
        let mut file = File::create(&self.path).map_err(|source| DirectoryError::Io {
            path: self.path.clone(),
            source,
        })?;

        for record in self.iter() {
            writeln!(file, "{}", serialize_record(record)).map_err(|source| {
                DirectoryError::Io {
                    path: self.path.clone(),
                    source,
                }
            })?;
        }

        file.sync_all().map_err(|source| DirectoryError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Parses one credential row.
///
/// `line_no` is 1-based, for error reporting.
fn parse_record(line: &str, line_no: usize) -> Result<UserRecord, DirectoryError> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();

    if parts.len() < 4 {
        return Err(DirectoryError::MalformedRecord {
            line: line_no,
            reason: format!("expected at least 4 fields, found {}", parts.len()),
        });
    }

    let id = UserId::new(parts[0]);
    let username = parts[1];
    let password = parts[2];

    let state = match parts[3].parse::<Role>() {
        Ok(Role::Admin) => RoleState::Admin,
        Ok(Role::Employee) => RoleState::Employee,
        Ok(Role::Visitor) => {
            let raw_badge = parts.get(4).ok_or_else(|| DirectoryError::MalformedRecord {
                line: line_no,
                reason: "visitor row is missing the badge validity field".to_string(),
            })?;
            let badge: u32 =
                raw_badge
                    .parse()
                    .map_err(|_| DirectoryError::MalformedRecord {
                        line: line_no,
                        reason: format!("badge validity is not a non-negative integer: {raw_badge}"),
                    })?;
            RoleState::Visitor {
                badge: BadgeValidity::new(badge),
            }
        }
        Err(err) => {
            // Defensive load: the engine denies this record everywhere,
            // and every attempt it makes is auditable.
            warn!(line = line_no, username, %err, "credential row carries an unrecognized role");
            RoleState::Unrecognized {
                raw: parts[3].to_string(),
            }
        }
    };

    Ok(UserRecord::new(id, username, password, state))
}

/// Serializes a record back to its credential-store row.
fn serialize_record(record: &UserRecord) -> String {
    match record.state() {
        RoleState::Visitor { badge } => format!(
            "{},{},{},{},{}",
            record.id(),
            record.username(),
            record.password(),
            Role::Visitor,
            badge
        ),
        RoleState::Unrecognized { raw } => format!(
            "{},{},{},{raw}",
            record.id(),
            record.username(),
            record.password()
        ),
        state => {
            let role = state.role().map_or("?", Role::as_str);
            format!(
                "{},{},{},{role}",
                record.id(),
                record.username(),
                record.password()
            )
        }
    }
}
