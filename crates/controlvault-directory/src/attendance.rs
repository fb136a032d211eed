//! Employee attendance log.
//!
//! Append-only, line-based record of check-in/check-out events. One CSV
//! row per event:
//!
//! ```text
//! timestamp,userId,username,CHECK_IN|CHECK_OUT
//! ```
//!
//! Attendance is an employee-only operation; other roles get a typed
//! error. The log sits outside the authorization core — recording
//! attendance is not an access decision and consults no policy.

use std::fmt::{self, Display};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use controlvault_rbac::{Role, UserRecord};
use controlvault_types::UserId;
use serde::{Deserialize, Serialize};

/// Errors that can occur while recording or replaying attendance.
#[derive(thiserror::Error, Debug)]
pub enum AttendanceError {
    /// Attendance file I/O failed.
    #[error("attendance log i/o failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Only employees record attendance.
    #[error("attendance is employee-only; {username} is not an employee")]
    NotAnEmployee { username: String },

    /// A replayed row is structurally broken.
    #[error("malformed attendance row at line {line}: {reason}")]
    MalformedEntry { line: usize, reason: String },
}

/// Kind of attendance event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceEvent {
    CheckIn,
    CheckOut,
}

impl AttendanceEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceEvent::CheckIn => "CHECK_IN",
            AttendanceEvent::CheckOut => "CHECK_OUT",
        }
    }
}

impl Display for AttendanceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CHECK_IN" => Ok(AttendanceEvent::CheckIn),
            "CHECK_OUT" => Ok(AttendanceEvent::CheckOut),
            other => Err(format!("unknown attendance event: {other}")),
        }
    }
}

/// One replayed attendance row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceEntry {
    pub timestamp: DateTime<Utc>,
    pub user_id: UserId,
    pub username: String,
    pub event: AttendanceEvent,
}

/// Append-only attendance log backed by a flat file.
#[derive(Debug)]
pub struct AttendanceLog {
    path: PathBuf,
    file: File,
}

impl AttendanceLog {
    /// Opens (or creates) the attendance file for appending.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AttendanceError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| AttendanceError::Io {
                path: path.clone(),
                source,
            })?;

        Ok(Self { path, file })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records a check-in for an employee.
    pub fn check_in(&mut self, user: &UserRecord) -> Result<(), AttendanceError> {
        self.append(user, AttendanceEvent::CheckIn)
    }

    /// Records a check-out for an employee.
    pub fn check_out(&mut self, user: &UserRecord) -> Result<(), AttendanceError> {
        self.append(user, AttendanceEvent::CheckOut)
    }

    fn append(&mut self, user: &UserRecord, event: AttendanceEvent) -> Result<(), AttendanceError> {
        if user.role() != Some(Role::Employee) {
            return Err(AttendanceError::NotAnEmployee {
                username: user.username().to_string(),
            });
        }

        writeln!(
            self.file,
            "{},{},{},{event}",
            Utc::now().to_rfc3339(),
            user.id(),
            user.username()
        )
        .map_err(|source| AttendanceError::Io {
            path: self.path.clone(),
            source,
        })?;

        // The row is on disk before we report success.
        self.file.sync_all().map_err(|source| AttendanceError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Replays all recorded events, in append order.
    pub fn replay(&self) -> Result<Vec<AttendanceEntry>, AttendanceError> {
        let file = File::open(&self.path).map_err(|source| AttendanceError::Io {
            path: self.path.clone(),
            source,
        })?;

        let mut entries = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|source| AttendanceError::Io {
                path: self.path.clone(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            entries.push(parse_entry(&line, idx + 1)?);
        }

        Ok(entries)
    }
}

fn parse_entry(line: &str, line_no: usize) -> Result<AttendanceEntry, AttendanceError> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(AttendanceError::MalformedEntry {
            line: line_no,
            reason: format!("expected 4 fields, found {}", parts.len()),
        });
    }

    let timestamp = DateTime::parse_from_rfc3339(parts[0])
        .map_err(|err| AttendanceError::MalformedEntry {
            line: line_no,
            reason: format!("bad timestamp: {err}"),
        })?
        .with_timezone(&Utc);

    let event = parts[3]
        .parse::<AttendanceEvent>()
        .map_err(|reason| AttendanceError::MalformedEntry {
            line: line_no,
            reason,
        })?;

    Ok(AttendanceEntry {
        timestamp,
        user_id: UserId::new(parts[1]),
        username: parts[2].to_string(),
        event,
    })
}
