//! Interactive access session: login, then a zone menu.
//!
//! The session wires the collaborators together: the directory
//! authenticates and owns the record, the engine decides, the audit log
//! receives every outcome, and the attendance log records employee
//! check-ins. Denials and expiries are routine outcomes here — they are
//! printed and audited, never treated as program errors.

use std::path::Path;

use anyhow::{Context, Result, bail};
use console::style;
use controlvault_audit::{AuditAction, AuditLog};
use controlvault_directory::{AttendanceLog, DirectoryError, UserDirectory};
use controlvault_rbac::{AccessEngine, ExecutionOutcome, Role, RoleState, UserRecord};
use controlvault_types::Zone;
use dialoguer::{Input, Password, Select};

pub fn run(project_dir: &Path) -> Result<()> {
    let config = super::load_site(project_dir)?;

    let mut directory = UserDirectory::open(&config.vault.users_file)
        .context("Failed to open the user directory")?;
    let mut audit = AuditLog::with_journal(&config.vault.audit_journal)
        .context("Failed to open the audit journal")?;
    let mut attendance = AttendanceLog::open(&config.vault.attendance_file)
        .context("Failed to open the attendance log")?;
    let engine = AccessEngine::new();

    println!("{}", style(format!("=== {} ===", config.site.name)).bold());

    let username = login(
        &mut directory,
        &mut audit,
        config.session.max_login_attempts,
    )?;

    loop {
        let user = directory
            .user_mut(&username)
            .context("logged-in user vanished from the directory")?;
        let is_employee = user.role() == Some(Role::Employee);

        let mut items: Vec<String> = Zone::ALL.iter().map(|z| format!("Enter {z}")).collect();
        if is_employee {
            items.push("Check in".to_string());
            items.push("Check out".to_string());
        }
        items.push("Log out".to_string());

        let choice = Select::new()
            .with_prompt("Choose action")
            .items(&items)
            .default(0)
            .interact()?;

        match choice {
            z if z < Zone::ALL.len() => {
                enter_zone(user, Zone::ALL[z], &engine, &mut audit)?;
            }
            a if is_employee && a == Zone::ALL.len() => {
                attendance.check_in(user)?;
                audit.append(
                    AuditAction::CheckedIn {
                        user_id: user.id().clone(),
                        username: username.clone(),
                    },
                    Some(username.clone()),
                )?;
                println!("Checked in.");
            }
            a if is_employee && a == Zone::ALL.len() + 1 => {
                attendance.check_out(user)?;
                audit.append(
                    AuditAction::CheckedOut {
                        user_id: user.id().clone(),
                        username: username.clone(),
                    },
                    Some(username.clone()),
                )?;
                println!("Checked out.");
            }
            _ => break,
        }
    }

    if config.session.persist_on_logout {
        directory
            .save()
            .context("Failed to persist the user directory")?;
    }
    println!("Goodbye.");
    Ok(())
}

/// Prompts for credentials until they verify or the allowed attempts
/// are exhausted. Every attempt is audited, success and failure alike.
fn login(
    directory: &mut UserDirectory,
    audit: &mut AuditLog,
    max_attempts: u32,
) -> Result<String> {
    for attempt in 1..=max_attempts {
        let username: String = Input::new().with_prompt("Username").interact_text()?;
        let password = Password::new().with_prompt("Password").interact()?;

        match directory.authenticate(&username, &password) {
            Ok(user) => {
                let action = AuditAction::LoginSucceeded {
                    user_id: user.id().clone(),
                    username: user.username().to_string(),
                    role: role_label(user),
                };
                println!("Welcome, {user}");
                audit.append(action, Some(username.clone()))?;
                return Ok(username);
            }
            Err(
                err @ (DirectoryError::UserNotFound(_) | DirectoryError::IncorrectPassword(_)),
            ) => {
                audit.append(
                    AuditAction::LoginFailed {
                        username: username.clone(),
                        reason: err.to_string(),
                    },
                    None,
                )?;
                println!("{} {err}", style("Login failed:").red());
                if attempt < max_attempts {
                    println!("Attempts remaining: {}", max_attempts - attempt);
                }
            }
            Err(err) => return Err(err.into()),
        }
    }

    bail!("too many failed login attempts")
}

/// Runs one access request end to end and renders the outcome.
///
/// A granted entry is audited by the engine's sink (the audit log
/// itself); denials and expiries are audited here, as their own event
/// kinds.
fn enter_zone(
    user: &mut UserRecord,
    zone: Zone,
    engine: &AccessEngine,
    audit: &mut AuditLog,
) -> Result<()> {
    let user_id = user.id().clone();
    let username = user.username().to_string();

    match engine.execute(&mut *user, zone, audit) {
        ExecutionOutcome::Success => {
            println!(
                "{} {username} entered {zone}",
                style("Access granted:").green()
            );
            if let Some(badge) = user.badge() {
                println!("Badge entries remaining: {badge}");
            }
        }
        ExecutionOutcome::Denied(reason) => {
            audit.append(
                AuditAction::AccessDenied {
                    user_id,
                    username: username.clone(),
                    zone,
                    reason: reason.to_string(),
                },
                Some(username),
            )?;
            println!("{} {reason}", style("Access denied:").red());
        }
        ExecutionOutcome::VisitorExpired => {
            audit.append(
                AuditAction::BadgeExpired {
                    user_id,
                    username: username.clone(),
                    zone,
                },
                Some(username),
            )?;
            println!("{}", style("Access denied: visitor badge expired.").red());
        }
    }

    Ok(())
}

/// Role string for audit events; unrecognized records keep their raw
/// role so the corrupt value is visible in the trail.
fn role_label(user: &UserRecord) -> String {
    match user.state() {
        RoleState::Unrecognized { raw } => raw.clone(),
        state => state.role().map_or("?", Role::as_str).to_string(),
    }
}
