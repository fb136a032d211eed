//! Audit log inspection commands.

use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use controlvault_audit::{AuditAction, AuditEvent, AuditLog, AuditQuery};

pub fn query(
    project_dir: &Path,
    user: Option<&str>,
    action_type: Option<&str>,
    actor: Option<&str>,
    limit: Option<usize>,
) -> Result<()> {
    let log = open_log(project_dir)?;

    let mut filter = AuditQuery::default();
    if let Some(user) = user {
        filter = filter.with_user(user);
    }
    if let Some(action_type) = action_type {
        filter = filter.with_action_type(action_type);
    }
    if let Some(actor) = actor {
        filter = filter.with_actor(actor);
    }
    if let Some(limit) = limit {
        filter = filter.with_limit(limit);
    }

    let events = log.query(&filter);
    if events.is_empty() {
        println!("No matching audit events.");
        return Ok(());
    }

    for event in &events {
        print_event(event);
    }
    println!();
    println!("{} of {} event(s)", events.len(), log.count());

    Ok(())
}

pub fn export(project_dir: &Path, output: Option<&Path>) -> Result<()> {
    let log = open_log(project_dir)?;
    let json = log.export_json(&AuditQuery::default())?;

    match output {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "{} {} event(s) to {}",
                style("Exported").green(),
                log.count(),
                path.display()
            );
        }
        None => println!("{json}"),
    }

    Ok(())
}

fn open_log(project_dir: &Path) -> Result<AuditLog> {
    let config = super::load_site(project_dir)?;
    AuditLog::with_journal(&config.vault.audit_journal).context("Failed to open the audit journal")
}

fn print_event(event: &AuditEvent) {
    let when = event.timestamp.format("%Y-%m-%d %H:%M:%S");
    println!("[{when}] {}", describe(&event.action));
}

/// Human-readable line for one event, in the vault's log vocabulary.
fn describe(action: &AuditAction) -> String {
    match action {
        AuditAction::LoginSucceeded { username, role, .. } => {
            format!("login ok: [{role}] {username}")
        }
        AuditAction::LoginFailed { username, reason } => {
            format!("login failed for {username}: {reason}")
        }
        AuditAction::AccessGranted {
            username,
            zone,
            role,
            ..
        } => format!("[{role}] {username} entered {zone}"),
        AuditAction::AccessDenied {
            username,
            zone,
            reason,
            ..
        } => format!("{username} denied at {zone}: {reason}"),
        AuditAction::BadgeExpired { username, zone, .. } => {
            format!("{username} refused at {zone}: badge expired")
        }
        AuditAction::UserRegistered {
            username,
            role,
            registered_by,
            ..
        } => format!("registered [{role}] {username} (by {registered_by})"),
        AuditAction::CheckedIn { username, .. } => format!("{username} checked in"),
        AuditAction::CheckedOut { username, .. } => format!("{username} checked out"),
    }
}
