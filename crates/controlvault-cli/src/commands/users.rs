//! User directory management commands.

use std::path::Path;

use anyhow::{Result, bail};
use console::style;
use controlvault_audit::{AuditAction, AuditLog};
use controlvault_directory::UserDirectory;
use controlvault_rbac::{Role, UserRecord};
use controlvault_types::{BadgeValidity, UserId};

pub fn list(project_dir: &Path) -> Result<()> {
    let config = super::load_site(project_dir)?;
    let directory = UserDirectory::open(&config.vault.users_file)?;

    if directory.is_empty() {
        println!("No users registered yet.");
        return Ok(());
    }

    for record in directory.iter() {
        println!("{record}");
    }
    println!();
    println!("{} user(s)", directory.len());

    Ok(())
}

pub fn register(
    project_dir: &Path,
    id: &str,
    username: &str,
    password: &str,
    role: &str,
    badge: Option<u32>,
    registered_by: &str,
) -> Result<()> {
    let config = super::load_site(project_dir)?;
    let mut directory = UserDirectory::open(&config.vault.users_file)?;
    let mut audit = AuditLog::with_journal(&config.vault.audit_journal)?;

    let role: Role = role.to_uppercase().parse()?;

    let record = match (role, badge) {
        (Role::Visitor, Some(entries)) => UserRecord::visitor(
            UserId::new(id),
            username,
            password,
            BadgeValidity::new(entries),
        ),
        (Role::Visitor, None) => bail!("visitors need --badge (number of permitted entries)"),
        (_, Some(_)) => bail!("--badge only applies to visitors"),
        (Role::Admin, None) => UserRecord::admin(UserId::new(id), username, password),
        (Role::Employee, None) => UserRecord::employee(UserId::new(id), username, password),
    };

    directory.register(record)?;
    audit.append(
        AuditAction::UserRegistered {
            user_id: UserId::new(id),
            username: username.to_string(),
            role: role.to_string(),
            registered_by: registered_by.to_string(),
        },
        Some(registered_by.to_string()),
    )?;

    println!(
        "{} {role} {username} (ID: {id})",
        style("Registered:").green()
    );

    Ok(())
}
