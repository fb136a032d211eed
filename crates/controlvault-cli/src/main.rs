//! ControlVault unified CLI.
//!
//! Role-based access control for protected sites.
//!
//! # Quick Start
//!
//! ```bash
//! # Initialize a site directory
//! controlvault init ./site
//!
//! # Register the first users
//! controlvault users register --id U001 --username alice --password s3cret --role admin -p ./site
//!
//! # Run an interactive access session
//! controlvault session -p ./site
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// ControlVault - role-based access control for protected sites.
#[derive(Parser)]
#[command(name = "controlvault")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information.
    Version,

    /// Initialize a new site directory.
    Init {
        /// Path to the site directory to create.
        path: PathBuf,
    },

    /// Run an interactive access session (login, then a zone menu).
    Session {
        /// Site directory holding controlvault.toml and the data files.
        #[arg(short, long, default_value = ".")]
        project_dir: PathBuf,
    },

    /// User directory management.
    #[command(subcommand)]
    Users(UserCommands),

    /// Audit log inspection.
    #[command(subcommand)]
    Audit(AuditCommands),
}

#[derive(Subcommand)]
enum UserCommands {
    /// List all users in the directory.
    List {
        /// Site directory.
        #[arg(short, long, default_value = ".")]
        project_dir: PathBuf,
    },

    /// Register a new user.
    Register {
        /// User id as issued by the credential store (e.g. U001).
        #[arg(long)]
        id: String,

        /// Username used to log in.
        #[arg(long)]
        username: String,

        /// Opaque password token.
        #[arg(long)]
        password: String,

        /// Role: admin, employee, or visitor.
        #[arg(long)]
        role: String,

        /// Badge validity (number of entries) - visitors only.
        #[arg(long)]
        badge: Option<u32>,

        /// Operator recorded in the audit trail.
        #[arg(long, default_value = "cli")]
        registered_by: String,

        /// Site directory.
        #[arg(short, long, default_value = ".")]
        project_dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum AuditCommands {
    /// Query the audit log.
    Query {
        /// Filter to events referencing this user (username or id).
        #[arg(long)]
        user: Option<String>,

        /// Filter by action type: Login, Access, Attendance, UserRegistered.
        #[arg(long)]
        action_type: Option<String>,

        /// Filter by the actor who performed the action.
        #[arg(long)]
        actor: Option<String>,

        /// Maximum number of events to show.
        #[arg(long)]
        limit: Option<usize>,

        /// Site directory.
        #[arg(short, long, default_value = ".")]
        project_dir: PathBuf,
    },

    /// Export the audit log as JSON.
    Export {
        /// Output file (stdout when omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Site directory.
        #[arg(short, long, default_value = ".")]
        project_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Version => {
            commands::version::run();
            Ok(())
        }
        Commands::Init { path } => commands::init::run(&path),
        Commands::Session { project_dir } => commands::session::run(&project_dir),
        Commands::Users(cmd) => match cmd {
            UserCommands::List { project_dir } => commands::users::list(&project_dir),
            UserCommands::Register {
                id,
                username,
                password,
                role,
                badge,
                registered_by,
                project_dir,
            } => commands::users::register(
                &project_dir,
                &id,
                &username,
                &password,
                &role,
                badge,
                &registered_by,
            ),
        },
        Commands::Audit(cmd) => match cmd {
            AuditCommands::Query {
                user,
                action_type,
                actor,
                limit,
                project_dir,
            } => commands::audit::query(
                &project_dir,
                user.as_deref(),
                action_type.as_deref(),
                actor.as_deref(),
                limit,
            ),
            AuditCommands::Export {
                output,
                project_dir,
            } => commands::audit::export(&project_dir, output.as_deref()),
        },
    }
}
