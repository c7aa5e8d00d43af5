//! Operator CLI for the CRM core.
//!
//! # Responsibility
//! - Wire configuration, logging and the local backend the way an app shell would.
//! - Offer smoke checks for sign-in, menus and notifications.

use clap::{Parser, Subcommand};
use crm_core::access::navigation::{compose_menu, quick_actions, MenuEntry};
use crm_core::backend::LocalBackend;
use crm_core::model::profile::UserProfile;
use crm_core::store::{NotificationStore, SessionState, SessionStore};
use crm_core::{core_version, init_logging_from_config, ping, CrmConfig, PermissionTable, Role};
use log::{info, warn};
use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "crm", version, about = "CRM core operator tool")]
struct Cli {
    /// Config file layered under `CRM_*` environment overrides.
    #[arg(long, default_value = crm_core::config::DEFAULT_CONFIG_FILE)]
    config: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Checks that the core library links.
    Ping,
    /// Creates the first System Admin.
    BootstrapAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        name: String,
    },
    /// Signs in and prints the resolved profile and menu.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Prints the profile of the stored session.
    Whoami,
    /// Prints the sidebar a role would see.
    Menu {
        #[arg(long)]
        role: String,
    },
    /// Lists the signed-in user's notifications.
    Notifications,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    if let Command::Ping = cli.command {
        println!("crm_core ping={}", ping());
        println!("crm_core version={}", core_version());
        return Ok(());
    }

    let config = CrmConfig::load_from(&cli.config)?;
    if let Err(err) = init_logging_from_config(&config) {
        eprintln!("warning: logging disabled: {err}");
    }
    info!(
        "event=cli_start module=cli status=ok command={}",
        command_name(&cli.command)
    );

    if let Command::Menu { role } = &cli.command {
        let role = Role::parse(role).ok_or_else(|| format!("unknown role `{role}`"))?;
        print_menu(role);
        return Ok(());
    }

    let backend = Arc::new(LocalBackend::open(&config.database_path)?);
    let session = SessionStore::new(Arc::clone(&backend), config.default_role());

    match cli.command {
        Command::Ping | Command::Menu { .. } => Ok(()),
        Command::BootstrapAdmin {
            email,
            password,
            name,
        } => {
            let profile = backend.bootstrap_admin(&email, &password, &name)?;
            println!("created System Admin {} <{}>", profile.name, profile.email);
            Ok(())
        }
        Command::Login { email, password } => {
            let state = session.login(&email, &password)?;
            let profile = signed_in_profile(state, session.last_error())?;
            print_profile(&profile);
            print_menu(profile.role);
            Ok(())
        }
        Command::Logout => {
            session.restore_session();
            session.logout()?;
            println!("signed out");
            Ok(())
        }
        Command::Whoami => {
            let profile = signed_in_profile(session.restore_session(), session.last_error())?;
            print_profile(&profile);
            Ok(())
        }
        Command::Notifications => {
            let profile = signed_in_profile(session.restore_session(), session.last_error())?;
            let store = NotificationStore::new(Arc::clone(&backend));
            store.set_user(Some(profile.id));
            store.refresh()?;
            let notifications = store.notifications();
            if notifications.is_empty() {
                println!("no notifications");
            }
            for notification in &notifications {
                let marker = if notification.read { " " } else { "*" };
                println!(
                    "{marker} [{}] {}: {}",
                    notification.kind, notification.title, notification.message
                );
            }
            println!("unread={}", store.unread_count());
            Ok(())
        }
    }
}

fn signed_in_profile(
    state: SessionState,
    last_error: Option<String>,
) -> Result<UserProfile, Box<dyn Error>> {
    match state {
        SessionState::Authenticated(profile) => Ok(profile),
        SessionState::Disabled(profile) => {
            warn!("event=cli_session module=cli status=error error_code=disabled");
            Err(format!("account {} is disabled", profile.email).into())
        }
        SessionState::Unauthenticated | SessionState::Resolving => Err(last_error
            .unwrap_or_else(|| "not signed in".to_string())
            .into()),
    }
}

fn print_profile(profile: &UserProfile) {
    println!("{} <{}>", profile.name, profile.email);
    println!("role={}", profile.role);
}

fn print_menu(role: Role) {
    let menu: Vec<&MenuEntry> = compose_menu(role);
    for entry in menu {
        println!("{:<16}{}", entry.label, entry.route.path());
    }
    for action in quick_actions(PermissionTable::builtin(), role) {
        println!("+ {:<14}{}", action.label, action.href());
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Ping => "ping",
        Command::BootstrapAdmin { .. } => "bootstrap-admin",
        Command::Login { .. } => "login",
        Command::Logout => "logout",
        Command::Whoami => "whoami",
        Command::Menu { .. } => "menu",
        Command::Notifications => "notifications",
    }
}
