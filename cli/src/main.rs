mod commands;
mod config;
#[cfg(test)]
mod fake_api;
mod logging;
mod tui;

use anyhow::{Context, Result};
use clap::Parser;
use taskdeck_core::{HttpTaskApi, TaskId, TaskStore};
use tracing::info;

use crate::commands::TaskFields;
use crate::config::{Settings, StatusArg};
use crate::tui::app::App;

#[derive(Parser)]
#[command(name = "taskdeck")]
#[command(about = "Terminal client for a REST task backend", long_about = None)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Open the Terminal User Interface
    Tui,
    /// List all tasks
    List,
    /// Add a new task
    Add {
        /// Task title
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        /// Deadline (2025-01-01, tomorrow, fri, +3d, ...)
        #[arg(long)]
        deadline: Option<String>,
        /// Initial status, for backends that track one
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },
    /// Toggle completion of a task
    Done { id: String },
    /// Replace fields of a task
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        /// New deadline; an empty value clears it
        #[arg(long)]
        deadline: Option<String>,
        /// New status; `completed` also marks the task done
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },
    /// Delete a task
    Rm { id: String },
    /// Store a bearer token for --auth bearer
    Login { token: String },
    /// Forget the stored token
    Logout,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings;
    let command = cli.command.unwrap_or(Commands::Tui);

    match &command {
        Commands::Tui => logging::init_file(&settings.data_dir()?, "info")?,
        _ => logging::init_stderr("warn")?,
    }

    let session = settings.session()?;

    match command {
        Commands::Login { token } => {
            session.login(token)?;
            println!("Token saved.");
            return Ok(());
        }
        Commands::Logout => {
            session.logout()?;
            println!("Signed out.");
            return Ok(());
        }
        _ => {}
    }

    let api = HttpTaskApi::new(settings.api_config(&session))?;
    info!(api_url = %settings.api_url, sync = ?settings.sync_mode(), "using task backend");
    let mut store = TaskStore::new(api).with_sync(settings.sync_mode());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    match command {
        Commands::Tui => {
            let mut app = App::new(store, session, settings.auth_required());
            tui::run(&runtime, &mut app)?;
        }
        Commands::List => runtime.block_on(commands::list(&mut store))?,
        Commands::Add { title, description, deadline, status } => {
            let fields = TaskFields {
                title: Some(title),
                description,
                deadline,
                status: status.map(Into::into),
            };
            runtime.block_on(commands::add(&mut store, fields))?
        }
        Commands::Done { id } => {
            runtime.block_on(commands::toggle(&mut store, TaskId::new(id)))?
        }
        Commands::Edit { id, title, description, deadline, status } => {
            let fields = TaskFields {
                title,
                description,
                deadline,
                status: status.map(Into::into),
            };
            runtime.block_on(commands::edit(&mut store, TaskId::new(id), fields))?
        }
        Commands::Rm { id } => runtime.block_on(commands::remove(&mut store, TaskId::new(id)))?,
        Commands::Login { .. } | Commands::Logout => {}
    }
    Ok(())
}
