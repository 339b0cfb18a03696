use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};
use taskdeck_core::{
    data_dir, ApiConfig, AuthStrategy, FileTokenStore, Session, SyncMode, TaskStatus,
    DEFAULT_BASE_URL,
};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Send no Authorization header
    None,
    /// Send the stored session token as a bearer token
    Bearer,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncArg {
    /// Merge each confirmed change into the list
    Apply,
    /// Re-fetch the list after each change
    Reload,
}

impl From<SyncArg> for SyncMode {
    fn from(arg: SyncArg) -> Self {
        match arg {
            SyncArg::Apply => SyncMode::Apply,
            SyncArg::Reload => SyncMode::Reload,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusArg {
    Pending,
    InProgress,
    Completed,
}

impl From<StatusArg> for TaskStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Pending => TaskStatus::Pending,
            StatusArg::InProgress => TaskStatus::InProgress,
            StatusArg::Completed => TaskStatus::Completed,
        }
    }
}

/// Options shared by every command. Each one can also come from the environment.
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Base URL of the task backend
    #[arg(long, env = "TASKDECK_API_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub api_url: String,

    /// How requests are authenticated
    #[arg(
        long,
        env = "TASKDECK_AUTH",
        value_enum,
        default_value_t = AuthMode::None,
        global = true
    )]
    pub auth: AuthMode,

    /// What to do after the server confirms a change
    #[arg(
        long,
        env = "TASKDECK_SYNC",
        value_enum,
        default_value_t = SyncArg::Apply,
        global = true
    )]
    pub sync: SyncArg,

    /// Directory for the session token and log file [default: ~/.taskdeck]
    #[arg(long, env = "TASKDECK_HOME", global = true)]
    pub data_dir: Option<PathBuf>,
}

impl Settings {
    pub fn data_dir(&self) -> Result<PathBuf> {
        data_dir(self.data_dir.clone())
    }

    pub fn session(&self) -> Result<Session> {
        let store = FileTokenStore::new(Some(self.data_dir()?))?;
        Session::persistent(store)
    }

    pub fn api_config(&self, session: &Session) -> ApiConfig {
        let auth = match self.auth {
            AuthMode::None => AuthStrategy::None,
            AuthMode::Bearer => AuthStrategy::Bearer(session.clone()),
        };
        ApiConfig::new(self.api_url.clone()).with_auth(auth)
    }

    pub fn sync_mode(&self) -> SyncMode {
        self.sync.into()
    }

    pub fn auth_required(&self) -> bool {
        self.auth == AuthMode::Bearer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        settings: Settings,
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = TestCli::parse_from([
            "taskdeck",
            "--api-url",
            "https://tasks.example.com",
            "--auth",
            "bearer",
            "--sync",
            "reload",
        ]);
        assert_eq!(cli.settings.api_url, "https://tasks.example.com");
        assert!(cli.settings.auth_required());
        assert_eq!(cli.settings.sync_mode(), SyncMode::Reload);

        let session = Session::in_memory();
        assert!(matches!(
            cli.settings.api_config(&session).auth,
            AuthStrategy::Bearer(_)
        ));
    }

    #[test]
    fn test_status_arg_names() {
        assert_eq!(
            StatusArg::from_str("in-progress", false).map(TaskStatus::from),
            Ok(TaskStatus::InProgress)
        );
        assert!(StatusArg::from_str("done", false).is_err());
    }
}
