//! Accounting daemon control

use async_trait::async_trait;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use flowacct_common::shell::{shellquote, START_STOP_DAEMON_CMD};
use flowacct_common::{CommandRunner, FlowAcctError, FlowAcctResult};

use crate::settings::FlowAcctdSettings;

/// Start/stop/signal operations on the accounting daemon
#[async_trait]
pub trait DaemonControl: Send + Sync {
    async fn is_running(&self) -> FlowAcctResult<bool>;

    async fn start(&self, conf_file: &Path) -> FlowAcctResult<()>;

    /// Stops the daemon; succeeds when it is not running
    async fn stop(&self) -> FlowAcctResult<()>;

    async fn restart(&self, conf_file: &Path) -> FlowAcctResult<()> {
        self.stop().await?;
        self.start(conf_file).await
    }

    /// Asks the running daemon to re-read its map files
    async fn reload_maps(&self) -> FlowAcctResult<()>;
}

/// Build daemon start command
pub fn build_start_cmd(binary: &Path, pid_file: &Path, conf_file: &Path) -> String {
    format!(
        "{} --start --quiet --pidfile {} --exec {} -- -f {}",
        START_STOP_DAEMON_CMD,
        shellquote(&pid_file.display().to_string()),
        shellquote(&binary.display().to_string()),
        shellquote(&conf_file.display().to_string())
    )
}

/// Build daemon stop command
pub fn build_stop_cmd(pid_file: &Path, retry_secs: u64) -> String {
    format!(
        "{} --stop --quiet --oknodo --pidfile {} --retry {}",
        START_STOP_DAEMON_CMD,
        shellquote(&pid_file.display().to_string()),
        retry_secs
    )
}

/// Reads the pid file. Missing or unparsable means no daemon.
pub fn read_pid(pid_file: &Path) -> FlowAcctResult<Option<i32>> {
    match fs::read_to_string(pid_file) {
        Ok(content) => Ok(content.trim().parse::<i32>().ok().filter(|pid| *pid > 0)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(FlowAcctError::io(pid_file, e)),
    }
}

/// uacctd driven through `start-stop-daemon` and signals
pub struct Uacctd<'a> {
    runner: &'a dyn CommandRunner,
    binary: PathBuf,
    pid_file: PathBuf,
    stop_retry_secs: u64,
}

impl<'a> Uacctd<'a> {
    pub fn new(runner: &'a dyn CommandRunner, settings: &FlowAcctdSettings) -> Self {
        Self {
            runner,
            binary: settings.daemon.binary.clone(),
            pid_file: settings.paths.pid_file.clone(),
            stop_retry_secs: settings.daemon.stop_retry_secs,
        }
    }

    fn live_pid(&self) -> FlowAcctResult<Option<Pid>> {
        Ok(read_pid(&self.pid_file)?
            .map(Pid::from_raw)
            .filter(|pid| kill(*pid, None).is_ok()))
    }
}

#[async_trait]
impl DaemonControl for Uacctd<'_> {
    async fn is_running(&self) -> FlowAcctResult<bool> {
        Ok(self.live_pid()?.is_some())
    }

    #[instrument(skip(self))]
    async fn start(&self, conf_file: &Path) -> FlowAcctResult<()> {
        let cmd = build_start_cmd(&self.binary, &self.pid_file, conf_file);
        self.runner.exec_or_throw(&cmd).await?;
        info!("Started {}", self.binary.display());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn stop(&self) -> FlowAcctResult<()> {
        let cmd = build_stop_cmd(&self.pid_file, self.stop_retry_secs);
        self.runner.exec_or_throw(&cmd).await?;
        info!("Stopped {}", self.binary.display());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn reload_maps(&self) -> FlowAcctResult<()> {
        let pid = self
            .live_pid()?
            .ok_or_else(|| FlowAcctError::internal("accounting daemon is not running"))?;

        kill(pid, Signal::SIGUSR2).map_err(|e| {
            FlowAcctError::internal(format!("failed to signal pid {}: {}", pid, e))
        })?;
        debug!("Sent SIGUSR2 to {}", pid);
        Ok(())
    }
}
