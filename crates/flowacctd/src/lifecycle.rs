//! Change-driven daemon lifecycle
//!
//! A restart drops the daemon's in-memory flow state, so it only happens
//! when the rendered configuration differs from the file on disk. An
//! interface map change alone is picked up with a reload signal.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info, instrument};

use flowacct_common::{FlowAcctError, FlowAcctResult};

use crate::daemon::DaemonControl;
use crate::types::InterfaceIndexMap;

/// What [`LifecycleController::apply`] did to the daemon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleOutcome {
    /// No monitored interfaces: daemon stopped, files removed
    Disabled,
    /// Configuration changed
    Restarted,
    /// Configuration unchanged but the daemon was down
    Started,
    /// Only the interface map changed
    Reloaded,
    Unchanged,
}

/// Writes `content` to `path` unless the file already holds exactly that.
///
/// Returns true when the file was written, including when it did not
/// exist before.
pub fn write_if_changed(path: &Path, content: &str) -> FlowAcctResult<bool> {
    match fs::read(path) {
        Ok(existing) if existing == content.as_bytes() => return Ok(false),
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(FlowAcctError::io(path, e)),
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| FlowAcctError::io(parent, e))?;
    }
    fs::write(path, content).map_err(|e| FlowAcctError::io(path, e))?;
    debug!("Wrote {}", path.display());
    Ok(true)
}

/// Removes `path`; a missing file is fine
pub fn remove_if_exists(path: &Path) -> FlowAcctResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(FlowAcctError::io(path, e)),
    }
}

/// Applies a rendered configuration to disk and the daemon
pub struct LifecycleController<'a> {
    daemon: &'a dyn DaemonControl,
    conf_file: &'a Path,
    int_map_file: &'a Path,
}

impl<'a> LifecycleController<'a> {
    pub fn new(daemon: &'a dyn DaemonControl, conf_file: &'a Path, int_map_file: &'a Path) -> Self {
        Self {
            daemon,
            conf_file,
            int_map_file,
        }
    }

    /// Stops the daemon and removes its configuration and interface map
    #[instrument(skip(self))]
    pub async fn disable(&self) -> FlowAcctResult<LifecycleOutcome> {
        self.daemon.stop().await?;
        remove_if_exists(self.conf_file)?;
        remove_if_exists(self.int_map_file)?;
        info!("Flow accounting disabled");
        Ok(LifecycleOutcome::Disabled)
    }

    /// Writes both files and restarts, starts, signals or leaves the
    /// daemon alone depending on what changed
    #[instrument(skip_all)]
    pub async fn apply(
        &self,
        int_map: &InterfaceIndexMap,
        rendered: &str,
    ) -> FlowAcctResult<LifecycleOutcome> {
        let map_changed = write_if_changed(self.int_map_file, &int_map.to_string())?;
        let conf_changed = write_if_changed(self.conf_file, rendered)?;

        if conf_changed {
            info!("Configuration changed, restarting accounting daemon");
            self.daemon.restart(self.conf_file).await?;
            return Ok(LifecycleOutcome::Restarted);
        }

        if !self.daemon.is_running().await? {
            info!("Accounting daemon not running, starting it");
            self.daemon.start(self.conf_file).await?;
            return Ok(LifecycleOutcome::Started);
        }

        if map_changed {
            info!("Interface map changed, signalling accounting daemon");
            self.daemon.reload_maps().await?;
            return Ok(LifecycleOutcome::Reloaded);
        }

        debug!("Nothing changed");
        Ok(LifecycleOutcome::Unchanged)
    }
}
