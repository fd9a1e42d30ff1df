//! Daemon lifecycle decisions driven by on-disk configuration diffs

use async_trait::async_trait;
use std::fs;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

use flowacct_common::{ConfigTree, FlowAcctError, FlowAcctResult};
use flowacctd::{
    actions, DaemonControl, FlowAcctdSettings, InterfaceIndexMap, LifecycleController,
    LifecycleOutcome, StaticSystem,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Start(PathBuf),
    Stop,
    Restart(PathBuf),
    Reload,
}

/// Records control calls; `restart` is recorded as one call
struct RecordingDaemon {
    running: Mutex<bool>,
    calls: Mutex<Vec<Call>>,
}

impl RecordingDaemon {
    fn new(running: bool) -> Self {
        Self {
            running: Mutex::new(running),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DaemonControl for RecordingDaemon {
    async fn is_running(&self) -> FlowAcctResult<bool> {
        Ok(*self.running.lock().unwrap())
    }

    async fn start(&self, conf_file: &Path) -> FlowAcctResult<()> {
        self.record(Call::Start(conf_file.to_path_buf()));
        *self.running.lock().unwrap() = true;
        Ok(())
    }

    async fn stop(&self) -> FlowAcctResult<()> {
        self.record(Call::Stop);
        *self.running.lock().unwrap() = false;
        Ok(())
    }

    async fn restart(&self, conf_file: &Path) -> FlowAcctResult<()> {
        self.record(Call::Restart(conf_file.to_path_buf()));
        *self.running.lock().unwrap() = true;
        Ok(())
    }

    async fn reload_maps(&self) -> FlowAcctResult<()> {
        self.record(Call::Reload);
        Ok(())
    }
}

struct Fixture {
    _dir: TempDir,
    conf_file: PathBuf,
    int_map_file: PathBuf,
    settings: FlowAcctdSettings,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let mut settings = FlowAcctdSettings::default();
        settings.paths.conf_file = dir.path().join("uacctd.conf");
        settings.paths.int_map_file = dir.path().join("int_map");
        settings.paths.networks_file = dir.path().join("networks.lst");
        Self {
            conf_file: settings.paths.conf_file.clone(),
            int_map_file: settings.paths.int_map_file.clone(),
            settings,
            _dir: dir,
        }
    }

    fn controller<'a>(&'a self, daemon: &'a RecordingDaemon) -> LifecycleController<'a> {
        LifecycleController::new(daemon, &self.conf_file, &self.int_map_file)
    }
}

fn int_map(entries: &[(&str, u32)]) -> InterfaceIndexMap {
    InterfaceIndexMap {
        entries: entries
            .iter()
            .map(|(name, index)| (name.to_string(), *index))
            .collect(),
    }
}

fn system() -> StaticSystem {
    StaticSystem::new()
        .with_interface("lo", 1, &[Ipv4Addr::LOCALHOST])
        .with_interface("eth0", 2, &[Ipv4Addr::new(10, 0, 0, 1)])
        .with_interface("eth1", 3, &[Ipv4Addr::new(192, 0, 2, 1)])
}

#[tokio::test]
async fn unchanged_config_running_daemon_does_nothing() {
    let fx = Fixture::new();
    let map = int_map(&[("eth0", 2)]);
    fs::write(&fx.conf_file, "config A\n").unwrap();
    fs::write(&fx.int_map_file, map.to_string()).unwrap();

    let daemon = RecordingDaemon::new(true);
    let outcome = fx.controller(&daemon).apply(&map, "config A\n").await.unwrap();

    assert_eq!(outcome, LifecycleOutcome::Unchanged);
    assert!(daemon.calls().is_empty());
}

#[tokio::test]
async fn changed_config_restarts_once() {
    let fx = Fixture::new();
    let map = int_map(&[("eth0", 2)]);
    fs::write(&fx.conf_file, "config A\n").unwrap();
    fs::write(&fx.int_map_file, map.to_string()).unwrap();

    let daemon = RecordingDaemon::new(true);
    let outcome = fx.controller(&daemon).apply(&map, "config B\n").await.unwrap();

    assert_eq!(outcome, LifecycleOutcome::Restarted);
    assert_eq!(daemon.calls(), vec![Call::Restart(fx.conf_file.clone())]);
    assert_eq!(fs::read_to_string(&fx.conf_file).unwrap(), "config B\n");
}

#[tokio::test]
async fn missing_config_file_counts_as_change() {
    let fx = Fixture::new();
    let daemon = RecordingDaemon::new(false);

    let outcome = fx
        .controller(&daemon)
        .apply(&int_map(&[("eth0", 2)]), "config A\n")
        .await
        .unwrap();

    assert_eq!(outcome, LifecycleOutcome::Restarted);
    assert_eq!(daemon.calls(), vec![Call::Restart(fx.conf_file.clone())]);
    assert_eq!(fs::read_to_string(&fx.int_map_file).unwrap(), "id=2\tin=2\n");
}

#[tokio::test]
async fn unchanged_config_stopped_daemon_starts() {
    let fx = Fixture::new();
    let map = int_map(&[("eth0", 2)]);
    fs::write(&fx.conf_file, "config A\n").unwrap();
    fs::write(&fx.int_map_file, map.to_string()).unwrap();

    let daemon = RecordingDaemon::new(false);
    let outcome = fx.controller(&daemon).apply(&map, "config A\n").await.unwrap();

    assert_eq!(outcome, LifecycleOutcome::Started);
    assert_eq!(daemon.calls(), vec![Call::Start(fx.conf_file.clone())]);
}

#[tokio::test]
async fn interface_map_change_only_signals() {
    let fx = Fixture::new();
    fs::write(&fx.conf_file, "config A\n").unwrap();
    fs::write(&fx.int_map_file, int_map(&[("eth0", 2)]).to_string()).unwrap();

    let daemon = RecordingDaemon::new(true);
    let outcome = fx
        .controller(&daemon)
        .apply(&int_map(&[("eth0", 2), ("eth1", 3)]), "config A\n")
        .await
        .unwrap();

    assert_eq!(outcome, LifecycleOutcome::Reloaded);
    assert_eq!(daemon.calls(), vec![Call::Reload]);
}

#[tokio::test]
async fn empty_interface_list_stops_and_removes_files() {
    for running in [true, false] {
        let fx = Fixture::new();
        fs::write(&fx.conf_file, "config A\n").unwrap();
        fs::write(&fx.int_map_file, "id=2\tin=2\n").unwrap();
        let tree = ConfigTree::from_json_str(r#"{"system": {"flow-accounting": {}}}"#).unwrap();

        let daemon = RecordingDaemon::new(running);
        let outcome = actions::update(&fx.settings, &tree, &system(), &daemon)
            .await
            .unwrap();

        assert_eq!(outcome, LifecycleOutcome::Disabled);
        assert_eq!(daemon.calls(), vec![Call::Stop]);
        assert!(!fx.conf_file.exists());
        assert!(!fx.int_map_file.exists());
    }
}

#[tokio::test]
async fn empty_interface_list_disables_despite_stale_settings() {
    let fx = Fixture::new();
    fs::write(&fx.conf_file, "config A\n").unwrap();
    fs::write(&fx.int_map_file, "id=2\tin=2\n").unwrap();
    let tree = ConfigTree::from_json_str(
        r#"{"system": {"flow-accounting": {
            "buffer-size": "lots",
            "sflow": {"agent-address": "203.0.113.9", "server": {"192.0.2.20": {}}}
        }}}"#,
    )
    .unwrap();

    let daemon = RecordingDaemon::new(true);
    let outcome = actions::update(&fx.settings, &tree, &system(), &daemon)
        .await
        .unwrap();

    assert_eq!(outcome, LifecycleOutcome::Disabled);
    assert_eq!(daemon.calls(), vec![Call::Stop]);
    assert!(!fx.conf_file.exists());
    assert!(!fx.int_map_file.exists());
}

#[tokio::test]
async fn disable_without_existing_files() {
    let fx = Fixture::new();
    let daemon = RecordingDaemon::new(false);

    let outcome = fx.controller(&daemon).disable().await.unwrap();

    assert_eq!(outcome, LifecycleOutcome::Disabled);
    assert_eq!(daemon.calls(), vec![Call::Stop]);
}

#[tokio::test]
async fn update_is_idempotent() {
    let fx = Fixture::new();
    let tree = ConfigTree::from_json_str(
        r#"{"system": {"flow-accounting": {
            "interface": ["eth0"],
            "netflow": {"server": {"192.0.2.10": {}}}
        }}}"#,
    )
    .unwrap();
    let system = system();
    let daemon = RecordingDaemon::new(false);

    let first = actions::update(&fx.settings, &tree, &system, &daemon).await.unwrap();
    let rendered = fs::read_to_string(&fx.conf_file).unwrap();
    let second = actions::update(&fx.settings, &tree, &system, &daemon).await.unwrap();

    assert_eq!(first, LifecycleOutcome::Restarted);
    assert_eq!(second, LifecycleOutcome::Unchanged);
    assert_eq!(fs::read_to_string(&fx.conf_file).unwrap(), rendered);
    assert!(rendered.contains("plugins: memory,nfprobe\n"));
    assert!(rendered.contains("nfprobe_receiver[192.0.2.10-2055]: 192.0.2.10:2055\n"));
    assert_eq!(fs::read_to_string(&fx.int_map_file).unwrap(), "id=2\tin=2\n");
}

#[tokio::test]
async fn update_adding_interface_reloads_maps() {
    let fx = Fixture::new();
    let system = system();
    let daemon = RecordingDaemon::new(false);

    let one = ConfigTree::from_json_str(
        r#"{"system": {"flow-accounting": {"interface": ["eth0"]}}}"#,
    )
    .unwrap();
    let two = ConfigTree::from_json_str(
        r#"{"system": {"flow-accounting": {"interface": ["eth0", "eth1"]}}}"#,
    )
    .unwrap();

    actions::update(&fx.settings, &one, &system, &daemon).await.unwrap();
    let outcome = actions::update(&fx.settings, &two, &system, &daemon).await.unwrap();

    assert_eq!(outcome, LifecycleOutcome::Reloaded);
    assert_eq!(
        daemon.calls(),
        vec![Call::Restart(fx.conf_file.clone()), Call::Reload]
    );
    assert_eq!(
        fs::read_to_string(&fx.int_map_file).unwrap(),
        "id=2\tin=2\nid=3\tin=3\n"
    );
}

#[tokio::test]
async fn update_skips_unknown_interfaces() {
    let fx = Fixture::new();
    let tree = ConfigTree::from_json_str(
        r#"{"system": {"flow-accounting": {"interface": ["eth0", "wg9"]}}}"#,
    )
    .unwrap();
    let daemon = RecordingDaemon::new(false);

    actions::update(&fx.settings, &tree, &system(), &daemon).await.unwrap();

    assert_eq!(fs::read_to_string(&fx.int_map_file).unwrap(), "id=2\tin=2\n");
}

#[tokio::test]
async fn update_without_plugins_fails_before_touching_daemon() {
    let fx = Fixture::new();
    let tree = ConfigTree::from_json_str(
        r#"{"system": {"flow-accounting": {"interface": ["eth0"], "disable-imt": {}}}}"#,
    )
    .unwrap();
    let daemon = RecordingDaemon::new(true);

    let result = actions::update(&fx.settings, &tree, &system(), &daemon).await;

    assert!(matches!(result, Err(FlowAcctError::NoPluginEnabled)));
    assert!(daemon.calls().is_empty());
    assert!(!fx.conf_file.exists());
}

#[tokio::test]
async fn update_sflow_auto_agent_uses_first_non_loopback() {
    let fx = Fixture::new();
    let tree = ConfigTree::from_json_str(
        r#"{"system": {"flow-accounting": {
            "interface": ["eth0"],
            "sflow": {"agent-address": "auto", "server": {"192.0.2.20": {}}}
        }}}"#,
    )
    .unwrap();
    let system = StaticSystem::new()
        .with_interface("lo", 1, &[Ipv4Addr::LOCALHOST])
        .with_interface("eth0", 2, &[Ipv4Addr::new(10, 0, 0, 1)]);
    let daemon = RecordingDaemon::new(false);

    actions::update(&fx.settings, &tree, &system, &daemon).await.unwrap();

    let rendered = fs::read_to_string(&fx.conf_file).unwrap();
    assert!(rendered.contains("sfprobe_agentip[192.0.2.20-6343]: 10.0.0.1\n"));
}
