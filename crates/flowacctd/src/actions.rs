//! CLI actions

use tracing::instrument;

use flowacct_common::{CommandRunner, ConfigTree, FlowAcctResult};

use crate::constants::DEFAULT_PACKET_LENGTH;
use crate::daemon::DaemonControl;
use crate::lifecycle::{LifecycleController, LifecycleOutcome};
use crate::nflog::NflogRuleManager;
use crate::renderer::ConfigRenderer;
use crate::settings::FlowAcctdSettings;
use crate::system::SystemInfo;
use crate::types::{FlowAccountingConfig, InterfaceIndexMap};
use crate::{paths, CFG_FLOW_ACCOUNTING};

fn nflog_manager<'a>(
    settings: &FlowAcctdSettings,
    tree: &ConfigTree,
    runner: &'a dyn CommandRunner,
) -> FlowAcctResult<NflogRuleManager<'a>> {
    let packet_length = tree
        .parse(&format!("{} {}", CFG_FLOW_ACCOUNTING, paths::PACKET_LENGTH))?
        .unwrap_or(DEFAULT_PACKET_LENGTH);
    Ok(NflogRuleManager::new(runner, settings.hook_spec(packet_length)))
}

/// `add-intf`: install the NFLOG hook for `intf`
#[instrument(skip(settings, tree, runner))]
pub async fn add_intf(
    settings: &FlowAcctdSettings,
    tree: &ConfigTree,
    runner: &dyn CommandRunner,
    intf: &str,
) -> FlowAcctResult<()> {
    nflog_manager(settings, tree, runner)?.install(intf).await
}

/// `del-intf`: remove the NFLOG hook for `intf`
#[instrument(skip(settings, tree, runner))]
pub async fn del_intf(
    settings: &FlowAcctdSettings,
    tree: &ConfigTree,
    runner: &dyn CommandRunner,
    intf: &str,
) -> FlowAcctResult<()> {
    nflog_manager(settings, tree, runner)?.remove(intf).await
}

/// `update`: render, write and reconcile the daemon
#[instrument(skip_all)]
pub async fn update(
    settings: &FlowAcctdSettings,
    tree: &ConfigTree,
    system: &dyn SystemInfo,
    daemon: &dyn DaemonControl,
) -> FlowAcctResult<LifecycleOutcome> {
    let controller = LifecycleController::new(
        daemon,
        &settings.paths.conf_file,
        &settings.paths.int_map_file,
    );

    // Disabling must not depend on the rest of the settings being valid
    if monitored_interfaces(tree).is_empty() {
        return controller.disable().await;
    }

    let config = FlowAccountingConfig::from_tree(tree, system)?;
    let int_map = InterfaceIndexMap::build(&config.interfaces, system);
    let rendered = ConfigRenderer::new(settings).render(&config)?;
    controller.apply(&int_map, &rendered).await
}

/// `list-intf`: monitored interfaces, newline separated, no trailing newline
pub fn list_intf(tree: &ConfigTree) -> String {
    monitored_interfaces(tree).join("\n")
}

fn monitored_interfaces(tree: &ConfigTree) -> Vec<String> {
    tree.values(&format!("{} {}", CFG_FLOW_ACCOUNTING, paths::INTERFACE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_intf() {
        let tree = ConfigTree::from_json_str(
            r#"{"system": {"flow-accounting": {"interface": ["eth0", "eth1.100"]}}}"#,
        )
        .unwrap();
        assert_eq!(list_intf(&tree), "eth0\neth1.100");
        assert_eq!(list_intf(&ConfigTree::default()), "");
    }
}
