//! flow-accounting - Flow accounting configuration tool
//!
//! Entry point invoked by the configuration system for each change.

use clap::{Parser, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use flowacct_common::{ConfigTree, FlowAcctError, FlowAcctResult, ShellRunner};
use flowacctd::settings::DEFAULT_SETTINGS_FILE;
use flowacctd::{actions, FlowAcctdSettings, LinuxSystem, Uacctd};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Action {
    /// Install the NFLOG hook for --intf
    AddIntf,
    /// Remove the NFLOG hook for --intf
    DelIntf,
    /// Render configuration and reconcile the daemon
    Update,
    /// Print monitored interfaces
    ListIntf,
}

/// Flow accounting configuration tool
#[derive(Parser, Debug)]
#[command(name = "flow-accounting")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long, value_enum)]
    action: Action,

    /// Interface for add-intf / del-intf
    #[arg(long)]
    intf: Option<String>,

    /// Tool settings file
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    settings: PathBuf,

    /// Router configuration tree, overrides paths.config_tree
    #[arg(long)]
    config_tree: Option<PathBuf>,
}

/// Initializes tracing/logging subsystem
///
/// Logs go to stderr; stdout carries `list-intf` output.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

const EXIT_OK: u8 = 0;
const EXIT_FAILURE: u8 = 1;

/// Exit status for a command line clap rejected
///
/// `--help` and `--version` are not failures; anything else exits 1
/// rather than clap's usual 2.
fn usage_exit_status(err: &clap::Error) -> u8 {
    if err.use_stderr() {
        EXIT_FAILURE
    } else {
        EXIT_OK
    }
}

fn run_exit_status(result: &FlowAcctResult<()>) -> u8 {
    match result {
        Ok(()) => EXIT_OK,
        Err(_) => EXIT_FAILURE,
    }
}

fn require_intf(args: &Args) -> FlowAcctResult<&str> {
    args.intf
        .as_deref()
        .ok_or_else(|| FlowAcctError::invalid_config("--intf", "required for this action"))
}

async fn run(args: Args) -> FlowAcctResult<()> {
    let settings = FlowAcctdSettings::load_or_default(&args.settings)?;
    let tree_path = args
        .config_tree
        .clone()
        .unwrap_or_else(|| settings.paths.config_tree.clone());
    let tree = ConfigTree::load(&tree_path)?;
    let runner = ShellRunner;

    match args.action {
        Action::AddIntf => actions::add_intf(&settings, &tree, &runner, require_intf(&args)?).await,
        Action::DelIntf => actions::del_intf(&settings, &tree, &runner, require_intf(&args)?).await,
        Action::Update => {
            let daemon = Uacctd::new(&runner, &settings);
            let outcome = actions::update(&settings, &tree, &LinuxSystem, &daemon).await?;
            info!("update finished: {:?}", outcome);
            Ok(())
        }
        Action::ListIntf => {
            let mut stdout = std::io::stdout();
            stdout
                .write_all(actions::list_intf(&tree).as_bytes())
                .and_then(|_| stdout.flush())
                .map_err(|e| FlowAcctError::io("<stdout>", e))
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(usage_exit_status(&e));
        }
    };

    init_logging();

    let result = run(args).await;
    if let Err(e) = &result {
        error!("{}", e);
    }
    ExitCode::from(run_exit_status(&result))
}
